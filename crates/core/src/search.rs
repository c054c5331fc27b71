//! Binary search over ascending `f64` slices.
//!
//! These are the lookups the stack lanes use to find an event's neighbours
//! in O(log n). Every function assumes `vs` is sorted ascending. Comparisons
//! involving `NaN` are unreliable, and `-0.0` and `0.0` are treated as equal.

/// Classic binary search.
///
/// Returns the index of an element equal to `x` if there is one (any one, if
/// there are several). Otherwise returns `-(insertion_point) - 1`, where
/// `insertion_point` is the index at which `x` would keep `vs` sorted. An
/// empty slice yields `-1`.
pub fn index_of(vs: &[f64], x: f64) -> isize {
    let mut lo = 0usize;
    let mut hi = vs.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let v = vs[mid];
        if v < x {
            lo = mid + 1;
        } else if v > x {
            hi = mid;
        } else {
            return mid as isize;
        }
    }
    -(lo as isize) - 1
}

/// Decodes an [`index_of`] result into the position `x` occupies or would
/// be inserted at.
pub fn insertion_point(encoded: isize) -> usize {
    if encoded >= 0 {
        encoded as usize
    } else {
        (-(encoded + 1)) as usize
    }
}

/// Index of the element numerically closest to `x`.
///
/// Ties between the neighbours on either side of `x` go to the later one.
/// `None` only for an empty slice.
pub fn index_nearest(vs: &[f64], x: f64) -> Option<usize> {
    let i = index_of(vs, x);
    if i >= 0 {
        return Some(i as usize);
    }
    let after = insertion_point(i);
    if after >= vs.len() {
        return after.checked_sub(1);
    }
    if after == 0 {
        return Some(0);
    }
    let before = after - 1;
    let d_after = (vs[after] - x).abs();
    let d_before = (vs[before] - x).abs();
    Some(if d_after <= d_before { after } else { before })
}

/// Index of the first element strictly greater than `x`, or `vs.len()`.
pub fn index_after(vs: &[f64], x: f64) -> usize {
    let i = index_of(vs, x);
    if i < 0 {
        return insertion_point(i);
    }
    let found = i as usize;
    (found + 1..vs.len())
        .find(|&j| vs[j] > x)
        .unwrap_or(vs.len())
}

/// Index of the first element greater than or equal to `x`, or `vs.len()`.
pub fn index_at_or_after(vs: &[f64], x: f64) -> usize {
    let i = index_of(vs, x);
    if i < 0 {
        return insertion_point(i);
    }
    let mut j = i as usize;
    while j > 0 && vs[j - 1] >= x {
        j -= 1;
    }
    j
}

/// Index of the last element strictly less than `x`.
pub fn index_before(vs: &[f64], x: f64) -> Option<usize> {
    index_at_or_after(vs, x).checked_sub(1)
}

/// Index of the last element less than or equal to `x`.
pub fn index_at_or_before(vs: &[f64], x: f64) -> Option<usize> {
    index_after(vs, x).checked_sub(1)
}
