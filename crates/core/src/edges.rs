use timeline_lanes_protocol::{EventAttrs, Interval};

/// The time span an event visually occupies at the given zoom.
///
/// Icons are sized in pixels, so an icon near an edge of a short event can
/// overhang it. Each icon is anchored at `start + h_pos * (end - start)` and
/// covers `h_align * width` before the anchor and `(1 - h_align) * width`
/// after it, with `width = pixel_width * millis_per_pixel`.
///
/// An event whose end precedes its start is treated as zero-width at its
/// start, so the result always has `start <= end`.
pub fn effective_edges(attrs: &EventAttrs, millis_per_pixel: f64) -> Interval {
    let start = attrs.start;
    let end = attrs.end.max(start);
    let duration = end - start;

    attrs
        .icons
        .iter()
        .fold(Interval::new(start, end), |edges, icon| {
            let anchor = start + icon.h_pos * duration;
            let width = icon.pixel_width * millis_per_pixel;
            Interval::new(
                edges.start.min(anchor - icon.h_align * width),
                edges.end.max(anchor + (1.0 - icon.h_align) * width),
            )
        })
}
