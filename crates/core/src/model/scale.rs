use std::cell::Cell;

use crate::signal::Signal;

/// The timeline's current zoom, in milliseconds per screen pixel.
#[derive(Debug)]
pub struct TimeScale {
    millis_per_pixel: Cell<f64>,
    changed: Signal<f64>,
}

impl TimeScale {
    pub fn new(millis_per_pixel: f64) -> Self {
        Self {
            millis_per_pixel: Cell::new(millis_per_pixel),
            changed: Signal::new(),
        }
    }

    pub fn millis_per_pixel(&self) -> f64 {
        self.millis_per_pixel.get()
    }

    /// Emits [`changed`](Self::changed) with the new value, unless it is
    /// the current one.
    pub fn set_millis_per_pixel(&self, millis_per_pixel: f64) {
        if self.millis_per_pixel.replace(millis_per_pixel) != millis_per_pixel {
            self.changed.emit(&millis_per_pixel);
        }
    }

    pub fn changed(&self) -> &Signal<f64> {
        &self.changed
    }
}

impl Default for TimeScale {
    fn default() -> Self {
        Self::new(1.0)
    }
}
