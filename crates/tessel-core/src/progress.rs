/// Fractional completion of the current pass, always within `[0, 1]`
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Progress(f32);

impl Progress {
    pub const ZERO: Progress = Progress(0.0);
    pub const COMPLETE: Progress = Progress(1.0);

    pub fn value(self) -> f32 {
        self.0
    }

    /// Move forward to `reported`.
    ///
    /// Engines report progress per internal phase, so values can go backwards
    /// between phases. Out of range values are clamped, NaN is ignored, and the
    /// tracked value never decreases. Returns true when the value changed.
    pub fn advance(&mut self, reported: f32) -> bool {
        if reported.is_nan() {
            return false;
        }

        let next = reported.clamp(0.0, 1.0);
        if next > self.0 {
            self.0 = next;
            true
        } else {
            false
        }
    }

    /// Whole percent, rounded up
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).ceil() as u8
    }

    /// Between start and finish, the range in which a progress indicator is shown
    pub fn is_partial(self) -> bool {
        self.0 > 0.0 && self.0 < 1.0
    }
}
