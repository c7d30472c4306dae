/// Logical simulation time. While frozen no time is handed to the tick, so
/// cooldowns, reverts, and flutter phases stand still; unfreezing resumes
/// exactly where they left off.
pub(crate) struct Clock {
    elapsed: f32,
    frozen: bool,
}

impl Clock {
    pub(crate) fn new() -> Self {
        Self {
            elapsed: 0.0,
            frozen: false,
        }
    }

    /// Advance by a real-time delta; returns the logical delta (zero while
    /// frozen).
    pub(crate) fn tick(&mut self, dt: f32) -> f32 {
        if self.frozen {
            return 0.0;
        }
        self.elapsed += dt;
        dt
    }

    pub(crate) fn frozen(&self) -> bool {
        self.frozen
    }

    pub(crate) fn toggle(&mut self) {
        self.frozen = !self.frozen;
    }

    pub(crate) fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    pub(crate) fn elapsed(&self) -> f32 {
        self.elapsed
    }
}
