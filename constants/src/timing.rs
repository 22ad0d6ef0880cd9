/// Default hold time at phase 0 (seconds).
pub const STATE0_DEFAULT_DURATION: f32 = 0.0;

/// Default time spent animating from phase 0 to 1 (seconds).
pub const STATE1_DEFAULT_DURATION: f32 = 1.0;

/// Default hold time at phase 1 (seconds).
pub const STATE2_DEFAULT_DURATION: f32 = 0.0;

/// Default time spent animating from phase 1 back to 0 (seconds).
pub const STATE3_DEFAULT_DURATION: f32 = 1.0;

/// Number of states in the per-instance phase cycle.
pub const PHASE_STATE_COUNT: usize = 4;
