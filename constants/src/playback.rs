/// Frames kept free at the end of the atlas in scrub mode.
/// Sampling interpolates towards the next frame texel, so the last few frames are never addressed directly.
pub const SCRUB_END_MARGIN_FRAMES: f32 = 5.0;

/// Playback speed multiplier applied when none is configured.
pub const DEFAULT_PLAYBACK_SPEED: f32 = 1.0;

/// Fallback fps for manifests that report zero.
pub const FALLBACK_FPS: f32 = 24.0;
