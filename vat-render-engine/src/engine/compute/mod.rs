/// Per-instance duration ranges and the seeded profiles drawn from them.
pub mod durations;

/// Main-world side of the per-instance frame pass: textures, clock and job queue.
pub mod frame_compute;

pub mod phase;

pub mod ping_pong;

/// Render-world pipeline and dispatch.
pub mod render;
