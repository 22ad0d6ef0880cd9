use crate::engine::assembly::mount::VatAssembly;
use crate::engine::compute::frame_compute::VatFrameCompute;
use crate::engine::material::vat_material::VatMaterial;
use bevy::prelude::*;
use constants::playback::{DEFAULT_PLAYBACK_SPEED, SCRUB_END_MARGIN_FRAMES};

/// Playback controls for one mount.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct VatPlayback {
    pub speed: f32,
    pub paused: bool,
    /// `Some(r)` scrubs to `r` of the clip; `None` loops on the clock.
    pub frame_ratio: Option<f32>,
}

impl Default for VatPlayback {
    fn default() -> Self {
        Self {
            speed: DEFAULT_PLAYBACK_SPEED,
            paused: false,
            frame_ratio: None,
        }
    }
}

/// Frame for a 0..1 ratio. The last few frames are held back so the next-frame blend stays in range.
pub fn scrub_frame(ratio: f32, frame_count: u32) -> f32 {
    let frame_count = frame_count as f32;
    (ratio * frame_count)
        .min(frame_count - SCRUB_END_MARGIN_FRAMES)
        .max(0.0)
}

/// Frame at `elapsed` seconds. Negative speeds play backwards and still land in `[0, frame_count)`.
pub fn loop_frame(elapsed: f32, fps: f32, speed: f32, frame_count: u32) -> f32 {
    let frame_count = frame_count.max(1) as f32;
    let frame = (elapsed * fps * speed).rem_euclid(frame_count);
    if frame.is_finite() && frame < frame_count {
        frame
    } else {
        0.0
    }
}

/// Frame for `playback`, or `None` while paused.
pub fn compute_frame(
    playback: &VatPlayback,
    elapsed: f32,
    frame_count: u32,
    fps: f32,
) -> Option<f32> {
    if playback.paused {
        return None;
    }
    Some(match playback.frame_ratio {
        Some(ratio) => scrub_frame(ratio, frame_count),
        None => loop_frame(elapsed, fps, playback.speed, frame_count),
    })
}

/// Writes the current frame into every live VAT material. Instanced mounts with a
/// compute pass read their frames from the instance texture instead.
pub fn drive_vat_frames(
    time: Res<Time>,
    mounts: Query<(&VatPlayback, &VatAssembly), Without<VatFrameCompute>>,
    mut materials: ResMut<Assets<VatMaterial>>,
) {
    let elapsed = time.elapsed_secs();
    for (playback, assembly) in &mounts {
        let Some(frame) = compute_frame(
            playback,
            elapsed,
            assembly.metadata.frame_count,
            assembly.metadata.effective_fps(),
        ) else {
            continue;
        };
        let Some(material) = materials.get_mut(&assembly.material) else {
            continue;
        };
        material.extension.vat.frame = frame;
    }
}
