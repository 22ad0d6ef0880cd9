use crate::engine::assembly::mount::VatMeshConfig;
use crate::engine::core::app_setup::DemoMount;
use crate::engine::loading::manifest_loader::{VatLoadFailed, VatLoadStatus};
use crate::engine::playback::frame_driver::VatPlayback;
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;

const SPEED_STEP: f32 = 0.25;
const SCRUB_STEP: f32 = 0.05;

#[derive(Component)]
pub struct DemoHud;

/// Space pauses, Up/Down change speed, Left/Right scrub, Enter resumes looping,
/// D toggles the depth material, S toggles shadow casting.
pub fn demo_keyboard_controls(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut mounts: Query<(&mut VatPlayback, &mut VatMeshConfig), With<DemoMount>>,
) {
    for (mut playback, mut config) in &mut mounts {
        if keyboard.just_pressed(KeyCode::Space) {
            playback.paused = !playback.paused;
        }
        if keyboard.just_pressed(KeyCode::ArrowUp) {
            playback.speed += SPEED_STEP;
        }
        if keyboard.just_pressed(KeyCode::ArrowDown) {
            playback.speed -= SPEED_STEP;
        }

        let scrub = if keyboard.just_pressed(KeyCode::ArrowRight) {
            SCRUB_STEP
        } else if keyboard.just_pressed(KeyCode::ArrowLeft) {
            -SCRUB_STEP
        } else {
            0.0
        };
        if scrub != 0.0 {
            let ratio = playback.frame_ratio.unwrap_or(0.0) + scrub;
            playback.frame_ratio = Some(ratio.clamp(0.0, 1.0));
        }
        if keyboard.just_pressed(KeyCode::Enter) {
            playback.frame_ratio = None;
        }

        if keyboard.just_pressed(KeyCode::KeyD) {
            config.use_depth_material = !config.use_depth_material;
            info!("Depth material: {}", config.use_depth_material);
        }
        if keyboard.just_pressed(KeyCode::KeyS) {
            config.cast_shadows = !config.cast_shadows;
        }
    }
}

pub fn demo_hud_update_system(
    diagnostics: Res<DiagnosticsStore>,
    mounts: Query<(&VatPlayback, &VatLoadStatus), With<DemoMount>>,
    mut query: Query<&mut Text, With<DemoHud>>,
) {
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps| fps.smoothed())
        .unwrap_or_default();

    let playback = match mounts.single() {
        Ok((_, VatLoadStatus::Pending)) => "loading...".to_string(),
        Ok((_, VatLoadStatus::Failed(error))) => format!("failed: {error}"),
        Ok((playback, VatLoadStatus::Complete)) => match playback.frame_ratio {
            Some(ratio) => format!("scrub {:.0}%", ratio * 100.0),
            None if playback.paused => "paused".to_string(),
            None => format!("speed {:.2}x", playback.speed),
        },
        Err(_) => String::new(),
    };

    for mut text in &mut query {
        text.0 = format!("FPS: {fps:.1}  |  {playback}");
    }
}

pub fn report_load_failures(mut failures: EventReader<VatLoadFailed>) {
    for failure in failures.read() {
        warn!(
            "VAT mount {} will not render: {}",
            failure.entity, failure.error
        );
    }
}
