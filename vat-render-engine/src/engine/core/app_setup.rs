use crate::engine::assembly::mount::VatInstancing;
use crate::engine::compute::durations::{StateDuration, StateDurations};
use crate::engine::compute::frame_compute::VatInstanceTiming;
use crate::engine::core::demo_controls::{
    DemoHud, demo_keyboard_controls, demo_hud_update_system, report_load_failures,
};
use crate::engine::core::window_config::create_window_config;
use crate::engine::loading::manifest_loader::VatSource;
use crate::engine::plugin::VatPlugin;
use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::prelude::*;
use constants::path::DEMO_MANIFEST_PATH;

const DEMO_GRID_SIDE: u32 = 6;
const DEMO_GRID_SPACING: f32 = 1.5;

/// Marks the single, non-instanced demo mount the keyboard controls target.
#[derive(Component)]
pub struct DemoMount;

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        .add_plugins(VatPlugin)
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (
                demo_keyboard_controls,
                demo_hud_update_system,
                report_load_failures,
            ),
        );

    app
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    info!("=== VAT RENDER ENGINE DEMO ===");

    spawn_lighting(&mut commands);
    spawn_camera(&mut commands);
    spawn_ground(&mut commands, &mut meshes, &mut materials);
    spawn_mounts(&mut commands);
    spawn_ui(&mut commands);
}

fn spawn_lighting(commands: &mut Commands) {
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));
}

fn spawn_camera(commands: &mut Commands) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(-6.0, 6.0, 12.0).looking_at(Vec3::new(0.0, 1.0, 0.0), Vec3::Y),
    ));
}

fn spawn_ground(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) {
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(40.0, 40.0))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.3, 0.32, 0.28),
            perceptual_roughness: 0.9,
            ..default()
        })),
    ));
}

/// One plain mount driven by the keyboard, and an instanced field of the same asset
/// with staggered per-instance timing.
fn spawn_mounts(commands: &mut Commands) {
    commands.spawn((
        VatSource::new(DEMO_MANIFEST_PATH),
        DemoMount,
        Transform::from_xyz(-4.0, 0.0, 0.0),
    ));

    let count = DEMO_GRID_SIDE * DEMO_GRID_SIDE;
    let offset = (DEMO_GRID_SIDE as f32 - 1.0) * DEMO_GRID_SPACING * 0.5;
    let positions = (0..count)
        .map(|i| {
            let (x, z) = ((i % DEMO_GRID_SIDE) as f32, (i / DEMO_GRID_SIDE) as f32);
            Vec3::new(
                x * DEMO_GRID_SPACING - offset,
                0.0,
                z * DEMO_GRID_SPACING - offset,
            )
        })
        .collect();
    let rotations = (0..count)
        .map(|i| Vec3::new(0.0, i as f32 * 0.7, 0.0))
        .collect();

    commands.spawn((
        VatSource::new(DEMO_MANIFEST_PATH),
        VatInstancing {
            count,
            positions: Some(positions),
            rotations: Some(rotations),
            scales: None,
        },
        VatInstanceTiming {
            seeds: None,
            durations: StateDurations {
                state0: StateDuration::range(0.5, 3.0),
                state1: StateDuration::range(1.0, 2.0),
                state2: StateDuration::range(0.5, 1.5),
                state3: StateDuration::fixed(1.5),
            },
        },
        Transform::from_xyz(4.0, 0.0, 0.0),
    ));
}

fn spawn_ui(commands: &mut Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new(""),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    left: Val::Px(12.0),
                    ..default()
                },
                DemoHud,
            ));
        });
}
