use crate::engine::assembly::environment::apply_vat_environment;
use crate::engine::assembly::mount::{
    VatInstancing, VatMeshConfig, assemble_vat_meshes, sync_custom_uniforms,
    sync_material_controls, sync_mesh_config,
};
use crate::engine::assets::manifest::VatManifest;
use crate::engine::compute::frame_compute::{
    FrameComputeJobs, VatInstanceTiming, bind_exposed_frame_textures, dispose_frame_compute,
    tick_frame_compute,
};
use crate::engine::compute::render::{FrameComputeRenderState, run_frame_compute};
use crate::engine::loading::manifest_loader::{
    VatLoadFailed, resolve_manifests, start_manifest_loads, track_sub_resource_loads,
};
use crate::engine::material::controls::VatMaterialControls;
use crate::engine::material::vat_material::VatMaterial;
use crate::engine::playback::frame_driver::{VatPlayback, drive_vat_frames};
use crate::engine::shaders::register_vat_shaders;
use bevy::prelude::*;
use bevy::render::extract_resource::{ExtractResource, ExtractResourcePlugin};
use bevy::render::{Render, RenderApp, RenderSet};
use bevy_common_assets::json::JsonAssetPlugin;
use constants::path::FRAME_COMPUTE_SHADER_PATH;
use constants::texture::MAX_INSTANCE_TEXTURE_WIDTH;

/// Engine-wide settings, mirrored into the render world.
#[derive(Resource, Debug, Clone, PartialEq, ExtractResource, Reflect)]
#[reflect(Resource)]
pub struct VatPluginSettings {
    /// Instance textures wrap onto further rows past this width.
    pub max_instance_texture_width: u32,
    pub compute_shader_path: String,
}

impl Default for VatPluginSettings {
    fn default() -> Self {
        Self {
            max_instance_texture_width: MAX_INSTANCE_TEXTURE_WIDTH,
            compute_shader_path: FRAME_COMPUTE_SHADER_PATH.to_string(),
        }
    }
}

/// Stages of the VAT pipeline within `Update`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VatSystems {
    Load,
    Assemble,
    Sync,
    Animate,
}

/// Loads, assembles and animates every `VatSource` mount.
pub struct VatPlugin;

impl Plugin for VatPlugin {
    fn build(&self, app: &mut App) {
        register_vat_shaders(app);

        app.init_resource::<VatPluginSettings>()
            .init_resource::<FrameComputeJobs>()
            .add_event::<VatLoadFailed>()
            .register_type::<VatPluginSettings>()
            .register_type::<VatPlayback>()
            .register_type::<VatMaterialControls>()
            .register_type::<VatMeshConfig>()
            .register_type::<VatInstancing>()
            .register_type::<VatInstanceTiming>()
            // Registers VatManifest as a loadable asset type from JSON files.
            .add_plugins(JsonAssetPlugin::<VatManifest>::new(&["json"]))
            .add_plugins(MaterialPlugin::<VatMaterial>::default())
            .add_plugins(ExtractResourcePlugin::<FrameComputeJobs>::default())
            .add_plugins(ExtractResourcePlugin::<VatPluginSettings>::default())
            .add_observer(dispose_frame_compute)
            .configure_sets(
                Update,
                (
                    VatSystems::Load,
                    VatSystems::Assemble,
                    VatSystems::Sync,
                    VatSystems::Animate,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    (
                        start_manifest_loads,
                        resolve_manifests,
                        track_sub_resource_loads,
                    )
                        .chain()
                        .in_set(VatSystems::Load),
                    assemble_vat_meshes.in_set(VatSystems::Assemble),
                    (
                        sync_material_controls,
                        sync_custom_uniforms,
                        sync_mesh_config,
                        apply_vat_environment,
                    )
                        .in_set(VatSystems::Sync),
                    drive_vat_frames.in_set(VatSystems::Animate),
                    (tick_frame_compute, bind_exposed_frame_textures)
                        .chain()
                        .in_set(VatSystems::Animate),
                ),
            );

        let Some(render_app) = app.get_sub_app_mut(RenderApp) else {
            return;
        };
        render_app
            .init_resource::<FrameComputeRenderState>()
            .add_systems(Render, run_frame_compute.in_set(RenderSet::Queue));
    }
}
