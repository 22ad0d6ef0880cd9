use crate::engine::assembly::environment::VatEnvironment;
use crate::engine::assets::bundle::VatAssetBundle;
use crate::engine::assets::manifest::VatMetadata;
use crate::engine::compute::frame_compute::{VatFrameCompute, VatInstanceTiming};
use crate::engine::loading::manifest_loader::VatLoadStatus;
use crate::engine::material::controls::VatMaterialControls;
use crate::engine::material::factory::{
    VatCustomUniforms, VatShaderOverrides, VatSurfaceInputs, bind_instance_frames,
    create_depth_material, create_surface_material,
};
use crate::engine::material::vat_material::VatMaterial;
use crate::engine::mesh::geometry::{ensure_vat_uv2, extract_geometry};
use crate::engine::plugin::VatPluginSettings;
use bevy::pbr::{NotShadowCaster, NotShadowReceiver};
use bevy::prelude::*;
use bevy::render::mesh::MeshTag;
use bevy::render::view::NoFrustumCulling;

/// Presentation flags for a mount's primitives. Applied live, except
/// `use_depth_material`, which changes the program and rebuilds.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct VatMeshConfig {
    pub use_depth_material: bool,
    pub cast_shadows: bool,
    pub receive_shadows: bool,
    pub frustum_culling: bool,
}

impl Default for VatMeshConfig {
    fn default() -> Self {
        Self {
            use_depth_material: true,
            cast_shadows: true,
            receive_shadows: true,
            // Animated vertices leave the rest-pose bounds.
            frustum_culling: false,
        }
    }
}

/// Static instance layout. Its presence turns a mount into an instanced mount.
///
/// Missing or short arrays fall back to the origin, no rotation and unit scale.
/// Rotations are Euler XYZ in radians.
#[derive(Component, Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct VatInstancing {
    pub count: u32,
    pub positions: Option<Vec<Vec3>>,
    pub rotations: Option<Vec<Vec3>>,
    pub scales: Option<Vec<Vec3>>,
}

impl VatInstancing {
    pub fn new(count: u32) -> Self {
        Self {
            count,
            ..default()
        }
    }

    pub fn transform(&self, index: usize) -> Transform {
        let pick = |values: &Option<Vec<Vec3>>| values.as_ref().and_then(|v| v.get(index)).copied();
        let rotation = pick(&self.rotations)
            .map(|r| Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z))
            .unwrap_or(Quat::IDENTITY);
        Transform {
            translation: pick(&self.positions).unwrap_or(Vec3::ZERO),
            rotation,
            scale: pick(&self.scales).unwrap_or(Vec3::ONE),
        }
    }
}


/// Everything that, when changed, needs new primitives rather than a uniform update.
#[derive(Debug, Clone, PartialEq)]
pub struct RebuildKey {
    scene: AssetId<Scene>,
    position_texture: AssetId<Image>,
    normal_texture: Option<AssetId<Image>>,
    metadata: VatMetadata,
    use_depth_material: bool,
    shaders: (Option<AssetId<Shader>>, Option<AssetId<Shader>>),
    instancing: Option<VatInstancing>,
    timing: Option<VatInstanceTiming>,
    environment: Option<(AssetId<Image>, AssetId<Image>)>,
    tangents: bool,
}

impl RebuildKey {
    /// `None` until the bundle has everything assembly needs.
    pub fn new(
        bundle: &VatAssetBundle,
        config: &VatMeshConfig,
        overrides: &VatShaderOverrides,
        instancing: Option<&VatInstancing>,
        timing: Option<&VatInstanceTiming>,
        environment: Option<&VatEnvironment>,
    ) -> Option<Self> {
        if !bundle.is_complete() {
            return None;
        }
        Some(Self {
            scene: bundle.mesh_scene.as_ref()?.id(),
            position_texture: bundle.position_texture.as_ref()?.id(),
            normal_texture: bundle.normal_texture.as_ref().map(Handle::id),
            metadata: bundle.metadata.clone()?,
            use_depth_material: config.use_depth_material,
            shaders: overrides.revision(),
            instancing: instancing.cloned(),
            timing: instancing.and(timing).cloned(),
            environment: environment.map(VatEnvironment::maps),
            tangents: false,
        })
    }

    /// Normal-mapped mounts need tangents on the shared mesh.
    pub fn with_tangents(mut self, tangents: bool) -> Self {
        self.tangents = tangents;
        self
    }
}

/// Live primitives of a mount and the assets they share.
#[derive(Component, Debug)]
pub struct VatAssembly {
    key: RebuildKey,
    pub primitives: Vec<Entity>,
    pub mesh: Handle<Mesh>,
    pub material: Handle<VatMaterial>,
    pub metadata: VatMetadata,
}

/// One renderable child of a mount. `instance` is set on instanced mounts.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VatPrimitive {
    pub mount: Entity,
    pub instance: Option<u32>,
}

type MountQuery = (
    Entity,
    &'static VatAssetBundle,
    &'static VatLoadStatus,
    &'static VatMaterialControls,
    &'static VatMeshConfig,
    &'static VatShaderOverrides,
    &'static VatCustomUniforms,
    Option<&'static VatInstancing>,
    Option<&'static VatInstanceTiming>,
    Option<&'static VatAssembly>,
);

/// Build primitives for complete mounts, and rebuild them when their `RebuildKey` changes.
/// Old primitives and their assets are released before the new ones are created.
pub fn assemble_vat_meshes(
    mut commands: Commands,
    mounts: Query<MountQuery>,
    scenes: Res<Assets<Scene>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<VatMaterial>>,
    mut images: ResMut<Assets<Image>>,
    environment: Option<Res<VatEnvironment>>,
    settings: Option<Res<VatPluginSettings>>,
) {
    let max_texture_width = settings
        .map(|settings| settings.max_instance_texture_width)
        .unwrap_or(constants::texture::MAX_INSTANCE_TEXTURE_WIDTH);

    for (
        mount,
        bundle,
        status,
        controls,
        config,
        overrides,
        custom,
        instancing,
        timing,
        assembly,
    ) in &mounts
    {
        if *status != VatLoadStatus::Complete {
            continue;
        }
        let Some(key) = RebuildKey::new(
            bundle,
            config,
            overrides,
            instancing,
            timing,
            environment.as_deref(),
        )
        .map(|key| key.with_tangents(controls.normal_map.is_some())) else {
            continue;
        };
        if assembly.is_some_and(|assembly| assembly.key == key) {
            continue;
        }

        let (Some(scene_handle), Some(position_texture), Some(metadata)) = (
            &bundle.mesh_scene,
            &bundle.position_texture,
            &bundle.metadata,
        ) else {
            continue;
        };
        let Some(scene) = scenes.get(scene_handle) else {
            continue;
        };
        let Some(mut geometry) = extract_geometry(scene, &meshes) else {
            debug!("VAT mount {mount}: no geometry available yet");
            continue;
        };

        if let Some(previous) = assembly {
            dispose_assembly(&mut commands, previous, &mut meshes, &mut materials);
        }

        ensure_vat_uv2(&mut geometry, metadata);
        if key.tangents && geometry.attribute(Mesh::ATTRIBUTE_TANGENT).is_none() {
            if let Err(error) = geometry.generate_tangents() {
                warn!("VAT mount {mount}: normal map ignored, no tangents: {error}");
            }
        }
        let mut material = create_surface_material(&VatSurfaceInputs {
            position_texture,
            normal_texture: bundle.normal_texture.as_ref(),
            metadata,
            controls,
            overrides,
            custom,
        });
        if config.use_depth_material {
            create_depth_material().install(&mut material);
        }

        let compute = match (instancing, timing) {
            (Some(instancing), Some(timing)) => Some(VatFrameCompute::new(
                &mut images,
                instancing.count,
                metadata.frame_count,
                timing,
                max_texture_width,
            )),
            _ => None,
        };
        if let Some(exposed) = compute.as_ref().and_then(VatFrameCompute::exposed_texture) {
            let width = compute.as_ref().map_or(1, VatFrameCompute::texture_width);
            bind_instance_frames(&mut material, exposed.clone(), width);
        }

        let mesh = meshes.add(geometry);
        let material = materials.add(material);

        let primitives: Vec<Entity> = match instancing {
            Some(instancing) => (0..instancing.count)
                .map(|index| {
                    let primitive = spawn_primitive(
                        &mut commands,
                        mount,
                        &mesh,
                        &material,
                        instancing.transform(index as usize),
                        Some(index),
                    );
                    commands.entity(primitive).insert(MeshTag(index));
                    apply_mesh_config(&mut commands, primitive, config);
                    primitive
                })
                .collect(),
            None => {
                let primitive = spawn_primitive(
                    &mut commands,
                    mount,
                    &mesh,
                    &material,
                    Transform::default(),
                    None,
                );
                apply_mesh_config(&mut commands, primitive, config);
                vec![primitive]
            }
        };

        info!(
            "VAT mount {mount} assembled: {} primitive(s), depth material {}",
            primitives.len(),
            if config.use_depth_material { "on" } else { "off" }
        );

        let mut entity = commands.entity(mount);
        match compute {
            Some(compute) => {
                entity.insert(compute);
            }
            None => {
                entity.remove::<VatFrameCompute>();
            }
        }
        entity.insert(VatAssembly {
            key,
            primitives,
            mesh,
            material,
            metadata: metadata.clone(),
        });
    }
}

fn spawn_primitive(
    commands: &mut Commands,
    mount: Entity,
    mesh: &Handle<Mesh>,
    material: &Handle<VatMaterial>,
    transform: Transform,
    instance: Option<u32>,
) -> Entity {
    commands
        .spawn((
            Mesh3d(mesh.clone()),
            MeshMaterial3d(material.clone()),
            transform,
            VatPrimitive { mount, instance },
            ChildOf(mount),
        ))
        .id()
}

fn dispose_assembly(
    commands: &mut Commands,
    assembly: &VatAssembly,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<VatMaterial>,
) {
    for primitive in &assembly.primitives {
        if let Ok(mut entity) = commands.get_entity(*primitive) {
            entity.despawn();
        }
    }
    meshes.remove(&assembly.mesh);
    materials.remove(&assembly.material);
}

fn apply_mesh_config(commands: &mut Commands, primitive: Entity, config: &VatMeshConfig) {
    let Ok(mut entity) = commands.get_entity(primitive) else {
        return;
    };
    if config.cast_shadows {
        entity.remove::<NotShadowCaster>();
    } else {
        entity.insert(NotShadowCaster);
    }
    if config.receive_shadows {
        entity.remove::<NotShadowReceiver>();
    } else {
        entity.insert(NotShadowReceiver);
    }
    if config.frustum_culling {
        entity.remove::<NoFrustumCulling>();
    } else {
        entity.insert(NoFrustumCulling);
    }
}

/// Apply control edits to live materials.
pub fn sync_material_controls(
    mounts: Query<(&VatMaterialControls, &VatAssembly), Changed<VatMaterialControls>>,
    mut materials: ResMut<Assets<VatMaterial>>,
) {
    for (controls, assembly) in &mounts {
        if let Some(material) = materials.get_mut(&assembly.material) {
            controls.apply(material);
        }
    }
}

pub fn sync_custom_uniforms(
    mounts: Query<(&VatCustomUniforms, &VatAssembly), Changed<VatCustomUniforms>>,
    mut materials: ResMut<Assets<VatMaterial>>,
) {
    for (custom, assembly) in &mounts {
        if let Some(material) = materials.get_mut(&assembly.material) {
            custom.apply(material);
        }
    }
}

/// Shadow and culling flags follow `VatMeshConfig` without a rebuild.
pub fn sync_mesh_config(
    mut commands: Commands,
    mounts: Query<(&VatMeshConfig, &VatAssembly), Changed<VatMeshConfig>>,
) {
    for (config, assembly) in &mounts {
        for primitive in &assembly.primitives {
            apply_mesh_config(&mut commands, *primitive, config);
        }
    }
}
