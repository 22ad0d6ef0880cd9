use crate::engine::assembly::mount::VatMeshConfig;
use crate::engine::assets::bundle::VatAssetBundle;
use crate::engine::assets::manifest::VatManifest;
use crate::engine::assets::paths::resolve_asset_path;
use crate::engine::loading::error::VatLoadError;
use crate::engine::loading::sources::{MeshSource, TextureSource};
use crate::engine::material::controls::VatMaterialControls;
use crate::engine::material::factory::{VatCustomUniforms, VatShaderOverrides};
use crate::engine::playback::frame_driver::VatPlayback;
use bevy::asset::{LoadState, UntypedAssetId};
use bevy::prelude::*;
use bevy::render::render_resource::TextureFormat;

/// Mount point for one VAT asset. Spawning this starts the load.
///
/// Add `VatInstancing` (and optionally `VatInstanceTiming`) alongside it for an instanced mount.
#[derive(Component, Debug, Clone)]
#[require(
    VatAssetBundle,
    VatLoadStatus,
    VatPlayback,
    VatMaterialControls,
    VatMeshConfig,
    VatShaderOverrides,
    VatCustomUniforms,
    Transform,
    Visibility
)]
pub struct VatSource {
    pub manifest_path: String,
}

impl VatSource {
    pub fn new(manifest_path: impl Into<String>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
        }
    }
}

#[derive(Component, Debug, Clone, Default, PartialEq)]
pub enum VatLoadStatus {
    #[default]
    Pending,
    Complete,
    Failed(VatLoadError),
}

/// Raised once per asset when its load fails.
#[derive(Event, Debug, Clone)]
pub struct VatLoadFailed {
    pub entity: Entity,
    pub error: VatLoadError,
}

/// In-flight handles for one mount. Holding them keeps the loads alive.
#[derive(Component, Debug)]
pub struct VatLoadRequests {
    manifest_path: String,
    manifest: Handle<VatManifest>,
    sub_resources: Option<SubResourceRequests>,
}

#[derive(Debug)]
struct SubResourceRequests {
    mesh: (MeshSource, Handle<Scene>),
    position: (TextureSource, Handle<Image>),
    normal: Option<(TextureSource, Handle<Image>)>,
}

enum LoadOutcome {
    Pending,
    Loaded,
    Failed(String),
}

fn load_outcome(asset_server: &AssetServer, id: impl Into<UntypedAssetId>) -> LoadOutcome {
    match asset_server.get_load_state(id) {
        Some(LoadState::Loaded) => LoadOutcome::Loaded,
        Some(LoadState::Failed(error)) => LoadOutcome::Failed(error.to_string()),
        _ => LoadOutcome::Pending,
    }
}

/// Request the manifest for new mounts, and restart mounts whose manifest path changed.
pub fn start_manifest_loads(
    mut commands: Commands,
    sources: Query<(Entity, &VatSource, Option<&VatLoadRequests>), Changed<VatSource>>,
    asset_server: Res<AssetServer>,
) {
    for (entity, source, requests) in &sources {
        if requests.is_some_and(|requests| requests.manifest_path == source.manifest_path) {
            continue;
        }
        info!("Loading VAT manifest: {}", source.manifest_path);
        commands.entity(entity).insert((
            VatLoadRequests {
                manifest_path: source.manifest_path.clone(),
                manifest: asset_server.load(source.manifest_path.clone()),
                sub_resources: None,
            },
            VatAssetBundle::default(),
            VatLoadStatus::Pending,
        ));
    }
}

/// Once a manifest parses, validate it and dispatch every sub-resource load at once.
pub fn resolve_manifests(
    mut mounts: Query<(
        Entity,
        &mut VatLoadRequests,
        &mut VatAssetBundle,
        &mut VatLoadStatus,
    )>,
    manifests: Res<Assets<VatManifest>>,
    asset_server: Res<AssetServer>,
    mut failures: EventWriter<VatLoadFailed>,
) {
    for (entity, mut requests, mut bundle, mut status) in &mut mounts {
        if *status != VatLoadStatus::Pending || requests.sub_resources.is_some() {
            continue;
        }

        let manifest = match load_outcome(&asset_server, &requests.manifest) {
            LoadOutcome::Pending => continue,
            LoadOutcome::Failed(reason) => {
                let error = VatLoadError::Manifest {
                    path: requests.manifest_path.clone(),
                    reason,
                };
                fail_load(entity, &mut status, error, &mut failures);
                continue;
            }
            LoadOutcome::Loaded => match manifests.get(&requests.manifest) {
                Some(manifest) => manifest,
                None => continue,
            },
        };

        match request_sub_resources(&requests.manifest_path, manifest, &asset_server) {
            Ok(sub_resources) => {
                let metadata = &manifest.metadata;
                if !metadata.has_consistent_layout() {
                    warn!(
                        "VAT manifest {}: frameStride {} x columns {} != texWidth {}",
                        requests.manifest_path,
                        metadata.frame_stride,
                        metadata.columns,
                        metadata.tex_width
                    );
                }
                if !metadata.frames_fit_stride() {
                    warn!(
                        "VAT manifest {}: frameStride {} < frameCount {}, frames bleed into the next column",
                        requests.manifest_path,
                        metadata.frame_stride,
                        metadata.frame_count
                    );
                }
                if (metadata.vertex_count as u64) > metadata.vertex_capacity() {
                    warn!(
                        "VAT manifest {}: {} vertices exceed atlas capacity {}",
                        requests.manifest_path,
                        metadata.vertex_count,
                        metadata.vertex_capacity()
                    );
                }
                if sub_resources.normal.is_some() {
                    bundle.expect_normal_texture();
                }
                bundle.resolve_metadata(metadata.clone());
                requests.sub_resources = Some(sub_resources);
            }
            Err(error) => fail_load(entity, &mut status, error, &mut failures),
        }
    }
}

fn request_sub_resources(
    manifest_path: &str,
    manifest: &VatManifest,
    asset_server: &AssetServer,
) -> Result<SubResourceRequests, VatLoadError> {
    manifest.metadata.validate()?;

    let mesh = MeshSource::from_path(resolve_asset_path(manifest_path, &manifest.mesh))?;
    let position = TextureSource::from_path(resolve_asset_path(
        manifest_path,
        &manifest.textures.position,
    ));
    let normal = manifest
        .textures
        .normal
        .as_ref()
        .map(|normal| TextureSource::from_path(resolve_asset_path(manifest_path, normal)));

    debug!(
        "VAT sub-resources: mesh={} position={} normal={:?}",
        mesh.path(),
        position.path(),
        normal.as_ref().map(TextureSource::path)
    );

    let mesh_handle = mesh.load(asset_server);
    let position_handle = position.load(asset_server);
    let normal = normal.map(|source| {
        let handle = source.load(asset_server);
        (source, handle)
    });

    Ok(SubResourceRequests {
        mesh: (mesh, mesh_handle),
        position: (position, position_handle),
        normal,
    })
}

/// Move finished sub-resources into the bundle and flag completion or failure.
pub fn track_sub_resource_loads(
    mut mounts: Query<(
        Entity,
        &VatLoadRequests,
        &mut VatAssetBundle,
        &mut VatLoadStatus,
    )>,
    asset_server: Res<AssetServer>,
    images: Res<Assets<Image>>,
    mut failures: EventWriter<VatLoadFailed>,
) {
    for (entity, requests, mut bundle, mut status) in &mut mounts {
        if *status != VatLoadStatus::Pending {
            continue;
        }
        let Some(sub_resources) = &requests.sub_resources else {
            continue;
        };

        if let Err(error) = poll_sub_resources(sub_resources, &mut bundle, &asset_server, &images)
        {
            fail_load(entity, &mut status, error, &mut failures);
            continue;
        }

        if bundle.is_complete() {
            info!("✓ VAT asset ready: {}", requests.manifest_path);
            *status = VatLoadStatus::Complete;
        }
    }
}

fn poll_sub_resources(
    sub_resources: &SubResourceRequests,
    bundle: &mut VatAssetBundle,
    asset_server: &AssetServer,
    images: &Assets<Image>,
) -> Result<(), VatLoadError> {
    let (mesh_source, mesh_handle) = &sub_resources.mesh;
    if check_loaded(asset_server, mesh_handle, mesh_source.path())? {
        bundle.resolve_mesh_scene(mesh_handle.clone());
    }

    let (position_source, position_handle) = &sub_resources.position;
    if check_loaded(asset_server, position_handle, position_source.path())? {
        if position_source.is_float() {
            ensure_float_texture(images, position_handle, position_source.path())?;
        }
        bundle.resolve_position_texture(position_handle.clone());
    }

    if let Some((normal_source, normal_handle)) = &sub_resources.normal {
        if check_loaded(asset_server, normal_handle, normal_source.path())? {
            bundle.resolve_normal_texture(normal_handle.clone());
        }
    }

    Ok(())
}

fn check_loaded<A: Asset>(
    asset_server: &AssetServer,
    handle: &Handle<A>,
    path: &str,
) -> Result<bool, VatLoadError> {
    match load_outcome(asset_server, handle) {
        LoadOutcome::Pending => Ok(false),
        LoadOutcome::Loaded => Ok(true),
        LoadOutcome::Failed(reason) => Err(VatLoadError::SubResource {
            path: path.to_string(),
            reason,
        }),
    }
}

/// HDR position data must stay float; an 8-bit decode would clamp deltas.
fn ensure_float_texture(
    images: &Assets<Image>,
    handle: &Handle<Image>,
    path: &str,
) -> Result<(), VatLoadError> {
    let Some(image) = images.get(handle) else {
        return Ok(());
    };
    match image.texture_descriptor.format {
        TextureFormat::Rgba32Float | TextureFormat::Rgba16Float => Ok(()),
        other => Err(VatLoadError::PositionTextureNotFloat {
            path: path.to_string(),
            format: format!("{other:?}"),
        }),
    }
}

fn fail_load(
    entity: Entity,
    status: &mut VatLoadStatus,
    error: VatLoadError,
    failures: &mut EventWriter<VatLoadFailed>,
) {
    error!("VAT load failed: {error}");
    *status = VatLoadStatus::Failed(error.clone());
    failures.write(VatLoadFailed { entity, error });
}
