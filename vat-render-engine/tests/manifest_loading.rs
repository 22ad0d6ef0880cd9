use bevy::asset::io::Reader;
use bevy::asset::{AssetLoader, AssetMetaCheck, LoadContext};
use bevy::gltf::GltfAssetLabel;
use bevy::image::{ExrTextureLoaderSettings, ImageLoaderSettings};
use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;
use std::time::{Duration, Instant};
use vat_render_engine::engine::assets::bundle::VatAssetBundle;
use vat_render_engine::engine::assets::manifest::VatManifest;
use vat_render_engine::engine::loading::error::VatLoadError;
use vat_render_engine::engine::loading::manifest_loader::{
    VatLoadFailed, VatLoadStatus, VatSource, resolve_manifests, start_manifest_loads,
    track_sub_resource_loads,
};

/// Stands in for the glTF loader: every file yields an empty `Scene0`.
struct SceneFileLoader;

impl AssetLoader for SceneFileLoader {
    type Asset = Scene;
    type Settings = ();
    type Error = std::io::Error;

    async fn load(
        &self,
        _reader: &mut dyn Reader,
        _settings: &(),
        load_context: &mut LoadContext<'_>,
    ) -> Result<Scene, Self::Error> {
        load_context.add_labeled_asset(
            GltfAssetLabel::Scene(0).to_string(),
            Scene::new(World::new()),
        );
        Ok(Scene::new(World::new()))
    }

    fn extensions(&self) -> &[&str] {
        &["glb", "gltf"]
    }
}

/// 8-bit image loader. Files whose bytes start with `pending` never finish.
struct ByteImageLoader;

impl AssetLoader for ByteImageLoader {
    type Asset = Image;
    type Settings = ImageLoaderSettings;
    type Error = std::io::Error;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &ImageLoaderSettings,
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Image, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        if bytes.starts_with(b"pending") {
            std::future::pending::<()>().await;
        }
        Ok(Image::default())
    }

    fn extensions(&self) -> &[&str] {
        &["png"]
    }
}

/// EXR loader that decodes to 8-bit, as a misconfigured pipeline would.
struct ClampingExrLoader;

impl AssetLoader for ClampingExrLoader {
    type Asset = Image;
    type Settings = ExrTextureLoaderSettings;
    type Error = std::io::Error;

    async fn load(
        &self,
        _reader: &mut dyn Reader,
        _settings: &ExrTextureLoaderSettings,
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Image, Self::Error> {
        Ok(Image::default())
    }

    fn extensions(&self) -> &[&str] {
        &["exr"]
    }
}

#[derive(Resource, Default)]
struct ReportedFailures(Vec<VatLoadFailed>);

fn record_failures(mut events: EventReader<VatLoadFailed>, mut reported: ResMut<ReportedFailures>) {
    reported.0.extend(events.read().cloned());
}

fn loading_app() -> App {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        AssetPlugin {
            file_path: "tests/fixtures".into(),
            meta_check: AssetMetaCheck::Never,
            ..default()
        },
        JsonAssetPlugin::<VatManifest>::new(&["json"]),
    ))
    .init_asset::<Image>()
    .init_asset::<Scene>()
    .register_asset_loader(SceneFileLoader)
    .register_asset_loader(ByteImageLoader)
    .register_asset_loader(ClampingExrLoader)
    .add_event::<VatLoadFailed>()
    .init_resource::<ReportedFailures>()
    .add_systems(
        Update,
        (
            start_manifest_loads,
            resolve_manifests,
            track_sub_resource_loads,
            record_failures,
        )
            .chain(),
    );
    app
}

/// Update until `done` holds. Asset IO runs on the task pool, so this needs real time.
fn update_until(app: &mut App, mut done: impl FnMut(&App) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        app.update();
        if done(app) {
            return;
        }
        assert!(Instant::now() < deadline, "loads did not settle in time");
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn status(app: &App, mount: Entity) -> VatLoadStatus {
    app.world()
        .get::<VatLoadStatus>(mount)
        .cloned()
        .expect("mount has a load status")
}

fn bundle(app: &App, mount: Entity) -> &VatAssetBundle {
    app.world()
        .get::<VatAssetBundle>(mount)
        .expect("mount has a bundle")
}

fn settle(app: &mut App, mount: Entity) -> VatLoadStatus {
    update_until(app, |app| status(app, mount) != VatLoadStatus::Pending);
    status(app, mount)
}

fn load(manifest_path: &str) -> (App, Entity) {
    let mut app = loading_app();
    let mount = app.world_mut().spawn(VatSource::new(manifest_path)).id();
    (app, mount)
}

fn reported(app: &App) -> &[VatLoadFailed] {
    &app.world().resource::<ReportedFailures>().0
}

#[test]
fn complete_manifest_fills_the_bundle() {
    let (mut app, mount) = load("loaded/manifest.json");
    assert_eq!(settle(&mut app, mount), VatLoadStatus::Complete);

    let bundle = bundle(&app, mount);
    assert!(bundle.is_complete());
    assert!(bundle.normal_texture.is_some());
    let metadata = bundle.metadata.as_ref().expect("metadata resolved");
    assert_eq!(metadata.frame_count, 30);
    assert!(metadata.store_delta);
    assert!(reported(&app).is_empty());
}

#[test]
fn malformed_manifest_fails_and_reports_once() {
    let (mut app, mount) = load("malformed/manifest.json");
    let status = settle(&mut app, mount);
    assert!(
        matches!(
            &status,
            VatLoadStatus::Failed(VatLoadError::Manifest { path, .. }) if path == "malformed/manifest.json"
        ),
        "unexpected status {status:?}"
    );

    for _ in 0..5 {
        app.update();
    }
    let failures = reported(&app);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].entity, mount);
    assert!(matches!(failures[0].error, VatLoadError::Manifest { .. }));
}

#[test]
fn fbx_mesh_is_rejected_before_any_sub_resource_loads() {
    let (mut app, mount) = load("fbx/manifest.json");
    assert_eq!(
        settle(&mut app, mount),
        VatLoadStatus::Failed(VatLoadError::UnsupportedMeshFormat {
            path: "fbx/mesh.fbx".into(),
            extension: "fbx".into(),
        })
    );
    assert!(bundle(&app, mount).metadata.is_none());
    assert_eq!(reported(&app).len(), 1);
}

#[test]
fn zero_frame_manifest_is_invalid() {
    let (mut app, mount) = load("no_frames/manifest.json");
    assert!(matches!(
        settle(&mut app, mount),
        VatLoadStatus::Failed(VatLoadError::InvalidMetadata(_))
    ));
}

#[test]
fn missing_mesh_file_fails_the_mount() {
    let (mut app, mount) = load("missing_mesh/manifest.json");
    let status = settle(&mut app, mount);
    assert!(
        matches!(
            &status,
            VatLoadStatus::Failed(VatLoadError::SubResource { path, .. }) if path == "missing_mesh/mesh.glb"
        ),
        "unexpected status {status:?}"
    );
}

#[test]
fn eight_bit_position_data_is_rejected() {
    let (mut app, mount) = load("clamped_position/manifest.json");
    let status = settle(&mut app, mount);
    assert!(
        matches!(
            &status,
            VatLoadStatus::Failed(VatLoadError::PositionTextureNotFloat { path, .. }) if path == "clamped_position/position.exr"
        ),
        "unexpected status {status:?}"
    );
}

#[test]
fn pending_normal_texture_holds_back_completion() {
    let (mut app, mount) = load("waiting_normal/manifest.json");
    update_until(&mut app, |app| {
        let bundle = bundle(app, mount);
        bundle.mesh_scene.is_some() && bundle.position_texture.is_some()
    });
    for _ in 0..10 {
        app.update();
    }

    assert_eq!(status(&app, mount), VatLoadStatus::Pending);
    assert!(bundle(&app, mount).normal_texture.is_none());
    assert!(!bundle(&app, mount).is_complete());
}

#[test]
fn new_manifest_path_restarts_a_failed_mount() {
    let (mut app, mount) = load("malformed/manifest.json");
    assert!(matches!(settle(&mut app, mount), VatLoadStatus::Failed(_)));

    app.world_mut()
        .get_mut::<VatSource>(mount)
        .expect("mount has a source")
        .manifest_path = "loaded/manifest.json".into();
    app.update();
    assert_eq!(status(&app, mount), VatLoadStatus::Pending);

    assert_eq!(settle(&mut app, mount), VatLoadStatus::Complete);
}
