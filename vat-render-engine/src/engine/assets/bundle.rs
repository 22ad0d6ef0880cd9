use crate::engine::assets::manifest::VatMetadata;
use bevy::prelude::*;

/// Everything needed to assemble a VAT primitive.
///
/// Fields fill in as their loads finish and are never cleared, so completeness
/// only ever moves from `false` to `true`.
#[derive(Component, Debug, Clone, Default)]
pub struct VatAssetBundle {
    pub mesh_scene: Option<Handle<Scene>>,
    pub position_texture: Option<Handle<Image>>,
    pub normal_texture: Option<Handle<Image>>,
    pub metadata: Option<VatMetadata>,
    expects_normal_texture: bool,
}

impl VatAssetBundle {
    /// Record that the manifest references a normal texture that must resolve before completion.
    /// Has no effect once the bundle is complete.
    pub fn expect_normal_texture(&mut self) {
        if self.normal_texture.is_none() && !self.is_complete() {
            self.expects_normal_texture = true;
        }
    }

    pub fn resolve_metadata(&mut self, metadata: VatMetadata) {
        self.metadata.get_or_insert(metadata);
    }

    pub fn resolve_mesh_scene(&mut self, scene: Handle<Scene>) {
        self.mesh_scene.get_or_insert(scene);
    }

    pub fn resolve_position_texture(&mut self, texture: Handle<Image>) {
        self.position_texture.get_or_insert(texture);
    }

    pub fn resolve_normal_texture(&mut self, texture: Handle<Image>) {
        self.normal_texture.get_or_insert(texture);
        self.expects_normal_texture = false;
    }

    /// Mesh, position texture and metadata are present, plus the normal texture if one was referenced.
    pub fn is_complete(&self) -> bool {
        self.mesh_scene.is_some()
            && self.position_texture.is_some()
            && self.metadata.is_some()
            && !self.expects_normal_texture
    }
}
