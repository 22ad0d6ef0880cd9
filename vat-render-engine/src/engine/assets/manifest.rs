use crate::engine::loading::error::VatLoadError;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Layout of the baked textures. Mirrors the JSON keys exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VatMetadata {
    pub vertex_count: u32,
    pub frame_count: u32,
    pub fps: f32,
    pub tex_width: u32,
    pub tex_height: u32,
    pub columns: u32,
    pub frame_stride: u32,
    /// Position texels are offsets from the rest pose rather than absolute positions.
    #[serde(default)]
    pub store_delta: bool,
    #[serde(default)]
    pub normals_compressed: bool,
}

/// Texture references inside a manifest, relative to the manifest unless absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestTextures {
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal: Option<String>,
}

/// VAT manifest as a Bevy asset, loaded through the JSON asset plugin.
#[derive(Asset, TypePath, Debug, Clone, Serialize, Deserialize)]
pub struct VatManifest {
    #[serde(alias = "glb")]
    pub mesh: String,
    pub textures: ManifestTextures,
    #[serde(flatten)]
    pub metadata: VatMetadata,
}

impl VatMetadata {
    /// Reject metadata the sampling math cannot work with.
    pub fn validate(&self) -> Result<(), VatLoadError> {
        if self.frame_count == 0 {
            return Err(VatLoadError::InvalidMetadata(
                "frameCount must be greater than zero".into(),
            ));
        }
        if self.tex_width == 0 || self.tex_height == 0 {
            return Err(VatLoadError::InvalidMetadata(format!(
                "texture size {}x{} is empty",
                self.tex_width, self.tex_height
            )));
        }
        if self.frame_stride == 0 || self.columns == 0 {
            return Err(VatLoadError::InvalidMetadata(
                "frameStride and columns must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// True when `frameStride * columns` matches the texture width the sampler assumes.
    pub fn has_consistent_layout(&self) -> bool {
        self.frame_stride.checked_mul(self.columns) == Some(self.tex_width)
    }

    /// True when every frame of a column stays inside that column's stride.
    pub fn frames_fit_stride(&self) -> bool {
        self.frame_stride >= self.frame_count
    }

    /// Number of vertices the atlas can address.
    pub fn vertex_capacity(&self) -> u64 {
        self.columns as u64 * self.tex_height as u64
    }

    /// Playback rate, falling back when the bake reported none.
    pub fn effective_fps(&self) -> f32 {
        if self.fps > 0.0 {
            self.fps
        } else {
            constants::playback::FALLBACK_FPS
        }
    }
}
