use crate::engine::assets::paths::file_extension;
use crate::engine::loading::error::VatLoadError;
use bevy::asset::RenderAssetUsages;
use bevy::gltf::GltfAssetLabel;
use bevy::image::{ExrTextureLoaderSettings, ImageLoaderSettings, ImageSampler};
use bevy::prelude::*;

/// Mesh loader chosen from the file extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshSource {
    /// `.glb`: binary interchange scene.
    GltfBinary(String),
    /// `.gltf`: JSON scene with embedded or sidecar buffers.
    GltfText(String),
}

impl MeshSource {
    pub fn from_path(path: String) -> Result<Self, VatLoadError> {
        match file_extension(&path).as_deref() {
            Some("glb") => Ok(Self::GltfBinary(path)),
            Some("gltf") => Ok(Self::GltfText(path)),
            other => Err(VatLoadError::UnsupportedMeshFormat {
                extension: other.unwrap_or_default().to_string(),
                path,
            }),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::GltfBinary(path) | Self::GltfText(path) => path,
        }
    }

    /// Request the first scene of the file. Both variants go through the glTF loader.
    pub fn load(&self, asset_server: &AssetServer) -> Handle<Scene> {
        asset_server.load(GltfAssetLabel::Scene(0).from_asset(self.path().to_string()))
    }
}

/// Texture loader chosen from the file extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureSource {
    /// `.exr`: decoded as RGBA32F so deltas outside [0, 1] survive.
    HdrFloat(String),
    /// Any other image format, decoded as linear 8-bit.
    Standard8Bit(String),
}

impl TextureSource {
    pub fn from_path(path: String) -> Self {
        match file_extension(&path).as_deref() {
            Some("exr") => Self::HdrFloat(path),
            _ => Self::Standard8Bit(path),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::HdrFloat(path) | Self::Standard8Bit(path) => path,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Self::HdrFloat(_))
    }

    pub fn load(&self, asset_server: &AssetServer) -> Handle<Image> {
        match self {
            Self::HdrFloat(path) => asset_server.load_with_settings(
                path.clone(),
                |settings: &mut ExrTextureLoaderSettings| {
                    settings.asset_usage = RenderAssetUsages::default();
                },
            ),
            Self::Standard8Bit(path) => asset_server.load_with_settings(
                path.clone(),
                |settings: &mut ImageLoaderSettings| {
                    // Baked data, not colour: keep it linear and unfiltered.
                    settings.is_srgb = false;
                    settings.sampler = ImageSampler::nearest();
                },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_source_selected_by_extension() {
        assert_eq!(
            MeshSource::from_path("vat/Rose.glb".into()),
            Ok(MeshSource::GltfBinary("vat/Rose.glb".into()))
        );
        assert_eq!(
            MeshSource::from_path("vat/Rose.GLTF".into()),
            Ok(MeshSource::GltfText("vat/Rose.GLTF".into()))
        );
    }

    #[test]
    fn unknown_mesh_extension_is_fatal() {
        let error = MeshSource::from_path("vat/Rose.fbx".into()).unwrap_err();
        assert_eq!(
            error,
            VatLoadError::UnsupportedMeshFormat {
                path: "vat/Rose.fbx".into(),
                extension: "fbx".into(),
            }
        );
        assert!(MeshSource::from_path("vat/no_extension".into()).is_err());
    }

    #[test]
    fn exr_textures_decode_as_float() {
        assert!(TextureSource::from_path("Rose_pos.exr".into()).is_float());
        assert!(TextureSource::from_path("Rose_pos.EXR".into()).is_float());
        assert!(!TextureSource::from_path("Rose_nrm.png".into()).is_float());
        assert!(!TextureSource::from_path("Rose_nrm.jpeg".into()).is_float());
    }
}
