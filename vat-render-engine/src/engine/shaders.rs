//! Embedded VAT shaders.
//!
//! The sampling library is registered under the `vat::sampling` import path so
//! that caller-supplied vertex and fragment overrides can always import it.
use bevy::asset::{load_internal_asset, weak_handle};
use bevy::prelude::*;

pub const VAT_SAMPLING_SHADER_HANDLE: Handle<Shader> =
    weak_handle!("6f0d3c2a-51e4-4b7e-9a8e-2c4b1f7d9e01");

/// Forward vertex stage: samples position and normal at the current frame.
pub const VAT_VERTEX_SHADER_HANDLE: Handle<Shader> =
    weak_handle!("6f0d3c2a-51e4-4b7e-9a8e-2c4b1f7d9e02");

/// Prepass vertex stage, shared by the depth, normal and shadow passes.
pub const VAT_PREPASS_SHADER_HANDLE: Handle<Shader> =
    weak_handle!("6f0d3c2a-51e4-4b7e-9a8e-2c4b1f7d9e03");

/// Shader def that switches the prepass from the rest pose to animated positions.
pub const VAT_ANIMATED_DEPTH_DEF: &str = "VAT_ANIMATED_DEPTH";

pub fn register_vat_shaders(app: &mut App) {
    load_internal_asset!(
        app,
        VAT_SAMPLING_SHADER_HANDLE,
        "shaders/vat_sampling.wgsl",
        Shader::from_wgsl
    );
    load_internal_asset!(
        app,
        VAT_VERTEX_SHADER_HANDLE,
        "shaders/vat_vertex.wgsl",
        Shader::from_wgsl
    );
    load_internal_asset!(
        app,
        VAT_PREPASS_SHADER_HANDLE,
        "shaders/vat_prepass.wgsl",
        Shader::from_wgsl
    );
}
