use crate::engine::assets::manifest::VatMetadata;
use crate::engine::material::controls::VatMaterialControls;
use crate::engine::material::vat_material::{
    CUSTOM_UNIFORM_SLOTS, VatCustomBlock, VatExtension, VatMaterial, VatUniform,
};
use bevy::prelude::*;

/// Caller-supplied replacements for the VAT vertex and fragment stages.
///
/// Overrides may `#import vat::sampling::{vat_frame, vat_position, vat_normal}`.
/// Changing either handle recompiles the program, so the mount is rebuilt.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct VatShaderOverrides {
    pub vertex: Option<Handle<Shader>>,
    pub fragment: Option<Handle<Shader>>,
}

impl VatShaderOverrides {
    pub fn revision(&self) -> (Option<AssetId<Shader>>, Option<AssetId<Shader>>) {
        (
            self.vertex.as_ref().map(Handle::id),
            self.fragment.as_ref().map(Handle::id),
        )
    }
}

/// Values bound to the `vat_custom` uniform and the two custom textures. Edits apply live.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct VatCustomUniforms {
    pub slots: [Vec4; CUSTOM_UNIFORM_SLOTS],
    /// `vat_custom_texture` / `vat_custom_sampler`.
    pub texture: Option<Handle<Image>>,
    /// `vat_custom_texture_secondary` / `vat_custom_sampler_secondary`.
    pub secondary_texture: Option<Handle<Image>>,
}

impl VatCustomUniforms {
    pub fn with_slot(mut self, slot: usize, value: Vec4) -> Self {
        if let Some(target) = self.slots.get_mut(slot) {
            *target = value;
        } else {
            warn!("Custom uniform slot {slot} out of range (max {CUSTOM_UNIFORM_SLOTS})");
        }
        self
    }

    pub fn block(&self) -> VatCustomBlock {
        VatCustomBlock { slots: self.slots }
    }

    pub fn apply(&self, material: &mut VatMaterial) {
        material.extension.custom = self.block();
        material.extension.custom_texture = self.texture.clone();
        material.extension.custom_texture_secondary = self.secondary_texture.clone();
    }
}

/// Everything a surface material is built from.
pub struct VatSurfaceInputs<'a> {
    pub position_texture: &'a Handle<Image>,
    pub normal_texture: Option<&'a Handle<Image>>,
    pub metadata: &'a VatMetadata,
    pub controls: &'a VatMaterialControls,
    pub overrides: &'a VatShaderOverrides,
    pub custom: &'a VatCustomUniforms,
}

pub fn vat_uniform(metadata: &VatMetadata, has_normal_texture: bool) -> VatUniform {
    VatUniform {
        frame: 0.0,
        frame_count: metadata.frame_count as f32,
        tex_width: metadata.tex_width as f32,
        tex_height: metadata.tex_height as f32,
        store_delta: metadata.store_delta as u32,
        normals_compressed: metadata.normals_compressed as u32,
        has_normal_texture: has_normal_texture as u32,
        per_instance_frames: 0,
        instance_texture_width: 0,
    }
}

pub fn create_surface_material(inputs: &VatSurfaceInputs) -> VatMaterial {
    let mut base = StandardMaterial::default();
    inputs.controls.apply_to_standard(&mut base);

    VatMaterial {
        base,
        extension: VatExtension {
            vat: vat_uniform(inputs.metadata, inputs.normal_texture.is_some()),
            position_texture: inputs.position_texture.clone(),
            normal_texture: inputs.normal_texture.cloned(),
            instance_frames: None,
            surface: inputs.controls.surface_uniform(),
            custom: inputs.custom.block(),
            custom_texture: inputs.custom.texture.clone(),
            custom_texture_secondary: inputs.custom.secondary_texture.clone(),
            animate_depth: false,
            vertex_shader: inputs.overrides.vertex.clone(),
            fragment_shader: inputs.overrides.fragment.clone(),
        },
    }
}

/// Animated depth for shadow casters.
///
/// Shadows are drawn with the surface material's own prepass, so the depth
/// program is a specialization of that material rather than a separate asset.
/// Surfaces without it cast shadows from the rest pose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VatDepthMaterial;

pub fn create_depth_material() -> VatDepthMaterial {
    VatDepthMaterial
}

impl VatDepthMaterial {
    pub fn install(self, surface: &mut VatMaterial) {
        surface.extension.animate_depth = true;
    }
}

/// Sample frames from the compute pass output instead of the shared frame uniform.
pub fn bind_instance_frames(surface: &mut VatMaterial, frames: Handle<Image>, texture_width: u32) {
    surface.extension.instance_frames = Some(frames);
    surface.extension.vat.per_instance_frames = 1;
    surface.extension.vat.instance_texture_width = texture_width;
}
