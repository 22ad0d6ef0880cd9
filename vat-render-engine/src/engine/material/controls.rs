use crate::engine::material::vat_material::{VatMaterial, VatSurfaceUniform};
use bevy::color::ColorToComponents;
use bevy::prelude::*;
use bevy::render::render_resource::Face;
use constants::render_settings::{DEFAULT_MATERIAL, MaterialPreset};

/// Live PBR parameters for a VAT mount. Edits apply to existing materials without a rebuild.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct VatMaterialControls {
    pub base_color: Color,
    pub roughness: f32,
    pub metalness: f32,
    pub transmission: f32,
    pub thickness: f32,
    pub ior: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub reflectivity: f32,
    pub env_map_intensity: f32,
    pub sheen: f32,
    pub sheen_roughness: f32,
    pub sheen_color: Color,
    pub iridescence: f32,
    pub iridescence_ior: f32,
    pub iridescence_thickness_min: f32,
    pub iridescence_thickness_max: f32,
    pub attenuation_distance: f32,
    pub attenuation_color: Color,
    pub bump_scale: f32,
    pub transparent: bool,
    pub double_sided: bool,
    /// Sampled with the mesh's first UV set.
    pub base_color_texture: Option<Handle<Image>>,
    /// Tangent-space normal map. Its presence generates tangents, so toggling it rebuilds the mount.
    pub normal_map: Option<Handle<Image>>,
    /// Only read by custom fragment shaders; the standard PBR path has no normal scale.
    pub normal_scale: Vec2,
}

impl Default for VatMaterialControls {
    fn default() -> Self {
        Self::from(DEFAULT_MATERIAL)
    }
}

impl From<MaterialPreset> for VatMaterialControls {
    fn from(preset: MaterialPreset) -> Self {
        Self {
            base_color: preset.base_color,
            roughness: preset.roughness,
            metalness: preset.metalness,
            transmission: preset.transmission,
            thickness: preset.thickness,
            ior: preset.ior,
            clearcoat: preset.clearcoat,
            clearcoat_roughness: preset.clearcoat_roughness,
            reflectivity: preset.reflectivity,
            env_map_intensity: preset.env_map_intensity,
            sheen: preset.sheen,
            sheen_roughness: preset.sheen_roughness,
            sheen_color: preset.sheen_color,
            iridescence: preset.iridescence,
            iridescence_ior: preset.iridescence_ior,
            iridescence_thickness_min: preset.iridescence_thickness_min,
            iridescence_thickness_max: preset.iridescence_thickness_max,
            attenuation_distance: preset.attenuation_distance,
            attenuation_color: preset.attenuation_color,
            bump_scale: preset.bump_scale,
            transparent: preset.transparent,
            double_sided: preset.double_sided,
            base_color_texture: None,
            normal_map: None,
            normal_scale: Vec2::ONE,
        }
    }
}

impl VatMaterialControls {
    pub fn apply_to_standard(&self, material: &mut StandardMaterial) {
        material.base_color = self.base_color;
        material.perceptual_roughness = self.roughness.clamp(0.0, 1.0);
        material.metallic = self.metalness.clamp(0.0, 1.0);
        material.specular_transmission = self.transmission.clamp(0.0, 1.0);
        material.thickness = self.thickness.max(0.0);
        material.ior = self.ior;
        material.clearcoat = self.clearcoat;
        material.clearcoat_perceptual_roughness = self.clearcoat_roughness;
        material.reflectance = self.reflectivity;
        material.attenuation_distance = self.attenuation_distance;
        material.attenuation_color = self.attenuation_color;
        material.alpha_mode = if self.transparent {
            AlphaMode::Blend
        } else {
            AlphaMode::Opaque
        };
        material.double_sided = self.double_sided;
        material.cull_mode = if self.double_sided {
            None
        } else {
            Some(Face::Back)
        };
        material.base_color_texture = self.base_color_texture.clone();
        material.normal_map_texture = self.normal_map.clone();
    }

    pub fn surface_uniform(&self) -> VatSurfaceUniform {
        VatSurfaceUniform {
            sheen_color: self.sheen_color.to_linear().to_vec4(),
            sheen: self.sheen,
            sheen_roughness: self.sheen_roughness,
            iridescence: self.iridescence,
            iridescence_ior: self.iridescence_ior,
            iridescence_thickness_range: Vec2::new(
                self.iridescence_thickness_min,
                self.iridescence_thickness_max,
            ),
            env_map_intensity: self.env_map_intensity,
            bump_scale: self.bump_scale,
            normal_scale: self.normal_scale,
        }
    }

    /// Push every field onto a live material. Never touches animation state or the pipeline key.
    pub fn apply(&self, material: &mut VatMaterial) {
        self.apply_to_standard(&mut material.base);
        material.extension.surface = self.surface_uniform();
    }
}
