use bevy::color::Color;

/// Baseline physically based parameters for a VAT surface.
/// Mirrors the knobs exposed on the control surface; unsupported PBR lobes (sheen, iridescence)
/// are still carried so override fragment shaders can read them.
#[derive(Debug, Clone, Copy)]
pub struct MaterialPreset {
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
}

pub const DEFAULT_MATERIAL: MaterialPreset = MaterialPreset {
    base_color: Color::WHITE,
    roughness: 1.0,
    metalness: 0.05,
    transmission: 0.0,
    thickness: 0.0,
    ior: 1.5,
    clearcoat: 0.0,
    clearcoat_roughness: 0.0,
    reflectivity: 0.5,
    env_map_intensity: 1.0,
    sheen: 0.0,
    sheen_roughness: 1.0,
    sheen_color: Color::BLACK,
    iridescence: 0.0,
    iridescence_ior: 1.3,
    iridescence_thickness_min: 100.0,
    iridescence_thickness_max: 400.0,
    attenuation_distance: f32::INFINITY,
    attenuation_color: Color::WHITE,
    bump_scale: 1.0,
    transparent: false,
    double_sided: true,
};
