//! Shared constants for the VAT render engine.
//!
//! Values here are consumed by both the engine library and the demo binary so
//! that playback margins, default timing and material presets stay in one place.

/// Asset paths used by the engine and the demo scene.
pub mod path;

/// Frame driver constants.
pub mod playback;

/// Default physically based material preset for VAT surfaces.
pub mod render_settings;

/// Texture layout limits and formats for baked and computed textures.
pub mod texture;

/// Default duration ranges for the per-instance phase cycle.
pub mod timing;
