/// Manifest loaded by the demo scene, relative to the `assets/` directory.
pub const DEMO_MANIFEST_PATH: &str = "vat/rose/Rose_meta.json";

/// Compute shader advancing per-instance phase values.
pub const FRAME_COMPUTE_SHADER_PATH: &str = "shaders/frame_compute.wgsl";
