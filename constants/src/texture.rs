/// Widest 1×N texture the frame compute pass will allocate.
/// Matches the default `max_texture_dimension_2d` of WebGPU downlevel limits.
pub const MAX_INSTANCE_TEXTURE_WIDTH: u32 = 8192;

/// Workgroup width declared by `frame_compute.wgsl`.
pub const FRAME_COMPUTE_WORKGROUP_SIZE: u32 = 64;

/// Bytes per RGBA32F texel.
pub const RGBA32F_TEXEL_BYTES: usize = 16;

/// Bytes per R32F texel.
pub const R32F_TEXEL_BYTES: usize = 4;
