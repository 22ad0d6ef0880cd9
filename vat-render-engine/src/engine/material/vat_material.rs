use crate::engine::shaders::{
    VAT_ANIMATED_DEPTH_DEF, VAT_PREPASS_SHADER_HANDLE, VAT_VERTEX_SHADER_HANDLE,
};
use bevy::pbr::{
    ExtendedMaterial, MaterialExtension, MaterialExtensionKey, MaterialExtensionPipeline,
};
use bevy::prelude::*;
use bevy::render::mesh::MeshVertexBufferLayoutRef;
use bevy::render::render_resource::{
    AsBindGroup, RenderPipelineDescriptor, ShaderRef, ShaderType, SpecializedMeshPipelineError,
};

/// Standard PBR shading with VAT vertex animation.
pub type VatMaterial = ExtendedMaterial<StandardMaterial, VatExtension>;

/// Number of vec4 slots available to custom shaders.
pub const CUSTOM_UNIFORM_SLOTS: usize = 8;

/// Per-material animation state. Layout matches `VatUniform` in `vat_sampling.wgsl`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Reflect, ShaderType)]
pub struct VatUniform {
    pub frame: f32,
    pub frame_count: f32,
    pub tex_width: f32,
    pub tex_height: f32,
    pub store_delta: u32,
    pub normals_compressed: u32,
    pub has_normal_texture: u32,
    pub per_instance_frames: u32,
    pub instance_texture_width: u32,
}

/// PBR lobes `StandardMaterial` has no slot for. Only read by custom shaders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Reflect, ShaderType)]
pub struct VatSurfaceUniform {
    pub sheen_color: Vec4,
    pub sheen: f32,
    pub sheen_roughness: f32,
    pub iridescence: f32,
    pub iridescence_ior: f32,
    pub iridescence_thickness_range: Vec2,
    pub env_map_intensity: f32,
    pub bump_scale: f32,
    pub normal_scale: Vec2,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Reflect, ShaderType)]
pub struct VatCustomBlock {
    pub slots: [Vec4; CUSTOM_UNIFORM_SLOTS],
}

/// Pipeline key: anything here changes the compiled program.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VatMaterialKey {
    pub animate_depth: bool,
    pub vertex_shader: Option<AssetId<Shader>>,
    pub fragment_shader: Option<AssetId<Shader>>,
}

impl From<&VatExtension> for VatMaterialKey {
    fn from(extension: &VatExtension) -> Self {
        Self {
            animate_depth: extension.animate_depth,
            vertex_shader: extension.vertex_shader.as_ref().map(Handle::id),
            fragment_shader: extension.fragment_shader.as_ref().map(Handle::id),
        }
    }
}

/// VAT bindings start at 100 to stay clear of `StandardMaterial`.
#[derive(Asset, AsBindGroup, Reflect, Debug, Clone)]
#[bind_group_data(VatMaterialKey)]
pub struct VatExtension {
    #[uniform(100)]
    pub vat: VatUniform,

    #[texture(101, sample_type = "float", filterable = false)]
    pub position_texture: Handle<Image>,

    #[texture(102, sample_type = "float", filterable = false)]
    pub normal_texture: Option<Handle<Image>>,

    /// Per-instance frame texture written by the frame compute pass.
    #[texture(103, sample_type = "float", filterable = false)]
    pub instance_frames: Option<Handle<Image>>,

    #[uniform(104)]
    pub surface: VatSurfaceUniform,

    #[uniform(105)]
    pub custom: VatCustomBlock,

    #[texture(106)]
    #[sampler(107)]
    pub custom_texture: Option<Handle<Image>>,

    #[texture(108)]
    #[sampler(109)]
    pub custom_texture_secondary: Option<Handle<Image>>,

    /// Animate the prepass (and with it, shadows) instead of using the rest pose.
    pub animate_depth: bool,
    pub vertex_shader: Option<Handle<Shader>>,
    pub fragment_shader: Option<Handle<Shader>>,
}

impl MaterialExtension for VatExtension {
    fn vertex_shader() -> ShaderRef {
        VAT_VERTEX_SHADER_HANDLE.into()
    }

    fn prepass_vertex_shader() -> ShaderRef {
        VAT_PREPASS_SHADER_HANDLE.into()
    }

    fn deferred_vertex_shader() -> ShaderRef {
        VAT_PREPASS_SHADER_HANDLE.into()
    }

    fn specialize(
        _pipeline: &MaterialExtensionPipeline,
        descriptor: &mut RenderPipelineDescriptor,
        _layout: &MeshVertexBufferLayoutRef,
        key: MaterialExtensionKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        let key = key.bind_group_data;
        let stage = descriptor.vertex.shader.id();

        if stage == VAT_PREPASS_SHADER_HANDLE.id() {
            // Both windings cast shadows regardless of the surface's culling.
            descriptor.primitive.cull_mode = None;
            if key.animate_depth {
                descriptor
                    .vertex
                    .shader_defs
                    .push(VAT_ANIMATED_DEPTH_DEF.into());
            }
            return Ok(());
        }

        if stage == VAT_VERTEX_SHADER_HANDLE.id() {
            if let Some(vertex) = key.vertex_shader {
                descriptor.vertex.shader = Handle::Weak(vertex);
            }
            if let (Some(fragment), Some(fragment_state)) =
                (key.fragment_shader, descriptor.fragment.as_mut())
            {
                fragment_state.shader = Handle::Weak(fragment);
            }
        }
        Ok(())
    }
}

impl VatExtension {
    /// True when the shadow pass follows the animation.
    pub fn has_depth_override(&self) -> bool {
        self.animate_depth
    }
}
