use crate::engine::compute::frame_compute::{FrameComputeJob, FrameComputeJobs};
use crate::engine::plugin::VatPluginSettings;
use bevy::prelude::*;
use bevy::render::{
    render_asset::RenderAssets,
    render_resource::{
        BindGroupEntry, BindGroupLayout, BindGroupLayoutEntry, BindingResource, BindingType,
        BufferBindingType, BufferInitDescriptor, BufferUsages, CachedComputePipelineId,
        CommandEncoder, CommandEncoderDescriptor, ComputePassDescriptor, ComputePipeline,
        ComputePipelineDescriptor, PipelineCache, ShaderStages, StorageTextureAccess,
        TextureFormat, TextureSampleType, TextureViewDimension,
    },
    renderer::{RenderDevice, RenderQueue},
    texture::GpuImage,
};
use constants::texture::FRAME_COMPUTE_WORKGROUP_SIZE;
use std::collections::HashSet;

/// Render-world state of the frame compute pipeline.
///
/// Init jobs that arrive before the pipeline has compiled, or before their
/// textures are uploaded, are held here and retried next frame. Step jobs are
/// dropped instead; the next tick supersedes them. Held jobs are dropped as
/// soon as their compute pass is no longer live.
#[derive(Resource, Default)]
pub struct FrameComputeRenderState {
    pipeline: Option<CachedComputePipelineId>,
    bind_group_layout: Option<BindGroupLayout>,
    pending: Vec<FrameComputeJob>,
}

/// Records this frame's frame compute dispatches into a private encoder and submits them.
///
/// Runs in `RenderSet::Queue`, before the view graph samples the results.
/// No view target or other shared render state is touched.
///
/// ### WGSL expectations:
/// ```wgsl
/// @group(0) @binding(0) var previous_state: texture_2d<f32>;
/// @group(0) @binding(1) var durations: texture_2d<f32>;
/// @group(0) @binding(2) var seeds: texture_2d<f32>;
/// @group(0) @binding(3) var next_state: texture_storage_2d<rgba32float, write>;
/// @group(0) @binding(4) var<uniform> params: FrameComputeParams;
/// ```
pub fn run_frame_compute(
    mut state: ResMut<FrameComputeRenderState>,
    jobs: Option<Res<FrameComputeJobs>>,
    settings: Option<Res<VatPluginSettings>>,
    render_device: Res<RenderDevice>,
    render_queue: Res<RenderQueue>,
    pipeline_cache: Res<PipelineCache>,
    gpu_images: Res<RenderAssets<GpuImage>>,
    asset_server: Res<AssetServer>,
) {
    if let Some(jobs) = &jobs {
        retain_live_jobs(&mut state.pending, &jobs.live);
        state.pending.extend(jobs.jobs.iter().cloned());
    }
    if state.pending.is_empty() {
        return;
    }

    if state.bind_group_layout.is_none() {
        let shader_path = settings
            .as_ref()
            .map(|settings| settings.compute_shader_path.clone())
            .unwrap_or_else(|| constants::path::FRAME_COMPUTE_SHADER_PATH.to_string());
        initialise_compute_pipeline(
            &mut state,
            &render_device,
            &pipeline_cache,
            &asset_server,
            shader_path,
        );
    }

    let FrameComputeRenderState {
        pipeline,
        bind_group_layout,
        pending,
    } = &mut *state;
    let (Some(pipeline_id), Some(bind_group_layout)) = (*pipeline, bind_group_layout.as_ref())
    else {
        return;
    };
    let Some(pipeline) = pipeline_cache.get_compute_pipeline(pipeline_id) else {
        pending.retain(FrameComputeJob::is_init);
        return;
    };

    let mut encoder = render_device.create_command_encoder(&CommandEncoderDescriptor {
        label: Some("vat_frame_compute_encoder"),
    });
    let dispatched = drain_pending_jobs(pending, |job| {
        record_dispatch(
            &mut encoder,
            &render_device,
            pipeline,
            bind_group_layout,
            &gpu_images,
            job,
        )
    });

    if dispatched > 0 {
        render_queue.submit([encoder.finish()]);
    }
}

/// Drop held jobs whose compute pass was disposed or despawned.
fn retain_live_jobs(pending: &mut Vec<FrameComputeJob>, live: &[u64]) {
    pending.retain(|job| live.contains(&job.compute));
}

/// Run `dispatch` over the queued jobs in order and return how many succeeded.
///
/// Failed init jobs stay queued. While a pass has an init job queued, its
/// step jobs are skipped so they never read an uninitialised target.
fn drain_pending_jobs(
    pending: &mut Vec<FrameComputeJob>,
    mut dispatch: impl FnMut(&FrameComputeJob) -> bool,
) -> usize {
    let mut waiting_for_init = HashSet::new();
    let mut retained = Vec::new();
    let mut dispatched = 0;

    for job in pending.drain(..) {
        if !job.is_init() && waiting_for_init.contains(&job.compute) {
            continue;
        }
        if dispatch(&job) {
            dispatched += 1;
        } else if job.is_init() {
            waiting_for_init.insert(job.compute);
            retained.push(job);
        }
    }
    *pending = retained;
    dispatched
}

/// Creates the frame compute pipeline and its bind group layout.
///
/// Bindings:
/// 0–2: previous state, durations and seeds (read-only)
/// 3:   next state (write-only)
/// 4:   uniform parameters
fn initialise_compute_pipeline(
    state: &mut FrameComputeRenderState,
    render_device: &RenderDevice,
    pipeline_cache: &PipelineCache,
    asset_server: &AssetServer,
    shader_path: String,
) {
    let sampled = |binding: u32| BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::COMPUTE,
        ty: BindingType::Texture {
            sample_type: TextureSampleType::Float { filterable: false },
            view_dimension: TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    };

    let bind_group_layout = render_device.create_bind_group_layout(
        "vat_frame_compute_layout",
        &[
            sampled(0),
            sampled(1),
            sampled(2),
            BindGroupLayoutEntry {
                binding: 3,
                visibility: ShaderStages::COMPUTE,
                ty: BindingType::StorageTexture {
                    access: StorageTextureAccess::WriteOnly,
                    format: TextureFormat::Rgba32Float,
                    view_dimension: TextureViewDimension::D2,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 4,
                visibility: ShaderStages::COMPUTE,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    );

    let shader = asset_server.load(shader_path);
    let pipeline = pipeline_cache.queue_compute_pipeline(ComputePipelineDescriptor {
        label: Some("vat_frame_compute".into()),
        layout: vec![bind_group_layout.clone()],
        push_constant_ranges: Vec::new(),
        shader,
        shader_defs: vec![],
        entry_point: "main".into(),
        zero_initialize_workgroup_memory: true,
    });

    info!("Frame compute pipeline queued");
    state.bind_group_layout = Some(bind_group_layout);
    state.pipeline = Some(pipeline);
}

/// Returns false when a texture of the job is not on the GPU yet.
fn record_dispatch(
    encoder: &mut CommandEncoder,
    render_device: &RenderDevice,
    pipeline: &ComputePipeline,
    bind_group_layout: &BindGroupLayout,
    gpu_images: &RenderAssets<GpuImage>,
    job: &FrameComputeJob,
) -> bool {
    let Some(previous) = gpu_images.get(&job.previous) else {
        return false;
    };
    let Some(durations) = gpu_images.get(&job.durations) else {
        return false;
    };
    let Some(seeds) = gpu_images.get(&job.seeds) else {
        return false;
    };
    let Some(output) = gpu_images.get(&job.output) else {
        return false;
    };

    let params = render_device.create_buffer_with_data(&BufferInitDescriptor {
        label: Some("vat_frame_compute_params"),
        contents: bytemuck::cast_slice(&[job.uniform]),
        usage: BufferUsages::UNIFORM,
    });

    let bind_group = render_device.create_bind_group(
        "vat_frame_compute_bind_group",
        bind_group_layout,
        &[
            BindGroupEntry {
                binding: 0,
                resource: BindingResource::TextureView(&previous.texture_view),
            },
            BindGroupEntry {
                binding: 1,
                resource: BindingResource::TextureView(&durations.texture_view),
            },
            BindGroupEntry {
                binding: 2,
                resource: BindingResource::TextureView(&seeds.texture_view),
            },
            BindGroupEntry {
                binding: 3,
                resource: BindingResource::TextureView(&output.texture_view),
            },
            BindGroupEntry {
                binding: 4,
                resource: params.as_entire_binding(),
            },
        ],
    );

    let workgroups = job
        .uniform
        .instance_count
        .div_ceil(FRAME_COMPUTE_WORKGROUP_SIZE)
        .max(1);
    let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
        label: Some("vat_frame_compute"),
        timestamp_writes: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, &bind_group, &[]);
    pass.dispatch_workgroups(workgroups, 1, 1);
    true
}
