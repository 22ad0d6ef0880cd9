use crate::engine::assembly::mount::VatAssembly;
use crate::engine::compute::durations::{
    DurationProfile, StateDurations, duration_profiles, resolve_seeds,
};
use crate::engine::compute::phase::InstancePhase;
use crate::engine::compute::ping_pong::{ComputeTick, PingPong};
use crate::engine::material::factory::bind_instance_frames;
use crate::engine::material::vat_material::VatMaterial;
use crate::engine::playback::frame_driver::VatPlayback;
use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::extract_resource::ExtractResource;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat, TextureUsages};
use bytemuck::{Pod, Zeroable};
use constants::texture::{R32F_TEXEL_BYTES, RGBA32F_TEXEL_BYTES};
use std::sync::atomic::{AtomicU64, Ordering};

/// `frame_ratio` value meaning "no scrub override".
pub const NO_FRAME_RATIO: f32 = -1.0;

static NEXT_FRAME_COMPUTE_ID: AtomicU64 = AtomicU64::new(1);

/// Per-instance timing for an instanced mount. Adding it gives every instance its own frame.
#[derive(Component, Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct VatInstanceTiming {
    /// One seed per instance. Ignored unless it covers every instance.
    pub seeds: Option<Vec<f32>>,
    pub durations: StateDurations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameComputeMode {
    Init = 0,
    Step = 1,
}

/// Uniform block of `frame_compute.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct FrameComputeUniform {
    pub time: f32,
    pub frame_count: f32,
    pub instance_count: u32,
    pub mode: u32,
    pub texture_width: u32,
    /// Scrub ratio applied to every instance's frame, or [`NO_FRAME_RATIO`].
    pub frame_ratio: f32,
    pub _padding: [u32; 2],
}

/// One dispatch, recorded in the main world and executed in the render world.
#[derive(Debug, Clone)]
pub struct FrameComputeJob {
    pub mount: Entity,
    /// Id of the `VatFrameCompute` that queued it. Unique across rebuilds.
    pub compute: u64,
    pub previous: Handle<Image>,
    pub output: Handle<Image>,
    pub durations: Handle<Image>,
    pub seeds: Handle<Image>,
    pub uniform: FrameComputeUniform,
}

impl FrameComputeJob {
    pub fn is_init(&self) -> bool {
        self.uniform.mode == FrameComputeMode::Init as u32
    }
}

/// Dispatches queued this frame. Rewritten every frame by the compute tick.
#[derive(Resource, Debug, Clone, Default, ExtractResource)]
pub struct FrameComputeJobs {
    pub jobs: Vec<FrameComputeJob>,
    /// Ids of every compute pass still alive, paused ones included.
    /// Jobs held back in the render world are dropped once their id leaves this set.
    pub live: Vec<u64>,
}

#[derive(Debug, Clone)]
struct FrameComputeTextures {
    targets: [Handle<Image>; 2],
    durations: Handle<Image>,
    seeds: Handle<Image>,
}

/// Per-instance frame state for one instanced mount.
///
/// Two RGBA32F targets swap read/write roles each tick. Texel layout is
/// phase, state, state start time, frame.
#[derive(Component, Debug)]
pub struct VatFrameCompute {
    id: u64,
    textures: Option<FrameComputeTextures>,
    cycle: PingPong,
    clock: f32,
    instance_count: u32,
    frame_count: u32,
    texture_width: u32,
}

/// Width and height of the texture holding `count` instances, filled row by row.
pub fn instance_texture_extent(count: u32, max_width: u32) -> (u32, u32) {
    let width = count.clamp(1, max_width.max(1));
    let height = count.div_ceil(width).max(1);
    (width, height)
}

impl VatFrameCompute {
    pub fn new(
        images: &mut Assets<Image>,
        instance_count: u32,
        frame_count: u32,
        timing: &VatInstanceTiming,
        max_texture_width: u32,
    ) -> Self {
        let (width, height) = instance_texture_extent(instance_count, max_texture_width);
        let seeds = resolve_seeds(
            timing.seeds.as_deref(),
            instance_count as usize,
            &mut rand::thread_rng(),
        );
        let profiles = duration_profiles(&timing.durations, &seeds);
        let initial = initial_texels(&seeds, &profiles, frame_count);

        let textures = FrameComputeTextures {
            targets: [
                images.add(storage_target(width, height, &initial)),
                images.add(storage_target(width, height, &initial)),
            ],
            durations: images.add(durations_texture(width, height, &profiles)),
            seeds: images.add(data_texture(
                width,
                height,
                bytemuck::cast_slice(&seeds),
                TextureFormat::R32Float,
                R32F_TEXEL_BYTES,
            )),
        };

        info!(
            "Frame compute ready: {} instances in a {}x{} texture",
            instance_count, width, height
        );

        Self {
            id: NEXT_FRAME_COMPUTE_ID.fetch_add(1, Ordering::Relaxed),
            textures: Some(textures),
            cycle: PingPong::default(),
            clock: 0.0,
            instance_count,
            frame_count,
            texture_width: width,
        }
    }

    /// Advance the pass clock and return the dispatches for this tick.
    /// The clock only runs forward; a negative speed freezes it.
    /// `frame_ratio` pins every instance to the same scrubbed frame while the phases keep running.
    pub fn tick(
        &mut self,
        mount: Entity,
        delta: f32,
        speed: f32,
        frame_ratio: Option<f32>,
    ) -> Vec<FrameComputeJob> {
        let Some(textures) = &self.textures else {
            return Vec::new();
        };
        self.clock += delta * speed.max(0.0);
        let tick = self.cycle.tick();

        let base = FrameComputeUniform {
            time: self.clock,
            frame_count: self.frame_count as f32,
            instance_count: self.instance_count,
            mode: FrameComputeMode::Step as u32,
            texture_width: self.texture_width,
            frame_ratio: frame_ratio.map_or(NO_FRAME_RATIO, |ratio| ratio.clamp(0.0, 1.0)),
            _padding: [0; 2],
        };
        let job = |read: usize, write: usize, mode: FrameComputeMode| FrameComputeJob {
            mount,
            compute: self.id,
            previous: textures.targets[read].clone(),
            output: textures.targets[write].clone(),
            durations: textures.durations.clone(),
            seeds: textures.seeds.clone(),
            uniform: FrameComputeUniform {
                mode: mode as u32,
                ..base
            },
        };

        match tick {
            ComputeTick::Init => vec![
                job(1, 0, FrameComputeMode::Init),
                job(0, 1, FrameComputeMode::Init),
            ],
            ComputeTick::Step { read, write } => vec![job(read, write, FrameComputeMode::Step)],
        }
    }

    /// Most recently completed result. `None` once disposed.
    pub fn exposed_texture(&self) -> Option<&Handle<Image>> {
        self.textures
            .as_ref()
            .map(|textures| &textures.targets[self.cycle.exposed()])
    }

    pub fn texture_width(&self) -> u32 {
        self.texture_width
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_live(&self) -> bool {
        self.textures.is_some()
    }

    /// Release both targets and the data textures. Safe to call more than once.
    pub fn dispose(&mut self, images: &mut Assets<Image>) {
        let Some(textures) = self.textures.take() else {
            return;
        };
        for target in &textures.targets {
            images.remove(target);
        }
        images.remove(&textures.durations);
        images.remove(&textures.seeds);
        debug!("Frame compute textures released");
    }
}

/// Phase texels at clock 0, so the targets are valid before the init dispatch lands.
fn initial_texels(seeds: &[f32], profiles: &[DurationProfile], frame_count: u32) -> Vec<f32> {
    seeds
        .iter()
        .zip(profiles)
        .flat_map(|(seed, profile)| {
            InstancePhase::initial(*seed, profile, 0.0)
                .step(profile, 0.0)
                .texel(frame_count, None)
        })
        .collect()
}

fn storage_target(width: u32, height: u32, texels: &[f32]) -> Image {
    let mut image = data_texture(
        width,
        height,
        bytemuck::cast_slice(texels),
        TextureFormat::Rgba32Float,
        RGBA32F_TEXEL_BYTES,
    );
    image.texture_descriptor.usage =
        TextureUsages::TEXTURE_BINDING | TextureUsages::STORAGE_BINDING | TextureUsages::COPY_DST;
    image
}

fn durations_texture(width: u32, height: u32, profiles: &[DurationProfile]) -> Image {
    let texels: Vec<f32> = profiles.iter().flat_map(|profile| profile.0).collect();
    data_texture(
        width,
        height,
        bytemuck::cast_slice(&texels),
        TextureFormat::Rgba32Float,
        RGBA32F_TEXEL_BYTES,
    )
}

fn data_texture(
    width: u32,
    height: u32,
    bytes: &[u8],
    format: TextureFormat,
    texel_bytes: usize,
) -> Image {
    let mut data = vec![0u8; width as usize * height as usize * texel_bytes];
    let len = bytes.len().min(data.len());
    data[..len].copy_from_slice(&bytes[..len]);
    Image::new(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        data,
        format,
        RenderAssetUsages::RENDER_WORLD,
    )
}

/// Queue this frame's dispatches for every instanced mount with timing.
pub fn tick_frame_compute(
    time: Res<Time>,
    mut computes: Query<(Entity, &mut VatFrameCompute, Option<&VatPlayback>)>,
    mut jobs: ResMut<FrameComputeJobs>,
) {
    let FrameComputeJobs { jobs, live } = &mut *jobs;
    jobs.clear();
    live.clear();
    let delta = time.delta_secs();
    for (entity, mut compute, playback) in &mut computes {
        if !compute.is_live() {
            continue;
        }
        live.push(compute.id());
        let (speed, frame_ratio) = match playback {
            Some(playback) if playback.paused => continue,
            Some(playback) => (playback.speed, playback.frame_ratio),
            None => (1.0, None),
        };
        jobs.extend(compute.tick(entity, delta, speed, frame_ratio));
    }
}

/// Point each instanced material at the texture the compute pass just finished.
pub fn bind_exposed_frame_textures(
    computes: Query<(&VatFrameCompute, &VatAssembly), Changed<VatFrameCompute>>,
    mut materials: ResMut<Assets<VatMaterial>>,
) {
    for (compute, assembly) in &computes {
        let Some(exposed) = compute.exposed_texture() else {
            continue;
        };
        let Some(material) = materials.get_mut(&assembly.material) else {
            continue;
        };
        if material.extension.instance_frames.as_ref() != Some(exposed) {
            bind_instance_frames(material, exposed.clone(), compute.texture_width());
        }
    }
}

/// Releases GPU textures when a compute component is removed or replaced.
pub fn dispose_frame_compute(
    trigger: Trigger<OnReplace, VatFrameCompute>,
    mut computes: Query<&mut VatFrameCompute>,
    mut images: ResMut<Assets<Image>>,
) {
    if let Ok(mut compute) = computes.get_mut(trigger.target()) {
        compute.dispose(&mut images);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::compute::durations::StateDuration;

    fn compute(images: &mut Assets<Image>, count: u32) -> VatFrameCompute {
        let timing = VatInstanceTiming {
            seeds: Some((0..count).map(|i| i as f32 / count as f32).collect()),
            durations: StateDurations {
                state1: StateDuration::range(1.0, 1.0),
                ..default()
            },
        };
        VatFrameCompute::new(images, count, 30, &timing, 8192)
    }

    #[test]
    fn extent_wraps_past_max_width() {
        assert_eq!(instance_texture_extent(4, 8192), (4, 1));
        assert_eq!(instance_texture_extent(0, 8192), (1, 1));
        assert_eq!(instance_texture_extent(10_000, 8192), (8192, 2));
    }

    #[test]
    fn first_tick_initialises_both_targets_without_stepping() {
        let mut images = Assets::<Image>::default();
        let mut compute = compute(&mut images, 4);
        let jobs = compute.tick(Entity::PLACEHOLDER, 0.016, 1.0, None);
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(FrameComputeJob::is_init));
        assert_ne!(jobs[0].output, jobs[1].output);
        for job in &jobs {
            assert_ne!(job.previous, job.output);
        }
    }

    #[test]
    fn steps_never_read_and_write_the_same_target() {
        let mut images = Assets::<Image>::default();
        let mut compute = compute(&mut images, 4);
        compute.tick(Entity::PLACEHOLDER, 0.016, 1.0, None);

        let mut last_output = None;
        for _ in 0..5 {
            let jobs = compute.tick(Entity::PLACEHOLDER, 0.016, 1.0, None);
            assert_eq!(jobs.len(), 1);
            let job = &jobs[0];
            assert!(!job.is_init());
            assert_ne!(job.previous, job.output);
            assert_eq!(compute.exposed_texture(), Some(&job.output));
            if let Some(last) = &last_output {
                assert_eq!(&job.previous, last);
            }
            last_output = Some(job.output.clone());
        }
    }

    #[test]
    fn clock_scales_with_speed_and_never_runs_backwards() {
        let mut images = Assets::<Image>::default();
        let mut compute = compute(&mut images, 2);
        compute.tick(Entity::PLACEHOLDER, 0.5, 2.0, None);
        assert_eq!(compute.clock, 1.0);
        compute.tick(Entity::PLACEHOLDER, 0.5, -1.0, None);
        assert_eq!(compute.clock, 1.0);
    }

    #[test]
    fn dispose_releases_textures_once() {
        let mut images = Assets::<Image>::default();
        let mut compute = compute(&mut images, 3);
        assert_eq!(images.len(), 4);

        compute.dispose(&mut images);
        assert!(!compute.is_live());
        assert!(images.is_empty());
        compute.dispose(&mut images);
        assert!(compute.exposed_texture().is_none());
        assert!(compute.tick(Entity::PLACEHOLDER, 0.1, 1.0, None).is_empty());
    }

    #[test]
    fn scrub_ratio_reaches_every_dispatch() {
        let mut images = Assets::<Image>::default();
        let mut compute = compute(&mut images, 2);
        let init = compute.tick(Entity::PLACEHOLDER, 0.1, 1.0, Some(0.5));
        assert!(init.iter().all(|job| job.uniform.frame_ratio == 0.5));

        let step = compute.tick(Entity::PLACEHOLDER, 0.1, 1.0, Some(1.5));
        assert_eq!(step[0].uniform.frame_ratio, 1.0);

        let free = compute.tick(Entity::PLACEHOLDER, 0.1, 1.0, None);
        assert_eq!(free[0].uniform.frame_ratio, NO_FRAME_RATIO);
    }

    #[test]
    fn rebuilt_passes_get_fresh_ids() {
        let mut images = Assets::<Image>::default();
        let mut first = compute(&mut images, 2);
        let second = compute(&mut images, 2);
        assert_ne!(first.id(), second.id());

        let jobs = first.tick(Entity::PLACEHOLDER, 0.1, 1.0, None);
        assert!(jobs.iter().all(|job| job.compute == first.id()));
    }

    #[test]
    fn targets_start_from_the_seeded_phase() {
        let mut images = Assets::<Image>::default();
        let compute = compute(&mut images, 4);
        let exposed = compute.exposed_texture().expect("live pass");
        let data = images
            .get(exposed)
            .and_then(|image| image.data.as_ref())
            .expect("target has CPU data");
        let texels: Vec<f32> = bytemuck::pod_collect_to_vec(data);

        // Seed 0.25 of a two second cycle puts the second instance halfway up the rise.
        let profile = DurationProfile([0.0, 1.0, 0.0, 1.0]);
        let expected = InstancePhase::initial(0.25, &profile, 0.0)
            .step(&profile, 0.0)
            .texel(30, None);
        assert_eq!(&texels[4..8], &expected);
        assert_eq!(texels[4], 0.5);
    }

    #[test]
    fn paused_passes_stay_live_but_queue_nothing() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<FrameComputeJobs>()
            .add_systems(Update, tick_frame_compute);

        let mut images = Assets::<Image>::default();
        let running = compute(&mut images, 2);
        let paused = compute(&mut images, 2);
        let ids = [running.id(), paused.id()];
        app.world_mut().spawn((running, VatPlayback::default()));
        app.world_mut().spawn((
            paused,
            VatPlayback {
                paused: true,
                ..default()
            },
        ));
        app.update();

        let jobs = app.world().resource::<FrameComputeJobs>();
        assert_eq!(jobs.live.len(), 2);
        assert!(ids.iter().all(|id| jobs.live.contains(id)));
        assert!(jobs.jobs.iter().all(|job| job.compute == ids[0]));
        assert_eq!(jobs.jobs.len(), 2);
    }
}
