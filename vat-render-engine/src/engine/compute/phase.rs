//! CPU model of the per-instance phase machine run by `frame_compute.wgsl`.
//!
//! The shader must produce exactly what [`InstancePhase::step`] does; the
//! tests here pin down the behaviour. The same model fills the compute
//! targets before the first dispatch.
use crate::engine::compute::durations::DurationProfile;
use crate::engine::playback::frame_driver::scrub_frame;
use constants::timing::PHASE_STATE_COUNT;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InstancePhase {
    /// Normalised animation progress in `[0, 1]`.
    pub phase: f32,
    pub state: u32,
    /// Pass clock time at which `state` began.
    pub state_start: f32,
}

impl InstancePhase {
    /// State written by the init dispatch. The seed offsets the start so instances desynchronise.
    pub fn initial(seed: f32, profile: &DurationProfile, time: f32) -> Self {
        Self {
            phase: 0.0,
            state: 0,
            state_start: time - seed * profile.cycle_length(),
        }
    }

    /// Advance to `time` on the pass clock.
    pub fn step(&self, profile: &DurationProfile, time: f32) -> Self {
        let durations = profile.0;
        let cycle = profile.cycle_length();
        if cycle <= 0.0 {
            return Self {
                phase: 0.0,
                state: 0,
                state_start: time,
            };
        }

        let mut state = self.state as usize % PHASE_STATE_COUNT;
        let mut start = self.state_start;
        let elapsed = time - start;
        if elapsed < 0.0 {
            start = time;
        } else if elapsed >= cycle {
            start += (elapsed / cycle).floor() * cycle;
        }

        for _ in 0..PHASE_STATE_COUNT {
            if time - start < durations[state] {
                break;
            }
            start += durations[state];
            state = (state + 1) % PHASE_STATE_COUNT;
        }

        let duration = durations[state];
        let progress = if duration > 0.0 {
            ((time - start) / duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let phase = match state {
            0 => 0.0,
            1 => progress,
            2 => 1.0,
            _ => 1.0 - progress,
        };

        Self {
            phase,
            state: state as u32,
            state_start: start,
        }
    }

    pub fn frame(&self, frame_count: u32) -> f32 {
        scrub_frame(self.phase, frame_count)
    }

    /// Texel as stored in the compute output: phase, state, state start, frame.
    /// A scrub ratio replaces the frame but leaves the phase running.
    pub fn texel(&self, frame_count: u32, frame_ratio: Option<f32>) -> [f32; 4] {
        let frame = match frame_ratio {
            Some(ratio) => scrub_frame(ratio, frame_count),
            None => self.frame(frame_count),
        };
        [self.phase, self.state as f32, self.state_start, frame]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: DurationProfile = DurationProfile([0.5, 1.0, 0.25, 2.0]);

    fn at_rest() -> InstancePhase {
        InstancePhase::initial(0.0, &PROFILE, 0.0)
    }

    #[test]
    fn holds_then_rises() {
        let phase = at_rest().step(&PROFILE, 0.25);
        assert_eq!(phase.state, 0);
        assert_eq!(phase.phase, 0.0);

        let phase = phase.step(&PROFILE, 1.0);
        assert_eq!(phase.state, 1);
        assert_eq!(phase.phase, 0.5);
    }

    #[test]
    fn holds_at_top_then_falls() {
        let phase = at_rest().step(&PROFILE, 1.6);
        assert_eq!(phase.state, 2);
        assert_eq!(phase.phase, 1.0);

        let phase = phase.step(&PROFILE, 2.75);
        assert_eq!(phase.state, 3);
        assert_eq!(phase.phase, 0.5);
    }

    #[test]
    fn large_jumps_skip_whole_cycles() {
        let cycle = PROFILE.cycle_length();
        let near = at_rest().step(&PROFILE, 1.0);
        let far = at_rest().step(&PROFILE, 1.0 + cycle * 40.0);
        assert_eq!(far.state, near.state);
        assert!((far.phase - near.phase).abs() < 1e-3);
    }

    #[test]
    fn zero_durations_stay_in_first_state() {
        let zero = DurationProfile([0.0; 4]);
        let phase = at_rest().step(&zero, 10.0);
        assert_eq!(phase.state, 0);
        assert_eq!(phase.phase, 0.0);
    }

    #[test]
    fn zero_hold_states_are_skipped() {
        let profile = DurationProfile([0.0, 1.0, 0.0, 1.0]);
        let phase = InstancePhase::initial(0.0, &profile, 0.0).step(&profile, 0.25);
        assert_eq!(phase.state, 1);
        assert_eq!(phase.phase, 0.25);

        let phase = phase.step(&profile, 1.5);
        assert_eq!(phase.state, 3);
        assert_eq!(phase.phase, 0.5);
    }

    #[test]
    fn seed_offsets_initial_start() {
        let phase = InstancePhase::initial(0.5, &PROFILE, 10.0);
        assert_eq!(phase.state_start, 10.0 - 0.5 * PROFILE.cycle_length());
        assert_eq!(phase.phase, 0.0);
    }

    #[test]
    fn texel_frame_uses_scrub_rule() {
        let phase = InstancePhase {
            phase: 1.0,
            state: 2,
            state_start: 3.0,
        };
        assert_eq!(phase.texel(30, None), [1.0, 2.0, 3.0, 25.0]);
    }

    #[test]
    fn scrub_ratio_overrides_only_the_frame() {
        let phase = InstancePhase {
            phase: 0.2,
            state: 1,
            state_start: 4.0,
        };
        assert_eq!(phase.texel(30, Some(0.5)), [0.2, 1.0, 4.0, 15.0]);
    }
}
