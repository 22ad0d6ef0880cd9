use bevy::prelude::*;
use constants::timing::{
    PHASE_STATE_COUNT, STATE0_DEFAULT_DURATION, STATE1_DEFAULT_DURATION, STATE2_DEFAULT_DURATION,
    STATE3_DEFAULT_DURATION,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Range a single state's duration is drawn from, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct StateDuration {
    pub min: f32,
    pub max: f32,
}

impl StateDuration {
    pub const fn fixed(seconds: f32) -> Self {
        Self {
            min: seconds,
            max: seconds,
        }
    }

    pub const fn range(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Draw a duration from the range. Never negative.
    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        if self.min == self.max {
            return self.min.max(0.0);
        }
        let (low, high) = (self.min.min(self.max), self.min.max(self.max));
        rng.gen_range(low..=high).max(0.0)
    }
}

/// Duration ranges for the four phase states: hold at 0, rise, hold at 1, fall.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct StateDurations {
    pub state0: StateDuration,
    pub state1: StateDuration,
    pub state2: StateDuration,
    pub state3: StateDuration,
}

impl Default for StateDurations {
    fn default() -> Self {
        Self {
            state0: StateDuration::fixed(STATE0_DEFAULT_DURATION),
            state1: StateDuration::fixed(STATE1_DEFAULT_DURATION),
            state2: StateDuration::fixed(STATE2_DEFAULT_DURATION),
            state3: StateDuration::fixed(STATE3_DEFAULT_DURATION),
        }
    }
}

impl StateDurations {
    pub fn as_array(&self) -> [StateDuration; PHASE_STATE_COUNT] {
        [self.state0, self.state1, self.state2, self.state3]
    }

    /// Draw one instance's durations, states in order, from an RNG seeded by `seed`.
    pub fn profile(&self, seed: f32) -> DurationProfile {
        let mut rng = StdRng::seed_from_u64(u64::from(seed.to_bits()));
        let ranges = self.as_array();
        DurationProfile(std::array::from_fn(|state| ranges[state].sample(&mut rng)))
    }
}

/// Concrete per-instance durations for states 0..3.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DurationProfile(pub [f32; PHASE_STATE_COUNT]);

impl DurationProfile {
    pub fn cycle_length(&self) -> f32 {
        self.0.iter().sum()
    }
}

/// Seeds for `count` instances. Supplied seeds are used only when there are enough of them.
pub fn resolve_seeds(supplied: Option<&[f32]>, count: usize, rng: &mut impl Rng) -> Vec<f32> {
    match supplied {
        Some(seeds) if seeds.len() >= count => seeds[..count].to_vec(),
        Some(seeds) => {
            warn!(
                "{} instance seeds supplied for {} instances, using random seeds",
                seeds.len(),
                count
            );
            random_seeds(count, rng)
        }
        None => random_seeds(count, rng),
    }
}

fn random_seeds(count: usize, rng: &mut impl Rng) -> Vec<f32> {
    (0..count).map(|_| rng.r#gen::<f32>()).collect()
}

pub fn duration_profiles(durations: &StateDurations, seeds: &[f32]) -> Vec<DurationProfile> {
    seeds.iter().map(|seed| durations.profile(*seed)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn fixed_state1_range_gives_exact_durations() {
        let durations = StateDurations {
            state1: StateDuration::range(1.0, 1.0),
            ..default()
        };
        let seeds = [0.1, 0.5, 0.9, 0.33];
        let profiles = duration_profiles(&durations, &seeds);
        assert_eq!(profiles.len(), 4);
        assert!(profiles.iter().all(|profile| profile.0[1] == 1.0));
    }

    #[test]
    fn same_seed_same_profile() {
        let durations = StateDurations {
            state0: StateDuration::range(0.0, 2.0),
            state1: StateDuration::range(0.5, 1.5),
            state2: StateDuration::range(1.0, 3.0),
            state3: StateDuration::range(0.2, 0.4),
        };
        assert_eq!(durations.profile(0.42), durations.profile(0.42));
        assert_ne!(durations.profile(0.42), durations.profile(0.43));
    }

    #[test]
    fn samples_stay_inside_range_and_non_negative() {
        let mut rng = StdRng::seed_from_u64(11);
        let range = StateDuration::range(0.5, 1.5);
        for _ in 0..500 {
            assert!((0.5..=1.5).contains(&range.sample(&mut rng)));
        }
        assert_eq!(StateDuration::range(-3.0, -1.0).sample(&mut rng), 0.0);
        assert_eq!(StateDuration::fixed(2.0).sample(&mut rng), 2.0);
    }

    #[test]
    fn reversed_range_is_still_sampled() {
        let mut rng = StdRng::seed_from_u64(3);
        let value = StateDuration::range(2.0, 1.0).sample(&mut rng);
        assert!((1.0..=2.0).contains(&value));
    }

    #[test]
    fn profiles_vary_across_seeds() {
        let durations = StateDurations {
            state0: StateDuration::range(0.0, 10.0),
            ..default()
        };
        let profiles = duration_profiles(&durations, &[0.1, 0.2, 0.3, 0.4]);
        assert!(profiles.windows(2).any(|pair| pair[0].0[0] != pair[1].0[0]));
        assert!(profiles.iter().all(|profile| profile.0[1] == 1.0));
    }

    #[test]
    fn short_seed_list_falls_back_to_random() {
        let mut rng = StdRng::seed_from_u64(7);
        let seeds = resolve_seeds(Some(&[0.25, 0.75]), 4, &mut rng);
        assert_eq!(seeds.len(), 4);
        assert_ne!(&seeds[..2], &[0.25, 0.75]);

        let seeds = resolve_seeds(Some(&[0.1, 0.2, 0.3, 0.4, 0.5]), 4, &mut rng);
        assert_eq!(seeds, vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn default_durations_match_constants() {
        let profile = StateDurations::default().profile(0.5);
        assert_eq!(profile.0, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(profile.cycle_length(), 2.0);
    }
}
