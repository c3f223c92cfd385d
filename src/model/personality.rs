use rand::Rng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::gaussian;

/// Trait values live in this closed range; adjustments clamp rather than
/// overflow.
pub const TRAIT_MIN: f64 = -3.0;
pub const TRAIT_MAX: f64 = 3.0;

/// The Big Five personality axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Trait {
    Openness,
    Conscientiousness,
    Extraversion,
    Agreeableness,
    Neuroticism,
}

string_enum!(Trait {
    Openness => "openness",
    Conscientiousness => "conscientiousness",
    Extraversion => "extraversion",
    Agreeableness => "agreeableness",
    Neuroticism => "neuroticism",
});

pub const ALL_TRAITS: [Trait; 5] = [
    Trait::Openness,
    Trait::Conscientiousness,
    Trait::Extraversion,
    Trait::Agreeableness,
    Trait::Neuroticism,
];

/// A Big-Five trait vector. Each axis is drawn from Normal(0, 1) at creation
/// and bounded in [-3, 3] for life.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub openness: f64,
    pub conscientiousness: f64,
    pub extraversion: f64,
    pub agreeableness: f64,
    pub neuroticism: f64,
}

impl Personality {
    pub fn randomize(rng: &mut dyn RngCore) -> Self {
        let mut p = Self::default();
        for t in ALL_TRAITS {
            p.set(t, gaussian(rng, 0.0, 1.0).clamp(TRAIT_MIN, TRAIT_MAX));
        }
        p
    }

    pub fn get(&self, t: Trait) -> f64 {
        match t {
            Trait::Openness => self.openness,
            Trait::Conscientiousness => self.conscientiousness,
            Trait::Extraversion => self.extraversion,
            Trait::Agreeableness => self.agreeableness,
            Trait::Neuroticism => self.neuroticism,
        }
    }

    pub fn set(&mut self, t: Trait, value: f64) {
        let slot = match t {
            Trait::Openness => &mut self.openness,
            Trait::Conscientiousness => &mut self.conscientiousness,
            Trait::Extraversion => &mut self.extraversion,
            Trait::Agreeableness => &mut self.agreeableness,
            Trait::Neuroticism => &mut self.neuroticism,
        };
        *slot = value.clamp(TRAIT_MIN, TRAIT_MAX);
    }

    /// Sum of absolute per-trait differences. Zero means identical outlooks.
    pub fn distance(&self, other: &Personality) -> f64 {
        ALL_TRAITS
            .iter()
            .map(|&t| (self.get(t) - other.get(t)).abs())
            .sum()
    }

    /// Nudge one trait a whole point in either direction, clamped.
    pub fn adjust(&mut self, t: Trait, up: bool) {
        let delta = if up { 1.0 } else { -1.0 };
        self.set(t, self.get(t) + delta);
    }

    /// Pick one trait at random and shift it a point either way.
    pub fn random_shift(&mut self, rng: &mut dyn RngCore) {
        let t = ALL_TRAITS[rng.random_range(0..ALL_TRAITS.len())];
        self.adjust(t, rng.random_bool(0.5));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn in_bounds(p: &Personality) -> bool {
        ALL_TRAITS
            .iter()
            .all(|&t| (TRAIT_MIN..=TRAIT_MAX).contains(&p.get(t)))
    }

    #[test]
    fn traits_stay_bounded_under_any_adjustment() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut p = Personality::randomize(&mut rng);
        assert!(in_bounds(&p));
        for _ in 0..200 {
            p.random_shift(&mut rng);
            assert!(in_bounds(&p));
        }
        for _ in 0..10 {
            p.adjust(Trait::Neuroticism, true);
        }
        assert_eq!(p.neuroticism, TRAIT_MAX);
        for _ in 0..10 {
            p.adjust(Trait::Neuroticism, false);
        }
        assert_eq!(p.neuroticism, TRAIT_MIN);
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let mut rng = SmallRng::seed_from_u64(5);
        let a = Personality::randomize(&mut rng);
        let b = Personality::randomize(&mut rng);
        assert_eq!(a.distance(&a), 0.0);
        assert!((a.distance(&b) - b.distance(&a)).abs() < f64::EPSILON);
    }
}
