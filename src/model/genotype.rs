use rand::Rng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::community::Gender;
use super::gaussian;
use super::personality::{ALL_TRAITS, Personality};

/// Independent stillbirth chance applied after all other inheritance.
const STILLBIRTH_CHANCE: f64 = 0.01;

/// Mutation bound as a fraction of each trait's reference standard
/// deviation: descent with modification.
const MUTATION_FRACTION: f64 = 0.1;

/// Reference standard deviations for the inherited scalars.
const LONGEVITY_SD: f64 = 5.0;
const BODY_TYPE_SD: f64 = 1.0;
const TRAIT_SD: f64 = 1.0;
const INTELLIGENCE_SD: f64 = 1.0;

/// One person's heritable endowment: physiology, temperament, intellect,
/// and whether the combination was viable at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genotype {
    pub body: Body,
    pub personality: Personality,
    pub intelligence: f64,
    pub viable: bool,
}

impl Genotype {
    /// A founder or stranger with no recorded ancestry.
    pub fn randomize(rng: &mut dyn RngCore, gender_hint: Option<Gender>) -> Self {
        Self {
            body: Body::randomize(rng, gender_hint),
            personality: Personality::randomize(rng),
            intelligence: gaussian(rng, 0.0, INTELLIGENCE_SD),
            viable: true,
        }
    }

    /// Descent with modification: every inherited scalar is the parental
    /// mean plus a small mutation; regional disabilities and achondroplasia
    /// follow the body's inheritance rules. Returns `None` when either
    /// parent is non-viable (an expected domain outcome, not an error);
    /// a stillbirth comes back as `Some` with `viable` unset so the caller
    /// can record it.
    pub fn descend(rng: &mut dyn RngCore, a: &Genotype, b: &Genotype) -> Option<Genotype> {
        if !a.viable || !b.viable {
            return None;
        }

        let (mut body, fatal) = Body::inherit_from(rng, &a.body, &b.body);
        body.longevity = inherit_scalar(rng, a.body.longevity, b.body.longevity, LONGEVITY_SD);
        body.body_type = inherit_scalar(rng, a.body.body_type, b.body.body_type, BODY_TYPE_SD);

        let mut personality = Personality::default();
        for t in ALL_TRAITS {
            personality.set(
                t,
                inherit_scalar(rng, a.personality.get(t), b.personality.get(t), TRAIT_SD),
            );
        }

        let intelligence = inherit_scalar(rng, a.intelligence, b.intelligence, INTELLIGENCE_SD);
        let stillborn = rng.random_bool(STILLBIRTH_CHANCE);

        Some(Genotype {
            body,
            personality,
            intelligence,
            viable: !fatal && !stillborn,
        })
    }
}

fn inherit_scalar(rng: &mut dyn RngCore, a: f64, b: f64, reference_sd: f64) -> f64 {
    let bound = MUTATION_FRACTION * reference_sd;
    (a + b) / 2.0 + rng.random_range(-bound..=bound)
}
