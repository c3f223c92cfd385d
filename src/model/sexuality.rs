use rand::Rng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::community::Gender;

/// Chance of an all-zero (asexual) orientation vector. Never applied when
/// deriving a mate for a specific target gender.
const ASEXUAL_CHANCE: f64 = 0.01;
/// Heterosexual-vs-homosexual lean.
const HETEROSEXUAL_CHANCE: f64 = 0.9;

/// Orientation vector. The three weights sum to 1, or are all zero for an
/// asexual person. Fixed after creation except when re-derived for a new
/// candidate generated toward a specific target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sexuality {
    pub androphilia: f64,
    pub gynephilia: f64,
    pub skoliophilia: f64,
}

impl Sexuality {
    pub fn asexual() -> Self {
        Self::default()
    }

    pub fn is_asexual(&self) -> bool {
        self.androphilia == 0.0 && self.gynephilia == 0.0 && self.skoliophilia == 0.0
    }

    /// Draw an orientation conditioned on the person's own anatomy. With
    /// `mate_for` set, the dominant axis is forced to cover the target
    /// gender and asexuality is off the table.
    pub fn randomize(rng: &mut dyn RngCore, body: &Body, mate_for: Option<Gender>) -> Self {
        if mate_for.is_none() && rng.random_bool(ASEXUAL_CHANCE) {
            return Self::asexual();
        }

        let own_feminine = if body.has_womb && !body.has_penis {
            true
        } else if body.has_penis && !body.has_womb {
            false
        } else {
            rng.random_bool(0.5)
        };
        let heterosexual = rng.random_bool(HETEROSEXUAL_CHANCE);

        // Which axis dominates: the target's axis when generating a mate,
        // otherwise anatomy crossed with the lean.
        enum Axis {
            Andro,
            Gyne,
            Skolio,
        }
        let primary = match mate_for {
            Some(g) if g.masculine() => Axis::Andro,
            Some(g) if g.feminine() => Axis::Gyne,
            Some(_) => Axis::Skolio,
            None => {
                if own_feminine == heterosexual {
                    Axis::Andro
                } else {
                    Axis::Gyne
                }
            }
        };

        let mut androphilia = rng.random_range(0..=15) as f64;
        let mut gynephilia = rng.random_range(0..=15) as f64;
        let mut skoliophilia = rng.random_range(0..=15) as f64;
        let dominant = rng.random_range(60..=100) as f64;
        match primary {
            Axis::Andro => androphilia = dominant,
            Axis::Gyne => gynephilia = dominant,
            Axis::Skolio => skoliophilia = dominant,
        }

        let sum = androphilia + gynephilia + skoliophilia;
        Self {
            androphilia: androphilia / sum,
            gynephilia: gynephilia / sum,
            skoliophilia: skoliophilia / sum,
        }
    }

    /// Weight of attraction toward a given gender category. Semi-special
    /// categories draw on whichever covering axis is stronger.
    pub fn attraction_to(&self, gender: Gender) -> f64 {
        match gender {
            Gender::ThirdGender | Gender::FifthGender => self.skoliophilia,
            Gender::MasculineWoman => self.gynephilia.max(self.skoliophilia),
            Gender::FeminineMan => self.androphilia.max(self.skoliophilia),
            g if g.feminine() => self.gynephilia,
            _ => self.androphilia,
        }
    }

    /// Sample a multiset of candidate partner genders, sized per orientation
    /// weight × `sample_size`, from the community's gender-category table for
    /// the given cardinality.
    pub fn gender_preferences(
        &self,
        rng: &mut dyn RngCore,
        cardinality: u8,
        sample_size: usize,
    ) -> Vec<Gender> {
        let mut preferences = Vec::new();
        let axes: [(f64, &[Gender]); 3] = [
            (self.androphilia, androphilic_candidates(cardinality)),
            (self.gynephilia, gynephilic_candidates(cardinality)),
            (self.skoliophilia, skoliophilic_candidates(cardinality)),
        ];
        for (weight, candidates) in axes {
            if candidates.is_empty() {
                continue;
            }
            let count = (weight * sample_size as f64).round() as usize;
            for _ in 0..count {
                preferences.push(candidates[rng.random_range(0..candidates.len())]);
            }
        }
        preferences
    }
}

fn androphilic_candidates(cardinality: u8) -> &'static [Gender] {
    match cardinality {
        2 | 3 => &[Gender::Man],
        4 | 5 => &[Gender::MasculineMan, Gender::FeminineMan],
        other => panic!("unsupported gender cardinality: {other}"),
    }
}

fn gynephilic_candidates(cardinality: u8) -> &'static [Gender] {
    match cardinality {
        2 | 3 => &[Gender::Woman],
        4 | 5 => &[Gender::FeminineWoman, Gender::MasculineWoman],
        other => panic!("unsupported gender cardinality: {other}"),
    }
}

fn skoliophilic_candidates(cardinality: u8) -> &'static [Gender] {
    match cardinality {
        2 => &[],
        3 => &[Gender::ThirdGender],
        4 => &[Gender::MasculineWoman, Gender::FeminineMan],
        5 => &[
            Gender::FifthGender,
            Gender::MasculineWoman,
            Gender::FeminineMan,
        ],
        other => panic!("unsupported gender cardinality: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn body_with(penis: bool, womb: bool, rng: &mut SmallRng) -> Body {
        let mut body = Body::randomize(rng, None);
        body.has_penis = penis;
        body.has_womb = womb;
        body
    }

    #[test]
    fn weights_sum_to_one_unless_asexual() {
        let mut rng = SmallRng::seed_from_u64(2);
        for _ in 0..200 {
            let body = body_with(true, false, &mut rng);
            let s = Sexuality::randomize(&mut rng, &body, None);
            if s.is_asexual() {
                continue;
            }
            let sum = s.androphilia + s.gynephilia + s.skoliophilia;
            assert!((sum - 1.0).abs() < 1e-9, "weights should normalize: {sum}");
        }
    }

    #[test]
    fn mate_for_disallows_asexuality_and_covers_target() {
        let mut rng = SmallRng::seed_from_u64(8);
        for _ in 0..200 {
            let body = body_with(false, true, &mut rng);
            let s = Sexuality::randomize(&mut rng, &body, Some(Gender::Woman));
            assert!(!s.is_asexual());
            assert!(s.attraction_to(Gender::Woman) > 0.5);
        }
    }

    #[test]
    fn preferences_scale_with_sample_size_and_cardinality() {
        let s = Sexuality {
            androphilia: 1.0,
            gynephilia: 0.0,
            skoliophilia: 0.0,
        };
        let mut rng = SmallRng::seed_from_u64(6);
        let prefs = s.gender_preferences(&mut rng, 2, 4);
        assert_eq!(prefs, vec![Gender::Man; 4]);

        let skolio = Sexuality {
            androphilia: 0.0,
            gynephilia: 0.0,
            skoliophilia: 1.0,
        };
        // A two-gender system has no skoliophilic candidates at all.
        assert!(skolio.gender_preferences(&mut rng, 2, 4).is_empty());
        let prefs = skolio.gender_preferences(&mut rng, 3, 3);
        assert_eq!(prefs, vec![Gender::ThirdGender; 3]);
    }
}
