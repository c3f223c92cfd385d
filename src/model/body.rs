use rand::Rng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::community::Gender;
use super::gaussian;

// --- Congenital rates (verbatim tuning constants; see DESIGN.md) ---

/// Chance of being born blind in both eyes.
const CONGENITAL_BLINDNESS_CHANCE: f64 = 0.00016;
/// Chance of being born deaf in both ears.
const CONGENITAL_DEAFNESS_CHANCE: f64 = 0.002;
/// Per-side chance of a congenital arm or leg impairment.
const LIMB_IMPAIRMENT_CHANCE: f64 = 0.10;
/// Chance of achondroplasia arising spontaneously.
const ACHONDROPLASIA_CHANCE: f64 = 0.00004;
/// Chance of being infertile regardless of anatomy.
const CONGENITAL_INFERTILITY_CHANCE: f64 = 0.10;

/// Chance of having both a penis and a womb; independently, of having
/// neither.
const INTERSEX_CHANCE: f64 = 0.0085;
/// Chance the gender-conditioned anatomy lookup crosses over.
const ANATOMY_CROSSOVER_CHANCE: f64 = 0.01;

// --- Inheritance rates ---

/// Chance a child inherits a regional impairment both parents carry.
const BOTH_PARENTS_IMPAIRED_CHANCE: f64 = 0.75;
/// Chance when only one parent carries it.
const ONE_PARENT_IMPAIRED_CHANCE: f64 = 0.25;
/// Chance an affected parent passes the achondroplasia allele.
const ACHONDROPLASIA_ALLELE_CHANCE: f64 = 0.5;

// --- Fertility curve ---

/// Curve value at the fertility peak (around age 20).
const FERTILITY_PEAK: f64 = 90.0;
/// Age at which the curve peaks.
const FERTILITY_PEAK_AGE: u32 = 20;
/// Earliest age with any fertility.
const FERTILITY_MIN_AGE: u32 = 16;
/// Yearly decline past the peak for womb-bearing bodies (below 50% by the
/// mid-40s).
const WOMB_DECLINE_PER_YEAR: f64 = 2.0;
/// Yearly decline past the peak for penis-bearing bodies (below 50% by the
/// mid-50s).
const PENIS_DECLINE_PER_YEAR: f64 = 1.2;
/// Fertility modifier while the community has unresolved problems.
const PROBLEM_MODIFIER: f64 = -10.0;
/// Fertility modifier in an untroubled year.
const EASE_MODIFIER: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Side {
    Left,
    Right,
}

string_enum!(Side {
    Left => "left",
    Right => "right",
});

/// Condition of one side of a paired body part. Parts are never deleted,
/// only marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PartCondition {
    Healthy,
    Impaired,
    Missing,
}

string_enum!(PartCondition {
    Healthy => "healthy",
    Impaired => "impaired",
    Missing => "missing",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum BodyRegion {
    Eyes,
    Ears,
    Arms,
    Legs,
}

string_enum!(BodyRegion {
    Eyes => "eyes",
    Ears => "ears",
    Arms => "arms",
    Legs => "legs",
});

/// A left/right pair of one body region, stored as a small copyable record
/// so condition changes never alias through shared references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedPart {
    pub left: PartCondition,
    pub right: PartCondition,
}

impl PairedPart {
    pub fn healthy() -> Self {
        Self {
            left: PartCondition::Healthy,
            right: PartCondition::Healthy,
        }
    }

    pub fn impaired() -> Self {
        Self {
            left: PartCondition::Impaired,
            right: PartCondition::Impaired,
        }
    }

    pub fn get(&self, side: Side) -> PartCondition {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn set(&mut self, side: Side, condition: PartCondition) {
        match side {
            Side::Left => self.left = condition,
            Side::Right => self.right = condition,
        }
    }

    /// True when neither side is healthy.
    pub fn fully_affected(&self) -> bool {
        self.left != PartCondition::Healthy && self.right != PartCondition::Healthy
    }

    fn healthy_sides(&self) -> Vec<Side> {
        [Side::Left, Side::Right]
            .into_iter()
            .filter(|&s| self.get(s) == PartCondition::Healthy)
            .collect()
    }
}

impl Default for PairedPart {
    fn default() -> Self {
        Self::healthy()
    }
}

/// Where a scar sits. Ordered oldest-first on the body record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ScarSite {
    Head,
    Face,
    Torso,
    Arm,
    Leg,
    Hand,
}

string_enum!(ScarSite {
    Head => "head",
    Face => "face",
    Torso => "torso",
    Arm => "arm",
    Leg => "leg",
    Hand => "hand",
});

const SCAR_SITES: [ScarSite; 6] = [
    ScarSite::Head,
    ScarSite::Face,
    ScarSite::Torso,
    ScarSite::Arm,
    ScarSite::Leg,
    ScarSite::Hand,
];

/// What an injury mutator actually did, so the caller can log an accurate
/// history entry instead of guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossReport {
    /// One side was lost; the other still works.
    SingleLoss(BodyRegion, Side),
    /// The lost side was the last working one in its region.
    TotalLoss(BodyRegion, Side),
    /// Nothing was left to lose; the wound scarred instead.
    FallbackScar(ScarSite),
}

/// Physiology. Mutated by aging, illness, and injury; never destroyed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub longevity: f64,
    pub body_type: f64,
    pub eyes: PairedPart,
    pub ears: PairedPart,
    pub arms: PairedPart,
    pub legs: PairedPart,
    pub achondroplasia: bool,
    pub has_penis: bool,
    pub has_womb: bool,
    /// Current fertility on a 0–100 scale, recomputed each year.
    pub fertility: u32,
    /// Infertile bodies never change fertility, which stays 0.
    pub infertile: bool,
    pub scars: Vec<ScarSite>,
}

impl Body {
    /// Draw a newborn-to-stranger body from the congenital tables.
    pub fn randomize(rng: &mut dyn RngCore, gender_hint: Option<Gender>) -> Self {
        let (has_penis, has_womb) = choose_sex(rng, gender_hint);
        let mut body = Self {
            longevity: gaussian(rng, 90.0, 5.0),
            body_type: gaussian(rng, 0.0, 1.0),
            eyes: if rng.random_bool(CONGENITAL_BLINDNESS_CHANCE) {
                PairedPart::impaired()
            } else {
                PairedPart::healthy()
            },
            ears: if rng.random_bool(CONGENITAL_DEAFNESS_CHANCE) {
                PairedPart::impaired()
            } else {
                PairedPart::healthy()
            },
            arms: PairedPart::healthy(),
            legs: PairedPart::healthy(),
            achondroplasia: rng.random_bool(ACHONDROPLASIA_CHANCE),
            has_penis,
            has_womb,
            fertility: 0,
            infertile: rng.random_bool(CONGENITAL_INFERTILITY_CHANCE),
            scars: Vec::new(),
        };
        for region in [BodyRegion::Arms, BodyRegion::Legs] {
            for side in [Side::Left, Side::Right] {
                if rng.random_bool(LIMB_IMPAIRMENT_CHANCE) {
                    body.region_mut(region).set(side, PartCondition::Impaired);
                }
            }
        }
        body
    }

    /// Build a child's body from two parents: regional impairments follow the
    /// both-75% / either-25% rule, achondroplasia is Punnett-style. Returns
    /// the body plus a flag for the fatal double-allele case, which the
    /// genotype records as non-viability.
    pub fn inherit_from(rng: &mut dyn RngCore, mother: &Body, father: &Body) -> (Self, bool) {
        let mut child = Body::randomize(rng, None);
        // Congenital region draws are superseded by inheritance.
        for region in [
            BodyRegion::Eyes,
            BodyRegion::Ears,
            BodyRegion::Arms,
            BodyRegion::Legs,
        ] {
            let m = region_impaired(mother, region);
            let f = region_impaired(father, region);
            let chance = match (m, f) {
                (true, true) => BOTH_PARENTS_IMPAIRED_CHANCE,
                (true, false) | (false, true) => ONE_PARENT_IMPAIRED_CHANCE,
                (false, false) => 0.0,
            };
            *child.region_mut(region) = if chance > 0.0 && rng.random_bool(chance) {
                PairedPart::impaired()
            } else {
                PairedPart::healthy()
            };
        }

        let mut alleles = 0;
        for parent in [mother, father] {
            if parent.achondroplasia && rng.random_bool(ACHONDROPLASIA_ALLELE_CHANCE) {
                alleles += 1;
            }
        }
        child.achondroplasia = alleles >= 1;
        let fatal = alleles == 2;
        (child, fatal)
    }

    pub fn region(&self, region: BodyRegion) -> &PairedPart {
        match region {
            BodyRegion::Eyes => &self.eyes,
            BodyRegion::Ears => &self.ears,
            BodyRegion::Arms => &self.arms,
            BodyRegion::Legs => &self.legs,
        }
    }

    pub fn region_mut(&mut self, region: BodyRegion) -> &mut PairedPart {
        match region {
            BodyRegion::Eyes => &mut self.eyes,
            BodyRegion::Ears => &mut self.ears,
            BodyRegion::Arms => &mut self.arms,
            BodyRegion::Legs => &mut self.legs,
        }
    }

    /// Both-or-neither anatomy.
    pub fn intersex(&self) -> bool {
        self.has_penis == self.has_womb
    }

    /// Recompute fertility for this year. The curve rises to its peak near
    /// age 20 and declines on an anatomy-dependent slope; community problems
    /// depress it, untroubled years lift it. Infertile bodies never change.
    pub fn adjust_fertility(&mut self, has_community_problems: bool, age: u32) {
        if self.infertile {
            return;
        }
        let curve = if age < FERTILITY_MIN_AGE {
            0.0
        } else if age <= FERTILITY_PEAK_AGE {
            FERTILITY_PEAK * (age - FERTILITY_MIN_AGE + 1) as f64
                / (FERTILITY_PEAK_AGE - FERTILITY_MIN_AGE + 1) as f64
        } else {
            let decline = if self.has_womb {
                WOMB_DECLINE_PER_YEAR
            } else {
                PENIS_DECLINE_PER_YEAR
            };
            FERTILITY_PEAK - decline * (age - FERTILITY_PEAK_AGE) as f64
        };
        if curve <= 0.0 {
            self.fertility = 0;
            return;
        }
        let modifier = if has_community_problems {
            PROBLEM_MODIFIER
        } else {
            EASE_MODIFIER
        };
        self.fertility = (curve + modifier).clamp(0.0, FERTILITY_PEAK) as u32;
    }

    /// Lose an eye or an ear on a random still-healthy side. When the region
    /// has no healthy side left, the blow scars the head instead.
    pub fn lose_ear_or_eye(&mut self, rng: &mut dyn RngCore, region: BodyRegion) -> LossReport {
        debug_assert!(matches!(region, BodyRegion::Eyes | BodyRegion::Ears));
        let sides = self.region(region).healthy_sides();
        if sides.is_empty() {
            self.scars.push(ScarSite::Head);
            return LossReport::FallbackScar(ScarSite::Head);
        }
        let side = sides[rng.random_range(0..sides.len())];
        self.region_mut(region).set(side, PartCondition::Missing);
        if self.region(region).fully_affected() {
            LossReport::TotalLoss(region, side)
        } else {
            LossReport::SingleLoss(region, side)
        }
    }

    /// Lose a limb, choosing among still-healthy arm and leg sides. With no
    /// healthy limb remaining the wound lands on the torso as a scar.
    pub fn lose_limb(&mut self, rng: &mut dyn RngCore) -> LossReport {
        let mut candidates: Vec<(BodyRegion, Side)> = Vec::new();
        for region in [BodyRegion::Arms, BodyRegion::Legs] {
            for side in self.region(region).healthy_sides() {
                candidates.push((region, side));
            }
        }
        if candidates.is_empty() {
            self.scars.push(ScarSite::Torso);
            return LossReport::FallbackScar(ScarSite::Torso);
        }
        let (region, side) = candidates[rng.random_range(0..candidates.len())];
        self.region_mut(region).set(side, PartCondition::Missing);
        if self.region(region).fully_affected() {
            LossReport::TotalLoss(region, side)
        } else {
            LossReport::SingleLoss(region, side)
        }
    }

    /// Take a scar at a random site and report where it landed.
    pub fn take_scar(&mut self, rng: &mut dyn RngCore) -> ScarSite {
        let site = SCAR_SITES[rng.random_range(0..SCAR_SITES.len())];
        self.scars.push(site);
        site
    }
}

fn region_impaired(body: &Body, region: BodyRegion) -> bool {
    let part = body.region(region);
    part.left != PartCondition::Healthy || part.right != PartCondition::Healthy
}

/// Decide reproductive anatomy. Two independent tiny draws cover "both" and
/// "neither"; otherwise the gender hint conditions the lookup, with a small
/// crossover chance.
pub fn choose_sex(rng: &mut dyn RngCore, gender_hint: Option<Gender>) -> (bool, bool) {
    if rng.random_bool(INTERSEX_CHANCE) {
        return (true, true);
    }
    if rng.random_bool(INTERSEX_CHANCE) {
        return (false, false);
    }
    let womb_chance = match gender_hint {
        Some(g) if g.feminine() => 1.0 - ANATOMY_CROSSOVER_CHANCE,
        Some(g) if g.masculine() => ANATOMY_CROSSOVER_CHANCE,
        _ => 0.5,
    };
    let has_womb = rng.random_bool(womb_chance);
    (!has_womb, has_womb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn randomized_body_is_plausible() {
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..100 {
            let body = Body::randomize(&mut rng, None);
            assert!(body.longevity > 60.0 && body.longevity < 120.0);
            assert_eq!(body.fertility, 0);
            assert!(body.scars.is_empty());
        }
    }

    #[test]
    fn gender_hint_conditions_anatomy() {
        let mut rng = SmallRng::seed_from_u64(9);
        let mut wombs = 0;
        for _ in 0..500 {
            let (_, has_womb) = choose_sex(&mut rng, Some(Gender::Woman));
            if has_womb {
                wombs += 1;
            }
        }
        assert!(wombs > 450, "womb rate for women too low: {wombs}/500");
    }

    #[test]
    fn fertility_curve_peaks_then_declines_by_anatomy() {
        let mut rng = SmallRng::seed_from_u64(21);
        let mut womb = Body::randomize(&mut rng, Some(Gender::Woman));
        womb.has_womb = true;
        womb.has_penis = false;
        womb.infertile = false;
        let mut penis = womb.clone();
        penis.has_womb = false;
        penis.has_penis = true;

        womb.adjust_fertility(true, 10);
        assert_eq!(womb.fertility, 0);

        womb.adjust_fertility(true, 20);
        let at_peak = womb.fertility;
        womb.adjust_fertility(true, 45);
        assert!(womb.fertility < at_peak);
        assert!(womb.fertility < 50, "womb-bearing fertility at 45: {}", womb.fertility);

        penis.adjust_fertility(true, 45);
        assert!(
            penis.fertility > womb.fertility,
            "penis-bearing decline should be shallower"
        );
        penis.adjust_fertility(true, 56);
        assert!(penis.fertility < 50);
    }

    #[test]
    fn infertile_bodies_never_change() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut body = Body::randomize(&mut rng, None);
        body.infertile = true;
        body.adjust_fertility(false, 20);
        assert_eq!(body.fertility, 0);
    }

    #[test]
    fn sense_loss_falls_back_to_head_wound() {
        let mut rng = SmallRng::seed_from_u64(17);
        let mut body = Body::randomize(&mut rng, None);
        body.eyes = PairedPart::healthy();

        let first = body.lose_ear_or_eye(&mut rng, BodyRegion::Eyes);
        assert!(matches!(first, LossReport::SingleLoss(BodyRegion::Eyes, _)));
        let second = body.lose_ear_or_eye(&mut rng, BodyRegion::Eyes);
        assert!(matches!(second, LossReport::TotalLoss(BodyRegion::Eyes, _)));
        let third = body.lose_ear_or_eye(&mut rng, BodyRegion::Eyes);
        assert_eq!(third, LossReport::FallbackScar(ScarSite::Head));
        assert_eq!(body.scars, vec![ScarSite::Head]);
    }

    #[test]
    fn limb_loss_exhausts_to_torso_scar() {
        let mut rng = SmallRng::seed_from_u64(18);
        let mut body = Body::randomize(&mut rng, None);
        body.arms = PairedPart::healthy();
        body.legs = PairedPart::healthy();
        for _ in 0..4 {
            let report = body.lose_limb(&mut rng);
            assert!(!matches!(report, LossReport::FallbackScar(_)));
        }
        let report = body.lose_limb(&mut rng);
        assert_eq!(report, LossReport::FallbackScar(ScarSite::Torso));
    }

    #[test]
    fn double_allele_achondroplasia_is_fatal() {
        let mut rng = SmallRng::seed_from_u64(30);
        let mut mother = Body::randomize(&mut rng, None);
        let mut father = Body::randomize(&mut rng, None);
        mother.achondroplasia = true;
        father.achondroplasia = true;
        let mut saw_fatal = false;
        let mut saw_carrier = false;
        for _ in 0..200 {
            let (child, fatal) = Body::inherit_from(&mut rng, &mother, &father);
            if fatal {
                assert!(child.achondroplasia);
                saw_fatal = true;
            } else if child.achondroplasia {
                saw_carrier = true;
            }
        }
        assert!(saw_fatal && saw_carrier);
    }

    #[test]
    fn regional_impairment_inherits_more_from_two_parents() {
        let mut rng = SmallRng::seed_from_u64(31);
        let mut mother = Body::randomize(&mut rng, None);
        let mut father = Body::randomize(&mut rng, None);
        mother.eyes = PairedPart::impaired();
        father.eyes = PairedPart::impaired();
        mother.ears = PairedPart::healthy();
        father.ears = PairedPart::healthy();
        let mut inherited = 0;
        for _ in 0..400 {
            let (child, _) = Body::inherit_from(&mut rng, &mother, &father);
            if child.eyes.fully_affected() {
                inherited += 1;
            }
            assert!(!child.ears.fully_affected());
        }
        // 75% nominal; allow generous slack.
        assert!((220..=380).contains(&inherited), "inherited {inherited}/400");
    }
}
