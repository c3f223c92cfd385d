use std::collections::BTreeSet;

use rand::RngCore;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::community::YearContext;
use super::person::{EventTag, Person};

pub const MAGIC: &str = "Magic";
pub const MEDICINE: &str = "Medicine";
pub const DEESCALATION: &str = "Deescalation";

/// A learnable skill and its selection flags. Flagged skills (rare,
/// discouraged, or age-restricted) get reshuffled away when drawn first.
pub struct SkillDef {
    pub name: &'static str,
    pub specializations: &'static [&'static str],
    pub rare: bool,
    pub discouraged: bool,
    pub min_age: Option<u32>,
}

const DEF: SkillDef = SkillDef {
    name: "",
    specializations: &[],
    rare: false,
    discouraged: false,
    min_age: None,
};

/// The community's skill catalog. Sub-specializations become learnable once
/// the parent skill is mastered.
pub const CATALOG: &[SkillDef] = &[
    SkillDef { name: "Cooking", ..DEF },
    SkillDef { name: DEESCALATION, ..DEF },
    SkillDef { name: "Fishing", ..DEF },
    SkillDef { name: "Gathering", ..DEF },
    SkillDef {
        name: "Hunting",
        specializations: &["Archery", "Tracking", "Trapping"],
        ..DEF
    },
    SkillDef {
        name: "Leadership",
        min_age: Some(30),
        ..DEF
    },
    SkillDef {
        name: MAGIC,
        rare: true,
        ..DEF
    },
    SkillDef {
        name: MEDICINE,
        specializations: &["Herbalism", "Midwifery", "Surgery"],
        ..DEF
    },
    SkillDef { name: "Music", ..DEF },
    SkillDef {
        name: "Scouting",
        discouraged: true,
        ..DEF
    },
    SkillDef { name: "Storytelling", ..DEF },
    SkillDef {
        name: "Toolmaking",
        specializations: &["Knapping", "Potting", "Weaving"],
        ..DEF
    },
];

pub fn definition(name: &str) -> Option<&'static SkillDef> {
    CATALOG.iter().find(|d| d.name == name)
}

/// Whether drawing this skill first should trigger a reshuffle for a person
/// of the given age. Specializations carry no flags of their own.
pub fn is_flagged(name: &str, age: u32) -> bool {
    match definition(name) {
        Some(def) => {
            def.rare || def.discouraged || def.min_age.is_some_and(|min| age < min)
        }
        None => false,
    }
}

/// A skill being learned and the year mastery is due.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Learning {
    pub skill: String,
    pub completion_year: u32,
}

/// One person's mastery set plus at most one in-progress skill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillSet {
    pub mastered: BTreeSet<String>,
    pub learning: Option<Learning>,
}

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_mastered(&self, name: &str) -> bool {
        self.mastered.contains(name)
    }
}

// --- Magical-calling weights ---

/// Per magic-mastering parent, when the community keeps magic secret and
/// hereditary.
const MAGIC_PARENT_SECRET_WEIGHT: f64 = 40.0;
/// Per magic-mastering parent under an open magic tradition.
const MAGIC_PARENT_OPEN_WEIGHT: f64 = 4.0;
const INTERSEX_WEIGHT: f64 = 15.0;
const SPECIAL_GENDER_WEIGHT: f64 = 15.0;
const SEMI_SPECIAL_GENDER_WEIGHT: f64 = 10.0;
const NEURODIVERGENCE_WEIGHT: f64 = 10.0;
const ACHONDROPLASIA_WEIGHT: f64 = 10.0;
const SKOLIOPHILIA_WEIGHT: f64 = 10.0;
const BINARY_ORIENTATION_WEIGHT: f64 = 3.0;
/// Per recorded illness, infection, or injury in the person's log.
const INCIDENT_WEIGHT: f64 = 2.0;

/// An intelligence draw this far from the population mean counts as
/// neurodivergent for the calling.
const NEURODIVERGENCE_SIGMA: f64 = 2.0;

/// Score the pull toward learning Magic, on the same 0–100 scale the caller
/// rolls against.
pub fn magical_calling(person: &Person, ctx: &YearContext) -> u32 {
    let parent_weight = if ctx.traditions.magic_secret {
        MAGIC_PARENT_SECRET_WEIGHT
    } else {
        MAGIC_PARENT_OPEN_WEIGHT
    };
    let magic_parents = ctx.magic_parentage.get(&person.id).copied().unwrap_or(0);

    let mut score = magic_parents as f64 * parent_weight;
    if person.body.intersex() {
        score += INTERSEX_WEIGHT;
    }
    if person.gender.special() {
        score += SPECIAL_GENDER_WEIGHT;
    } else if person.gender.semi_special() {
        score += SEMI_SPECIAL_GENDER_WEIGHT;
    }
    if person.intelligence.abs() > NEURODIVERGENCE_SIGMA {
        score += NEURODIVERGENCE_WEIGHT;
    }
    if person.body.achondroplasia {
        score += ACHONDROPLASIA_WEIGHT;
    }
    score += person.sexuality.skoliophilia * SKOLIOPHILIA_WEIGHT;
    score += (person.sexuality.androphilia + person.sexuality.gynephilia)
        * BINARY_ORIENTATION_WEIGHT;
    let incidents = person
        .log
        .iter()
        .filter(|e| {
            matches!(
                e.tag,
                EventTag::Sickness | EventTag::Infection | EventTag::Injury
            )
        })
        .count();
    score += incidents as f64 * INCIDENT_WEIGHT;

    score.clamp(0.0, 100.0) as u32
}

/// Enumerate what this person could take up next, as a shuffled multiset —
/// duplicate votes bias the later random draw.
///
/// Votes come from: the base catalog (or a mastered skill's
/// specializations), the community's encouraged skill scaled by
/// agreeableness, and one vote per skill mastered by any living member
/// (social learning).
pub fn learnable(
    set: &SkillSet,
    ctx: &YearContext,
    agreeableness: f64,
    specialize_in: Option<&str>,
    rng: &mut dyn RngCore,
) -> Vec<String> {
    let mut options: Vec<String> = match specialize_in {
        Some(parent) => definition(parent)
            .map(|d| d.specializations.iter().map(|s| s.to_string()).collect())
            .unwrap_or_default(),
        None => CATALOG.iter().map(|d| d.name.to_string()).collect(),
    };

    // Specializations of anything already mastered open up.
    for name in &set.mastered {
        if let Some(def) = definition(name) {
            options.extend(def.specializations.iter().map(|s| s.to_string()));
        }
    }

    options.retain(|s| !set.has_mastered(s));

    let encouraged = &ctx.traditions.encouraged_skill;
    if !set.has_mastered(encouraged) {
        let votes = ((agreeableness + 1.0).ceil()).max(0.0) as usize;
        for _ in 0..votes {
            options.push(encouraged.clone());
        }
    }

    for (skill, &count) in &ctx.skill_census {
        if set.has_mastered(skill) {
            continue;
        }
        for _ in 0..count {
            options.push(skill.clone());
        }
    }

    options.shuffle(rng);
    options
}
