use std::collections::BTreeMap;

use rand::Rng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::body::Body;
use super::genotype::Genotype;
use super::history::{History, YEAR_TAG};
use super::person::{EventTag, Person, generate_name};
use super::polycule::Polycule;
use super::sexuality::Sexuality;
use super::skills::{DEESCALATION, MAGIC, MEDICINE};
use crate::id::IdGenerator;

// --- Yield and problem tuning ---

/// Yearly territory yield for a band.
const BAND_YIELD: i64 = 30;
/// Yearly territory yield for a village.
const VILLAGE_YIELD: i64 = 150;
/// Members over this baseline each cost one point of yield.
const BAND_CAPACITY: u32 = 30;
const VILLAGE_CAPACITY: u32 = 150;

/// Chance lean times set in during a deficit year.
const LEAN_ONSET_CHANCE: f64 = 0.5;
/// Base onset chance (percent) for sickness and conflict.
const PROBLEM_BASE_CHANCE: u32 = 2;
/// Extra onset chance (percent) while lean.
const LEAN_PROBLEM_BONUS: u32 = 10;
/// One extra percent of onset chance per this many members.
const CROWDING_DIVISOR: u32 = 50;
/// One extra percent of conflict chance per this many points of discord.
const DISCORD_DIVISOR: u32 = 4;

/// Base chance (percent) an active problem clears in a year.
const PROBLEM_SOLVE_BASE: u32 = 30;
/// Extra percent per living master of the relevant specialist skill.
const SPECIALIST_SOLVE_BONUS: u32 = 10;
const PROBLEM_SOLVE_CAP: u32 = 95;

/// Conception chance is the couple's minimum fertility over this divisor,
/// in percent. Tuned so a band replaces its losses across a default-length
/// (150-year) run.
const CONCEPTION_DIVISOR: u32 = 2;

/// Stranger pool bounds: at least 5 candidates, population/4 capped at 10.
const STRANGER_POOL_MIN: u32 = 5;
const STRANGER_POOL_MAX: u32 = 10;
const STRANGER_MIN_AGE: u32 = 16;
const STRANGER_MAX_AGE: u32 = 65;

/// Yearly chance a single adult goes looking for a partner, plus the
/// per-point extraversion bonus. Most attempts fail the acceptance
/// threshold, so the attempt rate is high enough that households still form
/// faster than they dissolve.
const PAIRING_BASE_CHANCE: f64 = 0.35;
const PAIRING_EXTRAVERSION_BONUS: f64 = 0.05;
/// Yearly chance a settled polycule member tries to expand the household.
const EXPANSION_CHANCE: f64 = 0.15;

/// Chance a person's gender identity crosses away from their anatomy.
const GENDER_CROSSOVER_CHANCE: f64 = 0.02;
/// In 3- and 5-gender systems, chance of a special gender without intersex
/// anatomy.
const SPECIAL_GENDER_CHANCE: f64 = 0.02;

/// Gender categories across all recognized gender systems. Which subset is
/// in use depends on the community's tradition cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Gender {
    Woman,
    Man,
    ThirdGender,
    FeminineWoman,
    MasculineWoman,
    FeminineMan,
    MasculineMan,
    FifthGender,
}

string_enum!(Gender {
    Woman => "woman",
    Man => "man",
    ThirdGender => "third gender",
    FeminineWoman => "feminine woman",
    MasculineWoman => "masculine woman",
    FeminineMan => "feminine man",
    MasculineMan => "masculine man",
    FifthGender => "fifth gender",
});

impl Gender {
    pub fn feminine(self) -> bool {
        matches!(
            self,
            Gender::Woman | Gender::FeminineWoman | Gender::MasculineWoman
        )
    }

    pub fn masculine(self) -> bool {
        matches!(
            self,
            Gender::Man | Gender::FeminineMan | Gender::MasculineMan
        )
    }

    /// Third and fifth genders sit outside the binary entirely.
    pub fn special(self) -> bool {
        matches!(self, Gender::ThirdGender | Gender::FifthGender)
    }

    /// Binary-adjacent categories in four- and five-gender systems.
    pub fn semi_special(self) -> bool {
        matches!(self, Gender::MasculineWoman | Gender::FeminineMan)
    }

    /// The categories a given gender system recognizes.
    pub fn catalog(cardinality: u8) -> &'static [Gender] {
        match cardinality {
            2 => &[Gender::Woman, Gender::Man],
            3 => &[Gender::Woman, Gender::Man, Gender::ThirdGender],
            4 => &[
                Gender::FeminineWoman,
                Gender::MasculineWoman,
                Gender::FeminineMan,
                Gender::MasculineMan,
            ],
            5 => &[
                Gender::FeminineWoman,
                Gender::MasculineWoman,
                Gender::FifthGender,
                Gender::FeminineMan,
                Gender::MasculineMan,
            ],
            other => panic!("unsupported gender cardinality: {other}"),
        }
    }

    /// Assign a gender category from anatomy under the given gender system.
    pub fn assign(rng: &mut dyn RngCore, body: &Body, cardinality: u8) -> Gender {
        if body.intersex() {
            match cardinality {
                3 => return Gender::ThirdGender,
                5 => return Gender::FifthGender,
                4 => {
                    return if rng.random_bool(0.5) {
                        Gender::MasculineWoman
                    } else {
                        Gender::FeminineMan
                    };
                }
                _ => {}
            }
        } else if rng.random_bool(SPECIAL_GENDER_CHANCE) {
            match cardinality {
                3 => return Gender::ThirdGender,
                5 => return Gender::FifthGender,
                _ => {}
            }
        }

        let mut feminine = if body.has_womb && !body.has_penis {
            true
        } else if body.has_penis && !body.has_womb {
            false
        } else {
            rng.random_bool(0.5)
        };
        if rng.random_bool(GENDER_CROSSOVER_CHANCE) {
            feminine = !feminine;
        }
        match cardinality {
            2 | 3 => {
                if feminine {
                    Gender::Woman
                } else {
                    Gender::Man
                }
            }
            4 | 5 => match (feminine, rng.random_bool(0.5)) {
                (true, true) => Gender::FeminineWoman,
                (true, false) => Gender::MasculineWoman,
                (false, true) => Gender::MasculineMan,
                (false, false) => Gender::FeminineMan,
            },
            other => panic!("unsupported gender cardinality: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum SettlementKind {
    Band,
    Village,
}

string_enum!(SettlementKind {
    Band => "band",
    Village => "village",
});

/// Communal mood flags plus accumulated discord.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub discord: u32,
    pub lean: bool,
    pub sick: bool,
    pub conflict: bool,
}

impl Status {
    pub fn has_problems(&self) -> bool {
        self.lean || self.sick || self.conflict
    }
}

/// The land the community lives on. Yield accumulates year over year and
/// may go negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Territory {
    #[serde(rename = "yield")]
    pub surplus: i64,
}

/// Cultural settings fixed at founding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Traditions {
    pub settlement: SettlementKind,
    /// Recognized gender-system cardinality, 2 through 5.
    pub genders: u8,
    /// Secret, hereditary magic versus openly taught magic.
    pub magic_secret: bool,
    /// The skill elders push the agreeable young toward.
    pub encouraged_skill: String,
}

impl Traditions {
    pub fn new(
        settlement: SettlementKind,
        genders: u8,
        magic_secret: bool,
        encouraged_skill: impl Into<String>,
    ) -> Self {
        assert!(
            (2..=5).contains(&genders),
            "gender cardinality must be 2-5, got {genders}"
        );
        Self {
            settlement,
            genders,
            magic_secret,
            encouraged_skill: encouraged_skill.into(),
        }
    }
}

impl Default for Traditions {
    fn default() -> Self {
        Self::new(SettlementKind::Band, 3, false, "Storytelling")
    }
}

/// Read-only community context handed to each person's yearly step. Built
/// once per tick so the single ordered pass over people sees a consistent
/// view.
#[derive(Debug, Clone)]
pub struct YearContext {
    pub year: u32,
    pub status: Status,
    pub traditions: Traditions,
    /// Living masters per skill (social learning votes).
    pub skill_census: BTreeMap<String, u32>,
    /// Per person, how many of their parents mastered Magic.
    pub magic_parentage: BTreeMap<u64, u32>,
}

/// One year's aggregate snapshot, recorded in the community history and
/// exported as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRecord {
    pub year: u32,
    pub population: u32,
    #[serde(rename = "yield")]
    pub surplus: i64,
    pub lean: bool,
    pub sick: bool,
    pub conflict: bool,
}

/// Top-level orchestrator: owns the person and polycule registries, the
/// communal status, and the year ledger. Everything cross-references by id
/// through these registries — no object graphs.
#[derive(Debug, Clone)]
pub struct Community {
    pub id_gen: IdGenerator,
    pub current_year: u32,
    pub people: BTreeMap<u64, Person>,
    pub polycules: BTreeMap<u64, Polycule>,
    pub status: Status,
    pub territory: Territory,
    pub traditions: Traditions,
    pub history: History,
}

impl Community {
    pub fn new(traditions: Traditions, start_year: u32) -> Self {
        Self {
            id_gen: IdGenerator::new(),
            current_year: start_year,
            people: BTreeMap::new(),
            polycules: BTreeMap::new(),
            status: Status::default(),
            territory: Territory::default(),
            traditions,
            history: History::new(),
        }
    }

    /// Look up a person.
    ///
    /// # Panics
    /// Panics on an unknown id — passing a stale or foreign id is a caller
    /// contract violation, not simulated-world variance.
    pub fn person(&self, id: u64) -> &Person {
        self.people
            .get(&id)
            .unwrap_or_else(|| panic!("unknown person id {id}"))
    }

    pub fn person_mut(&mut self, id: u64) -> &mut Person {
        self.people
            .get_mut(&id)
            .unwrap_or_else(|| panic!("unknown person id {id}"))
    }

    /// Look up a polycule.
    ///
    /// # Panics
    /// Panics on an unknown id.
    pub fn polycule(&self, id: u64) -> &Polycule {
        self.polycules
            .get(&id)
            .unwrap_or_else(|| panic!("unknown polycule id {id}"))
    }

    /// Register a new person.
    ///
    /// # Panics
    /// Panics if the id is already taken.
    pub fn admit(&mut self, person: Person) {
        let prior = self.people.insert(person.id, person);
        assert!(prior.is_none(), "duplicate person id admitted");
    }

    /// The current population: alive and present. The dead and the departed
    /// stay in the registry for historical queries.
    pub fn current_population(&self) -> u32 {
        self.people.values().filter(|p| p.alive()).count() as u32
    }

    fn masters_of(&self, skill: &str) -> u32 {
        self.people
            .values()
            .filter(|p| p.alive() && p.skills.has_mastered(skill))
            .count() as u32
    }

    /// Accrue this year's territory yield: a flat tradition-dependent gain
    /// minus one per member over the carrying baseline. May go negative.
    pub fn adjust_yield(&mut self) {
        let (base, capacity) = match self.traditions.settlement {
            SettlementKind::Band => (BAND_YIELD, BAND_CAPACITY),
            SettlementKind::Village => (VILLAGE_YIELD, VILLAGE_CAPACITY),
        };
        let over = (self.current_population() as i64 - capacity as i64).max(0);
        self.territory.surplus += base - over;
    }

    /// Probabilistically introduce problems: lean times on a deficit,
    /// sickness and conflict boosted by lean times, crowding, and discord.
    pub fn new_problems(&mut self, rng: &mut dyn RngCore) {
        if self.territory.surplus < 0 && !self.status.lean && rng.random_bool(LEAN_ONSET_CHANCE) {
            self.status.lean = true;
        }
        let population = self.current_population();
        let boost = if self.status.lean { LEAN_PROBLEM_BONUS } else { 0 }
            + population / CROWDING_DIVISOR;
        if !self.status.sick {
            let chance = PROBLEM_BASE_CHANCE + boost;
            self.status.sick = rng.random_range(1..=100) <= chance;
        }
        if !self.status.conflict {
            let chance = PROBLEM_BASE_CHANCE + boost + self.status.discord / DISCORD_DIVISOR;
            self.status.conflict = rng.random_range(1..=100) <= chance;
        }
    }

    /// Probabilistically clear problems. Specialists raise the odds:
    /// Medicine against sickness, Deescalation against conflict. Lean times
    /// end once the territory is back in surplus.
    pub fn solve_problems(&mut self, rng: &mut dyn RngCore) {
        if self.status.lean && self.territory.surplus >= 0 {
            self.status.lean = false;
        }
        if self.status.sick {
            let chance = (PROBLEM_SOLVE_BASE + SPECIALIST_SOLVE_BONUS * self.masters_of(MEDICINE))
                .min(PROBLEM_SOLVE_CAP);
            if rng.random_range(1..=100) <= chance {
                self.status.sick = false;
            }
        }
        if self.status.conflict {
            let chance = (PROBLEM_SOLVE_BASE
                + SPECIALIST_SOLVE_BONUS * self.masters_of(DEESCALATION))
            .min(PROBLEM_SOLVE_CAP);
            if rng.random_range(1..=100) <= chance {
                self.status.conflict = false;
                self.status.discord /= 2;
            }
        }
        self.status.discord = self.status.discord.saturating_sub(1);
    }

    /// Generate one adult stranger, aged up through the ordinary life
    /// course with death disabled so the pre-history cannot kill them.
    pub fn generate_stranger(&mut self, rng: &mut dyn RngCore, gender: Option<Gender>) -> Person {
        let id = self.id_gen.next_id();
        let genotype = Genotype::randomize(rng, gender);
        let gender =
            gender.unwrap_or_else(|| Gender::assign(rng, &genotype.body, self.traditions.genders));
        let sexuality = Sexuality::randomize(rng, &genotype.body, None);
        let age = rng.random_range(STRANGER_MIN_AGE..=STRANGER_MAX_AGE);
        let born = self.current_year.saturating_sub(age);
        let mut person = Person::from_genotype(
            id,
            generate_name(rng),
            Some(born),
            genotype,
            gender,
            sexuality,
            Vec::new(),
        );
        let traditions = self.traditions.clone();
        for year in (born + 1)..=self.current_year {
            let ctx = YearContext {
                year,
                status: Status::default(),
                traditions: traditions.clone(),
                skill_census: BTreeMap::new(),
                magic_parentage: BTreeMap::new(),
            };
            person.live_year(&ctx, rng, false);
        }
        person
    }

    /// The immigrant candidate pool for this year: at least five strangers,
    /// population/4 at most, capped at ten.
    pub fn generate_strangers(&mut self, rng: &mut dyn RngCore) -> Vec<Person> {
        let pool = (self.current_population() / 4).clamp(STRANGER_POOL_MIN, STRANGER_POOL_MAX);
        (0..pool).map(|_| self.generate_stranger(rng, None)).collect()
    }

    /// Build the read-only context for this year's aging pass.
    pub fn year_context(&self) -> YearContext {
        let mut skill_census: BTreeMap<String, u32> = BTreeMap::new();
        for person in self.people.values().filter(|p| p.alive()) {
            for skill in &person.skills.mastered {
                *skill_census.entry(skill.clone()).or_default() += 1;
            }
        }
        let mut magic_parentage: BTreeMap<u64, u32> = BTreeMap::new();
        for person in self.people.values().filter(|p| p.alive()) {
            let count = person
                .parents
                .iter()
                .filter(|id| {
                    self.people
                        .get(id)
                        .is_some_and(|parent| parent.skills.has_mastered(MAGIC))
                })
                .count() as u32;
            if count > 0 {
                magic_parentage.insert(person.id, count);
            }
        }
        YearContext {
            year: self.current_year,
            status: self.status,
            traditions: self.traditions.clone(),
            skill_census,
            magic_parentage,
        }
    }

    /// Remove a person from their polycule, if any, dissolving it when only
    /// one member would remain. `responsible` is the party a chronicler
    /// would blame.
    pub fn eject(&mut self, person_id: u64, responsible: u64) {
        let Some(polycule_id) = self.people.get(&person_id).and_then(|p| p.polycule) else {
            return;
        };
        let year = self.current_year;
        let mut polycule = self
            .polycules
            .remove(&polycule_id)
            .unwrap_or_else(|| panic!("person {person_id} points at missing polycule {polycule_id}"));
        let remaining = polycule.remove(person_id, responsible, year);
        self.person_mut(person_id).polycule = None;
        if remaining <= 1 {
            for &member in polycule.members() {
                if let Some(person) = self.people.get_mut(&member) {
                    person.polycule = None;
                }
            }
            self.history.add(
                year,
                vec!["dissolved".into()],
                json!({ "polycule": polycule_id, "responsible": responsible }),
            );
        } else {
            self.polycules.insert(polycule_id, polycule);
        }
    }

    /// Dissolve a polycule outright, e.g. when adultery handling (outside
    /// the core) decides the household cannot survive the betrayal.
    pub fn breakup(&mut self, polycule_id: u64, responsible: u64) {
        let year = self.current_year;
        let polycule = self
            .polycules
            .remove(&polycule_id)
            .unwrap_or_else(|| panic!("unknown polycule id {polycule_id}"));
        for &member in polycule.members() {
            if let Some(person) = self.people.get_mut(&member) {
                person.polycule = None;
                person.record(year, EventTag::Family, "the household broke apart");
            }
        }
        self.history.add(
            year,
            vec!["dissolved".into()],
            json!({ "polycule": polycule_id, "responsible": responsible }),
        );
    }

    /// Advance the community one year: yield, problems, the single ordered
    /// aging pass, conceptions, pairing attempts, and the yearly ledger
    /// entry.
    pub fn tick(&mut self, rng: &mut dyn RngCore) {
        self.current_year += 1;
        self.adjust_yield();
        self.new_problems(rng);
        self.solve_problems(rng);

        let ctx = self.year_context();
        let ids: Vec<u64> = self
            .people
            .iter()
            .filter(|(_, p)| p.alive())
            .map(|(&id, _)| id)
            .collect();
        let mut departed = Vec::new();
        for id in ids {
            let mut person = self
                .people
                .remove(&id)
                .unwrap_or_else(|| panic!("person {id} vanished mid-tick"));
            let outcome = person.live_year(&ctx, rng, true);
            self.people.insert(id, person);
            self.status.discord = self.status.discord.saturating_add(outcome.discord);
            if outcome.died || outcome.left {
                departed.push(id);
            }
        }
        for id in departed {
            self.eject(id, id);
        }

        self.births(rng);
        self.pairing_attempts(rng);

        let record = YearRecord {
            year: self.current_year,
            population: self.current_population(),
            surplus: self.territory.surplus,
            lean: self.status.lean,
            sick: self.status.sick,
            conflict: self.status.conflict,
        };
        self.history.add(
            self.current_year,
            vec![YEAR_TAG.into()],
            serde_json::to_value(&record).expect("year record serializes"),
        );
    }

    /// One conception attempt per polycule per year, needing a fertile
    /// womb-bearing and a distinct fertile penis-bearing living member.
    fn births(&mut self, rng: &mut dyn RngCore) {
        let year = self.current_year;
        struct Conception {
            polycule_id: u64,
            mother: u64,
            father: u64,
        }
        let mut conceptions = Vec::new();
        for (&polycule_id, polycule) in &self.polycules {
            let mut mother: Option<(u64, u32)> = None;
            for &m in polycule.members() {
                let p = self.person(m);
                if p.alive() && p.body.has_womb && p.body.fertility > 0 {
                    if mother.is_none_or(|(_, f)| p.body.fertility > f) {
                        mother = Some((m, p.body.fertility));
                    }
                }
            }
            let Some((mother_id, mother_fertility)) = mother else {
                continue;
            };
            let mut father: Option<(u64, u32)> = None;
            for &m in polycule.members() {
                let p = self.person(m);
                if m != mother_id && p.alive() && p.body.has_penis && p.body.fertility > 0 {
                    if father.is_none_or(|(_, f)| p.body.fertility > f) {
                        father = Some((m, p.body.fertility));
                    }
                }
            }
            let Some((father_id, father_fertility)) = father else {
                continue;
            };
            let chance = mother_fertility.min(father_fertility) / CONCEPTION_DIVISOR;
            if rng.random_range(1..=100) <= chance {
                conceptions.push(Conception {
                    polycule_id,
                    mother: mother_id,
                    father: father_id,
                });
            }
        }

        for c in conceptions {
            let mother_genotype = self.person(c.mother).genotype();
            let father_genotype = self.person(c.father).genotype();
            let Some(child_genotype) = Genotype::descend(rng, &mother_genotype, &father_genotype)
            else {
                continue;
            };
            if !child_genotype.viable {
                self.status.discord = self.status.discord.saturating_add(1);
                for id in [c.mother, c.father] {
                    self.person_mut(id)
                        .record(year, EventTag::Family, "lost a child at birth");
                }
                if let Some(polycule) = self.polycules.get_mut(&c.polycule_id) {
                    polycule.history.add(
                        year,
                        vec!["stillbirth".into()],
                        json!({ "parents": [c.mother, c.father] }),
                    );
                }
                continue;
            }
            let id = self.id_gen.next_id();
            let gender = Gender::assign(rng, &child_genotype.body, self.traditions.genders);
            let sexuality = Sexuality::randomize(rng, &child_genotype.body, None);
            let name = generate_name(rng);
            let mut child = Person::from_genotype(
                id,
                name.clone(),
                Some(year),
                child_genotype,
                gender,
                sexuality,
                vec![c.mother, c.father],
            );
            child.record(year, EventTag::Born, "born into the community");
            for parent in [c.mother, c.father] {
                self.person_mut(parent)
                    .record(year, EventTag::Family, format!("had a child, {name}"));
            }
            if let Some(polycule) = self.polycules.get_mut(&c.polycule_id) {
                polycule
                    .history
                    .add(year, vec!["born".into()], json!({ "child": id }));
            }
            self.admit(child);
        }
    }

    /// Let some people go looking: singles weighted by extraversion,
    /// settled households occasionally trying to grow.
    fn pairing_attempts(&mut self, rng: &mut dyn RngCore) {
        let year = self.current_year;
        let seekers: Vec<(u64, f64, bool)> = self
            .people
            .values()
            .filter(|p| p.alive() && p.age(year).is_some_and(|a| a > 15))
            .map(|p| (p.id, p.personality.extraversion, p.polycule.is_some()))
            .collect();
        for (id, extraversion, settled) in seekers {
            let chance = if settled {
                EXPANSION_CHANCE
            } else {
                (PAIRING_BASE_CHANCE + PAIRING_EXTRAVERSION_BONUS * extraversion).clamp(0.05, 0.6)
            };
            if rng.random_bool(chance) {
                Polycule::form(self, id, rng);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn small_community(rng: &mut SmallRng, founders: u32) -> Community {
        let mut community = Community::new(Traditions::default(), 100);
        for _ in 0..founders {
            let stranger = community.generate_stranger(rng, None);
            community.admit(stranger);
        }
        community
    }

    #[test]
    fn yield_goes_negative_under_crowding() {
        let mut rng = SmallRng::seed_from_u64(70);
        let mut community = small_community(&mut rng, 80);
        for _ in 0..10 {
            community.adjust_yield();
        }
        assert!(
            community.territory.surplus < 0,
            "80 members in a band should overrun the baseline: {}",
            community.territory.surplus
        );
    }

    #[test]
    fn problems_eventually_arise_and_resolve() {
        let mut rng = SmallRng::seed_from_u64(71);
        let mut community = small_community(&mut rng, 25);
        let mut ever_problem = false;
        let mut cleared_after_problem = false;
        for _ in 0..200 {
            community.tick(&mut rng);
            if community.status.has_problems() {
                ever_problem = true;
            } else if ever_problem {
                cleared_after_problem = true;
            }
        }
        assert!(ever_problem, "two centuries without a single problem");
        assert!(cleared_after_problem, "problems never resolved");
    }

    #[test]
    fn ejecting_the_second_to_last_member_dissolves_the_polycule() {
        let mut rng = SmallRng::seed_from_u64(72);
        let mut community = small_community(&mut rng, 10);
        let ids: Vec<u64> = community.people.keys().copied().take(2).collect();
        let polycule_id = {
            let a = community.person(ids[0]).clone();
            let b = community.person(ids[1]).clone();
            crate::model::polycule::Pair { a: a.id, b: b.id, love: 1.0 }
                .save(&mut community, 100)
        };
        assert_eq!(community.person(ids[0]).polycule, Some(polycule_id));

        community.eject(ids[0], ids[0]);
        assert!(community.polycules.is_empty());
        assert_eq!(community.person(ids[0]).polycule, None);
        assert_eq!(community.person(ids[1]).polycule, None);
        assert_eq!(community.history.with_tag("dissolved").count(), 1);
    }

    #[test]
    fn strangers_arrive_grown_and_alive() {
        let mut rng = SmallRng::seed_from_u64(73);
        let mut community = small_community(&mut rng, 5);
        let pool = community.generate_strangers(&mut rng);
        assert!(pool.len() >= 5);
        for stranger in &pool {
            assert!(stranger.alive());
            let age = stranger.age(community.current_year).unwrap();
            assert!((16..=65).contains(&age), "stranger aged {age}");
        }
    }
}
