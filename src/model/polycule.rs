use std::collections::BTreeMap;

use rand::Rng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::community::Community;
use super::history::History;
use super::person::{EventTag, Person};
use super::sexuality::Sexuality;

/// A trial polycule must average above this to be committed. Tuned value,
/// kept verbatim.
pub const ACCEPTANCE_THRESHOLD: f64 = 0.4;

/// Random jitter added to every pairwise compatibility roll.
const LOVE_JITTER: f64 = 5.0;

/// Youngest valid pairing age, exclusive.
const PAIRING_MIN_AGE: u32 = 15;

/// Pairwise compatibility. The convention is inverted: the score is the
/// negated sum of personality distance and jitter, so a smaller-magnitude
/// distance yields a higher, better score.
pub fn love_score(a: &Person, b: &Person, rng: &mut dyn RngCore) -> f64 {
    -(a.personality.distance(&b.personality) + rng.random_range(-LOVE_JITTER..=LOVE_JITTER))
}

/// Two people and their symmetric love score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    pub a: u64,
    pub b: u64,
    pub love: f64,
}

impl Pair {
    /// Score a prospective pair. Returns `None` when either side is asexual
    /// or not attracted to the other's gender — an expected outcome, not an
    /// error.
    pub fn new(a: &Person, b: &Person, rng: &mut dyn RngCore) -> Option<Pair> {
        if a.sexuality.attraction_to(b.gender) <= 0.0
            || b.sexuality.attraction_to(a.gender) <= 0.0
        {
            return None;
        }
        Some(Pair {
            a: a.id,
            b: b.id,
            love: love_score(a, b, rng),
        })
    }

    /// Record the pair reciprocally on both persons as a fresh two-member
    /// polycule in the community registry.
    ///
    /// # Panics
    /// Panics if either person is unknown or already belongs to a polycule.
    pub fn save(&self, community: &mut Community, year: u32) -> u64 {
        for id in [self.a, self.b] {
            let person = community.person(id);
            assert!(
                person.polycule.is_none(),
                "Pair::save: person {id} already belongs to polycule {:?}",
                person.polycule
            );
        }
        let polycule_id = community.id_gen.next_id();
        let polycule = Polycule::found(polycule_id, year, self.a, self.b, self.love);
        for id in [self.a, self.b] {
            let person = community.person_mut(id);
            person.polycule = Some(polycule_id);
            person.record(year, EventTag::Family, "joined a new household");
        }
        community.polycules.insert(polycule_id, polycule);
        polycule_id
    }
}

/// A group relationship: an ordered member list plus a symmetric N×N love
/// matrix with an undefined diagonal, and its own history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polycule {
    pub id: u64,
    members: Vec<u64>,
    matrix: Vec<Vec<Option<f64>>>,
    pub history: History,
}

impl Polycule {
    /// Found a two-member polycule with a known pairwise score.
    pub fn found(id: u64, year: u32, a: u64, b: u64, love: f64) -> Self {
        let mut polycule = Self {
            id,
            members: vec![a],
            matrix: vec![vec![None]],
            history: History::new(),
        };
        polycule.push_member(b, vec![love]);
        polycule
            .history
            .add(year, vec!["formed".into()], json!({ "members": [a, b], "love": love }));
        polycule
    }

    pub fn members(&self) -> &[u64] {
        &self.members
    }

    pub fn contains(&self, person_id: u64) -> bool {
        self.members.contains(&person_id)
    }

    pub fn matrix(&self) -> &[Vec<Option<f64>>] {
        &self.matrix
    }

    pub fn love_between(&self, a: u64, b: u64) -> Option<f64> {
        let i = self.members.iter().position(|&m| m == a)?;
        let j = self.members.iter().position(|&m| m == b)?;
        self.matrix[i][j]
    }

    /// Append a member with precomputed scores against each existing member,
    /// keeping the matrix symmetric with an undefined diagonal.
    fn push_member(&mut self, person_id: u64, scores: Vec<f64>) {
        assert_eq!(
            scores.len(),
            self.members.len(),
            "push_member: need one score per existing member"
        );
        for (row, &score) in self.matrix.iter_mut().zip(&scores) {
            row.push(Some(score));
        }
        let mut new_row: Vec<Option<f64>> = scores.into_iter().map(Some).collect();
        new_row.push(None);
        self.matrix.push(new_row);
        self.members.push(person_id);
    }

    /// Add a person, scoring them against every existing member.
    ///
    /// # Panics
    /// Panics if the person is already a member, or an existing member id
    /// cannot be resolved — both registry-contract violations.
    pub fn add(
        &mut self,
        person: &Person,
        people: &BTreeMap<u64, Person>,
        rng: &mut dyn RngCore,
        year: u32,
    ) {
        assert!(
            !self.contains(person.id),
            "Polycule::add: person {} is already a member",
            person.id
        );
        let scores: Vec<f64> = self
            .members
            .iter()
            .map(|&id| {
                let member = people
                    .get(&id)
                    .unwrap_or_else(|| panic!("Polycule::add: member {id} not in registry"));
                love_score(member, person, rng)
            })
            .collect();
        self.push_member(person.id, scores);
        self.history
            .add(year, vec!["expanded".into()], json!({ "joined": person.id }));
    }

    /// Drop a member, rebuilding a smaller matrix that preserves the
    /// remaining pairwise values. Returns the remaining member count; a
    /// count of one means the caller must dissolve the polycule.
    ///
    /// # Panics
    /// Panics if the person is not a member.
    pub fn remove(&mut self, person_id: u64, responsible: u64, year: u32) -> usize {
        let idx = self
            .members
            .iter()
            .position(|&m| m == person_id)
            .unwrap_or_else(|| {
                panic!("Polycule::remove: person {person_id} is not a member of {}", self.id)
            });
        self.members.remove(idx);
        self.matrix.remove(idx);
        for row in &mut self.matrix {
            row.remove(idx);
        }
        self.history.add(
            year,
            vec!["reduced".into()],
            json!({ "removed": person_id, "responsible": responsible }),
        );
        self.members.len()
    }

    /// Mean of the off-diagonal entries, optionally recomputed as if one
    /// member were absent (the marginal-contribution probe). Zero when no
    /// pair remains.
    pub fn avg(&self, excluding: Option<u64>) -> f64 {
        let excluded = excluding.and_then(|id| self.members.iter().position(|&m| m == id));
        let mut sum = 0.0;
        let mut count = 0u32;
        for i in 0..self.members.len() {
            for j in (i + 1)..self.members.len() {
                if excluded == Some(i) || excluded == Some(j) {
                    continue;
                }
                if let Some(love) = self.matrix[i][j] {
                    sum += love;
                    count += 1;
                }
            }
        }
        if count == 0 { 0.0 } else { sum / count as f64 }
    }

    /// Try to form a new polycule around a person, or expand the one they
    /// are in. Samples candidate partner genders from the person's
    /// orientation (more extraverted people look wider), pulls matching
    /// strangers from the immigrant pool, ranks one trial per candidate by
    /// `avg`, and commits the best when it clears the acceptance threshold.
    ///
    /// Returns the polycule id on success; `None` is the expected "nothing
    /// formed" outcome.
    ///
    /// # Panics
    /// Panics if `person_id` is not in the registry.
    pub fn form(community: &mut Community, person_id: u64, rng: &mut dyn RngCore) -> Option<u64> {
        let year = community.current_year;
        let cardinality = community.traditions.genders;
        let subject = community.person(person_id).clone();
        if !subject.alive() {
            return None;
        }
        let age = subject.age(year)?;
        if age <= PAIRING_MIN_AGE {
            return None;
        }

        let sample = ((subject.personality.extraversion + 2.0).ceil()).clamp(1.0, 5.0) as usize;
        let preferred = subject
            .sexuality
            .gender_preferences(rng, cardinality, sample);
        if preferred.is_empty() {
            return None;
        }

        // Candidates come from the stranger pool; their orientation is
        // re-derived toward the subject.
        let mut pool = community.generate_strangers(rng);
        let mut candidates: Vec<Person> = Vec::new();
        for gender in preferred {
            let mut candidate = match pool.iter().position(|p| p.gender == gender) {
                Some(i) => pool.swap_remove(i),
                None => community.generate_stranger(rng, Some(gender)),
            };
            candidate.sexuality =
                Sexuality::randomize(rng, &candidate.body, Some(subject.gender));
            candidates.push(candidate);
        }

        match subject.polycule {
            None => {
                let mut best: Option<(usize, Pair)> = None;
                for (i, candidate) in candidates.iter().enumerate() {
                    if let Some(pair) = Pair::new(&subject, candidate, rng) {
                        if best.as_ref().is_none_or(|(_, b)| pair.love > b.love) {
                            best = Some((i, pair));
                        }
                    }
                }
                let (i, pair) = best?;
                if pair.love <= ACCEPTANCE_THRESHOLD {
                    return None;
                }
                let candidate = candidates.swap_remove(i);
                community.admit(candidate);
                Some(pair.save(community, year))
            }
            Some(polycule_id) => {
                // Trial each candidate against every current member.
                let member_ids: Vec<u64> =
                    community.polycule(polycule_id).members().to_vec();
                let mut best: Option<(usize, Vec<f64>, f64)> = None;
                for (i, candidate) in candidates.iter().enumerate() {
                    let scores: Vec<f64> = member_ids
                        .iter()
                        .map(|&id| love_score(community.person(id), candidate, rng))
                        .collect();
                    let polycule = community.polycule(polycule_id);
                    let pairs = polycule.members().len() * (polycule.members().len() - 1) / 2;
                    let trial_avg = (polycule.avg(None) * pairs as f64
                        + scores.iter().sum::<f64>())
                        / (pairs + scores.len()) as f64;
                    if best.as_ref().is_none_or(|(_, _, b)| trial_avg > *b) {
                        best = Some((i, scores, trial_avg));
                    }
                }
                let (i, scores, trial_avg) = best?;
                if trial_avg <= ACCEPTANCE_THRESHOLD {
                    return None;
                }
                let candidate = candidates.swap_remove(i);
                let candidate_id = candidate.id;
                community.admit(candidate);
                let mut polycule = community
                    .polycules
                    .remove(&polycule_id)
                    .unwrap_or_else(|| panic!("Polycule::form: polycule {polycule_id} vanished"));
                polycule.push_member(candidate_id, scores);
                polycule
                    .history
                    .add(year, vec!["expanded".into()], json!({ "joined": candidate_id }));
                community.polycules.insert(polycule_id, polycule);
                let joined = community.person_mut(candidate_id);
                joined.polycule = Some(polycule_id);
                joined.record(year, EventTag::Family, "joined an existing household");
                Some(polycule_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use crate::model::community::Gender;
    use crate::model::genotype::Genotype;
    use crate::model::person::generate_name;

    fn person(id: u64, rng: &mut SmallRng) -> Person {
        let genotype = Genotype::randomize(rng, None);
        let sexuality = Sexuality::randomize(rng, &genotype.body, Some(Gender::Woman));
        let gender = Gender::assign(rng, &genotype.body, 3);
        Person::from_genotype(id, generate_name(rng), Some(0), genotype, gender, sexuality, vec![])
    }

    fn symmetric_with_undefined_diagonal(p: &Polycule) {
        let n = p.members().len();
        assert_eq!(p.matrix().len(), n);
        for (i, row) in p.matrix().iter().enumerate() {
            assert_eq!(row.len(), n);
            assert_eq!(row[i], None, "diagonal must stay undefined");
            for j in 0..n {
                assert_eq!(p.matrix()[i][j], p.matrix()[j][i]);
            }
        }
    }

    #[test]
    fn two_member_avg_equals_the_pairwise_score() {
        let polycule = Polycule::found(1, 10, 2, 3, -1.25);
        assert_eq!(polycule.avg(None), -1.25);
        assert_eq!(polycule.love_between(2, 3), Some(-1.25));
    }

    #[test]
    fn matrix_invariants_survive_add_and_remove() {
        let mut rng = SmallRng::seed_from_u64(60);
        let mut people = BTreeMap::new();
        for id in 1..=5u64 {
            people.insert(id, person(id, &mut rng));
        }
        let mut polycule = Polycule::found(100, 0, 1, 2, -2.0);
        symmetric_with_undefined_diagonal(&polycule);

        for id in 3..=5u64 {
            let joiner = people.get(&id).unwrap().clone();
            polycule.add(&joiner, &people, &mut rng, 1);
            symmetric_with_undefined_diagonal(&polycule);
        }
        assert_eq!(polycule.members().len(), 5);

        let kept = polycule.love_between(1, 4);
        assert_eq!(polycule.remove(3, 3, 2), 4);
        symmetric_with_undefined_diagonal(&polycule);
        // Remaining pairwise values are preserved.
        assert_eq!(polycule.love_between(1, 4), kept);
        assert!(polycule.love_between(1, 3).is_none());

        assert_eq!(polycule.remove(1, 1, 3), 3);
        assert_eq!(polycule.remove(4, 1, 3), 2);
        assert_eq!(polycule.remove(5, 1, 3), 1);
        symmetric_with_undefined_diagonal(&polycule);
    }

    #[test]
    fn excluding_a_member_recomputes_the_mean() {
        let mut polycule = Polycule::found(1, 0, 1, 2, -4.0);
        polycule.push_member(3, vec![-1.0, -1.0]);
        // Pairs: (1,2)=-4, (1,3)=-1, (2,3)=-1.
        assert!((polycule.avg(None) - (-2.0)).abs() < 1e-9);
        assert!((polycule.avg(Some(1)) - (-1.0)).abs() < 1e-9);
        assert!((polycule.avg(Some(3)) - (-4.0)).abs() < 1e-9);
    }

    #[test]
    fn incompatible_pair_is_not_formed() {
        let mut rng = SmallRng::seed_from_u64(61);
        let mut a = person(1, &mut rng);
        let b = person(2, &mut rng);
        a.sexuality = Sexuality::asexual();
        assert!(Pair::new(&a, &b, &mut rng).is_none());
    }
}
