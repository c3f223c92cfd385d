use serde::{Deserialize, Serialize};

use crate::model::history::YEAR_TAG;
use crate::model::{Community, Person, Polycule, Record, YearRecord};

/// A flat, serializable view of a community at one moment: everyone who ever
/// lived, every household ever formed, the per-year ledger, and the full
/// chronicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunitySnapshot {
    pub year: u32,
    pub people: Vec<Person>,
    pub polycules: Vec<Polycule>,
    pub years: Vec<YearRecord>,
    pub chronicle: Vec<Record>,
}

impl CommunitySnapshot {
    pub fn capture(community: &Community) -> Self {
        let years = community
            .history
            .with_tag(YEAR_TAG)
            .filter_map(|record| serde_json::from_value(record.payload.clone()).ok())
            .collect();
        Self {
            year: community.current_year,
            people: community.people.values().cloned().collect(),
            polycules: community.polycules.values().cloned().collect(),
            years,
            chronicle: community.history.entries().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use crate::model::Traditions;

    #[test]
    fn capture_reads_back_every_yearly_record() {
        let mut rng = SmallRng::seed_from_u64(80);
        let mut community = Community::new(Traditions::default(), 100);
        for _ in 0..10 {
            let founder = community.generate_stranger(&mut rng, None);
            community.admit(founder);
        }
        for _ in 0..5 {
            community.tick(&mut rng);
        }
        let snapshot = CommunitySnapshot::capture(&community);
        assert_eq!(snapshot.year, 105);
        assert_eq!(snapshot.years.len(), 5);
        assert_eq!(snapshot.people.len(), community.people.len());
        for (record, year) in snapshot.years.iter().zip(101..=105) {
            assert_eq!(record.year, year);
        }
    }
}
