use std::path::PathBuf;

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use serde_json::json;
use tracing::info;

use crate::flush::flush_to_jsonl;
use crate::model::{Community, SettlementKind, Traditions};

/// Shortest meaningful run: anything less produces a history too thin for a
/// chronicle.
pub const MIN_RUN_YEARS: u32 = 50;

/// Founder-count ranges implied by the settlement tradition.
const BAND_FOUNDERS: std::ops::RangeInclusive<u32> = 20..=40;
const VILLAGE_FOUNDERS: std::ops::RangeInclusive<u32> = 125..=175;

/// Calendar year the community is founded in, so founders can have been
/// born decades earlier.
const DEFAULT_START_YEAR: u32 = 100;

/// Configuration for a simulation run.
pub struct RunConfig {
    pub traditions: Traditions,
    /// Founder count; `None` draws one from the settlement's range.
    pub founders: Option<u32>,
    pub start_year: u32,
    /// Years to simulate, at least [`MIN_RUN_YEARS`].
    pub years: u32,
    pub seed: u64,
    /// If set, flush a checkpoint every N years.
    pub flush_interval: Option<u32>,
    /// Directory to write flush checkpoints into.
    pub output_dir: Option<PathBuf>,
}

impl RunConfig {
    pub fn new(traditions: Traditions, years: u32, seed: u64) -> Self {
        Self {
            traditions,
            founders: None,
            start_year: DEFAULT_START_YEAR,
            years,
            seed,
            flush_interval: None,
            output_dir: None,
        }
    }
}

/// Found a community: a fresh registry populated with grown strangers.
pub fn found(config: &RunConfig, rng: &mut dyn RngCore) -> Community {
    let mut community = Community::new(config.traditions.clone(), config.start_year);
    let founders = config.founders.unwrap_or_else(|| {
        let range = match config.traditions.settlement {
            SettlementKind::Band => BAND_FOUNDERS,
            SettlementKind::Village => VILLAGE_FOUNDERS,
        };
        rng.random_range(range)
    });
    for _ in 0..founders {
        let founder = community.generate_stranger(rng, None);
        community.admit(founder);
    }
    community.history.add(
        config.start_year,
        vec!["founded".into()],
        json!({ "founders": founders }),
    );
    info!(
        year = config.start_year,
        founders,
        settlement = %config.traditions.settlement,
        "community founded"
    );
    community
}

/// Run a full simulation from founding.
///
/// Creates a deterministic RNG from `config.seed`, so the same seed always
/// produces the same community.
///
/// # Panics
/// Panics when `config.years` is below [`MIN_RUN_YEARS`].
pub fn run(config: &RunConfig) -> Community {
    assert!(
        config.years >= MIN_RUN_YEARS,
        "a run must cover at least {MIN_RUN_YEARS} years, got {}",
        config.years
    );

    let mut rng = SmallRng::seed_from_u64(config.seed);
    let mut community = found(config, &mut rng);

    for year_offset in 0..config.years {
        community.tick(&mut rng);

        // Flush checkpoint at configured interval
        if let (Some(interval), Some(dir)) = (config.flush_interval, &config.output_dir) {
            let is_last_year = year_offset == config.years - 1;
            if is_last_year || (year_offset > 0 && (year_offset + 1) % interval == 0) {
                let checkpoint_dir = dir.join(format!("year_{:06}", community.current_year));
                flush_to_jsonl(&community, &checkpoint_dir)
                    .expect("failed to write flush checkpoint");
                info!(
                    year = community.current_year,
                    population = community.current_population(),
                    "flushed checkpoint"
                );
            }
        }
    }
    community
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::history::YEAR_TAG;

    #[test]
    fn founding_respects_the_settlement_range() {
        let mut rng = SmallRng::seed_from_u64(0);
        for seed in 0..5 {
            let config = RunConfig::new(Traditions::default(), MIN_RUN_YEARS, seed);
            let community = found(&config, &mut rng);
            let population = community.current_population();
            assert!(
                (20..=40).contains(&population),
                "band founded with {population} members"
            );
        }
    }

    #[test]
    fn explicit_founder_count_wins() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut config = RunConfig::new(Traditions::default(), MIN_RUN_YEARS, 1);
        config.founders = Some(33);
        let community = found(&config, &mut rng);
        assert_eq!(community.current_population(), 33);
    }

    #[test]
    fn run_produces_one_yearly_entry_per_year() {
        let config = RunConfig::new(Traditions::default(), MIN_RUN_YEARS, 2);
        let community = run(&config);
        assert_eq!(
            community.history.with_tag(YEAR_TAG).count(),
            MIN_RUN_YEARS as usize
        );
        assert_eq!(
            community.current_year,
            config.start_year + MIN_RUN_YEARS
        );
    }

    #[test]
    #[should_panic(expected = "at least 50 years")]
    fn short_runs_are_rejected() {
        let config = RunConfig::new(Traditions::default(), 10, 3);
        run(&config);
    }
}
