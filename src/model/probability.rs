use rand::Rng;
use rand::RngCore;

/// Hard cap on rejection-sampling retries. A correctly configured table
/// resolves in a handful of draws; hitting the cap means the acceptable
/// entries have effectively zero combined weight.
const MAX_REJECTION_RETRIES: u32 = 1_000;

/// How far the weight sum may drift from 100 before the table is considered
/// suspicious at construction time.
const WEIGHT_SUM_TOLERANCE: u32 = 20;

/// One weighted outcome in a table.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedOutcome<T> {
    pub weight: u32,
    pub outcome: T,
}

/// A weighted discrete-event table on a 0–100 roll scale.
///
/// Weights need not sum to exactly 100: a roll beyond the configured
/// cumulative weight yields `None` (the "no outcome" sentinel) rather than
/// an error, which callers treat as "nothing happens this cycle".
#[derive(Debug, Clone)]
pub struct ProbabilityTable<T> {
    entries: Vec<WeightedOutcome<T>>,
}

impl<T> ProbabilityTable<T> {
    /// Build a table, sanity-checking the weight sum. A misconfigured table
    /// is still usable — the gap resolves to the sentinel — but it is worth
    /// a warning because it usually means a typo in a tuning constant.
    pub fn new(entries: Vec<(u32, T)>) -> Self {
        let total: u32 = entries.iter().map(|(w, _)| *w).sum();
        if total > 100 + WEIGHT_SUM_TOLERANCE {
            tracing::warn!(total, "probability table weights sum well past 100");
        }
        Self {
            entries: entries
                .into_iter()
                .map(|(weight, outcome)| WeightedOutcome { weight, outcome })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Walk cumulative weights and return the first outcome whose cumulative
    /// bound reaches `roll`. Rolls past the configured cumulative (or a roll
    /// of 0) return the sentinel.
    pub fn pick(&self, roll: u32) -> Option<&T> {
        if roll == 0 {
            return None;
        }
        let mut cumulative = 0u32;
        for entry in &self.entries {
            cumulative += entry.weight;
            if roll <= cumulative {
                return Some(&entry.outcome);
            }
        }
        None
    }

    /// `pick` with a fresh 1–100 roll.
    pub fn pick_random(&self, rng: &mut dyn RngCore) -> Option<&T> {
        self.pick(rng.random_range(1..=100))
    }
}

impl<T: PartialEq> ProbabilityTable<T> {
    /// Rejection-sample until an outcome not listed in `unacceptable` comes
    /// up. If every entry is unacceptable the sentinel is returned
    /// immediately — no sampling loop. Retries are capped so a table whose
    /// acceptable entries carry near-zero weight cannot stall a tick.
    pub fn pick_until_acceptable(
        &self,
        rng: &mut dyn RngCore,
        unacceptable: &[T],
    ) -> Option<&T> {
        let any_acceptable = self
            .entries
            .iter()
            .any(|e| !unacceptable.contains(&e.outcome));
        if !any_acceptable {
            return None;
        }
        for _ in 0..MAX_REJECTION_RETRIES {
            match self.pick_random(rng) {
                Some(outcome) if !unacceptable.contains(outcome) => return Some(outcome),
                // Unacceptable draw or sentinel gap: roll again.
                _ => continue,
            }
        }
        tracing::warn!("rejection sampling hit the retry cap; returning no outcome");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn abc() -> ProbabilityTable<char> {
        ProbabilityTable::new(vec![(10, 'A'), (20, 'B'), (70, 'C')])
    }

    #[test]
    fn pick_walks_cumulative_bounds() {
        let table = abc();
        assert_eq!(table.pick(5), Some(&'A'));
        assert_eq!(table.pick(10), Some(&'A'));
        assert_eq!(table.pick(30), Some(&'B'));
        assert_eq!(table.pick(99), Some(&'C'));
    }

    #[test]
    fn roll_past_configured_weights_is_sentinel() {
        let table = ProbabilityTable::new(vec![(10, 'A'), (20, 'B')]);
        assert_eq!(table.pick(31), None);
        assert_eq!(table.pick(100), None);
        assert_eq!(table.pick(0), None);
    }

    #[test]
    fn rejection_sampling_filters_unacceptable() {
        let table = abc();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(
                table.pick_until_acceptable(&mut rng, &['B', 'C']),
                Some(&'A')
            );
        }
    }

    #[test]
    fn all_unacceptable_returns_sentinel_without_looping() {
        let table = abc();
        let mut rng = SmallRng::seed_from_u64(7);
        // Must return immediately; the retry cap bounds even the degenerate
        // path, so this cannot hang.
        assert_eq!(table.pick_until_acceptable(&mut rng, &['A', 'B', 'C']), None);
    }

    #[test]
    fn empty_table_always_sentinel() {
        let table: ProbabilityTable<char> = ProbabilityTable::new(vec![]);
        let mut rng = SmallRng::seed_from_u64(7);
        assert_eq!(table.pick(50), None);
        assert_eq!(table.pick_until_acceptable(&mut rng, &[]), None);
    }
}
