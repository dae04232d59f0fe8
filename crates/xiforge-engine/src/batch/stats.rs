// Aggregate statistics over a batch of lineups.

use std::collections::HashSet;

use serde::Serialize;

use crate::lineup::Lineup;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchStats {
    pub lineup_count: usize,
    /// Distinct captains across the batch.
    pub captain_variety: usize,
    pub vice_captain_variety: usize,
    /// Lineups with a distinct player set.
    pub distinct_lineups: usize,
    /// Share of the candidate pool used by at least one lineup, in percent.
    pub pool_utilization_pct: f64,
    /// Mean shared players over every pair of lineups.
    pub mean_pairwise_overlap: f64,
    /// Lineups not produced by search over the requested pool.
    pub fallback_count: usize,
}

impl BatchStats {
    pub fn compute(lineups: &[Lineup], pool_size: usize) -> Self {
        let captains: HashSet<&str> = lineups.iter().map(|l| l.captain.as_str()).collect();
        let vices: HashSet<&str> = lineups.iter().map(|l| l.vice_captain.as_str()).collect();

        let mut player_sets: Vec<Vec<&str>> = lineups
            .iter()
            .map(|l| {
                let mut ids = l.player_ids();
                ids.sort_unstable();
                ids
            })
            .collect();
        let used: HashSet<&str> = player_sets.iter().flatten().copied().collect();
        player_sets.sort();
        player_sets.dedup();

        let mut pairs = 0usize;
        let mut shared = 0usize;
        for (i, a) in lineups.iter().enumerate() {
            for b in &lineups[i + 1..] {
                pairs += 1;
                shared += a.overlap(b);
            }
        }

        BatchStats {
            lineup_count: lineups.len(),
            captain_variety: captains.len(),
            vice_captain_variety: vices.len(),
            distinct_lineups: player_sets.len(),
            pool_utilization_pct: if pool_size > 0 {
                100.0 * used.len() as f64 / pool_size as f64
            } else {
                0.0
            },
            mean_pairwise_overlap: if pairs > 0 {
                shared as f64 / pairs as f64
            } else {
                0.0
            },
            fallback_count: lineups.iter().filter(|l| l.is_fallback()).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineup::LineupOrigin;
    use crate::scoring::ScoredPlayer;
    use crate::test_support::{pool_with_shape, scored};
    use xiforge_core::{RiskProfile, RoleCounts};

    fn lineup_from(pool: &[ScoredPlayer], skip: usize, seed: u64) -> Lineup {
        let refs: Vec<&ScoredPlayer> = pool.iter().skip(skip).take(11).collect();
        Lineup::assemble(&refs, seed, RiskProfile::Balanced, LineupOrigin::Optimized, None, 100.0).unwrap()
    }

    #[test]
    fn empty_batch() {
        let stats = BatchStats::compute(&[], 20);
        assert_eq!(stats, BatchStats::default());
    }

    #[test]
    fn counts_overlap_and_variety() {
        let pool = scored(&pool_with_shape(RoleCounts::new(2, 6, 4, 6), 8.0));
        let a = lineup_from(&pool, 0, 0);
        let b = lineup_from(&pool, 2, 1);
        let mut c = a.clone();
        c.origin = LineupOrigin::Fallback;
        let stats = BatchStats::compute(&[a, b, c], pool.len());
        assert_eq!(stats.lineup_count, 3);
        assert_eq!(stats.distinct_lineups, 2);
        // a-b share 9, a-c share 11, b-c share 9.
        assert!((stats.mean_pairwise_overlap - 29.0 / 3.0).abs() < 1e-9);
        assert!((stats.pool_utilization_pct - 100.0 * 13.0 / 18.0).abs() < 1e-9);
        assert_eq!(stats.fallback_count, 1);
        assert!(stats.captain_variety >= 1);
    }
}
