// Captain and vice-captain selection.
//
// Candidates are ranked by a blend of captaincy aptitude and predicted
// points, then one of six fixed strategies picks the pair. The strategy is
// keyed by `variation_seed % 6`, so consecutive runs in a batch rotate
// through visibly different pairs.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::scoring::ScoredPlayer;

/// How many top-ranked candidates the seeded strategy draws from.
const SEEDED_POOL: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadershipStrategy {
    TopTwo,
    SecondThird,
    ThirdFirst,
    /// Highest upset potential as captain.
    Differential,
    /// Seeded draw among the top eight.
    SeededTopEight,
    /// Best points per credit as captain.
    Value,
}

impl LeadershipStrategy {
    pub const ALL: [LeadershipStrategy; 6] = [
        LeadershipStrategy::TopTwo,
        LeadershipStrategy::SecondThird,
        LeadershipStrategy::ThirdFirst,
        LeadershipStrategy::Differential,
        LeadershipStrategy::SeededTopEight,
        LeadershipStrategy::Value,
    ];

    pub fn for_variation(variation_seed: u64) -> Self {
        Self::ALL[(variation_seed % Self::ALL.len() as u64) as usize]
    }

    pub fn label(&self) -> &'static str {
        match self {
            LeadershipStrategy::TopTwo => "top-two",
            LeadershipStrategy::SecondThird => "second/third",
            LeadershipStrategy::ThirdFirst => "third/first",
            LeadershipStrategy::Differential => "differential",
            LeadershipStrategy::SeededTopEight => "seeded top-8",
            LeadershipStrategy::Value => "value",
        }
    }
}

/// Chosen pair, as positions in the lineup slice passed to `select_leaders`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leaders {
    pub captain: usize,
    pub vice_captain: usize,
    pub strategy: LeadershipStrategy,
}

pub fn leadership_score(player: &ScoredPlayer) -> f64 {
    0.6 * player.attributes.captaincy_aptitude + 0.4 * player.predicted_points / 100.0
}

/// Leadership candidates in rank order. Bowlers only join when fewer than
/// two other players are available.
fn ranked_candidates(lineup: &[&ScoredPlayer]) -> Vec<usize> {
    let preferred: Vec<usize> = (0..lineup.len())
        .filter(|&i| lineup[i].player.role.is_leadership_preferred())
        .collect();
    let mut ranked = if preferred.len() >= 2 {
        preferred
    } else {
        (0..lineup.len()).collect()
    };
    ranked.sort_by(|&a, &b| {
        leadership_score(lineup[b])
            .total_cmp(&leadership_score(lineup[a]))
            .then_with(|| lineup[a].player.id.cmp(&lineup[b].player.id))
    });
    ranked
}

/// Candidate with the highest `key`, earliest rank winning ties.
fn best_by(ranked: &[usize], lineup: &[&ScoredPlayer], key: impl Fn(&ScoredPlayer) -> f64) -> usize {
    let mut best = ranked[0];
    for &i in &ranked[1..] {
        if key(lineup[i]) > key(lineup[best]) {
            best = i;
        }
    }
    best
}

/// Pick captain and vice-captain. Returns `None` for lineups with fewer
/// than two players.
pub fn select_leaders(lineup: &[&ScoredPlayer], variation_seed: u64) -> Option<Leaders> {
    if lineup.len() < 2 {
        return None;
    }
    let ranked = ranked_candidates(lineup);
    let n = ranked.len();
    let strategy = LeadershipStrategy::for_variation(variation_seed);

    let (captain, vice) = match strategy {
        LeadershipStrategy::TopTwo => (ranked[0], ranked[1]),
        LeadershipStrategy::SecondThird => (ranked[1], ranked[2 % n]),
        LeadershipStrategy::ThirdFirst => (ranked[2 % n], ranked[0]),
        LeadershipStrategy::Differential => {
            (best_by(&ranked, lineup, |p| p.attributes.upset_potential), ranked[0])
        }
        LeadershipStrategy::SeededTopEight => {
            let mut rng = ChaCha8Rng::seed_from_u64(variation_seed);
            let top = &ranked[..n.min(SEEDED_POOL)];
            let mut picks = top.choose_multiple(&mut rng, 2).copied();
            let captain = picks.next().unwrap_or(ranked[0]);
            (captain, picks.next().unwrap_or(ranked[1]))
        }
        LeadershipStrategy::Value => {
            (best_by(&ranked, lineup, |p| p.attributes.price_efficiency), ranked[0])
        }
    };

    let vice_captain = if vice != captain {
        vice
    } else {
        ranked.iter().copied().find(|&i| i != captain).unwrap_or(vice)
    };

    Some(Leaders {
        captain,
        vice_captain,
        strategy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{pool_with_shape, scored};
    use std::collections::HashSet;
    use xiforge_core::{Role, RoleCounts};

    fn lineup_pool() -> Vec<ScoredPlayer> {
        scored(&pool_with_shape(RoleCounts::new(1, 4, 2, 4), 8.0))
    }

    #[test]
    fn strategy_cycles_with_seed() {
        assert_eq!(LeadershipStrategy::for_variation(0), LeadershipStrategy::TopTwo);
        assert_eq!(LeadershipStrategy::for_variation(4), LeadershipStrategy::SeededTopEight);
        assert_eq!(LeadershipStrategy::for_variation(6), LeadershipStrategy::TopTwo);
    }

    #[test]
    fn captain_and_vice_are_distinct_for_every_strategy() {
        let pool = lineup_pool();
        let lineup: Vec<&ScoredPlayer> = pool.iter().collect();
        for seed in 0..24 {
            let leaders = select_leaders(&lineup, seed).unwrap();
            assert_ne!(leaders.captain, leaders.vice_captain);
            assert!(leaders.captain < lineup.len() && leaders.vice_captain < lineup.len());
        }
    }

    #[test]
    fn bowlers_are_skipped_when_others_exist() {
        let pool = lineup_pool();
        let lineup: Vec<&ScoredPlayer> = pool.iter().collect();
        for seed in [0, 1, 2] {
            let leaders = select_leaders(&lineup, seed).unwrap();
            assert_ne!(lineup[leaders.captain].player.role, Role::Bowler);
            assert_ne!(lineup[leaders.vice_captain].player.role, Role::Bowler);
        }
    }

    #[test]
    fn bowlers_considered_when_needed() {
        let pool = scored(&pool_with_shape(RoleCounts::new(1, 0, 0, 10), 8.0));
        let lineup: Vec<&ScoredPlayer> = pool.iter().collect();
        let leaders = select_leaders(&lineup, 0).unwrap();
        assert_ne!(leaders.captain, leaders.vice_captain);
    }

    #[test]
    fn rotation_produces_varied_pairs() {
        let pool = lineup_pool();
        let lineup: Vec<&ScoredPlayer> = pool.iter().collect();
        let pairs: HashSet<(usize, usize)> = (0..6)
            .map(|s| {
                let l = select_leaders(&lineup, s).unwrap();
                (l.captain, l.vice_captain)
            })
            .collect();
        assert!(pairs.len() >= 3);
        let captains: HashSet<usize> = (0..6).map(|s| select_leaders(&lineup, s).unwrap().captain).collect();
        assert!(captains.len() >= 2);
    }

    #[test]
    fn two_player_lineup_wraps_ranks() {
        let pool = lineup_pool();
        let lineup: Vec<&ScoredPlayer> = pool.iter().take(2).collect();
        for seed in 0..6 {
            let l = select_leaders(&lineup, seed).unwrap();
            assert_ne!(l.captain, l.vice_captain);
        }
        assert!(select_leaders(&lineup[..1], 0).is_none());
    }
}
