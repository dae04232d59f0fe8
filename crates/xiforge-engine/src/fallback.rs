// Minimal fallback lineups built straight from role quotas, no search.
//
// Two deterministic greedy passes: best value first (points per credit),
// then cheapest first. Each pass fills every role minimum before the open
// slots, using the same completability checks as the optimizer.

use std::cmp::Ordering;

use xiforge_core::{Role, RosterConstraints};

use crate::error::{EngineError, Result};
use crate::optimizer::population::SearchSpace;
use crate::scoring::ScoredPlayer;
use crate::validator::role_shortfalls;

fn value(sp: &ScoredPlayer) -> f64 {
    if sp.player.credits > 0.0 {
        sp.predicted_points / sp.player.credits
    } else {
        sp.predicted_points
    }
}

fn by_value(pool: &[ScoredPlayer], a: usize, b: usize) -> Ordering {
    value(&pool[b]).total_cmp(&value(&pool[a])).then_with(|| a.cmp(&b))
}

fn by_cost(pool: &[ScoredPlayer], a: usize, b: usize) -> Ordering {
    pool[a]
        .player
        .credits
        .total_cmp(&pool[b].player.credits)
        .then_with(|| pool[b].predicted_points.total_cmp(&pool[a].predicted_points))
        .then_with(|| a.cmp(&b))
}

fn greedy_pass(space: &SearchSpace<'_>, order: &[usize]) -> Option<Vec<usize>> {
    let mut draft = space.seeded_draft();
    for role in Role::ALL {
        let min = space.constraints.quota(role).min;
        for &i in order.iter().filter(|&&i| space.pool[i].player.role == role) {
            if draft.role_count(role) >= min {
                break;
            }
            if draft.can_add(space, i) {
                draft.add(space, i);
            }
        }
    }
    for &i in order {
        if draft.is_full() {
            break;
        }
        if draft.can_add(space, i) {
            draft.add(space, i);
        }
    }
    if !draft.is_full() {
        return None;
    }
    let members = draft.into_members();
    space.is_legal(&members).then_some(members)
}

/// Build a legal lineup without optimization. Returns sorted pool indices.
pub fn build_fallback(pool: &[ScoredPlayer], constraints: &RosterConstraints) -> Result<Vec<usize>> {
    build_fallback_with_forced(pool, &[], constraints)
}

/// As [`build_fallback`], with the given pool indices placed first.
pub fn build_fallback_with_forced(
    pool: &[ScoredPlayer],
    forced: &[usize],
    constraints: &RosterConstraints,
) -> Result<Vec<usize>> {
    let shortfalls = role_shortfalls(pool, constraints);
    if !shortfalls.is_empty() {
        return Err(EngineError::InfeasiblePool { shortfalls });
    }

    let space = SearchSpace::new(pool, constraints, (0..pool.len()).collect(), forced);

    let mut order: Vec<usize> = space.candidates.clone();
    order.sort_by(|&a, &b| by_value(pool, a, b));
    if let Some(members) = greedy_pass(&space, &order) {
        return Ok(members);
    }

    order.sort_by(|&a, &b| by_cost(pool, a, b));
    greedy_pass(&space, &order).ok_or_else(|| EngineError::Unsatisfiable {
        reason: format!(
            "no fallback lineup fits cap {:.1} with team limit {}",
            constraints.salary_cap, constraints.max_per_team
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{pool_with_shape, scored};
    use crate::validator::is_valid;
    use xiforge_core::RoleCounts;

    #[test]
    fn fallback_is_legal() {
        let pool = scored(&pool_with_shape(RoleCounts::new(3, 7, 5, 7), 9.0));
        let constraints = RosterConstraints::default();
        let members = build_fallback(&pool, &constraints).unwrap();
        let players: Vec<&ScoredPlayer> = members.iter().map(|&i| &pool[i]).collect();
        assert!(is_valid(&players, &constraints));
    }

    #[test]
    fn exact_pool_is_returned_whole() {
        let pool = scored(&pool_with_shape(RoleCounts::new(1, 4, 2, 4), 8.0));
        let members = build_fallback(&pool, &RosterConstraints::default()).unwrap();
        assert_eq!(members, (0..11).collect::<Vec<_>>());
    }

    #[test]
    fn cheap_pass_rescues_tight_budget() {
        let mut players = pool_with_shape(RoleCounts::new(2, 7, 5, 7), 8.0);
        // Make the high-value players expensive enough that value-first
        // ordering cannot close the budget on its own.
        for (i, p) in players.iter_mut().enumerate() {
            if i % 3 == 0 {
                p.credits = 12.0;
                p.stats.season_points *= 3.0;
            } else {
                p.credits = 7.0;
            }
        }
        let pool = scored(&players);
        let constraints = RosterConstraints::default();
        let members = build_fallback(&pool, &constraints).unwrap();
        let refs: Vec<&ScoredPlayer> = members.iter().map(|&i| &pool[i]).collect();
        assert!(is_valid(&refs, &constraints));
    }

    #[test]
    fn missing_role_is_infeasible() {
        let pool = scored(&pool_with_shape(RoleCounts::new(0, 7, 5, 7), 8.0));
        let err = build_fallback(&pool, &RosterConstraints::default()).unwrap_err();
        assert_eq!(err.short_roles(), vec![Role::Keeper]);
    }

    #[test]
    fn forced_players_are_kept() {
        let pool = scored(&pool_with_shape(RoleCounts::new(3, 7, 5, 7), 8.0));
        let members = build_fallback_with_forced(&pool, &[1, 16], &RosterConstraints::default()).unwrap();
        assert!(members.contains(&1) && members.contains(&16));
    }
}
