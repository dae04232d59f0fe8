// Finished lineups handed to callers.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use xiforge_core::{RiskProfile, Role, RoleCounts, RosterEntry};

use crate::error::{EngineError, Result};
use crate::leadership::{select_leaders, LeadershipStrategy};
use crate::scoring::ScoredPlayer;

pub const CAPTAIN_MULTIPLIER: f64 = 2.0;
pub const VICE_CAPTAIN_MULTIPLIER: f64 = 1.5;

/// How a lineup was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineupOrigin {
    /// Genetic search over the requested pool.
    Optimized,
    /// Genetic search after the requested filters were relaxed.
    Relaxed,
    /// Built directly from role minimums without search.
    Fallback,
}

impl LineupOrigin {
    pub fn label(&self) -> &'static str {
        match self {
            LineupOrigin::Optimized => "optimized",
            LineupOrigin::Relaxed => "relaxed",
            LineupOrigin::Fallback => "fallback",
        }
    }
}

impl fmt::Display for LineupOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Snapshot of one selected player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineupPlayer {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub team: String,
    pub credits: f64,
    pub predicted_points: f64,
    pub confidence: f64,
    pub volatility: f64,
}

impl From<&ScoredPlayer> for LineupPlayer {
    fn from(sp: &ScoredPlayer) -> Self {
        LineupPlayer {
            id: sp.player.id.clone(),
            name: sp.player.name.clone(),
            role: sp.player.role,
            team: sp.player.team.clone(),
            credits: sp.player.credits,
            predicted_points: sp.predicted_points,
            confidence: sp.confidence,
            volatility: sp.volatility,
        }
    }
}

impl RosterEntry for LineupPlayer {
    fn id(&self) -> &str {
        &self.id
    }
    fn role(&self) -> Role {
        self.role
    }
    fn team(&self) -> &str {
        &self.team
    }
    fn credits(&self) -> f64 {
        self.credits
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lineup {
    /// Ordered by role, then predicted points descending.
    pub players: Vec<LineupPlayer>,
    pub captain: String,
    pub vice_captain: String,
    pub total_credits: f64,
    pub role_counts: RoleCounts,
    /// Sum of predicted points with captain and vice-captain multipliers.
    pub expected_points: f64,
    /// Mean volatility.
    pub risk_score: f64,
    /// Mean confidence.
    pub confidence_score: f64,
    /// Search fitness; `None` for lineups built without search.
    pub fitness: Option<f64>,
    pub leadership: LeadershipStrategy,
    pub origin: LineupOrigin,
    pub rationale: String,
}

impl Lineup {
    /// Assemble a lineup from selected players, choosing leaders with the
    /// given variation seed.
    pub fn assemble(
        selected: &[&ScoredPlayer],
        variation_seed: u64,
        risk: RiskProfile,
        origin: LineupOrigin,
        fitness: Option<f64>,
        salary_cap: f64,
    ) -> Result<Lineup> {
        let leaders = select_leaders(selected, variation_seed).ok_or_else(|| {
            EngineError::InvalidRequest(format!(
                "cannot pick leaders from {} players",
                selected.len()
            ))
        })?;
        let captain = selected[leaders.captain];
        let vice = selected[leaders.vice_captain];

        let mut players: Vec<LineupPlayer> = selected.iter().map(|sp| LineupPlayer::from(*sp)).collect();
        players.sort_by(|a, b| {
            a.role
                .index()
                .cmp(&b.role.index())
                .then_with(|| b.predicted_points.total_cmp(&a.predicted_points))
                .then_with(|| a.id.cmp(&b.id))
        });

        let n = selected.len() as f64;
        let total_credits: f64 = selected.iter().map(|sp| sp.player.credits).sum();
        let base_points: f64 = selected.iter().map(|sp| sp.predicted_points).sum();
        let expected_points = base_points
            + (CAPTAIN_MULTIPLIER - 1.0) * captain.predicted_points
            + (VICE_CAPTAIN_MULTIPLIER - 1.0) * vice.predicted_points;
        let role_counts = RoleCounts::from_entries(selected);

        let mut rationale = format!(
            "{} {} lineup, shape {}, {:.1}/{:.1} credits, captain {} / vice {} ({})",
            origin,
            risk,
            role_counts,
            total_credits,
            salary_cap,
            captain.player.name,
            vice.player.name,
            leaders.strategy.label()
        );
        if let Some(f) = fitness {
            rationale.push_str(&format!(", fitness {f:.3}"));
        }

        Ok(Lineup {
            players,
            captain: captain.player.id.clone(),
            vice_captain: vice.player.id.clone(),
            total_credits,
            role_counts,
            expected_points,
            risk_score: selected.iter().map(|sp| sp.volatility).sum::<f64>() / n,
            confidence_score: selected.iter().map(|sp| sp.confidence).sum::<f64>() / n,
            fitness,
            leadership: leaders.strategy,
            origin,
            rationale,
        })
    }

    /// True for anything other than a search over the requested pool.
    pub fn is_fallback(&self) -> bool {
        self.origin != LineupOrigin::Optimized
    }

    pub fn contains(&self, id: &str) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    pub fn player_ids(&self) -> Vec<&str> {
        self.players.iter().map(|p| p.id.as_str()).collect()
    }

    pub fn player(&self, id: &str) -> Option<&LineupPlayer> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Number of players shared with another lineup.
    pub fn overlap(&self, other: &Lineup) -> usize {
        let mine: HashSet<&str> = self.player_ids().into_iter().collect();
        other.players.iter().filter(|p| mine.contains(p.id.as_str())).count()
    }

    /// Append a note to the rationale.
    pub fn annotate(&mut self, note: &str) {
        if note.is_empty() {
            return;
        }
        self.rationale.push_str("; ");
        self.rationale.push_str(note);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{pool_with_shape, scored};

    fn sample() -> (Vec<ScoredPlayer>, Lineup) {
        let pool = scored(&pool_with_shape(RoleCounts::new(1, 4, 2, 4), 8.0));
        let refs: Vec<&ScoredPlayer> = pool.iter().collect();
        let lineup = Lineup::assemble(&refs, 0, RiskProfile::Balanced, LineupOrigin::Optimized, Some(0.7), 100.0).unwrap();
        (pool, lineup)
    }

    #[test]
    fn aggregates_are_derived_from_players() {
        let (pool, lineup) = sample();
        assert_eq!(lineup.players.len(), 11);
        assert!((lineup.total_credits - 88.0).abs() < 1e-9);
        assert_eq!(lineup.role_counts, RoleCounts::new(1, 4, 2, 4));
        let captain = pool.iter().find(|p| p.player.id == lineup.captain).unwrap();
        let vice = pool.iter().find(|p| p.player.id == lineup.vice_captain).unwrap();
        let base: f64 = pool.iter().map(|p| p.predicted_points).sum();
        let expected = base + captain.predicted_points + 0.5 * vice.predicted_points;
        assert!((lineup.expected_points - expected).abs() < 1e-9);
        assert!(lineup.rationale.contains("shape 1-4-2-4"));
        assert!(lineup.rationale.contains("fitness 0.700"));
    }

    #[test]
    fn players_are_ordered_by_role() {
        let (_, lineup) = sample();
        let roles: Vec<usize> = lineup.players.iter().map(|p| p.role.index()).collect();
        let mut sorted = roles.clone();
        sorted.sort();
        assert_eq!(roles, sorted);
    }

    #[test]
    fn origin_flags() {
        let (_, mut lineup) = sample();
        assert!(!lineup.is_fallback());
        lineup.origin = LineupOrigin::Relaxed;
        assert!(lineup.is_fallback());
        lineup.origin = LineupOrigin::Fallback;
        assert!(lineup.is_fallback());
    }

    #[test]
    fn overlap_and_annotation() {
        let (_, mut lineup) = sample();
        let other = lineup.clone();
        assert_eq!(lineup.overlap(&other), 11);
        lineup.annotate("hedge run");
        assert!(lineup.rationale.ends_with("; hedge run"));
        assert!(lineup.contains(&lineup.captain.clone()));
    }

    #[test]
    fn too_few_players_is_an_error() {
        let pool = scored(&pool_with_shape(RoleCounts::new(1, 0, 0, 0), 8.0));
        let refs: Vec<&ScoredPlayer> = pool.iter().collect();
        assert!(Lineup::assemble(&refs, 0, RiskProfile::Balanced, LineupOrigin::Fallback, None, 100.0).is_err());
    }
}
