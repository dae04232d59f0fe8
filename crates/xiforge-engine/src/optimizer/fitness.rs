// Multi-objective lineup fitness.

use std::collections::BTreeMap;

use serde::Serialize;
use xiforge_core::config::FitnessWeights;
use xiforge_core::{Role, RiskProfile, RosterConstraints, SQUAD_SIZE};

use crate::scoring::ScoredPlayer;

/// Per-component scores, each in [0, 1], and their weighted total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FitnessBreakdown {
    pub points: f64,
    pub risk: f64,
    pub diversity: f64,
    pub confidence: f64,
    pub budget: f64,
    pub total: f64,
}

/// How well a lineup's mean volatility suits the risk profile.
pub fn risk_alignment(profile: RiskProfile, mean_volatility: f64) -> f64 {
    let r = mean_volatility.clamp(0.0, 1.0);
    match profile {
        RiskProfile::Conservative => 1.0 - r,
        RiskProfile::Aggressive => r,
        RiskProfile::Balanced => 1.0 - (r - 0.5).abs() * 2.0,
    }
}

/// Shannon entropy of a histogram divided by `ln(categories)`.
fn normalized_entropy(counts: impl IntoIterator<Item = usize>, categories: usize) -> f64 {
    let counts: Vec<usize> = counts.into_iter().filter(|&c| c > 0).collect();
    let n: usize = counts.iter().sum();
    if n == 0 || categories < 2 {
        return 0.0;
    }
    let h: f64 = counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n as f64;
            -p * p.ln()
        })
        .sum();
    (h / (categories as f64).ln()).clamp(0.0, 1.0)
}

/// Scores lineups drawn from one pool under one risk profile.
#[derive(Debug, Clone)]
pub struct FitnessModel {
    weights: FitnessWeights,
    profile: RiskProfile,
    /// Best predicted points in the pool; normalizes the points component.
    max_points: f64,
    team_total: usize,
    /// Half the pool's credit range, squared: the largest cost variance a
    /// lineup can reach.
    max_cost_variance: f64,
    salary_cap: f64,
}

impl FitnessModel {
    pub fn new(
        weights: &FitnessWeights,
        profile: RiskProfile,
        pool: &[ScoredPlayer],
        constraints: &RosterConstraints,
    ) -> Self {
        let max_points = pool.iter().map(|p| p.predicted_points).fold(0.0, f64::max);
        let lo = pool.iter().map(|p| p.player.credits).fold(f64::INFINITY, f64::min);
        let hi = pool.iter().map(|p| p.player.credits).fold(f64::NEG_INFINITY, f64::max);
        let half_range = if hi > lo { (hi - lo) / 2.0 } else { 0.0 };
        let mut teams: Vec<&str> = pool.iter().map(|p| p.player.team.as_str()).collect();
        teams.sort_unstable();
        teams.dedup();

        FitnessModel {
            weights: weights.clone(),
            profile,
            max_points: if max_points > 0.0 { max_points } else { 1.0 },
            team_total: teams.len(),
            max_cost_variance: half_range * half_range,
            salary_cap: constraints.salary_cap,
        }
    }

    pub fn evaluate(&self, lineup: &[&ScoredPlayer]) -> FitnessBreakdown {
        if lineup.is_empty() {
            return FitnessBreakdown::default();
        }
        let n = lineup.len() as f64;

        let total_points: f64 = lineup.iter().map(|p| p.predicted_points).sum();
        let points = (total_points / (SQUAD_SIZE as f64 * self.max_points)).clamp(0.0, 1.0);

        let mean_volatility = lineup.iter().map(|p| p.volatility).sum::<f64>() / n;
        let risk = risk_alignment(self.profile, mean_volatility);

        let diversity = self.diversity(lineup);

        let confidence = (lineup.iter().map(|p| p.confidence).sum::<f64>() / n).clamp(0.0, 1.0);

        let spent: f64 = lineup.iter().map(|p| p.player.credits).sum();
        let budget = if self.salary_cap > 0.0 {
            (spent / self.salary_cap).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let w = &self.weights;
        let total = w.points * points
            + w.risk * risk
            + w.diversity * diversity
            + w.confidence * confidence
            + w.budget * budget;

        FitnessBreakdown {
            points,
            risk,
            diversity,
            confidence,
            budget,
            total,
        }
    }

    /// Mean of role entropy, team entropy, and normalized cost variance.
    fn diversity(&self, lineup: &[&ScoredPlayer]) -> f64 {
        let mut roles = [0usize; 4];
        let mut teams: BTreeMap<&str, usize> = BTreeMap::new();
        for p in lineup {
            roles[p.player.role.index()] += 1;
            *teams.entry(p.player.team.as_str()).or_insert(0) += 1;
        }
        let role_entropy = normalized_entropy(roles, Role::ALL.len());
        let team_entropy = normalized_entropy(teams.into_values(), self.team_total.max(2));

        let n = lineup.len() as f64;
        let mean_cost = lineup.iter().map(|p| p.player.credits).sum::<f64>() / n;
        let variance = lineup
            .iter()
            .map(|p| (p.player.credits - mean_cost).powi(2))
            .sum::<f64>()
            / n;
        let cost_spread = if self.max_cost_variance > 0.0 {
            (variance / self.max_cost_variance).clamp(0.0, 1.0)
        } else {
            0.0
        };

        (role_entropy + team_entropy + cost_spread) / 3.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{pool_with_shape, scored};
    use xiforge_core::RoleCounts;

    #[test]
    fn risk_alignment_per_profile() {
        assert!((risk_alignment(RiskProfile::Conservative, 0.2) - 0.8).abs() < 1e-12);
        assert!((risk_alignment(RiskProfile::Aggressive, 0.2) - 0.2).abs() < 1e-12);
        assert!((risk_alignment(RiskProfile::Balanced, 0.5) - 1.0).abs() < 1e-12);
        assert!(risk_alignment(RiskProfile::Balanced, 0.0).abs() < 1e-12);
    }

    #[test]
    fn entropy_bounds() {
        assert!((normalized_entropy([1, 1, 1, 1], 4) - 1.0).abs() < 1e-12);
        assert!(normalized_entropy([11, 0, 0, 0], 4).abs() < 1e-12);
        assert_eq!(normalized_entropy([], 4), 0.0);
    }

    #[test]
    fn components_are_unit_scaled() {
        let pool = scored(&pool_with_shape(RoleCounts::new(2, 6, 4, 6), 8.0));
        let model = FitnessModel::new(
            &FitnessWeights::default(),
            RiskProfile::Balanced,
            &pool,
            &RosterConstraints::default(),
        );
        let lineup: Vec<&ScoredPlayer> = pool.iter().take(11).collect();
        let f = model.evaluate(&lineup);
        for v in [f.points, f.risk, f.diversity, f.confidence, f.budget] {
            assert!((0.0..=1.0).contains(&v));
        }
        assert!((f.budget - 0.88).abs() < 1e-9);
        let w = FitnessWeights::default();
        let expected = w.points * f.points
            + w.risk * f.risk
            + w.diversity * f.diversity
            + w.confidence * f.confidence
            + w.budget * f.budget;
        assert!((f.total - expected).abs() < 1e-12);
    }

    #[test]
    fn higher_points_raise_fitness() {
        let pool = scored(&pool_with_shape(RoleCounts::new(2, 6, 4, 6), 8.0));
        let model = FitnessModel::new(
            &FitnessWeights::default(),
            RiskProfile::Balanced,
            &pool,
            &RosterConstraints::default(),
        );
        let base: Vec<&ScoredPlayer> = pool.iter().take(11).collect();
        let boosted_players: Vec<ScoredPlayer> = base.iter().map(|p| p.with_points_bias(1.2)).collect();
        let boosted: Vec<&ScoredPlayer> = boosted_players.iter().collect();
        assert!(model.evaluate(&boosted).points >= model.evaluate(&base).points);
    }
}
