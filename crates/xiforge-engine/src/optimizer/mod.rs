// Genetic lineup search.
//
// One call runs a full search over a scored pool: risk filtering (fail-open),
// population seeding, elitist generations with tournament selection,
// crossover and mutation, and returns the fittest legal individual.

pub mod fitness;
pub(crate) mod operators;
pub(crate) mod population;

use rand::Rng;
use tracing::{debug, warn};
use xiforge_core::config::{EngineConfig, FitnessWeights, OptimizerConfig, RiskBand, RiskThresholds};
use xiforge_core::{RiskProfile, RosterConstraints, SQUAD_SIZE};

use crate::error::{EngineError, Result};
use crate::scoring::ScoredPlayer;
use crate::validator::{can_fill_roles, role_shortfalls};

pub use fitness::{FitnessBreakdown, FitnessModel};
use operators::{crossover, mutate, tournament};
use population::{init_population, SearchSpace};

/// Result of one search, expressed as indices into the searched pool.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Sorted pool indices of the winning lineup.
    pub members: Vec<usize>,
    pub fitness: FitnessBreakdown,
    /// Whether the risk filter narrowed the pool for this search.
    pub risk_filtered: bool,
    /// Offspring discarded by the validator across all generations.
    pub rejected_offspring: usize,
}

/// Constructible search service holding immutable tunables.
#[derive(Debug, Clone)]
pub struct Optimizer {
    config: OptimizerConfig,
    weights: FitnessWeights,
    thresholds: RiskThresholds,
}

impl Optimizer {
    pub fn new(config: &EngineConfig) -> Self {
        Optimizer {
            config: config.optimizer.clone(),
            weights: config.fitness.clone(),
            thresholds: config.risk.clone(),
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn optimize(
        &self,
        pool: &[ScoredPlayer],
        constraints: &RosterConstraints,
        risk: RiskProfile,
        rng: &mut impl Rng,
    ) -> Result<SearchOutcome> {
        self.optimize_with_forced(pool, &[], constraints, risk, rng)
    }

    /// Search with the given pool indices placed in every individual. Forced
    /// players bypass the risk filter and are never mutated out; callers are
    /// expected to pass a set that fits in one lineup.
    pub fn optimize_with_forced(
        &self,
        pool: &[ScoredPlayer],
        forced: &[usize],
        constraints: &RosterConstraints,
        risk: RiskProfile,
        rng: &mut impl Rng,
    ) -> Result<SearchOutcome> {
        let shortfalls = role_shortfalls(pool, constraints);
        if !shortfalls.is_empty() {
            return Err(EngineError::InfeasiblePool { shortfalls });
        }
        if let Some(&bad) = forced.iter().find(|&&f| f >= pool.len()) {
            return Err(EngineError::InvalidRequest(format!(
                "forced index {bad} outside pool of {}",
                pool.len()
            )));
        }

        let everyone: Vec<usize> = (0..pool.len()).collect();
        let filtered = risk_filter(pool, self.thresholds.band(risk), forced);
        let filtered_players: Vec<&ScoredPlayer> = filtered.iter().map(|&i| &pool[i]).collect();
        let mut risk_filtered = filtered.len() < pool.len();
        if risk_filtered && !can_fill_roles(&filtered_players, constraints) {
            warn!(
                "{} risk filter keeps {} of {} players, too few to fill the roster; searching the full pool",
                risk,
                filtered.len(),
                pool.len()
            );
            risk_filtered = false;
        }

        let pop_size = self.config.population_size.max(1);
        let mut space = SearchSpace::new(
            pool,
            constraints,
            if risk_filtered { filtered } else { everyone.clone() },
            forced,
        );
        let mut population = init_population(&space, pop_size, self.config.init_attempts, rng);
        if population.is_empty() && risk_filtered {
            warn!("no legal lineup from the {} risk-filtered pool; searching the full pool", risk);
            risk_filtered = false;
            space = SearchSpace::new(pool, constraints, everyone, forced);
            population = init_population(&space, pop_size, self.config.init_attempts, rng);
        }
        if population.is_empty() {
            return Err(EngineError::Unsatisfiable {
                reason: format!(
                    "{} players cannot form a legal {}-player lineup under cap {:.1} and team limit {}",
                    pool.len(),
                    SQUAD_SIZE,
                    constraints.salary_cap,
                    constraints.max_per_team
                ),
            });
        }

        let model = FitnessModel::new(&self.weights, risk, pool, constraints);
        let (members, fitness, rejected_offspring) = self.evolve(&space, &model, population, rng);

        Ok(SearchOutcome {
            members,
            fitness,
            risk_filtered,
            rejected_offspring,
        })
    }

    fn evolve(
        &self,
        space: &SearchSpace<'_>,
        model: &FitnessModel,
        mut population: Vec<Vec<usize>>,
        rng: &mut impl Rng,
    ) -> (Vec<usize>, FitnessBreakdown, usize) {
        let size = population.len();
        let elite_count = ((size as f64 * self.config.elite_fraction).ceil() as usize).clamp(1, size);
        let attempt_budget = self.config.max_offspring_attempts.max(1) * size;
        let mut rejected_total = 0;

        for generation in 0..self.config.generations {
            let breakdowns = evaluate_all(space, model, &population);
            let scores: Vec<f64> = breakdowns.iter().map(|b| b.total).collect();
            let order = rank(&scores, &population);

            let mut next: Vec<Vec<usize>> = order[..elite_count]
                .iter()
                .map(|&i| population[i].clone())
                .collect();

            let mut attempts = 0;
            let mut rejected = 0;
            while next.len() < size && attempts < attempt_budget {
                attempts += 1;
                let a = tournament(&scores, self.config.tournament_size, rng);
                let b = tournament(&scores, self.config.tournament_size, rng);
                let Some(child) = crossover(&population[a], &population[b], space, rng) else {
                    rejected += 1;
                    continue;
                };
                let child = mutate(&child, space, self.config.mutation_rate, rng);
                if child.len() == SQUAD_SIZE && space.is_legal(&child) {
                    next.push(child);
                } else {
                    rejected += 1;
                }
            }
            while next.len() < size {
                let winner = tournament(&scores, self.config.tournament_size, rng);
                next.push(population[winner].clone());
            }

            debug!(
                "generation {}: best fitness {:.4}, {} offspring rejected",
                generation, scores[order[0]], rejected
            );
            rejected_total += rejected;
            population = next;
        }

        let breakdowns = evaluate_all(space, model, &population);
        let scores: Vec<f64> = breakdowns.iter().map(|b| b.total).collect();
        let best = rank(&scores, &population)[0];
        (population.swap_remove(best), breakdowns[best], rejected_total)
    }
}

/// Indices kept by a risk band. Forced players always pass.
pub fn risk_filter(pool: &[ScoredPlayer], band: RiskBand, forced: &[usize]) -> Vec<usize> {
    pool.iter()
        .enumerate()
        .filter(|(i, sp)| {
            forced.contains(i)
                || (sp.volatility <= band.max_volatility && sp.attributes.consistency >= band.min_consistency)
        })
        .map(|(i, _)| i)
        .collect()
}

fn evaluate_all(space: &SearchSpace<'_>, model: &FitnessModel, population: &[Vec<usize>]) -> Vec<FitnessBreakdown> {
    population
        .iter()
        .map(|ind| model.evaluate(&space.players(ind)))
        .collect()
}

/// Population indices by descending fitness; ties by lexicographically
/// smaller member list, then by position.
fn rank(scores: &[f64], population: &[Vec<usize>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .total_cmp(&scores[a])
            .then_with(|| population[a].cmp(&population[b]))
            .then_with(|| a.cmp(&b))
    });
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{pool_with_shape, scored};
    use crate::validator::is_valid;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use xiforge_core::{Role, RoleCounts};

    fn small_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.optimizer.population_size = 16;
        config.optimizer.generations = 8;
        config
    }

    #[test]
    fn returns_legal_lineup() {
        let pool = scored(&pool_with_shape(RoleCounts::new(3, 7, 5, 7), 8.5));
        let constraints = RosterConstraints::default();
        let optimizer = Optimizer::new(&small_config());
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let out = optimizer
            .optimize(&pool, &constraints, RiskProfile::Balanced, &mut rng)
            .unwrap();
        let players: Vec<&ScoredPlayer> = out.members.iter().map(|&i| &pool[i]).collect();
        assert!(is_valid(&players, &constraints));
        assert!(out.fitness.total > 0.0);
    }

    #[test]
    fn same_seed_same_result() {
        let pool = scored(&pool_with_shape(RoleCounts::new(3, 7, 5, 7), 8.5));
        let constraints = RosterConstraints::default();
        let optimizer = Optimizer::new(&small_config());
        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            optimizer
                .optimize(&pool, &constraints, RiskProfile::Aggressive, &mut rng)
                .unwrap()
        };
        assert_eq!(run(3), run(3));
    }

    #[test]
    fn missing_keeper_is_infeasible() {
        let pool = scored(&pool_with_shape(RoleCounts::new(0, 7, 5, 7), 8.0));
        let optimizer = Optimizer::new(&small_config());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = optimizer
            .optimize(&pool, &RosterConstraints::default(), RiskProfile::Balanced, &mut rng)
            .unwrap_err();
        assert_eq!(err.short_roles(), vec![Role::Keeper]);
    }

    #[test]
    fn budget_too_tight_is_unsatisfiable() {
        let pool = scored(&pool_with_shape(RoleCounts::new(2, 6, 4, 6), 10.0));
        let optimizer = Optimizer::new(&small_config());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = optimizer
            .optimize(&pool, &RosterConstraints::default(), RiskProfile::Balanced, &mut rng)
            .unwrap_err();
        assert!(matches!(err, EngineError::Unsatisfiable { .. }));
    }

    #[test]
    fn forced_players_survive_search() {
        let pool = scored(&pool_with_shape(RoleCounts::new(3, 7, 5, 7), 8.5));
        let optimizer = Optimizer::new(&small_config());
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let out = optimizer
            .optimize_with_forced(&pool, &[2, 21], &RosterConstraints::default(), RiskProfile::Conservative, &mut rng)
            .unwrap();
        assert!(out.members.contains(&2) && out.members.contains(&21));
    }

    #[test]
    fn risk_filter_keeps_forced() {
        let pool = scored(&pool_with_shape(RoleCounts::new(3, 7, 5, 7), 8.5));
        let band = RiskBand {
            max_volatility: -1.0,
            min_consistency: 2.0,
        };
        assert_eq!(risk_filter(&pool, band, &[5]), vec![5]);
    }

    #[test]
    fn rank_breaks_ties_deterministically() {
        let population = vec![vec![3, 4], vec![1, 2], vec![0, 9]];
        let order = rank(&[0.5, 0.5, 0.7], &population);
        assert_eq!(order, vec![2, 1, 0]);
    }
}
