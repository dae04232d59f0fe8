// Batch lineup generation.
//
// Runs the optimizer once per requested lineup. Runs share only read-only
// inputs, so they may execute on the rayon pool; every run owns its RNG,
// seeded from the batch seed and the run index, and results come back in
// run order either way. A failed run is filled by a minimal fallback lineup
// instead of failing the batch.

pub mod presets;
pub mod stats;
pub mod strategy;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};
use xiforge_core::config::BatchConfig;
use xiforge_core::{OptimizationRequest, RiskProfile, RosterConstraints};

use crate::error::{EngineError, Result};
use crate::fallback::{build_fallback, build_fallback_with_forced};
use crate::lineup::{Lineup, LineupOrigin};
use crate::optimizer::Optimizer;
use crate::scoring::ScoredPlayer;

pub use presets::{find_preset, preset_names, PresetTemplate, PRESETS};
pub use stats::BatchStats;
pub use strategy::{ExposurePlan, GenerationStrategy, RunPlan};

/// Golden-ratio increment separating per-run seeds.
const RUN_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub lineups: Vec<Lineup>,
    pub stats: BatchStats,
}

pub fn run_seed(batch_seed: u64, run: usize) -> u64 {
    batch_seed.wrapping_add((run as u64).wrapping_mul(RUN_SEED_STRIDE))
}

/// Copy of `pool` with seeded multiplicative noise on predicted points, so
/// independent runs explore different optima. Order is preserved, and run 0
/// gets an exact copy. Only the search sees the noise; lineups are assembled
/// from the unperturbed pool.
fn perturb(pool: &[ScoredPlayer], amplitude: f64, run: usize, rng: &mut impl Rng) -> Vec<ScoredPlayer> {
    if run == 0 || amplitude <= 0.0 {
        return pool.to_vec();
    }
    pool.iter()
        .map(|sp| sp.with_points_bias(1.0 + rng.gen_range(-amplitude..=amplitude)))
        .collect()
}

fn check_request(request: &OptimizationRequest, config: &BatchConfig) -> Result<()> {
    if request.lineup_count == 0 {
        return Err(EngineError::InvalidRequest("lineup_count must be at least 1".into()));
    }
    if request.lineup_count > config.max_lineups {
        return Err(EngineError::InvalidRequest(format!(
            "lineup_count {} exceeds the limit of {}",
            request.lineup_count, config.max_lineups
        )));
    }
    Ok(())
}

/// Everything one run needs, shared read-only across runs.
struct BatchContext<'a> {
    optimizer: &'a Optimizer,
    strategy: &'a GenerationStrategy,
    scored: &'a [ScoredPlayer],
    constraints: &'a RosterConstraints,
    risk: RiskProfile,
    seed: u64,
    total: usize,
    perturbation: f64,
    /// Fallback members over `scored`, used when a run's own fallback fails.
    last_resort: &'a [usize],
    last_resort_lineup: &'a Lineup,
}

impl BatchContext<'_> {
    fn run(&self, run: usize) -> Lineup {
        let mut rng = ChaCha8Rng::seed_from_u64(run_seed(self.seed, run));
        let plan = self
            .strategy
            .select_candidate_pool(run, self.total, self.scored, self.constraints);
        let search_pool = perturb(&plan.search_pool(), self.perturbation, run, &mut rng);

        let lineup = match self.optimized(&plan, &search_pool, run, &mut rng) {
            Ok(lineup) => lineup,
            Err(e) => {
                warn!("run {}: {}; using a minimal fallback lineup", run, e);
                let mut lineup = self.fallback(&plan, run);
                lineup.annotate(&format!("optimization failed: {e}"));
                lineup
            }
        };
        debug!(
            "run {} finished: {} lineup, {:.1} expected points",
            run, lineup.origin, lineup.expected_points
        );
        self.strategy.post_process(&plan, lineup)
    }

    fn optimized(
        &self,
        plan: &RunPlan,
        search_pool: &[ScoredPlayer],
        run: usize,
        rng: &mut impl Rng,
    ) -> Result<Lineup> {
        let outcome =
            self.optimizer
                .optimize_with_forced(search_pool, &plan.forced, &plan.constraints, self.risk, rng)?;
        let selected: Vec<&ScoredPlayer> = outcome.members.iter().map(|&i| &plan.pool[i]).collect();
        Lineup::assemble(
            &selected,
            run as u64,
            self.risk,
            LineupOrigin::Optimized,
            Some(outcome.fitness.total),
            plan.constraints.salary_cap,
        )
    }

    fn fallback(&self, plan: &RunPlan, run: usize) -> Lineup {
        let from_plan = build_fallback_with_forced(&plan.pool, &plan.forced, &plan.constraints).and_then(|members| {
            let selected: Vec<&ScoredPlayer> = members.iter().map(|&i| &plan.pool[i]).collect();
            Lineup::assemble(
                &selected,
                run as u64,
                self.risk,
                LineupOrigin::Fallback,
                None,
                plan.constraints.salary_cap,
            )
        });
        match from_plan {
            Ok(lineup) => lineup,
            Err(e) => {
                warn!("run {}: fallback on the run pool failed ({}); using the unfiltered fallback", run, e);
                let selected: Vec<&ScoredPlayer> = self.last_resort.iter().map(|&i| &self.scored[i]).collect();
                Lineup::assemble(
                    &selected,
                    run as u64,
                    self.risk,
                    LineupOrigin::Fallback,
                    None,
                    self.constraints.salary_cap,
                )
                .unwrap_or_else(|_| self.last_resort_lineup.clone())
            }
        }
    }
}

/// Generate `request.lineup_count` lineups from an already scored candidate
/// pool. Fails only for malformed requests or when the pool cannot support
/// even a minimal fallback lineup.
pub fn generate_batch(
    optimizer: &Optimizer,
    config: &BatchConfig,
    scored: &[ScoredPlayer],
    constraints: &RosterConstraints,
    request: &OptimizationRequest,
) -> Result<BatchOutcome> {
    check_request(request, config)?;
    let strategy = GenerationStrategy::resolve(&request.mode, scored)?;

    let members = build_fallback(scored, constraints)?;
    let selected: Vec<&ScoredPlayer> = members.iter().map(|&i| &scored[i]).collect();
    let last_resort = Lineup::assemble(
        &selected,
        0,
        request.risk,
        LineupOrigin::Fallback,
        None,
        constraints.salary_cap,
    )?;

    let seed = request.seed.unwrap_or(config.default_seed);
    let total = request.lineup_count;
    info!(
        "generating {} {} lineups from {} players ({}, seed {})",
        total,
        request.risk,
        scored.len(),
        strategy.label(),
        seed
    );

    let ctx = BatchContext {
        optimizer,
        strategy: &strategy,
        scored,
        constraints,
        risk: request.risk,
        seed,
        total,
        perturbation: config.perturbation,
        last_resort: &members,
        last_resort_lineup: &last_resort,
    };
    let lineups: Vec<Lineup> = if config.parallel {
        (0..total).into_par_iter().map(|run| ctx.run(run)).collect()
    } else {
        (0..total).map(|run| ctx.run(run)).collect()
    };

    let stats = BatchStats::compute(&lineups, scored.len());
    info!(
        "batch done: {} lineups, {} captains, {:.2} mean overlap, {} fallback",
        stats.lineup_count, stats.captain_variety, stats.mean_pairwise_overlap, stats.fallback_count
    );
    Ok(BatchOutcome { lineups, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leadership::LeadershipStrategy;
    use crate::test_support::{pool_with_shape, scored};
    use crate::validator::is_valid;
    use xiforge_core::config::EngineConfig;
    use xiforge_core::{GenerationMode, RoleCounts};

    fn quick() -> (Optimizer, BatchConfig) {
        let mut config = EngineConfig::default();
        config.optimizer.population_size = 12;
        config.optimizer.generations = 6;
        (Optimizer::new(&config), config.batch)
    }

    #[test]
    fn run_seeds_differ() {
        assert_ne!(run_seed(11, 0), run_seed(11, 1));
        assert_eq!(run_seed(11, 0), 11);
    }

    #[test]
    fn zero_count_is_rejected() {
        let (optimizer, batch) = quick();
        let pool = scored(&pool_with_shape(RoleCounts::new(3, 7, 5, 7), 8.0));
        let request = OptimizationRequest::new(RiskProfile::Balanced, 0);
        let err = generate_batch(&optimizer, &batch, &pool, &RosterConstraints::default(), &request).unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest(_)));
    }

    #[test]
    fn oversized_count_is_rejected() {
        let (optimizer, batch) = quick();
        let pool = scored(&pool_with_shape(RoleCounts::new(3, 7, 5, 7), 8.0));
        let request = OptimizationRequest::new(RiskProfile::Balanced, batch.max_lineups + 1);
        assert!(generate_batch(&optimizer, &batch, &pool, &RosterConstraints::default(), &request).is_err());
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let (optimizer, mut batch) = quick();
        let pool = scored(&pool_with_shape(RoleCounts::new(3, 7, 5, 7), 8.5));
        let constraints = RosterConstraints::default();
        let request = OptimizationRequest::new(RiskProfile::Aggressive, 5).with_seed(99);
        batch.parallel = true;
        let par = generate_batch(&optimizer, &batch, &pool, &constraints, &request).unwrap();
        batch.parallel = false;
        let seq = generate_batch(&optimizer, &batch, &pool, &constraints, &request).unwrap();
        assert_eq!(par, seq);
    }

    #[test]
    fn every_lineup_is_legal() {
        let (optimizer, batch) = quick();
        let pool = scored(&pool_with_shape(RoleCounts::new(3, 7, 5, 7), 8.5));
        let constraints = RosterConstraints::default();
        let request = OptimizationRequest::new(RiskProfile::Conservative, 6)
            .with_mode(GenerationMode::PresetTemplate { template: "all-rounder-heavy".into() });
        let outcome = generate_batch(&optimizer, &batch, &pool, &constraints, &request).unwrap();
        assert_eq!(outcome.lineups.len(), 6);
        for lineup in &outcome.lineups {
            assert!(is_valid(&lineup.players, &constraints), "{}", lineup.rationale);
            assert_eq!(lineup.role_counts, RoleCounts::new(1, 3, 4, 3));
        }
    }

    #[test]
    fn last_resort_leaders_follow_the_run() {
        let (optimizer, batch) = quick();
        let pool = scored(&pool_with_shape(RoleCounts::new(3, 7, 5, 7), 8.0));
        let constraints = RosterConstraints::default();
        let members = build_fallback(&pool, &constraints).unwrap();
        let selected: Vec<&ScoredPlayer> = members.iter().map(|&i| &pool[i]).collect();
        let base = Lineup::assemble(&selected, 0, RiskProfile::Balanced, LineupOrigin::Fallback, None, 100.0).unwrap();
        let strategy = GenerationStrategy::Plain;
        let ctx = BatchContext {
            optimizer: &optimizer,
            strategy: &strategy,
            scored: &pool,
            constraints: &constraints,
            risk: RiskProfile::Balanced,
            seed: 1,
            total: 2,
            perturbation: batch.perturbation,
            last_resort: &members,
            last_resort_lineup: &base,
        };
        let empty = RunPlan {
            pool: Vec::new(),
            constraints: constraints.clone(),
            forced: Vec::new(),
            origin: LineupOrigin::Optimized,
            notes: Vec::new(),
            bias: None,
        };

        let first = ctx.fallback(&empty, 0);
        let second = ctx.fallback(&empty, 1);
        assert_eq!(first.player_ids(), second.player_ids());
        assert_eq!(first.leadership, LeadershipStrategy::TopTwo);
        assert_eq!(second.leadership, LeadershipStrategy::SecondThird);
        assert_ne!(first.captain, second.captain);
    }

    #[test]
    fn lineups_report_unperturbed_points() {
        let (optimizer, batch) = quick();
        let pool = scored(&pool_with_shape(RoleCounts::new(3, 7, 5, 7), 8.5));
        let request = OptimizationRequest::new(RiskProfile::Balanced, 4).with_seed(3);
        let outcome = generate_batch(&optimizer, &batch, &pool, &RosterConstraints::default(), &request).unwrap();
        for lineup in &outcome.lineups {
            for p in &lineup.players {
                let original = pool.iter().find(|sp| sp.player.id == p.id).unwrap();
                assert_eq!(p.predicted_points, original.predicted_points, "{}", p.id);
            }
        }
    }

    #[test]
    fn perturbation_leaves_first_run_alone() {
        let pool = scored(&pool_with_shape(RoleCounts::new(1, 4, 2, 4), 8.0));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(perturb(&pool, 0.2, 0, &mut rng), pool);
        let noisy = perturb(&pool, 0.2, 1, &mut rng);
        for (a, b) in noisy.iter().zip(&pool) {
            assert_eq!(a.player.id, b.player.id);
            assert!(a.predicted_points <= b.predicted_points * 1.2 + 1e-9);
            assert!(a.predicted_points >= b.predicted_points * 0.8 - 1e-9);
        }
    }
}
