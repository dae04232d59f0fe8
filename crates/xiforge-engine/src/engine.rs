// Service facade tying scoring, search, leadership, and batching together.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use xiforge_core::config::{BatchConfig, EngineConfig};
use xiforge_core::{MatchContext, OptimizationRequest, Player, RiskProfile, RosterConstraints};

use crate::batch::{generate_batch, BatchOutcome};
use crate::error::Result;
use crate::lineup::{Lineup, LineupOrigin};
use crate::optimizer::Optimizer;
use crate::scoring::{ScoredPlayer, ScoringModel};

/// Constructible engine holding immutable configuration only. Cheap to
/// share across threads; holds no per-request state.
#[derive(Debug)]
pub struct LineupEngine {
    scoring: ScoringModel,
    optimizer: Optimizer,
    batch: BatchConfig,
}

impl LineupEngine {
    pub fn new(config: &EngineConfig) -> Self {
        LineupEngine {
            scoring: ScoringModel::new(&config.scoring),
            optimizer: Optimizer::new(config),
            batch: config.batch.clone(),
        }
    }

    pub fn with_scoring_model(mut self, scoring: ScoringModel) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn scoring_model(&self) -> &ScoringModel {
        &self.scoring
    }

    pub fn optimizer(&self) -> &Optimizer {
        &self.optimizer
    }

    /// Score every given player.
    pub fn score(&self, players: &[Player], ctx: &MatchContext) -> Vec<ScoredPlayer> {
        self.scoring.score(players, ctx)
    }

    /// Score only eligible players whose ids are not excluded.
    pub fn candidate_pool(&self, players: &[Player], ctx: &MatchContext, exclude: &[String]) -> Vec<ScoredPlayer> {
        let candidates: Vec<Player> = players
            .iter()
            .filter(|p| p.eligible && !exclude.contains(&p.id))
            .cloned()
            .collect();
        if candidates.len() < players.len() {
            info!(
                "{} of {} players are eligible candidates",
                candidates.len(),
                players.len()
            );
        }
        self.scoring.score(&candidates, ctx)
    }

    /// One optimized lineup from a scored pool, leaders chosen with the
    /// top-two strategy.
    pub fn optimize(
        &self,
        pool: &[ScoredPlayer],
        constraints: &RosterConstraints,
        risk: RiskProfile,
        seed: u64,
    ) -> Result<Lineup> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let outcome = self.optimizer.optimize(pool, constraints, risk, &mut rng)?;
        let selected: Vec<&ScoredPlayer> = outcome.members.iter().map(|&i| &pool[i]).collect();
        Lineup::assemble(
            &selected,
            0,
            risk,
            LineupOrigin::Optimized,
            Some(outcome.fitness.total),
            constraints.salary_cap,
        )
    }

    /// Score the raw pool and generate a full batch.
    pub fn generate_batch(
        &self,
        players: &[Player],
        ctx: &MatchContext,
        constraints: &RosterConstraints,
        request: &OptimizationRequest,
    ) -> Result<BatchOutcome> {
        let scored = self.candidate_pool(players, ctx, &request.exclude);
        self.generate_batch_scored(&scored, constraints, request)
    }

    /// Generate a batch from an already scored candidate pool. Request
    /// exclusions are still honored.
    pub fn generate_batch_scored(
        &self,
        scored: &[ScoredPlayer],
        constraints: &RosterConstraints,
        request: &OptimizationRequest,
    ) -> Result<BatchOutcome> {
        if request.exclude.is_empty() {
            return generate_batch(&self.optimizer, &self.batch, scored, constraints, request);
        }
        let kept: Vec<ScoredPlayer> = scored
            .iter()
            .filter(|sp| !request.exclude.contains(&sp.player.id))
            .cloned()
            .collect();
        generate_batch(&self.optimizer, &self.batch, &kept, constraints, request)
    }
}
