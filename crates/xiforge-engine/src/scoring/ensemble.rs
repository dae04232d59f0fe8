// Weighted ensemble over pluggable predictor strategies.

use serde::Serialize;
use xiforge_core::config::{EnsembleWeights, ScoringConfig};

use super::features::FeatureVector;
use super::predictors::{
    FeedForwardNet, KernelMachine, LinearModel, PredictorStrategy, ResidualBooster, RuleForest,
};

pub const MAX_PREDICTED_POINTS: f64 = 100.0;

struct Member {
    strategy: Box<dyn PredictorStrategy>,
    weight: f64,
    /// How strongly this member's weight follows player confidence:
    /// positive trusts it more for confident players, negative for uncertain ones.
    confidence_tilt: f64,
}

/// One member's contribution to a prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentEstimate {
    pub name: &'static str,
    pub points: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleOutput {
    pub points: f64,
    pub components: Vec<ComponentEstimate>,
}

/// Holds a set of predictor strategies and their combination weights.
pub struct EnsemblePredictor {
    members: Vec<Member>,
}

impl EnsemblePredictor {
    pub fn empty() -> Self {
        EnsemblePredictor { members: Vec::new() }
    }

    /// The five standard heuristic estimators with configured base weights.
    pub fn standard(config: &ScoringConfig) -> Self {
        let EnsembleWeights {
            linear,
            rule_forest,
            neural,
            boosting,
            kernel,
        } = config.ensemble;
        EnsemblePredictor::empty()
            .with_member(Box::new(LinearModel), linear, 0.4)
            .with_member(Box::new(RuleForest), rule_forest, 0.0)
            .with_member(Box::new(FeedForwardNet::hand_initialized()), neural, -0.2)
            .with_member(Box::new(ResidualBooster), boosting, 0.2)
            .with_member(Box::new(KernelMachine::new(config.kernel_gamma)), kernel, -0.4)
    }

    /// Register another strategy. Negative weights are treated as zero.
    pub fn with_member(
        mut self,
        strategy: Box<dyn PredictorStrategy>,
        weight: f64,
        confidence_tilt: f64,
    ) -> Self {
        self.members.push(Member {
            strategy,
            weight: weight.max(0.0),
            confidence_tilt,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_names(&self) -> Vec<&'static str> {
        self.members.iter().map(|m| m.strategy.name()).collect()
    }

    /// Combine member estimates with confidence-adjusted weights.
    ///
    /// Each weight becomes `base * max(0, 1 + tilt * (confidence - 0.5))`,
    /// then all weights are renormalized. If every weight collapses to zero
    /// the members are averaged evenly. The result is clamped to [0, 100].
    pub fn predict(&self, features: &FeatureVector, confidence: f64) -> EnsembleOutput {
        if self.members.is_empty() {
            return EnsembleOutput {
                points: 0.0,
                components: Vec::new(),
            };
        }

        let raw: Vec<f64> = self
            .members
            .iter()
            .map(|m| m.weight * (1.0 + m.confidence_tilt * (confidence - 0.5)).max(0.0))
            .collect();
        let total: f64 = raw.iter().sum();
        let even = 1.0 / self.members.len() as f64;

        let components: Vec<ComponentEstimate> = self
            .members
            .iter()
            .zip(raw)
            .map(|(m, w)| ComponentEstimate {
                name: m.strategy.name(),
                points: m.strategy.predict(features),
                weight: if total > 0.0 { w / total } else { even },
            })
            .collect();

        let blended: f64 = components.iter().map(|c| c.points * c.weight).sum();
        let points = if blended.is_finite() {
            blended.clamp(0.0, MAX_PREDICTED_POINTS)
        } else {
            0.0
        };

        EnsembleOutput { points, components }
    }
}

impl std::fmt::Debug for EnsemblePredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnsemblePredictor")
            .field("members", &self.member_names())
            .finish()
    }
}
