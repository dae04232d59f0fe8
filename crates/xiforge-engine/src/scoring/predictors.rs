// The five point estimators behind the ensemble.
//
// These are fixed arithmetic over the feature vector, not fitted models.
// Each returns a non-negative estimate on the 0-100 points scale; the
// ensemble clamps the blended result.

use xiforge_core::Role;

use super::features::{FeatureVector, FEATURE_COUNT};

/// A single point estimator. Implementations must be pure: the same
/// features always produce the same estimate.
pub trait PredictorStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn predict(&self, features: &FeatureVector) -> f64;
}

// ---------------------------------------------------------------------------
// Linear model with interactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct LinearModel;

impl PredictorStrategy for LinearModel {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn predict(&self, f: &FeatureVector) -> f64 {
        let matchup = ease(f);
        let main = 22.0 * f.form
            + 12.0 * f.consistency
            + 8.0 * f.versatility
            + 6.0 * f.venue
            + 5.0 * f.pitch
            + 3.0 * f.weather
            + 5.0 * matchup
            + 3.0 * f.head_to_head
            + 16.0 * f.points
            - 5.0 * f.injury;
        let interactions = 6.0 * f.form * f.versatility
            + 5.0 * f.venue * f.consistency
            + 4.0 * f.pitch * matchup
            + 5.0 * f.efficiency;
        (main + interactions).max(0.0)
    }
}

// ---------------------------------------------------------------------------
// Rule forest
// ---------------------------------------------------------------------------

fn form(f: &FeatureVector) -> f64 {
    f.form
}

fn consistency(f: &FeatureVector) -> f64 {
    f.consistency
}

fn venue(f: &FeatureVector) -> f64 {
    f.venue
}

fn ease(f: &FeatureVector) -> f64 {
    1.0 - f.opposition
}

fn versatility(f: &FeatureVector) -> f64 {
    f.versatility
}

/// One single-feature tree: descending thresholds with tiered points.
struct RuleTree {
    feature: fn(&FeatureVector) -> f64,
    tiers: &'static [(f64, f64)],
    floor: f64,
}

impl RuleTree {
    fn evaluate(&self, f: &FeatureVector) -> f64 {
        let value = (self.feature)(f);
        self.tiers
            .iter()
            .find(|(threshold, _)| value >= *threshold)
            .map_or(self.floor, |(_, points)| *points)
    }
}

const RULE_TREES: [RuleTree; 5] = [
    RuleTree {
        feature: form,
        tiers: &[(0.8, 90.0), (0.6, 72.0), (0.4, 55.0), (0.2, 38.0)],
        floor: 22.0,
    },
    RuleTree {
        feature: consistency,
        tiers: &[(0.75, 80.0), (0.55, 65.0), (0.35, 50.0)],
        floor: 35.0,
    },
    RuleTree {
        feature: venue,
        tiers: &[(0.7, 75.0), (0.5, 60.0), (0.3, 48.0)],
        floor: 38.0,
    },
    RuleTree {
        feature: ease,
        tiers: &[(0.65, 75.0), (0.45, 58.0)],
        floor: 42.0,
    },
    RuleTree {
        feature: versatility,
        tiers: &[(0.7, 78.0), (0.45, 60.0)],
        floor: 45.0,
    },
];

/// Average of independent single-feature trees.
#[derive(Debug, Clone, Default)]
pub struct RuleForest;

impl PredictorStrategy for RuleForest {
    fn name(&self) -> &'static str {
        "rule_forest"
    }

    fn predict(&self, f: &FeatureVector) -> f64 {
        let total: f64 = RULE_TREES.iter().map(|t| t.evaluate(f)).sum();
        total / RULE_TREES.len() as f64
    }
}

// ---------------------------------------------------------------------------
// Feed-forward network
// ---------------------------------------------------------------------------

const HIDDEN_1: usize = 8;
const HIDDEN_2: usize = 4;

/// Two hidden ReLU layers with hand-set weights.
#[derive(Debug, Clone)]
pub struct FeedForwardNet {
    w1: [[f64; FEATURE_COUNT]; HIDDEN_1],
    b1: [f64; HIDDEN_1],
    w2: [[f64; HIDDEN_1]; HIDDEN_2],
    b2: [f64; HIDDEN_2],
    w3: [f64; HIDDEN_2],
    b3: f64,
}

impl FeedForwardNet {
    /// Weights follow small deterministic patterns so every unit sees every
    /// feature with a slightly different emphasis.
    pub fn hand_initialized() -> Self {
        let mut w1 = [[0.0; FEATURE_COUNT]; HIDDEN_1];
        for (i, row) in w1.iter_mut().enumerate() {
            for (j, w) in row.iter_mut().enumerate() {
                *w = 0.05 + ((i * 5 + j * 3) % 7) as f64 * 0.03;
            }
        }
        let mut w2 = [[0.0; HIDDEN_1]; HIDDEN_2];
        for (i, row) in w2.iter_mut().enumerate() {
            for (j, w) in row.iter_mut().enumerate() {
                *w = 0.10 + ((i + 2 * j) % 5) as f64 * 0.05;
            }
        }
        FeedForwardNet {
            w1,
            b1: [-0.1; HIDDEN_1],
            w2,
            b2: [-0.2; HIDDEN_2],
            w3: [0.25; HIDDEN_2],
            b3: 0.0,
        }
    }
}

impl Default for FeedForwardNet {
    fn default() -> Self {
        Self::hand_initialized()
    }
}

fn relu(x: f64) -> f64 {
    x.max(0.0)
}

impl PredictorStrategy for FeedForwardNet {
    fn name(&self) -> &'static str {
        "neural"
    }

    fn predict(&self, f: &FeatureVector) -> f64 {
        let x = f.oriented();

        let mut h1 = [0.0; HIDDEN_1];
        for (i, h) in h1.iter_mut().enumerate() {
            let z: f64 = self.w1[i].iter().zip(x.iter()).map(|(w, v)| w * v).sum();
            *h = relu(z + self.b1[i]);
        }

        let mut h2 = [0.0; HIDDEN_2];
        for (i, h) in h2.iter_mut().enumerate() {
            let z: f64 = self.w2[i].iter().zip(h1.iter()).map(|(w, v)| w * v).sum();
            *h = relu(z + self.b2[i]);
        }

        let out: f64 = self.w3.iter().zip(h2.iter()).map(|(w, v)| w * v).sum::<f64>() + self.b3;
        // Saturating map onto the points scale.
        100.0 * (1.0 - (-0.8 * out.max(0.0)).exp())
    }
}

// ---------------------------------------------------------------------------
// Residual booster
// ---------------------------------------------------------------------------

/// (feature, high band, low band, nudge) per stage.
const BOOST_STAGES: [(fn(&FeatureVector) -> f64, f64, f64, f64); 3] = [
    (form, 0.7, 0.3, 8.0),
    (consistency, 0.7, 0.3, 6.0),
    (venue, 0.7, 0.3, 5.0),
];

const BOOST_SHRINKAGE: [f64; 3] = [1.0, 0.8, 0.6];

/// Staged residual corrections over a points-based baseline.
#[derive(Debug, Clone, Default)]
pub struct ResidualBooster;

impl ResidualBooster {
    fn role_multiplier(role: Role) -> f64 {
        match role {
            Role::AllRounder => 1.08,
            Role::Keeper => 1.02,
            Role::Batter => 1.0,
            Role::Bowler => 0.97,
        }
    }
}

impl PredictorStrategy for ResidualBooster {
    fn name(&self) -> &'static str {
        "boosting"
    }

    fn predict(&self, f: &FeatureVector) -> f64 {
        let mut score = 20.0 + 50.0 * f.points;
        for ((feature, high, low, nudge), shrink) in BOOST_STAGES.iter().zip(BOOST_SHRINKAGE) {
            let value = feature(f);
            if value >= *high {
                score += nudge * shrink;
            } else if value <= *low {
                score -= nudge * shrink;
            }
        }
        (score * Self::role_multiplier(f.role)).max(0.0)
    }
}

// ---------------------------------------------------------------------------
// Kernel similarity
// ---------------------------------------------------------------------------

/// Gaussian-kernel weighted average over fixed reference profiles.
#[derive(Debug, Clone)]
pub struct KernelMachine {
    gamma: f64,
    /// (uniform feature level, points at that profile)
    references: [(f64, f64); 3],
}

impl KernelMachine {
    pub fn new(gamma: f64) -> Self {
        KernelMachine {
            gamma,
            references: [(0.85, 88.0), (0.5, 52.0), (0.2, 22.0)],
        }
    }
}

impl PredictorStrategy for KernelMachine {
    fn name(&self) -> &'static str {
        "kernel"
    }

    fn predict(&self, f: &FeatureVector) -> f64 {
        let x = f.oriented();
        let mut weight_sum = 0.0;
        let mut weighted = 0.0;
        for (level, points) in self.references {
            let dist_sq: f64 = x.iter().map(|v| (v - level).powi(2)).sum();
            let k = (-self.gamma * dist_sq).exp();
            weight_sum += k;
            weighted += k * points;
        }
        if weight_sum < 1e-12 {
            // Far from every reference: fall back to the middle profile.
            return self.references[1].1;
        }
        weighted / weight_sum
    }
}
