// Optimization requests: risk appetite, lineup count, generation mode.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-chosen risk appetite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskProfile {
    Conservative,
    #[default]
    Balanced,
    Aggressive,
}

impl RiskProfile {
    pub fn from_str_profile(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "conservative" | "safe" | "low" => Some(RiskProfile::Conservative),
            "balanced" | "medium" => Some(RiskProfile::Balanced),
            "aggressive" | "risky" | "high" => Some(RiskProfile::Aggressive),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskProfile::Conservative => "conservative",
            RiskProfile::Balanced => "balanced",
            RiskProfile::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Statistical filters
// ---------------------------------------------------------------------------

/// Scored attributes a statistical filter can constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatAttribute {
    PredictedPoints,
    Confidence,
    Volatility,
    Credits,
    SeasonPoints,
    SelectionRate,
    DreamTeamRate,
    RecentForm,
    Consistency,
    Versatility,
    InjuryRisk,
    VenueFit,
    PitchFit,
    WeatherFit,
    OppositionStrength,
    HeadToHead,
    CaptaincyAptitude,
    OwnershipProjection,
    PriceEfficiency,
    UpsetPotential,
}

/// Acceptable band on one attribute. Either end may be open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeRange {
    pub attribute: StatAttribute,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl AttributeRange {
    pub fn new(attribute: StatAttribute, min: Option<f64>, max: Option<f64>) -> Self {
        AttributeRange { attribute, min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

// ---------------------------------------------------------------------------
// Generation modes
// ---------------------------------------------------------------------------

/// How the batch chooses each run's candidate pool.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationMode {
    #[default]
    Plain,
    /// Core players in every lineup, hedge players in a share of lineups,
    /// differential players only in the first one or two.
    CoreHedge {
        #[serde(default)]
        core: Vec<String>,
        #[serde(default)]
        hedge: Vec<String>,
        /// Percentage of lineups (0-100) that carry the hedge set.
        #[serde(default)]
        hedge_percentage: f64,
        #[serde(default)]
        differential: Vec<String>,
    },
    StatisticalFilter {
        ranges: Vec<AttributeRange>,
    },
    PresetTemplate {
        template: String,
    },
}

/// A request for `lineup_count` lineups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    #[serde(default)]
    pub risk: RiskProfile,
    pub lineup_count: usize,
    /// Seed for every random choice in the batch. `None` uses the configured default.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Player ids that must never be selected.
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub mode: GenerationMode,
}

impl OptimizationRequest {
    pub fn new(risk: RiskProfile, lineup_count: usize) -> Self {
        OptimizationRequest {
            risk,
            lineup_count,
            seed: None,
            exclude: Vec::new(),
            mode: GenerationMode::Plain,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_exclusions(mut self, ids: &[&str]) -> Self {
        self.exclude = ids.iter().map(|s| s.to_string()).collect();
        self
    }
}
