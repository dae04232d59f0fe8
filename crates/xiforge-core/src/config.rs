// Configuration loading and parsing (roster.toml, engine.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::constraints::RosterConstraints;
use crate::player::{Role, SQUAD_SIZE};
use crate::request::RiskProfile;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub roster: RosterConstraints,
    pub engine: EngineConfig,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// roster.toml
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[roster]` table in roster.toml.
#[derive(Debug, Clone, Deserialize)]
struct RosterFile {
    roster: RosterConstraints,
}

// ---------------------------------------------------------------------------
// engine.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire engine.toml file.
#[derive(Debug, Clone, Deserialize)]
struct EngineFile {
    optimizer: OptimizerConfig,
    fitness: FitnessWeights,
    risk: RiskThresholds,
    scoring: ScoringConfig,
    batch: BatchConfig,
    data_paths: DataPaths,
}

/// Tunables for the engine, assembled from engine.toml.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub optimizer: OptimizerConfig,
    pub fitness: FitnessWeights,
    pub risk: RiskThresholds,
    pub scoring: ScoringConfig,
    pub batch: BatchConfig,
}

/// Genetic search parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerConfig {
    pub population_size: usize,
    pub generations: usize,
    /// Fraction of each generation carried over unchanged.
    pub elite_fraction: f64,
    pub tournament_size: usize,
    /// Per-slot mutation probability.
    pub mutation_rate: f64,
    /// Offspring attempts allowed per open population slot before the slot
    /// is filled by cloning a tournament winner.
    pub max_offspring_attempts: usize,
    /// Attempts allowed per individual during population seeding.
    pub init_attempts: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            population_size: 40,
            generations: 30,
            elite_fraction: 0.2,
            tournament_size: 3,
            mutation_rate: 0.1,
            max_offspring_attempts: 25,
            init_attempts: 10,
        }
    }
}

/// Relative weight of each fitness component. Must sum to a positive total;
/// they are used as given, not renormalized.
#[derive(Debug, Clone, Deserialize)]
pub struct FitnessWeights {
    pub points: f64,
    pub risk: f64,
    pub diversity: f64,
    pub confidence: f64,
    pub budget: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        FitnessWeights {
            points: 0.40,
            risk: 0.20,
            diversity: 0.15,
            confidence: 0.15,
            budget: 0.10,
        }
    }
}

/// Volatility ceiling and consistency floor for one risk profile.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RiskBand {
    pub max_volatility: f64,
    pub min_consistency: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskThresholds {
    pub conservative: RiskBand,
    pub balanced: RiskBand,
    pub aggressive: RiskBand,
}

impl RiskThresholds {
    pub fn band(&self, profile: RiskProfile) -> RiskBand {
        match profile {
            RiskProfile::Conservative => self.conservative,
            RiskProfile::Balanced => self.balanced,
            RiskProfile::Aggressive => self.aggressive,
        }
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        RiskThresholds {
            conservative: RiskBand {
                max_volatility: 0.45,
                min_consistency: 0.55,
            },
            balanced: RiskBand {
                max_volatility: 0.60,
                min_consistency: 0.40,
            },
            aggressive: RiskBand {
                max_volatility: 0.80,
                min_consistency: 0.20,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Season points that normalize to 1.0.
    pub points_scale: f64,
    /// Points-per-credit that normalize to 1.0.
    pub efficiency_scale: f64,
    /// Gaussian kernel width parameter for the similarity estimator.
    pub kernel_gamma: f64,
    pub ensemble: EnsembleWeights,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            points_scale: 1000.0,
            efficiency_scale: 100.0,
            kernel_gamma: 2.0,
            ensemble: EnsembleWeights::default(),
        }
    }
}

/// Base combination weights for the five predictors.
#[derive(Debug, Clone, Deserialize)]
pub struct EnsembleWeights {
    pub linear: f64,
    pub rule_forest: f64,
    pub neural: f64,
    pub boosting: f64,
    pub kernel: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        EnsembleWeights {
            linear: 0.25,
            rule_forest: 0.20,
            neural: 0.20,
            boosting: 0.20,
            kernel: 0.15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Run the per-lineup optimizations on the rayon thread pool.
    pub parallel: bool,
    pub default_seed: u64,
    pub max_lineups: usize,
    /// Half-width of the seeded multiplicative noise applied to predicted
    /// points in every run after the first. Zero disables it.
    #[serde(default = "default_perturbation")]
    pub perturbation: f64,
}

fn default_perturbation() -> f64 {
    0.2
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            parallel: true,
            default_seed: 11,
            max_lineups: 100,
            perturbation: default_perturbation(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub pool: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/roster.toml` and
/// `config/engine.toml`, both relative to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- roster.toml (required) ---
    let roster_path = config_dir.join("roster.toml");
    let roster_text = read_file(&roster_path)?;
    let roster_file: RosterFile =
        toml::from_str(&roster_text).map_err(|e| ConfigError::ParseError {
            path: roster_path.clone(),
            source: e,
        })?;

    // --- engine.toml (required) ---
    let engine_path = config_dir.join("engine.toml");
    let engine_text = read_file(&engine_path)?;
    let engine_file: EngineFile =
        toml::from_str(&engine_text).map_err(|e| ConfigError::ParseError {
            path: engine_path.clone(),
            source: e,
        })?;

    let config = Config {
        roster: roster_file.roster,
        engine: EngineConfig {
            optimizer: engine_file.optimizer,
            fitness: engine_file.fitness,
            risk: engine_file.risk,
            scoring: engine_file.scoring,
            batch: engine_file.batch,
        },
        data_paths: engine_file.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_roster(&config.roster)?;
    validate_engine(&config.engine)
}

/// Check roster constraints for internal consistency.
pub fn validate_roster(roster: &RosterConstraints) -> Result<(), ConfigError> {
    if !(roster.salary_cap > 0.0 && roster.salary_cap.is_finite()) {
        return Err(invalid(
            "roster.salary_cap",
            format!("must be a positive number, got {}", roster.salary_cap),
        ));
    }

    if roster.max_per_team == 0 {
        return Err(invalid("roster.max_per_team", "must be greater than 0"));
    }

    for role in Role::ALL {
        let quota = roster.quota(role);
        if quota.min > quota.max {
            return Err(invalid(
                &format!("roster.roles.{}", role_key(role)),
                format!("min ({}) exceeds max ({})", quota.min, quota.max),
            ));
        }
    }

    if roster.min_total() > SQUAD_SIZE {
        return Err(invalid(
            "roster.roles",
            format!("role minimums sum to {}, above squad size {SQUAD_SIZE}", roster.min_total()),
        ));
    }
    if roster.max_total() < SQUAD_SIZE {
        return Err(invalid(
            "roster.roles",
            format!("role maximums sum to {}, below squad size {SQUAD_SIZE}", roster.max_total()),
        ));
    }

    Ok(())
}

/// Check engine tunables.
pub fn validate_engine(engine: &EngineConfig) -> Result<(), ConfigError> {
    let opt = &engine.optimizer;
    let count_fields: &[(&str, usize)] = &[
        ("optimizer.population_size", opt.population_size),
        ("optimizer.generations", opt.generations),
        ("optimizer.tournament_size", opt.tournament_size),
        ("optimizer.max_offspring_attempts", opt.max_offspring_attempts),
        ("optimizer.init_attempts", opt.init_attempts),
        ("batch.max_lineups", engine.batch.max_lineups),
    ];
    for (name, val) in count_fields {
        if *val == 0 {
            return Err(invalid(name, "must be > 0"));
        }
    }

    let unit_fields: &[(&str, f64)] = &[
        ("optimizer.elite_fraction", opt.elite_fraction),
        ("optimizer.mutation_rate", opt.mutation_rate),
        ("batch.perturbation", engine.batch.perturbation),
    ];
    for (name, val) in unit_fields {
        if !(0.0..=1.0).contains(val) {
            return Err(invalid(
                name,
                format!("must be between 0.0 and 1.0 inclusive, got {val}"),
            ));
        }
    }

    let w = &engine.fitness;
    let weight_fields: &[(&str, f64)] = &[
        ("fitness.points", w.points),
        ("fitness.risk", w.risk),
        ("fitness.diversity", w.diversity),
        ("fitness.confidence", w.confidence),
        ("fitness.budget", w.budget),
    ];
    for (name, val) in weight_fields {
        if *val < 0.0 || !val.is_finite() {
            return Err(invalid(name, format!("must be >= 0, got {val}")));
        }
    }
    if weight_fields.iter().map(|(_, v)| v).sum::<f64>() <= 0.0 {
        return Err(invalid("fitness", "weights must not all be zero"));
    }

    for profile in [
        RiskProfile::Conservative,
        RiskProfile::Balanced,
        RiskProfile::Aggressive,
    ] {
        let band = engine.risk.band(profile);
        if !(0.0..=1.0).contains(&band.max_volatility) || !(0.0..=1.0).contains(&band.min_consistency) {
            return Err(invalid(
                &format!("risk.{}", profile.label()),
                "max_volatility and min_consistency must be within [0, 1]",
            ));
        }
    }

    let s = &engine.scoring;
    let scale_fields: &[(&str, f64)] = &[
        ("scoring.points_scale", s.points_scale),
        ("scoring.efficiency_scale", s.efficiency_scale),
        ("scoring.kernel_gamma", s.kernel_gamma),
    ];
    for (name, val) in scale_fields {
        if *val <= 0.0 || !val.is_finite() {
            return Err(invalid(name, format!("must be > 0, got {val}")));
        }
    }

    let e = &s.ensemble;
    let ensemble_fields = [e.linear, e.rule_forest, e.neural, e.boosting, e.kernel];
    if ensemble_fields.iter().any(|w| *w < 0.0) || ensemble_fields.iter().sum::<f64>() <= 0.0 {
        return Err(invalid(
            "scoring.ensemble",
            "weights must be non-negative with a positive sum",
        ));
    }

    Ok(())
}

fn role_key(role: Role) -> &'static str {
    match role {
        Role::Keeper => "keeper",
        Role::Batter => "batter",
        Role::AllRounder => "all_rounder",
        Role::Bowler => "bowler",
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
