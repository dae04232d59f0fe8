// Command-line host for the lineup engine: argument parsing, match file
// loading, and output rendering. `main.rs` only wires these together.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use xiforge_core::{MatchContext, OptimizationRequest, RiskProfile};
use xiforge_engine::{BatchOutcome, Lineup};

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "xiforge")]
#[command(about = "Generate fantasy cricket lineups for a match", long_about = None)]
pub struct Args {
    /// Match file with [match] and [request] tables
    #[arg(short, long = "match")]
    pub match_file: PathBuf,

    /// Player pool CSV (defaults to data_paths.pool from config)
    #[arg(short, long)]
    pub pool: Option<PathBuf>,

    /// Number of lineups, overriding the match file
    #[arg(short, long)]
    pub count: Option<usize>,

    /// Risk profile: conservative, balanced, or aggressive
    #[arg(short, long, value_parser = parse_risk)]
    pub risk: Option<RiskProfile>,

    /// Batch seed, overriding the match file
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Print the batch as JSON instead of a table
    #[arg(long, default_value = "false")]
    pub json: bool,
}

fn parse_risk(s: &str) -> Result<RiskProfile, String> {
    RiskProfile::from_str_profile(s).ok_or_else(|| format!("unknown risk profile '{s}'"))
}

// ---------------------------------------------------------------------------
// Match file
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MatchFileError {
    #[error("failed to read match file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse match file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchFile {
    #[serde(rename = "match")]
    pub context: MatchContext,
    pub request: OptimizationRequest,
}

impl MatchFile {
    pub fn parse(text: &str) -> Result<MatchFile, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<MatchFile, MatchFileError> {
        let text = std::fs::read_to_string(path).map_err(|source| MatchFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        MatchFile::parse(&text).map_err(|source| MatchFileError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Command-line flags take precedence over the match file.
pub fn apply_overrides(mut request: OptimizationRequest, args: &Args) -> OptimizationRequest {
    if let Some(count) = args.count {
        request.lineup_count = count;
    }
    if let Some(risk) = args.risk {
        request.risk = risk;
    }
    if let Some(seed) = args.seed {
        request.seed = Some(seed);
    }
    request
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn render_json(outcome: &BatchOutcome) -> serde_json::Result<String> {
    serde_json::to_string_pretty(outcome)
}

fn leader_tag(lineup: &Lineup, id: &str) -> &'static str {
    if lineup.captain == id {
        "(C)"
    } else if lineup.vice_captain == id {
        "(VC)"
    } else {
        ""
    }
}

pub fn render_lineup(index: usize, lineup: &Lineup) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Lineup {} [{}] {:.1} pts, {:.1} credits, risk {:.2}",
        index + 1,
        lineup.origin,
        lineup.expected_points,
        lineup.total_credits,
        lineup.risk_score
    );
    let name_of = |id: &str| lineup.player(id).map_or(id.to_string(), |p| p.name.clone());
    let _ = writeln!(
        out,
        "  C {}, VC {}",
        name_of(&lineup.captain),
        name_of(&lineup.vice_captain)
    );
    for p in &lineup.players {
        let _ = writeln!(
            out,
            "  {:<5} {:<24} {:<6} {:>5.1} {:>6.1} {}",
            p.role.display_str(),
            p.name,
            p.team,
            p.credits,
            p.predicted_points,
            leader_tag(lineup, &p.id)
        );
    }
    let _ = writeln!(out, "  {}", lineup.rationale);
    out
}

pub fn render_table(outcome: &BatchOutcome) -> String {
    let mut out = String::new();
    for (i, lineup) in outcome.lineups.iter().enumerate() {
        out.push_str(&render_lineup(i, lineup));
        out.push('\n');
    }
    let stats = &outcome.stats;
    let _ = writeln!(
        out,
        "{} lineups, {} distinct, {} captains, {:.1}% pool used, {:.2} mean overlap, {} fallback",
        stats.lineup_count,
        stats.distinct_lineups,
        stats.captain_variety,
        stats.pool_utilization_pct,
        stats.mean_pairwise_overlap,
        stats.fallback_count
    );
    out
}
