// Player pool loading from CSV.
//
// Required columns: id, name, role, team, credits, season_points,
// selection_rate, dream_team_rate. Optional: eligible plus any of the
// advanced attribute columns (recent_form, consistency, ...). Empty cells
// in optional columns mean "not supplied".

use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::warn;

use crate::player::{Player, PlayerStats, Role};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV row (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawPlayerRow {
    id: String,
    name: String,
    role: String,
    team: String,
    credits: f64,
    season_points: f64,
    selection_rate: f64,
    dream_team_rate: f64,
    #[serde(default)]
    eligible: Option<String>,
    #[serde(default)]
    recent_form: Option<f64>,
    #[serde(default)]
    consistency: Option<f64>,
    #[serde(default)]
    versatility: Option<f64>,
    #[serde(default)]
    injury_risk: Option<f64>,
    #[serde(default)]
    venue_fit: Option<f64>,
    #[serde(default)]
    pitch_fit: Option<f64>,
    #[serde(default)]
    weather_fit: Option<f64>,
    #[serde(default)]
    opposition_strength: Option<f64>,
    #[serde(default)]
    head_to_head: Option<f64>,
    #[serde(default)]
    captaincy_aptitude: Option<f64>,
    #[serde(default)]
    ownership_projection: Option<f64>,
    #[serde(default)]
    price_efficiency: Option<f64>,
    #[serde(default)]
    upset_potential: Option<f64>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns true if all given f64 values are finite (not NaN or Infinity).
fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

/// Lenient boolean parsing for the `eligible` column. Blank means eligible.
fn parse_eligible(raw: Option<&str>) -> Option<bool> {
    match raw.map(|s| s.trim().to_lowercase()) {
        None => Some(true),
        Some(s) => match s.as_str() {
            "" | "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
    }
}

fn row_to_player(raw: RawPlayerRow) -> Option<Player> {
    let id = raw.id.trim().to_string();
    if id.is_empty() {
        warn!("skipping player '{}': empty id", raw.name.trim());
        return None;
    }
    let Some(role) = Role::from_str_role(&raw.role) else {
        warn!("skipping player '{}': unknown role '{}'", id, raw.role);
        return None;
    };
    if !all_finite(&[raw.credits, raw.season_points, raw.selection_rate, raw.dream_team_rate]) {
        warn!("skipping player '{}': non-finite numeric value", id);
        return None;
    }
    if raw.credits <= 0.0 {
        warn!("skipping player '{}': credits must be positive", id);
        return None;
    }
    let Some(eligible) = parse_eligible(raw.eligible.as_deref()) else {
        warn!(
            "skipping player '{}': unreadable eligible flag '{}'",
            id,
            raw.eligible.unwrap_or_default()
        );
        return None;
    };

    let finite = |v: Option<f64>| v.filter(|x| x.is_finite());

    Some(Player {
        id,
        name: raw.name.trim().to_string(),
        role,
        team: raw.team.trim().to_string(),
        credits: raw.credits,
        eligible,
        stats: PlayerStats {
            season_points: raw.season_points.max(0.0),
            selection_rate: raw.selection_rate.clamp(0.0, 100.0),
            dream_team_rate: raw.dream_team_rate.clamp(0.0, 100.0),
            recent_form: finite(raw.recent_form),
            consistency: finite(raw.consistency),
            versatility: finite(raw.versatility),
            injury_risk: finite(raw.injury_risk),
            venue_fit: finite(raw.venue_fit),
            pitch_fit: finite(raw.pitch_fit),
            weather_fit: finite(raw.weather_fit),
            opposition_strength: finite(raw.opposition_strength),
            head_to_head: finite(raw.head_to_head),
            captaincy_aptitude: finite(raw.captaincy_aptitude),
            ownership_projection: finite(raw.ownership_projection),
            price_efficiency: finite(raw.price_efficiency),
            upset_potential: finite(raw.upset_potential),
        },
    })
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

/// Read players from any CSV source. Malformed rows are skipped with a
/// warning; a repeated id keeps the first occurrence.
pub fn load_pool_from_reader<R: Read>(rdr: R) -> Result<Vec<Player>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut players = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for result in reader.deserialize::<RawPlayerRow>() {
        match result {
            Ok(raw) => {
                let Some(player) = row_to_player(raw) else {
                    continue;
                };
                if !seen.insert(player.id.clone()) {
                    warn!("duplicate player id '{}', keeping first row", player.id);
                    continue;
                }
                players.push(player);
            }
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
            }
        }
    }
    Ok(players)
}

/// Load a player pool from a CSV file.
pub fn load_pool(path: &Path) -> Result<Vec<Player>, PoolError> {
    let file = std::fs::File::open(path).map_err(|e| PoolError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let players = load_pool_from_reader(file).map_err(|e| PoolError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    if players.is_empty() {
        return Err(PoolError::Validation(format!(
            "{} produced zero valid player rows",
            path.display()
        )));
    }
    Ok(players)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "id,name,role,team,credits,season_points,selection_rate,dream_team_rate,eligible,recent_form\n";

    #[test]
    fn loads_basic_rows() {
        let csv = format!(
            "{HEADER}p1,Alpha,WK,MI,9.0,640,72.5,40,true,0.8\np2,Beta,BOWL,CSK,8.5,410,35,12,,\n"
        );
        let players = load_pool_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].role, Role::Keeper);
        assert_eq!(players[0].stats.recent_form, Some(0.8));
        assert!(players[1].eligible);
        assert_eq!(players[1].stats.recent_form, None);
        assert_eq!(players[1].team, "CSK");
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let csv = "id,name,role,team,credits,season_points,selection_rate,dream_team_rate\n\
                   p1,Alpha,AR,MI,9.5,700,80,45\n";
        let players = load_pool_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(players.len(), 1);
        assert!(players[0].eligible);
        assert_eq!(players[0].stats.consistency, None);
    }

    #[test]
    fn skips_unknown_role_and_bad_credits() {
        let csv = format!(
            "{HEADER}p1,Alpha,COACH,MI,9.0,640,72,40,true,\np2,Beta,BAT,MI,0,100,10,5,true,\np3,Gamma,BAT,MI,8,300,50,20,no,\n"
        );
        let players = load_pool_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].id, "p3");
        assert!(!players[0].eligible);
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let csv = format!("{HEADER}p1,Alpha,BAT,MI,9,640,72,40,true,\np1,Other,BOWL,CSK,8,300,50,20,true,\n");
        let players = load_pool_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].name, "Alpha");
    }

    #[test]
    fn rates_are_clamped() {
        let csv = format!("{HEADER}p1,Alpha,BAT,MI,9,640,140,-3,true,\n");
        let players = load_pool_from_reader(csv.as_bytes()).unwrap();
        assert!((players[0].stats.selection_rate - 100.0).abs() < f64::EPSILON);
        assert!(players[0].stats.dream_team_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_pool(Path::new("definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, PoolError::Io { .. }));
    }

    #[test]
    fn eligible_flag_parsing() {
        assert_eq!(parse_eligible(None), Some(true));
        assert_eq!(parse_eligible(Some(" Yes ")), Some(true));
        assert_eq!(parse_eligible(Some("0")), Some(false));
        assert_eq!(parse_eligible(Some("maybe")), None);
    }
}
