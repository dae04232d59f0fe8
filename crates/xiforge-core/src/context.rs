// Match context: venue, conditions, and head-to-head history.

use serde::{Deserialize, Serialize};

/// Pitch character reported for the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PitchType {
    /// Flat deck, good for batting.
    Flat,
    /// Grass cover, seam movement.
    Green,
    /// Dry and turning, helps spin.
    Dry,
    #[default]
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[default]
    Clear,
    Overcast,
    Humid,
    Rain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFormat {
    T10,
    #[default]
    T20,
    Odi,
    Test,
}

impl MatchFormat {
    /// Additive shift applied to player volatility. Shorter formats swing harder.
    pub fn volatility_shift(&self) -> f64 {
        match self {
            MatchFormat::T10 => 0.05,
            MatchFormat::T20 => 0.0,
            MatchFormat::Odi => -0.03,
            MatchFormat::Test => -0.05,
        }
    }
}

/// One completed meeting between the two sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadToHeadRecord {
    /// Winning team identifier. Records whose winner is neither side
    /// (no result, abandoned) are ignored.
    pub winner: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchContext {
    pub venue: String,
    #[serde(default)]
    pub pitch: PitchType,
    #[serde(default)]
    pub weather: Weather,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub format: MatchFormat,
    #[serde(default)]
    pub head_to_head: Vec<HeadToHeadRecord>,
}

impl MatchContext {
    pub fn new(venue: &str, home_team: &str, away_team: &str) -> Self {
        MatchContext {
            venue: venue.to_string(),
            pitch: PitchType::default(),
            weather: Weather::default(),
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            format: MatchFormat::default(),
            head_to_head: Vec::new(),
        }
    }

    /// The other side in this match, if `team` is playing.
    pub fn opponent_of(&self, team: &str) -> Option<&str> {
        if team == self.home_team {
            Some(&self.away_team)
        } else if team == self.away_team {
            Some(&self.home_team)
        } else {
            None
        }
    }

    pub fn is_home(&self, team: &str) -> bool {
        team == self.home_team
    }

    /// Share of decided head-to-head meetings won by `team`.
    ///
    /// Returns `None` when `team` is not playing or no decided record exists.
    pub fn head_to_head_share(&self, team: &str) -> Option<f64> {
        let opponent = self.opponent_of(team)?;
        let mut wins = 0usize;
        let mut decided = 0usize;
        for record in &self.head_to_head {
            if record.winner == team {
                wins += 1;
                decided += 1;
            } else if record.winner == opponent {
                decided += 1;
            }
        }
        if decided == 0 {
            return None;
        }
        Some(wins as f64 / decided as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(winner: &str) -> HeadToHeadRecord {
        HeadToHeadRecord {
            winner: winner.to_string(),
        }
    }

    #[test]
    fn opponent_lookup() {
        let ctx = MatchContext::new("Wankhede", "MI", "CSK");
        assert_eq!(ctx.opponent_of("MI"), Some("CSK"));
        assert_eq!(ctx.opponent_of("CSK"), Some("MI"));
        assert_eq!(ctx.opponent_of("RCB"), None);
        assert!(ctx.is_home("MI"));
    }

    #[test]
    fn head_to_head_share_ignores_no_results() {
        let mut ctx = MatchContext::new("Wankhede", "MI", "CSK");
        ctx.head_to_head = vec![record("MI"), record("MI"), record("CSK"), record("none")];
        let share = ctx.head_to_head_share("MI").unwrap();
        assert!((share - 2.0 / 3.0).abs() < 1e-9);
        let share = ctx.head_to_head_share("CSK").unwrap();
        assert!((share - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn head_to_head_share_none_without_records() {
        let ctx = MatchContext::new("Wankhede", "MI", "CSK");
        assert!(ctx.head_to_head_share("MI").is_none());
    }

    #[test]
    fn context_deserializes_with_defaults() {
        let text = r#"
venue = "Eden Gardens"
home_team = "KKR"
away_team = "RR"
pitch = "dry"
"#;
        let ctx: MatchContext = toml::from_str(text).unwrap();
        assert_eq!(ctx.pitch, PitchType::Dry);
        assert_eq!(ctx.weather, Weather::Clear);
        assert_eq!(ctx.format, MatchFormat::T20);
        assert!(ctx.head_to_head.is_empty());
    }

    #[test]
    fn shorter_formats_are_more_volatile() {
        assert!(MatchFormat::T10.volatility_shift() > MatchFormat::T20.volatility_shift());
        assert!(MatchFormat::Test.volatility_shift() < MatchFormat::Odi.volatility_shift());
    }
}
