// Player records, roles, and role-count histograms.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of players in every lineup.
pub const SQUAD_SIZE: usize = 11;

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Cricket roles used for roster quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[serde(alias = "WK", alias = "wk")]
    Keeper,
    #[serde(alias = "BAT", alias = "bat")]
    Batter,
    #[serde(alias = "AR", alias = "ar", alias = "allrounder")]
    AllRounder,
    #[serde(alias = "BOWL", alias = "bowl")]
    Bowler,
}

impl Role {
    /// All roles in canonical display order (WK, BAT, AR, BOWL).
    pub const ALL: [Role; 4] = [Role::Keeper, Role::Batter, Role::AllRounder, Role::Bowler];

    /// Parse a role string.
    ///
    /// Handles the usual fantasy abbreviations as well as full names:
    /// - "WK" / "KEEPER" / "WICKETKEEPER" -> Keeper
    /// - "BAT" / "BATTER" / "BATSMAN" -> Batter
    /// - "AR" / "ALLROUNDER" / "ALL-ROUNDER" -> AllRounder
    /// - "BOWL" / "BWL" / "BOWLER" -> Bowler
    pub fn from_str_role(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_uppercase();
        match normalized.as_str() {
            "WK" | "KEEPER" | "WICKETKEEPER" => Some(Role::Keeper),
            "BAT" | "BATTER" | "BATSMAN" => Some(Role::Batter),
            "AR" | "ALLROUNDER" => Some(Role::AllRounder),
            "BOWL" | "BWL" | "BOWLER" => Some(Role::Bowler),
            _ => None,
        }
    }

    /// Short display string.
    pub fn display_str(&self) -> &'static str {
        match self {
            Role::Keeper => "WK",
            Role::Batter => "BAT",
            Role::AllRounder => "AR",
            Role::Bowler => "BOWL",
        }
    }

    /// Full human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Role::Keeper => "Keeper",
            Role::Batter => "Batter",
            Role::AllRounder => "AllRounder",
            Role::Bowler => "Bowler",
        }
    }

    /// Index into role-keyed arrays; matches `Role::ALL` order.
    pub fn index(&self) -> usize {
        match self {
            Role::Keeper => 0,
            Role::Batter => 1,
            Role::AllRounder => 2,
            Role::Bowler => 3,
        }
    }

    /// Whether this role is preferred for captaincy. Bowlers are only
    /// considered when the lineup has fewer than two other candidates.
    pub fn is_leadership_preferred(&self) -> bool {
        !matches!(self, Role::Bowler)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Role histogram
// ---------------------------------------------------------------------------

/// Count of players per role, displayed as a shape such as `1-4-2-4`
/// (keepers-batters-allrounders-bowlers).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleCounts {
    pub keeper: usize,
    pub batter: usize,
    pub all_rounder: usize,
    pub bowler: usize,
}

impl RoleCounts {
    pub const fn new(keeper: usize, batter: usize, all_rounder: usize, bowler: usize) -> Self {
        RoleCounts {
            keeper,
            batter,
            all_rounder,
            bowler,
        }
    }

    pub fn get(&self, role: Role) -> usize {
        match role {
            Role::Keeper => self.keeper,
            Role::Batter => self.batter,
            Role::AllRounder => self.all_rounder,
            Role::Bowler => self.bowler,
        }
    }

    pub fn get_mut(&mut self, role: Role) -> &mut usize {
        match role {
            Role::Keeper => &mut self.keeper,
            Role::Batter => &mut self.batter,
            Role::AllRounder => &mut self.all_rounder,
            Role::Bowler => &mut self.bowler,
        }
    }

    pub fn increment(&mut self, role: Role) {
        *self.get_mut(role) += 1;
    }

    pub fn total(&self) -> usize {
        self.keeper + self.batter + self.all_rounder + self.bowler
    }

    /// Build a histogram from anything carrying a role.
    pub fn from_entries<'a, P, I>(entries: I) -> Self
    where
        P: RosterEntry + 'a,
        I: IntoIterator<Item = &'a P>,
    {
        let mut counts = RoleCounts::default();
        for entry in entries {
            counts.increment(entry.role());
        }
        counts
    }
}

impl fmt::Display for RoleCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.keeper, self.batter, self.all_rounder, self.bowler
        )
    }
}

// ---------------------------------------------------------------------------
// Player records
// ---------------------------------------------------------------------------

/// Raw statistical attributes supplied with a player.
///
/// Rates are percentages in [0, 100]. Advanced attributes are optional and
/// synthesized by the scoring model when absent. Normalized scores live in
/// [0, 1]; `injury_risk` lives in [1, 10].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub season_points: f64,
    pub selection_rate: f64,
    pub dream_team_rate: f64,
    #[serde(default)]
    pub recent_form: Option<f64>,
    #[serde(default)]
    pub consistency: Option<f64>,
    #[serde(default)]
    pub versatility: Option<f64>,
    #[serde(default)]
    pub injury_risk: Option<f64>,
    #[serde(default)]
    pub venue_fit: Option<f64>,
    #[serde(default)]
    pub pitch_fit: Option<f64>,
    #[serde(default)]
    pub weather_fit: Option<f64>,
    #[serde(default)]
    pub opposition_strength: Option<f64>,
    #[serde(default)]
    pub head_to_head: Option<f64>,
    #[serde(default)]
    pub captaincy_aptitude: Option<f64>,
    #[serde(default)]
    pub ownership_projection: Option<f64>,
    #[serde(default)]
    pub price_efficiency: Option<f64>,
    #[serde(default)]
    pub upset_potential: Option<f64>,
}

/// A player in the match pool. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub role: Role,
    /// Franchise / team affiliation.
    pub team: String,
    /// Salary cost in credits.
    pub credits: f64,
    #[serde(default = "default_eligible")]
    pub eligible: bool,
    #[serde(default)]
    pub stats: PlayerStats,
}

fn default_eligible() -> bool {
    true
}

impl Player {
    /// Convenience constructor used heavily by tests and fixtures.
    pub fn new(id: &str, name: &str, role: Role, team: &str, credits: f64) -> Self {
        Player {
            id: id.to_string(),
            name: name.to_string(),
            role,
            team: team.to_string(),
            credits,
            eligible: true,
            stats: PlayerStats::default(),
        }
    }

    pub fn with_stats(mut self, stats: PlayerStats) -> Self {
        self.stats = stats;
        self
    }
}

// ---------------------------------------------------------------------------
// Roster entry abstraction
// ---------------------------------------------------------------------------

/// Anything that can occupy a lineup slot. Lets the validator check raw
/// players, scored players, and finished lineup entries with one code path.
pub trait RosterEntry {
    fn id(&self) -> &str;
    fn role(&self) -> Role;
    fn team(&self) -> &str;
    fn credits(&self) -> f64;
}

impl RosterEntry for Player {
    fn id(&self) -> &str {
        &self.id
    }
    fn role(&self) -> Role {
        self.role
    }
    fn team(&self) -> &str {
        &self.team
    }
    fn credits(&self) -> f64 {
        self.credits
    }
}

impl<T: RosterEntry + ?Sized> RosterEntry for &T {
    fn id(&self) -> &str {
        (**self).id()
    }
    fn role(&self) -> Role {
        (**self).role()
    }
    fn team(&self) -> &str {
        (**self).team()
    }
    fn credits(&self) -> f64 {
        (**self).credits()
    }
}
