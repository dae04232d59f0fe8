// Lineup scoring and optimization engine.
//
// Scores a player pool against a match context, searches for legal
// 11-player lineups with a genetic algorithm, picks captains with
// deliberate variation, and generates whole batches with fallbacks.

pub mod batch;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod leadership;
pub mod lineup;
pub mod optimizer;
pub mod scoring;
pub mod validator;

pub use batch::{BatchOutcome, BatchStats, GenerationStrategy, PresetTemplate};
pub use engine::LineupEngine;
pub use error::{EngineError, RoleShortfall};
pub use leadership::{select_leaders, Leaders, LeadershipStrategy};
pub use lineup::{Lineup, LineupOrigin, LineupPlayer};
pub use optimizer::{FitnessBreakdown, Optimizer, SearchOutcome};
pub use scoring::{ScoredPlayer, ScoringModel};
pub use validator::{role_histogram, validate, Validation, Violation};

#[cfg(test)]
pub(crate) mod test_support {
    use xiforge_core::config::ScoringConfig;
    use xiforge_core::{MatchContext, Player, PlayerStats, Role, RoleCounts};

    use crate::scoring::{ScoredPlayer, ScoringModel};

    /// Players laid out role by role in `Role::ALL` order, alternating
    /// between teams "A" and "B", with varied season numbers.
    pub fn pool_with_shape(shape: RoleCounts, credits: f64) -> Vec<Player> {
        let mut players = Vec::new();
        for role in Role::ALL {
            for i in 0..shape.get(role) {
                let n = players.len();
                let team = if n % 2 == 0 { "A" } else { "B" };
                let stats = PlayerStats {
                    season_points: 250.0 + ((n * 37) % 13) as f64 * 45.0,
                    selection_rate: 10.0 + ((n * 17) % 9) as f64 * 9.0,
                    dream_team_rate: 5.0 + ((n * 11) % 7) as f64 * 6.0,
                    ..PlayerStats::default()
                };
                let id = format!("{}{}", role.display_str().to_lowercase(), i);
                players.push(Player::new(&id, &format!("Player {id}"), role, team, credits).with_stats(stats));
            }
        }
        players
    }

    pub fn scored(players: &[Player]) -> Vec<ScoredPlayer> {
        ScoringModel::new(&ScoringConfig::default()).score(players, &MatchContext::new("Test Ground", "A", "B"))
    }
}
