// Named composition templates.

use serde::Serialize;
use xiforge_core::RoleCounts;

use crate::scoring::ScoredPlayer;

/// A role shape plus a predicted-points bias applied before search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PresetTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub shape: RoleCounts,
    /// Points multiplier per role, in `Role::ALL` order.
    pub role_bias: [f64; 4],
    /// Extra multiplier `1 + ownership_bias * (0.5 - ownership_projection)`.
    /// Positive values favor rarely-picked players.
    pub ownership_bias: f64,
}

impl PresetTemplate {
    pub fn bias_factor(&self, player: &ScoredPlayer) -> f64 {
        let role = self.role_bias[player.player.role.index()];
        let ownership = 1.0 + self.ownership_bias * (0.5 - player.attributes.ownership_projection);
        (role * ownership).max(0.0)
    }

    /// Fresh scored players with this template's bias applied.
    pub fn apply(&self, pool: &[ScoredPlayer]) -> Vec<ScoredPlayer> {
        pool.iter().map(|sp| sp.with_points_bias(self.bias_factor(sp))).collect()
    }
}

pub const PRESETS: &[PresetTemplate] = &[
    PresetTemplate {
        name: "balanced",
        description: "1-4-2-4 with no bias",
        shape: RoleCounts::new(1, 4, 2, 4),
        role_bias: [1.0, 1.0, 1.0, 1.0],
        ownership_bias: 0.0,
    },
    PresetTemplate {
        name: "bowling-heavy",
        description: "five bowlers, bowlers favored",
        shape: RoleCounts::new(1, 3, 2, 5),
        role_bias: [1.0, 1.0, 1.0, 1.15],
        ownership_bias: 0.0,
    },
    PresetTemplate {
        name: "top-order-stack",
        description: "five batters, batters and keeper favored",
        shape: RoleCounts::new(1, 5, 1, 4),
        role_bias: [1.05, 1.15, 1.0, 1.0],
        ownership_bias: 0.0,
    },
    PresetTemplate {
        name: "all-rounder-heavy",
        description: "four all-rounders, all-rounders favored",
        shape: RoleCounts::new(1, 3, 4, 3),
        role_bias: [1.0, 1.0, 1.15, 1.0],
        ownership_bias: 0.0,
    },
    PresetTemplate {
        name: "double-keeper",
        description: "two keepers, keepers favored",
        shape: RoleCounts::new(2, 4, 1, 4),
        role_bias: [1.10, 1.0, 1.0, 1.0],
        ownership_bias: 0.0,
    },
    PresetTemplate {
        name: "contrarian",
        description: "1-4-2-4 favoring low projected ownership",
        shape: RoleCounts::new(1, 4, 2, 4),
        role_bias: [1.0, 1.0, 1.0, 1.0],
        ownership_bias: 0.6,
    },
];

/// Look up a preset by name. Case-insensitive; `_` and ` ` match `-`.
pub fn find_preset(name: &str) -> Option<&'static PresetTemplate> {
    let wanted: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '_' || c == ' ' { '-' } else { c })
        .collect();
    PRESETS.iter().find(|p| p.name == wanted)
}

pub fn preset_names() -> Vec<&'static str> {
    PRESETS.iter().map(|p| p.name).collect()
}
