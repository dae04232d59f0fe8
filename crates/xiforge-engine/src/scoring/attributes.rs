// Advanced attribute synthesis.
//
// Every advanced attribute a player arrives without is derived from the
// attributes that are present plus the match context. Supplied values are
// clamped into their documented range and otherwise passed through.

use serde::Serialize;
use xiforge_core::config::ScoringConfig;
use xiforge_core::{MatchContext, PitchType, Player, Role, Weather};

/// Neutral value used when head-to-head history is missing.
const NEUTRAL_SHARE: f64 = 0.5;

/// Half-width of the deterministic per-player venue/pitch jitter.
const AFFINITY_JITTER: f64 = 0.05;

pub const INJURY_RISK_MIN: f64 = 1.0;
pub const INJURY_RISK_MAX: f64 = 10.0;

/// Complete set of advanced attributes. All scores are in [0, 1] except
/// `injury_risk`, which is in [1, 10].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdvancedAttributes {
    pub recent_form: f64,
    pub consistency: f64,
    pub versatility: f64,
    pub injury_risk: f64,
    pub venue_fit: f64,
    pub pitch_fit: f64,
    pub weather_fit: f64,
    pub opposition_strength: f64,
    pub head_to_head: f64,
    pub captaincy_aptitude: f64,
    pub ownership_projection: f64,
    pub price_efficiency: f64,
    pub upset_potential: f64,
}

impl AdvancedAttributes {
    /// Injury risk rescaled onto [0, 1].
    pub fn injury_norm(&self) -> f64 {
        (self.injury_risk - INJURY_RISK_MIN) / (INJURY_RISK_MAX - INJURY_RISK_MIN)
    }

    /// Every normalized score (everything except injury risk).
    pub fn unit_scores(&self) -> [f64; 12] {
        [
            self.recent_form,
            self.consistency,
            self.versatility,
            self.venue_fit,
            self.pitch_fit,
            self.weather_fit,
            self.opposition_strength,
            self.head_to_head,
            self.captaincy_aptitude,
            self.ownership_projection,
            self.price_efficiency,
            self.upset_potential,
        ]
    }
}

/// Season-level inputs normalized onto [0, 1].
#[derive(Debug, Clone, Copy)]
pub struct BaseRates {
    pub points: f64,
    pub selection: f64,
    pub dream_team: f64,
}

impl BaseRates {
    pub fn of(player: &Player, config: &ScoringConfig) -> Self {
        BaseRates {
            points: unit(player.stats.season_points / config.points_scale),
            selection: unit(player.stats.selection_rate / 100.0),
            dream_team: unit(player.stats.dream_team_rate / 100.0),
        }
    }
}

pub(crate) fn unit(v: f64) -> f64 {
    if v.is_nan() {
        return 0.0;
    }
    v.clamp(0.0, 1.0)
}

fn supplied_unit(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite()).map(unit)
}

/// Stable pseudo-random offset in `[-AFFINITY_JITTER, AFFINITY_JITTER]`
/// keyed by player and context label. Same inputs always give the same value.
fn affinity_jitter(player_id: &str, label: &str) -> f64 {
    let h = fxhash::hash64(&(player_id, label));
    let frac = (h % 10_001) as f64 / 10_000.0;
    (frac - 0.5) * 2.0 * AFFINITY_JITTER
}

fn role_consistency_bonus(role: Role) -> f64 {
    match role {
        Role::Keeper => 0.05,
        Role::Batter => 0.03,
        Role::AllRounder | Role::Bowler => 0.0,
    }
}

fn role_versatility_base(role: Role) -> f64 {
    match role {
        Role::AllRounder => 0.75,
        Role::Keeper => 0.55,
        Role::Batter | Role::Bowler => 0.35,
    }
}

/// Workload contribution to injury risk.
fn role_load(role: Role) -> f64 {
    match role {
        Role::Bowler => 0.20,
        Role::AllRounder => 0.15,
        Role::Keeper => 0.10,
        Role::Batter => 0.05,
    }
}

fn role_captaincy(role: Role) -> f64 {
    match role {
        Role::AllRounder => 1.0,
        Role::Batter => 0.8,
        Role::Keeper => 0.7,
        Role::Bowler => 0.4,
    }
}

/// How well a role suits a pitch type.
pub fn pitch_affinity(role: Role, pitch: PitchType) -> f64 {
    match (pitch, role) {
        (PitchType::Flat, Role::Keeper) => 0.80,
        (PitchType::Flat, Role::Batter) => 0.85,
        (PitchType::Flat, Role::AllRounder) => 0.65,
        (PitchType::Flat, Role::Bowler) => 0.40,
        (PitchType::Green, Role::Keeper) => 0.50,
        (PitchType::Green, Role::Batter) => 0.45,
        (PitchType::Green, Role::AllRounder) => 0.65,
        (PitchType::Green, Role::Bowler) => 0.85,
        (PitchType::Dry, Role::Keeper) => 0.55,
        (PitchType::Dry, Role::Batter) => 0.50,
        (PitchType::Dry, Role::AllRounder) => 0.75,
        (PitchType::Dry, Role::Bowler) => 0.80,
        (PitchType::Balanced, _) => 0.60,
    }
}

/// How well a role suits the weather.
pub fn weather_affinity(role: Role, weather: Weather) -> f64 {
    match (weather, role) {
        (Weather::Clear, Role::Keeper) => 0.70,
        (Weather::Clear, Role::Batter) => 0.80,
        (Weather::Clear, Role::AllRounder) => 0.65,
        (Weather::Clear, Role::Bowler) => 0.50,
        (Weather::Overcast, Role::Keeper) => 0.50,
        (Weather::Overcast, Role::Batter) => 0.45,
        (Weather::Overcast, Role::AllRounder) => 0.65,
        (Weather::Overcast, Role::Bowler) => 0.80,
        (Weather::Humid, _) => 0.60,
        (Weather::Rain, Role::Keeper | Role::Batter) => 0.45,
        (Weather::Rain, Role::AllRounder) => 0.50,
        (Weather::Rain, Role::Bowler) => 0.55,
    }
}

/// Derive the full attribute set for one player.
pub fn synthesize(player: &Player, ctx: &MatchContext, config: &ScoringConfig) -> AdvancedAttributes {
    let stats = &player.stats;
    let base = BaseRates::of(player, config);
    let role = player.role;

    let recent_form = supplied_unit(stats.recent_form)
        .unwrap_or_else(|| unit(0.6 * base.points + 0.4 * base.dream_team));

    let consistency = supplied_unit(stats.consistency).unwrap_or_else(|| {
        unit(0.5 * base.selection + 0.3 * base.dream_team + 0.2 * base.points + role_consistency_bonus(role))
    });

    let versatility = supplied_unit(stats.versatility)
        .unwrap_or_else(|| unit(role_versatility_base(role) + 0.2 * base.dream_team));

    let injury_risk = stats
        .injury_risk
        .filter(|x| x.is_finite())
        .map(|x| x.clamp(INJURY_RISK_MIN, INJURY_RISK_MAX))
        .unwrap_or_else(|| {
            let raw = 0.4 * (1.0 - consistency) + 0.3 * (1.0 - base.selection) + role_load(role);
            INJURY_RISK_MIN + (INJURY_RISK_MAX - INJURY_RISK_MIN) * unit(raw)
        });

    let venue_fit = supplied_unit(stats.venue_fit).unwrap_or_else(|| {
        let side = if ctx.is_home(&player.team) {
            0.55
        } else if ctx.opponent_of(&player.team).is_some() {
            0.40
        } else {
            0.45
        };
        unit(side + 0.25 * recent_form + affinity_jitter(&player.id, &ctx.venue))
    });

    let pitch_fit = supplied_unit(stats.pitch_fit).unwrap_or_else(|| {
        let label = format!("{:?}", ctx.pitch);
        unit(0.8 * pitch_affinity(role, ctx.pitch) + 0.2 * versatility + affinity_jitter(&player.id, &label))
    });

    let weather_fit = supplied_unit(stats.weather_fit)
        .unwrap_or_else(|| unit(0.85 * weather_affinity(role, ctx.weather) + 0.15 * consistency));

    let team_share = ctx.head_to_head_share(&player.team);

    let opposition_strength = supplied_unit(stats.opposition_strength)
        .unwrap_or_else(|| unit(team_share.map_or(NEUTRAL_SHARE, |share| 1.0 - share)));

    let head_to_head = supplied_unit(stats.head_to_head)
        .unwrap_or_else(|| unit(0.7 * team_share.unwrap_or(NEUTRAL_SHARE) + 0.3 * recent_form));

    let captaincy_aptitude = supplied_unit(stats.captaincy_aptitude).unwrap_or_else(|| {
        unit(0.4 * base.points + 0.3 * consistency + 0.2 * recent_form + 0.1 * role_captaincy(role))
    });

    let ownership_projection = supplied_unit(stats.ownership_projection)
        .unwrap_or_else(|| unit(0.7 * base.selection + 0.3 * base.dream_team));

    let price_efficiency = supplied_unit(stats.price_efficiency).unwrap_or_else(|| {
        if player.credits > 0.0 {
            unit(stats.season_points / player.credits / config.efficiency_scale)
        } else {
            0.0
        }
    });

    let upset_potential = supplied_unit(stats.upset_potential).unwrap_or_else(|| {
        unit(0.5 * (1.0 - ownership_projection) + 0.3 * recent_form + 0.2 * (1.0 - consistency))
    });

    AdvancedAttributes {
        recent_form,
        consistency,
        versatility,
        injury_risk,
        venue_fit,
        pitch_fit,
        weather_fit,
        opposition_strength,
        head_to_head,
        captaincy_aptitude,
        ownership_projection,
        price_efficiency,
        upset_potential,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xiforge_core::{HeadToHeadRecord, PlayerStats};

    fn ctx() -> MatchContext {
        MatchContext::new("Chepauk", "CSK", "MI")
    }

    fn player(role: Role, team: &str) -> Player {
        Player::new("p1", "Test", role, team, 9.0).with_stats(PlayerStats {
            season_points: 600.0,
            selection_rate: 70.0,
            dream_team_rate: 30.0,
            ..PlayerStats::default()
        })
    }

    #[test]
    fn supplied_values_pass_through_clamped() {
        let mut p = player(Role::Batter, "CSK");
        p.stats.recent_form = Some(0.42);
        p.stats.consistency = Some(1.7);
        p.stats.injury_risk = Some(25.0);
        let a = synthesize(&p, &ctx(), &ScoringConfig::default());
        assert!((a.recent_form - 0.42).abs() < 1e-12);
        assert!((a.consistency - 1.0).abs() < 1e-12);
        assert!((a.injury_risk - 10.0).abs() < 1e-12);
    }

    #[test]
    fn derived_values_are_in_range() {
        for role in Role::ALL {
            let a = synthesize(&player(role, "MI"), &ctx(), &ScoringConfig::default());
            for v in a.unit_scores() {
                assert!((0.0..=1.0).contains(&v), "{role}: {v} out of range");
            }
            assert!((INJURY_RISK_MIN..=INJURY_RISK_MAX).contains(&a.injury_risk));
        }
    }

    #[test]
    fn home_side_gets_better_venue_fit() {
        let config = ScoringConfig::default();
        let home = synthesize(&player(Role::Batter, "CSK"), &ctx(), &config);
        let away = synthesize(&player(Role::Batter, "MI"), &ctx(), &config);
        // Same id, so the jitter cancels; the side offset dominates.
        assert!(home.venue_fit > away.venue_fit);
    }

    #[test]
    fn head_to_head_drives_opposition_strength() {
        let mut c = ctx();
        c.head_to_head = vec![
            HeadToHeadRecord { winner: "MI".into() },
            HeadToHeadRecord { winner: "MI".into() },
            HeadToHeadRecord { winner: "MI".into() },
            HeadToHeadRecord { winner: "CSK".into() },
        ];
        let a = synthesize(&player(Role::Bowler, "CSK"), &c, &ScoringConfig::default());
        assert!((a.opposition_strength - 0.75).abs() < 1e-12);
        let neutral = synthesize(&player(Role::Bowler, "CSK"), &ctx(), &ScoringConfig::default());
        assert!((neutral.opposition_strength - 0.5).abs() < 1e-12);
    }

    #[test]
    fn green_pitch_favors_bowlers() {
        let mut c = ctx();
        c.pitch = PitchType::Green;
        assert!(pitch_affinity(Role::Bowler, c.pitch) > pitch_affinity(Role::Batter, c.pitch));
        c.pitch = PitchType::Flat;
        assert!(pitch_affinity(Role::Batter, c.pitch) > pitch_affinity(Role::Bowler, c.pitch));
    }

    #[test]
    fn jitter_is_stable_and_bounded() {
        let a = affinity_jitter("p1", "Chepauk");
        let b = affinity_jitter("p1", "Chepauk");
        assert_eq!(a, b);
        assert!(a.abs() <= AFFINITY_JITTER + 1e-12);
    }

    #[test]
    fn price_efficiency_uses_points_per_credit() {
        let p = player(Role::Batter, "CSK");
        let a = synthesize(&p, &ctx(), &ScoringConfig::default());
        // 600 points / 9 credits / 100 = 0.667
        assert!((a.price_efficiency - 600.0 / 9.0 / 100.0).abs() < 1e-9);
    }
}
