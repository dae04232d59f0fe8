// Player scoring model.
//
// Turns raw players plus match context into `ScoredPlayer`s: synthesized
// advanced attributes, an ensemble points prediction, and confidence and
// volatility estimates. Scoring is pure; the same inputs always produce the
// same output.

pub mod attributes;
pub mod ensemble;
pub mod features;
pub mod predictors;

use serde::Serialize;
use xiforge_core::config::ScoringConfig;
use xiforge_core::{MatchContext, Player, Role, RosterEntry, StatAttribute};

use attributes::{synthesize, unit, AdvancedAttributes, BaseRates};
use ensemble::{ComponentEstimate, EnsemblePredictor, MAX_PREDICTED_POINTS};
use features::FeatureVector;

// ---------------------------------------------------------------------------
// Scored player
// ---------------------------------------------------------------------------

/// A player with every derived signal attached. Never mutated after
/// creation; adjustments produce a new value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPlayer {
    pub player: Player,
    /// Ensemble prediction on the 0-100 scale.
    pub predicted_points: f64,
    pub confidence: f64,
    pub volatility: f64,
    pub attributes: AdvancedAttributes,
    pub components: Vec<ComponentEstimate>,
}

impl ScoredPlayer {
    pub fn id(&self) -> &str {
        &self.player.id
    }

    pub fn name(&self) -> &str {
        &self.player.name
    }

    /// Look up any scored attribute by name, for statistical filters.
    pub fn attribute(&self, attribute: StatAttribute) -> f64 {
        let a = &self.attributes;
        let s = &self.player.stats;
        match attribute {
            StatAttribute::PredictedPoints => self.predicted_points,
            StatAttribute::Confidence => self.confidence,
            StatAttribute::Volatility => self.volatility,
            StatAttribute::Credits => self.player.credits,
            StatAttribute::SeasonPoints => s.season_points,
            StatAttribute::SelectionRate => s.selection_rate,
            StatAttribute::DreamTeamRate => s.dream_team_rate,
            StatAttribute::RecentForm => a.recent_form,
            StatAttribute::Consistency => a.consistency,
            StatAttribute::Versatility => a.versatility,
            StatAttribute::InjuryRisk => a.injury_risk,
            StatAttribute::VenueFit => a.venue_fit,
            StatAttribute::PitchFit => a.pitch_fit,
            StatAttribute::WeatherFit => a.weather_fit,
            StatAttribute::OppositionStrength => a.opposition_strength,
            StatAttribute::HeadToHead => a.head_to_head,
            StatAttribute::CaptaincyAptitude => a.captaincy_aptitude,
            StatAttribute::OwnershipProjection => a.ownership_projection,
            StatAttribute::PriceEfficiency => a.price_efficiency,
            StatAttribute::UpsetPotential => a.upset_potential,
        }
    }

    /// A copy with predicted points scaled by `factor`, clamped to the
    /// points scale.
    pub fn with_points_bias(&self, factor: f64) -> ScoredPlayer {
        let mut biased = self.clone();
        let scaled = self.predicted_points * factor;
        biased.predicted_points = if scaled.is_finite() {
            scaled.clamp(0.0, MAX_PREDICTED_POINTS)
        } else {
            self.predicted_points
        };
        biased
    }
}

impl RosterEntry for ScoredPlayer {
    fn id(&self) -> &str {
        &self.player.id
    }
    fn role(&self) -> Role {
        self.player.role
    }
    fn team(&self) -> &str {
        &self.player.team
    }
    fn credits(&self) -> f64 {
        self.player.credits
    }
}

// ---------------------------------------------------------------------------
// Confidence and volatility
// ---------------------------------------------------------------------------

pub fn confidence_of(attrs: &AdvancedAttributes) -> f64 {
    unit(
        0.35 * attrs.consistency
            + 0.25 * attrs.recent_form
            + 0.20 * attrs.versatility
            + 0.20 * (1.0 - attrs.injury_norm()),
    )
}

pub fn volatility_of(attrs: &AdvancedAttributes, ctx: &MatchContext) -> f64 {
    unit(
        0.40 * (1.0 - attrs.consistency)
            + 0.30 * (1.0 - attrs.recent_form)
            + 0.30 * attrs.injury_norm()
            + ctx.format.volatility_shift(),
    )
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Constructible scoring service. Holds only immutable configuration and
/// the predictor ensemble, so one instance can score any number of pools.
#[derive(Debug)]
pub struct ScoringModel {
    config: ScoringConfig,
    ensemble: EnsemblePredictor,
}

impl ScoringModel {
    pub fn new(config: &ScoringConfig) -> Self {
        ScoringModel {
            ensemble: EnsemblePredictor::standard(config),
            config: config.clone(),
        }
    }

    /// Replace the standard ensemble, e.g. with a trained predictor.
    pub fn with_ensemble(mut self, ensemble: EnsemblePredictor) -> Self {
        self.ensemble = ensemble;
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, players: &[Player], ctx: &MatchContext) -> Vec<ScoredPlayer> {
        players.iter().map(|p| self.score_player(p, ctx)).collect()
    }

    pub fn score_player(&self, player: &Player, ctx: &MatchContext) -> ScoredPlayer {
        let attributes = synthesize(player, ctx, &self.config);
        let base = BaseRates::of(player, &self.config);
        let features = FeatureVector::new(player.role, &base, &attributes);
        let confidence = confidence_of(&attributes);
        let volatility = volatility_of(&attributes, ctx);
        let output = self.ensemble.predict(&features, confidence);

        ScoredPlayer {
            player: player.clone(),
            predicted_points: output.points,
            confidence,
            volatility,
            attributes,
            components: output.components,
        }
    }
}
