// Feature vector shared by every predictor.

use xiforge_core::Role;

use super::attributes::{AdvancedAttributes, BaseRates};

pub const FEATURE_COUNT: usize = 11;

/// Inputs to the predictors. All values are in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub role: Role,
    pub form: f64,
    pub consistency: f64,
    pub versatility: f64,
    pub venue: f64,
    pub pitch: f64,
    pub weather: f64,
    /// Strength of the opponent; higher is harder.
    pub opposition: f64,
    pub head_to_head: f64,
    /// Season points on the configured scale.
    pub points: f64,
    /// Points per credit on the configured scale.
    pub efficiency: f64,
    /// Injury risk rescaled onto [0, 1].
    pub injury: f64,
}

impl FeatureVector {
    pub fn new(role: Role, base: &BaseRates, attrs: &AdvancedAttributes) -> Self {
        FeatureVector {
            role,
            form: attrs.recent_form,
            consistency: attrs.consistency,
            versatility: attrs.versatility,
            venue: attrs.venue_fit,
            pitch: attrs.pitch_fit,
            weather: attrs.weather_fit,
            opposition: attrs.opposition_strength,
            head_to_head: attrs.head_to_head,
            points: base.points,
            efficiency: attrs.price_efficiency,
            injury: attrs.injury_norm(),
        }
    }

    /// Features flipped where needed so that higher always means better.
    pub fn oriented(&self) -> [f64; FEATURE_COUNT] {
        [
            self.form,
            self.consistency,
            self.versatility,
            self.venue,
            self.pitch,
            self.weather,
            1.0 - self.opposition,
            self.head_to_head,
            self.points,
            self.efficiency,
            1.0 - self.injury,
        ]
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::uniform;
    use super::*;

    #[test]
    fn oriented_flips_risk_features() {
        let f = uniform(Role::Batter, 0.8);
        for v in f.oriented() {
            assert!((v - 0.8).abs() < 1e-12);
        }
    }
}
