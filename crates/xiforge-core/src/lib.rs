// Domain types shared by the lineup engine and its hosts: players, match
// context, roster constraints, requests, configuration, and pool loading.

pub mod config;
pub mod constraints;
pub mod context;
pub mod player;
pub mod pool;
pub mod request;

pub use constraints::{legal_shapes, Quota, RoleQuotas, RosterConstraints, COMMON_SHAPES};
pub use context::{HeadToHeadRecord, MatchContext, MatchFormat, PitchType, Weather};
pub use player::{Player, PlayerStats, Role, RoleCounts, RosterEntry, SQUAD_SIZE};
pub use request::{
    AttributeRange, GenerationMode, OptimizationRequest, RiskProfile, StatAttribute,
};
