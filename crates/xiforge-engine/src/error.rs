// Engine error types.

use std::fmt;
use thiserror::Error;
use xiforge_core::Role;

/// A role whose minimum quota the eligible pool cannot fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleShortfall {
    pub role: Role,
    pub required: usize,
    pub available: usize,
}

impl fmt::Display for RoleShortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (need {}, have {})",
            self.role.name(),
            self.required,
            self.available
        )
    }
}

fn join_shortfalls(shortfalls: &[RoleShortfall]) -> String {
    shortfalls
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// The eligible pool cannot fill every role's minimum quota.
    #[error("infeasible pool: {}", join_shortfalls(shortfalls))]
    InfeasiblePool { shortfalls: Vec<RoleShortfall> },

    /// Role minimums are available but no legal combination exists under
    /// the budget and team caps.
    #[error("no legal lineup exists: {reason}")]
    Unsatisfiable { reason: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown preset template '{0}'; known templates: {known}", known = crate::batch::preset_names().join(", "))]
    UnknownPreset(String),
}

impl EngineError {
    /// Roles named by an infeasibility error; empty for other variants.
    pub fn short_roles(&self) -> Vec<Role> {
        match self {
            EngineError::InfeasiblePool { shortfalls } => shortfalls.iter().map(|s| s.role).collect(),
            _ => Vec::new(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infeasible_message_names_roles() {
        let err = EngineError::InfeasiblePool {
            shortfalls: vec![RoleShortfall {
                role: Role::Keeper,
                required: 1,
                available: 0,
            }],
        };
        assert_eq!(err.to_string(), "infeasible pool: Keeper (need 1, have 0)");
        assert_eq!(err.short_roles(), vec![Role::Keeper]);
    }

    #[test]
    fn request_errors_name_no_roles() {
        assert!(EngineError::InvalidRequest("x".into()).short_roles().is_empty());
        let err = EngineError::UnknownPreset("moneyball".into());
        assert!(err.short_roles().is_empty());
        assert!(err.to_string().contains("moneyball"));
        assert!(err.to_string().contains("bowling-heavy"));
    }
}
