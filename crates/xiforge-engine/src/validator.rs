// Roster legality checks.
//
// Pure functions over anything implementing `RosterEntry`. Used to reject
// candidates during search and to gate every lineup handed to a caller.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;
use xiforge_core::constraints::HIGH_UTILIZATION_WARNING;
use xiforge_core::{Role, RoleCounts, RosterConstraints, RosterEntry, SQUAD_SIZE};

use crate::error::RoleShortfall;

/// Float slack when comparing credit totals against the cap.
pub const CREDIT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Violation {
    SquadSize { expected: usize, actual: usize },
    DuplicatePlayer { id: String },
    RoleBelowMin { role: Role, min: usize, actual: usize },
    RoleAboveMax { role: Role, max: usize, actual: usize },
    OverCap { total: f64, cap: f64 },
    TeamOverLimit { team: String, count: usize, max: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::SquadSize { expected, actual } => {
                write!(f, "squad has {actual} players, expected {expected}")
            }
            Violation::DuplicatePlayer { id } => write!(f, "player '{id}' selected twice"),
            Violation::RoleBelowMin { role, min, actual } => {
                write!(f, "{} count {actual} below minimum {min}", role.name())
            }
            Violation::RoleAboveMax { role, max, actual } => {
                write!(f, "{} count {actual} above maximum {max}", role.name())
            }
            Violation::OverCap { total, cap } => {
                write!(f, "total credits {total:.1} exceed cap {cap:.1}")
            }
            Violation::TeamOverLimit { team, count, max } => {
                write!(f, "{count} players from {team}, limit is {max}")
            }
        }
    }
}

/// Outcome of a validation pass. Warnings never make a lineup illegal.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Validation {
    pub violations: Vec<Violation>,
    pub warnings: Vec<String>,
}

impl Validation {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations rendered as strings.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.to_string()).collect()
    }
}

/// Check a candidate lineup. Checks run in order: squad size, duplicate ids,
/// role quotas, salary cap (with a high-utilization warning), team cap.
pub fn validate<P: RosterEntry>(players: &[P], constraints: &RosterConstraints) -> Validation {
    let mut report = Validation::default();

    if players.len() != SQUAD_SIZE {
        report.violations.push(Violation::SquadSize {
            expected: SQUAD_SIZE,
            actual: players.len(),
        });
    }

    let mut seen = HashSet::new();
    for p in players {
        if !seen.insert(p.id()) {
            report.violations.push(Violation::DuplicatePlayer { id: p.id().to_string() });
        }
    }

    let counts = role_histogram(players);
    for role in Role::ALL {
        let quota = constraints.quota(role);
        let actual = counts.get(role);
        if actual < quota.min {
            report.violations.push(Violation::RoleBelowMin {
                role,
                min: quota.min,
                actual,
            });
        } else if actual > quota.max {
            report.violations.push(Violation::RoleAboveMax {
                role,
                max: quota.max,
                actual,
            });
        }
    }

    let total: f64 = players.iter().map(|p| p.credits()).sum();
    if total > constraints.salary_cap + CREDIT_EPSILON {
        report.violations.push(Violation::OverCap {
            total,
            cap: constraints.salary_cap,
        });
    } else if constraints.salary_cap > 0.0 && total / constraints.salary_cap > HIGH_UTILIZATION_WARNING {
        report.warnings.push(format!(
            "budget utilization {:.1}% above {:.0}%",
            100.0 * total / constraints.salary_cap,
            100.0 * HIGH_UTILIZATION_WARNING
        ));
    }

    let mut per_team: BTreeMap<&str, usize> = BTreeMap::new();
    for p in players {
        *per_team.entry(p.team()).or_insert(0) += 1;
    }
    for (team, count) in per_team {
        if count > constraints.max_per_team {
            report.violations.push(Violation::TeamOverLimit {
                team: team.to_string(),
                count,
                max: constraints.max_per_team,
            });
        }
    }

    report
}

pub fn is_valid<P: RosterEntry>(players: &[P], constraints: &RosterConstraints) -> bool {
    validate(players, constraints).is_ok()
}

pub fn role_histogram<P: RosterEntry>(players: &[P]) -> RoleCounts {
    RoleCounts::from_entries(players)
}

/// Roles whose minimum quota a pool cannot meet.
pub fn role_shortfalls<P: RosterEntry>(pool: &[P], constraints: &RosterConstraints) -> Vec<RoleShortfall> {
    let counts = role_histogram(pool);
    Role::ALL
        .iter()
        .filter_map(|&role| {
            let required = constraints.quota(role).min;
            let available = counts.get(role);
            (available < required).then_some(RoleShortfall {
                role,
                required,
                available,
            })
        })
        .collect()
}

/// Whether the role mix of a pool can fill a squad at all: every minimum is
/// met and the capped role counts reach the squad size. Ignores budget and
/// team caps.
pub fn can_fill_roles<P: RosterEntry>(pool: &[P], constraints: &RosterConstraints) -> bool {
    let counts = role_histogram(pool);
    let fillable: usize = Role::ALL
        .iter()
        .map(|&r| counts.get(r).min(constraints.quota(r).max))
        .sum();
    pool.len() >= SQUAD_SIZE && role_shortfalls(pool, constraints).is_empty() && fillable >= SQUAD_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use xiforge_core::Player;

    fn squad(shape: RoleCounts, credits: f64) -> Vec<Player> {
        let mut players = Vec::new();
        for role in Role::ALL {
            for i in 0..shape.get(role) {
                let team = if players.len() % 2 == 0 { "A" } else { "B" };
                players.push(Player::new(&format!("{role}{i}"), "P", role, team, credits));
            }
        }
        players
    }

    #[test]
    fn legal_squad_passes() {
        let v = validate(&squad(RoleCounts::new(1, 4, 2, 4), 8.0), &RosterConstraints::default());
        assert!(v.is_ok(), "{:?}", v.messages());
        assert!(v.warnings.is_empty());
    }

    #[test]
    fn wrong_size_is_reported() {
        let v = validate(&squad(RoleCounts::new(1, 4, 2, 3), 8.0), &RosterConstraints::default());
        assert!(v.violations.contains(&Violation::SquadSize {
            expected: 11,
            actual: 10
        }));
    }

    #[test]
    fn role_bounds_are_checked() {
        let v = validate(&squad(RoleCounts::new(0, 5, 2, 4), 8.0), &RosterConstraints::default());
        assert!(v.violations.contains(&Violation::RoleBelowMin {
            role: Role::Keeper,
            min: 1,
            actual: 0
        }));
        let v = validate(&squad(RoleCounts::new(1, 7, 1, 2), 8.0), &RosterConstraints::default());
        assert!(v.violations.iter().any(|x| matches!(x, Violation::RoleAboveMax { role: Role::Batter, .. })));
    }

    #[test]
    fn over_cap_fails_and_near_cap_warns() {
        let c = RosterConstraints::default();
        let v = validate(&squad(RoleCounts::new(1, 4, 2, 4), 9.5), &c);
        assert!(v.violations.iter().any(|x| matches!(x, Violation::OverCap { .. })));
        // 11 * 8.9 = 97.9, within cap but above 95%
        let v = validate(&squad(RoleCounts::new(1, 4, 2, 4), 8.9), &c);
        assert!(v.is_ok());
        assert_eq!(v.warnings.len(), 1);
    }

    #[test]
    fn team_cap_is_checked() {
        let mut players = squad(RoleCounts::new(1, 4, 2, 4), 8.0);
        for p in &mut players {
            p.team = "A".into();
        }
        let v = validate(&players, &RosterConstraints::default());
        assert_eq!(
            v.violations,
            vec![Violation::TeamOverLimit {
                team: "A".into(),
                count: 11,
                max: 7
            }]
        );
    }

    #[test]
    fn duplicates_are_reported() {
        let mut players = squad(RoleCounts::new(1, 4, 2, 4), 8.0);
        players[1] = players[2].clone();
        let v = validate(&players, &RosterConstraints::default());
        assert!(v.violations.iter().any(|x| matches!(x, Violation::DuplicatePlayer { .. })));
    }

    #[test]
    fn shortfalls_name_missing_roles() {
        let pool = squad(RoleCounts::new(0, 6, 4, 6), 8.0);
        let shortfalls = role_shortfalls(&pool, &RosterConstraints::default());
        assert_eq!(shortfalls.len(), 1);
        assert_eq!(shortfalls[0].role, Role::Keeper);
        assert!(!can_fill_roles(&pool, &RosterConstraints::default()));
    }

    #[test]
    fn role_mix_capacity() {
        let mut c = RosterConstraints::default();
        assert!(can_fill_roles(&squad(RoleCounts::new(1, 4, 2, 4), 8.0), &c));
        // Nine bowlers capped at four leave too few fillable slots.
        c.roles.bowler = xiforge_core::Quota::new(3, 4);
        assert!(!can_fill_roles(&squad(RoleCounts::new(1, 3, 1, 9), 8.0), &c));
    }
}
