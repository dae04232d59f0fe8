// Roster legality rules: role quotas, salary cap, per-team cap.

use serde::{Deserialize, Serialize};

use crate::player::{Role, RoleCounts, SQUAD_SIZE};

/// Inclusive `[min, max]` bound on the number of players of one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    pub min: usize,
    pub max: usize,
}

impl Quota {
    pub const fn new(min: usize, max: usize) -> Self {
        Quota { min, max }
    }

    pub fn contains(&self, count: usize) -> bool {
        count >= self.min && count <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleQuotas {
    pub keeper: Quota,
    pub batter: Quota,
    pub all_rounder: Quota,
    pub bowler: Quota,
}

impl RoleQuotas {
    pub fn get(&self, role: Role) -> Quota {
        match role {
            Role::Keeper => self.keeper,
            Role::Batter => self.batter,
            Role::AllRounder => self.all_rounder,
            Role::Bowler => self.bowler,
        }
    }

    fn get_mut(&mut self, role: Role) -> &mut Quota {
        match role {
            Role::Keeper => &mut self.keeper,
            Role::Batter => &mut self.batter,
            Role::AllRounder => &mut self.all_rounder,
            Role::Bowler => &mut self.bowler,
        }
    }
}

impl Default for RoleQuotas {
    fn default() -> Self {
        RoleQuotas {
            keeper: Quota::new(1, 4),
            batter: Quota::new(3, 6),
            all_rounder: Quota::new(1, 4),
            bowler: Quota::new(3, 6),
        }
    }
}

/// Named, versioned roster configuration. Squad size is fixed at
/// [`SQUAD_SIZE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterConstraints {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub salary_cap: f64,
    pub max_per_team: usize,
    pub roles: RoleQuotas,
}

fn default_version() -> u32 {
    1
}

impl Default for RosterConstraints {
    fn default() -> Self {
        RosterConstraints {
            name: "standard-t20".into(),
            version: 1,
            salary_cap: 100.0,
            max_per_team: 7,
            roles: RoleQuotas::default(),
        }
    }
}

/// Budget utilization above which the validator emits a warning.
pub const HIGH_UTILIZATION_WARNING: f64 = 0.95;

impl RosterConstraints {
    pub fn quota(&self, role: Role) -> Quota {
        self.roles.get(role)
    }

    pub fn min_total(&self) -> usize {
        Role::ALL.iter().map(|r| self.quota(*r).min).sum()
    }

    pub fn max_total(&self) -> usize {
        Role::ALL.iter().map(|r| self.quota(*r).max).sum()
    }

    /// Whether a role histogram is within every quota and sums to the squad size.
    pub fn admits_shape(&self, shape: &RoleCounts) -> bool {
        shape.total() == SQUAD_SIZE && Role::ALL.iter().all(|r| self.quota(*r).contains(shape.get(*r)))
    }

    /// Copy of these constraints with every role pinned to the given shape.
    ///
    /// Returns `None` if the shape is not itself legal under these constraints.
    pub fn pinned_to(&self, shape: &RoleCounts) -> Option<RosterConstraints> {
        if !self.admits_shape(shape) {
            return None;
        }
        let mut pinned = self.clone();
        for role in Role::ALL {
            let count = shape.get(role);
            *pinned.roles.get_mut(role) = Quota::new(count, count);
        }
        pinned.name = format!("{}@{}", self.name, shape);
        Some(pinned)
    }
}

// ---------------------------------------------------------------------------
// Shape catalog
// ---------------------------------------------------------------------------

/// Well-known role shapes, used as composition templates.
pub const COMMON_SHAPES: &[RoleCounts] = &[
    RoleCounts::new(1, 4, 2, 4),
    RoleCounts::new(1, 3, 3, 4),
    RoleCounts::new(2, 4, 1, 4),
    RoleCounts::new(1, 5, 1, 4),
    RoleCounts::new(1, 3, 2, 5),
    RoleCounts::new(1, 4, 1, 5),
    RoleCounts::new(1, 3, 4, 3),
    RoleCounts::new(2, 3, 2, 4),
    RoleCounts::new(1, 4, 3, 3),
    RoleCounts::new(2, 3, 3, 3),
];

/// Enumerate every role shape summing to the squad size within the quotas,
/// ordered keeper-major.
pub fn legal_shapes(constraints: &RosterConstraints) -> Vec<RoleCounts> {
    let wk = constraints.quota(Role::Keeper);
    let bat = constraints.quota(Role::Batter);
    let ar = constraints.quota(Role::AllRounder);
    let bowl = constraints.quota(Role::Bowler);

    let mut shapes = Vec::new();
    for k in wk.min..=wk.max {
        for b in bat.min..=bat.max {
            for a in ar.min..=ar.max {
                let used = k + b + a;
                if used > SQUAD_SIZE {
                    continue;
                }
                let w = SQUAD_SIZE - used;
                if bowl.contains(w) {
                    shapes.push(RoleCounts::new(k, b, a, w));
                }
            }
        }
    }
    shapes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_constraints_admit_common_shapes() {
        let c = RosterConstraints::default();
        for shape in COMMON_SHAPES {
            assert!(c.admits_shape(shape), "shape {shape} should be legal");
        }
    }

    #[test]
    fn legal_shapes_all_sum_to_squad_size() {
        let c = RosterConstraints::default();
        let shapes = legal_shapes(&c);
        assert!(!shapes.is_empty());
        for shape in &shapes {
            assert_eq!(shape.total(), SQUAD_SIZE);
            assert!(c.admits_shape(shape));
        }
        assert!(shapes.contains(&RoleCounts::new(1, 4, 2, 4)));
        assert!(shapes.contains(&RoleCounts::new(2, 4, 1, 4)));
    }

    #[test]
    fn legal_shapes_respects_tight_bounds() {
        let mut c = RosterConstraints::default();
        c.roles.keeper = Quota::new(1, 1);
        c.roles.all_rounder = Quota::new(2, 2);
        let shapes = legal_shapes(&c);
        assert!(shapes.iter().all(|s| s.keeper == 1 && s.all_rounder == 2));
        // batter + bowler = 8 with each in [3, 6]: (3,5), (4,4), (5,3)
        assert_eq!(shapes.len(), 3);
    }

    #[test]
    fn rejects_wrong_total() {
        let c = RosterConstraints::default();
        assert!(!c.admits_shape(&RoleCounts::new(1, 4, 2, 3)));
        assert!(!c.admits_shape(&RoleCounts::new(0, 5, 2, 4)));
    }

    #[test]
    fn pinned_constraints_fix_every_role() {
        let c = RosterConstraints::default();
        let shape = RoleCounts::new(1, 3, 2, 5);
        let pinned = c.pinned_to(&shape).unwrap();
        assert_eq!(pinned.quota(Role::Bowler), Quota::new(5, 5));
        assert_eq!(pinned.quota(Role::Keeper), Quota::new(1, 1));
        assert_eq!(legal_shapes(&pinned), vec![shape]);
        assert!(c.pinned_to(&RoleCounts::new(5, 2, 2, 2)).is_none());
    }

    #[test]
    fn min_and_max_totals() {
        let c = RosterConstraints::default();
        assert_eq!(c.min_total(), 8);
        assert_eq!(c.max_total(), 20);
    }
}
