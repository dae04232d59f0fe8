// Search space, partial lineups, and population seeding.
//
// Individuals are sorted vectors of indices into the scored pool. A `Draft`
// tracks a partial lineup and only admits players that keep it completable:
// role maximums, team cap, budget with a per-slot reserve, and enough open
// slots left for every unmet role minimum.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use xiforge_core::{Role, RoleCounts, RosterConstraints, SQUAD_SIZE};

use crate::scoring::ScoredPlayer;
use crate::validator::{is_valid, CREDIT_EPSILON};

/// Candidate players and lookup tables for one optimizer run.
pub(crate) struct SearchSpace<'a> {
    pub pool: &'a [ScoredPlayer],
    pub constraints: &'a RosterConstraints,
    pub candidates: Vec<usize>,
    pub forced: Vec<usize>,
    by_role: [Vec<usize>; 4],
    /// Dense team index per pool entry, in order of first appearance.
    team_of: Vec<usize>,
    team_total: usize,
    /// Cheapest candidate; every open slot reserves at least this much.
    min_credit: f64,
}

impl<'a> SearchSpace<'a> {
    pub fn new(
        pool: &'a [ScoredPlayer],
        constraints: &'a RosterConstraints,
        mut candidates: Vec<usize>,
        forced: &[usize],
    ) -> Self {
        for &f in forced {
            if !candidates.contains(&f) {
                candidates.push(f);
            }
        }
        candidates.sort_unstable();

        let mut team_ids: HashMap<&str, usize> = HashMap::new();
        let team_of: Vec<usize> = pool
            .iter()
            .map(|sp| {
                let next = team_ids.len();
                *team_ids.entry(sp.player.team.as_str()).or_insert(next)
            })
            .collect();

        let mut by_role: [Vec<usize>; 4] = Default::default();
        for &i in &candidates {
            by_role[pool[i].player.role.index()].push(i);
        }

        let min_credit = candidates
            .iter()
            .map(|&i| pool[i].player.credits)
            .fold(f64::INFINITY, f64::min);

        SearchSpace {
            pool,
            constraints,
            candidates,
            forced: forced.to_vec(),
            by_role,
            team_total: team_ids.len(),
            team_of,
            min_credit: if min_credit.is_finite() { min_credit } else { 0.0 },
        }
    }

    pub fn by_role(&self, role: Role) -> &[usize] {
        &self.by_role[role.index()]
    }

    pub fn is_forced(&self, idx: usize) -> bool {
        self.forced.contains(&idx)
    }

    pub fn players(&self, members: &[usize]) -> Vec<&'a ScoredPlayer> {
        members.iter().map(|&i| &self.pool[i]).collect()
    }

    pub fn is_legal(&self, members: &[usize]) -> bool {
        is_valid(&self.players(members), self.constraints)
    }

    /// Empty draft with every forced player already placed.
    pub fn seeded_draft(&self) -> Draft {
        let mut draft = Draft::new(self);
        for &f in &self.forced {
            if draft.can_add(self, f) {
                draft.add(self, f);
            }
        }
        draft
    }
}

// ---------------------------------------------------------------------------
// Partial lineups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub(crate) struct Draft {
    members: Vec<usize>,
    roles: RoleCounts,
    team_counts: Vec<usize>,
    credits: f64,
}

impl Draft {
    pub fn new(space: &SearchSpace<'_>) -> Self {
        Draft {
            members: Vec::with_capacity(SQUAD_SIZE),
            roles: RoleCounts::default(),
            team_counts: vec![0; space.team_total],
            credits: 0.0,
        }
    }

    /// Draft holding exactly `members`, without feasibility checks.
    pub fn from_members(space: &SearchSpace<'_>, members: impl IntoIterator<Item = usize>) -> Self {
        let mut draft = Draft::new(space);
        for i in members {
            draft.add(space, i);
        }
        draft
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= SQUAD_SIZE
    }

    pub fn role_count(&self, role: Role) -> usize {
        self.roles.get(role)
    }

    pub fn can_add(&self, space: &SearchSpace<'_>, idx: usize) -> bool {
        if self.is_full() || self.members.contains(&idx) {
            return false;
        }
        let player = &space.pool[idx].player;
        let constraints = space.constraints;
        if self.roles.get(player.role) >= constraints.quota(player.role).max {
            return false;
        }
        if self.team_counts[space.team_of[idx]] >= constraints.max_per_team {
            return false;
        }

        let open_after = SQUAD_SIZE - self.members.len() - 1;
        let reserve = open_after as f64 * space.min_credit;
        if self.credits + player.credits + reserve > constraints.salary_cap + CREDIT_EPSILON {
            return false;
        }

        let outstanding: usize = Role::ALL
            .iter()
            .map(|&r| {
                let have = self.roles.get(r) + usize::from(r == player.role);
                constraints.quota(r).min.saturating_sub(have)
            })
            .sum();
        outstanding <= open_after
    }

    pub fn add(&mut self, space: &SearchSpace<'_>, idx: usize) {
        let player = &space.pool[idx].player;
        self.members.push(idx);
        self.roles.increment(player.role);
        self.team_counts[space.team_of[idx]] += 1;
        self.credits += player.credits;
    }

    /// Complete the draft: unmet role minimums first, then any role.
    /// Returns false when no admissible player remains for an open slot.
    pub fn fill(&mut self, space: &SearchSpace<'_>, rng: &mut impl Rng) -> bool {
        for role in Role::ALL {
            while self.roles.get(role) < space.constraints.quota(role).min {
                let options: Vec<usize> = space
                    .by_role(role)
                    .iter()
                    .copied()
                    .filter(|&i| self.can_add(space, i))
                    .collect();
                match options.choose(rng) {
                    Some(&pick) => self.add(space, pick),
                    None => return false,
                }
            }
        }
        while !self.is_full() {
            let options: Vec<usize> = space
                .candidates
                .iter()
                .copied()
                .filter(|&i| self.can_add(space, i))
                .collect();
            match options.choose(rng) {
                Some(&pick) => self.add(space, pick),
                None => return false,
            }
        }
        true
    }

    pub fn into_members(mut self) -> Vec<usize> {
        self.members.sort_unstable();
        self.members
    }
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

pub(crate) fn random_individual(space: &SearchSpace<'_>, rng: &mut impl Rng) -> Option<Vec<usize>> {
    let mut draft = space.seeded_draft();
    if !draft.fill(space, rng) {
        return None;
    }
    let members = draft.into_members();
    space.is_legal(&members).then_some(members)
}

/// Build up to `size` legal individuals, preferring distinct ones. Returns an
/// empty population when no legal individual was found within the attempt
/// budget; otherwise duplicates pad the population to `size`.
pub(crate) fn init_population(
    space: &SearchSpace<'_>,
    size: usize,
    attempts_per_individual: usize,
    rng: &mut impl Rng,
) -> Vec<Vec<usize>> {
    let size = size.max(1);
    let budget = size * attempts_per_individual.max(1);
    let mut population: Vec<Vec<usize>> = Vec::with_capacity(size);
    let mut seen: HashSet<Vec<usize>> = HashSet::new();

    for _ in 0..budget {
        if population.len() >= size {
            break;
        }
        if let Some(individual) = random_individual(space, rng) {
            if seen.insert(individual.clone()) {
                population.push(individual);
            }
        }
    }

    if population.is_empty() {
        return population;
    }
    let distinct = population.len();
    let mut i = 0;
    while population.len() < size {
        let copy = population[i % distinct].clone();
        population.push(copy);
        i += 1;
    }
    population
}

/// Split requested forced players into those that can all sit in one lineup
/// together and those that cannot, keeping request order.
pub(crate) fn admit_forced(
    pool: &[ScoredPlayer],
    constraints: &RosterConstraints,
    forced: &[usize],
) -> (Vec<usize>, Vec<usize>) {
    let space = SearchSpace::new(pool, constraints, (0..pool.len()).collect(), &[]);
    let mut draft = Draft::new(&space);
    let mut kept = Vec::new();
    let mut dropped = Vec::new();
    for &f in forced {
        if draft.can_add(&space, f) {
            draft.add(&space, f);
            kept.push(f);
        } else {
            dropped.push(f);
        }
    }
    (kept, dropped)
}
