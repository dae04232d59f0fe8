// Selection, crossover, and mutation.

use rand::seq::SliceRandom;
use rand::Rng;

use super::population::{Draft, SearchSpace};

/// Sample `k` individuals uniformly and return the fittest. Ties go to the
/// lower population index.
pub(crate) fn tournament(scores: &[f64], k: usize, rng: &mut impl Rng) -> usize {
    let mut best = rng.gen_range(0..scores.len());
    for _ in 1..k.max(1) {
        let challenger = rng.gen_range(0..scores.len());
        let better = scores[challenger] > scores[best]
            || (scores[challenger] == scores[best] && challenger < best);
        if better {
            best = challenger;
        }
    }
    best
}

/// First half of parent A's slots, second half of parent B's, deduplicated
/// and then refilled from the search space. `None` if the child cannot be
/// completed.
pub(crate) fn crossover(
    a: &[usize],
    b: &[usize],
    space: &SearchSpace<'_>,
    rng: &mut impl Rng,
) -> Option<Vec<usize>> {
    let mut draft = space.seeded_draft();
    let half = a.len() / 2;
    let tail = b.get(half..).unwrap_or_default();
    for &idx in a[..half].iter().chain(tail) {
        if draft.can_add(space, idx) {
            draft.add(space, idx);
        }
    }
    draft.fill(space, rng).then(|| draft.into_members())
}

/// Replace each non-forced slot with probability `rate`. Replacements
/// prefer the same role and fall back to any admissible candidate; a slot
/// with no admissible replacement keeps its player.
pub(crate) fn mutate(
    individual: &[usize],
    space: &SearchSpace<'_>,
    rate: f64,
    rng: &mut impl Rng,
) -> Vec<usize> {
    let mut current = individual.to_vec();
    for slot in 0..current.len() {
        let removed = current[slot];
        if space.is_forced(removed) || rng.gen::<f64>() >= rate {
            continue;
        }
        let others = current
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != slot)
            .map(|(_, &idx)| idx);
        let draft = Draft::from_members(space, others);
        let role = space.pool[removed].player.role;

        let admissible = |idx: &usize| *idx != removed && draft.can_add(space, *idx);
        let same_role: Vec<usize> = space.by_role(role).iter().copied().filter(admissible).collect();
        let options = if same_role.is_empty() {
            space.candidates.iter().copied().filter(admissible).collect()
        } else {
            same_role
        };
        if let Some(&pick) = options.choose(rng) {
            current[slot] = pick;
        }
    }
    current.sort_unstable();
    current
}

#[cfg(test)]
mod tests {
    use super::super::population::random_individual;
    use super::*;
    use crate::test_support::{pool_with_shape, scored};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use xiforge_core::{RoleCounts, RosterConstraints};

    #[test]
    fn tournament_prefers_fitter() {
        let scores = [0.1, 0.9, 0.3, 0.5];
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut wins = [0usize; 4];
        for _ in 0..400 {
            wins[tournament(&scores, 3, &mut rng)] += 1;
        }
        assert!(wins[1] > wins[0]);
        assert!(wins[1] > wins[2]);
    }

    #[test]
    fn tournament_of_one_is_uniform_pick() {
        let scores = [0.5];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(tournament(&scores, 1, &mut rng), 0);
    }

    #[test]
    fn crossover_children_are_legal_and_complete() {
        let pool = scored(&pool_with_shape(RoleCounts::new(3, 7, 5, 7), 8.5));
        let constraints = RosterConstraints::default();
        let space = SearchSpace::new(&pool, &constraints, (0..pool.len()).collect(), &[]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..30 {
            let a = random_individual(&space, &mut rng).unwrap();
            let b = random_individual(&space, &mut rng).unwrap();
            let child = crossover(&a, &b, &space, &mut rng).unwrap();
            assert_eq!(child.len(), 11);
            assert!(space.is_legal(&child));
            assert!(a[..5].iter().all(|i| child.contains(i)));
        }
    }

    #[test]
    fn mutation_keeps_forced_and_legality() {
        let pool = scored(&pool_with_shape(RoleCounts::new(3, 7, 5, 7), 8.5));
        let constraints = RosterConstraints::default();
        let forced = vec![0, 3];
        let space = SearchSpace::new(&pool, &constraints, (0..pool.len()).collect(), &forced);
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        for _ in 0..30 {
            let ind = random_individual(&space, &mut rng).unwrap();
            let mutated = mutate(&ind, &space, 1.0, &mut rng);
            assert!(mutated.contains(&0) && mutated.contains(&3));
            assert!(space.is_legal(&mutated));
        }
    }

    #[test]
    fn zero_rate_is_identity() {
        let pool = scored(&pool_with_shape(RoleCounts::new(3, 7, 5, 7), 8.5));
        let constraints = RosterConstraints::default();
        let space = SearchSpace::new(&pool, &constraints, (0..pool.len()).collect(), &[]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let ind = random_individual(&space, &mut rng).unwrap();
        assert_eq!(mutate(&ind, &space, 0.0, &mut rng), ind);
    }
}
