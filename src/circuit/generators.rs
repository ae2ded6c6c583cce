#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Synthetic instances for benchmarks and tests.

use crate::circuit::dimacs::Instance;
use itertools::Itertools;

/// `x1; x2 ∨ ¬x1; x3 ∨ ¬x2 ∨ ¬x1; ...`, each clause forcing the next
/// variable once all earlier ones are true.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn implication_chain(length: usize) -> Instance {
    Instance::from_clauses((1..=length as i32).map(|v| {
        std::iter::once(v).chain((1..v).rev().map(|u| -u)).collect_vec()
    }))
}

/// Uniform random k-SAT over `num_vars` variables, reproducible from `seed`.
/// Variables within a clause are distinct.
#[must_use]
pub fn random_ksat(num_vars: usize, num_clauses: usize, k: usize, seed: u64) -> Instance {
    let mut rng = fastrand::Rng::with_seed(seed);
    let k = k.min(num_vars);
    let clauses = (0..num_clauses)
        .map(|_| {
            let mut vars: Vec<i32> = Vec::with_capacity(k);
            while vars.len() < k {
                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                let v = rng.usize(1..=num_vars) as i32;
                if !vars.contains(&v) {
                    vars.push(v);
                }
            }
            vars.into_iter()
                .map(|v| if rng.bool() { v } else { -v })
                .collect_vec()
        })
        .collect_vec();
    let mut instance = Instance::from_clauses(clauses);
    instance.num_vars = instance.num_vars.max(num_vars);
    instance
}

/// `holes + 1` pigeons in `holes` holes. Always unsatisfiable.
///
/// Variable `p * holes + h + 1` means pigeon `p` sits in hole `h`.
#[must_use]
pub fn pigeonhole(holes: usize) -> Instance {
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let var = |pigeon: usize, hole: usize| (pigeon * holes + hole + 1) as i32;
    let pigeons = holes + 1;

    let somewhere = (0..pigeons).map(|p| (0..holes).map(|h| var(p, h)).collect_vec());
    let exclusive = (0..holes).flat_map(|h| {
        (0..pigeons)
            .tuple_combinations()
            .map(move |(a, b)| vec![-var(a, h), -var(b, h)])
    });
    Instance::from_clauses(somewhere.chain(exclusive).collect_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::dpll::SolveResult;
    use crate::circuit::simulation::Simulation;

    fn ints(instance: &Instance) -> Vec<Vec<i32>> {
        instance
            .clauses
            .iter()
            .map(|c| c.iter().map(|l| l.to_i32()).collect_vec())
            .collect_vec()
    }

    #[test]
    fn test_implication_chain() {
        let chain = implication_chain(4);
        assert_eq!(
            ints(&chain),
            vec![vec![1], vec![2, -1], vec![3, -2, -1], vec![4, -3, -2, -1]]
        );
    }

    #[test]
    fn test_random_ksat_is_reproducible() {
        let a = random_ksat(10, 20, 3, 7);
        let b = random_ksat(10, 20, 3, 7);
        assert_eq!(a, b);
        assert_eq!(a.clauses.len(), 20);
        assert_eq!(a.num_vars, 10);
        assert!(a.clauses.iter().all(|c| c.len() == 3));
        assert!(a.clauses.iter().flatten().all(|l| (1..=10).contains(&l.variable())));
    }

    #[test]
    fn test_pigeonhole_shape() {
        let php = pigeonhole(2);
        assert_eq!(php.num_vars, 6);
        // 3 "somewhere" clauses and 3 pairs per hole
        assert_eq!(php.clauses.len(), 3 + 2 * 3);
    }

    #[test]
    fn test_pigeonhole_is_unsat() {
        let mut sim = Simulation::from_instance(&pigeonhole(2), None).unwrap();
        assert_eq!(sim.run(1_000_000).unwrap().result, SolveResult::Unsat);
    }

    #[test]
    fn test_chain_simulates_without_conflicts() {
        let mut sim = Simulation::from_instance(&implication_chain(6), None).unwrap();
        let outcome = sim.run(1_000_000).unwrap();
        assert!(outcome.is_sat());
        assert_eq!(outcome.stats.implications, 6);
        assert_eq!(outcome.stats.conflicts, 0);
    }
}
