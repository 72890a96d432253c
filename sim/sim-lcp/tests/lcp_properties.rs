//! Property-based tests for the box LCP solver.
//!
//! Random symmetric positive definite systems with mixed bound kinds are
//! solved with every algorithm/Schur combination and checked against the
//! defining complementarity conditions.
//!
//! Run with: cargo test -p sim-lcp -- proptest

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use nalgebra::{DMatrix, DVector};
use proptest::prelude::*;
use sim_lcp::{
    LcpAlgorithm, LcpError, LcpSolution, LcpSolverConfig, MatrixPermutation, VariableState,
    solve_lcp, verify_lcp,
};

#[derive(Debug, Clone)]
struct Problem {
    a: DMatrix<f64>,
    b: DVector<f64>,
    lo: DVector<f64>,
    hi: DVector<f64>,
}

// =============================================================================
// Strategies
// =============================================================================

/// Bounds for one variable, always straddling zero.
fn arb_bounds() -> impl Strategy<Value = (f64, f64)> {
    (0..6u8, 0.1..3.0f64).prop_map(|(kind, c)| match kind {
        0 => (0.0, f64::INFINITY),
        1 => (-c, c),
        2 => (f64::NEG_INFINITY, f64::INFINITY),
        3 => (0.0, 0.0),
        4 => (f64::NEG_INFINITY, c),
        _ => (-f64::MAX, f64::MAX),
    })
}

/// `A = M Mᵀ + n I` is symmetric positive definite and well conditioned.
fn arb_problem(max_n: usize) -> impl Strategy<Value = Problem> {
    (1..=max_n).prop_flat_map(|n| {
        (
            prop::collection::vec(-1.0..1.0f64, n * n),
            prop::collection::vec(-5.0..5.0f64, n),
            prop::collection::vec(arb_bounds(), n),
        )
            .prop_map(move |(m, b, bounds)| {
                let m = DMatrix::from_vec(n, n, m);
                let a = &m * m.transpose() + DMatrix::identity(n, n) * n as f64;
                Problem {
                    a,
                    b: DVector::from_vec(b),
                    lo: DVector::from_iterator(n, bounds.iter().map(|(lo, _)| *lo)),
                    hi: DVector::from_iterator(n, bounds.iter().map(|(_, hi)| *hi)),
                }
            })
    })
}

/// A matrix size and a sequence of swaps within it.
fn arb_swaps() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1..10usize).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec((0..n, 0..n), 0..20),
        )
    })
}

fn solve_with(problem: &Problem, algorithm: LcpAlgorithm, schur: bool) -> LcpSolution {
    let config = LcpSolverConfig::default()
        .with_algorithm(algorithm)
        .with_schur_complement(schur)
        .with_max_iterations(10_000);
    solve_lcp(&config, problem.a.clone(), &problem.b, &problem.lo, &problem.hi).unwrap()
}

const VARIANTS: [(LcpAlgorithm, bool); 4] = [
    (LcpAlgorithm::Murty, false),
    (LcpAlgorithm::Murty, true),
    (LcpAlgorithm::CottleDantzig, false),
    (LcpAlgorithm::CottleDantzig, true),
];

// =============================================================================
// Property Tests: Matrix Permutation
// =============================================================================

proptest! {
    /// `perm` and `iperm` stay mutual inverses after any swaps.
    #[test]
    fn permutation_stays_consistent((n, swaps) in arb_swaps()) {
        let mut perm = MatrixPermutation::new(DMatrix::identity(n, n));
        for (i, j) in swaps {
            perm.swap_rows_and_columns(i, j);
        }
        prop_assert!(perm.is_consistent());
        for k in 0..n {
            prop_assert_eq!(perm.permuted_index_of(perm.original_index_of(k)), k);
        }
    }

    /// Permuting then unpermuting a vector is lossless.
    #[test]
    fn permute_unpermute_roundtrip((n, swaps) in arb_swaps()) {
        let mut perm = MatrixPermutation::new(DMatrix::identity(n, n));
        for (i, j) in swaps {
            perm.swap_rows_and_columns(i, j);
        }
        let v = DVector::from_fn(n, |i, _| i as f64 * 1.5 - 2.0);
        prop_assert_eq!(perm.unpermute(&perm.permute(&v)), v);
    }

    /// The permuted matrix is `P A Pᵀ` entry for entry.
    #[test]
    fn permuted_matrix_matches_index_maps((n, swaps) in arb_swaps()) {
        let original = DMatrix::from_fn(n, n, |i, j| (i * n + j) as f64);
        let mut perm = MatrixPermutation::new(original.clone());
        for (i, j) in swaps {
            perm.swap_rows_and_columns(i, j);
        }
        for p in 0..n {
            for q in 0..n {
                let (i, j) = (perm.original_index_of(p), perm.original_index_of(q));
                prop_assert_eq!(perm.matrix()[(p, q)], original[(i, j)]);
            }
        }
    }

    /// Scattering from `start` only writes the slots at or after `start`.
    #[test]
    fn unpermute_from_writes_suffix_only(
        (n, swaps) in arb_swaps(),
        start_seed in 0..10usize,
    ) {
        let start = start_seed % (n + 1);
        let mut perm = MatrixPermutation::new(DMatrix::identity(n, n));
        for (i, j) in swaps {
            perm.swap_rows_and_columns(i, j);
        }
        let input = DVector::from_fn(n, |p, _| p as f64);
        let mut out = DVector::from_element(n, -1.0);
        perm.unpermute_from(&input, &mut out, start);

        for p in 0..n {
            let i = perm.original_index_of(p);
            if p < start {
                prop_assert_eq!(out[i], -1.0);
            } else {
                prop_assert_eq!(out[i], p as f64);
            }
        }
    }
}

// =============================================================================
// Property Tests: Solver
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Every algorithm and path produces a verified solution.
    #[test]
    fn every_variant_satisfies_complementarity(problem in arb_problem(8)) {
        for (algorithm, schur) in VARIANTS {
            let solution = solve_with(&problem, algorithm, schur);
            let check = verify_lcp(
                &problem.a, &problem.b, &problem.lo, &problem.hi,
                &solution.x, &solution.w, 1e-7,
            );
            prop_assert!(check.is_ok(), "{:?} schur={}: {:?}", algorithm, schur, check);
        }
    }

    /// Positive definite systems have a unique solution, so all variants agree.
    #[test]
    fn variants_agree(problem in arb_problem(8)) {
        let reference = solve_with(&problem, LcpAlgorithm::Murty, false);
        for (algorithm, schur) in VARIANTS {
            let solution = solve_with(&problem, algorithm, schur);
            for i in 0..problem.b.len() {
                prop_assert!(
                    (solution.x[i] - reference.x[i]).abs() < 1e-6,
                    "{:?} schur={} x[{}]: {} vs {}",
                    algorithm, schur, i, solution.x[i], reference.x[i]
                );
            }
        }
    }

    /// Bound states report `x` exactly on the bound and free states `w = 0`.
    #[test]
    fn states_are_exact(problem in arb_problem(8)) {
        for (algorithm, schur) in VARIANTS {
            let solution = solve_with(&problem, algorithm, schur);
            for (i, state) in solution.states.iter().enumerate() {
                match state {
                    VariableState::Free => prop_assert_eq!(solution.w[i], 0.0),
                    VariableState::AtLower => prop_assert_eq!(solution.x[i], problem.lo[i]),
                    VariableState::AtUpper => prop_assert_eq!(solution.x[i], problem.hi[i]),
                }
            }
        }
    }

    /// Pinned variables never move.
    #[test]
    fn pinned_variables_stay_put(problem in arb_problem(8)) {
        let solution = solve_with(&problem, LcpAlgorithm::CottleDantzig, true);
        for i in 0..problem.b.len() {
            if problem.lo[i] == problem.hi[i] {
                prop_assert_eq!(solution.x[i], problem.lo[i]);
            }
        }
    }
}

// =============================================================================
// Budget exhaustion
// =============================================================================

fn needs_a_pivot() -> Problem {
    Problem {
        a: DMatrix::identity(2, 2),
        b: DVector::from_vec(vec![-1.0, 1.0]),
        lo: DVector::zeros(2),
        hi: DVector::from_element(2, f64::INFINITY),
    }
}

#[test]
fn zero_iterations_is_a_failure_for_every_variant() {
    let problem = needs_a_pivot();
    for (algorithm, schur) in VARIANTS {
        let config = LcpSolverConfig::default()
            .with_algorithm(algorithm)
            .with_schur_complement(schur)
            .with_max_iterations(0);
        let err = solve_lcp(&config, problem.a.clone(), &problem.b, &problem.lo, &problem.hi)
            .unwrap_err();
        assert!(
            matches!(err, LcpError::IterationLimit { .. }),
            "{algorithm:?}: {err}"
        );
    }
}

#[test]
fn non_positive_time_is_a_failure_for_every_variant() {
    let problem = needs_a_pivot();
    for (algorithm, schur) in VARIANTS {
        for max_time in [0.0, -0.5] {
            let config = LcpSolverConfig::default()
                .with_algorithm(algorithm)
                .with_schur_complement(schur)
                .with_max_time(max_time);
            let err = solve_lcp(&config, problem.a.clone(), &problem.b, &problem.lo, &problem.hi)
                .unwrap_err();
            assert!(matches!(err, LcpError::TimeLimit { .. }), "{algorithm:?}: {err}");
        }
    }
}

#[test]
fn zero_budget_fails_even_without_a_pivot() {
    // The unconstrained minimizer is strictly positive, so Murty's all-free
    // start is already the answer.
    let a = DMatrix::from_row_slice(3, 3, &[4.0, 1.0, 0.0, 1.0, 3.0, 0.5, 0.0, 0.5, 2.0]);
    let b = DVector::from_vec(vec![1.0, 2.0, 0.5]);
    let lo = DVector::zeros(3);
    let hi = DVector::from_element(3, f64::INFINITY);

    let solution = solve_lcp(&LcpSolverConfig::default(), a.clone(), &b, &lo, &hi).unwrap();
    assert_eq!(solution.num_free(), 3);

    for algorithm in [LcpAlgorithm::Murty, LcpAlgorithm::CottleDantzig] {
        let config = LcpSolverConfig::default().with_algorithm(algorithm);

        let err = solve_lcp(&config.with_max_iterations(0), a.clone(), &b, &lo, &hi).unwrap_err();
        assert_eq!(err, LcpError::IterationLimit { iterations: 0 }, "{algorithm:?}");

        let err = solve_lcp(&config.with_max_time(0.0), a.clone(), &b, &lo, &hi).unwrap_err();
        assert!(matches!(err, LcpError::TimeLimit { .. }), "{algorithm:?}: {err}");
    }
}

#[test]
fn zero_budget_solves_problems_with_nothing_to_pivot() {
    let a = DMatrix::from_row_slice(2, 2, &[2.0, 0.5, 0.5, 1.0]);
    let b = DVector::from_vec(vec![1.0, -1.0]);
    let unbounded = (
        DVector::from_element(2, f64::NEG_INFINITY),
        DVector::from_element(2, f64::INFINITY),
    );
    let pinned = (DVector::zeros(2), DVector::zeros(2));

    for (lo, hi) in [unbounded, pinned] {
        for (algorithm, schur) in VARIANTS {
            let config = LcpSolverConfig::default()
                .with_algorithm(algorithm)
                .with_schur_complement(schur)
                .with_max_iterations(0)
                .with_max_time(0.0);
            let solution = solve_lcp(&config, a.clone(), &b, &lo, &hi).unwrap();
            verify_lcp(&a, &b, &lo, &hi, &solution.x, &solution.w, 1e-9).unwrap();
            assert_eq!(solution.iterations, 0);
        }
    }
}

#[test]
fn generous_budget_succeeds_where_zero_fails() {
    let problem = needs_a_pivot();
    let config = LcpSolverConfig::default().with_max_iterations(10);
    let solution =
        solve_lcp(&config, problem.a.clone(), &problem.b, &problem.lo, &problem.hi).unwrap();
    assert_eq!(solution.x, DVector::from_vec(vec![0.0, 1.0]));
    assert!(solution.iterations >= 1);
}
