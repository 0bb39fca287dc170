//! CEGAR and static strategies against both backends

use equal_teams::catalog::SubsetCatalog;
use equal_teams::cegar::CegarLoop;
use equal_teams::encoder::{CandidateEncoder, EncoderOptions};
use equal_teams::engine::exhaustive::ExhaustiveSolver;
use equal_teams::engine::sat::SatBackend;
use equal_teams::static_solver::StaticSolver;
use equal_teams::sweep::{Budget, Verdict};
use std::time::Duration;

fn encoder(size: usize, max_value: i64, pruning: bool, threads: usize) -> CandidateEncoder {
    CandidateEncoder::new(
        size,
        EncoderOptions {
            min_value: 1,
            max_value,
            pruning,
            threads,
        },
    )
}

#[test]
fn test_cegar_and_static_agree() {
    for size in [10, 11] {
        let catalog = SubsetCatalog::new(size).unwrap();
        for max_value in 1..=4 {
            for pruning in [false, true] {
                let encoder = encoder(size, max_value, pruning, 1);
                let budget = Budget::unlimited();
                let cegar = CegarLoop::new(&catalog, &encoder)
                    .run(ExhaustiveSolver::new(), &budget)
                    .unwrap();
                let fixed = StaticSolver::new(&catalog, &encoder)
                    .run(ExhaustiveSolver::new(), &budget)
                    .unwrap();
                assert_eq!(
                    cegar.verdict.is_counterexample(),
                    fixed.verdict.is_counterexample(),
                    "N={size} max={max_value} pruning={pruning}"
                );
                assert!(!cegar.verdict.is_timeout());
            }
        }
    }
}

#[test]
fn test_pruning_preserves_satisfiability() {
    for max_value in 1..=4 {
        let catalog = SubsetCatalog::new(11).unwrap();
        let run = |pruning| {
            CegarLoop::new(&catalog, &encoder(11, max_value, pruning, 1))
                .run(ExhaustiveSolver::new(), &Budget::unlimited())
                .unwrap()
                .verdict
        };
        assert_eq!(
            run(true).is_counterexample(),
            run(false).is_counterexample(),
            "max={max_value}"
        );
    }
}

#[test]
fn test_sat_backend_finds_verified_counterexample() {
    let catalog = SubsetCatalog::new(10).unwrap();
    let encoder = encoder(10, 100, true, 2);
    let run = CegarLoop::new(&catalog, &encoder)
        .run(SatBackend::default(), &Budget::new(Duration::from_secs(120)))
        .unwrap();
    let Verdict::Counterexample(values) = &run.verdict else {
        panic!("expected a counterexample, got {}", run.verdict);
    };
    assert_eq!(values.len(), 10);
    assert_eq!(values[0], 1);
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(catalog.verify(values).unwrap(), None);
}

#[test]
fn test_sat_backend_matches_exhaustive() {
    for max_value in [1, 2, 3] {
        let catalog = SubsetCatalog::new(11).unwrap();
        let encoder = encoder(11, max_value, true, 1);
        let budget = Budget::unlimited();
        let sat = StaticSolver::new(&catalog, &encoder)
            .run(SatBackend::default(), &budget)
            .unwrap();
        let exhaustive = StaticSolver::new(&catalog, &encoder)
            .run(ExhaustiveSolver::new(), &budget)
            .unwrap();
        assert_eq!(
            sat.verdict.is_counterexample(),
            exhaustive.verdict.is_counterexample(),
            "max={max_value}"
        );
        if let Verdict::Counterexample(values) = &sat.verdict {
            assert_eq!(catalog.verify(values).unwrap(), None);
        }
    }
}

#[test]
fn test_zero_budget_is_inconclusive() {
    let catalog = SubsetCatalog::new(12).unwrap();
    let encoder = encoder(12, 100, true, 1);
    let budget = Budget::new(Duration::ZERO);
    let cegar = CegarLoop::new(&catalog, &encoder)
        .run(SatBackend::default(), &budget)
        .unwrap();
    assert_eq!(cegar.verdict, Verdict::Timeout);
    assert_eq!(cegar.solve_calls, 0);
}

#[test]
fn test_static_sat_run_honors_budget() {
    // 126126 pair constraints do not translate within a second
    let catalog = SubsetCatalog::new(14).unwrap();
    let encoder = encoder(14, 100, true, 2);
    let limit = Duration::from_secs(1);
    let mut backend = SatBackend::default();
    let run = StaticSolver::new(&catalog, &encoder)
        .run(&mut backend, &Budget::new(limit))
        .unwrap();
    assert_ne!(run.verdict, Verdict::NoCounterexample);
    assert!(
        run.elapsed < limit + Duration::from_secs(5),
        "returned after {:?}",
        run.elapsed
    );
    assert_eq!(backend.live_workers(), 0);
}
