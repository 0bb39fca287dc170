//! Documented counterexamples and verification properties

use equal_teams::catalog::SubsetCatalog;
use equal_teams::checker::{parse_values, CheckReport, ExampleChecker};
use equal_teams::sweep::KNOWN_COUNTEREXAMPLES;

#[test]
fn test_known_counterexamples_verify_clean() {
    for &(size, values) in KNOWN_COUNTEREXAMPLES {
        assert_eq!(values.len(), size);
        let catalog = SubsetCatalog::new(size).unwrap();
        assert_eq!(catalog.verify(values).unwrap(), None, "N={size}");
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert!(values.iter().all(|v| (1..=100).contains(v)));
    }
}

#[test]
fn test_removing_a_value_keeps_a_counterexample() {
    let (size, values) = KNOWN_COUNTEREXAMPLES[KNOWN_COUNTEREXAMPLES.len() - 1];
    let catalog = SubsetCatalog::new(size - 1).unwrap();
    for skip in [0, 7, size - 1] {
        let shorter: Vec<i64> = values
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != skip)
            .map(|(_, &v)| v)
            .collect();
        assert_eq!(catalog.verify(&shorter).unwrap(), None, "without index {skip}");
    }
}

#[test]
fn test_identical_values_always_violate() {
    for size in 10..=14 {
        let catalog = SubsetCatalog::new(size).unwrap();
        let pair = catalog.verify(&vec![42; size]).unwrap().expect("violating pair");
        assert!(pair.first().is_disjoint(pair.second()));
        assert!(pair.is_violated_by(&vec![42; size]));
    }
}

#[test]
fn test_verify_is_deterministic() {
    let values: Vec<i64> = (1..=13).map(|i| (i * 7) % 11 + 1).collect();
    let catalog = SubsetCatalog::new(values.len()).unwrap();
    let first = catalog.verify(&values).unwrap();
    for _ in 0..5 {
        assert_eq!(catalog.verify(&values).unwrap(), first);
    }
    assert!(first.is_some());
}

#[test]
fn test_checker_reports_match_catalog() {
    let mut checker = ExampleChecker::new();
    for &(_, values) in KNOWN_COUNTEREXAMPLES {
        assert!(checker.check(values).unwrap().is_counterexample());
    }

    let values = parse_values(["1,2,3,4,5,6,7,8,9,10"]).unwrap();
    match checker.check(&values).unwrap() {
        CheckReport::Violation {
            first, second, sum, ..
        } => {
            assert_eq!(first.values.iter().sum::<i64>(), sum);
            assert_eq!(second.values.iter().sum::<i64>(), sum);
        }
        CheckReport::Counterexample { .. } => panic!("1..=10 splits into equal teams"),
    }
}
