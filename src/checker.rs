//! Solver-free validation of a user-supplied sequence

use crate::catalog::{CatalogCache, DisjointPair, Subset, MIN_POOL_SIZE, TEAM_SIZE};
use crate::{Result, TeamsError};
use std::fmt;

/// Parses integers from command-line style arguments
///
/// Tokens may be separated by commas, whitespace, or both, and may carry a
/// sign. At least [`MIN_POOL_SIZE`] values are required.
pub fn parse_values<I, S>(args: I) -> Result<Vec<i64>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut values = Vec::new();
    for arg in args {
        for token in arg
            .as_ref()
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let value = token
                .parse::<i32>()
                .map_err(|_| TeamsError::Validation(format!("not an integer: {token:?}")))?;
            values.push(i64::from(value));
        }
    }
    if values.len() < MIN_POOL_SIZE {
        return Err(TeamsError::Validation(format!(
            "need at least {MIN_POOL_SIZE} values, got {}",
            values.len()
        )));
    }
    Ok(values)
}

/// One side of a violating pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    /// Positions in the checked sequence
    pub indices: Vec<usize>,
    /// Values at those positions
    pub values: Vec<i64>,
}

impl Team {
    fn new(subset: &Subset, sequence: &[i64]) -> Result<Self> {
        let values = subset.values(sequence).ok_or(TeamsError::LengthMismatch {
            expected: subset.indices()[TEAM_SIZE - 1] + 1,
            actual: sequence.len(),
        })?;
        Ok(Self {
            indices: subset.indices().to_vec(),
            values,
        })
    }
}

/// Checker verdict for one sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckReport {
    /// No two disjoint teams have equal sums
    Counterexample {
        /// Number of values checked
        size: usize,
    },
    /// Two disjoint teams with a common sum
    Violation {
        /// The pair as found in the catalog
        pair: DisjointPair,
        /// First team
        first: Team,
        /// Second team
        second: Team,
        /// Common sum
        sum: i64,
    },
}

impl CheckReport {
    /// Returns true if the sequence is a valid counterexample
    pub fn is_counterexample(&self) -> bool {
        matches!(self, CheckReport::Counterexample { .. })
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckReport::Counterexample { size } => write!(
                f,
                "valid counterexample: no two disjoint 5-subsets of these {size} values have equal sums"
            ),
            CheckReport::Violation {
                first, second, sum, ..
            } => {
                writeln!(f, "found two disjoint 5-subsets with equal sum {sum}:")?;
                writeln!(f, "  indices {:?} values {:?}", first.indices, first.values)?;
                write!(f, "  indices {:?} values {:?}", second.indices, second.values)
            }
        }
    }
}

/// Validates sequences against the subset catalog of their length
#[derive(Debug, Default)]
pub struct ExampleChecker {
    catalogs: CatalogCache,
}

impl ExampleChecker {
    /// Creates a checker with an empty catalog cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether `values` is a counterexample
    ///
    /// The sequence is checked as given; order does not matter for the
    /// verdict.
    pub fn check(&mut self, values: &[i64]) -> Result<CheckReport> {
        if values.len() < MIN_POOL_SIZE {
            return Err(TeamsError::Validation(format!(
                "need at least {MIN_POOL_SIZE} values, got {}",
                values.len()
            )));
        }
        let catalog = self.catalogs.get(values.len())?;
        let report = match catalog.verify(values)? {
            None => CheckReport::Counterexample { size: values.len() },
            Some(pair) => {
                let first = Team::new(pair.first(), values)?;
                let second = Team::new(pair.second(), values)?;
                let sum = first.values.iter().sum();
                CheckReport::Violation {
                    pair,
                    first,
                    second,
                    sum,
                }
            }
        };
        tracing::debug!(size = values.len(), valid = report.is_counterexample(), "checked sequence");
        Ok(report)
    }
}
