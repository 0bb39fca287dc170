//! Solver capability interface and backends
//!
//! The search core only talks to [`IntSolver`]: it hands over a [`Model`] and a
//! [`SolveConfig`] and receives one of three outcomes. Backends:
//! * [`sat::SatBackend`] compiles the model to CNF and runs a portfolio of
//!   batsat workers.
//! * [`exhaustive::ExhaustiveSolver`] enumerates small domains depth-first.

pub mod exhaustive;
pub mod rustsat_adapter;
pub mod sat;

use crate::model::Model;
use crate::Result;
use std::fmt;
use std::time::Duration;

/// Solver configuration handed over with every model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveConfig {
    /// Number of worker threads the backend may use
    pub threads: usize,
    /// Wall-clock limit for this call (None = no limit)
    pub time_limit: Option<Duration>,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            time_limit: None,
        }
    }
}

/// Available parallelism, or 1 if it cannot be determined
pub fn default_threads() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

/// Outcome of a single solve call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    /// A satisfying assignment, one value per declared variable
    Feasible(Vec<i64>),
    /// No assignment satisfies the model
    Infeasible,
    /// Decided neither way before the limit
    Timeout,
}

impl SolveOutcome {
    /// Returns the assignment if feasible
    pub fn assignment(&self) -> Option<&[i64]> {
        match self {
            SolveOutcome::Feasible(values) => Some(values),
            _ => None,
        }
    }
}

impl fmt::Display for SolveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveOutcome::Feasible(_) => f.write_str("feasible"),
            SolveOutcome::Infeasible => f.write_str("infeasible"),
            SolveOutcome::Timeout => f.write_str("timeout"),
        }
    }
}

/// Result of a solve call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverResult {
    /// What the solver decided
    pub outcome: SolveOutcome,
    /// Wall-clock time spent in the call
    pub elapsed: Duration,
}

/// Bounded-integer constraint solver
///
/// Implementations must return assignments that satisfy every domain and
/// constraint of the model. Internal failures are reported as
/// [`SolveOutcome::Timeout`]; `Err` is reserved for models the backend cannot
/// represent.
pub trait IntSolver {
    /// Solves `model` within the limits of `config`
    fn solve(&mut self, model: &Model, config: &SolveConfig) -> Result<SolverResult>;
}

impl<S: IntSolver + ?Sized> IntSolver for &mut S {
    fn solve(&mut self, model: &Model, config: &SolveConfig) -> Result<SolverResult> {
        (**self).solve(model, config)
    }
}

/// Core SAT solver trait used by the SAT backend
///
/// Variables are 1-indexed, and literals are represented as signed integers
/// (positive for true, negative for false).
pub trait SATSolver {
    /// Adds the given number of variables to the solver
    fn add_variables(&mut self, num_vars: u32);

    /// Adds a clause to the solver
    ///
    /// Returns false if the backend rejected the clause
    fn add_clause(&mut self, lits: &[i32]) -> bool;

    /// Solves the current formula
    ///
    /// Returns `Some(true)` if satisfiable, `Some(false)` if unsatisfiable and
    /// `None` if the backend failed or gave up.
    fn solve(&mut self) -> Option<bool>;

    /// Returns the assignment of a variable in the solution
    ///
    /// Only valid after solve() returns `Some(true)`.
    fn value_of(&self, var: u32) -> bool;

    /// Returns the number of variables in the solver
    fn num_variables(&self) -> u32;

    /// Returns the number of clauses added
    fn num_clauses(&self) -> u32;
}
