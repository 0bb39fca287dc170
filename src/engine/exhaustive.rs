//! Exhaustive backend
//!
//! Depth-first enumeration in declaration order with values tried in
//! ascending order. Each constraint is checked as soon as its last variable
//! is assigned. Deterministic: the first solution found is the
//! lexicographically smallest one. Only practical for small domains; it
//! ignores the thread count.

use super::{IntSolver, SolveConfig, SolveOutcome, SolverResult};
use crate::model::{Constraint, Model};
use crate::Result;
use std::time::Instant;

/// Nodes visited between deadline checks
const CHECK_INTERVAL: u64 = 1 << 12;

/// Deterministic depth-first [`IntSolver`]
#[derive(Debug, Default)]
pub struct ExhaustiveSolver {
    nodes: u64,
    calls: usize,
}

impl ExhaustiveSolver {
    /// Creates a solver
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of solve calls so far
    pub fn calls(&self) -> usize {
        self.calls
    }
}

struct Search<'a> {
    model: &'a Model,
    // constraints grouped by the position of their last variable
    checks: Vec<Vec<&'a Constraint>>,
    values: Vec<i64>,
    nodes: u64,
    deadline: Option<Instant>,
    timed_out: bool,
}

impl Search<'_> {
    fn descend(&mut self, depth: usize) -> bool {
        if depth == self.values.len() {
            return true;
        }
        let var = &self.model.vars()[depth];
        let (lo, hi) = (var.lo(), var.hi());
        for value in lo..=hi {
            self.nodes += 1;
            if self.nodes % CHECK_INTERVAL == 0
                && self.deadline.is_some_and(|d| Instant::now() >= d)
            {
                self.timed_out = true;
                return false;
            }

            self.values[depth] = value;
            let consistent = self.checks[depth].iter().all(|c| c.holds(&self.values));
            if consistent && self.descend(depth + 1) {
                return true;
            }
            if self.timed_out {
                return false;
            }
        }
        false
    }
}

impl IntSolver for ExhaustiveSolver {
    fn solve(&mut self, model: &Model, config: &SolveConfig) -> Result<SolverResult> {
        let start = Instant::now();
        self.calls += 1;

        let n = model.vars().len();
        let mut checks: Vec<Vec<&Constraint>> = vec![Vec::new(); n];
        for constraint in model.constraints() {
            if let Some(last) = constraint.max_var() {
                checks[last.index()].push(constraint);
            }
        }

        let mut search = Search {
            model,
            checks,
            values: model.vars().iter().map(|v| v.lo()).collect(),
            nodes: 0,
            deadline: config.time_limit.map(|limit| start + limit),
            timed_out: false,
        };

        let outcome = if config.time_limit.is_some_and(|l| l.is_zero()) {
            SolveOutcome::Timeout
        } else if search.descend(0) {
            SolveOutcome::Feasible(search.values.clone())
        } else if search.timed_out {
            SolveOutcome::Timeout
        } else {
            SolveOutcome::Infeasible
        };
        self.nodes = search.nodes;
        tracing::debug!(nodes = self.nodes, %outcome, "exhaustive search finished");

        Ok(SolverResult {
            outcome,
            elapsed: start.elapsed(),
        })
    }
}
