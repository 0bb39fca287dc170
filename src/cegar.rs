//! Counterexample-guided abstraction refinement
//!
//! The loop starts from the ordering-only model and alternates between
//! solving and verifying:
//!
//! ```text
//! INIT -> SOLVING --infeasible--> DONE(no counterexample)
//!            |    --timeout-----> DONE(timeout)
//!            v feasible(a)
//!         VERIFYING(a) --no violating pair--> DONE(counterexample a)
//!            | violating pair (A, B)
//!            +--> forbid (A, B), back to SOLVING
//! ```
//!
//! Every refinement forbids a pair the model did not forbid yet, so the loop
//! ends after at most as many rounds as there are disjoint pairs.

use crate::catalog::{DisjointPair, SubsetCatalog};
use crate::encoder::CandidateEncoder;
use crate::engine::{IntSolver, SolveOutcome};
use crate::sweep::{Budget, Verdict};
use crate::{Result, TeamsError};
use rustc_hash::FxHashSet;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Forbidden pairs discovered during one run, in discovery order
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    pairs: Vec<DisjointPair>,
    seen: FxHashSet<DisjointPair>,
}

impl ConstraintSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pair; returns false if it was already forbidden
    pub fn insert(&mut self, pair: DisjointPair) -> bool {
        if !self.seen.insert(pair) {
            return false;
        }
        self.pairs.push(pair);
        true
    }

    /// Number of forbidden pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if nothing is forbidden yet
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Forbidden pairs in discovery order
    pub fn iter(&self) -> std::slice::Iter<'_, DisjointPair> {
        self.pairs.iter()
    }
}

impl<'a> IntoIterator for &'a ConstraintSet {
    type Item = &'a DisjointPair;
    type IntoIter = std::slice::Iter<'a, DisjointPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

/// Outcome of one CEGAR run
#[derive(Debug, Clone)]
pub struct CegarRun {
    /// Final verdict
    pub verdict: Verdict,
    /// Number of pairs added to the model
    pub refinements: usize,
    /// Number of solver invocations
    pub solve_calls: usize,
    /// Wall-clock time of the run
    pub elapsed: Duration,
    /// Pairs forbidden when the run ended
    pub forbidden: ConstraintSet,
}

enum State {
    Solving,
    Verifying(Vec<i64>),
    Done(Verdict),
}

/// CEGAR loop for one pool size
pub struct CegarLoop<'a> {
    catalog: &'a SubsetCatalog,
    encoder: &'a CandidateEncoder,
}

impl<'a> CegarLoop<'a> {
    /// Creates a loop over `catalog`, encoding models with `encoder`
    pub fn new(catalog: &'a SubsetCatalog, encoder: &'a CandidateEncoder) -> Self {
        Self { catalog, encoder }
    }

    /// Runs until a verified counterexample, infeasibility, or the end of
    /// the budget
    pub fn run(&self, mut solver: impl IntSolver, budget: &Budget) -> Result<CegarRun> {
        if self.encoder.size() != self.catalog.size() {
            return Err(TeamsError::LengthMismatch {
                expected: self.catalog.size(),
                actual: self.encoder.size(),
            });
        }

        let start = Instant::now();
        let size = self.catalog.size();
        let mut forbidden = ConstraintSet::new();
        let mut solve_calls = 0;
        let mut state = State::Solving;

        let verdict = loop {
            state = match state {
                State::Solving => {
                    if budget.is_exhausted() {
                        State::Done(Verdict::Timeout)
                    } else {
                        let encoding = self.encoder.encode(&forbidden, budget.remaining())?;
                        let result = solver.solve(&encoding.model, &encoding.config)?;
                        solve_calls += 1;
                        debug!(
                            size,
                            round = solve_calls,
                            forbidden = forbidden.len(),
                            outcome = %result.outcome,
                            elapsed_ms = result.elapsed.as_millis() as u64,
                            "solved relaxed model"
                        );
                        match result.outcome {
                            SolveOutcome::Infeasible => State::Done(Verdict::NoCounterexample),
                            SolveOutcome::Timeout => State::Done(Verdict::Timeout),
                            SolveOutcome::Feasible(values) => State::Verifying(values),
                        }
                    }
                }
                State::Verifying(values) => {
                    if values.windows(2).any(|w| w[0] > w[1]) {
                        return Err(TeamsError::SolverContract(format!(
                            "candidate {values:?} is not non-decreasing"
                        )));
                    }
                    match self.catalog.verify(&values)? {
                        None => State::Done(Verdict::Counterexample(values)),
                        Some(pair) => {
                            if !forbidden.insert(pair) {
                                return Err(TeamsError::SolverContract(format!(
                                    "candidate {values:?} violates already forbidden pair {pair}"
                                )));
                            }
                            debug!(size, %pair, "refined model");
                            State::Solving
                        }
                    }
                }
                State::Done(verdict) => break verdict,
            };
        };

        let run = CegarRun {
            verdict,
            refinements: forbidden.len(),
            solve_calls,
            elapsed: start.elapsed(),
            forbidden,
        };
        info!(
            size,
            verdict = %run.verdict,
            refinements = run.refinements,
            elapsed_ms = run.elapsed.as_millis() as u64,
            "CEGAR run finished"
        );
        Ok(run)
    }
}
