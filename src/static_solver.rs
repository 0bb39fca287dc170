//! One-shot solving with every disjoint pair encoded up front
//!
//! The model forbids equal sums for the whole pair universe, so a feasible
//! assignment is a counterexample by construction and is reported without a
//! verification pass.

use crate::catalog::SubsetCatalog;
use crate::encoder::CandidateEncoder;
use crate::engine::{IntSolver, SolveOutcome};
use crate::sweep::{Budget, Verdict};
use crate::{Result, TeamsError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Outcome of a static run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRun {
    /// Final verdict
    pub verdict: Verdict,
    /// Number of pair constraints in the model
    pub pairs: u64,
    /// Time spent building the model
    pub encoding_time: Duration,
    /// Wall-clock time of the run
    pub elapsed: Duration,
}

/// Static strategy for one pool size
pub struct StaticSolver<'a> {
    catalog: &'a SubsetCatalog,
    encoder: &'a CandidateEncoder,
}

impl<'a> StaticSolver<'a> {
    /// Creates a static solver over `catalog`
    pub fn new(catalog: &'a SubsetCatalog, encoder: &'a CandidateEncoder) -> Self {
        Self { catalog, encoder }
    }

    /// Encodes all disjoint pairs and solves once
    pub fn run(&self, mut solver: impl IntSolver, budget: &Budget) -> Result<StaticRun> {
        if self.encoder.size() != self.catalog.size() {
            return Err(TeamsError::LengthMismatch {
                expected: self.catalog.size(),
                actual: self.encoder.size(),
            });
        }

        let start = Instant::now();
        let size = self.catalog.size();
        let pairs = self.catalog.disjoint_pair_count();

        if budget.is_exhausted() {
            return Ok(StaticRun {
                verdict: Verdict::Timeout,
                pairs,
                encoding_time: Duration::ZERO,
                elapsed: start.elapsed(),
            });
        }

        let all = self.catalog.disjoint_pairs().collect::<Vec<_>>();
        let encoding = self.encoder.encode(&all, budget.remaining())?;
        let encoding_time = start.elapsed();
        debug!(
            size,
            pairs,
            constraints = encoding.model.constraints().len(),
            "encoded full pair universe"
        );

        if budget.is_exhausted() {
            debug!(size, "budget ran out while encoding");
            return Ok(StaticRun {
                verdict: Verdict::Timeout,
                pairs,
                encoding_time,
                elapsed: start.elapsed(),
            });
        }

        let result = solver.solve(&encoding.model, &encoding.config)?;
        let verdict = match result.outcome {
            SolveOutcome::Feasible(values) => Verdict::Counterexample(values),
            SolveOutcome::Infeasible => Verdict::NoCounterexample,
            SolveOutcome::Timeout => Verdict::Timeout,
        };

        let run = StaticRun {
            verdict,
            pairs,
            encoding_time,
            elapsed: start.elapsed(),
        };
        info!(
            size,
            verdict = %run.verdict,
            elapsed_ms = run.elapsed.as_millis() as u64,
            "static run finished"
        );
        Ok(run)
    }
}
