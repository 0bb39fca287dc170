//! Sweeping one strategy across a range of pool sizes
//!
//! A [`SweepContext`] carries everything shared between sizes: the global
//! time [`Budget`], the per-size catalog cache and the sizes already found to
//! have no counterexample. Each size is decided independently; a failure for
//! one size is recorded and the sweep moves on.

use crate::catalog::CatalogCache;
use crate::cegar::CegarLoop;
use crate::encoder::{CandidateEncoder, EncoderOptions};
use crate::engine::IntSolver;
use crate::static_solver::StaticSolver;
use crate::{Result, TeamsError};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Counterexamples known to hold, by pool size
pub const KNOWN_COUNTEREXAMPLES: &[(usize, &[i64])] = &[
    (11, &[1, 1, 1, 1, 1, 1, 1, 1, 3, 4, 5]),
    (
        17,
        &[1, 2, 3, 5, 8, 14, 25, 47, 100, 100, 100, 100, 100, 100, 100, 100, 100],
    ),
];

/// Global wall-clock budget
///
/// Deadline based, so the remaining time only ever decreases.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    start: Instant,
    deadline: Option<Instant>,
}

impl Budget {
    /// Budget expiring `limit` from now
    pub fn new(limit: Duration) -> Self {
        let start = Instant::now();
        Self {
            start,
            deadline: Some(start + limit),
        }
    }

    /// Budget that never expires
    pub fn unlimited() -> Self {
        Self {
            start: Instant::now(),
            deadline: None,
        }
    }

    /// Time left, or None if unlimited
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Returns true once the deadline has passed
    pub fn is_exhausted(&self) -> bool {
        self.remaining().is_some_and(|r| r.is_zero())
    }

    /// Time since the budget was created
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Decision for one pool size
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// A verified multiset without two equal-sum disjoint teams
    Counterexample(Vec<i64>),
    /// Every multiset of this size has two equal-sum disjoint teams
    NoCounterexample,
    /// Neither, within the budget
    Timeout,
}

impl Verdict {
    /// Returns true for [`Verdict::Counterexample`]
    pub fn is_counterexample(&self) -> bool {
        matches!(self, Verdict::Counterexample(_))
    }

    /// Returns true for [`Verdict::Timeout`]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Verdict::Timeout)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Counterexample(values) => write!(f, "counterexample = {values:?}"),
            Verdict::NoCounterexample => f.write_str("no counterexample"),
            Verdict::Timeout => f.write_str("inconclusive"),
        }
    }
}

/// Strategy used for each size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Refine the model lazily from verified candidates
    #[default]
    Cegar,
    /// Encode every disjoint pair up front
    Static,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Cegar => f.write_str("cegar"),
            Strategy::Static => f.write_str("static"),
        }
    }
}

/// Sweep options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepOptions {
    /// First pool size (default 14)
    pub start: usize,
    /// Last pool size, inclusive (default 17)
    pub end: usize,
    /// Global time limit (default 600 s)
    pub limit: Duration,
    /// Strategy (default CEGAR)
    pub strategy: Strategy,
    /// Stop after the first size without a counterexample
    pub stop_on_unsat: bool,
    /// Model options shared by every size
    pub encoder: EncoderOptions,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            start: 14,
            end: 17,
            limit: Duration::from_secs(600),
            strategy: Strategy::Cegar,
            stop_on_unsat: false,
            encoder: EncoderOptions::default(),
        }
    }
}

/// Result for one pool size
#[derive(Debug, Clone)]
pub struct NOutcome {
    /// Pool size
    pub size: usize,
    /// Verdict, or the error that stopped this size
    pub result: Result<Verdict>,
    /// Refinements made (CEGAR only)
    pub refinements: Option<usize>,
    /// Wall-clock time for this size
    pub elapsed: Duration,
    /// Counterexample found above a size that had none
    pub anomaly: bool,
}

impl fmt::Display for NOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N={}: ", self.size)?;
        match &self.result {
            Ok(verdict) => write!(f, "{verdict}")?,
            Err(err) => write!(f, "error: {err}")?,
        }
        if let Some(k) = self.refinements {
            write!(f, " after {k} refinements")?;
        }
        write!(f, " ({:.2}s)", self.elapsed.as_secs_f64())
    }
}

/// Outcomes of a whole sweep
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// One entry per attempted size, in sweep order
    pub outcomes: Vec<NOutcome>,
    /// Total wall-clock time
    pub elapsed: Duration,
}

impl SweepReport {
    /// Smallest size proven to have no counterexample
    pub fn threshold(&self) -> Option<usize> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, Ok(Verdict::NoCounterexample)))
            .map(|o| o.size)
            .min()
    }

    /// Sizes flagged as monotonicity anomalies
    pub fn anomalies(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .filter(|o| o.anomaly)
            .map(|o| o.size)
            .collect()
    }
}

/// State shared by every size of a sweep
#[derive(Debug)]
pub struct SweepContext {
    budget: Budget,
    catalogs: CatalogCache,
    unsat: Vec<usize>,
}

impl SweepContext {
    /// Context with a fresh budget
    pub fn new(budget: Budget) -> Self {
        Self {
            budget,
            catalogs: CatalogCache::new(),
            unsat: Vec::new(),
        }
    }

    /// The global budget
    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    /// Catalogs built so far
    pub fn catalogs(&self) -> &CatalogCache {
        &self.catalogs
    }

    /// Decides one size with the given strategy
    pub fn run_size(
        &mut self,
        size: usize,
        strategy: Strategy,
        encoder: &EncoderOptions,
        solver: impl IntSolver,
    ) -> NOutcome {
        let start = Instant::now();
        let (result, refinements) = match self.decide(size, strategy, encoder, solver) {
            Ok((verdict, refinements)) => (Ok(verdict), refinements),
            Err(err) => (Err(err), None),
        };

        let anomaly = matches!(result, Ok(Verdict::Counterexample(_)))
            && self.unsat.iter().any(|&m| m < size);
        if anomaly {
            warn!(size, unsat = ?self.unsat, "counterexample above a size without one");
        }
        if matches!(result, Ok(Verdict::NoCounterexample)) {
            self.unsat.push(size);
        }

        NOutcome {
            size,
            result,
            refinements,
            elapsed: start.elapsed(),
            anomaly,
        }
    }

    fn decide(
        &mut self,
        size: usize,
        strategy: Strategy,
        encoder: &EncoderOptions,
        solver: impl IntSolver,
    ) -> Result<(Verdict, Option<usize>)> {
        let catalog = self.catalogs.get(size)?;
        let encoder = CandidateEncoder::new(size, encoder.clone());
        match strategy {
            Strategy::Cegar => {
                let run = CegarLoop::new(&catalog, &encoder).run(solver, &self.budget)?;
                Ok((run.verdict, Some(run.refinements)))
            }
            Strategy::Static => {
                let run = StaticSolver::new(&catalog, &encoder).run(solver, &self.budget)?;
                Ok((run.verdict, None))
            }
        }
    }
}

/// Sweep driver
#[derive(Debug, Clone)]
pub struct Sweep {
    options: SweepOptions,
}

impl Sweep {
    /// Creates a sweep
    pub fn new(options: SweepOptions) -> Self {
        Self { options }
    }

    /// Runs the sweep, collecting all outcomes
    pub fn run(&self, solver: impl IntSolver) -> Result<SweepReport> {
        self.run_with(solver, |_| {})
    }

    /// Runs the sweep, handing each outcome to `on_outcome` as soon as it is
    /// known
    pub fn run_with(
        &self,
        mut solver: impl IntSolver,
        mut on_outcome: impl FnMut(&NOutcome),
    ) -> Result<SweepReport> {
        let SweepOptions {
            start, end, limit, ..
        } = self.options;
        if start > end {
            return Err(TeamsError::Validation(format!(
                "empty range: start {start} > end {end}"
            )));
        }

        info!(
            start,
            end,
            strategy = %self.options.strategy,
            limit_s = limit.as_secs(),
            "starting sweep"
        );
        let mut context = SweepContext::new(Budget::new(limit));
        let mut report = SweepReport::default();

        for size in start..=end {
            let outcome = context.run_size(
                size,
                self.options.strategy,
                &self.options.encoder,
                &mut solver,
            );
            on_outcome(&outcome);
            let stop = self.options.stop_on_unsat
                && matches!(outcome.result, Ok(Verdict::NoCounterexample));
            report.outcomes.push(outcome);
            if stop {
                info!(size, "stopping at first size without a counterexample");
                break;
            }
        }

        report.elapsed = context.budget().elapsed();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::exhaustive::ExhaustiveSolver;
    use crate::engine::{SolveConfig, SolveOutcome, SolverResult};
    use crate::model::Model;

    fn small_options(start: usize, end: usize, max_value: i64) -> SweepOptions {
        SweepOptions {
            start,
            end,
            limit: Duration::from_secs(60),
            encoder: EncoderOptions {
                min_value: 1,
                max_value,
                pruning: true,
                threads: 1,
            },
            ..SweepOptions::default()
        }
    }

    #[test]
    fn budget_counts_down() {
        let budget = Budget::new(Duration::from_secs(60));
        assert!(!budget.is_exhausted());
        assert!(budget.remaining().unwrap() <= Duration::from_secs(60));
        assert!(Budget::new(Duration::ZERO).is_exhausted());
        assert_eq!(Budget::unlimited().remaining(), None);
        assert!(!Budget::unlimited().is_exhausted());
    }

    #[test]
    fn verdict_display() {
        assert_eq!(Verdict::NoCounterexample.to_string(), "no counterexample");
        assert_eq!(Verdict::Timeout.to_string(), "inconclusive");
        assert_eq!(
            Verdict::Counterexample(vec![1, 2]).to_string(),
            "counterexample = [1, 2]"
        );
    }

    #[test]
    fn outcome_line_reports_refinements() {
        let mut outcome = NOutcome {
            size: 12,
            result: Ok(Verdict::NoCounterexample),
            refinements: Some(7),
            elapsed: Duration::from_millis(1500),
            anomaly: false,
        };
        assert_eq!(
            outcome.to_string(),
            "N=12: no counterexample after 7 refinements (1.50s)"
        );
        outcome.refinements = None;
        assert_eq!(outcome.to_string(), "N=12: no counterexample (1.50s)");
    }

    #[test]
    fn cegar_sweep_lines_carry_refinements() {
        let mut lines = Vec::new();
        Sweep::new(small_options(10, 11, 2))
            .run_with(ExhaustiveSolver::new(), |o| lines.push(o.to_string()))
            .unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.contains(" refinements (")), "{lines:?}");
    }

    #[test]
    fn sweeps_small_domain() {
        // with values in [1, 2] every pool of 11 splits into equal teams
        let report = Sweep::new(small_options(10, 12, 2))
            .run(ExhaustiveSolver::new())
            .unwrap();
        let verdicts: Vec<_> = report
            .outcomes
            .iter()
            .map(|o| o.result.clone().unwrap())
            .collect();
        assert!(verdicts[0].is_counterexample());
        assert_eq!(verdicts[1], Verdict::NoCounterexample);
        assert_eq!(verdicts[2], Verdict::NoCounterexample);
        assert_eq!(report.threshold(), Some(11));
        assert!(report.anomalies().is_empty());
    }

    #[test]
    fn stop_on_unsat_ends_sweep() {
        let options = SweepOptions {
            stop_on_unsat: true,
            ..small_options(10, 13, 2)
        };
        let mut seen = Vec::new();
        let report = Sweep::new(options)
            .run_with(ExhaustiveSolver::new(), |o| seen.push(o.size))
            .unwrap();
        assert_eq!(seen, vec![10, 11]);
        assert_eq!(report.outcomes.len(), 2);
    }

    #[test]
    fn exhausted_budget_times_out_every_size() {
        let options = SweepOptions {
            limit: Duration::ZERO,
            ..small_options(10, 12, 2)
        };
        let mut solver = ExhaustiveSolver::new();
        let report = Sweep::new(options).run(&mut solver).unwrap();
        assert!(report
            .outcomes
            .iter()
            .all(|o| matches!(o.result, Ok(Verdict::Timeout))));
        assert_eq!(solver.calls(), 0);
    }

    #[test]
    fn errors_do_not_stop_the_sweep() {
        let options = SweepOptions {
            encoder: EncoderOptions {
                min_value: 5,
                max_value: 1,
                pruning: false,
                threads: 1,
            },
            ..small_options(10, 11, 2)
        };
        let report = Sweep::new(options).run(ExhaustiveSolver::new()).unwrap();
        assert_eq!(report.outcomes.len(), 2);
        assert!(report
            .outcomes
            .iter()
            .all(|o| matches!(o.result, Err(TeamsError::InvalidBounds { .. }))));
        assert!(report.outcomes[0].to_string().contains("error:"));
    }

    #[test]
    fn rejects_empty_range() {
        assert!(matches!(
            Sweep::new(small_options(12, 10, 2)).run(ExhaustiveSolver::new()),
            Err(TeamsError::Validation(_))
        ));
    }

    /// Infeasible on the first call, then a prefix of a fixed candidate
    struct Flipping {
        calls: usize,
        candidate: Vec<i64>,
    }

    impl IntSolver for Flipping {
        fn solve(&mut self, model: &Model, _config: &SolveConfig) -> Result<SolverResult> {
            self.calls += 1;
            let outcome = if self.calls == 1 {
                SolveOutcome::Infeasible
            } else {
                SolveOutcome::Feasible(self.candidate[..model.vars().len()].to_vec())
            };
            Ok(SolverResult {
                outcome,
                elapsed: Duration::ZERO,
            })
        }
    }

    #[test]
    fn flags_monotonicity_anomaly() {
        let (_, known) = KNOWN_COUNTEREXAMPLES[0];
        let solver = Flipping {
            calls: 0,
            candidate: known.to_vec(),
        };
        let report = Sweep::new(small_options(10, 11, 5)).run(solver).unwrap();
        assert_eq!(report.outcomes[0].result, Ok(Verdict::NoCounterexample));
        assert!(report.outcomes[1].result.as_ref().unwrap().is_counterexample());
        assert_eq!(report.anomalies(), vec![11]);
    }

    #[test]
    fn context_caches_catalogs() {
        let mut context = SweepContext::new(Budget::unlimited());
        let options = small_options(10, 10, 2).encoder;
        let mut solver = ExhaustiveSolver::new();
        context.run_size(10, Strategy::Cegar, &options, &mut solver);
        context.run_size(10, Strategy::Static, &options, &mut solver);
        assert_eq!(context.catalogs().len(), 1);
    }
}
