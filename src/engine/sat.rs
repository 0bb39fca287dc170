//! SAT backend
//!
//! Compiles a [`Model`] into a boolean circuit (one unsigned bit-vector per
//! variable, ripple-carry adders for sums) and solves the resulting CNF with a
//! portfolio of batsat workers. Each worker sees the same formula under a
//! different seeded renaming of variables and clauses; the first verdict wins
//! and the rest are discarded.

use super::rustsat_adapter::RustSatAdapter;
use super::{IntSolver, SATSolver, SolveConfig, SolveOutcome, SolverResult};
use crate::bool::int::{bits_for, Int};
use crate::bool::BooleanFactory;
use crate::cnf::CNF;
use crate::model::{Constraint, Model};
use crate::{Result, TeamsError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustsat_batsat::BasicSolver;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Largest upper bound the backend encodes
pub const MAX_DOMAIN_VALUE: i64 = u32::MAX as i64;

/// Constraints translated between deadline checks
const DEADLINE_CHECK_INTERVAL: usize = 1 << 12;

/// Clauses loaded into a worker between cancellation checks
const CANCEL_CHECK_INTERVAL: usize = 1 << 12;

fn is_past(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

/// SAT backend options
#[derive(Debug, Clone)]
pub struct Options {
    /// Base seed for the portfolio renamings (worker `w` uses `seed + w`)
    pub seed: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self { seed: 0x5eed }
    }
}

/// Statistics of the last solve call
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    translation_time: Duration,
    solving_time: Duration,
    num_variables: u32,
    num_clauses: u32,
    winner: Option<usize>,
}

impl Statistics {
    /// Returns translation time in milliseconds
    pub fn translation_time(&self) -> u64 {
        self.translation_time.as_millis() as u64
    }

    /// Returns solving time in milliseconds
    pub fn solving_time(&self) -> u64 {
        self.solving_time.as_millis() as u64
    }

    /// Returns number of variables
    pub fn num_variables(&self) -> u32 {
        self.num_variables
    }

    /// Returns number of clauses
    pub fn num_clauses(&self) -> u32 {
        self.num_clauses
    }

    /// Portfolio worker that produced the verdict, if any
    pub fn winner(&self) -> Option<usize> {
        self.winner
    }
}

/// A model translated to CNF, with the bit-vector of every model variable
pub struct Translation {
    cnf: CNF,
    ints: Vec<Int>,
}

impl Translation {
    /// Translates `model`, giving up with `None` once `deadline` passes
    pub fn new(model: &Model, deadline: Option<Instant>) -> Result<Option<Self>> {
        let mut factory = BooleanFactory::new();
        let mut ints = Vec::with_capacity(model.vars().len());

        for var in model.vars() {
            if var.lo() < 0 || var.hi() > MAX_DOMAIN_VALUE {
                return Err(TeamsError::UnsupportedDomain {
                    lo: var.lo(),
                    hi: var.hi(),
                    reason: "the SAT backend encodes values in 0..=u32::MAX",
                });
            }
            let x = Int::variable(bits_for(var.hi() as u64), &mut factory);
            let above = Int::constant(var.lo() as u64).lte(&x, &mut factory);
            factory.assert(above);
            let below = x.lte(&Int::constant(var.hi() as u64), &mut factory);
            factory.assert(below);
            ints.push(x);
        }

        for (k, constraint) in model.constraints().iter().enumerate() {
            if k % DEADLINE_CHECK_INTERVAL == 0 && is_past(deadline) {
                debug!(translated = k, "deadline passed during translation");
                return Ok(None);
            }
            translate_constraint(constraint, &ints, &mut factory);
        }

        Ok(Some(Self {
            cnf: factory.into_cnf(),
            ints,
        }))
    }

    /// The clauses
    pub fn cnf(&self) -> &CNF {
        &self.cnf
    }
}

fn decode(ints: &[Int], model: &[bool]) -> Vec<i64> {
    ints.iter()
        .map(|x| x.decode(|v| model.get(v as usize).copied().unwrap_or(false)) as i64)
        .collect()
}

fn translate_constraint(constraint: &Constraint, ints: &[Int], factory: &mut BooleanFactory) {
    match constraint {
        Constraint::Fixed { var, value } => {
            let eq = ints[var.index()].eq(&Int::constant(*value as u64), factory);
            factory.assert(eq);
        }
        Constraint::LessEq { lhs, rhs } => {
            let le = ints[lhs.index()].lte(&ints[rhs.index()], factory);
            factory.assert(le);
        }
        Constraint::NotEqual { lhs, rhs } => {
            let eq = ints[lhs.index()].eq(&ints[rhs.index()], factory);
            factory.assert(-eq);
        }
        Constraint::SumNotEqual { lhs, rhs } => {
            // Identical subsets fold into shared adder trees through the gate cache
            let left = Int::sum(lhs.iter().map(|v| &ints[v.index()]), factory);
            let right = Int::sum(rhs.iter().map(|v| &ints[v.index()]), factory);
            let eq = left.eq(&right, factory);
            factory.assert(-eq);
        }
        Constraint::AdjacentPairsAtMost { vars, limit } => {
            // Greedy matching: position i is paired with i+1 if equal and
            // i-1 did not take it
            let mut taken = Vec::with_capacity(vars.len());
            let mut previous = factory.constant(false);
            for w in vars.windows(2) {
                let equal = ints[w[0].index()].eq(&ints[w[1].index()], factory);
                let pair = factory.and(equal, -previous);
                taken.push(pair);
                previous = pair;
            }
            factory.assert_at_most(&taken, *limit);
        }
    }
}

enum Verdict {
    Sat(Vec<bool>),
    Unsat,
    Failed,
}

fn run_worker(cnf: &CNF, worker: usize, seed: u64, cancel: &Arc<AtomicBool>) -> Verdict {
    let shuffled;
    let (cnf, renaming) = if worker == 0 {
        (cnf, None)
    } else {
        let mut rng = StdRng::seed_from_u64(seed);
        let (formula, renaming) = cnf.shuffled(&mut rng);
        shuffled = formula;
        (&shuffled, Some(renaming))
    };

    // batsat polls the stop callback on every conflict
    let mut backend = BasicSolver::default();
    let stop = Arc::clone(cancel);
    backend
        .batsat_mut()
        .cb_mut()
        .set_stop(move || stop.load(Ordering::Relaxed));

    let mut solver = RustSatAdapter::new(backend);
    solver.add_variables(cnf.num_variables);
    for (k, clause) in cnf.clauses.iter().enumerate() {
        if k % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
            return Verdict::Failed;
        }
        if !solver.add_clause(clause) {
            return Verdict::Failed;
        }
    }

    match solver.solve() {
        Some(true) => {
            let n = cnf.num_variables;
            let model = (0..=n)
                .map(|v| {
                    let renamed = renaming.as_ref().map_or(v, |r| r[v as usize]);
                    solver.value_of(renamed)
                })
                .collect();
            Verdict::Sat(model)
        }
        Some(false) => Verdict::Unsat,
        None => Verdict::Failed,
    }
}

/// Counts a worker thread as live until dropped
struct LiveWorker(Arc<AtomicUsize>);

impl LiveWorker {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for LiveWorker {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// SAT-based [`IntSolver`]
///
/// A call returns only after every worker it started has exited: the first
/// verdict or the deadline raises a shared stop flag that interrupts the
/// remaining batsat searches, and the portfolio joins them.
#[derive(Default)]
pub struct SatBackend {
    options: Options,
    last: Statistics,
    live: Arc<AtomicUsize>,
}

impl SatBackend {
    /// Creates a backend with the given options
    pub fn new(options: Options) -> Self {
        Self {
            options,
            last: Statistics::default(),
            live: Arc::default(),
        }
    }

    /// Statistics of the most recent solve call
    pub fn statistics(&self) -> &Statistics {
        &self.last
    }

    /// Worker threads of this backend that are still running
    pub fn live_workers(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn run_portfolio(
        &self,
        cnf: Arc<CNF>,
        threads: usize,
        deadline: Option<Instant>,
    ) -> Option<(usize, Verdict)> {
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();

        let mut handles = Vec::with_capacity(threads);
        for worker in 0..threads {
            let cnf = Arc::clone(&cnf);
            let cancel = Arc::clone(&cancel);
            let tx = tx.clone();
            let live = LiveWorker::new(&self.live);
            let seed = self.options.seed.wrapping_add(worker as u64);
            let spawned = thread::Builder::new()
                .name(format!("sat-worker-{worker}"))
                .spawn(move || {
                    let _live = live;
                    let verdict = run_worker(&cnf, worker, seed, &cancel);
                    // Late verdicts land in a channel nobody reads any more
                    let _ = tx.send((worker, verdict));
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => warn!(worker, %err, "could not spawn SAT worker"),
            }
        }
        drop(tx);

        let answer = loop {
            let received = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break None;
                    }
                    rx.recv_timeout(deadline - now)
                }
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok((worker, Verdict::Failed)) => {
                    debug!(worker, "SAT worker gave up");
                }
                Ok(decided) => break Some(decided),
                Err(RecvTimeoutError::Timeout) => break None,
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("every SAT worker failed");
                    break None;
                }
            }
        };
        cancel.store(true, Ordering::Relaxed);
        for handle in handles {
            if handle.join().is_err() {
                warn!("SAT worker panicked");
            }
        }
        answer
    }
}

impl IntSolver for SatBackend {
    fn solve(&mut self, model: &Model, config: &SolveConfig) -> Result<SolverResult> {
        let start = Instant::now();
        let deadline = config.time_limit.map(|limit| start + limit);

        self.last = Statistics::default();
        let Some(translation) = Translation::new(model, deadline)? else {
            self.last.translation_time = start.elapsed();
            return Ok(SolverResult {
                outcome: SolveOutcome::Timeout,
                elapsed: start.elapsed(),
            });
        };
        let translation_time = start.elapsed();
        self.last = Statistics {
            translation_time,
            num_variables: translation.cnf.num_variables,
            num_clauses: translation.cnf.num_clauses() as u32,
            ..Statistics::default()
        };
        debug!(
            vars = self.last.num_variables,
            clauses = self.last.num_clauses,
            "translated model"
        );

        if is_past(deadline) {
            return Ok(SolverResult {
                outcome: SolveOutcome::Timeout,
                elapsed: start.elapsed(),
            });
        }

        let Translation { cnf, ints } = translation;
        let solving_start = Instant::now();
        let answer = self.run_portfolio(Arc::new(cnf), config.threads.max(1), deadline);
        self.last.solving_time = solving_start.elapsed();
        self.last.winner = answer.as_ref().map(|(worker, _)| *worker);

        let outcome = match answer {
            Some((_, Verdict::Sat(bits))) => {
                let values = decode(&ints, &bits);
                if !model.is_satisfied_by(&values) {
                    return Err(TeamsError::SolverContract(format!(
                        "SAT model decodes to {values:?}, which violates the model"
                    )));
                }
                SolveOutcome::Feasible(values)
            }
            Some((_, Verdict::Unsat)) => SolveOutcome::Infeasible,
            Some((_, Verdict::Failed)) | None => SolveOutcome::Timeout,
        };
        debug!(
            translation_ms = self.last.translation_time(),
            solving_ms = self.last.solving_time(),
            winner = ?self.last.winner(),
            %outcome,
            "SAT solve finished"
        );

        Ok(SolverResult {
            outcome,
            elapsed: start.elapsed(),
        })
    }
}
