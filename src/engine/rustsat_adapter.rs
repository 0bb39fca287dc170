//! Adapter for rustsat solver backends
//!
//! Lets any rustsat-compatible SAT solver consume the signed-integer clauses
//! produced by [`crate::cnf::CNF`].

use super::SATSolver;
use rustsat::types::{Assignment, Clause, Lit, TernaryVal, Var};

/// Adapter that wraps rustsat solvers to implement our SATSolver trait
///
/// # Example
///
/// ```ignore
/// use rustsat_batsat::BasicSolver;
/// let solver = RustSatAdapter::new(BasicSolver::default());
/// ```
pub struct RustSatAdapter<S> {
    solver: S,
    num_vars: u32,
    num_clauses: u32,
    model: Option<Assignment>,
}

impl<S> RustSatAdapter<S> {
    /// Creates a new adapter wrapping the given solver
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            num_vars: 0,
            num_clauses: 0,
            model: None,
        }
    }
}

fn to_lit(lit: i32) -> Option<Lit> {
    let var_idx = lit.unsigned_abs().checked_sub(1)?;
    if var_idx > Var::MAX_IDX {
        return None;
    }
    let var = Var::new(var_idx);
    Some(if lit > 0 { var.pos_lit() } else { var.neg_lit() })
}

impl<S: rustsat::solvers::Solve> SATSolver for RustSatAdapter<S> {
    fn add_variables(&mut self, num_vars: u32) {
        // rustsat creates variables lazily as clauses mention them; a
        // tautology on the highest one makes solutions cover the whole range
        self.num_vars += num_vars;
        if num_vars > 0 && self.num_vars - 1 <= Var::MAX_IDX {
            let top = Var::new(self.num_vars - 1);
            let _ = self.solver.add_clause(Clause::from(&[top.pos_lit(), top.neg_lit()][..]));
        }
    }

    fn add_clause(&mut self, lits: &[i32]) -> bool {
        let Some(lits_vec) = lits.iter().map(|&l| to_lit(l)).collect::<Option<Vec<Lit>>>() else {
            tracing::warn!(?lits, "clause mentions an out-of-range variable");
            return false;
        };
        self.num_clauses += 1;
        self.solver.add_clause(Clause::from(&lits_vec[..])).is_ok()
    }

    fn solve(&mut self) -> Option<bool> {
        use rustsat::solvers::SolverResult;
        self.model = None;
        match self.solver.solve() {
            Ok(SolverResult::Sat) => {
                if self.num_vars > 0 {
                    let high = Var::new(self.num_vars - 1);
                    self.model = Some(self.solver.solution(high).ok()?);
                }
                Some(true)
            }
            Ok(SolverResult::Unsat) => Some(false),
            Ok(SolverResult::Interrupted) => None,
            Err(err) => {
                tracing::warn!(%err, "SAT backend failed");
                None
            }
        }
    }

    fn value_of(&self, var: u32) -> bool {
        if var == 0 || var > self.num_vars {
            return false;
        }
        self.model
            .as_ref()
            .is_some_and(|m| matches!(m.var_value(Var::new(var - 1)), TernaryVal::True))
    }

    fn num_variables(&self) -> u32 {
        self.num_vars
    }

    fn num_clauses(&self) -> u32 {
        self.num_clauses
    }
}
