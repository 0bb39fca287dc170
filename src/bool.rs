//! Boolean circuit factory
//!
//! Gates are translated to clauses as soon as they are created (Tseitin
//! transformation), so the factory doubles as the CNF under construction.
//! Constant inputs are folded away and structurally equal gates are shared.
//!
//! Literals are DIMACS-style `i32`s. Variable 1 is reserved for the constant
//! TRUE and asserted by a unit clause; FALSE is its negation.

pub mod int;

use crate::cnf::CNF;
use rustc_hash::FxHashMap;

/// The constant TRUE literal
pub const TRUE: i32 = 1;

/// The constant FALSE literal
pub const FALSE: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Gate {
    And(i32, i32),
    Xor(i32, i32),
}

/// Boolean circuit factory with gate caching
pub struct BooleanFactory {
    cnf: CNF,
    next_var: u32,
    cache: FxHashMap<Gate, i32>,
}

impl Default for BooleanFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl BooleanFactory {
    /// Creates a factory whose CNF only asserts the TRUE variable
    pub fn new() -> Self {
        let mut cnf = CNF::new();
        cnf.add_clause(vec![TRUE]);
        Self {
            cnf,
            next_var: 1,
            cache: FxHashMap::default(),
        }
    }

    /// Creates a constant
    pub fn constant(&self, value: bool) -> i32 {
        if value { TRUE } else { FALSE }
    }

    /// Returns the constant value of `lit`, if it is one
    pub fn constant_value(lit: i32) -> Option<bool> {
        match lit {
            TRUE => Some(true),
            FALSE => Some(false),
            _ => None,
        }
    }

    /// Allocates a fresh unconstrained variable
    pub fn variable(&mut self) -> i32 {
        self.next_var += 1;
        self.next_var as i32
    }

    /// Number of allocated variables, including the TRUE variable
    pub fn num_variables(&self) -> u32 {
        self.next_var
    }

    /// Number of clauses emitted so far
    pub fn num_clauses(&self) -> usize {
        self.cnf.num_clauses()
    }

    /// AND gate
    pub fn and(&mut self, a: i32, b: i32) -> i32 {
        if a == FALSE || b == FALSE || a == -b {
            return FALSE;
        }
        if a == TRUE || a == b {
            return b;
        }
        if b == TRUE {
            return a;
        }

        let key = Gate::And(a.min(b), a.max(b));
        if let Some(&out) = self.cache.get(&key) {
            return out;
        }
        let out = self.variable();
        // out <-> a & b
        self.cnf.add_clause(vec![-a, -b, out]);
        self.cnf.add_clause(vec![a, -out]);
        self.cnf.add_clause(vec![b, -out]);
        self.cache.insert(key, out);
        out
    }

    /// OR gate
    pub fn or(&mut self, a: i32, b: i32) -> i32 {
        -self.and(-a, -b)
    }

    /// XOR gate
    pub fn xor(&mut self, a: i32, b: i32) -> i32 {
        if a == FALSE {
            return b;
        }
        if b == FALSE {
            return a;
        }
        if a == TRUE {
            return -b;
        }
        if b == TRUE {
            return -a;
        }
        if a == b {
            return FALSE;
        }
        if a == -b {
            return TRUE;
        }

        // xor(-a, b) = -xor(a, b): cache on the positive variables
        let negated = (a < 0) != (b < 0);
        let (x, y) = (a.abs(), b.abs());
        let key = Gate::Xor(x.min(y), x.max(y));
        let out = match self.cache.get(&key) {
            Some(&out) => out,
            None => {
                let out = self.variable();
                self.cnf.add_clause(vec![-x, -y, -out]);
                self.cnf.add_clause(vec![x, y, -out]);
                self.cnf.add_clause(vec![x, -y, out]);
                self.cnf.add_clause(vec![-x, y, out]);
                self.cache.insert(key, out);
                out
            }
        };
        if negated { -out } else { out }
    }

    /// Equivalence
    pub fn iff(&mut self, a: i32, b: i32) -> i32 {
        -self.xor(a, b)
    }

    /// Conjunction of any number of inputs
    pub fn and_multi(&mut self, inputs: impl IntoIterator<Item = i32>) -> i32 {
        inputs.into_iter().fold(TRUE, |acc, lit| self.and(acc, lit))
    }

    /// Full adder: returns `(sum, carry)`
    pub fn full_adder(&mut self, a: i32, b: i32, carry_in: i32) -> (i32, i32) {
        let ab = self.xor(a, b);
        let sum = self.xor(ab, carry_in);
        let both = self.and(a, b);
        let propagate = self.and(ab, carry_in);
        let carry = self.or(both, propagate);
        (sum, carry)
    }

    /// Asserts that `lit` holds
    pub fn assert(&mut self, lit: i32) {
        match Self::constant_value(lit) {
            Some(true) => {}
            Some(false) => self.cnf.add_clause(vec![FALSE]),
            None => self.cnf.add_clause(vec![lit]),
        }
    }

    /// Asserts that at most `k` of `lits` hold (sequential counter)
    pub fn assert_at_most(&mut self, lits: &[i32], k: usize) {
        let mut k = k;
        let mut open = Vec::with_capacity(lits.len());
        for &lit in lits {
            match Self::constant_value(lit) {
                Some(false) => {}
                Some(true) => {
                    if k == 0 {
                        self.assert(FALSE);
                        return;
                    }
                    k -= 1;
                }
                None => open.push(lit),
            }
        }
        if open.len() <= k {
            return;
        }
        if k == 0 {
            for lit in open {
                self.assert(-lit);
            }
            return;
        }

        // counters[j] <-> at least j+1 of the inputs seen so far hold
        let mut counters: Vec<i32> = vec![FALSE; k];
        for (i, &x) in open.iter().enumerate() {
            let last = i + 1 == open.len();
            // x with k already counted overflows
            if counters[k - 1] != FALSE {
                self.cnf.add_clause(vec![-x, -counters[k - 1]]);
            }
            if last {
                break;
            }
            let next: Vec<i32> = (0..k).map(|_| self.variable()).collect();
            for j in 0..k {
                // carry over previous counts
                if counters[j] != FALSE {
                    self.cnf.add_clause(vec![-counters[j], next[j]]);
                }
                // x bumps the count
                if j == 0 {
                    self.cnf.add_clause(vec![-x, next[0]]);
                } else if counters[j - 1] != FALSE {
                    self.cnf.add_clause(vec![-x, -counters[j - 1], next[j]]);
                }
            }
            counters = next;
        }
    }

    /// Returns the CNF built so far
    pub fn cnf(&self) -> &CNF {
        &self.cnf
    }

    /// Consumes the factory, returning its CNF
    pub fn into_cnf(self) -> CNF {
        let mut cnf = self.cnf;
        cnf.num_variables = cnf.num_variables.max(self.next_var);
        cnf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rustsat_adapter::RustSatAdapter;
    use crate::engine::SATSolver;
    use rustsat_batsat::BasicSolver;

    fn solve_with(factory: BooleanFactory, assumptions: &[i32]) -> bool {
        let cnf = factory.into_cnf();
        let mut solver = RustSatAdapter::new(BasicSolver::default());
        solver.add_variables(cnf.num_variables);
        for clause in &cnf.clauses {
            solver.add_clause(clause);
        }
        for &lit in assumptions {
            solver.add_clause(&[lit]);
        }
        solver.solve() == Some(true)
    }

    #[test]
    fn constant_folding() {
        let mut f = BooleanFactory::new();
        let a = f.variable();
        assert_eq!(f.and(a, TRUE), a);
        assert_eq!(f.and(a, FALSE), FALSE);
        assert_eq!(f.and(a, -a), FALSE);
        assert_eq!(f.or(a, TRUE), TRUE);
        assert_eq!(f.xor(a, a), FALSE);
        assert_eq!(f.xor(a, TRUE), -a);
        assert_eq!(f.num_clauses(), 1);
    }

    #[test]
    fn gates_are_shared() {
        let mut f = BooleanFactory::new();
        let a = f.variable();
        let b = f.variable();
        let g1 = f.and(a, b);
        let g2 = f.and(b, a);
        assert_eq!(g1, g2);
        let x1 = f.xor(a, b);
        let x2 = f.xor(-a, b);
        assert_eq!(x1, -x2);
    }

    #[test]
    fn xor_semantics() {
        for (va, vb) in [(true, true), (true, false), (false, true), (false, false)] {
            let mut f = BooleanFactory::new();
            let a = f.variable();
            let b = f.variable();
            let x = f.xor(a, b);
            f.assert(if va { a } else { -a });
            f.assert(if vb { b } else { -b });
            let expected = va != vb;
            assert!(solve_with(f, &[if expected { x } else { -x }]));
        }
    }

    #[test]
    fn at_most_counts() {
        for k in 0..4 {
            for forced in 0..5 {
                let mut f = BooleanFactory::new();
                let lits: Vec<i32> = (0..4).map(|_| f.variable()).collect();
                f.assert_at_most(&lits, k);
                let forced_lits: Vec<i32> = lits[..forced.min(4)].to_vec();
                assert_eq!(solve_with(f, &forced_lits), forced.min(4) <= k, "k={k} forced={forced}");
            }
        }
    }

    #[test]
    fn at_most_with_constants() {
        let mut f = BooleanFactory::new();
        let a = f.variable();
        f.assert_at_most(&[TRUE, a], 1);
        assert!(solve_with(f, &[-a]));

        let mut f = BooleanFactory::new();
        let a = f.variable();
        f.assert_at_most(&[TRUE, a], 1);
        assert!(!solve_with(f, &[a]));
    }
}
