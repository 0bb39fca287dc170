//! Clause storage
//!
//! Clauses are DIMACS-style: variables are 1-indexed and a negative literal
//! is a negated variable.

use rand::seq::SliceRandom;
use rand::Rng;

/// CNF representation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CNF {
    /// Number of variables
    pub num_variables: u32,
    /// CNF clauses (each clause is a vec of literals, negative = negated)
    pub clauses: Vec<Vec<i32>>,
}

impl CNF {
    /// Creates a new empty CNF
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a clause to the CNF
    pub fn add_clause(&mut self, clause: Vec<i32>) {
        for &lit in &clause {
            let var = lit.unsigned_abs();
            if var > self.num_variables {
                self.num_variables = var;
            }
        }
        self.clauses.push(clause);
    }

    /// Number of clauses
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    /// Returns a copy with variables renamed and clauses shuffled, together
    /// with the renaming (`renaming[v]` is the new name of variable `v`,
    /// index 0 unused).
    ///
    /// The formula is equisatisfiable; only the order in which a solver meets
    /// variables and clauses changes.
    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> (CNF, Vec<u32>) {
        let mut renaming: Vec<u32> = (0..=self.num_variables).collect();
        renaming[1..].shuffle(rng);

        let mut clauses: Vec<Vec<i32>> = self
            .clauses
            .iter()
            .map(|clause| {
                clause
                    .iter()
                    .map(|&lit| {
                        let var = renaming[lit.unsigned_abs() as usize] as i32;
                        if lit > 0 { var } else { -var }
                    })
                    .collect()
            })
            .collect();
        clauses.shuffle(rng);

        let cnf = CNF {
            num_variables: self.num_variables,
            clauses,
        };
        (cnf, renaming)
    }
}
