//! Integer model handed to the solver collaborator
//!
//! A model is a list of bounded integer variables and a list of constraints
//! over them. It carries no solving logic: backends in [`crate::engine`]
//! interpret it.

use crate::{Result, TeamsError};

/// Handle of a declared integer variable
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    /// Position of the variable in declaration order
    pub fn index(self) -> usize {
        self.0
    }
}

/// A bounded integer variable
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntVar {
    name: String,
    lo: i64,
    hi: i64,
}

impl IntVar {
    /// Variable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inclusive lower bound
    pub fn lo(&self) -> i64 {
        self.lo
    }

    /// Inclusive upper bound
    pub fn hi(&self) -> i64 {
        self.hi
    }

    /// Returns true if `value` lies in the domain
    pub fn contains(&self, value: i64) -> bool {
        self.lo <= value && value <= self.hi
    }
}

/// Constraints understood by every backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Constraint {
    /// `var == value`
    Fixed {
        /// Constrained variable
        var: VarId,
        /// Required value
        value: i64,
    },
    /// `lhs <= rhs`
    LessEq {
        /// Smaller side
        lhs: VarId,
        /// Larger side
        rhs: VarId,
    },
    /// `lhs != rhs`
    NotEqual {
        /// Left variable
        lhs: VarId,
        /// Right variable
        rhs: VarId,
    },
    /// `sum(lhs) != sum(rhs)`
    SumNotEqual {
        /// Left summands
        lhs: Vec<VarId>,
        /// Right summands
        rhs: Vec<VarId>,
    },
    /// At most `limit` disjoint adjacent positions `(i, i+1)` of `vars` hold
    /// equal values.
    ///
    /// On a non-decreasing sequence this is the number of duplicate pairs,
    /// `sum over values v of floor(count(v) / 2)`.
    AdjacentPairsAtMost {
        /// Sequence of variables
        vars: Vec<VarId>,
        /// Maximum number of disjoint equal adjacent pairs
        limit: usize,
    },
}

impl Constraint {
    /// Evaluates the constraint under a complete assignment
    pub fn holds(&self, values: &[i64]) -> bool {
        match self {
            Constraint::Fixed { var, value } => values[var.0] == *value,
            Constraint::LessEq { lhs, rhs } => values[lhs.0] <= values[rhs.0],
            Constraint::NotEqual { lhs, rhs } => values[lhs.0] != values[rhs.0],
            Constraint::SumNotEqual { lhs, rhs } => {
                let left: i64 = lhs.iter().map(|v| values[v.0]).sum();
                let right: i64 = rhs.iter().map(|v| values[v.0]).sum();
                left != right
            }
            Constraint::AdjacentPairsAtMost { vars, limit } => {
                adjacent_equal_pairs(vars.iter().map(|v| values[v.0])) <= *limit
            }
        }
    }

    /// Largest variable index the constraint mentions
    pub fn max_var(&self) -> Option<VarId> {
        match self {
            Constraint::Fixed { var, .. } => Some(*var),
            Constraint::LessEq { lhs, rhs } | Constraint::NotEqual { lhs, rhs } => {
                Some(*lhs.max(rhs))
            }
            Constraint::SumNotEqual { lhs, rhs } => lhs.iter().chain(rhs).max().copied(),
            Constraint::AdjacentPairsAtMost { vars, .. } => vars.iter().max().copied(),
        }
    }
}

/// Greedy count of disjoint adjacent equal pairs, which is maximal on a path
pub fn adjacent_equal_pairs(values: impl IntoIterator<Item = i64>) -> usize {
    let mut count = 0;
    let mut pending: Option<i64> = None;
    for v in values {
        match pending {
            Some(p) if p == v => {
                count += 1;
                pending = None;
            }
            _ => pending = Some(v),
        }
    }
    count
}

/// Bounded integer variables plus constraints
#[derive(Clone, Debug, Default)]
pub struct Model {
    vars: Vec<IntVar>,
    constraints: Vec<Constraint>,
}

impl Model {
    /// Creates an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an integer variable with domain `[lo, hi]`
    pub fn new_int_var(&mut self, name: impl Into<String>, lo: i64, hi: i64) -> Result<VarId> {
        let name = name.into();
        if lo > hi {
            return Err(TeamsError::InvalidBounds { name, lo, hi });
        }
        self.vars.push(IntVar { name, lo, hi });
        Ok(VarId(self.vars.len() - 1))
    }

    /// Requires `var == value`
    pub fn add_fixed(&mut self, var: VarId, value: i64) -> Result<()> {
        let decl = self.var(var)?;
        if !decl.contains(value) {
            return Err(TeamsError::ValueOutOfDomain {
                name: decl.name.clone(),
                value,
            });
        }
        self.constraints.push(Constraint::Fixed { var, value });
        Ok(())
    }

    /// Requires `vars[0] <= vars[1] <= ...`
    pub fn add_non_decreasing(&mut self, vars: &[VarId]) -> Result<()> {
        self.check_all(vars)?;
        for w in vars.windows(2) {
            self.constraints.push(Constraint::LessEq { lhs: w[0], rhs: w[1] });
        }
        Ok(())
    }

    /// Requires `lhs != rhs`
    pub fn add_not_equal(&mut self, lhs: VarId, rhs: VarId) -> Result<()> {
        self.check_all(&[lhs, rhs])?;
        self.constraints.push(Constraint::NotEqual { lhs, rhs });
        Ok(())
    }

    /// Requires `sum(lhs) != sum(rhs)`
    pub fn add_sum_not_equal(&mut self, lhs: &[VarId], rhs: &[VarId]) -> Result<()> {
        self.check_all(lhs)?;
        self.check_all(rhs)?;
        self.constraints.push(Constraint::SumNotEqual {
            lhs: lhs.to_vec(),
            rhs: rhs.to_vec(),
        });
        Ok(())
    }

    /// Caps the number of disjoint equal adjacent pairs in `vars`
    pub fn add_adjacent_pairs_at_most(&mut self, vars: &[VarId], limit: usize) -> Result<()> {
        self.check_all(vars)?;
        self.constraints.push(Constraint::AdjacentPairsAtMost {
            vars: vars.to_vec(),
            limit,
        });
        Ok(())
    }

    /// Returns the declaration of `var`
    pub fn var(&self, var: VarId) -> Result<&IntVar> {
        self.vars.get(var.0).ok_or(TeamsError::UnknownVariable(var.0))
    }

    /// All declared variables
    pub fn vars(&self) -> &[IntVar] {
        &self.vars
    }

    /// All constraints, in insertion order
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Returns true if `values` is a complete assignment satisfying every
    /// domain and constraint
    pub fn is_satisfied_by(&self, values: &[i64]) -> bool {
        values.len() == self.vars.len()
            && self.vars.iter().zip(values).all(|(v, &x)| v.contains(x))
            && self.constraints.iter().all(|c| c.holds(values))
    }

    fn check_all(&self, vars: &[VarId]) -> Result<()> {
        vars.iter().try_for_each(|&v| self.var(v).map(|_| ()))
    }
}
