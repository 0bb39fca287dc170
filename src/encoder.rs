//! Candidate encoding
//!
//! Builds the integer model whose solutions are candidate counterexamples:
//! N variables over the value domain, sorted non-decreasingly so that each
//! solution stands for a whole permutation class, plus one sum disequality per
//! forbidden pair.
//!
//! With pruning enabled, three redundant constraints are added. Each holds for
//! some representative of every counterexample class, because shifting all
//! values by a constant keeps equal-size subset sums equal:
//! * the smallest value is the domain minimum;
//! * no value repeats [`MIN_POOL_SIZE`] times (`x[i] != x[i + 9]`);
//! * at most four disjoint duplicate pairs, since five of them split into two
//!   equal-sum teams.

use crate::catalog::{DisjointPair, MIN_POOL_SIZE, TEAM_SIZE};
use crate::engine::{default_threads, SolveConfig};
use crate::model::{Model, VarId};
use crate::{Result, TeamsError};
use std::time::Duration;

/// Encoder options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Smallest allowed value (default 1)
    pub min_value: i64,
    /// Largest allowed value (default 100)
    pub max_value: i64,
    /// Add the redundant pruning constraints (default true)
    pub pruning: bool,
    /// Solver threads (default: available parallelism)
    pub threads: usize,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            min_value: 1,
            max_value: 100,
            pruning: true,
            threads: default_threads(),
        }
    }
}

/// An encoded model, ready for the solver
#[derive(Debug, Clone)]
pub struct Encoding {
    /// The model
    pub model: Model,
    /// Solver configuration
    pub config: SolveConfig,
}

/// Builds candidate models for a fixed pool size
#[derive(Debug, Clone)]
pub struct CandidateEncoder {
    size: usize,
    options: EncoderOptions,
}

impl CandidateEncoder {
    /// Creates an encoder for pools of `size` values
    pub fn new(size: usize, options: EncoderOptions) -> Self {
        Self { size, options }
    }

    /// Pool size N
    pub fn size(&self) -> usize {
        self.size
    }

    /// Encodes ordering, pruning and one disequality per forbidden pair
    pub fn encode<'p>(
        &self,
        forbidden: impl IntoIterator<Item = &'p DisjointPair>,
        time_limit: Option<Duration>,
    ) -> Result<Encoding> {
        let EncoderOptions {
            min_value: lo,
            max_value: hi,
            ..
        } = self.options;

        let mut model = Model::new();
        let vars = (0..self.size)
            .map(|i| model.new_int_var(format!("x[{i}]"), lo, hi))
            .collect::<Result<Vec<_>>>()?;

        model.add_non_decreasing(&vars)?;
        if self.options.pruning {
            self.add_pruning(&mut model, &vars)?;
        }

        for pair in forbidden {
            let lhs = self.pair_side(&vars, pair.first().indices())?;
            let rhs = self.pair_side(&vars, pair.second().indices())?;
            model.add_sum_not_equal(&lhs, &rhs)?;
        }

        Ok(Encoding {
            model,
            config: SolveConfig {
                threads: self.options.threads.max(1),
                time_limit,
            },
        })
    }

    fn add_pruning(&self, model: &mut Model, vars: &[VarId]) -> Result<()> {
        if let Some(&first) = vars.first() {
            model.add_fixed(first, self.options.min_value)?;
        }
        if vars.len() >= MIN_POOL_SIZE {
            for w in vars.windows(MIN_POOL_SIZE) {
                model.add_not_equal(w[0], w[MIN_POOL_SIZE - 1])?;
            }
            model.add_adjacent_pairs_at_most(vars, TEAM_SIZE - 1)?;
        }
        Ok(())
    }

    fn pair_side(&self, vars: &[VarId], indices: [usize; TEAM_SIZE]) -> Result<Vec<VarId>> {
        indices
            .iter()
            .map(|&i| {
                vars.get(i).copied().ok_or_else(|| {
                    TeamsError::Validation(format!(
                        "forbidden pair mentions index {i}, pool has {} values",
                        self.size
                    ))
                })
            })
            .collect()
    }
}
