//! # equal-teams
//!
//! Searches for the smallest pool size N such that every multiset of N
//! integers drawn from [1,100] contains two disjoint 5-element subsets
//! ("teams") with equal sum.
//!
//! For a given N the crate either finds a *counterexample* (a multiset with no
//! such pair of teams) or proves that none exists. The search is driven by a
//! counterexample-guided abstraction refinement loop: a relaxed integer model is
//! solved, the candidate is verified against the full subset structure, and any
//! violated pair of teams is added back to the model as a forbidden pair.
//!
//! ## Example
//!
//! ```rust,ignore
//! use equal_teams::catalog::SubsetCatalog;
//! use equal_teams::cegar::CegarLoop;
//! use equal_teams::encoder::{CandidateEncoder, EncoderOptions};
//! use equal_teams::engine::sat::SatBackend;
//! use equal_teams::sweep::Budget;
//!
//! let catalog = SubsetCatalog::new(11)?;
//! let encoder = CandidateEncoder::new(11, EncoderOptions::default());
//! let mut solver = SatBackend::default();
//! let budget = Budget::new(std::time::Duration::from_secs(60));
//!
//! let run = CegarLoop::new(&catalog, &encoder).run(&mut solver, &budget)?;
//! println!("{}", run.verdict);
//! ```

#![warn(missing_docs)]
#![warn(rust_2024_compatibility)]

/// Subset catalog: 5-element index combinations, disjoint pairs, verification
pub mod catalog;

/// Opaque integer model handed to the solver collaborator
pub mod model;

/// Solver capability interface and its backends
pub mod engine;

/// Boolean circuit factory used by the SAT backend
pub mod bool;

/// Clause storage for translated circuits
pub mod cnf;

/// Symmetry-broken candidate encoding
pub mod encoder;

/// Counterexample-guided abstraction refinement loop
pub mod cegar;

/// Non-incremental solve with every disjoint pair forbidden up front
pub mod static_solver;

/// Solver-free validation of explicit candidate sequences
pub mod checker;

/// Sweeping a strategy across a range of pool sizes
pub mod sweep;

/// Error types
pub mod error {
    //! Error types for equal-teams

    use thiserror::Error;

    /// Errors that can occur while building catalogs, models, or checking input
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum TeamsError {
        /// A variable was declared with an empty domain
        #[error("invalid bounds for {name}: [{lo}, {hi}]")]
        InvalidBounds {
            /// Variable name
            name: String,
            /// Lower bound
            lo: i64,
            /// Upper bound
            hi: i64,
        },

        /// A constraint refers to a variable that was never declared
        #[error("unknown variable: {0}")]
        UnknownVariable(usize),

        /// A fixed value lies outside the variable's domain
        #[error("value {value} outside domain of {name}")]
        ValueOutOfDomain {
            /// Variable name
            name: String,
            /// Offending value
            value: i64,
        },

        /// The backend cannot represent the given domain
        #[error("unsupported domain [{lo}, {hi}]: {reason}")]
        UnsupportedDomain {
            /// Lower bound
            lo: i64,
            /// Upper bound
            hi: i64,
            /// Why the backend rejects it
            reason: &'static str,
        },

        /// Pool too large for the subset catalog
        #[error("pool size {size} exceeds the supported maximum of {max}")]
        CatalogTooLarge {
            /// Requested pool size
            size: usize,
            /// Largest supported pool size
            max: usize,
        },

        /// Assignment length does not match the catalog
        #[error("assignment has {actual} values, catalog expects {expected}")]
        LengthMismatch {
            /// Catalog pool size
            expected: usize,
            /// Assignment length
            actual: usize,
        },

        /// User input rejected before any computation
        #[error("invalid input: {0}")]
        Validation(String),

        /// The solver returned an assignment that violates its own model
        #[error("solver contract violated: {0}")]
        SolverContract(String),
    }

    /// Result type for equal-teams operations
    pub type Result<T> = std::result::Result<T, TeamsError>;
}

pub use error::{Result, TeamsError};
