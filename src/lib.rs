//! # kodkod-min
//!
//! Minimal-model finding and enumeration for Kodkod relational logic.
//!
//! Formulas over bounded relations are translated to boolean satisfiability
//! problems, solved with an incremental SAT solver, and every model handed
//! back is subset-minimal: no proper subset of its tuples satisfies the
//! formula. Enumeration excludes each delivered model and everything above
//! it, so the sequence visits every minimal model exactly once.
//!
//! ## Example
//!
//! ```rust,no_run
//! use kodkod_min::ast::{Expression, Relation};
//! use kodkod_min::instance::{Bounds, Universe};
//! use kodkod_min::solver::{MinSolver, Options};
//!
//! # fn main() -> kodkod_min::Result<()> {
//! let universe = Universe::new(&["A", "B", "C"])?;
//! let person = Relation::unary("Person");
//!
//! let mut bounds = Bounds::new(universe);
//! let factory = bounds.universe().factory();
//! bounds.bound(&person, factory.none(1), factory.tuple_set(&[&["A"], &["B"]])?)?;
//!
//! let formula = Expression::from(&person).some();
//!
//! let solver = MinSolver::new(Options::default());
//! for solution in solver.solve_all(&formula, &bounds)? {
//!     let solution = solution?;
//!     if let Some(instance) = solution.instance() {
//!         println!("{}", instance);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2024_compatibility)]

/// Abstract syntax tree types (Expression, Formula, Decl)
pub mod ast;

/// Instance and bounds types for constraint specification
pub mod instance;

/// Boolean circuit representation for translation
pub mod bool;

/// Boolean circuit to CNF conversion
pub mod cnf;

/// FOL to boolean circuit translator
pub mod translator;

/// SAT oracles and the minimal-model search engine
pub mod engine;

/// Translation logs and unsatisfiability proofs
pub mod proof;

/// Solution outcomes and statistics
pub mod solution;

/// Main solver API
pub mod solver;

/// Error types
pub mod error {
    //! Error types for kodkod-min

    use thiserror::Error;

    use crate::engine::{Contradiction, SolverError};

    /// Errors that can occur during solving
    #[derive(Error, Debug)]
    pub enum KodkodError {
        /// Formula contains an undeclared variable or unmapped relation
        #[error("unbound leaf: {0}")]
        UnboundLeaf(String),

        /// Formula contains a higher-order declaration that cannot be skolemized
        #[error("higher-order declaration: {0}")]
        HigherOrderDecl(String),

        /// Solving was aborted
        #[error("solving aborted")]
        Aborted,

        /// The solver ran past its deadline
        #[error("solver timed out")]
        Timeout,

        /// A solution was requested from an exhausted iterator
        #[error("no more solutions")]
        NoMoreSolutions,

        /// Operation not permitted in the current configuration or state
        #[error("illegal state: {0}")]
        IllegalState(String),

        /// Capacity exceeded during solving
        #[error("capacity exceeded: {0}")]
        CapacityExceeded(String),

        /// Invalid argument
        #[error("invalid argument: {0}")]
        InvalidArgument(String),

        /// The SAT backend failed
        #[error("solver failure: {0}")]
        SolverFailure(String),
    }

    impl From<SolverError> for KodkodError {
        fn from(err: SolverError) -> Self {
            match err {
                SolverError::Aborted => KodkodError::Aborted,
                SolverError::Timeout => KodkodError::Timeout,
                SolverError::Backend(msg) => KodkodError::SolverFailure(msg),
            }
        }
    }

    impl From<Contradiction> for KodkodError {
        fn from(err: Contradiction) -> Self {
            KodkodError::SolverFailure(err.to_string())
        }
    }

    /// Result type for kodkod-min operations
    pub type Result<T> = std::result::Result<T, KodkodError>;
}

// Re-export commonly used types
pub use error::{KodkodError, Result};
