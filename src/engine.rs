//! SAT solver traits, backends, and the minimal-model search engine
//!
//! Variables are 1-indexed and literals are signed integers (positive for
//! the variable, negative for its negation), matching the CNF produced by
//! the translator.

pub mod evaluator;
pub mod ledger;
pub mod lifter;
pub mod minimizer;
pub mod rustsat_adapter;
pub mod session;
pub mod var_map;

pub use evaluator::Evaluator;
pub use ledger::ConstraintLedger;
pub use lifter::LifterComputer;
pub use minimizer::Minimizer;
pub use rustsat_adapter::RustSatAdapter;
pub use session::{Session, SolveControl};
pub use var_map::VariableTupleMap;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rustsat_batsat::BasicSolver;
use thiserror::Error;

/// Failures reported by a SAT oracle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    /// The call was cancelled through an [`AbortSignal`] or by the backend
    #[error("solver call aborted")]
    Aborted,
    /// The call started after its deadline
    #[error("solver deadline exceeded")]
    Timeout,
    /// The backend itself failed
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Raised when a removable constraint cannot be asserted
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("constraint contradicts the clauses already in the solver")]
pub struct Contradiction;

/// Token for a removable constraint; needed to retract it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintHandle(pub(crate) u32);

/// Cooperative cancellation flag, shareable across threads
///
/// Raising the flag makes the next oracle invocation fail with
/// [`SolverError::Aborted`]. The flag stays raised until [`reset`](Self::reset).
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    /// Creates a lowered flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Lowers the flag
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Whether the flag is raised
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Core SAT solver trait
///
/// This trait defines the interface that all SAT solver backends must implement.
pub trait SATSolver {
    /// Adds the given number of variables to the solver
    fn add_variables(&mut self, num_vars: u32);

    /// Adds one variable and returns it
    fn new_variable(&mut self) -> u32 {
        self.add_variables(1);
        self.num_variables()
    }

    /// Adds a permanent clause
    ///
    /// Returns false if the backend rejected it.
    fn add_clause(&mut self, lits: &[i32]) -> bool;

    /// Solves the current formula
    fn solve(&mut self) -> Result<bool, SolverError> {
        self.solve_assuming(&[])
    }

    /// Solves the current formula with the given literals assumed true
    fn solve_assuming(&mut self, assumptions: &[i32]) -> Result<bool, SolverError>;

    /// Value of `var` in the model of the most recent satisfiable call
    ///
    /// Unsatisfiable calls leave the previous model in place. Unknown
    /// variables read as false.
    fn value_of(&self, var: u32) -> bool;

    /// Returns the number of variables in the solver
    ///
    /// Variables a backend allocates for its own bookkeeping may be left out.
    fn num_variables(&self) -> u32;

    /// Returns the number of permanent clauses added through [`add_clause`](Self::add_clause)
    fn num_clauses(&self) -> u32;

    /// Releases the backend; the solver must not be used afterwards
    fn free(&mut self);

    /// This solver as a prover, if it can explain unsatisfiable calls
    fn as_prover(&self) -> Option<&dyn SATProver> {
        None
    }
}

/// Incremental solver with removable constraints
pub trait MinSATSolver: SATSolver {
    /// Adds a clause that can later be retracted
    fn add_constraint(&mut self, lits: &[i32]) -> Result<ConstraintHandle, Contradiction>;

    /// Retracts a constraint; unknown or already removed handles are ignored
    fn remove_constraint(&mut self, handle: ConstraintHandle);
}

/// Extension for solvers that explain unsatisfiable calls
pub trait SATProver: SATSolver {
    /// Assumptions of the last unsatisfiable call that were needed for it
    fn failed_assumptions(&self) -> &[i32];
}

/// Extension for solvers that minimize a weighted sum of true variables
pub trait SATMinimizer: SATSolver {
    /// Sets the weight of `var`; unweighted variables cost nothing
    fn set_cost(&mut self, var: u32, cost: u32);

    /// Finds a model of minimal total weight
    ///
    /// On success [`value_of`](SATSolver::value_of) reads the optimal model.
    fn solve_min_cost(&mut self) -> Result<bool, SolverError>;
}

/// Builds solvers and reports what the solvers it builds can do
#[derive(Clone, Copy)]
pub struct SATFactory {
    name: &'static str,
    plain: fn() -> Box<dyn SATSolver>,
    incremental: Option<fn() -> Box<dyn MinSATSolver>>,
    minimizer: Option<fn() -> Box<dyn SATMinimizer>>,
    prover: bool,
}

fn batsat_plain() -> Box<dyn SATSolver> {
    Box::new(RustSatAdapter::<BasicSolver>::default())
}

fn batsat_incremental() -> Box<dyn MinSATSolver> {
    Box::new(RustSatAdapter::<BasicSolver>::default())
}

fn batsat_minimizer() -> Box<dyn SATMinimizer> {
    Box::new(RustSatAdapter::<BasicSolver>::default())
}

impl SATFactory {
    /// BatSat through rustsat: incremental, minimizing, proof-producing
    pub const BATSAT: SATFactory = SATFactory {
        name: "batsat",
        plain: batsat_plain,
        incremental: Some(batsat_incremental),
        minimizer: Some(batsat_minimizer),
        prover: true,
    };

    /// A factory for a plain, non-incremental solver
    pub const fn new(name: &'static str, ctor: fn() -> Box<dyn SATSolver>) -> Self {
        Self {
            name,
            plain: ctor,
            incremental: None,
            minimizer: None,
            prover: false,
        }
    }

    /// Name of the backend
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the solvers support removable constraints and assumptions
    pub fn incremental(&self) -> bool {
        self.incremental.is_some()
    }

    /// Whether the solvers support weighted minimization
    pub fn minimizer(&self) -> bool {
        self.minimizer.is_some()
    }

    /// Whether the solvers explain unsatisfiable calls
    pub fn prover(&self) -> bool {
        self.prover
    }

    /// A fresh plain solver
    pub fn instance(&self) -> Box<dyn SATSolver> {
        (self.plain)()
    }

    /// A fresh incremental solver, if supported
    pub fn incremental_instance(&self) -> Option<Box<dyn MinSATSolver>> {
        self.incremental.map(|ctor| ctor())
    }

    /// A fresh minimizing solver, if supported
    pub fn minimizer_instance(&self) -> Option<Box<dyn SATMinimizer>> {
        self.minimizer.map(|ctor| ctor())
    }
}

impl Default for SATFactory {
    fn default() -> Self {
        Self::BATSAT
    }
}

impl fmt::Debug for SATFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SATFactory")
            .field("name", &self.name)
            .field("incremental", &self.incremental())
            .field("minimizer", &self.minimizer())
            .field("prover", &self.prover)
            .finish()
    }
}

impl fmt::Display for SATFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batsat_capabilities() {
        let factory = SATFactory::default();
        assert_eq!(factory.name(), "batsat");
        assert!(factory.incremental());
        assert!(factory.minimizer());
        assert!(factory.prover());
        assert!(factory.incremental_instance().is_some());
    }

    #[test]
    fn plain_factory_has_no_capabilities() {
        let factory = SATFactory::new("plain", batsat_plain);
        assert!(!factory.incremental());
        assert!(!factory.minimizer());
        assert!(factory.incremental_instance().is_none());

        let mut solver = factory.instance();
        solver.add_variables(1);
        solver.add_clause(&[1]);
        assert!(solver.solve().unwrap());
        assert!(solver.value_of(1));
    }

    #[test]
    fn abort_signal_is_shared() {
        let signal = AbortSignal::new();
        let clone = signal.clone();
        assert!(!signal.is_aborted());
        clone.abort();
        assert!(signal.is_aborted());
        signal.reset();
        assert!(!clone.is_aborted());
    }
}
