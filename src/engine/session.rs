//! A solving session: one translation, its solver, and its cone ledger
//!
//! The solver of a translation is shared by enumeration, minimization and
//! lifting. A session owns it exclusively and is passed by `&mut` to
//! whichever of them runs; the ledger records which cone clauses are live.

use std::time::{Duration, Instant};

use log::debug;

use super::{
    AbortSignal, ConstraintHandle, ConstraintLedger, Contradiction, MinSATSolver, SolverError,
};
use crate::translator::Translation;

/// Cancellation and deadline checks made before every oracle call
#[derive(Debug, Clone, Default)]
pub struct SolveControl {
    abort: AbortSignal,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
}

impl SolveControl {
    /// Creates a control with the given signal and per-call timeout
    pub fn new(abort: AbortSignal, timeout_ms: Option<u64>) -> Self {
        Self {
            abort,
            timeout: timeout_ms.map(Duration::from_millis),
            deadline: None,
        }
    }

    /// Starts the clock for one public call
    pub fn arm(&mut self) {
        self.deadline = self.timeout.map(|t| Instant::now() + t);
    }

    /// Fails if the call was aborted or its deadline has passed
    pub fn check(&self) -> Result<(), SolverError> {
        if self.abort.is_aborted() {
            return Err(SolverError::Aborted);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(SolverError::Timeout),
            _ => Ok(()),
        }
    }
}

/// Exclusive owner of a translation's solver during enumeration
pub struct Session {
    translation: Translation<dyn MinSATSolver>,
    ledger: ConstraintLedger,
    control: SolveControl,
    calls: u64,
}

impl Session {
    /// Wraps a translation whose solver supports removable constraints
    pub fn new(translation: Translation<dyn MinSATSolver>, control: SolveControl) -> Self {
        Self {
            translation,
            ledger: ConstraintLedger::new(),
            control,
            calls: 0,
        }
    }

    /// The translation driven by this session
    pub fn translation(&self) -> &Translation<dyn MinSATSolver> {
        &self.translation
    }

    /// The cone ledger
    pub fn ledger(&self) -> &ConstraintLedger {
        &self.ledger
    }

    /// Number of oracle calls made so far
    pub fn calls(&self) -> u64 {
        self.calls
    }

    /// Number of primary variables
    pub fn num_primary_variables(&self) -> u32 {
        self.translation.num_primary_variables()
    }

    /// Starts the deadline clock for one public call
    pub fn arm(&mut self) {
        self.control.arm();
    }

    /// Calls the oracle under the translation's root assumptions plus `assumptions`
    pub fn solve(&mut self, assumptions: &[i32]) -> Result<bool, SolverError> {
        self.control.check()?;
        self.calls += 1;
        let roots = self.translation.assumptions();
        if roots.is_empty() {
            return self.translation.cnf_mut().solve_assuming(assumptions);
        }
        let mut all = Vec::with_capacity(roots.len() + assumptions.len());
        all.extend_from_slice(roots);
        all.extend_from_slice(assumptions);
        self.translation.cnf_mut().solve_assuming(&all)
    }

    /// Value of `var` in the current model
    pub fn value_of(&self, var: u32) -> bool {
        self.translation.cnf().value_of(var)
    }

    /// Primary variables true in the current model, ascending
    pub fn true_primaries(&self) -> Vec<u32> {
        (1..=self.num_primary_variables()).filter(|&v| self.value_of(v)).collect()
    }

    /// Adds a removable constraint outside the ledger
    pub fn add_constraint(&mut self, clause: &[i32]) -> Result<ConstraintHandle, Contradiction> {
        self.translation.cnf_mut().add_constraint(clause)
    }

    /// Retracts a constraint added with [`add_constraint`](Self::add_constraint)
    pub fn remove_constraint(&mut self, handle: ConstraintHandle) {
        self.translation.cnf_mut().remove_constraint(handle);
    }

    /// Records and asserts the cone clause of the current model
    pub fn exclude_current_cone(&mut self) {
        let clause = ConstraintLedger::cone_clause(self.true_primaries());
        debug!("excluding cone of {} true primaries", clause.len());
        self.ledger.record(self.translation.cnf_mut(), clause);
    }

    /// Re-asserts every recorded cone clause that is not live
    pub fn ensure_asserted(&mut self) {
        self.ledger.ensure_asserted(self.translation.cnf_mut());
    }

    /// Retracts every live cone clause
    pub fn clear_all(&mut self) {
        self.ledger.clear_all(self.translation.cnf_mut());
    }

    /// Ends the session, handing back its translation
    pub fn into_translation(self) -> Translation<dyn MinSATSolver> {
        self.translation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_reports_abort_before_timeout() {
        let signal = AbortSignal::new();
        let mut control = SolveControl::new(signal.clone(), Some(0));
        assert!(control.check().is_ok());
        control.arm();
        assert_eq!(control.check(), Err(SolverError::Timeout));
        signal.abort();
        assert_eq!(control.check(), Err(SolverError::Aborted));
    }

    #[test]
    fn control_without_timeout() {
        let mut control = SolveControl::new(AbortSignal::new(), None);
        control.arm();
        assert!(control.check().is_ok());
    }
}
