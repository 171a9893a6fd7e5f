//! Cone-restriction bookkeeping
//!
//! Every model handed out by an enumeration is excluded, together with all
//! of its supersets, by the clause of its negated true literals. The ledger
//! remembers those clauses for the whole session and the handles of the
//! ones currently asserted, so the solver can be lent to another task
//! (clear everything) and taken back (re-assert what is missing).

use log::{trace, warn};
use rustc_hash::FxHashSet;

use super::{ConstraintHandle, MinSATSolver};

/// Clauses a session has recorded and the handles of those asserted
#[derive(Debug, Default)]
pub struct ConstraintLedger {
    clauses: Vec<Vec<i32>>,
    handles: Vec<Option<ConstraintHandle>>,
    seen: FxHashSet<Vec<i32>>,
}

impl ConstraintLedger {
    /// Creates an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// The clause excluding the cone of a model with these true variables
    pub fn cone_clause(true_vars: impl IntoIterator<Item = u32>) -> Vec<i32> {
        true_vars.into_iter().map(|v| -(v as i32)).collect()
    }

    /// Records `clause` and asserts it
    ///
    /// A clause recorded before is not duplicated; it is asserted again only
    /// if its handle is missing.
    pub fn record(&mut self, solver: &mut dyn MinSATSolver, mut clause: Vec<i32>) {
        clause.sort_unstable();
        if !self.seen.insert(clause.clone()) {
            trace!("cone clause {:?} already recorded", clause);
            if let Some(i) = self.clauses.iter().position(|c| *c == clause) {
                self.assert_entry(solver, i);
            }
            return;
        }
        self.clauses.push(clause);
        self.handles.push(None);
        self.assert_entry(solver, self.clauses.len() - 1);
    }

    /// Re-asserts every recorded clause whose handle is missing
    pub fn ensure_asserted(&mut self, solver: &mut dyn MinSATSolver) {
        for i in 0..self.clauses.len() {
            self.assert_entry(solver, i);
        }
    }

    /// Retracts every asserted clause; the clauses stay recorded
    pub fn clear_all(&mut self, solver: &mut dyn MinSATSolver) {
        for handle in self.handles.iter_mut().filter_map(Option::take) {
            solver.remove_constraint(handle);
        }
    }

    /// Number of recorded clauses
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Number of recorded clauses currently asserted
    pub fn num_asserted(&self) -> usize {
        self.handles.iter().filter(|h| h.is_some()).count()
    }

    /// Recorded clauses in recording order
    pub fn clauses(&self) -> impl Iterator<Item = &[i32]> {
        self.clauses.iter().map(Vec::as_slice)
    }

    fn assert_entry(&mut self, solver: &mut dyn MinSATSolver, i: usize) {
        if self.handles[i].is_some() {
            return;
        }
        match solver.add_constraint(&self.clauses[i]) {
            Ok(handle) => self.handles[i] = Some(handle),
            // already implied by the solver's clauses; nothing to add
            Err(e) => warn!("cone clause {:?} not asserted: {}", self.clauses[i], e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{RustSatAdapter, SATSolver};
    use rustsat_batsat::BasicSolver;

    fn solver() -> RustSatAdapter<BasicSolver> {
        let mut solver = RustSatAdapter::<BasicSolver>::default();
        solver.add_variables(2);
        solver.add_clause(&[1, 2]);
        solver
    }

    #[test]
    fn record_clear_and_restore() {
        let mut solver = solver();
        let mut ledger = ConstraintLedger::new();

        ledger.record(&mut solver, ConstraintLedger::cone_clause([1]));
        ledger.record(&mut solver, ConstraintLedger::cone_clause([2]));
        assert_eq!(ledger.num_asserted(), 2);
        assert!(!solver.solve().unwrap());

        ledger.clear_all(&mut solver);
        assert_eq!(ledger.num_asserted(), 0);
        assert_eq!(ledger.len(), 2);
        assert!(solver.solve().unwrap());

        ledger.ensure_asserted(&mut solver);
        ledger.ensure_asserted(&mut solver);
        assert_eq!(ledger.num_asserted(), 2);
        assert_eq!(solver.num_constraints(), 2);
        assert!(!solver.solve().unwrap());
    }

    #[test]
    fn duplicate_clauses_are_recorded_once() {
        let mut solver = solver();
        let mut ledger = ConstraintLedger::new();
        ledger.record(&mut solver, vec![-2, -1]);
        ledger.record(&mut solver, vec![-1, -2]);
        assert_eq!(ledger.len(), 1);
        assert_eq!(solver.num_constraints(), 1);
        assert_eq!(ledger.clauses().next(), Some(&[-2, -1][..]));
    }
}
