//! Adapters for rustsat solver backends
//!
//! Provides adapters to use rustsat-compatible SAT solvers with kodkod.
//! Removable constraints are guarded by a fresh selector variable: the
//! clause `c ∨ ¬s` is added for good and `s` is assumed on every call while
//! the constraint is live. Removing it asserts `¬s`.
//!
//! Selectors, their clauses and the cost encoding are bookkeeping: they are
//! left out of [`num_variables`](SATSolver::num_variables) and
//! [`num_clauses`](SATSolver::num_clauses), which describe the translated CNF.

use std::collections::{BTreeMap, BTreeSet};

use log::trace;
use rustsat::encodings::pb::{BoundUpper, BoundUpperIncremental, DbGte};
use rustsat::instances::{BasicVarManager, Cnf, ManageVars};
use rustsat::solvers::{Solve, SolveIncremental, SolverResult};
use rustsat::types::{Clause, Lit, TernaryVal, Var};

use super::{
    ConstraintHandle, Contradiction, MinSATSolver, SATMinimizer, SATProver, SATSolver, SolverError,
};

/// Adapter that wraps rustsat solvers to implement our solver traits
///
/// This allows any incremental rustsat solver to be used with kodkod.
///
/// # Example
///
/// ```ignore
/// use rustsat_batsat::BasicSolver;
/// let solver = RustSatAdapter::new(BasicSolver::default());
/// ```
pub struct RustSatAdapter<S> {
    solver: S,
    /// Every allocated variable, bookkeeping included
    num_vars: u32,
    aux_vars: u32,
    num_clauses: u32,
    /// Model of the last satisfiable call, indexed by variable
    model: Vec<bool>,
    selectors: BTreeSet<u32>,
    failed: Vec<i32>,
    costs: BTreeMap<u32, u32>,
}

impl<S: Default> Default for RustSatAdapter<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> RustSatAdapter<S> {
    /// Creates a new adapter wrapping the given solver
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            num_vars: 0,
            aux_vars: 0,
            num_clauses: 0,
            model: Vec::new(),
            selectors: BTreeSet::new(),
            failed: Vec::new(),
            costs: BTreeMap::new(),
        }
    }

    /// Number of constraints currently live
    pub fn num_constraints(&self) -> usize {
        self.selectors.len()
    }

    fn model_cost(&self) -> u64 {
        self.costs
            .iter()
            .filter(|&(&var, _)| self.value_of_model(var))
            .map(|(_, &w)| u64::from(w))
            .sum()
    }

    fn value_of_model(&self, var: u32) -> bool {
        self.model.get(var as usize).copied().unwrap_or(false)
    }
}

fn backend<E: ToString>(e: E) -> SolverError {
    SolverError::Backend(e.to_string())
}

fn to_lit(lit: i32) -> Lit {
    debug_assert_ne!(lit, 0);
    let var = Var::new(lit.unsigned_abs() - 1);
    if lit > 0 { var.pos_lit() } else { var.neg_lit() }
}

fn from_lit(lit: Lit) -> i32 {
    let var = (lit.var().idx32() + 1) as i32;
    if lit.is_neg() { -var } else { var }
}

impl<S: Solve + SolveIncremental + Default> RustSatAdapter<S> {
    fn reserve(&mut self, num_vars: u32) {
        if num_vars == 0 {
            return;
        }
        self.num_vars += num_vars;
        if let Err(e) = self.solver.reserve(Var::new(self.num_vars - 1)) {
            trace!("reserve failed: {}", e);
        }
    }

    fn aux_variable(&mut self) -> u32 {
        self.aux_vars += 1;
        self.reserve(1);
        self.num_vars
    }

    fn add_aux_clause(&mut self, lits: &[i32]) -> bool {
        let clause: Clause = lits.iter().copied().map(to_lit).collect();
        self.solver.add_clause(clause).is_ok()
    }

    /// Adds clauses produced by an encoding along with the variables it allocated
    fn absorb(&mut self, clauses: Cnf, var_manager: &BasicVarManager) -> Result<(), SolverError> {
        let used = var_manager.max_var().map_or(0, |var| var.idx32() + 1);
        if used > self.num_vars {
            let fresh = used - self.num_vars;
            self.aux_vars += fresh;
            self.reserve(fresh);
        }
        for clause in clauses {
            self.solver.add_clause(clause).map_err(backend)?;
        }
        Ok(())
    }

    fn solve_internal(&mut self, assumptions: &[i32]) -> Result<bool, SolverError> {
        let lits: Vec<Lit> = self
            .selectors
            .iter()
            .map(|&s| s as i32)
            .chain(assumptions.iter().copied())
            .map(to_lit)
            .collect();

        let result = self
            .solver
            .solve_assumps(&lits)
            .map_err(backend)?;
        match result {
            SolverResult::Sat => {
                self.failed.clear();
                if self.num_vars > 0 {
                    let assignment = self
                        .solver
                        .solution(Var::new(self.num_vars - 1))
                        .map_err(backend)?;
                    self.model.clear();
                    self.model.push(false);
                    self.model.extend(
                        (0..self.num_vars).map(|v| assignment.var_value(Var::new(v)) == TernaryVal::True),
                    );
                }
                Ok(true)
            }
            SolverResult::Unsat => {
                // the core holds the negations of the failed assumptions
                let core = self.solver.core().map_err(backend)?;
                let requested: BTreeSet<i32> = assumptions.iter().copied().collect();
                self.failed = core
                    .into_iter()
                    .map(|lit| -from_lit(lit))
                    .filter(|lit| requested.contains(lit))
                    .collect();
                Ok(false)
            }
            SolverResult::Interrupted => Err(SolverError::Aborted),
        }
    }
}

impl<S: Solve + SolveIncremental + Default> SATSolver for RustSatAdapter<S> {
    fn add_variables(&mut self, num_vars: u32) {
        self.reserve(num_vars);
    }

    fn new_variable(&mut self) -> u32 {
        self.reserve(1);
        self.num_vars
    }

    fn add_clause(&mut self, lits: &[i32]) -> bool {
        let clause: Clause = lits.iter().copied().map(to_lit).collect();
        self.num_clauses += 1;
        self.solver.add_clause(clause).is_ok()
    }

    fn solve_assuming(&mut self, assumptions: &[i32]) -> Result<bool, SolverError> {
        self.solve_internal(assumptions)
    }

    fn value_of(&self, var: u32) -> bool {
        self.value_of_model(var)
    }

    fn num_variables(&self) -> u32 {
        self.num_vars - self.aux_vars
    }

    fn num_clauses(&self) -> u32 {
        self.num_clauses
    }

    fn free(&mut self) {
        self.solver = S::default();
        self.model = Vec::new();
        self.selectors.clear();
        self.failed.clear();
    }

    fn as_prover(&self) -> Option<&dyn SATProver> {
        Some(self)
    }
}

impl<S: Solve + SolveIncremental + Default> MinSATSolver for RustSatAdapter<S> {
    fn add_constraint(&mut self, lits: &[i32]) -> Result<ConstraintHandle, Contradiction> {
        let selector = self.aux_variable();
        let mut guarded = lits.to_vec();
        guarded.push(-(selector as i32));
        if !self.add_aux_clause(&guarded) {
            return Err(Contradiction);
        }
        self.selectors.insert(selector);
        Ok(ConstraintHandle(selector))
    }

    fn remove_constraint(&mut self, handle: ConstraintHandle) {
        if self.selectors.remove(&handle.0) {
            self.add_aux_clause(&[-(handle.0 as i32)]);
        }
    }
}

impl<S: Solve + SolveIncremental + Default> SATProver for RustSatAdapter<S> {
    fn failed_assumptions(&self) -> &[i32] {
        &self.failed
    }
}

impl<S: Solve + SolveIncremental + Default> SATMinimizer for RustSatAdapter<S> {
    fn set_cost(&mut self, var: u32, cost: u32) {
        if cost == 0 {
            self.costs.remove(&var);
        } else {
            self.costs.insert(var, cost);
        }
    }

    fn solve_min_cost(&mut self) -> Result<bool, SolverError> {
        if !self.solve_internal(&[])? {
            return Ok(false);
        }
        if self.costs.is_empty() {
            return Ok(true);
        }

        let mut encoding: DbGte = self
            .costs
            .iter()
            .map(|(&var, &w)| (to_lit(var as i32), w as usize))
            .collect();
        let mut var_manager = BasicVarManager::default();
        var_manager.increase_next_free(Var::new(self.num_vars));

        let mut best = self.model_cost();
        let mut best_model = self.model.clone();
        trace!("initial cost {}", best);

        while best > 0 {
            let bound = (best - 1) as usize;
            let mut clauses = Cnf::new();
            encoding
                .encode_ub_change(bound..bound + 1, &mut clauses, &mut var_manager)
                .map_err(backend)?;
            self.absorb(clauses, &var_manager)?;
            let assumptions: Vec<i32> = encoding
                .enforce_ub(bound)
                .map_err(backend)?
                .into_iter()
                .map(from_lit)
                .collect();
            if !self.solve_internal(&assumptions)? {
                break;
            }
            best = self.model_cost();
            best_model = self.model.clone();
            trace!("improved cost to {}", best);
        }
        self.model = best_model;
        Ok(true)
    }
}
