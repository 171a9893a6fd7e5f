//! Main solver API
//!
//! The solver translates relational formulas to SAT and finds minimal
//! solutions: one at a time, all of them in sequence, or the cheapest one
//! under a per-relation cost.

mod iterator;

pub use crate::engine::AbortSignal;
pub use iterator::MinSolutionIterator;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use log::debug;
use rustc_hash::FxHashMap;

use crate::ast::{Formula, Relation};
use crate::bool::Options as BoolOptions;
use crate::engine::{
    MinSATSolver, Minimizer, SATFactory, SATMinimizer, SATSolver, Session, SolveControl,
};
use crate::error::{KodkodError, Result};
use crate::instance::{Bounds, Instance};
use crate::solution::{ResultBuilder, Solution, Statistics};
use crate::translator::{Translation, TranslationResult, Translator};

/// Receives progress notifications; purely observational
pub trait Reporter: Send + Sync {
    /// Called before every solver invocation
    fn solving_cnf(&self, primary_vars: u32, vars: u32, clauses: u32);
}

/// Forwards notifications to the `log` facade at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn solving_cnf(&self, primary_vars: u32, vars: u32, clauses: u32) {
        debug!(
            "solving p cnf {} {} ({} primary variables)",
            vars, clauses, primary_vars
        );
    }
}

/// Ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn solving_cnf(&self, _primary_vars: u32, _vars: u32, _clauses: u32) {}
}

/// Solver options
#[derive(Clone)]
pub struct Options {
    /// Boolean circuit options
    pub bool_options: BoolOptions,
    /// SAT backend
    pub solver: SATFactory,
    /// Progress reporter
    pub reporter: Arc<dyn Reporter>,
    /// Translation logging level (0 = off); unsat results carry proofs only when on
    pub log_translation: u8,
    /// Per-call timeout in milliseconds (None = no timeout)
    ///
    /// Checked before every solver invocation; a call running past it fails
    /// with [`KodkodError::Timeout`].
    pub timeout_ms: Option<u64>,
    /// Cancellation flag checked before every solver invocation
    pub abort: AbortSignal,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            bool_options: BoolOptions::default(),
            solver: SATFactory::default(),
            reporter: Arc::new(LogReporter),
            log_translation: 0,
            timeout_ms: None,
            abort: AbortSignal::new(),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("bool_options", &self.bool_options)
            .field("solver", &self.solver)
            .field("log_translation", &self.log_translation)
            .field("timeout_ms", &self.timeout_ms)
            .field("aborted", &self.abort.is_aborted())
            .finish()
    }
}

impl Options {
    fn control(&self) -> SolveControl {
        let mut control = SolveControl::new(self.abort.clone(), self.timeout_ms);
        control.arm();
        control
    }

    fn require_incremental(&self) -> Result<()> {
        if self.solver.incremental() {
            Ok(())
        } else {
            Err(KodkodError::IllegalState(format!(
                "cannot enumerate solutions without an incremental solver ({})",
                self.solver
            )))
        }
    }
}

/// Weight of the tuples of a relation
pub trait Cost {
    /// Cost of making one tuple of `relation` true
    fn edge_cost(&self, relation: &Relation) -> u32;
}

/// A map-backed [`Cost`] with a default for unlisted relations
#[derive(Debug, Clone, Default)]
pub struct RelationCost {
    costs: FxHashMap<Relation, u32>,
    default: u32,
}

impl RelationCost {
    /// Every relation costs `default`
    pub fn new(default: u32) -> Self {
        Self {
            costs: FxHashMap::default(),
            default,
        }
    }

    /// Sets the cost of `relation`
    pub fn with(mut self, relation: &Relation, cost: u32) -> Self {
        self.costs.insert(relation.clone(), cost);
        self
    }
}

impl Cost for RelationCost {
    fn edge_cost(&self, relation: &Relation) -> u32 {
        self.costs.get(relation).copied().unwrap_or(self.default)
    }
}

/// Minimal-model solver (uses batsat by default)
///
/// Translates relational logic formulas to SAT and finds instances none of
/// whose tuples can be dropped.
#[derive(Debug, Clone, Default)]
pub struct MinSolver {
    options: Options,
}

impl MinSolver {
    /// Creates a new solver with the given options
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Returns the options
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Solves a formula with the given bounds
    ///
    /// With an incremental backend the model is minimized before it is
    /// returned; a plain backend returns whatever model it finds.
    pub fn solve(&self, formula: &Formula, bounds: &Bounds) -> Result<Solution> {
        let factory = self.options.solver;
        if !factory.incremental() {
            return self.solve_plain(formula, bounds);
        }
        let make = || factory.incremental_instance().ok_or_else(|| no_backend(&factory));
        self.solve_translated(formula, bounds, make, |session| {
            let sat = session.solve(&[])?;
            if sat {
                let rounds = Minimizer::minimize(session, &[])?;
                debug!("minimized in {} rounds", rounds);
            }
            Ok(sat)
        })
    }

    fn solve_translated(
        &self,
        formula: &Formula,
        bounds: &Bounds,
        make: impl FnOnce() -> Result<Box<dyn MinSATSolver>>,
        search: impl FnOnce(&mut Session) -> Result<bool>,
    ) -> Result<Solution> {
        let start = Instant::now();
        let translated = Translator::translate(
            formula,
            bounds,
            &self.options.bool_options,
            self.options.log_translation,
            make,
        )?;
        let translation_time = start.elapsed();

        let translation = match translated {
            TranslationResult::Trivial(trivial) => {
                return ResultBuilder::trivial(bounds, &trivial, translation_time);
            }
            TranslationResult::Translated(translation) => translation,
        };
        self.report(&translation);

        let mut session = Session::new(translation, self.options.control());
        let start = Instant::now();
        let sat = search(&mut session)?;
        let stats = Statistics::of(session.translation(), translation_time, start.elapsed());
        let mut translation = session.into_translation();
        finish(&mut translation, bounds, sat, stats)
    }

    fn solve_plain(&self, formula: &Formula, bounds: &Bounds) -> Result<Solution> {
        let factory = self.options.solver;
        let start = Instant::now();
        let translated = Translator::translate(
            formula,
            bounds,
            &self.options.bool_options,
            self.options.log_translation,
            || Ok(factory.instance()),
        )?;
        let translation_time = start.elapsed();

        let mut translation = match translated {
            TranslationResult::Trivial(trivial) => {
                return ResultBuilder::trivial(bounds, &trivial, translation_time);
            }
            TranslationResult::Translated(translation) => translation,
        };
        self.report(&translation);

        self.options.control().check()?;
        let start = Instant::now();
        let roots = translation.assumptions().to_vec();
        let sat = translation.cnf_mut().solve_assuming(&roots)?;
        let stats = Statistics::of(&translation, translation_time, start.elapsed());
        finish(&mut translation, bounds, sat, stats)
    }

    /// Solves for a model of least total cost
    ///
    /// Every primary variable of a relation costs
    /// [`Cost::edge_cost`] of that relation. Requires a minimizing backend
    /// and translation logging off.
    pub fn solve_with_cost(&self, formula: &Formula, bounds: &Bounds, cost: &dyn Cost) -> Result<Solution> {
        let factory = self.options.solver;
        if self.options.log_translation > 0 || !factory.minimizer() {
            return Err(KodkodError::IllegalState(format!(
                "cost minimization needs a minimizing solver and no translation log ({}, log level {})",
                factory, self.options.log_translation
            )));
        }

        let start = Instant::now();
        let translated = Translator::translate(
            formula,
            bounds,
            &self.options.bool_options,
            self.options.log_translation,
            || factory.minimizer_instance().ok_or_else(|| no_backend(&factory)),
        )?;
        let translation_time = start.elapsed();

        let mut translation: Translation<dyn SATMinimizer> = match translated {
            TranslationResult::Trivial(trivial) => {
                return ResultBuilder::trivial(bounds, &trivial, translation_time);
            }
            TranslationResult::Translated(translation) => translation,
        };

        for relation in bounds.relations() {
            let weight = cost.edge_cost(relation);
            for var in translation.primary_variables(relation) {
                translation.cnf_mut().set_cost(var, weight);
            }
        }
        let cnf = translation.cnf();
        self.options.reporter.solving_cnf(0, cnf.num_variables(), cnf.num_clauses());

        self.options.control().check()?;
        let start = Instant::now();
        let sat = translation.cnf_mut().solve_min_cost()?;
        let stats = Statistics::of(&translation, translation_time, start.elapsed());
        finish(&mut translation, bounds, sat, stats)
    }

    /// Enumerates the minimal solutions of a formula
    ///
    /// The iterator yields every minimal model once and ends with exactly
    /// one unsatisfiable solution. Requires an incremental backend.
    pub fn solve_all(&self, formula: &Formula, bounds: &Bounds) -> Result<MinSolutionIterator> {
        self.options.require_incremental()?;
        Ok(MinSolutionIterator::new(
            formula.clone(),
            bounds.clone(),
            self.options.clone(),
            None,
        ))
    }

    /// Enumerates the minimal solutions that contain `solution` and `lifters`
    ///
    /// `translation` must come from translating `formula` against `bounds`
    /// (see [`MinSolutionIterator::translation`]); the fresh enumeration
    /// numbers its variables the same way and assumes the corresponding
    /// tuples true. Lower-bound tuples need no assumption; tuples outside
    /// the upper bound are rejected.
    pub fn lift<S: ?Sized + SATSolver>(
        &self,
        formula: &Formula,
        bounds: &Bounds,
        translation: &Translation<S>,
        solution: &Solution,
        lifters: &Instance,
    ) -> Result<MinSolutionIterator> {
        self.options.require_incremental()?;

        let mut assumptions = Vec::new();
        let tuples = solution
            .instance()
            .into_iter()
            .flat_map(Instance::relation_tuples)
            .chain(lifters.relation_tuples());
        for (relation, set) in tuples {
            for tuple in set.iter() {
                match translation.var_map().variable_of(relation, tuple) {
                    Some(var) => assumptions.push(var as i32),
                    None if bounds.lower_bound(relation).is_some_and(|l| l.contains(tuple)) => {}
                    None if !bounds.contains(relation) => {}
                    None => {
                        return Err(KodkodError::InvalidArgument(format!(
                            "{} is outside the upper bound of {}",
                            tuple, relation
                        )));
                    }
                }
            }
        }
        assumptions.sort_unstable();
        assumptions.dedup();
        debug!("lifting with {} assumptions", assumptions.len());

        Ok(MinSolutionIterator::new(
            formula.clone(),
            bounds.clone(),
            self.options.clone(),
            Some(assumptions),
        ))
    }

    /// The tuples that can be added to the iterator's current model
    ///
    /// Each returned tuple is true in some model that keeps every tuple of
    /// the current one. Fails if the iterator has no live translation.
    pub fn lifters(&self, iterator: &mut MinSolutionIterator) -> Result<Instance> {
        iterator.lifters()
    }

    fn report<S: ?Sized + SATSolver>(&self, translation: &Translation<S>) {
        let cnf = translation.cnf();
        self.options.reporter.solving_cnf(
            translation.num_primary_variables(),
            cnf.num_variables(),
            cnf.num_clauses(),
        );
    }
}

impl fmt::Display for MinSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.options)
    }
}

fn no_backend(factory: &SATFactory) -> KodkodError {
    KodkodError::IllegalState(format!("{} cannot build the required solver", factory))
}

/// Builds the solution of a one-shot solve and releases the solver
fn finish<S: ?Sized + SATSolver>(
    translation: &mut Translation<S>,
    bounds: &Bounds,
    sat: bool,
    stats: Statistics,
) -> Result<Solution> {
    if sat {
        let solution = ResultBuilder::sat(translation, bounds, stats);
        translation.cnf_mut().free();
        solution
    } else {
        Ok(ResultBuilder::unsat(translation, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expression;
    use crate::instance::Universe;

    fn people() -> (Bounds, Relation) {
        let universe = Universe::new(&["A", "B", "C"]).unwrap();
        let mut bounds = Bounds::new(universe);
        let person = Relation::unary("Person");
        let factory = bounds.universe().factory();
        bounds.bound(&person, factory.none(1), factory.all(1)).unwrap();
        (bounds, person)
    }

    #[test]
    fn solve_returns_minimal_model() {
        let (bounds, person) = people();
        let solver = MinSolver::new(Options::default());
        let solution = solver.solve(&Expression::from(&person).some(), &bounds).unwrap();
        assert!(solution.is_sat());
        assert_eq!(solution.instance().unwrap().tuples(&person).unwrap().size(), 1);
        assert_eq!(solution.statistics().primary_variables(), 3);
    }

    #[test]
    fn solver_basic_unsat() {
        let (bounds, person) = people();
        let formula = Expression::from(&person).some().and(Expression::from(&person).no());
        let solution = MinSolver::default().solve(&formula, &bounds).unwrap();
        assert!(solution.is_unsat());
        assert!(solution.proof().is_none());
    }

    #[test]
    fn relation_cost_defaults() {
        let (_, person) = people();
        let other = Relation::unary("Other");
        let cost = RelationCost::new(2).with(&person, 7);
        assert_eq!(cost.edge_cost(&person), 7);
        assert_eq!(cost.edge_cost(&other), 2);
    }

    #[test]
    fn solver_options() {
        let options = Options {
            timeout_ms: Some(5000),
            reporter: Arc::new(NullReporter),
            ..Options::default()
        };
        let solver = MinSolver::new(options);
        assert!(solver.options().timeout_ms.is_some());
        assert!(solver.to_string().contains("batsat"));
    }
}
