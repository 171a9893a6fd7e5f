//! Enumeration of minimal solutions
//!
//! The iterator starts untranslated. Translating either yields a trivial
//! formula, answered from the bounds alone, or a live session whose solver
//! is kept between calls. Every model returned from a live session is
//! minimized first and its cone is excluded before the next call, so no
//! model or superset of it comes back. A trivially true formula is replaced
//! by a residual formula that rules out the model just returned.

use std::time::{Duration, Instant};

use log::{debug, info};

use super::Options;
use crate::ast::{Expression, Formula, Relation};
use crate::engine::{LifterComputer, MinSATSolver, Minimizer, Session, SolverError};
use crate::error::{KodkodError, Result};
use crate::instance::{Bounds, Instance};
use crate::solution::{ResultBuilder, Solution, Statistics};
use crate::translator::{Translation, TranslationResult, Translator, TrivialFormula};

enum State {
    Untranslated {
        formula: Formula,
        bounds: Bounds,
    },
    Live {
        session: Session,
        bounds: Bounds,
        translation_time: Duration,
        /// True primaries of the last model handed out
        model: Option<Vec<u32>>,
    },
    Exhausted,
}

/// Lazy, one-pass sequence of minimal solutions
///
/// Ends with exactly one unsatisfiable (or trivially unsatisfiable)
/// solution. Built by [`MinSolver::solve_all`](super::MinSolver::solve_all)
/// and [`MinSolver::lift`](super::MinSolver::lift).
pub struct MinSolutionIterator {
    options: Options,
    state: State,
    assumptions: Option<Vec<i32>>,
    trivial: usize,
}

impl MinSolutionIterator {
    pub(super) fn new(
        formula: Formula,
        bounds: Bounds,
        options: Options,
        assumptions: Option<Vec<i32>>,
    ) -> Self {
        Self {
            options,
            state: State::Untranslated { formula, bounds },
            assumptions,
            trivial: 0,
        }
    }

    /// Whether another solution can be requested
    pub fn has_next(&self) -> bool {
        !matches!(self.state, State::Exhausted)
    }

    /// The live translation, if the formula has been translated and not exhausted
    pub fn translation(&self) -> Option<&Translation<dyn MinSATSolver>> {
        match &self.state {
            State::Live { session, .. } => Some(session.translation()),
            _ => None,
        }
    }

    /// Number of trivial solutions handed out so far
    pub fn trivial_count(&self) -> usize {
        self.trivial
    }

    /// Returns the next solution
    ///
    /// Fails with [`KodkodError::NoMoreSolutions`] once exhausted. An aborted
    /// call leaves the iterator where it was, so the call can be repeated
    /// once the signal is reset; any other error, timeouts included,
    /// exhausts it.
    pub fn next_solution(&mut self) -> Result<Solution> {
        match std::mem::replace(&mut self.state, State::Exhausted) {
            State::Exhausted => Err(KodkodError::NoMoreSolutions),
            State::Untranslated { formula, bounds } => self.translate(formula, bounds),
            State::Live {
                session,
                bounds,
                translation_time,
                model,
            } => self.non_trivial(session, bounds, translation_time, model),
        }
    }

    /// The tuples that extend the last solution to another model
    ///
    /// Every cone clause is retracted while lifting and asserted again by
    /// the next call to [`next_solution`](Self::next_solution).
    pub fn lifters(&mut self) -> Result<Instance> {
        match &mut self.state {
            State::Live {
                session,
                model: Some(model),
                ..
            } => {
                session.arm();
                let vars = LifterComputer::compute(session, model)?;
                debug!("{} lifters", vars.len());
                session.translation().var_map().instance_of(vars)
            }
            _ => Err(KodkodError::IllegalState(
                "lifters need a solution from a live translation".to_string(),
            )),
        }
    }

    fn translate(&mut self, formula: Formula, bounds: Bounds) -> Result<Solution> {
        let factory = self.options.solver;
        let start = Instant::now();
        let translated = Translator::translate(
            &formula,
            &bounds,
            &self.options.bool_options,
            self.options.log_translation,
            || {
                factory.incremental_instance().ok_or_else(|| {
                    KodkodError::IllegalState(format!("{} is not incremental", factory))
                })
            },
        )?;
        let translation_time = start.elapsed();

        match translated {
            TranslationResult::Trivial(trivial) => {
                self.trivial_solution(bounds, trivial, translation_time)
            }
            TranslationResult::Translated(translation) => {
                let session = Session::new(translation, self.options.control());
                self.non_trivial(session, bounds, translation_time, None)
            }
        }
    }

    fn non_trivial(
        &mut self,
        mut session: Session,
        bounds: Bounds,
        translation_time: Duration,
        previous: Option<Vec<u32>>,
    ) -> Result<Solution> {
        session.arm();
        session.ensure_asserted();
        let translation = session.translation();
        self.options.reporter.solving_cnf(
            translation.num_primary_variables(),
            translation.cnf().num_variables(),
            translation.cnf().num_clauses(),
        );

        let assumptions = self.assumptions.clone().unwrap_or_default();
        let start = Instant::now();
        let found = search(&mut session, &assumptions);
        let solving_time = start.elapsed();

        match found {
            Err(SolverError::Aborted) => {
                info!("enumeration aborted");
                self.state = State::Live {
                    session,
                    bounds,
                    translation_time,
                    model: previous,
                };
                Err(KodkodError::Aborted)
            }
            Err(e) => Err(e.into()),
            Ok(true) => {
                let stats = Statistics::of(session.translation(), translation_time, solving_time);
                let solution = ResultBuilder::sat(session.translation(), &bounds, stats);
                let model = session.true_primaries();
                session.exclude_current_cone();
                self.state = State::Live {
                    session,
                    bounds,
                    translation_time,
                    model: Some(model),
                };
                solution
            }
            Ok(false) => {
                debug!("enumeration exhausted after {} oracle calls", session.calls());
                let stats = Statistics::of(session.translation(), translation_time, solving_time);
                let mut translation = session.into_translation();
                Ok(ResultBuilder::unsat(&mut translation, stats))
            }
        }
    }

    /// Answers a constant formula and sets up the residual one
    fn trivial_solution(
        &mut self,
        bounds: Bounds,
        trivial: TrivialFormula,
        translation_time: Duration,
    ) -> Result<Solution> {
        self.trivial += 1;
        let solution = ResultBuilder::trivial(&bounds, &trivial, translation_time)?;
        if !trivial.value {
            return Ok(solution);
        }

        let mut residual = trivial.bounds.clone();
        let mut changes = Vec::new();
        for relation in trivial.bounds.relations() {
            let (Some(lower), Some(upper)) = (
                trivial.bounds.lower_bound(relation),
                trivial.bounds.upper_bound(relation),
            ) else {
                continue;
            };
            if lower == upper {
                continue;
            }
            if lower.is_empty() {
                changes.push(Expression::from(relation).some());
            } else {
                let marker = Relation::nary(
                    format!("{}_trivial{}", relation.name(), self.trivial),
                    relation.arity(),
                );
                residual.bound_exactly(&marker, lower.clone())?;
                changes.push(Expression::from(relation).equals(Expression::from(&marker)).not());
            }
        }

        let formula = if changes.is_empty() {
            Formula::FALSE
        } else {
            trivial.formula.clone().and(Formula::or_all(changes))
        };
        debug!("residual formula after trivial solution {}: {}", self.trivial, formula);
        self.state = State::Untranslated {
            formula,
            bounds: residual,
        };
        Ok(solution)
    }
}

/// Finds a model under `assumptions` and minimizes it
fn search(session: &mut Session, assumptions: &[i32]) -> std::result::Result<bool, SolverError> {
    if !session.solve(assumptions)? {
        return Ok(false);
    }
    let rounds = Minimizer::minimize(session, assumptions)?;
    debug!("minimized in {} rounds", rounds);
    Ok(true)
}

impl Iterator for MinSolutionIterator {
    type Item = Result<Solution>;

    /// Unlike [`next_solution`](MinSolutionIterator::next_solution), ends the
    /// sequence after any error.
    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }
        let next = self.next_solution();
        if next.is_err() {
            self.state = State::Exhausted;
        }
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Universe;
    use crate::solver::MinSolver;

    fn bounds(exact: bool) -> (Bounds, Relation) {
        let universe = Universe::new(&["t1", "t2"]).unwrap();
        let mut bounds = Bounds::new(universe);
        let a = Relation::unary("A");
        let f = bounds.factory();
        if exact {
            bounds.bound_exactly(&a, f.tuple_set(&[&["t1"]]).unwrap()).unwrap();
        } else {
            bounds.bound(&a, f.tuple_set(&[&["t1"]]).unwrap(), f.all(1)).unwrap();
        }
        (bounds, a)
    }

    #[test]
    fn trivial_true_formula_gets_residual() {
        let (bounds, a) = bounds(false);
        let solver = MinSolver::default();
        let mut solutions = solver.solve_all(&Formula::TRUE, &bounds).unwrap();

        let first = solutions.next_solution().unwrap();
        assert!(first.is_trivial() && first.is_sat());
        assert_eq!(solutions.trivial_count(), 1);
        assert!(solutions.translation().is_none());

        let second = solutions.next_solution().unwrap();
        assert!(second.is_sat());
        assert_eq!(second.instance().unwrap().tuples(&a).unwrap().size(), 2);

        let last = solutions.next_solution().unwrap();
        assert!(last.is_unsat());
        assert!(!solutions.has_next());
        assert!(matches!(solutions.next_solution(), Err(KodkodError::NoMoreSolutions)));
    }

    #[test]
    fn fixed_bounds_collapse_to_false() {
        let (bounds, _) = bounds(true);
        let mut solutions = MinSolver::default().solve_all(&Formula::TRUE, &bounds).unwrap();
        assert!(solutions.next_solution().unwrap().is_trivial());
        let last = solutions.next_solution().unwrap();
        assert!(last.is_trivial() && last.is_unsat());
        assert!(!solutions.has_next());
    }

    #[test]
    fn lifters_need_a_solution() {
        let (bounds, a) = bounds(false);
        let mut solutions = MinSolver::default()
            .solve_all(&Expression::from(&a).some(), &bounds)
            .unwrap();
        assert!(matches!(solutions.lifters(), Err(KodkodError::IllegalState(_))));
    }

    #[test]
    fn iterator_stops_after_unsat() {
        let (bounds, a) = bounds(false);
        let formula = Expression::from(&a).no();
        let solutions: Vec<_> = MinSolver::default().solve_all(&formula, &bounds).unwrap().collect();
        assert_eq!(solutions.len(), 1);
        assert!(solutions[0].as_ref().unwrap().is_unsat());
    }
}
