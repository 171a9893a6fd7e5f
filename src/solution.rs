//! Solutions of relational formulas and the statistics that come with them

use std::fmt;
use std::time::Duration;

use crate::ast::Relation;
use crate::engine::SATSolver;
use crate::error::Result;
use crate::instance::{Bounds, Instance};
use crate::proof::Proof;
use crate::translator::{Translation, TrivialFormula};

/// The kind of a solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// A solver found a model
    Satisfiable,
    /// A solver proved there is no (further) model
    Unsatisfiable,
    /// The formula folded to TRUE during translation
    TriviallySatisfiable,
    /// The formula folded to FALSE during translation
    TriviallyUnsatisfiable,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Satisfiable => "SATISFIABLE",
            Outcome::Unsatisfiable => "UNSATISFIABLE",
            Outcome::TriviallySatisfiable => "TRIVIALLY_SATISFIABLE",
            Outcome::TriviallyUnsatisfiable => "TRIVIALLY_UNSATISFIABLE",
        };
        f.write_str(s)
    }
}

/// Solution to a relational formula
#[derive(Debug, Clone)]
pub enum Solution {
    /// Formula is satisfiable
    Sat {
        /// Minimal satisfying instance, padded with lower bounds
        instance: Instance,
        /// Solving statistics
        stats: Statistics,
    },
    /// Formula is unsatisfiable
    Unsat {
        /// Core of root formulas, when logging and the backend allow it
        proof: Option<Proof>,
        /// Solving statistics
        stats: Statistics,
    },
    /// Formula is true under its bounds without solving
    TriviallySat {
        /// Instance built from the bounds
        instance: Instance,
        /// Solving statistics
        stats: Statistics,
    },
    /// Formula is false under its bounds without solving
    TriviallyUnsat {
        /// Trivial proof, when logging was requested
        proof: Option<Proof>,
        /// Solving statistics
        stats: Statistics,
    },
}

impl Solution {
    /// The kind of this solution
    pub fn outcome(&self) -> Outcome {
        match self {
            Solution::Sat { .. } => Outcome::Satisfiable,
            Solution::Unsat { .. } => Outcome::Unsatisfiable,
            Solution::TriviallySat { .. } => Outcome::TriviallySatisfiable,
            Solution::TriviallyUnsat { .. } => Outcome::TriviallyUnsatisfiable,
        }
    }

    /// Returns true if the formula has a model
    pub fn is_sat(&self) -> bool {
        matches!(self, Solution::Sat { .. } | Solution::TriviallySat { .. })
    }

    /// Returns true if the formula has no (further) model
    pub fn is_unsat(&self) -> bool {
        !self.is_sat()
    }

    /// Returns true if no solver was involved
    pub fn is_trivial(&self) -> bool {
        matches!(self, Solution::TriviallySat { .. } | Solution::TriviallyUnsat { .. })
    }

    /// Returns the instance if the solution is satisfiable
    pub fn instance(&self) -> Option<&Instance> {
        match self {
            Solution::Sat { instance, .. } | Solution::TriviallySat { instance, .. } => Some(instance),
            _ => None,
        }
    }

    /// Returns the proof, if one was produced
    pub fn proof(&self) -> Option<&Proof> {
        match self {
            Solution::Unsat { proof, .. } | Solution::TriviallyUnsat { proof, .. } => proof.as_ref(),
            _ => None,
        }
    }

    /// Returns the statistics
    pub fn statistics(&self) -> &Statistics {
        match self {
            Solution::Sat { stats, .. }
            | Solution::Unsat { stats, .. }
            | Solution::TriviallySat { stats, .. }
            | Solution::TriviallyUnsat { stats, .. } => stats,
        }
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---OUTCOME---")?;
        writeln!(f, "{}", self.outcome())?;
        if let Some(instance) = self.instance() {
            writeln!(f, "---INSTANCE---")?;
            writeln!(f, "{}", instance)?;
        }
        write!(f, "---STATS---\n{}", self.statistics())
    }
}

/// Statistics collected during solving
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    primary_variables: u32,
    num_variables: u32,
    num_clauses: u32,
    translation_time: Duration,
    solving_time: Duration,
}

impl Statistics {
    /// Creates statistics from raw counts and times
    pub fn new(
        primary_variables: u32,
        num_variables: u32,
        num_clauses: u32,
        translation_time: Duration,
        solving_time: Duration,
    ) -> Self {
        Self {
            primary_variables,
            num_variables,
            num_clauses,
            translation_time,
            solving_time,
        }
    }

    /// Statistics of a call that solved `translation`
    pub fn of<S: ?Sized + SATSolver>(
        translation: &Translation<S>,
        translation_time: Duration,
        solving_time: Duration,
    ) -> Self {
        Self::new(
            translation.num_primary_variables(),
            translation.cnf().num_variables(),
            translation.cnf().num_clauses(),
            translation_time,
            solving_time,
        )
    }

    /// Returns the number of primary variables
    pub fn primary_variables(&self) -> u32 {
        self.primary_variables
    }

    /// Returns number of variables
    pub fn num_variables(&self) -> u32 {
        self.num_variables
    }

    /// Returns number of clauses
    pub fn num_clauses(&self) -> u32 {
        self.num_clauses
    }

    /// Returns translation time in milliseconds
    pub fn translation_time(&self) -> u64 {
        self.translation_time.as_millis() as u64
    }

    /// Returns solving time in milliseconds
    pub fn solving_time(&self) -> u64 {
        self.solving_time.as_millis() as u64
    }

    /// Returns total time in milliseconds
    pub fn total_time(&self) -> u64 {
        self.translation_time() + self.solving_time()
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "p cnf {} {}", self.num_variables, self.num_clauses)?;
        writeln!(f, "primary variables: {}", self.primary_variables)?;
        writeln!(f, "translation time: {} ms", self.translation_time())?;
        write!(f, "solving time: {} ms", self.solving_time())
    }
}

/// Assembles solutions from solver and translation state
pub struct ResultBuilder;

impl ResultBuilder {
    /// A satisfiable solution from the solver's current model
    ///
    /// The solver is left alone; callers that are done with it free it.
    pub fn sat<S: ?Sized + SATSolver>(
        translation: &Translation<S>,
        bounds: &Bounds,
        stats: Statistics,
    ) -> Result<Solution> {
        let instance = Self::pad_instance(translation.interpret()?, bounds)?;
        Ok(Solution::Sat { instance, stats })
    }

    /// An unsatisfiable solution
    ///
    /// Carries a core proof when the translation was logged and the solver
    /// is a prover; otherwise the solver is freed at once.
    pub fn unsat<S: ?Sized + SATSolver>(translation: &mut Translation<S>, stats: Statistics) -> Solution {
        let proof = match (translation.log(), translation.cnf().as_prover()) {
            (Some(log), Some(prover)) => Some(Proof::from_core(log.clone(), prover)),
            _ => None,
        };
        if proof.is_none() {
            translation.cnf_mut().free();
        }
        Solution::Unsat { proof, stats }
    }

    /// A solution for a formula that folded to a constant
    ///
    /// `bounds` are the caller's bounds, used for padding.
    pub fn trivial(bounds: &Bounds, trivial: &TrivialFormula, translation_time: Duration) -> Result<Solution> {
        let stats = Statistics::new(
            Self::trivial_primaries(&trivial.bounds),
            0,
            0,
            translation_time,
            Duration::ZERO,
        );
        if trivial.value {
            let instance = Self::pad_instance(Self::to_instance(&trivial.bounds)?, bounds)?;
            Ok(Solution::TriviallySat { instance, stats })
        } else {
            let proof = trivial.log.clone().map(Proof::trivial);
            Ok(Solution::TriviallyUnsat { proof, stats })
        }
    }

    /// Adds the lower bound of every relation missing from `instance`, and
    /// every exact integer binding
    pub fn pad_instance(mut instance: Instance, bounds: &Bounds) -> Result<Instance> {
        for relation in bounds.relations() {
            if !instance.contains(relation) {
                if let Some(lower) = bounds.lower_bound(relation) {
                    instance.add(relation.clone(), lower.clone())?;
                }
            }
        }
        Self::add_ints(&mut instance, bounds)?;
        Ok(instance)
    }

    /// The instance that gives every relation its lower bound
    pub fn to_instance(bounds: &Bounds) -> Result<Instance> {
        let mut instance = Instance::new(bounds.universe().clone());
        for relation in bounds.relations() {
            if let Some(lower) = bounds.lower_bound(relation) {
                instance.add(relation.clone(), lower.clone())?;
            }
        }
        Self::add_ints(&mut instance, bounds)?;
        Ok(instance)
    }

    /// Number of primary variables `bounds` would allocate
    pub fn trivial_primaries(bounds: &Bounds) -> u32 {
        bounds
            .relations()
            .map(|r| Self::unknown_tuples(bounds, r))
            .sum::<usize>() as u32
    }

    fn unknown_tuples(bounds: &Bounds, relation: &Relation) -> usize {
        match (bounds.lower_bound(relation), bounds.upper_bound(relation)) {
            (Some(lower), Some(upper)) => upper.size() - lower.size(),
            _ => 0,
        }
    }

    fn add_ints(instance: &mut Instance, bounds: &Bounds) -> Result<()> {
        for i in bounds.int_keys() {
            if let Some(tuples) = bounds.exact_int_bound(i) {
                instance.add_int(i, tuples.clone())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Formula;
    use crate::instance::Universe;

    fn bounds() -> (Bounds, Relation, Relation) {
        let universe = Universe::new(&["a", "b", "0"]).unwrap();
        let f = universe.factory();
        let mut bounds = Bounds::new(universe);
        let fixed = Relation::unary("Fixed");
        let free = Relation::unary("Free");
        bounds.bound_exactly(&fixed, f.tuple_set(&[&["a"]]).unwrap()).unwrap();
        bounds.bound(&free, f.tuple_set(&[&["b"]]).unwrap(), f.tuple_set(&[&["a"], &["b"]]).unwrap()).unwrap();
        bounds.bound_int_exactly(0, f.tuple_set(&[&["0"]]).unwrap()).unwrap();
        (bounds, fixed, free)
    }

    #[test]
    fn padding_adds_lower_bounds_and_ints() {
        let (bounds, fixed, free) = bounds();
        let f = bounds.universe().factory();
        let mut partial = Instance::new(bounds.universe().clone());
        partial.add(free.clone(), f.all(1)).unwrap();

        let padded = ResultBuilder::pad_instance(partial, &bounds).unwrap();
        assert_eq!(padded.tuples(&fixed), bounds.lower_bound(&fixed));
        assert_eq!(padded.tuples(&free).unwrap().size(), 3);
        assert_eq!(padded.int_tuples(0), bounds.exact_int_bound(0));
    }

    #[test]
    fn trivial_solutions() {
        let (bounds, _, free) = bounds();
        let sat = TrivialFormula {
            value: true,
            formula: Formula::TRUE,
            bounds: bounds.clone(),
            log: None,
        };
        let solution = ResultBuilder::trivial(&bounds, &sat, Duration::ZERO).unwrap();
        assert_eq!(solution.outcome(), Outcome::TriviallySatisfiable);
        assert!(solution.is_sat() && solution.is_trivial());
        assert_eq!(solution.instance().unwrap().tuples(&free), bounds.lower_bound(&free));
        assert_eq!(solution.statistics().primary_variables(), 1);

        let unsat = TrivialFormula { value: false, ..sat };
        let solution = ResultBuilder::trivial(&bounds, &unsat, Duration::ZERO).unwrap();
        assert_eq!(solution.outcome(), Outcome::TriviallyUnsatisfiable);
        assert!(solution.proof().is_none());
        assert!(solution.instance().is_none());
    }
}
