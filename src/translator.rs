//! FOL to Boolean circuit translation
//!
//! Translates first-order relational logic formulas to boolean circuits and
//! from there to CNF loaded into a SAT solver.

mod environment;
mod leaf_interpreter;

pub use environment::Environment;
pub use leaf_interpreter::LeafInterpreter;

use log::debug;
use std::ops::Range;
use std::rc::Rc;

use crate::ast::*;
use crate::bool::{BoolValue, BooleanMatrix, Options};
use crate::cnf::CNFTranslator;
use crate::engine::{SATSolver, VariableTupleMap};
use crate::error::{KodkodError, Result};
use crate::instance::{Bounds, Instance, TupleSet};
use crate::proof::TranslationLog;

/// A formula translated to CNF and loaded into a solver
pub struct Translation<S: ?Sized + SATSolver = dyn SATSolver> {
    cnf: Box<S>,
    var_map: VariableTupleMap,
    bounds: Bounds,
    log: Option<Rc<TranslationLog>>,
    assumptions: Vec<i32>,
}

impl<S: ?Sized + SATSolver> Translation<S> {
    /// The solver holding the CNF
    pub fn cnf(&self) -> &S {
        &self.cnf
    }

    /// Mutable access to the solver holding the CNF
    pub fn cnf_mut(&mut self) -> &mut S {
        &mut self.cnf
    }

    /// Number of primary variables (`1..=n`)
    pub fn num_primary_variables(&self) -> u32 {
        self.var_map.num_primary_variables()
    }

    /// Primary variables of `relation`; empty if it owns none
    pub fn primary_variables(&self, relation: &Relation) -> Range<u32> {
        self.var_map.primary_variables(relation)
    }

    /// The variable/tuple map for this translation
    pub fn var_map(&self) -> &VariableTupleMap {
        &self.var_map
    }

    /// Bounds the formula was translated against
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Translation log, if logging was requested
    pub fn log(&self) -> Option<&Rc<TranslationLog>> {
        self.log.as_ref()
    }

    /// Root literals every solve must assume (non-empty only when logging)
    pub fn assumptions(&self) -> &[i32] {
        &self.assumptions
    }

    /// Interprets the solver's current model as an instance
    pub fn interpret(&self) -> Result<Instance> {
        self.var_map.interpret(&self.bounds, |var| self.cnf.value_of(var))
    }
}

/// A formula whose circuit folded to a constant
#[derive(Debug, Clone)]
pub struct TrivialFormula {
    /// The constant the formula reduced to
    pub value: bool,
    /// The formula that was translated
    pub formula: Formula,
    /// The bounds it was translated against
    pub bounds: Bounds,
    /// Translation log, if logging was requested
    pub log: Option<Rc<TranslationLog>>,
}

/// Outcome of [`Translator::translate`]
pub enum TranslationResult<S: ?Sized + SATSolver = dyn SATSolver> {
    /// The formula needs a solver
    Translated(Translation<S>),
    /// The formula is a constant under its bounds
    Trivial(TrivialFormula),
}

/// Translator for FOL formulas to boolean circuits
pub struct Translator;

impl Translator {
    /// Translates `formula` against `bounds` into a fresh solver built by `make`
    ///
    /// Input errors are reported before `make` is called, and `make` is not
    /// called at all for trivial formulas. With
    /// `log_translation > 0` every top-level conjunct is recorded with its
    /// circuit literal and passed to the solver as an assumption.
    pub fn translate<S: ?Sized + SATSolver>(
        formula: &Formula,
        bounds: &Bounds,
        options: &Options,
        log_translation: u8,
        make: impl FnOnce() -> Result<Box<S>>,
    ) -> Result<TranslationResult<S>> {
        check_relations(formula, bounds)?;

        let interpreter = LeafInterpreter::from_bounds(bounds, options);
        let roots = formula.conjuncts();
        let values = {
            let mut translator = FOL2BoolTranslator::new(&interpreter);
            roots
                .iter()
                .map(|root| translator.translate_formula(root))
                .collect::<Result<Vec<_>>>()?
        };
        let (factory, var_map) = interpreter.into_parts();
        let circuit = factory.and_multi(values.clone());

        let log = (log_translation > 0).then(|| {
            let records = roots.iter().cloned().zip(values.iter().map(BoolValue::label));
            Rc::new(TranslationLog::new(records.collect()))
        });

        if let Some(value) = circuit.as_constant() {
            debug!("formula is trivially {}", value);
            return Ok(TranslationResult::Trivial(TrivialFormula {
                value,
                formula: formula.clone(),
                bounds: bounds.clone(),
                log,
            }));
        }

        let mut cnf_translator = CNFTranslator::new(&factory);
        let mut assumptions = Vec::new();
        if log.is_some() {
            for value in &values {
                if let Some(lit) = cnf_translator.define(*value) {
                    assumptions.push(lit);
                }
            }
        } else {
            cnf_translator.assert_true(circuit);
        }
        let cnf = cnf_translator.finish();
        debug!(
            "translated to {} primary variables, {} variables, {} clauses",
            var_map.num_primary_variables(),
            cnf.num_variables,
            cnf.num_clauses()
        );

        let mut solver = make()?;
        solver.add_variables(cnf.num_variables);
        for clause in &cnf.clauses {
            solver.add_clause(clause);
        }

        Ok(TranslationResult::Translated(Translation {
            cnf: solver,
            var_map,
            bounds: bounds.clone(),
            log,
            assumptions,
        }))
    }

    /// Evaluates a formula against a complete instance
    pub fn evaluate(formula: &Formula, instance: &Instance, options: &Options) -> Result<bool> {
        let bounds = exact_bounds(instance)?;
        check_relations(formula, &bounds)?;
        let interpreter = LeafInterpreter::from_bounds(&bounds, options);
        let value = FOL2BoolTranslator::new(&interpreter).translate_formula(formula)?;
        value.as_constant().ok_or_else(|| {
            KodkodError::IllegalState(format!("{} did not evaluate to a constant", formula))
        })
    }

    /// Evaluates an expression against a complete instance
    pub fn evaluate_expression(
        expr: &Expression,
        instance: &Instance,
        options: &Options,
    ) -> Result<TupleSet> {
        let bounds = exact_bounds(instance)?;
        let interpreter = LeafInterpreter::from_bounds(&bounds, options);
        let matrix = FOL2BoolTranslator::new(&interpreter).translate_expression(expr)?;

        let mut indices = Vec::new();
        for (index, value) in matrix.iter_indexed() {
            match value.as_constant() {
                Some(true) => indices.push(index),
                Some(false) => {}
                None => {
                    return Err(KodkodError::IllegalState(format!(
                        "{} did not evaluate to a constant",
                        expr
                    )));
                }
            }
        }
        bounds.factory().tuple_set_from_indices(expr.arity(), indices)
    }
}

fn exact_bounds(instance: &Instance) -> Result<Bounds> {
    let mut bounds = Bounds::new(instance.universe().clone());
    for (relation, tuples) in instance.relation_tuples() {
        bounds.bound_exactly(relation, tuples.clone())?;
    }
    Ok(bounds)
}

fn check_relations(formula: &Formula, bounds: &Bounds) -> Result<()> {
    match RelationCollector::collect(formula).into_iter().find(|r| !bounds.contains(r)) {
        Some(r) => Err(KodkodError::UnboundLeaf(format!("relation {}", r))),
        None => Ok(()),
    }
}

/// FOL to Boolean translator
struct FOL2BoolTranslator<'a> {
    interpreter: &'a LeafInterpreter,
    env: Environment,
}

impl<'a> FOL2BoolTranslator<'a> {
    fn new(interpreter: &'a LeafInterpreter) -> Self {
        Self {
            interpreter,
            env: Environment::empty(),
        }
    }

    fn translate_formula(&mut self, formula: &Formula) -> Result<BoolValue> {
        let interpreter = self.interpreter;
        let factory = interpreter.factory();
        Ok(match &*formula.inner() {
            FormulaInner::Constant(b) => factory.constant(*b),

            FormulaInner::Binary { left, op, right } => {
                let l = self.translate_formula(left)?;
                let r = self.translate_formula(right)?;
                match op {
                    BinaryFormulaOp::And => factory.and(l, r),
                    BinaryFormulaOp::Or => factory.or(l, r),
                    BinaryFormulaOp::Implies => factory.implies(l, r),
                    BinaryFormulaOp::Iff => factory.iff(l, r),
                }
            }

            FormulaInner::Nary { op, formulas } => {
                let values = formulas
                    .iter()
                    .map(|f| self.translate_formula(f))
                    .collect::<Result<Vec<_>>>()?;
                match op {
                    BinaryFormulaOp::Or => factory.or_multi(values),
                    _ => factory.and_multi(values),
                }
            }

            FormulaInner::Not(inner) => {
                let v = self.translate_formula(inner)?;
                factory.not(v)
            }

            FormulaInner::Comparison { left, op, right } => {
                if left.arity() != right.arity() {
                    return Err(KodkodError::InvalidArgument(format!(
                        "arity mismatch in {}",
                        formula
                    )));
                }
                let l = self.translate_expression(left)?;
                let r = self.translate_expression(right)?;
                match op {
                    CompareOp::Equals => l.equals(&r, factory),
                    CompareOp::Subset => l.subset(&r, factory),
                }
            }

            FormulaInner::Multiplicity { mult, expr } => {
                let m = self.translate_expression(expr)?;
                match mult {
                    Multiplicity::Some => m.some(factory),
                    Multiplicity::No => m.none(factory),
                    Multiplicity::One => m.one(factory),
                    Multiplicity::Lone => m.lone(factory),
                    Multiplicity::Set => BoolValue::TRUE,
                }
            }

            FormulaInner::Quantified {
                quantifier,
                declarations,
                body,
            } => self.translate_quantified(*quantifier, declarations, body)?,
        })
    }

    fn translate_expression(&mut self, expr: &Expression) -> Result<BooleanMatrix> {
        let interpreter = self.interpreter;
        let factory = interpreter.factory();
        match expr {
            Expression::Relation(r) => self.interpreter.interpret_relation(r),

            Expression::Variable(v) => self
                .env
                .lookup(v)
                .cloned()
                .ok_or_else(|| KodkodError::UnboundLeaf(format!("variable {}", v))),

            Expression::Constant(c) => self.interpreter.interpret_constant(*c),

            Expression::Binary { left, op, right, .. } => {
                let l = self.translate_expression(left)?;
                let r = self.translate_expression(right)?;
                match op {
                    BinaryOp::Union => Ok(l.union(&r, factory)),
                    BinaryOp::Intersection => Ok(l.intersection(&r, factory)),
                    BinaryOp::Difference => Ok(l.difference(&r, factory)),
                    BinaryOp::Override => Ok(l.override_with(&r, factory)),
                    BinaryOp::Join => l.join(&r, factory),
                    BinaryOp::Product => l.product(&r, factory),
                }
            }

            Expression::Unary { op, expr } => {
                let m = self.translate_expression(expr)?;
                match op {
                    UnaryOp::Transpose => Ok(m.transpose()),
                    UnaryOp::Closure => m.closure(factory),
                    UnaryOp::ReflexiveClosure => m.reflexive_closure(factory),
                }
            }
        }
    }

    fn translate_quantified(
        &mut self,
        quantifier: Quantifier,
        decls: &Decls,
        body: &Formula,
    ) -> Result<BoolValue> {
        let decls: Vec<&Decl> = decls.iter().collect();
        for decl in &decls {
            if decl.multiplicity() != Multiplicity::One {
                return Err(KodkodError::HigherOrderDecl(decl.to_string()));
            }
            if decl.variable().arity() != decl.expression().arity() {
                return Err(KodkodError::InvalidArgument(format!("arity mismatch in {}", decl)));
            }
        }

        let mut acc = Vec::new();
        self.ground(quantifier, &decls, BoolValue::TRUE, body, &mut acc)?;
        let factory = self.interpreter.factory();
        Ok(match quantifier {
            Quantifier::All => factory.and_multi(acc),
            Quantifier::Some => factory.or_multi(acc),
        })
    }

    /// Binds each declared variable to every tuple of its domain in turn
    ///
    /// `guard` is the conjunction of the domain memberships chosen so far.
    /// Stops early once the accumulated result is decided.
    fn ground(
        &mut self,
        quantifier: Quantifier,
        decls: &[&Decl],
        guard: BoolValue,
        body: &Formula,
        acc: &mut Vec<BoolValue>,
    ) -> Result<bool> {
        let interpreter = self.interpreter;
        let factory = interpreter.factory();
        let Some((decl, rest)) = decls.split_first() else {
            let value = self.translate_formula(body)?;
            let grounded = match quantifier {
                Quantifier::All => factory.implies(guard, value),
                Quantifier::Some => factory.and(guard, value),
            };
            acc.push(grounded);
            let decided = match quantifier {
                Quantifier::All => BoolValue::FALSE,
                Quantifier::Some => BoolValue::TRUE,
            };
            return Ok(grounded == decided);
        };

        let domain = self.translate_expression(decl.expression())?;
        let dimensions = *domain.dimensions();
        let cells: Vec<(usize, BoolValue)> = domain.iter_indexed().collect();
        for (index, membership) in cells {
            let mut ground = BooleanMatrix::empty(dimensions);
            ground.set(index, BoolValue::TRUE);
            self.env.extend(decl.variable().clone(), ground);
            let result = self.ground(quantifier, rest, factory.and(guard, membership), body, acc);
            self.env.pop();
            if result? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SATFactory;
    use crate::instance::Universe;

    fn fixture() -> (Bounds, Relation, Relation) {
        let universe = Universe::new(&["a", "b"]).unwrap();
        let f = universe.factory();
        let mut bounds = Bounds::new(universe);
        let a = Relation::unary("A");
        let next = Relation::binary("next");
        bounds.bound(&a, f.none(1), f.all(1)).unwrap();
        bounds.bound_exactly(&next, f.tuple_set(&[&["a", "b"]]).unwrap()).unwrap();
        (bounds, a, next)
    }

    fn translate(formula: &Formula, bounds: &Bounds, log: u8) -> Result<TranslationResult> {
        Translator::translate(formula, bounds, &Options::default(), log, || Ok(SATFactory::BATSAT.instance()))
    }

    #[test]
    fn translation_allocates_primary_variables() {
        let (bounds, a, _) = fixture();
        let Ok(TranslationResult::Translated(mut t)) = translate(&Expression::from(&a).some(), &bounds, 0)
        else {
            panic!("expected a translation");
        };
        assert_eq!(t.num_primary_variables(), 2);
        assert_eq!(t.primary_variables(&a), 1..3);
        assert!(t.assumptions().is_empty());
        assert!(t.cnf_mut().solve().unwrap());
        let instance = t.interpret().unwrap();
        assert!(!instance.tuples(&a).unwrap().is_empty());
    }

    #[test]
    fn exact_bounds_make_formula_trivial() {
        let (bounds, _, next) = fixture();
        let formula = Expression::from(&next).some();
        let Ok(TranslationResult::Trivial(trivial)) = translate(&formula, &bounds, 1) else {
            panic!("expected a trivial formula");
        };
        assert!(trivial.value);
        assert_eq!(trivial.log.unwrap().len(), 1);
    }

    #[test]
    fn logging_turns_roots_into_assumptions() {
        let (bounds, a, next) = fixture();
        let formula = Expression::from(&a).some().and(Expression::from(&a).in_set(Expression::from(&next).join(Expression::UNIV)));
        let Ok(TranslationResult::Translated(t)) = translate(&formula, &bounds, 1) else {
            panic!("expected a translation");
        };
        assert_eq!(t.assumptions().len(), 2);
        assert_eq!(t.log().unwrap().len(), 2);
    }

    #[test]
    fn input_errors() {
        let (bounds, a, _) = fixture();
        let ghost = Relation::unary("ghost");
        assert!(matches!(
            translate(&Expression::from(&ghost).some(), &bounds, 0),
            Err(KodkodError::UnboundLeaf(_))
        ));

        let x = Variable::unary("x");
        assert!(matches!(
            translate(&Expression::from(&x).some(), &bounds, 0),
            Err(KodkodError::UnboundLeaf(_))
        ));

        let higher = Formula::exists(
            Decls::from(Decl::set_of(x.clone(), Expression::from(&a))),
            Expression::from(&x).some(),
        );
        assert!(matches!(translate(&higher, &bounds, 0), Err(KodkodError::HigherOrderDecl(_))));
    }

    #[test]
    fn evaluate_against_instance() {
        let (bounds, a, next) = fixture();
        let f = bounds.universe().factory();
        let mut instance = Instance::new(bounds.universe().clone());
        instance.add(a.clone(), f.tuple_set(&[&["a"]]).unwrap()).unwrap();
        instance.add(next.clone(), f.tuple_set(&[&["a", "b"]]).unwrap()).unwrap();

        let x = Variable::unary("x");
        let every_a_has_next = Formula::forall(
            Decls::from(Decl::one_of(x.clone(), Expression::from(&a))),
            Expression::from(&x).join(Expression::from(&next)).some(),
        );
        let options = Options::default();
        assert!(Translator::evaluate(&every_a_has_next, &instance, &options).unwrap());
        assert!(!Translator::evaluate(&Expression::from(&a).one().not(), &instance, &options).unwrap());

        let image = Translator::evaluate_expression(
            &Expression::from(&a).join(Expression::from(&next)),
            &instance,
            &options,
        )
        .unwrap();
        assert_eq!(image, f.tuple_set(&[&["b"]]).unwrap());
    }
}
