/*
 * Kodkod -- Copyright (c) 2005-present, Emina Torlak
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in
 * all copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
 * THE SOFTWARE.
 */

//! Evaluator for relational formulas and expressions

use crate::ast::{Expression, Formula};
use crate::bool::Options;
use crate::error::Result;
use crate::instance::{Instance, TupleSet};
use crate::translator::Translator;

/// An evaluator for relational formulas and expressions with
/// respect to a given Instance and Options.
///
/// Every relation a formula mentions must be present in the instance.
pub struct Evaluator<'a> {
    instance: &'a Instance,
    options: Options,
}

impl<'a> Evaluator<'a> {
    /// Constructs a new Evaluator for the given instance, using default Options
    pub fn new(instance: &'a Instance) -> Self {
        Self::with_options(instance, Options::default())
    }

    /// Constructs a new Evaluator for the given instance and options
    pub fn with_options(instance: &'a Instance, options: Options) -> Self {
        Self { instance, options }
    }

    /// Returns the instance
    pub fn instance(&self) -> &Instance {
        self.instance
    }

    /// Whether `formula` holds in the instance
    pub fn evaluate(&self, formula: &Formula) -> Result<bool> {
        Translator::evaluate(formula, self.instance, &self.options)
    }

    /// The tuples `expression` denotes in the instance
    pub fn evaluate_expression(&self, expression: &Expression) -> Result<TupleSet> {
        Translator::evaluate_expression(expression, self.instance, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Decl, Decls, Relation, Variable};
    use crate::error::KodkodError;
    use crate::instance::Universe;

    fn ring() -> (Instance, Relation, Relation) {
        let universe = Universe::new(&["n0", "n1", "n2"]).unwrap();
        let f = universe.factory();
        let node = Relation::unary("Node");
        let next = Relation::binary("next");
        let mut instance = Instance::new(universe);
        instance.add(node.clone(), f.all(1)).unwrap();
        instance
            .add(next.clone(), f.tuple_set(&[&["n0", "n1"], &["n1", "n2"], &["n2", "n0"]]).unwrap())
            .unwrap();
        (instance, node, next)
    }

    #[test]
    fn closure_reaches_every_node() {
        let (instance, node, next) = ring();
        let evaluator = Evaluator::new(&instance);
        let n = Variable::unary("n");
        let reachable = Formula::forall(
            Decls::from(Decl::one_of(n.clone(), Expression::from(&node))),
            Expression::from(&node).in_set(Expression::from(&n).join(Expression::from(&next).closure())),
        );
        assert!(evaluator.evaluate(&reachable).unwrap());
        assert!(evaluator.evaluate(&Expression::from(&next).one()).map(|b| !b).unwrap());
    }

    #[test]
    fn expression_values() {
        let (instance, _, next) = ring();
        let evaluator = Evaluator::new(&instance);
        let f = instance.universe().factory();

        let back = evaluator.evaluate_expression(&Expression::from(&next).transpose()).unwrap();
        assert_eq!(back, f.tuple_set(&[&["n1", "n0"], &["n2", "n1"], &["n0", "n2"]]).unwrap());

        let two_steps = evaluator
            .evaluate_expression(&Expression::from(&next).join(Expression::from(&next)))
            .unwrap();
        assert_eq!(two_steps, f.tuple_set(&[&["n0", "n2"], &["n1", "n0"], &["n2", "n1"]]).unwrap());
    }

    #[test]
    fn missing_relation_is_unbound() {
        let (instance, _, _) = ring();
        let evaluator = Evaluator::new(&instance);
        let ghost = Relation::unary("ghost");
        assert!(matches!(
            evaluator.evaluate(&Expression::from(&ghost).some()),
            Err(KodkodError::UnboundLeaf(_))
        ));
    }
}
