//! Read-only traversal of formulas and expressions
//!
//! The AST is a pair of enums, so traversal is plain pattern matching. The
//! [`FormulaVisitor`] trait supplies the recursion; implementors override the
//! leaf hooks they care about.

use rustc_hash::FxHashSet;

use super::formula::{Formula, FormulaInner};
use super::{Expression, Relation, Variable};

/// A visitor over formulas and the expressions they contain
///
/// Default methods walk every child; the leaf hooks do nothing.
pub trait FormulaVisitor {
    /// Visit a formula and its children
    fn visit_formula(&mut self, formula: &Formula) {
        match &*formula.inner() {
            FormulaInner::Constant(_) => {}
            FormulaInner::Binary { left, right, .. } => {
                self.visit_formula(left);
                self.visit_formula(right);
            }
            FormulaInner::Nary { formulas, .. } => {
                for f in formulas {
                    self.visit_formula(f);
                }
            }
            FormulaInner::Not(inner) => self.visit_formula(inner),
            FormulaInner::Comparison { left, right, .. } => {
                self.visit_expression(left);
                self.visit_expression(right);
            }
            FormulaInner::Multiplicity { expr, .. } => self.visit_expression(expr),
            FormulaInner::Quantified { declarations, body, .. } => {
                for decl in declarations.iter() {
                    self.visit_expression(decl.expression());
                }
                self.visit_formula(body);
            }
        }
    }

    /// Visit an expression and its children
    fn visit_expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Relation(r) => self.visit_relation(r),
            Expression::Variable(v) => self.visit_variable(v),
            Expression::Constant(_) => {}
            Expression::Binary { left, right, .. } => {
                self.visit_expression(left);
                self.visit_expression(right);
            }
            Expression::Unary { expr, .. } => self.visit_expression(expr),
        }
    }

    /// Visit a relation leaf
    fn visit_relation(&mut self, _relation: &Relation) {}

    /// Visit a variable leaf
    fn visit_variable(&mut self, _variable: &Variable) {}
}

/// Collects the relations a formula mentions, in first-occurrence order
#[derive(Default)]
pub struct RelationCollector {
    seen: FxHashSet<Relation>,
    relations: Vec<Relation>,
}

impl RelationCollector {
    /// Returns the relations mentioned by `formula`
    pub fn collect(formula: &Formula) -> Vec<Relation> {
        let mut collector = Self::default();
        collector.visit_formula(formula);
        collector.relations
    }
}

impl FormulaVisitor for RelationCollector {
    fn visit_relation(&mut self, relation: &Relation) {
        if self.seen.insert(relation.clone()) {
            self.relations.push(relation.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Decl, Decls};

    #[test]
    fn collects_each_relation_once() {
        let a = Relation::unary("A");
        let r = Relation::binary("r");
        let x = Variable::unary("x");
        let f = Formula::forall(
            Decls::from(Decl::one_of(x.clone(), Expression::from(&a))),
            Expression::from(&x).join(Expression::from(&r)).in_set(Expression::from(&a)),
        )
        .and(Expression::from(&r).some());

        assert_eq!(RelationCollector::collect(&f), vec![a, r]);
    }
}
