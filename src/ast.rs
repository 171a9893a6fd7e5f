//! AST types for relational logic formulas
//!
//! Relations and variables are leaves with identity equality; expressions
//! and formulas are built from them with the usual Kodkod operators.

pub mod formula;
pub mod visitor;

pub use formula::{
    BinaryFormulaOp, CompareOp, Decl, Decls, Formula, FormulaInner, Multiplicity, Quantifier,
};
pub use visitor::{FormulaVisitor, RelationCollector};

use std::fmt;
use std::sync::Arc;

/// A relation - a named variable in relational logic
///
/// Relations are leaf expressions with a fixed arity. Two relations are equal
/// if and only if they are the same object (identity equality).
#[derive(Clone)]
pub struct Relation {
    inner: Arc<RelationInner>,
}

struct RelationInner {
    name: String,
    arity: usize,
}

impl Relation {
    /// Creates a new relation with the given name and arity
    ///
    /// # Panics
    /// Panics if arity < 1
    pub fn nary(name: impl Into<String>, arity: usize) -> Self {
        assert!(arity >= 1, "arity must be at least 1, got {}", arity);
        Self {
            inner: Arc::new(RelationInner {
                name: name.into(),
                arity,
            }),
        }
    }

    /// Creates a new unary relation (arity = 1)
    pub fn unary(name: impl Into<String>) -> Self {
        Self::nary(name, 1)
    }

    /// Creates a new binary relation (arity = 2)
    pub fn binary(name: impl Into<String>) -> Self {
        Self::nary(name, 2)
    }

    /// Creates a new ternary relation (arity = 3)
    pub fn ternary(name: impl Into<String>) -> Self {
        Self::nary(name, 3)
    }

    /// Returns the name of this relation
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the arity of this relation
    pub fn arity(&self) -> usize {
        self.inner.arity
    }
}

// Identity equality - two relations are equal iff they're the same Arc
impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Relation {}

impl std::hash::Hash for Relation {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Relation({}/{})", self.name(), self.arity())
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A variable in a quantified formula
///
/// Variables have identity equality like relations.
#[derive(Clone)]
pub struct Variable {
    inner: Arc<VariableInner>,
}

struct VariableInner {
    name: String,
    arity: usize,
}

impl Variable {
    /// Creates a new unary variable
    pub fn unary(name: impl Into<String>) -> Self {
        Self::nary(name, 1)
    }

    /// Creates a new variable with the given arity
    pub fn nary(name: impl Into<String>, arity: usize) -> Self {
        assert!(arity >= 1, "arity must be at least 1");
        Self {
            inner: Arc::new(VariableInner {
                name: name.into(),
                arity,
            }),
        }
    }

    /// Returns the name of this variable
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the arity of this variable
    pub fn arity(&self) -> usize {
        self.inner.arity
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Variable {}

impl std::hash::Hash for Variable {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Variable({}/{})", self.name(), self.arity())
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Operators for binary expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Relational composition/join
    Join,
    /// Cartesian product
    Product,
    /// Set union
    Union,
    /// Set difference
    Difference,
    /// Set intersection
    Intersection,
    /// Relational override
    Override,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Join => ".",
            BinaryOp::Product => "->",
            BinaryOp::Union => "+",
            BinaryOp::Difference => "-",
            BinaryOp::Intersection => "&",
            BinaryOp::Override => "++",
        }
    }
}

/// Operators for unary expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Transpose of a binary relation
    Transpose,
    /// Transitive closure
    Closure,
    /// Reflexive transitive closure
    ReflexiveClosure,
}

/// A relational expression
#[expect(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expression {
    /// A relation (leaf)
    Relation(Relation),
    /// A variable (leaf)
    Variable(Variable),
    /// A constant expression
    Constant(ConstantExpr),
    /// Binary expression (e.g., join, product, union)
    Binary {
        left: Box<Expression>,
        op: BinaryOp,
        right: Box<Expression>,
        arity: usize,
    },
    /// Unary expression (e.g., transpose, closure)
    Unary {
        op: UnaryOp,
        expr: Box<Expression>,
    },
}

/// Constant expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstantExpr {
    /// Universal relation (all atoms)
    Univ,
    /// Identity relation (diagonal)
    Iden,
    /// Empty relation
    None,
}

impl Expression {
    /// Universal relation constant
    pub const UNIV: Expression = Expression::Constant(ConstantExpr::Univ);
    /// Identity relation constant
    pub const IDEN: Expression = Expression::Constant(ConstantExpr::Iden);
    /// Empty relation constant
    pub const NONE: Expression = Expression::Constant(ConstantExpr::None);

    /// Returns the arity of this expression
    pub fn arity(&self) -> usize {
        match self {
            Expression::Relation(r) => r.arity(),
            Expression::Variable(v) => v.arity(),
            Expression::Constant(c) => match c {
                ConstantExpr::Univ => 1,
                ConstantExpr::Iden => 2,
                ConstantExpr::None => 1,
            },
            Expression::Binary { arity, .. } => *arity,
            Expression::Unary { .. } => 2,
        }
    }

    /// Relational join
    pub fn join(self, other: Expression) -> Expression {
        self.binary(BinaryOp::Join, other)
    }

    /// Cartesian product
    pub fn product(self, other: Expression) -> Expression {
        self.binary(BinaryOp::Product, other)
    }

    /// Set union
    pub fn union(self, other: Expression) -> Expression {
        self.binary(BinaryOp::Union, other)
    }

    /// Set difference
    pub fn difference(self, other: Expression) -> Expression {
        self.binary(BinaryOp::Difference, other)
    }

    /// Set intersection
    pub fn intersection(self, other: Expression) -> Expression {
        self.binary(BinaryOp::Intersection, other)
    }

    /// Relational override
    pub fn override_with(self, other: Expression) -> Expression {
        self.binary(BinaryOp::Override, other)
    }

    /// Transpose
    pub fn transpose(self) -> Expression {
        self.unary(UnaryOp::Transpose)
    }

    /// Transitive closure
    pub fn closure(self) -> Expression {
        self.unary(UnaryOp::Closure)
    }

    /// Reflexive transitive closure
    pub fn reflexive_closure(self) -> Expression {
        self.unary(UnaryOp::ReflexiveClosure)
    }

    fn unary(self, op: UnaryOp) -> Expression {
        assert_eq!(self.arity(), 2, "{:?} requires arity 2", op);
        Expression::Unary {
            op,
            expr: Box::new(self),
        }
    }

    fn binary(self, op: BinaryOp, other: Expression) -> Expression {
        let arity = match op {
            BinaryOp::Union | BinaryOp::Difference | BinaryOp::Intersection | BinaryOp::Override => {
                assert_eq!(
                    self.arity(),
                    other.arity(),
                    "Incompatible arities for {:?}: {} and {}",
                    op,
                    self.arity(),
                    other.arity()
                );
                self.arity()
            }
            BinaryOp::Join => {
                let result_arity = self.arity() + other.arity();
                assert!(
                    result_arity > 2,
                    "Join would result in arity < 1: {} + {} - 2",
                    self.arity(),
                    other.arity()
                );
                result_arity - 2
            }
            BinaryOp::Product => self.arity() + other.arity(),
        };

        Expression::Binary {
            left: Box::new(self),
            op,
            right: Box::new(other),
            arity,
        }
    }

    /// Folds a non-empty list of expressions into a left-nested union
    pub fn union_all(exprs: Vec<Expression>) -> Expression {
        let mut iter = exprs.into_iter();
        let Some(first) = iter.next() else {
            panic!("Cannot create empty union");
        };
        iter.fold(first, Expression::union)
    }
}

impl From<Relation> for Expression {
    fn from(r: Relation) -> Self {
        Expression::Relation(r)
    }
}

impl From<&Relation> for Expression {
    fn from(r: &Relation) -> Self {
        Expression::Relation(r.clone())
    }
}

impl From<Variable> for Expression {
    fn from(v: Variable) -> Self {
        Expression::Variable(v)
    }
}

impl From<&Variable> for Expression {
    fn from(v: &Variable) -> Self {
        Expression::Variable(v.clone())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Relation(r) => write!(f, "{}", r),
            Expression::Variable(v) => write!(f, "{}", v),
            Expression::Constant(ConstantExpr::Univ) => write!(f, "univ"),
            Expression::Constant(ConstantExpr::Iden) => write!(f, "iden"),
            Expression::Constant(ConstantExpr::None) => write!(f, "none"),
            Expression::Binary { left, op, right, .. } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expression::Unary { op, expr } => match op {
                UnaryOp::Transpose => write!(f, "~{}", expr),
                UnaryOp::Closure => write!(f, "^{}", expr),
                UnaryOp::ReflexiveClosure => write!(f, "*{}", expr),
            },
        }
    }
}
