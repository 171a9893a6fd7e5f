//! Formula types for first-order logic

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use super::{Expression, Variable};

/// Operators for binary formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryFormulaOp {
    /// Logical AND
    And,
    /// Logical OR
    Or,
    /// If and only if
    Iff,
    /// Implies
    Implies,
}

impl BinaryFormulaOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryFormulaOp::And => "&&",
            BinaryFormulaOp::Or => "||",
            BinaryFormulaOp::Iff => "<=>",
            BinaryFormulaOp::Implies => "=>",
        }
    }
}

/// Comparison operators for expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Set equality
    Equals,
    /// Subset
    Subset,
}

/// Multiplicity operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    /// At least one element (some)
    Some,
    /// Exactly one element
    One,
    /// At most one element (lone)
    Lone,
    /// No elements
    No,
    /// Any number of elements (no constraint)
    Set,
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Multiplicity::Some => "some",
            Multiplicity::One => "one",
            Multiplicity::Lone => "lone",
            Multiplicity::No => "no",
            Multiplicity::Set => "set",
        };
        f.write_str(s)
    }
}

/// Quantifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    /// Universal quantification (forall)
    All,
    /// Existential quantification (exists)
    Some,
}

/// A first-order formula (reference-counted for efficient sharing)
#[derive(Clone, Debug)]
pub enum Formula {
    /// Reference-counted shared formula (for compound formulas)
    Ref(Rc<FormulaInner>),
    /// Constant TRUE (inline, no allocation)
    True,
    /// Constant FALSE (inline, no allocation)
    False,
}

impl Formula {
    /// Constant TRUE formula
    pub const TRUE: Formula = Formula::True;

    /// Constant FALSE formula
    pub const FALSE: Formula = Formula::False;
}

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        self.inner() == other.inner()
    }
}

impl Eq for Formula {}

impl std::hash::Hash for Formula {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner().hash(state);
    }
}

/// Inner representation of a formula
#[expect(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FormulaInner {
    /// Constant formula (TRUE or FALSE)
    Constant(bool),
    /// Binary formula (AND, OR, IFF, IMPLIES)
    Binary {
        left: Formula,
        op: BinaryFormulaOp,
        right: Formula,
    },
    /// N-ary formula (conjunction/disjunction of multiple formulas)
    Nary {
        op: BinaryFormulaOp, // Only AND or OR
        formulas: Vec<Formula>,
    },
    /// Negation
    Not(Formula),
    /// Expression comparison (equals, subset)
    Comparison {
        left: Expression,
        op: CompareOp,
        right: Expression,
    },
    /// Multiplicity constraint (some, one, lone, no)
    Multiplicity {
        mult: Multiplicity,
        expr: Expression,
    },
    /// Quantified formula (forall/exists)
    Quantified {
        quantifier: Quantifier,
        declarations: Decls,
        body: Formula,
    },
}

impl Formula {
    fn wrap(inner: FormulaInner) -> Formula {
        Formula::Ref(Rc::new(inner))
    }

    /// Returns a constant formula with the given value
    pub fn constant(value: bool) -> Formula {
        if value { Formula::TRUE } else { Formula::FALSE }
    }

    /// Logical AND
    pub fn and(self, other: Formula) -> Formula {
        Formula::wrap(FormulaInner::Binary {
            left: self,
            op: BinaryFormulaOp::And,
            right: other,
        })
    }

    /// Logical OR
    pub fn or(self, other: Formula) -> Formula {
        Formula::wrap(FormulaInner::Binary {
            left: self,
            op: BinaryFormulaOp::Or,
            right: other,
        })
    }

    /// If and only if (biconditional)
    pub fn iff(self, other: Formula) -> Formula {
        Formula::wrap(FormulaInner::Binary {
            left: self,
            op: BinaryFormulaOp::Iff,
            right: other,
        })
    }

    /// Implication
    pub fn implies(self, other: Formula) -> Formula {
        Formula::wrap(FormulaInner::Binary {
            left: self,
            op: BinaryFormulaOp::Implies,
            right: other,
        })
    }

    /// Negation
    pub fn not(self) -> Formula {
        Formula::wrap(FormulaInner::Not(self))
    }

    /// N-ary conjunction
    pub fn and_all(formulas: Vec<Formula>) -> Formula {
        Formula::nary(BinaryFormulaOp::And, formulas, Formula::TRUE)
    }

    /// N-ary disjunction
    pub fn or_all(formulas: Vec<Formula>) -> Formula {
        Formula::nary(BinaryFormulaOp::Or, formulas, Formula::FALSE)
    }

    fn nary(op: BinaryFormulaOp, mut formulas: Vec<Formula>, empty: Formula) -> Formula {
        match formulas.len() {
            0 => empty,
            1 => formulas.swap_remove(0),
            _ => Formula::wrap(FormulaInner::Nary { op, formulas }),
        }
    }

    /// Universal quantification (forall)
    pub fn forall(declarations: Decls, body: Formula) -> Formula {
        Formula::wrap(FormulaInner::Quantified {
            quantifier: Quantifier::All,
            declarations,
            body,
        })
    }

    /// Existential quantification (exists)
    pub fn exists(declarations: Decls, body: Formula) -> Formula {
        Formula::wrap(FormulaInner::Quantified {
            quantifier: Quantifier::Some,
            declarations,
            body,
        })
    }

    /// Returns a reference to the inner formula
    /// Returns Cow::Borrowed for Ref variant, Cow::Owned for True/False
    pub fn inner(&self) -> Cow<'_, FormulaInner> {
        match self {
            Formula::Ref(rc) => Cow::Borrowed(rc.as_ref()),
            Formula::True => Cow::Owned(FormulaInner::Constant(true)),
            Formula::False => Cow::Owned(FormulaInner::Constant(false)),
        }
    }

    /// Splits this formula into its top-level conjuncts.
    ///
    /// Nested binary and n-ary conjunctions are flattened left to right;
    /// any other formula is its own single conjunct.
    pub fn conjuncts(&self) -> Vec<Formula> {
        let mut out = Vec::new();
        let mut stack = vec![self.clone()];
        while let Some(f) = stack.pop() {
            match &*f.inner() {
                FormulaInner::Binary { left, op: BinaryFormulaOp::And, right } => {
                    stack.push(right.clone());
                    stack.push(left.clone());
                }
                FormulaInner::Nary { op: BinaryFormulaOp::And, formulas } => {
                    stack.extend(formulas.iter().rev().cloned());
                }
                _ => out.push(f.clone()),
            }
        }
        out
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.inner() {
            FormulaInner::Constant(v) => write!(f, "{}", v),
            FormulaInner::Binary { left, op, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            FormulaInner::Nary { op, formulas } => {
                write!(f, "(")?;
                for (i, child) in formulas.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", op.symbol())?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
            FormulaInner::Not(inner) => write!(f, "!{}", inner),
            FormulaInner::Comparison { left, op, right } => match op {
                CompareOp::Equals => write!(f, "({} = {})", left, right),
                CompareOp::Subset => write!(f, "({} in {})", left, right),
            },
            FormulaInner::Multiplicity { mult, expr } => write!(f, "{} {}", mult, expr),
            FormulaInner::Quantified { quantifier, declarations, body } => {
                let q = match quantifier {
                    Quantifier::All => "all",
                    Quantifier::Some => "some",
                };
                write!(f, "({} {} | {})", q, declarations, body)
            }
        }
    }
}

impl Expression {
    /// Expression equals another
    pub fn equals(self, other: Expression) -> Formula {
        Formula::wrap(FormulaInner::Comparison {
            left: self,
            op: CompareOp::Equals,
            right: other,
        })
    }

    /// Expression does not equal another (convenience method)
    pub fn ne(self, other: Expression) -> Formula {
        self.equals(other).not()
    }

    /// Expression is subset of another
    pub fn in_set(self, other: Expression) -> Formula {
        Formula::wrap(FormulaInner::Comparison {
            left: self,
            op: CompareOp::Subset,
            right: other,
        })
    }

    fn multiplicity(self, mult: Multiplicity) -> Formula {
        Formula::wrap(FormulaInner::Multiplicity { mult, expr: self })
    }

    /// Expression has at least one element
    pub fn some(self) -> Formula {
        self.multiplicity(Multiplicity::Some)
    }

    /// Expression has exactly one element
    pub fn one(self) -> Formula {
        self.multiplicity(Multiplicity::One)
    }

    /// Expression has at most one element
    pub fn lone(self) -> Formula {
        self.multiplicity(Multiplicity::Lone)
    }

    /// Expression has no elements
    pub fn no(self) -> Formula {
        self.multiplicity(Multiplicity::No)
    }
}

/// A variable declaration (e.g., "x: Expression")
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Decl {
    variable: Variable,
    multiplicity: Multiplicity,
    expression: Expression,
}

impl Decl {
    /// Creates a new declaration with the given multiplicity
    pub fn new(variable: Variable, multiplicity: Multiplicity, expression: Expression) -> Self {
        Self {
            variable,
            multiplicity,
            expression,
        }
    }

    /// Creates a new declaration with "one of" multiplicity
    pub fn one_of(variable: Variable, expression: Expression) -> Self {
        Self::new(variable, Multiplicity::One, expression)
    }

    /// Creates a new declaration with "lone" multiplicity
    pub fn lone_of(variable: Variable, expression: Expression) -> Self {
        Self::new(variable, Multiplicity::Lone, expression)
    }

    /// Creates a new declaration with "some" multiplicity
    pub fn some_of(variable: Variable, expression: Expression) -> Self {
        Self::new(variable, Multiplicity::Some, expression)
    }

    /// Creates a new declaration with "set" multiplicity (no constraint)
    pub fn set_of(variable: Variable, expression: Expression) -> Self {
        Self::new(variable, Multiplicity::Set, expression)
    }

    /// Returns the variable being declared
    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    /// Returns the multiplicity
    pub fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }

    /// Returns the expression
    pub fn expression(&self) -> &Expression {
        &self.expression
    }
}

impl fmt::Display for Decl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.variable, self.multiplicity, self.expression)
    }
}

/// A sequence of variable declarations
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Decls {
    declarations: Vec<Decl>,
}

impl Decls {
    /// Creates a new Decls from a single declaration
    pub fn from(decl: Decl) -> Self {
        Self {
            declarations: vec![decl],
        }
    }

    /// Creates a new Decls from multiple declarations
    pub fn from_vec(declarations: Vec<Decl>) -> Self {
        assert!(!declarations.is_empty(), "Cannot create empty Decls");
        Self { declarations }
    }

    /// Returns the number of declarations
    pub fn size(&self) -> usize {
        self.declarations.len()
    }

    /// Returns an iterator over the declarations
    pub fn iter(&self) -> impl Iterator<Item = &Decl> {
        self.declarations.iter()
    }

    /// Adds a declaration to this Decls
    pub fn and(mut self, decl: Decl) -> Self {
        self.declarations.push(decl);
        self
    }
}

impl fmt::Display for Decls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.declarations.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Expression, Relation};
    use super::*;

    #[test]
    fn constant_formulas() {
        assert!(matches!(&*Formula::TRUE.inner(), FormulaInner::Constant(true)));
        assert!(matches!(&*Formula::FALSE.inner(), FormulaInner::Constant(false)));
        assert!(matches!(&*Formula::constant(true).inner(), FormulaInner::Constant(true)));
    }

    #[test]
    fn nary_formulas() {
        let and = Formula::and_all(vec![Formula::TRUE, Formula::FALSE, Formula::TRUE]);
        assert!(matches!(&*and.inner(), FormulaInner::Nary { op: BinaryFormulaOp::And, .. }));

        // Empty cases
        assert!(matches!(&*Formula::and_all(vec![]).inner(), FormulaInner::Constant(true)));
        assert!(matches!(&*Formula::or_all(vec![]).inner(), FormulaInner::Constant(false)));
        assert_eq!(Formula::or_all(vec![Formula::TRUE]), Formula::TRUE);
    }

    #[test]
    fn structural_equality() {
        let r = Relation::unary("A");
        let f1 = Expression::from(&r).some().and(Expression::from(&r).lone());
        let f2 = Expression::from(&r).some().and(Expression::from(&r).lone());
        assert_eq!(f1, f2);
        assert_ne!(f1, Expression::from(&r).some());
    }

    #[test]
    fn conjuncts_flatten_nested_ands() {
        let a = Relation::unary("A");
        let b = Relation::unary("B");
        let c = Relation::unary("C");
        let f = Expression::from(&a)
            .some()
            .and(Formula::and_all(vec![Expression::from(&b).some(), Expression::from(&c).no()]))
            .and(Expression::from(&a).in_set(Expression::from(&b)).or(Formula::TRUE));

        let roots = f.conjuncts();
        assert_eq!(roots.len(), 4);
        assert_eq!(roots[0], Expression::from(&a).some());
        assert_eq!(roots[2], Expression::from(&c).no());
        assert!(matches!(&*roots[3].inner(), FormulaInner::Binary { op: BinaryFormulaOp::Or, .. }));
    }

    #[test]
    fn quantified_display() {
        let person = Relation::unary("Person");
        let x = Variable::unary("x");
        let decls = Decls::from(Decl::one_of(x.clone(), Expression::from(&person)));
        let f = Formula::forall(decls, Expression::from(x).in_set(Expression::from(&person)));
        assert_eq!(f.to_string(), "(all x: one Person | (x in Person))");
    }
}
