//! Boolean circuit representation
//!
//! The boolean layer is the intermediate representation used when translating
//! first-order logic formulas to CNF for SAT solving.
//!
//! Key types:
//! - `BooleanConstant`: TRUE (label `i32::MAX`) or FALSE (label `-i32::MAX`)
//! - `BooleanVariable`: primary variables with positive labels `1..=n`
//! - `BooleanFormula`: gates (AND, OR, ITE) and negations; a negation carries
//!   the negated label of its input
//! - `BoolValue`: enum encompassing all boolean value types
//! - `Dimensions` / `BooleanMatrix`: sparse matrices encoding relations
//! - `BooleanFactory`: factory for creating and caching boolean circuits

mod factory;
mod matrix_ops;
pub mod var_allocator;

pub use factory::{BooleanFactory, Gate, Options};
pub use var_allocator::VariableAllocator;

use std::collections::BTreeMap;

/// Boolean constant (TRUE or FALSE)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanConstant {
    /// TRUE constant (label `i32::MAX`)
    TRUE,
    /// FALSE constant (label `-i32::MAX`)
    FALSE,
}

impl BooleanConstant {
    /// Returns the label for this constant
    pub fn label(&self) -> i32 {
        match self {
            BooleanConstant::TRUE => i32::MAX,
            BooleanConstant::FALSE => -i32::MAX,
        }
    }

    /// Returns the boolean value of this constant
    pub fn boolean_value(&self) -> bool {
        *self == BooleanConstant::TRUE
    }

    /// Returns the constant for `value`
    pub fn of(value: bool) -> Self {
        if value {
            BooleanConstant::TRUE
        } else {
            BooleanConstant::FALSE
        }
    }
}

/// Boolean variable with a positive integer label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BooleanVariable {
    label: i32,
}

impl BooleanVariable {
    /// Creates a new boolean variable with the given label.
    ///
    /// # Panics
    /// Panics if label is not positive (must be > 0).
    pub fn new(label: i32) -> Self {
        assert!(label > 0, "Variable labels must be positive");
        Self { label }
    }

    /// Returns the label for this variable
    pub fn label(&self) -> i32 {
        self.label
    }
}

/// Boolean formula (gate or negation)
///
/// Formulas have identity-based equality using their labels. A negation has
/// operator `NOT` and the negated label of the value it negates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BooleanFormula {
    label: i32,
    op: Operator,
}

impl BooleanFormula {
    pub(crate) fn new(label: i32, op: Operator) -> Self {
        Self { label, op }
    }

    /// Returns the label for this formula
    pub fn label(&self) -> i32 {
        self.label
    }

    /// Returns the operator of this formula
    pub fn op(&self) -> Operator {
        self.op
    }
}

/// Unified boolean value type
///
/// Encompasses constants, variables, and formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolValue {
    /// Constant (TRUE or FALSE)
    Constant(BooleanConstant),
    /// Variable
    Variable(BooleanVariable),
    /// Formula (gate)
    Formula(BooleanFormula),
}

impl BoolValue {
    /// The TRUE constant
    pub const TRUE: BoolValue = BoolValue::Constant(BooleanConstant::TRUE);
    /// The FALSE constant
    pub const FALSE: BoolValue = BoolValue::Constant(BooleanConstant::FALSE);

    /// Returns the label for this value
    pub fn label(&self) -> i32 {
        match self {
            BoolValue::Constant(c) => c.label(),
            BoolValue::Variable(v) => v.label(),
            BoolValue::Formula(f) => f.label(),
        }
    }

    /// Returns true if this is a constant
    pub fn is_constant(&self) -> bool {
        matches!(self, BoolValue::Constant(_))
    }

    /// Returns the constant's value, if this is a constant
    pub fn as_constant(&self) -> Option<bool> {
        match self {
            BoolValue::Constant(c) => Some(c.boolean_value()),
            _ => None,
        }
    }
}

impl From<BooleanConstant> for BoolValue {
    fn from(c: BooleanConstant) -> Self {
        BoolValue::Constant(c)
    }
}

impl From<BooleanVariable> for BoolValue {
    fn from(v: BooleanVariable) -> Self {
        BoolValue::Variable(v)
    }
}

/// Boolean operators for formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Logical AND
    AND,
    /// Logical OR
    OR,
    /// Logical NOT
    NOT,
    /// If-Then-Else (ternary conditional)
    ITE,
}

/// Dimensions for boolean matrices
///
/// A matrix for a relation of arity `k` over `n` atoms has `n^k` cells,
/// indexed the same way tuples are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    universe_size: usize,
    arity: usize,
    capacity: usize,
}

impl Dimensions {
    /// Creates square dimensions for a relation of given arity over a universe
    ///
    /// Returns None when `universe_size^arity` overflows.
    pub fn square(universe_size: usize, arity: usize) -> Option<Self> {
        let capacity = universe_size.checked_pow(u32::try_from(arity).ok()?)?;
        Some(Self {
            universe_size,
            arity,
            capacity,
        })
    }

    /// Returns the total capacity (number of tuples in the relation)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the arity (dimensionality)
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Returns the size of each dimension
    pub fn dimension_0(&self) -> usize {
        self.universe_size
    }
}

/// Matrix of boolean values
///
/// Used to encode relations during FOL→Boolean translation.
/// Implements sparse storage: only non-FALSE entries are stored, in index order.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanMatrix {
    dimensions: Dimensions,
    cells: BTreeMap<usize, BoolValue>,
}

impl BooleanMatrix {
    /// Creates an empty matrix with the given dimensions (all FALSE)
    pub fn empty(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            cells: BTreeMap::new(),
        }
    }

    /// Returns the dimensions of this matrix
    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    /// Sets value at flat index
    pub fn set(&mut self, index: usize, value: BoolValue) {
        debug_assert!(index < self.dimensions.capacity());
        if value == BoolValue::FALSE {
            self.cells.remove(&index);
        } else {
            self.cells.insert(index, value);
        }
    }

    /// Gets value at flat index
    pub fn get(&self, index: usize) -> BoolValue {
        self.cells.get(&index).copied().unwrap_or(BoolValue::FALSE)
    }

    /// Iterates over (index, value) pairs of the non-FALSE entries, in index order
    pub fn iter_indexed(&self) -> impl Iterator<Item = (usize, BoolValue)> + '_ {
        self.cells.iter().map(|(&idx, &val)| (idx, val))
    }

    /// Returns the number of non-FALSE entries
    pub fn density(&self) -> usize {
        self.cells.len()
    }

    /// Returns the indices whose value is the TRUE constant
    pub fn dense_indices(&self) -> Vec<usize> {
        self.cells
            .iter()
            .filter(|(_, v)| **v == BoolValue::TRUE)
            .map(|(&idx, _)| idx)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_labels_are_extreme() {
        assert_eq!(BoolValue::TRUE.label(), i32::MAX);
        assert_eq!(BoolValue::FALSE.label(), -i32::MAX);
        assert_eq!(BoolValue::TRUE.as_constant(), Some(true));
        assert_eq!(BooleanConstant::of(false), BooleanConstant::FALSE);
    }

    #[test]
    fn square_dimensions() {
        let dims = Dimensions::square(3, 2).unwrap();
        assert_eq!(dims.capacity(), 9);
        assert_eq!(dims.arity(), 2);
        assert_eq!(dims.dimension_0(), 3);
        assert!(Dimensions::square(usize::MAX, 2).is_none());
    }

    #[test]
    fn sparse_matrix_drops_false() {
        let mut m = BooleanMatrix::empty(Dimensions::square(2, 2).unwrap());
        m.set(1, BoolValue::TRUE);
        m.set(3, BoolValue::Variable(BooleanVariable::new(1)));
        assert_eq!(m.density(), 2);
        m.set(3, BoolValue::FALSE);
        assert_eq!(m.density(), 1);
        assert_eq!(m.get(3), BoolValue::FALSE);
        assert_eq!(m.dense_indices(), vec![1]);
    }
}
