//! Boolean factory with gate caching
//!
//! The factory creates boolean values and formulas, with automatic deduplication.
//! Uses interior mutability (Cell/RefCell) to avoid &mut self everywhere.
//! Labels `1..=num_variables` are primary variables; gates are labelled
//! upward from there. Negation never allocates: NOT x is labelled `-label(x)`.

use super::{BoolValue, BooleanConstant, BooleanFormula, BooleanMatrix, BooleanVariable, Dimensions, Operator};
use rustc_hash::FxHashMap;
use std::cell::{Cell, RefCell};

/// Options for boolean factory
#[derive(Debug, Clone)]
pub struct Options {
    /// Enable sharing of boolean formulas (default: true)
    pub sharing: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { sharing: true }
    }
}

/// A multi-input gate stored by the factory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate {
    op: Operator,
    inputs: Box<[i32]>,
}

impl Gate {
    /// The gate operator (AND, OR or ITE)
    pub fn op(&self) -> Operator {
        self.op
    }

    /// Signed input labels; for ITE these are condition, then, else
    pub fn inputs(&self) -> &[i32] {
        &self.inputs
    }
}

/// Boolean circuit factory with caching
///
/// Creates boolean values and formulas, with automatic deduplication of gates.
/// Uses interior mutability to allow creating gates through `&self`.
pub struct BooleanFactory {
    num_variables: u32,
    next_label: Cell<u32>,
    options: Options,
    gates: RefCell<Vec<Gate>>,
    cache: RefCell<FxHashMap<(Operator, Box<[i32]>), i32>>,
}

impl BooleanFactory {
    /// Creates a new boolean factory
    ///
    /// # Arguments
    /// * `num_variables` - Number of primary variables, labelled `1..=num_variables`
    /// * `options` - Factory options
    pub fn new(num_variables: u32, options: Options) -> Self {
        Self {
            num_variables,
            next_label: Cell::new(num_variables + 1),
            options,
            gates: RefCell::new(Vec::new()),
            cache: RefCell::new(FxHashMap::default()),
        }
    }

    /// Returns the number of primary variables
    pub fn num_variables(&self) -> u32 {
        self.num_variables
    }

    /// Returns the largest label handed out so far
    pub fn max_label(&self) -> u32 {
        self.next_label.get() - 1
    }

    /// Returns the number of gates created
    pub fn num_gates(&self) -> usize {
        self.gates.borrow().len()
    }

    /// Returns the gate with the given (positive) label
    pub fn gate(&self, label: i32) -> Option<Gate> {
        let index = usize::try_from(label).ok()?.checked_sub(self.num_variables as usize + 1)?;
        self.gates.borrow().get(index).cloned()
    }

    /// Creates a boolean variable
    pub fn variable(&self, label: i32) -> BoolValue {
        assert!(label > 0 && label <= self.num_variables as i32,
                "Variable label must be in range 1..={}", self.num_variables);
        BoolValue::Variable(BooleanVariable::new(label))
    }

    /// Creates a constant
    pub fn constant(&self, value: bool) -> BoolValue {
        BoolValue::Constant(BooleanConstant::of(value))
    }

    /// Rebuilds the value that carries `label`
    fn value_of_label(&self, label: i32) -> BoolValue {
        if label == i32::MAX {
            BoolValue::TRUE
        } else if label == -i32::MAX {
            BoolValue::FALSE
        } else if label < 0 {
            BoolValue::Formula(BooleanFormula::new(label, Operator::NOT))
        } else if label as u32 <= self.num_variables {
            BoolValue::Variable(BooleanVariable::new(label))
        } else {
            let op = self.gate(label).map_or(Operator::AND, |g| g.op);
            BoolValue::Formula(BooleanFormula::new(label, op))
        }
    }

    /// Negation
    pub fn not(&self, input: BoolValue) -> BoolValue {
        match input {
            BoolValue::Constant(c) => self.constant(!c.boolean_value()),
            other => self.value_of_label(-other.label()),
        }
    }

    /// Creates an AND gate
    pub fn and(&self, left: BoolValue, right: BoolValue) -> BoolValue {
        self.and_multi(vec![left, right])
    }

    /// Creates a multi-input AND gate
    pub fn and_multi(&self, inputs: Vec<BoolValue>) -> BoolValue {
        self.nary(Operator::AND, inputs)
    }

    /// Creates an OR gate
    pub fn or(&self, left: BoolValue, right: BoolValue) -> BoolValue {
        self.or_multi(vec![left, right])
    }

    /// Creates a multi-input OR gate
    pub fn or_multi(&self, inputs: Vec<BoolValue>) -> BoolValue {
        self.nary(Operator::OR, inputs)
    }

    fn nary(&self, op: Operator, inputs: Vec<BoolValue>) -> BoolValue {
        // AND: TRUE is the identity and FALSE absorbs; dual for OR
        let identity = op == Operator::AND;
        let mut labels: Vec<i32> = Vec::with_capacity(inputs.len());
        for v in inputs {
            match v.as_constant() {
                Some(c) if c == identity => {}
                Some(_) => return self.constant(!identity),
                None => labels.push(v.label()),
            }
        }
        labels.sort_unstable();
        labels.dedup();
        // x and !x together collapse the gate
        if labels.iter().any(|l| *l > 0 && labels.binary_search(&-l).is_ok()) {
            return self.constant(!identity);
        }
        match labels.len() {
            0 => self.constant(identity),
            1 => self.value_of_label(labels[0]),
            _ => self.gate_value(op, labels.into_boxed_slice()),
        }
    }

    /// Creates an if-then-else gate
    pub fn ite(&self, condition: BoolValue, then_val: BoolValue, else_val: BoolValue) -> BoolValue {
        if let Some(c) = condition.as_constant() {
            return if c { then_val } else { else_val };
        }
        if then_val == else_val {
            return then_val;
        }
        match (then_val.as_constant(), else_val.as_constant()) {
            (Some(true), _) => return self.or(condition, else_val),
            (Some(false), _) => return self.and(self.not(condition), else_val),
            (_, Some(true)) => return self.or(self.not(condition), then_val),
            (_, Some(false)) => return self.and(condition, then_val),
            _ => {}
        }
        if condition == then_val {
            return self.or(condition, else_val);
        }
        if condition == else_val {
            return self.and(condition, then_val);
        }
        self.gate_value(
            Operator::ITE,
            Box::new([condition.label(), then_val.label(), else_val.label()]),
        )
    }

    fn gate_value(&self, op: Operator, inputs: Box<[i32]>) -> BoolValue {
        if self.options.sharing {
            if let Some(&label) = self.cache.borrow().get(&(op, inputs.clone())) {
                return BoolValue::Formula(BooleanFormula::new(label, op));
            }
        }
        let label = self.allocate_label();
        if self.options.sharing {
            self.cache.borrow_mut().insert((op, inputs.clone()), label);
        }
        self.gates.borrow_mut().push(Gate { op, inputs });
        BoolValue::Formula(BooleanFormula::new(label, op))
    }

    /// IFF (if and only if)
    pub fn iff(&self, a: BoolValue, b: BoolValue) -> BoolValue {
        let not_b = self.not(b);
        self.ite(a, b, not_b)
    }

    /// IMPLIES: a IMPLIES b = NOT a OR b
    pub fn implies(&self, a: BoolValue, b: BoolValue) -> BoolValue {
        let not_a = self.not(a);
        self.or(not_a, b)
    }

    /// Creates an empty boolean matrix with the given dimensions
    pub fn matrix(&self, dimensions: Dimensions) -> BooleanMatrix {
        BooleanMatrix::empty(dimensions)
    }

    fn allocate_label(&self) -> i32 {
        let label = self.next_label.get();
        self.next_label.set(label + 1);
        label as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_and_labels() {
        let factory = BooleanFactory::new(5, Options::default());
        let v1 = factory.variable(1);
        let v2 = factory.variable(2);

        assert_eq!(v1.label(), 1);
        assert_ne!(v1, v2);
        assert_eq!(factory.max_label(), 5);
    }

    #[test]
    fn gate_deduplication() {
        let factory = BooleanFactory::new(5, Options::default());
        let v1 = factory.variable(1);
        let v2 = factory.variable(2);

        let and1 = factory.and(v1, v2);
        let and2 = factory.and(v2, v1);
        assert_eq!(and1.label(), and2.label());
        assert_eq!(and1.label(), 6);
        assert_eq!(factory.num_gates(), 1);
        assert_eq!(factory.gate(6).unwrap().inputs(), &[1, 2]);
    }

    #[test]
    fn no_sharing_allocates_fresh_gates() {
        let factory = BooleanFactory::new(2, Options { sharing: false });
        let v1 = factory.variable(1);
        let v2 = factory.variable(2);
        let a = factory.and(v1, v2);
        let b = factory.and(v1, v2);
        assert_ne!(a.label(), b.label());
    }

    #[test]
    fn constant_folding() {
        let factory = BooleanFactory::new(5, Options::default());
        let v1 = factory.variable(1);

        assert_eq!(factory.and(BoolValue::TRUE, BoolValue::FALSE), BoolValue::FALSE);
        assert_eq!(factory.and(BoolValue::TRUE, v1), v1);
        assert_eq!(factory.or(BoolValue::TRUE, v1), BoolValue::TRUE);
        assert_eq!(factory.or(BoolValue::FALSE, v1), v1);
        assert_eq!(factory.not(BoolValue::TRUE), BoolValue::FALSE);
        assert_eq!(factory.and_multi(vec![]), BoolValue::TRUE);
        assert_eq!(factory.or_multi(vec![]), BoolValue::FALSE);
    }

    #[test]
    fn complementary_inputs_collapse() {
        let factory = BooleanFactory::new(5, Options::default());
        let v1 = factory.variable(1);
        let n1 = factory.not(v1);
        assert_eq!(factory.and(v1, n1), BoolValue::FALSE);
        assert_eq!(factory.or(v1, n1), BoolValue::TRUE);
        assert_eq!(factory.num_gates(), 0);
    }

    #[test]
    fn negation_is_by_label() {
        let factory = BooleanFactory::new(3, Options::default());
        let v1 = factory.variable(1);
        let v2 = factory.variable(2);
        let n1 = factory.not(v1);
        assert_eq!(n1.label(), -1);
        assert_eq!(factory.not(n1), v1);

        let g = factory.or(v1, v2);
        let ng = factory.not(g);
        assert_eq!(ng.label(), -g.label());
        assert_eq!(factory.not(ng), g);
        // negations never allocate
        assert_eq!(factory.max_label(), 4);
    }

    #[test]
    fn ite_simplification() {
        let factory = BooleanFactory::new(5, Options::default());
        let v1 = factory.variable(1);
        let v2 = factory.variable(2);
        let v3 = factory.variable(3);

        assert_eq!(factory.ite(BoolValue::TRUE, v1, v2), v1);
        assert_eq!(factory.ite(BoolValue::FALSE, v1, v2), v2);
        assert_eq!(factory.ite(v1, v2, v2), v2);
        assert_eq!(factory.ite(v1, BoolValue::TRUE, BoolValue::FALSE), v1);

        let g = factory.ite(v1, v2, v3);
        assert!(matches!(g, BoolValue::Formula(f) if f.op() == Operator::ITE));
        assert_eq!(factory.gate(g.label()).unwrap().inputs(), &[1, 2, 3]);
    }
}
