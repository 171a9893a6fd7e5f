//! Boolean circuit to CNF translation
//!
//! Converts boolean gates to CNF clauses using the Tseitin transformation.
//! Every gate is defined by a full equivalence with its inputs, so gate
//! variables are functionally determined by the primary variables.

use crate::bool::{BoolValue, BooleanFactory, Operator};
use rustc_hash::FxHashSet;

/// CNF representation
#[derive(Debug, Clone, Default)]
pub struct CNF {
    /// Number of variables
    pub num_variables: u32,
    /// CNF clauses (each clause is a vec of literals, negative = negated)
    pub clauses: Vec<Vec<i32>>,
}

impl CNF {
    /// Creates a new empty CNF
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a clause to the CNF
    pub fn add_clause(&mut self, clause: Vec<i32>) {
        for &lit in &clause {
            self.num_variables = self.num_variables.max(lit.unsigned_abs());
        }
        self.clauses.push(clause);
    }

    /// Number of clauses
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }
}

/// Translates boolean circuits built by one factory to CNF
pub struct CNFTranslator<'a> {
    cnf: CNF,
    factory: &'a BooleanFactory,
    /// Gate labels already defined
    visited: FxHashSet<i32>,
}

impl<'a> CNFTranslator<'a> {
    /// Creates a new CNF translator
    pub fn new(factory: &'a BooleanFactory) -> Self {
        let cnf = CNF {
            num_variables: factory.max_label(),
            clauses: Vec::new(),
        };
        Self {
            cnf,
            factory,
            visited: FxHashSet::default(),
        }
    }

    /// Adds the definitions of every gate `value` depends on and returns its
    /// literal, or None if `value` is a constant
    pub fn define(&mut self, value: BoolValue) -> Option<i32> {
        if value.is_constant() {
            return None;
        }
        let literal = value.label();

        // post-order over the gate DAG without recursion
        let mut stack = vec![(literal.abs(), false)];
        while let Some((label, expanded)) = stack.pop() {
            if label as u32 <= self.factory.num_variables() || self.visited.contains(&label) {
                continue;
            }
            let Some(gate) = self.factory.gate(label) else {
                continue;
            };
            if expanded {
                self.visited.insert(label);
                self.encode(label, gate.op(), gate.inputs());
            } else {
                stack.push((label, true));
                for input in gate.inputs() {
                    stack.push((input.abs(), false));
                }
            }
        }
        Some(literal)
    }

    /// Asserts `value` with a unit clause; FALSE becomes the empty clause
    pub fn assert_true(&mut self, value: BoolValue) {
        match value.as_constant() {
            Some(true) => {}
            Some(false) => self.cnf.add_clause(vec![]),
            None => {
                if let Some(lit) = self.define(value) {
                    self.cnf.add_clause(vec![lit]);
                }
            }
        }
    }

    /// Returns the accumulated CNF
    pub fn finish(self) -> CNF {
        self.cnf
    }

    fn encode(&mut self, output: i32, op: Operator, inputs: &[i32]) {
        match op {
            Operator::AND => self.encode_and(output, inputs),
            Operator::OR => self.encode_or(output, inputs),
            Operator::ITE => self.encode_ite(output, inputs[0], inputs[1], inputs[2]),
            // negations are literals, never stored gates
            Operator::NOT => {}
        }
    }

    /// output = a1 ∧ ... ∧ an
    fn encode_and(&mut self, output: i32, inputs: &[i32]) {
        let mut clause: Vec<i32> = inputs.iter().map(|&l| -l).collect();
        clause.push(output);
        self.cnf.add_clause(clause);
        for &input in inputs {
            self.cnf.add_clause(vec![input, -output]);
        }
    }

    /// output = a1 ∨ ... ∨ an
    fn encode_or(&mut self, output: i32, inputs: &[i32]) {
        let mut clause = inputs.to_vec();
        clause.push(-output);
        self.cnf.add_clause(clause);
        for &input in inputs {
            self.cnf.add_clause(vec![-input, output]);
        }
    }

    /// output = if cond then t else e
    fn encode_ite(&mut self, output: i32, cond: i32, then_label: i32, else_label: i32) {
        self.cnf.add_clause(vec![-cond, -then_label, output]);
        self.cnf.add_clause(vec![-cond, then_label, -output]);
        self.cnf.add_clause(vec![cond, -else_label, output]);
        self.cnf.add_clause(vec![cond, else_label, -output]);
    }
}
