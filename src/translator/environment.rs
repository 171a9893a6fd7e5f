//! Environment for variable bindings during translation

use crate::ast::Variable;
use crate::bool::BooleanMatrix;

/// Stack-based environment for quantified variable bindings
#[derive(Default)]
pub struct Environment {
    bindings: Vec<(Variable, BooleanMatrix)>,
}

impl Environment {
    /// Creates an empty environment
    pub fn empty() -> Self {
        Self::default()
    }

    /// Pushes a new binding (for entering quantifier scope)
    pub fn extend(&mut self, var: Variable, value: BooleanMatrix) {
        self.bindings.push((var, value));
    }

    /// Pops the most recent binding (for exiting quantifier scope)
    pub fn pop(&mut self) {
        self.bindings.pop();
    }

    /// Looks up a variable, most recent binding first
    pub fn lookup(&self, var: &Variable) -> Option<&BooleanMatrix> {
        self.bindings.iter().rev().find(|(v, _)| v == var).map(|(_, m)| m)
    }

    /// Looks up a variable mutably, most recent binding first
    pub fn lookup_mut(&mut self, var: &Variable) -> Option<&mut BooleanMatrix> {
        self.bindings.iter_mut().rev().find(|(v, _)| v == var).map(|(_, m)| m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bool::Dimensions;

    fn matrix(n: usize) -> BooleanMatrix {
        BooleanMatrix::empty(Dimensions::square(n, 1).unwrap())
    }

    #[test]
    fn shadowing_and_pop() {
        let mut env = Environment::empty();
        let x = Variable::unary("x");
        let y = Variable::unary("y");
        assert!(env.lookup(&x).is_none());

        env.extend(x.clone(), matrix(2));
        env.extend(y.clone(), matrix(4));
        env.extend(x.clone(), matrix(3));
        assert_eq!(env.lookup(&x).unwrap().dimensions().capacity(), 3);

        env.pop();
        assert_eq!(env.lookup(&x).unwrap().dimensions().capacity(), 2);
        assert!(env.lookup(&y).is_some());

        env.pop();
        env.pop();
        assert!(env.lookup(&x).is_none());
    }

    #[test]
    fn lookup_mut_updates_binding() {
        let mut env = Environment::empty();
        let x = Variable::unary("x");
        env.extend(x.clone(), matrix(2));
        if let Some(m) = env.lookup_mut(&x) {
            *m = matrix(5);
        }
        assert_eq!(env.lookup(&x).unwrap().dimensions().capacity(), 5);
    }
}
