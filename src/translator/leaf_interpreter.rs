//! LeafInterpreter for converting relations and constants to BooleanMatrices

use crate::ast::{ConstantExpr, Relation};
use crate::bool::{BoolValue, BooleanFactory, BooleanMatrix, Dimensions, Options, VariableAllocator};
use crate::engine::VariableTupleMap;
use crate::error::{KodkodError, Result};
use crate::instance::{Bounds, Universe};

/// Interprets leaf expressions (Relations, Constants) as BooleanMatrices
pub struct LeafInterpreter {
    factory: BooleanFactory,
    bounds: Bounds,
    var_map: VariableTupleMap,
}

impl LeafInterpreter {
    /// Creates a LeafInterpreter from Bounds, allocating variables for all relations
    pub fn from_bounds(bounds: &Bounds, options: &Options) -> Self {
        let mut allocator = VariableAllocator::new();
        let var_map = VariableTupleMap::build(bounds, &mut allocator);
        let factory = BooleanFactory::new(allocator.total_variables(), options.clone());
        Self {
            factory,
            bounds: bounds.clone(),
            var_map,
        }
    }

    /// Returns a reference to the factory (has interior mutability)
    pub fn factory(&self) -> &BooleanFactory {
        &self.factory
    }

    /// Returns a reference to the universe
    pub fn universe(&self) -> &Universe {
        self.bounds.universe()
    }

    /// Returns the variable/tuple map built for these bounds
    pub fn var_map(&self) -> &VariableTupleMap {
        &self.var_map
    }

    /// Consumes the interpreter, keeping its factory and variable map
    pub fn into_parts(self) -> (BooleanFactory, VariableTupleMap) {
        (self.factory, self.var_map)
    }

    fn dimensions(&self, arity: usize) -> Result<Dimensions> {
        Dimensions::square(self.universe().size(), arity).ok_or_else(|| {
            KodkodError::CapacityExceeded(format!(
                "a relation of arity {} over {} atoms",
                arity,
                self.universe().size()
            ))
        })
    }

    /// Interprets a relation as a BooleanMatrix
    ///
    /// Lower-bound tuples are TRUE; every other upper-bound tuple is its
    /// primary variable.
    pub fn interpret_relation(&self, rel: &Relation) -> Result<BooleanMatrix> {
        let lower = self
            .bounds
            .lower_bound(rel)
            .ok_or_else(|| KodkodError::UnboundLeaf(format!("relation {}", rel)))?;

        let mut matrix = BooleanMatrix::empty(self.dimensions(rel.arity())?);
        for idx in lower.indices() {
            matrix.set(idx, BoolValue::TRUE);
        }
        let vars = self.var_map.primary_variables(rel);
        for (var, &idx) in vars.zip(self.var_map.unknown_tuples(rel)) {
            matrix.set(idx, self.factory.variable(var as i32));
        }
        Ok(matrix)
    }

    /// Interprets a constant expression (UNIV, NONE, IDEN)
    pub fn interpret_constant(&self, c: ConstantExpr) -> Result<BooleanMatrix> {
        let n = self.universe().size();
        match c {
            ConstantExpr::Univ => {
                let mut matrix = BooleanMatrix::empty(self.dimensions(1)?);
                for i in 0..n {
                    matrix.set(i, BoolValue::TRUE);
                }
                Ok(matrix)
            }
            ConstantExpr::None => Ok(BooleanMatrix::empty(self.dimensions(1)?)),
            ConstantExpr::Iden => BooleanMatrix::identity(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_matrix_mixes_constants_and_variables() {
        let universe = Universe::new(&["a", "b", "c"]).unwrap();
        let f = universe.factory();
        let mut bounds = Bounds::new(universe);
        let r = Relation::unary("r");
        bounds
            .bound(&r, f.tuple_set(&[&["a"]]).unwrap(), f.tuple_set(&[&["a"], &["c"]]).unwrap())
            .unwrap();

        let interpreter = LeafInterpreter::from_bounds(&bounds, &Options::default());
        let m = interpreter.interpret_relation(&r).unwrap();
        assert_eq!(m.get(0), BoolValue::TRUE);
        assert_eq!(m.get(1), BoolValue::FALSE);
        assert_eq!(m.get(2).label(), 1);
        assert_eq!(interpreter.factory().num_variables(), 1);
    }

    #[test]
    fn unbound_relation_is_an_error() {
        let universe = Universe::new(&["a"]).unwrap();
        let interpreter = LeafInterpreter::from_bounds(&Bounds::new(universe), &Options::default());
        let result = interpreter.interpret_relation(&Relation::unary("ghost"));
        assert!(matches!(result, Err(KodkodError::UnboundLeaf(_))));
    }

    #[test]
    fn constants() {
        let universe = Universe::new(&["a", "b"]).unwrap();
        let interpreter = LeafInterpreter::from_bounds(&Bounds::new(universe), &Options::default());
        assert_eq!(interpreter.interpret_constant(ConstantExpr::Univ).unwrap().dense_indices(), vec![0, 1]);
        assert_eq!(interpreter.interpret_constant(ConstantExpr::Iden).unwrap().dense_indices(), vec![0, 3]);
        assert_eq!(interpreter.interpret_constant(ConstantExpr::None).unwrap().density(), 0);
    }
}
