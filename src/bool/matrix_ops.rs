//! Matrix operations for relational algebra
//!
//! Operations like union, intersection, transpose, join, etc. Every cell of
//! a result is built through the factory, so constants fold as they go.

use std::collections::{BTreeMap, BTreeSet};

use super::{BoolValue, BooleanFactory, BooleanMatrix, Dimensions};
use crate::error::{KodkodError, Result};

fn dimensions(universe_size: usize, arity: usize) -> Result<Dimensions> {
    Dimensions::square(universe_size, arity).ok_or_else(|| {
        KodkodError::CapacityExceeded(format!(
            "a relation of arity {} over {} atoms",
            arity, universe_size
        ))
    })
}

impl BooleanMatrix {
    /// The identity relation over `universe_size` atoms
    pub fn identity(universe_size: usize) -> Result<BooleanMatrix> {
        let mut m = BooleanMatrix::empty(dimensions(universe_size, 2)?);
        for i in 0..universe_size {
            m.set(i * universe_size + i, BoolValue::TRUE);
        }
        Ok(m)
    }

    /// Union (OR) of two matrices
    pub fn union(&self, other: &BooleanMatrix, factory: &BooleanFactory) -> BooleanMatrix {
        assert_eq!(self.dimensions, other.dimensions, "Matrix dimensions must match for union");
        let mut result = self.clone();
        for (idx, val) in other.iter_indexed() {
            let mine = self.get(idx);
            result.set(idx, factory.or(mine, val));
        }
        result
    }

    /// Intersection (AND) of two matrices
    pub fn intersection(&self, other: &BooleanMatrix, factory: &BooleanFactory) -> BooleanMatrix {
        assert_eq!(self.dimensions, other.dimensions, "Matrix dimensions must match for intersection");
        let mut result = BooleanMatrix::empty(self.dimensions);
        for (idx, val) in self.iter_indexed() {
            if let Some(&theirs) = other.cells.get(&idx) {
                result.set(idx, factory.and(val, theirs));
            }
        }
        result
    }

    /// Difference (this AND NOT other)
    pub fn difference(&self, other: &BooleanMatrix, factory: &BooleanFactory) -> BooleanMatrix {
        assert_eq!(self.dimensions, other.dimensions, "Matrix dimensions must match for difference");
        let mut result = BooleanMatrix::empty(self.dimensions);
        for (idx, val) in self.iter_indexed() {
            let theirs = factory.not(other.get(idx));
            result.set(idx, factory.and(val, theirs));
        }
        result
    }

    /// Relational override: tuples of `other`, plus tuples of `self` whose
    /// first atom has no tuple in `other`
    pub fn override_with(&self, other: &BooleanMatrix, factory: &BooleanFactory) -> BooleanMatrix {
        assert_eq!(self.dimensions, other.dimensions, "Matrix dimensions must match for override");
        let row_size = self.dimensions.capacity() / self.dimensions.dimension_0();

        let mut other_rows: BTreeMap<usize, Vec<BoolValue>> = BTreeMap::new();
        for (idx, val) in other.iter_indexed() {
            other_rows.entry(idx / row_size).or_default().push(val);
        }
        let row_some: BTreeMap<usize, BoolValue> = other_rows
            .into_iter()
            .map(|(row, vals)| (row, factory.or_multi(vals)))
            .collect();

        let mut result = other.clone();
        for (idx, val) in self.iter_indexed() {
            let shadowed = row_some.get(&(idx / row_size)).copied().unwrap_or(BoolValue::FALSE);
            let kept = factory.and(val, factory.not(shadowed));
            let merged = factory.or(kept, other.get(idx));
            result.set(idx, merged);
        }
        result
    }

    /// Join (dot product) of two matrices
    ///
    /// The last column of `self` is matched against the first column of `other`.
    pub fn join(&self, other: &BooleanMatrix, factory: &BooleanFactory) -> Result<BooleanMatrix> {
        let n = self.dimensions.dimension_0();
        let arity = self.dimensions.arity() + other.dimensions.arity() - 2;
        let dims = dimensions(n, arity)?;
        let rest = other.dimensions.capacity() / n;

        let mut terms: BTreeMap<usize, Vec<BoolValue>> = BTreeMap::new();
        for (i, left) in self.iter_indexed() {
            let prefix = i / n;
            let last = i % n;
            for (&j, &right) in other.cells.range(last * rest..(last + 1) * rest) {
                let k = prefix * rest + (j - last * rest);
                terms.entry(k).or_default().push(factory.and(left, right));
            }
        }

        let mut result = BooleanMatrix::empty(dims);
        for (k, vals) in terms {
            result.set(k, factory.or_multi(vals));
        }
        Ok(result)
    }

    /// Cartesian product of two matrices
    pub fn product(&self, other: &BooleanMatrix, factory: &BooleanFactory) -> Result<BooleanMatrix> {
        let n = self.dimensions.dimension_0();
        let dims = dimensions(n, self.dimensions.arity() + other.dimensions.arity())?;
        let stride = other.dimensions.capacity();

        let mut result = BooleanMatrix::empty(dims);
        for (i, left) in self.iter_indexed() {
            for (j, right) in other.iter_indexed() {
                result.set(i * stride + j, factory.and(left, right));
            }
        }
        Ok(result)
    }

    /// Transposes a binary matrix
    pub fn transpose(&self) -> BooleanMatrix {
        assert_eq!(self.dimensions.arity(), 2, "Transpose requires binary matrix");
        let n = self.dimensions.dimension_0();
        let mut result = BooleanMatrix::empty(self.dimensions);
        for (idx, val) in self.iter_indexed() {
            result.set((idx % n) * n + idx / n, val);
        }
        result
    }

    /// Transitive closure of a binary relation by iterative squaring
    pub fn closure(&self, factory: &BooleanFactory) -> Result<BooleanMatrix> {
        assert_eq!(self.dimensions.arity(), 2, "closure requires binary relation");
        let n = self.dimensions.dimension_0();

        let rows: BTreeSet<usize> = self.cells.keys().map(|idx| idx / n).collect();
        let mut ret = self.clone();
        let mut i = 1;
        while i < rows.len() {
            let squared = ret.join(&ret, factory)?;
            ret = ret.union(&squared, factory);
            i *= 2;
        }
        Ok(ret)
    }

    /// Reflexive transitive closure: `IDEN + ^self`
    pub fn reflexive_closure(&self, factory: &BooleanFactory) -> Result<BooleanMatrix> {
        let closure = self.closure(factory)?;
        let iden = BooleanMatrix::identity(self.dimensions.dimension_0())?;
        Ok(closure.union(&iden, factory))
    }

    /// Subset: every entry of `self` implies the matching entry of `other`
    pub fn subset(&self, other: &BooleanMatrix, factory: &BooleanFactory) -> BoolValue {
        assert_eq!(self.dimensions, other.dimensions);
        let implications = self
            .iter_indexed()
            .map(|(idx, val)| factory.implies(val, other.get(idx)))
            .collect();
        factory.and_multi(implications)
    }

    /// Set equality
    pub fn equals(&self, other: &BooleanMatrix, factory: &BooleanFactory) -> BoolValue {
        let forward = self.subset(other, factory);
        let backward = other.subset(self, factory);
        factory.and(forward, backward)
    }

    /// At least one entry is TRUE
    pub fn some(&self, factory: &BooleanFactory) -> BoolValue {
        factory.or_multi(self.cells.values().copied().collect())
    }

    /// All entries are FALSE
    pub fn none(&self, factory: &BooleanFactory) -> BoolValue {
        factory.not(self.some(factory))
    }

    /// At most one entry is TRUE
    pub fn lone(&self, factory: &BooleanFactory) -> BoolValue {
        self.at_most_one(factory).0
    }

    /// Exactly one entry is TRUE
    pub fn one(&self, factory: &BooleanFactory) -> BoolValue {
        let (lone, some) = self.at_most_one(factory);
        factory.and(lone, some)
    }

    /// Returns (at most one entry is TRUE, some entry is TRUE) using a running
    /// prefix disjunction
    fn at_most_one(&self, factory: &BooleanFactory) -> (BoolValue, BoolValue) {
        let mut constraints = Vec::with_capacity(self.cells.len());
        let mut partial = BoolValue::FALSE;
        for &val in self.cells.values() {
            constraints.push(factory.not(factory.and(val, partial)));
            partial = factory.or(partial, val);
        }
        (factory.and_multi(constraints), partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bool::Options;

    fn unary(n: usize) -> Dimensions {
        Dimensions::square(n, 1).unwrap()
    }

    fn binary(n: usize) -> Dimensions {
        Dimensions::square(n, 2).unwrap()
    }

    #[test]
    fn join_of_constants() {
        let factory = BooleanFactory::new(0, Options::default());
        // {a} . {(a,b),(b,c)} = {b}
        let mut a = BooleanMatrix::empty(unary(3));
        a.set(0, BoolValue::TRUE);
        let mut r = BooleanMatrix::empty(binary(3));
        r.set(1, BoolValue::TRUE);
        r.set(5, BoolValue::TRUE);

        let joined = a.join(&r, &factory).unwrap();
        assert_eq!(joined.dimensions().arity(), 1);
        assert_eq!(joined.dense_indices(), vec![1]);
    }

    #[test]
    fn product_and_transpose() {
        let factory = BooleanFactory::new(0, Options::default());
        let mut a = BooleanMatrix::empty(unary(2));
        a.set(0, BoolValue::TRUE);
        let mut b = BooleanMatrix::empty(unary(2));
        b.set(1, BoolValue::TRUE);

        let ab = a.product(&b, &factory).unwrap();
        assert_eq!(ab.dense_indices(), vec![1]);
        assert_eq!(ab.transpose().dense_indices(), vec![2]);
    }

    #[test]
    fn closure_reaches_fixpoint() {
        let factory = BooleanFactory::new(0, Options::default());
        // chain 0 -> 1 -> 2 -> 3
        let mut r = BooleanMatrix::empty(binary(4));
        r.set(1, BoolValue::TRUE);
        r.set(6, BoolValue::TRUE);
        r.set(11, BoolValue::TRUE);

        let closed = r.closure(&factory).unwrap();
        assert_eq!(closed.dense_indices(), vec![1, 2, 3, 6, 7, 11]);

        let reflexive = r.reflexive_closure(&factory).unwrap();
        assert_eq!(reflexive.density(), 10);
    }

    #[test]
    fn override_replaces_rows() {
        let factory = BooleanFactory::new(0, Options::default());
        let mut r = BooleanMatrix::empty(binary(2));
        r.set(0, BoolValue::TRUE); // (0,0)
        r.set(2, BoolValue::TRUE); // (1,0)
        let mut s = BooleanMatrix::empty(binary(2));
        s.set(1, BoolValue::TRUE); // (0,1)

        assert_eq!(r.override_with(&s, &factory).dense_indices(), vec![1, 2]);
    }

    #[test]
    fn multiplicities_over_variables() {
        let factory = BooleanFactory::new(2, Options::default());
        let mut m = BooleanMatrix::empty(unary(2));
        m.set(0, factory.variable(1));
        m.set(1, factory.variable(2));

        assert!(!m.some(&factory).is_constant());
        assert!(!m.one(&factory).is_constant());

        let empty = BooleanMatrix::empty(unary(2));
        assert_eq!(empty.some(&factory), BoolValue::FALSE);
        assert_eq!(empty.lone(&factory), BoolValue::TRUE);
        assert_eq!(empty.one(&factory), BoolValue::FALSE);
        assert_eq!(empty.subset(&m, &factory), BoolValue::TRUE);
    }
}
