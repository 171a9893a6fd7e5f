//! Primary variable allocation
//!
//! Hands out contiguous label ranges to relations before translation begins.

use crate::ast::Relation;
use rustc_hash::FxHashMap;
use std::ops::Range;

/// Allocates primary variables for the unknown tuples of each relation
///
/// Labels start at 1 and are contiguous across relations in allocation order.
#[derive(Debug)]
pub struct VariableAllocator {
    next_var: u32,
    relation_vars: FxHashMap<Relation, Range<u32>>,
}

impl VariableAllocator {
    /// Creates a new variable allocator
    pub fn new() -> Self {
        Self {
            next_var: 1,
            relation_vars: FxHashMap::default(),
        }
    }

    /// Reserves `unknown` consecutive labels for `relation`
    ///
    /// A relation with no unknown tuples gets an empty range positioned at
    /// the next free label.
    pub fn allocate_for_relation(&mut self, relation: &Relation, unknown: usize) -> Range<u32> {
        let start = self.next_var;
        let end = start + unknown as u32;
        self.relation_vars.insert(relation.clone(), start..end);
        self.next_var = end;
        start..end
    }

    /// Returns the total number of variables allocated
    pub fn total_variables(&self) -> u32 {
        self.next_var - 1
    }

    /// Gets the variable range for a relation
    pub fn get_range(&self, relation: &Relation) -> Option<Range<u32>> {
        self.relation_vars.get(relation).cloned()
    }
}

impl Default for VariableAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_contiguous() {
        let mut allocator = VariableAllocator::new();

        let r1 = Relation::unary("R1");
        let r2 = Relation::binary("R2");
        let r3 = Relation::unary("R3");

        assert_eq!(allocator.allocate_for_relation(&r1, 3), 1..4);
        assert_eq!(allocator.allocate_for_relation(&r2, 5), 4..9);
        // fully determined
        assert_eq!(allocator.allocate_for_relation(&r3, 0), 9..9);
        assert_eq!(allocator.total_variables(), 8);

        assert_eq!(allocator.get_range(&r2), Some(4..9));
        assert!(allocator.get_range(&r3).unwrap().is_empty());
    }

    #[test]
    fn empty_allocator() {
        let allocator = VariableAllocator::new();
        assert_eq!(allocator.total_variables(), 0);
        assert_eq!(allocator.get_range(&Relation::unary("R")), None);
    }
}
