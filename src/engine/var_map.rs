//! Primary variable to tuple mapping
//!
//! Every tuple in `upper \ lower` of a relation owns one primary variable.
//! Variables are numbered from 1, relation by relation in binding order, and
//! within a relation in ascending tuple-index order. The map is built once per
//! translation and answers lookups in both directions.

use rustc_hash::FxHashMap;
use std::ops::Range;

use crate::ast::Relation;
use crate::bool::VariableAllocator;
use crate::error::Result;
use crate::instance::{Bounds, Instance, Tuple, TupleSet, Universe};

#[derive(Debug, Clone)]
struct RelationVariables {
    relation: Relation,
    first: u32,
    tuples: Vec<usize>,
}

impl RelationVariables {
    fn range(&self) -> Range<u32> {
        self.first..self.first + self.tuples.len() as u32
    }
}

/// Bidirectional map between primary variables and (relation, tuple) pairs
#[derive(Debug, Clone)]
pub struct VariableTupleMap {
    universe: Universe,
    entries: Vec<RelationVariables>,
    by_relation: FxHashMap<Relation, usize>,
    num_primary: u32,
}

impl VariableTupleMap {
    /// Allocates primary variables for the unknown tuples of every bound relation
    pub fn build(bounds: &Bounds, allocator: &mut VariableAllocator) -> Self {
        let mut entries = Vec::new();
        let mut by_relation = FxHashMap::default();

        for relation in bounds.relations() {
            let (Some(lower), Some(upper)) = (bounds.lower_bound(relation), bounds.upper_bound(relation))
            else {
                continue;
            };
            let tuples: Vec<usize> = upper.indices().filter(|i| !lower.contains_index(*i)).collect();
            let range = allocator.allocate_for_relation(relation, tuples.len());
            by_relation.insert(relation.clone(), entries.len());
            entries.push(RelationVariables {
                relation: relation.clone(),
                first: range.start,
                tuples,
            });
        }

        Self {
            universe: bounds.universe().clone(),
            entries,
            by_relation,
            num_primary: allocator.total_variables(),
        }
    }

    /// Total number of primary variables
    pub fn num_primary_variables(&self) -> u32 {
        self.num_primary
    }

    /// The variables allocated to `relation`; empty if it has none
    pub fn primary_variables(&self, relation: &Relation) -> Range<u32> {
        self.by_relation
            .get(relation)
            .map_or(0..0, |&i| self.entries[i].range())
    }

    /// Indices of the unknown tuples of `relation`, in variable order
    pub fn unknown_tuples(&self, relation: &Relation) -> &[usize] {
        self.by_relation
            .get(relation)
            .map_or(&[][..], |&i| &self.entries[i].tuples)
    }

    /// Position of the entry owning `var`
    fn locate(&self, var: u32) -> Option<usize> {
        if var == 0 || var > self.num_primary {
            return None;
        }
        let pos = self.entries.partition_point(|e| e.first <= var).checked_sub(1)?;
        // empty ranges share their start with a neighbour; skip back over them
        (0..=pos).rev().find(|&i| self.entries[i].range().contains(&var))
    }

    /// The relation and tuple a primary variable stands for
    pub fn tuple_of(&self, var: u32) -> Option<(&Relation, Tuple)> {
        let entry = &self.entries[self.locate(var)?];
        let index = entry.tuples[(var - entry.first) as usize];
        let tuple = self
            .universe
            .factory()
            .tuple_from_index(entry.relation.arity(), index)
            .ok()?;
        Some((&entry.relation, tuple))
    }

    /// The primary variable for `tuple` in `relation`, if that tuple is unknown
    pub fn variable_of(&self, relation: &Relation, tuple: &Tuple) -> Option<u32> {
        let entry = &self.entries[*self.by_relation.get(relation)?];
        if tuple.arity() != relation.arity() {
            return None;
        }
        let offset = entry.tuples.binary_search(&tuple.index()).ok()?;
        Some(entry.first + offset as u32)
    }

    /// Builds an instance holding exactly the tuples of the given variables
    ///
    /// Every mapped relation is present, possibly empty. Variables outside
    /// the primary range are ignored.
    pub fn instance_of(&self, vars: impl IntoIterator<Item = u32>) -> Result<Instance> {
        let factory = self.universe.factory();
        let mut sets: Vec<TupleSet> = self
            .entries
            .iter()
            .map(|e| factory.none(e.relation.arity()))
            .collect();

        for var in vars {
            let Some(i) = self.locate(var) else {
                continue;
            };
            let entry = &self.entries[i];
            let tuple = factory.tuple_from_index(
                entry.relation.arity(),
                entry.tuples[(var - entry.first) as usize],
            )?;
            sets[i].add(tuple)?;
        }

        let mut instance = Instance::new(self.universe.clone());
        for (entry, set) in self.entries.iter().zip(sets) {
            instance.add(entry.relation.clone(), set)?;
        }
        Ok(instance)
    }

    /// Reads a model back as an instance: each relation gets its lower bound
    /// plus the unknown tuples whose variable `value_of` reports true
    pub fn interpret(&self, bounds: &Bounds, value_of: impl Fn(u32) -> bool) -> Result<Instance> {
        let factory = self.universe.factory();
        let mut instance = Instance::new(self.universe.clone());
        for entry in &self.entries {
            let mut set = bounds
                .lower_bound(&entry.relation)
                .cloned()
                .unwrap_or_else(|| factory.none(entry.relation.arity()));
            for (offset, &index) in entry.tuples.iter().enumerate() {
                if value_of(entry.first + offset as u32) {
                    set.add(factory.tuple_from_index(entry.relation.arity(), index)?)?;
                }
            }
            instance.add(entry.relation.clone(), set)?;
        }
        Ok(instance)
    }
}
