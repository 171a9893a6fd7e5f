//! Instance types: Universe, Tuple, TupleSet, TupleFactory, Bounds, and Instance
//!
//! These types define the domain of discourse and bindings for relations.
//! Tuples are identified by their index in the row-major enumeration of the
//! `arity`-dimensional space over the universe; tuple sets iterate in index order.

use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::ast::Relation;
use crate::error::{KodkodError, Result};

/// An ordered set of unique atoms
///
/// A universe provides the domain for all tuples and relations in a problem.
/// Atoms are stored in a specific order which is used for indexing.
#[derive(Clone)]
pub struct Universe {
    inner: Arc<UniverseInner>,
}

struct UniverseInner {
    atoms: Vec<String>,
    indices: FxHashMap<String, usize>,
}

impl Universe {
    /// Creates a new universe from a slice of atom names
    ///
    /// # Errors
    /// Returns an error if the slice is empty or contains duplicates
    pub fn new(atoms: &[&str]) -> Result<Self> {
        if atoms.is_empty() {
            return Err(KodkodError::InvalidArgument(
                "Cannot create an empty universe".to_string(),
            ));
        }

        let mut atom_vec = Vec::with_capacity(atoms.len());
        let mut indices = FxHashMap::default();

        for (i, &atom) in atoms.iter().enumerate() {
            let atom_string = atom.to_string();
            if indices.contains_key(&atom_string) {
                return Err(KodkodError::InvalidArgument(format!(
                    "{} appears multiple times",
                    atom
                )));
            }
            indices.insert(atom_string.clone(), i);
            atom_vec.push(atom_string);
        }

        Ok(Self {
            inner: Arc::new(UniverseInner {
                atoms: atom_vec,
                indices,
            }),
        })
    }

    /// Returns the number of atoms in this universe
    pub fn size(&self) -> usize {
        self.inner.atoms.len()
    }

    /// Returns the atom at the given index
    pub fn atom(&self, index: usize) -> Option<&str> {
        self.inner.atoms.get(index).map(|s| s.as_str())
    }

    /// Returns the index of the given atom
    pub fn index_of(&self, atom: &str) -> Option<usize> {
        self.inner.indices.get(atom).copied()
    }

    /// Returns true if this universe contains the given atom
    pub fn contains(&self, atom: &str) -> bool {
        self.inner.indices.contains_key(atom)
    }

    /// Returns a factory for creating tuples from this universe
    pub fn factory(&self) -> TupleFactory {
        TupleFactory {
            universe: self.clone(),
        }
    }

    /// Number of distinct tuples of the given arity, if it fits in a usize
    pub fn capacity(&self, arity: usize) -> Option<usize> {
        u32::try_from(arity)
            .ok()
            .and_then(|a| self.size().checked_pow(a))
    }
}

impl PartialEq for Universe {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Universe {}

impl fmt::Debug for Universe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Universe({:?})", self.inner.atoms)
    }
}

/// A tuple of atoms from a universe
#[derive(Clone, Debug)]
pub struct Tuple {
    universe: Universe,
    atom_indices: Vec<usize>,
    index: usize,
}

impl Tuple {
    /// Returns the universe this tuple belongs to
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Returns the arity (number of atoms) in this tuple
    pub fn arity(&self) -> usize {
        self.atom_indices.len()
    }

    /// Returns the index of this tuple in n-dimensional space
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the atom at the given position
    pub fn atom(&self, i: usize) -> Option<&str> {
        self.atom_indices
            .get(i)
            .and_then(|&idx| self.universe.atom(idx))
    }

    /// Returns an iterator over the atoms in this tuple
    pub fn atoms(&self) -> impl Iterator<Item = &str> + '_ {
        (0..self.arity()).filter_map(move |i| self.atom(i))
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.universe == other.universe
            && self.arity() == other.arity()
            && self.index == other.index
    }
}

impl Eq for Tuple {}

impl Hash for Tuple {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.arity().hash(state);
        self.index.hash(state);
        Arc::as_ptr(&self.universe.inner).hash(state);
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, atom) in self.atoms().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", atom)?;
        }
        write!(f, "]")
    }
}

/// A set of tuples all of the same arity from the same universe
///
/// Tuples are kept ordered by index.
#[derive(Clone, Debug)]
pub struct TupleSet {
    universe: Universe,
    arity: usize,
    tuples: BTreeMap<usize, Tuple>,
}

impl TupleSet {
    /// Creates an empty tuple set with the given arity
    pub fn empty(universe: Universe, arity: usize) -> Self {
        Self {
            universe,
            arity,
            tuples: BTreeMap::new(),
        }
    }

    /// Returns the universe this tuple set belongs to
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Returns the arity of tuples in this set
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Returns the number of tuples in this set
    pub fn size(&self) -> usize {
        self.tuples.len()
    }

    /// Returns true if this set is empty
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    fn check_compatible(&self, universe: &Universe, arity: usize) -> Result<()> {
        if universe != &self.universe {
            return Err(KodkodError::InvalidArgument(
                "Tuple from different universe".to_string(),
            ));
        }
        if arity != self.arity {
            return Err(KodkodError::InvalidArgument(format!(
                "Expected arity {}, got {}",
                self.arity, arity
            )));
        }
        Ok(())
    }

    /// Adds a tuple to this set
    pub fn add(&mut self, tuple: Tuple) -> Result<()> {
        self.check_compatible(tuple.universe(), tuple.arity())?;
        self.tuples.entry(tuple.index).or_insert(tuple);
        Ok(())
    }

    /// Returns true if this set contains the given tuple
    pub fn contains(&self, tuple: &Tuple) -> bool {
        tuple.universe() == &self.universe
            && tuple.arity() == self.arity
            && self.tuples.contains_key(&tuple.index)
    }

    /// Returns true if this set contains the tuple with the given index
    pub fn contains_index(&self, index: usize) -> bool {
        self.tuples.contains_key(&index)
    }

    /// Returns an iterator over the tuples in this set, in index order
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.values()
    }

    /// Returns an iterator over the tuple indices in ascending order
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.tuples.keys().copied()
    }

    /// Adds all tuples from another set to this set
    pub fn add_all(&mut self, other: &TupleSet) -> Result<()> {
        self.check_compatible(other.universe(), other.arity())?;
        for (index, tuple) in &other.tuples {
            self.tuples.entry(*index).or_insert_with(|| tuple.clone());
        }
        Ok(())
    }

    /// Removes a tuple from this set
    pub fn remove(&mut self, tuple: &Tuple) -> bool {
        self.contains(tuple) && self.tuples.remove(&tuple.index).is_some()
    }

    /// Returns true if every tuple of this set is in `other`
    pub fn is_subset(&self, other: &TupleSet) -> bool {
        self.universe == other.universe
            && self.arity == other.arity
            && self.tuples.keys().all(|i| other.tuples.contains_key(i))
    }

    /// Returns a new tuple set containing tuples in this set but not in other
    pub fn difference(&self, other: &TupleSet) -> Result<TupleSet> {
        self.check_compatible(other.universe(), other.arity())?;
        let tuples = self
            .tuples
            .iter()
            .filter(|(i, _)| !other.tuples.contains_key(i))
            .map(|(i, t)| (*i, t.clone()))
            .collect();
        Ok(TupleSet {
            universe: self.universe.clone(),
            arity: self.arity,
            tuples,
        })
    }

    /// Returns the Cartesian product of this set with another
    pub fn product(&self, other: &TupleSet) -> Result<TupleSet> {
        if other.universe() != &self.universe {
            return Err(KodkodError::InvalidArgument(
                "Tuple sets from different universes".to_string(),
            ));
        }

        let factory = self.universe.factory();
        let new_arity = self.arity + other.arity;
        let right_capacity = self.universe.capacity(other.arity).ok_or_else(|| {
            KodkodError::CapacityExceeded(format!("arity {} over {} atoms", new_arity, self.universe.size()))
        })?;
        let mut result = TupleSet::empty(self.universe.clone(), new_arity);

        for t1 in self.tuples.values() {
            for t2 in other.tuples.values() {
                let tuple = factory.tuple_from_index(new_arity, t1.index * right_capacity + t2.index)?;
                result.tuples.insert(tuple.index, tuple);
            }
        }

        Ok(result)
    }
}

impl PartialEq for TupleSet {
    fn eq(&self, other: &Self) -> bool {
        self.universe == other.universe
            && self.arity == other.arity
            && self.tuples.len() == other.tuples.len()
            && self.tuples.keys().eq(other.tuples.keys())
    }
}

impl Eq for TupleSet {}

impl fmt::Display for TupleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, tuple) in self.tuples.values().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", tuple)?;
        }
        write!(f, "}}")
    }
}

/// Factory for creating tuples and tuple sets
pub struct TupleFactory {
    universe: Universe,
}

impl TupleFactory {
    /// Returns the universe this factory belongs to
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Creates a tuple from the given atoms
    pub fn tuple(&self, atoms: &[&str]) -> Result<Tuple> {
        if atoms.is_empty() {
            return Err(KodkodError::InvalidArgument(
                "Cannot create empty tuple".to_string(),
            ));
        }

        let mut atom_indices = Vec::with_capacity(atoms.len());
        for &atom in atoms {
            let idx = self.universe.index_of(atom).ok_or_else(|| {
                KodkodError::InvalidArgument(format!("Atom {} not in universe", atom))
            })?;
            atom_indices.push(idx);
        }

        // row-major: the first atom is most significant
        let base = self.universe.size();
        let index = atom_indices.iter().fold(0, |acc, &a| acc * base + a);

        Ok(Tuple {
            universe: self.universe.clone(),
            atom_indices,
            index,
        })
    }

    /// Creates a tuple set from an array of atom sequences
    pub fn tuple_set(&self, tuples: &[&[&str]]) -> Result<TupleSet> {
        if tuples.is_empty() {
            return Err(KodkodError::InvalidArgument(
                "Cannot create tuple set from empty array".to_string(),
            ));
        }

        let arity = tuples[0].len();
        let mut set = TupleSet::empty(self.universe.clone(), arity);

        for &atoms in tuples {
            if atoms.len() != arity {
                return Err(KodkodError::InvalidArgument(
                    "All tuples must have the same arity".to_string(),
                ));
            }
            set.add(self.tuple(atoms)?)?;
        }

        Ok(set)
    }

    /// Creates an empty tuple set with the given arity
    pub fn none(&self, arity: usize) -> TupleSet {
        TupleSet::empty(self.universe.clone(), arity)
    }

    /// Creates a tuple set containing all tuples of the given arity
    pub fn all(&self, arity: usize) -> TupleSet {
        let mut set = TupleSet::empty(self.universe.clone(), arity);
        let total = self.universe.capacity(arity).unwrap_or(0);

        for i in 0..total {
            if let Ok(tuple) = self.tuple_from_index(arity, i) {
                set.tuples.insert(i, tuple);
            }
        }

        set
    }

    /// Creates a singleton tuple set containing a single atom
    pub fn set_of(&self, atom: &str) -> Result<TupleSet> {
        let mut set = TupleSet::empty(self.universe.clone(), 1);
        set.add(self.tuple(&[atom])?)?;
        Ok(set)
    }

    /// Creates a tuple from an index in n-dimensional space
    pub fn tuple_from_index(&self, arity: usize, index: usize) -> Result<Tuple> {
        let base = self.universe.size();
        let max_index = self.universe.capacity(arity).ok_or_else(|| {
            KodkodError::CapacityExceeded(format!("arity {} over {} atoms", arity, base))
        })?;

        if index >= max_index {
            return Err(KodkodError::InvalidArgument(format!(
                "Index {} out of range for arity {}",
                index, arity
            )));
        }

        let mut atom_indices = vec![0; arity];
        let mut remaining = index;
        for slot in atom_indices.iter_mut().rev() {
            *slot = remaining % base;
            remaining /= base;
        }

        Ok(Tuple {
            universe: self.universe.clone(),
            atom_indices,
            index,
        })
    }

    /// Creates a TupleSet from a set of tuple indices
    pub fn tuple_set_from_indices(
        &self,
        arity: usize,
        indices: impl IntoIterator<Item = usize>,
    ) -> Result<TupleSet> {
        let mut set = TupleSet::empty(self.universe.clone(), arity);
        for index in indices {
            let tuple = self.tuple_from_index(arity, index)?;
            set.tuples.insert(index, tuple);
        }
        Ok(set)
    }
}

/// Bounds map relations to lower and upper bounds on their contents
///
/// The lower bound specifies tuples that must be in the relation,
/// while the upper bound specifies tuples that may be in the relation.
/// Relations are kept in the order they were first bound; variable
/// numbering during translation follows that order. Integers, when
/// present, are always bound exactly to a singleton unary tuple set.
#[derive(Clone)]
pub struct Bounds {
    universe: Universe,
    relations: Vec<Relation>,
    lower_bounds: FxHashMap<Relation, TupleSet>,
    upper_bounds: FxHashMap<Relation, TupleSet>,
    int_bounds: BTreeMap<i32, TupleSet>,
}

impl Bounds {
    /// Creates new bounds over the given universe
    pub fn new(universe: Universe) -> Self {
        Self {
            universe,
            relations: Vec::new(),
            lower_bounds: FxHashMap::default(),
            upper_bounds: FxHashMap::default(),
            int_bounds: BTreeMap::new(),
        }
    }

    /// Returns the universe
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Returns the tuple factory for this bounds
    pub fn factory(&self) -> TupleFactory {
        self.universe.factory()
    }

    /// Sets both lower and upper bounds for a relation
    ///
    /// # Errors
    /// Fails if either set belongs to another universe, has the wrong arity,
    /// or if `lower` is not contained in `upper`.
    pub fn bound(&mut self, relation: &Relation, lower: TupleSet, upper: TupleSet) -> Result<()> {
        if lower.universe() != &self.universe || upper.universe() != &self.universe {
            return Err(KodkodError::InvalidArgument(
                "Tuple sets must be from the same universe".to_string(),
            ));
        }

        if lower.arity() != relation.arity() || upper.arity() != relation.arity() {
            return Err(KodkodError::InvalidArgument(format!(
                "Tuple set arity {} does not match relation arity {}",
                lower.arity(),
                relation.arity()
            )));
        }

        if !lower.is_subset(&upper) {
            return Err(KodkodError::InvalidArgument(format!(
                "lower bound of {} is not a subset of its upper bound",
                relation
            )));
        }

        if !self.upper_bounds.contains_key(relation) {
            self.relations.push(relation.clone());
        }
        self.lower_bounds.insert(relation.clone(), lower);
        self.upper_bounds.insert(relation.clone(), upper);
        Ok(())
    }

    /// Sets exact bound for a relation (lower == upper)
    pub fn bound_exactly(&mut self, relation: &Relation, tuples: TupleSet) -> Result<()> {
        let upper = tuples.clone();
        self.bound(relation, tuples, upper)
    }

    /// Sets the upper bound of a relation with an empty lower bound
    pub fn bound_upper(&mut self, relation: &Relation, upper: TupleSet) -> Result<()> {
        let lower = TupleSet::empty(self.universe.clone(), relation.arity());
        self.bound(relation, lower, upper)
    }

    /// Returns the lower bound for a relation
    pub fn lower_bound(&self, relation: &Relation) -> Option<&TupleSet> {
        self.lower_bounds.get(relation)
    }

    /// Returns the upper bound for a relation
    pub fn upper_bound(&self, relation: &Relation) -> Option<&TupleSet> {
        self.upper_bounds.get(relation)
    }

    /// Returns true if the relation has bounds
    pub fn contains(&self, relation: &Relation) -> bool {
        self.upper_bounds.contains_key(relation)
    }

    /// Returns all relations with bounds, in binding order
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter()
    }

    /// Binds an integer exactly to a singleton unary tuple set
    pub fn bound_int_exactly(&mut self, i: i32, tuples: TupleSet) -> Result<()> {
        if tuples.universe() != &self.universe {
            return Err(KodkodError::InvalidArgument(
                "Tuple sets must be from the same universe".to_string(),
            ));
        }
        if tuples.arity() != 1 || tuples.size() != 1 {
            return Err(KodkodError::InvalidArgument(format!(
                "integer {} must be bound to a single unary tuple, got {}",
                i, tuples
            )));
        }
        self.int_bounds.insert(i, tuples);
        Ok(())
    }

    /// Returns the exact bound for an integer
    pub fn exact_int_bound(&self, i: i32) -> Option<&TupleSet> {
        self.int_bounds.get(&i)
    }

    /// Returns an iterator over all integers with bounds, in ascending order
    pub fn int_keys(&self) -> impl Iterator<Item = i32> + '_ {
        self.int_bounds.keys().copied()
    }
}

impl fmt::Debug for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for r in &self.relations {
            map.entry(
                &r.name(),
                &format_args!(
                    "[{}, {}]",
                    self.lower_bounds[r],
                    self.upper_bounds[r]
                ),
            );
        }
        map.finish()
    }
}

/// An instance maps relations to tuple sets (a solution)
#[derive(Clone)]
pub struct Instance {
    universe: Universe,
    relations: Vec<Relation>,
    tuples: FxHashMap<Relation, TupleSet>,
    ints: BTreeMap<i32, TupleSet>,
}

impl Instance {
    /// Creates a new empty instance
    pub fn new(universe: Universe) -> Self {
        Self {
            universe,
            relations: Vec::new(),
            tuples: FxHashMap::default(),
            ints: BTreeMap::new(),
        }
    }

    /// Returns the universe
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Adds a relation binding, replacing any previous one
    pub fn add(&mut self, relation: Relation, tuples: TupleSet) -> Result<()> {
        if tuples.universe() != &self.universe {
            return Err(KodkodError::InvalidArgument(
                "Tuple set from different universe".to_string(),
            ));
        }

        if tuples.arity() != relation.arity() {
            return Err(KodkodError::InvalidArgument(format!(
                "Tuple set arity {} does not match relation arity {}",
                tuples.arity(),
                relation.arity()
            )));
        }

        if !self.tuples.contains_key(&relation) {
            self.relations.push(relation.clone());
        }
        self.tuples.insert(relation, tuples);
        Ok(())
    }

    /// Binds an integer to its atom
    pub fn add_int(&mut self, i: i32, tuples: TupleSet) -> Result<()> {
        if tuples.universe() != &self.universe || tuples.arity() != 1 || tuples.size() != 1 {
            return Err(KodkodError::InvalidArgument(format!(
                "integer {} must map to a single unary tuple",
                i
            )));
        }
        self.ints.insert(i, tuples);
        Ok(())
    }

    /// Returns the tuples for a relation
    pub fn tuples(&self, relation: &Relation) -> Option<&TupleSet> {
        self.tuples.get(relation)
    }

    /// Gets the tuple set for a relation (alias for tuples)
    pub fn get(&self, relation: &Relation) -> Option<&TupleSet> {
        self.tuples.get(relation)
    }

    /// Returns true if the relation is bound in this instance
    pub fn contains(&self, relation: &Relation) -> bool {
        self.tuples.contains_key(relation)
    }

    /// Returns all relations in this instance, in insertion order
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter()
    }

    /// Returns relation/value pairs in insertion order
    pub fn relation_tuples(&self) -> impl Iterator<Item = (&Relation, &TupleSet)> {
        self.relations.iter().map(move |r| (r, &self.tuples[r]))
    }

    /// Returns the tuple set an integer maps to
    pub fn int_tuples(&self, i: i32) -> Option<&TupleSet> {
        self.ints.get(&i)
    }

    /// Returns the bound integers in ascending order
    pub fn ints(&self) -> impl Iterator<Item = i32> + '_ {
        self.ints.keys().copied()
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.universe == other.universe
            && self.tuples.len() == other.tuples.len()
            && self
                .tuples
                .iter()
                .all(|(r, ts)| other.tuples.get(r) == Some(ts))
            && self.ints == other.ints
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "relations: {{")?;
        for (i, (r, ts)) in self.relation_tuples().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", r, ts)?;
        }
        write!(f, "}}")?;
        if !self.ints.is_empty() {
            write!(f, " ints: {{")?;
            for (i, (n, ts)) in self.ints.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}={}", n, ts)?;
            }
            write!(f, "}}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({})", self)
    }
}
