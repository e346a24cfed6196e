//! Handles identifying variables and constraints within an instance
//!
//! Indices are opaque keys handed out by an instance when a variable or constraint is added.
//! They are only meaningful for the instance that created them.
use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::functions::{Function, Set};

/// Identifies a variable within one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableIndex(u64);

impl VariableIndex {
    /// Create a variable index from its raw value
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw value of the index
    pub fn value(self) -> u64 {
        self.0
    }
}

impl Display for VariableIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "VariableIndex({})", self.0)
    }
}

/// Identifies a constraint with function type `F` and set type `S` within one instance
///
/// The (F, S) pair is part of the type, so an index for a `LessThan` constraint can never be
/// mistaken for an index of an `EqualTo` constraint.
pub struct ConstraintIndex<F, S> {
    value: u64,
    marker: PhantomData<fn() -> (F, S)>,
}

impl<F, S> ConstraintIndex<F, S> {
    /// Create a constraint index from its raw value
    pub fn new(value: u64) -> Self {
        Self {
            value,
            marker: PhantomData,
        }
    }

    /// Get the raw value of the index
    pub fn value(self) -> u64 {
        self.value
    }
}

impl<F: Function, S: Set> ConstraintIndex<F, S> {
    /// Erase the function and set types, keeping them as a runtime [`ConstraintType`]
    pub fn erase(self) -> AnyConstraintIndex {
        AnyConstraintIndex {
            constraint_type: ConstraintType::of::<F, S>(),
            value: self.value,
        }
    }
}

// region ConstraintIndex trait impls
// Written out by hand so that F and S don't need to implement these traits themselves.
impl<F, S> Clone for ConstraintIndex<F, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F, S> Copy for ConstraintIndex<F, S> {}

impl<F, S> PartialEq for ConstraintIndex<F, S> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<F, S> Eq for ConstraintIndex<F, S> {}

impl<F, S> PartialOrd for ConstraintIndex<F, S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<F, S> Ord for ConstraintIndex<F, S> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<F, S> Hash for ConstraintIndex<F, S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<F: Function, S: Set> Debug for ConstraintIndex<F, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConstraintIndex<{}, {}>({})", F::NAME, S::NAME, self.value)
    }
}
// endregion ConstraintIndex trait impls

/// Runtime identity of a function or set type
///
/// Equality and hashing only consider the underlying [`TypeId`], the name is used for messages.
#[derive(Debug, Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    /// Tag for a function type
    pub fn of_function<F: Function>() -> Self {
        Self {
            id: TypeId::of::<F>(),
            name: F::NAME,
        }
    }

    /// Tag for a set type
    pub fn of_set<S: Set>() -> Self {
        Self {
            id: TypeId::of::<S>(),
            name: S::NAME,
        }
    }

    /// Check whether this tag was created for `T`
    pub fn is<T: 'static>(self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Human readable name of the type
    pub fn name(self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Runtime identity of a (function, set) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstraintType {
    /// The function type of the constraint
    pub function: TypeTag,
    /// The set type of the constraint
    pub set: TypeTag,
}

impl ConstraintType {
    /// The constraint type of `F`-in-`S` constraints
    pub fn of<F: Function, S: Set>() -> Self {
        Self {
            function: TypeTag::of_function::<F>(),
            set: TypeTag::of_set::<S>(),
        }
    }

    /// Check whether this is the constraint type of `F`-in-`S` constraints
    pub fn is<F: Function, S: Set>(self) -> bool {
        self.function.is::<F>() && self.set.is::<S>()
    }
}

impl Display for ConstraintType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-in-{}", self.function, self.set)
    }
}

/// A constraint index with its function and set types erased
///
/// This is the slow path, used for name lookups where the constraint type isn't known
/// up front. Prefer [`ConstraintIndex`] everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnyConstraintIndex {
    constraint_type: ConstraintType,
    value: u64,
}

impl AnyConstraintIndex {
    /// Create an erased constraint index
    pub fn new(constraint_type: ConstraintType, value: u64) -> Self {
        Self {
            constraint_type,
            value,
        }
    }

    /// The (function, set) pair of the constraint
    pub fn constraint_type(self) -> ConstraintType {
        self.constraint_type
    }

    /// Raw value of the index
    pub fn value(self) -> u64 {
        self.value
    }

    /// Recover the typed index, returns None if the constraint is not an `F`-in-`S` constraint
    pub fn downcast<F: Function, S: Set>(self) -> Option<ConstraintIndex<F, S>> {
        if self.constraint_type.is::<F, S>() {
            Some(ConstraintIndex::new(self.value))
        } else {
            None
        }
    }
}

impl Display for AnyConstraintIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConstraintIndex<{}>({})", self.constraint_type, self.value)
    }
}

/// The type of an index, the runtime stand-in for `VariableIndex` or `ConstraintIndex<F, S>`
/// used when asking about every index of a type at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Variable indices
    Variable,
    /// Constraint indices of one (function, set) pair
    Constraint(ConstraintType),
}

impl Display for IndexKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexKind::Variable => write!(f, "VariableIndex"),
            IndexKind::Constraint(constraint_type) => {
                write!(f, "ConstraintIndex<{}>", constraint_type)
            }
        }
    }
}

/// Either kind of index, with constraint types erased
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnyIndex {
    /// A variable index
    Variable(VariableIndex),
    /// An erased constraint index
    Constraint(AnyConstraintIndex),
}

impl AnyIndex {
    /// The type of the index
    pub fn kind(self) -> IndexKind {
        match self {
            AnyIndex::Variable(_) => IndexKind::Variable,
            AnyIndex::Constraint(index) => IndexKind::Constraint(index.constraint_type()),
        }
    }
}

impl Display for AnyIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AnyIndex::Variable(index) => write!(f, "{}", index),
            AnyIndex::Constraint(index) => write!(f, "{}", index),
        }
    }
}

/// What a name lookup is looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameTarget {
    /// A variable
    Variable,
    /// A constraint of one (function, set) pair
    Constraint(ConstraintType),
    /// A constraint of any type
    AnyConstraint,
}

impl From<IndexKind> for NameTarget {
    fn from(kind: IndexKind) -> Self {
        match kind {
            IndexKind::Variable => NameTarget::Variable,
            IndexKind::Constraint(constraint_type) => NameTarget::Constraint(constraint_type),
        }
    }
}

impl Display for NameTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NameTarget::Variable => write!(f, "variable"),
            NameTarget::Constraint(constraint_type) => {
                write!(f, "{} constraint", constraint_type)
            }
            NameTarget::AnyConstraint => write!(f, "constraint"),
        }
    }
}

/// Implemented by the typed index handles, [`VariableIndex`] and [`ConstraintIndex`]
pub trait Index: Copy + Eq + Hash + Debug + 'static {
    /// The type of this index as a runtime value
    fn kind() -> IndexKind;

    /// Erase the index
    fn to_any(self) -> AnyIndex;

    /// Recover a typed index from an erased one, None when the types don't match
    fn from_any(index: AnyIndex) -> Option<Self>;
}

impl Index for VariableIndex {
    fn kind() -> IndexKind {
        IndexKind::Variable
    }

    fn to_any(self) -> AnyIndex {
        AnyIndex::Variable(self)
    }

    fn from_any(index: AnyIndex) -> Option<Self> {
        match index {
            AnyIndex::Variable(index) => Some(index),
            AnyIndex::Constraint(_) => None,
        }
    }
}

impl<F: Function, S: Set> Index for ConstraintIndex<F, S> {
    fn kind() -> IndexKind {
        IndexKind::Constraint(ConstraintType::of::<F, S>())
    }

    fn to_any(self) -> AnyIndex {
        AnyIndex::Constraint(self.erase())
    }

    fn from_any(index: AnyIndex) -> Option<Self> {
        match index {
            AnyIndex::Constraint(index) => index.downcast::<F, S>(),
            AnyIndex::Variable(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{EqualTo, LessThan, ScalarAffineFunction, SingleVariable};

    type AffineLessThan = ConstraintIndex<ScalarAffineFunction<f64>, LessThan<f64>>;
    type AffineEqualTo = ConstraintIndex<ScalarAffineFunction<f64>, EqualTo<f64>>;

    #[test]
    fn variable_index_value() {
        let index = VariableIndex::new(7);
        assert_eq!(index.value(), 7);
        assert_eq!(format!("{}", index), "VariableIndex(7)");
    }

    #[test]
    fn constraint_index_erase_and_downcast() {
        let index = AffineLessThan::new(3);
        let erased = index.erase();
        assert_eq!(erased.value(), 3);
        assert!(erased.constraint_type().is::<ScalarAffineFunction<f64>, LessThan<f64>>());
        assert_eq!(
            erased.downcast::<ScalarAffineFunction<f64>, LessThan<f64>>(),
            Some(index)
        );
        // Same function, different set
        assert!(erased
            .downcast::<ScalarAffineFunction<f64>, EqualTo<f64>>()
            .is_none());
    }

    #[test]
    fn constraint_types_compare_by_type() {
        assert_eq!(
            ConstraintType::of::<SingleVariable, LessThan<f64>>(),
            ConstraintType::of::<SingleVariable, LessThan<f64>>()
        );
        assert_ne!(
            ConstraintType::of::<SingleVariable, LessThan<f64>>(),
            ConstraintType::of::<SingleVariable, LessThan<i64>>()
        );
        assert_eq!(
            format!("{}", ConstraintType::of::<SingleVariable, EqualTo<f64>>()),
            "SingleVariable-in-EqualTo"
        );
    }

    #[test]
    fn index_trait_round_trip_rejects_wrong_kind() {
        let any = AffineEqualTo::new(1).to_any();
        assert_eq!(
            any.kind(),
            IndexKind::Constraint(ConstraintType::of::<ScalarAffineFunction<f64>, EqualTo<f64>>())
        );
        assert!(AffineLessThan::from_any(any).is_none());
        assert!(VariableIndex::from_any(any).is_none());
        assert_eq!(AffineEqualTo::from_any(any), Some(AffineEqualTo::new(1)));
    }

    #[test]
    fn name_target_from_kind() {
        assert_eq!(NameTarget::from(IndexKind::Variable), NameTarget::Variable);
        let constraint_type = ConstraintType::of::<SingleVariable, LessThan<f64>>();
        assert_eq!(
            NameTarget::from(IndexKind::Constraint(constraint_type)),
            NameTarget::Constraint(constraint_type)
        );
    }
}
