//! Request objects handed to an [`Instance`](crate::instance::Instance)
//!
//! A read request carries the erased attribute (and index) together with a typed slot owned by
//! the caller. The instance finds out which attribute it was asked for with `downcast` and
//! answers through one of the `reply` methods, which check that the value has the type the
//! caller expects. Write requests work the same way in reverse, the instance `take`s the value
//! out once it has recognized the attribute.
use std::any::Any;

use crate::attributes::{
    AnyAttribute, Attribute, ConstraintAttribute, InstanceLevel, UniformConstraintAttribute,
    VariableAttribute,
};
use crate::error::ProtocolError;
use crate::functions::{Function, ScalarQuadraticFunction, Set};
use crate::index::{AnyConstraintIndex, AnyIndex, ConstraintIndex, IndexKind, TypeTag, VariableIndex};

fn type_mismatch(attribute: &dyn AnyAttribute) -> ProtocolError {
    ProtocolError::ValueTypeMismatch {
        attribute: format!("{:?}", attribute),
    }
}

fn put<V: 'static>(
    attribute: &dyn AnyAttribute,
    slot: &mut dyn Any,
    value: V,
) -> Result<(), ProtocolError> {
    match slot.downcast_mut::<Option<V>>() {
        Some(slot) => {
            *slot = Some(value);
            Ok(())
        }
        None => Err(type_mismatch(attribute)),
    }
}

fn put_all<V: 'static>(
    attribute: &dyn AnyAttribute,
    expected: usize,
    slot: &mut dyn Any,
    values: Vec<V>,
) -> Result<(), ProtocolError> {
    if values.len() != expected {
        return Err(ProtocolError::LengthMismatch {
            expected,
            actual: values.len(),
        });
    }
    put(attribute, slot, values)
}

fn take_value<V: 'static>(slot: &mut dyn Any) -> Option<V> {
    slot.downcast_mut::<Option<V>>()?.take()
}

// region Reads
/// Request for the value of a parameter or instance attribute
pub struct Query<'a> {
    attribute: &'a dyn AnyAttribute,
    slot: &'a mut dyn Any,
}

impl<'a> Query<'a> {
    pub(crate) fn new(attribute: &'a dyn AnyAttribute, slot: &'a mut dyn Any) -> Self {
        Self { attribute, slot }
    }

    /// The attribute being requested
    pub fn attribute(&self) -> &'a dyn AnyAttribute {
        self.attribute
    }

    /// The attribute, if it is an `A`
    pub fn downcast<A: Attribute>(&self) -> Option<&'a A> {
        self.attribute.downcast_ref::<A>()
    }

    /// Answer with the value of an `A`
    pub fn reply<A: InstanceLevel>(&mut self, value: A::Value) -> Result<(), ProtocolError> {
        put(self.attribute, self.slot, value)
    }

    /// Answer an attribute parametrized by a constraint type from erased constraint indices
    ///
    /// The indices may be of any constraint type, the attribute keeps the ones it is about.
    /// Returns false if the attribute can't be answered from indices.
    pub fn reply_with_indices(
        &mut self,
        indices: &[AnyConstraintIndex],
    ) -> Result<bool, ProtocolError> {
        Ok(self.attribute.fill_from_indices(indices, self.slot))
    }

    /// Answer an objective function attribute from a function stored in canonical form
    ///
    /// Returns false if the attribute isn't an objective function attribute, and
    /// [`ProtocolError::ConversionImpossible`] if it asks for a type the function can't be
    /// represented as.
    pub fn reply_with_objective(
        &mut self,
        source: TypeTag,
        function: &ScalarQuadraticFunction<f64>,
    ) -> Result<bool, ProtocolError> {
        match self.attribute.fill_from_objective(source, function, self.slot) {
            Some(res) => res.map(|_| true),
            None => Ok(false),
        }
    }

    /// The default failure for this request
    pub fn unsupported(&self, instance: &str) -> ProtocolError {
        ProtocolError::unsupported(self.attribute, instance)
    }
}

/// Request for the value of a variable or constraint attribute at one index
pub struct IndexedQuery<'a> {
    attribute: &'a dyn AnyAttribute,
    index: AnyIndex,
    slot: &'a mut dyn Any,
}

impl<'a> IndexedQuery<'a> {
    pub(crate) fn new(
        attribute: &'a dyn AnyAttribute,
        index: AnyIndex,
        slot: &'a mut dyn Any,
    ) -> Self {
        Self {
            attribute,
            index,
            slot,
        }
    }

    pub fn attribute(&self) -> &'a dyn AnyAttribute {
        self.attribute
    }

    pub fn downcast<A: Attribute>(&self) -> Option<&'a A> {
        self.attribute.downcast_ref::<A>()
    }

    pub fn index(&self) -> AnyIndex {
        self.index
    }

    /// The index, if it is a variable index
    pub fn variable(&self) -> Option<VariableIndex> {
        match self.index {
            AnyIndex::Variable(index) => Some(index),
            AnyIndex::Constraint(_) => None,
        }
    }

    /// The index, if it is the index of an `F`-in-`S` constraint
    pub fn constraint<F: Function, S: Set>(&self) -> Option<ConstraintIndex<F, S>> {
        self.constraint_any()?.downcast::<F, S>()
    }

    /// The index, if it is a constraint index of any type
    pub fn constraint_any(&self) -> Option<AnyConstraintIndex> {
        match self.index {
            AnyIndex::Constraint(index) => Some(index),
            AnyIndex::Variable(_) => None,
        }
    }

    pub fn reply_variable<A: VariableAttribute>(
        &mut self,
        value: A::Value,
    ) -> Result<(), ProtocolError> {
        put(self.attribute, self.slot, value)
    }

    pub fn reply_constraint<A: ConstraintAttribute, F: Function, S: Set>(
        &mut self,
        value: A::Value<F, S>,
    ) -> Result<(), ProtocolError> {
        put(self.attribute, self.slot, value)
    }

    /// Answer a constraint attribute whose value type doesn't depend on the constraint type
    pub fn reply_uniform<A: UniformConstraintAttribute>(
        &mut self,
        value: A::Uniform,
    ) -> Result<(), ProtocolError> {
        put(self.attribute, self.slot, value)
    }

    pub fn unsupported(&self, instance: &str) -> ProtocolError {
        ProtocolError::unsupported(self.attribute, instance)
    }

    /// Failure for an index the instance doesn't know
    pub fn not_found(&self, instance: &str) -> ProtocolError {
        ProtocolError::IndexNotFound {
            index: self.index,
            instance: instance.to_string(),
        }
    }
}

/// Request for the values of a variable or constraint attribute at several indices
///
/// Replies must be positionally aligned with [`BulkQuery::indices`]. An instance that leaves
/// a bulk request unanswered gets one [`IndexedQuery`] per index instead.
pub struct BulkQuery<'a> {
    attribute: &'a dyn AnyAttribute,
    kind: IndexKind,
    indices: &'a [AnyIndex],
    slot: &'a mut dyn Any,
}

impl<'a> BulkQuery<'a> {
    pub(crate) fn new(
        attribute: &'a dyn AnyAttribute,
        kind: IndexKind,
        indices: &'a [AnyIndex],
        slot: &'a mut dyn Any,
    ) -> Self {
        Self {
            attribute,
            kind,
            indices,
            slot,
        }
    }

    pub fn attribute(&self) -> &'a dyn AnyAttribute {
        self.attribute
    }

    pub fn downcast<A: Attribute>(&self) -> Option<&'a A> {
        self.attribute.downcast_ref::<A>()
    }

    /// Type shared by every index of the request
    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn indices(&self) -> &'a [AnyIndex] {
        self.indices
    }

    pub fn reply_variables<A: VariableAttribute>(
        &mut self,
        values: Vec<A::Value>,
    ) -> Result<(), ProtocolError> {
        put_all(self.attribute, self.indices.len(), self.slot, values)
    }

    pub fn reply_constraints<A: ConstraintAttribute, F: Function, S: Set>(
        &mut self,
        values: Vec<A::Value<F, S>>,
    ) -> Result<(), ProtocolError> {
        put_all(self.attribute, self.indices.len(), self.slot, values)
    }

    pub fn reply_uniform<A: UniformConstraintAttribute>(
        &mut self,
        values: Vec<A::Uniform>,
    ) -> Result<(), ProtocolError> {
        put_all(self.attribute, self.indices.len(), self.slot, values)
    }

    pub fn unsupported(&self, instance: &str) -> ProtocolError {
        ProtocolError::unsupported(self.attribute, instance)
    }
}
// endregion Reads

// region Writes
/// Request to assign a parameter or instance attribute
pub struct Assignment<'a> {
    attribute: &'a dyn AnyAttribute,
    value: &'a mut dyn Any,
}

impl<'a> Assignment<'a> {
    pub(crate) fn new(attribute: &'a dyn AnyAttribute, value: &'a mut dyn Any) -> Self {
        Self { attribute, value }
    }

    pub fn attribute(&self) -> &'a dyn AnyAttribute {
        self.attribute
    }

    pub fn downcast<A: Attribute>(&self) -> Option<&'a A> {
        self.attribute.downcast_ref::<A>()
    }

    /// Take the value out if the attribute is an `A`
    ///
    /// The value is left in place when the attribute is something else.
    pub fn take<A: InstanceLevel>(&mut self) -> Option<(&'a A, A::Value)> {
        let attribute = self.attribute.downcast_ref::<A>()?;
        take_value::<A::Value>(self.value).map(|value| (attribute, value))
    }

    /// Take an objective function value out in canonical quadratic form, with its original type
    pub fn take_objective(&mut self) -> Option<(TypeTag, ScalarQuadraticFunction<f64>)> {
        self.attribute.drain_objective(self.value)
    }

    pub fn unsupported(&self, instance: &str) -> ProtocolError {
        ProtocolError::unsupported(self.attribute, instance)
    }
}

/// Request to assign a variable or constraint attribute at one index
pub struct IndexedAssignment<'a> {
    attribute: &'a dyn AnyAttribute,
    index: AnyIndex,
    value: &'a mut dyn Any,
}

impl<'a> IndexedAssignment<'a> {
    pub(crate) fn new(
        attribute: &'a dyn AnyAttribute,
        index: AnyIndex,
        value: &'a mut dyn Any,
    ) -> Self {
        Self {
            attribute,
            index,
            value,
        }
    }

    pub fn attribute(&self) -> &'a dyn AnyAttribute {
        self.attribute
    }

    pub fn downcast<A: Attribute>(&self) -> Option<&'a A> {
        self.attribute.downcast_ref::<A>()
    }

    pub fn index(&self) -> AnyIndex {
        self.index
    }

    pub fn take_variable<A: VariableAttribute>(
        &mut self,
    ) -> Option<(&'a A, VariableIndex, A::Value)> {
        let attribute = self.attribute.downcast_ref::<A>()?;
        let AnyIndex::Variable(index) = self.index else {
            return None;
        };
        take_value::<A::Value>(self.value).map(|value| (attribute, index, value))
    }

    pub fn take_constraint<A: ConstraintAttribute, F: Function, S: Set>(
        &mut self,
    ) -> Option<(&'a A, ConstraintIndex<F, S>, A::Value<F, S>)> {
        let attribute = self.attribute.downcast_ref::<A>()?;
        let AnyIndex::Constraint(index) = self.index else {
            return None;
        };
        let index = index.downcast::<F, S>()?;
        take_value::<A::Value<F, S>>(self.value).map(|value| (attribute, index, value))
    }

    /// Take the value of a constraint attribute whose value type doesn't depend on the
    /// constraint type
    pub fn take_uniform<A: UniformConstraintAttribute>(
        &mut self,
    ) -> Option<(&'a A, AnyConstraintIndex, A::Uniform)> {
        let attribute = self.attribute.downcast_ref::<A>()?;
        let AnyIndex::Constraint(index) = self.index else {
            return None;
        };
        take_value::<A::Uniform>(self.value).map(|value| (attribute, index, value))
    }

    pub fn unsupported(&self, instance: &str) -> ProtocolError {
        ProtocolError::unsupported(self.attribute, instance)
    }

    pub fn not_found(&self, instance: &str) -> ProtocolError {
        ProtocolError::IndexNotFound {
            index: self.index,
            instance: instance.to_string(),
        }
    }
}

/// Request to assign a variable or constraint attribute at several indices
///
/// The number of values always matches the number of indices. An instance that leaves the
/// values in place gets one [`IndexedAssignment`] per index instead.
pub struct BulkAssignment<'a> {
    attribute: &'a dyn AnyAttribute,
    kind: IndexKind,
    indices: &'a [AnyIndex],
    values: &'a mut dyn Any,
}

impl<'a> BulkAssignment<'a> {
    pub(crate) fn new(
        attribute: &'a dyn AnyAttribute,
        kind: IndexKind,
        indices: &'a [AnyIndex],
        values: &'a mut dyn Any,
    ) -> Self {
        Self {
            attribute,
            kind,
            indices,
            values,
        }
    }

    pub fn attribute(&self) -> &'a dyn AnyAttribute {
        self.attribute
    }

    pub fn downcast<A: Attribute>(&self) -> Option<&'a A> {
        self.attribute.downcast_ref::<A>()
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn indices(&self) -> &'a [AnyIndex] {
        self.indices
    }

    pub fn take_variables<A: VariableAttribute>(
        &mut self,
    ) -> Option<(&'a A, Vec<VariableIndex>, Vec<A::Value>)> {
        let attribute = self.attribute.downcast_ref::<A>()?;
        let indices = self
            .indices
            .iter()
            .map(|index| match index {
                AnyIndex::Variable(index) => Some(*index),
                AnyIndex::Constraint(_) => None,
            })
            .collect::<Option<Vec<_>>>()?;
        take_value::<Vec<A::Value>>(self.values).map(|values| (attribute, indices, values))
    }

    pub fn take_constraints<A: ConstraintAttribute, F: Function, S: Set>(
        &mut self,
    ) -> Option<(&'a A, Vec<ConstraintIndex<F, S>>, Vec<A::Value<F, S>>)> {
        let attribute = self.attribute.downcast_ref::<A>()?;
        let indices = self
            .indices
            .iter()
            .map(|index| match index {
                AnyIndex::Constraint(index) => index.downcast::<F, S>(),
                AnyIndex::Variable(_) => None,
            })
            .collect::<Option<Vec<_>>>()?;
        take_value::<Vec<A::Value<F, S>>>(self.values).map(|values| (attribute, indices, values))
    }

    pub fn take_uniform<A: UniformConstraintAttribute>(
        &mut self,
    ) -> Option<(&'a A, Vec<AnyConstraintIndex>, Vec<A::Uniform>)> {
        let attribute = self.attribute.downcast_ref::<A>()?;
        let indices = self
            .indices
            .iter()
            .map(|index| match index {
                AnyIndex::Constraint(index) => Some(*index),
                AnyIndex::Variable(_) => None,
            })
            .collect::<Option<Vec<_>>>()?;
        take_value::<Vec<A::Uniform>>(self.values).map(|values| (attribute, indices, values))
    }

    pub fn unsupported(&self, instance: &str) -> ProtocolError {
        ProtocolError::unsupported(self.attribute, instance)
    }
}
// endregion Writes
