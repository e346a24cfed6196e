//! The instance interface and the typed accessors built on it
//!
//! Backends implement [`Instance`], overriding the methods for the attributes and index types
//! they support. Every method has a default that reports no capability (`false`) or fails with
//! [`ProtocolError::UnsupportedAccess`], so a backend only writes code for what it handles.
//!
//! Callers use [`InstanceExt`], implemented for every instance (trait objects included), which
//! erases attributes and indices into the request objects from [`query`] and turns the answers
//! back into typed values.
//!
//! # Examples
//! ```rust
//! use moirs_core::attributes::{ObjectiveSense, VariableName};
//! use moirs_core::instance::InstanceExt;
//! use moirs_core::mock::MockInstance;
//! use moirs_core::status::OptimizationSense;
//!
//! let mut instance = MockInstance::new();
//! let x = instance.add_variable();
//! instance.set_at(&VariableName, x, "x".to_string()).unwrap();
//! instance.set(&ObjectiveSense, OptimizationSense::Max).unwrap();
//!
//! assert!(instance.can_get_by_name::<moirs_core::VariableIndex>("x"));
//! assert_eq!(instance.index_by_name::<moirs_core::VariableIndex>("x").unwrap(), x);
//! assert_eq!(instance.get(&ObjectiveSense).unwrap(), OptimizationSense::Max);
//! ```
pub mod query;

use std::fmt::Debug;

use crate::attributes::{AnyAttribute, Attribute, IndexedAttribute, InstanceLevel};
use crate::configuration::current_configuration;
use crate::error::ProtocolError;
use crate::index::{AnyConstraintIndex, AnyIndex, Index, IndexKind, NameTarget};
use query::{Assignment, BulkAssignment, BulkQuery, IndexedAssignment, IndexedQuery, Query};

/// An optimization problem together with its solver state
///
/// Every method defaults to reporting no capability. Overrides dispatch on the attribute with
/// `downcast` and must fall back to the default behavior for anything they don't recognize,
/// usually by returning `Err(query.unsupported(self.kind()))`.
pub trait Instance {
    /// Name of the concrete kind of instance, used in error messages
    fn kind(&self) -> &str {
        std::any::type_name::<Self>()
    }

    // region Capability predicates
    /// Check if the instance supports the attribute at all
    ///
    /// Returns true if setting the attribute would never be rejected as unsupported. An
    /// attribute that is only unsupported in specific circumstances is still supported.
    fn supports_attribute(&self, _attribute: &dyn AnyAttribute) -> bool {
        false
    }

    /// Check if the instance supports a variable or constraint attribute for indices of `kind`
    fn supports_attribute_for(&self, _attribute: &dyn AnyAttribute, _kind: IndexKind) -> bool {
        false
    }

    /// Check if the instance currently holds a value for the attribute
    fn can_get_attribute(&self, _attribute: &dyn AnyAttribute) -> bool {
        false
    }

    /// Check if the instance holds a value of the attribute for every index of `kind`, and at
    /// least one such index exists
    fn can_get_attribute_for(&self, _attribute: &dyn AnyAttribute, _kind: IndexKind) -> bool {
        false
    }

    fn can_set_attribute(&self, _attribute: &dyn AnyAttribute) -> bool {
        false
    }

    fn can_set_attribute_for(&self, _attribute: &dyn AnyAttribute, _kind: IndexKind) -> bool {
        false
    }

    /// Check if something matching `target` is named `name`
    fn has_named(&self, _target: NameTarget, _name: &str) -> bool {
        false
    }
    // endregion Capability predicates

    // region Accessors
    /// Answer a parameter or instance attribute
    fn read(&self, query: Query<'_>) -> Result<(), ProtocolError> {
        Err(query.unsupported(self.kind()))
    }

    /// Answer a variable or constraint attribute at one index
    fn read_at(&self, query: IndexedQuery<'_>) -> Result<(), ProtocolError> {
        Err(query.unsupported(self.kind()))
    }

    /// Answer a variable or constraint attribute at several indices at once
    ///
    /// Returning `Ok(())` without replying falls back to one [`Instance::read_at`] per index,
    /// which is what the default does.
    fn read_many(&self, _query: BulkQuery<'_>) -> Result<(), ProtocolError> {
        Ok(())
    }

    /// Assign a parameter or instance attribute
    ///
    /// Returning `Ok(())` without taking the value counts as unsupported.
    fn write(&mut self, assignment: Assignment<'_>) -> Result<(), ProtocolError> {
        Err(assignment.unsupported(self.kind()))
    }

    /// Assign a variable or constraint attribute at one index
    fn write_at(&mut self, assignment: IndexedAssignment<'_>) -> Result<(), ProtocolError> {
        Err(assignment.unsupported(self.kind()))
    }

    /// Assign a variable or constraint attribute at several indices at once
    ///
    /// Returning `Ok(())` without taking the values falls back to one [`Instance::write_at`]
    /// per index, which is what the default does.
    fn write_many(&mut self, _assignment: BulkAssignment<'_>) -> Result<(), ProtocolError> {
        Ok(())
    }

    /// Find the index of whatever matches `target` and is named `name`
    fn index_named(&self, target: NameTarget, name: &str) -> Result<AnyIndex, ProtocolError> {
        Err(ProtocolError::NameNotFound {
            target,
            name: name.to_string(),
            instance: self.kind().to_string(),
        })
    }
    // endregion Accessors
}

/// Typed capability predicates and accessors, available on every [`Instance`]
pub trait InstanceExt: Instance {
    // region Capability predicates
    /// Check if the instance supports a parameter or attribute in any circumstance
    fn supports<A: Attribute>(&self, attribute: &A) -> bool {
        self.supports_attribute(attribute)
    }

    /// Check if the instance supports a variable or constraint attribute for indices of type `X`
    ///
    /// # Examples
    /// ```rust
    /// use moirs_core::attributes::ConstraintName;
    /// use moirs_core::functions::{LessThan, SingleVariable};
    /// use moirs_core::instance::InstanceExt;
    /// use moirs_core::mock::MockInstance;
    /// use moirs_core::ConstraintIndex;
    ///
    /// let instance = MockInstance::new();
    /// assert!(instance
    ///     .supports_for::<ConstraintIndex<SingleVariable, LessThan<f64>>>(&ConstraintName));
    /// ```
    fn supports_for<X: Index>(&self, attribute: &impl IndexedAttribute<X>) -> bool {
        self.supports_attribute_for(attribute, X::kind())
    }

    fn can_get<A: Attribute>(&self, attribute: &A) -> bool {
        self.can_get_attribute(attribute)
    }

    fn can_get_for<X: Index>(&self, attribute: &impl IndexedAttribute<X>) -> bool {
        self.can_get_attribute_for(attribute, X::kind())
    }

    fn can_set<A: Attribute>(&self, attribute: &A) -> bool {
        self.can_set_attribute(attribute)
    }

    fn can_set_for<X: Index>(&self, attribute: &impl IndexedAttribute<X>) -> bool {
        self.can_set_attribute_for(attribute, X::kind())
    }

    /// Check if an index of type `X` is named `name`
    fn can_get_by_name<X: Index>(&self, name: &str) -> bool {
        self.has_named(NameTarget::from(X::kind()), name)
    }

    /// Check if a constraint of any type is named `name`
    fn can_get_constraint_by_name(&self, name: &str) -> bool {
        self.has_named(NameTarget::AnyConstraint, name)
    }
    // endregion Capability predicates

    // region Reads
    /// Get the value of a parameter or instance attribute
    fn get<A: InstanceLevel>(&self, attribute: &A) -> Result<A::Value, ProtocolError> {
        let mut slot: Option<A::Value> = None;
        let res = self.read(Query::new(attribute, &mut slot));
        settle(self.kind(), "get", attribute, res, slot)
    }

    /// Get the value of a variable or constraint attribute at one index
    fn get_at<X: Index, A: IndexedAttribute<X>>(
        &self,
        attribute: &A,
        index: X,
    ) -> Result<A::Value, ProtocolError> {
        let mut slot: Option<A::Value> = None;
        let res = self.read_at(IndexedQuery::new(attribute, index.to_any(), &mut slot));
        settle(self.kind(), "get_at", attribute, res, slot)
    }

    /// Get the values of a variable or constraint attribute at several indices
    ///
    /// The k-th value belongs to the k-th index. Instances without a bulk path are read one
    /// index at a time.
    fn get_many<X: Index, A: IndexedAttribute<X>>(
        &self,
        attribute: &A,
        indices: &[X],
    ) -> Result<Vec<A::Value>, ProtocolError> {
        let erased: Vec<AnyIndex> = indices.iter().map(|index| index.to_any()).collect();
        let mut slot: Option<Vec<A::Value>> = None;
        let res = self.read_many(BulkQuery::new(attribute, X::kind(), &erased, &mut slot));
        if let Err(err) = res {
            log_failure("get_many", attribute, self.kind(), &err);
            return Err(err);
        }
        match slot {
            Some(values) => Ok(values),
            None => indices
                .iter()
                .map(|index| self.get_at(attribute, *index))
                .collect(),
        }
    }

    /// Like [`InstanceExt::get_many`], but writes into `output`, which must have one slot per
    /// index
    fn get_into<X: Index, A: IndexedAttribute<X>>(
        &self,
        output: &mut [A::Value],
        attribute: &A,
        indices: &[X],
    ) -> Result<(), ProtocolError> {
        if output.len() != indices.len() {
            return Err(ProtocolError::LengthMismatch {
                expected: indices.len(),
                actual: output.len(),
            });
        }
        let values = self.get_many(attribute, indices)?;
        for (out, value) in output.iter_mut().zip(values) {
            *out = value;
        }
        Ok(())
    }

    /// Find the index of type `X` named `name`
    ///
    /// A name belonging to an index of another type is not found.
    fn index_by_name<X: Index>(&self, name: &str) -> Result<X, ProtocolError> {
        let target = NameTarget::from(X::kind());
        let res = self.index_named(target, name).and_then(|index| {
            X::from_any(index).ok_or_else(|| ProtocolError::NameNotFound {
                target,
                name: name.to_string(),
                instance: self.kind().to_string(),
            })
        });
        if let Err(err) = &res {
            log_failure("index_by_name", &name, self.kind(), err);
        }
        res
    }

    /// Find the constraint named `name`, whatever its type
    ///
    /// This path is type-erased and slower than [`InstanceExt::index_by_name`], use that when
    /// the constraint type is known.
    fn constraint_by_name(&self, name: &str) -> Result<AnyConstraintIndex, ProtocolError> {
        let res = self
            .index_named(NameTarget::AnyConstraint, name)
            .and_then(|index| match index {
                AnyIndex::Constraint(index) => Ok(index),
                AnyIndex::Variable(_) => Err(ProtocolError::NameNotFound {
                    target: NameTarget::AnyConstraint,
                    name: name.to_string(),
                    instance: self.kind().to_string(),
                }),
            });
        if let Err(err) = &res {
            log_failure("constraint_by_name", &name, self.kind(), err);
        }
        res
    }
    // endregion Reads

    // region Writes
    /// Set a parameter or instance attribute
    fn set<A: InstanceLevel>(&mut self, attribute: &A, value: A::Value) -> Result<(), ProtocolError> {
        let mut slot = Some(value);
        let res = self.write(Assignment::new(attribute, &mut slot));
        consumed("set", self.kind(), attribute, res, slot.is_some())
    }

    /// Set a variable or constraint attribute at one index
    fn set_at<X: Index, A: IndexedAttribute<X>>(
        &mut self,
        attribute: &A,
        index: X,
        value: A::Value,
    ) -> Result<(), ProtocolError> {
        let mut slot = Some(value);
        let res = self.write_at(IndexedAssignment::new(attribute, index.to_any(), &mut slot));
        consumed("set_at", self.kind(), attribute, res, slot.is_some())
    }

    /// Set a variable or constraint attribute at several indices, the k-th value going to the
    /// k-th index
    fn set_many<X: Index, A: IndexedAttribute<X>>(
        &mut self,
        attribute: &A,
        indices: &[X],
        values: Vec<A::Value>,
    ) -> Result<(), ProtocolError> {
        if values.len() != indices.len() {
            return Err(ProtocolError::LengthMismatch {
                expected: indices.len(),
                actual: values.len(),
            });
        }
        let erased: Vec<AnyIndex> = indices.iter().map(|index| index.to_any()).collect();
        let mut slot = Some(values);
        let res = self.write_many(BulkAssignment::new(attribute, X::kind(), &erased, &mut slot));
        if let Err(err) = res {
            log_failure("set_many", attribute, self.kind(), &err);
            return Err(err);
        }
        match slot {
            Some(values) => indices
                .iter()
                .zip(values)
                .try_for_each(|(index, value)| self.set_at(attribute, *index, value)),
            None => Ok(()),
        }
    }
    // endregion Writes
}

impl<T: Instance + ?Sized> InstanceExt for T {}

/// Turn the outcome of a read into the value the caller asked for
fn settle<V>(
    instance: &str,
    operation: &'static str,
    attribute: &dyn AnyAttribute,
    res: Result<(), ProtocolError>,
    slot: Option<V>,
) -> Result<V, ProtocolError> {
    let res = res.and_then(|_| {
        slot.ok_or_else(|| ProtocolError::NoValue {
            attribute: format!("{:?}", attribute),
            instance: instance.to_string(),
        })
    });
    if let Err(err) = &res {
        log_failure(operation, attribute, instance, err);
    }
    res
}

/// Check that a write took its value
fn consumed(
    operation: &'static str,
    instance: &str,
    attribute: &dyn AnyAttribute,
    res: Result<(), ProtocolError>,
    left_over: bool,
) -> Result<(), ProtocolError> {
    let res = res.and_then(|_| {
        if left_over {
            Err(ProtocolError::unsupported(attribute, instance))
        } else {
            Ok(())
        }
    });
    if let Err(err) = &res {
        log_failure(operation, attribute, instance, err);
    }
    res
}

fn log_failure(operation: &'static str, subject: &dyn Debug, instance: &str, err: &ProtocolError) {
    if current_configuration().log_unsupported_access {
        tracing::debug!(
            component = "instance",
            operation,
            subject = ?subject,
            instance,
            status = "error",
            code = err.code(),
            "{err}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{
        ConstraintName, Name, ObjectiveValue, RawParameter, Silent, VariableName, VariablePrimal,
        VariablePrimalStart,
    };
    use crate::functions::{LessThan, SingleVariable};
    use crate::index::{ConstraintIndex, VariableIndex};
    use approx::assert_relative_eq;
    use std::cell::Cell;

    struct EmptyInstance;

    impl Instance for EmptyInstance {}

    /// Holds one primal value per variable, optionally answering bulk requests itself
    struct VectorInstance {
        name: String,
        primal: Vec<f64>,
        bulk: bool,
        bulk_calls: Cell<usize>,
    }

    impl VectorInstance {
        fn new(primal: Vec<f64>, bulk: bool) -> Self {
            Self {
                name: String::new(),
                primal,
                bulk,
                bulk_calls: Cell::new(0),
            }
        }

        fn lookup(&self, index: VariableIndex) -> Option<f64> {
            self.primal.get(index.value() as usize).copied()
        }
    }

    impl Instance for VectorInstance {
        fn kind(&self) -> &str {
            "VectorInstance"
        }

        fn supports_attribute(&self, attribute: &dyn AnyAttribute) -> bool {
            attribute.is::<Name>() || attribute.is::<VariablePrimal>()
        }

        fn supports_attribute_for(&self, attribute: &dyn AnyAttribute, kind: IndexKind) -> bool {
            kind == IndexKind::Variable && attribute.is::<VariablePrimal>()
        }

        fn can_get_attribute_for(&self, attribute: &dyn AnyAttribute, kind: IndexKind) -> bool {
            self.supports_attribute_for(attribute, kind) && !self.primal.is_empty()
        }

        fn read(&self, mut query: Query<'_>) -> Result<(), ProtocolError> {
            if query.downcast::<Name>().is_some() {
                return query.reply::<Name>(self.name.clone());
            }
            Err(query.unsupported(self.kind()))
        }

        fn read_at(&self, mut query: IndexedQuery<'_>) -> Result<(), ProtocolError> {
            if let (Some(attribute), Some(index)) =
                (query.downcast::<VariablePrimal>(), query.variable())
            {
                if attribute.result_index != 1 {
                    return Err(ProtocolError::InvalidResultIndex {
                        index: attribute.result_index,
                        result_count: 1,
                    });
                }
                let value = self.lookup(index).ok_or_else(|| query.not_found(self.kind()))?;
                return query.reply_variable::<VariablePrimal>(value);
            }
            Err(query.unsupported(self.kind()))
        }

        fn read_many(&self, mut query: BulkQuery<'_>) -> Result<(), ProtocolError> {
            if !self.bulk || query.downcast::<VariablePrimal>().is_none() {
                return Ok(());
            }
            self.bulk_calls.set(self.bulk_calls.get() + 1);
            let values = query
                .indices()
                .iter()
                .map(|index| match index {
                    AnyIndex::Variable(index) => self.lookup(*index).ok_or(*index),
                    AnyIndex::Constraint(_) => Err(VariableIndex::new(u64::MAX)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map_err(|index| ProtocolError::IndexNotFound {
                    index: AnyIndex::Variable(index),
                    instance: self.kind().to_string(),
                })?;
            query.reply_variables::<VariablePrimal>(values)
        }

        fn write(&mut self, mut assignment: Assignment<'_>) -> Result<(), ProtocolError> {
            if let Some((_, name)) = assignment.take::<Name>() {
                self.name = name;
                return Ok(());
            }
            Err(assignment.unsupported(self.kind()))
        }

        fn write_at(&mut self, mut assignment: IndexedAssignment<'_>) -> Result<(), ProtocolError> {
            if let Some((_, index, value)) = assignment.take_variable::<VariablePrimal>() {
                match self.primal.get_mut(index.value() as usize) {
                    Some(slot) => *slot = value,
                    None => return Err(assignment.not_found(self.kind())),
                }
                return Ok(());
            }
            Err(assignment.unsupported(self.kind()))
        }
    }

    /// Claims success without ever answering or taking a value
    struct CarelessInstance;

    impl Instance for CarelessInstance {
        fn read(&self, _query: Query<'_>) -> Result<(), ProtocolError> {
            Ok(())
        }

        fn write(&mut self, _assignment: Assignment<'_>) -> Result<(), ProtocolError> {
            Ok(())
        }
    }

    #[test]
    fn defaults_fail_with_family_and_kind() {
        let instance = EmptyInstance;
        let err = instance.get(&ObjectiveValue::default()).unwrap_err();
        assert!(err.is_unsupported());
        let message = err.to_string();
        assert!(message.contains("InstanceAttribute"));
        assert!(message.contains("EmptyInstance"));

        let err = instance.get(&Silent).unwrap_err();
        assert!(err.to_string().contains("SolverParameter"));

        let err = instance
            .get_at(&VariablePrimal::default(), VariableIndex::new(1))
            .unwrap_err();
        assert!(err.to_string().contains("VariableAttribute"));
        assert!(err.to_string().contains("EmptyInstance"));

        let index: ConstraintIndex<SingleVariable, LessThan<f64>> = ConstraintIndex::new(1);
        let err = instance.get_at(&ConstraintName, index).unwrap_err();
        assert!(err.to_string().contains("ConstraintAttribute"));
    }

    #[test]
    fn default_writes_fail() {
        let mut instance = EmptyInstance;
        assert!(instance.set(&Name, "model".to_string()).unwrap_err().is_unsupported());
        assert!(instance
            .set(&RawParameter::new("presolve"), serde_json::json!("off"))
            .unwrap_err()
            .is_unsupported());
        assert!(instance
            .set_at(&VariablePrimalStart, VariableIndex::new(1), 1.0)
            .unwrap_err()
            .is_unsupported());
        assert!(instance
            .set_many(&VariableName, &[VariableIndex::new(1)], vec!["x".to_string()])
            .unwrap_err()
            .is_unsupported());
    }

    #[test]
    fn default_bulk_read_falls_back_to_scalar_failure() {
        let instance = EmptyInstance;
        let err = instance
            .get_many(&VariablePrimal::default(), &[VariableIndex::new(1)])
            .unwrap_err();
        assert!(err.is_unsupported());
        // No indices means nothing to fail on
        let empty: Vec<f64> = instance
            .get_many(&VariablePrimal::default(), &[] as &[VariableIndex])
            .unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn predicates_default_to_false() {
        let instance = EmptyInstance;
        assert!(!instance.supports(&ObjectiveValue::default()));
        assert!(!instance.can_get(&ObjectiveValue::default()));
        assert!(!instance.can_set(&Silent));
        assert!(!instance.supports_for::<VariableIndex>(&VariableName));
        assert!(!instance.can_get_for::<VariableIndex>(&VariablePrimal::default()));
        assert!(!instance
            .can_set_for::<ConstraintIndex<SingleVariable, LessThan<f64>>>(&ConstraintName));
        assert!(!instance.can_get_by_name::<VariableIndex>("x"));
        assert!(!instance.can_get_constraint_by_name("c"));
    }

    #[test]
    fn default_name_lookup_is_not_found() {
        let instance = EmptyInstance;
        let err = instance.index_by_name::<VariableIndex>("x").unwrap_err();
        assert!(err.is_not_found());
        assert!(instance.constraint_by_name("c").unwrap_err().is_not_found());
    }

    #[test]
    fn trait_objects_use_the_same_accessors() {
        let mut backend = VectorInstance::new(vec![1.0], false);
        {
            let instance: &mut dyn Instance = &mut backend;
            instance.set(&Name, "model".to_string()).unwrap();
            assert_eq!(instance.kind(), "VectorInstance");
        }
        let instance: &dyn Instance = &backend;
        assert_eq!(instance.get(&Name).unwrap(), "model");
        assert!(instance.supports(&Name));
        assert!(!instance.supports(&ObjectiveValue::default()));
    }

    #[test]
    fn bulk_matches_scalar_reads() {
        let indices = [VariableIndex::new(2), VariableIndex::new(0), VariableIndex::new(1)];
        for bulk in [true, false] {
            let instance = VectorInstance::new(vec![1.5, 2.5, 3.5], bulk);
            let values = instance.get_many(&VariablePrimal::default(), &indices).unwrap();
            assert_eq!(values.len(), 3);
            for (index, value) in indices.iter().zip(&values) {
                let scalar = instance.get_at(&VariablePrimal::default(), *index).unwrap();
                assert_relative_eq!(*value, scalar);
            }
            assert_eq!(instance.bulk_calls.get(), usize::from(bulk));
        }
    }

    #[test]
    fn get_into_fills_output() {
        let instance = VectorInstance::new(vec![1.5, 2.5, 3.5], true);
        let indices = [VariableIndex::new(1), VariableIndex::new(2)];
        let mut output = vec![0.0; 2];
        instance
            .get_into(&mut output, &VariablePrimal::default(), &indices)
            .unwrap();
        assert_eq!(
            output,
            instance.get_many(&VariablePrimal::default(), &indices).unwrap()
        );

        let mut short = vec![0.0; 1];
        assert_eq!(
            instance.get_into(&mut short, &VariablePrimal::default(), &indices),
            Err(ProtocolError::LengthMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn bulk_write_falls_back_to_scalar_writes() {
        let mut instance = VectorInstance::new(vec![0.0; 3], false);
        let indices = [VariableIndex::new(2), VariableIndex::new(0)];
        instance
            .set_many(&VariablePrimal::default(), &indices, vec![5.0, 7.0])
            .unwrap();
        assert_eq!(instance.primal, vec![7.0, 0.0, 5.0]);

        assert_eq!(
            instance.set_many(&VariablePrimal::default(), &indices, vec![1.0]),
            Err(ProtocolError::LengthMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn backend_errors_pass_through() {
        let instance = VectorInstance::new(vec![1.0], true);
        assert_eq!(
            instance.get_at(&VariablePrimal::new(2), VariableIndex::new(0)),
            Err(ProtocolError::InvalidResultIndex {
                index: 2,
                result_count: 1
            })
        );
        let err = instance
            .get_many(&VariablePrimal::default(), &[VariableIndex::new(9)])
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn unanswered_success_is_reported() {
        let mut instance = CarelessInstance;
        assert!(matches!(
            instance.get(&Name),
            Err(ProtocolError::NoValue { .. })
        ));
        // The value wasn't taken, so the write wasn't supported
        assert!(instance.set(&Name, "ignored".to_string()).unwrap_err().is_unsupported());
    }
}
