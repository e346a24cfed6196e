//! The attribute taxonomy
//!
//! An attribute is a value naming a property of an instance, a variable or a constraint.
//! Attributes belong to exactly one of four families:
//! - [`SolverParameter`]: a knob that only affects how the instance is solved
//! - [`InstanceAttribute`]: a property of the whole problem or of the latest solve
//! - [`VariableAttribute`]: a property of one variable
//! - [`ConstraintAttribute`]: a property of one constraint
//!
//! The families are open: any crate can declare new attributes by implementing the traits
//! (or with the declaration macros used here), and instances answer for the ones they know.
//! Attribute identity is structural, two values name the same attribute when their types and
//! carried parameters are equal.
use std::any::Any;
use std::fmt::{Debug, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::functions::{Function, ScalarQuadraticFunction, Set};
use crate::index::{
    AnyConstraintIndex, ConstraintIndex, ConstraintType, Index, TypeTag, VariableIndex,
};

// region Declaration macros
// Defined before the submodules so they are in scope there.

/// Declare a unit attribute struct, or a struct carrying a 1-based result index
macro_rules! attribute_struct {
    ($family:ident, $(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name;

        impl $crate::attributes::Attribute for $name {
            const FAMILY: $crate::attributes::AttributeFamily =
                $crate::attributes::AttributeFamily::$family;
            const NAME: &'static str = stringify!($name);
        }
    };
    ($family:ident, $(#[$meta:meta])* $name:ident(result_index)) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            /// Which result to access, 1-based
            pub result_index: usize,
        }

        impl $name {
            /// Access the result with index `result_index`
            pub fn new(result_index: usize) -> Self {
                Self { result_index }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new(1)
            }
        }

        impl $crate::attributes::Attribute for $name {
            const FAMILY: $crate::attributes::AttributeFamily =
                $crate::attributes::AttributeFamily::$family;
            const NAME: &'static str = stringify!($name);
        }

        impl $crate::attributes::ResultIndexed for $name {
            fn result_index(&self) -> usize {
                self.result_index
            }
        }
    };
}

macro_rules! solver_parameter {
    ($(#[$meta:meta])* $name:ident => $value:ty) => {
        attribute_struct!(SolverParameter, $(#[$meta])* $name);

        impl $crate::attributes::InstanceLevel for $name {
            type Value = $value;
        }

        impl $crate::attributes::SolverParameter for $name {}
    };
}

macro_rules! instance_attribute {
    ($(#[$meta:meta])* $name:ident $(($index:ident))? => $value:ty) => {
        attribute_struct!(InstanceAttribute, $(#[$meta])* $name $(($index))?);

        impl $crate::attributes::InstanceLevel for $name {
            type Value = $value;
        }

        impl $crate::attributes::InstanceAttribute for $name {}
    };
}

macro_rules! variable_attribute {
    ($(#[$meta:meta])* $name:ident $(($index:ident))? => $value:ty) => {
        attribute_struct!(VariableAttribute, $(#[$meta])* $name $(($index))?);

        impl $crate::attributes::VariableAttribute for $name {
            type Value = $value;
        }
    };
}

/// Declares a constraint attribute whose value doesn't depend on the constraint's types
macro_rules! constraint_attribute {
    ($(#[$meta:meta])* $name:ident $(($index:ident))? => $value:ty) => {
        attribute_struct!(ConstraintAttribute, $(#[$meta])* $name $(($index))?);

        impl $crate::attributes::ConstraintAttribute for $name {
            type Value<F: $crate::functions::Function, S: $crate::functions::Set> = $value;
        }

        impl $crate::attributes::UniformConstraintAttribute for $name {
            type Uniform = $value;
        }
    };
}
// endregion Declaration macros

mod constraint;
mod instance;
mod parameters;
mod variable;

pub use constraint::{
    ConstraintBasisStatus, ConstraintDual, ConstraintDualStart, ConstraintFunction,
    ConstraintName, ConstraintPrimal, ConstraintPrimalStart, ConstraintSet,
};
pub use instance::{
    BarrierIterations, DualStatus, ListOfConstraintIndices, ListOfConstraints,
    ListOfVariableIndices, Name, NodeCount, NumberOfConstraints, NumberOfVariables,
    ObjectiveBound, ObjectiveFunction, ObjectiveSense, ObjectiveValue, PrimalStatus, RawSolver,
    RawSolverHandle, RelativeGap, ResultCount, SimplexIterations, SolveTime, TerminationStatus,
};
pub use parameters::{NumberOfThreads, RawParameter, Silent, TimeLimit};
pub use variable::{VariableBasisStatus, VariableName, VariablePrimal, VariablePrimalStart};

/// The four disjoint attribute families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeFamily {
    SolverParameter,
    InstanceAttribute,
    VariableAttribute,
    ConstraintAttribute,
}

impl AttributeFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            AttributeFamily::SolverParameter => "SolverParameter",
            AttributeFamily::InstanceAttribute => "InstanceAttribute",
            AttributeFamily::VariableAttribute => "VariableAttribute",
            AttributeFamily::ConstraintAttribute => "ConstraintAttribute",
        }
    }
}

impl Display for AttributeFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Implemented by every attribute and solver parameter
///
/// The provided methods describe the attribute's type parameters and let attributes that are
/// generic over function or constraint types fill their own typed value from type-erased data.
/// Attributes that aren't generic keep the defaults.
pub trait Attribute: Debug + Clone + PartialEq + 'static {
    /// Family of the attribute
    const FAMILY: AttributeFamily;
    /// Name of the attribute, without its parameters
    const NAME: &'static str;

    /// The (function, set) pair the attribute is parametrized by, if any
    fn constraint_type(&self) -> Option<ConstraintType> {
        None
    }

    /// The function type the attribute is parametrized by, if any
    fn function_type(&self) -> Option<TypeTag> {
        None
    }

    /// Answer from a list of erased constraint indices of [`Attribute::constraint_type`]
    ///
    /// `slot` is the caller's `Option<Value>`. Returns false when the attribute can't be
    /// answered this way.
    fn answer_from_indices(&self, _indices: &[AnyConstraintIndex], _slot: &mut dyn Any) -> bool {
        false
    }

    /// Answer from a function stored in canonical quadratic form
    ///
    /// # Parameters
    /// - `source`: Function type the stored function was originally given as
    /// - `function`: The stored function
    /// - `slot`: The caller's `Option<Value>`
    ///
    /// Returns None when the attribute can't be answered this way.
    fn answer_from_objective(
        &self,
        _source: TypeTag,
        _function: &ScalarQuadraticFunction<f64>,
        _slot: &mut dyn Any,
    ) -> Option<Result<(), ProtocolError>> {
        None
    }

    /// Take a function value out of `slot` in canonical quadratic form, with its original type
    fn take_objective(&self, _slot: &mut dyn Any) -> Option<(TypeTag, ScalarQuadraticFunction<f64>)> {
        None
    }

    /// Check if a function stored in canonical form converts into this attribute's value type
    ///
    /// Returns None when the attribute isn't answered from a stored function.
    fn objective_representable(
        &self,
        _function: &ScalarQuadraticFunction<f64>,
        _tolerance: f64,
    ) -> Option<bool> {
        None
    }
}

/// Attributes with a single value for the whole instance, parameters included
pub trait InstanceLevel: Attribute {
    type Value: 'static;
}

/// Marker for solver parameters
pub trait SolverParameter: InstanceLevel {}

/// Marker for instance attributes
pub trait InstanceAttribute: InstanceLevel {}

/// Attributes with a value for each variable
pub trait VariableAttribute: Attribute {
    type Value: 'static;
}

/// Attributes with a value for each constraint
///
/// The value type may depend on the function and set of the constraint, as it does for
/// [`ConstraintFunction`] and [`ConstraintSet`].
pub trait ConstraintAttribute: Attribute {
    type Value<F: Function, S: Set>: 'static;
}

/// Constraint attributes with the same value type for every kind of constraint
///
/// `Uniform` must equal `Value<F, S>` for every `F` and `S`, which lets an instance answer
/// them without knowing the constraint's types.
pub trait UniformConstraintAttribute: ConstraintAttribute {
    type Uniform: 'static;
}

/// Unifies variable and constraint attributes over the type of index they are accessed with
pub trait IndexedAttribute<X: Index>: Attribute {
    type Value: 'static;
}

impl<A: VariableAttribute> IndexedAttribute<VariableIndex> for A {
    type Value = <A as VariableAttribute>::Value;
}

impl<A: ConstraintAttribute, F: Function, S: Set> IndexedAttribute<ConstraintIndex<F, S>> for A {
    type Value = <A as ConstraintAttribute>::Value<F, S>;
}

/// Attributes selecting one of several results
pub trait ResultIndexed: Attribute {
    /// The 1-based result index
    fn result_index(&self) -> usize;
}

/// Object safe view of an [`Attribute`], used by instances to dispatch on the attribute
pub trait AnyAttribute: Debug + 'static {
    fn family(&self) -> AttributeFamily;

    fn name(&self) -> &'static str;

    fn constraint_type_parameter(&self) -> Option<ConstraintType>;

    fn function_type_parameter(&self) -> Option<TypeTag>;

    fn as_any(&self) -> &dyn Any;

    /// Check whether `other` is the same attribute, type and parameters included
    fn same_attribute(&self, other: &dyn AnyAttribute) -> bool;

    fn fill_from_indices(&self, indices: &[AnyConstraintIndex], slot: &mut dyn Any) -> bool;

    fn fill_from_objective(
        &self,
        source: TypeTag,
        function: &ScalarQuadraticFunction<f64>,
        slot: &mut dyn Any,
    ) -> Option<Result<(), ProtocolError>>;

    fn drain_objective(&self, slot: &mut dyn Any) -> Option<(TypeTag, ScalarQuadraticFunction<f64>)>;

    fn represents_objective(
        &self,
        function: &ScalarQuadraticFunction<f64>,
        tolerance: f64,
    ) -> Option<bool>;
}

impl<A: Attribute> AnyAttribute for A {
    fn family(&self) -> AttributeFamily {
        A::FAMILY
    }

    fn name(&self) -> &'static str {
        A::NAME
    }

    fn constraint_type_parameter(&self) -> Option<ConstraintType> {
        self.constraint_type()
    }

    fn function_type_parameter(&self) -> Option<TypeTag> {
        self.function_type()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn same_attribute(&self, other: &dyn AnyAttribute) -> bool {
        other
            .as_any()
            .downcast_ref::<A>()
            .is_some_and(|other| other == self)
    }

    fn fill_from_indices(&self, indices: &[AnyConstraintIndex], slot: &mut dyn Any) -> bool {
        self.answer_from_indices(indices, slot)
    }

    fn fill_from_objective(
        &self,
        source: TypeTag,
        function: &ScalarQuadraticFunction<f64>,
        slot: &mut dyn Any,
    ) -> Option<Result<(), ProtocolError>> {
        self.answer_from_objective(source, function, slot)
    }

    fn drain_objective(&self, slot: &mut dyn Any) -> Option<(TypeTag, ScalarQuadraticFunction<f64>)> {
        self.take_objective(slot)
    }

    fn represents_objective(
        &self,
        function: &ScalarQuadraticFunction<f64>,
        tolerance: f64,
    ) -> Option<bool> {
        self.objective_representable(function, tolerance)
    }
}

impl dyn AnyAttribute {
    /// Check whether the attribute is an `A`
    pub fn is<A: Attribute>(&self) -> bool {
        self.as_any().is::<A>()
    }

    /// Get the attribute as an `A`
    pub fn downcast_ref<A: Attribute>(&self) -> Option<&A> {
        self.as_any().downcast_ref::<A>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{EqualTo, LessThan, ScalarAffineFunction, SingleVariable};

    #[test]
    fn result_index_defaults_to_one() {
        assert_eq!(ObjectiveValue::default(), ObjectiveValue::new(1));
        assert_eq!(VariablePrimal::default(), VariablePrimal::new(1));
        assert_eq!(ConstraintPrimal::default(), ConstraintPrimal::new(1));
        assert_eq!(ConstraintDual::default(), ConstraintDual::new(1));
        assert_eq!(PrimalStatus::default(), PrimalStatus::new(1));
        assert_eq!(DualStatus::default(), DualStatus::new(1));
        assert_eq!(DualStatus::default().result_index(), 1);
    }

    #[test]
    fn zero_result_index_can_be_constructed() {
        assert_eq!(VariablePrimal::new(0).result_index, 0);
    }

    #[test]
    fn families() {
        assert_eq!(Silent::FAMILY, AttributeFamily::SolverParameter);
        assert_eq!(ObjectiveSense::FAMILY, AttributeFamily::InstanceAttribute);
        assert_eq!(VariableName::FAMILY, AttributeFamily::VariableAttribute);
        assert_eq!(ConstraintSet::FAMILY, AttributeFamily::ConstraintAttribute);
        assert_eq!(ObjectiveValue::NAME, "ObjectiveValue");
    }

    #[test]
    fn identity_is_structural() {
        let first: &dyn AnyAttribute = &ObjectiveValue::new(2);
        assert!(first.same_attribute(&ObjectiveValue::new(2)));
        assert!(!first.same_attribute(&ObjectiveValue::new(1)));
        assert!(!first.same_attribute(&ObjectiveBound));

        let raw: &dyn AnyAttribute = &RawParameter::new("presolve");
        assert!(raw.same_attribute(&RawParameter::new("presolve")));
        assert!(!raw.same_attribute(&RawParameter::new("crossover")));
    }

    #[test]
    fn type_parameters_distinguish_attributes() {
        let less = NumberOfConstraints::<SingleVariable, LessThan<f64>>::new();
        let equal = NumberOfConstraints::<SingleVariable, EqualTo<f64>>::new();
        let erased: &dyn AnyAttribute = &less;
        assert!(!erased.same_attribute(&equal));
        assert_eq!(
            erased.constraint_type_parameter(),
            Some(ConstraintType::of::<SingleVariable, LessThan<f64>>())
        );

        let objective: &dyn AnyAttribute = &ObjectiveFunction::<ScalarAffineFunction<f64>>::new();
        assert_eq!(
            objective.function_type_parameter(),
            Some(TypeTag::of_function::<ScalarAffineFunction<f64>>())
        );
        assert!(objective.constraint_type_parameter().is_none());
    }

    #[test]
    fn downcast_erased_attribute() {
        let erased: &dyn AnyAttribute = &VariablePrimal::new(3);
        assert!(erased.is::<VariablePrimal>());
        assert!(!erased.is::<ConstraintPrimal>());
        assert_eq!(erased.downcast_ref::<VariablePrimal>(), Some(&VariablePrimal::new(3)));
        assert_eq!(erased.family(), AttributeFamily::VariableAttribute);
        assert_eq!(erased.name(), "VariablePrimal");
    }

    #[test]
    fn family_display() {
        assert_eq!(AttributeFamily::ConstraintAttribute.to_string(), "ConstraintAttribute");
    }
}
