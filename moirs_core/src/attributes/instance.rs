//! Instance attributes
use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::attributes::{Attribute, AttributeFamily, InstanceAttribute, InstanceLevel};
use crate::error::ProtocolError;
use crate::functions::{convert_quadratic, Function, ScalarFunction, ScalarQuadraticFunction, Set};
use crate::index::{AnyConstraintIndex, ConstraintIndex, ConstraintType, TypeTag, VariableIndex};
use crate::status::{OptimizationSense, ResultStatusCode, TerminationStatusCode};

/// Handle to the solver's own underlying object
pub type RawSolverHandle = Arc<dyn Any + Send + Sync>;

// region Problem
instance_attribute!(
    /// Name of the instance
    Name => String
);

instance_attribute!(
    /// Sense of the objective function
    ObjectiveSense => OptimizationSense
);

instance_attribute!(
    /// Number of variables in the instance
    NumberOfVariables => usize
);

instance_attribute!(
    /// Indices of all variables in the instance, in the order they were added
    ListOfVariableIndices => Vec<VariableIndex>
);

instance_attribute!(
    /// Every (function, set) pair for which the instance has at least one constraint
    ListOfConstraints => Vec<ConstraintType>
);
// endregion Problem

// region Solve results
instance_attribute!(
    /// Objective value of a result
    ObjectiveValue(result_index) => f64
);

instance_attribute!(
    /// Best known bound on the optimal objective value
    ObjectiveBound => f64
);

instance_attribute!(
    /// Final relative optimality gap
    RelativeGap => f64
);

instance_attribute!(
    /// Duration of the latest solve in seconds
    SolveTime => f64
);

instance_attribute!(
    /// Simplex iterations done during the latest solve
    SimplexIterations => u64
);

instance_attribute!(
    /// Barrier iterations done during the latest solve
    BarrierIterations => u64
);

instance_attribute!(
    /// Branch and bound nodes explored during the latest solve
    NodeCount => u64
);

instance_attribute!(
    /// The solver's underlying object, for calling solver specific functions
    RawSolver => RawSolverHandle
);

instance_attribute!(
    /// Number of results available after the latest solve
    ResultCount => usize
);

instance_attribute!(
    /// Why the latest solve stopped
    TerminationStatus => TerminationStatusCode
);

instance_attribute!(
    /// What the primal values of a result represent
    PrimalStatus(result_index) => ResultStatusCode
);

instance_attribute!(
    /// What the dual values of a result represent
    DualStatus(result_index) => ResultStatusCode
);
// endregion Solve results

// region Generic attributes
/// The objective function, as an `F`
///
/// The function returned is equivalent to the one that was set, not necessarily identical.
/// Getting it fails with [`ProtocolError::ConversionImpossible`] if the objective can't be
/// represented exactly as an `F`, for instance a quadratic objective requested as affine.
pub struct ObjectiveFunction<F> {
    marker: PhantomData<fn() -> F>,
}

impl<F> ObjectiveFunction<F> {
    pub fn new() -> Self {
        Self {
            marker: PhantomData,
        }
    }
}

impl<F: ScalarFunction> Attribute for ObjectiveFunction<F> {
    const FAMILY: AttributeFamily = AttributeFamily::InstanceAttribute;
    const NAME: &'static str = "ObjectiveFunction";

    fn function_type(&self) -> Option<TypeTag> {
        Some(TypeTag::of_function::<F>())
    }

    fn answer_from_objective(
        &self,
        source: TypeTag,
        function: &ScalarQuadraticFunction<f64>,
        slot: &mut dyn Any,
    ) -> Option<Result<(), ProtocolError>> {
        let Some(slot) = slot.downcast_mut::<Option<F>>() else {
            return Some(Err(ProtocolError::ValueTypeMismatch {
                attribute: format!("{:?}", self),
            }));
        };
        Some(convert_quadratic::<F>(source, function).map(|converted| {
            *slot = Some(converted);
        }))
    }

    fn take_objective(&self, slot: &mut dyn Any) -> Option<(TypeTag, ScalarQuadraticFunction<f64>)> {
        let function = slot.downcast_mut::<Option<F>>()?.take()?;
        Some((TypeTag::of_function::<F>(), function.to_quadratic()))
    }

    fn objective_representable(
        &self,
        function: &ScalarQuadraticFunction<f64>,
        tolerance: f64,
    ) -> Option<bool> {
        Some(F::from_quadratic(function, tolerance).is_ok())
    }
}

impl<F: ScalarFunction> InstanceLevel for ObjectiveFunction<F> {
    type Value = F;
}

impl<F: ScalarFunction> InstanceAttribute for ObjectiveFunction<F> {}

impl<F: Function> Debug for ObjectiveFunction<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectiveFunction<{}>", F::NAME)
    }
}

/// Indices of every `F`-in-`S` constraint, in the order they were added
pub struct ListOfConstraintIndices<F, S> {
    marker: PhantomData<fn() -> (F, S)>,
}

/// Number of `F`-in-`S` constraints
pub struct NumberOfConstraints<F, S> {
    marker: PhantomData<fn() -> (F, S)>,
}

impl<F: Function, S: Set> Attribute for ListOfConstraintIndices<F, S> {
    const FAMILY: AttributeFamily = AttributeFamily::InstanceAttribute;
    const NAME: &'static str = "ListOfConstraintIndices";

    fn constraint_type(&self) -> Option<ConstraintType> {
        Some(ConstraintType::of::<F, S>())
    }

    fn answer_from_indices(&self, indices: &[AnyConstraintIndex], slot: &mut dyn Any) -> bool {
        match slot.downcast_mut::<Option<Vec<ConstraintIndex<F, S>>>>() {
            Some(slot) => {
                *slot = Some(
                    indices
                        .iter()
                        .filter_map(|index| index.downcast::<F, S>())
                        .collect(),
                );
                true
            }
            None => false,
        }
    }
}

impl<F: Function, S: Set> InstanceLevel for ListOfConstraintIndices<F, S> {
    type Value = Vec<ConstraintIndex<F, S>>;
}

impl<F: Function, S: Set> InstanceAttribute for ListOfConstraintIndices<F, S> {}

impl<F: Function, S: Set> Attribute for NumberOfConstraints<F, S> {
    const FAMILY: AttributeFamily = AttributeFamily::InstanceAttribute;
    const NAME: &'static str = "NumberOfConstraints";

    fn constraint_type(&self) -> Option<ConstraintType> {
        Some(ConstraintType::of::<F, S>())
    }

    fn answer_from_indices(&self, indices: &[AnyConstraintIndex], slot: &mut dyn Any) -> bool {
        match slot.downcast_mut::<Option<usize>>() {
            Some(slot) => {
                let constraint_type = ConstraintType::of::<F, S>();
                *slot = Some(
                    indices
                        .iter()
                        .filter(|index| index.constraint_type() == constraint_type)
                        .count(),
                );
                true
            }
            None => false,
        }
    }
}

impl<F: Function, S: Set> InstanceLevel for NumberOfConstraints<F, S> {
    type Value = usize;
}

impl<F: Function, S: Set> InstanceAttribute for NumberOfConstraints<F, S> {}

impl<F: Function, S: Set> Debug for ListOfConstraintIndices<F, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ListOfConstraintIndices<{}, {}>", F::NAME, S::NAME)
    }
}

impl<F: Function, S: Set> Debug for NumberOfConstraints<F, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "NumberOfConstraints<{}, {}>", F::NAME, S::NAME)
    }
}

// The marker types carry no data, so these hold for every type parameter.
macro_rules! marker_impls {
    ($name:ident<$($param:ident),+>) => {
        impl<$($param),+> $name<$($param),+> {
            pub fn new() -> Self {
                Self { marker: PhantomData }
            }
        }

        impl<$($param),+> Clone for $name<$($param),+> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<$($param),+> Copy for $name<$($param),+> {}

        impl<$($param),+> PartialEq for $name<$($param),+> {
            fn eq(&self, _other: &Self) -> bool {
                true
            }
        }

        impl<$($param),+> Eq for $name<$($param),+> {}

        impl<$($param),+> Hash for $name<$($param),+> {
            fn hash<H: Hasher>(&self, _state: &mut H) {}
        }

        impl<$($param),+> Default for $name<$($param),+> {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

impl<F> Clone for ObjectiveFunction<F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F> Copy for ObjectiveFunction<F> {}

impl<F> PartialEq for ObjectiveFunction<F> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<F> Eq for ObjectiveFunction<F> {}

impl<F> Hash for ObjectiveFunction<F> {
    fn hash<H: Hasher>(&self, _state: &mut H) {}
}

impl<F> Default for ObjectiveFunction<F> {
    fn default() -> Self {
        Self::new()
    }
}

marker_impls!(ListOfConstraintIndices<F, S>);
marker_impls!(NumberOfConstraints<F, S>);
// endregion Generic attributes

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{
        ConversionError, EqualTo, LessThan, ScalarAffineFunction, ScalarAffineTerm,
        ScalarQuadraticTerm, SingleVariable,
    };

    #[test]
    fn list_of_constraint_indices_keeps_matching_type() {
        let less_than = ConstraintType::of::<SingleVariable, LessThan<f64>>();
        let equal_to = ConstraintType::of::<SingleVariable, EqualTo<f64>>();
        let indices = vec![
            AnyConstraintIndex::new(less_than, 1),
            AnyConstraintIndex::new(equal_to, 2),
            AnyConstraintIndex::new(less_than, 3),
        ];
        let attribute = ListOfConstraintIndices::<SingleVariable, LessThan<f64>>::new();
        let mut slot: Option<Vec<ConstraintIndex<SingleVariable, LessThan<f64>>>> = None;
        assert!(attribute.answer_from_indices(&indices, &mut slot));
        assert_eq!(slot, Some(vec![ConstraintIndex::new(1), ConstraintIndex::new(3)]));

        let count = NumberOfConstraints::<SingleVariable, EqualTo<f64>>::new();
        let mut slot: Option<usize> = None;
        assert!(count.answer_from_indices(&indices, &mut slot));
        assert_eq!(slot, Some(1));

        // Wrong slot type
        let mut wrong: Option<String> = None;
        assert!(!count.answer_from_indices(&indices, &mut wrong));
    }

    #[test]
    fn objective_answer_converts() {
        let x = VariableIndex::new(1);
        let stored = ScalarAffineFunction::from_terms(&[(2.0, x)], 1.0).to_quadratic();
        let source = TypeTag::of_function::<ScalarAffineFunction<f64>>();

        let affine = ObjectiveFunction::<ScalarAffineFunction<i64>>::new();
        let mut slot: Option<ScalarAffineFunction<i64>> = None;
        assert_eq!(affine.answer_from_objective(source, &stored, &mut slot), Some(Ok(())));
        assert_eq!(slot, Some(ScalarAffineFunction::from_terms(&[(2, x)], 1)));

        let single = ObjectiveFunction::<SingleVariable>::new();
        let mut slot: Option<SingleVariable> = None;
        match single.answer_from_objective(source, &stored, &mut slot) {
            Some(Err(ProtocolError::ConversionImpossible { source, .. })) => {
                assert_eq!(source, ConversionError::NotSingleVariable)
            }
            other => panic!("Expected a conversion error, got {:?}", other),
        }
        assert!(slot.is_none());
    }

    #[test]
    fn objective_take_canonicalizes() {
        let x = VariableIndex::new(1);
        let attribute = ObjectiveFunction::<ScalarQuadraticFunction<f64>>::new();
        let function = ScalarQuadraticFunction::new(
            vec![ScalarAffineTerm::new(1.0, x)],
            vec![ScalarQuadraticTerm::new(1.0, x, x)],
            0.0,
        );
        let mut slot = Some(function.clone());
        let (tag, taken) = attribute.take_objective(&mut slot).unwrap();
        assert!(tag.is::<ScalarQuadraticFunction<f64>>());
        assert_eq!(taken, function.to_quadratic());
        assert!(slot.is_none());
        // Nothing left to take
        assert!(attribute.take_objective(&mut slot).is_none());
    }

    #[test]
    fn objective_representability() {
        let x = VariableIndex::new(1);
        let quadratic = ScalarQuadraticFunction::new(
            vec![],
            vec![ScalarQuadraticTerm::new(1.0, x, x)],
            0.0,
        );
        let affine = ObjectiveFunction::<ScalarAffineFunction<f64>>::new();
        assert_eq!(affine.objective_representable(&quadratic, 1e-9), Some(false));
        let as_quadratic = ObjectiveFunction::<ScalarQuadraticFunction<f64>>::new();
        assert_eq!(as_quadratic.objective_representable(&quadratic, 1e-9), Some(true));
        assert_eq!(NumberOfVariables.objective_representable(&quadratic, 1e-9), None);
    }

    #[test]
    fn generic_attribute_debug() {
        assert_eq!(
            format!("{:?}", NumberOfConstraints::<SingleVariable, LessThan<f64>>::new()),
            "NumberOfConstraints<SingleVariable, LessThan>"
        );
        assert_eq!(
            format!("{:?}", ObjectiveFunction::<ScalarAffineFunction<f64>>::new()),
            "ObjectiveFunction<ScalarAffineFunction>"
        );
    }
}
