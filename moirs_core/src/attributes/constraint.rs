//! Constraint attributes
//!
//! Only scalar constraints are covered, so primal and dual values are single floats.
use crate::attributes::{Attribute, AttributeFamily, ConstraintAttribute};
use crate::functions::{Function, Set};
use crate::status::BasisStatusCode;

constraint_attribute!(
    /// Name of a constraint, unique among the constraints of every type in an instance
    ConstraintName => String
);

constraint_attribute!(
    /// Initial guess for the value of the constraint function
    ConstraintPrimalStart => f64
);

constraint_attribute!(
    /// Initial guess for the dual value of a constraint
    ConstraintDualStart => f64
);

constraint_attribute!(
    /// Value of the constraint function in a result
    ConstraintPrimal(result_index) => f64
);

constraint_attribute!(
    /// Dual value of a constraint in a result
    ConstraintDual(result_index) => f64
);

constraint_attribute!(ConstraintBasisStatus => BasisStatusCode);

/// The function of a constraint, an `F` for an `F`-in-`S` constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConstraintFunction;

impl Attribute for ConstraintFunction {
    const FAMILY: AttributeFamily = AttributeFamily::ConstraintAttribute;
    const NAME: &'static str = "ConstraintFunction";
}

impl ConstraintAttribute for ConstraintFunction {
    type Value<F: Function, S: Set> = F;
}

/// The set of a constraint, an `S` for an `F`-in-`S` constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConstraintSet;

impl Attribute for ConstraintSet {
    const FAMILY: AttributeFamily = AttributeFamily::ConstraintAttribute;
    const NAME: &'static str = "ConstraintSet";
}

impl ConstraintAttribute for ConstraintSet {
    type Value<F: Function, S: Set> = S;
}
