//! Interfaces for the functions and sets constraints and objectives are built from
//!
//! The protocol only needs to name function and set types (to type constraint indices) and to
//! convert objective functions between equivalent representations. The scalar function and set
//! types here are small reference representations of those interfaces.

mod scalar;
mod sets;

pub use scalar::{
    ScalarAffineFunction, ScalarAffineTerm, ScalarQuadraticFunction, ScalarQuadraticTerm,
    SingleVariable,
};
pub use sets::{EqualTo, GreaterThan, Interval, LessThan};

use std::fmt::{Debug, Display};

use thiserror::Error;

use crate::configuration::current_configuration;
use crate::error::ProtocolError;
use crate::index::TypeTag;

/// A function of the variables of an instance
pub trait Function: Debug + Clone + PartialEq + 'static {
    /// Name used for the function type in messages
    const NAME: &'static str;
}

/// A set that a function is constrained to lie in
pub trait Set: Debug + Clone + PartialEq + 'static {
    /// Name used for the set type in messages
    const NAME: &'static str;
}

/// A function with a single real output, convertible through the canonical quadratic form
///
/// [`ScalarQuadraticFunction<f64>`] is the most general scalar function, so every scalar
/// function can be written as one, and converted back when it is exactly representable.
pub trait ScalarFunction: Function {
    /// Write the function as an equivalent `ScalarQuadraticFunction<f64>`
    fn to_quadratic(&self) -> ScalarQuadraticFunction<f64>;

    /// Build the function from a quadratic function, if it can be represented exactly
    ///
    /// # Parameters
    /// - `function`: The function to convert
    /// - `tolerance`: Absolute tolerance used when rounding coefficients, including the unit
    ///   coefficient and zero constant required by [`SingleVariable`]
    fn from_quadratic(
        function: &ScalarQuadraticFunction<f64>,
        tolerance: f64,
    ) -> Result<Self, ConversionError>;
}

/// Numeric type used for coefficients and constants
pub trait Coefficient: Copy + Debug + Display + PartialEq + 'static {
    /// Widen into an f64
    fn to_f64(self) -> f64;

    /// Narrow from an f64, None if the value can't be represented within `tolerance`
    fn from_f64(value: f64, tolerance: f64) -> Option<Self>;
}

impl Coefficient for f64 {
    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64, _tolerance: f64) -> Option<Self> {
        Some(value)
    }
}

impl Coefficient for i64 {
    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64, tolerance: f64) -> Option<Self> {
        let rounded = value.round();
        if !value.is_finite()
            || (value - rounded).abs() > tolerance
            || rounded < i64::MIN as f64
            // i64::MAX rounds up to 2^63, which is already out of range
            || rounded >= i64::MAX as f64
        {
            return None;
        }
        Some(rounded as i64)
    }
}

/// Reasons a function can't be represented as another function type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// The function has quadratic terms, but the target is affine
    #[error("function has {count} non-zero quadratic terms")]
    QuadraticTerms {
        /// Number of quadratic terms remaining after combining duplicates
        count: usize,
    },
    /// A coefficient can't be represented in the target coefficient type
    #[error("coefficient {value} can't be represented exactly")]
    InexactCoefficient {
        /// The offending value
        value: f64,
    },
    /// The target is a single variable, but the function isn't
    #[error("function is not a single variable with unit coefficient")]
    NotSingleVariable,
}

/// Convert a scalar function into an equivalent function of another type
///
/// The coefficient tolerance is taken from the global configuration.
///
/// # Examples
/// ```rust
/// use moirs_core::functions::{convert_function, ScalarAffineFunction, SingleVariable};
/// use moirs_core::index::VariableIndex;
/// let x = VariableIndex::new(1);
/// let affine: ScalarAffineFunction<f64> = convert_function(&SingleVariable::new(x)).unwrap();
/// assert_eq!(affine, ScalarAffineFunction::from_terms(&[(1.0, x)], 0.0));
/// ```
pub fn convert_function<F: ScalarFunction, G: ScalarFunction>(
    function: &G,
) -> Result<F, ProtocolError> {
    convert_quadratic(TypeTag::of_function::<G>(), &function.to_quadratic())
}

/// Convert a function stored in canonical quadratic form into `F`
///
/// # Parameters
/// - `source`: The type the stored function originally had, used in error messages
/// - `function`: The stored function
pub fn convert_quadratic<F: ScalarFunction>(
    source: TypeTag,
    function: &ScalarQuadraticFunction<f64>,
) -> Result<F, ProtocolError> {
    let tolerance = current_configuration().conversion_tolerance;
    F::from_quadratic(function, tolerance).map_err(|source_error| {
        ProtocolError::ConversionImpossible {
            from: source.name(),
            to: F::NAME,
            source: source_error,
        }
    })
}
