//! Scalar functions: single variables, affine and quadratic functions
use std::fmt::{Display, Formatter};

use indexmap::IndexMap;

use crate::functions::{Coefficient, ConversionError, Function, ScalarFunction};
use crate::index::VariableIndex;

/// The function `x` for a single variable `x`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SingleVariable {
    /// The variable
    pub variable: VariableIndex,
}

impl SingleVariable {
    /// Create a new single variable function
    pub fn new(variable: VariableIndex) -> Self {
        Self { variable }
    }
}

impl Function for SingleVariable {
    const NAME: &'static str = "SingleVariable";
}

/// A function converts to a single variable when it has one term whose coefficient is within
/// `tolerance` of 1 and a constant within `tolerance` of 0. The conversion then drops that
/// residue, as narrowing a coefficient to an integer does. A tolerance of 0 requires an exact
/// unit coefficient.
impl ScalarFunction for SingleVariable {
    fn to_quadratic(&self) -> ScalarQuadraticFunction<f64> {
        ScalarQuadraticFunction::new(vec![ScalarAffineTerm::new(1.0, self.variable)], vec![], 0.0)
    }

    fn from_quadratic(
        function: &ScalarQuadraticFunction<f64>,
        tolerance: f64,
    ) -> Result<Self, ConversionError> {
        check_no_quadratic_terms(function)?;
        let terms = combine_affine_terms(&function.affine_terms);
        match terms.as_slice() {
            [(variable, coefficient)]
                if (coefficient - 1.0).abs() <= tolerance
                    && function.constant.abs() <= tolerance =>
            {
                Ok(SingleVariable::new(*variable))
            }
            _ => Err(ConversionError::NotSingleVariable),
        }
    }
}

impl Display for SingleVariable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.variable.value())
    }
}

/// A term `coefficient * variable`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarAffineTerm<T> {
    /// Coefficient multiplying the variable
    pub coefficient: T,
    /// The variable
    pub variable: VariableIndex,
}

impl<T> ScalarAffineTerm<T> {
    /// Create a new affine term
    pub fn new(coefficient: T, variable: VariableIndex) -> Self {
        Self {
            coefficient,
            variable,
        }
    }
}

impl<T: Display> Display for ScalarAffineTerm<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}*x{}", self.coefficient, self.variable.value())
    }
}

/// The function `sum(terms) + constant`
///
/// Variables may be repeated, repeated terms are summed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarAffineFunction<T> {
    /// Affine terms
    pub terms: Vec<ScalarAffineTerm<T>>,
    /// Constant offset
    pub constant: T,
}

impl<T: Coefficient> ScalarAffineFunction<T> {
    /// Create a new affine function
    pub fn new(terms: Vec<ScalarAffineTerm<T>>, constant: T) -> Self {
        Self { terms, constant }
    }

    /// Create a new affine function from (coefficient, variable) pairs
    ///
    /// # Examples
    /// ```rust
    /// use moirs_core::functions::ScalarAffineFunction;
    /// use moirs_core::index::VariableIndex;
    /// let x = VariableIndex::new(1);
    /// let y = VariableIndex::new(2);
    /// // Represents 3*x + 2*y + 1
    /// let function = ScalarAffineFunction::from_terms(&[(3.0, x), (2.0, y)], 1.0);
    /// assert_eq!(function.to_string(), "3*x1 + 2*x2 + 1");
    /// ```
    pub fn from_terms(terms: &[(T, VariableIndex)], constant: T) -> Self {
        Self {
            terms: terms
                .iter()
                .map(|(coefficient, variable)| ScalarAffineTerm::new(*coefficient, *variable))
                .collect(),
            constant,
        }
    }
}

impl<T: Coefficient> Function for ScalarAffineFunction<T> {
    const NAME: &'static str = "ScalarAffineFunction";
}

impl<T: Coefficient> ScalarFunction for ScalarAffineFunction<T> {
    fn to_quadratic(&self) -> ScalarQuadraticFunction<f64> {
        ScalarQuadraticFunction::new(widen_affine_terms(&self.terms), vec![], self.constant.to_f64())
    }

    fn from_quadratic(
        function: &ScalarQuadraticFunction<f64>,
        tolerance: f64,
    ) -> Result<Self, ConversionError> {
        check_no_quadratic_terms(function)?;
        let terms = combine_affine_terms(&function.affine_terms)
            .into_iter()
            .map(|(variable, coefficient)| {
                Ok(ScalarAffineTerm::new(
                    narrow(coefficient, tolerance)?,
                    variable,
                ))
            })
            .collect::<Result<Vec<_>, ConversionError>>()?;
        Ok(Self::new(terms, narrow(function.constant, tolerance)?))
    }
}

impl<T: Display> Display for ScalarAffineFunction<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for term in &self.terms {
            write!(f, "{} + ", term)?;
        }
        write!(f, "{}", self.constant)
    }
}

/// A term `coefficient * variable_1 * variable_2`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarQuadraticTerm<T> {
    /// Coefficient multiplying the product
    pub coefficient: T,
    /// First variable of the product
    pub variable_1: VariableIndex,
    /// Second variable of the product
    pub variable_2: VariableIndex,
}

impl<T> ScalarQuadraticTerm<T> {
    /// Create a new quadratic term
    pub fn new(coefficient: T, variable_1: VariableIndex, variable_2: VariableIndex) -> Self {
        Self {
            coefficient,
            variable_1,
            variable_2,
        }
    }
}

impl<T: Display> Display for ScalarQuadraticTerm<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}*x{}*x{}",
            self.coefficient,
            self.variable_1.value(),
            self.variable_2.value()
        )
    }
}

/// The function `sum(quadratic_terms) + sum(affine_terms) + constant`
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarQuadraticFunction<T> {
    /// Affine terms
    pub affine_terms: Vec<ScalarAffineTerm<T>>,
    /// Quadratic terms, `x*y` and `y*x` are the same product
    pub quadratic_terms: Vec<ScalarQuadraticTerm<T>>,
    /// Constant offset
    pub constant: T,
}

impl<T: Coefficient> ScalarQuadraticFunction<T> {
    /// Create a new quadratic function
    pub fn new(
        affine_terms: Vec<ScalarAffineTerm<T>>,
        quadratic_terms: Vec<ScalarQuadraticTerm<T>>,
        constant: T,
    ) -> Self {
        Self {
            affine_terms,
            quadratic_terms,
            constant,
        }
    }
}

impl<T: Coefficient> Function for ScalarQuadraticFunction<T> {
    const NAME: &'static str = "ScalarQuadraticFunction";
}

impl<T: Coefficient> ScalarFunction for ScalarQuadraticFunction<T> {
    fn to_quadratic(&self) -> ScalarQuadraticFunction<f64> {
        ScalarQuadraticFunction::new(
            widen_affine_terms(&self.affine_terms),
            self.quadratic_terms
                .iter()
                .map(|term| {
                    ScalarQuadraticTerm::new(
                        term.coefficient.to_f64(),
                        term.variable_1,
                        term.variable_2,
                    )
                })
                .collect(),
            self.constant.to_f64(),
        )
    }

    fn from_quadratic(
        function: &ScalarQuadraticFunction<f64>,
        tolerance: f64,
    ) -> Result<Self, ConversionError> {
        let affine_terms = function
            .affine_terms
            .iter()
            .map(|term| Ok(ScalarAffineTerm::new(narrow(term.coefficient, tolerance)?, term.variable)))
            .collect::<Result<Vec<_>, ConversionError>>()?;
        let quadratic_terms = function
            .quadratic_terms
            .iter()
            .map(|term| {
                Ok(ScalarQuadraticTerm::new(
                    narrow(term.coefficient, tolerance)?,
                    term.variable_1,
                    term.variable_2,
                ))
            })
            .collect::<Result<Vec<_>, ConversionError>>()?;
        Ok(Self::new(
            affine_terms,
            quadratic_terms,
            narrow(function.constant, tolerance)?,
        ))
    }
}

impl<T: Display> Display for ScalarQuadraticFunction<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for term in &self.quadratic_terms {
            write!(f, "{} + ", term)?;
        }
        for term in &self.affine_terms {
            write!(f, "{} + ", term)?;
        }
        write!(f, "{}", self.constant)
    }
}

// region Conversion helpers
fn narrow<T: Coefficient>(value: f64, tolerance: f64) -> Result<T, ConversionError> {
    T::from_f64(value, tolerance).ok_or(ConversionError::InexactCoefficient { value })
}

fn widen_affine_terms<T: Coefficient>(terms: &[ScalarAffineTerm<T>]) -> Vec<ScalarAffineTerm<f64>> {
    terms
        .iter()
        .map(|term| ScalarAffineTerm::new(term.coefficient.to_f64(), term.variable))
        .collect()
}

/// Sum repeated variables and drop the terms that cancel out, keeping first-seen order
fn combine_affine_terms(terms: &[ScalarAffineTerm<f64>]) -> Vec<(VariableIndex, f64)> {
    let mut combined: IndexMap<VariableIndex, f64> = IndexMap::new();
    for term in terms {
        *combined.entry(term.variable).or_insert(0.0) += term.coefficient;
    }
    combined
        .into_iter()
        .filter(|(_, coefficient)| *coefficient != 0.0)
        .collect()
}

fn check_no_quadratic_terms(function: &ScalarQuadraticFunction<f64>) -> Result<(), ConversionError> {
    let mut combined: IndexMap<(VariableIndex, VariableIndex), f64> = IndexMap::new();
    for term in &function.quadratic_terms {
        let key = if term.variable_1 <= term.variable_2 {
            (term.variable_1, term.variable_2)
        } else {
            (term.variable_2, term.variable_1)
        };
        *combined.entry(key).or_insert(0.0) += term.coefficient;
    }
    let count = combined.values().filter(|c| **c != 0.0).count();
    if count > 0 {
        return Err(ConversionError::QuadraticTerms { count });
    }
    Ok(())
}
// endregion Conversion helpers
