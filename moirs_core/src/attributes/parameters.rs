//! Solver parameters
use crate::attributes::{Attribute, AttributeFamily, InstanceLevel, SolverParameter};

solver_parameter!(
    /// Suppress all output from the solver
    Silent => bool
);

solver_parameter!(
    /// Limit on the solve time in seconds, None for no limit
    TimeLimit => Option<f64>
);

solver_parameter!(
    /// Number of threads the solver may use, None to let the solver decide
    NumberOfThreads => Option<usize>
);

/// A solver specific parameter, identified by its name in the solver
///
/// # Examples
/// ```rust
/// use moirs_core::attributes::RawParameter;
/// let presolve = RawParameter::new("presolve");
/// assert_eq!(presolve.name, "presolve");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawParameter {
    pub name: String,
}

impl RawParameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Attribute for RawParameter {
    const FAMILY: AttributeFamily = AttributeFamily::SolverParameter;
    const NAME: &'static str = "RawParameter";
}

impl InstanceLevel for RawParameter {
    type Value = serde_json::Value;
}

impl SolverParameter for RawParameter {}
