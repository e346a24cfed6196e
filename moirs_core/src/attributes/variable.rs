//! Variable attributes
use crate::status::BasisStatusCode;

variable_attribute!(
    /// Name of a variable, unique among the variables of an instance
    VariableName => String
);

variable_attribute!(
    /// Initial guess for the value of a variable
    VariablePrimalStart => f64
);

variable_attribute!(
    /// Value of a variable in a result
    VariablePrimal(result_index) => f64
);

variable_attribute!(VariableBasisStatus => BasisStatusCode);
