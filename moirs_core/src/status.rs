//! Enumerations used as attribute values
//!
//! A backend maps its native statuses onto these codes; the protocol doesn't interpret them
//! any further. Variants are ordered by declaration.
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Sense of the objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptimizationSense {
    /// The objective should be minimized
    Min,
    /// The objective should be maximized
    Max,
    /// There is no objective, any feasible point is acceptable
    Feasibility,
}

impl OptimizationSense {
    pub fn as_str(self) -> &'static str {
        match self {
            OptimizationSense::Min => "min",
            OptimizationSense::Max => "max",
            OptimizationSense::Feasibility => "feasibility",
        }
    }
}

/// Status of a variable or constraint relative to a basic solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BasisStatusCode {
    /// In the basis
    Basic,
    /// Not in the basis
    Nonbasic,
    /// Not in the basis, at its lower bound
    NonbasicAtLower,
    /// Not in the basis, at its upper bound
    NonbasicAtUpper,
    /// Not in the basis, but strictly between its bounds
    SuperBasic,
}

impl BasisStatusCode {
    pub fn as_str(self) -> &'static str {
        match self {
            BasisStatusCode::Basic => "basic",
            BasisStatusCode::Nonbasic => "nonbasic",
            BasisStatusCode::NonbasicAtLower => "nonbasic_at_lower",
            BasisStatusCode::NonbasicAtUpper => "nonbasic_at_upper",
            BasisStatusCode::SuperBasic => "super_basic",
        }
    }
}

/// Why the solver stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TerminationStatusCode {
    // region OK
    /// The algorithm ran successfully and has a result
    Success,
    /// The algorithm concluded the problem is infeasible but has no certificate
    InfeasibleNoResult,
    /// The algorithm concluded the problem is unbounded but has no certificate
    UnboundedNoResult,
    /// The algorithm stopped because the problem is either infeasible or unbounded
    InfeasibleOrUnbounded,
    // endregion OK

    // region Limits
    /// Iteration limit reached
    IterationLimit,
    /// Time limit reached
    TimeLimit,
    /// Branch and bound node limit reached
    NodeLimit,
    /// Limit on the number of solutions found reached
    SolutionLimit,
    /// Ran out of memory
    MemoryLimit,
    /// Objective reached a user supplied limit
    ObjectiveLimit,
    /// Norm of an iterate became too large
    NormLimit,
    /// Some other limit was reached
    OtherLimit,
    // endregion Limits

    // region Problematic
    /// The algorithm stopped because it was unable to continue making progress
    SlowProgress,
    /// The algorithm reached a result within relaxed tolerances
    AlmostSuccess,
    /// A numerical error occurred
    NumericalError,
    /// The solver instance was invalid
    InvalidSolverInstance,
    /// An option was invalid
    InvalidOption,
    /// The solve was interrupted by the user
    Interrupted,
    /// Some other error
    OtherError,
    // endregion Problematic
}

/// Groups of termination statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminationCategory {
    /// The solver stopped normally
    Normal,
    /// The solver stopped because a limit was reached
    Limit,
    /// The solver ran into trouble
    Problematic,
}

impl TerminationStatusCode {
    /// Which group the status belongs to
    pub fn category(self) -> TerminationCategory {
        use TerminationStatusCode::*;
        match self {
            Success | InfeasibleNoResult | UnboundedNoResult | InfeasibleOrUnbounded => {
                TerminationCategory::Normal
            }
            IterationLimit | TimeLimit | NodeLimit | SolutionLimit | MemoryLimit
            | ObjectiveLimit | NormLimit | OtherLimit => TerminationCategory::Limit,
            SlowProgress | AlmostSuccess | NumericalError | InvalidSolverInstance
            | InvalidOption | Interrupted | OtherError => TerminationCategory::Problematic,
        }
    }

    /// Check if the solver hit a limit
    pub fn is_limit(self) -> bool {
        self.category() == TerminationCategory::Limit
    }

    pub fn as_str(self) -> &'static str {
        use TerminationStatusCode::*;
        match self {
            Success => "success",
            InfeasibleNoResult => "infeasible_no_result",
            UnboundedNoResult => "unbounded_no_result",
            InfeasibleOrUnbounded => "infeasible_or_unbounded",
            IterationLimit => "iteration_limit",
            TimeLimit => "time_limit",
            NodeLimit => "node_limit",
            SolutionLimit => "solution_limit",
            MemoryLimit => "memory_limit",
            ObjectiveLimit => "objective_limit",
            NormLimit => "norm_limit",
            OtherLimit => "other_limit",
            SlowProgress => "slow_progress",
            AlmostSuccess => "almost_success",
            NumericalError => "numerical_error",
            InvalidSolverInstance => "invalid_solver_instance",
            InvalidOption => "invalid_option",
            Interrupted => "interrupted",
            OtherError => "other_error",
        }
    }
}

/// What a primal or dual result represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResultStatusCode {
    /// A feasible point
    FeasiblePoint,
    /// A point feasible within relaxed tolerances
    NearlyFeasiblePoint,
    /// An infeasible point
    InfeasiblePoint,
    /// A certificate of infeasibility (of the other problem, primal or dual)
    InfeasibilityCertificate,
    /// A certificate of infeasibility within relaxed tolerances
    NearlyInfeasibilityCertificate,
    /// A certificate of an ill-posed problem
    ReductionCertificate,
    /// A certificate of an ill-posed problem within relaxed tolerances
    NearlyReductionCertificate,
    /// The solver doesn't know what the result is
    UnknownResultStatus,
    /// Something else
    OtherResultStatus,
}

impl ResultStatusCode {
    /// Check if the result is a certificate rather than a point
    pub fn is_certificate(self) -> bool {
        matches!(
            self,
            ResultStatusCode::InfeasibilityCertificate
                | ResultStatusCode::NearlyInfeasibilityCertificate
                | ResultStatusCode::ReductionCertificate
                | ResultStatusCode::NearlyReductionCertificate
        )
    }

    pub fn as_str(self) -> &'static str {
        use ResultStatusCode::*;
        match self {
            FeasiblePoint => "feasible_point",
            NearlyFeasiblePoint => "nearly_feasible_point",
            InfeasiblePoint => "infeasible_point",
            InfeasibilityCertificate => "infeasibility_certificate",
            NearlyInfeasibilityCertificate => "nearly_infeasibility_certificate",
            ReductionCertificate => "reduction_certificate",
            NearlyReductionCertificate => "nearly_reduction_certificate",
            UnknownResultStatus => "unknown_result_status",
            OtherResultStatus => "other_result_status",
        }
    }
}

macro_rules! display_as_str {
    ($($name:ident),*) => {
        $(
            impl Display for $name {
                fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.as_str())
                }
            }
        )*
    };
}

display_as_str!(
    OptimizationSense,
    BasisStatusCode,
    TerminationStatusCode,
    ResultStatusCode
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn termination_categories() {
        assert_eq!(
            TerminationStatusCode::Success.category(),
            TerminationCategory::Normal
        );
        assert_eq!(
            TerminationStatusCode::InfeasibleOrUnbounded.category(),
            TerminationCategory::Normal
        );
        assert!(TerminationStatusCode::TimeLimit.is_limit());
        assert!(TerminationStatusCode::OtherLimit.is_limit());
        assert!(!TerminationStatusCode::AlmostSuccess.is_limit());
        assert_eq!(
            TerminationStatusCode::Interrupted.category(),
            TerminationCategory::Problematic
        );
    }

    #[test]
    fn ordered_by_declaration() {
        assert!(TerminationStatusCode::Success < TerminationStatusCode::IterationLimit);
        assert!(ResultStatusCode::FeasiblePoint < ResultStatusCode::OtherResultStatus);
        assert!(BasisStatusCode::Basic < BasisStatusCode::SuperBasic);
    }

    #[test]
    fn certificates() {
        assert!(ResultStatusCode::InfeasibilityCertificate.is_certificate());
        assert!(!ResultStatusCode::FeasiblePoint.is_certificate());
        assert!(!ResultStatusCode::UnknownResultStatus.is_certificate());
    }

    #[test]
    fn serde_uses_variant_names() {
        let json = serde_json::to_string(&TerminationStatusCode::TimeLimit).unwrap();
        assert_eq!(json, "\"TimeLimit\"");
        let sense: OptimizationSense = serde_json::from_str("\"Feasibility\"").unwrap();
        assert_eq!(sense, OptimizationSense::Feasibility);
    }

    #[test]
    fn display() {
        assert_eq!(ResultStatusCode::NearlyFeasiblePoint.to_string(), "nearly_feasible_point");
        assert_eq!(OptimizationSense::Max.to_string(), "max");
    }
}
