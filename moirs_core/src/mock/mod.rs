//! An in-memory instance that stores everything it is given and never solves anything
//!
//! [`MockInstance`] supports the whole standard attribute vocabulary except
//! [`RawSolver`](crate::attributes::RawSolver). Solve results (termination status, result
//! statuses, primal and dual values, statistics) are settable, so code written against the
//! protocol can be tested by injecting the results a solver would have produced.
//!
//! Variables and constraints are added and deleted with inherent methods, everything else
//! goes through [`InstanceExt`](crate::instance::InstanceExt).
//!
//! # Examples
//! ```rust
//! use moirs_core::attributes::{PrimalStatus, ResultCount, TerminationStatus, VariablePrimal};
//! use moirs_core::instance::InstanceExt;
//! use moirs_core::mock::MockInstance;
//! use moirs_core::status::{ResultStatusCode, TerminationStatusCode};
//!
//! let mut instance = MockInstance::new();
//! let x = instance.add_variable();
//! // Inject what a solver would report
//! instance.set(&TerminationStatus, TerminationStatusCode::Success).unwrap();
//! instance.set(&ResultCount, 1).unwrap();
//! instance.set(&PrimalStatus::default(), ResultStatusCode::FeasiblePoint).unwrap();
//! instance.set_at(&VariablePrimal::default(), x, 2.5).unwrap();
//!
//! assert_eq!(instance.get_at(&VariablePrimal::default(), x).unwrap(), 2.5);
//! ```
mod constraints;

use indexmap::IndexMap;

use crate::attributes::{
    AnyAttribute, AttributeFamily, BarrierIterations, ConstraintBasisStatus, ConstraintDual,
    ConstraintDualStart, ConstraintFunction, ConstraintName, ConstraintPrimal,
    ConstraintPrimalStart, ConstraintSet, DualStatus, ListOfConstraints, ListOfVariableIndices,
    Name, NodeCount, NumberOfThreads, NumberOfVariables, ObjectiveBound, ObjectiveSense,
    ObjectiveValue, PrimalStatus, RawParameter, RelativeGap, ResultCount, Silent,
    SimplexIterations, SolveTime, TerminationStatus, TimeLimit, VariableBasisStatus,
    VariableName, VariablePrimal, VariablePrimalStart,
};
use crate::configuration::current_configuration;
use crate::error::ProtocolError;
use crate::functions::{Function, ScalarAffineFunction, ScalarQuadraticFunction, Set};
use crate::index::{
    AnyConstraintIndex, AnyIndex, ConstraintIndex, ConstraintType, Index, IndexKind, NameTarget,
    TypeTag, VariableIndex,
};
use crate::instance::query::{
    Assignment, BulkAssignment, BulkQuery, IndexedAssignment, IndexedQuery, Query,
};
use crate::instance::Instance;
use crate::status::{BasisStatusCode, OptimizationSense, ResultStatusCode, TerminationStatusCode};
use constraints::{ConstraintTable, Table};

pub(crate) const KIND: &str = "MockInstance";

/// Largest [`ResultCount`] the mock accepts, every result slot is allocated up front
pub const MAX_RESULT_COUNT: usize = 1024;

// region Local macros
macro_rules! is_one_of {
    ($attribute:expr, $($kind:ty),+ $(,)?) => {
        $($attribute.is::<$kind>())||+
    };
}

/// Reply with the value for whichever listed attribute the query is for
macro_rules! answer {
    ($query:ident, $($kind:ty => $value:expr),+ $(,)?) => {
        $(
            if $query.downcast::<$kind>().is_some() {
                return $query.reply::<$kind>($value);
            }
        )+
    };
}

/// Store the value of whichever listed attribute the assignment is for
macro_rules! store {
    ($assignment:ident, $($kind:ty => $place:expr),+ $(,)?) => {
        $(
            if let Some((_, value)) = $assignment.take::<$kind>() {
                $place = value.into();
                return Ok(());
            }
        )+
    };
}
// endregion Local macros

#[derive(Debug, Clone, Default)]
struct VariableRecord {
    // Empty when unnamed
    name: String,
    primal_start: Option<f64>,
    basis_status: Option<BasisStatusCode>,
}

#[derive(Debug, Clone, Default)]
struct ConstraintRecord {
    name: String,
    primal_start: Option<f64>,
    dual_start: Option<f64>,
    basis_status: Option<BasisStatusCode>,
}

/// One primal/dual result of a solve
#[derive(Debug, Clone, Default)]
struct ResultRecord {
    objective_value: Option<f64>,
    primal_status: Option<ResultStatusCode>,
    dual_status: Option<ResultStatusCode>,
    variable_primal: IndexMap<VariableIndex, f64>,
    constraint_primal: IndexMap<AnyConstraintIndex, f64>,
    constraint_dual: IndexMap<AnyConstraintIndex, f64>,
}

#[derive(Debug, Clone, Default)]
struct Parameters {
    silent: bool,
    time_limit: Option<f64>,
    number_of_threads: Option<usize>,
    raw: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
struct SolveStatistics {
    termination_status: Option<TerminationStatusCode>,
    objective_bound: Option<f64>,
    relative_gap: Option<f64>,
    solve_time: Option<f64>,
    simplex_iterations: Option<u64>,
    barrier_iterations: Option<u64>,
    node_count: Option<u64>,
}

/// The objective in canonical form, with the type it was set as
#[derive(Debug, Clone)]
struct StoredObjective {
    source: TypeTag,
    function: ScalarQuadraticFunction<f64>,
}

impl Default for StoredObjective {
    fn default() -> Self {
        StoredObjective {
            source: TypeTag::of_function::<ScalarAffineFunction<f64>>(),
            function: ScalarQuadraticFunction::new(vec![], vec![], 0.0),
        }
    }
}

/// In-memory instance, see the [module documentation](self)
#[derive(Debug)]
pub struct MockInstance {
    name: String,
    sense: OptimizationSense,
    objective: StoredObjective,
    parameters: Parameters,
    next_variable: u64,
    next_constraint: u64,
    variables: IndexMap<VariableIndex, VariableRecord>,
    tables: IndexMap<ConstraintType, Box<dyn ConstraintTable>>,
    constraints: IndexMap<AnyConstraintIndex, ConstraintRecord>,
    variable_names: IndexMap<String, VariableIndex>,
    constraint_names: IndexMap<String, AnyConstraintIndex>,
    statistics: SolveStatistics,
    results: Vec<ResultRecord>,
}

impl Default for MockInstance {
    fn default() -> Self {
        Self::new()
    }
}

impl MockInstance {
    /// Create an empty instance with a zero objective and no results
    pub fn new() -> Self {
        MockInstance {
            name: String::new(),
            sense: OptimizationSense::Feasibility,
            objective: StoredObjective::default(),
            parameters: Parameters::default(),
            next_variable: 1,
            next_constraint: 1,
            variables: IndexMap::new(),
            tables: IndexMap::new(),
            constraints: IndexMap::new(),
            variable_names: IndexMap::new(),
            constraint_names: IndexMap::new(),
            statistics: SolveStatistics::default(),
            results: Vec::new(),
        }
    }

    // region Construction
    /// Add a variable
    pub fn add_variable(&mut self) -> VariableIndex {
        let index = VariableIndex::new(self.next_variable);
        self.next_variable += 1;
        self.variables.insert(index, VariableRecord::default());
        tracing::trace!(component = "mock", operation = "add_variable", index = %index);
        index
    }

    /// Add `count` variables
    pub fn add_variables(&mut self, count: usize) -> Vec<VariableIndex> {
        (0..count).map(|_| self.add_variable()).collect()
    }

    /// Add the constraint `function`-in-`set`
    ///
    /// # Examples
    /// ```rust
    /// use moirs_core::attributes::{ConstraintSet, NumberOfConstraints};
    /// use moirs_core::functions::{LessThan, ScalarAffineFunction};
    /// use moirs_core::instance::InstanceExt;
    /// use moirs_core::mock::MockInstance;
    ///
    /// let mut instance = MockInstance::new();
    /// let x = instance.add_variable();
    /// let c = instance.add_constraint(
    ///     ScalarAffineFunction::from_terms(&[(1.0, x)], 0.0),
    ///     LessThan::new(4.0),
    /// );
    /// assert_eq!(instance.get_at(&ConstraintSet, c).unwrap(), LessThan::new(4.0));
    /// let count = NumberOfConstraints::<ScalarAffineFunction<f64>, LessThan<f64>>::new();
    /// assert_eq!(instance.get(&count).unwrap(), 1);
    /// ```
    pub fn add_constraint<F: Function, S: Set>(&mut self, function: F, set: S) -> ConstraintIndex<F, S> {
        let index = ConstraintIndex::<F, S>::new(self.next_constraint);
        self.next_constraint += 1;
        let table = self
            .tables
            .entry(ConstraintType::of::<F, S>())
            .or_insert_with(|| Box::new(Table::<F, S>::new()));
        let Some(table) = table.as_any_mut().downcast_mut::<Table<F, S>>() else {
            unreachable!("constraint tables are keyed by their own constraint type")
        };
        table.insert(index.value(), function, set);
        self.constraints
            .insert(index.erase(), ConstraintRecord::default());
        tracing::trace!(component = "mock", operation = "add_constraint", index = ?index);
        index
    }

    /// Delete a variable, its index is invalid afterwards
    ///
    /// Constraints whose functions mention the variable are left as they are.
    pub fn delete_variable(&mut self, index: VariableIndex) -> Result<(), ProtocolError> {
        let Some(record) = self.variables.shift_remove(&index) else {
            return Err(not_found(AnyIndex::Variable(index)));
        };
        if !record.name.is_empty() {
            self.variable_names.shift_remove(&record.name);
        }
        for result in &mut self.results {
            result.variable_primal.shift_remove(&index);
        }
        tracing::trace!(component = "mock", operation = "delete_variable", index = %index);
        Ok(())
    }

    /// Delete a constraint, its index is invalid afterwards
    pub fn delete_constraint<F: Function, S: Set>(
        &mut self,
        index: ConstraintIndex<F, S>,
    ) -> Result<(), ProtocolError> {
        let index = index.erase();
        let Some(record) = self.constraints.shift_remove(&index) else {
            return Err(not_found(AnyIndex::Constraint(index)));
        };
        if let Some(table) = self.tables.get_mut(&index.constraint_type()) {
            table.remove(index.value());
        }
        if !record.name.is_empty() {
            self.constraint_names.shift_remove(&record.name);
        }
        for result in &mut self.results {
            result.constraint_primal.shift_remove(&index);
            result.constraint_dual.shift_remove(&index);
        }
        tracing::trace!(component = "mock", operation = "delete_constraint", index = %index);
        Ok(())
    }

    /// Check if an index refers to a variable or constraint of this instance
    pub fn is_valid<X: Index>(&self, index: X) -> bool {
        match index.to_any() {
            AnyIndex::Variable(index) => self.variables.contains_key(&index),
            AnyIndex::Constraint(index) => self.constraints.contains_key(&index),
        }
    }
    // endregion Construction

    // region Helpers
    fn result(&self, result_index: usize) -> Result<&ResultRecord, ProtocolError> {
        result_index
            .checked_sub(1)
            .and_then(|position| self.results.get(position))
            .ok_or(ProtocolError::InvalidResultIndex {
                index: result_index,
                result_count: self.results.len(),
            })
    }

    fn result_mut(&mut self, result_index: usize) -> Result<&mut ResultRecord, ProtocolError> {
        let result_count = self.results.len();
        result_index
            .checked_sub(1)
            .and_then(|position| self.results.get_mut(position))
            .ok_or(ProtocolError::InvalidResultIndex {
                index: result_index,
                result_count,
            })
    }

    fn has_result(&self, result_index: usize) -> bool {
        self.result(result_index).is_ok()
    }

    /// Constraint indices of one type, in the order they were added
    fn constraints_of(
        &self,
        constraint_type: ConstraintType,
    ) -> impl Iterator<Item = (&AnyConstraintIndex, &ConstraintRecord)> {
        self.constraints
            .iter()
            .filter(move |(index, _)| index.constraint_type() == constraint_type)
    }

    fn rename_variable(&mut self, index: VariableIndex, name: String) -> Result<(), ProtocolError> {
        if let Some(existing) = self.variable_names.get(&name) {
            if *existing != index {
                return Err(ProtocolError::DuplicateName {
                    target: NameTarget::Variable,
                    name,
                });
            }
        }
        let Some(record) = self.variables.get_mut(&index) else {
            return Err(not_found(AnyIndex::Variable(index)));
        };
        let previous = std::mem::replace(&mut record.name, name.clone());
        if !previous.is_empty() {
            self.variable_names.shift_remove(&previous);
        }
        if !name.is_empty() {
            self.variable_names.insert(name, index);
        }
        Ok(())
    }

    fn rename_constraint(
        &mut self,
        index: AnyConstraintIndex,
        name: String,
    ) -> Result<(), ProtocolError> {
        if let Some(existing) = self.constraint_names.get(&name) {
            if *existing != index {
                return Err(ProtocolError::DuplicateName {
                    target: NameTarget::AnyConstraint,
                    name,
                });
            }
        }
        let Some(record) = self.constraints.get_mut(&index) else {
            return Err(not_found(AnyIndex::Constraint(index)));
        };
        let previous = std::mem::replace(&mut record.name, name.clone());
        if !previous.is_empty() {
            self.constraint_names.shift_remove(&previous);
        }
        if !name.is_empty() {
            self.constraint_names.insert(name, index);
        }
        Ok(())
    }
    // endregion Helpers

    // region Dispatch
    fn assign(&mut self, mut assignment: Assignment<'_>) -> Result<(), ProtocolError> {
        store!(
            assignment,
            Silent => self.parameters.silent,
            TimeLimit => self.parameters.time_limit,
            NumberOfThreads => self.parameters.number_of_threads,
            Name => self.name,
            ObjectiveSense => self.sense,
            TerminationStatus => self.statistics.termination_status,
            ObjectiveBound => self.statistics.objective_bound,
            RelativeGap => self.statistics.relative_gap,
            SolveTime => self.statistics.solve_time,
            SimplexIterations => self.statistics.simplex_iterations,
            BarrierIterations => self.statistics.barrier_iterations,
            NodeCount => self.statistics.node_count,
        );
        if let Some((parameter, value)) = assignment.take::<RawParameter>() {
            self.parameters.raw.insert(parameter.name.clone(), value);
            return Ok(());
        }
        if let Some((attribute, count)) = assignment.take::<ResultCount>() {
            if count > MAX_RESULT_COUNT {
                return Err(ProtocolError::InvalidValue {
                    attribute: format!("{:?}", attribute),
                    reason: format!("at most {} results can be stored", MAX_RESULT_COUNT),
                    instance: KIND.to_string(),
                });
            }
            // Existing results survive, results past the new count are dropped
            self.results.resize_with(count, ResultRecord::default);
            return Ok(());
        }
        if let Some((attribute, value)) = assignment.take::<ObjectiveValue>() {
            self.result_mut(attribute.result_index)?.objective_value = Some(value);
            return Ok(());
        }
        if let Some((attribute, value)) = assignment.take::<PrimalStatus>() {
            self.result_mut(attribute.result_index)?.primal_status = Some(value);
            return Ok(());
        }
        if let Some((attribute, value)) = assignment.take::<DualStatus>() {
            self.result_mut(attribute.result_index)?.dual_status = Some(value);
            return Ok(());
        }
        if let Some((source, function)) = assignment.take_objective() {
            self.objective = StoredObjective { source, function };
            return Ok(());
        }
        Err(assignment.unsupported(KIND))
    }

    fn assign_variable(
        &mut self,
        index: VariableIndex,
        mut assignment: IndexedAssignment<'_>,
    ) -> Result<(), ProtocolError> {
        if !self.variables.contains_key(&index) {
            return Err(assignment.not_found(KIND));
        }
        if let Some((_, index, name)) = assignment.take_variable::<VariableName>() {
            return self.rename_variable(index, name);
        }
        if let Some((attribute, index, value)) = assignment.take_variable::<VariablePrimal>() {
            self.result_mut(attribute.result_index)?
                .variable_primal
                .insert(index, value);
            return Ok(());
        }
        let Some(record) = self.variables.get_mut(&index) else {
            return Err(assignment.not_found(KIND));
        };
        if let Some((_, _, value)) = assignment.take_variable::<VariablePrimalStart>() {
            record.primal_start = Some(value);
            return Ok(());
        }
        if let Some((_, _, value)) = assignment.take_variable::<VariableBasisStatus>() {
            record.basis_status = Some(value);
            return Ok(());
        }
        Err(assignment.unsupported(KIND))
    }

    fn assign_constraint(
        &mut self,
        index: AnyConstraintIndex,
        mut assignment: IndexedAssignment<'_>,
    ) -> Result<(), ProtocolError> {
        if let Some((_, index, name)) = assignment.take_uniform::<ConstraintName>() {
            return self.rename_constraint(index, name);
        }
        if let Some((attribute, index, value)) = assignment.take_uniform::<ConstraintPrimal>() {
            self.result_mut(attribute.result_index)?
                .constraint_primal
                .insert(index, value);
            return Ok(());
        }
        if let Some((attribute, index, value)) = assignment.take_uniform::<ConstraintDual>() {
            self.result_mut(attribute.result_index)?
                .constraint_dual
                .insert(index, value);
            return Ok(());
        }
        if let Some(res) = self
            .tables
            .get_mut(&index.constraint_type())
            .and_then(|table| table.write_at(&mut assignment))
        {
            return res;
        }
        let Some(record) = self.constraints.get_mut(&index) else {
            return Err(assignment.not_found(KIND));
        };
        if let Some((_, _, value)) = assignment.take_uniform::<ConstraintPrimalStart>() {
            record.primal_start = Some(value);
            return Ok(());
        }
        if let Some((_, _, value)) = assignment.take_uniform::<ConstraintDualStart>() {
            record.dual_start = Some(value);
            return Ok(());
        }
        if let Some((_, _, value)) = assignment.take_uniform::<ConstraintBasisStatus>() {
            record.basis_status = Some(value);
            return Ok(());
        }
        Err(assignment.unsupported(KIND))
    }

    fn read_variable(
        &self,
        index: VariableIndex,
        mut query: IndexedQuery<'_>,
    ) -> Result<(), ProtocolError> {
        let attribute = query.attribute();
        let Some(record) = self.variables.get(&index) else {
            return Err(query.not_found(KIND));
        };
        if query.downcast::<VariableName>().is_some() {
            return query.reply_variable::<VariableName>(record.name.clone());
        }
        if query.downcast::<VariablePrimalStart>().is_some() {
            return query.reply_variable::<VariablePrimalStart>(present(record.primal_start, attribute)?);
        }
        if query.downcast::<VariableBasisStatus>().is_some() {
            return query.reply_variable::<VariableBasisStatus>(present(record.basis_status, attribute)?);
        }
        if let Some(primal) = query.downcast::<VariablePrimal>() {
            let value = self
                .result(primal.result_index)?
                .variable_primal
                .get(&index)
                .copied();
            return query.reply_variable::<VariablePrimal>(present(value, attribute)?);
        }
        Err(query.unsupported(KIND))
    }

    fn read_constraint(
        &self,
        index: AnyConstraintIndex,
        mut query: IndexedQuery<'_>,
    ) -> Result<(), ProtocolError> {
        let attribute = query.attribute();
        let Some(record) = self.constraints.get(&index) else {
            return Err(query.not_found(KIND));
        };
        if query.downcast::<ConstraintName>().is_some() {
            return query.reply_uniform::<ConstraintName>(record.name.clone());
        }
        if query.downcast::<ConstraintPrimalStart>().is_some() {
            return query.reply_uniform::<ConstraintPrimalStart>(present(record.primal_start, attribute)?);
        }
        if query.downcast::<ConstraintDualStart>().is_some() {
            return query.reply_uniform::<ConstraintDualStart>(present(record.dual_start, attribute)?);
        }
        if query.downcast::<ConstraintBasisStatus>().is_some() {
            return query.reply_uniform::<ConstraintBasisStatus>(present(record.basis_status, attribute)?);
        }
        if let Some(primal) = query.downcast::<ConstraintPrimal>() {
            let value = self
                .result(primal.result_index)?
                .constraint_primal
                .get(&index)
                .copied();
            return query.reply_uniform::<ConstraintPrimal>(present(value, attribute)?);
        }
        if let Some(dual) = query.downcast::<ConstraintDual>() {
            let value = self
                .result(dual.result_index)?
                .constraint_dual
                .get(&index)
                .copied();
            return query.reply_uniform::<ConstraintDual>(present(value, attribute)?);
        }
        if let Some(table) = self.tables.get(&index.constraint_type()) {
            if let Some(res) = table.read_at(&mut query) {
                return res;
            }
        }
        Err(query.unsupported(KIND))
    }
    // endregion Dispatch
}

impl Instance for MockInstance {
    fn kind(&self) -> &str {
        KIND
    }

    // region Capability predicates
    fn supports_attribute(&self, attribute: &dyn AnyAttribute) -> bool {
        is_instance_level(attribute)
            || is_variable_attribute(attribute)
            || is_constraint_attribute(attribute)
    }

    fn supports_attribute_for(&self, attribute: &dyn AnyAttribute, kind: IndexKind) -> bool {
        match kind {
            IndexKind::Variable => is_variable_attribute(attribute),
            IndexKind::Constraint(_) => is_constraint_attribute(attribute),
        }
    }

    fn can_get_attribute(&self, attribute: &dyn AnyAttribute) -> bool {
        if is_objective_function(attribute) {
            let tolerance = current_configuration().conversion_tolerance;
            return attribute
                .represents_objective(&self.objective.function, tolerance)
                .unwrap_or(false);
        }
        if let Some(parameter) = attribute.downcast_ref::<RawParameter>() {
            return self.parameters.raw.contains_key(&parameter.name);
        }
        if let Some(value) = attribute.downcast_ref::<ObjectiveValue>() {
            return self
                .result(value.result_index)
                .is_ok_and(|result| result.objective_value.is_some());
        }
        if let Some(status) = attribute.downcast_ref::<PrimalStatus>() {
            return self
                .result(status.result_index)
                .is_ok_and(|result| result.primal_status.is_some());
        }
        if let Some(status) = attribute.downcast_ref::<DualStatus>() {
            return self
                .result(status.result_index)
                .is_ok_and(|result| result.dual_status.is_some());
        }
        let statistics = &self.statistics;
        if attribute.is::<TerminationStatus>() {
            return statistics.termination_status.is_some();
        }
        if attribute.is::<ObjectiveBound>() {
            return statistics.objective_bound.is_some();
        }
        if attribute.is::<RelativeGap>() {
            return statistics.relative_gap.is_some();
        }
        if attribute.is::<SolveTime>() {
            return statistics.solve_time.is_some();
        }
        if attribute.is::<SimplexIterations>() {
            return statistics.simplex_iterations.is_some();
        }
        if attribute.is::<BarrierIterations>() {
            return statistics.barrier_iterations.is_some();
        }
        if attribute.is::<NodeCount>() {
            return statistics.node_count.is_some();
        }
        is_instance_level(attribute)
    }

    fn can_get_attribute_for(&self, attribute: &dyn AnyAttribute, kind: IndexKind) -> bool {
        match kind {
            IndexKind::Variable => {
                if self.variables.is_empty() {
                    return false;
                }
                let mut records = self.variables.values();
                if attribute.is::<VariableName>() {
                    true
                } else if attribute.is::<VariablePrimalStart>() {
                    records.all(|record| record.primal_start.is_some())
                } else if attribute.is::<VariableBasisStatus>() {
                    records.all(|record| record.basis_status.is_some())
                } else if let Some(primal) = attribute.downcast_ref::<VariablePrimal>() {
                    self.result(primal.result_index).is_ok_and(|result| {
                        self.variables
                            .keys()
                            .all(|index| result.variable_primal.contains_key(index))
                    })
                } else {
                    false
                }
            }
            IndexKind::Constraint(constraint_type) => {
                if self.constraints_of(constraint_type).next().is_none() {
                    return false;
                }
                let mut records = self.constraints_of(constraint_type);
                if is_one_of!(attribute, ConstraintName, ConstraintFunction, ConstraintSet) {
                    true
                } else if attribute.is::<ConstraintPrimalStart>() {
                    records.all(|(_, record)| record.primal_start.is_some())
                } else if attribute.is::<ConstraintDualStart>() {
                    records.all(|(_, record)| record.dual_start.is_some())
                } else if attribute.is::<ConstraintBasisStatus>() {
                    records.all(|(_, record)| record.basis_status.is_some())
                } else if let Some(primal) = attribute.downcast_ref::<ConstraintPrimal>() {
                    self.result(primal.result_index).is_ok_and(|result| {
                        records.all(|(index, _)| result.constraint_primal.contains_key(index))
                    })
                } else if let Some(dual) = attribute.downcast_ref::<ConstraintDual>() {
                    self.result(dual.result_index).is_ok_and(|result| {
                        records.all(|(index, _)| result.constraint_dual.contains_key(index))
                    })
                } else {
                    false
                }
            }
        }
    }

    fn can_set_attribute(&self, attribute: &dyn AnyAttribute) -> bool {
        if let Some(value) = attribute.downcast_ref::<ObjectiveValue>() {
            return self.has_result(value.result_index);
        }
        if let Some(status) = attribute.downcast_ref::<PrimalStatus>() {
            return self.has_result(status.result_index);
        }
        if let Some(status) = attribute.downcast_ref::<DualStatus>() {
            return self.has_result(status.result_index);
        }
        is_objective_function(attribute)
            || is_one_of!(
                attribute,
                Silent,
                TimeLimit,
                NumberOfThreads,
                RawParameter,
                Name,
                ObjectiveSense,
                ObjectiveBound,
                RelativeGap,
                SolveTime,
                SimplexIterations,
                BarrierIterations,
                NodeCount,
                ResultCount,
                TerminationStatus,
            )
    }

    fn can_set_attribute_for(&self, attribute: &dyn AnyAttribute, kind: IndexKind) -> bool {
        match kind {
            IndexKind::Variable => match attribute.downcast_ref::<VariablePrimal>() {
                Some(primal) => self.has_result(primal.result_index),
                None => is_variable_attribute(attribute),
            },
            IndexKind::Constraint(_) => {
                if let Some(primal) = attribute.downcast_ref::<ConstraintPrimal>() {
                    return self.has_result(primal.result_index);
                }
                if let Some(dual) = attribute.downcast_ref::<ConstraintDual>() {
                    return self.has_result(dual.result_index);
                }
                is_constraint_attribute(attribute)
            }
        }
    }

    fn has_named(&self, target: NameTarget, name: &str) -> bool {
        self.index_named(target, name).is_ok()
    }
    // endregion Capability predicates

    // region Accessors
    fn read(&self, mut query: Query<'_>) -> Result<(), ProtocolError> {
        let attribute = query.attribute();
        let statistics = &self.statistics;
        answer!(
            query,
            Silent => self.parameters.silent,
            TimeLimit => self.parameters.time_limit,
            NumberOfThreads => self.parameters.number_of_threads,
            Name => self.name.clone(),
            ObjectiveSense => self.sense,
            NumberOfVariables => self.variables.len(),
            ListOfVariableIndices => self.variables.keys().copied().collect(),
            ListOfConstraints => self
                .tables
                .values()
                .filter(|table| table.len() > 0)
                .map(|table| table.constraint_type())
                .collect(),
            ResultCount => self.results.len(),
            TerminationStatus => present(statistics.termination_status, attribute)?,
            ObjectiveBound => present(statistics.objective_bound, attribute)?,
            RelativeGap => present(statistics.relative_gap, attribute)?,
            SolveTime => present(statistics.solve_time, attribute)?,
            SimplexIterations => present(statistics.simplex_iterations, attribute)?,
            BarrierIterations => present(statistics.barrier_iterations, attribute)?,
            NodeCount => present(statistics.node_count, attribute)?,
        );
        if let Some(parameter) = query.downcast::<RawParameter>() {
            let value = present(self.parameters.raw.get(&parameter.name).cloned(), attribute)?;
            return query.reply::<RawParameter>(value);
        }
        if let Some(value) = query.downcast::<ObjectiveValue>() {
            let value = self.result(value.result_index)?.objective_value;
            return query.reply::<ObjectiveValue>(present(value, attribute)?);
        }
        if let Some(status) = query.downcast::<PrimalStatus>() {
            let status = self.result(status.result_index)?.primal_status;
            return query.reply::<PrimalStatus>(present(status, attribute)?);
        }
        if let Some(status) = query.downcast::<DualStatus>() {
            let status = self.result(status.result_index)?.dual_status;
            return query.reply::<DualStatus>(present(status, attribute)?);
        }
        if let Some(constraint_type) = attribute.constraint_type_parameter() {
            let indices = self
                .tables
                .get(&constraint_type)
                .map(|table| table.indices())
                .unwrap_or_default();
            if query.reply_with_indices(&indices)? {
                return Ok(());
            }
        }
        if query.reply_with_objective(self.objective.source, &self.objective.function)? {
            return Ok(());
        }
        Err(query.unsupported(KIND))
    }

    fn read_at(&self, query: IndexedQuery<'_>) -> Result<(), ProtocolError> {
        match query.index() {
            AnyIndex::Variable(index) => self.read_variable(index, query),
            AnyIndex::Constraint(index) => self.read_constraint(index, query),
        }
    }

    fn read_many(&self, mut query: BulkQuery<'_>) -> Result<(), ProtocolError> {
        // Only primal values have a bulk path, everything else is read one index at a time
        let Some(primal) = query.downcast::<VariablePrimal>() else {
            return Ok(());
        };
        if query.indices().is_empty() {
            return query.reply_variables::<VariablePrimal>(Vec::new());
        }
        let result = self.result(primal.result_index)?;
        let values = query
            .indices()
            .iter()
            .map(|index| match index {
                AnyIndex::Variable(variable) if self.variables.contains_key(variable) => {
                    present(result.variable_primal.get(variable).copied(), primal)
                }
                _ => Err(not_found(*index)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        query.reply_variables::<VariablePrimal>(values)
    }

    fn write(&mut self, assignment: Assignment<'_>) -> Result<(), ProtocolError> {
        let attribute = assignment.attribute();
        self.assign(assignment)?;
        tracing::trace!(component = "mock", operation = "set", attribute = ?attribute);
        Ok(())
    }

    fn write_at(&mut self, assignment: IndexedAssignment<'_>) -> Result<(), ProtocolError> {
        let attribute = assignment.attribute();
        let index = assignment.index();
        match index {
            AnyIndex::Variable(variable) => self.assign_variable(variable, assignment)?,
            AnyIndex::Constraint(constraint) => {
                if !self.constraints.contains_key(&constraint) {
                    return Err(assignment.not_found(KIND));
                }
                self.assign_constraint(constraint, assignment)?
            }
        }
        tracing::trace!(component = "mock", operation = "set_at", attribute = ?attribute, index = %index);
        Ok(())
    }

    fn write_many(&mut self, mut assignment: BulkAssignment<'_>) -> Result<(), ProtocolError> {
        let Some((primal, indices, values)) = assignment.take_variables::<VariablePrimal>() else {
            return Ok(());
        };
        if let Some(missing) = indices
            .iter()
            .find(|index| !self.variables.contains_key(*index))
        {
            return Err(not_found(AnyIndex::Variable(*missing)));
        }
        let result = self.result_mut(primal.result_index)?;
        result.variable_primal.extend(indices.into_iter().zip(values));
        tracing::trace!(component = "mock", operation = "set_many", attribute = ?primal);
        Ok(())
    }

    fn index_named(&self, target: NameTarget, name: &str) -> Result<AnyIndex, ProtocolError> {
        let found = match target {
            NameTarget::Variable => self.variable_names.get(name).copied().map(AnyIndex::Variable),
            NameTarget::Constraint(constraint_type) => self
                .constraint_names
                .get(name)
                .filter(|index| index.constraint_type() == constraint_type)
                .copied()
                .map(AnyIndex::Constraint),
            NameTarget::AnyConstraint => self
                .constraint_names
                .get(name)
                .copied()
                .map(AnyIndex::Constraint),
        };
        found.ok_or_else(|| ProtocolError::NameNotFound {
            target,
            name: name.to_string(),
            instance: KIND.to_string(),
        })
    }
    // endregion Accessors
}

fn present<V>(value: Option<V>, attribute: &dyn AnyAttribute) -> Result<V, ProtocolError> {
    value.ok_or_else(|| ProtocolError::NoValue {
        attribute: format!("{:?}", attribute),
        instance: KIND.to_string(),
    })
}

fn not_found(index: AnyIndex) -> ProtocolError {
    ProtocolError::IndexNotFound {
        index,
        instance: KIND.to_string(),
    }
}

// region Supported attributes
fn is_objective_function(attribute: &dyn AnyAttribute) -> bool {
    attribute.family() == AttributeFamily::InstanceAttribute
        && attribute.function_type_parameter().is_some()
}

fn is_instance_level(attribute: &dyn AnyAttribute) -> bool {
    // Attributes parametrized by a constraint type are answered from the constraint indices
    let per_constraint_type = attribute.family() == AttributeFamily::InstanceAttribute
        && attribute.constraint_type_parameter().is_some();
    per_constraint_type
        || is_objective_function(attribute)
        || is_one_of!(
            attribute,
            Silent,
            TimeLimit,
            NumberOfThreads,
            RawParameter,
            Name,
            ObjectiveSense,
            NumberOfVariables,
            ListOfVariableIndices,
            ListOfConstraints,
            ObjectiveValue,
            ObjectiveBound,
            RelativeGap,
            SolveTime,
            SimplexIterations,
            BarrierIterations,
            NodeCount,
            ResultCount,
            TerminationStatus,
            PrimalStatus,
            DualStatus,
        )
}

fn is_variable_attribute(attribute: &dyn AnyAttribute) -> bool {
    is_one_of!(
        attribute,
        VariableName,
        VariablePrimalStart,
        VariablePrimal,
        VariableBasisStatus,
    )
}

fn is_constraint_attribute(attribute: &dyn AnyAttribute) -> bool {
    is_one_of!(
        attribute,
        ConstraintName,
        ConstraintPrimalStart,
        ConstraintDualStart,
        ConstraintPrimal,
        ConstraintDual,
        ConstraintBasisStatus,
        ConstraintFunction,
        ConstraintSet,
    )
}
// endregion Supported attributes
