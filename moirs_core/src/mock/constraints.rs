//! Typed storage for the functions and sets of one kind of constraint
use std::any::Any;
use std::fmt::Debug;

use indexmap::IndexMap;

use crate::attributes::{ConstraintFunction, ConstraintSet};
use crate::error::ProtocolError;
use crate::functions::{Function, Set};
use crate::index::{AnyConstraintIndex, ConstraintType};
use crate::instance::query::{IndexedAssignment, IndexedQuery};
use crate::mock::KIND;

/// The constraints of one (function, set) pair, with the pair erased
pub(crate) trait ConstraintTable: Debug {
    fn constraint_type(&self) -> ConstraintType;

    fn len(&self) -> usize;

    /// Every index in the table, in the order the constraints were added
    fn indices(&self) -> Vec<AnyConstraintIndex>;

    fn remove(&mut self, value: u64) -> bool;

    /// Answer [`ConstraintFunction`] or [`ConstraintSet`], None for any other attribute
    fn read_at(&self, query: &mut IndexedQuery<'_>) -> Option<Result<(), ProtocolError>>;

    /// Assign [`ConstraintFunction`] or [`ConstraintSet`], None for any other attribute
    fn write_at(
        &mut self,
        assignment: &mut IndexedAssignment<'_>,
    ) -> Option<Result<(), ProtocolError>>;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[derive(Debug)]
pub(crate) struct Table<F, S> {
    rows: IndexMap<u64, (F, S)>,
}

impl<F: Function, S: Set> Table<F, S> {
    pub(crate) fn new() -> Self {
        Self {
            rows: IndexMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, value: u64, function: F, set: S) {
        self.rows.insert(value, (function, set));
    }
}

impl<F: Function, S: Set> ConstraintTable for Table<F, S> {
    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::of::<F, S>()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn indices(&self) -> Vec<AnyConstraintIndex> {
        let constraint_type = self.constraint_type();
        self.rows
            .keys()
            .map(|value| AnyConstraintIndex::new(constraint_type, *value))
            .collect()
    }

    fn remove(&mut self, value: u64) -> bool {
        self.rows.shift_remove(&value).is_some()
    }

    fn read_at(&self, query: &mut IndexedQuery<'_>) -> Option<Result<(), ProtocolError>> {
        let index = query.constraint::<F, S>()?;
        let Some((function, set)) = self.rows.get(&index.value()) else {
            return Some(Err(query.not_found(KIND)));
        };
        if query.downcast::<ConstraintFunction>().is_some() {
            return Some(query.reply_constraint::<ConstraintFunction, F, S>(function.clone()));
        }
        if query.downcast::<ConstraintSet>().is_some() {
            return Some(query.reply_constraint::<ConstraintSet, F, S>(set.clone()));
        }
        None
    }

    fn write_at(
        &mut self,
        assignment: &mut IndexedAssignment<'_>,
    ) -> Option<Result<(), ProtocolError>> {
        if let Some((_, index, function)) =
            assignment.take_constraint::<ConstraintFunction, F, S>()
        {
            return Some(match self.rows.get_mut(&index.value()) {
                Some(row) => {
                    row.0 = function;
                    Ok(())
                }
                None => Err(assignment.not_found(KIND)),
            });
        }
        if let Some((_, index, set)) = assignment.take_constraint::<ConstraintSet, F, S>() {
            return Some(match self.rows.get_mut(&index.value()) {
                Some(row) => {
                    row.1 = set;
                    Ok(())
                }
                None => Err(assignment.not_found(KIND)),
            });
        }
        None
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{LessThan, SingleVariable};
    use crate::index::VariableIndex;

    #[test]
    fn table_keeps_insertion_order() {
        let mut table = Table::<SingleVariable, LessThan<f64>>::new();
        for value in [5, 2, 9] {
            table.insert(value, SingleVariable::new(VariableIndex::new(value)), LessThan::new(1.0));
        }
        assert!(table.remove(2));
        assert!(!table.remove(2));
        assert_eq!(table.len(), 2);
        let values: Vec<u64> = table.indices().iter().map(|index| index.value()).collect();
        assert_eq!(values, vec![5, 9]);
        assert!(table
            .indices()
            .iter()
            .all(|index| index.constraint_type() == table.constraint_type()));
    }
}
