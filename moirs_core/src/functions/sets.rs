//! Scalar sets
use std::fmt::{Display, Formatter};

use crate::functions::{Coefficient, Set};

/// The set `(-inf, upper]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LessThan<T> {
    pub upper: T,
}

/// The set `[lower, inf)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GreaterThan<T> {
    pub lower: T,
}

/// The set `{value}`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqualTo<T> {
    pub value: T,
}

/// The set `[lower, upper]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval<T> {
    pub lower: T,
    pub upper: T,
}

impl<T> LessThan<T> {
    pub fn new(upper: T) -> Self {
        Self { upper }
    }
}

impl<T> GreaterThan<T> {
    pub fn new(lower: T) -> Self {
        Self { lower }
    }
}

impl<T> EqualTo<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T> Interval<T> {
    pub fn new(lower: T, upper: T) -> Self {
        Self { lower, upper }
    }
}

impl<T: Coefficient> Set for LessThan<T> {
    const NAME: &'static str = "LessThan";
}

impl<T: Coefficient> Set for GreaterThan<T> {
    const NAME: &'static str = "GreaterThan";
}

impl<T: Coefficient> Set for EqualTo<T> {
    const NAME: &'static str = "EqualTo";
}

impl<T: Coefficient> Set for Interval<T> {
    const NAME: &'static str = "Interval";
}

impl<T: Display> Display for LessThan<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<= {}", self.upper)
    }
}

impl<T: Display> Display for GreaterThan<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, ">= {}", self.lower)
    }
}

impl<T: Display> Display for EqualTo<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "== {}", self.value)
    }
}

impl<T: Display> Display for Interval<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "in [{}, {}]", self.lower, self.upper)
    }
}
