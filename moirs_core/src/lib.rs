//! Core rust implementation of moi.rs, a solver-agnostic protocol for querying and updating
//! the attributes of optimization problem instances.
//!
//! Callers hold an [`Instance`](instance::Instance) and an attribute value, probe the
//! instance with [`supports`](instance::InstanceExt::supports),
//! [`can_get`](instance::InstanceExt::can_get) and [`can_set`](instance::InstanceExt::can_set),
//! and then read or write the attribute through [`InstanceExt`](instance::InstanceExt).
//! Every access an instance does not explicitly handle fails with
//! [`ProtocolError::UnsupportedAccess`](error::ProtocolError::UnsupportedAccess).

pub mod attributes;
pub mod configuration;
pub mod error;
pub mod functions;
pub mod index;
pub mod instance;
pub mod mock;
pub mod status;

pub use error::ProtocolError;
pub use index::{AnyConstraintIndex, ConstraintIndex, ConstraintType, IndexKind, VariableIndex};
pub use instance::{Instance, InstanceExt};
