//! Container capacity estimation.
//!
//! Estimates how many units of each requested item type fit into a
//! shipping container, honouring geometry (best single orientation on a
//! regular grid) and a shared payload weight budget. The HTTP surface lives
//! in [`api`]; everything else is pure and synchronous.

pub mod allocator;
pub mod api;
pub mod config;
pub mod model;
pub mod orientation;
pub mod precheck;
pub mod types;
pub mod utilization;
