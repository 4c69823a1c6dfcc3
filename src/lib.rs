//! Convo Relay: concurrent scheduled message tasks with owner-scoped control.

pub mod api;
pub mod config;
pub mod error;
pub mod tasks;
