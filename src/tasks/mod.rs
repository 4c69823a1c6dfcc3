//! Relay tasks: registry, per-task workers, and the control surface.
//!
//! Core components:
//! - `state`: Task status machine (Queued → Running ⇄ Paused → Stopped)
//! - `record`: Task data, control flags and log behind a per-record lock
//! - `registry`: Task lookup plus owner-scoped visibility
//! - `sender`: Outbound delivery abstraction and its HTTP implementation
//! - `worker`: The per-task send loop
//! - `controller`: create / pause / resume / stop / inspect / list

pub mod controller;
pub mod record;
pub mod registry;
pub mod sender;
pub mod state;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::Controller;
pub use record::{LogEntry, OwnerId, TaskConfig, TaskId, TaskRecord, TaskSnapshot, TaskSummary};
pub use registry::{OwnershipIndex, Registry};
pub use sender::{HttpSender, MessageSender};
pub use state::TaskStatus;
pub use worker::Worker;
