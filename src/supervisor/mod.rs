//! Worker scheduling
//!
//! The `Supervisor` sizes a `WorkerPool` to the source list and submits one
//! recording worker per source, plus the relay bootstrap when needed.

mod pool;
mod supervisor;

pub use pool::{PoolTask, WorkerPool};
pub use supervisor::{Supervisor, SupervisorSettings};
