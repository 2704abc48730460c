//! Task repository abstractions.
//!
//! # Responsibility
//! - Define the read contract core consumes from the task store.
//! - Provide an in-memory store for hosts, tests and the CLI.
//!
//! # Invariants
//! - Repository writes must enforce `Task::validate()` before mutating.
//! - Snapshot identity changes exactly when the collection changes.

pub mod task_repo;
