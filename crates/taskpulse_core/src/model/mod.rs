//! Task domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every task is identified by a stable opaque `TaskId`.
//! - Subtasks have no lifecycle independent of their parent task.

pub mod task;
