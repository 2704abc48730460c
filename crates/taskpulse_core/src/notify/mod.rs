//! Local notification scheduling for task reminders and deadlines.
//!
//! # Responsibility
//! - Define the delivery service contract consumed by core.
//! - Keep device-level triggers consistent with task deadline and status.
//!
//! # Invariants
//! - All scheduling is best-effort; failures never reach mutation callers.

pub mod delivery;
pub mod memory;
pub mod scheduler;
