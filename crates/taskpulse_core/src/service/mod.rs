//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository writes and notification scheduling into
//!   use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage and delivery details.

pub mod task_service;
