//! Flutter bridge for the TaskPulse core.
//!
//! Generated FRB glue is produced by `flutter_rust_bridge_codegen` from
//! `api.rs` and is not checked in.

pub mod api;
