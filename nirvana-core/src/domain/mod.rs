//! Core domain types
//!
//! The deployment inputs an operator resolves during a run, and the
//! background commands the scheduler launches to help resolve them.

pub mod inputs;
pub mod task;
