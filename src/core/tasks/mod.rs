// src/core/tasks/mod.rs

//! The automatic-task runner shared by every role.

pub mod registration;

pub use registration::AutomaticTaskTable;
