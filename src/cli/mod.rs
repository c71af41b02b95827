//! CLI-specific functionality for slotplan
//!
//! This module contains argument parsing and task file loading. Configuration
//! discovery lives in [`crate::config`].

pub mod args;
pub mod tasks;

pub use args::{Args, Commands, CyclePolicyArg};
pub use tasks::{FileError, TaskFile, TaskLoader};
