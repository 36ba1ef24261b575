//! CLI module for toolsage
//!
//! Handles command-line argument parsing and experience log loading.

pub mod args;
pub mod log;

pub use args::{Args, Commands, Verbosity};
pub use log::{parse_experience_log, read_experience_log, replay_into};
