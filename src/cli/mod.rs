//! CLI module for regassist
//!
//! Handles command-line argument parsing.

pub mod args;

pub use args::{Args, ChunkTypeArg, Commands, Verbosity};
