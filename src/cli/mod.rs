//! CLI module
//!
//! Command-line interface for listing Canvas collections.
//!
//! # Commands
//!
//! - `courses` - Courses of the current user
//! - `users <course>` - Course roster
//! - `assignments <course>` - Course assignments
//! - `files <folder>` - Files and sub-folders of a folder
//! - `links <header>` - Parse a Link header

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
