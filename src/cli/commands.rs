//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Canvas LMS command-line client
#[derive(Parser, Debug)]
#[command(name = "canvas")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// API root, e.g. https://school.instructure.com/api/v1
    #[arg(long, global = true, env = "CANVAS_BASE_URL")]
    pub base_url: Option<String>,

    /// Access token
    #[arg(long, global = true, env = "CANVAS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Items requested per page
    #[arg(long, global = true)]
    pub per_page: Option<u32>,

    /// Extra query option, repeatable (e.g. -q include[]=term)
    #[arg(short = 'q', long = "query", global = true, value_parser = parse_key_val)]
    pub query: Vec<(String, String)>,

    /// Keep going when a page fails instead of stopping
    #[arg(long, global = true)]
    pub continue_on_error: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List courses of the current user
    Courses,

    /// List users enrolled in a course
    Users {
        /// Course id
        course: u64,
    },

    /// List assignments of a course
    Assignments {
        /// Course id
        course: u64,
    },

    /// List files and sub-folders of a folder
    Files {
        /// Folder id
        folder: u64,
    },

    /// Parse a Link header and print its relations
    Links {
        /// Raw header value
        header: String,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one item per line)
    Json,
    /// Indented JSON
    Pretty,
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
