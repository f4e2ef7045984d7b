//! Shared aliases, pagination defaults and small helpers

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// Ordered query options.
///
/// Order and duplicates are significant: Canvas expects repeated keys for
/// array parameters such as `include[]=term&include[]=teachers`.
pub type QueryOptions = Vec<(String, String)>;

/// Canvas object identifier
pub type CanvasId = u64;

// ============================================================================
// Pagination Defaults
// ============================================================================

/// Page size used when the caller does not pick one
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Query key carrying the 1-indexed page number
pub const PAGE_PARAM: &str = "page";

/// Query key carrying the page size
pub const PER_PAGE_PARAM: &str = "per_page";

// ============================================================================
// Log Level
// ============================================================================

/// Log level accepted in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Build a [`QueryOptions`] list from borrowed pairs
pub fn query_options<K, V>(pairs: &[(K, V)]) -> QueryOptions
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
        .collect()
}

/// Treats an empty environment or config value as unset
pub trait OptionStringExt {
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}
