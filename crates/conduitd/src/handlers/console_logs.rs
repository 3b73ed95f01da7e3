//! `get_console_logs`: read back recently captured log entries.
//!
//! Params:
//! - `count`: maximum entries to return (default 50)
//! - `verbosity_filter`: least severe level to include; `error`, `warning`,
//!   `info`, `debug` or `trace`, with `display`, `log` and `verbose` accepted
//!   as aliases. Anything else includes every level.
//! - `category_filter`: exact target to match

use serde_json::{Map, Value};
use tracing::Level;

use crate::dispatch::{CommandHandler, CommandResponse};
use crate::log_capture::{LogCapture, LogQuery};

/// Command name under which [`ConsoleLogsHandler`] is registered.
pub const GET_CONSOLE_LOGS: &str = "get_console_logs";

const DEFAULT_COUNT: usize = 50;

/// Serves entries from a [`LogCapture`].
#[derive(Debug, Clone)]
pub struct ConsoleLogsHandler {
    capture: LogCapture,
}

impl ConsoleLogsHandler {
    /// Creates a handler reading from `capture`.
    #[must_use]
    pub const fn new(capture: LogCapture) -> Self {
        Self { capture }
    }
}

impl CommandHandler for ConsoleLogsHandler {
    fn execute(&self, params: &Map<String, Value>) -> CommandResponse {
        let query = query_from_params(params);
        match serde_json::to_value(self.capture.entries(&query)) {
            Ok(entries) => CommandResponse::success(entries),
            Err(error) => CommandResponse::error(format!("failed to encode log entries: {error}")),
        }
    }
}

fn query_from_params(params: &Map<String, Value>) -> LogQuery {
    let count = params
        .get("count")
        .and_then(Value::as_u64)
        .and_then(|count| usize::try_from(count).ok())
        .unwrap_or(DEFAULT_COUNT);
    let min_level = params
        .get("verbosity_filter")
        .and_then(Value::as_str)
        .and_then(parse_verbosity);
    let category = params
        .get("category_filter")
        .and_then(Value::as_str)
        .filter(|category| !category.is_empty())
        .map(str::to_owned);
    LogQuery {
        count,
        min_level,
        category,
    }
}

fn parse_verbosity(name: &str) -> Option<Level> {
    match name.to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warning" | "warn" => Some(Level::WARN),
        "info" | "display" => Some(Level::INFO),
        "debug" | "log" => Some(Level::DEBUG),
        "trace" | "verbose" => Some(Level::TRACE),
        _ => None,
    }
}
