//! In-memory capture of recent log events.
//!
//! [`LogCapture`] is a bounded ring buffer fed by a `tracing` layer. It backs
//! the `get_console_logs` command, which lets a remote client read what the
//! server has been logging without access to its stderr.

use std::collections::VecDeque;
use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// One captured log event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// RFC 3339 UTC time the event was recorded.
    pub timestamp: String,
    /// Event level, upper case (`ERROR`, `WARN`, ...).
    #[serde(rename = "verbosity")]
    pub level: String,
    /// Event target, used as the log category.
    pub category: String,
    /// Rendered message followed by any extra fields as `key=value`.
    pub message: String,
}

/// Selection applied when reading captured entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    /// Maximum number of entries returned.
    pub count: usize,
    /// Least severe level to include. `None` includes every level.
    pub min_level: Option<Level>,
    /// Exact category to match. `None` matches every category.
    pub category: Option<String>,
}

/// Shared ring buffer of recent log entries.
#[derive(Debug, Clone)]
pub struct LogCapture {
    inner: Arc<Mutex<Buffer>>,
}

#[derive(Debug)]
struct Buffer {
    entries: VecDeque<(Level, LogEntry)>,
    capacity: usize,
}

impl LogCapture {
    /// Creates a buffer that retains at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Buffer {
                entries: VecDeque::with_capacity(capacity),
                capacity,
            })),
        }
    }

    /// Builds the `tracing` layer that feeds this buffer.
    #[must_use]
    pub fn layer(&self) -> LogCaptureLayer {
        LogCaptureLayer {
            capture: self.clone(),
        }
    }

    /// Appends an entry, evicting the oldest when full.
    pub fn record(&self, level: Level, category: &str, message: String) {
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        let entry = LogEntry {
            timestamp,
            level: level.to_string(),
            category: category.to_owned(),
            message,
        };

        let mut buffer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if buffer.capacity == 0 {
            return;
        }
        while buffer.entries.len() >= buffer.capacity {
            buffer.entries.pop_front();
        }
        buffer.entries.push_back((level, entry));
    }

    /// Returns the newest entries matching `query`, oldest first.
    #[must_use]
    pub fn entries(&self, query: &LogQuery) -> Vec<LogEntry> {
        let buffer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut selected: Vec<LogEntry> = buffer
            .entries
            .iter()
            .rev()
            .filter(|(level, _)| query.min_level.is_none_or(|min| *level <= min))
            .filter(|(_, entry)| {
                query
                    .category
                    .as_deref()
                    .is_none_or(|category| entry.category == category)
            })
            .take(query.count)
            .map(|(_, entry)| entry.clone())
            .collect();
        selected.reverse();
        selected
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `tracing` layer that records every enabled event into a [`LogCapture`].
#[derive(Debug, Clone)]
pub struct LogCaptureLayer {
    capture: LogCapture,
}

impl<S: Subscriber> Layer<S> for LogCaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.capture
            .record(*metadata.level(), metadata.target(), visitor.finish());
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields
        } else {
            format!("{} {}", self.message, self.fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.record_debug(field, &value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
            return;
        }
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={value:?}", field.name());
    }
}
