//! Built-in command handlers that need nothing from the host.

mod console_logs;

pub use self::console_logs::{ConsoleLogsHandler, GET_CONSOLE_LOGS};
