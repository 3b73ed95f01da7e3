//! Framed JSON command dispatch.
//!
//! This module turns decoded frames into handler invocations. Each frame
//! carries a single request object:
//!
//! ```json
//! {"command":"spawn_actor","id":"42","params":{"name":"Cube"}}
//! ```
//!
//! and receives exactly one response object carrying the same `id`:
//!
//! ```json
//! {"success":true,"data":{"name":"Cube"},"id":"42"}
//! ```
//!
//! ## Batches
//!
//! The reserved `batch_execute` command runs a list of `{command, params}`
//! items in order:
//!
//! ```json
//! {"command":"batch_execute","id":"7","params":{
//!   "commands":[{"command":"a"},{"command":"b","params":{"x":1}}],
//!   "stop_on_error":true}}
//! ```
//!
//! The response data is `{results, total, executed}`, where each result is
//! the item's response plus its `index` and `command`.

mod batch;
mod command;
mod errors;
mod registry;
mod request;
mod response;
mod router;
mod session;

pub use self::command::CommandHandler;
pub use self::errors::{DispatchError, RegistryError};
pub use self::registry::CommandRegistry;
pub use self::request::CommandRequest;
pub use self::response::CommandResponse;
pub use self::router::{BATCH_COMMAND, Dispatcher};
pub(crate) use self::session::SessionHandler;
