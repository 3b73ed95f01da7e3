//! Request decoding for the session loop.
//!
//! Parsing is deliberately lenient about field shapes: the payload must be a
//! JSON object, but a missing `command` is looked up as the empty string, a
//! missing `id` echoes as `""`, and a non-object `params` is treated as
//! absent.

use serde_json::{Map, Value};

use super::errors::DispatchError;

/// Parsed command request from a client.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    command: String,
    id: String,
    params: Option<Map<String, Value>>,
}

impl CommandRequest {
    /// Builds a request directly, bypassing the wire format.
    #[must_use]
    pub fn new(
        command: impl Into<String>,
        id: impl Into<String>,
        params: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            command: command.into(),
            id: id.into(),
            params,
        }
    }

    /// Parses a frame payload into a request.
    ///
    /// The payload ends at its first NUL byte; anything after it is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidJson`] if the payload is not valid
    /// UTF-8 JSON or is not a JSON object.
    pub fn parse(payload: &[u8]) -> Result<Self, DispatchError> {
        let trimmed = until_nul(payload);
        let value: Value =
            serde_json::from_slice(trimmed).map_err(DispatchError::from_json_error)?;
        let Value::Object(mut object) = value else {
            return Err(DispatchError::not_an_object());
        };

        let command = match object.remove("command") {
            Some(Value::String(command)) => command,
            _ => String::new(),
        };
        let id = match object.remove("id") {
            Some(Value::String(id)) => id,
            Some(Value::Number(number)) => number.to_string(),
            _ => String::new(),
        };
        let params = match object.remove("params") {
            Some(Value::Object(params)) => Some(params),
            _ => None,
        };

        Ok(Self {
            command,
            id,
            params,
        })
    }

    /// Name of the requested command.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Opaque identifier echoed in the response.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Parameters object, if one was supplied.
    #[must_use]
    pub const fn params(&self) -> Option<&Map<String, Value>> {
        self.params.as_ref()
    }

    /// Splits the request into command, id and params.
    #[must_use]
    pub fn into_parts(self) -> (String, String, Option<Map<String, Value>>) {
        (self.command, self.id, self.params)
    }
}

fn until_nul(bytes: &[u8]) -> &[u8] {
    bytes
        .iter()
        .position(|byte| *byte == 0)
        .map_or(bytes, |end| &bytes[..end])
}
