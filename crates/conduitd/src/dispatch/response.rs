//! Response objects returned to clients.
//!
//! A [`CommandResponse`] is a free-form JSON object. Handlers conventionally
//! produce `{"success": true, "data": ...}` or
//! `{"success": false, "error": "..."}` through the constructors here, but
//! the dispatcher does not validate their shape. It only stamps the request
//! `id`, plus `index` and `command` on batch sub-results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::DispatchError;

/// JSON object sent back for a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandResponse(Map<String, Value>);

impl CommandResponse {
    /// `{"success": true, "data": data}`.
    #[must_use]
    pub fn success(data: Value) -> Self {
        let mut map = Map::new();
        map.insert(String::from("success"), Value::Bool(true));
        map.insert(String::from("data"), data);
        Self(map)
    }

    /// Success response whose data is `{"message": message}`.
    #[must_use]
    pub fn success_message(message: impl Into<String>) -> Self {
        let mut data = Map::new();
        data.insert(String::from("message"), Value::String(message.into()));
        Self::success(Value::Object(data))
    }

    /// `{"success": false, "error": message}`.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(String::from("success"), Value::Bool(false));
        map.insert(String::from("error"), Value::String(message.into()));
        Self(map)
    }

    /// Wraps an arbitrary JSON object.
    #[must_use]
    pub const fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Returns the underlying JSON object.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Borrows the underlying JSON object.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Whether the `success` field is `true`. A missing or non-boolean field
    /// counts as failure.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.0
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// The `data` field, if present.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.0.get("data")
    }

    /// The `error` field, if it is a string.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.0.get("error").and_then(Value::as_str)
    }

    /// The `id` field, if it is a string.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// Sets `id`, replacing whatever the handler produced.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.set_field("id", Value::String(id.into()));
    }

    /// Inserts or replaces a top-level field.
    pub fn set_field(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_owned(), value);
    }

    /// Serializes the response as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.0)
    }
}

impl From<&DispatchError> for CommandResponse {
    fn from(error: &DispatchError) -> Self {
        Self::error(error.to_string())
    }
}

impl From<Map<String, Value>> for CommandResponse {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_map(map)
    }
}
