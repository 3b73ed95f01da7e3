//! Sequential execution of `batch_execute` requests.

use serde_json::{Map, Value, json};

use super::errors::DispatchError;
use super::response::CommandResponse;

/// Runs each item of a batch through `invoke`, in order.
///
/// Every collected sub-result is the handler's response augmented with
/// `index` and `command`. When `stop_on_error` is set, iteration ends after
/// the first sub-result whose `success` is not `true`. The returned response
/// is successful only if every executed item succeeded, and its data is
/// `{results, total, executed}`.
///
/// # Errors
///
/// Returns [`DispatchError::MissingParams`] or
/// [`DispatchError::MissingCommands`] when the batch cannot be read at all.
pub(crate) fn execute_batch<F>(
    params: Option<Map<String, Value>>,
    mut invoke: F,
) -> Result<CommandResponse, DispatchError>
where
    F: FnMut(&str, Map<String, Value>) -> CommandResponse,
{
    let mut params = params.ok_or(DispatchError::MissingParams)?;
    let stop_on_error = params
        .get("stop_on_error")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let Some(Value::Array(commands)) = params.remove("commands") else {
        return Err(DispatchError::MissingCommands);
    };

    let total = commands.len();
    let mut results = Vec::with_capacity(total);
    let mut all_succeeded = true;

    for (index, item) in commands.into_iter().enumerate() {
        let mut result = match BatchItem::from_value(item) {
            Ok(BatchItem { command, params }) => {
                let mut result = invoke(&command, params);
                result.set_field("command", Value::String(command));
                result
            }
            Err(error) => CommandResponse::from(&error),
        };
        result.set_field("index", json!(index));

        let succeeded = result.is_success();
        all_succeeded &= succeeded;
        results.push(Value::Object(result.into_map()));

        if stop_on_error && !succeeded {
            break;
        }
    }

    let executed = results.len();
    let mut response = CommandResponse::success(json!({
        "results": results,
        "total": total,
        "executed": executed,
    }));
    response.set_field("success", Value::Bool(all_succeeded));
    Ok(response)
}

/// One well-formed element of a batch's `commands` array.
struct BatchItem {
    command: String,
    params: Map<String, Value>,
}

impl BatchItem {
    fn from_value(value: Value) -> Result<Self, DispatchError> {
        let Value::Object(mut object) = value else {
            return Err(DispatchError::InvalidCommandObject);
        };
        let Some(Value::String(command)) = object.remove("command") else {
            return Err(DispatchError::InvalidCommandObject);
        };
        let params = match object.remove("params") {
            Some(Value::Object(params)) => params,
            _ => Map::new(),
        };
        Ok(Self { command, params })
    }
}
