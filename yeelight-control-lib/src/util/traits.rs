use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The error object a bulb sends back instead of a result, e.g.
/// `{"id":2, "error":{"code":-1, "message":"unsupported method"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceError {
    pub code: i64,
    pub message: String,
}

/// Helpers for reading the otherwise opaque reply of a command.
///
/// Replies are handed back as plain JSON since their shape depends on the method;
/// this trait only knows the envelope shared by all of them.
pub trait CommandReply {
    /// The `result` array, if the bulb accepted the command.
    fn result(&self) -> Option<&Vec<Value>>;

    /// The `error` object, if the bulb rejected the command.
    fn device_error(&self) -> Option<DeviceError>;

    /// True for the `{"result":["ok"]}` acknowledgement of a state change.
    ///
    /// Queries such as `get_prop` answer with values rather than `"ok"`; inspect
    /// [`CommandReply::result`] for those.
    fn is_ok(&self) -> bool {
        matches!(self.result(), Some(values) if values.len() == 1 && values[0] == "ok")
    }

    fn is_error(&self) -> bool {
        self.device_error().is_some()
    }
}

impl CommandReply for Value {
    fn result(&self) -> Option<&Vec<Value>> {
        self.get("result").and_then(Value::as_array)
    }

    fn device_error(&self) -> Option<DeviceError> {
        self.get("error")
            .and_then(|error| serde_json::from_value(error.clone()).ok())
    }
}
