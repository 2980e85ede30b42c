use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The `{type, data}` wrapper carried between windows.
///
/// `data` is whatever the two ends agreed on for `msg_type`; it is never
/// validated here. An absent payload is omitted from the JSON form, so a
/// bare request serializes as `{"type":"GET_LOGIN_INFO"}`. An explicit
/// `null` is a payload and survives as `Some(Value::Null)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(
        default,
        deserialize_with = "present_data",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Value>,
}

fn present_data<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Envelope {
    /// An envelope with no payload.
    pub fn new(msg_type: impl Into<String>) -> Self {
        Self {
            msg_type: msg_type.into(),
            data: None,
        }
    }

    /// An envelope carrying an already-built JSON payload.
    pub fn with_data(msg_type: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            msg_type: msg_type.into(),
            data,
        }
    }

    /// An envelope carrying any serializable payload.
    pub fn typed<T: Serialize + ?Sized>(
        msg_type: impl Into<String>,
        data: Option<&T>,
    ) -> serde_json::Result<Self> {
        let data = data.map(serde_json::to_value).transpose()?;
        Ok(Self::with_data(msg_type, data))
    }

    /// Read an envelope out of an inbound message.
    ///
    /// Returns `None` unless `value` is an object with a string `type`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let msg_type = value.get("type")?.as_str()?;
        let data = value.get("data").cloned();
        Some(Self::with_data(msg_type, data))
    }

    /// The JSON object posted to the target window.
    pub fn to_value(&self) -> Value {
        let mut object = Map::with_capacity(2);
        object.insert("type".to_string(), Value::String(self.msg_type.clone()));
        if let Some(data) = &self.data {
            object.insert("data".to_string(), data.clone());
        }
        Value::Object(object)
    }

    /// Decode the payload; a missing payload decodes from `null`.
    pub fn decode_data<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.data.clone().unwrap_or(Value::Null))
    }
}
