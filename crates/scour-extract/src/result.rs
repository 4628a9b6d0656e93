use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// Terminal record of one extraction.
///
/// Serializes as an ordered JSON object whose first key is always `type`.
/// A failure is exactly `{type, error}`; a success is `type` followed by the
/// adapter's payload fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    Success {
        result_type: String,
        payload: Map<String, Value>,
    },
    Failure {
        result_type: String,
        error: String,
    },
}

impl ExtractionResult {
    /// A successful record. A non-object payload is stored under `data`.
    pub fn success(result_type: impl Into<String>, payload: Value) -> Self {
        let payload = match payload {
            Value::Object(mut map) => {
                map.remove("type");
                map
            }
            other => {
                let mut map = Map::new();
                map.insert("data".into(), other);
                map
            }
        };
        ExtractionResult::Success {
            result_type: result_type.into(),
            payload,
        }
    }

    pub fn failure(result_type: impl Into<String>, error: impl Into<String>) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "extraction failed".into();
        }
        ExtractionResult::Failure {
            result_type: result_type.into(),
            error,
        }
    }

    pub fn result_type(&self) -> &str {
        match self {
            ExtractionResult::Success { result_type, .. }
            | ExtractionResult::Failure { result_type, .. } => result_type,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ExtractionResult::Failure { error, .. } => Some(error),
            ExtractionResult::Success { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ExtractionResult::Failure { .. })
    }

    pub fn payload(&self) -> Option<&Map<String, Value>> {
        match self {
            ExtractionResult::Success { payload, .. } => Some(payload),
            ExtractionResult::Failure { .. } => None,
        }
    }

    /// A payload field. Always `None` on failure.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload()?.get(key)
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), Value::String(self.result_type().to_string()));
        match self {
            ExtractionResult::Success { payload, .. } => {
                map.extend(payload.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            ExtractionResult::Failure { error, .. } => {
                map.insert("error".into(), Value::String(error.clone()));
            }
        }
        Value::Object(map)
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExtractionResult::Success {
                result_type,
                payload,
            } => {
                let mut map = serializer.serialize_map(Some(payload.len() + 1))?;
                map.serialize_entry("type", result_type)?;
                for (key, value) in payload {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            ExtractionResult::Failure { result_type, error } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", result_type)?;
                map.serialize_entry("error", error)?;
                map.end()
            }
        }
    }
}
