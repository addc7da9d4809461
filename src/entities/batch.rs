use serde::Serialize;
use serde_json::Value;

/// Error string the batch endpoint uses for paths or ids it does not know.
pub const UNKNOWN_FILES_ERROR: &str = "Unknown files";

/// Classified body of a `new-doc-set` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BatchOutcome {
    Created { uri: String },
    UnknownFiles { files: Vec<String> },
    Rejected { message: String },
    Unexpected { body: String },
}

/// Classified body of a `gdrive-ingest` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    Ingested,
    Failed { message: String },
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn error_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl BatchOutcome {
    pub fn from_value(body: &Value) -> Self {
        if is_truthy(body.get("error")) {
            let message = body.get("error").map(error_message).unwrap_or_default();
            if message == UNKNOWN_FILES_ERROR {
                let files = body
                    .get("detail")
                    .and_then(Value::as_array)
                    .map(|items| items.iter().map(error_message).collect())
                    .unwrap_or_default();
                return Self::UnknownFiles { files };
            }
            return Self::Rejected { message };
        }

        match body.get("uri").and_then(Value::as_str) {
            Some(uri) if !uri.is_empty() => Self::Created {
                uri: uri.to_string(),
            },
            _ => Self::Unexpected {
                body: body.to_string(),
            },
        }
    }
}

impl IngestOutcome {
    pub fn from_value(body: &Value) -> Self {
        if is_truthy(body.get("error")) {
            return Self::Failed {
                message: body.get("error").map(error_message).unwrap_or_default(),
            };
        }
        Self::Ingested
    }
}
