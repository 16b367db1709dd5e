use serde_json::Value;
use thiserror::Error;

pub const UNPARSEABLE_MESSAGE: &str = "Received data from Sigma but it could not be parsed.";
pub const UNKNOWN_HOST_ERROR: &str = "Unknown host error";

/// Failures surfaced to `on_error` subscribers. The bridge never returns these
/// to its caller; they are delivered as events and listening continues.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BridgeError {
    /// A data message arrived but its payload matched no known table encoding.
    #[error("{}", UNPARSEABLE_MESSAGE)]
    Unparseable { payload: Value },

    /// The host reported an error of its own via `sigma.error`.
    #[error("{message}")]
    Host {
        message: String,
        payload: Option<Value>,
    },

    /// Posting to the parent window failed.
    #[error("{0}")]
    Transport(String),
}

impl BridgeError {
    /// Raw payload attached for diagnostics, if any.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Unparseable { payload } => Some(payload),
            Self::Host { payload, .. } => payload.as_ref(),
            Self::Transport(_) => None,
        }
    }

    /// Build the error for a `sigma.error` message from its optional payload.
    pub(crate) fn from_host_payload(payload: Option<&Value>) -> Self {
        match payload.filter(|value| crate::core::normalize::is_truthy(value)) {
            None => Self::Host {
                message: UNKNOWN_HOST_ERROR.to_string(),
                payload: None,
            },
            Some(Value::String(message)) => Self::Host {
                message: message.clone(),
                payload: None,
            },
            Some(other) => Self::Host {
                message: other
                    .get("message")
                    .and_then(Value::as_str)
                    .filter(|message| !message.is_empty())
                    .unwrap_or(UNKNOWN_HOST_ERROR)
                    .to_string(),
                payload: Some(other.clone()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unparseable_uses_fixed_message() {
        let err = BridgeError::Unparseable {
            payload: json!({ "foo": 1 }),
        };
        assert_eq!(err.to_string(), UNPARSEABLE_MESSAGE);
        assert_eq!(err.payload(), Some(&json!({ "foo": 1 })));
    }

    #[test]
    fn host_payload_variants() {
        assert_eq!(BridgeError::from_host_payload(None).to_string(), UNKNOWN_HOST_ERROR);
        assert_eq!(
            BridgeError::from_host_payload(Some(&json!(""))).to_string(),
            UNKNOWN_HOST_ERROR
        );
        assert_eq!(
            BridgeError::from_host_payload(Some(&json!("Workbook locked"))).to_string(),
            "Workbook locked"
        );

        let structured = BridgeError::from_host_payload(Some(&json!({ "message": "Quota", "code": 429 })));
        assert_eq!(structured.to_string(), "Quota");
        assert_eq!(structured.payload(), Some(&json!({ "message": "Quota", "code": 429 })));

        let opaque = BridgeError::from_host_payload(Some(&json!({ "code": 500 })));
        assert_eq!(opaque.to_string(), UNKNOWN_HOST_ERROR);
    }
}
