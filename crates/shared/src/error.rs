use serde::{Deserialize, Serialize};

/// Body the answering backend attaches to non-2xx responses. `/get_answer`
/// and `/add_url` failures use `error`; a rejected `/add_url` (already
/// indexed, loader failure) reports through `message` instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BackendErrorBody {
    /// Best-effort extraction of a human-readable detail from a failure body.
    /// Falls back to the raw text when the body is not the expected JSON.
    pub fn detail_from_bytes(bytes: &[u8]) -> Option<String> {
        match serde_json::from_slice::<Self>(bytes) {
            Ok(body) => body.error.or(body.message),
            Err(_) => {
                let raw = String::from_utf8_lossy(bytes).trim().to_string();
                (!raw.is_empty()).then_some(raw)
            }
        }
    }
}
