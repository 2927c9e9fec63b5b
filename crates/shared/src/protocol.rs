use serde::{Deserialize, Serialize};

use crate::domain::Source;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub question: String,
    pub temperature: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerResponse {
    #[serde(default)]
    pub answer: Option<String>,
}

/// Outcome of decoding a 2xx `/get_answer` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerReply {
    Answer(String),
    /// The body decoded but carried no usable `answer`.
    Malformed,
}

impl AnswerResponse {
    pub fn into_reply(self) -> AnswerReply {
        match self.answer {
            Some(answer) if !answer.is_empty() => AnswerReply::Answer(answer),
            _ => AnswerReply::Malformed,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UrlHistoryResponse {
    #[serde(default)]
    pub urls: Option<Vec<Source>>,
}

impl UrlHistoryResponse {
    pub fn into_sources(self) -> Vec<Source> {
        self.urls.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddUrlRequest {
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddUrlResponse {
    #[serde(default)]
    pub message: Option<String>,
}
