use std::fmt;

use serde::{Deserialize, Serialize};

pub const TEMPERATURE_MIN: u8 = 0;
pub const TEMPERATURE_MAX: u8 = 10;

/// A URL the backend has indexed for question answering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Source(pub String);

impl Source {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Source {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Source {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Bot,
}

/// One entry of the session transcript. Fields are private so a turn cannot
/// change after it has been appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    role: ChatRole,
    text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Bot,
            text: text.into(),
        }
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Slider semantics: anything outside `[TEMPERATURE_MIN, TEMPERATURE_MAX]`
/// is pinned to the nearest bound.
pub fn clamp_temperature(raw: i64) -> u8 {
    let clamped = raw.clamp(i64::from(TEMPERATURE_MIN), i64::from(TEMPERATURE_MAX));
    u8::try_from(clamped).unwrap_or(TEMPERATURE_MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_temperature_to_slider_bounds() {
        assert_eq!(clamp_temperature(-3), 0);
        assert_eq!(clamp_temperature(0), 0);
        assert_eq!(clamp_temperature(7), 7);
        assert_eq!(clamp_temperature(10), 10);
        assert_eq!(clamp_temperature(250), 10);
    }

    #[test]
    fn chat_turn_serializes_with_snake_case_role() {
        let json = serde_json::to_value(ChatTurn::bot("Paris")).expect("serialize");
        assert_eq!(json, serde_json::json!({ "role": "bot", "text": "Paris" }));
    }

    #[test]
    fn source_is_a_bare_string_on_the_wire() {
        let source: Source = serde_json::from_str("\"http://x.test\"").expect("deserialize");
        assert_eq!(source.as_str(), "http://x.test");
    }
}
