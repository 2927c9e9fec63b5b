//! Session state store: every piece of mutable client state plus the pure
//! transitions the controller applies to it.

use shared::domain::{ChatTurn, Source};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub question_draft: String,
    pub temperature: u8,
    /// Url input of the add-source control.
    pub source_draft: String,
    pub sources: Vec<Source>,
    /// Not re-validated when `sources` is refreshed; may go stale.
    pub active_source: Option<Source>,
    pub transcript: Vec<ChatTurn>,
    pub answer: Option<String>,
    pub loading: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_question_draft(&mut self, text: impl Into<String>) {
        self.question_draft = text.into();
    }

    /// Stores `temperature` as given. Range enforcement belongs to the input
    /// control (see `shared::domain::clamp_temperature`).
    pub fn set_temperature(&mut self, temperature: u8) {
        self.temperature = temperature;
    }

    pub fn set_source_draft(&mut self, text: impl Into<String>) {
        self.source_draft = text.into();
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_answer(&mut self, text: impl Into<String>) {
        self.answer = Some(text.into());
    }

    pub fn append_turns(&mut self, turns: impl IntoIterator<Item = ChatTurn>) {
        self.transcript.extend(turns);
    }

    pub fn replace_sources(&mut self, sources: Vec<Source>) {
        self.sources = sources;
    }

    pub fn set_active_source(&mut self, source: impl Into<Source>) {
        self.active_source = Some(source.into());
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
