//! Interaction controller: validates user actions against the session state,
//! issues backend requests, and folds their results back into the state.
//!
//! All state lives in one `SessionState` behind a mutex that is never held
//! across an `.await`. Each action locks, mutates, unlocks, awaits the
//! backend, then locks again to apply the result. Only asking a question is
//! gated on `loading`: adding or selecting a source while an answer is in
//! flight is allowed, so the order in which their effects land depends on the
//! network.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::{
    domain::{ChatTurn, Source},
    protocol::{AddUrlRequest, AnswerReply, AnswerRequest},
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    backend::AnswerBackend,
    error::{BackendError, Refusal},
    state::SessionState,
};

pub const NO_VALID_ANSWER: &str = "Sorry, no valid answer received.";
pub const SOURCE_SCOPED_NO_VALID_ANSWER: &str = "No valid answer received.";
pub const REQUEST_FAILED: &str = "Sorry, something went wrong! Please try again.";
pub const ADD_SOURCE_FAILED: &str = "Failed to add URL.";

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AskMode {
    /// Questions go straight to the backend; no sources, no transcript.
    SingleQuestion,
    /// Questions require an active source and are recorded in the transcript.
    #[default]
    SourceScoped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Some field of the session state changed; take a fresh `snapshot()`.
    StateChanged,
    /// A message for the user (refusal prompt, backend confirmation, failure).
    Notice(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    Answered(String),
    Malformed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddSourceOutcome {
    Indexed { message: String },
    Failed,
}

pub struct InteractionController {
    backend: Arc<dyn AnswerBackend>,
    mode: AskMode,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl InteractionController {
    pub fn new(backend: Arc<dyn AnswerBackend>, mode: AskMode) -> Arc<Self> {
        Self::with_state(backend, mode, SessionState::new())
    }

    pub fn with_state(
        backend: Arc<dyn AnswerBackend>,
        mode: AskMode,
        state: SessionState,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            backend,
            mode,
            state: Mutex::new(state),
            events,
        })
    }

    pub fn mode(&self) -> AskMode {
        self.mode
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock_state().clone()
    }

    /// Session start hook. Source-scoped sessions load the source history;
    /// single-question sessions have nothing to prepare.
    pub async fn open_session(&self) {
        if self.mode == AskMode::SourceScoped {
            let _ = self.fetch_source_history().await;
        }
    }

    pub fn set_question_draft(&self, text: impl Into<String>) {
        let text = text.into();
        self.update(|state| state.set_question_draft(text));
    }

    pub fn set_temperature(&self, temperature: u8) {
        self.update(|state| state.set_temperature(temperature));
    }

    pub fn set_source_draft(&self, text: impl Into<String>) {
        let text = text.into();
        self.update(|state| state.set_source_draft(text));
    }

    /// Replaces the source registry with the backend's history. Failures are
    /// logged and leave the registry as it was.
    pub async fn fetch_source_history(&self) -> Result<(), BackendError> {
        match self.backend.url_history().await {
            Ok(sources) => {
                debug!(count = sources.len(), "source history refreshed");
                self.update(|state| state.replace_sources(sources));
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch source history");
                Err(err)
            }
        }
    }

    pub async fn add_source(&self, url: &str) -> Result<AddSourceOutcome, Refusal> {
        if url.is_empty() {
            return Err(self.refuse(Refusal::EmptyUrl));
        }

        let request = AddUrlRequest {
            url: url.to_string(),
        };
        match self.backend.add_url(&request).await {
            Ok(response) => {
                let message = response
                    .message
                    .unwrap_or_else(|| format!("Indexed {url}."));
                info!(url, "source indexed");
                self.notify(message.clone());
                self.update(|state| {
                    state.set_active_source(url);
                    state.set_source_draft("");
                });
                let _ = self.fetch_source_history().await;
                Ok(AddSourceOutcome::Indexed { message })
            }
            Err(err) => {
                warn!(url, error = %err, "failed to add source");
                self.notify(ADD_SOURCE_FAILED);
                Ok(AddSourceOutcome::Failed)
            }
        }
    }

    /// Submits whatever is currently in the url input.
    pub async fn add_source_from_draft(&self) -> Result<AddSourceOutcome, Refusal> {
        let url = self.lock_state().source_draft.clone();
        self.add_source(&url).await
    }

    /// Accepts any string, indexed or not.
    pub fn select_source(&self, url: impl Into<Source>) {
        let source = url.into();
        self.update(|state| state.set_active_source(source));
    }

    /// Asks whatever is currently in the question input.
    pub async fn ask_question(&self) -> Result<AskOutcome, Refusal> {
        let request = self.begin_ask(None)?;
        let _loading = LoadingGuard { controller: self };
        Ok(self.exchange(&request).await)
    }

    /// Takes the question as typed and starts the request in one step, so
    /// later edits of the input cannot change what gets sent. While an answer
    /// is pending the input is read-only: the draft is left alone and the
    /// submission is refused.
    pub fn submit_question(
        self: &Arc<Self>,
        question: impl Into<String>,
    ) -> Result<PendingAsk, Refusal> {
        let request = self.begin_ask(Some(question.into()))?;
        Ok(PendingAsk {
            controller: Arc::clone(self),
            request,
        })
    }

    fn begin_ask(&self, question: Option<String>) -> Result<AnswerRequest, Refusal> {
        let (started, changed) = {
            let mut state = self.lock_state();
            let mut changed = false;
            if let Some(question) = question {
                if !state.loading {
                    state.set_question_draft(question);
                    changed = true;
                }
            }
            let started = self.check_ask(&state).map(|()| {
                state.set_loading(true);
                AnswerRequest {
                    question: state.question_draft.clone(),
                    temperature: state.temperature,
                }
            });
            changed |= started.is_ok();
            (started, changed)
        };
        if changed {
            self.emit(SessionEvent::StateChanged);
        }
        started.map_err(|refusal| self.refuse(refusal))
    }

    async fn exchange(&self, request: &AnswerRequest) -> AskOutcome {
        // TODO: send the active source along once /get_answer accepts one;
        // today it only gates the request client-side.
        let outcome = match self.backend.get_answer(request).await {
            Ok(AnswerReply::Answer(answer)) => AskOutcome::Answered(answer),
            Ok(AnswerReply::Malformed) => {
                debug!("answer response carried no answer");
                AskOutcome::Malformed
            }
            Err(err) => {
                warn!(error = %err, "answer request failed");
                AskOutcome::Failed
            }
        };
        self.settle_answer(&request.question, &outcome);
        outcome
    }

    fn check_ask(&self, state: &SessionState) -> Result<(), Refusal> {
        if self.mode == AskMode::SourceScoped && state.active_source.is_none() {
            return Err(Refusal::NoActiveSource);
        }
        if state.question_draft.is_empty() {
            return Err(Refusal::EmptyQuestion);
        }
        if state.loading {
            return Err(Refusal::AlreadyLoading);
        }
        Ok(())
    }

    fn settle_answer(&self, question: &str, outcome: &AskOutcome) {
        let mode = self.mode;
        self.update(|state| match (outcome, mode) {
            (AskOutcome::Answered(answer), AskMode::SingleQuestion) => {
                state.set_answer(answer.as_str());
            }
            (AskOutcome::Answered(answer), AskMode::SourceScoped) => {
                state.set_answer(answer.as_str());
                state.append_turns([ChatTurn::user(question), ChatTurn::bot(answer.as_str())]);
            }
            (AskOutcome::Malformed, AskMode::SingleQuestion) => {
                state.set_answer(NO_VALID_ANSWER);
            }
            (AskOutcome::Malformed, AskMode::SourceScoped) => {
                state.set_answer(SOURCE_SCOPED_NO_VALID_ANSWER);
                state.append_turns([
                    ChatTurn::user(question),
                    ChatTurn::bot(SOURCE_SCOPED_NO_VALID_ANSWER),
                ]);
            }
            // The question is not recorded when the request itself failed.
            (AskOutcome::Failed, _) => {
                state.set_answer(REQUEST_FAILED);
            }
        });
    }

    fn refuse(&self, refusal: Refusal) -> Refusal {
        debug!(?refusal, "action refused");
        self.notify(refusal.to_string());
        refusal
    }

    fn notify(&self, message: impl Into<String>) {
        self.emit(SessionEvent::Notice(message.into()));
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    fn update<R>(&self, apply: impl FnOnce(&mut SessionState) -> R) -> R {
        let result = {
            let mut state = self.lock_state();
            apply(&mut *state)
        };
        self.emit(SessionEvent::StateChanged);
        result
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears `loading` however the answer request exits, including when the
/// future is dropped mid-request.
struct LoadingGuard<'a> {
    controller: &'a InteractionController,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.controller.update(|state| state.set_loading(false));
    }
}

/// An answer request whose question is fixed and whose `loading` flag is
/// already set. Dropping it, sent or not, clears `loading`.
pub struct PendingAsk {
    controller: Arc<InteractionController>,
    request: AnswerRequest,
}

impl std::fmt::Debug for PendingAsk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingAsk")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl PendingAsk {
    pub fn question(&self) -> &str {
        &self.request.question
    }

    pub async fn send(self) -> AskOutcome {
        self.controller.exchange(&self.request).await
    }
}

impl Drop for PendingAsk {
    fn drop(&mut self) {
        self.controller.update(|state| state.set_loading(false));
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
