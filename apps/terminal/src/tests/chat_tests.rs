use super::*;
use std::sync::Mutex;

use async_trait::async_trait;
use client_core::{AnswerBackend, BackendError};
use shared::protocol::{AddUrlRequest, AddUrlResponse, AnswerReply, AnswerRequest};

/// Answers every question with "Paris" and remembers what was sent.
#[derive(Default)]
struct RecordingBackend {
    questions: Mutex<Vec<String>>,
    urls: Mutex<Vec<String>>,
}

#[async_trait]
impl AnswerBackend for RecordingBackend {
    async fn get_answer(&self, request: &AnswerRequest) -> Result<AnswerReply, BackendError> {
        self.questions
            .lock()
            .expect("questions")
            .push(request.question.clone());
        Ok(AnswerReply::Answer("Paris".to_string()))
    }

    async fn url_history(&self) -> Result<Vec<Source>, BackendError> {
        let urls = self.urls.lock().expect("urls");
        Ok(urls.iter().map(|url| Source::from(url.as_str())).collect())
    }

    async fn add_url(&self, request: &AddUrlRequest) -> Result<AddUrlResponse, BackendError> {
        self.urls.lock().expect("urls").push(request.url.clone());
        Ok(AddUrlResponse {
            message: Some("Successfully indexed.".to_string()),
        })
    }
}

fn chat_session(mode: AskMode) -> (Arc<InteractionController>, Arc<RecordingBackend>) {
    let backend = Arc::new(RecordingBackend::default());
    let controller =
        InteractionController::new(Arc::clone(&backend) as Arc<dyn AnswerBackend>, mode);
    (controller, backend)
}

#[test]
fn plain_lines_are_questions() {
    assert_eq!(
        ChatCommand::parse("  capital of France? "),
        ChatCommand::Ask("capital of France?".into())
    );
    assert_eq!(ChatCommand::parse("   "), ChatCommand::Empty);
}

#[test]
fn slash_commands_take_trimmed_arguments() {
    assert_eq!(
        ChatCommand::parse("/add   http://x.test  "),
        ChatCommand::Add("http://x.test".into())
    );
    assert_eq!(
        ChatCommand::parse("/use http://a.test"),
        ChatCommand::Use("http://a.test".into())
    );
    assert_eq!(ChatCommand::parse("/add"), ChatCommand::Add(String::new()));
    assert_eq!(ChatCommand::parse("/sources"), ChatCommand::Sources);
    assert_eq!(ChatCommand::parse("/history"), ChatCommand::History);
    assert_eq!(ChatCommand::parse("/exit"), ChatCommand::Quit);
    assert_eq!(
        ChatCommand::parse("/frobnicate now"),
        ChatCommand::Unknown("frobnicate".into())
    );
}

#[test]
fn temperature_command_clamps_to_slider_range() {
    assert_eq!(ChatCommand::parse("/temp 4"), ChatCommand::Temperature(Some(4)));
    assert_eq!(ChatCommand::parse("/temp 99"), ChatCommand::Temperature(Some(10)));
    assert_eq!(ChatCommand::parse("/temp hot"), ChatCommand::Temperature(None));
}

#[test]
fn renderer_reports_loading_then_new_bot_turns() {
    let mut renderer = Renderer::default();
    let mut state = SessionState::new();

    state.set_loading(true);
    assert_eq!(renderer.render(&state), vec!["Thinking...".to_string()]);

    state.set_answer("Paris");
    state.append_turns([ChatTurn::user("capital of France?"), ChatTurn::bot("Paris")]);
    state.set_loading(false);
    assert_eq!(renderer.render(&state), vec!["Bot: Paris".to_string()]);

    assert!(renderer.render(&state).is_empty(), "unchanged state prints nothing");
}

#[test]
fn renderer_prints_answer_changes_without_transcript() {
    let mut renderer = Renderer::default();
    let mut state = SessionState::new();
    state.set_answer("Sorry, something went wrong! Please try again.");

    assert_eq!(
        renderer.render(&state),
        vec!["Bot: Sorry, something went wrong! Please try again.".to_string()]
    );
}

#[test]
fn renderer_reports_registry_and_selection_changes() {
    let mut renderer = Renderer::default();
    let mut state = SessionState::new();
    state.replace_sources(vec![Source::from("http://a.test"), Source::from("http://x.test")]);
    state.set_active_source("http://x.test");

    assert_eq!(
        renderer.render(&state),
        vec![
            "Indexed sources: http://a.test, http://x.test".to_string(),
            "Active source: http://x.test".to_string(),
        ]
    );
}

#[test]
fn empty_registry_has_its_own_message() {
    assert_eq!(format_sources(&[]), "No indexed sources yet.");
}

#[test]
fn turns_are_labelled_by_role() {
    assert_eq!(format_turn(&ChatTurn::user("hi")), "You: hi");
    assert_eq!(format_turn(&ChatTurn::bot("hello")), "Bot: hello");
}

#[tokio::test]
async fn back_to_back_question_lines_send_the_first_question() {
    let (controller, backend) = chat_session(AskMode::SingleQuestion);

    let first = dispatch(&controller, ChatCommand::parse("first question"));
    let second = dispatch(&controller, ChatCommand::parse("second question"));
    assert!(second.is_none(), "second line is refused while loading");

    first.expect("first question spawned").await.expect("join");

    assert_eq!(
        *backend.questions.lock().expect("questions"),
        vec!["first question".to_string()]
    );
    let state = controller.snapshot();
    assert_eq!(state.answer.as_deref(), Some("Paris"));
    assert!(!state.loading);
}

#[tokio::test]
async fn back_to_back_add_lines_index_each_url() {
    let (controller, backend) = chat_session(AskMode::SourceScoped);

    let first = dispatch(&controller, ChatCommand::parse("/add http://a.test"));
    let second = dispatch(&controller, ChatCommand::parse("/add http://b.test"));
    first.expect("first add spawned").await.expect("join");
    second.expect("second add spawned").await.expect("join");

    let mut urls = backend.urls.lock().expect("urls").clone();
    urls.sort();
    assert_eq!(urls, vec!["http://a.test".to_string(), "http://b.test".to_string()]);
}

#[tokio::test]
async fn single_question_mode_ignores_source_commands() {
    let (controller, backend) = chat_session(AskMode::SingleQuestion);

    for line in ["/add http://a.test", "/use http://a.test", "/sources", "/history"] {
        assert!(dispatch(&controller, ChatCommand::parse(line)).is_none());
    }

    assert!(backend.urls.lock().expect("urls").is_empty());
    assert_eq!(controller.snapshot().active_source, None);
}

#[test]
fn help_lists_source_commands_only_when_source_scoped() {
    assert!(help_text(AskMode::SourceScoped).contains("/add <url>"));
    assert!(!help_text(AskMode::SingleQuestion).contains("/add"));
    assert!(!help_text(AskMode::SingleQuestion).contains("/use"));
}
