//! Interactive chat loop: reads commands from stdin, turns them into
//! controller actions, and renders session events to stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use client_core::{AskMode, InteractionController, SessionEvent, SessionState};
use shared::domain::{ChatRole, ChatTurn, Source};
use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
    task::JoinHandle,
};
use tracing::debug;

use crate::config::parse_temperature;

const HELP: &str = "\
Commands:
  /add <url>     index a new source and make it active
  /use <url>     make a source active
  /sources       refresh the list of indexed sources
  /temp <0-10>   set the answer temperature
  /history       print the chat transcript
  /help          show this help
  /quit          leave
Anything else is sent as a question.";

const SINGLE_QUESTION_HELP: &str = "\
Commands:
  /temp <0-10>   set the answer temperature
  /help          show this help
  /quit          leave
Anything else is sent as a question.";

pub const NO_SOURCES_IN_SINGLE_MODE: &str =
    "Sources are not used in single-question mode; start with --mode sources.";

pub fn help_text(mode: AskMode) -> &'static str {
    match mode {
        AskMode::SingleQuestion => SINGLE_QUESTION_HELP,
        AskMode::SourceScoped => HELP,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Ask(String),
    Add(String),
    Use(String),
    Sources,
    Temperature(Option<u8>),
    History,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Ask(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name {
            "add" => Self::Add(arg.to_string()),
            "use" => Self::Use(arg.to_string()),
            "sources" => Self::Sources,
            "temp" => Self::Temperature(parse_temperature(arg)),
            "history" => Self::History,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Turns successive state snapshots into the lines the terminal prints.
#[derive(Debug, Default)]
pub struct Renderer {
    last: SessionState,
}

impl Renderer {
    pub fn new(initial: SessionState) -> Self {
        Self { last: initial }
    }

    pub fn render(&mut self, state: &SessionState) -> Vec<String> {
        let mut lines = Vec::new();

        if state.sources != self.last.sources {
            lines.push(format_sources(&state.sources));
        }
        if state.active_source != self.last.active_source {
            if let Some(source) = &state.active_source {
                lines.push(format!("Active source: {source}"));
            }
        }
        if state.loading && !self.last.loading {
            lines.push("Thinking...".to_string());
        }
        if state.transcript.len() > self.last.transcript.len() {
            lines.extend(
                state.transcript[self.last.transcript.len()..]
                    .iter()
                    .filter(|turn| turn.role() == ChatRole::Bot)
                    .map(format_turn),
            );
        } else if state.answer != self.last.answer {
            if let Some(answer) = &state.answer {
                lines.push(format!("Bot: {answer}"));
            }
        }

        self.last = state.clone();
        lines
    }
}

pub fn format_turn(turn: &ChatTurn) -> String {
    match turn.role() {
        ChatRole::User => format!("You: {}", turn.text()),
        ChatRole::Bot => format!("Bot: {}", turn.text()),
    }
}

pub fn format_sources(sources: &[Source]) -> String {
    if sources.is_empty() {
        return "No indexed sources yet.".to_string();
    }
    let listed: Vec<&str> = sources.iter().map(Source::as_str).collect();
    format!("Indexed sources: {}", listed.join(", "))
}

fn spawn_renderer(controller: Arc<InteractionController>) -> JoinHandle<()> {
    let mut events = controller.subscribe_events();
    let mut renderer = Renderer::new(controller.snapshot());
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::Notice(message)) => println!("! {message}"),
                Ok(SessionEvent::StateChanged) => {
                    for line in renderer.render(&controller.snapshot()) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "renderer lagged behind session events");
                    for line in renderer.render(&controller.snapshot()) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Applies one command from the input loop. Network work is spawned and its
/// handle returned; the loop does not wait on it.
pub fn dispatch(
    controller: &Arc<InteractionController>,
    command: ChatCommand,
) -> Option<JoinHandle<()>> {
    let single_question = controller.mode() == AskMode::SingleQuestion;
    match command {
        ChatCommand::Quit | ChatCommand::Empty => None,
        ChatCommand::Help => {
            println!("{}", help_text(controller.mode()));
            None
        }
        ChatCommand::Unknown(name) => {
            println!("Unknown command /{name}; try /help");
            None
        }
        ChatCommand::Temperature(Some(temperature)) => {
            controller.set_temperature(temperature);
            None
        }
        ChatCommand::Temperature(None) => {
            println!("Usage: /temp <0-10>");
            None
        }
        ChatCommand::Add(_) | ChatCommand::Use(_) | ChatCommand::Sources | ChatCommand::History
            if single_question =>
        {
            println!("{NO_SOURCES_IN_SINGLE_MODE}");
            None
        }
        ChatCommand::Use(url) => {
            controller.select_source(url);
            None
        }
        ChatCommand::History => {
            for turn in &controller.snapshot().transcript {
                println!("{}", format_turn(turn));
            }
            None
        }
        ChatCommand::Sources => {
            let controller = Arc::clone(controller);
            Some(tokio::spawn(async move {
                let _ = controller.fetch_source_history().await;
            }))
        }
        ChatCommand::Add(url) => {
            controller.set_source_draft(url.clone());
            let controller = Arc::clone(controller);
            Some(tokio::spawn(async move {
                let _ = controller.add_source(&url).await;
            }))
        }
        // Refusals reach the user as notices.
        ChatCommand::Ask(question) => controller.submit_question(question).ok().map(|pending| {
            tokio::spawn(async move {
                pending.send().await;
            })
        }),
    }
}

pub async fn run_chat(controller: Arc<InteractionController>) -> Result<()> {
    let renderer = spawn_renderer(Arc::clone(&controller));
    controller.open_session().await;
    println!("{}", help_text(controller.mode()));

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match ChatCommand::parse(&line) {
            ChatCommand::Quit => break,
            command => {
                dispatch(&controller, command);
            }
        }
    }

    renderer.abort();
    Ok(())
}

#[cfg(test)]
#[path = "tests/chat_tests.rs"]
mod tests;
