use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    controller::ADD_SOURCE_FAILED, AddSourceOutcome, AskMode, HttpBackend, InteractionController,
};
use shared::domain::clamp_temperature;
use tracing_subscriber::EnvFilter;

mod chat;
mod config;

use config::{load_settings, parse_mode, DEFAULT_CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(name = "qa-chat", about = "Ask questions against indexed web sources")]
struct Args {
    /// Base URL of the answering service.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask a single question and print the answer.
    Ask {
        question: String,
        #[arg(long, allow_negative_numbers = true)]
        temperature: Option<i64>,
    },
    /// List the sources the service has indexed.
    Sources,
    /// Index a new source.
    Add { url: String },
    /// Interactive session.
    Chat {
        /// `single` or `sources`.
        #[arg(long, value_parser = parse_mode_arg)]
        mode: Option<AskMode>,
    },
}

fn parse_mode_arg(raw: &str) -> Result<AskMode, String> {
    parse_mode(raw).ok_or_else(|| format!("unknown mode '{raw}', expected single or sources"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config);
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    let backend = Arc::new(
        HttpBackend::new(&settings.server_url).context("failed to configure backend client")?,
    );

    match args.command {
        Command::Ask {
            question,
            temperature,
        } => {
            let controller = InteractionController::new(backend, AskMode::SingleQuestion);
            controller.set_question_draft(question);
            controller.set_temperature(temperature.map_or(settings.temperature, clamp_temperature));
            if let Err(refusal) = controller.ask_question().await {
                bail!("{refusal}");
            }
            if let Some(answer) = controller.snapshot().answer {
                println!("{answer}");
            }
        }
        Command::Sources => {
            let controller = InteractionController::new(backend, AskMode::SourceScoped);
            controller
                .fetch_source_history()
                .await
                .context("failed to fetch source history")?;
            for source in controller.snapshot().sources {
                println!("{source}");
            }
        }
        Command::Add { url } => {
            let controller = InteractionController::new(backend, AskMode::SourceScoped);
            match controller.add_source(&url).await {
                Ok(AddSourceOutcome::Indexed { message }) => println!("{message}"),
                Ok(AddSourceOutcome::Failed) => bail!(ADD_SOURCE_FAILED),
                Err(refusal) => bail!("{refusal}"),
            }
        }
        Command::Chat { mode } => {
            let controller = InteractionController::new(backend, mode.unwrap_or(settings.mode));
            controller.set_temperature(settings.temperature);
            chat::run_chat(controller).await?;
        }
    }

    Ok(())
}
