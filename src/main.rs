//! Application entry point — terminal medical assistant chat.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create a current-thread [`tokio`] runtime.
//! 4. Build the HTTP backend, speaker output and microphone from config.
//! 5. Read commands from stdin until `/quit` or end of input.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use medchat::{
    audio::{CpalMicrophone, CpalOutput},
    backend::HttpBackend,
    config::AppConfig,
    session::ChatSession,
    ui::TerminalSurface,
};

const HELP: &str = "Type a message and press Enter.  /mic starts or stops voice input, \
/stop silences the assistant, /quit exits.";

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Send(&'a str),
    Mic,
    Stop,
    Help,
    Quit,
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim() {
            "/mic" => Command::Mic,
            "/stop" => Command::Stop,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            text => Command::Send(text),
        }
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("medchat starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    log::info!("backend: {}", config.backend.endpoint_url("chat"));

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(run(config))
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    // 4. Collaborators
    let backend = Arc::new(HttpBackend::from_config(&config.backend));
    let speaker = Arc::new(CpalOutput::new(config.speech.output_device.clone()));
    let mic = Arc::new(CpalMicrophone::new(
        config.voice.input_device.clone(),
        config.voice.max_recording_secs,
    ));

    let mut session = ChatSession::new(
        config,
        backend,
        speaker,
        mic,
        Box::new(TerminalSurface::stdout()),
    );

    // 5. Command loop
    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match Command::parse(&line) {
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::Stop => session.stop_speech(),
            Command::Mic => {
                session.toggle_recording().await;
            }
            Command::Send(text) => {
                session.send_message(text).await;
            }
        }
    }

    session.cancel_reveal();
    log::info!("medchat shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_recognised() {
        assert_eq!(Command::parse("/mic"), Command::Mic);
        assert_eq!(Command::parse(" /stop "), Command::Stop);
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("/exit"), Command::Quit);
        assert_eq!(Command::parse("/help"), Command::Help);
    }

    #[test]
    fn anything_else_is_sent() {
        assert_eq!(Command::parse("  hello  "), Command::Send("hello"));
        assert_eq!(Command::parse("/unknown"), Command::Send("/unknown"));
    }
}
