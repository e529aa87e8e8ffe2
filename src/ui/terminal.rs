//! Terminal display: a [`ChatSurface`] that prints to a writer and a
//! [`RevealSink`] that types assistant replies into it.

use std::io::{IsTerminal, Write};
use std::sync::{Arc, Mutex, PoisonError};

use crate::conversation::TurnHandle;
use crate::reveal::{shared_sink, RevealSink, SharedSink};
use crate::session::ChatSurface;

use super::ansi::{AnsiStyler, BOLD, CLEAR_TO_EOL, CYAN, DIM, MAGENTA, RED, RESET, YELLOW};

/// Output shared by the surface and every sink it opens.
pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

const CURSOR: &str = "▌";
const CURSOR_BACK: &str = "\x1b[1D";

fn write_out(out: &SharedWriter, text: &str) {
    let mut out = out.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(e) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
        log::debug!("terminal: write failed: {e}");
    }
}

// ---------------------------------------------------------------------------
// TerminalSink
// ---------------------------------------------------------------------------

/// One assistant reply being typed into the terminal.
pub struct TerminalSink {
    out: SharedWriter,
    styler: AnsiStyler,
    cursor: bool,
}

impl TerminalSink {
    pub fn new(out: SharedWriter, cursor: bool) -> Self {
        Self {
            out,
            styler: AnsiStyler::new(),
            cursor,
        }
    }
}

impl RevealSink for TerminalSink {
    fn append(&mut self, fragment: &str) {
        let text = self.styler.render(fragment);
        if self.cursor {
            write_out(&self.out, &format!("{CLEAR_TO_EOL}{text}{CURSOR}{CURSOR_BACK}"));
        } else {
            write_out(&self.out, &text);
        }
    }

    fn finish(&mut self) {
        let reset = self.styler.reset();
        if self.cursor {
            write_out(&self.out, &format!("{CLEAR_TO_EOL}{reset}\n"));
        } else {
            write_out(&self.out, &format!("{reset}\n"));
        }
    }
}

// ---------------------------------------------------------------------------
// TerminalSurface
// ---------------------------------------------------------------------------

/// Prints the conversation as labelled lines.
pub struct TerminalSurface {
    out: SharedWriter,
    cursor: bool,
}

impl TerminalSurface {
    /// Print to `out` without a typing cursor.
    pub fn new(out: SharedWriter) -> Self {
        Self { out, cursor: false }
    }

    /// Print to stdout; the typing cursor is shown when stdout is a terminal.
    pub fn stdout() -> Self {
        let cursor = std::io::stdout().is_terminal();
        Self {
            out: Arc::new(Mutex::new(std::io::stdout())),
            cursor,
        }
    }

    fn write(&self, text: &str) {
        write_out(&self.out, text);
    }
}

impl ChatSurface for TerminalSurface {
    fn show_user_turn(&mut self, _handle: TurnHandle, text: &str) {
        self.write(&format!("{BOLD}{CYAN}You:{RESET} {text}\n"));
    }

    fn open_assistant_turn(&mut self, _handle: TurnHandle) -> SharedSink {
        self.write(&format!("{BOLD}{MAGENTA}Assistant:{RESET} "));
        shared_sink(TerminalSink::new(Arc::clone(&self.out), self.cursor))
    }

    fn set_waiting(&mut self, waiting: bool) {
        if waiting {
            self.write(&format!("{DIM}typing…{RESET}"));
        } else {
            self.write(&format!("\r{CLEAR_TO_EOL}"));
        }
    }

    fn set_recording(&mut self, recording: bool) {
        if recording {
            self.write(&format!("{RED}● recording (/mic to stop){RESET}\n"));
        } else {
            self.write(&format!("{DIM}■ recording stopped{RESET}\n"));
        }
    }

    fn alert(&mut self, message: &str) {
        self.write(&format!("{BOLD}{YELLOW}{message}{RESET}\n"));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::conversation::{MessageStore, Speaker};
    use crate::markup::{tokenize, MarkupPipeline};
    use crate::config::RevealConfig;
    use crate::reveal::RevealScheduler;

    fn buffer() -> (Arc<Mutex<Vec<u8>>>, SharedWriter) {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let out: SharedWriter = buf.clone();
        (buf, out)
    }

    fn text(buf: &Arc<Mutex<Vec<u8>>>) -> String {
        String::from_utf8(buf.lock().unwrap().clone()).unwrap()
    }

    fn handle() -> TurnHandle {
        MessageStore::new().append(Speaker::User, "x")
    }

    #[test]
    fn user_turn_is_labelled() {
        let (buf, out) = buffer();
        let mut surface = TerminalSurface::new(out);
        surface.show_user_turn(handle(), "hello");
        assert_eq!(text(&buf), format!("{BOLD}{CYAN}You:{RESET} hello\n"));
    }

    #[test]
    fn alert_is_printed() {
        let (buf, out) = buffer();
        let mut surface = TerminalSurface::new(out);
        surface.alert("❌ Microphone permission blocked.");
        assert!(text(&buf).contains("❌ Microphone permission blocked."));
    }

    #[tokio::test(start_paused = true)]
    async fn reveal_prints_styled_reply() {
        let (buf, out) = buffer();
        let mut surface = TerminalSurface::new(out);
        let sink = surface.open_assistant_turn(handle());

        let pipeline = MarkupPipeline::from_config(&RevealConfig::default());
        let mut scheduler = RevealScheduler::new();
        scheduler
            .play(pipeline.tokenize("Rest & **fluids**"), sink, Duration::from_millis(5))
            .wait()
            .await;

        let printed = text(&buf);
        assert!(printed.starts_with(&format!("{BOLD}{MAGENTA}Assistant:{RESET} ")));
        assert!(printed.contains(&format!("Rest & {BOLD}fluids{RESET}")));
        assert!(printed.ends_with(&format!("{RESET}\n")));
        assert!(!printed.contains("&amp;"));
        assert!(!printed.contains("<strong>"));
    }

    #[tokio::test(start_paused = true)]
    async fn cursor_is_erased_on_finish() {
        let (buf, out) = buffer();
        let sink = shared_sink(TerminalSink::new(out, true));

        RevealScheduler::new()
            .play(tokenize("ok"), sink, Duration::from_millis(5))
            .wait()
            .await;

        let printed = text(&buf);
        assert!(printed.contains(CURSOR));
        assert!(printed.ends_with(&format!("{CLEAR_TO_EOL}{RESET}\n")));
    }
}
