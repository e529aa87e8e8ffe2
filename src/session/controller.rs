//! `ChatSession` — one conversation with the assistant.
//!
//! # Send flow
//!
//! ```text
//! send_message(text)
//!   ├─ trim; ignore if empty
//!   ├─ store.append(User) → surface.show_user_turn
//!   ├─ stop_speech()                       (older reply must not start talking)
//!   ├─ surface.set_waiting(true) → backend.chat → set_waiting(false)
//!   ├─ AssistantMessage::from_chat         (response / error / fallback)
//!   ├─ settle previous reveal → store.append(Assistant) → pipeline.tokenize
//!   ├─ store.begin_reveal → scheduler.play(tokens, surface sink)
//!   └─ speak(text) on a tokio task         (genuine replies only)
//! ```
//!
//! The session owns every stateful resource: the speech player, the
//! in-flight speak task, the voice recorder and the current reveal.
//!
//! Audio decoding, device open and recording encode run on tokio's
//! blocking pool, so a reveal keeps typing while they complete.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use crate::audio::{decode_audio, AudioOutput, Microphone, SpeechPlayer, VoiceRecorder};
use crate::backend::AssistantBackend;
use crate::config::AppConfig;
use crate::conversation::{MessageStore, Speaker, TurnHandle};
use crate::markup::MarkupPipeline;
use crate::reveal::{RevealHandle, RevealOutcome, RevealScheduler};

use super::reply::AssistantMessage;
use super::surface::ChatSurface;

// ---------------------------------------------------------------------------
// Speech slot
// ---------------------------------------------------------------------------

/// Player plus a counter bumped by every `stop_speech()`.  A speak task
/// only starts playback if the counter still matches the value it was
/// spawned with.
struct SpeechSlot {
    player: SpeechPlayer,
    epoch: u64,
}

type SharedSpeech = Arc<Mutex<SpeechSlot>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// ChatSession
// ---------------------------------------------------------------------------

/// Controller for one chat session.
///
/// Must be driven from within a tokio runtime: reveals and speech requests
/// run as spawned tasks.
pub struct ChatSession {
    config: AppConfig,
    store: MessageStore,
    pipeline: MarkupPipeline,
    scheduler: RevealScheduler,
    backend: Arc<dyn AssistantBackend>,
    speech: SharedSpeech,
    speech_task: Option<JoinHandle<()>>,
    recorder: Arc<Mutex<VoiceRecorder>>,
    surface: Box<dyn ChatSurface>,
    current: Option<(TurnHandle, RevealHandle)>,
}

impl ChatSession {
    pub fn new(
        config: AppConfig,
        backend: Arc<dyn AssistantBackend>,
        speaker: Arc<dyn AudioOutput>,
        mic: Arc<dyn Microphone>,
        surface: Box<dyn ChatSurface>,
    ) -> Self {
        let pipeline = MarkupPipeline::from_config(&config.reveal);
        let recorder = Arc::new(Mutex::new(VoiceRecorder::new(mic, config.voice.clone())));
        Self {
            store: MessageStore::new(),
            pipeline,
            scheduler: RevealScheduler::new(),
            backend,
            speech: Arc::new(Mutex::new(SpeechSlot {
                player: SpeechPlayer::new(speaker),
                epoch: 0,
            })),
            speech_task: None,
            recorder,
            surface,
            current: None,
            config,
        }
    }

    /// The conversation so far.
    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn is_recording(&self) -> bool {
        lock(&self.recorder).is_recording()
    }

    pub fn is_speaking(&self) -> bool {
        lock(&self.speech).player.is_playing()
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    /// Send one user message and start revealing the answer.
    ///
    /// Returns the assistant turn, or `None` when `text` is blank.  Never
    /// fails: every backend problem becomes an assistant bubble.
    pub async fn send_message(&mut self, text: &str) -> Option<TurnHandle> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.settle_finished();

        let user = self.store.append(Speaker::User, text);
        self.surface.show_user_turn(user, text);

        self.stop_speech();

        self.surface.set_waiting(true);
        let outcome = self.backend.chat(text).await;
        self.surface.set_waiting(false);

        let message = AssistantMessage::from_chat(outcome, &self.config.messages);
        let handle = self.show_assistant_turn(&message.text);
        if message.speak {
            self.speak(message.text);
        }
        Some(handle)
    }

    /// Append an assistant turn and start its reveal, cancelling any reveal
    /// still streaming.
    fn show_assistant_turn(&mut self, text: &str) -> TurnHandle {
        if let Some((previous, reveal)) = self.current.take() {
            if reveal.cancel() {
                log::debug!("session: reveal of turn #{} cut short", previous.index());
            }
            self.complete(previous);
        }

        let handle = self.store.append(Speaker::Assistant, text);
        let tokens = self.pipeline.tokenize(text);
        if let Err(e) = self.store.begin_reveal(handle, tokens.clone()) {
            log::error!("session: cannot start reveal: {e}");
        }

        let sink = self.surface.open_assistant_turn(handle);
        let reveal = self
            .scheduler
            .play(tokens, sink, self.config.reveal.char_delay());
        self.current = Some((handle, reveal));
        handle
    }

    /// Wait for the current reveal to end and mark its turn complete.
    ///
    /// Returns `None` when nothing was revealing.
    pub async fn wait_reveal(&mut self) -> Option<RevealOutcome> {
        let (handle, mut reveal) = self.current.take()?;
        let outcome = reveal.wait().await;
        self.complete(handle);
        Some(outcome)
    }

    /// Cancel the current reveal, leaving what was already shown.
    pub fn cancel_reveal(&mut self) -> bool {
        match self.current.take() {
            Some((handle, reveal)) => {
                let cancelled = reveal.cancel();
                self.complete(handle);
                cancelled
            }
            None => false,
        }
    }

    /// Mark the current turn complete if its reveal already ended on its own.
    pub fn settle_finished(&mut self) {
        let done = self
            .current
            .as_ref()
            .is_some_and(|(_, reveal)| reveal.phase().is_terminal());
        if done {
            if let Some((handle, _)) = self.current.take() {
                self.complete(handle);
            }
        }
    }

    fn complete(&mut self, handle: TurnHandle) {
        if let Err(e) = self.store.complete_reveal(handle) {
            log::error!("session: cannot complete turn #{}: {e}", handle.index());
        }
    }

    // -----------------------------------------------------------------------
    // Speech
    // -----------------------------------------------------------------------

    /// Request `/speak` for `text` and play the result.  Failures are logged
    /// only.
    fn speak(&mut self, text: String) {
        if !self.config.speech.enabled {
            return;
        }

        let backend = Arc::clone(&self.backend);
        let speech = Arc::clone(&self.speech);
        let epoch = lock(&speech).epoch;

        self.speech_task = Some(tokio::spawn(async move {
            let bytes = match backend.speak(&text).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("speech playback failed: {e}");
                    return;
                }
            };

            // Decode + device open (blocking → thread pool)
            let played = tokio::task::spawn_blocking(move || {
                let audio = decode_audio(bytes)?;
                let mut slot = lock(&speech);
                if slot.epoch != epoch {
                    log::debug!("speech: stale utterance dropped");
                    return Ok(());
                }
                slot.player.play(audio)
            })
            .await;

            match played {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::warn!("speech playback failed: {e}"),
                Err(e) => log::warn!("speech: playback task panicked: {e}"),
            }
        }));
    }

    /// Stop any audible reply and abandon any speak request in flight.
    pub fn stop_speech(&mut self) {
        if let Some(task) = self.speech_task.take() {
            task.abort();
        }
        let mut slot = lock(&self.speech);
        slot.epoch += 1;
        if slot.player.stop() {
            log::debug!("speech: stopped");
        }
    }

    /// Wait for the pending speak request (if any) to finish.
    pub async fn wait_speech(&mut self) {
        if let Some(task) = self.speech_task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    log::warn!("speech: task ended abnormally: {e}");
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Voice
    // -----------------------------------------------------------------------

    /// Start recording, or stop and send what was said.
    ///
    /// A refused microphone raises the `mic_blocked` alert and recording
    /// does not start.  On stop the recording is transcribed and a
    /// non-empty transcription is sent as a user message; transcription
    /// failures are logged only.
    pub async fn toggle_recording(&mut self) -> Option<TurnHandle> {
        let recorder = Arc::clone(&self.recorder);

        if !self.is_recording() {
            // Device open (blocking → thread pool)
            let started = tokio::task::spawn_blocking(move || {
                let mut recorder = lock(&recorder);
                recorder.start()
            })
            .await;
            match started {
                Ok(Ok(())) => self.surface.set_recording(true),
                Ok(Err(e)) => {
                    log::warn!("voice: microphone unavailable: {e}");
                    self.surface.alert(&self.config.messages.mic_blocked);
                }
                Err(e) => {
                    log::warn!("voice: microphone task panicked: {e}");
                    self.surface.alert(&self.config.messages.mic_blocked);
                }
            }
            return None;
        }

        // Release + resample + WAV encode (blocking → thread pool)
        let recording = tokio::task::spawn_blocking(move || {
            let mut recorder = lock(&recorder);
            recorder.stop()
        })
        .await;
        self.surface.set_recording(false);

        let wav = match recording {
            Ok(Ok(wav)) => wav,
            Ok(Err(e)) => {
                log::warn!("voice: recording unusable: {e}");
                return None;
            }
            Err(e) => {
                log::warn!("voice: recording task panicked: {e}");
                return None;
            }
        };

        match self.backend.voice(wav).await {
            Ok(text) if !text.trim().is_empty() => self.send_message(&text).await,
            Ok(_) => {
                log::info!("voice: nothing transcribed");
                None
            }
            Err(e) => {
                log::warn!("voice: transcription failed: {e}");
                None
            }
        }
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.scheduler.cancel();
        self.stop_speech();
        lock(&self.recorder).discard();
    }
}
