//! Speech playback: decode the `/speak` payload and play it on the speakers.
//!
//! * [`decode_audio`] — symphonia decode of an in-memory payload to mono f32.
//! * [`AudioOutput`] / [`PlaybackHandle`] — device seam; [`CpalOutput`]
//!   plays through cpal.
//! * [`SpeechPlayer`] — owns the one current playback.  Starting a new
//!   utterance stops the previous one first, so at most one is audible.

use std::io::Cursor;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::resample::{mono_to_interleaved, resample, stereo_to_mono};

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The payload is not audio symphonia can decode.
    #[error("failed to decode speech audio: {0}")]
    Decode(String),

    /// No usable output device.
    #[error("audio output device unavailable: {0}")]
    Device(String),

    /// The output stream could not be built or started.
    #[error("audio output stream failed: {0}")]
    Stream(String),
}

// ---------------------------------------------------------------------------
// DecodedAudio / decode_audio
// ---------------------------------------------------------------------------

/// Mono PCM ready for an output device.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

/// Decode an encoded payload (MP3 or WAV) to mono `f32`.
pub fn decode_audio(bytes: Vec<u8>) -> Result<DecodedAudio, PlaybackError> {
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::DecoderOptions;
    use symphonia::core::errors::Error as SymphError;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| PlaybackError::Decode(format!("probe: {e}")))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| PlaybackError::Decode("no default audio track".into()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| PlaybackError::Decode("unknown sample rate".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| PlaybackError::Decode(format!("decoder: {e}")))?;

    let mut out: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(PlaybackError::Decode(format!("read: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphError::DecodeError(_)) => continue,
            Err(e) => return Err(PlaybackError::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count();
        let required = decoded.frames().saturating_mul(channels);

        let needs_new = sample_buf.as_ref().map_or(true, |b| b.capacity() < required);
        if needs_new {
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }

        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            out.extend(stereo_to_mono(buf.samples(), channels as u16));
        }
    }

    Ok(DecodedAudio {
        samples: out,
        sample_rate,
    })
}

// ---------------------------------------------------------------------------
// AudioOutput / PlaybackHandle traits
// ---------------------------------------------------------------------------

/// Something that can make decoded audio audible.
pub trait AudioOutput: Send + Sync {
    /// Start playing `audio` and return immediately.
    fn play(&self, audio: DecodedAudio) -> Result<Box<dyn PlaybackHandle>, PlaybackError>;
}

/// One utterance being played.
pub trait PlaybackHandle: Send {
    /// Pause, rewind to the start and release the device.  Idempotent.
    fn stop(&mut self);

    /// `true` once every sample was played or `stop()` was called.
    fn is_finished(&self) -> bool;
}

// ---------------------------------------------------------------------------
// SpeechPlayer
// ---------------------------------------------------------------------------

/// Exclusive owner of the current speech playback.
pub struct SpeechPlayer {
    output: Arc<dyn AudioOutput>,
    current: Option<Box<dyn PlaybackHandle>>,
}

impl SpeechPlayer {
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        Self {
            output,
            current: None,
        }
    }

    /// Play already-decoded audio, stopping anything already playing.
    pub fn play(&mut self, audio: DecodedAudio) -> Result<(), PlaybackError> {
        self.stop();
        log::debug!("speech: playing {:.1}s", audio.duration().as_secs_f32());
        self.current = Some(self.output.play(audio)?);
        Ok(())
    }

    /// Stop and release the current playback.  Returns `true` if one was
    /// still audible.
    pub fn stop(&mut self) -> bool {
        match self.current.take() {
            Some(mut handle) => {
                let was_playing = !handle.is_finished();
                handle.stop();
                was_playing
            }
            None => false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.current.as_ref().is_some_and(|h| !h.is_finished())
    }
}

// ---------------------------------------------------------------------------
// CpalOutput
// ---------------------------------------------------------------------------

/// Plays through a cpal output device, optionally selected by name.
#[derive(Debug, Clone, Default)]
pub struct CpalOutput {
    device_name: Option<String>,
}

impl CpalOutput {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }

    fn device(&self) -> Result<cpal::Device, PlaybackError> {
        let host = cpal::default_host();
        match self.device_name.as_deref() {
            Some(name) => host
                .output_devices()
                .map_err(|e| PlaybackError::Device(e.to_string()))?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| PlaybackError::Device(format!("output device '{name}' not found"))),
            None => host
                .default_output_device()
                .ok_or_else(|| PlaybackError::Device("no default output device".into())),
        }
    }

    /// Build and start the stream.  Runs on the playback thread.
    fn start_stream(
        &self,
        audio: DecodedAudio,
        buffer: Arc<Mutex<PlaybackBuffer>>,
    ) -> Result<cpal::Stream, PlaybackError> {
        let device = self.device()?;
        let supported = device
            .default_output_config()
            .map_err(|e| PlaybackError::Device(e.to_string()))?;

        let channels = supported.channels();
        let rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        let mono = resample(&audio.samples, audio.sample_rate, rate);
        buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .samples = mono_to_interleaved(&mono, channels);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut buf = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                    buf.fill(data);
                },
                |err: cpal::StreamError| {
                    log::error!("speech: output stream error: {err}");
                },
                None,
            )
            .map_err(|e| PlaybackError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| PlaybackError::Stream(e.to_string()))?;
        Ok(stream)
    }
}

impl AudioOutput for CpalOutput {
    fn play(&self, audio: DecodedAudio) -> Result<Box<dyn PlaybackHandle>, PlaybackError> {
        let buffer = Arc::new(Mutex::new(PlaybackBuffer::default()));
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), PlaybackError>>();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let output = self.clone();
        let thread_buffer = Arc::clone(&buffer);
        std::thread::Builder::new()
            .name("medchat-speech".into())
            .spawn(move || {
                let stream = match output.start_stream(audio, Arc::clone(&thread_buffer)) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                // Hold the stream until the utterance ends or stop() is called.
                loop {
                    match stop_rx.recv_timeout(Duration::from_millis(20)) {
                        Err(mpsc::RecvTimeoutError::Timeout) => {
                            let done = thread_buffer
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .finished;
                            if done {
                                break;
                            }
                        }
                        _ => break,
                    }
                }
                let _ = stream.pause();
                drop(stream);
            })
            .map_err(|e| PlaybackError::Stream(e.to_string()))?;

        ready_rx
            .recv()
            .map_err(|_| PlaybackError::Stream("playback thread exited".into()))??;

        Ok(Box::new(CpalPlayback {
            buffer,
            stop_tx: Some(stop_tx),
        }))
    }
}

/// Samples shared with the cpal callback.
#[derive(Debug, Default)]
struct PlaybackBuffer {
    samples: Vec<f32>,
    position: usize,
    finished: bool,
}

impl PlaybackBuffer {
    fn fill(&mut self, data: &mut [f32]) {
        for sample in data.iter_mut() {
            match self.samples.get(self.position) {
                Some(&s) if !self.finished => {
                    *sample = s;
                    self.position += 1;
                }
                _ => {
                    *sample = 0.0;
                    self.finished = true;
                }
            }
        }
    }

    fn rewind(&mut self) {
        self.position = 0;
        self.finished = true;
    }
}

struct CpalPlayback {
    buffer: Arc<Mutex<PlaybackBuffer>>,
    stop_tx: Option<mpsc::Sender<()>>,
}

impl PlaybackHandle for CpalPlayback {
    fn stop(&mut self) {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .rewind();
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }

    fn is_finished(&self) -> bool {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .finished
    }
}

impl Drop for CpalPlayback {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
