//! Microphone capture via `cpal`.
//!
//! [`Microphone::open`] acquires the input device and starts buffering
//! samples; the returned [`CaptureStream`] owns the device until
//! [`CaptureStream::stop`] (or drop) releases it.
//!
//! `cpal::Stream` is not `Send`, so [`CpalMicrophone`] builds and holds the
//! stream on a dedicated thread; the handle only carries a stop channel and
//! the shared sample buffer.

use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

// ---------------------------------------------------------------------------
// CapturedAudio
// ---------------------------------------------------------------------------

/// Everything recorded between `open()` and `stop()`.
///
/// Samples are interleaved `f32` in `[-1.0, 1.0]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedAudio {
    pub samples: Vec<f32>,
    /// Native rate of the device in Hz.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
}

impl CapturedAudio {
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / (self.sample_rate as f32 * self.channels as f32)
    }
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while acquiring the microphone.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("input device '{0}' not found")]
    DeviceNotFound(String),

    #[error("failed to query input device: {0}")]
    Config(String),

    #[error("failed to start input stream: {0}")]
    Stream(String),
}

impl From<cpal::BuildStreamError> for CaptureError {
    fn from(e: cpal::BuildStreamError) -> Self {
        match e {
            cpal::BuildStreamError::BackendSpecific { ref err }
                if err.description.to_lowercase().contains("permission") =>
            {
                CaptureError::PermissionDenied
            }
            other => CaptureError::Stream(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Microphone / CaptureStream traits
// ---------------------------------------------------------------------------

/// Source of recorded audio.
pub trait Microphone: Send + Sync {
    /// Acquire the input device and start capturing.
    fn open(&self) -> Result<Box<dyn CaptureStream>, CaptureError>;
}

/// An acquired, running capture.  Dropping it releases the device too.
pub trait CaptureStream: Send {
    /// Stop capturing, release the device and return what was recorded.
    fn stop(self: Box<Self>) -> CapturedAudio;
}

// ---------------------------------------------------------------------------
// CpalMicrophone
// ---------------------------------------------------------------------------

/// The system microphone, optionally selected by device name.
#[derive(Debug, Clone, Default)]
pub struct CpalMicrophone {
    device_name: Option<String>,
    /// Longest recording kept, in seconds.  Later samples are discarded.
    max_secs: f32,
}

impl CpalMicrophone {
    pub fn new(device_name: Option<String>, max_secs: f32) -> Self {
        Self {
            device_name,
            max_secs,
        }
    }

    fn device(&self) -> Result<cpal::Device, CaptureError> {
        let host = cpal::default_host();
        match self.device_name.as_deref() {
            Some(name) => host
                .input_devices()
                .map_err(|e| CaptureError::Config(e.to_string()))?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| CaptureError::DeviceNotFound(name.to_string())),
            None => host.default_input_device().ok_or(CaptureError::NoDevice),
        }
    }

    /// Build and start the stream.  Runs on the capture thread.
    fn start_stream(
        &self,
        buffer: Arc<Mutex<Vec<f32>>>,
    ) -> Result<(cpal::Stream, u32, u16), CaptureError> {
        let device = self.device()?;
        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::Config(e.to_string()))?;

        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        let cap = (self.max_secs.max(0.0) * sample_rate as f32) as usize * channels as usize;

        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mut samples = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                let room = cap.saturating_sub(samples.len());
                samples.extend_from_slice(&data[..data.len().min(room)]);
            },
            |err: cpal::StreamError| {
                log::error!("capture: cpal stream error: {err}");
            },
            None,
        )?;

        stream
            .play()
            .map_err(|e| CaptureError::Stream(e.to_string()))?;
        Ok((stream, sample_rate, channels))
    }
}

impl Microphone for CpalMicrophone {
    fn open(&self) -> Result<Box<dyn CaptureStream>, CaptureError> {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(u32, u16), CaptureError>>();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let mic = self.clone();
        let thread_buffer = Arc::clone(&buffer);
        let thread = std::thread::Builder::new()
            .name("medchat-capture".into())
            .spawn(move || {
                let stream = match mic.start_stream(thread_buffer) {
                    Ok((stream, rate, channels)) => {
                        let _ = ready_tx.send(Ok((rate, channels)));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                // Blocks until stop() or the handle is dropped.
                let _ = stop_rx.recv();
                drop(stream);
                log::debug!("capture: input stream released");
            })
            .map_err(|e| CaptureError::Stream(e.to_string()))?;

        let (sample_rate, channels) = ready_rx
            .recv()
            .map_err(|_| CaptureError::Stream("capture thread exited".into()))??;

        log::info!("capture: recording at {sample_rate} Hz, {channels} ch");
        Ok(Box::new(CpalCapture {
            buffer,
            sample_rate,
            channels,
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        }))
    }
}

/// Running cpal capture.
struct CpalCapture {
    buffer: Arc<Mutex<Vec<f32>>>,
    sample_rate: u32,
    channels: u16,
    stop_tx: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl CpalCapture {
    fn release(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("capture: thread panicked");
            }
        }
    }
}

impl CaptureStream for CpalCapture {
    fn stop(mut self: Box<Self>) -> CapturedAudio {
        self.release();
        let samples = std::mem::take(&mut *self.buffer.lock().unwrap_or_else(PoisonError::into_inner));
        CapturedAudio {
            samples,
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        self.release();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captured_audio_duration() {
        let audio = CapturedAudio {
            samples: vec![0.0; 96_000],
            sample_rate: 48_000,
            channels: 2,
        };
        assert!((audio.duration_secs() - 1.0).abs() < 1e-6);
        assert_eq!(CapturedAudio::default().duration_secs(), 0.0);
    }

    #[test]
    fn capture_stream_is_object_safe_and_send() {
        fn assert_send<T: Send + ?Sized>() {}
        assert_send::<Box<dyn CaptureStream>>();
        assert_send::<CpalCapture>();
    }

    #[test]
    fn microphone_is_shareable() {
        let mic: Arc<dyn Microphone> = Arc::new(CpalMicrophone::new(None, 60.0));
        drop(mic);
    }
}
