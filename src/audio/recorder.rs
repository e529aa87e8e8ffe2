//! Two-state voice recorder: idle ⇄ recording.
//!
//! The microphone is held only while recording; [`VoiceRecorder::stop`]
//! always releases it, even when encoding the recording fails.

use std::sync::Arc;

use thiserror::Error;

use crate::config::VoiceConfig;

use super::capture::{CaptureError, CaptureStream, Microphone};
use super::resample::{resample, stereo_to_mono};
use super::wav::encode_wav;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("not recording")]
    NotRecording,

    #[error("already recording")]
    AlreadyRecording,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("failed to encode recording: {0}")]
    Encode(#[from] hound::Error),
}

/// Owns the microphone while a recording is in progress.
pub struct VoiceRecorder {
    mic: Arc<dyn Microphone>,
    config: VoiceConfig,
    stream: Option<Box<dyn CaptureStream>>,
}

impl VoiceRecorder {
    pub fn new(mic: Arc<dyn Microphone>, config: VoiceConfig) -> Self {
        Self {
            mic,
            config,
            stream: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.stream.is_some()
    }

    /// Acquire the microphone.  On error nothing is held and the recorder
    /// stays idle.
    pub fn start(&mut self) -> Result<(), RecorderError> {
        if self.stream.is_some() {
            return Err(RecorderError::AlreadyRecording);
        }
        self.stream = Some(self.mic.open()?);
        log::info!("recorder: started");
        Ok(())
    }

    /// Release the microphone and return the recording as a mono 16-bit WAV
    /// at `upload_sample_rate`, at most `max_recording_secs` long.
    pub fn stop(&mut self) -> Result<Vec<u8>, RecorderError> {
        let stream = self.stream.take().ok_or(RecorderError::NotRecording)?;
        let captured = stream.stop();

        let target = self.config.upload_sample_rate;
        let mono = stereo_to_mono(&captured.samples, captured.channels);
        let mut samples = resample(&mono, captured.sample_rate, target);

        let cap = (self.config.max_recording_secs.max(0.0) * target as f32) as usize;
        samples.truncate(cap);

        log::info!(
            "recorder: stopped, {:.1}s captured",
            samples.len() as f32 / target.max(1) as f32
        );
        Ok(encode_wav(&samples, target)?)
    }

    /// Release the microphone without producing a recording.
    pub fn discard(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream.stop());
        }
    }
}

impl Drop for VoiceRecorder {
    fn drop(&mut self) {
        self.discard();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::capture::CapturedAudio;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Hands out streams that replay a fixed recording.
    struct FakeMic {
        audio: CapturedAudio,
        deny: bool,
        opened: AtomicUsize,
        released: Arc<AtomicBool>,
    }

    impl FakeMic {
        fn new(audio: CapturedAudio) -> Self {
            Self {
                audio,
                deny: false,
                opened: AtomicUsize::new(0),
                released: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    struct FakeStream {
        audio: CapturedAudio,
        released: Arc<AtomicBool>,
    }

    impl CaptureStream for FakeStream {
        fn stop(self: Box<Self>) -> CapturedAudio {
            self.released.store(true, Ordering::SeqCst);
            self.audio
        }
    }

    impl Microphone for FakeMic {
        fn open(&self) -> Result<Box<dyn CaptureStream>, CaptureError> {
            if self.deny {
                return Err(CaptureError::PermissionDenied);
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeStream {
                audio: self.audio.clone(),
                released: Arc::clone(&self.released),
            }))
        }
    }

    fn stereo_48k(secs: f32) -> CapturedAudio {
        CapturedAudio {
            samples: vec![0.25; (48_000.0 * secs) as usize * 2],
            sample_rate: 48_000,
            channels: 2,
        }
    }

    fn wav_len(bytes: &[u8]) -> (u32, u16, usize) {
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        (spec.sample_rate, spec.channels, reader.len() as usize)
    }

    #[test]
    fn start_then_stop_yields_mono_upload() {
        let mic = Arc::new(FakeMic::new(stereo_48k(0.5)));
        let mut recorder = VoiceRecorder::new(mic.clone(), VoiceConfig::default());

        recorder.start().unwrap();
        assert!(recorder.is_recording());

        let wav = recorder.stop().unwrap();
        assert!(!recorder.is_recording());
        assert!(mic.released.load(Ordering::SeqCst));

        let (rate, channels, len) = wav_len(&wav);
        assert_eq!(rate, 16_000);
        assert_eq!(channels, 1);
        assert_eq!(len, 8_000);
    }

    #[test]
    fn recording_is_capped() {
        let mic = Arc::new(FakeMic::new(stereo_48k(2.0)));
        let config = VoiceConfig {
            max_recording_secs: 1.0,
            ..VoiceConfig::default()
        };
        let mut recorder = VoiceRecorder::new(mic, config);

        recorder.start().unwrap();
        let (_, _, len) = wav_len(&recorder.stop().unwrap());
        assert_eq!(len, 16_000);
    }

    #[test]
    fn denied_mic_leaves_recorder_idle() {
        let mut mic = FakeMic::new(stereo_48k(0.1));
        mic.deny = true;
        let mut recorder = VoiceRecorder::new(Arc::new(mic), VoiceConfig::default());

        let err = recorder.start().unwrap_err();
        assert!(matches!(err, RecorderError::Capture(CaptureError::PermissionDenied)));
        assert!(!recorder.is_recording());
    }

    #[test]
    fn double_start_and_idle_stop_are_errors() {
        let mic = Arc::new(FakeMic::new(stereo_48k(0.1)));
        let mut recorder = VoiceRecorder::new(mic.clone(), VoiceConfig::default());

        assert!(matches!(recorder.stop(), Err(RecorderError::NotRecording)));
        recorder.start().unwrap();
        assert!(matches!(recorder.start(), Err(RecorderError::AlreadyRecording)));
        assert_eq!(mic.opened.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_recorder_releases_mic() {
        let mic = Arc::new(FakeMic::new(stereo_48k(0.1)));
        {
            let mut recorder = VoiceRecorder::new(mic.clone(), VoiceConfig::default());
            recorder.start().unwrap();
        }
        assert!(mic.released.load(Ordering::SeqCst));
    }
}
