//! Audio — microphone recording for `/voice` and speech playback for
//! `/speak`.
//!
//! # Recording
//!
//! ```text
//! Microphone (cpal thread) → CapturedAudio → stereo_to_mono → resample
//!           → cap at max_recording_secs → encode_wav → /voice upload
//! ```
//!
//! # Playback
//!
//! ```text
//! /speak bytes → decode_audio (symphonia) → SpeechPlayer → AudioOutput (cpal thread)
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use medchat::audio::{CpalMicrophone, VoiceRecorder};
//! use medchat::config::VoiceConfig;
//!
//! let mic = Arc::new(CpalMicrophone::new(None, 60.0));
//! let mut recorder = VoiceRecorder::new(mic, VoiceConfig::default());
//!
//! recorder.start().unwrap();
//! std::thread::sleep(std::time::Duration::from_secs(3));
//! let wav = recorder.stop().unwrap(); // microphone released here
//! println!("{} bytes ready for upload", wav.len());
//! ```

pub mod capture;
pub mod playback;
pub mod recorder;
pub mod resample;
pub mod wav;

pub use capture::{CaptureError, CaptureStream, CapturedAudio, CpalMicrophone, Microphone};
pub use playback::{
    decode_audio, AudioOutput, CpalOutput, DecodedAudio, PlaybackError, PlaybackHandle,
    SpeechPlayer,
};
pub use recorder::{RecorderError, VoiceRecorder};
pub use resample::{mono_to_interleaved, resample, stereo_to_mono};
pub use wav::encode_wav;
