//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Every section is `#[serde(default)]`, so a partial `settings.toml` only
//! overrides the keys it names.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// BackendConfig
// ---------------------------------------------------------------------------

/// Where the assistant backend lives and how long to wait for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Scheme + host + port of the backend, without a trailing slash.
    pub base_url: String,
    /// Path prefix placed before `/chat`, `/speak` and `/voice`.
    ///
    /// `"/api"` for the hosted deployment; `""` for backends that expose the
    /// bare endpoints.
    pub api_prefix: String,
    /// Best-effort per-request timeout.  A request exceeding it is reported
    /// as a connectivity failure.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".into(),
            api_prefix: "/api".into(),
            timeout_secs: 30,
        }
    }
}

impl BackendConfig {
    /// Full URL of `endpoint` (e.g. `"chat"`).
    ///
    /// ```
    /// use medchat::config::BackendConfig;
    ///
    /// let cfg = BackendConfig::default();
    /// assert_eq!(cfg.endpoint_url("chat"), "http://localhost:5000/api/chat");
    /// ```
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let prefix = self.api_prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{base}/{endpoint}")
        } else {
            format!("{base}/{prefix}/{endpoint}")
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// RevealConfig
// ---------------------------------------------------------------------------

/// Settings for the typing reveal and the markup pipeline feeding it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Delay between two revealed characters, in milliseconds.
    pub char_delay_ms: u64,
    /// Render assistant replies as CommonMark.  When `false` replies are
    /// shown as escaped plain text.
    pub render_markdown: bool,
    /// Wrap known medicine names in highlight markup.
    pub highlight_terms: bool,
    /// Terms highlighted when `highlight_terms` is on.
    pub medicine_terms: Vec<String>,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            char_delay_ms: 12,
            render_markdown: true,
            highlight_terms: true,
            medicine_terms: [
                "paracetamol",
                "acetaminophen",
                "ibuprofen",
                "aspirin",
                "naproxen",
                "amoxicillin",
                "azithromycin",
                "metformin",
                "insulin",
                "omeprazole",
                "cetirizine",
                "loratadine",
                "salbutamol",
                "prednisone",
                "atorvastatin",
                "lisinopril",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl RevealConfig {
    pub fn char_delay(&self) -> Duration {
        Duration::from_millis(self.char_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// VoiceConfig
// ---------------------------------------------------------------------------

/// Settings for microphone capture and the `/voice` upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Sample rate of the uploaded WAV in Hz.
    pub upload_sample_rate: u32,
    /// Longest recording kept, in seconds; audio past this is discarded.
    pub max_recording_secs: f32,
    /// Input device name — `None` means the system default.
    pub input_device: Option<String>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            upload_sample_rate: 16_000,
            max_recording_secs: 60.0,
            input_device: None,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for reply playback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Request and play synthesized speech for assistant replies.
    pub enabled: bool,
    /// Output device name — `None` means the system default.
    pub output_device: Option<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_device: None,
        }
    }
}

// ---------------------------------------------------------------------------
// MessagesConfig
// ---------------------------------------------------------------------------

/// User-visible strings for failure bubbles and alerts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    /// Prepended to a backend-reported error.
    pub error_prefix: String,
    /// Shown when the backend answered without `response` or `error`.
    pub empty_reply: String,
    /// Shown when the backend could not be reached.
    pub unreachable: String,
    /// Alert shown when the microphone cannot be opened.
    pub mic_blocked: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            error_prefix: "⚠️ Error: ".into(),
            empty_reply: "⚠️ Server returned no response.".into(),
            unreachable: "❌ Cannot reach server. Is the backend running?".into(),
            mic_blocked: "❌ Microphone permission blocked.".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use medchat::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub reveal: RevealConfig,
    pub voice: VoiceConfig,
    pub speech: SpeechConfig,
    pub messages: MessagesConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
