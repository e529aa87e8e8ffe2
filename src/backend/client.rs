//! `AssistantBackend` trait and its reqwest implementation.
//!
//! All connection details come from [`BackendConfig`]; every call is
//! attempted exactly once.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::BackendConfig;

use super::error::BackendError;

/// Multipart field carrying the recorded audio.
pub const VOICE_FIELD: &str = "audio";
/// File name attached to the uploaded recording.
pub const VOICE_FILE_NAME: &str = "recording.wav";
/// MIME type of the uploaded recording.
pub const VOICE_MIME: &str = "audio/wav";

// ---------------------------------------------------------------------------
// ChatReply
// ---------------------------------------------------------------------------

/// What `/chat` answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    /// `{"response": "..."}` with non-empty text.
    Response(String),
    /// `{"error": "..."}`: the backend reported an application error.
    Error(String),
    /// Neither field carried anything usable.
    Empty,
}

#[derive(Debug, Deserialize)]
struct ChatBody {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ChatReply {
    /// Classify a `/chat` response body.  `response` wins over `error` when
    /// both are present; empty strings count as absent.
    pub fn parse(body: &[u8]) -> Result<Self, BackendError> {
        let body: ChatBody =
            serde_json::from_slice(body).map_err(|e| BackendError::Parse(e.to_string()))?;

        let non_empty = |s: Option<String>| s.filter(|s| !s.is_empty());
        Ok(match (non_empty(body.response), non_empty(body.error)) {
            (Some(text), _) => ChatReply::Response(text),
            (None, Some(msg)) => ChatReply::Error(msg),
            (None, None) => ChatReply::Empty,
        })
    }
}

#[derive(Debug, Deserialize)]
struct VoiceBody {
    #[serde(default)]
    text: Option<String>,
}

// ---------------------------------------------------------------------------
// AssistantBackend trait
// ---------------------------------------------------------------------------

/// The three remote operations the chat client relies on.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn AssistantBackend>` between the session and spawned speech tasks.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Send one user message.
    async fn chat(&self, message: &str) -> Result<ChatReply, BackendError>;

    /// Synthesize `text`; returns the encoded audio payload.
    async fn speak(&self, text: &str) -> Result<Vec<u8>, BackendError>;

    /// Transcribe a WAV recording.  An empty string means nothing was heard.
    async fn voice(&self, wav: Vec<u8>) -> Result<String, BackendError>;
}

// ---------------------------------------------------------------------------
// HttpBackend
// ---------------------------------------------------------------------------

/// Talks to the backend over HTTP: `POST {base_url}{api_prefix}/chat`,
/// `/speak` and `/voice`.
pub struct HttpBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

impl HttpBackend {
    /// Build an `HttpBackend` from application config.
    ///
    /// The client carries the per-request timeout from
    /// `config.timeout_secs`.  A default client is used if the builder
    /// fails.
    pub fn from_config(config: &BackendConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_else(|e| {
                log::warn!("backend: client builder failed ({e}); using defaults");
                reqwest::Client::new()
            });

        Self {
            client,
            config: config.clone(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        self.config.endpoint_url(endpoint)
    }
}

#[async_trait]
impl AssistantBackend for HttpBackend {
    /// The body is classified whatever the status: backends report
    /// application errors as `{"error": ...}` on 4xx/5xx too.
    async fn chat(&self, message: &str) -> Result<ChatReply, BackendError> {
        let body = serde_json::json!({ "message": message });
        let response = self.client.post(self.url("chat")).json(&body).send().await?;

        log::debug!("backend: /chat -> {}", response.status());
        let bytes = response.bytes().await?;
        ChatReply::parse(&bytes)
    }

    async fn speak(&self, text: &str) -> Result<Vec<u8>, BackendError> {
        let body = serde_json::json!({ "text": text });
        let response = self.client.post(self.url("speak")).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }

        let audio = response.bytes().await?;
        log::debug!("backend: /speak -> {} bytes", audio.len());
        Ok(audio.to_vec())
    }

    async fn voice(&self, wav: Vec<u8>) -> Result<String, BackendError> {
        let part = reqwest::multipart::Part::bytes(wav)
            .file_name(VOICE_FILE_NAME)
            .mime_str(VOICE_MIME)?;
        let form = reqwest::multipart::Form::new().part(VOICE_FIELD, part);

        let response = self.client.post(self.url("voice")).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        let body: VoiceBody =
            serde_json::from_slice(&bytes).map_err(|e| BackendError::Parse(e.to_string()))?;
        Ok(body.text.unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_response() {
        assert_eq!(
            ChatReply::parse(br#"{"response":"Drink water."}"#).unwrap(),
            ChatReply::Response("Drink water.".into())
        );
    }

    #[test]
    fn parse_error() {
        assert_eq!(
            ChatReply::parse(br#"{"error":"rate limited"}"#).unwrap(),
            ChatReply::Error("rate limited".into())
        );
    }

    #[test]
    fn response_wins_over_error() {
        assert_eq!(
            ChatReply::parse(br#"{"response":"ok","error":"ignored"}"#).unwrap(),
            ChatReply::Response("ok".into())
        );
    }

    #[test]
    fn empty_or_missing_fields_are_empty() {
        assert_eq!(ChatReply::parse(b"{}").unwrap(), ChatReply::Empty);
        assert_eq!(ChatReply::parse(br#"{"response":""}"#).unwrap(), ChatReply::Empty);
        assert_eq!(
            ChatReply::parse(br#"{"response":null,"error":""}"#).unwrap(),
            ChatReply::Empty
        );
    }

    #[test]
    fn malformed_body_is_parse_error() {
        assert!(matches!(
            ChatReply::parse(b"<html>502</html>"),
            Err(BackendError::Parse(_))
        ));
    }

    #[test]
    fn from_config_builds_without_panic() {
        let _backend = HttpBackend::from_config(&BackendConfig::default());
    }

    #[test]
    fn urls_follow_prefix() {
        let backend = HttpBackend::from_config(&BackendConfig::default());
        assert_eq!(backend.url("chat"), "http://localhost:5000/api/chat");
    }

    /// `HttpBackend` is usable as `dyn AssistantBackend`.
    #[test]
    fn backend_is_object_safe() {
        let backend: Box<dyn AssistantBackend> =
            Box::new(HttpBackend::from_config(&BackendConfig::default()));
        drop(backend);
    }
}
