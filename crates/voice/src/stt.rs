//! Speech-to-Text provider abstraction and the Whisper-compatible
//! implementation used in production.

use {
    anyhow::{Context, Result, anyhow},
    async_trait::async_trait,
    bytes::Bytes,
    reqwest::{
        Client,
        multipart::{Form, Part},
    },
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

/// Container format of a downloaded voice payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    M4a,
    Mp3,
    Ogg,
}

impl AudioFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::M4a => "m4a",
            Self::Mp3 => "mp3",
            Self::Ogg => "ogg",
        }
    }

    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::M4a => "audio/mp4",
            Self::Mp3 => "audio/mpeg",
            Self::Ogg => "audio/ogg",
        }
    }

    /// Best-effort mapping from a Content-Type header. Platform voice notes
    /// arrive as AAC-in-MP4 unless the header says otherwise.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.split(';').next().unwrap_or_default().trim() {
            "audio/mpeg" | "audio/mp3" => Self::Mp3,
            "audio/ogg" | "application/ogg" => Self::Ogg,
            _ => Self::M4a,
        }
    }
}

/// Request to transcribe audio to text.
#[derive(Debug, Clone)]
pub struct TranscribeRequest {
    pub audio: Bytes,
    pub format: AudioFormat,
    /// Language hint (ISO 639-1 code), if the platform told us.
    pub language: Option<String>,
}

/// Transcription result.
#[derive(Debug, Clone, Deserialize)]
pub struct Transcript {
    pub text: String,
}

/// Speech-to-Text provider trait.
#[async_trait]
pub trait SttProvider: Send + Sync {
    /// Provider identifier (e.g., "whisper").
    fn id(&self) -> &'static str;

    /// Check if the provider is configured and ready.
    fn is_configured(&self) -> bool;

    /// Transcribe audio to text.
    async fn transcribe(&self, request: TranscribeRequest) -> Result<Transcript>;
}

/// Whisper-compatible STT over an OpenAI-style `audio/transcriptions`
/// endpoint.
#[derive(Clone)]
pub struct WhisperStt {
    client: Client,
    api_base: String,
    api_key: Option<Secret<String>>,
    model: String,
}

/// Default endpoint base.
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default model.
const DEFAULT_MODEL: &str = "whisper-1";

impl std::fmt::Debug for WhisperStt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperStt")
            .field("api_base", &self.api_base)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

impl WhisperStt {
    #[must_use]
    pub fn new(api_key: Option<Secret<String>>) -> Self {
        Self {
            client: Client::new(),
            api_base: DEFAULT_API_BASE.into(),
            api_key,
            model: DEFAULT_MODEL.into(),
        }
    }

    /// Override endpoint base and model (empty/None keeps the default).
    #[must_use]
    pub fn with_options(
        api_key: Option<Secret<String>>,
        api_base: Option<String>,
        model: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.into()),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.into()),
        }
    }

    fn api_key(&self) -> Result<&Secret<String>> {
        self.api_key
            .as_ref()
            .ok_or_else(|| anyhow!("transcription API key not configured"))
    }
}

#[async_trait]
impl SttProvider for WhisperStt {
    fn id(&self) -> &'static str {
        "whisper"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn transcribe(&self, request: TranscribeRequest) -> Result<Transcript> {
        let api_key = self.api_key()?;

        let file_part = Part::bytes(request.audio.to_vec())
            .file_name(format!("voice.{}", request.format.extension()))
            .mime_str(request.format.mime_type())
            .context("failed to build audio file part")?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "json");

        if let Some(language) = request.language {
            form = form.text("language", language);
        }

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.api_base))
            .bearer_auth(api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .context("failed to send transcription request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("transcription request failed: {status} - {body}"));
        }

        response
            .json::<Transcript>()
            .await
            .context("failed to parse transcription response")
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    #[test]
    fn test_provider_metadata() {
        let provider = WhisperStt::new(None);
        assert_eq!(provider.id(), "whisper");
        assert!(!provider.is_configured());

        let configured = WhisperStt::new(Some(Secret::new("test-key".into())));
        assert!(configured.is_configured());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let provider = WhisperStt::new(Some(Secret::new("super-secret-key".into())));
        let debug_output = format!("{provider:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret-key"));
    }

    #[test]
    fn test_format_from_mime() {
        assert_eq!(AudioFormat::from_mime("audio/mpeg"), AudioFormat::Mp3);
        assert_eq!(
            AudioFormat::from_mime("audio/ogg; codecs=opus"),
            AudioFormat::Ogg
        );
        assert_eq!(AudioFormat::from_mime("audio/mp4"), AudioFormat::M4a);
        assert_eq!(AudioFormat::from_mime(""), AudioFormat::M4a);
    }

    #[tokio::test]
    async fn test_transcribe_without_api_key() {
        let provider = WhisperStt::new(None);
        let request = TranscribeRequest {
            audio: Bytes::from_static(b"fake audio"),
            format: AudioFormat::M4a,
            language: None,
        };

        let result = provider.transcribe(request).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not configured"));
    }

    #[tokio::test]
    async fn test_transcribe_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"text": "book an appointment"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = WhisperStt::with_options(
            Some(Secret::new("test-key".into())),
            Some(server.uri()),
            None,
        );
        let transcript = provider
            .transcribe(TranscribeRequest {
                audio: Bytes::from_static(b"fake audio"),
                format: AudioFormat::M4a,
                language: Some("en".into()),
            })
            .await
            .unwrap();

        assert_eq!(transcript.text, "book an appointment");
    }

    #[tokio::test]
    async fn test_transcribe_upstream_error_is_explicit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad audio"))
            .mount(&server)
            .await;

        let provider = WhisperStt::with_options(
            Some(Secret::new("test-key".into())),
            Some(server.uri()),
            None,
        );
        let err = provider
            .transcribe(TranscribeRequest {
                audio: Bytes::from_static(b"fake audio"),
                format: AudioFormat::Mp3,
                language: None,
            })
            .await
            .unwrap_err();

        assert!(err.to_string().contains("bad audio"));
    }
}
