//! Google Cloud Text-to-Speech v1 REST client.

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::config::{Credentials, SpeechServiceConfig};
use crate::foundation::error::{NarrationError, NarrationResult};
use crate::tts::client::{SpeechClient, SynthesisRequest};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeBody<'a> {
    input: TextInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig<'a>,
}

#[derive(Serialize)]
struct TextInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
    ssml_gender: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig<'a> {
    audio_encoding: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorStatus,
}

#[derive(Deserialize)]
struct ErrorStatus {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Blocking client for the `text:synthesize` endpoint.
pub struct GoogleTtsClient {
    http: reqwest::blocking::Client,
    config: SpeechServiceConfig,
}

impl std::fmt::Debug for GoogleTtsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTtsClient")
            .field("endpoint", &self.config.endpoint)
            .field("credentials", &self.config.credentials)
            .finish()
    }
}

impl GoogleTtsClient {
    /// Build a client; the HTTP connection pool lives as long as the client.
    pub fn new(config: SpeechServiceConfig) -> NarrationResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("voxreel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NarrationError::config(format!("build http client: {e}")))?;
        Ok(Self { http, config })
    }
}

impl SpeechClient for GoogleTtsClient {
    fn synthesize(&mut self, request: &SynthesisRequest) -> NarrationResult<Vec<u8>> {
        let body = request_body(request);

        let mut req = self.http.post(&self.config.endpoint).json(&body);
        req = match &self.config.credentials {
            Credentials::ApiKey(key) => req.query(&[("key", key.as_str())]),
            Credentials::BearerToken(token) => req.bearer_auth(token),
        };

        let response = req
            .send()
            .map_err(|e| NarrationError::synthesis(format!("request failed: {e}")))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|e| NarrationError::synthesis(format!("read response body: {e}")))?;

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &text));
        }
        decode_audio_content(&text)
    }
}

fn request_body(request: &SynthesisRequest) -> SynthesizeBody<'_> {
    SynthesizeBody {
        input: TextInput {
            text: &request.text,
        },
        voice: VoiceSelection {
            language_code: request.voice.language_code(),
            name: request.voice.id(),
            ssml_gender: request.voice.gender().as_str(),
        },
        audio_config: AudioConfig {
            audio_encoding: request.encoding.as_str(),
        },
    }
}

/// Map a non-success response to `RateLimit` or `Synthesis`.
///
/// HTTP 429 and an error body whose `error.status` is `RESOURCE_EXHAUSTED` both count as rate
/// limiting.
pub fn classify_failure(status: u16, body: &str) -> NarrationError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let api_status = parsed.as_ref().and_then(|e| e.error.status.as_deref());
    let message = parsed
        .as_ref()
        .and_then(|e| e.error.message.clone())
        .unwrap_or_else(|| body.chars().take(200).collect());

    if status == 429 || api_status == Some("RESOURCE_EXHAUSTED") {
        NarrationError::rate_limit(format!("HTTP {status}: {message}"))
    } else {
        NarrationError::synthesis(format!("HTTP {status}: {message}"))
    }
}

/// Extract and base64-decode `audioContent` from a success body.
pub fn decode_audio_content(body: &str) -> NarrationResult<Vec<u8>> {
    let parsed: SynthesizeResponse = serde_json::from_str(body)
        .map_err(|e| NarrationError::synthesis(format!("malformed response: {e}")))?;
    let content = parsed
        .audio_content
        .ok_or_else(|| NarrationError::synthesis("response has no audioContent"))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(content.as_bytes())
        .map_err(|e| NarrationError::synthesis(format!("audioContent is not base64: {e}")))?;
    if bytes.is_empty() {
        return Err(NarrationError::synthesis("audioContent is empty"));
    }
    Ok(bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/tts/google.rs"]
mod tests;
