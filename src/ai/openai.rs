// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OpenAI-compatible API client.
//!
//! Covers the three endpoints the app uses:
//!
//! - `POST /v1/chat/completions` (challenges, check-ins, coaches)
//! - `POST /v1/audio/transcriptions` (voice diary and check-ins)
//! - `POST /v1/audio/speech` (coach voice replies)
//!
//! The client never sets a reqwest-level timeout; the deadline comes from
//! Bounded Fetch so that timeouts are reported as such.

use std::time::Duration;

use axum::body::Bytes;
use reqwest::{multipart, Client, Request, Response};
use serde::{Deserialize, Serialize};

use super::AiError;
use crate::config::AiConfig;
use crate::http::{fetch_with_deadline, FetchError};

/// Chat message in the provider's wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'static str,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Deserialize)]
struct ProviderError {
    message: String,
}

/// Client for an OpenAI-compatible provider.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    base_url: String,
    chat_model: String,
    transcribe_model: String,
    tts_model: String,
    tts_voice: String,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Build a client, or `None` when no API key is configured.
    pub fn from_config(config: &AiConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        Some(Self {
            http: Client::new(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chat_model: config.chat_model.clone(),
            transcribe_model: config.transcribe_model.clone(),
            tts_model: config.tts_model.clone(),
            tts_voice: config.tts_voice.clone(),
            timeout: config.timeout,
        })
    }

    /// Deadline applied to every provider call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.base_url)
    }

    /// Run a chat completion and return the first choice's text.
    ///
    /// With `json_object`, the provider is asked to answer with a JSON object.
    pub async fn chat(&self, messages: &[ChatMessage], json_object: bool) -> Result<String, AiError> {
        let body = ChatCompletionRequest {
            model: &self.chat_model,
            messages,
            temperature: 0.7,
            response_format: json_object.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };
        let request = self
            .http
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .build()
            .map_err(FetchError::from)?;

        let response = self.send(request).await?;
        let completion: ChatCompletionResponse = decode_json(response).await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AiError::InvalidResponse("no choices returned".to_string()))
    }

    /// Transcribe an audio file.
    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: String,
        content_type: Option<&str>,
    ) -> Result<String, AiError> {
        let mut part = multipart::Part::bytes(audio).file_name(file_name);
        match content_type {
            Some(ct) if multipart::Part::text("").mime_str(ct).is_ok() => {
                part = part.mime_str(ct).map_err(FetchError::from)?;
            }
            Some(ct) => tracing::debug!(content_type = %ct, "Ignoring unparseable audio content type"),
            None => {}
        }
        let form = multipart::Form::new()
            .text("model", self.transcribe_model.clone())
            .part("file", part);

        let request = self
            .http
            .post(self.endpoint("audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .build()
            .map_err(FetchError::from)?;

        let response = self.send(request).await?;
        let transcription: TranscriptionResponse = decode_json(response).await?;
        Ok(transcription.text.trim().to_string())
    }

    /// Synthesize speech; returns MP3 bytes.
    pub async fn speech(&self, text: &str, voice: Option<&str>) -> Result<Bytes, AiError> {
        let body = SpeechRequest {
            model: &self.tts_model,
            input: text,
            voice: voice.unwrap_or(&self.tts_voice),
            response_format: "mp3",
        };
        let request = self
            .http
            .post(self.endpoint("audio/speech"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .build()
            .map_err(FetchError::from)?;

        let response = self.send(request).await?;
        Ok(response.bytes().await.map_err(FetchError::from)?)
    }

    /// Bounded send; non-2xx answers become `AiError::Upstream` with the
    /// provider's own error message when it sent one.
    async fn send(&self, request: Request) -> Result<Response, AiError> {
        let response = fetch_with_deadline(&self.http, request, self.timeout).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ProviderErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or_else(|_| format!("HTTP error! status: {}", status.as_u16()));
        tracing::warn!(status = status.as_u16(), error = %message, "AI provider returned an error");
        Err(AiError::Upstream {
            status: Some(status.as_u16()),
            message,
        })
    }
}

async fn decode_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, AiError> {
    let body = response.bytes().await.map_err(FetchError::from)?;
    serde_json::from_slice(&body).map_err(|e| AiError::InvalidResponse(e.to_string()))
}
