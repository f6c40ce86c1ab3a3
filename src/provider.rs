//! Translation provider: the external translation API behind a trait.
//!
//! `TranslateApiClient` speaks the Google Cloud Translation v2 wire format.
//! Anything else that can translate strings can implement
//! `TranslationProvider` and be handed to the coordinator instead.

use crate::config::Config;
use crate::error::{ProviderError, TranslationError};
use crate::retry::{retry_provider_call, RetryConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// External translation service, treated as an unreliable network dependency.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translate `texts` into `target`, keeping length and order.
    ///
    /// Returning fewer items than were sent is a contract violation; callers
    /// treat it as `ProviderError::ShortResponse`.
    async fn translate_batch(&self, texts: &[String], target: &str) -> Result<Vec<String>, ProviderError>;

    /// Translate a single string.
    async fn translate_one(&self, text: &str, target: &str) -> Result<String, ProviderError> {
        let translated = self.translate_batch(&[text.to_string()], target).await?;
        translated.into_iter().next().ok_or(ProviderError::ShortResponse {
            expected: 1,
            got: 0,
        })
    }

    /// Best-guess language code of `text`. Detection is advisory, so every
    /// failure collapses to `None`.
    async fn detect_language(&self, text: &str) -> Option<String>;
}

/// A single translated item as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    /// Filled in by the provider when no source language was sent
    pub detected_source_language: Option<String>,
}

/// Request body for the translate endpoint
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: Vec<&'a str>,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
}

/// Request body for the detect endpoint
#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    q: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: Option<T>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct TranslationsData {
    translations: Vec<TranslationItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationItem {
    translated_text: String,
    detected_source_language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetectionsData {
    detections: Vec<Vec<DetectionItem>>,
}

#[derive(Debug, Deserialize)]
struct DetectionItem {
    language: String,
    #[serde(default)]
    confidence: f32,
}

/// Whether a string is worth sending to the provider.
pub fn is_translatable(text: &str) -> bool {
    !text.trim().is_empty()
}

/// HTTP client for the Cloud Translation v2 API.
#[derive(Clone)]
pub struct TranslateApiClient {
    http: reqwest::Client,
    api_key: String,
    translate_url: String,
    detect_url: String,
    timeout: Duration,
    retry: RetryConfig,
}

impl TranslateApiClient {
    /// Build a client with a bounded request timeout.
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ProviderError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            translate_url: config.translate_url.clone(),
            detect_url: config.detect_url.clone(),
            timeout: config.request_timeout,
            retry: config.retry.clone(),
        })
    }

    /// Translate `texts` into `target`, optionally pinning the source language.
    ///
    /// When `source` is `None` the provider auto-detects it and reports the
    /// result per item in `detected_source_language`. Blank inputs are not
    /// sent and come back unchanged in their original position; if nothing
    /// is left to send, no request is made.
    pub async fn translate_with_source(
        &self,
        texts: &[String],
        target: &str,
        source: Option<&str>,
    ) -> Result<Vec<Translation>, ProviderError> {
        let sendable: Vec<usize> = (0..texts.len())
            .filter(|&i| is_translatable(&texts[i]))
            .collect();

        let mut results: Vec<Translation> = texts
            .iter()
            .map(|t| Translation {
                text: t.clone(),
                detected_source_language: None,
            })
            .collect();
        if sendable.is_empty() {
            return Ok(results);
        }

        let request = TranslateRequest {
            q: sendable.iter().map(|&i| texts[i].as_str()).collect(),
            target,
            format: "text",
            source,
        };
        let expected = request.q.len();

        let data: TranslationsData = retry_provider_call(
            &self.retry,
            &format!("Translation of {} string(s) to {}", expected, target),
            || self.post(&self.translate_url, &request),
        )
        .await?;

        if data.translations.len() < expected {
            return Err(ProviderError::ShortResponse {
                expected,
                got: data.translations.len(),
            });
        }

        for (&i, item) in sendable.iter().zip(data.translations) {
            results[i] = Translation {
                text: item.translated_text,
                detected_source_language: item.detected_source_language,
            };
        }
        Ok(results)
    }

    /// Detect the language of `text`, returning the top-ranked guess.
    pub async fn detect(&self, text: &str) -> Result<String, TranslationError> {
        if !is_translatable(text) {
            return Err(TranslationError::DetectionInconclusive);
        }

        let request = DetectRequest { q: text };
        let data: DetectionsData = retry_provider_call(
            &self.retry,
            "Language detection",
            || self.post(&self.detect_url, &request),
        )
        .await?;

        let best = data
            .detections
            .into_iter()
            .next()
            .and_then(|guesses| guesses.into_iter().next())
            .filter(|guess| !guess.language.is_empty() && guess.language != "und")
            .ok_or(TranslationError::DetectionInconclusive)?;

        debug!(
            "Detected language '{}' (confidence {:.2})",
            best.language, best.confidence
        );
        Ok(best.language)
    }

    async fn post<B, T>(&self, url: &str, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        let parsed: Option<ApiResponse<T>> = serde_json::from_str(&body).ok();

        if let Some(ApiResponse {
            error: Some(error), ..
        }) = &parsed
        {
            let code = if error.code == 0 { status.as_u16() } else { error.code };
            return Err(ProviderError::Rejected {
                code,
                message: error.message.clone(),
            });
        }

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parsed
            .and_then(|response| response.data)
            .ok_or_else(|| ProviderError::Malformed(format!("missing `data` in response: {}", body)))
    }

    fn transport_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.timeout)
        } else {
            ProviderError::from(err)
        }
    }
}

#[async_trait]
impl TranslationProvider for TranslateApiClient {
    async fn translate_batch(&self, texts: &[String], target: &str) -> Result<Vec<String>, ProviderError> {
        let translations = self.translate_with_source(texts, target, None).await?;
        Ok(translations.into_iter().map(|t| t.text).collect())
    }

    async fn detect_language(&self, text: &str) -> Option<String> {
        match self.detect(text).await {
            Ok(code) => Some(code),
            Err(e) => {
                debug!("Language detection gave no result: {}", e);
                None
            }
        }
    }
}
