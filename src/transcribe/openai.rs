use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, SubflowError};
use super::TranscriberTrait;

/// Response body of `/audio/transcriptions` with the default `json` format
#[derive(Debug, Deserialize)]
pub struct TranscriptionResponse {
    pub text: String,
}

/// Whisper transcription through an OpenAI-compatible HTTP API
pub struct OpenAITranscriber {
    client: Client,
    config: TranscriberConfig,
    api_key: String,
}

impl OpenAITranscriber {
    pub fn new(config: TranscriberConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}/audio/transcriptions", self.config.endpoint.trim_end_matches('/'))
    }

    async fn build_form(&self, audio_path: &Path) -> Result<Form> {
        let bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(audio_mime_type(audio_path))
            .map_err(|e| SubflowError::Transcription(format!("Invalid audio mime type: {}", e)))?;

        Ok(Form::new()
            .part("file", part)
            .text("model", self.config.model.clone()))
    }
}

#[async_trait]
impl TranscriberTrait for OpenAITranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        info!("Transcribing {}", audio_path.display());

        let form = self.build_form(audio_path).await?;
        let url = self.url();
        debug!("Sending transcription request to: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SubflowError::Transcription(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SubflowError::Transcription(format!(
                "Transcription API error {}: {}",
                status, error_text
            )));
        }

        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| SubflowError::Transcription(format!("Failed to parse response: {}", e)))?;

        debug!("Transcribed {} characters", body.text.len());
        Ok(body.text)
    }
}

fn audio_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("flac") => "audio/flac",
        Some("ogg") => "audio/ogg",
        Some("webm") => "audio/webm",
        _ => "application/octet-stream",
    }
}
