use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{Result, SubflowError};
use super::{Translator, language_code_to_name};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// Line translation through an OpenAI-compatible chat completion API
pub struct OpenAITranslator {
    client: Client,
    config: TranslateConfig,
    api_key: String,
}

impl OpenAITranslator {
    pub fn new(config: TranslateConfig, api_key: String) -> Result<Self> {
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
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }
}

pub fn build_translation_prompt(text: &str, target_language: &str) -> String {
    format!(
        "Translate the following text to {}: {}",
        language_code_to_name(target_language),
        text
    )
}

/// Collapse a reply onto one line so it cannot break the SRT block structure
pub fn clean_translation_response(response: &str) -> String {
    response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl Translator for OpenAITranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        let prompt = build_translation_prompt(text, target_language);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "system",
                content: &prompt,
            }],
        };

        let url = self.url();
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SubflowError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SubflowError::Translation(format!(
                "Chat completion API error {}: {}",
                status, error_text
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| SubflowError::Translation(format!("Failed to parse response: {}", e)))?;

        let raw = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        debug!("Raw translation response: {}", raw);

        let cleaned = clean_translation_response(&raw);
        if cleaned.is_empty() {
            return Err(SubflowError::Translation("Empty translation received".to_string()));
        }
        Ok(cleaned)
    }
}
