// Speech-to-text over an external service
//
// - OpenAI: multipart upload to an OpenAI-compatible /audio/transcriptions endpoint
// - Stage: ordered, failure-tolerant transcription of audio chunks

pub mod openai;
pub mod stage;

use async_trait::async_trait;
use std::path::Path;

pub use stage::*;
use crate::config::{Credentials, TranscriberConfig};
use crate::error::Result;

/// Main trait for transcription operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriberTrait: Send + Sync {
    /// Transcribe one audio file to plain text
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}

/// Factory for creating transcriber instances
pub struct TranscriberFactory;

impl TranscriberFactory {
    pub fn create_default(
        config: TranscriberConfig,
        credentials: &Credentials,
    ) -> Result<Box<dyn TranscriberTrait>> {
        Ok(Box::new(openai::OpenAITranscriber::new(
            config,
            credentials.transcriber_api_key.clone(),
        )?))
    }
}
