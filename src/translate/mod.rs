// Subtitle translation over an external chat-completion service
//
// - OpenAI: one chat completion per subtitle line
// - Stage: line-by-line translation of an SRT document

pub mod openai;
pub mod stage;

use async_trait::async_trait;

pub use stage::*;
use crate::config::{Credentials, TranslateConfig};
use crate::error::Result;

/// Main trait for translation operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate a single subtitle line into `target_language`
    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    pub fn create_translator(
        config: TranslateConfig,
        credentials: &Credentials,
    ) -> Result<Box<dyn Translator>> {
        Ok(Box::new(openai::OpenAITranslator::new(
            config,
            credentials.translate_api_key.clone(),
        )?))
    }
}

/// Convert a language tag to a language name for clearer prompts
pub fn language_code_to_name(code: &str) -> String {
    let lowered = code.to_lowercase();
    let name = match lowered.as_str() {
        "pt-br" => "Brazilian Portuguese",
        "pt-pt" => "European Portuguese",
        "zh-cn" | "zh-hans" => "Simplified Chinese",
        "zh-tw" | "zh-hant" => "Traditional Chinese",
        _ => match lowered.split(['-', '_']).next().unwrap_or_default() {
            "pt" => "Portuguese",
            "en" => "English",
            "es" => "Spanish",
            "fr" => "French",
            "de" => "German",
            "it" => "Italian",
            "ja" => "Japanese",
            "ko" => "Korean",
            "zh" => "Chinese",
            "ru" => "Russian",
            "nl" => "Dutch",
            "pl" => "Polish",
            "tr" => "Turkish",
            "ar" => "Arabic",
            "hi" => "Hindi",
            "sv" => "Swedish",
            "uk" => "Ukrainian",
            _ => return code.to_string(),
        },
    };
    name.to_string()
}
