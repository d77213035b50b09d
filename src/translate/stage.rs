use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::subtitle::write_document;
use super::Translator;

const TIMING_ARROW: &str = "-->";

/// Role of one line inside an SRT document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Timing,
    Blank,
    Text,
}

/// Classify every line; block ordinals count as text
pub fn classify_lines(lines: &[&str]) -> Vec<LineKind> {
    lines
        .iter()
        .map(|line| {
            if line.contains(TIMING_ARROW) {
                LineKind::Timing
            } else if line.trim().is_empty() {
                LineKind::Blank
            } else {
                LineKind::Text
            }
        })
        .collect()
}

/// Sequential line-by-line translation of a subtitle document.
///
/// Timing and blank lines are copied verbatim; every other line goes to the
/// translator, block ordinals included. The first failed
/// translation aborts the whole document.
pub struct TranslationStage {
    translator: Box<dyn Translator>,
    target_language: String,
}

impl TranslationStage {
    pub fn new(translator: Box<dyn Translator>, target_language: impl Into<String>) -> Self {
        Self {
            translator,
            target_language: target_language.into(),
        }
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    pub async fn translate_document(&self, content: &str) -> Result<String> {
        let lines: Vec<&str> = content.split('\n').collect();
        let kinds = classify_lines(&lines);
        let total_text = kinds.iter().filter(|kind| **kind == LineKind::Text).count();

        let mut translated = Vec::with_capacity(lines.len());
        let mut done = 0;

        for (line, kind) in lines.iter().zip(kinds) {
            if kind != LineKind::Text {
                translated.push(line.to_string());
                continue;
            }

            done += 1;
            info!("┌─ Translating line {}/{} ────────", done, total_text);
            info!("│ Source: {}", line.trim());

            let translation = self
                .translator
                .translate(line.trim(), &self.target_language)
                .await?;

            info!("│ Target: {}", translation);
            info!("└─────────────────────────────────────");

            // Keep CRLF documents CRLF
            if line.ends_with('\r') {
                translated.push(format!("{}\r", translation));
            } else {
                translated.push(translation);
            }
        }

        Ok(translated.join("\n"))
    }

    /// Translate the document at `input_path` and write the result to `output_path`
    pub async fn translate_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<String> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        let content = tokio::fs::read_to_string(input_path).await?;
        let translated = self.translate_document(&content).await?;
        write_document(output_path, &translated).await?;

        info!(
            "Translated subtitles ({}) written to {}",
            self.target_language,
            output_path.display()
        );
        Ok(translated)
    }
}
