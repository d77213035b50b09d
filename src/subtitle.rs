use std::fmt;
use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::error::Result;
use crate::timing::{SegmentTimer, TimeSpan};
use crate::transcribe::TranscriptEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleBlock {
    /// 1-based position in the document
    pub ordinal: usize,
    pub span: TimeSpan,
    pub text: String,
}

impl fmt::Display for SubtitleBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}\n{}\n", self.ordinal, self.span, self.text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtitleDocument {
    pub blocks: Vec<SubtitleBlock>,
}

impl SubtitleDocument {
    /// Build one block per text, timed by output position.
    ///
    /// Timing comes from the position in `texts`, not from the chunk a text was
    /// recognised in: once a chunk has been skipped, every later block is shifted
    /// earlier by one segment relative to the audio.
    pub fn from_texts<S: AsRef<str>>(texts: &[S], timer: &SegmentTimer) -> Self {
        let blocks = texts
            .iter()
            .enumerate()
            .map(|(index, text)| SubtitleBlock {
                ordinal: index + 1,
                span: timer.span(index),
                text: text.as_ref().trim().to_string(),
            })
            .collect();

        Self { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Serialize as SRT: blocks separated by one blank line
    pub fn render(&self) -> String {
        self.blocks
            .iter()
            .map(|block| block.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Write a document, replacing whatever was at `path`
pub async fn write_document<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, content).await?;
    Ok(())
}

/// Turns ordered transcripts into a persisted SRT document
pub struct SubtitleAssembler {
    timer: SegmentTimer,
}

impl SubtitleAssembler {
    pub fn new(timer: SegmentTimer) -> Self {
        Self { timer }
    }

    pub fn build_document(&self, entries: &[TranscriptEntry]) -> SubtitleDocument {
        let texts: Vec<&str> = entries.iter().map(|entry| entry.text.as_str()).collect();
        SubtitleDocument::from_texts(&texts, &self.timer)
    }

    pub async fn assemble<P: AsRef<Path>>(
        &self,
        entries: &[TranscriptEntry],
        output_path: P,
    ) -> Result<SubtitleDocument> {
        let output_path = output_path.as_ref();
        let document = self.build_document(entries);

        write_document(output_path, &document.render()).await?;

        info!(
            "Subtitle document with {} blocks written to {}",
            document.len(),
            output_path.display()
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn entries(pairs: &[(usize, &str)]) -> Vec<TranscriptEntry> {
        pairs
            .iter()
            .map(|(chunk_index, text)| TranscriptEntry {
                chunk_index: *chunk_index,
                text: text.to_string(),
            })
            .collect()
    }

    fn assembler() -> SubtitleAssembler {
        SubtitleAssembler::new(SegmentTimer::new(Duration::from_secs(60)))
    }

    #[test]
    fn test_render_srt_blocks() {
        let document = assembler().build_document(&entries(&[(0, "Hello"), (1, " World ")]));
        assert_eq!(
            document.render(),
            "1\n00:00:00,000 --> 00:01:00,000\nHello\n\n\
             2\n00:01:00,000 --> 00:02:00,000\nWorld\n"
        );
    }

    #[test]
    fn test_three_chunks_of_a_130_second_video() {
        let document = assembler().build_document(&entries(&[(0, "a"), (1, "b"), (2, "c")]));
        let spans: Vec<String> = document.blocks.iter().map(|b| b.span.to_string()).collect();
        assert_eq!(
            spans,
            vec![
                "00:00:00,000 --> 00:01:00,000",
                "00:01:00,000 --> 00:02:00,000",
                // Nominal end runs past the 130s of real audio
                "00:02:00,000 --> 00:03:00,000",
            ]
        );
    }

    #[test]
    fn test_timestamps_follow_position_after_dropped_chunks() {
        // Chunk 2 of 0..=4 failed; the survivors are renumbered and retimed by position.
        // This desynchronises blocks 3 and 4 from the audio.
        let document = assembler()
            .build_document(&entries(&[(0, "a"), (1, "b"), (3, "d"), (4, "e")]));

        let ordinals: Vec<usize> = document.blocks.iter().map(|b| b.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4]);
        assert_eq!(document.blocks[2].text, "d");
        assert_eq!(
            document.blocks[2].span.to_string(),
            "00:02:00,000 --> 00:03:00,000"
        );
        assert_eq!(
            document.blocks[3].span.to_string(),
            "00:03:00,000 --> 00:04:00,000"
        );
    }

    #[test]
    fn test_empty_document_renders_empty() {
        let document = assembler().build_document(&[]);
        assert!(document.is_empty());
        assert_eq!(document.render(), "");
    }

    #[tokio::test]
    async fn test_assemble_overwrites_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("output.srt");

        assembler()
            .assemble(&entries(&[(0, "first"), (1, "run"), (2, "longer")]), &path)
            .await
            .unwrap();
        assembler()
            .assemble(&entries(&[(0, "second")]), &path)
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "1\n00:00:00,000 --> 00:01:00,000\nsecond\n");
    }
}
