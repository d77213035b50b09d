use tracing::{info, warn};

use crate::audio::AudioChunk;
use super::TranscriberTrait;

/// Text recognised for one chunk, paired with the chunk it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub chunk_index: usize,
    pub text: String,
}

/// Sequential transcription of a video's chunks.
///
/// A chunk whose transcription fails is logged and left out of the result, so
/// the returned entries may be fewer than the chunks submitted. Chunk files are
/// removed once processed, whether or not transcription succeeded.
pub struct TranscriptionStage {
    transcriber: Box<dyn TranscriberTrait>,
}

impl TranscriptionStage {
    pub fn new(transcriber: Box<dyn TranscriberTrait>) -> Self {
        Self { transcriber }
    }

    pub async fn transcribe_all(&self, mut chunks: Vec<AudioChunk>) -> Vec<TranscriptEntry> {
        chunks.sort_by_key(|chunk| chunk.index);

        let total = chunks.len();
        let mut entries = Vec::with_capacity(total);

        for (position, chunk) in chunks.into_iter().enumerate() {
            info!("Transcribing chunk {}/{} ({})", position + 1, total, chunk.path().display());

            let result = self.transcriber.transcribe(chunk.path()).await;
            match result {
                Ok(text) => {
                    entries.push(TranscriptEntry {
                        chunk_index: chunk.index,
                        text,
                    });
                    if let Err(e) = chunk.file.remove().await {
                        warn!("Failed to remove transcribed chunk: {}", e);
                    }
                }
                Err(e) => {
                    warn!("Skipping chunk {}: {}", chunk.index, e);
                }
            }
        }

        info!("Transcribed {}/{} chunks", entries.len(), total);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::TransientFile;
    use crate::error::SubflowError;
    use crate::transcribe::MockTranscriberTrait;
    use mockall::Sequence;
    use std::path::Path;

    fn write_chunks(dir: &Path, indices: &[usize]) -> Vec<AudioChunk> {
        indices
            .iter()
            .map(|&index| {
                let path = dir.join(format!("run_{:03}.mp3", index));
                std::fs::write(&path, b"x").unwrap();
                AudioChunk {
                    index,
                    file: TransientFile::new(path),
                }
            })
            .collect()
    }

    fn chunk_index_of(path: &Path) -> usize {
        let name = path.file_name().unwrap().to_str().unwrap();
        crate::audio::parse_chunk_index(name, "run", "mp3").unwrap()
    }

    #[tokio::test]
    async fn test_chunks_submitted_in_ordinal_order() {
        let dir = tempfile::tempdir().unwrap();
        let chunks = write_chunks(dir.path(), &[2, 0, 3, 1]);

        let mut transcriber = MockTranscriberTrait::new();
        let mut seq = Sequence::new();
        for expected in 0..4usize {
            transcriber
                .expect_transcribe()
                .withf(move |path| chunk_index_of(path) == expected)
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_| Ok(format!("text {}", expected)));
        }

        let stage = TranscriptionStage::new(Box::new(transcriber));
        let entries = stage.transcribe_all(chunks).await;

        let texts: Vec<&str> = entries.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["text 0", "text 1", "text 2", "text 3"]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_failed_chunk_is_dropped_and_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let chunks = write_chunks(dir.path(), &[0, 1, 2, 3, 4]);

        let mut transcriber = MockTranscriberTrait::new();
        transcriber.expect_transcribe().times(5).returning(|path| {
            match chunk_index_of(path) {
                2 => Err(SubflowError::Transcription("503 Service Unavailable".to_string())),
                index => Ok(format!("chunk {}", index)),
            }
        });

        let stage = TranscriptionStage::new(Box::new(transcriber));
        let entries = stage.transcribe_all(chunks).await;

        let indices: Vec<usize> = entries.iter().map(|e| e.chunk_index).collect();
        assert_eq!(indices, vec![0, 1, 3, 4]);
        assert_eq!(entries[2].text, "chunk 3");
        assert!(!dir.path().join("run_002.mp3").exists());
    }

    #[tokio::test]
    async fn test_all_failures_yield_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let chunks = write_chunks(dir.path(), &[0, 1]);

        let mut transcriber = MockTranscriberTrait::new();
        transcriber
            .expect_transcribe()
            .returning(|_| Err(SubflowError::Transcription("401 Unauthorized".to_string())));

        let stage = TranscriptionStage::new(Box::new(transcriber));
        assert!(stage.transcribe_all(chunks).await.is_empty());
    }

    #[tokio::test]
    async fn test_no_chunks() {
        let transcriber = MockTranscriberTrait::new();
        let stage = TranscriptionStage::new(Box::new(transcriber));
        assert!(stage.transcribe_all(Vec::new()).await.is_empty());
    }
}
