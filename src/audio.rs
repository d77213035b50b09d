//! Audio extraction and fixed-length segmentation.
//!
//! Every intermediate file is held by a [`TransientFile`] guard, so extracted
//! audio and chunks are removed on every exit path, including failures.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::media::MediaProcessorTrait;

/// Owned handle to a scratch file; the file is removed when the handle drops
#[derive(Debug)]
pub struct TransientFile {
    path: PathBuf,
    keep: bool,
}

impl TransientFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            keep: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release ownership without deleting the file
    pub fn keep(mut self) -> PathBuf {
        self.keep = true;
        std::mem::take(&mut self.path)
    }

    /// Delete the file now, surfacing the error instead of logging it
    pub async fn remove(mut self) -> Result<()> {
        self.keep = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for TransientFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        // Drop cannot await: this is a blocking unlink of one small file on the current worker
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed transient file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}

/// Audio track extracted from one video
#[derive(Debug)]
pub struct AudioAsset {
    pub correlation_id: Uuid,
    pub file: TransientFile,
}

impl AudioAsset {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Prefix shared by every chunk derived from this asset
    pub fn chunk_prefix(&self) -> String {
        self.correlation_id.to_string()
    }
}

/// One fixed-length piece of an [`AudioAsset`]; chunk `k` covers `[k*D, (k+1)*D)`
#[derive(Debug)]
pub struct AudioChunk {
    pub index: usize,
    pub file: TransientFile,
}

impl AudioChunk {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

pub struct AudioExtractor {
    media: Arc<dyn MediaProcessorTrait>,
    temp_dir: PathBuf,
    audio_extension: String,
}

impl AudioExtractor {
    pub fn new(
        media: Arc<dyn MediaProcessorTrait>,
        temp_dir: impl Into<PathBuf>,
        audio_extension: impl Into<String>,
    ) -> Self {
        Self {
            media,
            temp_dir: temp_dir.into(),
            audio_extension: audio_extension.into(),
        }
    }

    /// Extract the audio track of `video_path` into `<temp_dir>/<uuid>.<ext>`
    pub async fn extract_audio(&self, video_path: &Path) -> Result<AudioAsset> {
        let correlation_id = Uuid::new_v4();
        let audio_path = self
            .temp_dir
            .join(format!("{}.{}", correlation_id, self.audio_extension));

        // Guard first so a partial output is cleaned up if the transcoder fails
        let file = TransientFile::new(audio_path);
        self.media.extract_audio(video_path, file.path()).await?;

        info!("Extracted audio {} ({})", file.path().display(), correlation_id);
        Ok(AudioAsset { correlation_id, file })
    }
}

pub struct AudioSegmenter {
    media: Arc<dyn MediaProcessorTrait>,
    segment_duration: Duration,
}

impl AudioSegmenter {
    pub const DEFAULT_SEGMENT_DURATION: Duration = Duration::from_secs(60);

    pub fn new(media: Arc<dyn MediaProcessorTrait>, segment_duration: Duration) -> Self {
        Self {
            media,
            segment_duration,
        }
    }

    pub fn segment_duration(&self) -> Duration {
        self.segment_duration
    }

    /// Split `audio_path` into `<output_dir>/<prefix>_NNN.<ext>` pieces
    pub async fn split_audio(
        &self,
        audio_path: &Path,
        output_dir: &Path,
        name_prefix: &str,
    ) -> Result<()> {
        let extension = extension_of(audio_path);
        let pattern = output_dir.join(format!("{}_%03d.{}", name_prefix, extension));

        if let Err(e) = self
            .media
            .split_audio(audio_path, &pattern, self.segment_duration)
            .await
        {
            // Dropping the partial chunks removes them
            let partial = collect_chunks(output_dir, name_prefix, &extension)
                .await
                .unwrap_or_default();
            if !partial.is_empty() {
                warn!("Discarding {} partial chunks for {}", partial.len(), name_prefix);
            }
            return Err(e);
        }

        Ok(())
    }

    /// Split an extracted asset and take ownership of its chunks in ordinal order
    pub async fn segment(&self, asset: &AudioAsset, output_dir: &Path) -> Result<Vec<AudioChunk>> {
        let prefix = asset.chunk_prefix();
        self.split_audio(asset.path(), output_dir, &prefix).await?;

        let chunks = collect_chunks(output_dir, &prefix, &extension_of(asset.path())).await?;
        info!("Produced {} chunks for {}", chunks.len(), prefix);
        Ok(chunks)
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Parse the ordinal out of `<prefix>_<digits>.<extension>`
pub fn parse_chunk_index(file_name: &str, prefix: &str, extension: &str) -> Option<usize> {
    let rest = file_name.strip_prefix(prefix)?.strip_prefix('_')?;
    let digits = if extension.is_empty() {
        rest
    } else {
        rest.strip_suffix(extension)?.strip_suffix('.')?
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Collect the chunks for `prefix` in `dir`, sorted by ordinal regardless of listing order
pub async fn collect_chunks(dir: &Path, prefix: &str, extension: &str) -> Result<Vec<AudioChunk>> {
    let mut chunks = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if let Some(index) = parse_chunk_index(name, prefix, extension) {
            chunks.push(AudioChunk {
                index,
                file: TransientFile::new(entry.path()),
            });
        }
    }

    chunks.sort_by_key(|chunk| chunk.index);

    if chunks.iter().enumerate().any(|(pos, chunk)| pos != chunk.index) {
        warn!("Chunks for {} are not contiguous from 0", prefix);
    }

    Ok(chunks)
}
