use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, debug};

use crate::config::MediaConfig;
use crate::error::{Result, SubflowError};
use super::{MediaProcessorTrait, MediaCommandBuilder};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path);

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn extract_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
    ) -> Result<()> {
        info!("Extracting audio from {} to {}", video_path.display(), audio_path.display());

        let command = self.command_builder.extract_audio(video_path, audio_path);
        command.execute(SubflowError::Extraction).await?;

        info!("Audio extraction completed");
        Ok(())
    }

    async fn split_audio(
        &self,
        audio_path: &Path,
        output_pattern: &Path,
        segment_duration: Duration,
    ) -> Result<()> {
        info!(
            "Splitting {} into {}s segments ({})",
            audio_path.display(),
            segment_duration.as_secs_f64(),
            output_pattern.display()
        );

        let command = self
            .command_builder
            .split_audio(audio_path, output_pattern, segment_duration);
        command.execute(SubflowError::Segmentation).await?;

        info!("Audio segmentation completed");
        Ok(())
    }

    async fn check_availability(&self) -> Result<()> {
        self.command_builder
            .version_check()
            .execute(SubflowError::Media)
            .await?;

        info!("Media processor is available");
        Ok(())
    }

    async fn get_version_info(&self) -> Result<String> {
        debug!("Getting media processor version information");

        let output = Command::new(&self.config.binary_path)
            .arg("-version")
            .output()
            .await
            .map_err(|e| SubflowError::Media(format!("Failed to execute media processor: {}", e)))?;

        if output.status.success() {
            let version_info = String::from_utf8_lossy(&output.stdout);
            // First line carries the version banner
            let first_line = version_info.lines().next().unwrap_or("Unknown version");
            Ok(first_line.to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(SubflowError::Media(format!("Media processor version check failed: {}", stderr)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_binary() -> MediaProcessorImpl {
        MediaProcessorImpl::new(MediaConfig {
            binary_path: "/nonexistent/ffmpeg-binary".to_string(),
            ..MediaConfig::default()
        })
    }

    #[tokio::test]
    async fn test_extraction_failure_is_extraction_error() {
        let processor = missing_binary();
        let err = processor
            .extract_audio(Path::new("in.mp4"), Path::new("out.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, SubflowError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_segmentation_failure_is_segmentation_error() {
        let processor = missing_binary();
        let err = processor
            .split_audio(Path::new("in.mp3"), Path::new("in_%03d.mp3"), Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, SubflowError::Segmentation(_)));
    }

    #[tokio::test]
    async fn test_unavailable_processor() {
        let processor = missing_binary();
        assert!(matches!(
            processor.check_availability().await,
            Err(SubflowError::Media(_))
        ));
        assert!(processor.get_version_info().await.is_err());
    }
}
