use chrono::{DateTime, Local};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::audio::{AudioExtractor, AudioSegmenter};
use crate::config::{Config, Credentials, SubtitlePaths};
use crate::error::{Result, SubflowError};
use crate::media::{MediaProcessorFactory, MediaProcessorTrait};
use crate::subtitle::{SubtitleAssembler, SubtitleDocument};
use crate::timing::SegmentTimer;
use crate::transcribe::{TranscriberFactory, TranscriberTrait, TranscriptEntry, TranscriptionStage};
use crate::translate::{TranslationStage, Translator, TranslatorFactory};

/// Last state a video reached in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoStage {
    Discovered,
    Extracted,
    Segmented,
    Transcribed,
    Assembled,
    Translated,
    Done,
}

impl fmt::Display for VideoStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Discovered => "discovered",
            Self::Extracted => "extracted",
            Self::Segmented => "segmented",
            Self::Transcribed => "transcribed",
            Self::Assembled => "assembled",
            Self::Translated => "translated",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum VideoOutcome {
    Done {
        chunks: usize,
        blocks: usize,
        paths: SubtitlePaths,
    },
    Failed {
        /// Last stage completed before the failure
        reached: VideoStage,
        error: SubflowError,
    },
}

#[derive(Debug)]
pub struct VideoReport {
    pub video: PathBuf,
    pub outcome: VideoOutcome,
}

impl VideoReport {
    pub fn is_done(&self) -> bool {
        matches!(self.outcome, VideoOutcome::Done { .. })
    }
}

#[derive(Debug)]
pub struct BatchReport {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub videos: Vec<VideoReport>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.videos.iter().filter(|report| report.is_done()).count()
    }

    pub fn failed(&self) -> usize {
        self.videos.len() - self.succeeded()
    }
}

/// Batch orchestrator: runs every video of a directory through
/// extraction, segmentation, transcription, assembly and translation, one at a time.
pub struct Workflow {
    config: Config,
    media: Arc<dyn MediaProcessorTrait>,
    extractor: AudioExtractor,
    segmenter: AudioSegmenter,
    transcription: TranscriptionStage,
    assembler: SubtitleAssembler,
    translation: TranslationStage,
}

impl Workflow {
    pub fn new(config: Config, credentials: &Credentials) -> Result<Self> {
        config.validate()?;

        let media = MediaProcessorFactory::create_processor(config.media.clone());
        let transcriber = TranscriberFactory::create_default(config.transcriber.clone(), credentials)?;
        let translator = TranslatorFactory::create_translator(config.translate.clone(), credentials)?;

        Ok(Self::with_components(config, media, transcriber, translator))
    }

    pub fn with_components(
        config: Config,
        media: Arc<dyn MediaProcessorTrait>,
        transcriber: Box<dyn TranscriberTrait>,
        translator: Box<dyn Translator>,
    ) -> Self {
        let segment_duration = config.media.segment_duration();

        Self {
            extractor: AudioExtractor::new(
                media.clone(),
                &config.paths.temp_dir,
                &config.media.audio_extension,
            ),
            segmenter: AudioSegmenter::new(media.clone(), segment_duration),
            transcription: TranscriptionStage::new(transcriber),
            assembler: SubtitleAssembler::new(SegmentTimer::new(segment_duration)),
            translation: TranslationStage::new(translator, &config.translate.target_language),
            media,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn check_dependencies(&self) -> Result<String> {
        self.media.check_availability().await?;
        self.media.get_version_info().await
    }

    /// Video files directly inside `input_dir`, sorted by name
    pub fn discover_videos<P: AsRef<Path>>(&self, input_dir: P) -> Result<Vec<PathBuf>> {
        let input_dir = input_dir.as_ref();
        if !input_dir.is_dir() {
            return Err(SubflowError::FileNotFound(input_dir.display().to_string()));
        }

        let mut video_files = Vec::new();
        for entry in WalkDir::new(input_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| SubflowError::Storage(e.into()))?;
            if entry.file_type().is_file() && self.config.media.is_video_file(entry.path()) {
                video_files.push(entry.path().to_path_buf());
            }
        }

        Ok(video_files)
    }

    /// Process every video in `input_dir`; a failing video never stops the batch
    pub async fn run<P: AsRef<Path>>(&self, input_dir: P) -> Result<BatchReport> {
        let input_dir = input_dir.as_ref();
        let started_at = Local::now();
        info!("Processing directory: {}", input_dir.display());

        fs::create_dir_all(&self.config.paths.temp_dir).await?;

        let video_files = self.discover_videos(input_dir)?;
        info!("Found {} video files to process", video_files.len());

        let mut videos = Vec::with_capacity(video_files.len());
        for video_path in video_files {
            let report = self.process_video(&video_path).await;
            match &report.outcome {
                VideoOutcome::Done { blocks, .. } => {
                    info!("Successfully processed {} ({} blocks)", video_path.display(), *blocks)
                }
                VideoOutcome::Failed { reached, error } => {
                    error!("Failed to process {} after {}: {}", video_path.display(), reached, error)
                }
            }
            videos.push(report);
        }

        let report = BatchReport {
            started_at,
            finished_at: Local::now(),
            videos,
        };
        info!(
            "Batch finished: {} succeeded, {} failed in {}s",
            report.succeeded(),
            report.failed(),
            (report.finished_at - report.started_at).num_seconds()
        );
        Ok(report)
    }

    /// Process one video file, failing if the file is missing or any stage fails
    pub async fn process_single_file<P: AsRef<Path>>(&self, video_path: P) -> Result<SubtitlePaths> {
        let video_path = video_path.as_ref();
        if !video_path.is_file() {
            return Err(SubflowError::FileNotFound(video_path.display().to_string()));
        }

        match self.process_video(video_path).await.outcome {
            VideoOutcome::Done { paths, .. } => Ok(paths),
            VideoOutcome::Failed { error, .. } => Err(error),
        }
    }

    pub async fn process_video(&self, video_path: &Path) -> VideoReport {
        info!("Processing video: {}", video_path.display());

        let mut reached = VideoStage::Discovered;
        let outcome = match self.drive_video(video_path, &mut reached).await {
            Ok((chunks, document, paths)) => VideoOutcome::Done {
                chunks,
                blocks: document.len(),
                paths,
            },
            Err(error) => VideoOutcome::Failed { reached, error },
        };

        VideoReport {
            video: video_path.to_path_buf(),
            outcome,
        }
    }

    async fn drive_video(
        &self,
        video_path: &Path,
        reached: &mut VideoStage,
    ) -> Result<(usize, SubtitleDocument, SubtitlePaths)> {
        fs::create_dir_all(&self.config.paths.temp_dir).await?;
        let asset = self.extractor.extract_audio(video_path).await?;
        *reached = VideoStage::Extracted;

        let chunks = self
            .segmenter
            .segment(&asset, &self.config.paths.temp_dir)
            .await?;
        asset.file.remove().await?;
        *reached = VideoStage::Segmented;

        let chunk_count = chunks.len();
        let entries = self.transcription.transcribe_all(chunks).await;
        if entries.is_empty() {
            warn!("No chunk of {} could be transcribed", video_path.display());
        }
        *reached = VideoStage::Transcribed;

        let paths = self
            .config
            .paths
            .subtitle_paths(video_path, &self.config.translate.file_suffix());
        let document = self.assemble_and_translate(&entries, &paths, reached).await?;
        *reached = VideoStage::Done;

        Ok((chunk_count, document, paths))
    }

    /// Write the subtitle document, then translate it; returns once translation
    /// has finished or failed.
    pub async fn assemble_and_translate(
        &self,
        entries: &[TranscriptEntry],
        paths: &SubtitlePaths,
        reached: &mut VideoStage,
    ) -> Result<SubtitleDocument> {
        let document = self.assembler.assemble(entries, &paths.original).await?;
        *reached = VideoStage::Assembled;

        self.translation
            .translate_file(&paths.original, &paths.translated)
            .await?;
        *reached = VideoStage::Translated;

        Ok(document)
    }

    /// Translate an existing subtitle file
    pub async fn translate_subtitles<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<()> {
        self.translation.translate_file(input_path, output_path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcribe::MockTranscriberTrait;
    use crate::translate::MockTranslator;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Transcoder double: "extracts" videos listed with a duration and splits
    /// them into the number of chunks ffmpeg would produce
    struct FakeMedia {
        durations: HashMap<String, u64>,
        sources: Mutex<HashMap<PathBuf, String>>,
    }

    impl FakeMedia {
        fn new(durations: &[(&str, u64)]) -> Self {
            Self {
                durations: durations
                    .iter()
                    .map(|(name, secs)| (name.to_string(), *secs))
                    .collect(),
                sources: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl MediaProcessorTrait for FakeMedia {
        async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()> {
            let name = video_path.file_name().unwrap().to_string_lossy().to_string();
            if !self.durations.contains_key(&name) {
                return Err(SubflowError::Extraction(format!("{}: invalid data", name)));
            }
            std::fs::write(audio_path, b"audio")?;
            self.sources.lock().unwrap().insert(audio_path.to_path_buf(), name);
            Ok(())
        }

        async fn split_audio(
            &self,
            audio_path: &Path,
            output_pattern: &Path,
            segment_duration: Duration,
        ) -> Result<()> {
            let name = self.sources.lock().unwrap()[audio_path].clone();
            let seconds = self.durations[&name];
            let count = seconds.div_ceil(segment_duration.as_secs());
            let pattern = output_pattern.to_string_lossy().to_string();
            // Written in reverse to make listing order differ from ordinal order
            for index in (0..count).rev() {
                std::fs::write(pattern.replace("%03d", &format!("{:03}", index)), b"chunk")?;
            }
            Ok(())
        }

        async fn check_availability(&self) -> Result<()> {
            Ok(())
        }

        async fn get_version_info(&self) -> Result<String> {
            Ok("fake".to_string())
        }
    }

    fn chunk_ordinal(path: &Path) -> usize {
        let stem = path.file_stem().unwrap().to_string_lossy().to_string();
        stem.rsplit('_').next().unwrap().parse().unwrap()
    }

    /// Transcribes chunk k as "segment k", failing the listed ordinals
    fn transcriber(failing: &'static [usize]) -> Box<MockTranscriberTrait> {
        let mut transcriber = MockTranscriberTrait::new();
        transcriber.expect_transcribe().returning(move |path| {
            let ordinal = chunk_ordinal(path);
            if failing.contains(&ordinal) {
                Err(SubflowError::Transcription("500 Internal Server Error".to_string()))
            } else {
                Ok(format!("segment {}", ordinal))
            }
        });
        Box::new(transcriber)
    }

    fn shouting_translator() -> Box<MockTranslator> {
        let mut translator = MockTranslator::new();
        translator
            .expect_translate()
            .returning(|text, _| Ok(text.to_uppercase()));
        Box::new(translator)
    }

    fn config_in(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.paths.input_dir = dir.path().join("videos");
        config.paths.temp_dir = dir.path().join("temp");
        config.paths.output_srt = dir.path().join("output.srt");
        std::fs::create_dir_all(&config.paths.input_dir).unwrap();
        config
    }

    fn add_video(config: &Config, name: &str) -> PathBuf {
        let path = config.paths.input_dir.join(name);
        std::fs::write(&path, b"video").unwrap();
        path
    }

    fn temp_is_empty(config: &Config) -> bool {
        std::fs::read_dir(&config.paths.temp_dir).unwrap().count() == 0
    }

    #[tokio::test]
    async fn test_130_second_video_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        add_video(&config, "lecture.mp4");

        let workflow = Workflow::with_components(
            config.clone(),
            Arc::new(FakeMedia::new(&[("lecture.mp4", 130)])),
            transcriber(&[]),
            shouting_translator(),
        );
        let report = workflow.run(&config.paths.input_dir).await.unwrap();

        assert_eq!(report.succeeded(), 1);
        match &report.videos[0].outcome {
            VideoOutcome::Done { chunks, blocks, .. } => {
                assert_eq!(*chunks, 3);
                assert_eq!(*blocks, 3);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let original = std::fs::read_to_string(dir.path().join("output.srt")).unwrap();
        assert_eq!(
            original,
            "1\n00:00:00,000 --> 00:01:00,000\nsegment 0\n\n\
             2\n00:01:00,000 --> 00:02:00,000\nsegment 1\n\n\
             3\n00:02:00,000 --> 00:03:00,000\nsegment 2\n"
        );

        let translated = std::fs::read_to_string(dir.path().join("output.pt-br.srt")).unwrap();
        assert_eq!(translated, original.replace("segment", "SEGMENT"));
        assert!(temp_is_empty(&config));
    }

    #[tokio::test]
    async fn test_failed_chunk_shifts_later_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        add_video(&config, "lecture.mp4");

        let workflow = Workflow::with_components(
            config.clone(),
            Arc::new(FakeMedia::new(&[("lecture.mp4", 130)])),
            transcriber(&[1]),
            shouting_translator(),
        );
        workflow.run(&config.paths.input_dir).await.unwrap();

        // Chunk 2 really starts at 2:00 but is timed as the second block
        let original = std::fs::read_to_string(dir.path().join("output.srt")).unwrap();
        assert_eq!(
            original,
            "1\n00:00:00,000 --> 00:01:00,000\nsegment 0\n\n\
             2\n00:01:00,000 --> 00:02:00,000\nsegment 2\n"
        );
        assert!(temp_is_empty(&config));
    }

    #[tokio::test]
    async fn test_one_bad_video_does_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir);
        config.paths.per_video_outputs = true;
        config.paths.output_dir = dir.path().join("subs");
        add_video(&config, "a_corrupt.avi");
        add_video(&config, "b_talk.MKV");
        add_video(&config, "notes.txt");

        let workflow = Workflow::with_components(
            config.clone(),
            Arc::new(FakeMedia::new(&[("b_talk.MKV", 60)])),
            transcriber(&[]),
            shouting_translator(),
        );
        let report = workflow.run(&config.paths.input_dir).await.unwrap();

        assert_eq!(report.videos.len(), 2);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(matches!(
            report.videos[0].outcome,
            VideoOutcome::Failed {
                reached: VideoStage::Discovered,
                error: SubflowError::Extraction(_)
            }
        ));
        assert!(report.videos[1].is_done());
        assert!(dir.path().join("subs/b_talk.srt").exists());
        assert!(dir.path().join("subs/b_talk.pt-br.srt").exists());
        assert!(temp_is_empty(&config));
    }

    #[tokio::test]
    async fn test_translation_failure_fails_video_after_assembly() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let video = add_video(&config, "lecture.mov");

        let mut translator = MockTranslator::new();
        translator
            .expect_translate()
            .returning(|_, _| Err(SubflowError::Translation("quota exceeded".to_string())));

        let workflow = Workflow::with_components(
            config.clone(),
            Arc::new(FakeMedia::new(&[("lecture.mov", 90)])),
            transcriber(&[]),
            Box::new(translator),
        );

        // Nothing has created the temp directory yet
        assert!(!config.paths.temp_dir.exists());
        let report = workflow.process_video(&video).await;
        assert!(matches!(
            report.outcome,
            VideoOutcome::Failed {
                reached: VideoStage::Assembled,
                error: SubflowError::Translation(_)
            }
        ));
        assert!(dir.path().join("output.srt").exists());
        assert!(!dir.path().join("output.pt-br.srt").exists());

        let err = workflow.process_single_file(&video).await.unwrap_err();
        assert!(matches!(err, SubflowError::Translation(_)));
    }

    #[tokio::test]
    async fn test_discover_videos_is_flat_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        add_video(&config, "c.mov");
        add_video(&config, "a.MP4");
        add_video(&config, "b.mp3");
        std::fs::create_dir_all(config.paths.input_dir.join("nested")).unwrap();
        std::fs::write(config.paths.input_dir.join("nested/d.mp4"), b"video").unwrap();

        let workflow = Workflow::with_components(
            config.clone(),
            Arc::new(FakeMedia::new(&[])),
            Box::new(MockTranscriberTrait::new()),
            Box::new(MockTranslator::new()),
        );
        let videos = workflow.discover_videos(&config.paths.input_dir).unwrap();
        let names: Vec<String> = videos
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.MP4", "c.mov"]);

        assert!(matches!(
            workflow.discover_videos(dir.path().join("missing")),
            Err(SubflowError::FileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let workflow = Workflow::with_components(
            config,
            Arc::new(FakeMedia::new(&[])),
            Box::new(MockTranscriberTrait::new()),
            Box::new(MockTranslator::new()),
        );
        let err = workflow
            .process_single_file(dir.path().join("nope.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, SubflowError::FileNotFound(_)));
    }
}
