use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::error::{Result, SubflowError};

/// Longest accepted segment; one day
pub const MAX_SEGMENT_DURATION_SECS: u64 = 86_400;

fn default_timeout_secs() -> u64 {
    300
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub media: MediaConfig,
    pub transcriber: TranscriberConfig,
    pub translate: TranslateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory scanned for source videos
    pub input_dir: PathBuf,
    /// Scratch directory for extracted audio and chunks
    pub temp_dir: PathBuf,
    /// Untranslated subtitle document
    pub output_srt: PathBuf,
    /// Translated subtitle document; derived from `output_srt` and the
    /// target language when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_srt: Option<PathBuf>,
    /// Write `<output_dir>/<video stem>.srt` per video instead of the fixed paths
    pub per_video_outputs: bool,
    /// Destination for per-video outputs
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Container/extension used for extracted audio and chunks
    pub audio_extension: String,
    /// Fixed chunk length in seconds
    pub segment_duration_secs: u64,
    /// Extensions (case-insensitive) recognised as video sources
    pub video_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriberConfig {
    /// Base URL of an OpenAI-compatible API
    pub endpoint: String,
    /// Speech-to-text model identifier
    pub model: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Base URL of an OpenAI-compatible API
    pub endpoint: String,
    /// Chat completion model used for translation
    pub model: String,
    /// Target language code, e.g. `pt-BR`
    pub target_language: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("videos"),
            temp_dir: PathBuf::from("temp"),
            output_srt: PathBuf::from("output.srt"),
            translated_srt: None,
            per_video_outputs: false,
            output_dir: PathBuf::from("subtitles"),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            audio_extension: "mp3".to_string(),
            segment_duration_secs: 60,
            video_extensions: ["mp4", "avi", "mov", "mkv"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "whisper-1".to_string(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            target_language: "pt-BR".to_string(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl MediaConfig {
    pub fn segment_duration(&self) -> Duration {
        Duration::from_secs(self.segment_duration_secs)
    }

    pub fn is_video_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.video_extensions
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

impl TranslateConfig {
    /// Lowercased language tag used in translated file names (`pt-BR` -> `pt-br`)
    pub fn file_suffix(&self) -> String {
        self.target_language.to_lowercase()
    }
}

/// Output locations for one video's subtitle documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitlePaths {
    pub original: PathBuf,
    pub translated: PathBuf,
}

impl PathsConfig {
    pub fn subtitle_paths(&self, video_path: &Path, language_suffix: &str) -> SubtitlePaths {
        if self.per_video_outputs {
            let stem = video_path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "output".to_string());
            return SubtitlePaths {
                original: self.output_dir.join(format!("{}.srt", stem)),
                translated: self.output_dir.join(format!("{}.{}.srt", stem, language_suffix)),
            };
        }

        let translated = self.translated_srt.clone().unwrap_or_else(|| {
            self.output_srt.with_extension(format!("{}.srt", language_suffix))
        });

        SubtitlePaths {
            original: self.output_srt.clone(),
            translated,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubflowError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| SubflowError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubflowError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubflowError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.media.segment_duration_secs == 0 {
            return Err(SubflowError::Config(
                "media.segment_duration_secs must be greater than zero".to_string(),
            ));
        }
        if self.media.segment_duration_secs > MAX_SEGMENT_DURATION_SECS {
            return Err(SubflowError::Config(format!(
                "media.segment_duration_secs must be at most {}",
                MAX_SEGMENT_DURATION_SECS
            )));
        }
        if self.media.video_extensions.is_empty() {
            return Err(SubflowError::Config(
                "media.video_extensions must list at least one extension".to_string(),
            ));
        }
        if self.media.audio_extension.trim().is_empty() {
            return Err(SubflowError::Config("media.audio_extension is empty".to_string()));
        }
        if self.translate.target_language.trim().is_empty() {
            return Err(SubflowError::Config("translate.target_language is empty".to_string()));
        }
        Ok(())
    }
}

/// API keys resolved once at startup
#[derive(Clone)]
pub struct Credentials {
    pub transcriber_api_key: String,
    pub translate_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("transcriber_api_key", &"<redacted>")
            .field("translate_api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read both API keys from the process environment
    pub fn from_env(config: &Config) -> Result<Self> {
        Self::from_lookup(config, |name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(config: &Config, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| SubflowError::MissingCredential(name.to_string()))
        };

        Ok(Self {
            transcriber_api_key: fetch(&config.transcriber.api_key_env)?,
            translate_api_key: fetch(&config.translate.api_key_env)?,
        })
    }
}
