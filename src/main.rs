//! subflow - batch video-to-subtitle workflow
//!
//! Extracts and segments audio with ffmpeg, transcribes each segment with a
//! Whisper API, assembles an SRT document and translates it line by line.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subflow::audio::{collect_chunks, AudioExtractor, AudioSegmenter};
use subflow::cli::{Args, Commands};
use subflow::config::{Config, Credentials};
use subflow::media::MediaProcessorFactory;
use subflow::translate::{TranslationStage, TranslatorFactory};
use subflow::workflow::Workflow;

const DEFAULT_CONFIG_FILE: &str = "subflow.toml";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let _log_guard = setup_logging(args.verbose)?;

    let mut config = load_config(args.config.as_deref())?;

    match args.command {
        Commands::Batch { input_dir, target_lang, segment_duration } => {
            apply_overrides(&mut config, target_lang, segment_duration);
            config.validate()?;

            let credentials = Credentials::from_env(&config)?;
            let input_dir = input_dir.unwrap_or_else(|| config.paths.input_dir.clone());
            let workflow = Workflow::new(config, &credentials)?;
            workflow.check_dependencies().await?;

            let report = workflow.run(&input_dir).await?;
            if report.failed() > 0 {
                warn!("{} of {} videos failed", report.failed(), report.videos.len());
            }
        }
        Commands::Process { input, target_lang, segment_duration } => {
            apply_overrides(&mut config, target_lang, segment_duration);
            config.validate()?;

            let credentials = Credentials::from_env(&config)?;
            let workflow = Workflow::new(config, &credentials)?;
            workflow.check_dependencies().await?;

            let paths = workflow.process_single_file(&input).await?;
            println!("{}", paths.original.display());
            println!("{}", paths.translated.display());
        }
        Commands::Extract { input } => {
            config.validate()?;
            tokio::fs::create_dir_all(&config.paths.temp_dir).await?;

            let media = MediaProcessorFactory::create_processor(config.media.clone());
            let extractor = AudioExtractor::new(media, &config.paths.temp_dir, &config.media.audio_extension);
            let asset = extractor.extract_audio(&input).await?;
            println!("{}", asset.file.keep().display());
        }
        Commands::Split { input, prefix, output_dir, segment_duration } => {
            apply_overrides(&mut config, None, segment_duration);
            config.validate()?;

            let output_dir = output_dir.unwrap_or_else(|| config.paths.temp_dir.clone());
            tokio::fs::create_dir_all(&output_dir).await?;
            let prefix = prefix.unwrap_or_else(|| file_stem(&input));

            let media = MediaProcessorFactory::create_processor(config.media.clone());
            let segmenter = AudioSegmenter::new(media, config.media.segment_duration());
            segmenter.split_audio(&input, &output_dir, &prefix).await?;

            let extension = input
                .extension()
                .map(|ext| ext.to_string_lossy().to_string())
                .unwrap_or_default();
            for chunk in collect_chunks(&output_dir, &prefix, &extension).await? {
                println!("{}", chunk.file.keep().display());
            }
        }
        Commands::Translate { input, output, target_lang } => {
            apply_overrides(&mut config, target_lang, None);
            config.validate()?;

            let credentials = Credentials::from_env(&config)?;
            let translator = TranslatorFactory::create_translator(config.translate.clone(), &credentials)?;
            let stage = TranslationStage::new(translator, &config.translate.target_language);
            stage.translate_file(&input, &output).await?;
        }
        Commands::InitConfig { output } => {
            config.save_to_file(&output)?;
            println!("Configuration written to {}", output.display());
        }
        Commands::Check => {
            let media = MediaProcessorFactory::create_processor(config.media.clone());
            media.check_availability().await?;
            println!("{}", media.get_version_info().await?);
        }
    }

    info!("subflow completed");
    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let config = match explicit {
        Some(path) => Config::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
            Config::from_file(DEFAULT_CONFIG_FILE)?
        }
        None => Config::default(),
    };
    Ok(config)
}

fn apply_overrides(config: &mut Config, target_lang: Option<String>, segment_duration: Option<u64>) {
    if let Some(lang) = target_lang {
        config.translate.target_language = lang;
    }
    if let Some(seconds) = segment_duration {
        config.media.segment_duration_secs = seconds;
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "chunk".to_string())
}

/// Setup logging to both console and a daily rotated file
fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir: PathBuf = std::env::current_dir()?.join(".subflow").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "subflow.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("subflow.log").display());

    Ok(guard)
}
