use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Subtitle and translate every video in a directory
    Batch {
        /// Directory containing video files (defaults to paths.input_dir)
        #[arg(short, long)]
        input_dir: Option<PathBuf>,

        /// Target language for translation, e.g. pt-BR
        #[arg(short, long)]
        target_lang: Option<String>,

        /// Segment length in seconds
        #[arg(short, long)]
        segment_duration: Option<u64>,
    },

    /// Subtitle and translate a single video file
    Process {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Target language for translation, e.g. pt-BR
        #[arg(short, long)]
        target_lang: Option<String>,

        /// Segment length in seconds
        #[arg(short, long)]
        segment_duration: Option<u64>,
    },

    /// Extract the audio track of a video into the temp directory
    Extract {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Split an audio file into fixed-length chunks
    Split {
        /// Input audio file
        #[arg(short, long)]
        input: PathBuf,

        /// Chunk name prefix (defaults to the input file stem)
        #[arg(short, long)]
        prefix: Option<String>,

        /// Directory receiving the chunks (defaults to paths.temp_dir)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Segment length in seconds
        #[arg(short, long)]
        segment_duration: Option<u64>,
    },

    /// Translate an existing SRT file line by line
    Translate {
        /// Input subtitle file
        #[arg(short, long)]
        input: PathBuf,

        /// Output translated file
        #[arg(short, long)]
        output: PathBuf,

        /// Target language for translation, e.g. pt-BR
        #[arg(short, long)]
        target_lang: Option<String>,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Destination path
        #[arg(short, long, default_value = "subflow.toml")]
        output: PathBuf,
    },

    /// Check that the media processor is available
    Check,
}
