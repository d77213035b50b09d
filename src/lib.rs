//! subflow - batch video-to-subtitle workflow
//!
//! Turns a folder of videos into SRT subtitles and translated SRT subtitles
//! using ffmpeg, an OpenAI-compatible Whisper API and a chat-completion model.
//! Also ships an unrelated paginated row-copy job (`rowcopy`).

pub mod cli;
pub mod config;
pub mod workflow;
pub mod timing;
pub mod audio;
pub mod transcribe;
pub mod translate;
pub mod subtitle;
pub mod media;
pub mod error;
pub mod rowcopy;
