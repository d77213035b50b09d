use std::fmt;
use std::time::Duration;

/// Half-open interval `[start, end)` covered by one audio segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    pub start: Duration,
    pub end: Duration,
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --> {}", format_timestamp(self.start), format_timestamp(self.end))
    }
}

/// Maps a segment index to its time range for a fixed segment length
#[derive(Debug, Clone, Copy)]
pub struct SegmentTimer {
    duration: Duration,
}

impl SegmentTimer {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Spans past `Duration::MAX` saturate instead of wrapping
    pub fn span(&self, index: usize) -> TimeSpan {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        TimeSpan {
            start: self.duration.saturating_mul(index),
            end: self.duration.saturating_mul(index.saturating_add(1)),
        }
    }
}

/// Format a time offset as an SRT timestamp (HH:MM:SS,mmm)
pub fn format_timestamp(offset: Duration) -> String {
    let total_milliseconds = offset.as_millis();
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}
