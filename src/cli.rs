use clap::Parser;

use crate::options::{
    DEFAULT_BAR_CHAR, DEFAULT_DISPLAY_INTERVAL, DEFAULT_HIGH_THRESHOLD, DEFAULT_SAMPLE_INTERVAL,
    DEFAULT_WARN_THRESHOLD,
};

#[derive(Parser, Default)]
#[command(name = "nvsharptop", about = "A live Nvidia GPU dashboard for the terminal")]
#[command(version, long_about = None)]
pub struct Args {
    /// Seconds between nvidia-smi samples (floor 0.01) [default: 1.0]
    #[arg(short = 's', long = "sample-interval", allow_hyphen_values = true, value_parser = lenient_sample_interval)]
    pub sample_interval: Option<f64>,

    /// Seconds between display refreshes (floor 0.1) [default: 2.0]
    #[arg(short = 'd', long = "display-interval", allow_hyphen_values = true, value_parser = lenient_display_interval)]
    pub display_interval: Option<f64>,

    /// Clear the terminal on exit instead of printing a final summary [default: true]
    #[arg(long = "cleanup", value_name = "BOOL", value_parser = lenient_bool)]
    pub cleanup: Option<bool>,

    /// Compact per-device layout (summary rows only, no gauges)
    #[arg(short = 'c', long)]
    pub compact: bool,

    /// Refresh the display at the sampling rate
    #[arg(short = 'a', long)]
    pub animate: bool,

    /// Character used for bar fills (first character of the value) [default: █]
    #[arg(long = "bar-char", value_name = "CHAR", value_parser = lenient_bar_char)]
    pub bar_char: Option<char>,

    /// Utilization percent where bars turn yellow [default: 60]
    #[arg(long = "warn", value_name = "PCT", value_parser = lenient_warn_threshold)]
    pub warn_threshold: Option<u8>,

    /// Utilization percent where bars turn red [default: 85]
    #[arg(long = "high", value_name = "PCT", value_parser = lenient_high_threshold)]
    pub high_threshold: Option<u8>,

    /// Background glyph for the vertical view (space, dot, shade)
    #[arg(short = 'b', long = "background", value_name = "GLYPH", value_parser = lenient_background)]
    pub background: Option<BackgroundGlyph>,

    /// Render fractional bar cells with sub-character glyphs
    #[arg(short = 'p', long)]
    pub pixel: bool,

    /// List detected GPUs and exit
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Collect one sample, print it as plain text and exit
    #[arg(long)]
    pub once: bool,

    /// Append per-tick readings to this log file
    #[arg(short = 'f', long = "file")]
    pub log_file: Option<String>,
}

/// Glyph drawn in the empty cells of the vertical bar history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BackgroundGlyph {
    #[default]
    Space,
    Dot,
    Shade,
}

impl BackgroundGlyph {
    #[must_use]
    pub fn next(&self) -> Self {
        match self {
            Self::Space => Self::Dot,
            Self::Dot => Self::Shade,
            Self::Shade => Self::Space,
        }
    }

    #[must_use]
    pub fn as_char(&self) -> char {
        match self {
            Self::Space => ' ',
            Self::Dot => '·',
            Self::Shade => '░',
        }
    }

    #[must_use]
    pub fn token(&self) -> &'static str {
        match self {
            Self::Space => "space",
            Self::Dot => "dot",
            Self::Shade => "shade",
        }
    }

    #[must_use]
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "space" => Some(Self::Space),
            "dot" => Some(Self::Dot),
            "shade" => Some(Self::Shade),
            _ => None,
        }
    }
}

// Invalid values fall back to the documented default for that option instead
// of aborting argument parsing.

fn lenient_sample_interval(s: &str) -> Result<f64, String> {
    Ok(s.parse().unwrap_or(DEFAULT_SAMPLE_INTERVAL))
}

fn lenient_display_interval(s: &str) -> Result<f64, String> {
    Ok(s.parse().unwrap_or(DEFAULT_DISPLAY_INTERVAL))
}

fn lenient_bool(s: &str) -> Result<bool, String> {
    Ok(s.parse().unwrap_or(true))
}

fn lenient_bar_char(s: &str) -> Result<char, String> {
    Ok(s.chars().next().unwrap_or(DEFAULT_BAR_CHAR))
}

fn lenient_warn_threshold(s: &str) -> Result<u8, String> {
    Ok(s.parse().unwrap_or(DEFAULT_WARN_THRESHOLD))
}

fn lenient_high_threshold(s: &str) -> Result<u8, String> {
    Ok(s.parse().unwrap_or(DEFAULT_HIGH_THRESHOLD))
}

fn lenient_background(s: &str) -> Result<BackgroundGlyph, String> {
    Ok(BackgroundGlyph::from_token(s).unwrap_or_default())
}
