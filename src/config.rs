use crate::cli::Args;
use crate::options::{
    DEFAULT_DISPLAY_INTERVAL, DEFAULT_HIGH_THRESHOLD, DEFAULT_SAMPLE_INTERVAL,
    DEFAULT_WARN_THRESHOLD,
};
use serde::Deserialize;
use std::path::Path;

/// Startup defaults, optionally read from `~/.nvsharptop` (TOML).
///
/// The file only seeds defaults; command-line arguments override it and
/// runtime key presses mutate the option store directly. Nothing is ever
/// written back.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(rename = "SampleInterval")]
    pub sample_interval: f64,

    #[serde(rename = "DisplayInterval")]
    pub display_interval: f64,

    #[serde(rename = "Compact")]
    pub compact: bool,

    #[serde(rename = "Animate")]
    pub animate: bool,

    #[serde(rename = "Pixel")]
    pub pixel: bool,

    #[serde(rename = "BarChar")]
    pub bar_char: String,

    #[serde(rename = "Background")]
    pub background: String,

    #[serde(rename = "WarnThreshold")]
    pub warn_threshold: u8,

    #[serde(rename = "HighThreshold")]
    pub high_threshold: u8,

    #[serde(rename = "Cleanup")]
    pub cleanup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            display_interval: DEFAULT_DISPLAY_INTERVAL,
            compact: false,
            animate: false,
            pixel: false,
            bar_char: "█".to_string(),
            background: "space".to_string(),
            warn_threshold: DEFAULT_WARN_THRESHOLD,
            high_threshold: DEFAULT_HIGH_THRESHOLD,
            cleanup: true,
        }
    }
}

impl Config {
    /// A missing or malformed file falls back to built-in defaults; config
    /// problems never abort startup.
    #[must_use]
    pub fn load() -> Self {
        match dirs::home_dir() {
            Some(home) => Self::from_path(&home.join(".nvsharptop")),
            None => Self::default(),
        }
    }

    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("nvsharptop: ignoring malformed config {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Command-line arguments override file values only when actually given.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(interval) = args.sample_interval {
            self.sample_interval = interval;
        }
        if let Some(interval) = args.display_interval {
            self.display_interval = interval;
        }
        if let Some(cleanup) = args.cleanup {
            self.cleanup = cleanup;
        }
        if args.compact {
            self.compact = true;
        }
        if args.animate {
            self.animate = true;
        }
        if args.pixel {
            self.pixel = true;
        }
        if let Some(bar_char) = args.bar_char {
            self.bar_char = bar_char.to_string();
        }
        if let Some(warn) = args.warn_threshold {
            self.warn_threshold = warn;
        }
        if let Some(high) = args.high_threshold {
            self.high_threshold = high;
        }
        if let Some(background) = args.background {
            self.background = background.token().to_string();
        }
    }
}
