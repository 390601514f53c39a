use std::time::Duration;

use crate::cli::BackgroundGlyph;
use crate::config::Config;

pub const MIN_SAMPLE_INTERVAL: f64 = 0.01;
pub const MIN_DISPLAY_INTERVAL: f64 = 0.1;

pub const DEFAULT_SAMPLE_INTERVAL: f64 = 1.0;
pub const DEFAULT_DISPLAY_INTERVAL: f64 = 2.0;
pub const DEFAULT_WARN_THRESHOLD: u8 = 60;
pub const DEFAULT_HIGH_THRESHOLD: u8 = 85;
pub const DEFAULT_BAR_CHAR: char = '█';

/// Step applied by the interactive interval keys on the start screen.
const SAMPLE_INTERVAL_STEP: f64 = 0.1;
const DISPLAY_INTERVAL_STEP: f64 = 0.1;

/// Runtime option store shared by the sampling and render paths.
///
/// Every setter clamps to its documented floor, so no sequence of CLI
/// arguments or key presses can leave the store in an invalid state.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewOptions {
    sample_interval: f64,
    display_interval: f64,
    pub compact: bool,
    pub animate: bool,
    pub pixel: bool,
    pub crawl: bool,
    pub sparkline: bool,
    pub background: BackgroundGlyph,
    pub bar_char: char,
    warn_threshold: u8,
    high_threshold: u8,
    pub cleanup: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            display_interval: DEFAULT_DISPLAY_INTERVAL,
            compact: false,
            animate: false,
            pixel: false,
            crawl: false,
            sparkline: false,
            background: BackgroundGlyph::default(),
            bar_char: DEFAULT_BAR_CHAR,
            warn_threshold: DEFAULT_WARN_THRESHOLD,
            high_threshold: DEFAULT_HIGH_THRESHOLD,
            cleanup: true,
        }
    }
}

impl ViewOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let mut options = Self {
            compact: config.compact,
            animate: config.animate,
            pixel: config.pixel,
            background: BackgroundGlyph::from_token(&config.background).unwrap_or_default(),
            bar_char: config.bar_char.chars().next().unwrap_or(DEFAULT_BAR_CHAR),
            cleanup: config.cleanup,
            ..Self::default()
        };
        options.set_sample_interval(config.sample_interval);
        options.set_display_interval(config.display_interval);
        options.set_thresholds(config.warn_threshold, config.high_threshold);
        options
    }

    pub fn set_sample_interval(&mut self, secs: f64) {
        self.sample_interval = if secs.is_finite() {
            secs.max(MIN_SAMPLE_INTERVAL)
        } else {
            DEFAULT_SAMPLE_INTERVAL
        };
    }

    pub fn set_display_interval(&mut self, secs: f64) {
        self.display_interval = if secs.is_finite() {
            secs.max(MIN_DISPLAY_INTERVAL)
        } else {
            DEFAULT_DISPLAY_INTERVAL
        };
    }

    /// `high` is clamped to at least `warn` so the three color bands stay
    /// ordered.
    pub fn set_thresholds(&mut self, warn: u8, high: u8) {
        self.warn_threshold = warn.min(100);
        self.high_threshold = high.clamp(self.warn_threshold, 100);
    }

    #[must_use]
    pub fn sample_interval_secs(&self) -> f64 {
        self.sample_interval
    }

    #[must_use]
    pub fn display_interval_secs(&self) -> f64 {
        self.display_interval
    }

    #[must_use]
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs_f64(self.sample_interval)
    }

    /// The render tick: the display interval, or the sample interval when
    /// animate is on.
    #[must_use]
    pub fn render_interval(&self) -> Duration {
        if self.animate {
            self.sample_interval()
        } else {
            Duration::from_secs_f64(self.display_interval)
        }
    }

    #[must_use]
    pub fn warn_threshold(&self) -> u8 {
        self.warn_threshold
    }

    #[must_use]
    pub fn high_threshold(&self) -> u8 {
        self.high_threshold
    }

    pub fn faster_sampling(&mut self) {
        self.set_sample_interval(self.sample_interval - SAMPLE_INTERVAL_STEP);
    }

    pub fn slower_sampling(&mut self) {
        self.set_sample_interval(self.sample_interval + SAMPLE_INTERVAL_STEP);
    }

    pub fn faster_display(&mut self) {
        self.set_display_interval(self.display_interval - DISPLAY_INTERVAL_STEP);
    }

    pub fn slower_display(&mut self) {
        self.set_display_interval(self.display_interval + DISPLAY_INTERVAL_STEP);
    }

    pub fn cycle_background(&mut self) {
        self.background = self.background.next();
    }

    pub fn toggle_compact(&mut self) {
        self.compact = !self.compact;
    }

    pub fn toggle_animate(&mut self) {
        self.animate = !self.animate;
    }

    pub fn toggle_pixel(&mut self) {
        self.pixel = !self.pixel;
    }

    pub fn toggle_crawl(&mut self) {
        self.crawl = !self.crawl;
    }

    pub fn toggle_sparkline(&mut self) {
        self.sparkline = !self.sparkline;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intervals_clamped_to_floors() {
        let mut options = ViewOptions::default();

        options.set_sample_interval(-5.0);
        assert_eq!(options.sample_interval_secs(), MIN_SAMPLE_INTERVAL);

        options.set_sample_interval(0.001);
        assert_eq!(options.sample_interval_secs(), MIN_SAMPLE_INTERVAL);

        options.set_display_interval(-1.0);
        assert_eq!(options.display_interval_secs(), MIN_DISPLAY_INTERVAL);

        options.set_display_interval(0.05);
        assert_eq!(options.display_interval_secs(), MIN_DISPLAY_INTERVAL);
    }

    #[test]
    fn test_non_finite_intervals_fall_back_to_defaults() {
        let mut options = ViewOptions::default();

        options.set_sample_interval(f64::NAN);
        assert_eq!(options.sample_interval_secs(), DEFAULT_SAMPLE_INTERVAL);

        options.set_display_interval(f64::INFINITY);
        assert_eq!(options.display_interval_secs(), DEFAULT_DISPLAY_INTERVAL);
    }

    #[test]
    fn test_faster_sampling_never_crosses_floor() {
        let mut options = ViewOptions::default();
        options.set_sample_interval(MIN_SAMPLE_INTERVAL);
        options.faster_sampling();
        assert_eq!(options.sample_interval_secs(), MIN_SAMPLE_INTERVAL);
    }

    #[test]
    fn test_threshold_ordering() {
        let mut options = ViewOptions::default();
        options.set_thresholds(90, 40);
        assert_eq!(options.warn_threshold(), 90);
        assert_eq!(options.high_threshold(), 90);

        options.set_thresholds(120, 130);
        assert_eq!(options.warn_threshold(), 100);
        assert_eq!(options.high_threshold(), 100);
    }

    #[test]
    fn test_background_cycles_through_all_glyphs() {
        let mut options = ViewOptions::default();
        let start = options.background;
        options.cycle_background();
        options.cycle_background();
        options.cycle_background();
        assert_eq!(options.background, start);
    }

    #[test]
    fn test_render_interval_follows_animate() {
        let mut options = ViewOptions::default();
        options.set_sample_interval(0.5);
        options.set_display_interval(3.0);

        assert_eq!(options.render_interval(), Duration::from_secs_f64(3.0));
        options.toggle_animate();
        assert_eq!(options.render_interval(), Duration::from_secs_f64(0.5));
    }
}
