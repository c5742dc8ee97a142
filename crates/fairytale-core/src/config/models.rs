use crate::pagination::{FontMetrics, Layout, Viewport};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Flat reader configuration. On disk it is grouped into tables; see
/// `tables.rs`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_library_dir")]
    pub library_dir: PathBuf,
    #[serde(default = "crate::config::defaults::default_audio_dir")]
    pub audio_dir: PathBuf,
    #[serde(default = "crate::config::defaults::default_progress_dir")]
    pub progress_dir: PathBuf,
    #[serde(default = "crate::config::defaults::default_viewport_width")]
    pub viewport_width: f32,
    #[serde(default = "crate::config::defaults::default_viewport_height")]
    pub viewport_height: f32,
    #[serde(default = "crate::config::defaults::default_glyph_advance")]
    pub glyph_advance: f32,
    #[serde(default = "crate::config::defaults::default_line_height")]
    pub line_height: f32,
    #[serde(default = "crate::config::defaults::default_audio_enabled")]
    pub audio_enabled: bool,
    #[serde(default = "crate::config::defaults::default_seek_step_secs")]
    pub seek_step_secs: u64,
    #[serde(default = "crate::config::defaults::default_volume")]
    pub volume: f32,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
    #[serde(default = "crate::config::defaults::default_key_up")]
    pub key_up: String,
    #[serde(default = "crate::config::defaults::default_key_down")]
    pub key_down: String,
    #[serde(default = "crate::config::defaults::default_key_left")]
    pub key_left: String,
    #[serde(default = "crate::config::defaults::default_key_right")]
    pub key_right: String,
    #[serde(default = "crate::config::defaults::default_key_select")]
    pub key_select: String,
    #[serde(default = "crate::config::defaults::default_key_back")]
    pub key_back: String,
    #[serde(default = "crate::config::defaults::default_key_toggle_bookmark")]
    pub key_toggle_bookmark: String,
    #[serde(default = "crate::config::defaults::default_key_next_bookmark")]
    pub key_next_bookmark: String,
    #[serde(default = "crate::config::defaults::default_key_prev_bookmark")]
    pub key_prev_bookmark: String,
    #[serde(default = "crate::config::defaults::default_key_play_pause")]
    pub key_play_pause: String,
    #[serde(default = "crate::config::defaults::default_key_seek_forward")]
    pub key_seek_forward: String,
    #[serde(default = "crate::config::defaults::default_key_seek_backward")]
    pub key_seek_backward: String,
    #[serde(default = "crate::config::defaults::default_key_mark_complete")]
    pub key_mark_complete: String,
    #[serde(default = "crate::config::defaults::default_key_clear_complete")]
    pub key_clear_complete: String,
    #[serde(default = "crate::config::defaults::default_key_first_page")]
    pub key_first_page: String,
    #[serde(default = "crate::config::defaults::default_key_last_page")]
    pub key_last_page: String,
    #[serde(default = "crate::config::defaults::default_key_volume_up")]
    pub key_volume_up: String,
    #[serde(default = "crate::config::defaults::default_key_volume_down")]
    pub key_volume_down: String,
    #[serde(default = "crate::config::defaults::default_key_toggle_favorite")]
    pub key_toggle_favorite: String,
    #[serde(default = "crate::config::defaults::default_key_quit")]
    pub key_quit: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        use crate::config::defaults::*;
        AppConfig {
            library_dir: default_library_dir(),
            audio_dir: default_audio_dir(),
            progress_dir: default_progress_dir(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            glyph_advance: default_glyph_advance(),
            line_height: default_line_height(),
            audio_enabled: default_audio_enabled(),
            seek_step_secs: default_seek_step_secs(),
            volume: default_volume(),
            log_level: default_log_level(),
            key_up: default_key_up(),
            key_down: default_key_down(),
            key_left: default_key_left(),
            key_right: default_key_right(),
            key_select: default_key_select(),
            key_back: default_key_back(),
            key_toggle_bookmark: default_key_toggle_bookmark(),
            key_next_bookmark: default_key_next_bookmark(),
            key_prev_bookmark: default_key_prev_bookmark(),
            key_play_pause: default_key_play_pause(),
            key_seek_forward: default_key_seek_forward(),
            key_seek_backward: default_key_seek_backward(),
            key_mark_complete: default_key_mark_complete(),
            key_clear_complete: default_key_clear_complete(),
            key_first_page: default_key_first_page(),
            key_last_page: default_key_last_page(),
            key_volume_up: default_key_volume_up(),
            key_volume_down: default_key_volume_down(),
            key_toggle_favorite: default_key_toggle_favorite(),
            key_quit: default_key_quit(),
        }
    }
}

impl AppConfig {
    pub fn layout(&self) -> Layout {
        Layout::new(
            Viewport {
                width: self.viewport_width,
                height: self.viewport_height,
            },
            FontMetrics {
                advance: self.glyph_advance,
                line_height: self.line_height,
            },
        )
    }

    pub fn seek_step(&self) -> Duration {
        Duration::from_secs(self.seek_step_secs)
    }

    /// Configured volume as a whole percentage, between 0 and 200.
    pub fn volume_percent(&self) -> u32 {
        (self.volume.clamp(0.0, 2.0) * 100.0).round() as u32
    }
}

/// Logging verbosity.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
