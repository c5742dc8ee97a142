use super::defaults;
use super::models::{AppConfig, LogLevel};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    library: LibraryConfig,
    #[serde(default)]
    layout: LayoutConfig,
    #[serde(default)]
    audio: AudioConfig,
    #[serde(default)]
    keys: KeysConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            library_dir: tables.library.library_dir,
            audio_dir: tables.library.audio_dir,
            progress_dir: tables.library.progress_dir,
            viewport_width: tables.layout.viewport_width,
            viewport_height: tables.layout.viewport_height,
            glyph_advance: tables.layout.glyph_advance,
            line_height: tables.layout.line_height,
            audio_enabled: tables.audio.enabled,
            seek_step_secs: tables.audio.seek_step_secs,
            volume: tables.audio.volume,
            log_level: tables.logging.log_level,
            key_up: tables.keys.up,
            key_down: tables.keys.down,
            key_left: tables.keys.left,
            key_right: tables.keys.right,
            key_select: tables.keys.select,
            key_back: tables.keys.back,
            key_toggle_bookmark: tables.keys.toggle_bookmark,
            key_next_bookmark: tables.keys.next_bookmark,
            key_prev_bookmark: tables.keys.prev_bookmark,
            key_play_pause: tables.keys.play_pause,
            key_seek_forward: tables.keys.seek_forward,
            key_seek_backward: tables.keys.seek_backward,
            key_mark_complete: tables.keys.mark_complete,
            key_clear_complete: tables.keys.clear_complete,
            key_first_page: tables.keys.first_page,
            key_last_page: tables.keys.last_page,
            key_volume_up: tables.keys.volume_up,
            key_volume_down: tables.keys.volume_down,
            key_toggle_favorite: tables.keys.toggle_favorite,
            key_quit: tables.keys.quit,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            library: LibraryConfig {
                library_dir: config.library_dir.clone(),
                audio_dir: config.audio_dir.clone(),
                progress_dir: config.progress_dir.clone(),
            },
            layout: LayoutConfig {
                viewport_width: config.viewport_width,
                viewport_height: config.viewport_height,
                glyph_advance: config.glyph_advance,
                line_height: config.line_height,
            },
            audio: AudioConfig {
                enabled: config.audio_enabled,
                seek_step_secs: config.seek_step_secs,
                volume: config.volume,
            },
            keys: KeysConfig {
                up: config.key_up.clone(),
                down: config.key_down.clone(),
                left: config.key_left.clone(),
                right: config.key_right.clone(),
                select: config.key_select.clone(),
                back: config.key_back.clone(),
                toggle_bookmark: config.key_toggle_bookmark.clone(),
                next_bookmark: config.key_next_bookmark.clone(),
                prev_bookmark: config.key_prev_bookmark.clone(),
                play_pause: config.key_play_pause.clone(),
                seek_forward: config.key_seek_forward.clone(),
                seek_backward: config.key_seek_backward.clone(),
                mark_complete: config.key_mark_complete.clone(),
                clear_complete: config.key_clear_complete.clone(),
                first_page: config.key_first_page.clone(),
                last_page: config.key_last_page.clone(),
                volume_up: config.key_volume_up.clone(),
                volume_down: config.key_volume_down.clone(),
                toggle_favorite: config.key_toggle_favorite.clone(),
                quit: config.key_quit.clone(),
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct LibraryConfig {
    #[serde(default = "defaults::default_library_dir")]
    library_dir: PathBuf,
    #[serde(default = "defaults::default_audio_dir")]
    audio_dir: PathBuf,
    #[serde(default = "defaults::default_progress_dir")]
    progress_dir: PathBuf,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        LibraryConfig {
            library_dir: defaults::default_library_dir(),
            audio_dir: defaults::default_audio_dir(),
            progress_dir: defaults::default_progress_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct LayoutConfig {
    #[serde(default = "defaults::default_viewport_width")]
    viewport_width: f32,
    #[serde(default = "defaults::default_viewport_height")]
    viewport_height: f32,
    #[serde(default = "defaults::default_glyph_advance")]
    glyph_advance: f32,
    #[serde(default = "defaults::default_line_height")]
    line_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            viewport_width: defaults::default_viewport_width(),
            viewport_height: defaults::default_viewport_height(),
            glyph_advance: defaults::default_glyph_advance(),
            line_height: defaults::default_line_height(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct AudioConfig {
    #[serde(default = "defaults::default_audio_enabled")]
    enabled: bool,
    #[serde(default = "defaults::default_seek_step_secs")]
    seek_step_secs: u64,
    #[serde(default = "defaults::default_volume")]
    volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig {
            enabled: defaults::default_audio_enabled(),
            seek_step_secs: defaults::default_seek_step_secs(),
            volume: defaults::default_volume(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct KeysConfig {
    #[serde(default = "defaults::default_key_up")]
    up: String,
    #[serde(default = "defaults::default_key_down")]
    down: String,
    #[serde(default = "defaults::default_key_left")]
    left: String,
    #[serde(default = "defaults::default_key_right")]
    right: String,
    #[serde(default = "defaults::default_key_select")]
    select: String,
    #[serde(default = "defaults::default_key_back")]
    back: String,
    #[serde(default = "defaults::default_key_toggle_bookmark")]
    toggle_bookmark: String,
    #[serde(default = "defaults::default_key_next_bookmark")]
    next_bookmark: String,
    #[serde(default = "defaults::default_key_prev_bookmark")]
    prev_bookmark: String,
    #[serde(default = "defaults::default_key_play_pause")]
    play_pause: String,
    #[serde(default = "defaults::default_key_seek_forward")]
    seek_forward: String,
    #[serde(default = "defaults::default_key_seek_backward")]
    seek_backward: String,
    #[serde(default = "defaults::default_key_mark_complete")]
    mark_complete: String,
    #[serde(default = "defaults::default_key_clear_complete")]
    clear_complete: String,
    #[serde(default = "defaults::default_key_first_page")]
    first_page: String,
    #[serde(default = "defaults::default_key_last_page")]
    last_page: String,
    #[serde(default = "defaults::default_key_volume_up")]
    volume_up: String,
    #[serde(default = "defaults::default_key_volume_down")]
    volume_down: String,
    #[serde(default = "defaults::default_key_toggle_favorite")]
    toggle_favorite: String,
    #[serde(default = "defaults::default_key_quit")]
    quit: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        KeysConfig {
            up: defaults::default_key_up(),
            down: defaults::default_key_down(),
            left: defaults::default_key_left(),
            right: defaults::default_key_right(),
            select: defaults::default_key_select(),
            back: defaults::default_key_back(),
            toggle_bookmark: defaults::default_key_toggle_bookmark(),
            next_bookmark: defaults::default_key_next_bookmark(),
            prev_bookmark: defaults::default_key_prev_bookmark(),
            play_pause: defaults::default_key_play_pause(),
            seek_forward: defaults::default_key_seek_forward(),
            seek_backward: defaults::default_key_seek_backward(),
            mark_complete: defaults::default_key_mark_complete(),
            clear_complete: defaults::default_key_clear_complete(),
            first_page: defaults::default_key_first_page(),
            last_page: defaults::default_key_last_page(),
            volume_up: defaults::default_key_volume_up(),
            volume_down: defaults::default_key_volume_down(),
            toggle_favorite: defaults::default_key_toggle_favorite(),
            quit: defaults::default_key_quit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
