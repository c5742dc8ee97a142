use super::models::LogLevel;
use std::path::PathBuf;

pub(crate) fn default_library_dir() -> PathBuf {
    PathBuf::from("library")
}

pub(crate) fn default_audio_dir() -> PathBuf {
    PathBuf::from("cache/audio")
}

pub(crate) fn default_progress_dir() -> PathBuf {
    PathBuf::from(".cache/progress")
}

pub(crate) fn default_viewport_width() -> f32 {
    800.0
}

pub(crate) fn default_viewport_height() -> f32 {
    600.0
}

pub(crate) fn default_glyph_advance() -> f32 {
    10.0
}

pub(crate) fn default_line_height() -> f32 {
    24.0
}

pub(crate) fn default_audio_enabled() -> bool {
    true
}

pub(crate) fn default_seek_step_secs() -> u64 {
    10
}

pub(crate) fn default_volume() -> f32 {
    1.0
}

pub(crate) fn default_log_level() -> LogLevel {
    LogLevel::Info
}

pub(crate) fn default_key_up() -> String {
    "up, k".to_string()
}

pub(crate) fn default_key_down() -> String {
    "down, j".to_string()
}

pub(crate) fn default_key_left() -> String {
    "left, h".to_string()
}

pub(crate) fn default_key_right() -> String {
    "right, l".to_string()
}

pub(crate) fn default_key_select() -> String {
    "enter, o".to_string()
}

pub(crate) fn default_key_back() -> String {
    "esc, backspace".to_string()
}

pub(crate) fn default_key_toggle_bookmark() -> String {
    "b".to_string()
}

pub(crate) fn default_key_next_bookmark() -> String {
    "]".to_string()
}

pub(crate) fn default_key_prev_bookmark() -> String {
    "[".to_string()
}

pub(crate) fn default_key_play_pause() -> String {
    "space, p".to_string()
}

pub(crate) fn default_key_seek_forward() -> String {
    "f".to_string()
}

pub(crate) fn default_key_seek_backward() -> String {
    "s".to_string()
}

pub(crate) fn default_key_mark_complete() -> String {
    "c".to_string()
}

pub(crate) fn default_key_clear_complete() -> String {
    "u".to_string()
}

pub(crate) fn default_key_first_page() -> String {
    "home".to_string()
}

pub(crate) fn default_key_last_page() -> String {
    "end".to_string()
}

pub(crate) fn default_key_volume_up() -> String {
    "=, +".to_string()
}

pub(crate) fn default_key_volume_down() -> String {
    "-".to_string()
}

pub(crate) fn default_key_toggle_favorite() -> String {
    "*".to_string()
}

pub(crate) fn default_key_quit() -> String {
    "q".to_string()
}
