//! Entry point for the terminal fairytale reader.
//!
//! - Load configuration (default `conf/config.toml`).
//! - Load the library and match narration to chapters.
//! - Run the key and resize event loop until quit.

mod playback;
mod terminal;

use anyhow::{Context, Result, anyhow};
use crossterm::event;
use fairytale_core::config::{AppConfig, load_config};
use fairytale_core::library::load_library;
use fairytale_core::matcher::match_collection_audio;
use fairytale_core::playback::Playback;
use fairytale_core::{Collection, Flow, Input, ReaderSession};
use ratatui::DefaultTerminal;
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use terminal::{Keymap, draw, event_to_input, viewport_input};
use tracing::{error, info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

/// How often the loop wakes without input to notice an interrupt.
const POLL_INTERVAL: Duration = Duration::from_millis(250);
const EXIT_INTERRUPTED: i32 = 130;

fn main() {
    let reload_handle = init_tracing();
    match run(&reload_handle) {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(err) => {
            error!("{err:?}");
            std::process::exit(1);
        }
    }
}

/// Returns the process exit code.
fn run(reload_handle: &ReloadHandle) -> Result<i32> {
    let (library_override, config_path) = parse_args()?;
    let mut config = load_config(&config_path);
    if let Some(dir) = library_override {
        config.library_dir = dir;
    }
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        library = %config.library_dir.display(),
        audio = %config.audio_dir.display(),
        level = %config.log_level,
        "Starting fairytale reader"
    );

    let library = prepare_library(&config);
    if library.is_empty() {
        warn!(path = %config.library_dir.display(), "Library is empty");
    }
    let keymap = Keymap::from_config(&config);
    let mut session = ReaderSession::new(library, &config, playback::player_for(&config));

    let interrupted = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(Arc::clone(&interrupted));

    let mut terminal = ratatui::try_init().context("Failed to set up the terminal")?;
    let result = event_loop(&mut terminal, &mut session, &keymap, &config, &interrupted);
    ratatui::restore();

    result?;
    if interrupted.load(Ordering::SeqCst) {
        info!("Interrupted; progress saved");
        return Ok(EXIT_INTERRUPTED);
    }
    info!("Reader closed");
    Ok(0)
}

fn event_loop<P: Playback>(
    terminal: &mut DefaultTerminal,
    session: &mut ReaderSession<P>,
    keymap: &Keymap,
    config: &AppConfig,
    interrupted: &AtomicBool,
) -> Result<()> {
    let size = terminal.size().context("Failed to read the terminal size")?;
    session.handle(viewport_input(size.width, size.height, config));
    let help = keymap.help();
    let mut needs_render = true;
    loop {
        if check_interrupt(interrupted, session) == Flow::Quit {
            return Ok(());
        }
        if needs_render {
            let snapshot = session.snapshot();
            terminal
                .draw(|frame| draw(frame, &snapshot, &help))
                .context("Failed to draw")?;
            needs_render = false;
        }
        if !event::poll(POLL_INTERVAL).context("Failed to poll terminal events")? {
            continue;
        }
        let event = event::read().context("Failed to read terminal event")?;
        let Some(input) = event_to_input(&event, keymap, config) else {
            continue;
        };
        if session.handle(input) == Flow::Quit {
            return Ok(());
        }
        needs_render = true;
    }
}

/// Quit through the session once Ctrl+C has been signalled, so progress is
/// written by the loop that owns it.
fn check_interrupt<P: Playback>(interrupted: &AtomicBool, session: &mut ReaderSession<P>) -> Flow {
    if interrupted.load(Ordering::SeqCst) {
        info!("Received Ctrl+C; saving progress before exit");
        session.handle(Input::Quit)
    } else {
        Flow::Continue
    }
}

fn parse_args() -> Result<(Option<PathBuf>, PathBuf)> {
    let mut args = env::args().skip(1);
    let library = args.next().map(PathBuf::from);
    let config = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("conf/config.toml"));
    if args.next().is_some() {
        return Err(anyhow!(
            "Usage: fairytale-reader [library-dir] [config-path]"
        ));
    }
    Ok((library, config))
}

/// Load every collection and attach the narration found for it.
fn prepare_library(config: &AppConfig) -> Vec<Collection> {
    let mut library = load_library(&config.library_dir);
    if !config.audio_enabled {
        return library;
    }
    for collection in &mut library {
        let mapping = match_collection_audio(
            &collection.chapter_titles(),
            &config.audio_dir,
            &collection.audio_sources,
        );
        let attached = collection.attach_audio(&mapping);
        if attached > 0 {
            info!(id = %collection.id, chapters = attached, "Narration available");
        }
    }
    library
}

fn install_interrupt_handler(interrupted: Arc<AtomicBool>) {
    if let Err(err) = ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst)) {
        warn!("Failed to install Ctrl+C signal handler: {err}");
    }
}

/// Logs go to a file: the terminal belongs to the reader while it runs.
/// `FAIRYTALE_READER_LOG` overrides the default path in the temp directory.
fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    let path = env::var_os("FAIRYTALE_READER_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|| env::temp_dir().join("fairytale-reader.log"));
    let writer = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => BoxMakeWriter::new(std::sync::Mutex::new(file)),
        Err(_) => BoxMakeWriter::new(std::io::sink),
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    if env::var_os("RUST_LOG").is_some() {
        return;
    }
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed) {
        warn!(%level, "Failed to update log level from config: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairytale_core::playback::SilentPlayback;
    use fairytale_core::{CollectionKind, Position};

    fn ruth_library(dir: &std::path::Path) {
        let mut collection = Collection::new("bible-ruth", "Ruth", "King James Version", CollectionKind::Bible);
        collection.push_chapter("Ruth 1", "[1] Now it came to pass in the days when the judges ruled.");
        collection.push_chapter("Ruth 2", "[1] And Naomi had a kinsman of her husband's.");
        fairytale_core::library::write_collection(dir, &collection).expect("write should succeed");
    }

    #[test]
    fn interrupt_quits_through_the_session_and_saves() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let config = AppConfig {
            library_dir: temp.path().join("library"),
            audio_dir: temp.path().join("audio"),
            progress_dir: temp.path().join("progress"),
            viewport_width: 100.0,
            viewport_height: 24.0,
            ..AppConfig::default()
        };
        ruth_library(&config.library_dir);
        let mut session = ReaderSession::new(prepare_library(&config), &config, SilentPlayback);
        for input in [Input::Select, Input::Select, Input::Right] {
            session.handle(input);
        }
        let interrupted = AtomicBool::new(false);

        // Turning a page within a chapter is only saved on the way out.
        assert_eq!(check_interrupt(&interrupted, &mut session), Flow::Continue);
        assert_eq!(session.store().load("bible-ruth").position(), Position::new(0, 0));

        interrupted.store(true, Ordering::SeqCst);
        assert_eq!(check_interrupt(&interrupted, &mut session), Flow::Quit);
        assert_eq!(session.store().load("bible-ruth").position(), Position::new(0, 1));
    }

    #[test]
    fn library_without_audio_sources_reads_fine() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        ruth_library(temp.path());
        let config = AppConfig {
            library_dir: temp.path().to_path_buf(),
            audio_dir: temp.path().join("audio"),
            ..AppConfig::default()
        };

        let library = prepare_library(&config);

        assert_eq!(library.len(), 1);
        assert!(library[0].chapters[0].audio().is_none());
    }
}
