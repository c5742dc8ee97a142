//! Terminal front end: crossterm key and resize events in, ratatui frames out.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use fairytale_core::Input;
use fairytale_core::config::AppConfig;
use fairytale_core::navigation::{MenuEntry, PageView, Snapshot};
use fairytale_core::playback::AudioState;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

/// Cells around the page text: the border on each side, plus the status and
/// help lines under the page.
const CHROME_COLUMNS: u16 = 2;
const CHROME_ROWS: u16 = 4;

/// Configured key bindings, checked in declaration order.
pub struct Keymap {
    bindings: Vec<(Input, Vec<String>)>,
}

impl Keymap {
    pub fn from_config(config: &AppConfig) -> Self {
        let bind = |raw: &str, fallback: &str, input: Input| (input, binding_tokens(raw, fallback));
        Self {
            bindings: vec![
                bind(&config.key_quit, "q", Input::Quit),
                bind(&config.key_up, "up", Input::Up),
                bind(&config.key_down, "down", Input::Down),
                bind(&config.key_left, "left", Input::Left),
                bind(&config.key_right, "right", Input::Right),
                bind(&config.key_select, "enter", Input::Select),
                bind(&config.key_back, "esc", Input::Back),
                bind(&config.key_first_page, "home", Input::FirstPage),
                bind(&config.key_last_page, "end", Input::LastPage),
                bind(&config.key_toggle_bookmark, "b", Input::ToggleBookmark),
                bind(&config.key_next_bookmark, "]", Input::NextBookmark),
                bind(&config.key_prev_bookmark, "[", Input::PreviousBookmark),
                bind(&config.key_play_pause, "space", Input::PlayPause),
                bind(&config.key_seek_forward, "f", Input::SeekForward),
                bind(&config.key_seek_backward, "s", Input::SeekBackward),
                bind(&config.key_volume_up, "=", Input::VolumeUp),
                bind(&config.key_volume_down, "-", Input::VolumeDown),
                bind(&config.key_mark_complete, "c", Input::MarkComplete),
                bind(&config.key_clear_complete, "u", Input::ClearComplete),
                bind(&config.key_toggle_favorite, "*", Input::ToggleFavorite),
            ],
        }
    }

    pub fn input_for(&self, pressed: &str) -> Option<Input> {
        let pressed = normalize_shortcut_token(pressed, "");
        self.bindings
            .iter()
            .find(|(_, tokens)| tokens.iter().any(|t| *t == pressed))
            .map(|(input, _)| input.clone())
    }

    /// Ctrl+C always quits; other keys go through the bindings. Keys held
    /// with Ctrl or Alt are not bound.
    pub fn input_for_key(&self, key: &KeyEvent) -> Option<Input> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    Some(Input::Quit)
                }
                _ => None,
            };
        }
        self.input_for(&key_token(key.code)?)
    }

    /// One-line summary of the bindings for the footer.
    pub fn help(&self) -> String {
        self.bindings
            .iter()
            .map(|(input, tokens)| format!("{}={}", label(input), tokens.join("/")))
            .collect::<Vec<_>>()
            .join("  ")
    }
}

fn label(input: &Input) -> &'static str {
    match input {
        Input::Up => "up",
        Input::Down => "down",
        Input::Left => "prev",
        Input::Right => "next",
        Input::Select => "open",
        Input::Back => "back",
        Input::FirstPage => "first",
        Input::LastPage => "last",
        Input::ToggleBookmark => "bookmark",
        Input::NextBookmark => "next-mark",
        Input::PreviousBookmark => "prev-mark",
        Input::PlayPause => "play/pause",
        Input::SeekForward => "seek+",
        Input::SeekBackward => "seek-",
        Input::VolumeUp => "vol+",
        Input::VolumeDown => "vol-",
        Input::MarkComplete => "complete",
        Input::ClearComplete => "not-complete",
        Input::ToggleFavorite => "favorite",
        Input::Quit => "quit",
        Input::Resize { .. } | Input::ProgressLoaded(_) | Input::AudioStopped { .. } => "",
    }
}

/// Comma-separated alternatives; an empty binding uses `fallback`.
fn binding_tokens(raw: &str, fallback: &str) -> Vec<String> {
    let tokens: Vec<String> = raw
        .split(',')
        .map(|token| normalize_shortcut_token(token, ""))
        .filter(|token| !token.is_empty())
        .collect();
    if tokens.is_empty() {
        vec![fallback.to_string()]
    } else {
        tokens
    }
}

fn normalize_shortcut_token(raw: &str, fallback: &str) -> String {
    let normalized = raw.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        fallback.to_string()
    } else {
        normalized.replace("spacebar", "space")
    }
}

/// Binding name of a key, as written in the `[keys]` table.
fn key_token(code: KeyCode) -> Option<String> {
    let name = match code {
        KeyCode::Up => "up",
        KeyCode::Down => "down",
        KeyCode::Left => "left",
        KeyCode::Right => "right",
        KeyCode::Enter => "enter",
        KeyCode::Esc => "esc",
        KeyCode::Backspace => "backspace",
        KeyCode::Home => "home",
        KeyCode::End => "end",
        KeyCode::PageUp => "pageup",
        KeyCode::PageDown => "pagedown",
        KeyCode::Tab => "tab",
        KeyCode::Char(' ') => "space",
        KeyCode::Char(c) => return Some(c.to_lowercase().collect()),
        _ => return None,
    };
    Some(name.to_string())
}

/// Translate one terminal event into navigator input.
pub fn event_to_input(event: &Event, keymap: &Keymap, config: &AppConfig) -> Option<Input> {
    match event {
        Event::Key(key) => keymap.input_for_key(key),
        Event::Resize(columns, rows) => Some(viewport_input(*columns, *rows, config)),
        _ => None,
    }
}

/// Resize input for a terminal of `columns` x `rows` cells. The page text
/// gets every cell not used by the frame, measured in the configured font
/// metrics so one cell holds one glyph.
pub fn viewport_input(columns: u16, rows: u16, config: &AppConfig) -> Input {
    let text_columns = f32::from(columns.saturating_sub(CHROME_COLUMNS).max(1));
    let text_rows = f32::from(rows.saturating_sub(CHROME_ROWS).max(1));
    Input::Resize {
        width: (text_columns * config.glyph_advance).ceil() as u32,
        height: (text_rows * config.line_height).ceil() as u32,
    }
}

/// Draw a snapshot with the key help in the footer.
pub fn draw(frame: &mut Frame, snapshot: &Snapshot, help: &str) {
    let [body, status, footer] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    match snapshot {
        Snapshot::Collections { entries } => {
            let empty = entries.is_empty().then_some("No collections; run fairytale-collector first");
            draw_menu(frame, body, "Library", entries);
            frame.render_widget(Paragraph::new(empty.unwrap_or_default()), status);
        }
        Snapshot::Chapters {
            title,
            completed,
            entries,
        } => {
            let title = if *completed {
                format!("{title} (complete)")
            } else {
                title.clone()
            };
            draw_menu(frame, body, &title, entries);
        }
        Snapshot::Page(view) => {
            let page = Paragraph::new(view.lines.join("\n")).block(
                Block::default()
                    .title(format!(" {} | {} ", view.collection, view.chapter))
                    .borders(Borders::ALL),
            );
            frame.render_widget(page, body);
            frame.render_widget(Paragraph::new(status_line(view)), status);
        }
    }
    frame.render_widget(
        Paragraph::new(help).style(Style::default().add_modifier(Modifier::DIM)).wrap(Wrap { trim: true }),
        footer,
    );
}

fn draw_menu(frame: &mut Frame, area: Rect, title: &str, entries: &[MenuEntry]) {
    let items: Vec<ListItem> = entries
        .iter()
        .map(|entry| ListItem::new(format!("{}  [{}]", entry.label, entry.detail)))
        .collect();
    let list = List::new(items)
        .block(Block::default().title(format!(" {title} ")).borders(Borders::ALL))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(entries.iter().position(|e| e.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn status_line(view: &PageView) -> String {
    let mut status = format!("page {}/{}", view.page + 1, view.page_count);
    if view.bookmarked {
        status.push_str(" | bookmarked");
    }
    if view.favorite {
        status.push_str(" | favorite");
    }
    if view.completed {
        status.push_str(" | complete");
    }
    if view.has_audio {
        status.push_str(match view.audio {
            AudioState::Idle => " | audio",
            AudioState::Playing(_) => " | playing",
            AudioState::Paused(_) => " | paused",
        });
        status.push_str(&format!(" | vol {}%", view.volume));
    }
    status
}
