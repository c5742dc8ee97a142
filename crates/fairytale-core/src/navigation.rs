//! Navigation controller.
//!
//! A pure reducer over explicit state: every input yields a list of
//! [`Effect`]s that the session performs afterwards (disk IO, audio). The
//! controller itself never touches the filesystem or the player.

use crate::collection::Collection;
use crate::pagination::{Layout, Viewport, page_count, paginate};
use crate::playback::{AudioCommand, AudioState};
use crate::progress::{Position, ProgressRecord, next_in, previous_in};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

const VOLUME_STEP: u32 = 10;
const MAX_VOLUME: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    MenuCollections,
    MenuChapters,
    Reading,
    /// Reading with the narration paused.
    Paused,
}

impl Mode {
    pub fn is_reading(self) -> bool {
        matches!(self, Mode::Reading | Mode::Paused)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Up,
    Down,
    Left,
    Right,
    Select,
    Back,
    ToggleBookmark,
    NextBookmark,
    PreviousBookmark,
    PlayPause,
    SeekForward,
    SeekBackward,
    MarkComplete,
    ClearComplete,
    /// First page of the chapter, or the first menu entry.
    FirstPage,
    /// Last page of the chapter, or the last menu entry.
    LastPage,
    VolumeUp,
    VolumeDown,
    ToggleFavorite,
    Resize { width: u32, height: u32 },
    Quit,
    /// Answer to [`Effect::LoadProgress`].
    ProgressLoaded(ProgressRecord),
    /// Where the player was when it carried out a stop.
    AudioStopped { at: Duration },
}

/// Work that must be performed outside the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadProgress { collection_id: String },
    SaveProgress(ProgressRecord),
    Audio(AudioCommand),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub detail: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub collection: String,
    pub chapter: String,
    pub lines: Vec<String>,
    pub page: usize,
    pub page_count: usize,
    pub bookmarked: bool,
    pub completed: bool,
    pub favorite: bool,
    pub has_audio: bool,
    pub audio: AudioState,
    pub volume: u32,
}

/// What the presentation layer should draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Collections {
        entries: Vec<MenuEntry>,
    },
    Chapters {
        title: String,
        completed: bool,
        entries: Vec<MenuEntry>,
    },
    Page(PageView),
}

#[derive(Debug, Clone)]
struct OpenBook {
    collection: usize,
    record: ProgressRecord,
    page_count: usize,
}

#[derive(Debug)]
pub struct Navigator {
    library: Vec<Collection>,
    fingerprints: Vec<String>,
    layout: Layout,
    seek_step: Duration,
    mode: Mode,
    collection_cursor: usize,
    chapter_cursor: usize,
    pending: Option<usize>,
    open: Option<OpenBook>,
    audio: AudioState,
    /// Chapter the active narration belongs to.
    narrated: Option<usize>,
    /// Chapter whose narration was just stopped, until the player reports where.
    stopped: Option<usize>,
    volume: u32,
    known: BTreeMap<String, ProgressRecord>,
}

impl Navigator {
    pub fn new(library: Vec<Collection>, layout: Layout, seek_step: Duration) -> Self {
        let fingerprints = library.iter().map(Collection::fingerprint).collect();
        Self {
            library,
            fingerprints,
            layout,
            seek_step,
            mode: Mode::MenuCollections,
            collection_cursor: 0,
            chapter_cursor: 0,
            pending: None,
            open: None,
            audio: AudioState::Idle,
            narrated: None,
            stopped: None,
            volume: 100,
            known: BTreeMap::new(),
        }
    }

    /// Start at `percent` volume instead of 100.
    pub fn with_volume(mut self, percent: u32) -> Self {
        self.volume = percent.min(MAX_VOLUME);
        self
    }

    pub fn volume(&self) -> u32 {
        self.volume
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn audio(&self) -> &AudioState {
        &self.audio
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn library(&self) -> &[Collection] {
        &self.library
    }

    /// The record of the open collection, if any.
    pub fn record(&self) -> Option<&ProgressRecord> {
        self.open.as_ref().map(|book| &book.record)
    }

    /// Cache a stored record so menus can show its summary before the
    /// collection is opened.
    pub fn remember(&mut self, mut record: ProgressRecord) {
        let Some(idx) = self.index_of(&record.collection_id) else {
            debug!(id = %record.collection_id, "Ignoring progress for unknown collection");
            return;
        };
        self.reconcile(idx, &mut record);
        self.known.insert(record.collection_id.clone(), record);
    }

    /// Player failed to carry out a command; forget what we asked of it.
    pub fn audio_failed(&mut self) {
        self.audio = AudioState::Idle;
        self.narrated = None;
        if self.mode == Mode::Paused {
            self.mode = Mode::Reading;
        }
    }

    pub fn reduce(&mut self, input: Input) -> Vec<Effect> {
        let mut effects = Vec::new();
        match input {
            Input::Quit => {
                self.stop_audio(&mut effects);
                self.save(&mut effects);
                effects.push(Effect::Quit);
            }
            Input::Resize { width, height } => self.resize(width, height),
            Input::ProgressLoaded(record) => self.progress_loaded(record, &mut effects),
            Input::AudioStopped { at } => self.audio_stopped(at, &mut effects),
            input => match self.mode {
                Mode::MenuCollections => self.on_collections(input, &mut effects),
                Mode::MenuChapters => self.on_chapters(input, &mut effects),
                Mode::Reading | Mode::Paused => self.on_reading(input, &mut effects),
            },
        }
        effects
    }

    fn on_collections(&mut self, input: Input, effects: &mut Vec<Effect>) {
        match input {
            Input::Up => self.collection_cursor = self.collection_cursor.saturating_sub(1),
            Input::Down => {
                self.collection_cursor = step_down(self.collection_cursor, self.library.len())
            }
            Input::FirstPage => self.collection_cursor = 0,
            Input::LastPage => self.collection_cursor = self.library.len().saturating_sub(1),
            Input::Select => {
                let Some(collection) = self.library.get(self.collection_cursor) else {
                    return;
                };
                self.pending = Some(self.collection_cursor);
                effects.push(Effect::LoadProgress {
                    collection_id: collection.id.clone(),
                });
            }
            Input::Back => effects.push(Effect::Quit),
            other => debug!(input = ?other, "Ignored in collection menu"),
        }
    }

    fn on_chapters(&mut self, input: Input, effects: &mut Vec<Effect>) {
        let Some(chapters) = self.open.as_ref().map(|b| self.library[b.collection].chapter_count())
        else {
            return;
        };
        match input {
            Input::Up => self.chapter_cursor = self.chapter_cursor.saturating_sub(1),
            Input::Down => self.chapter_cursor = step_down(self.chapter_cursor, chapters),
            Input::FirstPage => self.chapter_cursor = 0,
            Input::LastPage => self.chapter_cursor = chapters.saturating_sub(1),
            Input::Select => {
                let current = self.record().map(ProgressRecord::position);
                let target = match current {
                    Some(pos) if pos.chapter == self.chapter_cursor => pos,
                    _ => Position::new(self.chapter_cursor, 0),
                };
                self.mode = Mode::Reading;
                self.go_to(target, effects);
                info!(chapter = target.chapter, page = target.page, "Opened chapter");
            }
            Input::Back => {
                self.save(effects);
                if let Some(book) = self.open.take() {
                    self.collection_cursor = book.collection;
                    self.known.insert(book.record.collection_id.clone(), book.record);
                }
                self.mode = Mode::MenuCollections;
            }
            Input::MarkComplete => self.set_complete(true, effects),
            Input::ClearComplete => self.set_complete(false, effects),
            Input::ToggleFavorite => self.toggle_favorite(self.chapter_cursor, effects),
            other => debug!(input = ?other, "Ignored in chapter menu"),
        }
    }

    fn on_reading(&mut self, input: Input, effects: &mut Vec<Effect>) {
        let Some(book) = self.open.as_ref() else {
            return;
        };
        let here = book.record.position();
        let pages = book.page_count;
        match input {
            Input::Right => {
                if here.page + 1 < pages {
                    self.go_to(Position::new(here.chapter, here.page + 1), effects);
                } else if here.chapter + 1 < self.library[book.collection].chapter_count() {
                    self.go_to(Position::new(here.chapter + 1, 0), effects);
                } else {
                    debug!("Already on the last page");
                }
            }
            Input::Left => {
                if here.page > 0 {
                    self.go_to(Position::new(here.chapter, here.page - 1), effects);
                } else if here.chapter > 0 {
                    self.go_to(Position::new(here.chapter - 1, usize::MAX), effects);
                } else {
                    debug!("Already on the first page");
                }
            }
            Input::FirstPage => self.go_to(Position::new(here.chapter, 0), effects),
            Input::LastPage => self.go_to(Position::new(here.chapter, usize::MAX), effects),
            Input::ToggleBookmark => {
                let last = pages.saturating_sub(1);
                // Marks past the end of a re-paginated chapter show on its last page.
                let shown: Vec<Position> = book
                    .record
                    .bookmarks
                    .iter()
                    .filter(|b| b.chapter == here.chapter && b.page.min(last) == here.page)
                    .copied()
                    .collect();
                if let Some(book) = self.open.as_mut() {
                    if shown.is_empty() {
                        book.record = book.record.clone().toggle_bookmark(here);
                    } else {
                        book.record.bookmarks.retain(|b| !shown.contains(b));
                    }
                    info!(
                        chapter = here.chapter,
                        page = here.page,
                        set = shown.is_empty(),
                        "Toggled bookmark"
                    );
                }
                self.save(effects);
            }
            Input::NextBookmark | Input::PreviousBookmark => {
                let reachable = self.reachable_bookmarks(book);
                let target = if input == Input::NextBookmark {
                    next_in(&reachable, here)
                } else {
                    previous_in(&reachable, here)
                };
                match target {
                    Some(target) => self.go_to(target, effects),
                    None => debug!("No bookmarks to cycle through"),
                }
            }
            Input::PlayPause => self.toggle_audio(effects),
            Input::SeekForward | Input::SeekBackward => {
                if self.audio == AudioState::Idle {
                    debug!("Seek ignored; nothing is playing");
                } else if input == Input::SeekForward {
                    effects.push(Effect::Audio(AudioCommand::SeekForward(self.seek_step)));
                } else {
                    effects.push(Effect::Audio(AudioCommand::SeekBackward(self.seek_step)));
                }
            }
            Input::VolumeUp => self.set_volume((self.volume + VOLUME_STEP).min(MAX_VOLUME), effects),
            Input::VolumeDown => self.set_volume(self.volume.saturating_sub(VOLUME_STEP), effects),
            Input::MarkComplete => self.set_complete(true, effects),
            Input::ClearComplete => self.set_complete(false, effects),
            Input::ToggleFavorite => self.toggle_favorite(here.chapter, effects),
            Input::Back => {
                self.stop_audio(effects);
                self.save(effects);
                self.chapter_cursor = here.chapter;
                self.mode = Mode::MenuChapters;
            }
            other => debug!(input = ?other, "Ignored while reading"),
        }
    }

    fn progress_loaded(&mut self, mut record: ProgressRecord, effects: &mut Vec<Effect>) {
        let Some(idx) = self.pending.take() else {
            debug!(id = %record.collection_id, "Progress arrived with no collection pending");
            return;
        };
        if self.library[idx].id != record.collection_id {
            warn!(
                expected = %self.library[idx].id,
                found = %record.collection_id,
                "Progress belongs to another collection; ignoring"
            );
            return;
        }
        if self.reconcile(idx, &mut record) {
            effects.push(Effect::SaveProgress(record.clone()));
        }
        self.known.remove(&record.collection_id);
        self.chapter_cursor = record.chapter;
        self.open = Some(OpenBook {
            collection: idx,
            record,
            page_count: 1,
        });
        self.mode = Mode::MenuChapters;
        info!(id = %self.library[idx].id, "Opened collection");
    }

    /// Fit a record to the collection as it exists now. Returns true if the
    /// record had to change.
    fn reconcile(&self, idx: usize, record: &mut ProgressRecord) -> bool {
        let current = &self.fingerprints[idx];
        let mut changed = false;
        match record.fingerprint.as_deref() {
            Some(saved) if saved != current => {
                warn!(
                    id = %record.collection_id,
                    "Collection changed since progress was saved; clamping"
                );
                changed = true;
            }
            None => changed = true,
            Some(_) => {}
        }
        record.fingerprint = Some(current.clone());
        changed |= record.clamp_to(self.library[idx].chapter_count());
        changed
    }

    fn audio_stopped(&mut self, at: Duration, effects: &mut Vec<Effect>) {
        let Some(chapter) = self.stopped.take() else {
            return;
        };
        let Some(book) = self.open.as_mut() else {
            return;
        };
        book.record = book.record.clone().with_audio_mark(chapter, at);
        debug!(chapter, at_secs = at.as_secs(), "Noted narration position");
        self.save(effects);
    }

    /// Bookmarks as they land under the current layout: a page past the end
    /// of its chapter counts as the chapter's last page.
    fn reachable_bookmarks(&self, book: &OpenBook) -> BTreeSet<Position> {
        let chapters = &self.library[book.collection].chapters;
        let mut last_pages = BTreeMap::new();
        book.record
            .bookmarks
            .iter()
            .filter_map(|b| {
                let chapter = chapters.get(b.chapter)?;
                let last = *last_pages
                    .entry(b.chapter)
                    .or_insert_with(|| page_count(&chapter.text, &self.layout).saturating_sub(1));
                Some(Position::new(b.chapter, b.page.min(last)))
            })
            .collect()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.layout.viewport = Viewport {
            width: width as f32,
            height: height as f32,
        };
        debug!(width, height, "Viewport resized");
        if self.mode.is_reading() {
            if let Some(here) = self.record().map(ProgressRecord::position) {
                let mut ignored = Vec::new();
                self.go_to(here, &mut ignored);
            }
        }
    }

    /// Move the reading position, clamping the page to the chapter. A page of
    /// `usize::MAX` means the last page.
    fn go_to(&mut self, target: Position, effects: &mut Vec<Effect>) {
        let layout = self.layout;
        let Some(book) = self.open.as_mut() else {
            return;
        };
        let collection = &self.library[book.collection];
        let Some(chapter) = collection.chapters.get(target.chapter) else {
            return;
        };
        let previous = book.record.chapter;
        let pages = page_count(&chapter.text, &layout);
        book.page_count = pages;
        book.record.chapter = target.chapter;
        book.record.page = target.page;
        book.record.clamp_page(pages);

        if previous != target.chapter {
            debug!(from = previous, to = target.chapter, "Changed chapter");
            self.sync_audio(effects);
            if self.audio != AudioState::Idle {
                self.narrated = Some(target.chapter);
            }
            self.save(effects);
        }
    }

    fn current_track(&self) -> Option<PathBuf> {
        let book = self.open.as_ref()?;
        self.library[book.collection]
            .chapters
            .get(book.record.chapter)?
            .audio()
            .map(|track| track.path.clone())
    }

    /// Stop narration that no longer belongs to the open chapter.
    fn sync_audio(&mut self, effects: &mut Vec<Effect>) {
        let wanted = self.current_track();
        if self.audio.track().is_some() && self.audio.track() != wanted.as_deref() {
            self.stop_audio(effects);
        }
    }

    fn toggle_audio(&mut self, effects: &mut Vec<Effect>) {
        match std::mem::take(&mut self.audio) {
            AudioState::Playing(path) => {
                effects.push(Effect::Audio(AudioCommand::Pause));
                self.audio = AudioState::Paused(path);
                self.mode = Mode::Paused;
            }
            AudioState::Paused(path) => {
                effects.push(Effect::Audio(AudioCommand::Resume));
                self.audio = AudioState::Playing(path);
                self.mode = Mode::Reading;
            }
            AudioState::Idle => {
                let Some(path) = self.current_track() else {
                    debug!("Chapter has no narration");
                    return;
                };
                let Some((chapter, start)) = self.record().map(|record| {
                    let start = record.audio_mark(record.chapter).unwrap_or(Duration::ZERO);
                    (record.chapter, start)
                }) else {
                    return;
                };
                if !start.is_zero() {
                    info!(chapter, at_secs = start.as_secs(), "Resuming narration");
                }
                effects.push(Effect::Audio(AudioCommand::Play {
                    path: path.clone(),
                    start,
                }));
                self.audio = AudioState::Playing(path);
                self.narrated = Some(chapter);
            }
        }
    }

    fn stop_audio(&mut self, effects: &mut Vec<Effect>) {
        if self.audio != AudioState::Idle {
            effects.push(Effect::Audio(AudioCommand::Stop));
            self.audio = AudioState::Idle;
            self.stopped = self.narrated.take();
        }
        if self.mode == Mode::Paused {
            self.mode = Mode::Reading;
        }
    }

    fn set_complete(&mut self, done: bool, effects: &mut Vec<Effect>) {
        if let Some(book) = self.open.as_mut() {
            book.record = if done {
                book.record.clone().mark_complete()
            } else {
                book.record.clone().unmark_complete()
            };
            info!(id = %book.record.collection_id, complete = done, "Updated completion");
        }
        self.save(effects);
    }

    fn toggle_favorite(&mut self, chapter: usize, effects: &mut Vec<Effect>) {
        if let Some(book) = self.open.as_mut() {
            book.record = book.record.clone().toggle_favorite(chapter);
            info!(chapter, favorite = book.record.is_favorite(chapter), "Toggled favorite");
        }
        self.save(effects);
    }

    fn set_volume(&mut self, percent: u32, effects: &mut Vec<Effect>) {
        if percent == self.volume {
            return;
        }
        self.volume = percent;
        debug!(percent, "Volume changed");
        effects.push(Effect::Audio(AudioCommand::SetVolume { percent }));
    }

    fn save(&self, effects: &mut Vec<Effect>) {
        if let Some(record) = self.record() {
            effects.push(Effect::SaveProgress(record.clone()));
        }
    }

    fn index_of(&self, collection_id: &str) -> Option<usize> {
        self.library.iter().position(|c| c.id == collection_id)
    }

    fn summary(&self, collection_id: &str) -> Option<&ProgressRecord> {
        match &self.open {
            Some(book) if book.record.collection_id == collection_id => Some(&book.record),
            _ => self.known.get(collection_id),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        match (&self.open, self.mode) {
            (Some(book), Mode::Reading | Mode::Paused) => Snapshot::Page(self.page_view(book)),
            (Some(book), _) => {
                let collection = &self.library[book.collection];
                let entries = collection
                    .chapters
                    .iter()
                    .map(|chapter| {
                        let marks = book
                            .record
                            .bookmarks
                            .iter()
                            .filter(|b| b.chapter == chapter.index)
                            .count();
                        let mut detail = format!("{} min", chapter.reading_minutes());
                        if chapter.audio().is_some() {
                            detail.push_str(" | audio");
                        }
                        if marks > 0 {
                            detail.push_str(&format!(" | {marks} bookmarked"));
                        }
                        if book.record.is_favorite(chapter.index) {
                            detail.push_str(" | favorite");
                        }
                        if chapter.index == book.record.chapter {
                            detail.push_str(" | current");
                        }
                        MenuEntry {
                            label: chapter.title.clone(),
                            detail,
                            selected: chapter.index == self.chapter_cursor,
                        }
                    })
                    .collect();
                Snapshot::Chapters {
                    title: collection.title.clone(),
                    completed: book.record.completed,
                    entries,
                }
            }
            (None, _) => Snapshot::Collections {
                entries: self
                    .library
                    .iter()
                    .enumerate()
                    .map(|(idx, collection)| {
                        let mut detail = format!(
                            "{} | {} | {} chapters",
                            collection.author,
                            collection.kind,
                            collection.chapter_count()
                        );
                        if let Some(record) = self.summary(&collection.id) {
                            if record.completed {
                                detail.push_str(" | complete");
                            }
                            if !record.bookmarks.is_empty() {
                                detail.push_str(&format!(
                                    " | {} bookmarks",
                                    record.bookmarks.len()
                                ));
                            }
                        }
                        MenuEntry {
                            label: collection.title.clone(),
                            detail,
                            selected: idx == self.collection_cursor,
                        }
                    })
                    .collect(),
            },
        }
    }

    fn page_view(&self, book: &OpenBook) -> PageView {
        let collection = &self.library[book.collection];
        let here = book.record.position();
        let chapter = &collection.chapters[here.chapter];
        let lines = paginate(here.chapter, &chapter.text, &self.layout)
            .nth(here.page)
            .map(|page| page.lines)
            .unwrap_or_default();
        PageView {
            collection: collection.title.clone(),
            chapter: chapter.title.clone(),
            lines,
            page: here.page,
            page_count: book.page_count,
            bookmarked: self.reachable_bookmarks(book).contains(&here),
            completed: book.record.completed,
            favorite: book.record.is_favorite(here.chapter),
            has_audio: chapter.audio().is_some(),
            audio: self.audio.clone(),
            volume: self.volume,
        }
    }
}

fn step_down(cursor: usize, len: usize) -> usize {
    (cursor + 1).min(len.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{AudioTrack, CollectionKind, StoryOrigin};
    use crate::pagination::FontMetrics;

    fn layout(columns: u32, rows: u32) -> Layout {
        Layout::new(
            Viewport {
                width: (columns * 10) as f32,
                height: (rows * 20) as f32,
            },
            FontMetrics {
                advance: 10.0,
                line_height: 20.0,
            },
        )
    }

    fn grimm() -> Collection {
        let mut collection = Collection::new(
            "grimm",
            "Grimm's Fairy Tales",
            "Brothers Grimm",
            CollectionKind::Anthology {
                origin: StoryOrigin::Grimm,
            },
        );
        // Four one-line pages at 20 columns.
        collection.push_chapter(
            "The Golden Bird",
            "A certain king had a beautiful garden and in the garden stood a tree.",
        );
        collection.push_chapter("Hans in Luck", "Hans had served his master seven years.");
        let mut audio = BTreeMap::new();
        audio.insert(
            0,
            AudioTrack {
                path: PathBuf::from("audio/01 golden bird.mp3"),
                number: Some(1),
                title: "golden bird".to_string(),
            },
        );
        audio.insert(
            1,
            AudioTrack {
                path: PathBuf::from("audio/02 hans in luck.mp3"),
                number: Some(2),
                title: "hans in luck".to_string(),
            },
        );
        collection.attach_audio(&audio);
        collection
    }

    /// Navigator with the Grimm collection opened at the chapter menu.
    fn opened(record: ProgressRecord) -> Navigator {
        let mut nav = Navigator::new(vec![grimm()], layout(20, 1), Duration::from_secs(10));
        let effects = nav.reduce(Input::Select);
        assert_eq!(
            effects,
            vec![Effect::LoadProgress {
                collection_id: "grimm".to_string()
            }]
        );
        nav.reduce(Input::ProgressLoaded(record));
        assert_eq!(nav.mode(), Mode::MenuChapters);
        nav
    }

    fn reading() -> Navigator {
        let mut nav = opened(ProgressRecord::new("grimm"));
        nav.reduce(Input::Select);
        assert_eq!(nav.mode(), Mode::Reading);
        nav
    }

    fn position(nav: &Navigator) -> Position {
        nav.record().expect("collection should be open").position()
    }

    fn has_save(effects: &[Effect]) -> bool {
        effects.iter().any(|e| matches!(e, Effect::SaveProgress(_)))
    }

    #[test]
    fn select_and_back_walk_the_menu_tree() {
        let mut nav = reading();

        let effects = nav.reduce(Input::Back);
        assert_eq!(nav.mode(), Mode::MenuChapters);
        assert!(has_save(&effects));

        nav.reduce(Input::Back);
        assert_eq!(nav.mode(), Mode::MenuCollections);
        assert!(nav.record().is_none());

        assert_eq!(nav.reduce(Input::Back), vec![Effect::Quit]);
    }

    #[test]
    fn right_crosses_into_the_next_chapter_and_left_returns_to_its_last_page() {
        let mut nav = reading();
        let first_chapter_pages = match nav.snapshot() {
            Snapshot::Page(view) => view.page_count,
            other => panic!("expected a page, got {other:?}"),
        };
        assert!(first_chapter_pages > 1);

        for _ in 0..first_chapter_pages {
            nav.reduce(Input::Right);
        }
        assert_eq!(position(&nav), Position::new(1, 0));

        nav.reduce(Input::Left);
        assert_eq!(position(&nav), Position::new(0, first_chapter_pages - 1));
    }

    #[test]
    fn paging_stops_at_both_ends_of_the_collection() {
        let mut nav = reading();
        assert!(nav.reduce(Input::Left).is_empty());
        assert_eq!(position(&nav), Position::new(0, 0));

        for _ in 0..50 {
            nav.reduce(Input::Right);
        }
        let end = position(&nav);
        assert_eq!(end.chapter, 1);
        assert!(nav.reduce(Input::Right).is_empty());
        assert_eq!(position(&nav), end);
    }

    #[test]
    fn bookmark_toggle_saves_and_cycle_jumps_between_marks() {
        let mut nav = reading();
        let effects = nav.reduce(Input::ToggleBookmark);
        assert!(has_save(&effects));

        nav.reduce(Input::Right);
        nav.reduce(Input::Right);
        nav.reduce(Input::ToggleBookmark);
        assert_eq!(position(&nav), Position::new(0, 2));

        nav.reduce(Input::NextBookmark);
        assert_eq!(position(&nav), Position::new(0, 0));
        nav.reduce(Input::PreviousBookmark);
        assert_eq!(position(&nav), Position::new(0, 2));
    }

    #[test]
    fn bookmark_inputs_are_ignored_in_menus() {
        let mut nav = opened(ProgressRecord::new("grimm"));
        assert!(nav.reduce(Input::ToggleBookmark).is_empty());
        assert!(nav.record().is_some_and(|r| r.bookmarks.is_empty()));
    }

    #[test]
    fn play_pause_cycles_between_reading_and_paused() {
        let mut nav = reading();
        let golden = PathBuf::from("audio/01 golden bird.mp3");

        assert_eq!(
            nav.reduce(Input::PlayPause),
            vec![Effect::Audio(AudioCommand::Play {
                path: golden.clone(),
                start: Duration::ZERO,
            })]
        );
        assert_eq!(nav.reduce(Input::PlayPause), vec![Effect::Audio(AudioCommand::Pause)]);
        assert_eq!(nav.mode(), Mode::Paused);
        assert_eq!(nav.audio(), &AudioState::Paused(golden.clone()));

        assert_eq!(nav.reduce(Input::PlayPause), vec![Effect::Audio(AudioCommand::Resume)]);
        assert_eq!(nav.mode(), Mode::Reading);
    }

    #[test]
    fn seeking_uses_the_configured_step_only_when_audio_is_active() {
        let mut nav = reading();
        assert!(nav.reduce(Input::SeekForward).is_empty());

        nav.reduce(Input::PlayPause);
        assert_eq!(
            nav.reduce(Input::SeekBackward),
            vec![Effect::Audio(AudioCommand::SeekBackward(Duration::from_secs(10)))]
        );
    }

    #[test]
    fn changing_chapter_stops_the_previous_track() {
        let mut nav = reading();
        nav.reduce(Input::PlayPause);
        nav.reduce(Input::PlayPause);
        assert_eq!(nav.mode(), Mode::Paused);

        let mut effects = Vec::new();
        while position(&nav).chapter == 0 {
            effects = nav.reduce(Input::Right);
        }

        assert!(effects.contains(&Effect::Audio(AudioCommand::Stop)));
        assert!(has_save(&effects));
        assert_eq!(nav.audio(), &AudioState::Idle);
        assert_eq!(nav.mode(), Mode::Reading);
    }

    #[test]
    fn leaving_reading_stops_audio() {
        let mut nav = reading();
        nav.reduce(Input::PlayPause);

        let effects = nav.reduce(Input::Back);

        assert_eq!(effects[0], Effect::Audio(AudioCommand::Stop));
        assert_eq!(nav.audio(), &AudioState::Idle);
    }

    #[test]
    fn quit_saves_and_stops_from_reading() {
        let mut nav = reading();
        nav.reduce(Input::PlayPause);

        let effects = nav.reduce(Input::Quit);

        assert_eq!(effects.len(), 3);
        assert_eq!(effects[0], Effect::Audio(AudioCommand::Stop));
        assert!(matches!(effects[1], Effect::SaveProgress(_)));
        assert_eq!(effects[2], Effect::Quit);
    }

    #[test]
    fn stale_progress_is_clamped_and_resaved() {
        let mut stale = ProgressRecord::new("grimm")
            .with_position(Position::new(7, 3))
            .toggle_bookmark(Position::new(5, 0))
            .toggle_bookmark(Position::new(1, 0));
        stale.fingerprint = Some("outdated".to_string());

        let mut nav = Navigator::new(vec![grimm()], layout(20, 1), Duration::from_secs(5));
        nav.reduce(Input::Select);
        let effects = nav.reduce(Input::ProgressLoaded(stale));

        let record = nav.record().expect("collection should be open");
        assert_eq!(record.position(), Position::new(1, 0));
        assert_eq!(record.bookmarks.len(), 1);
        assert_eq!(record.fingerprint, Some(grimm().fingerprint()));
        assert!(has_save(&effects));
    }

    #[test]
    fn resuming_the_saved_chapter_restores_the_page() {
        let mut saved = ProgressRecord::new("grimm").with_position(Position::new(0, 2));
        saved.fingerprint = Some(grimm().fingerprint());
        let mut nav = opened(saved);

        nav.reduce(Input::Select);

        assert_eq!(position(&nav), Position::new(0, 2));
    }

    #[test]
    fn resize_repaginates_and_clamps_the_page() {
        let mut nav = reading();
        nav.reduce(Input::Right);
        nav.reduce(Input::Right);

        nav.reduce(Input::Resize {
            width: 2000,
            height: 400,
        });

        assert_eq!(position(&nav), Position::new(0, 0));
        match nav.snapshot() {
            Snapshot::Page(view) => assert_eq!(view.page_count, 1),
            other => panic!("expected a page, got {other:?}"),
        }
    }

    #[test]
    fn snapshots_describe_menus_and_pages() {
        let mut nav = Navigator::new(vec![grimm()], layout(20, 1), Duration::from_secs(5));
        let mut remembered = ProgressRecord::new("grimm").mark_complete();
        remembered.fingerprint = Some(grimm().fingerprint());
        nav.remember(remembered);

        match nav.snapshot() {
            Snapshot::Collections { entries } => {
                assert_eq!(entries.len(), 1);
                assert!(entries[0].selected);
                assert!(entries[0].detail.contains("complete"));
            }
            other => panic!("expected collections, got {other:?}"),
        }

        nav.reduce(Input::Select);
        nav.reduce(Input::ProgressLoaded(ProgressRecord::new("grimm")));
        nav.reduce(Input::Down);
        nav.reduce(Input::Down);
        match nav.snapshot() {
            Snapshot::Chapters { entries, .. } => {
                assert!(entries[1].selected);
                assert!(entries[0].detail.contains("current"));
                assert!(entries[0].detail.contains("audio"));
            }
            other => panic!("expected chapters, got {other:?}"),
        }

        nav.reduce(Input::Select);
        nav.reduce(Input::ToggleBookmark);
        match nav.snapshot() {
            Snapshot::Page(view) => {
                assert_eq!(view.chapter, "Hans in Luck");
                assert_eq!(view.lines, vec!["Hans had served his"]);
                assert!(view.bookmarked);
                assert!(view.has_audio);
            }
            other => panic!("expected a page, got {other:?}"),
        }
    }

    #[test]
    fn bookmark_cycle_survives_repagination() {
        let mut saved = ProgressRecord::new("grimm")
            .toggle_bookmark(Position::new(0, 3))
            .toggle_bookmark(Position::new(1, 0));
        saved.fingerprint = Some(grimm().fingerprint());
        let mut nav = opened(saved);
        nav.reduce(Input::Select);
        nav.reduce(Input::Resize {
            width: 2000,
            height: 400,
        });

        let mut visited = Vec::new();
        for _ in 0..4 {
            nav.reduce(Input::NextBookmark);
            visited.push(position(&nav));
        }
        assert_eq!(
            visited,
            vec![
                Position::new(1, 0),
                Position::new(0, 0),
                Position::new(1, 0),
                Position::new(0, 0),
            ]
        );

        nav.reduce(Input::PreviousBookmark);
        assert_eq!(position(&nav), Position::new(1, 0));
        nav.reduce(Input::PreviousBookmark);
        assert_eq!(position(&nav), Position::new(0, 0));
    }

    #[test]
    fn a_stale_bookmark_shows_on_the_last_page_and_toggles_off() {
        let mut saved = ProgressRecord::new("grimm").toggle_bookmark(Position::new(0, 3));
        saved.fingerprint = Some(grimm().fingerprint());
        let mut nav = opened(saved);
        nav.reduce(Input::Select);
        nav.reduce(Input::Resize {
            width: 2000,
            height: 400,
        });
        match nav.snapshot() {
            Snapshot::Page(view) => assert!(view.bookmarked),
            other => panic!("expected a page, got {other:?}"),
        }

        nav.reduce(Input::ToggleBookmark);

        assert!(nav.record().is_some_and(|r| r.bookmarks.is_empty()));
    }

    #[test]
    fn home_and_end_jump_within_the_chapter() {
        let mut nav = reading();
        let effects = nav.reduce(Input::LastPage);
        assert!(effects.is_empty());
        assert_eq!(position(&nav), Position::new(0, 3));

        nav.reduce(Input::FirstPage);
        assert_eq!(position(&nav), Position::new(0, 0));

        nav.reduce(Input::Back);
        nav.reduce(Input::LastPage);
        match nav.snapshot() {
            Snapshot::Chapters { entries, .. } => assert!(entries[1].selected),
            other => panic!("expected chapters, got {other:?}"),
        }
    }

    #[test]
    fn volume_steps_are_clamped() {
        let mut nav = Navigator::new(vec![grimm()], layout(20, 1), Duration::from_secs(10))
            .with_volume(190);
        nav.reduce(Input::Select);
        nav.reduce(Input::ProgressLoaded(ProgressRecord::new("grimm")));
        nav.reduce(Input::Select);

        assert_eq!(
            nav.reduce(Input::VolumeUp),
            vec![Effect::Audio(AudioCommand::SetVolume { percent: 200 })]
        );
        assert!(nav.reduce(Input::VolumeUp).is_empty());
        nav.reduce(Input::VolumeDown);
        assert_eq!(nav.volume(), 190);
        match nav.snapshot() {
            Snapshot::Page(view) => assert_eq!(view.volume, 190),
            other => panic!("expected a page, got {other:?}"),
        }
    }

    #[test]
    fn completion_and_favorites_toggle_and_save() {
        let mut nav = reading();
        nav.reduce(Input::MarkComplete);
        let effects = nav.reduce(Input::ClearComplete);
        assert!(has_save(&effects));
        assert!(nav.record().is_some_and(|r| !r.completed));

        assert!(has_save(&nav.reduce(Input::ToggleFavorite)));
        assert!(nav.record().is_some_and(|r| r.is_favorite(0)));

        nav.reduce(Input::Back);
        nav.reduce(Input::Down);
        nav.reduce(Input::ToggleFavorite);
        match nav.snapshot() {
            Snapshot::Chapters { entries, .. } => {
                assert!(entries[0].detail.contains("favorite"));
                assert!(entries[1].detail.contains("favorite"));
            }
            other => panic!("expected chapters, got {other:?}"),
        }
    }

    #[test]
    fn narration_resumes_where_it_stopped() {
        let mut nav = reading();
        nav.reduce(Input::PlayPause);
        let effects = nav.reduce(Input::Back);
        assert_eq!(effects[0], Effect::Audio(AudioCommand::Stop));

        let effects = nav.reduce(Input::AudioStopped {
            at: Duration::from_secs(42),
        });
        assert!(has_save(&effects));
        assert_eq!(
            nav.record().and_then(|r| r.audio_mark(0)),
            Some(Duration::from_secs(42))
        );
        // A second report with nothing stopped is ignored.
        assert!(nav.reduce(Input::AudioStopped { at: Duration::ZERO }).is_empty());

        nav.reduce(Input::Select);
        assert_eq!(
            nav.reduce(Input::PlayPause),
            vec![Effect::Audio(AudioCommand::Play {
                path: PathBuf::from("audio/01 golden bird.mp3"),
                start: Duration::from_secs(42),
            })]
        );
    }
}
