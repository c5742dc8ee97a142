//! Per-collection reading progress and bookmarks.
//!
//! Each collection gets one small TOML file under the progress directory.
//! Records are plain values: operations return an updated copy and the
//! caller decides when to save. Saving replaces the file atomically.

use crate::util::{file_stem_for, write_atomic};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A reading position; ordered by chapter, then page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub chapter: usize,
    pub page: usize,
}

impl Position {
    pub fn new(chapter: usize, page: usize) -> Self {
        Self { chapter, page }
    }
}

/// Narration is only worth resuming once it has run this long.
pub const MIN_AUDIO_MARK: Duration = Duration::from_secs(5);

/// Where narration stopped for one chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioMark {
    pub chapter: usize,
    pub seconds: u64,
}

/// The first position in `set` after `from`, wrapping to the first overall.
pub fn next_in(set: &BTreeSet<Position>, from: Position) -> Option<Position> {
    set.range((Bound::Excluded(from), Bound::Unbounded))
        .next()
        .or_else(|| set.iter().next())
        .copied()
}

/// The last position in `set` before `from`, wrapping to the last overall.
pub fn previous_in(set: &BTreeSet<Position>, from: Position) -> Option<Position> {
    set.range(..from)
        .next_back()
        .or_else(|| set.iter().next_back())
        .copied()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub collection_id: String,
    #[serde(default)]
    pub chapter: usize,
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub completed: bool,
    /// Content digest of the collection this record was last saved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// Chapters marked as favorites.
    #[serde(default)]
    pub favorites: BTreeSet<usize>,
    // Kept last: TOML needs plain keys before arrays of tables.
    #[serde(default)]
    pub bookmarks: BTreeSet<Position>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audio_marks: Vec<AudioMark>,
}

impl ProgressRecord {
    pub fn new(collection_id: impl Into<String>) -> Self {
        Self {
            collection_id: collection_id.into(),
            chapter: 0,
            page: 0,
            completed: false,
            fingerprint: None,
            favorites: BTreeSet::new(),
            bookmarks: BTreeSet::new(),
            audio_marks: Vec::new(),
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.chapter, self.page)
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.chapter = position.chapter;
        self.page = position.page;
        self
    }

    pub fn is_bookmarked(&self, position: Position) -> bool {
        self.bookmarks.contains(&position)
    }

    /// Add the bookmark if absent, remove it if present.
    pub fn toggle_bookmark(mut self, position: Position) -> Self {
        if !self.bookmarks.remove(&position) {
            self.bookmarks.insert(position);
        }
        self
    }

    /// The first bookmark after `from`, wrapping to the first one overall.
    pub fn next_bookmark(&self, from: Position) -> Option<Position> {
        next_in(&self.bookmarks, from)
    }

    /// The last bookmark before `from`, wrapping to the last one overall.
    pub fn previous_bookmark(&self, from: Position) -> Option<Position> {
        previous_in(&self.bookmarks, from)
    }

    pub fn mark_complete(mut self) -> Self {
        self.completed = true;
        self
    }

    pub fn unmark_complete(mut self) -> Self {
        self.completed = false;
        self
    }

    pub fn is_favorite(&self, chapter: usize) -> bool {
        self.favorites.contains(&chapter)
    }

    pub fn toggle_favorite(mut self, chapter: usize) -> Self {
        if !self.favorites.remove(&chapter) {
            self.favorites.insert(chapter);
        }
        self
    }

    /// Saved narration offset for `chapter`.
    pub fn audio_mark(&self, chapter: usize) -> Option<Duration> {
        self.audio_marks
            .iter()
            .find(|mark| mark.chapter == chapter)
            .map(|mark| Duration::from_secs(mark.seconds))
    }

    /// Remember where narration stopped in `chapter`. Stopping within the
    /// first few seconds clears the mark instead.
    pub fn with_audio_mark(mut self, chapter: usize, at: Duration) -> Self {
        self.audio_marks.retain(|mark| mark.chapter != chapter);
        if at > MIN_AUDIO_MARK {
            self.audio_marks.push(AudioMark {
                chapter,
                seconds: at.as_secs(),
            });
            self.audio_marks.sort_by_key(|mark| mark.chapter);
        }
        self
    }

    /// Pull every chapter index back inside a collection of `chapter_count`
    /// chapters. Bookmarks pointing at chapters that no longer exist are
    /// dropped. Returns true if anything changed.
    pub fn clamp_to(&mut self, chapter_count: usize) -> bool {
        let last = chapter_count.saturating_sub(1);
        let mut changed = false;
        if self.chapter > last {
            self.chapter = last;
            self.page = 0;
            changed = true;
        }
        let before = (self.bookmarks.len(), self.favorites.len(), self.audio_marks.len());
        self.bookmarks.retain(|b| b.chapter < chapter_count);
        self.favorites.retain(|&chapter| chapter < chapter_count);
        self.audio_marks.retain(|mark| mark.chapter < chapter_count);
        let after = (self.bookmarks.len(), self.favorites.len(), self.audio_marks.len());
        changed | (after != before)
    }

    /// Clamp the page within the current chapter once its page count is known.
    pub fn clamp_page(&mut self, page_count: usize) -> bool {
        let last = page_count.saturating_sub(1);
        if self.page > last {
            self.page = last;
            true
        } else {
            false
        }
    }
}

/// Filesystem home for progress records.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    root: PathBuf,
}

impl ProgressStore {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record_path(&self, collection_id: &str) -> PathBuf {
        self.root
            .join(format!("{}.toml", file_stem_for(collection_id)))
    }

    /// Read the record for `collection_id`. A missing, unreadable or corrupt
    /// file yields a fresh record instead of an error.
    pub fn load(&self, collection_id: &str) -> ProgressRecord {
        let path = self.record_path(collection_id);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) => {
                debug!(path = %path.display(), "No saved progress: {err}");
                return ProgressRecord::new(collection_id);
            }
        };
        match toml::from_str::<ProgressRecord>(&data) {
            Ok(record) if record.collection_id == collection_id => {
                debug!(
                    path = %path.display(),
                    chapter = record.chapter,
                    page = record.page,
                    bookmarks = record.bookmarks.len(),
                    "Loaded progress"
                );
                record
            }
            Ok(record) => {
                warn!(
                    path = %path.display(),
                    found = %record.collection_id,
                    "Progress file belongs to another collection; starting fresh"
                );
                ProgressRecord::new(collection_id)
            }
            Err(err) => {
                warn!(path = %path.display(), "Corrupt progress file; starting fresh: {err}");
                ProgressRecord::new(collection_id)
            }
        }
    }

    pub fn save(&self, record: &ProgressRecord) -> Result<()> {
        let path = self.record_path(&record.collection_id);
        let contents = toml::to_string(record).with_context(|| {
            format!("Failed to serialize progress for {}", record.collection_id)
        })?;
        write_atomic(&path, contents.as_bytes())?;
        info!(
            path = %path.display(),
            chapter = record.chapter,
            page = record.page,
            "Saved progress"
        );
        Ok(())
    }
}
