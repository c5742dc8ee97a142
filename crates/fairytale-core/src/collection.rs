//! Book data model shared by the reader and the collector.
//!
//! A `Collection` is either an anthology of tales or one book of the Bible.
//! Both kinds behave the same everywhere; the kind only changes metadata
//! shown in menus.

use crate::util::sha256_hex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

pub const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoryOrigin {
    Grimm,
    Andersen,
    Lang,
    Perrault,
    #[default]
    Other,
}

impl fmt::Display for StoryOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StoryOrigin::Grimm => "grimm",
            StoryOrigin::Andersen => "andersen",
            StoryOrigin::Lang => "lang",
            StoryOrigin::Perrault => "perrault",
            StoryOrigin::Other => "other",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollectionKind {
    Anthology { origin: StoryOrigin },
    Bible,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKind::Anthology { origin } => write!(f, "Fairy tales ({origin})"),
            CollectionKind::Bible => write!(f, "Bible"),
        }
    }
}

/// A narration file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    pub path: PathBuf,
    /// Leading chapter/track number inferred from the file name.
    pub number: Option<u32>,
    /// Normalized title words left after the number and noise are removed.
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(default)]
    pub index: usize,
    pub title: String,
    pub text: String,
    #[serde(skip)]
    audio: Option<AudioTrack>,
}

impl Chapter {
    pub fn new(index: usize, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            text: text.into(),
            audio: None,
        }
    }

    pub fn audio(&self) -> Option<&AudioTrack> {
        self.audio.as_ref()
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn reading_minutes(&self) -> usize {
        (self.word_count() / WORDS_PER_MINUTE).max(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(flatten)]
    pub kind: CollectionKind,
    #[serde(default)]
    pub source_url: String,
    /// Internet Archive identifiers whose folders hold narration for this book.
    #[serde(default)]
    pub audio_sources: Vec<String>,
    pub chapters: Vec<Chapter>,
}

impl Collection {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        kind: CollectionKind,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            kind,
            source_url: String::new(),
            audio_sources: Vec::new(),
            chapters: Vec::new(),
        }
    }

    pub fn push_chapter(&mut self, title: impl Into<String>, text: impl Into<String>) {
        let index = self.chapters.len();
        self.chapters.push(Chapter::new(index, title, text));
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    pub fn chapter_titles(&self) -> Vec<String> {
        self.chapters.iter().map(|c| c.title.clone()).collect()
    }

    /// Make every chapter's `index` agree with its position.
    pub(crate) fn reindex(&mut self) {
        for (idx, chapter) in self.chapters.iter_mut().enumerate() {
            chapter.index = idx;
        }
    }

    /// Link matched narration to chapters. A chapter that already has a track
    /// keeps it.
    pub fn attach_audio(&mut self, mapping: &BTreeMap<usize, AudioTrack>) -> usize {
        let mut attached = 0;
        for (idx, track) in mapping {
            if let Some(chapter) = self.chapters.get_mut(*idx) {
                if chapter.audio.is_none() {
                    chapter.audio = Some(track.clone());
                    attached += 1;
                }
            }
        }
        attached
    }

    /// Digest of the readable content, used to notice reprocessed books.
    pub fn fingerprint(&self) -> String {
        let mut buf = Vec::new();
        for chapter in &self.chapters {
            buf.extend_from_slice(chapter.title.as_bytes());
            buf.push(0);
            buf.extend_from_slice(chapter.text.as_bytes());
            buf.push(0);
        }
        sha256_hex(&buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(name: &str) -> AudioTrack {
        AudioTrack {
            path: PathBuf::from(name),
            number: None,
            title: String::new(),
        }
    }

    #[test]
    fn audio_link_is_set_only_once() {
        let mut collection = Collection::new(
            "grimm",
            "Grimm's Fairy Tales",
            "Brothers Grimm",
            CollectionKind::Anthology {
                origin: StoryOrigin::Grimm,
            },
        );
        collection.push_chapter("The Golden Bird", "A king had a garden.");

        let mut first = BTreeMap::new();
        first.insert(0, track("a.mp3"));
        let mut second = BTreeMap::new();
        second.insert(0, track("b.mp3"));
        second.insert(7, track("c.mp3"));

        assert_eq!(collection.attach_audio(&first), 1);
        assert_eq!(collection.attach_audio(&second), 0);
        assert_eq!(
            collection.chapters[0].audio().map(|t| t.path.clone()),
            Some(PathBuf::from("a.mp3"))
        );
    }

    #[test]
    fn kind_is_flattened_into_collection_json() {
        let mut collection = Collection::new("bible-ruth", "Ruth", "King James Version", CollectionKind::Bible);
        collection.push_chapter("Ruth 1", "[1] Now it came to pass.");

        let json = serde_json::to_value(&collection).expect("collection should serialize");
        assert_eq!(json["kind"], "bible");

        let back: Collection = serde_json::from_value(json).expect("collection should parse");
        assert_eq!(back.kind, CollectionKind::Bible);
        assert_eq!(back.fingerprint(), collection.fingerprint());
    }

    #[test]
    fn reading_time_has_a_one_minute_floor() {
        let chapter = Chapter::new(0, "Short", "Once upon a time.");
        assert_eq!(chapter.word_count(), 4);
        assert_eq!(chapter.reading_minutes(), 1);
    }
}
