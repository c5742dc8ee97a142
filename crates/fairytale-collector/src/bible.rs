//! King James Bible import: one collection per book.
//!
//! The input is the common tab-separated KJV text, one verse per line:
//! `Genesis 1:1<TAB>In the beginning God created the heaven and the earth.`

use crate::parser::{MAX_SLUG_CHARS, slugify};
use fairytale_core::{Collection, CollectionKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

pub const BIBLE_AUTHOR: &str = "King James Version";
/// Folder under the audio directory holding `audio_bible_<book>.mp3` files.
pub const BIBLE_AUDIO_SOURCE: &str = "bible";

pub const BIBLE_BOOKS: &[&str] = &[
    "Genesis",
    "Exodus",
    "Leviticus",
    "Numbers",
    "Deuteronomy",
    "Joshua",
    "Judges",
    "Ruth",
    "1 Samuel",
    "2 Samuel",
    "1 Kings",
    "2 Kings",
    "1 Chronicles",
    "2 Chronicles",
    "Ezra",
    "Nehemiah",
    "Esther",
    "Job",
    "Psalms",
    "Proverbs",
    "Ecclesiastes",
    "Song of Solomon",
    "Isaiah",
    "Jeremiah",
    "Lamentations",
    "Ezekiel",
    "Daniel",
    "Hosea",
    "Joel",
    "Amos",
    "Obadiah",
    "Jonah",
    "Micah",
    "Nahum",
    "Habakkuk",
    "Zephaniah",
    "Haggai",
    "Zechariah",
    "Malachi",
    "Matthew",
    "Mark",
    "Luke",
    "John",
    "Acts",
    "Romans",
    "1 Corinthians",
    "2 Corinthians",
    "Galatians",
    "Ephesians",
    "Philippians",
    "Colossians",
    "1 Thessalonians",
    "2 Thessalonians",
    "1 Timothy",
    "2 Timothy",
    "Titus",
    "Philemon",
    "Hebrews",
    "James",
    "1 Peter",
    "2 Peter",
    "1 John",
    "2 John",
    "3 John",
    "Jude",
    "Revelation",
];

static RE_REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+?)\s+(\d+):(\d+)$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
struct Verse {
    number: u32,
    text: String,
}

pub fn collection_id(book: &str) -> String {
    format!("bible-{}", slugify(book, MAX_SLUG_CHARS))
}

/// Parse KJV text into collections in canonical book order. Lines that are
/// not verse references are ignored; unknown book names are skipped.
pub fn parse_kjv(text: &str) -> Vec<Collection> {
    let mut books: HashMap<String, BTreeMap<u32, Vec<Verse>>> = HashMap::new();
    let mut skipped = 0usize;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("KJV") || line.starts_with("King James") {
            continue;
        }
        let Some((reference, verse_text)) = line.split_once('\t') else {
            skipped += 1;
            continue;
        };
        let Some(caps) = RE_REFERENCE.captures(reference.trim()) else {
            skipped += 1;
            continue;
        };
        let (Ok(chapter), Ok(number)) = (caps[2].parse::<u32>(), caps[3].parse::<u32>()) else {
            skipped += 1;
            continue;
        };
        books
            .entry(caps[1].to_string())
            .or_default()
            .entry(chapter)
            .or_default()
            .push(Verse {
                number,
                text: verse_text.trim().to_string(),
            });
    }
    if skipped > 0 {
        debug!(lines = skipped, "Ignored lines without a verse reference");
    }

    for name in books.keys() {
        if !BIBLE_BOOKS.contains(&name.as_str()) {
            warn!(book = %name, "Unknown book name; skipping");
        }
    }

    let collections: Vec<Collection> = BIBLE_BOOKS
        .iter()
        .filter_map(|&book| {
            let chapters = books.remove(book)?;
            let mut collection =
                Collection::new(collection_id(book), book, BIBLE_AUTHOR, CollectionKind::Bible);
            collection.audio_sources = vec![BIBLE_AUDIO_SOURCE.to_string()];
            for (chapter, verses) in chapters {
                let text = verses
                    .iter()
                    .map(|v| format!("[{}] {}", v.number, v.text))
                    .collect::<Vec<_>>()
                    .join("\n\n");
                collection.push_chapter(format!("{book} {chapter}"), text);
            }
            Some(collection)
        })
        .collect();
    info!(books = collections.len(), "Parsed KJV text");
    collections
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "KJV\n\
        King James Bible: Pure Cambridge Edition\n\
        John 1:1\tIn the beginning was the Word, and the Word was with God.\n\
        John 1:2\tThe same was in the beginning with God.\n\
        Genesis 1:1\tIn the beginning God created the heaven and the earth.\n\
        1 John 1:1\tThat which was from the beginning, which we have heard.\n\
        John 2:1\tAnd the third day there was a marriage in Cana of Galilee.\n\
        not a verse line\n\
        Hezekiah 1:1\tNo such book.\n";

    #[test]
    fn books_come_out_in_canonical_order() {
        let collections = parse_kjv(SAMPLE);

        let ids: Vec<&str> = collections.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["bible-genesis", "bible-john", "bible-1-john"]);
        assert!(collections.iter().all(|c| c.kind == CollectionKind::Bible));
    }

    #[test]
    fn chapters_render_numbered_verses() {
        let collections = parse_kjv(SAMPLE);
        let john = &collections[1];

        assert_eq!(john.chapter_titles(), vec!["John 1", "John 2"]);
        assert_eq!(
            john.chapters[0].text,
            "[1] In the beginning was the Word, and the Word was with God.\n\n\
             [2] The same was in the beginning with God."
        );
        assert_eq!(john.audio_sources, vec!["bible".to_string()]);
    }

    #[test]
    fn empty_input_yields_no_books() {
        assert!(parse_kjv("").is_empty());
    }
}
