//! Split a Project Gutenberg anthology into individual stories.

use crate::sources::GutenbergSource;
use fairytale_core::{Collection, CollectionKind, StoryOrigin};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

/// Shortest stretch of text between two titles that still counts as a story.
const MIN_STORY_SPAN: usize = 500;
/// Shortest story body kept after cleanup.
const MIN_STORY_TEXT: usize = 100;
const MAX_TITLE_CHARS: usize = 80;
const MAX_TITLE_DASHES: usize = 3;
pub const MAX_SLUG_CHARS: usize = 50;

const START_MARKERS: &[&str] = &[
    "*** START OF THE PROJECT GUTENBERG",
    "*** START OF THIS PROJECT GUTENBERG",
    "*END*THE SMALL PRINT",
];
const END_MARKERS: &[&str] = &[
    "*** END OF THE PROJECT GUTENBERG",
    "*** END OF THIS PROJECT GUTENBERG",
    "End of the Project Gutenberg",
    "End of Project Gutenberg",
];
const NON_STORY_TITLES: &[&str] = &[
    "chapter",
    "contents",
    "preface",
    "introduction",
    "appendix",
    "index",
    "note",
    "footnote",
    "volume",
    "part i",
    "part ii",
    "editor",
    "translator",
    "copyright",
    "gutenberg",
];

// All-caps title on its own line followed by a blank line.
static RE_CAPS_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*([A-Z][A-Z \t,'-]+)\n\s*\n").unwrap());
// Deeply indented (centered) title line.
static RE_INDENTED_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]{10,}([A-Z][A-Za-z \t,'-]+)\n").unwrap());
static RE_CENTERED_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]{5,}([A-Z][A-Za-z \t,'-]{3,60})[ \t]*\n").unwrap());
static RE_CAPITALIZED_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*([A-Z][A-Za-z \t,'-]{5,60})\n\s*\n").unwrap());
static RE_EXTRA_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static RE_SLUG_STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static RE_SLUG_JOIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryBoundary {
    pub title: String,
    pub start: usize,
    pub end: usize,
}

/// URL-friendly slug, cut at a word boundary when longer than `max_chars`.
pub fn slugify(text: &str, max_chars: usize) -> String {
    let lowered = text.trim().to_lowercase();
    let stripped = RE_SLUG_STRIP.replace_all(&lowered, "");
    let joined = RE_SLUG_JOIN.replace_all(&stripped, "-");
    let slug = joined.trim_matches('-');
    if slug.chars().count() <= max_chars {
        return slug.to_string();
    }
    let cut: String = slug.chars().take(max_chars).collect();
    match cut.rsplit_once('-') {
        Some((head, _)) => head.to_string(),
        None => cut,
    }
}

pub fn is_valid_story_title(title: &str) -> bool {
    let lower = title.to_lowercase();
    if NON_STORY_TITLES.iter().any(|p| lower.contains(p)) {
        return false;
    }
    title.chars().count() <= MAX_TITLE_CHARS && title.matches('-').count() <= MAX_TITLE_DASHES
}

/// Drop the Project Gutenberg header and license footer.
pub fn clean_gutenberg_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let start = START_MARKERS
        .iter()
        .find_map(|marker| {
            let pos = text.find(marker)?;
            text[pos..].find('\n').map(|nl| pos + nl + 1)
        })
        .unwrap_or(0);
    let end = END_MARKERS
        .iter()
        .find_map(|marker| text.find(marker))
        .unwrap_or(text.len());
    if start >= end {
        return String::new();
    }
    text[start..end].trim().to_string()
}

/// "THE FROG-KING" -> "The Frog-King".
fn title_case(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut in_word = false;
    for c in title.chars() {
        if in_word {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        in_word = c.is_alphabetic() || c == '\'';
    }
    out
}

fn is_title_like(title: &str, min_chars: usize) -> bool {
    title.chars().count() > min_chars && is_valid_story_title(title)
}

/// Find (title, start, end) spans of the stories in a cleaned text.
pub fn detect_story_boundaries(text: &str, origin: StoryOrigin) -> Vec<StoryBoundary> {
    let (pattern, recase, min_chars, filter_first) = match origin {
        StoryOrigin::Grimm => (&*RE_CAPS_TITLE, true, 3, true),
        StoryOrigin::Lang => (&*RE_CAPS_TITLE, true, 3, false),
        StoryOrigin::Andersen => (&*RE_INDENTED_TITLE, false, 3, false),
        StoryOrigin::Perrault => (&*RE_CENTERED_TITLE, false, 3, false),
        StoryOrigin::Other => (&*RE_CAPITALIZED_TITLE, false, 0, false),
    };

    let mut found: Vec<(String, usize, usize)> = pattern
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let title = caps.get(1)?.as_str().trim().to_string();
            Some((title, whole.start(), whole.end()))
        })
        .collect();
    // Grimm texts list every title in the contents; only real headings
    // delimit stories.
    if filter_first {
        found.retain(|(title, _, _)| is_title_like(title, min_chars));
    }

    let mut stories = Vec::new();
    for (i, (title, _, start)) in found.iter().enumerate() {
        if !filter_first && !is_title_like(title, min_chars) {
            continue;
        }
        let end = found.get(i + 1).map_or(text.len(), |next| next.1);
        if end.saturating_sub(*start) <= MIN_STORY_SPAN {
            debug!(title = %title, "Skipping heading with too little text");
            continue;
        }
        let title = if recase { title_case(title) } else { title.clone() };
        stories.push(StoryBoundary {
            title,
            start: *start,
            end,
        });
    }
    stories
}

/// Turn a raw Gutenberg download into a collection of stories.
pub fn parse_collection(raw: &str, source: &GutenbergSource) -> Collection {
    let cleaned = clean_gutenberg_text(raw);
    let boundaries = detect_story_boundaries(&cleaned, source.origin);

    let mut collection = Collection::new(
        slugify(source.title, MAX_SLUG_CHARS),
        source.title,
        source.author,
        CollectionKind::Anthology {
            origin: source.origin,
        },
    );
    collection.source_url = source.book_url();
    collection.audio_sources = source.audio.iter().map(|s| s.to_string()).collect();

    for boundary in boundaries {
        let span = cleaned[boundary.start..boundary.end].trim();
        let body = RE_EXTRA_BLANK_LINES.replace_all(span, "\n\n");
        let body = body.trim();
        if body.chars().count() < MIN_STORY_TEXT {
            debug!(title = %boundary.title, "Skipping story with too little text");
            continue;
        }
        collection.push_chapter(boundary.title, body);
    }
    info!(
        id = %collection.id,
        stories = collection.chapter_count(),
        "Parsed collection"
    );
    collection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::find_source;

    fn body(sentence: &str) -> String {
        sentence.repeat(12)
    }

    fn grimm_text() -> String {
        format!(
            "Title: Grimm's Fairy Tales\r\n\
             *** START OF THE PROJECT GUTENBERG EBOOK GRIMM ***\r\n\
             \r\n\
             CONTENTS\r\n\
             \r\n\
             \x20    The Golden Bird\r\n\
             \x20    Hans in Luck\r\n\
             \r\n\
             \r\n\
             PREFACE\r\n\
             \r\n\
             {preface}\r\n\
             \r\n\
             \r\n\
             THE GOLDEN BIRD\r\n\
             \r\n\
             {bird}\r\n\
             \r\n\
             \r\n\
             \r\n\
             \r\n\
             {bird}\r\n\
             \r\n\
             \r\n\
             HANS IN LUCK\r\n\
             \r\n\
             {hans}\r\n\
             \r\n\
             \r\n\
             RUMPELSTILTSKIN\r\n\
             \r\n\
             too short to keep.\r\n\
             *** END OF THE PROJECT GUTENBERG EBOOK GRIMM ***\r\n\
             license text\r\n",
            preface = body("these tales were gathered from peasants of hesse. "),
            bird = body("a certain king had a beautiful garden behind his palace. "),
            hans = body("hans had served his master seven long years and wanted to go home. "),
        )
    }

    #[test]
    fn slugs_are_hyphenated_and_cut_at_word_boundaries() {
        assert_eq!(slugify("Grimm's Fairy Tales", 50), "grimms-fairy-tales");
        assert_eq!(slugify("  The Frog-King, or Iron Henry ", 50), "the-frog-king-or-iron-henry");
        assert_eq!(slugify("The Fairy Tales of Charles Perrault", 20), "the-fairy-tales-of");
        assert_eq!(slugify("Rumpelstiltskin", 6), "rumpel");
    }

    #[test]
    fn non_story_headings_are_rejected() {
        assert!(is_valid_story_title("The Golden Bird"));
        assert!(!is_valid_story_title("CONTENTS"));
        assert!(!is_valid_story_title("Preface to the Second Edition"));
        assert!(!is_valid_story_title("a-b-c-d-e"));
        assert!(!is_valid_story_title(&"long ".repeat(20)));
    }

    #[test]
    fn gutenberg_boilerplate_is_removed() {
        let cleaned = clean_gutenberg_text(&grimm_text());
        assert!(cleaned.starts_with("CONTENTS"));
        assert!(cleaned.ends_with("too short to keep."));
        assert!(!cleaned.contains('\r'));
    }

    #[test]
    fn grimm_headings_split_the_text_into_stories() {
        let source = find_source(2591).expect("grimm should be listed");

        let collection = parse_collection(&grimm_text(), source);

        assert_eq!(collection.id, "grimms-fairy-tales");
        assert_eq!(collection.chapter_titles(), vec!["The Golden Bird", "Hans In Luck"]);
        let bird = &collection.chapters[0].text;
        assert!(bird.starts_with("a certain king"));
        assert!(!bird.contains("\n\n\n"));
        assert!(bird.contains("\n\n"));
        let hans = &collection.chapters[1].text;
        assert!(hans.ends_with("go home."));
        assert!(!hans.contains("RUMPELSTILTSKIN"));
        assert_eq!(collection.audio_sources.len(), 2);
        assert_eq!(collection.source_url, "https://www.gutenberg.org/ebooks/2591");
    }

    #[test]
    fn indented_andersen_titles_are_detected() {
        let story = body("far out in the forest grew a pretty little fir tree. ");
        let text = format!(
            "\n          The Fir Tree\n\n{story}\n\n          The Snow Queen\n\n{story}\n"
        );

        let titles: Vec<String> = detect_story_boundaries(&text, StoryOrigin::Andersen)
            .into_iter()
            .map(|b| b.title)
            .collect();

        assert_eq!(titles, vec!["The Fir Tree", "The Snow Queen"]);
    }

    #[test]
    fn text_without_headings_has_no_stories() {
        let text = body("nothing but one long paragraph without any heading. ");
        assert!(detect_story_boundaries(&text, StoryOrigin::Lang).is_empty());
    }
}
