//! Pair narration files with chapters.
//!
//! Titles and file names are reduced to a leading number plus a list of
//! normalized words. Numbers are compared first; when a chapter has no
//! number, or several files claim the same one, the normalized titles are
//! compared by substring overlap. Anything still ambiguous stays unmatched.

use crate::collection::AudioTrack;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "ogg", "flac", "wav"];
const LOW_BITRATE_SUFFIX: &str = "_64kb";

const ORDINAL_WORDS: &[&str] = &[
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth",
    "tenth", "eleventh", "twelfth",
];
const FILLER_WORDS: &[&str] = &["the", "a", "an", "chapter"];
const RECORDING_NOISE: &[&str] = &["librivox", "64kb", "128kb"];

/// Minimum shared run of characters before a partial overlap counts.
const MIN_OVERLAP_CHARS: usize = 4;
/// Share of the shorter title that a partial overlap must cover.
const MIN_OVERLAP_RATIO: f32 = 0.6;

static RE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\s]+").unwrap());
static RE_NUMERIC_ORDINAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:st|nd|rd|th)$").unwrap());
static RE_LEADING_ROMAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([IVXLC]+)\s*[.):]").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
struct Label {
    number: Option<u32>,
    words: Vec<String>,
}

impl Label {
    fn text(&self) -> String {
        self.words.join(" ")
    }
}

/// Lowercase, strip accents and punctuation, split on whitespace.
fn raw_tokens(input: &str) -> Vec<String> {
    let folded: String = input
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    RE_PUNCT
        .replace_all(&folded, " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn is_noise(word: &str) -> bool {
    ORDINAL_WORDS.contains(&word)
        || FILLER_WORDS.contains(&word)
        || RECORDING_NOISE.contains(&word)
        || RE_NUMERIC_ORDINAL.is_match(word)
}

fn meaningful(words: &[String]) -> Vec<String> {
    words.iter().filter(|w| !is_noise(w)).cloned().collect()
}

fn as_number(token: &str) -> Option<u32> {
    if token.chars().all(|c| c.is_ascii_digit()) {
        token.parse().ok()
    } else {
        None
    }
}

fn parse_roman(token: &str) -> Option<u32> {
    let mut total = 0u32;
    let mut prev = 0u32;
    for ch in token.chars().rev() {
        let value = match ch.to_ascii_uppercase() {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            _ => return None,
        };
        if value < prev {
            total = total.checked_sub(value)?;
        } else {
            total += value;
            prev = value;
        }
    }
    // Reject non-canonical spellings such as "IIII" or "VX".
    (total > 0 && to_roman(total).eq_ignore_ascii_case(token)).then_some(total)
}

fn to_roman(mut n: u32) -> String {
    const TABLE: &[(u32, &str)] = &[
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for &(value, glyph) in TABLE {
        while n >= value {
            out.push_str(glyph);
            n -= value;
        }
    }
    out
}

/// Chapter titles: a trailing number wins ("1 Samuel 3" is chapter 3), then
/// a leading Arabic or Roman one ("03 - The Fox", "IV. The Frog-King").
fn chapter_label(title: &str) -> Label {
    let tokens = raw_tokens(title);
    if tokens.len() >= 2 {
        if let Some(n) = tokens.last().and_then(|t| as_number(t)) {
            return Label {
                number: Some(n),
                words: meaningful(&tokens[..tokens.len() - 1]),
            };
        }
    }
    if let Some(n) = tokens.first().and_then(|t| as_number(t)) {
        return Label {
            number: Some(n),
            words: meaningful(&tokens[1..]),
        };
    }
    if let Some(caps) = RE_LEADING_ROMAN.captures(title) {
        if let Some(n) = parse_roman(&caps[1]) {
            return Label {
                number: Some(n),
                words: meaningful(&tokens[1..]),
            };
        }
    }
    Label {
        number: None,
        words: meaningful(&tokens),
    }
}

/// File stems: a leading number, or a number right after a one-word prefix
/// ("grimm_05_the_golden_bird").
fn file_label(stem: &str) -> Label {
    let tokens = raw_tokens(stem);
    if let Some(n) = tokens.first().and_then(|t| as_number(t)) {
        return Label {
            number: Some(n),
            words: meaningful(&tokens[1..]),
        };
    }
    if tokens.len() >= 2 && tokens[0].chars().all(char::is_alphabetic) {
        if let Some(n) = as_number(&tokens[1]) {
            return Label {
                number: Some(n),
                words: meaningful(&tokens[2..]),
            };
        }
    }
    Label {
        number: None,
        words: meaningful(&tokens),
    }
}

fn track_from_label(path: PathBuf, label: Label) -> AudioTrack {
    AudioTrack {
        path,
        number: label.number,
        title: label.text(),
    }
}

/// Drop leading words every file in a folder shares ("audio bible ...").
/// Each title keeps at least one word.
fn strip_shared_prefix(labels: &mut [Label]) {
    if labels.len() < 2 {
        return;
    }
    let shortest = labels.iter().map(|l| l.words.len()).min().unwrap_or(0);
    let mut shared = 0;
    while shared + 1 < shortest {
        let word = &labels[0].words[shared];
        if labels.iter().all(|l| &l.words[shared] == word) {
            shared += 1;
        } else {
            break;
        }
    }
    if shared > 0 {
        for label in labels.iter_mut() {
            label.words.drain(..shared);
        }
    }
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn is_low_bitrate_copy(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.to_ascii_lowercase().ends_with(LOW_BITRATE_SUFFIX))
}

/// Build tracks for a set of file names that live in the same folder.
pub fn tracks_from_names<P: AsRef<Path>>(names: &[P]) -> Vec<AudioTrack> {
    let mut paths: Vec<PathBuf> = names.iter().map(|n| n.as_ref().to_path_buf()).collect();
    paths.sort();
    let mut labels: Vec<Label> = paths
        .iter()
        .map(|p| file_label(&p.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default()))
        .collect();
    strip_shared_prefix(&mut labels);
    paths
        .into_iter()
        .zip(labels)
        .map(|(path, label)| track_from_label(path, label))
        .collect()
}

/// List narration files in `dir`, sorted by name. A missing folder is simply
/// empty.
pub fn scan_audio_dir(dir: &Path) -> Vec<AudioTrack> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(path = %dir.display(), "No audio folder: {err}");
            return Vec::new();
        }
    };
    let paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_audio_file(path) && !is_low_bitrate_copy(path))
        .collect();
    let tracks = tracks_from_names(&paths);
    debug!(path = %dir.display(), tracks = tracks.len(), "Scanned audio folder");
    tracks
}

/// Length in chars of the longest common substring.
fn longest_common_substring(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut best = 0;
    for ca in &a {
        let mut row = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                row[j + 1] = prev[j] + 1;
                best = best.max(row[j + 1]);
            }
        }
        prev = row;
    }
    best
}

/// Ranking for one chapter/file pair, or `None` if they do not overlap.
/// Exact equality outranks any partial overlap.
fn overlap_score(chapter: &str, file: &str) -> Option<(bool, usize)> {
    if chapter.is_empty() || file.is_empty() {
        return None;
    }
    if chapter == file {
        return Some((true, chapter.chars().count()));
    }
    let common = longest_common_substring(chapter, file);
    let shorter = chapter.chars().count().min(file.chars().count());
    let contained = chapter.contains(file) || file.contains(chapter);
    let required = ((shorter as f32) * MIN_OVERLAP_RATIO).ceil() as usize;
    if contained || (common >= MIN_OVERLAP_CHARS && common >= required) {
        Some((false, common))
    } else {
        None
    }
}

/// Pick the single best overlapping candidate; a tie at the top is no answer.
fn best_by_overlap<'a>(chapter: &Label, candidates: &[&'a AudioTrack]) -> Option<&'a AudioTrack> {
    let wanted = chapter.text();
    let mut best: Option<((bool, usize), &'a AudioTrack)> = None;
    let mut tied = false;
    for &track in candidates {
        let Some(score) = overlap_score(&wanted, &track.title) else {
            continue;
        };
        match best {
            Some((top, _)) if score < top => {}
            Some((top, _)) if score == top => tied = true,
            _ => {
                best = Some((score, track));
                tied = false;
            }
        }
    }
    if tied { None } else { best.map(|(_, track)| track) }
}

/// Map chapter index to its narration. Chapters without a confident match
/// are absent from the result.
pub fn match_chapters(chapter_titles: &[String], tracks: &[AudioTrack]) -> BTreeMap<usize, AudioTrack> {
    let mut mapping = BTreeMap::new();
    if tracks.is_empty() {
        return mapping;
    }
    let mut ordered: Vec<&AudioTrack> = tracks.iter().collect();
    ordered.sort_by(|a, b| a.path.cmp(&b.path));

    for (idx, title) in chapter_titles.iter().enumerate() {
        let label = chapter_label(title);
        let numbered: Vec<&AudioTrack> = match label.number {
            Some(n) => ordered.iter().copied().filter(|t| t.number == Some(n)).collect(),
            None => Vec::new(),
        };
        let found = match numbered.len() {
            1 => Some(numbered[0]),
            0 => best_by_overlap(&label, &ordered),
            _ => best_by_overlap(&label, &numbered),
        };
        match found {
            Some(track) => {
                debug!(chapter = idx, title = %title, file = %track.path.display(), "Matched narration");
                mapping.insert(idx, track.clone());
            }
            None => debug!(chapter = idx, title = %title, "No narration match"),
        }
    }
    mapping
}

/// Convenience form over bare file names; values index into `file_names`.
pub fn match_file_names(chapter_titles: &[String], file_names: &[&str]) -> BTreeMap<usize, usize> {
    let tracks = tracks_from_names(file_names);
    match_chapters(chapter_titles, &tracks)
        .into_iter()
        .filter_map(|(chapter, track)| {
            file_names
                .iter()
                .position(|name| Path::new(name) == track.path)
                .map(|file| (chapter, file))
        })
        .collect()
}

/// Scan each source folder and match its tracks against the chapters.
/// Sources are separate recordings: each is matched on its own and an
/// earlier source keeps the chapters it claimed.
pub fn match_collection_audio(
    chapter_titles: &[String],
    audio_root: &Path,
    sources: &[String],
) -> BTreeMap<usize, AudioTrack> {
    let mut mapping = BTreeMap::new();
    let mut scanned = 0;
    for source in sources {
        let tracks = scan_audio_dir(&audio_root.join(source));
        if tracks.is_empty() {
            continue;
        }
        scanned += tracks.len();
        for (chapter, track) in match_chapters(chapter_titles, &tracks) {
            mapping.entry(chapter).or_insert(track);
        }
    }
    if scanned == 0 {
        if !sources.is_empty() {
            warn!(
                root = %audio_root.display(),
                sources = sources.len(),
                "No narration files found; reading without audio"
            );
        }
        return mapping;
    }
    info!(
        chapters = chapter_titles.len(),
        tracks = scanned,
        matched = mapping.len(),
        "Matched narration to chapters"
    );
    mapping
}
