//! Known books and recordings.

use fairytale_core::StoryOrigin;

pub const GUTENBERG_TEXT_URL: &str = "https://www.gutenberg.org/cache/epub/{id}/pg{id}.txt";
pub const GUTENBERG_BOOK_URL: &str = "https://www.gutenberg.org/ebooks/{id}";

/// A Project Gutenberg book and the recordings that narrate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GutenbergSource {
    pub book_id: u32,
    pub title: &'static str,
    pub author: &'static str,
    pub origin: StoryOrigin,
    /// Internet Archive identifiers, preferred recording first.
    pub audio: &'static [&'static str],
}

impl GutenbergSource {
    pub fn text_url(&self) -> String {
        GUTENBERG_TEXT_URL.replace("{id}", &self.book_id.to_string())
    }

    pub fn book_url(&self) -> String {
        GUTENBERG_BOOK_URL.replace("{id}", &self.book_id.to_string())
    }
}

/// A LibriVox recording hosted on the Internet Archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSource {
    pub identifier: &'static str,
    pub title: &'static str,
    pub origin: StoryOrigin,
    pub format: &'static str,
}

impl AudioSource {
    pub fn details_url(&self) -> String {
        format!("https://archive.org/details/{}", self.identifier)
    }
}

pub const GUTENBERG_SOURCES: &[GutenbergSource] = &[
    GutenbergSource {
        book_id: 2591,
        title: "Grimm's Fairy Tales",
        author: "Brothers Grimm",
        origin: StoryOrigin::Grimm,
        audio: &["grimms_english_librivox", "grimm_fairy_tales_1202_librivox"],
    },
    GutenbergSource {
        book_id: 1597,
        title: "Hans Andersen's Fairy Tales",
        author: "Hans Christian Andersen",
        origin: StoryOrigin::Andersen,
        audio: &["andersens_fairytales_librivox"],
    },
    GutenbergSource {
        book_id: 503,
        title: "The Blue Fairy Book",
        author: "Andrew Lang",
        origin: StoryOrigin::Lang,
        audio: &["blue_fairy_book_0707_librivox"],
    },
    GutenbergSource {
        book_id: 640,
        title: "The Red Fairy Book",
        author: "Andrew Lang",
        origin: StoryOrigin::Lang,
        audio: &["red_fairy_book_0908_librivox"],
    },
    GutenbergSource {
        book_id: 30580,
        title: "The Green Fairy Book",
        author: "Andrew Lang",
        origin: StoryOrigin::Lang,
        audio: &["green_fairy_book_1012_librivox"],
    },
    GutenbergSource {
        book_id: 7871,
        title: "The Yellow Fairy Book",
        author: "Andrew Lang",
        origin: StoryOrigin::Lang,
        audio: &[],
    },
    GutenbergSource {
        book_id: 31536,
        title: "The Pink Fairy Book",
        author: "Andrew Lang",
        origin: StoryOrigin::Lang,
        audio: &[],
    },
    GutenbergSource {
        book_id: 30862,
        title: "The Orange Fairy Book",
        author: "Andrew Lang",
        origin: StoryOrigin::Lang,
        audio: &["orange_fairy_book_1005_librivox"],
    },
    GutenbergSource {
        book_id: 27826,
        title: "The Lilac Fairy Book",
        author: "Andrew Lang",
        origin: StoryOrigin::Lang,
        audio: &["lilac_fairy_0707_librivox"],
    },
    GutenbergSource {
        book_id: 699,
        title: "The Fairy Tales of Charles Perrault",
        author: "Charles Perrault",
        origin: StoryOrigin::Perrault,
        audio: &[],
    },
];

pub const LIBRIVOX_SOURCES: &[AudioSource] = &[
    AudioSource {
        identifier: "grimms_english_librivox",
        title: "Grimm's Fairy Tales (LibriVox)",
        origin: StoryOrigin::Grimm,
        format: "mp3",
    },
    AudioSource {
        identifier: "grimm_fairy_tales_1202_librivox",
        title: "Grimm's Fairy Tales Version 2 (LibriVox)",
        origin: StoryOrigin::Grimm,
        format: "mp3",
    },
    AudioSource {
        identifier: "andersens_fairytales_librivox",
        title: "Andersen's Fairy Tales (LibriVox)",
        origin: StoryOrigin::Andersen,
        format: "mp3",
    },
    AudioSource {
        identifier: "blue_fairy_book_0707_librivox",
        title: "The Blue Fairy Book (LibriVox)",
        origin: StoryOrigin::Lang,
        format: "mp3",
    },
    AudioSource {
        identifier: "red_fairy_book_0908_librivox",
        title: "The Red Fairy Book (LibriVox)",
        origin: StoryOrigin::Lang,
        format: "mp3",
    },
    AudioSource {
        identifier: "green_fairy_book_1012_librivox",
        title: "The Green Fairy Book (LibriVox)",
        origin: StoryOrigin::Lang,
        format: "mp3",
    },
    AudioSource {
        identifier: "orange_fairy_book_1005_librivox",
        title: "The Orange Fairy Book (LibriVox)",
        origin: StoryOrigin::Lang,
        format: "mp3",
    },
    AudioSource {
        identifier: "lilac_fairy_0707_librivox",
        title: "The Lilac Fairy Book (LibriVox)",
        origin: StoryOrigin::Lang,
        format: "mp3",
    },
];

pub fn find_source(book_id: u32) -> Option<&'static GutenbergSource> {
    GUTENBERG_SOURCES.iter().find(|s| s.book_id == book_id)
}

pub fn find_audio_source(identifier: &str) -> Option<&'static AudioSource> {
    LIBRIVOX_SOURCES.iter().find(|s| s.identifier == identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_referenced_recording_is_known() {
        for source in GUTENBERG_SOURCES {
            for id in source.audio {
                assert!(
                    find_audio_source(id).is_some(),
                    "{} refers to unknown recording {id}",
                    source.title
                );
            }
        }
    }

    #[test]
    fn urls_embed_the_book_id() {
        let grimm = find_source(2591).expect("grimm should be listed");
        assert_eq!(
            grimm.text_url(),
            "https://www.gutenberg.org/cache/epub/2591/pg2591.txt"
        );
        assert_eq!(grimm.book_url(), "https://www.gutenberg.org/ebooks/2591");
        assert!(find_source(1).is_none());
    }
}
