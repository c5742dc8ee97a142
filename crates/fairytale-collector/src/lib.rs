//! Downloader for the reader's library: Gutenberg texts, LibriVox narration
//! and the KJV Bible, written out as collection files.

pub mod archive;
pub mod bible;
pub mod fetch;
pub mod parser;
pub mod sources;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use fairytale_core::library::{load_library, write_collection};
use fairytale_core::util::write_atomic;
use fairytale_core::{Collection, CollectionKind};
use fetch::Fetcher;
use sources::{AudioSource, GUTENBERG_SOURCES, GutenbergSource, LIBRIVOX_SOURCES};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "fairytale-collector")]
#[command(about = "Download fairy tale texts and narration for the reader")]
pub struct Cli {
    /// Directory collection files are written to.
    #[arg(long, global = true, default_value = "library")]
    library: PathBuf,
    /// Directory for downloaded Gutenberg texts.
    #[arg(long, global = true, default_value = "cache")]
    cache: PathBuf,
    /// Directory narration is downloaded into, one folder per recording.
    #[arg(long, global = true, default_value = "cache/audio")]
    audio_dir: PathBuf,
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List known Gutenberg collections.
    Sources,
    /// List known LibriVox recordings.
    AudioSources,
    /// Download and split one collection.
    Process {
        #[arg(value_name = "BOOK_ID")]
        book_id: u32,
        /// Download again even if the text is cached.
        #[arg(long)]
        force: bool,
    },
    /// Download and split every known collection.
    ProcessAll {
        #[arg(long)]
        force: bool,
    },
    /// List the stories a collection splits into, with reading times.
    ListStories {
        #[arg(value_name = "BOOK_ID")]
        book_id: u32,
    },
    /// List processed stories, optionally filtered.
    Browse {
        /// Only stories of this origin (grimm, andersen, lang, perrault, other, bible).
        #[arg(short, long)]
        origin: Option<String>,
        /// Only stories that take at most this many minutes to read.
        #[arg(short = 't', long, value_name = "MINUTES")]
        max_time: Option<usize>,
    },
    /// Download LibriVox narration from the Internet Archive.
    DownloadAudio {
        #[arg(value_name = "IDENTIFIER", required_unless_present = "all")]
        identifier: Option<String>,
        /// Download every known recording.
        #[arg(long, conflicts_with = "identifier")]
        all: bool,
        /// Only list the files that would be downloaded.
        #[arg(long)]
        list_files: bool,
    },
    /// Import a tab-separated KJV text, one collection per book.
    ImportBible {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sources => {
            print_sources();
            Ok(())
        }
        Commands::AudioSources => {
            print_audio_sources();
            Ok(())
        }
        Commands::Process { book_id, force } => {
            let source = sources::find_source(book_id).with_context(|| {
                format!("Unknown book ID {book_id}; run `sources` to list collections")
            })?;
            let fetcher = Fetcher::new()?;
            process(&fetcher, source, &cli.cache, &cli.library, force).map(|_| ())
        }
        Commands::ProcessAll { force } => {
            let fetcher = Fetcher::new()?;
            process_all(&fetcher, GUTENBERG_SOURCES, &cli.cache, &cli.library, force)
        }
        Commands::ListStories { book_id } => {
            let source = sources::find_source(book_id).with_context(|| {
                format!("Unknown book ID {book_id}; run `sources` to list collections")
            })?;
            let fetcher = Fetcher::new()?;
            let raw = cached_text(&fetcher, source, &cli.cache, false)?;
            let collection = parser::parse_collection(&raw, source);
            println!("Stories in {}", source.title);
            println!("{:>4}  {:<48}  {:>7}  {:>6}", "#", "TITLE", "WORDS", "TIME");
            for chapter in &collection.chapters {
                println!(
                    "{:>4}  {:<48}  {:>7}  {:>2} min",
                    chapter.index + 1,
                    chapter.title,
                    chapter.word_count(),
                    chapter.reading_minutes()
                );
            }
            Ok(())
        }
        Commands::Browse { origin, max_time } => {
            let rows = browse(&load_library(&cli.library), origin.as_deref(), max_time);
            if rows.is_empty() {
                println!("No stories match; run `process` or `import-bible` first");
                return Ok(());
            }
            println!("{:<48}  {:<32}  {:<9}  {:>6}", "TITLE", "COLLECTION", "ORIGIN", "TIME");
            for row in &rows {
                println!(
                    "{:<48}  {:<32}  {:<9}  {:>2} min",
                    row.title, row.collection, row.origin, row.minutes
                );
            }
            println!("Total: {} stories", rows.len());
            Ok(())
        }
        Commands::DownloadAudio {
            identifier,
            all,
            list_files,
        } => {
            let selected: Vec<&AudioSource> = if all {
                LIBRIVOX_SOURCES.iter().collect()
            } else {
                let id = identifier.unwrap_or_default();
                let source = sources::find_audio_source(&id).with_context(|| {
                    format!("Unknown recording {id}; run `audio-sources` to list them")
                })?;
                vec![source]
            };
            let fetcher = Fetcher::new()?;
            download_audio(&fetcher, &selected, &cli.audio_dir, list_files)
        }
        Commands::ImportBible { path } => import_bible(&path, &cli.library).map(|_| ()),
    }
}

fn print_sources() {
    println!("{:>6}  {:<10}  {:<40}  {}", "ID", "ORIGIN", "TITLE", "AUTHOR");
    for source in GUTENBERG_SOURCES {
        println!(
            "{:>6}  {:<10}  {:<40}  {}",
            source.book_id,
            source.origin.to_string(),
            source.title,
            source.author
        );
    }
}

fn print_audio_sources() {
    for line in audio_source_lines() {
        println!("{line}");
    }
}

fn audio_source_lines() -> Vec<String> {
    let mut lines = vec![format!("{:<36}  {:<10}  {}", "IDENTIFIER", "ORIGIN", "TITLE")];
    for source in LIBRIVOX_SOURCES {
        lines.push(format!(
            "{:<36}  {:<10}  {}",
            source.identifier,
            source.origin.to_string(),
            source.title
        ));
        lines.push(format!("{:<36}  {}", "", source.details_url()));
    }
    lines
}

fn text_cache_path(cache_dir: &Path, book_id: u32) -> PathBuf {
    cache_dir.join(format!("gutenberg_{book_id}.txt"))
}

/// Cached Gutenberg text, downloading it when absent or when forced.
fn cached_text(
    fetcher: &Fetcher,
    source: &GutenbergSource,
    cache_dir: &Path,
    force: bool,
) -> Result<String> {
    let path = text_cache_path(cache_dir, source.book_id);
    if !force && path.exists() {
        info!(path = %path.display(), "Using cached text");
        return fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cached text {}", path.display()));
    }
    let text = fetcher.get_text(&source.text_url())?;
    write_atomic(&path, text.as_bytes())?;
    Ok(text)
}

/// Split a downloaded text and write its collection file.
pub fn process_text(raw: &str, source: &GutenbergSource, library: &Path) -> Result<PathBuf> {
    let collection = parser::parse_collection(raw, source);
    if collection.chapters.is_empty() {
        bail!("No stories found in {} ({})", source.title, source.book_id);
    }
    write_collection(library, &collection)
}

fn process(
    fetcher: &Fetcher,
    source: &GutenbergSource,
    cache_dir: &Path,
    library: &Path,
    force: bool,
) -> Result<PathBuf> {
    info!(book_id = source.book_id, title = source.title, "Processing collection");
    let raw = cached_text(fetcher, source, cache_dir, force)?;
    let path = process_text(&raw, source, library)?;
    println!("{} -> {}", source.title, path.display());
    Ok(path)
}

/// Process each source in turn. A failure is logged and the rest still run;
/// files written for other collections are left alone.
fn process_all(
    fetcher: &Fetcher,
    sources: &[GutenbergSource],
    cache_dir: &Path,
    library: &Path,
    force: bool,
) -> Result<()> {
    let mut failed = Vec::new();
    for source in sources {
        if let Err(err) = process(fetcher, source, cache_dir, library, force) {
            error!(book_id = source.book_id, "{err:?}");
            failed.push(source.title);
        }
    }
    if !failed.is_empty() {
        bail!(
            "{} of {} collections failed: {}",
            failed.len(),
            sources.len(),
            failed.join(", ")
        );
    }
    info!(collections = sources.len(), "All collections processed");
    Ok(())
}

/// A story listed by `browse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryRow {
    pub title: String,
    pub collection: String,
    pub origin: String,
    pub minutes: usize,
}

fn origin_label(collection: &Collection) -> String {
    match collection.kind {
        CollectionKind::Anthology { origin } => origin.to_string(),
        CollectionKind::Bible => "bible".to_string(),
    }
}

/// Stories across the library sorted by title, keeping those whose origin
/// matches `origin` (case-insensitive) and that read within `max_minutes`.
pub fn browse(
    library: &[Collection],
    origin: Option<&str>,
    max_minutes: Option<usize>,
) -> Vec<StoryRow> {
    let mut rows: Vec<StoryRow> = library
        .iter()
        .filter(|collection| {
            origin.is_none_or(|wanted| origin_label(collection).eq_ignore_ascii_case(wanted.trim()))
        })
        .flat_map(|collection| {
            collection.chapters.iter().map(move |chapter| StoryRow {
                title: chapter.title.clone(),
                collection: collection.title.clone(),
                origin: origin_label(collection),
                minutes: chapter.reading_minutes(),
            })
        })
        .filter(|row| max_minutes.is_none_or(|limit| row.minutes <= limit))
        .collect();
    rows.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.collection.cmp(&b.collection)));
    rows
}

fn download_audio(
    fetcher: &Fetcher,
    selected: &[&AudioSource],
    audio_dir: &Path,
    list_files: bool,
) -> Result<()> {
    let mut failures = 0;
    for source in selected {
        if list_files {
            let files = archive::list_audio_files(fetcher, source)?;
            println!("{} ({} files)", source.identifier, files.len());
            for file in files {
                println!("  {:>10}  {}", file.size, file.name);
            }
            continue;
        }
        match archive::download_audio(fetcher, source, audio_dir) {
            Ok(report) => {
                println!(
                    "{}: {} downloaded, {} already present, {} failed",
                    source.identifier,
                    report.downloaded.len(),
                    report.existing,
                    report.failed
                );
                failures += report.failed;
            }
            Err(err) => {
                error!(identifier = source.identifier, "{err:?}");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        bail!("{failures} narration download(s) failed");
    }
    Ok(())
}

/// Write one collection per Bible book found in `path`. Returns the count.
pub fn import_bible(path: &Path, library: &Path) -> Result<usize> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read KJV text {}", path.display()))?;
    let collections = bible::parse_kjv(&text);
    if collections.is_empty() {
        bail!("No verses found in {}", path.display());
    }
    for collection in &collections {
        write_collection(library, collection)?;
    }
    println!("Imported {} books into {}", collections.len(), library.display());
    Ok(collections.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairytale_core::StoryOrigin;
    use std::time::Duration;

    fn lang_text(first: &str, second: &str) -> String {
        let body = "the king's son rode out across the hills to seek his fortune. ".repeat(12);
        format!(
            "*** START OF THE PROJECT GUTENBERG EBOOK ***\n\
             Produced by volunteers\n\
             \n\
             {first}\n\
             \n\
             {body}\n\
             \n\
             \n\
             {second}\n\
             \n\
             {body}\n\
             *** END OF THE PROJECT GUTENBERG EBOOK ***\n"
        )
    }

    #[test]
    fn download_audio_requires_an_identifier_or_all() {
        assert!(Cli::try_parse_from(["fairytale-collector", "download-audio"]).is_err());
        assert!(Cli::try_parse_from(["fairytale-collector", "download-audio", "--all"]).is_ok());
        assert!(
            Cli::try_parse_from([
                "fairytale-collector",
                "download-audio",
                "grimms_english_librivox",
                "--list-files"
            ])
            .is_ok()
        );
        assert!(
            Cli::try_parse_from([
                "fairytale-collector",
                "download-audio",
                "grimms_english_librivox",
                "--all"
            ])
            .is_err()
        );
    }

    #[test]
    fn global_directories_are_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "fairytale-collector",
            "process",
            "2591",
            "--library",
            "/tmp/tales",
            "-v",
        ])
        .expect("arguments should parse");

        assert_eq!(cli.library, PathBuf::from("/tmp/tales"));
        assert!(cli.verbose());
        assert!(matches!(cli.command, Commands::Process { book_id: 2591, force: false }));
    }

    #[test]
    fn unknown_book_id_is_an_error() {
        let cli = Cli::try_parse_from(["fairytale-collector", "process", "42"])
            .expect("arguments should parse");
        let err = run(cli).expect_err("book 42 is not a known collection");
        assert!(err.to_string().contains("Unknown book ID 42"));
    }

    #[test]
    fn text_without_stories_writes_nothing() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let source = sources::find_source(503).expect("blue fairy book should be listed");

        assert!(process_text("just a license page", source, temp.path()).is_err());
        assert!(load_library(temp.path()).is_empty());
    }

    #[test]
    fn imported_bible_books_load_into_the_library() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let kjv = temp.path().join("kjv.txt");
        fs::write(
            &kjv,
            "Ruth 1:1\tNow it came to pass in the days when the judges ruled.\n\
             Ruth 2:1\tAnd Naomi had a kinsman of her husband's.\n\
             Jonah 1:1\tNow the word of the LORD came unto Jonah.\n",
        )
        .expect("write should succeed");
        let library = temp.path().join("library");

        assert_eq!(import_bible(&kjv, &library).expect("import should succeed"), 2);

        let loaded = load_library(&library);
        let ids: Vec<&str> = loaded.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["bible-jonah", "bible-ruth"]);
        assert_eq!(loaded[1].chapter_count(), 2);
    }

    #[test]
    fn missing_bible_file_is_an_error() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        assert!(import_bible(&temp.path().join("absent.txt"), temp.path()).is_err());
    }

    #[test]
    fn a_failed_collection_leaves_the_others_written() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let cache = temp.path().join("cache");
        let library = temp.path().join("library");
        let blue = *sources::find_source(503).expect("blue fairy book should be listed");
        let red = *sources::find_source(640).expect("red fairy book should be listed");

        fs::create_dir_all(&cache).expect("cache dir should be created");
        fs::write(
            text_cache_path(&cache, blue.book_id),
            lang_text("THE BRONZE RING", "PRINCE HYACINTH"),
        )
        .expect("seed text should be written");
        // A directory where the cached text should be: reading it fails
        // without touching the network.
        fs::create_dir_all(text_cache_path(&cache, red.book_id)).expect("dir should be created");

        let mut earlier = Collection::new(
            "the-red-fairy-book",
            "The Red Fairy Book",
            "Andrew Lang",
            CollectionKind::Anthology {
                origin: StoryOrigin::Lang,
            },
        );
        earlier.push_chapter("The Twelve Dancing Princesses", "once upon a time");
        let red_path = write_collection(&library, &earlier).expect("write should succeed");
        let red_before = fs::read(&red_path).expect("red collection should exist");

        let fetcher = Fetcher::new()
            .expect("client should build")
            .with_delays(Duration::ZERO, Duration::ZERO);
        let err = process_all(&fetcher, &[blue, red], &cache, &library, false)
            .expect_err("the red book cannot be read");

        assert!(err.to_string().contains("1 of 2 collections failed"));
        assert!(err.to_string().contains("The Red Fairy Book"));
        let loaded = load_library(&library);
        let blue_book = loaded
            .iter()
            .find(|c| c.id == "the-blue-fairy-book")
            .expect("blue book should be written");
        assert_eq!(blue_book.chapter_titles(), vec!["The Bronze Ring", "Prince Hyacinth"]);
        assert_eq!(fs::read(&red_path).expect("red collection should remain"), red_before);
    }

    #[test]
    fn audio_sources_listing_links_each_recording() {
        let lines = audio_source_lines();
        for source in LIBRIVOX_SOURCES {
            let url = format!("https://archive.org/details/{}", source.identifier);
            assert!(lines.iter().any(|line| line.trim() == url));
        }
    }

    #[test]
    fn browse_filters_by_origin_and_reading_time() {
        let mut grimm = Collection::new(
            "grimms-fairy-tales",
            "Grimm's Fairy Tales",
            "Jacob and Wilhelm Grimm",
            CollectionKind::Anthology {
                origin: StoryOrigin::Grimm,
            },
        );
        grimm.push_chapter("Rapunzel", "word ".repeat(900));
        grimm.push_chapter("Hans In Luck", "word ".repeat(150));
        let mut ruth = Collection::new("bible-ruth", "Ruth", "King James Version", CollectionKind::Bible);
        ruth.push_chapter("Ruth 1", "word ".repeat(300));
        let library = vec![grimm, ruth];

        let titles = |rows: Vec<StoryRow>| rows.into_iter().map(|r| r.title).collect::<Vec<_>>();

        assert_eq!(
            titles(browse(&library, None, None)),
            vec!["Hans In Luck", "Rapunzel", "Ruth 1"]
        );
        assert_eq!(
            titles(browse(&library, Some("Grimm"), None)),
            vec!["Hans In Luck", "Rapunzel"]
        );
        assert_eq!(titles(browse(&library, Some("bible"), None)), vec!["Ruth 1"]);
        assert_eq!(
            titles(browse(&library, None, Some(2))),
            vec!["Hans In Luck", "Ruth 1"]
        );
        assert!(browse(&library, Some("andersen"), None).is_empty());
    }

    #[test]
    fn browse_and_list_stories_parse() {
        let cli = Cli::try_parse_from(["fairytale-collector", "browse", "-o", "lang", "-t", "10"])
            .expect("arguments should parse");
        assert!(matches!(
            cli.command,
            Commands::Browse { origin: Some(ref o), max_time: Some(10) } if o == "lang"
        ));
        let cli = Cli::try_parse_from(["fairytale-collector", "list-stories", "503"])
            .expect("arguments should parse");
        assert!(matches!(cli.command, Commands::ListStories { book_id: 503 }));
        assert!(Cli::try_parse_from(["fairytale-collector", "browse", "-t", "soon"]).is_err());
    }
}
