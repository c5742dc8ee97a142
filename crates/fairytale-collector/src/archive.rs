//! Internet Archive item listings and narration downloads.

use crate::fetch::Fetcher;
use crate::sources::AudioSource;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Files this small are samples or previews, not chapters.
const MIN_AUDIO_BYTES: u64 = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArchiveFile {
    pub name: String,
    /// The metadata API reports sizes as strings.
    #[serde(default, deserialize_with = "size_from_any")]
    pub size: u64,
}

#[derive(Debug, Deserialize)]
struct FilesResponse {
    #[serde(default)]
    result: Vec<ArchiveFile>,
}

fn size_from_any<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Number(u64),
        Text(String),
    }
    Ok(match Size::deserialize(deserializer)? {
        Size::Number(n) => n,
        Size::Text(s) => s.trim().parse().unwrap_or(0),
    })
}

pub fn metadata_url(identifier: &str) -> String {
    format!("https://archive.org/metadata/{identifier}/files")
}

pub fn download_url(identifier: &str, name: &str) -> String {
    format!("https://archive.org/download/{identifier}/{name}")
}

pub fn parse_listing(json: &str) -> Result<Vec<ArchiveFile>> {
    let response: FilesResponse =
        serde_json::from_str(json).context("Invalid Internet Archive file listing")?;
    Ok(response.result)
}

/// Audio files of `format` large enough to be real chapters, sorted by name.
pub fn filter_audio_files(files: &[ArchiveFile], format: &str) -> Vec<ArchiveFile> {
    let suffix = format!(".{}", format.to_ascii_lowercase());
    let mut audio: Vec<ArchiveFile> = files
        .iter()
        .filter(|f| f.name.to_ascii_lowercase().ends_with(&suffix) && f.size > MIN_AUDIO_BYTES)
        .cloned()
        .collect();
    audio.sort_by(|a, b| a.name.cmp(&b.name));
    audio
}

pub fn list_audio_files(fetcher: &Fetcher, source: &AudioSource) -> Result<Vec<ArchiveFile>> {
    let json = fetcher.get_text(&metadata_url(source.identifier))?;
    let files = parse_listing(&json)
        .with_context(|| format!("Failed to read file listing for {}", source.identifier))?;
    let audio = filter_audio_files(&files, source.format);
    info!(
        identifier = source.identifier,
        listed = files.len(),
        audio = audio.len(),
        "Fetched file listing"
    );
    Ok(audio)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub downloaded: Vec<PathBuf>,
    pub existing: usize,
    pub failed: usize,
}

/// Download every missing narration file of `source` into
/// `<audio_dir>/<identifier>/`. A failed file is counted, not fatal.
pub fn download_audio(
    fetcher: &Fetcher,
    source: &AudioSource,
    audio_dir: &Path,
) -> Result<DownloadReport> {
    let files = list_audio_files(fetcher, source)?;
    let target = audio_dir.join(source.identifier);
    let mut report = DownloadReport::default();
    for file in files {
        let Some(dest) = local_path(&target, &file.name) else {
            warn!(name = %file.name, "Skipping file with an unsafe name");
            report.failed += 1;
            continue;
        };
        if dest.exists() {
            report.existing += 1;
            continue;
        }
        match fetcher.download(&download_url(source.identifier, &file.name), &dest) {
            Ok(_) => report.downloaded.push(dest),
            Err(err) => {
                warn!(name = %file.name, "Download failed: {err:?}");
                report.failed += 1;
            }
        }
    }
    info!(
        identifier = source.identifier,
        downloaded = report.downloaded.len(),
        existing = report.existing,
        failed = report.failed,
        "Finished narration download"
    );
    Ok(report)
}

/// Map a listed name to a path inside `target`; names that would escape it
/// are refused.
fn local_path(target: &Path, name: &str) -> Option<PathBuf> {
    if name.split('/').any(|part| part == "..") {
        return None;
    }
    Path::new(name).file_name().map(|f| target.join(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"{
        "result": [
            {"name": "grimm_02_the_goose_girl.mp3", "size": "5230001"},
            {"name": "grimm_01_rapunzel.mp3", "size": "4100000"},
            {"name": "grimm_01_rapunzel_sample.mp3", "size": "5000"},
            {"name": "grimm_01_rapunzel.ogg", "size": 3900000},
            {"name": "grimms_english_librivox_meta.xml"}
        ]
    }"#;

    #[test]
    fn listing_sizes_parse_from_strings_and_numbers() {
        let files = parse_listing(LISTING).expect("listing should parse");
        assert_eq!(files.len(), 5);
        assert_eq!(files[0].size, 5_230_001);
        assert_eq!(files[3].size, 3_900_000);
        assert_eq!(files[4].size, 0);
    }

    #[test]
    fn only_large_files_of_the_format_are_kept_in_name_order() {
        let files = parse_listing(LISTING).expect("listing should parse");

        let names: Vec<String> = filter_audio_files(&files, "mp3")
            .into_iter()
            .map(|f| f.name)
            .collect();

        assert_eq!(names, vec!["grimm_01_rapunzel.mp3", "grimm_02_the_goose_girl.mp3"]);
        assert_eq!(filter_audio_files(&files, "ogg").len(), 1);
    }

    #[test]
    fn missing_result_is_an_empty_listing() {
        assert!(parse_listing("{}").expect("listing should parse").is_empty());
        assert!(parse_listing("not json").is_err());
    }

    #[test]
    fn listed_names_stay_inside_the_target() {
        let target = Path::new("cache/audio/grimms_english_librivox");
        assert_eq!(
            local_path(target, "grimm_01_rapunzel.mp3"),
            Some(target.join("grimm_01_rapunzel.mp3"))
        );
        assert_eq!(local_path(target, "../escape.mp3"), None);
        assert_eq!(local_path(target, "disc1/01.mp3"), Some(target.join("01.mp3")));
    }
}
