//! Text store: one JSON document per collection under the library directory.
//!
//! The collector writes these files; the reader only reads them. A broken
//! file costs the reader that one collection, never the whole library.

use crate::collection::Collection;
use crate::util::{file_stem_for, write_atomic};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub fn collection_path(dir: &Path, collection_id: &str) -> PathBuf {
    dir.join(format!("{}.json", file_stem_for(collection_id)))
}

/// Persist a collection, replacing any previous version atomically.
pub fn write_collection(dir: &Path, collection: &Collection) -> Result<PathBuf> {
    let path = collection_path(dir, &collection.id);
    let json = serde_json::to_vec_pretty(collection)
        .with_context(|| format!("Failed to serialize collection {}", collection.id))?;
    write_atomic(&path, &json)?;
    info!(
        path = %path.display(),
        chapters = collection.chapter_count(),
        "Wrote collection"
    );
    Ok(path)
}

pub fn read_collection(path: &Path) -> Result<Collection> {
    let data =
        fs::read(path).with_context(|| format!("Failed to read collection {}", path.display()))?;
    let mut collection: Collection = serde_json::from_slice(&data)
        .with_context(|| format!("Invalid collection JSON in {}", path.display()))?;
    collection.reindex();
    Ok(collection)
}

/// Load every collection in `dir`, ordered by file name.
pub fn load_library(dir: &Path) -> Vec<Collection> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(path = %dir.display(), "Library directory unavailable: {err}");
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        })
        .collect();
    paths.sort();

    let mut collections = Vec::new();
    for path in paths {
        match read_collection(&path) {
            Ok(collection) if collection.chapters.is_empty() => {
                warn!(path = %path.display(), "Skipping collection without chapters");
            }
            Ok(collection) => {
                debug!(
                    id = %collection.id,
                    chapters = collection.chapter_count(),
                    "Loaded collection"
                );
                collections.push(collection);
            }
            Err(err) => warn!("Skipping unreadable collection: {err:?}"),
        }
    }
    info!(
        path = %dir.display(),
        collections = collections.len(),
        "Loaded library"
    );
    collections
}
