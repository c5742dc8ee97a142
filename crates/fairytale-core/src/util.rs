use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

pub fn ensure_dir(p: &Path) -> Result<()> {
    fs::create_dir_all(p).with_context(|| format!("create_dir_all {}", p.display()))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    format!("{:x}", h.finalize())
}

/// Replace `path` with `contents` without ever leaving a half-written file.
///
/// Each call writes its own uniquely named temp file in the destination
/// directory, syncs it, then renames it over `path`. Concurrent writers
/// never share a temp file, so the last rename wins with a complete file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;
    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
    tmp.write_all(contents)
        .with_context(|| format!("Failed to write temp file for {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("Failed to sync temp file for {}", path.display()))?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("Failed to move temp file into {}", path.display()))?;
    Ok(())
}

/// Turn an arbitrary identifier into something safe to use as a file stem.
///
/// Ids that are already lowercase `[a-z0-9_-]` are used as they are. Any
/// other id is sanitized and gets a short hash of the original appended, so
/// `Grimm` and `grimm` never share a file.
pub fn file_stem_for(id: &str) -> String {
    let stem: String = id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    let hash = sha256_hex(id.as_bytes());
    if stem.is_empty() {
        hash[..16].to_string()
    } else if stem == id {
        stem
    } else {
        format!("{stem}-{}", &hash[..8])
    }
}
