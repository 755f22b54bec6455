use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{CatalogError, Result};
use crate::models::{Manifest, MeetingBundle, UpdateLog};

const MANIFEST_FILE: &str = "index.json";

/// Bundle location for a meeting: `{events_dir}/{slug}.json`.
pub fn bundle_path(events_dir: &Path, slug: &str) -> PathBuf {
    events_dir.join(format!("{slug}.json"))
}

/// Serialize the way the site expects: two-space indent, trailing newline.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    Ok(text)
}

/// Load a meeting bundle. A missing file is `Ok(None)`, not an error.
pub fn load_bundle(path: &Path) -> Result<Option<MeetingBundle>> {
    read_json_if_exists(path)
}

/// Write a bundle, skipping the write when the file already holds identical bytes.
/// Returns whether the file was written.
pub fn save_bundle(path: &Path, bundle: &MeetingBundle) -> Result<bool> {
    write_json_if_changed(path, bundle)
}

/// Load the manifest, defaulting to an empty one when the file does not exist.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    Ok(read_json_if_exists(path)?.unwrap_or_default())
}

pub fn save_manifest(path: &Path, manifest: &Manifest) -> Result<bool> {
    write_json_if_changed(path, manifest)
}

pub fn load_update_log(path: &Path) -> Result<Option<UpdateLog>> {
    read_json_if_exists(path)
}

pub fn save_update_log(path: &Path, log: &UpdateLog) -> Result<bool> {
    write_json_if_changed(path, log)
}

/// Load every meeting bundle in `events_dir`, ordered by file name.
/// The manifest and unreadable files are skipped.
pub fn list_bundles(events_dir: &Path) -> Result<Vec<(PathBuf, MeetingBundle)>> {
    if !events_dir.exists() {
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(events_dir)? {
        let path = entry?.path();
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let is_manifest = path.file_name().is_some_and(|name| name == MANIFEST_FILE);
        if is_json && !is_manifest {
            paths.push(path);
        }
    }
    paths.sort();

    let mut bundles = Vec::with_capacity(paths.len());
    for path in paths {
        match load_bundle(&path) {
            Ok(Some(bundle)) => bundles.push((path, bundle)),
            Ok(None) => {}
            Err(e) => tracing::warn!("skipping invalid bundle {}: {e}", path.display()),
        }
    }
    Ok(bundles)
}

fn read_json_if_exists<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| CatalogError::InvalidBundle {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

fn write_json_if_changed<T: Serialize>(path: &Path, value: &T) -> Result<bool> {
    let text = to_pretty_json(value)?;
    if path.exists() && fs::read_to_string(path)? == text {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(true)
}
