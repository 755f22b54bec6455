//! One full sync pass: fetch, extract, reconcile, persist.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use talkscope_core::storage;
use talkscope_core::{AppConfig, UpdateLogEntry};

use crate::changelog::{self, append_entries, diff_talk_entries};
use crate::error::Result;
use crate::extract::{parse_index_hints, parse_meeting_page};
use crate::reconcile::reconcile_meeting;
use crate::sources::MeetingSource;
use crate::text::collapse_ws;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub events_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub update_log_path: Option<PathBuf>,
    /// Already normalised with [`changelog::normalize_site_base`].
    pub site_base: String,
    /// Base that relative links on meeting pages resolve against.
    pub page_base: String,
    /// Restrict the run to these slugs; empty means all.
    pub only_slugs: Vec<String>,
    pub dry_run: bool,
}

impl SyncOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            events_dir: config.events_dir(),
            manifest_path: config.manifest_path(),
            update_log_path: config.update_log_path(),
            site_base: changelog::normalize_site_base(&config.catalog.site_base),
            page_base: config.upstream.page_base.clone(),
            only_slugs: Vec::new(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub changed_slugs: Vec<String>,
    /// Meetings whose bundle file did not exist before this run.
    pub created_slugs: Vec<String>,
    pub new_talks: usize,
    pub skipped_candidates: usize,
    /// Manifest `dataVersion` after the run, when anything changed.
    pub manifest_version: Option<String>,
    pub manifest_written: bool,
    pub log_entries: Vec<UpdateLogEntry>,
    pub log_entries_appended: usize,
    pub dry_run: bool,
}

impl SyncReport {
    pub fn has_updates(&self) -> bool {
        !self.changed_slugs.is_empty()
    }
}

/// Sync every upstream meeting into the catalog at `options.events_dir`.
///
/// Only listing the upstream meetings and local storage failures are fatal;
/// a meeting page that cannot be fetched is skipped with a warning.
pub async fn run_sync(
    source: &dyn MeetingSource,
    options: &SyncOptions,
    now: DateTime<Utc>,
) -> Result<SyncReport> {
    let mut report = SyncReport {
        dry_run: options.dry_run,
        ..SyncReport::default()
    };

    let mut manifest = storage::load_manifest(&options.manifest_path)?;
    let mut manifest_files: BTreeSet<String> = manifest
        .event_files
        .iter()
        .map(|file| collapse_ws(file))
        .filter(|file| !file.is_empty())
        .collect();

    let index_hints = match source.fetch_index_page().await {
        Ok(html) => parse_index_hints(&html)?,
        Err(e) => {
            tracing::warn!(source = source.name(), "could not fetch devmtg index hints: {e}");
            BTreeMap::new()
        }
    };

    let mut slugs = source.list_slugs().await?;
    let allowed: BTreeSet<String> = options
        .only_slugs
        .iter()
        .map(|slug| collapse_ws(slug))
        .filter(|slug| !slug.is_empty())
        .collect();
    if !allowed.is_empty() {
        slugs.retain(|slug| allowed.contains(slug));
    }

    let stamp = changelog::logged_at(now);
    for slug in &slugs {
        let html = match source.fetch_meeting_page(slug).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(slug = %slug, "skipping meeting: {e}");
                continue;
            }
        };

        let path = storage::bundle_path(&options.events_dir, slug);
        let stored = storage::load_bundle(&path)?;
        let page = parse_meeting_page(&html, slug, &options.page_base)?;
        if page.talks.is_empty() && stored.is_none() {
            tracing::debug!(slug = %slug, "no parseable talks found");
            continue;
        }

        let result = reconcile_meeting(
            slug,
            &page.hint,
            index_hints.get(slug),
            &page.talks,
            stored.as_ref(),
        );
        report.skipped_candidates += result.skipped;
        if !result.changed {
            continue;
        }

        tracing::info!(
            slug = %slug,
            talks = result.bundle.talks.len(),
            new = result.new_count,
            "meeting updated"
        );
        report.changed_slugs.push(slug.clone());
        report.new_talks += result.new_count;
        if stored.is_none() {
            report.created_slugs.push(slug.clone());
        }
        if !options.dry_run {
            storage::save_bundle(&path, &result.bundle)?;
        }
        manifest_files.insert(format!("{slug}.json"));
        report.log_entries.extend(diff_talk_entries(
            &result.bundle,
            stored.as_ref(),
            &stamp,
            &options.site_base,
        ));
    }

    if !report.has_updates() {
        tracing::info!("no devmtg updates detected");
        return Ok(report);
    }

    let event_files: Vec<String> = manifest_files.into_iter().rev().collect();
    let data_version = format!("{}-auto-sync-devmtg", now.format("%Y-%m-%d"));
    let manifest_changed =
        manifest.event_files != event_files || collapse_ws(&manifest.data_version) != data_version;
    manifest.event_files = event_files;
    manifest.data_version = data_version.clone();
    report.manifest_version = Some(data_version);

    if manifest_changed && !options.dry_run {
        report.manifest_written = storage::save_manifest(&options.manifest_path, &manifest)?;
    }

    if let Some(log_path) = &options.update_log_path {
        let existing = storage::load_update_log(log_path)?;
        let (log, appended) = append_entries(existing, report.log_entries.clone(), now);
        report.log_entries_appended = appended;
        if !options.dry_run {
            storage::save_update_log(log_path, &log)?;
        }
    }

    Ok(report)
}
