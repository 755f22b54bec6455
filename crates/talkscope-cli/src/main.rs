use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use talkscope_core::{AppConfig, storage};
use talkscope_sync::changelog::normalize_site_base;
use talkscope_sync::extract::parse_meeting_page;
use talkscope_sync::sources::LlvmWwwSource;
use talkscope_sync::{SyncOptions, reconcile_meeting, run_sync};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "talkscope",
    about = "Keep the curated LLVM developer meeting talk catalog in sync with llvm-www",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting TALKSCOPE_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging for talkscope crates. RUST_LOG takes precedence.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Config file (defaults to $TALKSCOPE_CONFIG or ~/.config/talkscope/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every meeting page from llvm-www and merge it into the catalog.
    Sync {
        #[arg(long)]
        events_dir: Option<PathBuf>,
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// GitHub repo in owner/name form.
        #[arg(long)]
        repo: Option<String>,
        /// Git ref of the repo to read.
        #[arg(long = "ref")]
        git_ref: Option<String>,
        #[arg(long)]
        github_api_base: Option<String>,
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        github_token: Option<String>,
        /// Only sync these meeting slugs (repeatable).
        #[arg(long = "only-slug", action = clap::ArgAction::Append)]
        only_slug: Vec<String>,
        /// Append new talks, slides and videos to this update log.
        #[arg(long)]
        update_log: Option<PathBuf>,
        /// Prefix for detail links in the update log.
        #[arg(long)]
        site_base: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },

    /// Extract a saved meeting page without touching the catalog.
    Extract {
        html: PathBuf,
        #[arg(long)]
        slug: String,
    },

    /// Reconcile a saved meeting page against the stored bundle.
    Merge {
        html: PathBuf,
        #[arg(long)]
        slug: String,
        #[arg(long)]
        events_dir: Option<PathBuf>,
        /// Write the merged bundle back (otherwise only report).
        #[arg(long)]
        write: bool,
    },

    /// List the meeting bundles in the catalog.
    Meetings {
        #[arg(long)]
        events_dir: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML.
    Config,

    /// Show version information.
    Version,
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let json_output = cli.json || std::env::var("TALKSCOPE_JSON").as_deref() == Ok("1");
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    match cli.command {
        // ── Sync ───────────────────────────────────────────────────────────
        Commands::Sync {
            events_dir,
            manifest,
            repo,
            git_ref,
            github_api_base,
            github_token,
            only_slug,
            update_log,
            site_base,
            dry_run,
        } => {
            let mut config = config;
            if let Some(repo) = repo {
                config.upstream.repo = repo;
            }
            if let Some(git_ref) = git_ref {
                config.upstream.git_ref = git_ref;
            }
            if let Some(base) = github_api_base {
                config.upstream.github_api_base = base;
            }
            let token = github_token.or_else(|| config.github_token());

            let mut options = SyncOptions::from_config(&config);
            if let Some(dir) = events_dir {
                // The manifest follows the events dir unless given explicitly.
                options.manifest_path = dir.join("index.json");
                options.events_dir = dir;
            }
            if let Some(path) = manifest {
                options.manifest_path = path;
            }
            if let Some(path) = update_log {
                options.update_log_path = Some(path);
            }
            if let Some(base) = site_base {
                options.site_base = normalize_site_base(&base);
            }
            options.only_slugs = only_slug;
            options.dry_run = dry_run;

            let source = LlvmWwwSource::new(&config.upstream, token)?;
            let report = run_sync(&source, &options, chrono::Utc::now())
                .await
                .context("failed to sync devmtg meetings")?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":report,"meta":{"duration_ms":dur}}))?;
            } else if !report.has_updates() {
                println!("No devmtg updates detected.");
            } else {
                println!(
                    "Updated devmtg bundles: {} meetings, {} newly discovered talks.",
                    report.changed_slugs.len(),
                    report.new_talks
                );
                if !report.created_slugs.is_empty() {
                    println!("Created new meeting files: {}", report.created_slugs.join(", "));
                }
                if let Some(version) = &report.manifest_version {
                    println!(
                        "Updated manifest: {} (dataVersion={version})",
                        options.manifest_path.display()
                    );
                }
                if let Some(path) = &options.update_log_path {
                    println!(
                        "Update log entries appended: {} ({})",
                        report.log_entries_appended,
                        path.display()
                    );
                }
                if report.dry_run {
                    println!("Dry run: nothing was written.");
                }
            }
        }

        // ── Extract ────────────────────────────────────────────────────────
        Commands::Extract { html, slug } => {
            let page_html = read_page(&html)?;
            let page = parse_meeting_page(&page_html, &slug, &config.upstream.page_base)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":page,"meta":{"duration_ms":dur}}))?;
            } else {
                println!("{} ({slug})", page.hint.name);
                println!("  Date:     {}", page.hint.date);
                println!("  Location: {}", page.hint.location);
                if page.hint.canceled {
                    println!("  Canceled");
                }
                println!("  Talks:    {}", page.talks.len());
                for talk in &page.talks {
                    println!(
                        "  [{category:<14}] {title}  ({speakers})",
                        category = talk.category,
                        title = talk.title,
                        speakers = talk.speaker_names().join(", ")
                    );
                }
            }
        }

        // ── Merge ──────────────────────────────────────────────────────────
        Commands::Merge {
            html,
            slug,
            events_dir,
            write,
        } => {
            let page_html = read_page(&html)?;
            let page = parse_meeting_page(&page_html, &slug, &config.upstream.page_base)?;
            let events_dir = events_dir.unwrap_or_else(|| config.events_dir());
            let path = storage::bundle_path(&events_dir, &slug);
            let stored = storage::load_bundle(&path)?;

            let result = reconcile_meeting(&slug, &page.hint, None, &page.talks, stored.as_ref());
            let written = write && result.changed && storage::save_bundle(&path, &result.bundle)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status":"ok",
                    "data":{
                        "slug":slug,
                        "changed":result.changed,
                        "new_talks":result.new_count,
                        "skipped":result.skipped,
                        "talks":result.bundle.talks.len(),
                        "written":written,
                    },
                    "meta":{"duration_ms":dur}
                }))?;
            } else {
                println!(
                    "{slug}: changed={} talks={} new={} skipped={}",
                    result.changed,
                    result.bundle.talks.len(),
                    result.new_count,
                    result.skipped
                );
                if written {
                    println!("Wrote {}", path.display());
                } else if result.changed && !write {
                    println!("Run with --write to save the merged bundle.");
                }
            }
        }

        // ── Meetings ───────────────────────────────────────────────────────
        Commands::Meetings { events_dir } => {
            let events_dir = events_dir.unwrap_or_else(|| config.events_dir());
            let bundles = storage::list_bundles(&events_dir)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                let items: Vec<_> = bundles
                    .iter()
                    .map(|(_, bundle)| {
                        serde_json::json!({
                            "slug": bundle.meeting.slug,
                            "name": bundle.meeting.name,
                            "date": bundle.meeting.date,
                            "talks": bundle.talks.len(),
                        })
                    })
                    .collect();
                print_json(&serde_json::json!({"status":"ok","data":{"items":items,"total":items.len()},"meta":{"duration_ms":dur}}))?;
            } else if bundles.is_empty() {
                println!("No meeting bundles in {}.", events_dir.display());
            } else {
                for (_, bundle) in bundles.iter().rev() {
                    println!(
                        "{slug:<12} {talks:>4} talks  {name}",
                        slug = bundle.meeting.slug,
                        talks = bundle.talks.len(),
                        name = bundle.meeting.name
                    );
                }
            }
        }

        // ── Config ─────────────────────────────────────────────────────────
        Commands::Config => {
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":config,"meta":{"duration_ms":dur}}))?;
            } else {
                print!("{}", config.to_toml()?);
            }
        }

        // ── Version ────────────────────────────────────────────────────────
        Commands::Version => {
            let version = env!("CARGO_PKG_VERSION");
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"version":version},"meta":{"duration_ms":dur}}))?;
            } else {
                println!("talkscope v{version}");
            }
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,talkscope_core=debug,talkscope_sync=debug,talkscope_cli=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_page(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}
