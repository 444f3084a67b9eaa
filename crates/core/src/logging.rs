//! Session logs for navigation runs.
//!
//! A [`RunLog`] covers one session, usually one scenario run. When logging is
//! enabled it installs a JSON subscriber writing to
//! `<directory>/<scope>-<run_id>.json`, where the scope names what is being
//! run (the scenario file stem for the CLI) and the run id is a UUID v7.
//! Retention is per scope: starting a session only prunes older logs of the
//! same scope.
//!
//! Every request made through the navigation service runs inside a
//! [`navigation_span`], so each line it emits carries the operation, its
//! target and a per-process request number:
//!
//! ```text
//! {"level":"INFO","fields":{"message":"navigation declined","reason":"..."},
//!  "span":{"operation":"navigate","target":"Compose","request":3,"name":"navigation"}}
//! ```
//!
//! `RUST_LOG` takes precedence over [`LoggingSettings::level`]:
//!
//! ```bash
//! RUST_LOG=pagenav_core::navigation=debug,info pagenav run demos/mail.toml
//! ```

use crate::settings::LoggingSettings;
use anyhow::{Context, Error};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::Span;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const LOG_EXTENSION: &str = "json";
const DEFAULT_SCOPE: &str = "pagenav";
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

static REQUESTS: AtomicU64 = AtomicU64::new(0);

/// Span wrapping one navigation request.
pub fn navigation_span(operation: &'static str, target: &str) -> Span {
    let request = REQUESTS.fetch_add(1, Ordering::Relaxed) + 1;
    tracing::info_span!("navigation", operation, target = %target, request)
}

/// An active logging session. Dropping it flushes without a time limit;
/// [`RunLog::finish`] bounds the wait.
pub struct RunLog {
    run_id: Uuid,
    scope: String,
    path: Option<PathBuf>,
    guard: Option<WorkerGuard>,
}

impl RunLog {
    /// Starts a session for `scope` and installs the global subscriber.
    ///
    /// With logging disabled nothing is installed and the session only
    /// carries its run id.
    ///
    /// # Errors
    ///
    /// Fails if the log directory can't be prepared, the filter directive is
    /// invalid, or a global subscriber is already installed.
    pub fn start(settings: &LoggingSettings, scope: &str) -> Result<RunLog, Error> {
        let run_id = Uuid::now_v7();
        let scope = sanitize_scope(scope);
        if !settings.enabled {
            return Ok(RunLog {
                run_id,
                scope,
                path: None,
                guard: None,
            });
        }

        let log_dir = std::env::current_dir()
            .context("can't get current working directory")?
            .join(&settings.directory);
        fs::create_dir_all(&log_dir)
            .with_context(|| format!("can't create log directory {}", log_dir.display()))?;

        // Leave room for the file this session creates.
        if settings.max_files > 0 {
            prune_scope(&log_dir, &scope, settings.max_files - 1)?;
        }

        let appender = tracing_appender::rolling::Builder::new()
            .rotation(tracing_appender::rolling::Rotation::NEVER)
            .filename_prefix(format!("{}-{}", scope, run_id))
            .filename_suffix(LOG_EXTENSION)
            .build(&log_dir)
            .context("can't initialize run log appender")?;
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let json = tracing_subscriber::fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(writer)
            .with_current_span(true)
            .with_span_list(false);

        tracing_subscriber::registry()
            .with(build_filter(&settings.level)?)
            .with(json)
            .try_init()
            .context("can't initialize tracing subscriber")?;

        let path = log_dir.join(log_file_name(&scope, &run_id));
        tracing::info!(
            run_id = %run_id,
            scope = %scope,
            version = env!("CARGO_PKG_VERSION"),
            "run log started"
        );

        Ok(RunLog {
            run_id,
            scope,
            path: Some(path),
            guard: Some(guard),
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The file this session writes to, if logging is enabled.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Flushes buffered lines, waiting at most five seconds.
    pub fn finish(mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        tracing::info!(run_id = %self.run_id, "run log finished");

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            drop(guard);
            let _ = tx.send(());
        });
        let _ = rx.recv_timeout(FLUSH_TIMEOUT);
    }
}

fn log_file_name(scope: &str, run_id: &Uuid) -> String {
    format!("{}-{}.{}", scope, run_id, LOG_EXTENSION)
}

/// Scopes end up in file names, so anything but ASCII alphanumerics, `-` and
/// `_` becomes `_`.
fn sanitize_scope(scope: &str) -> String {
    let cleaned: String = scope
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        DEFAULT_SCOPE.to_string()
    } else {
        cleaned
    }
}

/// Logs of `scope` in `log_dir`, oldest first.
///
/// Only `<scope>-<uuid>.json` matches, so `mail` never claims the logs of
/// `mail-drafts`.
fn scope_logs(log_dir: &Path, scope: &str) -> Result<Vec<(Uuid, PathBuf)>, Error> {
    let mut logs = Vec::new();
    for entry in fs::read_dir(log_dir)
        .with_context(|| format!("can't read log directory {}", log_dir.display()))?
    {
        let entry = entry.context("can't read log directory entry")?;
        let file_name = entry.file_name();
        let run_id = file_name
            .to_str()
            .and_then(|name| name.strip_suffix(LOG_EXTENSION))
            .and_then(|name| name.strip_suffix('.'))
            .and_then(|name| name.strip_prefix(scope))
            .and_then(|name| name.strip_prefix('-'))
            .and_then(|id| Uuid::parse_str(id).ok());
        if let Some(run_id) = run_id {
            logs.push((run_id, entry.path()));
        }
    }

    // v7 ids sort by creation time.
    logs.sort_by_key(|(run_id, _)| *run_id);
    Ok(logs)
}

/// Deletes the oldest logs of `scope` until at most `keep` remain.
fn prune_scope(log_dir: &Path, scope: &str, keep: usize) -> Result<(), Error> {
    let logs = scope_logs(log_dir, scope)?;
    let excess = logs.len().saturating_sub(keep);
    for (_, path) in logs.into_iter().take(excess) {
        fs::remove_file(&path)
            .with_context(|| format!("can't remove old log file {}", path.display()))?;
    }
    Ok(())
}

fn build_filter(level: &str) -> Result<EnvFilter, Error> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let level = match level.trim() {
        "" => "info",
        level => level,
    };
    EnvFilter::builder()
        .parse(level)
        .with_context(|| format!("invalid logging level '{}'", level))
}
