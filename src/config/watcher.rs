//! Configuration file watcher for hot reload.
//!
//! # Responsibilities
//! - Detect changes to the config file, including saves that replace it
//!   by rename
//! - Coalesce the burst of events a single save produces into one reload
//! - Forward only validated configs whose content actually changed
//!
//! # Design Decisions
//! - Watches the parent directory and filters by file name; a watch on the
//!   file itself is lost when an editor swaps in a new inode
//! - Every forwarded config makes the host drop its compiled pages, so
//!   duplicate loads are suppressed by comparing file content

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::{parse_config_with, ConfigOverrides};
use crate::config::schema::HostConfig;

/// Quiet period after the last file event before the file is read.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    debounce: Duration,
    overrides: ConfigOverrides,
    update_tx: mpsc::UnboundedSender<HostConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<HostConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                debounce: DEFAULT_DEBOUNCE,
                overrides: ConfigOverrides::default(),
                update_tx,
            },
            update_rx,
        )
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Overrides applied to every reloaded config, as they were at startup.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Start watching. Must be called from within a tokio runtime.
    ///
    /// The returned handle keeps the watch alive; dropping it stops reloads.
    /// Invalid configs are logged and dropped; the current one stays active.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let file_name = self
            .path
            .file_name()
            .map(OsStr::to_os_string)
            .ok_or_else(|| notify::Error::generic("config path has no file name"))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_config_event(&event, &file_name) => {
                    let _ = event_tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default(),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        let filter = ReloadFilter::new(std::fs::read_to_string(&self.path).ok());
        tokio::spawn(reload_loop(
            ReloadSource {
                path: self.path.clone(),
                debounce: self.debounce,
                overrides: self.overrides,
            },
            event_rx,
            self.update_tx,
            filter,
        ));

        tracing::info!(path = ?self.path, dir = ?dir, "Config watcher started");
        Ok(watcher)
    }
}

/// True for create/modify/rename events that touch the config file.
fn is_config_event(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

/// Remembers the last content seen so unchanged saves are not reloaded.
#[derive(Debug, Default)]
struct ReloadFilter {
    last: Option<String>,
}

impl ReloadFilter {
    fn new(initial: Option<String>) -> Self {
        Self { last: initial }
    }

    /// Returns true if `content` differs from what was last seen.
    fn accept(&mut self, content: &str) -> bool {
        if self.last.as_deref() == Some(content) {
            return false;
        }
        self.last = Some(content.to_string());
        true
    }
}

struct ReloadSource {
    path: PathBuf,
    debounce: Duration,
    overrides: ConfigOverrides,
}

async fn reload_loop(
    source: ReloadSource,
    mut events: mpsc::UnboundedReceiver<()>,
    updates: mpsc::UnboundedSender<HostConfig>,
    mut filter: ReloadFilter,
) {
    let ReloadSource { path, debounce, overrides } = source;
    while events.recv().await.is_some() {
        tokio::time::sleep(debounce).await;
        while events.try_recv().is_ok() {}

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Config file unreadable, waiting for next change");
                continue;
            }
        };

        if !filter.accept(&content) {
            tracing::debug!(path = ?path, "Config content unchanged, skipping reload");
            continue;
        }

        tracing::info!(path = ?path, "Config file change detected, reloading");
        match parse_config_with(&content, &overrides) {
            Ok(config) => {
                if updates.send(config).is_err() {
                    break;
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to reload config. Keeping current configuration."),
        }
    }
}
