//! Settings file watcher for hot reload.
//!
//! # Data Flow
//! ```text
//! notify event(s) ──▶ debounce window ──▶ load_config ──▶ diff against last good
//!                                                             │
//!                                        SettingsUpdate ◀─────┘ (only if non-empty)
//! ```
//!
//! # Design Decisions
//! - Editors emit bursts of modify/create events per save; a burst is one reload
//! - Only what a running process can apply is sent: new backoff settings and
//!   sources or descriptors not seen before. Removals are ignored since routes
//!   are never deleted
//! - An invalid file keeps the last good settings as the diff baseline

use std::path::{Path, PathBuf};
use std::time::Duration;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::descriptor::ConfigurationDescriptor;
use crate::config::loader::load_config;
use crate::config::schema::{PushSettings, RuntimeConfig};

const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// What changed between two revisions of the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsUpdate {
    /// Replacement backoff settings, when they differ.
    pub push: Option<PushSettings>,
    /// Descriptor URLs absent from the previous revision.
    pub sources: Vec<String>,
    /// Inline descriptors absent from the previous revision.
    pub descriptors: Vec<ConfigurationDescriptor>,
}

impl SettingsUpdate {
    /// Diff two revisions. `None` when nothing applicable changed.
    pub fn between(previous: &RuntimeConfig, next: &RuntimeConfig) -> Option<Self> {
        let update = Self {
            push: (next.push != previous.push).then(|| next.push.clone()),
            sources: next
                .sources
                .iter()
                .filter(|url| !previous.sources.contains(url))
                .cloned()
                .collect(),
            descriptors: next
                .descriptors
                .iter()
                .filter(|d| !previous.descriptors.contains(d))
                .cloned()
                .collect(),
        };

        if update == Self::default() {
            None
        } else {
            Some(update)
        }
    }
}

/// Monitors the settings file and sends what changed.
pub struct ConfigWatcher {
    path: PathBuf,
    current: RuntimeConfig,
    debounce: Duration,
    update_tx: mpsc::UnboundedSender<SettingsUpdate>,
}

impl ConfigWatcher {
    /// `current` is the revision already applied; updates are diffed against it.
    pub fn new(path: &Path, current: RuntimeConfig) -> (Self, mpsc::UnboundedReceiver<SettingsUpdate>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                current,
                debounce: DEFAULT_DEBOUNCE,
                update_tx,
            },
            update_rx,
        )
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Start watching. Must be called inside a tokio runtime.
    ///
    /// Dropping the returned watcher stops both the file watch and the reload task.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<()>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    let _ = event_tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?self.path, "Settings watcher started");

        let ConfigWatcher {
            path,
            mut current,
            debounce,
            update_tx,
        } = self;

        tokio::spawn(async move {
            while event_rx.recv().await.is_some() {
                tokio::time::sleep(debounce).await;
                while event_rx.try_recv().is_ok() {}

                let next = match load_config(&path) {
                    Ok(next) => next,
                    Err(e) => {
                        tracing::error!("Failed to reload settings: {}. Keeping current settings.", e);
                        continue;
                    }
                };

                match SettingsUpdate::between(&current, &next) {
                    Some(update) => {
                        tracing::info!(
                            push_changed = update.push.is_some(),
                            new_sources = update.sources.len(),
                            new_descriptors = update.descriptors.len(),
                            "Settings reloaded"
                        );
                        if update_tx.send(update).is_err() {
                            break;
                        }
                    }
                    None => tracing::debug!("Settings file touched without applicable changes"),
                }
                current = next;
            }
        });

        Ok(watcher)
    }
}
