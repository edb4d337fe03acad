//! Periodic draft auto-save

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::aggregates::FormDefinition;
use crate::ports::outbound::FormRepository;

pub const DEFAULT_AUTO_SAVE_INTERVAL: Duration = Duration::from_secs(30);

/// Writes the latest published draft to the repository on a fixed interval.
pub struct AutoSaver {
    repo: Arc<dyn FormRepository>,
    interval: Duration,
}

impl AutoSaver {
    pub fn new(repo: Arc<dyn FormRepository>, interval: Duration) -> Self {
        Self { repo, interval }
    }

    pub fn with_default_interval(repo: Arc<dyn FormRepository>) -> Self {
        Self::new(repo, DEFAULT_AUTO_SAVE_INTERVAL)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn spawn(self, drafts: watch::Receiver<FormDefinition>) -> JoinHandle<()> {
        tokio::spawn(self.run(drafts))
    }

    /// Run until the draft publisher goes away.
    pub async fn run(self, mut drafts: watch::Receiver<FormDefinition>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick fires immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let draft = drafts.borrow().clone();
                    self.save_once(&draft).await;
                }
                changed = drafts.changed() => {
                    if changed.is_err() {
                        tracing::debug!("Draft publisher closed, stopping auto-save");
                        break;
                    }
                }
            }
        }
    }

    pub async fn save_once(&self, draft: &FormDefinition) {
        self.repo.auto_save(draft).await;
    }
}
