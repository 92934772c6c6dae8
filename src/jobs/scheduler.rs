use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, watch},
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, error, info};

use super::{recurring_job::Firing, storage::JobStorage};

/// Polls storage for due recurring jobs and hands each firing to the workers.
pub struct Scheduler {
    storage: Arc<dyn JobStorage>,
    firings: mpsc::UnboundedSender<Firing>,
    poll_interval: Duration,
}

impl Scheduler {
    pub fn new(
        storage: Arc<dyn JobStorage>,
        firings: mpsc::UnboundedSender<Firing>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            storage,
            firings,
            poll_interval,
        }
    }

    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "📅 Scheduler started, polling every {}ms",
            self.poll_interval.as_millis()
        );

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => self.enqueue_due_jobs(),
            }
        }

        debug!("📅 Scheduler stopped");
    }

    fn enqueue_due_jobs(&self) {
        let due = match self.storage.take_due_jobs(chrono::Utc::now()) {
            Ok(due) => due,
            Err(e) => {
                error!("❌ Failed to fetch due recurring jobs: {}", e);
                return;
            }
        };

        for firing in due {
            debug!("📅 Recurring job '{}' is due", firing.job_id);
            if self.firings.send(firing).is_err() {
                error!("❌ No workers left to run due recurring jobs");
                return;
            }
        }
    }
}
