use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, watch, Mutex},
    task::JoinHandle,
    time::{timeout_at, Instant},
};
use tracing::{info, warn};

use crate::{app::App, config::JobsConfig};

use super::{
    scheduler::Scheduler,
    storage::JobStorage,
    worker::{worker, WorkerQueue},
};

/// The background execution engine: one scheduler and a pool of workers
/// running the recurring jobs held by a [`JobStorage`].
pub struct BackgroundJobServer {
    shutdown: watch::Sender<bool>,
    task_handles: Vec<JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl BackgroundJobServer {
    /// Spawns the scheduler and workers on the current tokio runtime.
    pub fn start(jobs_config: &JobsConfig, app: App, storage: Arc<dyn JobStorage>) -> Self {
        let (shutdown, shutdown_receiver) = watch::channel(false);
        let (firing_sender, firing_receiver) = mpsc::unbounded_channel();
        let worker_count = jobs_config.worker_count.max(1);

        info!("🚀 Starting background job server with {} workers", worker_count);

        let mut task_handles = Vec::new();

        let scheduler = Scheduler::new(
            Arc::clone(&storage),
            firing_sender.clone(),
            Duration::from_millis(jobs_config.poll_interval_ms.max(1)),
        );
        let scheduler_shutdown = shutdown_receiver.clone();
        task_handles.push(tokio::spawn(async move {
            scheduler.run(scheduler_shutdown).await;
        }));

        let queue = WorkerQueue {
            firings: Arc::new(Mutex::new(firing_receiver)),
            retries: firing_sender,
        };

        for worker_id in 0..worker_count {
            task_handles.push(tokio::spawn(worker(
                format!("worker-{worker_id}"),
                jobs_config.clone(),
                app.clone(),
                Arc::clone(&storage),
                queue.clone(),
                shutdown_receiver.clone(),
            )));
        }

        Self {
            shutdown,
            task_handles,
            shutdown_timeout: Duration::from_secs(jobs_config.shutdown_timeout_seconds),
        }
    }

    /// Stops scheduling, lets running jobs finish within the shutdown
    /// timeout and aborts whatever is still running after it. The timeout
    /// bounds the whole shutdown, not each task.
    pub async fn shutdown(self) {
        info!("🛑 Stopping background job server");
        let _ = self.shutdown.send(true);
        let deadline = Instant::now() + self.shutdown_timeout;

        for mut handle in self.task_handles {
            if timeout_at(deadline, &mut handle).await.is_err() {
                warn!("🛑 Background task did not stop in time, aborting it");
                handle.abort();
            }
        }

        info!("🛑 Background job server stopped");
    }
}
