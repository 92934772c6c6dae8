use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::{
    sync::{mpsc, watch, Mutex},
    time::{sleep, timeout},
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{app::App, config::JobsConfig};

use super::{
    job_result::JobResult, job_status::JobStatus, recurring_job::Firing, storage::JobStorage,
};

/// Channel ends shared by every worker of a server.
#[derive(Clone)]
pub struct WorkerQueue {
    pub firings: Arc<Mutex<mpsc::UnboundedReceiver<Firing>>>,
    pub retries: mpsc::UnboundedSender<Firing>,
}

pub async fn worker(
    worker_instance_name: String,
    worker_config: JobsConfig,
    app: App,
    storage: Arc<dyn JobStorage>,
    queue: WorkerQueue,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!("🔧 Worker '{}' started", worker_instance_name);

    loop {
        let firing = tokio::select! {
            _ = shutdown.changed() => break,
            firing = next_firing(&queue.firings) => firing,
        };

        let Some(firing) = firing else {
            break;
        };

        execute_firing(
            &worker_instance_name,
            &worker_config,
            &app,
            storage.as_ref(),
            &queue.retries,
            firing,
        )
        .await;
    }

    debug!("🔧 Worker '{}' stopped", worker_instance_name);
}

async fn next_firing(firings: &Mutex<mpsc::UnboundedReceiver<Firing>>) -> Option<Firing> {
    firings.lock().await.recv().await
}

async fn execute_firing(
    worker_instance_name: &str,
    worker_config: &JobsConfig,
    app: &App,
    storage: &dyn JobStorage,
    retries: &mpsc::UnboundedSender<Firing>,
    firing: Firing,
) {
    let execution_id = Uuid::new_v4();
    record_state(storage, &firing.job_id, JobStatus::Running);

    debug!(
        "🔧 Worker '{}' running '{}' ({}) attempt #{}",
        worker_instance_name, firing.job_id, execution_id, firing.attempt
    );

    let start_time = Instant::now();
    let timeout_duration = Duration::from_secs(u64::from(worker_config.job_timeout));

    let result = match timeout(timeout_duration, firing.invocation.invoke(app)).await {
        Ok(Ok(())) => JobResult::Completed,
        Ok(Err(e)) => JobResult::Failed(e),
        Err(_) => JobResult::TimedOut,
    };

    let execution_duration = start_time.elapsed();

    if result.is_retryable() && firing.attempt < worker_config.max_retries {
        let delay = retry_delay(worker_config, firing.attempt);
        warn!(
            "🔁 Job '{}' ({}) {} - retry #{} in {}s",
            firing.job_id,
            execution_id,
            result,
            firing.attempt + 1,
            delay.as_secs()
        );
        record_state(storage, &firing.job_id, JobStatus::PendingRetry);
        schedule_retry(
            retries.clone(),
            Firing {
                attempt: firing.attempt + 1,
                ..firing
            },
            delay,
        );
        return;
    }

    let status = JobStatus::from(&result);
    match result {
        JobResult::Completed => info!(
            "✅ Job '{}' ({}) completed in {}ms",
            firing.job_id,
            execution_id,
            execution_duration.as_millis()
        ),
        _ => error!(
            "❌ Job '{}' ({}) {} after {}ms",
            firing.job_id,
            execution_id,
            result,
            execution_duration.as_millis()
        ),
    }
    record_state(storage, &firing.job_id, status);
}

fn record_state(storage: &dyn JobStorage, job_id: &str, state: JobStatus) {
    if let Err(e) = storage.record_state(job_id, state) {
        error!("❌ Failed to record state {} for job '{}': {}", state, job_id, e);
    }
}

fn schedule_retry(retries: mpsc::UnboundedSender<Firing>, firing: Firing, delay: Duration) {
    tokio::spawn(async move {
        sleep(delay).await;
        if retries.send(firing).is_err() {
            debug!("🔁 Retry dropped, workers are gone");
        }
    });
}

/// `base * multiplier^attempt` seconds plus up to a second of jitter.
fn retry_delay(worker_config: &JobsConfig, attempt: u32) -> Duration {
    let seconds = worker_config.base_retry_delay_seconds.saturating_mul(
        worker_config
            .retry_backoff_multiplier
            .saturating_pow(attempt),
    );
    Duration::from_secs(seconds).saturating_add(Duration::from_millis(fastrand::u64(0..1000)))
}
