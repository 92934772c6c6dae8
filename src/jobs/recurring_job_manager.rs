use std::{future::Future, str::FromStr as _, sync::Arc};

use thiserror::Error;
use tracing::{debug, info};

use crate::app::FromApp;

use super::{
    recurring_job::{Invocation, RecurringJob, RecurringJobDto},
    storage::{JobStorage, StorageError},
    JobError,
};

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Recurring job id must not be empty")]
    EmptyJobId,
    #[error("Invalid cron expression '{cron_expression}' for job '{job_id}': {message}")]
    InvalidCron {
        job_id: String,
        cron_expression: String,
        message: String,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The application's recurring jobs, declared against a manager at startup.
pub type JobSchedule = fn(&RecurringJobManager) -> Result<(), RegistrationError>;

/// Declares recurring jobs on a [`JobStorage`].
#[derive(Clone)]
pub struct RecurringJobManager {
    storage: Arc<dyn JobStorage>,
}

impl RecurringJobManager {
    pub fn new(storage: Arc<dyn JobStorage>) -> Self {
        Self { storage }
    }

    /// Registers `method` to run on a freshly resolved `S` whenever
    /// `cron_expression` fires. Registering an existing `job_id` again
    /// replaces its schedule and method.
    ///
    /// Surrounding whitespace is trimmed from `job_id`, so `" X"` and `"X"`
    /// name the same job. A blank id is rejected.
    ///
    /// Cron expressions carry a leading seconds field, e.g. `*/10 * * * * *`
    /// fires every ten seconds.
    pub fn add_or_update<S, F, Fut>(
        &self,
        job_id: &str,
        method: F,
        cron_expression: &str,
    ) -> Result<(), RegistrationError>
    where
        S: FromApp,
        F: Fn(S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        let job_id = job_id.trim();
        if job_id.is_empty() {
            return Err(RegistrationError::EmptyJobId);
        }

        let schedule =
            cron::Schedule::from_str(cron_expression).map_err(|e| RegistrationError::InvalidCron {
                job_id: job_id.to_string(),
                cron_expression: cron_expression.to_string(),
                message: e.to_string(),
            })?;

        let job = RecurringJob::new(
            job_id.to_string(),
            cron_expression.to_string(),
            schedule,
            Invocation::new(method),
            chrono::Utc::now(),
        );

        debug!(
            "📅 Recurring job '{}' on '{}' calls {}",
            job.id,
            job.cron_expression,
            job.invocation.service()
        );

        self.storage.add_or_update(job)?;
        Ok(())
    }

    /// Removes the job registered under `job_id`, trimmed like in
    /// [`add_or_update`](Self::add_or_update). Unknown ids are not an error.
    pub fn remove_if_exists(&self, job_id: &str) -> Result<(), RegistrationError> {
        let job_id = job_id.trim();
        if self.storage.remove(job_id)? {
            debug!("📅 Removed recurring job '{}'", job_id);
        }
        Ok(())
    }

    /// Ids of every registered recurring job, sorted.
    pub fn recurring_job_ids(&self) -> Result<Vec<String>, RegistrationError> {
        Ok(self
            .recurring_jobs()?
            .into_iter()
            .map(|job| job.id)
            .collect())
    }

    pub fn recurring_jobs(&self) -> Result<Vec<RecurringJobDto>, RegistrationError> {
        Ok(self.storage.recurring_jobs()?)
    }
}

/// Declares the application's recurring jobs and logs which ones ended up
/// registered. Any failure here must stop startup.
pub fn register_recurring_jobs(
    manager: &RecurringJobManager,
    schedule: JobSchedule,
) -> Result<Vec<String>, RegistrationError> {
    schedule(manager)?;

    let job_ids = manager.recurring_job_ids()?;
    info!("Registered recurrent jobs: {}", job_ids.join(", "));

    Ok(job_ids)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::{DateTime, Utc};

    use super::*;
    use crate::{
        app::{App, ResolveError},
        jobs::{
            job_status::JobStatus,
            recurring_job::Firing,
            storage::MemoryStorage,
        },
        test_support::capture_logs,
    };

    struct Report;

    impl FromApp for Report {
        fn from_app(_app: &App) -> Result<Self, ResolveError> {
            Ok(Self)
        }
    }

    impl Report {
        async fn build(self) -> Result<(), JobError> {
            Ok(())
        }
    }

    /// Memory storage whose backend can be switched off.
    #[derive(Default)]
    struct SwitchableStorage {
        inner: MemoryStorage,
        offline: AtomicBool,
    }

    impl SwitchableStorage {
        fn check(&self) -> Result<(), StorageError> {
            if self.offline.load(Ordering::SeqCst) {
                Err(StorageError::Unavailable("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl JobStorage for SwitchableStorage {
        fn add_or_update(&self, job: RecurringJob) -> Result<(), StorageError> {
            self.check()?;
            self.inner.add_or_update(job)
        }

        fn remove(&self, job_id: &str) -> Result<bool, StorageError> {
            self.check()?;
            self.inner.remove(job_id)
        }

        fn recurring_jobs(&self) -> Result<Vec<RecurringJobDto>, StorageError> {
            self.check()?;
            self.inner.recurring_jobs()
        }

        fn take_due_jobs(&self, now: DateTime<Utc>) -> Result<Vec<Firing>, StorageError> {
            self.check()?;
            self.inner.take_due_jobs(now)
        }

        fn record_state(&self, job_id: &str, state: JobStatus) -> Result<(), StorageError> {
            self.check()?;
            self.inner.record_state(job_id, state)
        }
    }

    fn manager() -> RecurringJobManager {
        RecurringJobManager::new(Arc::new(MemoryStorage::new()))
    }

    fn report_schedule(manager: &RecurringJobManager) -> Result<(), RegistrationError> {
        manager.add_or_update("Report build", Report::build, "0 0 * * * *")?;
        manager.add_or_update("Archive", Report::build, "0 30 2 * * *")
    }

    #[test]
    fn test_add_or_update_registers_job_once() {
        let manager = manager();

        manager
            .add_or_update("X", Report::build, "*/10 * * * * *")
            .unwrap();

        assert_eq!(manager.recurring_job_ids().unwrap(), vec!["X"]);
    }

    #[test]
    fn test_add_or_update_twice_overwrites_schedule() {
        let manager = manager();

        manager
            .add_or_update("X", Report::build, "*/10 * * * * *")
            .unwrap();
        manager
            .add_or_update("X", Report::build, "0 */5 * * * *")
            .unwrap();

        let jobs = manager.recurring_jobs().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "X");
        assert_eq!(jobs[0].cron, "0 */5 * * * *");
        assert!(jobs[0].service.ends_with("Report"));
    }

    #[test]
    fn test_padded_job_id_names_the_same_job() {
        let manager = manager();

        manager
            .add_or_update("X", Report::build, "*/10 * * * * *")
            .unwrap();
        manager
            .add_or_update(" X ", Report::build, "0 */5 * * * *")
            .unwrap();

        let jobs = manager.recurring_jobs().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "X");
        assert_eq!(jobs[0].cron, "0 */5 * * * *");

        manager.remove_if_exists("X ").unwrap();
        assert!(manager.recurring_job_ids().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_cron_is_rejected_and_nothing_stored() {
        let manager = manager();

        let error = manager
            .add_or_update("X", Report::build, "every ten seconds")
            .unwrap_err();

        assert!(matches!(
            error,
            RegistrationError::InvalidCron { ref job_id, .. } if job_id == "X"
        ));
        assert!(manager.recurring_job_ids().unwrap().is_empty());
    }

    #[test]
    fn test_blank_job_id_is_rejected() {
        let manager = manager();

        let error = manager
            .add_or_update("  ", Report::build, "*/10 * * * * *")
            .unwrap_err();

        assert!(matches!(error, RegistrationError::EmptyJobId));
    }

    #[test]
    fn test_remove_if_exists_tolerates_unknown_id() {
        let manager = manager();
        manager
            .add_or_update("X", Report::build, "*/10 * * * * *")
            .unwrap();

        manager.remove_if_exists("X").unwrap();
        manager.remove_if_exists("X").unwrap();

        assert!(manager.recurring_job_ids().unwrap().is_empty());
    }

    #[test]
    fn test_register_recurring_jobs_logs_joined_ids() {
        let manager = manager();

        let (job_ids, logs) =
            capture_logs(|| register_recurring_jobs(&manager, report_schedule).unwrap());

        assert_eq!(job_ids, vec!["Archive", "Report build"]);
        assert!(logs.contains("Registered recurrent jobs: Archive, Report build"));
    }

    #[test]
    fn test_register_recurring_jobs_fails_when_storage_is_unavailable() {
        let storage = Arc::new(SwitchableStorage::default());
        storage.offline.store(true, Ordering::SeqCst);
        let manager = RecurringJobManager::new(storage.clone());

        let error = register_recurring_jobs(&manager, report_schedule).unwrap_err();

        assert!(matches!(
            error,
            RegistrationError::Storage(StorageError::Unavailable(_))
        ));
        assert!(storage.inner.recurring_jobs().unwrap().is_empty());
    }
}
