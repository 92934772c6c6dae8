use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use thiserror::Error;

use super::{
    job_status::JobStatus,
    recurring_job::{Firing, RecurringJob, RecurringJobDto},
};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Job storage is unavailable: {0}")]
    Unavailable(String),
}

/// Backing store of the execution engine.
///
/// Holds recurring job definitions together with their schedule state.
/// Every method acts on one job atomically.
pub trait JobStorage: Send + Sync {
    /// Inserts `job`, or replaces the definition stored under the same id
    /// while keeping its creation time and execution history.
    fn add_or_update(&self, job: RecurringJob) -> Result<(), StorageError>;

    /// Removes the job stored under `job_id`; returns whether one existed.
    fn remove(&self, job_id: &str) -> Result<bool, StorageError>;

    /// Snapshots of all recurring jobs, ordered by id.
    fn recurring_jobs(&self) -> Result<Vec<RecurringJobDto>, StorageError>;

    /// Claims every job due at `now`: stamps its last execution and moves
    /// its next execution past `now`, so each due job is returned once.
    fn take_due_jobs(&self, now: DateTime<Utc>) -> Result<Vec<Firing>, StorageError>;

    /// Records the state of the latest firing of `job_id`. Unknown ids are
    /// ignored since the job may have been removed while running.
    fn record_state(&self, job_id: &str, state: JobStatus) -> Result<(), StorageError>;
}

/// In-process job storage. Definitions live as long as the process does.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    jobs: DashMap<String, RecurringJob>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStorage for MemoryStorage {
    fn add_or_update(&self, job: RecurringJob) -> Result<(), StorageError> {
        match self.jobs.entry(job.id.clone()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.cron_expression = job.cron_expression;
                existing.schedule = job.schedule;
                existing.invocation = job.invocation;
                existing.next_execution = job.next_execution;
            }
            Entry::Vacant(entry) => {
                entry.insert(job);
            }
        }
        Ok(())
    }

    fn remove(&self, job_id: &str) -> Result<bool, StorageError> {
        Ok(self.jobs.remove(job_id).is_some())
    }

    fn recurring_jobs(&self) -> Result<Vec<RecurringJobDto>, StorageError> {
        let mut jobs: Vec<_> = self.jobs.iter().map(|job| job.to_dto()).collect();
        jobs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(jobs)
    }

    fn take_due_jobs(&self, now: DateTime<Utc>) -> Result<Vec<Firing>, StorageError> {
        let mut due = Vec::new();

        for mut job in self.jobs.iter_mut() {
            if job.next_execution.is_some_and(|next| next <= now) {
                let next_execution = job.schedule.after(&now).next();
                job.last_execution = Some(now);
                job.next_execution = next_execution;
                due.push(Firing {
                    job_id: job.id.clone(),
                    invocation: job.invocation.clone(),
                    attempt: 0,
                });
            }
        }

        Ok(due)
    }

    fn record_state(&self, job_id: &str, state: JobStatus) -> Result<(), StorageError> {
        if let Some(mut job) = self.jobs.get_mut(job_id) {
            job.last_job_state = Some(state);
        }
        Ok(())
    }
}
