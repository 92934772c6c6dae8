use std::{any::type_name, fmt, future::Future, pin::Pin, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::{App, FromApp};

use super::{job_status::JobStatus, JobError};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
type JobExecutor = Arc<dyn Fn(&App) -> BoxFuture<'static, Result<(), JobError>> + Send + Sync>;

/// What a recurring job runs: a method on a service that is resolved from
/// the [`App`] registry each time the job fires.
#[derive(Clone)]
pub struct Invocation {
    service: &'static str,
    executor: JobExecutor,
}

impl Invocation {
    pub fn new<S, F, Fut>(method: F) -> Self
    where
        S: FromApp,
        F: Fn(S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        let method = Arc::new(method);
        let service = type_name::<S>();

        let executor: JobExecutor = Arc::new(
            move |app: &App| -> BoxFuture<'static, Result<(), JobError>> {
                let resolved = S::from_app(app);
                let method = Arc::clone(&method);
                Box::pin(async move {
                    let instance = resolved.map_err(|e| {
                        JobError::FailPermanently(format!("Failed to resolve {service}: {e}"))
                    })?;
                    method(instance).await
                })
            },
        );

        Self { service, executor }
    }

    /// Type name of the service the job resolves.
    pub const fn service(&self) -> &'static str {
        self.service
    }

    pub(crate) fn invoke(&self, app: &App) -> BoxFuture<'static, Result<(), JobError>> {
        (self.executor)(app)
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

/// A recurring job definition as held by a [`JobStorage`](super::JobStorage).
#[derive(Debug, Clone)]
pub struct RecurringJob {
    pub id: String,
    pub cron_expression: String,
    pub schedule: cron::Schedule,
    pub invocation: Invocation,
    pub created_at: DateTime<Utc>,
    pub next_execution: Option<DateTime<Utc>>,
    pub last_execution: Option<DateTime<Utc>>,
    pub last_job_state: Option<JobStatus>,
}

impl RecurringJob {
    pub fn new(
        id: String,
        cron_expression: String,
        schedule: cron::Schedule,
        invocation: Invocation,
        now: DateTime<Utc>,
    ) -> Self {
        let next_execution = schedule.after(&now).next();

        Self {
            id,
            cron_expression,
            schedule,
            invocation,
            created_at: now,
            next_execution,
            last_execution: None,
            last_job_state: None,
        }
    }

    pub fn to_dto(&self) -> RecurringJobDto {
        RecurringJobDto {
            id: self.id.clone(),
            cron: self.cron_expression.clone(),
            service: self.invocation.service(),
            created_at: self.created_at,
            next_execution: self.next_execution,
            last_execution: self.last_execution,
            last_job_state: self.last_job_state,
        }
    }
}

/// Read-only snapshot of a recurring job.
#[derive(Debug, Clone, Serialize)]
pub struct RecurringJobDto {
    pub id: String,
    pub cron: String,
    pub service: &'static str,
    pub created_at: DateTime<Utc>,
    pub next_execution: Option<DateTime<Utc>>,
    pub last_execution: Option<DateTime<Utc>>,
    pub last_job_state: Option<JobStatus>,
}

/// One execution of a recurring job handed from the scheduler to a worker.
#[derive(Debug, Clone)]
pub struct Firing {
    pub job_id: String,
    pub invocation: Invocation,
    pub attempt: u32,
}
