pub mod background_server;
pub mod job_result;
pub mod job_status;
pub mod recurring_job;
pub mod recurring_job_manager;
mod scheduler;
pub mod storage;
mod worker;

use thiserror::Error;

pub use background_server::BackgroundJobServer;
pub use recurring_job_manager::{
    register_recurring_jobs, JobSchedule, RecurringJobManager, RegistrationError,
};
pub use storage::{JobStorage, MemoryStorage, StorageError};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("{0}")]
    FailPermanently(String),
    #[error("{0}")]
    TryAgainLater(String),
}
