use std::fmt::{Display, Formatter, Result};

use crate::jobs::{job_status::JobStatus, JobError};

/// Outcome of a single firing.
pub enum JobResult {
    Completed,
    Failed(JobError),
    TimedOut,
}

impl JobResult {
    /// Whether the firing asked to run again later.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Failed(JobError::TryAgainLater(_)))
    }
}

impl Display for JobResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed(e) => write!(f, "error: {e}"),
            Self::TimedOut => write!(f, "timed out"),
        }
    }
}

impl From<&JobResult> for JobStatus {
    fn from(result: &JobResult) -> Self {
        match result {
            JobResult::Completed => Self::Completed,
            JobResult::Failed(_) | JobResult::TimedOut => Self::Failed,
        }
    }
}
