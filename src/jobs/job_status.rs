use serde::Serialize;
use strum::Display;

/// State of the most recent firing of a recurring job.
///
/// Typical lifecycle of one firing:
/// - `Running` → `Completed`
/// - `Running` → `Failed` (permanent failure, timeout or retries exhausted)
/// - `Running` → `PendingRetry` → `Running` → ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    /// A worker is executing the firing.
    Running,
    /// The firing asked to be retried and is waiting for its backoff delay.
    PendingRetry,
    /// The firing finished without errors.
    Completed,
    /// The firing failed and will not be retried.
    Failed,
}
