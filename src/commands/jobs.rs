use std::sync::Arc;

use crate::{
    boot::BootError,
    jobs::{
        recurring_job::RecurringJobDto, register_recurring_jobs, JobSchedule, MemoryStorage,
        RecurringJobManager,
    },
};

/// Registers the application's jobs against a scratch storage and prints them.
pub fn handle_jobs_command(job_schedule: JobSchedule, json: bool) -> Result<(), BootError> {
    let manager = RecurringJobManager::new(Arc::new(MemoryStorage::new()));
    register_recurring_jobs(&manager, job_schedule)?;

    let jobs = manager.recurring_jobs()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
        return Ok(());
    }

    println!("📋 {} recurring job(s)", jobs.len());
    for job in &jobs {
        println!("{}", format_job_line(job));
    }

    Ok(())
}

fn format_job_line(job: &RecurringJobDto) -> String {
    let next = job.next_execution.map_or_else(
        || "never".to_string(),
        |next| next.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );

    format!(
        "  {}  [{}]  {}  next: {}",
        job.id, job.cron, job.service, next
    )
}
