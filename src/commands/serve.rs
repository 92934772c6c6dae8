use std::sync::Arc;

use tracing::{error, info};

use crate::{
    app::App,
    boot::BootError,
    jobs::{
        register_recurring_jobs, BackgroundJobServer, JobSchedule, JobStorage, MemoryStorage,
        RecurringJobManager,
    },
};

pub async fn handle_serve_command(app: App, job_schedule: JobSchedule) -> Result<(), BootError> {
    let storage: Arc<dyn JobStorage> = Arc::new(MemoryStorage::new());
    let manager = RecurringJobManager::new(Arc::clone(&storage));

    // Jobs must be declared before the engine starts firing them
    register_recurring_jobs(&manager, job_schedule)?;

    let server = BackgroundJobServer::start(&app.config.jobs, app.clone(), storage);

    info!("🏃 Running in {} until interrupted", app.environment);
    shutdown_signal().await;

    server.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("❌ Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("❌ Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
