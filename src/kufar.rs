use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    app::{App, FromApp, ResolveError},
    jobs::{JobError, RecurringJobManager, RegistrationError},
    settings::SettingsRegistrar,
};

pub const FETCH_JOB_ID: &str = "Kufar fetch";
pub const FETCH_SCHEDULE: &str = "*/10 * * * * *";

/// Connection settings for the Kufar marketplace API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KufarSettings {
    #[serde(alias = "BaseApiUrl")]
    pub base_api_url: String,
}

crate::settings!(KufarSettings);

/// Fetches listings from Kufar. Built fresh for every firing of the fetch job.
#[derive(Debug)]
pub struct KufarFetcher {
    settings: Arc<KufarSettings>,
}

impl FromApp for KufarFetcher {
    fn from_app(app: &App) -> Result<Self, ResolveError> {
        Ok(Self {
            settings: app.settings::<KufarSettings>()?,
        })
    }
}

impl KufarFetcher {
    pub async fn fetch(self) -> Result<(), JobError> {
        info!("Base url: {}", self.settings.base_api_url);
        Ok(())
    }
}

/// Every settings type the application binds at startup.
pub fn known_settings() -> SettingsRegistrar {
    let mut registrar = SettingsRegistrar::new();
    registrar.register::<KufarSettings>();
    registrar
}

/// The application's recurring jobs.
pub fn register_jobs(manager: &RecurringJobManager) -> Result<(), RegistrationError> {
    manager.add_or_update(FETCH_JOB_ID, KufarFetcher::fetch, FETCH_SCHEDULE)
}
