use std::{env, path::Path, process::ExitCode, str::FromStr as _};

use clap::Parser as _;
use config_rs::{Config as ConfigRs, ConfigError};
use thiserror::Error;
use tracing::{debug, error, trace};

use crate::{
    app::App,
    app_info::AppInfo,
    cli::{Cli, Commands},
    commands::{jobs, serve, version},
    config::{Config, TracingConfig},
    environment::Environment,
    jobs::{JobSchedule, RegistrationError},
    settings::SettingsRegistrar,
    setup_tracing::setup_tracing_for_command,
};

const ENVIRONMENT_VARIABLE: &str = "MAMMON_ENVIRONMENT";
const ENVIRONMENT_PREFIX: &str = "MAMMON";
const SETTINGS_FILE: &str = "appsettings";

/// Configuration for bootstrapping the application.
///
/// Names the binary, the settings types it binds and the recurring jobs it
/// declares.
pub struct BootConfig {
    pub app_info: AppInfo,
    pub settings: SettingsRegistrar,
    pub job_schedule: JobSchedule,
}

impl BootConfig {
    #[must_use]
    pub const fn new(
        app_info: AppInfo,
        settings: SettingsRegistrar,
        job_schedule: JobSchedule,
    ) -> Self {
        Self {
            app_info,
            settings,
            job_schedule,
        }
    }
}

#[derive(Debug, Error)]
pub enum BootError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to register recurring jobs: {0}")]
    Registration(#[from] RegistrationError),
    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

pub async fn boot(config: BootConfig) -> ExitCode {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Version)) {
        version::print_version_info(config.app_info);
        return ExitCode::SUCCESS;
    }

    let environment = set_environment();

    let (source, app_config) = match read_config(&cli.config_dir, environment, ENVIRONMENT_PREFIX)
    {
        Ok(loaded) => loaded,
        Err(e) => {
            setup_tracing_for_command(&cli.command, &TracingConfig::default().log_level);
            error!("❌ {}", BootError::from(e));
            return ExitCode::FAILURE;
        }
    };

    setup_tracing_for_command(&cli.command, &app_config.tracing.log_level);

    debug!("Environment set to: {:?}", environment);
    trace!("Configuration loaded: {:?}", app_config);

    let settings = config.settings.bind(&source);
    let app = App::new(app_config, environment, settings);

    match handle_command(cli, app, config.job_schedule, config.app_info).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ Startup failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[must_use]
pub fn set_environment() -> Environment {
    env::var(ENVIRONMENT_VARIABLE)
        .ok()
        .and_then(|s| Environment::from_str(&s).ok())
        .unwrap_or_default()
}

/// Builds the configuration source and the host [`Config`] read from it.
///
/// Layers, later ones winning: `{config_dir}/appsettings.*` (required),
/// `{config_dir}/appsettings.{environment}.*` (optional), then environment
/// variables such as `MAMMON__KUFARSETTINGS__BASE_API_URL`.
pub fn read_config(
    config_dir: &Path,
    environment: Environment,
    env_prefix: &str,
) -> Result<(ConfigRs, Config), ConfigError> {
    let base_file = config_dir.join(SETTINGS_FILE);
    let environment_file = config_dir.join(format!("{SETTINGS_FILE}.{environment}"));

    trace!(
        "Reading configuration from: {} and {}",
        base_file.display(),
        environment_file.display()
    );

    let source = ConfigRs::builder()
        .add_source(config_rs::File::with_name(&base_file.to_string_lossy()))
        .add_source(config_rs::File::with_name(&environment_file.to_string_lossy()).required(false))
        .add_source(
            config_rs::Environment::with_prefix(env_prefix)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    let app_config = source.clone().try_deserialize()?;
    Ok((source, app_config))
}

pub async fn handle_command(
    cli: Cli,
    app: App,
    job_schedule: JobSchedule,
    app_info: AppInfo,
) -> Result<(), BootError> {
    match cli.command {
        Some(Commands::Jobs { json }) => jobs::handle_jobs_command(job_schedule, json),
        Some(Commands::Version) => {
            version::print_version_info(app_info);
            Ok(())
        }
        Some(Commands::Serve) | None => serve::handle_serve_command(app, job_schedule).await,
    }
}
