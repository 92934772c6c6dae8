use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::Config,
    environment::Environment,
    settings::{Settings, SettingsStore},
};

/// Service registry built once at startup and shared by everything that
/// needs configuration or bound settings.
#[derive(Clone, Debug)]
pub struct App {
    pub config: Config,
    pub environment: Environment,
    pub settings: SettingsStore,
}

impl App {
    #[must_use]
    pub const fn new(config: Config, environment: Environment, settings: SettingsStore) -> Self {
        Self {
            config,
            environment,
            settings,
        }
    }

    /// The bound instance of `T`.
    pub fn settings<T: Settings>(&self) -> Result<Arc<T>, ResolveError> {
        self.settings
            .get::<T>()
            .ok_or(ResolveError::SettingsNotRegistered(T::NAME))
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("No settings registered for '{0}'")]
    SettingsNotRegistered(&'static str),
}

/// A service built from the [`App`] registry.
///
/// Recurring jobs resolve their service through this trait on every firing,
/// so each firing works with a freshly built instance.
pub trait FromApp: Sized + Send + 'static {
    fn from_app(app: &App) -> Result<Self, ResolveError>;
}
