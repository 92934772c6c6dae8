//! Mammon - typed settings and recurring jobs
//!
//! Binds strongly-typed settings sections from configuration into an
//! explicit service registry, declares recurring cron jobs whose services
//! are resolved from that registry on every firing, and runs them on an
//! in-process background job server.

#![allow(missing_docs)]

pub mod app;
pub mod app_info;
pub mod boot;
pub mod cli;
pub mod commands;
pub mod config;
pub mod environment;
pub mod jobs;
pub mod kufar;
pub mod settings;
pub mod setup_tracing;

#[cfg(test)]
mod test_support;
