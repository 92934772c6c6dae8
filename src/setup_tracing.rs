use time::format_description::parse;
use tracing_subscriber::fmt::time::OffsetTime;

use crate::cli::Commands;

pub fn setup_tracing_for_command(command: &Option<Commands>, server_log_level: &str) {
    // `version` and `jobs` print to stdout, so only problems are logged.
    // RUST_LOG overrides every default (e.g. RUST_LOG=debug).
    let default_level = match command {
        Some(Commands::Jobs { .. }) => "warn",
        Some(Commands::Version) => "error",
        Some(Commands::Serve) | None => server_log_level,
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let timer_format = parse("[hour]:[minute]:[second].[subsecond digits:2]")
        .expect("static time format is valid");

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_level(true)
        .with_ansi(true)
        .with_timer(OffsetTime::new(
            time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC),
            timer_format,
        ))
        .compact()
        .init();
}
