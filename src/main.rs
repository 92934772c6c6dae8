use std::process::ExitCode;

use mammon::{
    app_info::AppInfo,
    boot::{boot, BootConfig},
    kufar,
};

fn boot_config() -> BootConfig {
    let app_info = AppInfo::new(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_DESCRIPTION"),
    );

    BootConfig::new(app_info, kufar::known_settings(), kufar::register_jobs)
}

#[tokio::main]
async fn main() -> ExitCode {
    boot(boot_config()).await
}
