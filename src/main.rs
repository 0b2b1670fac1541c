use kestrel_particle_probe::app::{run_with_config, DEFAULT_CONFIG_PATH};
use kestrel_particle_probe::cli::CliOverrides;
use kestrel_particle_probe::config::AppConfig;
use std::path::PathBuf;

fn main() {
    let cli = match CliOverrides::parse_from_env() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("[cli] {err}");
            std::process::exit(2);
        }
    };
    let path = cli.config_path().cloned().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let loaded = AppConfig::load(&path);
    let filter = loaded.as_ref().map(|cfg| cfg.probe.log_filter.clone()).unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let mut config = loaded.unwrap_or_else(|err| {
        log::warn!("Config load error: {err:?}. Falling back to defaults.");
        AppConfig::default()
    });
    let overrides = cli.into_config_overrides();
    if !overrides.is_empty() {
        log::info!("CLI overrides: {}", overrides.applied_fields().join(", "));
    }
    config.apply_overrides(&overrides);

    match run_with_config(config) {
        Ok(summary) => println!("{summary}"),
        Err(err) => {
            log::error!("Application error: {err:?}");
            std::process::exit(1);
        }
    }
}
