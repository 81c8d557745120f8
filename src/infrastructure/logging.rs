//! Logging system configuration and initialization
//!
//! - Console output on stderr (stdout carries the session report)
//! - Optional file output through a non-blocking appender
//! - Optional JSON formatting
//! - Local timestamps
//! - Verbose dependency logs suppressed unless the level is `trace`

#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use chrono::Local;
use lazy_static::lazy_static;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

// Keeps the file writer alive for the life of the process
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

const CRATE_TARGET: &str = "basarometer_core";

/// Dependency targets that stay quiet unless `trace` is requested
const QUIET_TARGETS: &[(&str, &str)] = &[
    ("reqwest", "info"),
    ("hyper", "warn"),
    ("hyper_util", "warn"),
    ("h2", "warn"),
    ("rustls", "warn"),
    ("selectors", "warn"),
    ("html5ever", "warn"),
    ("tokio", "info"),
    ("runtime", "warn"),
];

struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

/// Get the log directory relative to the executable location
pub fn get_log_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(std::path::Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    exe_dir.join("logs")
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Builds the filter from `RUST_LOG` when present, otherwise from the config
///
/// ```bash
/// # Show detailed HTTP logs
/// RUST_LOG="debug,reqwest=debug,hyper=debug" basarometer-scan
/// ```
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;

    if !config.level.to_lowercase().contains("trace") {
        for (target, level) in QUIET_TARGETS {
            filter = filter.add_directive(format!("{target}={level}").parse()?);
        }
        filter = filter.add_directive(format!("{CRATE_TARGET}={}", config.level).parse()?);
    }

    for (module, level) in &config.module_filters {
        filter = filter
            .add_directive(format!("{module}={level}").parse().map_err(|e| {
                anyhow!("Invalid module filter '{}={}': {}", module, level, e)
            })?);
    }

    Ok(filter)
}

/// Initialize logging with custom configuration
///
/// Calling it again after a subscriber is installed is a no-op.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    if !config.file_output && !config.console_output {
        return Err(anyhow!("No logging output configured"));
    }

    let env_filter = build_env_filter(config)?;
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let log_dir = config.log_dir.clone().unwrap_or_else(get_log_directory);
    if config.file_output {
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

        let file_appender = rolling::never(&log_dir, &config.file_name);
        let (file_writer, file_guard) = non_blocking(file_appender);
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow!("Log guard registry is poisoned"))?
            .push(file_guard);

        let file_layer = fmt::Layer::new()
            .with_writer(file_writer)
            .with_timer(LocalTimeFormatter)
            .with_ansi(false);
        if config.json_format {
            layers.push(
                file_layer
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .boxed(),
            );
        } else {
            layers.push(file_layer.with_target(false).boxed());
        }
    }

    if config.console_output {
        let console_layer = fmt::Layer::new()
            .with_writer(std::io::stderr)
            .with_timer(LocalTimeFormatter);
        if config.json_format {
            layers.push(console_layer.json().with_target(true).boxed());
        } else {
            layers.push(console_layer.with_target(false).boxed());
        }
    }

    let installed = Registry::default()
        .with(layers)
        .with(env_filter)
        .try_init()
        .is_ok();

    if installed {
        info!("Logging system initialized");
        info!("Log level: {}", config.level);
        debug!("JSON format: {}", config.json_format);
        debug!("Console output: {}", config.console_output);
        if config.file_output {
            info!("Log file: {:?}", log_dir.join(&config.file_name));
        }
        if config.level.to_lowercase().contains("trace") {
            info!("TRACE level active - dependency logs will be shown");
        }
    }

    Ok(())
}

/// Log system information for diagnostics
pub fn log_system_info() {
    info!("=== Basarometer scanner ===");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    info!("Architecture: {}", std::env::consts::ARCH);
    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.console_output);
        assert!(!config.file_output);
        assert!(!config.json_format);
    }

    #[test]
    fn test_env_filter_accepts_module_filters() {
        let config = LoggingConfig {
            module_filters: HashMap::from([("reqwest".to_string(), "error".to_string())]),
            ..LoggingConfig::default()
        };
        assert!(build_env_filter(&config).is_ok());
    }

    #[test]
    fn test_no_output_is_rejected() {
        let config = LoggingConfig {
            console_output: false,
            file_output: false,
            ..LoggingConfig::default()
        };
        assert!(init_logging_with_config(&config).is_err());
    }

    #[test]
    fn test_file_logging_writes_into_configured_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            console_output: false,
            file_output: true,
            log_dir: Some(dir.path().join("logs")),
            ..LoggingConfig::default()
        };

        init_logging_with_config(&config).unwrap();
        init_logging_with_config(&config).unwrap();
        assert!(dir.path().join("logs").exists());
    }

    #[test]
    fn test_log_directory_path() {
        assert!(get_log_directory().ends_with("logs"));
    }
}
