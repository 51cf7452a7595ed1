//! Logging Infrastructure
//!
//! `RUST_LOG` overrides the configured level. With `LOG_DIR` set, output goes
//! to a daily rolling file instead of stdout.

use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::config::Config;

pub fn init_logger(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_target(false);

    let appender = config.log_dir.as_deref().and_then(|dir| {
        let path = Path::new(dir);
        std::fs::create_dir_all(path).ok()?;
        Some(tracing_appender::rolling::daily(path, "order-server"))
    });

    match (config.log_json, appender) {
        (true, Some(file)) => builder.json().with_ansi(false).with_writer(file).init(),
        (true, None) => builder.json().init(),
        (false, Some(file)) => builder.with_ansi(false).with_writer(file).init(),
        (false, None) => builder.init(),
    }
}
