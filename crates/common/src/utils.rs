use std::panic;

use tracing::{error, warn};
use tracing_appender::{non_blocking::WorkerGuard, rolling::Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::LoggingConfig;

pub fn init_tracing_log(config: &LoggingConfig) -> WorkerGuard {
    let format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_thread_ids(false)
        .with_target(true)
        .compact();

    let rust_log = std::env::var("RUST_LOG").ok();
    let (log_level, invalid_level) = match parse_log_level(rust_log.as_deref()) {
        Ok(level) => (level, None),
        Err(raw) => (tracing::Level::INFO, Some(raw)),
    };

    let guard = match config {
        LoggingConfig::Console => {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
            let layer = tracing_subscriber::fmt::layer()
                .event_format(format)
                .with_writer(writer)
                .with_filter(get_crate_filter(log_level));

            tracing_subscriber::registry().with(layer).init();
            guard
        }

        LoggingConfig::File { dir_path, file_name } => {
            let file_appender = tracing_appender::rolling::Builder::new()
                .filename_prefix(file_name)
                .max_log_files(14)
                .rotation(Rotation::DAILY)
                .build(dir_path)
                .expect("failed to create file log appender");

            let (writer, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .event_format(format)
                .with_writer(writer)
                .with_filter(get_crate_filter(log_level));

            tracing_subscriber::registry().with(file_layer).init();
            guard
        }
    };

    if let Some(raw) = invalid_level {
        warn!(rust_log = %raw, "invalid RUST_LOG, expected a level such as 'info', using info");
    }

    guard
}

/// `RUST_LOG` holds a single level. An unparseable value is returned as the error.
fn parse_log_level(value: Option<&str>) -> Result<tracing::Level, String> {
    match value {
        None => Ok(tracing::Level::INFO),
        Some(raw) => raw.trim().parse().map_err(|_| raw.to_string()),
    }
}

const CRATES: &[&str] = &["beacon", "common"];

fn get_crate_filter(crates_level: tracing::Level) -> EnvFilter {
    let mut env_filter = EnvFilter::new("info");

    for crate_name in CRATES {
        if let Ok(directive) = format!("stakeops_{crate_name}={crates_level}").parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }
    if let Ok(directive) = format!("stakeops={crates_level}").parse() {
        env_filter = env_filter.add_directive(directive);
    }

    env_filter
}

pub fn init_panic_hook() {
    panic::set_hook(Box::new(move |info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        let crash_log = format!("Panic: {info}\nFull backtrace:\n{backtrace}\n");

        error!("{crash_log}");
        eprintln!("{crash_log}");
    }));
}
