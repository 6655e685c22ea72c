//! Tracing subscriber setup.
//!
//! # 出力先
//! - stdout: non-blocking writer
//! - file: rolling appender（時間ベースのローテーション + 保持数）
//!
//! `RUST_LOG` が設定されていれば `logger.level` より優先する。

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LoggerConfig, Rotation};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the background log writers alive. Dropping it flushes and stops
/// them, so it must be held until the process exits.
pub struct LogGuard {
    _guards: Vec<WorkerGuard>,
}

/// Which sinks to write to. Falls back to stdout when both are disabled.
fn sinks(cfg: &LoggerConfig) -> (bool, bool) {
    if !cfg.log_to_stdout && !cfg.log_to_file {
        return (true, false);
    }
    (cfg.log_to_stdout, cfg.log_to_file)
}

fn rotation(rotation: Rotation) -> rolling::Rotation {
    match rotation {
        Rotation::Minutely => rolling::Rotation::MINUTELY,
        Rotation::Hourly => rolling::Rotation::HOURLY,
        Rotation::Daily => rolling::Rotation::DAILY,
        Rotation::Never => rolling::Rotation::NEVER,
    }
}

fn file_appender(cfg: &LoggerConfig) -> anyhow::Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(rotation(cfg.rotation))
        .filename_prefix(&cfg.file_prefix)
        .max_log_files(cfg.max_files.max(1))
        .build(Path::new(&cfg.log_dir))
        .with_context(|| format!("failed to open log directory {}", cfg.log_dir))
}

fn env_filter(cfg: &LoggerConfig) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&cfg.level)
            .with_context(|| format!("invalid log level {:?}", cfg.level)),
    }
}

/// Install the global subscriber.
///
/// `production` forces JSON output regardless of `cfg.json`.
pub fn init(cfg: &LoggerConfig, production: bool) -> anyhow::Result<LogGuard> {
    let json = cfg.json || production;
    let (to_stdout, to_file) = sinks(cfg);

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guards = Vec::new();

    if to_stdout {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
        guards.push(guard);
        let layer = fmt::layer().with_writer(writer).with_target(true);
        layers.push(if json {
            layer.json().boxed()
        } else {
            layer.boxed()
        });
    }

    if to_file {
        let (writer, guard) = tracing_appender::non_blocking(file_appender(cfg)?);
        guards.push(guard);
        // ファイルには ANSI エスケープを書かない
        let layer = fmt::layer().with_writer(writer).with_ansi(false);
        layers.push(if json {
            layer.json().boxed()
        } else {
            layer.boxed()
        });
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter(cfg)?)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(LogGuard { _guards: guards })
}
