//! # TRDB Server
//!
//! This is the main crate for the **TRDB** database server.
//!
//! The server is composed of multiple internal components organized under
//! the `/crates` directory of this workspace:
//!
//! - `/crates/storage/binary-helpers`: Shared alignment/endianness helpers.
//! - `/crates/storage/page`: The slotted-page format every on-disk page uses.
//! - `/crates/storage/file`: `FileManager` and its disk/in-memory backends.
//! - `/crates/storage/buffer`: The buffer pool pinning pages in memory.
//! - `/crates/storage/storage-api`: `StorageManager`, the facade the rest of
//!   the engine is built against.
//! - `/crates/storage/btree`: The B-tree index over `StorageManager`.
//!
//! This crate's own `config` and `engine_environment` modules wire those
//! pieces together for the `trdb` binary.

pub mod config;
pub mod engine_environment;

use std::error::Error;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the process-wide `tracing` subscriber: a compact console layer
/// plus a JSON-formatted daily-rolling file layer under `log_dir`. Returns
/// the file appender's worker guard, which must be held for the logging
/// pipeline to keep flushing — dropping it early truncates in-flight writes.
pub fn init_logging(log_dir: impl AsRef<Path>) -> Result<WorkerGuard, Box<dyn Error + Send + Sync>> {
    let file_appender = tracing_appender::rolling::daily(log_dir.as_ref(), "trdb.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_level(true)
        .compact();

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .json()
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
