//! Per-key min/mean/max over large `key;value` files.
//!
//! The input is cut into line-aligned byte ranges, each range is folded into
//! its own table on its own thread, and the tables are merged once all of them
//! are in. The result is rendered as `key=MIN/MEAN/MAX` lines sorted by key.

use std::time::Instant;

use tracing::info;

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod output;
pub mod parse;
pub mod partition;
pub mod reduce;
pub mod source;
pub mod stats;

pub use config::{Config, Output, Scheduler};
pub use error::{Error, Result};
pub use partition::ByteRange;
pub use source::{ByteSource, FileSource};
pub use stats::{StatEntry, StatsTable};

/// Aggregates `source` with `workers` partitions and renders the sorted report
/// lines.
pub fn summarize<S: ByteSource + ?Sized>(
    source: &S,
    workers: usize,
    scheduler: Scheduler,
) -> Result<Vec<String>> {
    let table = engine::aggregate(source, workers, scheduler)?;
    Ok(format::format_table(&table))
}

/// What a finished run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub keys: usize,
}

/// Reads `config.input`, writes the report to `config.output`.
///
/// Nothing is written unless every partition was read successfully.
pub fn run(config: &Config) -> Result<Summary> {
    config.validate()?;
    let file = FileSource::open(&config.input)?;
    // empty files cannot be mapped
    if config.mmap && !file.is_empty() {
        let map = source::map_file(file.path())?;
        run_source(&map, config)
    } else {
        run_source(&file, config)
    }
}

/// Like [`run`], but reads from an already opened `source` instead of
/// `config.input`.
pub fn run_source<S: ByteSource + ?Sized>(source: &S, config: &Config) -> Result<Summary> {
    config.validate()?;
    let start = Instant::now();

    let lines = summarize(source, config.workers, config.scheduler)?;
    output::emit(&lines, &config.output)?;

    info!(
        input = %config.input.display(),
        output = %config.output,
        keys = lines.len(),
        "done in {:?}",
        start.elapsed()
    );
    Ok(Summary { keys: lines.len() })
}
