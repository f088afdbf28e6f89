use std::fmt;
use std::io::{self, BufRead, BufReader};

use tracing::trace;

use crate::error::{Error, Result};
use crate::source::ByteSource;

/// Half-open byte offsets `[start, end)` into the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end);
        ByteRange { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Upper bound on partitions, and so on worker threads.
pub const MAX_WORKERS: usize = 4096;

/// Splits `source` into `workers` line-aligned ranges covering every byte once.
///
/// Each naive boundary `i * (len / workers)` is moved to just past the next
/// `\n` at or after it, or to the end of the input if there is none. Trailing
/// ranges may be empty when there are fewer lines than workers. An empty input
/// yields no ranges at all.
pub fn partition<S: ByteSource + ?Sized>(source: &S, workers: usize) -> Result<Vec<ByteRange>> {
    if workers == 0 {
        return Err(Error::Config("worker count must be at least 1".into()));
    }
    if workers > MAX_WORKERS {
        return Err(Error::Config(format!(
            "worker count {workers} exceeds the maximum of {MAX_WORKERS}"
        )));
    }
    let total = source.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let n = workers as u64;
    let chunk = total / n;
    let mut line = Vec::with_capacity(128);
    let mut splits = Vec::with_capacity(workers + 1);
    splits.push(0);
    for pos in (1..n).map(|i| i * chunk) {
        // a boundary already past this candidate is reused, never re-aligned
        let prev = *splits.last().unwrap_or(&0);
        let split = if pos < prev {
            prev
        } else {
            next_line_start(source, pos, &mut line)?
        };
        trace!(candidate = pos, split, "aligned partition boundary");
        splits.push(split);
    }
    splits.push(total);

    Ok(splits
        .windows(2)
        .map(|w| ByteRange::new(w[0], w[1]))
        .collect())
}

/// Offset just past the first `\n` at or after `pos`, or the input length.
fn next_line_start<S: ByteSource + ?Sized>(source: &S, pos: u64, line: &mut Vec<u8>) -> Result<u64> {
    let total = source.len();
    if pos >= total {
        return Ok(total);
    }
    let mut reader = BufReader::new(source.open_at(pos)?);
    line.clear();
    let read = reader
        .read_until(b'\n', line)
        .map_err(Error::range(ByteRange::new(pos, total)))?;
    let end = pos + read as u64;
    if line.last() == Some(&b'\n') {
        Ok(end)
    } else if end < total {
        // the source shrank after it was sized
        Err(Error::Range {
            range: ByteRange::new(pos, total),
            source: io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("input ended at byte {end}"),
            ),
        })
    } else {
        Ok(total)
    }
}
