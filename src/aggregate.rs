use std::io::{self, BufRead, BufReader, Read};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::error::{Error, Result};
use crate::parse::records;
use crate::partition::ByteRange;
use crate::source::ByteSource;
use crate::stats::StatsTable;

/// Read buffer per partition.
pub const BUF_CAPACITY: usize = 2 * 1024 * 1024;

const TABLE_CAPACITY: usize = 1000;

/// Summarizes every record in `range` of `source`.
pub fn aggregate_range<S: ByteSource + ?Sized>(source: &S, range: ByteRange) -> Result<StatsTable> {
    aggregate_range_until(source, range, &AtomicBool::new(false))
}

/// Like [`aggregate_range`], but gives up with [`Error::Cancelled`] once
/// `cancel` is set. The flag is checked between buffer refills.
pub fn aggregate_range_until<S: ByteSource + ?Sized>(
    source: &S,
    range: ByteRange,
    cancel: &AtomicBool,
) -> Result<StatsTable> {
    if range.is_empty() {
        return Ok(StatsTable::new());
    }
    let reader = source.open_range(range)?;
    let reader = BufReader::with_capacity(BUF_CAPACITY, reader);
    let (table, read) = produce_table(reader, cancel).map_err(|e| match e {
        Error::Io(source) => Error::Range { range, source },
        e => e,
    })?;
    if read < range.len() {
        // the source shrank after it was partitioned
        return Err(Error::Range {
            range,
            source: io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("range ended after {read} bytes"),
            ),
        });
    }
    debug!(%range, keys = table.len(), records = table.records(), "partition done");
    Ok(table)
}

/// Folds a line-aligned stream into a table, returning it with the number of
/// bytes read.
///
/// Buffer refills split lines arbitrarily, so the tail of one buffer is
/// stashed and completed from the head of the next.
pub fn produce_table<T: Read>(
    mut reader: BufReader<T>,
    cancel: &AtomicBool,
) -> Result<(StatsTable, u64)> {
    let mut table = StatsTable::with_capacity(TABLE_CAPACITY);
    let mut stash = Vec::with_capacity(128);
    let mut read = 0u64;

    loop {
        if cancel.load(Ordering::Relaxed) {
            return Err(Error::Cancelled);
        }
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            break;
        }

        let consumed = if !stash.is_empty() {
            // finish the line carried over from the last buffer
            match buf.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    stash.extend_from_slice(&buf[..end]);
                    table.extend(records(&stash));
                    stash.clear();
                    end + 1
                }
                None => {
                    stash.extend_from_slice(buf);
                    buf.len()
                }
            }
        } else {
            match buf.iter().rposition(|&b| b == b'\n') {
                Some(last) => {
                    table.extend(records(&buf[..last]));
                    last + 1
                }
                None => {
                    stash.extend_from_slice(buf);
                    buf.len()
                }
            }
        };
        reader.consume(consumed);
        read += consumed as u64;
    }

    // unterminated final line
    table.extend(records(&stash));
    Ok((table, read))
}
