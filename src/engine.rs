//! Fan-out of partitions to workers and fan-in of their tables.
//!
//! Every worker owns one range and one table; nothing is shared between them
//! except the read-only source and a cancellation flag. Tables are only merged
//! once every worker has reported, and only if none of them failed.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crossbeam::channel;
use crossbeam::thread;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::aggregate::aggregate_range_until;
use crate::config::Scheduler;
use crate::error::{Error, Result};
use crate::partition::{partition, ByteRange};
use crate::reduce::{reduce, reduce_tree};
use crate::source::ByteSource;
use crate::stats::StatsTable;

/// Partitions `source` into `workers` ranges, aggregates them concurrently and
/// merges the results.
pub fn aggregate<S: ByteSource + ?Sized>(
    source: &S,
    workers: usize,
    scheduler: Scheduler,
) -> Result<StatsTable> {
    let start = Instant::now();
    let ranges = partition(source, workers)?;
    info!(
        bytes = source.len(),
        partitions = ranges.len(),
        ?scheduler,
        "partitioned input in {:?}",
        start.elapsed()
    );
    if ranges.is_empty() {
        return Ok(StatsTable::new());
    }

    let start = Instant::now();
    let table = match scheduler {
        Scheduler::Threads => run_threads(source, &ranges)?,
        Scheduler::Pool => run_pool(source, &ranges, workers)?,
    };
    info!(
        keys = table.len(),
        records = table.records(),
        "aggregated in {:?}",
        start.elapsed()
    );
    Ok(table)
}

fn run_threads<S: ByteSource + ?Sized>(source: &S, ranges: &[ByteRange]) -> Result<StatsTable> {
    let cancel = AtomicBool::new(false);
    let (tx, rx) = channel::unbounded::<(usize, Result<StatsTable>)>();

    let slots = thread::scope(|s| {
        for (i, &range) in ranges.iter().enumerate() {
            let tx = tx.clone();
            let cancel = &cancel;
            s.spawn(move |_| {
                let r = aggregate_range_until(source, range, cancel);
                if r.is_err() {
                    cancel.store(true, Ordering::Relaxed);
                }
                // the receiver lives until every worker has finished
                let _ = tx.send((i, r));
            });
        }
        drop(tx);

        // completion order is arbitrary; slot by partition index
        let mut slots: Vec<Option<Result<StatsTable>>> = ranges.iter().map(|_| None).collect();
        for (i, r) in rx.iter() {
            debug!(partition = i, ok = r.is_ok(), "partition reported");
            slots[i] = Some(r);
        }
        slots
    })
    .map_err(|p| Error::Worker(panic_message(&*p)))?;

    let tables = settle(slots.into_iter().map(|slot| {
        slot.unwrap_or_else(|| Err(Error::Worker("partition produced no result".into())))
    }))?;
    Ok(reduce(tables))
}

fn run_pool<S: ByteSource + ?Sized>(
    source: &S,
    ranges: &[ByteRange],
    workers: usize,
) -> Result<StatsTable> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("rangestat-{i}"))
        .build()
        .map_err(|e| Error::Config(format!("cannot build worker pool: {e}")))?;
    let cancel = AtomicBool::new(false);

    pool.install(|| {
        let results: Vec<Result<StatsTable>> = ranges
            .par_iter()
            .map(|&range| {
                let r = panic::catch_unwind(AssertUnwindSafe(|| {
                    aggregate_range_until(source, range, &cancel)
                }))
                .unwrap_or_else(|p| Err(Error::Worker(panic_message(&*p))));
                if r.is_err() {
                    cancel.store(true, Ordering::Relaxed);
                }
                r
            })
            .collect();
        Ok(reduce_tree(settle(results)?))
    })
}

/// Keeps the tables only if every partition succeeded. The first real failure
/// wins over cancellations it caused.
fn settle<I>(results: I) -> Result<Vec<StatsTable>>
where
    I: IntoIterator<Item = Result<StatsTable>>,
{
    let mut tables = Vec::new();
    let mut failure: Option<Error> = None;
    for r in results {
        match r {
            Ok(t) => tables.push(t),
            Err(e) => {
                let replace = match &failure {
                    None => true,
                    Some(Error::Cancelled) => !matches!(e, Error::Cancelled),
                    Some(_) => false,
                };
                if replace {
                    failure = Some(e);
                }
            }
        }
    }
    match failure {
        Some(e) => Err(e),
        None => Ok(tables),
    }
}

fn panic_message(p: &(dyn Any + Send)) -> String {
    if let Some(s) = p.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = p.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    const INPUT: &[u8] = b"Hamburg;12.0\nBulawayo;8.9\nHamburg;14.0\nOslo;-3.25\nOslo;1.5\nbad\n";

    #[test]
    fn every_worker_count_gives_the_same_table() {
        let expected = aggregate(INPUT, 1, Scheduler::Threads).unwrap();
        assert_eq!(expected.records(), 5);
        for workers in 1..12 {
            for scheduler in [Scheduler::Threads, Scheduler::Pool] {
                assert_eq!(
                    aggregate(INPUT, workers, scheduler).unwrap(),
                    expected,
                    "{workers} workers, {scheduler:?}"
                );
            }
        }
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let empty: &[u8] = b"";
        assert!(aggregate(empty, 4, Scheduler::Threads).unwrap().is_empty());
        assert!(aggregate(empty, 4, Scheduler::Pool).unwrap().is_empty());
    }

    #[test]
    fn zero_workers_rejected_before_partitioning() {
        assert!(matches!(
            aggregate(INPUT, 0, Scheduler::Threads),
            Err(Error::Config(_))
        ));
    }

    /// A source whose readers fail past a given offset.
    struct Flaky {
        data: Vec<u8>,
        fail_from: u64,
    }

    impl ByteSource for Flaky {
        type Reader<'a> = &'a [u8];

        fn len(&self) -> u64 {
            self.data.len() as u64
        }

        fn open_at(&self, offset: u64) -> Result<&[u8]> {
            if offset >= self.fail_from && offset > 0 {
                return Err(Error::Io(io::Error::other("gone")));
            }
            self.data.as_slice().open_at(offset)
        }
    }

    #[test]
    fn worker_io_failure_aborts_the_run() {
        let data = INPUT.repeat(50);
        let ranges = partition(data.as_slice(), 4).unwrap();
        let src = Flaky {
            fail_from: ranges[2].start,
            data,
        };
        let r = run_threads(&src, &ranges);
        assert!(matches!(r, Err(Error::Io(_))), "{r:?}");
        let r = run_pool(&src, &ranges, 4);
        assert!(matches!(r, Err(Error::Io(_))), "{r:?}");
    }

    #[test]
    fn real_error_beats_cancellation() {
        let results = vec![
            Ok(StatsTable::new()),
            Err(Error::Cancelled),
            Err(Error::Config("boom".into())),
            Err(Error::Cancelled),
        ];
        assert!(matches!(settle(results), Err(Error::Config(_))));

        let only_cancelled = vec![Ok(StatsTable::new()), Err(Error::Cancelled)];
        assert!(matches!(settle(only_cancelled), Err(Error::Cancelled)));
    }

    #[test]
    fn panic_payloads_are_readable() {
        let p = panic::catch_unwind(|| panic!("worker {} died", 3)).unwrap_err();
        assert_eq!(panic_message(&*p), "worker 3 died");
    }
}
