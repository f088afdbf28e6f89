use std::fs;
use std::io::{self, Read, Write};

use rangestat::{run, run_source, summarize, ByteSource, Config, Error, FileSource, Output, Scheduler};
use tempfile::{NamedTempFile, TempDir};

const SCENARIO: &str = "Hamburg;12.0\nBulawayo;8.9\nHamburg;14.0\n";
const EXPECTED: &str = "Bulawayo=8.9/8.9/8.9\nHamburg=12.0/13.0/14.0\n";

fn input_file(contents: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    f.flush().unwrap();
    f
}

fn config(input: &NamedTempFile, dir: &TempDir, workers: usize) -> Config {
    Config {
        workers,
        input: input.path().to_path_buf(),
        output: Output::File(dir.path().join("output.txt")),
        scheduler: Scheduler::Threads,
        mmap: false,
    }
}

#[test]
fn scenario_with_any_partitioning() {
    let input = input_file(SCENARIO);
    let dir = TempDir::new().unwrap();
    for workers in 1..=8 {
        for scheduler in [Scheduler::Threads, Scheduler::Pool] {
            for mmap in [false, true] {
                let cfg = Config {
                    scheduler,
                    mmap,
                    ..config(&input, &dir, workers)
                };
                let summary = run(&cfg).unwrap();
                assert_eq!(summary.keys, 2);
                let got = fs::read_to_string(dir.path().join("output.txt")).unwrap();
                assert_eq!(got, EXPECTED, "{workers} workers, {scheduler:?}, mmap={mmap}");
            }
        }
    }
}

#[test]
fn unterminated_last_line_counts() {
    let input = input_file(SCENARIO.trim_end());
    let dir = TempDir::new().unwrap();
    run(&config(&input, &dir, 3)).unwrap();
    let got = fs::read_to_string(dir.path().join("output.txt")).unwrap();
    assert_eq!(got, EXPECTED);
}

#[test]
fn empty_file_gives_empty_report() {
    let input = input_file("");
    let dir = TempDir::new().unwrap();
    for mmap in [false, true] {
        let cfg = Config {
            mmap,
            ..config(&input, &dir, 4)
        };
        assert_eq!(run(&cfg).unwrap().keys, 0);
        assert_eq!(fs::read_to_string(dir.path().join("output.txt")).unwrap(), "");
    }
}

#[test]
fn malformed_lines_are_skipped() {
    let input = input_file("X\nX;abc\n\nTokyo;35.6\nX;inf\nAmsterdam;10.2\nZurich;9.1\n;\n");
    let dir = TempDir::new().unwrap();
    run(&config(&input, &dir, 2)).unwrap();
    let got = fs::read_to_string(dir.path().join("output.txt")).unwrap();
    assert_eq!(
        got,
        "Amsterdam=10.2/10.2/10.2\nTokyo=35.6/35.6/35.6\nZurich=9.1/9.1/9.1\n"
    );
}

#[test]
fn ceiling_rounding_is_visible_in_output() {
    let lines = summarize(b"k;2.449999\nn;-2.05\n".as_slice(), 1, Scheduler::Threads).unwrap();
    assert_eq!(lines, vec!["k=2.5/2.5/2.5", "n=-2.0/-2.0/-2.0"]);
}

#[test]
fn zero_workers_fails_without_touching_output() {
    let input = input_file(SCENARIO);
    let dir = TempDir::new().unwrap();
    let r = run(&config(&input, &dir, 0));
    assert!(matches!(r, Err(Error::Config(_))));
    assert!(!dir.path().join("output.txt").exists());
}

#[test]
fn missing_input_fails_without_touching_output() {
    let dir = TempDir::new().unwrap();
    let cfg = Config {
        workers: 2,
        input: dir.path().join("absent.txt"),
        output: Output::File(dir.path().join("output.txt")),
        scheduler: Scheduler::Pool,
        mmap: false,
    };
    assert!(matches!(run(&cfg), Err(Error::Path { .. })));
    assert!(!dir.path().join("output.txt").exists());
}

#[test]
fn repeated_runs_are_byte_identical() {
    let mut data = String::new();
    for i in 0..2000 {
        data.push_str(&format!("st{};{}.{}\n", i % 37, (i * 7919) % 199 - 99, i % 10));
    }
    let source = data.into_bytes();
    let first = summarize(&source, 7, Scheduler::Threads).unwrap();
    for _ in 0..5 {
        assert_eq!(summarize(&source, 7, Scheduler::Threads).unwrap(), first);
        assert_eq!(summarize(&source, 7, Scheduler::Pool).unwrap(), first);
    }
    assert_eq!(first.len(), 37);
}

#[test]
fn input_truncated_after_sizing_is_fatal() {
    let input = input_file("a;1.0\nb;2.0\nc;3.0\nd;4.0\n");
    let src = FileSource::open(input.path()).unwrap();
    input.as_file().set_len(6).unwrap();

    for scheduler in [Scheduler::Threads, Scheduler::Pool] {
        let r = summarize(&src, 2, scheduler);
        assert!(matches!(r, Err(Error::Range { .. })), "{scheduler:?}: {r:?}");
    }
}

/// In-memory input whose readers break after `fail_after` bytes.
struct Breaking {
    data: Vec<u8>,
    fail_after: usize,
}

struct BreakingReader<'a> {
    rest: &'a [u8],
    budget: usize,
}

impl Read for BreakingReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.budget == 0 && !self.rest.is_empty() {
            return Err(io::Error::other("device error"));
        }
        let n = buf.len().min(self.budget).min(self.rest.len());
        buf[..n].copy_from_slice(&self.rest[..n]);
        self.rest = &self.rest[n..];
        self.budget -= n;
        Ok(n)
    }
}

impl ByteSource for Breaking {
    type Reader<'a> = BreakingReader<'a>;

    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn open_at(&self, offset: u64) -> rangestat::Result<BreakingReader<'_>> {
        let start = (offset as usize).min(self.data.len());
        Ok(BreakingReader {
            rest: &self.data[start..],
            budget: self.fail_after.saturating_sub(start),
        })
    }
}

#[test]
fn read_failure_mid_partition_writes_nothing() {
    let data = SCENARIO.repeat(100).into_bytes();
    // late enough that partitioning succeeds, so the last worker hits it
    let src = Breaking {
        fail_after: data.len() - 10,
        data,
    };
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("output.txt");
    for scheduler in [Scheduler::Threads, Scheduler::Pool] {
        let cfg = Config {
            workers: 3,
            input: "in-memory".into(),
            output: Output::File(out.clone()),
            scheduler,
            mmap: false,
        };
        let r = run_source(&src, &cfg);
        assert!(matches!(r, Err(Error::Range { .. })), "{scheduler:?}: {r:?}");
        assert!(!out.exists());
    }
}
