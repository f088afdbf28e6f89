use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::partition::MAX_WORKERS;

pub const DEFAULT_INPUT: &str = "testcase.txt";
pub const DEFAULT_OUTPUT: &str = "output.txt";

/// Twice the number of logical CPUs.
pub fn default_workers() -> usize {
    (2 * num_cpus::get().max(1)).min(MAX_WORKERS)
}

/// How partitions are fanned out to threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Scheduler {
    /// One scoped thread per partition, results collected over a channel.
    #[default]
    Threads,
    /// A dedicated rayon pool sized to the worker count, then a tree merge.
    Pool,
}

/// Where rendered lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

impl FromStr for Output {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(if s == "-" {
            Output::Stdout
        } else {
            Output::File(PathBuf::from(s))
        })
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Stdout => write!(f, "-"),
            Output::File(p) => write!(f, "{}", p.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Number of partitions, and of threads aggregating them.
    pub workers: usize,
    pub input: PathBuf,
    pub output: Output,
    pub scheduler: Scheduler,
    /// Memory-map the input instead of re-opening it per partition.
    pub mmap: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            workers: default_workers(),
            input: PathBuf::from(DEFAULT_INPUT),
            output: Output::File(PathBuf::from(DEFAULT_OUTPUT)),
            scheduler: Scheduler::default(),
            mmap: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::Config("worker count must be at least 1".into()));
        }
        if self.workers > MAX_WORKERS {
            return Err(Error::Config(format!(
                "worker count {} exceeds the maximum of {MAX_WORKERS}",
                self.workers
            )));
        }
        Ok(())
    }
}
