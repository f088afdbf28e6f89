use std::path::PathBuf;

use thiserror::Error;

use crate::partition::ByteRange;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error on {}: {source}", path.display())]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error reading bytes {range}: {source}")]
    Range {
        range: ByteRange,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Worker thread panicked: {0}")]
    Worker(String),

    #[error("Run cancelled after another partition failed")]
    Cancelled,
}

impl Error {
    pub(crate) fn path(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Error::Path { path, source }
    }

    pub(crate) fn range(range: ByteRange) -> impl FnOnce(std::io::Error) -> Self {
        move |source| Error::Range { range, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
