//! Read-only, offset-addressable views of the input.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Take};
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::error::{Error, Result};
use crate::partition::ByteRange;

/// Input that can hand out independent readers starting at any offset.
///
/// Readers for disjoint ranges are used concurrently from different threads,
/// so implementations must not share a cursor between them.
pub trait ByteSource: Sync {
    type Reader<'a>: Read + Send
    where
        Self: 'a;

    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A reader positioned at `offset`, yielding bytes up to the end of input.
    fn open_at(&self, offset: u64) -> Result<Self::Reader<'_>>;

    /// A reader limited to exactly `range`.
    fn open_range(&self, range: ByteRange) -> Result<Take<Self::Reader<'_>>> {
        Ok(self.open_at(range.start)?.take(range.len()))
    }
}

impl ByteSource for [u8] {
    type Reader<'a> = &'a [u8];

    fn len(&self) -> u64 {
        <[u8]>::len(self) as u64
    }

    fn open_at(&self, offset: u64) -> Result<&[u8]> {
        let start = usize::try_from(offset).map_or(<[u8]>::len(self), |o| o.min(<[u8]>::len(self)));
        Ok(&self[start..])
    }
}

impl ByteSource for Vec<u8> {
    type Reader<'a> = &'a [u8];

    fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }

    fn open_at(&self, offset: u64) -> Result<&[u8]> {
        self.as_slice().open_at(offset)
    }
}

impl ByteSource for Mmap {
    type Reader<'a> = &'a [u8];

    fn len(&self) -> u64 {
        self[..].len() as u64
    }

    fn open_at(&self, offset: u64) -> Result<&[u8]> {
        self[..].open_at(offset)
    }
}

/// A file on disk, re-opened and seeked for every reader.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    len: u64,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let len = std::fs::metadata(&path)
            .map_err(Error::path(&path))?
            .len();
        Ok(FileSource { path, len })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    type Reader<'a> = File;

    fn len(&self) -> u64 {
        self.len
    }

    fn open_at(&self, offset: u64) -> Result<File> {
        let mut f = File::open(&self.path).map_err(Error::path(&self.path))?;
        f.seek(SeekFrom::Start(offset))
            .map_err(Error::path(&self.path))?;
        Ok(f)
    }
}

/// Maps `path` read-only.
pub fn map_file(path: impl AsRef<Path>) -> Result<Mmap> {
    let path = path.as_ref();
    let f = File::open(path).map_err(Error::path(path))?;
    // SAFETY: the mapping is read-only and the input is not modified while a
    // run is in progress.
    unsafe { Mmap::map(&f) }.map_err(Error::path(path))
}
