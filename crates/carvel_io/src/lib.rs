mod mmap_reader;
mod reader;

pub use mmap_reader::MmapReader;
pub use reader::DiskReader;

use carvel_core::{ByteSource, CoreError, Extraction, Extractor, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Opens a source for a scan: memory-mapped when possible, plain reads otherwise.
pub fn open_source(path: impl AsRef<Path>) -> Result<Reader> {
    Reader::new(path)
}

/// Extracts one byte range with its own short-lived handle.
///
/// Useful for re-reading a single carve after a scan has finished; the scan
/// itself should keep one [`Reader`] open instead.
pub fn extract_range(path: impl AsRef<Path>, offset: u64, length: u64) -> Result<Extraction> {
    let mut reader = DiskReader::new(path)?;
    Extractor::extract(&mut reader, offset, length)
}

pub(crate) fn open_read_only(path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(false)
        .open(path)
        .map_err(|e| {
            CoreError::SourceUnreadable(std::io::Error::new(
                e.kind(),
                format!("{}: {e}", path.display()),
            ))
        })
}

pub enum Reader {
    Mmap(MmapReader),
    Disk(DiskReader),
}

impl Reader {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        match MmapReader::new(path_ref) {
            Ok(r) => Ok(Reader::Mmap(r)),
            Err(e) => {
                tracing::debug!(
                    path = %path_ref.display(),
                    error = %e,
                    "memory map unavailable, falling back to positional reads"
                );
                Ok(Reader::Disk(DiskReader::new(path_ref)?))
            }
        }
    }

    #[inline]
    pub fn is_mmap(&self) -> bool {
        matches!(self, Reader::Mmap(_))
    }
}

impl ByteSource for Reader {
    fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        match self {
            Reader::Mmap(r) => r.read_at(offset, buffer),
            Reader::Disk(r) => r.read_at(offset, buffer),
        }
    }

    fn size(&self) -> u64 {
        match self {
            Reader::Mmap(r) => r.size(),
            Reader::Disk(r) => r.size(),
        }
    }
}
