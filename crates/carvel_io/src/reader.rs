//! Positional reader for disk images and block devices.

use carvel_core::{ByteSource, Result};
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use crate::open_read_only;

/// A read-only byte source backed by a plain file handle.
///
/// `DiskReader` works for anything that can be opened and seeked:
/// - Disk image files (`.img`, `.raw`, `.dd`, memory dumps)
/// - Physical disk and partition devices (`/dev/sda`, `/dev/sda1`, ...)
/// - Empty files, which cannot be memory-mapped
///
/// # Example
///
/// ```ignore
/// use carvel_io::DiskReader;
/// use carvel_core::ByteSource;
///
/// let mut reader = DiskReader::new("evidence.dd")?;
/// let mut header = [0u8; 512];
/// let read = reader.read_at(0, &mut header)?;
/// ```
pub struct DiskReader {
    file: File,
    size: u64,
}

impl DiskReader {
    /// Opens `path` read-only and records its size.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = open_read_only(path.as_ref())?;

        #[cfg(target_os = "linux")]
        {
            use rustix::fs::{Advice, fadvise};

            let _ = fadvise(&file, 0, None, Advice::Sequential);
        }

        let size = file.seek(SeekFrom::End(0))?;
        file.seek(SeekFrom::Start(0))?;

        Ok(Self { file, size })
    }
}

impl ByteSource for DiskReader {
    fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        if offset >= self.size {
            return Ok(0);
        }

        self.file.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < buffer.len() {
            match self.file.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(read) => filled += read,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(filled)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
