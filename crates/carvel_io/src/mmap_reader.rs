use carvel_core::{ByteSource, CoreError, Result};
use memmap2::Mmap;
use std::path::Path;

use crate::open_read_only;

pub struct MmapReader {
    mmap: Mmap,
    size: u64,
}

impl MmapReader {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let file = open_read_only(path.as_ref())?;
        let size = file.metadata()?.len();

        // Block devices report a zero length here; `Reader` falls back to
        // positional reads for them.
        if size == 0 {
            return Err(unmappable("source has no mappable length"));
        }

        // SAFETY: the mapping is read-only and the source is treated as evidence
        // that nothing else writes to while it is being carved.
        let mmap = unsafe { Mmap::map(&file) }?;

        if mmap.is_empty() {
            return Err(unmappable("mapping is empty"));
        }

        #[cfg(target_os = "linux")]
        {
            use memmap2::Advice;
            let _ = mmap.advise(Advice::Sequential);
        }

        Ok(Self { mmap, size })
    }

    /// Zero-copy view of `len` bytes at `offset`, clipped to the end of the mapping.
    #[inline]
    pub fn slice(&self, offset: u64, len: usize) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        if start >= self.mmap.len() {
            return None;
        }
        let end = start.saturating_add(len).min(self.mmap.len());
        Some(&self.mmap[start..end])
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }
}

fn unmappable(message: &str) -> CoreError {
    CoreError::SourceUnreadable(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        message.to_string(),
    ))
}

impl ByteSource for MmapReader {
    fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        if let Some(slice) = self.slice(offset, buffer.len()) {
            let len = slice.len();
            buffer[..len].copy_from_slice(slice);
            Ok(len)
        } else {
            Ok(0)
        }
    }

    fn size(&self) -> u64 {
        self.size
    }
}
