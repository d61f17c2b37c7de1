//! Core traits defining the interfaces for byte sources and file type descriptors.
//!
//! These traits follow the Ports & Adapters pattern: the scanner only ever
//! talks to a `ByteSource` and a set of `FileTypeDescriptor`s, so new storage
//! backends and new formats plug in without touching the scan loop.

use crate::error::Result;
use crate::extractor::{Extraction, Extractor};

/// A read-only source of raw bytes, typically a disk image or memory dump.
///
/// The scanner holds a single `ByteSource` for the duration of a scan and
/// issues positional reads against it. Implementations never mutate the
/// underlying data.
///
/// # Example
///
/// ```ignore
/// struct ImageFile { /* ... */ }
///
/// impl ByteSource for ImageFile {
///     fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
///         // Positional read from the image
///     }
///
///     fn size(&self) -> u64 {
///         // Total size in bytes
///     }
/// }
/// ```
pub trait ByteSource {
    /// Reads bytes starting at `offset` into `buffer`.
    ///
    /// Returns the number of bytes read. A short count is only allowed when
    /// the end of the source is reached; offsets at or past the end return 0.
    fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize>;

    /// Returns the total size of the source in bytes.
    fn size(&self) -> u64;
}

impl ByteSource for &[u8] {
    fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        Ok(copy_from_slice(self, offset, buffer))
    }

    fn size(&self) -> u64 {
        self.len() as u64
    }
}

impl ByteSource for Vec<u8> {
    fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        Ok(copy_from_slice(self, offset, buffer))
    }

    fn size(&self) -> u64 {
        self.len() as u64
    }
}

fn copy_from_slice(data: &[u8], offset: u64, buffer: &mut [u8]) -> usize {
    let Ok(start) = usize::try_from(offset) else {
        return 0;
    };
    if start >= data.len() {
        return 0;
    }
    let len = buffer.len().min(data.len() - start);
    buffer[..len].copy_from_slice(&data[start..start + len]);
    len
}

/// Capability contract implemented by every carvable file format.
///
/// A descriptor is registered once into a [`TypeRegistry`](crate::TypeRegistry)
/// and then consulted by the scanner whenever its signature matches. The
/// scanner computes the format's true start as
/// `match_offset + offset_adjustment()` and passes that position to
/// `validate`, `resolve_size` and `extract`.
///
/// Implementations must be `Send + Sync` so a registry can be shared between
/// threads.
pub trait FileTypeDescriptor: Send + Sync {
    /// Unique registry key for this format.
    fn name(&self) -> &str;

    /// Suggested extension for persisted carves, without the leading dot.
    fn extension(&self) -> &str;

    /// The fixed byte sequence that identifies a candidate.
    fn signature(&self) -> &[u8];

    /// Distance from the signature match to the format's true start.
    fn offset_adjustment(&self) -> i64 {
        0
    }

    /// Format-specific check run after a signature hit.
    ///
    /// Returning `false` rejects the candidate; it is not an error.
    fn validate(&self, source: &mut dyn ByteSource, start: u64) -> Result<bool>;

    /// Determines the size of the file starting at `start`.
    ///
    /// A size of zero rejects the candidate.
    fn resolve_size(&self, source: &mut dyn ByteSource, start: u64) -> Result<u64>;

    /// Pulls the carved bytes out of the source.
    fn extract(
        &self,
        source: &mut dyn ByteSource,
        start: u64,
        size: u64,
    ) -> Result<Extraction> {
        Extractor::extract(source, start, size)
    }
}
