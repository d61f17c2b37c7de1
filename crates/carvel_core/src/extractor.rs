//! Exact-range reads from a byte source.

use crate::error::{CoreError, Result};
use crate::traits::ByteSource;

/// Bytes pulled from a source by [`Extractor::extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub data: Vec<u8>,
    /// Number of bytes the caller asked for.
    pub requested: u64,
    /// Set when the source ended before `requested` bytes could be read.
    pub incomplete: bool,
}

impl Extraction {
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

pub struct Extractor;

impl Extractor {
    /// Reads `length` bytes at `offset`.
    ///
    /// Running past the end of the source is not an error: the available
    /// bytes are returned with `incomplete` set. The buffer is sized from what
    /// the source can actually supply, so a bogus length from a corrupt header
    /// never turns into a huge allocation.
    pub fn extract(source: &mut dyn ByteSource, offset: u64, length: u64) -> Result<Extraction> {
        let available = source.size().saturating_sub(offset);
        let to_read = usize::try_from(length.min(available)).map_err(|_| {
            CoreError::SourceUnreadable(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("range of {length} bytes at offset {offset} exceeds addressable memory"),
            ))
        })?;

        let mut data = vec![0u8; to_read];
        let filled = fill(source, offset, &mut data)?;
        data.truncate(filled);

        Ok(Extraction {
            incomplete: (filled as u64) < length,
            requested: length,
            data,
        })
    }

    /// Reads a fixed-size field at `offset`, or `None` if the source ends first.
    pub fn read_array<const N: usize>(
        source: &mut dyn ByteSource,
        offset: u64,
    ) -> Result<Option<[u8; N]>> {
        let mut field = [0u8; N];
        if fill(source, offset, &mut field)? < N {
            return Ok(None);
        }
        Ok(Some(field))
    }
}

pub(crate) fn fill(source: &mut dyn ByteSource, offset: u64, buffer: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        let read = source.read_at(offset + filled as u64, &mut buffer[filled..])?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSource;

    impl ByteSource for FailingSource {
        fn read_at(&mut self, _offset: u64, _buffer: &mut [u8]) -> Result<usize> {
            Err(std::io::Error::other("device went away").into())
        }

        fn size(&self) -> u64 {
            1024
        }
    }

    /// Hands out at most three bytes per call, like a slow pipe.
    struct TrickleSource(Vec<u8>);

    impl ByteSource for TrickleSource {
        fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
            let cap = buffer.len().min(3);
            self.0.read_at(offset, &mut buffer[..cap])
        }

        fn size(&self) -> u64 {
            self.0.len() as u64
        }
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn extract_exact_range() {
        let data = pattern(512);
        let mut source = data.as_slice();
        let extraction = Extractor::extract(&mut source, 100, 50).unwrap();
        assert!(!extraction.incomplete);
        assert_eq!(extraction.requested, 50);
        assert_eq!(extraction.data, &data[100..150]);
    }

    #[test]
    fn extract_flags_short_source() {
        let data = pattern(4050);
        let mut source = data.as_slice();
        let extraction = Extractor::extract(&mut source, 100, 4000).unwrap();
        assert!(extraction.incomplete);
        assert_eq!(extraction.len(), 3950);
        assert_eq!(extraction.data, &data[100..]);
    }

    #[test]
    fn extract_past_end_is_empty_and_incomplete() {
        let mut source: &[u8] = b"tiny";
        let extraction = Extractor::extract(&mut source, 10, 8).unwrap();
        assert!(extraction.is_empty());
        assert!(extraction.incomplete);
    }

    #[test]
    fn extract_huge_length_only_allocates_available() {
        let data = pattern(64);
        let mut source = data.as_slice();
        let extraction = Extractor::extract(&mut source, 0, u64::from(u32::MAX)).unwrap();
        assert_eq!(extraction.len(), 64);
        assert!(extraction.incomplete);
    }

    #[test]
    fn extract_surfaces_read_failure() {
        let result = Extractor::extract(&mut FailingSource, 0, 16);
        assert!(matches!(result, Err(CoreError::SourceUnreadable(_))));
    }

    #[test]
    fn extract_keeps_reading_after_partial_reads() {
        let data = pattern(40);
        let mut source = TrickleSource(data.clone());
        let extraction = Extractor::extract(&mut source, 5, 20).unwrap();
        assert!(!extraction.incomplete);
        assert_eq!(extraction.data, &data[5..25]);
    }

    #[test]
    fn read_array_returns_none_when_truncated() {
        let mut source: &[u8] = &[1, 2, 3, 4, 5];
        assert_eq!(Extractor::read_array::<4>(&mut source, 1).unwrap(), Some([2, 3, 4, 5]));
        assert_eq!(Extractor::read_array::<4>(&mut source, 2).unwrap(), None);
    }
}
