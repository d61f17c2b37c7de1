//! Windows prefetch (`.pf`) carving.
//!
//! Uncompressed prefetch files share a common header:
//!
//! | offset | size | field                         |
//! |--------|------|-------------------------------|
//! | 0      | 4    | format version                |
//! | 4      | 4    | `SCCA` magic                  |
//! | 8      | 4    | unknown                       |
//! | 12     | 4    | file size, little-endian      |
//!
//! The scanner looks for `SCCA` and steps back to the version field.

use crate::error::Result;
use crate::extractor::Extractor;
use crate::traits::{ByteSource, FileTypeDescriptor};

pub const PREFETCH_SIGNATURE: [u8; 4] = *b"SCCA";

pub const PREFETCH_SIGNATURE_OFFSET: u64 = 4;

pub const PREFETCH_SIZE_OFFSET: u64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchVersion {
    WindowsXp,
    WindowsVista7,
    Windows8,
    Windows10,
}

impl PrefetchVersion {
    pub const ALL: [Self; 4] = [
        Self::WindowsXp,
        Self::WindowsVista7,
        Self::Windows8,
        Self::Windows10,
    ];

    #[must_use]
    pub const fn magic(&self) -> [u8; 4] {
        match self {
            Self::WindowsXp => [0x11, 0x00, 0x00, 0x00],
            Self::WindowsVista7 => [0x17, 0x00, 0x00, 0x00],
            Self::Windows8 => [0x1A, 0x00, 0x00, 0x00],
            Self::Windows10 => [0x1E, 0x00, 0x00, 0x00],
        }
    }

    #[must_use]
    pub fn from_magic(bytes: [u8; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.magic() == bytes)
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::WindowsXp => "Windows XP",
            Self::WindowsVista7 => "Windows Vista/7",
            Self::Windows8 => "Windows 8",
            Self::Windows10 => "Windows 10",
        }
    }
}

impl std::fmt::Display for PrefetchVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Decodes the stored size field.
///
/// The field is little-endian on disk: the bytes are reversed and then read as
/// a big-endian integer, so `00 10 00 00` is 4096.
#[must_use]
pub fn decode_size(field: [u8; 4]) -> u64 {
    let mut reversed = field;
    reversed.reverse();
    u64::from(u32::from_be_bytes(reversed))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PrefetchFormat;

impl PrefetchFormat {
    pub fn version(
        &self,
        source: &mut dyn ByteSource,
        start: u64,
    ) -> Result<Option<PrefetchVersion>> {
        Ok(Extractor::read_array::<4>(source, start)?.and_then(PrefetchVersion::from_magic))
    }
}

impl FileTypeDescriptor for PrefetchFormat {
    fn name(&self) -> &str {
        "prefetch"
    }

    fn extension(&self) -> &str {
        "pf"
    }

    fn signature(&self) -> &[u8] {
        &PREFETCH_SIGNATURE
    }

    fn offset_adjustment(&self) -> i64 {
        -(PREFETCH_SIGNATURE_OFFSET as i64)
    }

    fn validate(&self, source: &mut dyn ByteSource, start: u64) -> Result<bool> {
        Ok(self.version(source, start)?.is_some())
    }

    fn resolve_size(&self, source: &mut dyn ByteSource, start: u64) -> Result<u64> {
        Ok(Extractor::read_array::<4>(source, start + PREFETCH_SIZE_OFFSET)?
            .map(decode_size)
            .unwrap_or(0))
    }
}
