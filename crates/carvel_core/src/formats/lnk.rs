//! Windows shell link (`.lnk`) carving.
//!
//! A shell link starts with its header size (`0x4C`, little-endian u32)
//! followed by the 16-byte shell link class identifier
//! `00021401-0000-0000-C000-000000000046`.

use crate::error::Result;
use crate::extractor::Extractor;
use crate::traits::{ByteSource, FileTypeDescriptor};

pub const LNK_SIGNATURE: [u8; 4] = [0x4C, 0x00, 0x00, 0x00];

pub const LNK_CLASS_ID: [u8; 16] = [
    0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46,
];

/// Fixed carve size. The header's link target and string sections are not
/// walked, so this is an approximation that over-reads most shortcuts.
pub const LNK_CARVE_SIZE: u64 = 4000;

#[derive(Debug, Clone, Copy, Default)]
pub struct LinkFormat;

impl FileTypeDescriptor for LinkFormat {
    fn name(&self) -> &str {
        "lnk"
    }

    fn extension(&self) -> &str {
        "lnk"
    }

    fn signature(&self) -> &[u8] {
        &LNK_SIGNATURE
    }

    fn validate(&self, source: &mut dyn ByteSource, start: u64) -> Result<bool> {
        let class_id = Extractor::read_array::<16>(source, start + LNK_SIGNATURE.len() as u64)?;
        Ok(class_id == Some(LNK_CLASS_ID))
    }

    fn resolve_size(&self, _source: &mut dyn ByteSource, _start: u64) -> Result<u64> {
        Ok(LNK_CARVE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<u8> {
        [&LNK_SIGNATURE[..], &LNK_CLASS_ID[..]].concat()
    }

    #[test]
    fn validates_class_id() {
        let mut data = vec![0xAA; 8];
        data.extend_from_slice(&header());
        let mut source = data.as_slice();
        assert!(LinkFormat.validate(&mut source, 8).unwrap());
    }

    #[test]
    fn rejects_wrong_class_id() {
        let mut data = header();
        data[19] = 0x47;
        let mut source = data.as_slice();
        assert!(!LinkFormat.validate(&mut source, 0).unwrap());
    }

    #[test]
    fn rejects_truncated_class_id() {
        let data = header();
        let mut source = &data[..12];
        assert!(!LinkFormat.validate(&mut source, 0).unwrap());
    }

    #[test]
    fn size_is_fixed() {
        let mut source: &[u8] = &[];
        assert_eq!(LinkFormat.resolve_size(&mut source, 0).unwrap(), 4000);
    }

    #[test]
    fn signature_is_at_true_start() {
        assert_eq!(LinkFormat.offset_adjustment(), 0);
        assert_eq!(LinkFormat.signature(), b"L\0\0\0");
    }
}
