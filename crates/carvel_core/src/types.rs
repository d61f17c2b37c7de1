use std::sync::Arc;

use crate::traits::FileTypeDescriptor;

/// A file recovered from the source stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarvedFile {
    pub start_offset: u64,
    pub type_name: String,
    pub extension: String,
    /// Size resolved from the format rules. `data` is shorter when `incomplete`.
    pub size: u64,
    pub data: Vec<u8>,
    /// The source ended before `size` bytes were available.
    pub incomplete: bool,
}

impl CarvedFile {
    #[must_use]
    pub fn end_offset(&self) -> u64 {
        self.start_offset.saturating_add(self.size)
    }

    /// Suggested file name: `<type>_<offset as 12 hex digits>.<ext>`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "{}_{:012x}.{}",
            self.type_name, self.start_offset, self.extension
        )
    }
}

/// A signature hit that has not yet been validated.
#[derive(Clone)]
pub struct CarveCandidate {
    pub match_offset: u64,
    pub descriptor: Arc<dyn FileTypeDescriptor>,
}

impl CarveCandidate {
    /// Where the format actually begins, or `None` if the offset adjustment
    /// would place it outside the `u64` offset range.
    #[must_use]
    pub fn true_start(&self) -> Option<u64> {
        self.match_offset
            .checked_add_signed(self.descriptor.offset_adjustment())
    }

    /// Why `true_start` has no value for this candidate.
    pub(crate) fn out_of_range_reason(&self) -> RejectReason {
        if self.descriptor.offset_adjustment() < 0 {
            RejectReason::StartBeforeSource
        } else {
            RejectReason::StartOverflow
        }
    }
}

impl std::fmt::Debug for CarveCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarveCandidate")
            .field("match_offset", &self.match_offset)
            .field("descriptor", &self.descriptor.name())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    StartBeforeSource,
    /// A positive adjustment pushed the start past the largest offset.
    StartOverflow,
    ValidationFailed,
    EmptySize,
    /// The start already lies inside an earlier accepted carve.
    Overlapping,
}

impl RejectReason {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StartBeforeSource => "start before source",
            Self::StartOverflow => "start offset overflows",
            Self::ValidationFailed => "validation failed",
            Self::EmptySize => "empty size",
            Self::Overlapping => "inside claimed range",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarveOutcome {
    Accepted(CarvedFile),
    Rejected(RejectReason),
}

/// What to do with a match whose start lies inside an already carved range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// Report every validated match.
    #[default]
    Permit,
    /// Skip matches that start inside a range claimed by an earlier carve.
    ExcludeClaimed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub bytes_scanned: u64,
    pub candidates: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub incomplete: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carved(start_offset: u64) -> CarvedFile {
        CarvedFile {
            start_offset,
            type_name: "lnk".to_string(),
            extension: "lnk".to_string(),
            size: 4000,
            data: Vec::new(),
            incomplete: false,
        }
    }

    #[test]
    fn test_end_offset() {
        assert_eq!(carved(100).end_offset(), 4100);
    }

    #[test]
    fn test_end_offset_saturates_on_huge_size() {
        let mut file = carved(100);
        file.size = u64::MAX;
        assert_eq!(file.end_offset(), u64::MAX);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(carved(0x1a2b).file_name(), "lnk_000000001a2b.lnk");
    }

    #[test]
    fn test_reject_reason_display() {
        assert_eq!(format!("{}", RejectReason::ValidationFailed), "validation failed");
    }

    #[test]
    fn test_default_overlap_policy_permits() {
        assert_eq!(OverlapPolicy::default(), OverlapPolicy::Permit);
    }
}
