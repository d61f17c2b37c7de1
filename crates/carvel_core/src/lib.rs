//! Signature-based file carving.
//!
//! Scans a raw byte stream for known file formats, validates each candidate
//! and extracts its bytes without relying on filesystem metadata.

mod error;
pub mod extractor;
pub mod formats;
pub mod registry;
pub mod scanner;
mod traits;
mod types;

pub use error::{CoreError, Result};
pub use extractor::{Extraction, Extractor};
pub use formats::{LinkFormat, PrefetchFormat, PrefetchVersion};
pub use registry::TypeRegistry;
pub use scanner::{ByteScanner, ScanOptions};
pub use traits::{ByteSource, FileTypeDescriptor};
pub use types::{
    CarveCandidate, CarveOutcome, CarvedFile, OverlapPolicy, RejectReason, ScanStats,
};
