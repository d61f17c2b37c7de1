//! Built-in file type descriptors.

pub mod lnk;
pub mod prefetch;

pub use lnk::LinkFormat;
pub use prefetch::{PrefetchFormat, PrefetchVersion};
