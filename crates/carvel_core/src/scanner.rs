//! Sliding-window signature scanner.
//!
//! The source is read in large chunks that overlap by `window - 1` bytes, so
//! every byte offset from `0` through `len - window` is tested exactly once
//! against every registered signature. Each hit becomes a [`CarveCandidate`]
//! that is either promoted to a [`CarvedFile`] or rejected.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use memchr::memmem::Finder;

use crate::error::{CoreError, Result};
use crate::extractor::fill;
use crate::registry::TypeRegistry;
use crate::traits::ByteSource;
use crate::types::{
    CarveCandidate, CarveOutcome, CarvedFile, OverlapPolicy, RejectReason, ScanStats,
};

pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub overlap: OverlapPolicy,
    /// Polled once per chunk; setting it stops the scan with `Cancelled`.
    pub cancel: Option<Arc<AtomicBool>>,
    pub chunk_size: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            overlap: OverlapPolicy::default(),
            cancel: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ScanOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn overlap(mut self, policy: OverlapPolicy) -> Self {
        self.overlap = policy;
        self
    }

    #[must_use]
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    #[must_use]
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

impl CarveCandidate {
    /// Runs the validate, size and extract pipeline for this candidate.
    ///
    /// A failed validation or an empty size is a normal `Rejected` outcome.
    /// Only source read failures are errors.
    pub fn carve(&self, source: &mut dyn ByteSource) -> Result<CarveOutcome> {
        let descriptor = &self.descriptor;

        let Some(start) = self.true_start() else {
            return Ok(CarveOutcome::Rejected(self.out_of_range_reason()));
        };

        if !descriptor.validate(source, start)? {
            return Ok(CarveOutcome::Rejected(RejectReason::ValidationFailed));
        }

        let size = descriptor.resolve_size(source, start)?;
        if size == 0 {
            return Ok(CarveOutcome::Rejected(RejectReason::EmptySize));
        }

        let extraction = descriptor.extract(source, start, size)?;

        Ok(CarveOutcome::Accepted(CarvedFile {
            start_offset: start,
            type_name: descriptor.name().to_string(),
            extension: descriptor.extension().to_string(),
            size,
            data: extraction.data,
            incomplete: extraction.incomplete,
        }))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ByteScanner {
    options: ScanOptions,
}

impl ByteScanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Scans the whole source for every registered type.
    ///
    /// Results are ordered by start offset, then by registration order.
    pub fn scan(
        &self,
        source: &mut dyn ByteSource,
        registry: &TypeRegistry,
    ) -> Result<Vec<CarvedFile>> {
        self.scan_with_progress(source, registry, |_| {})
            .map(|(files, _)| files)
    }

    /// Scans for a single registered type.
    pub fn scan_type(
        &self,
        source: &mut dyn ByteSource,
        registry: &TypeRegistry,
        name: &str,
    ) -> Result<Vec<CarvedFile>> {
        let selected = registry.select(&[name])?;
        self.scan(source, &selected)
    }

    pub fn scan_with_stats(
        &self,
        source: &mut dyn ByteSource,
        registry: &TypeRegistry,
    ) -> Result<(Vec<CarvedFile>, ScanStats)> {
        self.scan_with_progress(source, registry, |_| {})
    }

    /// Scans the source, reporting the number of bytes covered after each chunk.
    pub fn scan_with_progress<F>(
        &self,
        source: &mut dyn ByteSource,
        registry: &TypeRegistry,
        mut progress: F,
    ) -> Result<(Vec<CarvedFile>, ScanStats)>
    where
        F: FnMut(u64),
    {
        let window = registry.window_size();
        let total = source.size();
        let mut stats = ScanStats::default();
        let mut carved: Vec<(usize, CarvedFile)> = Vec::new();

        tracing::info!(
            size = total,
            window,
            types = ?registry.names(),
            "starting scan"
        );

        if window == 0 || total < window as u64 {
            stats.bytes_scanned = total;
            progress(total);
            return Ok((Vec::new(), stats));
        }

        // Last offset where a full window still fits.
        let last_position = total - window as u64;
        let chunk_size = self.options.chunk_size.max(1);

        let finders: Vec<Finder<'_>> = registry
            .all()
            .iter()
            .map(|d| Finder::new(d.signature()))
            .collect();

        let mut buffer = vec![0u8; chunk_size + window - 1];
        let mut hits: Vec<(u64, usize, u64)> = Vec::new();
        let mut base = 0u64;

        while base <= last_position {
            if self.options.is_cancelled() {
                tracing::info!(offset = base, "scan cancelled");
                return Err(CoreError::Cancelled { offset: base });
            }

            let want = (buffer.len() as u64).min(total - base) as usize;
            let filled = fill(source, base, &mut buffer[..want])?;
            let chunk = &buffer[..filled];
            let chunk_end = (base + chunk_size as u64).min(last_position + 1);

            hits.clear();
            for (index, finder) in finders.iter().enumerate() {
                let mut pos = 0;
                while let Some(found) = finder.find(&chunk[pos..]) {
                    let at = pos + found;
                    let match_offset = base + at as u64;
                    if match_offset >= chunk_end {
                        break;
                    }
                    let adjustment = registry.all()[index].offset_adjustment();
                    let start_key = match_offset.checked_add_signed(adjustment).unwrap_or(0);
                    hits.push((start_key, index, match_offset));
                    pos = at + 1;
                }
            }
            hits.sort_unstable();

            for &(_, index, match_offset) in &hits {
                stats.candidates += 1;
                let candidate = CarveCandidate {
                    match_offset,
                    descriptor: Arc::clone(&registry.all()[index]),
                };

                match candidate.carve(source)? {
                    CarveOutcome::Accepted(file) => carved.push((index, file)),
                    CarveOutcome::Rejected(reason) => {
                        stats.rejected += 1;
                        tracing::trace!(
                            offset = match_offset,
                            file_type = candidate.descriptor.name(),
                            %reason,
                            "rejected candidate"
                        );
                    }
                }
            }

            stats.bytes_scanned = chunk_end.min(total);
            progress(stats.bytes_scanned);
            base += chunk_size as u64;
        }

        stats.bytes_scanned = total;
        progress(total);

        // Negative offset adjustments can reorder starts across chunk boundaries.
        carved.sort_by_key(|(index, file)| (file.start_offset, *index));
        let files = self.settle(carved, &mut stats);

        tracing::info!(
            candidates = stats.candidates,
            accepted = stats.accepted,
            rejected = stats.rejected,
            incomplete = stats.incomplete,
            "scan finished"
        );

        Ok((files, stats))
    }

    /// Applies the overlap policy to start-ordered carves and counts the
    /// survivors.
    fn settle(&self, carved: Vec<(usize, CarvedFile)>, stats: &mut ScanStats) -> Vec<CarvedFile> {
        let exclude = self.options.overlap == OverlapPolicy::ExcludeClaimed;
        let mut files = Vec::with_capacity(carved.len());
        let mut claimed_end = 0u64;

        for (_, file) in carved {
            if exclude && file.start_offset < claimed_end {
                stats.rejected += 1;
                tracing::trace!(
                    offset = file.start_offset,
                    file_type = %file.type_name,
                    reason = %RejectReason::Overlapping,
                    "rejected candidate"
                );
                continue;
            }

            stats.accepted += 1;
            if file.incomplete {
                stats.incomplete += 1;
                tracing::warn!(
                    offset = file.start_offset,
                    file_type = %file.type_name,
                    expected = file.size,
                    available = file.data.len(),
                    "carve runs past end of source"
                );
            } else {
                tracing::debug!(
                    offset = file.start_offset,
                    file_type = %file.type_name,
                    size = file.size,
                    "carved file"
                );
            }
            claimed_end = claimed_end.max(file.end_offset());
            files.push(file);
        }

        files
    }
}
