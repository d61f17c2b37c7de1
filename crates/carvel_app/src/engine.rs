use anyhow::{Context, Result};
use carvel_core::{
    ByteScanner, ByteSource, CarvedFile, CoreError, OverlapPolicy, ScanOptions, ScanStats,
    TypeRegistry,
};
use humansize::{BINARY, format_size};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::output::CarveWriter;

pub struct ScanConfig<'a> {
    pub source: &'a Path,
    pub output: Option<&'a Path>,
    pub exclude_overlaps: bool,
    pub show_progress: bool,
}

pub fn run_scan(
    config: &ScanConfig<'_>,
    registry: &TypeRegistry,
    cancel: Arc<AtomicBool>,
) -> Result<ScanStats> {
    let mut reader = carvel_io::open_source(config.source)
        .with_context(|| format!("Failed to open source: {}", config.source.display()))?;
    let source_size = reader.size();

    println!("[Carvel] Source: {}", config.source.display());
    println!("[Carvel] Size: {}", format_size(source_size, BINARY));
    println!("[Carvel] Types: {}", registry.names().join(", "));

    let policy = if config.exclude_overlaps {
        OverlapPolicy::ExcludeClaimed
    } else {
        OverlapPolicy::Permit
    };
    let scanner = ByteScanner::with_options(ScanOptions::new().overlap(policy).cancel_flag(cancel));

    let pb = if config.show_progress {
        let pb = ProgressBar::new(source_size);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:50.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .context("Invalid progress bar template")?
                .progress_chars("##-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let result = scanner.scan_with_progress(&mut reader, registry, |scanned| {
        pb.set_position(scanned)
    });
    pb.finish_and_clear();

    let (files, stats) = match result {
        Ok(found) => found,
        Err(CoreError::Cancelled { offset }) => {
            anyhow::bail!(
                "Scan cancelled by user at offset 0x{offset:X} ({})",
                format_size(offset, BINARY)
            );
        }
        Err(e) => return Err(e).context("Scan failed"),
    };

    for file in &files {
        println!("{}", describe(file));
    }

    if let Some(output_dir) = config.output {
        let writer = CarveWriter::new(output_dir, config.source)?;
        for file in &files {
            writer.write(file)?;
        }
        println!(
            "[Carvel] Wrote {} file(s) to {}",
            files.len(),
            output_dir.display()
        );
    }

    print_summary(&stats);
    Ok(stats)
}

fn describe(file: &CarvedFile) -> String {
    let mut line = format!(
        "[+] 0x{:012X} ({:>12}) {:<10} {:>10} bytes",
        file.start_offset, file.start_offset, file.type_name, file.size
    );
    if file.incomplete {
        line.push_str(&format!(" [incomplete: {} bytes carved]", file.data.len()));
    }
    line
}

fn print_summary(stats: &ScanStats) {
    println!();
    println!("╔══════════════════════════════════════╗");
    println!("║            SCAN SUMMARY              ║");
    println!("╠══════════════════════════════════════╣");
    println!(
        "║ Bytes Scanned:      {:>16} ║",
        format_size(stats.bytes_scanned, BINARY)
    );
    println!("║ Candidates:         {:>16} ║", stats.candidates);
    println!("║ Carved:             {:>16} ║", stats.accepted);
    println!("║ Rejected:           {:>16} ║", stats.rejected);
    println!("║ Incomplete:         {:>16} ║", stats.incomplete);
    println!("╚══════════════════════════════════════╝");
}

#[cfg(test)]
mod tests {
    use super::*;
    use carvel_core::formats::lnk::{LNK_CLASS_ID, LNK_SIGNATURE};
    use std::io::Write;
    use std::sync::atomic::Ordering;
    use tempfile::{NamedTempFile, TempDir};

    fn image_with_links(offsets: &[usize], len: usize) -> NamedTempFile {
        let mut data = vec![0u8; len];
        for &at in offsets {
            data[at..at + 4].copy_from_slice(&LNK_SIGNATURE);
            data[at + 4..at + 20].copy_from_slice(&LNK_CLASS_ID);
        }
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&data).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_run_scan_writes_output() {
        let image = image_with_links(&[512, 9000], 16 * 1024);
        let out = TempDir::new().unwrap();
        let config = ScanConfig {
            source: image.path(),
            output: Some(out.path()),
            exclude_overlaps: false,
            show_progress: false,
        };

        let stats = run_scan(
            &config,
            &TypeRegistry::with_defaults(),
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();

        assert_eq!(stats.accepted, 2);
        assert!(out.path().join("lnk_000000000200.lnk").exists());
        assert!(out.path().join("lnk_000000002328.lnk.json").exists());
    }

    #[test]
    fn test_exclude_overlaps_drops_nested_carve() {
        let image = image_with_links(&[0, 100], 8192);
        let config = ScanConfig {
            source: image.path(),
            output: None,
            exclude_overlaps: true,
            show_progress: false,
        };

        let stats = run_scan(
            &config,
            &TypeRegistry::with_defaults(),
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();

        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.rejected, 1);
    }

    #[test]
    fn test_cancelled_scan_is_an_error() {
        let image = image_with_links(&[512], 4096);
        let cancel = Arc::new(AtomicBool::new(false));
        cancel.store(true, Ordering::SeqCst);
        let config = ScanConfig {
            source: image.path(),
            output: None,
            exclude_overlaps: false,
            show_progress: false,
        };

        let err = run_scan(&config, &TypeRegistry::with_defaults(), cancel).unwrap_err();
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn test_missing_source_reports_path() {
        let config = ScanConfig {
            source: Path::new("/nonexistent/evidence.dd"),
            output: None,
            exclude_overlaps: false,
            show_progress: false,
        };

        let err = run_scan(
            &config,
            &TypeRegistry::with_defaults(),
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/evidence.dd"));
    }

    #[test]
    fn test_describe_marks_incomplete() {
        let file = CarvedFile {
            start_offset: 0x1000,
            type_name: "prefetch".to_string(),
            extension: "pf".to_string(),
            size: 8192,
            data: vec![0; 100],
            incomplete: true,
        };
        let line = describe(&file);
        assert!(line.contains("0x000000001000"));
        assert!(line.contains("4096"));
        assert!(line.contains("incomplete: 100 bytes"));
    }
}
