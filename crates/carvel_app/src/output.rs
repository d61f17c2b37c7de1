use anyhow::{Context, Result};
use carvel_core::CarvedFile;
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct ChainOfCustody {
    filename: String,
    source_path: String,
    source_offset: String,
    source_offset_decimal: u64,
    declared_size: u64,
    carved_size: usize,
    incomplete: bool,
    sha256_hash: String,
    recovery_timestamp: String,
    file_type: String,
}

/// Writes carved files and a JSON chain-of-custody record next to each one.
pub struct CarveWriter {
    output_dir: PathBuf,
    source_path: String,
}

impl CarveWriter {
    pub fn new(output_dir: &Path, source_path: &Path) -> Result<Self> {
        fs::create_dir_all(output_dir).with_context(|| {
            format!("Failed to create output directory: {}", output_dir.display())
        })?;

        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            source_path: source_path.display().to_string(),
        })
    }

    /// Writes `file` and its record, returning the path of the carved data.
    pub fn write(&self, file: &CarvedFile) -> Result<PathBuf> {
        let filename = file.file_name();
        let path = self.output_dir.join(&filename);

        let mut writer = BufWriter::new(
            File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?,
        );
        writer.write_all(&file.data)?;
        writer.flush()?;

        let record = ChainOfCustody {
            source_path: self.source_path.clone(),
            source_offset: format!("0x{:X}", file.start_offset),
            source_offset_decimal: file.start_offset,
            declared_size: file.size,
            carved_size: file.data.len(),
            incomplete: file.incomplete,
            sha256_hash: hex::encode(Sha256::digest(&file.data)),
            recovery_timestamp: Utc::now().to_rfc3339(),
            file_type: file.type_name.clone(),
            filename,
        };

        let record_path = self.output_dir.join(format!("{}.json", record.filename));
        let mut record_writer = BufWriter::new(File::create(&record_path).with_context(|| {
            format!("Failed to create {}", record_path.display())
        })?);
        serde_json::to_writer_pretty(&mut record_writer, &record)?;
        record_writer.flush()?;

        tracing::debug!(path = %path.display(), "wrote carved file");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn carved(incomplete: bool) -> CarvedFile {
        CarvedFile {
            start_offset: 0x64,
            type_name: "lnk".to_string(),
            extension: "lnk".to_string(),
            size: 4000,
            data: b"abc".to_vec(),
            incomplete,
        }
    }

    #[test]
    fn test_writes_data_and_record() {
        let dir = TempDir::new().unwrap();
        let writer = CarveWriter::new(dir.path(), Path::new("/evidence/disk.dd")).unwrap();

        let path = writer.write(&carved(true)).unwrap();
        assert_eq!(path.file_name().unwrap(), "lnk_000000000064.lnk");
        assert_eq!(fs::read(&path).unwrap(), b"abc");

        let record: serde_json::Value = serde_json::from_slice(
            &fs::read(dir.path().join("lnk_000000000064.lnk.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(record["source_path"], "/evidence/disk.dd");
        assert_eq!(record["source_offset"], "0x64");
        assert_eq!(record["source_offset_decimal"], 100);
        assert_eq!(record["declared_size"], 4000);
        assert_eq!(record["carved_size"], 3);
        assert_eq!(record["incomplete"], true);
        assert_eq!(
            record["sha256_hash"],
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_creates_missing_output_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("case-42").join("carved");
        let writer = CarveWriter::new(&nested, Path::new("image.raw")).unwrap();
        writer.write(&carved(false)).unwrap();
        assert!(nested.join("lnk_000000000064.lnk").exists());
    }
}
