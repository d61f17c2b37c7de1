#![no_main]

use carvel_core::{ByteScanner, ScanOptions, TypeRegistry};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let registry = TypeRegistry::with_defaults();
    let chunk = 1 + data.first().copied().unwrap_or(0) as usize;
    let scanner = ByteScanner::with_options(ScanOptions::new().chunk_size(chunk));

    let Ok(files) = scanner.scan(&mut &data[..], &registry) else {
        return;
    };

    let len = data.len() as u64;
    for pair in files.windows(2) {
        assert!(pair[0].start_offset <= pair[1].start_offset);
    }
    for file in &files {
        assert!(file.start_offset < len);
        assert!(file.data.len() as u64 <= file.size);
        assert_eq!(file.incomplete, (file.data.len() as u64) < file.size);
    }
});
