//! Carvel - Windows artifact carver
//!
//! Recovers shortcut (`.lnk`) and prefetch (`.pf`) files from raw disk
//! images, devices and memory dumps by signature.

mod engine;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

use carvel_core::TypeRegistry;
use engine::ScanConfig;

#[derive(Parser, Debug)]
#[command(name = "carvel")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Disk image, block device or memory dump to scan
    #[arg(required_unless_present = "list_types")]
    source: Option<PathBuf>,

    /// Only carve this type (repeatable)
    #[arg(short = 't', long = "type", value_name = "NAME")]
    types: Vec<String>,

    /// Directory to write carved files and custody records into
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip carves that start inside an earlier accepted carve
    #[arg(long, default_value_t = false)]
    exclude_overlaps: bool,

    #[arg(long, default_value_t = false)]
    no_progress: bool,

    /// List the supported file types and exit
    #[arg(long, default_value_t = false)]
    list_types: bool,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let registry = TypeRegistry::with_defaults();

    if args.list_types {
        list_types(&registry);
        return Ok(());
    }

    let registry = if args.types.is_empty() {
        registry
    } else {
        registry.select(args.types.as_slice())?
    };

    let source = args.source.context("No source given")?;

    let cancel = Arc::new(AtomicBool::new(false));
    let c = cancel.clone();
    ctrlc::set_handler(move || {
        c.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let config = ScanConfig {
        source: &source,
        output: args.output.as_deref(),
        exclude_overlaps: args.exclude_overlaps,
        show_progress: !args.no_progress,
    };
    engine::run_scan(&config, &registry, cancel)?;

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn list_types(registry: &TypeRegistry) {
    println!("{:<12} {:<6} {:<16} ADJUST", "TYPE", "EXT", "SIGNATURE");
    println!("{}", "-".repeat(44));
    for descriptor in registry.all() {
        let signature: Vec<String> = descriptor
            .signature()
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect();
        println!(
            "{:<12} {:<6} {:<16} {}",
            descriptor.name(),
            descriptor.extension(),
            signature.join(" "),
            descriptor.offset_adjustment()
        );
    }
}
