// Copyright 2026 Kevin Ludwig
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn};
use salvage_ds_std::FileDeviceStorage;
use salvage_err::Error;
use salvage_fat::{reconstruct_paths, salvage_file, Geometry, SalvageOutcome, Scanner};

const DEFAULT_STORE_FILE: &str = "fat32_scan_results.xlsx";

/// Scans a FAT32 device for recoverable deleted files, or restores
/// previously flagged entries from a scan-result store.
#[derive(Parser, Debug)]
#[command(name = "salvage", version, about)]
struct Cli {
    /// Device to operate on: a drive letter or path on Windows (e.g.
    /// `\\.\D:`), or a path to a disk image / block device elsewhere.
    #[arg(long = "target_drive")]
    target_drive: String,

    /// Scan the device and populate the scan-result store.
    #[arg(long, conflicts_with = "restore")]
    scan: bool,

    /// Restore entries flagged in the scan-result store.
    #[arg(long, conflicts_with = "scan")]
    restore: bool,

    /// Target extensions to match (case-insensitive); defaults to the
    /// built-in document/image/media set when omitted.
    #[arg(long, num_args = 1..)]
    extensions: Vec<String>,

    /// Path to the tabular scan-result store.
    #[arg(long = "xlsx_file", default_value = DEFAULT_STORE_FILE)]
    store_file: PathBuf,

    /// Raise log verbosity (repeatable: -v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if !cli.scan && !cli.restore {
        error!("one of --scan or --restore is required");
        return ExitCode::from(1);
    }

    let result = if cli.scan {
        run_scan(&cli)
    } else {
        run_restore(&cli)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::from(exit_code_for(&err) as u8)
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<Error>().map(Error::exit_code).unwrap_or(1)
}

fn run_scan(cli: &Cli) -> anyhow::Result<()> {
    info!("opening {} read-only for scan", cli.target_drive);
    let storage = FileDeviceStorage::open_read_only(&cli.target_drive)?;
    let geometry = Geometry::from_device(&storage)?;

    info!("scanning data region for candidate entries");
    let scanner = Scanner::new(&storage, geometry, &cli.extensions);
    let mut records = scanner.scan();
    info!("found {} candidate entr{}", records.len(), if records.len() == 1 { "y" } else { "ies" });

    reconstruct_paths(&mut records);

    salvage_store::save(&records, geometry, &cli.store_file)?;
    info!("wrote scan results to {}", cli.store_file.display());
    Ok(())
}

fn run_restore(cli: &Cli) -> anyhow::Result<()> {
    info!("loading scan results from {}", cli.store_file.display());
    let mut rows = salvage_store::load(&cli.store_file)?;

    info!("opening {} read-only for restore", cli.target_drive);
    let storage = FileDeviceStorage::open_read_only(&cli.target_drive)?;

    let mut restored = 0usize;
    for row in rows.iter_mut().filter(|row| row.restore) {
        // Geometry is rebuilt from the columns the store replicated per
        // row at scan time rather than by re-reading the boot sector, so
        // restore keeps working even against a device whose boot sector
        // has since become unreadable.
        let geometry = Geometry::from_store_columns(
            row.reserved_sectors,
            row.bytes_per_sector,
            row.fat_size_sectors,
            row.cluster_size,
            row.data_start_byte,
        );
        let output_path = output_path_for(row);
        match salvage_file(
            &storage,
            geometry,
            row.start_cluster,
            row.size,
            row.mtime,
            &output_path,
        ) {
            Ok(SalvageOutcome::Complete) => {
                info!("restored {}", output_path.display());
                restored += 1;
            }
            Ok(SalvageOutcome::Truncated { bytes_written }) => {
                warn!(
                    "restored {} with only {bytes_written} of {} declared bytes (chain truncated)",
                    output_path.display(),
                    row.size
                );
                restored += 1;
            }
            Err(err) => {
                warn!("failed to restore {}: {err}", output_path.display());
                continue;
            }
        }
        row.restore = false;
    }

    salvage_store::save_in_place(&rows, &cli.store_file)?;
    info!("restored {restored} file(s); scan-result store updated");
    Ok(())
}

fn output_path_for(row: &salvage_store::StoreRow) -> std::path::PathBuf {
    Path::new(&row.path).join(&row.filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_and_restore_are_mutually_exclusive() {
        let result = Cli::try_parse_from([
            "salvage",
            "--target_drive",
            "D:",
            "--scan",
            "--restore",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn one_of_scan_or_restore_is_required_at_runtime() {
        let cli = Cli::try_parse_from(["salvage", "--target_drive", "D:"]).unwrap();
        assert!(!cli.scan && !cli.restore);
    }

    #[test]
    fn scan_alone_parses() {
        let cli = Cli::try_parse_from(["salvage", "--target_drive", "D:", "--scan"]).unwrap();
        assert!(cli.scan);
        assert!(!cli.restore);
        assert_eq!(cli.store_file, std::path::PathBuf::from(DEFAULT_STORE_FILE));
    }

    #[test]
    fn xlsx_file_flag_overrides_the_default_store_path() {
        let cli = Cli::try_parse_from([
            "salvage",
            "--target_drive",
            "D:",
            "--scan",
            "--xlsx_file",
            "custom.xlsx",
        ])
        .unwrap();
        assert_eq!(cli.store_file, std::path::PathBuf::from("custom.xlsx"));
    }
}
