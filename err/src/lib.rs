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

//! Error taxonomy shared by every component of the recovery toolchain.
//!
//! Mirrors the Hyrax workspace's convention of a single `thiserror`-derived
//! enum per failure domain rather than `Box<dyn Error>` or ad-hoc strings, so
//! callers can match on kind (the scanner needs to know "recoverable,
//! continue" from "fatal, abort" without parsing messages).

/// Top-level error for the recovery toolchain.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The device path does not exist.
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    /// Opening the device failed due to insufficient privilege.
    #[error("permission denied opening device: {0}")]
    DeviceOpenDenied(String),
    /// A positioned read or write against the device failed.
    #[error("device I/O error: {0}")]
    DeviceIo(#[from] std::io::Error),
    /// Bytes [510..512) of the boot sector were not `0x55 0xAA`.
    #[error("not a FAT32 volume (missing 0x55AA boot signature)")]
    InvalidBootSignature,
    /// A cluster number below 2 (clusters 0 and 1 are reserved) was passed
    /// to the FAT reader or data-region reader.
    #[error("invalid cluster number {0} (clusters below 2 are reserved)")]
    InvalidClusterNumber(u32),
    /// A recoverable, per-record scan error. The scanner logs and skips.
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// The FAT chain ended (end-of-chain or bad-cluster marker) before the
    /// declared file size was satisfied. The partial payload is still
    /// written to disk; this is carried as a warning, not an abort.
    #[error(
        "FAT chain for starting cluster {start_cluster} truncated after {clusters_read} cluster(s); partial data written"
    )]
    ChainTruncated {
        start_cluster: u32,
        clusters_read: usize,
    },
    /// The tabular scan-result store could not be read or written.
    #[error("scan-result store error: {0}")]
    StoreIo(String),
}

/// Recoverable errors produced while classifying a single 32-byte directory
/// record. Every variant shares the same recovery policy (log at `warn`,
/// skip the record, keep scanning) — they are grouped here rather than as
/// top-level `Error` variants because no caller needs to tell them apart
/// structurally, only in the log line.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("malformed directory entry at byte offset {0}")]
    MalformedDirectoryEntry(u64),
    #[error("invalid DOS timestamp in directory entry at byte offset {0}")]
    InvalidTimestamp(u64),
    #[error("long filename sequence count disagreed with slice buffer, discarding LFN buffer")]
    LfnChecksumMismatch,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Maps an [`std::io::Error`] encountered while *opening* the device
    /// (as opposed to reading/writing it) onto the taxonomy's open-time
    /// variants, preserving the device path for the log/error message.
    pub fn from_open_error(device_path: impl Into<String>, source: std::io::Error) -> Self {
        let device_path = device_path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Error::DeviceNotFound(device_path),
            std::io::ErrorKind::PermissionDenied => Error::DeviceOpenDenied(device_path),
            _ => Error::DeviceIo(source),
        }
    }

    /// The process exit code this error should surface as.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::DeviceNotFound(_) => 2,
            Error::DeviceOpenDenied(_) => 3,
            Error::InvalidBootSignature => 4,
            Error::StoreIo(_) => 5,
            Error::DeviceIo(_) | Error::InvalidClusterNumber(_) | Error::ChainTruncated { .. } => 6,
            Error::Scan(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_error_maps_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
        assert!(matches!(
            Error::from_open_error("/dev/sdz", io_err),
            Error::DeviceNotFound(path) if path == "/dev/sdz"
        ));
    }

    #[test]
    fn open_error_maps_permission_denied() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(
            Error::from_open_error("/dev/sdz", io_err),
            Error::DeviceOpenDenied(path) if path == "/dev/sdz"
        ));
    }

    #[test]
    fn exit_codes_are_nonzero_for_every_fatal_variant() {
        assert_ne!(Error::InvalidBootSignature.exit_code(), 0);
        assert_ne!(Error::DeviceNotFound("x".into()).exit_code(), 0);
    }
}
