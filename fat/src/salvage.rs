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

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use log::warn;
use salvage_ds::DeviceStorage;
use salvage_err::{Error, Result};

use crate::data_region::DataRegion;
use crate::fat_table::FatTable;
use crate::geometry::Geometry;

/// Outcome of salvaging a single file's cluster chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalvageOutcome {
    /// The full declared size was read before end-of-chain.
    Complete,
    /// The chain ended early; `bytes_written` is less than the declared
    /// size, but whatever was recovered was still written to disk.
    Truncated { bytes_written: u64 },
}

/// Walks a FAT cluster chain and writes the recovered payload to
/// `output_path`, setting the output file's mtime to `mtime`.
///
/// Building the chain and reading payload are both driven through `B`
/// (`FatTable`) and `C` (`DataRegion`), which each take an explicit byte
/// offset per call — so this can interleave FAT lookups and data reads
/// freely without the two stepping on a shared seek cursor.
pub fn salvage_file<D: DeviceStorage>(
    storage: &D,
    geometry: Geometry,
    start_cluster: u32,
    size: u32,
    mtime: NaiveDateTime,
    output_path: &Path,
) -> Result<SalvageOutcome> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(Error::DeviceIo)?;
        }
    }

    let fat = FatTable::new(storage, geometry);
    let data_region = DataRegion::new(storage, geometry);

    let mut bytes_remaining = size as u64;
    let mut cluster = start_cluster;
    let mut payload = Vec::with_capacity(size as usize);
    let mut truncated = false;

    loop {
        let chunk_len = std::cmp::min(geometry.cluster_size as u64, bytes_remaining) as usize;
        if chunk_len == 0 {
            break;
        }
        let chunk = data_region.read_cluster_bytes(cluster, chunk_len)?;
        payload.extend_from_slice(&chunk);
        bytes_remaining -= chunk_len as u64;

        if bytes_remaining == 0 {
            break;
        }

        let next = fat.next_cluster(cluster)?;
        if FatTable::<D>::is_end_of_chain(next) {
            warn!(
                "{}",
                Error::ChainTruncated {
                    start_cluster,
                    clusters_read: (size as u64 - bytes_remaining) as usize
                        / geometry.cluster_size as usize
                        + 1,
                }
            );
            truncated = true;
            break;
        }
        cluster = next;
    }

    fs::write(output_path, &payload).map_err(Error::DeviceIo)?;
    set_mtime(output_path, mtime)?;

    if truncated {
        Ok(SalvageOutcome::Truncated {
            bytes_written: payload.len() as u64,
        })
    } else {
        Ok(SalvageOutcome::Complete)
    }
}

fn set_mtime(path: &Path, mtime: NaiveDateTime) -> Result<()> {
    let system_time = std::time::UNIX_EPOCH
        + std::time::Duration::from_secs(mtime.and_utc().timestamp().max(0) as u64);
    let file_time = filetime::FileTime::from_system_time(system_time);
    filetime::set_file_mtime(path, file_time).map_err(Error::DeviceIo)
}
