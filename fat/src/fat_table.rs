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

use salvage_ds::DeviceStorage;
use salvage_err::{Error, Result};

use crate::geometry::Geometry;

/// Cluster values at or above this are end-of-chain markers.
pub const END_OF_CHAIN_MIN: u32 = 0x0FFF_FFF8;
/// The bad-cluster marker; treated identically to end-of-chain by this
/// best-effort recovery tool.
pub const BAD_CLUSTER: u32 = 0x0FFF_FFF7;

const CLUSTER_MASK: u32 = 0x0FFF_FFFF;

/// Translates a cluster number to its successor by looking it up in the
/// File Allocation Table.
pub struct FatTable<'a, D: DeviceStorage> {
    storage: &'a D,
    geometry: Geometry,
}

impl<'a, D: DeviceStorage> FatTable<'a, D> {
    pub fn new(storage: &'a D, geometry: Geometry) -> Self {
        Self { storage, geometry }
    }

    /// Returns the cluster that follows `current` in its chain, or an
    /// end-of-chain/bad-cluster marker (`>= BAD_CLUSTER`) if `current` is
    /// the last cluster.
    pub fn next_cluster(&self, current: u32) -> Result<u32> {
        if current < 2 {
            return Err(Error::InvalidClusterNumber(current));
        }

        let offset = self.geometry.fat_start_byte + current as u64 * 4;
        let mut raw = [0u8; 4];
        self.storage.read_at(offset, &mut raw)?;
        Ok(u32::from_le_bytes(raw) & CLUSTER_MASK)
    }

    /// True if `cluster` is an end-of-chain or bad-cluster marker.
    pub fn is_end_of_chain(cluster: u32) -> bool {
        cluster >= BAD_CLUSTER
    }
}
