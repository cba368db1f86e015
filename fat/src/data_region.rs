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

/// Reads cluster payload bytes out of the data region.
pub struct DataRegion<'a, D: DeviceStorage> {
    storage: &'a D,
    geometry: Geometry,
}

impl<'a, D: DeviceStorage> DataRegion<'a, D> {
    pub fn new(storage: &'a D, geometry: Geometry) -> Self {
        Self { storage, geometry }
    }

    /// Reads `length` bytes (`length <= geometry.cluster_size`) starting at
    /// the beginning of `cluster`.
    pub fn read_cluster_bytes(&self, cluster: u32, length: usize) -> Result<Vec<u8>> {
        if cluster < 2 {
            return Err(Error::InvalidClusterNumber(cluster));
        }
        let offset = self.geometry.cluster_byte_offset(cluster);
        let mut buf = vec![0u8; length];
        self.storage.read_at(offset, &mut buf)?;
        Ok(buf)
    }
}
