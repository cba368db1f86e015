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
use salvage_err::Result;

use crate::boot_sector::BootSector;

/// Immutable volume geometry, derived once from the boot sector and passed
/// by value (it's `Copy`) into every downstream component. There is no
/// process-wide mutable geometry state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub fat_count: u8,
    pub fat_size_sectors: u32,
    pub total_sectors: u32,
    pub cluster_size: u32,
    pub data_start_byte: u64,
    pub total_clusters: u32,
    pub fat_start_byte: u64,
}

impl Geometry {
    /// Reads the first 512 bytes of `storage` and derives geometry from
    /// the BPB. Fails with `InvalidBootSignature` if the volume isn't
    /// FAT32-formatted.
    pub fn from_device(storage: &impl DeviceStorage) -> Result<Self> {
        let mut boot_sector_bytes = [0u8; 512];
        storage.read_at(0, &mut boot_sector_bytes)?;
        Ok(Self::from_boot_sector(BootSector::parse(&boot_sector_bytes)?))
    }

    fn from_boot_sector(boot_sector: &BootSector) -> Self {
        let bytes_per_sector = boot_sector.bytes_per_sector();
        let sectors_per_cluster = boot_sector.sectors_per_cluster();
        let reserved_sectors = boot_sector.reserved_sectors();
        let fat_count = boot_sector.fat_count();
        let fat_size_sectors = boot_sector.fat_size_sectors();
        let total_sectors = boot_sector.total_sectors();

        let cluster_size = sectors_per_cluster as u32 * bytes_per_sector as u32;
        let fat_start_byte = reserved_sectors as u64 * bytes_per_sector as u64;
        let data_start_byte = (reserved_sectors as u64
            + fat_count as u64 * fat_size_sectors as u64)
            * bytes_per_sector as u64;
        let total_bytes = total_sectors as u64 * bytes_per_sector as u64;
        let total_clusters = ((total_bytes - data_start_byte) / cluster_size as u64) as u32;

        Geometry {
            bytes_per_sector,
            sectors_per_cluster,
            reserved_sectors,
            fat_count,
            fat_size_sectors,
            total_sectors,
            cluster_size,
            data_start_byte,
            total_clusters,
            fat_start_byte,
        }
    }

    /// Reconstructs enough geometry to drive the FAT reader and data-region
    /// reader from the five columns the scan-result store replicates per
    /// row, without re-reading the source device's boot sector.
    /// `fat_count` and `total_sectors` are not among those columns and are
    /// left at 0 — neither the FAT reader nor the data-region reader
    /// consult them, only the scanner's candidate filter does.
    pub fn from_store_columns(
        reserved_sectors: u16,
        bytes_per_sector: u16,
        fat_size_sectors: u32,
        cluster_size: u32,
        data_start_byte: u64,
    ) -> Self {
        Geometry {
            bytes_per_sector,
            sectors_per_cluster: (cluster_size / bytes_per_sector.max(1) as u32) as u8,
            reserved_sectors,
            fat_count: 0,
            fat_size_sectors,
            total_sectors: 0,
            cluster_size,
            data_start_byte,
            total_clusters: 0,
            fat_start_byte: reserved_sectors as u64 * bytes_per_sector as u64,
        }
    }

    /// Cluster number holding the byte just written at `byte_offset`
    /// (the scanner calls this right after reading a 32-byte record, so
    /// `byte_offset` is the position immediately past that record).
    pub fn cluster_containing_byte(&self, byte_offset: u64) -> u32 {
        ((byte_offset - self.data_start_byte) / self.cluster_size as u64) as u32 + 2
    }

    pub fn cluster_byte_offset(&self, cluster: u32) -> u64 {
        self.data_start_byte + (cluster as u64 - 2) * self.cluster_size as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salvage_ds::MemoryStorage;

    fn make_boot_sector() -> Vec<u8> {
        let mut buf = vec![0u8; 512];
        buf[11..13].copy_from_slice(&512u16.to_le_bytes());
        buf[13] = 8;
        buf[14..16].copy_from_slice(&32u16.to_le_bytes());
        buf[16] = 2;
        buf[32..36].copy_from_slice(&2097152u32.to_le_bytes());
        buf[36..40].copy_from_slice(&1024u32.to_le_bytes());
        buf[510] = 0x55;
        buf[511] = 0xAA;
        buf
    }

    #[test]
    fn derives_documented_scenario_constants() {
        let storage = MemoryStorage::new(make_boot_sector());
        let geometry = Geometry::from_device(&storage).unwrap();
        assert_eq!(geometry.cluster_size, 4096);
        assert_eq!(geometry.data_start_byte, 1_081_344);
        assert_eq!(geometry.total_clusters, 261_919);
    }

    #[test]
    fn bytes_per_sector_times_sectors_per_cluster_is_cluster_size() {
        let storage = MemoryStorage::new(make_boot_sector());
        let geometry = Geometry::from_device(&storage).unwrap();
        assert_eq!(
            geometry.bytes_per_sector as u32 * geometry.sectors_per_cluster as u32,
            geometry.cluster_size
        );
    }

    #[test]
    fn from_store_columns_matches_boot_sector_derivation_for_fat_lookup_fields() {
        let storage = MemoryStorage::new(make_boot_sector());
        let from_device = Geometry::from_device(&storage).unwrap();

        let from_columns = Geometry::from_store_columns(
            from_device.reserved_sectors,
            from_device.bytes_per_sector,
            from_device.fat_size_sectors,
            from_device.cluster_size,
            from_device.data_start_byte,
        );

        assert_eq!(from_columns.fat_start_byte, from_device.fat_start_byte);
        assert_eq!(from_columns.data_start_byte, from_device.data_start_byte);
        assert_eq!(from_columns.cluster_size, from_device.cluster_size);
        assert_eq!(
            from_columns.sectors_per_cluster,
            from_device.sectors_per_cluster
        );
    }
}
