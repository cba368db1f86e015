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

//! Byte-addressable device storage seam.
//!
//! Every core component (boot-sector decoder, FAT reader, data-region
//! reader, chain salvager) reads through this trait instead of holding a
//! file handle directly. Each call carries its own absolute offset, so a
//! FAT lookup and a data read can interleave freely without racing over a
//! shared seek cursor.

use salvage_err::Result;

/// Positioned read/write access to a FAT32 volume's backing bytes.
///
/// `write_at` exists for parity with the Hyrax workspace's storage
/// abstraction and to keep the seam shape-compatible with a hypothetical
/// future repair feature; the recovery toolchain itself only ever reads
/// (writing to the source device is an explicit non-goal).
pub trait DeviceStorage {
    /// Reads exactly `buffer.len()` bytes starting at `offset`.
    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<()>;

    /// Writes `buffer` starting at `offset`.
    fn write_at(&self, offset: u64, buffer: &[u8]) -> Result<()>;
}

/// An in-memory [`DeviceStorage`] backed by a growable byte buffer.
///
/// Used by the test harness to assemble synthetic FAT32 images without
/// touching the filesystem, and by callers embedding this crate who already
/// hold a volume image in memory (e.g. a memory-mapped disk image).
pub struct MemoryStorage {
    bytes: std::sync::Mutex<Vec<u8>>,
}

impl MemoryStorage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: std::sync::Mutex::new(bytes),
        }
    }

    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0u8; len])
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bytes.into_inner().unwrap()
    }
}

impl DeviceStorage for MemoryStorage {
    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<()> {
        let bytes = self.bytes.lock().unwrap();
        let start = offset as usize;
        let end = start + buffer.len();
        if end > bytes.len() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "read past end of in-memory device",
            )
            .into());
        }
        buffer.copy_from_slice(&bytes[start..end]);
        Ok(())
    }

    fn write_at(&self, offset: u64, buffer: &[u8]) -> Result<()> {
        let mut bytes = self.bytes.lock().unwrap();
        let start = offset as usize;
        let end = start + buffer.len();
        if end > bytes.len() {
            bytes.resize(end, 0);
        }
        bytes[start..end].copy_from_slice(buffer);
        Ok(())
    }
}
