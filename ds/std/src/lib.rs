// Copyright 2024 Kevin Ludwig
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

use std::fs::File;
use std::path::Path;

use log::debug;
use salvage_ds::DeviceStorage;
use salvage_err::{Error, Result};

/// Device storage backed by a real file handle — a raw block device on a
/// recovery host, or a disk-image file when developing/testing off-device.
///
/// Reads and writes are positioned (no shared seek cursor), so this type
/// can be shared behind a `&` reference across the FAT reader, data-region
/// reader, and chain salvager without any of them perturbing another's
/// read position.
pub struct FileDeviceStorage {
    file: File,
}

impl FileDeviceStorage {
    /// Opens `device_path` read-only. Permission and not-found failures are
    /// mapped onto the taxonomy's open-time variants rather than the
    /// generic I/O variant, so the CLI can report them distinctly.
    pub fn open_read_only(device_path: &str) -> Result<Self> {
        let file = File::open(Path::new(device_path))
            .map_err(|source| Error::from_open_error(device_path, source))?;
        debug!("opened device '{device_path}' read-only");
        Ok(Self { file })
    }

    /// Opens `device_path` for read-write, used only by tooling that builds
    /// synthetic FAT32 images for tests — the recovery CLI itself never
    /// requests write access to the source device.
    pub fn open_read_write(device_path: &str) -> Result<Self> {
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(Path::new(device_path))
            .map_err(|source| Error::from_open_error(device_path, source))?;
        Ok(Self { file })
    }
}

impl DeviceStorage for FileDeviceStorage {
    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<()> {
        platform::read_exact_at(&self.file, buffer, offset)?;
        Ok(())
    }

    fn write_at(&self, offset: u64, buffer: &[u8]) -> Result<()> {
        platform::write_all_at(&self.file, buffer, offset)?;
        Ok(())
    }
}

#[cfg(unix)]
mod platform {
    use std::fs::File;
    use std::io;
    use std::os::unix::fs::FileExt;

    pub(super) fn read_exact_at(file: &File, buffer: &mut [u8], offset: u64) -> io::Result<()> {
        file.read_exact_at(buffer, offset)
    }

    pub(super) fn write_all_at(file: &File, buffer: &[u8], offset: u64) -> io::Result<()> {
        file.write_all_at(buffer, offset)
    }
}

#[cfg(windows)]
mod platform {
    use std::fs::File;
    use std::io;
    use std::os::windows::fs::FileExt;

    pub(super) fn read_exact_at(file: &File, mut buffer: &mut [u8], mut offset: u64) -> io::Result<()> {
        while !buffer.is_empty() {
            let n = file.seek_read(buffer, offset)?;
            if n == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "short read"));
            }
            buffer = &mut buffer[n..];
            offset += n as u64;
        }
        Ok(())
    }

    pub(super) fn write_all_at(file: &File, mut buffer: &[u8], mut offset: u64) -> io::Result<()> {
        while !buffer.is_empty() {
            let n = file.seek_write(buffer, offset)?;
            buffer = &buffer[n..];
            offset += n as u64;
        }
        Ok(())
    }
}
