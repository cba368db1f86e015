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

use zerocopy::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, KnownLayout};

use salvage_err::{Error, Result};

/// The FAT32 BIOS Parameter Block, laid directly over the first 512 bytes
/// of the volume. Parsed via `zerocopy` rather than pointer transmutation,
/// so a malformed or truncated sector is a typed error instead of
/// undefined behavior.
#[repr(C)]
#[derive(Debug, FromBytes, Immutable, KnownLayout)]
pub struct BootSector {
    bs_jmpboot: [u8; 3],
    bs_oemname: [u8; 8],

    bpb_bytspersec: U16,
    bpb_secperclus: u8,
    bpb_rsvdseccnt: U16,
    bpb_numfats: u8,
    bpb_rootentcnt: U16,
    bpb_totsec16: U16,
    bpb_media: u8,
    bpb_fatsz16: U16,

    bpb_secpertrk: U16,
    bpb_numheads: U16,
    bpb_hiddsec: U32,
    bpb_totsec32: U32,

    bpb_fatsz32: U32,
    bpb_extflags: U16,
    bpb_fsver: U16,
    bpb_rootclus: U32,
    bpb_fsinfo: U16,
    bpb_bkbootsec: U16,
    bpb_reserved: [u8; 12],

    bs_drvnum: u8,
    bs_reserved1: u8,
    bs_bootsig: u8,
    bs_volid: U32,
    /// 11-byte volume label, "NO NAME    " when unset.
    bs_vollab: [u8; 11],
    bs_filsystype: [u8; 8],

    bs_boot: [u8; 420],
    /// Must be `0x55 0xAA`; every other combination means this isn't a
    /// FAT32 boot sector.
    signature_word: [u8; 2],
}

const BOOT_SECTOR_LEN: usize = 512;

impl BootSector {
    /// Parses the first 512 bytes of the device, validating the boot
    /// signature. `bytes` must be exactly 512 bytes long.
    pub fn parse(bytes: &[u8]) -> Result<&BootSector> {
        let sector =
            BootSector::ref_from_bytes(bytes).map_err(|_| Error::InvalidBootSignature)?;
        if sector.signature_word != [0x55, 0xAA] {
            return Err(Error::InvalidBootSignature);
        }
        Ok(sector)
    }

    pub fn bytes_per_sector(&self) -> u16 {
        self.bpb_bytspersec.get()
    }

    pub fn sectors_per_cluster(&self) -> u8 {
        self.bpb_secperclus
    }

    pub fn reserved_sectors(&self) -> u16 {
        self.bpb_rsvdseccnt.get()
    }

    pub fn fat_count(&self) -> u8 {
        self.bpb_numfats
    }

    pub fn total_sectors(&self) -> u32 {
        self.bpb_totsec32.get()
    }

    pub fn fat_size_sectors(&self) -> u32 {
        self.bpb_fatsz32.get()
    }

    pub fn root_cluster(&self) -> u32 {
        self.bpb_rootclus.get()
    }
}

pub(crate) const _: () = assert!(core::mem::size_of::<BootSector>() == BOOT_SECTOR_LEN);
