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

use chrono::NaiveDate;
use codepage_437::{FromCp437, CP437_WINGDINGS};
use log::{debug, warn};
use salvage_ds::DeviceStorage;
use salvage_err::{Error, ScanError};

use crate::entry::{EntryKind, ScanRecord};
use crate::geometry::Geometry;
use crate::lfn::LfnState;

const RECORD_LEN: usize = 32;
const VALID_SFN_ATTRIBUTES: u8 = 0x08 | 0x10 | 0x20;
const DEFAULT_EXTENSIONS: &[&str] = &["DOC", "XLS", "JPG", "PDF", "PNG", "PPT", "PAG"];

/// Streams 32-byte directory records out of the data region, classifies
/// each, reassembles long filenames, and yields the candidate records a
/// caller would want to restore.
///
/// Scanning is maximally permissive: a malformed record, an unparsable
/// timestamp, or a broken LFN sequence is logged and skipped rather than
/// aborting the whole scan.
pub struct Scanner<'a, D: DeviceStorage> {
    storage: &'a D,
    geometry: Geometry,
    target_extensions: Vec<String>,
    lfn_state: LfnState,
    offset: u64,
}

impl<'a, D: DeviceStorage> Scanner<'a, D> {
    pub fn new(storage: &'a D, geometry: Geometry, target_extensions: &[String]) -> Self {
        let target_extensions = if target_extensions.is_empty() {
            DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
        } else {
            target_extensions.iter().map(|s| s.to_uppercase()).collect()
        };
        Self {
            storage,
            geometry,
            target_extensions,
            lfn_state: LfnState::default(),
            offset: geometry.data_start_byte,
        }
    }

    /// Runs the scan to completion (or device end), returning every
    /// candidate record that survived the classification filter, in
    /// byte-offset order.
    pub fn scan(mut self) -> Vec<ScanRecord> {
        let mut records = Vec::new();
        loop {
            let mut record = [0u8; RECORD_LEN];
            match self.storage.read_at(self.offset, &mut record) {
                Ok(()) => {}
                Err(Error::DeviceIo(io_err))
                    if io_err.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    debug!("reached the physical end of the device, stopping scan");
                    break;
                }
                Err(err) => {
                    warn!("scan aborted by device I/O error: {err}");
                    break;
                }
            }
            self.offset += RECORD_LEN as u64;

            if let Some(candidate) = self.classify(&record) {
                records.push(candidate);
            }
        }
        records
    }

    fn classify(&mut self, record: &[u8; RECORD_LEN]) -> Option<ScanRecord> {
        let attribute_byte = record[11];

        if attribute_byte & 0x0F == 0x0F {
            self.lfn_state.push_slice(record);
            return None;
        }

        if attribute_byte == 0x00 {
            self.lfn_state.reset();
            return None;
        }

        if attribute_byte & VALID_SFN_ATTRIBUTES == 0 {
            return None;
        }

        self.decode_sfn(record, attribute_byte)
    }

    fn decode_sfn(&mut self, record: &[u8; RECORD_LEN], attribute_byte: u8) -> Option<ScanRecord> {
        let mut name_bytes: [u8; 8] = record[0..8].try_into().unwrap();
        let ext_bytes: [u8; 3] = record[8..11].try_into().unwrap();

        let deleted = name_bytes[0] == 0xE5;
        if deleted {
            name_bytes[0] = b'!';
        }

        let short_name = String::from_cp437(name_bytes.to_vec(), &CP437_WINGDINGS);
        let short_extension = String::from_cp437(ext_bytes.to_vec(), &CP437_WINGDINGS);
        let short_name = sanitize_and_trim(&short_name);
        let short_extension = sanitize_and_trim(&short_extension);

        let size = u32::from_le_bytes(record[28..32].try_into().unwrap());
        let start_cluster_lo = u16::from_le_bytes(record[26..28].try_into().unwrap()) as u32;
        let start_cluster_hi = u16::from_le_bytes(record[20..22].try_into().unwrap()) as u32;
        let start_cluster = (start_cluster_lo | (start_cluster_hi << 16)) & 0x0FFF_FFFF;

        // LFN resolution happens for every valid SFN record, independent of
        // whether the record survives the candidate filter below — the
        // buffer must be empty before the next record either way.
        let mut filename = if short_extension.is_empty() {
            short_name.clone()
        } else {
            format!("{short_name}.{short_extension}")
        };
        match self.lfn_state.resolve() {
            Ok(Some(long_name)) => filename = long_name,
            Ok(None) => {}
            Err(ScanError::LfnChecksumMismatch) => {
                warn!("{}", ScanError::LfnChecksumMismatch);
            }
            Err(other) => warn!("{other}"),
        }

        let kind = match attribute_byte >> 4 {
            0x2 if size > 0 => EntryKind::File,
            0x1 if size == 0 => EntryKind::Directory,
            _ => return None,
        };

        if kind == EntryKind::Directory
            && (short_name.is_empty() || short_name == "." || short_name == "..")
        {
            return None;
        }

        if !(self.target_extensions.iter().any(|ext| ext == &short_extension)
            || filename.ends_with(".pages")
            || kind == EntryKind::Directory)
        {
            return None;
        }

        let byte_offset_in_device = self.offset;
        if start_cluster < 2 || start_cluster > self.geometry.total_clusters {
            warn!("{}", ScanError::MalformedDirectoryEntry(byte_offset_in_device));
            return None;
        }

        let date_word = u16::from_le_bytes(record[24..26].try_into().unwrap());
        let time_word = u16::from_le_bytes(record[22..24].try_into().unwrap());
        let mtime = match decode_dos_timestamp(date_word, time_word) {
            Some(mtime) => mtime,
            None => {
                warn!(
                    "{}",
                    ScanError::InvalidTimestamp(byte_offset_in_device)
                );
                return None;
            }
        };

        let containing_cluster = self.geometry.cluster_containing_byte(byte_offset_in_device);

        Some(ScanRecord {
            byte_offset_in_device,
            containing_cluster,
            filename,
            short_extension,
            size,
            attribute_byte,
            kind,
            start_cluster,
            mtime,
            deleted,
            path: None,
        })
    }
}

fn sanitize_and_trim(value: &str) -> String {
    crate::lfn::sanitize(value).trim().to_string()
}

fn decode_dos_timestamp(date_word: u16, time_word: u16) -> Option<chrono::NaiveDateTime> {
    let day = date_word & 0x1F;
    let month = (date_word >> 5) & 0x0F;
    let year = 1980 + ((date_word >> 9) & 0x7F) as i32;

    let second = (time_word & 0x1F) as u32 * 2;
    let minute = (time_word >> 5) & 0x3F;
    let hour = (time_word >> 11) & 0x1F;

    let date = NaiveDate::from_ymd_opt(year, month as u32, day as u32)?;
    let time = chrono::NaiveTime::from_hms_opt(hour as u32, minute as u32, second)?;
    Some(NaiveDateTime::new(date, time))
}
