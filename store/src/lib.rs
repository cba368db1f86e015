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

//! The external tabular scan-result store: an xlsx workbook, one
//! row per candidate record plus a header, with a user-editable "restore?"
//! column. The core FAT subsystems never see this file format directly —
//! they exchange `salvage_fat::ScanRecord`/`Geometry` values, and this
//! crate is the only place that knows the concrete backing format.

use std::path::Path;

use chrono::NaiveDateTime;
use salvage_err::Error;
use salvage_fat::{EntryKind, Geometry, ScanRecord};

const SHEET_TITLE: &str = "Recoverable Entries";

const HEADERS: [&str; 16] = [
    "restore",
    "byte offset",
    "containing cluster",
    "filename",
    "file type",
    "size (bytes)",
    "attribute",
    "mtime",
    "start cluster",
    "deleted",
    "path",
    "reserved_sectors",
    "bytes_per_sector",
    "fat_size_sectors",
    "cluster_size",
    "data_start_byte",
];

/// One row of the tabular store: a scan record plus the geometry columns
/// it was discovered under and the user-editable restore flag.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRow {
    pub restore: bool,
    pub byte_offset_in_device: u64,
    pub containing_cluster: u32,
    pub filename: String,
    pub file_type: String,
    pub size: u32,
    pub attribute_byte: u8,
    pub mtime: NaiveDateTime,
    pub start_cluster: u32,
    pub deleted: bool,
    pub path: String,
    pub reserved_sectors: u16,
    pub bytes_per_sector: u16,
    pub fat_size_sectors: u32,
    pub cluster_size: u32,
    pub data_start_byte: u64,
}

impl StoreRow {
    fn from_scan_record(record: &ScanRecord, geometry: Geometry) -> Self {
        StoreRow {
            restore: false,
            byte_offset_in_device: record.byte_offset_in_device,
            containing_cluster: record.containing_cluster,
            filename: record.filename.clone(),
            file_type: record.short_extension.clone(),
            size: record.size,
            attribute_byte: record.attribute_byte,
            mtime: record.mtime,
            start_cluster: record.start_cluster,
            deleted: record.deleted,
            path: record.path.clone().unwrap_or_default(),
            reserved_sectors: geometry.reserved_sectors,
            bytes_per_sector: geometry.bytes_per_sector,
            fat_size_sectors: geometry.fat_size_sectors,
            cluster_size: geometry.cluster_size,
            data_start_byte: geometry.data_start_byte,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.attribute_byte >> 4 == 0x1
    }
}

/// Writes a fresh workbook: scan mode's terminal step. `records` should
/// already have `path` populated by [`salvage_fat::reconstruct_paths`].
pub fn save(records: &[ScanRecord], geometry: Geometry, path: &Path) -> salvage_err::Result<()> {
    let rows: Vec<StoreRow> = records
        .iter()
        .map(|record| StoreRow::from_scan_record(record, geometry))
        .collect();
    write_rows(&rows, path)
}

/// Loads every row of the store, in file order.
pub fn load(path: &Path) -> salvage_err::Result<Vec<StoreRow>> {
    let book = umya_spreadsheet::reader::xlsx::read(path)
        .map_err(|err| Error::StoreIo(err.to_string()))?;
    let sheet = book
        .get_sheet(&0)
        .ok_or_else(|| Error::StoreIo("scan-result store has no worksheet".to_string()))?;

    let highest_row = sheet.get_highest_row();
    let mut rows = Vec::new();
    for row in 2..=highest_row {
        let cell = |col: &str| sheet.get_value(format!("{col}{row}"));
        let restore = cell("A") == "1";
        let byte_offset_in_device: u64 = cell("B").parse().unwrap_or(0);
        let containing_cluster: u32 = cell("C").parse().unwrap_or(0);
        let filename = cell("D");
        let file_type = cell("E");
        let size: u32 = cell("F").parse().unwrap_or(0);
        let attribute_byte =
            u8::from_str_radix(cell("G").trim_start_matches("0x"), 16).unwrap_or(0);
        let mtime = NaiveDateTime::parse_from_str(&cell("H"), "%Y-%m-%d %H:%M:%S")
            .map_err(|err| Error::StoreIo(format!("invalid mtime in store: {err}")))?;
        let start_cluster: u32 = cell("I").parse().unwrap_or(0);
        let deleted = cell("J") == "!";
        let path_value = cell("K");
        let reserved_sectors: u16 = cell("L").parse().unwrap_or(0);
        let bytes_per_sector: u16 = cell("M").parse().unwrap_or(0);
        let fat_size_sectors: u32 = cell("N").parse().unwrap_or(0);
        let cluster_size: u32 = cell("O").parse().unwrap_or(0);
        let data_start_byte: u64 = cell("P").parse().unwrap_or(0);

        rows.push(StoreRow {
            restore,
            byte_offset_in_device,
            containing_cluster,
            filename,
            file_type,
            size,
            attribute_byte,
            mtime,
            start_cluster,
            deleted,
            path: path_value,
            reserved_sectors,
            bytes_per_sector,
            fat_size_sectors,
            cluster_size,
            data_start_byte,
        });
    }
    Ok(rows)
}

/// Rewrites the store with the given rows, e.g. after restore mode clears
/// the `restore` flag on every row it salvaged.
pub fn save_in_place(rows: &[StoreRow], path: &Path) -> salvage_err::Result<()> {
    write_rows(rows, path)
}

fn write_rows(rows: &[StoreRow], path: &Path) -> salvage_err::Result<()> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_by_name_mut("Sheet1")
        .ok_or_else(|| Error::StoreIo("default worksheet missing".to_string()))?;
    sheet.set_name(SHEET_TITLE);

    for (col, header) in HEADERS.iter().enumerate() {
        let cell = format!("{}{}", column_letter(col), 1);
        sheet.get_cell_mut(cell.as_str()).set_value(*header);
    }

    for (row_index, row) in rows.iter().enumerate() {
        let row_number = row_index + 2;
        let values: [String; 16] = [
            if row.restore { "1".to_string() } else { String::new() },
            row.byte_offset_in_device.to_string(),
            row.containing_cluster.to_string(),
            row.filename.clone(),
            row.file_type.clone(),
            row.size.to_string(),
            format!("0x{:02X}", row.attribute_byte),
            row.mtime.format("%Y-%m-%d %H:%M:%S").to_string(),
            row.start_cluster.to_string(),
            if row.deleted { "!".to_string() } else { String::new() },
            row.path.clone(),
            row.reserved_sectors.to_string(),
            row.bytes_per_sector.to_string(),
            row.fat_size_sectors.to_string(),
            row.cluster_size.to_string(),
            row.data_start_byte.to_string(),
        ];
        for (col, value) in values.iter().enumerate() {
            let cell = format!("{}{}", column_letter(col), row_number);
            sheet.get_cell_mut(cell.as_str()).set_value(value.as_str());
        }
    }

    umya_spreadsheet::writer::xlsx::write(&book, path)
        .map_err(|err| Error::StoreIo(err.to_string()))
}

fn column_letter(zero_based_index: usize) -> char {
    (b'A' + zero_based_index as u8) as char
}
