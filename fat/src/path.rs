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

use std::collections::HashMap;

use crate::entry::{EntryKind, ScanRecord};

const ROOT: &str = "ROOT";

/// Pass 1: maps each non-deleted directory's `start_cluster` to its index
/// in `records`, so pass 2 can walk parent chains without re-scanning the
/// whole list per record.
fn directory_by_start_cluster(records: &[ScanRecord]) -> HashMap<u32, usize> {
    let mut map = HashMap::new();
    for (index, record) in records.iter().enumerate() {
        if record.kind == EntryKind::Directory && !record.deleted {
            map.entry(record.start_cluster).or_insert(index);
        }
    }
    map
}

/// Walks ancestor directories for a single record's `containing_cluster`,
/// prepending `ROOT` at the root, at an orphaned cluster, or when the
/// cycle-guard trips.
fn resolve_path(
    containing_cluster: u32,
    records: &[ScanRecord],
    directories: &HashMap<u32, usize>,
    directory_count: usize,
) -> Vec<String> {
    let mut segments = Vec::new();
    let mut cursor = containing_cluster;
    let mut steps = 0;

    loop {
        if cursor == 0 || cursor == 2 {
            segments.push(ROOT.to_string());
            break;
        }
        if steps > directory_count {
            segments.clear();
            segments.push(ROOT.to_string());
            break;
        }
        steps += 1;

        match directories.get(&cursor) {
            Some(&index) => {
                let parent = &records[index];
                segments.push(parent.filename.clone());
                cursor = parent.containing_cluster;
            }
            None => {
                segments.push(ROOT.to_string());
                break;
            }
        }
    }

    segments.reverse();
    segments
}

/// Populates every record's `path` field in place by chaining through
/// parent directories keyed by starting cluster. Idempotent: running
/// it twice over the same slice produces the same paths both times, since
/// it only reads `containing_cluster`/`start_cluster`/`filename` and writes
/// `path`.
pub fn reconstruct_paths(records: &mut [ScanRecord]) {
    let directories = directory_by_start_cluster(records);
    let directory_count = directories.len();

    let paths: Vec<String> = records
        .iter()
        .map(|record| {
            resolve_path(record.containing_cluster, records, &directories, directory_count)
                .join(std::path::MAIN_SEPARATOR_STR)
        })
        .collect();

    for (record, path) in records.iter_mut().zip(paths) {
        record.path = Some(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn record(
        start_cluster: u32,
        containing_cluster: u32,
        filename: &str,
        kind: EntryKind,
        deleted: bool,
    ) -> ScanRecord {
        ScanRecord {
            byte_offset_in_device: 0,
            containing_cluster,
            filename: filename.to_string(),
            short_extension: String::new(),
            size: if kind == EntryKind::Directory { 0 } else { 128 },
            attribute_byte: 0,
            kind,
            start_cluster,
            mtime: NaiveDateTime::UNIX_EPOCH,
            deleted,
            path: None,
        }
    }

    #[test]
    fn root_child_resolves_to_root() {
        let mut records = vec![record(10, 2, "REPORT.PDF", EntryKind::File, false)];
        reconstruct_paths(&mut records);
        assert_eq!(records[0].path.as_deref(), Some("ROOT"));
    }

    #[test]
    fn nested_directory_chains_to_root() {
        // PHOTOS (start_cluster=20) lives directly under root (cluster 2).
        // pic.jpg lives inside PHOTOS (containing_cluster=20).
        let mut records = vec![
            record(20, 2, "PHOTOS", EntryKind::Directory, false),
            record(30, 20, "PIC.JPG", EntryKind::File, false),
        ];
        reconstruct_paths(&mut records);
        let expected = format!("ROOT{}PHOTOS", std::path::MAIN_SEPARATOR);
        assert_eq!(records[1].path.as_deref(), Some(expected.as_str()));
    }

    #[test]
    fn orphaned_parent_falls_back_to_root() {
        // containing_cluster 99 has no matching directory record.
        let mut records = vec![record(10, 99, "ORPHAN.TXT", EntryKind::File, false)];
        reconstruct_paths(&mut records);
        assert_eq!(records[0].path.as_deref(), Some("ROOT"));
    }

    #[test]
    fn cycle_guard_stops_and_falls_back_to_root() {
        // Two directories whose containing_cluster point at each other,
        // neither ever reaching cluster 2: walking would loop forever
        // without the guard.
        let mut records = vec![
            record(40, 50, "A", EntryKind::Directory, false),
            record(50, 40, "B", EntryKind::Directory, false),
        ];
        reconstruct_paths(&mut records);
        assert_eq!(records[0].path.as_deref(), Some(ROOT));
        assert_eq!(records[1].path.as_deref(), Some(ROOT));
    }

    #[test]
    fn deleted_directory_is_not_used_as_a_parent() {
        // A deleted directory must not satisfy lookups for records that
        // still reference its start_cluster as their containing_cluster.
        let mut records = vec![
            record(20, 2, "GONE", EntryKind::Directory, true),
            record(30, 20, "FILE.TXT", EntryKind::File, false),
        ];
        reconstruct_paths(&mut records);
        assert_eq!(records[1].path.as_deref(), Some("ROOT"));
    }
}
