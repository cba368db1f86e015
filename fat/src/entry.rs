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

use chrono::NaiveDateTime;

/// A directory entry's attribute projected down to the two kinds this tool
/// cares about, rather than threading the raw attribute byte through every
/// downstream consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// A candidate record emitted by the directory-entry scanner.
#[derive(Debug, Clone)]
pub struct ScanRecord {
    pub byte_offset_in_device: u64,
    pub containing_cluster: u32,
    pub filename: String,
    pub short_extension: String,
    pub size: u32,
    pub attribute_byte: u8,
    pub kind: EntryKind,
    pub start_cluster: u32,
    pub mtime: NaiveDateTime,
    pub deleted: bool,
    /// Populated by the path reconstructor; `None` until pass 2 runs.
    pub path: Option<String>,
}

impl ScanRecord {
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}
