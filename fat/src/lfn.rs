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

use salvage_err::ScanError;

/// A single long-filename directory-entry slice: 13 UTF-16 code units
/// spread across the record's three non-contiguous name ranges.
#[derive(Debug, Clone)]
struct LfnSlice {
    seq: u8,
    units: [u16; 13],
}

/// LFN assembly as an explicit state machine rather than an implicit
/// "is the buffer non-empty" check, per the redesign note: a mismatched
/// sequence count is a pure transition back to `Idle`, not a special case
/// threaded through the caller.
#[derive(Debug, Default)]
pub(crate) enum LfnState {
    #[default]
    Idle,
    Collecting(Vec<LfnSlice>),
}

impl LfnState {
    /// Records one LFN slice record, in the order the scanner encountered
    /// it (physically descending, logically ascending).
    pub(crate) fn push_slice(&mut self, record: &[u8]) {
        let seq = record[0];
        let units = decode_units(record);
        match self {
            LfnState::Idle => *self = LfnState::Collecting(vec![LfnSlice { seq, units }]),
            LfnState::Collecting(slices) => slices.push(LfnSlice { seq, units }),
        }
    }

    /// An unused/terminator entry (`attribute_byte == 0x00`) discards any
    /// in-progress LFN buffer.
    pub(crate) fn reset(&mut self) {
        *self = LfnState::Idle;
    }

    /// Resolves the collected slices into a filename if the sequence is
    /// well-formed, and always resets to `Idle` afterward (an SFN record
    /// always clears the buffer, whether or not it used it).
    pub(crate) fn resolve(&mut self) -> Result<Option<String>, ScanError> {
        let slices = match std::mem::take(self) {
            LfnState::Idle => return Ok(None),
            LfnState::Collecting(slices) => slices,
        };

        let Some(first) = slices.first() else {
            return Ok(None);
        };
        if first.seq & 0x40 == 0 || (first.seq & 0x3F) as usize != slices.len() {
            return Err(ScanError::LfnChecksumMismatch);
        }

        let mut ordered = slices;
        ordered.sort_by_key(|slice| slice.seq & 0x3F);

        let code_units: Vec<u16> = ordered.iter().flat_map(|slice| slice.units).collect();
        let terminator = code_units
            .iter()
            .position(|&unit| unit == 0x0000)
            .unwrap_or(code_units.len());

        let name = String::from_utf16_lossy(&code_units[..terminator]);
        Ok(Some(sanitize(&name)))
    }
}

fn decode_units(record: &[u8]) -> [u16; 13] {
    let mut bytes = [0u8; 26];
    bytes[0..10].copy_from_slice(&record[1..11]);
    bytes[10..22].copy_from_slice(&record[14..26]);
    bytes[22..26].copy_from_slice(&record[28..32]);

    let mut units = [0u16; 13];
    for (i, chunk) in bytes.chunks_exact(2).enumerate() {
        units[i] = u16::from_le_bytes([chunk[0], chunk[1]]);
    }
    units
}

/// Strips control codepoints (`< 0x20` and `0x7F`), matching the scanner's
/// sanitization of SFN-decoded names.
pub(crate) fn sanitize(value: &str) -> String {
    value
        .chars()
        .filter(|&c| (c as u32) >= 0x20 && c as u32 != 0x7F)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encodes a full long filename into its on-disk LFN slice records, in
    /// logical (ascending sequence) order, the way a FAT32 driver would
    /// write them.
    fn encode_lfn_slices(name: &str) -> Vec<[u8; 32]> {
        let mut units: Vec<u16> = name.encode_utf16().collect();
        units.push(0x0000);
        while units.len() % 13 != 0 {
            units.push(0xFFFF);
        }

        let slice_count = units.len() / 13;
        units
            .chunks_exact(13)
            .enumerate()
            .map(|(i, chunk)| {
                let seq = (i as u8 + 1) | if i + 1 == slice_count { 0x40 } else { 0 };
                let mut record = [0u8; 32];
                record[0] = seq;
                record[11] = 0x0F;
                let bytes: Vec<u8> = chunk.iter().flat_map(|u| u.to_le_bytes()).collect();
                record[1..11].copy_from_slice(&bytes[0..10]);
                record[14..26].copy_from_slice(&bytes[10..22]);
                record[28..32].copy_from_slice(&bytes[22..26]);
                record
            })
            .collect()
    }

    #[test]
    fn assembles_two_slices_in_reverse_order() {
        let mut state = LfnState::default();
        // The scanner walks the device forward, so it meets the
        // last-logical slice first (physical order is reversed).
        for record in encode_lfn_slices("report_final.pdf").into_iter().rev() {
            state.push_slice(&record);
        }

        let name = state.resolve().unwrap().unwrap();
        assert_eq!(name, "report_final.pdf");
    }

    #[test]
    fn mismatched_sequence_count_is_a_checksum_error() {
        let mut state = LfnState::default();
        // The final slice's sequence byte (0x40 | 2) claims two slices
        // make up the name, but only it was ever pushed.
        let slices = encode_lfn_slices("a needlessly long file name.txt");
        state.push_slice(slices.last().unwrap());
        assert!(matches!(state.resolve(), Err(ScanError::LfnChecksumMismatch)));
    }

    #[test]
    fn reset_clears_buffer() {
        let mut state = LfnState::default();
        state.push_slice(&encode_lfn_slices("x")[0]);
        state.reset();
        assert!(state.resolve().unwrap().is_none());
    }
}
