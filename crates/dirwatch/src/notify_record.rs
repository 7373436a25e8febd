//! Decoding of the raw change buffer filled by `ReadDirectoryChangesW`.
//!
//! The buffer holds a chain of variable-length `FILE_NOTIFY_INFORMATION`
//! records. Each record is laid out as:
//!
//! | offset | size | field                                         |
//! |--------|------|-----------------------------------------------|
//! | 0      | 4    | `NextEntryOffset`, 0 for the last record      |
//! | 4      | 4    | `Action`                                      |
//! | 8      | 4    | `FileNameLength`, in bytes                    |
//! | 12     | n    | `FileName`, UTF-16LE without a null terminator |
//!
//! Fields are read one at a time from little-endian bytes instead of casting
//! the buffer to a native struct, so decoding is bounds-checked and works on
//! every platform (which is also what lets it be tested off Windows).

use crate::RenameEvent;

const NEXT_ENTRY_OFFSET_AT: usize = 0;
const ACTION_AT: usize = 4;
const FILE_NAME_LENGTH_AT: usize = 8;

/// Size of the fixed part of a record, before the file name.
pub const RECORD_HEADER_LEN: usize = 12;

/// The `Action` field of a notification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyAction {
    Added,
    Removed,
    Modified,
    RenamedOldName,
    RenamedNewName,
    Unknown(u32),
}

impl NotifyAction {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => NotifyAction::Added,
            2 => NotifyAction::Removed,
            3 => NotifyAction::Modified,
            4 => NotifyAction::RenamedOldName,
            5 => NotifyAction::RenamedNewName,
            other => NotifyAction::Unknown(other),
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            NotifyAction::Added => 1,
            NotifyAction::Removed => 2,
            NotifyAction::Modified => 3,
            NotifyAction::RenamedOldName => 4,
            NotifyAction::RenamedNewName => 5,
            NotifyAction::Unknown(other) => other,
        }
    }
}

/// One decoded notification record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyRecord {
    pub action: NotifyAction,
    pub file_name: String,
}

/// Iterator over every record in a change buffer, in buffer order.
///
/// Iteration ends at the record whose next offset is 0, at an offset that
/// points outside the valid bytes, or at a record that would read past the
/// valid bytes. None of these are errors: the OS only guarantees complete
/// records up to the length it reported.
pub struct NotifyRecords<'a> {
    buffer: &'a [u8],
    next: Option<usize>,
}

impl<'a> NotifyRecords<'a> {
    /// `valid_len` is the byte count the OS reported as written. Anything
    /// after it is stale data from an earlier read and is never looked at.
    pub fn new(buffer: &'a [u8], valid_len: usize) -> Self {
        let buffer = &buffer[..valid_len.min(buffer.len())];
        let next = if buffer.is_empty() { None } else { Some(0) };

        Self { buffer, next }
    }
}

impl Iterator for NotifyRecords<'_> {
    type Item = NotifyRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.next.take()?;

        let header_end = offset.checked_add(RECORD_HEADER_LEN)?;
        let Some(header) = self.buffer.get(offset..header_end) else {
            log::debug!(
                "Change buffer truncated inside a record header at offset {}",
                offset
            );
            return None;
        };

        let next_entry_offset = read_u32(header, NEXT_ENTRY_OFFSET_AT) as usize;
        let action = NotifyAction::from_raw(read_u32(header, ACTION_AT));
        let name_len = read_u32(header, FILE_NAME_LENGTH_AT) as usize;

        let name_end = header_end.checked_add(name_len)?;
        let Some(name_bytes) = self.buffer.get(header_end..name_end) else {
            log::debug!(
                "Change buffer truncated inside a file name at offset {} (name length {})",
                header_end,
                name_len
            );
            return None;
        };

        if next_entry_offset > 0 {
            if let Some(following) = offset.checked_add(next_entry_offset) {
                if following < self.buffer.len() {
                    self.next = Some(following);
                }
            }
        }

        Some(NotifyRecord {
            action,
            file_name: decode_utf16le(name_bytes),
        })
    }
}

/// Iterator that pairs "renamed old name" and "renamed new name" records
/// into [`RenameEvent`]s.
///
/// A new-name record that arrives with no pending old name (the old half was
/// lost to a truncated or overflowed buffer) is dropped. This is lossy by
/// nature: the rename cannot be reconstructed from half a pair.
pub struct RenamePairs<'a> {
    records: NotifyRecords<'a>,
    pending_old_name: Option<String>,
}

impl<'a> RenamePairs<'a> {
    pub fn new(buffer: &'a [u8], valid_len: usize) -> Self {
        Self {
            records: NotifyRecords::new(buffer, valid_len),
            pending_old_name: None,
        }
    }
}

impl Iterator for RenamePairs<'_> {
    type Item = RenameEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = self.records.next()?;

            match record.action {
                NotifyAction::RenamedOldName => {
                    self.pending_old_name = Some(record.file_name);
                }
                NotifyAction::RenamedNewName => match self.pending_old_name.take() {
                    Some(old_name) => {
                        return Some(RenameEvent {
                            old_name,
                            new_name: record.file_name,
                        });
                    }
                    None => {
                        log::debug!(
                            "Dropping rename to '{}': no old name preceded it",
                            record.file_name
                        );
                    }
                },
                _ => {}
            }
        }
    }
}

/// Shorthand for [`RenamePairs::new`].
pub fn rename_pairs(buffer: &[u8], valid_len: usize) -> RenamePairs<'_> {
    RenamePairs::new(buffer, valid_len)
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(raw)
}

fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    String::from_utf16_lossy(&units)
}
