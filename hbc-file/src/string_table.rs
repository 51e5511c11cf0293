//! String table entries and string materialization.

use std::fmt;
use std::ops::Range;

use crate::error::{Error, Result};

/// Index into a module's string table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StringId(pub u32);

impl fmt::Display for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Code unit width of a string in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringEncoding {
    /// One byte per code unit (Latin-1).
    Narrow,
    /// Two bytes per code unit (UTF-16, little endian).
    Wide,
}

impl StringEncoding {
    pub const fn unit_size(self) -> usize {
        match self {
            Self::Narrow => 1,
            Self::Wide => 2,
        }
    }
}

/// Location of one string in the backing storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringTableEntry {
    offset: u32,
    length: u32,
    encoding: StringEncoding,
}

impl StringTableEntry {
    /// `length` counts code units, not bytes.
    pub const fn new(offset: u32, length: u32, encoding: StringEncoding) -> Self {
        Self {
            offset,
            length,
            encoding,
        }
    }

    /// Byte offset into the string storage.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Length in code units.
    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn encoding(&self) -> StringEncoding {
        self.encoding
    }

    pub fn is_wide(&self) -> bool {
        self.encoding == StringEncoding::Wide
    }

    /// Byte range of the string within a storage blob of `storage_len` bytes.
    pub fn byte_range(&self, storage_len: usize) -> Result<Range<usize>> {
        let start = self.offset as usize;
        let end = (self.length as usize)
            .checked_mul(self.encoding.unit_size())
            .and_then(|n| n.checked_add(start))
            .ok_or(Error::OffsetOutOfBounds(start, storage_len))?;
        if end > storage_len {
            return Err(Error::OffsetOutOfBounds(end, storage_len));
        }
        Ok(start..end)
    }
}

/// Materialize the string described by `entry` from `storage`.
///
/// Narrow code units map one-to-one onto U+0000..=U+00FF. Wide code units
/// are UTF-16; unpaired surrogates become U+FFFD.
pub fn read_string(storage: &[u8], entry: &StringTableEntry) -> Result<String> {
    let bytes = &storage[entry.byte_range(storage.len())?];
    Ok(match entry.encoding {
        StringEncoding::Narrow => bytes.iter().map(|&b| b as char).collect(),
        StringEncoding::Wide => {
            let units = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
            char::decode_utf16(units)
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        }
    })
}

/// Pick the narrowest encoding able to hold `s`.
pub(crate) fn encoding_for(s: &str) -> StringEncoding {
    if s.chars().all(|c| (c as u32) <= 0xFF) {
        StringEncoding::Narrow
    } else {
        StringEncoding::Wide
    }
}

/// Append `s` to `storage` in `encoding`, returning the code unit count.
pub(crate) fn write_string(storage: &mut Vec<u8>, s: &str, encoding: StringEncoding) -> u32 {
    match encoding {
        StringEncoding::Narrow => {
            let before = storage.len();
            storage.extend(s.chars().map(|c| c as u32 as u8));
            (storage.len() - before) as u32
        }
        StringEncoding::Wide => {
            let mut units = 0u32;
            for unit in s.encode_utf16() {
                storage.extend_from_slice(&unit.to_le_bytes());
                units += 1;
            }
            units
        }
    }
}
