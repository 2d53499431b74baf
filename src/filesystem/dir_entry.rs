//! FAT directory entry structure and parsing.
//!
//! This module implements the FAT directory entry structure which contains metadata
//! about files and directories stored in the filesystem. Each directory entry is 32 bytes
//! and contains information such as filename, attributes, timestamps, and cluster allocation.

use binread::{BinRead, BinReaderExt};
use bitflags::bitflags;
use getset::Getters;
use std::fmt;
use std::io;

use crate::filesystem::fat_error::FATError;

/// Size in bytes of a directory entry.
pub const DIR_ENTRY_SIZE: usize = 32;
/// First name byte of the slot ending a directory.
pub const END_OF_DIR: u8 = 0x00;
/// First name byte of a deleted slot.
pub const FREE_ENTRY: u8 = 0xE5;
/// First name byte standing for a literal 0xE5 in Kanji locales.
pub const KANJI_ESCAPE: u8 = 0x05;

bitflags! {
    /// Attribute byte of a directory entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Attributes: u8 {
        const READ_ONLY = 0x01;
        const HIDDEN = 0x02;
        const SYSTEM = 0x04;
        const VOLUME_ID = 0x08;
        const DIRECTORY = 0x10;
        const ARCHIVE = 0x20;
        /// Marker combination of VFAT long name slots
        const LONG_NAME = 0x0F;
    }
}

/// State of a directory slot, decided by the first byte of its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// No entry follows in this directory.
    EndOfDirectory,
    /// The slot is free (also used for Kanji escaped names, which are not decoded).
    Deleted,
    /// The slot describes a file, a directory or a volume label.
    Live,
}

/// FAT directory entry structure.
///
/// Each directory entry is exactly 32 bytes and contains metadata about a file or directory.
/// The structure follows Microsoft's FAT specification for directory entries.
///
/// # Notes
/// - Timestamp fields are prefixed with underscore as they're not currently used
/// - The name field uses the legacy 8.3 format with space padding
#[derive(BinRead, Debug, Clone, Getters)]
#[br(little)]
pub struct DirEntry {
    /// Filename in 8.3 format (8 characters name + 3 characters extension)
    #[get = "pub"]
    name: [u8; 11],
    /// File attributes
    #[br(map = |bits: u8| Attributes::from_bits_retain(bits))]
    #[get = "pub"]
    attr: Attributes,
    /// NT reserved (unused)
    _n_t_res: u8,
    /// Creation time in 10ms units
    _ctr_time_tenth: u8,
    /// Creation time
    _crt_time: u16,
    /// Creation date
    _crt_date: u16,
    /// Last access date
    _lst_acc_date: u16,
    /// High 16 bits of first cluster number
    #[get = "pub"]
    fst_clus_hi: u16,
    /// Last write time
    _wrt_time: u16,
    /// Last write date
    _wrt_date: u16,
    /// Low 16 bits of first cluster number
    #[get = "pub"]
    fst_clus_lo: u16,
    /// File size in bytes (0 for directories)
    #[get = "pub"]
    file_size: u32,
}

impl DirEntry {
    /// Creates a directory entry from a byte slice.
    ///
    /// # Errors
    /// - `FATError::TruncatedRecord` if the slice is not exactly 32 bytes long
    pub fn from_slice(buf: &[u8]) -> Result<Self, FATError> {
        if buf.len() != DIR_ENTRY_SIZE {
            return Err(FATError::TruncatedRecord {
                expected: DIR_ENTRY_SIZE,
                found: buf.len(),
            });
        }

        let mut reader = io::Cursor::new(buf);
        reader.read_le().map_err(FATError::from)
    }

    /// Classifies the slot from the first byte of its name.
    pub fn kind(&self) -> EntryKind {
        match self.name[0] {
            END_OF_DIR => EntryKind::EndOfDirectory,
            FREE_ENTRY | KANJI_ESCAPE => EntryKind::Deleted,
            _ => EntryKind::Live,
        }
    }

    /// Returns the complete first cluster number for this entry.
    ///
    /// Combines `fst_clus_hi` and `fst_clus_lo`: `(fst_clus_hi << 16) | fst_clus_lo`
    pub fn cluster_number(&self) -> u32 {
        ((self.fst_clus_hi as u32) << 16) | self.fst_clus_lo as u32
    }

    /// Checks if this directory entry represents a directory.
    pub fn is_dir(&self) -> bool {
        !self.is_long_name() && self.attr.contains(Attributes::DIRECTORY)
    }

    /// Checks if this entry is the volume label of the filesystem.
    pub fn is_volume_id(&self) -> bool {
        !self.is_long_name() && self.attr.contains(Attributes::VOLUME_ID)
    }

    /// Checks if this entry is a VFAT long name slot.
    pub fn is_long_name(&self) -> bool {
        self.attr.contains(Attributes::LONG_NAME)
    }

    /// Checks if this entry is a regular file.
    pub fn is_file(&self) -> bool {
        !self.is_dir() && !self.is_volume_id() && !self.is_long_name()
    }

    /// Returns the display name of the entry.
    ///
    /// Long name slots are not decoded: their raw name bytes are returned as is.
    pub fn name_str(&self) -> String {
        if self.is_long_name() {
            self.name.iter().map(|b| *b as char).collect()
        } else {
            display_name(&self.name, self.is_dir())
        }
    }

    /// Checks if the entry's display name matches `name`, ignoring ASCII case.
    pub fn same_short_name(&self, name: &str) -> bool {
        self.name_str().eq_ignore_ascii_case(name)
    }
}

/// Normalizes a packed 8.3 name into its display form.
///
/// Base (bytes 0-7) and extension (bytes 8-10) are right-trimmed independently. A non-empty
/// extension is appended after a `.`. Directories never get the `.`: their extension bytes,
/// if any, are appended directly to the base.
pub fn display_name(raw: &[u8; 11], is_dir: bool) -> String {
    let base = trim_spaces(&raw[0..8]);
    let ext = trim_spaces(&raw[8..11]);

    let mut name: String = base.iter().map(|b| *b as char).collect();
    if !ext.is_empty() {
        if !is_dir {
            name.push('.');
        }
        name.extend(ext.iter().map(|b| *b as char));
    }

    name
}

/// Checks that every character of a display name is printable ASCII (`0x21`-`0x7E`).
///
/// Names failing this check come from slots holding bytes that cannot be shown or typed back.
pub fn is_valid_display_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || ('\x21'..='\x7E').contains(&c))
}

fn trim_spaces(raw: &[u8]) -> &[u8] {
    let end = raw
        .iter()
        .rposition(|b| *b != b' ')
        .map_or(0, |pos| pos + 1);
    &raw[..end]
}

impl fmt::Display for DirEntry {
    /// Formats the directory entry for display.
    ///
    /// # Returns
    /// - A string representation showing the filename and file size
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name_str();
        if is_valid_display_name(&name) {
            write!(f, "\"{}\" {}B", name, self.file_size)
        } else {
            write!(f, "\"{:?}\" {}B", self.name, self.file_size)
        }
    }
}
