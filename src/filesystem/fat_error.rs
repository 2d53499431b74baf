//! Error types for FAT32 volume navigation.
//!
//! Every failure of the navigator is returned as a [`FATError`]. Opening a volume fails on
//! signature mismatches or unsupported FAT variants; walking the volume fails on I/O errors,
//! broken cluster chains and lookup misses. None of them terminate the process.

use std::io;
use thiserror::Error;

use super::fat_type::FATType;

/// Errors that can occur while opening or navigating a FAT32 volume.
#[derive(Error, Debug)]
pub enum FATError {
    /// The boot sector failed a signature or geometry check.
    #[error("Invalid boot sector: {0}")]
    InvalidBootSector(String),

    /// The FSInfo sector does not carry the expected lead and trail signatures.
    #[error(
        "Invalid FSInfo sector: lead signature 0x{lead:08X}, trail signature 0x{trail:08X}. Expected 0x41615252 and 0xAA550000"
    )]
    InvalidFsInfo { lead: u32, trail: u32 },

    /// The volume is not a FAT32 volume.
    #[error("Unsupported FAT type: `{0}`. Only FAT32 is supported")]
    UnsupportedFATType(FATType),

    /// A fixed-size record was decoded from a buffer of the wrong length.
    #[error("Truncated record: expected {expected} bytes, found {found}")]
    TruncatedRecord { expected: usize, found: usize },

    /// A cluster number outside of the data region was met.
    #[error("Invalid cluster number `{0}`")]
    InvalidCluster(u32),

    /// A directory or file lookup did not match any entry.
    #[error("Not found: `{0}`")]
    NotFound(String),

    /// The cluster chain of a file ends before its declared size is reached.
    #[error("Truncated file: {written} of {declared} declared bytes available in the cluster chain")]
    TruncatedFile { declared: u32, written: u64 },

    /// A cluster chain loops back onto an already visited cluster.
    #[error("Cycle detected in cluster chain at cluster `{0}`")]
    CycleDetected(u32),

    /// Underlying I/O errors that occur while reading the image.
    #[error("IO Error: `{0}`")]
    IOError(io::Error),

    /// Parsing error occured during structure initialization
    #[error("BinRead Error: `{0}`")]
    BinReadError(binread::Error),
}

/// Converts standard I/O errors into FATError.
impl From<io::Error> for FATError {
    fn from(err: io::Error) -> Self {
        FATError::IOError(err)
    }
}

/// Converts BinRead errors into FATError.
impl From<binread::Error> for FATError {
    fn from(err: binread::Error) -> Self {
        FATError::BinReadError(err)
    }
}
