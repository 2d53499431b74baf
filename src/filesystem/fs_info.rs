//! FAT32 FSInfo sector.
//!
//! The FSInfo sector caches the count of free clusters and a hint for the next free cluster.
//! Both values are advisory: `0xFFFFFFFF` means the value is unknown.

use binread::{BinRead, BinReaderExt};
use getset::Getters;
use std::io;

use super::fat_error::FATError;
use crate::utils;

/// Size in bytes of the FSInfo record.
pub const FS_INFO_SIZE: usize = 512;
/// Lead signature of the FSInfo sector.
pub const FSI_LEAD_SIG: u32 = 0x41615252;
/// Trail signature of the FSInfo sector.
pub const FSI_TRAIL_SIG: u32 = 0xAA550000;
/// Value of `free_count` and `nxt_free` when unknown.
pub const FSI_UNKNOWN: u32 = 0xFFFFFFFF;

/// FSInfo structure of a FAT32 volume.
#[derive(BinRead, Debug, Getters)]
#[br(little)]
pub struct FSInfo {
    /// Lead signature (0x41615252)
    #[get = "pub"]
    lead_sig: u32,
    #[br(count = 480)]
    _reserved_1: Vec<u8>,
    /// Structure signature (0x61417272)
    #[get = "pub"]
    struc_sig: u32,
    /// Last known count of free clusters
    #[get = "pub"]
    free_count: u32,
    /// Hint for the next free cluster
    #[get = "pub"]
    nxt_free: u32,
    _reserved_2: [u8; 12],
    /// Trail signature (0xAA550000)
    #[get = "pub"]
    trail_sig: u32,
}

impl FSInfo {
    /// Reads and validates the FSInfo record stored at `sector`.
    ///
    /// # Errors
    /// - `FATError::IOError` if the sector cannot be read
    /// - `FATError::InvalidFsInfo` if the lead or trail signature is wrong
    pub fn from<T: io::Read + io::Seek>(
        src: &mut T,
        sector: u16,
        sector_size: usize,
    ) -> Result<FSInfo, FATError> {
        let mut buf = vec![0; sector_size];
        utils::read_sector(src, sector.into(), sector_size, &mut buf)?;

        Self::from_slice(&buf)
    }

    /// Decodes and validates an FSInfo record held in memory.
    pub fn from_slice(buf: &[u8]) -> Result<FSInfo, FATError> {
        if buf.len() < FS_INFO_SIZE {
            return Err(FATError::TruncatedRecord {
                expected: FS_INFO_SIZE,
                found: buf.len(),
            });
        }

        let mut reader = io::Cursor::new(buf);
        let fs_info: FSInfo = reader.read_le()?;

        if fs_info.lead_sig != FSI_LEAD_SIG || fs_info.trail_sig != FSI_TRAIL_SIG {
            return Err(FATError::InvalidFsInfo {
                lead: fs_info.lead_sig,
                trail: fs_info.trail_sig,
            });
        }

        Ok(fs_info)
    }

    /// Count of free clusters, `None` when the volume does not track it.
    pub fn known_free_count(&self) -> Option<u32> {
        match self.free_count {
            FSI_UNKNOWN => None,
            count => Some(count),
        }
    }
}
