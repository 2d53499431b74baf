//! FAT32 boot sector and BIOS Parameter Block (Bpb).
//!
//! This module implements:
//! - Boot sector parsing
//! - Signature and geometry validation
//! - FAT type detection (FAT12/16/32), rejecting everything but FAT32

use binread::{BinRead, BinReaderExt};
use getset::Getters;
use log::debug;
use std::io;

use super::fat_error::FATError;
use super::fat_type::FATType;
use crate::utils::{self, padded_str};

/// Size in bytes of the boot sector record.
pub const BOOT_SECTOR_SIZE: usize = 512;
/// Extended boot signature expected in `boot_sig`.
pub const EXT_BOOT_SIG: u8 = 0x29;
/// Trailing signature of the boot sector.
pub const BOOT_SIG: [u8; 2] = [0x55, 0xAA];
/// Size in bytes of a directory entry, used to size the legacy root directory.
const DIR_ENTRY_SIZE: u32 = 32;
/// Size in bytes of a FAT32 table entry.
const FAT32_ENTRY_SIZE: u64 = 4;

/// BIOS Parameter Block structure for FAT filesystems.
///
/// The Bpb contains essential information about the filesystem layout and properties.
/// This implementation follows Microsoft's FAT32 specification.
#[derive(BinRead, Debug, Getters)]
#[br(little)]
pub struct Bpb {
    /// Jump instruction to boot code
    _jmp: [u8; 3],
    /// OEM identifier (e.g., "MSWIN4.1")
    #[get = "pub"]
    oem_name: [u8; 8],
    /// Number of bytes per sector (512, 1024, 2048, or 4096)
    #[get = "pub"]
    bytes_per_sec: u16,
    /// Number of sectors per cluster (power of 2: 1, 2, 4, 8, 16, 32, 64, or 128)
    #[get = "pub"]
    sec_per_clus: u8,
    /// Number of reserved sectors from start of volume
    #[get = "pub"]
    rsvd_sec_cnt: u16,
    /// Number of FAT copies (typically 2 for redundancy)
    #[get = "pub"]
    num_fat: u8,
    /// Maximum number of root directory entries (0 for FAT32)
    #[get = "pub"]
    root_ent_cnt: u16,
    /// Total sectors for volumes < 32MB (0 for FAT32)
    #[get = "pub"]
    tot_sec_16: u16,
    /// Media descriptor (0xF8 for fixed disk)
    #[get = "pub"]
    media: u8,
    /// Sectors per FAT for FAT12/FAT16 (0 for FAT32)
    #[get = "pub"]
    fat_sz_16: u16,
    /// Sectors per track
    #[get = "pub"]
    sec_per_trk: u16,
    /// Number of heads
    #[get = "pub"]
    num_heads: u16,
    /// Number of hidden sectors preceding the partition
    #[get = "pub"]
    hidd_sec: u32,
    /// Total sectors for volumes >= 32MB
    #[get = "pub"]
    tot_sec_32: u32,

    // FAT32-specific fields
    /// Sectors per FAT
    #[get = "pub"]
    fat_sz_32: u32,
    /// FAT flags (mirroring, active FAT)
    #[get = "pub"]
    ext_flags: u16,
    /// Filesystem version, major in the high byte
    #[get = "pub"]
    fs_ver: u16,
    /// First cluster of root directory (typically 2)
    #[get = "pub"]
    root_clus: u32,
    /// Sector number of FSINFO structure
    #[get = "pub"]
    fs_info: u16,
    /// Sector number of backup boot sector
    #[get = "pub"]
    bk_boot_sec: u16,
    /// Reserved for future expansion
    _reserved: [u8; 12],
    /// Drive number (0x80 for hard disk)
    #[get = "pub"]
    drv_num: u8,
    /// Reserved (used by Windows NT)
    _reserved_1: u8,
    /// Extended boot signature (0x29)
    #[get = "pub"]
    boot_sig: u8,
    /// Volume serial number
    #[get = "pub"]
    vol_id: u32,
    /// Volume label (11 bytes)
    #[get = "pub"]
    vol_lab: [u8; 11],
    /// Filesystem type label ("FAT32   ")
    #[get = "pub"]
    fil_sys_type: [u8; 8],

    /// Boot code (not part of Bpb specification)
    #[br(count = 420)]
    _boot_code: Vec<u8>,
    /// Boot sector signature (0x55 0xAA)
    #[get = "pub"]
    sig: [u8; 2],
}

impl Bpb {
    /// Reads and validates the boot sector found at offset 0 of the image.
    ///
    /// # Errors
    /// - `FATError::IOError` if the boot sector cannot be read
    /// - `FATError::InvalidBootSector` if a signature or geometry check fails
    /// - `FATError::UnsupportedFATType` if the volume is FAT12 or FAT16
    pub fn from<T: io::Read + io::Seek>(src: &mut T) -> Result<Bpb, FATError> {
        let mut buf = vec![0; BOOT_SECTOR_SIZE];
        utils::read_sector(src, 0, BOOT_SECTOR_SIZE, &mut buf)?;

        Self::from_slice(&buf)
    }

    /// Decodes and validates a boot sector held in memory.
    pub fn from_slice(buf: &[u8]) -> Result<Bpb, FATError> {
        if buf.len() < BOOT_SECTOR_SIZE {
            return Err(FATError::TruncatedRecord {
                expected: BOOT_SECTOR_SIZE,
                found: buf.len(),
            });
        }

        let mut reader = io::Cursor::new(buf);
        let bpb: Bpb = reader.read_le()?;

        bpb.validate()
    }

    /// Count of sectors occupied by the legacy root directory (0 on FAT32).
    pub fn root_dir_sectors(&self) -> u32 {
        (self.root_ent_cnt as u32 * DIR_ENTRY_SIZE).div_ceil(self.bytes_per_sec as u32)
    }

    /// Sectors per FAT, taken from the 16-bit field when it is set.
    pub fn fat_sz(&self) -> u32 {
        if self.fat_sz_16 > 0 {
            self.fat_sz_16 as u32
        } else {
            self.fat_sz_32
        }
    }

    /// Total count of sectors, taken from the 16-bit field when it is set.
    pub fn tot_sec(&self) -> u32 {
        if self.tot_sec_16 != 0 {
            self.tot_sec_16 as u32
        } else {
            self.tot_sec_32
        }
    }

    /// First sector of the data region.
    ///
    /// Computed on 64 bits: a garbage FAT size may push it past the 32-bit sector range.
    pub fn first_data_sector(&self) -> u64 {
        self.rsvd_sec_cnt as u64
            + self.num_fat as u64 * self.fat_sz() as u64
            + self.root_dir_sectors() as u64
    }

    /// Determines the number of clusters in the data section.
    ///
    /// # Returns
    /// - The number of data clusters, 0 when the metadata regions do not fit in the volume.
    pub fn cluster_count(&self) -> u32 {
        let data_sec = (self.tot_sec() as u64).saturating_sub(self.first_data_sector());
        // bounded by tot_sec, so it fits back into 32 bits
        (data_sec / self.sec_per_clus as u64) as u32
    }

    /// Determines the FAT type based on the number of clusters in the filesystem.
    pub fn fat_type(&self) -> FATType {
        FATType::from_cluster_count(self.cluster_count())
    }

    /// OEM name with its padding removed.
    pub fn oem_name_str(&self) -> String {
        padded_str(&self.oem_name)
    }

    /// Volume label with its padding removed.
    pub fn vol_lab_str(&self) -> String {
        padded_str(&self.vol_lab)
    }

    /// Informational filesystem type string with its padding removed.
    pub fn fil_sys_type_str(&self) -> String {
        padded_str(&self.fil_sys_type)
    }

    /// Validates the Bpb structure according to FAT32 specification requirements.
    ///
    /// # Errors
    /// - `FATError::InvalidBootSector`: a signature is wrong or the geometry is unusable
    /// - `FATError::UnsupportedFATType`: the volume is not FAT32
    fn validate(self) -> Result<Self, FATError> {
        if self.boot_sig != EXT_BOOT_SIG {
            return Err(FATError::InvalidBootSector(format!(
                "extended boot signature 0x{:02X}, expected 0x{:02X}",
                self.boot_sig, EXT_BOOT_SIG
            )));
        }

        if self.sig != BOOT_SIG {
            return Err(FATError::InvalidBootSector(format!(
                "signature 0x{:02X}{:02X}, expected 0x55AA",
                self.sig[0], self.sig[1]
            )));
        }

        const VALID_BYTES_PER_SEC: [u16; 4] = [512, 1024, 2048, 4096];
        if !VALID_BYTES_PER_SEC.contains(&self.bytes_per_sec) {
            return Err(FATError::InvalidBootSector(format!(
                "invalid count of bytes per sector: {}. Legal values: 512, 1024, 2048 or 4096",
                self.bytes_per_sec
            )));
        }

        if !self.sec_per_clus.is_power_of_two() {
            return Err(FATError::InvalidBootSector(format!(
                "invalid number of sectors per cluster: {}. Legal values: 1, 2, 4, 8, 16, 32, 64, 128",
                self.sec_per_clus
            )));
        }

        if self.rsvd_sec_cnt == 0 {
            return Err(FATError::InvalidBootSector(String::from(
                "the count of reserved sectors must be greater than 0",
            )));
        }

        if self.num_fat == 0 {
            return Err(FATError::InvalidBootSector(String::from(
                "the number of FATs must be greater than 0",
            )));
        }

        if self.fat_sz() == 0 {
            return Err(FATError::InvalidBootSector(String::from(
                "the size of a FAT must be greater than 0",
            )));
        }

        if self.first_data_sector() >= self.tot_sec() as u64 {
            return Err(FATError::InvalidBootSector(format!(
                "{} total sectors cannot hold the {} sectors of metadata",
                self.tot_sec(),
                self.first_data_sector()
            )));
        }

        // FAT12/16 fields must stay unset on FAT32
        if self.fat_sz_16 != 0 || self.tot_sec_16 != 0 || self.root_ent_cnt != 0 {
            let fat_type = match self.fat_type() {
                FATType::FAT32 => FATType::FAT16,
                other => other,
            };
            return Err(FATError::UnsupportedFATType(fat_type));
        }

        let fat_type = self.fat_type();
        if fat_type != FATType::FAT32 {
            return Err(FATError::UnsupportedFATType(fat_type));
        }

        let fat_bytes = self.fat_sz() as u64 * self.bytes_per_sec as u64;
        let needed = (self.cluster_count() as u64 + 2) * FAT32_ENTRY_SIZE;
        if fat_bytes < needed {
            return Err(FATError::InvalidBootSector(format!(
                "a FAT of {fat_bytes} bytes cannot map {} clusters",
                self.cluster_count()
            )));
        }

        if self.root_clus < 2 || self.root_clus - 2 >= self.cluster_count() {
            return Err(FATError::InvalidBootSector(format!(
                "root directory cluster {} is not a data cluster",
                self.root_clus
            )));
        }

        debug!(
            "FAT32 boot sector: {} B/sector, {} sectors/cluster, {} clusters, root cluster {}",
            self.bytes_per_sec,
            self.sec_per_clus,
            self.cluster_count(),
            self.root_clus
        );

        Ok(self)
    }
}
