//! FAT32 volume structure and operations.
//!
//! This module implements the core functions to interact with a FAT32 volume, including:
//! - Reading and validating the boot sector and the FSInfo sector
//! - Cluster addressing: cluster number to byte offset, FAT lookups
//! - Free space reporting
//! - Displaying the volume report and layout
//!
//! `FATVol` does not own the image. Every operation reading from the volume borrows the
//! handle and an open reader, so one image may be shared between successive calls.

use std::fmt::{self, Write as FmtWrite};
use std::io::{Read, Seek};

use log::{debug, trace};

use super::bpb::Bpb;
use super::fat_error::FATError;
use super::fs_info::FSInfo;
use crate::traits::LayoutDisplay;
use crate::utils::{read_sector, u32_at};

/// Size in bytes of a FAT32 table entry.
const FAT_ENTRY_SIZE: u32 = 4;
/// The 4 high bits of a FAT32 entry are reserved.
pub const FAT_ENTRY_MASK: u32 = 0x0FFFFFFF;
/// Lowest end-of-chain marker.
pub const EOC_MIN: u32 = 0x0FFFFFF8;
/// Bit of the ext flags cleared when the FAT is mirrored into every copy.
const EXT_FLAGS_NO_MIRROR: u16 = 1 << 7;
/// Media descriptor of fixed disks.
const MEDIA_FIXED: u8 = 0xF8;
/// Media descriptor of removable disks.
const MEDIA_REMOVABLE: u8 = 0xF0;
/// Drive number of hard disks.
const DRIVE_HARD: u8 = 0x80;
/// Drive number of floppy disks.
const DRIVE_FLOPPY: u8 = 0x00;

/// Structure for an open FAT32 volume.
///
/// Essentially, it is a wrapper around the Bpb and the FSInfo sector.
#[derive(Debug)]
pub struct FATVol {
    bpb: Bpb,
    fs_info: FSInfo,
}

impl FATVol {
    /// Reads the boot sector and the FSInfo sector of a FAT32 image.
    ///
    /// # Parameters
    /// - `src`: The image containing the filesystem, positioned anywhere
    ///
    /// # Returns
    /// - `Ok(FATVol)`: The FAT volume
    /// - `Err(FATError)`: If reading fails or validation fails
    ///
    /// # Errors
    /// - `FATError::IOError` if reading from the image fails
    /// - `FATError::InvalidBootSector` / `FATError::InvalidFsInfo` on signature mismatches
    /// - `FATError::UnsupportedFATType` if the volume is FAT12 or FAT16
    pub fn open<T: Read + Seek>(src: &mut T) -> Result<FATVol, FATError> {
        let bpb = Bpb::from(src)?;
        let fs_info = FSInfo::from(src, *bpb.fs_info(), *bpb.bytes_per_sec() as usize)?;

        debug!(
            "Opened FAT32 volume {:?}: {} clusters of {} bytes, free count {:?}",
            bpb.vol_lab_str(),
            bpb.cluster_count(),
            *bpb.bytes_per_sec() as u32 * *bpb.sec_per_clus() as u32,
            fs_info.known_free_count()
        );

        Ok(Self { bpb, fs_info })
    }

    pub fn bpb(&self) -> &Bpb {
        &self.bpb
    }

    pub fn fs_info(&self) -> &FSInfo {
        &self.fs_info
    }

    /// First cluster of the root directory.
    pub fn root_cluster(&self) -> u32 {
        *self.bpb.root_clus()
    }

    /// Number of data clusters of the volume.
    pub fn cluster_count(&self) -> u32 {
        self.bpb.cluster_count()
    }

    pub fn cluster_size(&self) -> u32 {
        *self.bpb.bytes_per_sec() as u32 * *self.bpb.sec_per_clus() as u32
    }

    /// Checks whether `cluster` addresses the data region.
    pub fn is_data_cluster(&self, cluster: u32) -> bool {
        cluster >= 2 && cluster - 2 < self.cluster_count()
    }

    /// Checks whether a masked FAT entry marks the end of a chain.
    pub fn is_eoc(entry: u32) -> bool {
        (EOC_MIN..=FAT_ENTRY_MASK).contains(&(entry & FAT_ENTRY_MASK))
    }

    /// Converts a cluster number to its corresponding sector number.
    ///
    /// # Parameters
    /// - `cluster`: The cluster number to convert, at least 2.
    pub fn clus_to_sector(&self, cluster: u32) -> u64 {
        self.data_start() + (cluster as u64 - 2) * *self.bpb.sec_per_clus() as u64
    }

    /// Returns the byte offset of the first sector of `cluster`.
    ///
    /// Only data clusters (`cluster >= 2`) have an address; callers check this beforehand.
    pub fn first_sector_of_cluster(&self, cluster: u32) -> u64 {
        self.clus_to_sector(cluster) * *self.bpb.bytes_per_sec() as u64
    }

    /// Looks up the FAT entry of `cluster`.
    ///
    /// # Returns
    /// - The entry masked to its 28 significant bits: the next cluster of the chain, or an
    ///   end-of-chain marker (see [`FATVol::is_eoc`]).
    ///
    /// # Errors
    /// - `FATError::InvalidCluster` if the entry of `cluster` lies outside the first FAT
    /// - `FATError::IOError` if the FAT sector cannot be read
    pub fn next_cluster<T: Read + Seek>(&self, src: &mut T, cluster: u32) -> Result<u32, FATError> {
        let bytes_per_sec = *self.bpb.bytes_per_sec() as u32;
        let fat_offset = cluster as u64 * FAT_ENTRY_SIZE as u64;
        if fat_offset + FAT_ENTRY_SIZE as u64 > self.bpb.fat_sz() as u64 * bytes_per_sec as u64 {
            return Err(FATError::InvalidCluster(cluster));
        }
        let sector = self.fat_start() + fat_offset / bytes_per_sec as u64;
        let offset = (fat_offset % bytes_per_sec as u64) as usize;

        let mut buf = vec![];
        read_sector(src, sector, bytes_per_sec as usize, &mut buf)?;

        let next = u32_at(&buf, offset) & FAT_ENTRY_MASK;
        trace!("FAT[{cluster}] = 0x{next:08X}");
        Ok(next)
    }

    /// Number of free bytes according to the FSInfo sector.
    ///
    /// # Returns
    /// - `None` if the FSInfo sector does not know the count of free clusters.
    pub fn free_space_bytes(&self) -> Option<u64> {
        self.fs_info
            .known_free_count()
            .map(|count| count as u64 * self.cluster_size() as u64)
    }

    /// Total size of the volume in bytes.
    pub fn total_size_bytes(&self) -> u64 {
        self.bpb.tot_sec() as u64 * *self.bpb.bytes_per_sec() as u64
    }

    /// Checks whether the FAT is mirrored into every copy at runtime.
    pub fn mirrored_fat(&self) -> bool {
        self.bpb.ext_flags() & EXT_FLAGS_NO_MIRROR == 0
    }

    /// Filesystem version as `(major, minor)`.
    pub fn fs_version(&self) -> (u8, u8) {
        let [minor, major] = self.bpb.fs_ver().to_le_bytes();
        (major, minor)
    }

    /// Returns the starting sector of the first FAT.
    fn fat_start(&self) -> u64 {
        u64::from(*self.bpb.rsvd_sec_cnt())
    }

    /// Returns the starting sector of the data region.
    pub fn data_start(&self) -> u64 {
        self.bpb.first_data_sector()
    }

    /// Returns the ending sector of the data region.
    fn data_end(&self) -> u64 {
        self.data_start() + self.cluster_count() as u64 * *self.bpb.sec_per_clus() as u64
    }
}

/// The INFO report: device, geometry and filesystem information.
impl fmt::Display for FATVol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bpb = &self.bpb;

        writeln!(f, "---- Device Info ----")?;
        writeln!(f, "OEM Name: {}", bpb.oem_name_str())?;
        writeln!(f, "Label: {}", bpb.vol_lab_str())?;
        writeln!(f, "File System Type: {}", bpb.fil_sys_type_str())?;
        let media = match *bpb.media() {
            MEDIA_FIXED => " (fixed)",
            MEDIA_REMOVABLE => " (removable)",
            _ => "",
        };
        writeln!(f, "Media Type: 0x{:X}{}", bpb.media(), media)?;
        let size = self.total_size_bytes();
        writeln!(
            f,
            "Size: {} bytes ({}MB, {:.4}GB)",
            size,
            size / 1_000_000,
            size as f64 / 1_000_000_000.0
        )?;
        let drive = match *bpb.drv_num() {
            DRIVE_HARD => " (hard disk)",
            DRIVE_FLOPPY => " (floppy disk)",
            _ => "",
        };
        writeln!(f, "Drive Number: {}{}", bpb.drv_num(), drive)?;

        writeln!(f, "\n---- Geometry ----")?;
        writeln!(f, "Bytes per Sector: {}", bpb.bytes_per_sec())?;
        writeln!(f, "Sectors per Cluster: {}", bpb.sec_per_clus())?;
        writeln!(f, "Total Sectors: {}", bpb.tot_sec())?;
        writeln!(f, "Geom: Sectors per Track: {}", bpb.sec_per_trk())?;
        writeln!(f, "Geom: Heads: {}", bpb.num_heads())?;
        writeln!(f, "Hidden Sectors: {}", bpb.hidd_sec())?;

        writeln!(f, "\n---- FS Info ----")?;
        let (major, minor) = self.fs_version();
        writeln!(f, "Version: {major}:{minor}")?;
        writeln!(f, "Reserved Sectors: {}", bpb.rsvd_sec_cnt())?;
        writeln!(f, "Number of FATs: {}", bpb.num_fat())?;
        writeln!(f, "FAT Size: {}", bpb.fat_sz_32())?;
        writeln!(
            f,
            "Mirrored FAT: {}",
            if self.mirrored_fat() { "yes" } else { "no" }
        )?;
        writeln!(f, "Boot Sector Backup Sector No: {}", bpb.bk_boot_sec())?;
        match self.free_space_bytes() {
            Some(free) => writeln!(f, "Free Space: {free} bytes"),
            None => writeln!(f, "Free Space: unknown"),
        }
    }
}

impl LayoutDisplay for FATVol {
    fn display_layout(&self, indent: u8) -> Result<String, fmt::Error> {
        let mut out = String::from("");
        let indent = " ".repeat(indent.into());

        writeln!(out, "{}┌{:─^55}┐", indent, " FAT32 Volume Layout ")?;
        writeln!(
            out,
            "{}├{:^12}┬{:^12}┬{:^12}┬{:^16}┤",
            indent, "Region", "Start", "End", "Description"
        )?;
        writeln!(
            out,
            "{}├{:─<12}┼{:─<12}┼{:─<12}┼{:─<16}┤",
            indent, "", "", "", ""
        )?;

        writeln!(
            out,
            "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
            indent,
            "Reserved",
            0,
            self.fat_start(),
            "Boot + FSInfo"
        )?;
        for i in 0..*self.bpb.num_fat() {
            let fat_i_start = self.fat_start() + i as u64 * self.bpb.fat_sz() as u64;
            let fat_i_end = fat_i_start + self.bpb.fat_sz() as u64;
            writeln!(
                out,
                "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
                indent,
                format!("FAT #{}", i),
                fat_i_start,
                fat_i_end,
                "FAT Tables"
            )?;
        }
        writeln!(
            out,
            "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
            indent,
            "Data",
            self.data_start(),
            self.data_end(),
            "Cluster Data"
        )?;
        writeln!(
            out,
            "{}└{:─<12}┴{:─<12}┴{:─<12}┴{:─<16}┘",
            indent, "", "", "", ""
        )?;

        Ok(out)
    }
}
