//! Enum for the different FAT types (FAT12, FAT16, FAT32).
//!
//! The type of a volume is decided by its count of data clusters, following
//! Microsoft's FAT specification. Only FAT32 volumes can be navigated.

use std::fmt;

/// Minimum cluster count of a FAT16 volume.
pub const FAT16_MIN_CLUSTERS: u32 = 4085;
/// Minimum cluster count of a FAT32 volume.
pub const FAT32_MIN_CLUSTERS: u32 = 65525;

/// Represents the different types of FAT filesystems.
///
/// # Values
/// - `FAT12`: 12-bit File Allocation Table entries
/// - `FAT16`: 16-bit File Allocation Table entries
/// - `FAT32`: 32-bit File Allocation Table entries (most common on large volumes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FATType {
    FAT12,
    FAT16,
    FAT32,
}

impl FATType {
    /// Determines the FAT type from the count of data clusters.
    pub fn from_cluster_count(clus_cnt: u32) -> Self {
        if clus_cnt < FAT16_MIN_CLUSTERS {
            FATType::FAT12
        } else if clus_cnt < FAT32_MIN_CLUSTERS {
            FATType::FAT16
        } else {
            FATType::FAT32
        }
    }
}

impl fmt::Display for FATType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FATType::FAT12 => "FAT12",
            FATType::FAT16 => "FAT16",
            FATType::FAT32 => "FAT32",
        };
        write!(f, "{s}")
    }
}
