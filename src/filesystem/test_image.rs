//! Synthetic FAT32 images for unit tests.
//!
//! The boot sector announces a volume large enough to be FAT32 (70000 clusters), while the
//! backing buffer only holds the reserved region, both FATs and the first few data clusters.

use std::io::Cursor;

use super::fs_info::{FSI_LEAD_SIG, FSI_TRAIL_SIG};

/// Count of data clusters announced by the default boot sector.
pub const CLUSTER_COUNT: u32 = 70000;
/// Count of data clusters actually backed by the image buffer.
pub const BACKED_CLUSTERS: u32 = 16;

/// Geometry written into a synthetic boot sector.
pub struct BootSectorSpec {
    pub bytes_per_sec: u16,
    pub sec_per_clus: u8,
    pub rsvd_sec_cnt: u16,
    pub num_fat: u8,
    pub root_ent_cnt: u16,
    pub tot_sec_32: u32,
    pub fat_sz_32: u32,
    pub ext_flags: u16,
    pub root_clus: u32,
    pub fs_info: u16,
}

impl Default for BootSectorSpec {
    fn default() -> Self {
        Self::with_sec_per_clus(8)
    }
}

impl BootSectorSpec {
    pub fn with_sec_per_clus(sec_per_clus: u8) -> Self {
        let rsvd_sec_cnt = 32;
        let num_fat = 2;
        let fat_sz_32 = 1024;
        BootSectorSpec {
            bytes_per_sec: 512,
            sec_per_clus,
            rsvd_sec_cnt,
            num_fat,
            root_ent_cnt: 0,
            tot_sec_32: rsvd_sec_cnt as u32
                + num_fat as u32 * fat_sz_32
                + sec_per_clus as u32 * CLUSTER_COUNT,
            fat_sz_32,
            ext_flags: 0,
            root_clus: 2,
            fs_info: 1,
        }
    }

    pub fn first_data_sector(&self) -> u32 {
        self.rsvd_sec_cnt as u32 + self.num_fat as u32 * self.fat_sz_32
    }

    pub fn cluster_size(&self) -> usize {
        self.bytes_per_sec as usize * self.sec_per_clus as usize
    }
}

/// Serializes a boot sector with the given geometry.
pub fn boot_sector(spec: &BootSectorSpec) -> Vec<u8> {
    let mut buf = vec![0u8; 512];
    buf[0..3].copy_from_slice(&[0xEB, 0x58, 0x90]);
    buf[3..11].copy_from_slice(b"MSWIN4.1");
    buf[11..13].copy_from_slice(&spec.bytes_per_sec.to_le_bytes());
    buf[13] = spec.sec_per_clus;
    buf[14..16].copy_from_slice(&spec.rsvd_sec_cnt.to_le_bytes());
    buf[16] = spec.num_fat;
    buf[17..19].copy_from_slice(&spec.root_ent_cnt.to_le_bytes());
    buf[21] = 0xF8;
    buf[24..26].copy_from_slice(&63u16.to_le_bytes());
    buf[26..28].copy_from_slice(&255u16.to_le_bytes());
    buf[32..36].copy_from_slice(&spec.tot_sec_32.to_le_bytes());
    buf[36..40].copy_from_slice(&spec.fat_sz_32.to_le_bytes());
    buf[40..42].copy_from_slice(&spec.ext_flags.to_le_bytes());
    buf[44..48].copy_from_slice(&spec.root_clus.to_le_bytes());
    buf[48..50].copy_from_slice(&spec.fs_info.to_le_bytes());
    buf[50..52].copy_from_slice(&6u16.to_le_bytes());
    buf[64] = 0x80;
    buf[66] = 0x29;
    buf[67..71].copy_from_slice(&0x1234_ABCDu32.to_le_bytes());
    buf[71..82].copy_from_slice(b"TESTVOL    ");
    buf[82..90].copy_from_slice(b"FAT32   ");
    buf[510] = 0x55;
    buf[511] = 0xAA;
    buf
}

/// Serializes an FSInfo sector.
pub fn fs_info_sector(free_count: u32, nxt_free: u32) -> Vec<u8> {
    let mut buf = vec![0u8; 512];
    buf[0..4].copy_from_slice(&FSI_LEAD_SIG.to_le_bytes());
    buf[484..488].copy_from_slice(&0x61417272u32.to_le_bytes());
    buf[488..492].copy_from_slice(&free_count.to_le_bytes());
    buf[492..496].copy_from_slice(&nxt_free.to_le_bytes());
    buf[508..512].copy_from_slice(&FSI_TRAIL_SIG.to_le_bytes());
    buf
}

/// Serializes a 32-byte directory entry.
pub fn dir_entry_bytes(name: &[u8; 11], attr: u8, cluster: u32, size: u32) -> [u8; 32] {
    let mut buf = [0u8; 32];
    buf[0..11].copy_from_slice(name);
    buf[11] = attr;
    buf[20..22].copy_from_slice(&((cluster >> 16) as u16).to_le_bytes());
    buf[26..28].copy_from_slice(&(cluster as u16).to_le_bytes());
    buf[28..32].copy_from_slice(&size.to_le_bytes());
    buf
}

/// An in-memory FAT32 image under construction.
pub struct TestImage {
    pub spec: BootSectorSpec,
    pub data: Vec<u8>,
}

impl TestImage {
    pub fn new(spec: BootSectorSpec, free_count: u32) -> Self {
        let bytes_per_sec = spec.bytes_per_sec as usize;
        let size = spec.first_data_sector() as usize * bytes_per_sec
            + BACKED_CLUSTERS as usize * spec.cluster_size();
        let mut data = vec![0u8; size];

        data[0..512].copy_from_slice(&boot_sector(&spec));
        let fs_info_off = spec.fs_info as usize * bytes_per_sec;
        data[fs_info_off..fs_info_off + 512].copy_from_slice(&fs_info_sector(free_count, 3));

        let mut image = TestImage { spec, data };
        image.set_fat(0, 0x0FFFFFF8);
        image.set_fat(1, 0x0FFFFFFF);
        image
    }

    /// Writes a FAT entry in every FAT copy.
    pub fn set_fat(&mut self, cluster: u32, value: u32) {
        let bytes_per_sec = self.spec.bytes_per_sec as usize;
        for i in 0..self.spec.num_fat as usize {
            let off = (self.spec.rsvd_sec_cnt as usize + i * self.spec.fat_sz_32 as usize)
                * bytes_per_sec
                + cluster as usize * 4;
            self.data[off..off + 4].copy_from_slice(&value.to_le_bytes());
        }
    }

    /// Links `clusters` into a chain ending with an end-of-chain marker.
    pub fn set_chain(&mut self, clusters: &[u32]) {
        for pair in clusters.windows(2) {
            self.set_fat(pair[0], pair[1]);
        }
        if let Some(last) = clusters.last() {
            self.set_fat(*last, 0x0FFFFFFF);
        }
    }

    pub fn cluster_offset(&self, cluster: u32) -> usize {
        (self.spec.first_data_sector() as usize
            + (cluster as usize - 2) * self.spec.sec_per_clus as usize)
            * self.spec.bytes_per_sec as usize
    }

    /// Writes `bytes` at the start of a data cluster.
    pub fn write_cluster(&mut self, cluster: u32, bytes: &[u8]) {
        assert!(bytes.len() <= self.spec.cluster_size());
        let off = self.cluster_offset(cluster);
        self.data[off..off + bytes.len()].copy_from_slice(bytes);
    }

    /// Writes directory entries, in order, starting at slot 0 of a cluster.
    pub fn write_entries(&mut self, cluster: u32, entries: &[[u8; 32]]) {
        let bytes: Vec<u8> = entries.iter().flatten().copied().collect();
        self.write_cluster(cluster, &bytes);
    }

    /// Spreads `content` over `clusters`, one cluster after the other.
    pub fn write_file(&mut self, clusters: &[u32], content: &[u8]) {
        let cluster_size = self.spec.cluster_size();
        for (cluster, chunk) in clusters.iter().zip(content.chunks(cluster_size)) {
            self.write_cluster(*cluster, chunk);
        }
    }

    pub fn cursor(self) -> Cursor<Vec<u8>> {
        Cursor::new(self.data)
    }
}
