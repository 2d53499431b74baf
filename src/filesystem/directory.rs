//! Directory enumeration and path resolution.
//!
//! A directory is the cluster chain of its first cluster, read as an array of 32-byte
//! entries. Enumeration stops at the first end-of-directory slot, even if the chain holds
//! more clusters. Paths are resolved one component at a time, within a single directory.

use std::io::{Read, Seek};

use log::{trace, warn};

use super::chain::ClusterChain;
use super::dir_entry::{DIR_ENTRY_SIZE, DirEntry, EntryKind};
use super::fat::FATVol;
use super::fat_error::FATError;
use crate::utils::{padded_str, read_at};

/// Lazy iterator over the live entries of a directory.
///
/// Deleted slots are skipped. The iterator is exhausted once an end-of-directory slot, the
/// end of the chain or an error is met; enumerate again with [`FATVol::list_entries`].
pub struct DirIter<'a, T: Read + Seek> {
    vol: &'a FATVol,
    chain: ClusterChain<'a, T>,
    buf: Vec<u8>,
    offset: usize,
    done: bool,
}

impl<T: Read + Seek> DirIter<'_, T> {
    fn fail(&mut self, err: FATError) -> Option<Result<DirEntry, FATError>> {
        self.done = true;
        Some(Err(err))
    }

    /// Loads the next cluster of the directory, `false` at the end of the chain.
    fn load_next_cluster(&mut self) -> Result<bool, FATError> {
        let cluster = match self.chain.next() {
            Some(cluster) => cluster?,
            None => return Ok(false),
        };

        let offset = self.vol.first_sector_of_cluster(cluster);
        read_at(self.chain.src(), offset, &mut self.buf)?;
        self.offset = 0;

        trace!("Reading directory cluster {cluster}");
        Ok(true)
    }
}

impl<T: Read + Seek> Iterator for DirIter<'_, T> {
    type Item = Result<DirEntry, FATError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            if self.offset >= self.buf.len() {
                match self.load_next_cluster() {
                    Ok(true) => {}
                    Ok(false) => {
                        self.done = true;
                        return None;
                    }
                    Err(err) => return self.fail(err),
                }
            }

            let slot = &self.buf[self.offset..self.offset + DIR_ENTRY_SIZE];
            self.offset += DIR_ENTRY_SIZE;

            let entry = match DirEntry::from_slice(slot) {
                Ok(entry) => entry,
                Err(err) => return self.fail(err),
            };

            match entry.kind() {
                EntryKind::EndOfDirectory => {
                    self.done = true;
                    return None;
                }
                EntryKind::Deleted => continue,
                EntryKind::Live => return Some(Ok(entry)),
            }
        }
    }
}

impl FATVol {
    /// Enumerates the live entries of the directory starting at `first_cluster`.
    ///
    /// # Returns
    /// - A lazy iterator over the entries, in on-disk order. Errors of the underlying chain
    ///   walk or reads are yielded once, then the iterator stops.
    pub fn list_entries<'a, T: Read + Seek>(
        &'a self,
        src: &'a mut T,
        first_cluster: u32,
    ) -> DirIter<'a, T> {
        let buf = vec![0; self.cluster_size() as usize];
        DirIter {
            vol: self,
            chain: self.chain(src, first_cluster),
            offset: buf.len(),
            buf,
            done: false,
        }
    }

    /// Resolves one path component relative to the directory at `current`.
    ///
    /// # Parameters
    /// - `current`: First cluster of the directory to search
    /// - `name`: A directory name, compared without regard to ASCII case, `.` or `..`
    ///
    /// # Returns
    /// - The first cluster of the matching subdirectory. `..` stored as cluster 0 designates
    ///   the root directory.
    ///
    /// # Errors
    /// - `FATError::NotFound` if no subdirectory matches, or for `.` at the root
    pub fn resolve_child<T: Read + Seek>(
        &self,
        src: &mut T,
        current: u32,
        name: &str,
    ) -> Result<u32, FATError> {
        if name == "." {
            return if current != self.root_cluster() {
                Ok(current)
            } else {
                Err(FATError::NotFound(name.to_string()))
            };
        }

        for entry in self.list_entries(src, current) {
            let entry = entry?;
            if !entry.is_dir() || !entry.same_short_name(name) {
                continue;
            }

            return match entry.cluster_number() {
                0 if name == ".." => Ok(self.root_cluster()),
                cluster => Ok(cluster),
            };
        }

        Err(FATError::NotFound(name.to_string()))
    }

    /// Resolves a `/` separated path, one component after the other.
    ///
    /// A leading `/` starts the resolution at the root directory, otherwise at `start`.
    pub fn resolve_path<T: Read + Seek>(
        &self,
        src: &mut T,
        start: u32,
        path: &str,
    ) -> Result<u32, FATError> {
        let mut cluster = if path.starts_with('/') {
            self.root_cluster()
        } else {
            start
        };

        for component in path.split('/').filter(|c| !c.is_empty()) {
            cluster = self.resolve_child(src, cluster, component)?;
        }

        Ok(cluster)
    }

    /// Finds a regular file by name in the directory at `dir_cluster`.
    ///
    /// # Errors
    /// - `FATError::NotFound` if no file of the directory matches `name`
    pub fn find_file<T: Read + Seek>(
        &self,
        src: &mut T,
        dir_cluster: u32,
        name: &str,
    ) -> Result<DirEntry, FATError> {
        for entry in self.list_entries(src, dir_cluster) {
            let entry = entry?;
            if entry.is_file() && entry.same_short_name(name) {
                return Ok(entry);
            }
        }

        Err(FATError::NotFound(name.to_string()))
    }

    /// Returns the volume label stored as an entry of the root directory.
    pub fn volume_label<T: Read + Seek>(&self, src: &mut T) -> Result<Option<String>, FATError> {
        for entry in self.list_entries(src, self.root_cluster()) {
            let entry = entry?;
            if entry.is_volume_id() {
                return Ok(Some(padded_str(entry.name())));
            }
        }

        warn!("No volume label entry in the root directory");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::test_image::{BootSectorSpec, TestImage, dir_entry_bytes};
    use std::io::Cursor;

    /// Root (2) holds a label, DOCS (3), FILE.TXT and a few slots to skip.
    /// DOCS holds `.`, `..` (stored as 0), SUB (4) and NOTES.MD. SUB holds `.` and `..` (3).
    fn sample_image() -> TestImage {
        let mut image = TestImage::new(BootSectorSpec::default(), 100);
        image.set_chain(&[2]);
        image.set_chain(&[3]);
        image.set_chain(&[4]);
        image.write_entries(
            2,
            &[
                dir_entry_bytes(b"TESTVOL    ", 0x08, 0, 0),
                dir_entry_bytes(b"Ab\0c\0d\0e\0f\0", 0x0F, 0, 0),
                dir_entry_bytes(b"DOCS       ", 0x10, 3, 0),
                dir_entry_bytes(b"\xE5OLD    TXT", 0x20, 9, 10),
                dir_entry_bytes(b"FILE    TXT", 0x20, 5, 9000),
            ],
        );
        image.write_entries(
            3,
            &[
                dir_entry_bytes(b".          ", 0x10, 3, 0),
                dir_entry_bytes(b"..         ", 0x10, 0, 0),
                dir_entry_bytes(b"SUB        ", 0x10, 4, 0),
                dir_entry_bytes(b"NOTES   MD ", 0x20, 10, 20),
            ],
        );
        image.write_entries(
            4,
            &[
                dir_entry_bytes(b".          ", 0x10, 4, 0),
                dir_entry_bytes(b"..         ", 0x10, 3, 0),
            ],
        );
        image
    }

    fn open(image: TestImage) -> (FATVol, Cursor<Vec<u8>>) {
        let mut cursor = image.cursor();
        let vol = FATVol::open(&mut cursor).unwrap();
        (vol, cursor)
    }

    fn names(vol: &FATVol, cursor: &mut Cursor<Vec<u8>>, cluster: u32) -> Vec<String> {
        vol.list_entries(cursor, cluster)
            .map(|entry| entry.unwrap().name_str())
            .collect()
    }

    #[test]
    fn lists_live_entries() {
        let (vol, mut cursor) = open(sample_image());

        let entries: Vec<DirEntry> = vol
            .list_entries(&mut cursor, 2)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(entries.len(), 4);
        assert!(entries[0].is_volume_id());
        assert!(entries[1].is_long_name());
        assert_eq!(entries[2].name_str(), "DOCS");
        assert!(entries[2].is_dir());
        assert_eq!(entries[3].name_str(), "FILE.TXT");
        assert_eq!(*entries[3].file_size(), 9000);
        assert_eq!(
            names(&vol, &mut cursor, 3),
            vec![".", "..", "SUB", "NOTES.MD"]
        );
    }

    #[test]
    fn lists_across_clusters() {
        let mut image = TestImage::new(BootSectorSpec::with_sec_per_clus(1), 0);
        image.set_chain(&[2, 6]);
        let first: Vec<[u8; 32]> = (0..16)
            .map(|i| {
                let name: [u8; 11] = format!("F{i:02}     TXT").as_bytes().try_into().unwrap();
                dir_entry_bytes(&name, 0x20, 0, 0)
            })
            .collect();
        image.write_entries(2, &first);
        image.write_entries(
            6,
            &[
                dir_entry_bytes(b"LAST    TXT", 0x20, 0, 0),
                dir_entry_bytes(b"\xE5ELETED TXT", 0x20, 0, 0),
                dir_entry_bytes(b"END     TXT", 0x20, 0, 0),
            ],
        );
        let (vol, mut cursor) = open(image);

        let names = names(&vol, &mut cursor, 2);
        assert_eq!(names.len(), 18);
        assert_eq!(names[0], "F00.TXT");
        assert_eq!(names[15], "F15.TXT");
        assert_eq!(names[16], "LAST.TXT");
        assert_eq!(names[17], "END.TXT");
    }

    #[test]
    fn end_marker_stops_the_whole_listing() {
        let mut image = TestImage::new(BootSectorSpec::with_sec_per_clus(1), 0);
        image.set_chain(&[2, 6]);
        image.write_entries(2, &[dir_entry_bytes(b"ONLY    TXT", 0x20, 0, 0)]);
        image.write_entries(6, &[dir_entry_bytes(b"HIDDEN  TXT", 0x20, 0, 0)]);
        let (vol, mut cursor) = open(image);

        assert_eq!(names(&vol, &mut cursor, 2), vec!["ONLY.TXT"]);
    }

    #[test]
    fn listing_reports_cycles() {
        let mut image = TestImage::new(BootSectorSpec::with_sec_per_clus(1), 0);
        image.set_fat(2, 6);
        image.set_fat(6, 2);
        let full: Vec<[u8; 32]> = (0..16)
            .map(|_| dir_entry_bytes(b"LOOP    TXT", 0x20, 0, 0))
            .collect();
        image.write_entries(2, &full);
        image.write_entries(6, &full);
        let (vol, mut cursor) = open(image);

        let result: Result<Vec<_>, _> = vol.list_entries(&mut cursor, 2).collect();
        assert!(matches!(result, Err(FATError::CycleDetected(2))));
    }

    #[test]
    fn resolves_children() {
        let (vol, mut cursor) = open(sample_image());

        assert_eq!(vol.resolve_child(&mut cursor, 2, "DOCS").unwrap(), 3);
        assert_eq!(vol.resolve_child(&mut cursor, 2, "docs").unwrap(), 3);
        assert_eq!(vol.resolve_child(&mut cursor, 3, "SUB").unwrap(), 4);
        assert_eq!(vol.resolve_child(&mut cursor, 4, "..").unwrap(), 3);
    }

    #[test]
    fn dotdot_stored_as_zero_is_root() {
        let (vol, mut cursor) = open(sample_image());

        assert_eq!(vol.resolve_child(&mut cursor, 3, "..").unwrap(), 2);
    }

    #[test]
    fn dot_at_root_is_not_found() {
        let (vol, mut cursor) = open(sample_image());

        assert_eq!(vol.resolve_child(&mut cursor, 3, ".").unwrap(), 3);
        assert!(matches!(
            vol.resolve_child(&mut cursor, 2, "."),
            Err(FATError::NotFound(_))
        ));
        assert!(matches!(
            vol.resolve_child(&mut cursor, 2, ".."),
            Err(FATError::NotFound(_))
        ));
    }

    #[test]
    fn files_are_not_directories() {
        let (vol, mut cursor) = open(sample_image());

        assert!(matches!(
            vol.resolve_child(&mut cursor, 2, "FILE.TXT"),
            Err(FATError::NotFound(_))
        ));
        assert!(matches!(
            vol.resolve_child(&mut cursor, 2, "MISSING"),
            Err(FATError::NotFound(_))
        ));
    }

    #[test]
    fn resolves_paths() {
        let (vol, mut cursor) = open(sample_image());

        assert_eq!(vol.resolve_path(&mut cursor, 2, "DOCS/SUB").unwrap(), 4);
        assert_eq!(vol.resolve_path(&mut cursor, 4, "../..").unwrap(), 2);
        assert_eq!(vol.resolve_path(&mut cursor, 4, "/DOCS").unwrap(), 3);
        assert_eq!(vol.resolve_path(&mut cursor, 4, "/").unwrap(), 2);
        assert!(matches!(
            vol.resolve_path(&mut cursor, 2, "DOCS/NOPE"),
            Err(FATError::NotFound(_))
        ));
    }

    #[test]
    fn finds_files() {
        let (vol, mut cursor) = open(sample_image());

        let entry = vol.find_file(&mut cursor, 3, "notes.md").unwrap();
        assert_eq!(entry.cluster_number(), 10);
        assert_eq!(*entry.file_size(), 20);
        assert!(matches!(
            vol.find_file(&mut cursor, 2, "DOCS"),
            Err(FATError::NotFound(_))
        ));
    }

    #[test]
    fn reads_volume_label() {
        let (vol, mut cursor) = open(sample_image());

        assert_eq!(
            vol.volume_label(&mut cursor).unwrap(),
            Some("TESTVOL".to_string())
        );
    }
}
