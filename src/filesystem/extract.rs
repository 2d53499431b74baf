//! File extraction.
//!
//! A file's content is streamed cluster by cluster into a sink. Only the declared file size
//! is written: the last cluster is cut to the remaining byte count.

use std::io::{Read, Seek, Write};

use log::debug;

use super::fat::FATVol;
use super::fat_error::FATError;
use crate::utils::read_at;

impl FATVol {
    /// Streams the content of a file into `sink`.
    ///
    /// # Parameters
    /// - `src`: The image containing the filesystem
    /// - `first_cluster`: First cluster of the file
    /// - `file_size`: Declared size of the file in bytes
    /// - `sink`: Destination of the content, written one cluster at a time
    ///
    /// # Returns
    /// - The number of bytes written, always `file_size` on success. An empty file writes
    ///   nothing and does not touch its (usually absent) chain.
    ///
    /// # Errors
    /// - `FATError::TruncatedFile` if the chain ends before `file_size` bytes were written
    /// - Chain errors (`FATError::CycleDetected`, `FATError::InvalidCluster`) and I/O errors
    pub fn extract_file<T: Read + Seek, W: Write>(
        &self,
        src: &mut T,
        first_cluster: u32,
        file_size: u32,
        sink: &mut W,
    ) -> Result<u64, FATError> {
        let mut remaining = file_size as u64;
        let mut written = 0u64;
        if remaining == 0 {
            return Ok(0);
        }

        let cluster_size = self.cluster_size() as u64;
        let mut buf = vec![0u8; cluster_size as usize];
        let mut chain = self.chain(src, first_cluster);

        while remaining > 0 {
            let cluster = match chain.next() {
                Some(cluster) => cluster?,
                None => {
                    return Err(FATError::TruncatedFile {
                        declared: file_size,
                        written,
                    });
                }
            };

            let len = remaining.min(cluster_size) as usize;
            read_at(
                chain.src(),
                self.first_sector_of_cluster(cluster),
                &mut buf[..len],
            )?;
            sink.write_all(&buf[..len])?;

            remaining -= len as u64;
            written += len as u64;
        }

        debug!("Extracted {written} bytes starting at cluster {first_cluster}");
        Ok(written)
    }
}
