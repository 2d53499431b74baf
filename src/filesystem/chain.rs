//! Cluster chain traversal.
//!
//! Chains are walked iteratively. Every visited cluster is remembered so that a chain looping
//! back onto itself is reported as [`FATError::CycleDetected`] instead of being followed
//! forever. Since only data clusters are accepted, the set never outgrows the volume's
//! cluster count.

use std::collections::HashSet;
use std::io::{Read, Seek};

use log::trace;

use super::fat::FATVol;
use super::fat_error::FATError;

enum ChainState {
    Start(u32),
    After(u32),
    Done,
}

/// Iterator over the clusters of a chain.
///
/// The FAT entry of a cluster is only read when the following cluster is requested, so a
/// consumer stopping early never touches the FAT past what it used. After an error the
/// iterator is exhausted.
pub struct ClusterChain<'a, T: Read + Seek> {
    vol: &'a FATVol,
    src: &'a mut T,
    state: ChainState,
    visited: HashSet<u32>,
}

impl<'a, T: Read + Seek> ClusterChain<'a, T> {
    pub(crate) fn new(vol: &'a FATVol, src: &'a mut T, first_cluster: u32) -> Self {
        Self {
            vol,
            src,
            state: ChainState::Start(first_cluster),
            visited: HashSet::new(),
        }
    }

    /// Gives back the reader, to read the clusters being yielded.
    pub(crate) fn src(&mut self) -> &mut T {
        &mut *self.src
    }

    fn fail(&mut self, err: FATError) -> Option<Result<u32, FATError>> {
        self.state = ChainState::Done;
        Some(Err(err))
    }
}

impl<T: Read + Seek> Iterator for ClusterChain<'_, T> {
    type Item = Result<u32, FATError>;

    fn next(&mut self) -> Option<Self::Item> {
        let cluster = match self.state {
            ChainState::Done => return None,
            ChainState::Start(cluster) => cluster,
            ChainState::After(prev) => match self.vol.next_cluster(&mut *self.src, prev) {
                Ok(next) if FATVol::is_eoc(next) => {
                    self.state = ChainState::Done;
                    return None;
                }
                Ok(next) => next,
                Err(err) => return self.fail(err),
            },
        };

        if !self.vol.is_data_cluster(cluster) {
            return self.fail(FATError::InvalidCluster(cluster));
        }
        if !self.visited.insert(cluster) {
            return self.fail(FATError::CycleDetected(cluster));
        }

        trace!("Visiting cluster {cluster}");
        self.state = ChainState::After(cluster);
        Some(Ok(cluster))
    }
}

impl FATVol {
    /// Walks the cluster chain starting at `first_cluster`.
    ///
    /// # Returns
    /// - An iterator yielding each cluster of the chain, in order, until the end-of-chain
    ///   marker. It yields an error and stops if a link is not a data cluster
    ///   (`FATError::InvalidCluster`), if the chain revisits a cluster
    ///   (`FATError::CycleDetected`) or if the FAT cannot be read.
    pub fn chain<'a, T: Read + Seek>(
        &'a self,
        src: &'a mut T,
        first_cluster: u32,
    ) -> ClusterChain<'a, T> {
        ClusterChain::new(self, src, first_cluster)
    }
}
