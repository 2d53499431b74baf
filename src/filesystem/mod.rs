//! FAT32 filesystem structures and navigation.

pub mod bpb;
pub mod chain;
pub mod dir_entry;
pub mod directory;
pub mod extract;
pub mod fat;
pub mod fat_error;
pub mod fat_type;
pub mod fs_info;

#[cfg(test)]
pub(crate) mod test_image;
