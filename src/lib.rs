//!
//! fat32_nav: A library and CLI for navigating FAT32 volume images, read-only.
//!
//! This crate provides tools for:
//! - Parsing and validating the boot sector and FSInfo sector of FAT32 volumes
//! - Following cluster chains through the File Allocation Table
//! - Listing directories and resolving paths made of 8.3 short names
//! - Extracting file contents
//! - Handling user commands of the interactive navigator
//!
//! Every operation borrows an open [`FATVol`] and a reader over the image, and reports
//! failures as [`FATError`] values; nothing is cached between calls.
//!
//! # Re-exports
//! - [`FATVol`]: FAT32 volume handle
//! - [`FATError`]: Errors of every volume operation
//! - [`DirEntry`]: Directory entry

pub mod commands;
pub mod filesystem;
pub mod traits;
pub mod utils;

/// FAT32 volume handle (see [`filesystem::fat::FATVol`]).
pub use crate::filesystem::fat::FATVol;
/// Errors of every volume operation (see [`filesystem::fat_error::FATError`]).
pub use crate::filesystem::fat_error::FATError;
/// Directory entry (see [`filesystem::dir_entry::DirEntry`]).
pub use crate::filesystem::dir_entry::DirEntry;
