//! Declaration of traits reused across the code.

use std::fmt;

/// Implementation of the LayoutDisplay trait.
/// It is used to display the on-disk layout of a given structure such as a volume.
pub trait LayoutDisplay {
    fn display_layout(&self, indent: u8) -> Result<String, fmt::Error>;
}
