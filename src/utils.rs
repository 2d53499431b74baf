use std::io;
use std::io::{Read, Seek, SeekFrom};

/// Reads a specific sector from a source into a buffer.
///
/// # Arguments
///
/// - `src`: A mutable reference to the image to read from.
/// - `sector`: The sector number to read.
/// - `sector_size`: The size in bytes of a sector.
/// - `buffer`: A mutable reference to a vector where the sector data will be stored.
///
/// The buffer will be resized to match the sector size.
///
/// # Errors
///
/// Returns an `io::Error` if the sector cannot be read.
pub fn read_sector<T: Read + Seek>(
    src: &mut T,
    sector: u64,
    sector_size: usize,
    buffer: &mut Vec<u8>,
) -> io::Result<()> {
    buffer.resize(sector_size, 0);

    src.seek(SeekFrom::Start(sector_size as u64 * sector))?;

    src.read_exact(buffer).map_err(|err| {
        io::Error::new(
            err.kind(),
            format!("Failed to read sector {}: {}", sector, err),
        )
    })?;

    Ok(())
}

/// Fills `buffer` with the bytes found at `offset` in the source.
///
/// # Errors
///
/// Returns an `io::Error` if seeking fails or fewer than `buffer.len()` bytes are available.
pub fn read_at<T: Read + Seek>(src: &mut T, offset: u64, buffer: &mut [u8]) -> io::Result<()> {
    src.seek(SeekFrom::Start(offset))?;
    src.read_exact(buffer).map_err(|err| {
        io::Error::new(
            err.kind(),
            format!(
                "Failed to read {} bytes at offset {}: {}",
                buffer.len(),
                offset,
                err
            ),
        )
    })
}

/// Extracts a 32-bit unsigned integer from a buffer at a given offset.
///
/// # Arguments
///
/// - `buffer`: A slice of bytes from which the value will be extracted.
/// - `offset`: The offset within the buffer where the 32-bit value starts.
///
/// # Panics
///
/// Panics if the slice does not contain enough bytes starting from the offset.
pub fn u32_at(buffer: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(
        buffer[offset..offset + 4]
            .try_into()
            .expect("invalid slice"),
    )
}

/// Converts a fixed-width, space padded on-disk string into a `String`.
///
/// Trailing spaces and NUL bytes are dropped. Bytes are mapped one to one onto chars so that
/// non-ASCII content stays visible instead of failing the conversion.
pub fn padded_str(raw: &[u8]) -> String {
    let end = raw
        .iter()
        .rposition(|b| *b != b' ' && *b != 0)
        .map_or(0, |pos| pos + 1);

    raw[..end].iter().map(|b| *b as char).collect()
}
