use anyhow::{Result, ensure};

/// Borrow the fixed-size header of a picture file.
pub(crate) fn header<'a>(data: &'a [u8], len: usize, format: &str) -> Result<&'a [u8]> {
    ensure!(
        data.len() >= len,
        "{format} picture shorter than its {len}-byte header ({} bytes)",
        data.len()
    );
    Ok(&data[..len])
}

/// Ensure the payload reaches at least `needed` bytes.
pub(crate) fn require(data: &[u8], needed: usize, format: &str) -> Result<()> {
    ensure!(
        data.len() >= needed,
        "{format} pixel data truncated: need {needed} bytes, file has {}",
        data.len()
    );
    Ok(())
}
