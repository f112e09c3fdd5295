//! Macintosh pictures: 1-bit packed rows, white on black.

use anyhow::Result;
use byteorder::{BigEndian, ByteOrder};

use crate::bitmap::{Bitmap, ensure_dimensions};
use crate::colour::MAC_COLOURS;
use crate::reader;

const MAC_HEADER_SIZE: usize = 10;

/// Sub-images are always drawn at this column whatever offset was asked for.
pub const MAC_SUB_IMAGE_X: usize = 78;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacHeader {
    pub width: usize,
    pub height: usize,
}

impl MacHeader {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = reader::header(data, MAC_HEADER_SIZE, "Macintosh")?;
        let width = BigEndian::read_u16(&header[2..4]) as usize;
        let height = BigEndian::read_u16(&header[6..8]) as usize;
        ensure_dimensions(width, height)?;
        Ok(Self { width, height })
    }
}

pub fn decode_mac(data: &[u8]) -> Result<Bitmap> {
    let header = MacHeader::parse(data)?;
    let mut bitmap = Bitmap::create(header.width, header.height)?;
    draw_mac(&mut bitmap, data, 0, 0)?;
    Ok(bitmap)
}

/// Draw a Macintosh picture onto `bitmap`. Any non-zero `x` is replaced by
/// [`MAC_SUB_IMAGE_X`] to match the placement the game data was authored for.
pub fn draw_mac(bitmap: &mut Bitmap, data: &[u8], x: usize, y: usize) -> Result<()> {
    let header = MacHeader::parse(data)?;
    let x = if x > 0 { MAC_SUB_IMAGE_X } else { x };
    let (width, height) = bitmap.clip(x, y, header.width, header.height);
    let row_bytes = width / 8;
    if width > 0 {
        let last = MAC_HEADER_SIZE + row_bytes * (height - 1) + (width - 1) / 8;
        reader::require(data, last + 1, "Macintosh")?;
    }

    for row in 0..height {
        let line = &mut bitmap.row_mut(y + row)[x..x + width];
        for (column, pixel) in line.iter_mut().enumerate() {
            let packed = data[MAC_HEADER_SIZE + row_bytes * row + column / 8];
            *pixel = (packed >> (7 - (column % 8))) & 1;
        }
    }

    bitmap.set_palette(&MAC_COLOURS);
    Ok(())
}

/// Dimension pairs of known Mac pictures, read as big-endian words at 2 and 6.
pub fn is_mac_header(header: &[u8]) -> bool {
    if header.len() < 8 {
        return false;
    }
    let width = BigEndian::read_u16(&header[2..4]);
    let height = BigEndian::read_u16(&header[6..8]);
    matches!(
        (width, height),
        (0x0200, 0x00D8) | (0x0168, 0x00BA) | (0x0168, 0x00BC) | (0x0200, 0x00DA) | (0x0168, 0x00DA)
    )
}
