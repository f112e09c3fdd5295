//! Amiga pictures: a 32-colour palette followed by five full-frame bitplanes.

use anyhow::Result;
use byteorder::{BigEndian, ByteOrder};

use crate::bitmap::{Bitmap, ensure_dimensions};
use crate::colour::Colour;
use crate::reader;

const AMIGA_HEADER_SIZE: usize = 72;
const PLANES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmigaHeader {
    pub width: usize,
    pub height: usize,
    pub palette: [Colour; 32],
}

impl AmigaHeader {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = reader::header(data, AMIGA_HEADER_SIZE, "Amiga")?;
        let width = BigEndian::read_u32(&header[64..68]) as usize;
        let height = BigEndian::read_u32(&header[68..72]) as usize;
        ensure_dimensions(width, height)?;
        let mut palette = [Colour::default(); 32];
        for (index, colour) in palette.iter_mut().enumerate() {
            *colour = Colour::amiga(header[index * 2], header[index * 2 + 1]);
        }
        Ok(Self {
            width,
            height,
            palette,
        })
    }
}

pub fn decode_amiga(data: &[u8]) -> Result<Bitmap> {
    let header = AmigaHeader::parse(data)?;
    let mut bitmap = Bitmap::create(header.width, header.height)?;
    draw_amiga(&mut bitmap, data, 0, 0)?;
    Ok(bitmap)
}

/// Draw an Amiga picture onto `bitmap` at (x, y), replacing its palette.
pub fn draw_amiga(bitmap: &mut Bitmap, data: &[u8], x: usize, y: usize) -> Result<()> {
    let header = AmigaHeader::parse(data)?;
    let (width, height) = bitmap.clip(x, y, header.width, header.height);
    let row_bytes = width / 8;
    if width > 0 {
        let last = AMIGA_HEADER_SIZE
            + row_bytes * (height * (PLANES - 1) + height - 1)
            + (width - 1) / 8;
        reader::require(data, last + 1, "Amiga")?;
    }

    for row in 0..height {
        let line = &mut bitmap.row_mut(y + row)[x..x + width];
        for (column, pixel) in line.iter_mut().enumerate() {
            let shift = 7 - (column % 8);
            let mut value = 0;
            for plane in 0..PLANES {
                let offset = AMIGA_HEADER_SIZE + row_bytes * (height * plane + row) + column / 8;
                value |= ((data[offset] >> shift) & 1) << plane;
            }
            *pixel = value;
        }
    }

    bitmap.set_palette(&header.palette);
    Ok(())
}

/// Dimension pairs of known Amiga pictures, read as big-endian words at 66 and 70.
pub fn is_amiga_header(header: &[u8]) -> bool {
    if header.len() < AMIGA_HEADER_SIZE {
        return false;
    }
    let width = BigEndian::read_u16(&header[66..68]);
    let height = BigEndian::read_u16(&header[70..72]);
    matches!(
        (width, height),
        (0x0140, 0x0088)
            | (0x0140, 0x0087)
            | (0x00E0, 0x0075)
            | (0x00E4, 0x0075)
            | (0x00E0, 0x0076)
            | (0x00DB, 0x0076)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amiga_file(width: u32, height: u32, planes: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; AMIGA_HEADER_SIZE];
        data[0] = 0x0F;
        data[64..68].copy_from_slice(&width.to_be_bytes());
        data[68..72].copy_from_slice(&height.to_be_bytes());
        data.extend_from_slice(planes);
        data
    }

    #[test]
    fn composes_five_bitplanes() {
        let bitmap = decode_amiga(&amiga_file(8, 1, &[0xFF, 0, 0, 0, 0x0F])).unwrap();
        assert_eq!(bitmap.pixels(), &[1, 1, 1, 1, 17, 17, 17, 17]);
        assert_eq!(bitmap.colour_count(), 32);
        assert_eq!(bitmap.palette().len(), 96);
        assert_eq!(&bitmap.palette()[..3], &[0xFF, 0, 0]);
        bitmap.check_palette_indices().unwrap();
    }

    #[test]
    fn planes_follow_each_other_frame_by_frame() {
        // Two rows: plane 0 = [0x80, 0x01], plane 2 = [0x00, 0x80].
        let planes = [0x80, 0x01, 0, 0, 0x00, 0x80, 0, 0, 0, 0];
        let bitmap = decode_amiga(&amiga_file(8, 2, &planes)).unwrap();
        assert_eq!(bitmap.pixel(0, 0), 1);
        assert_eq!(bitmap.pixel(7, 1), 1);
        assert_eq!(bitmap.pixel(0, 1), 4);
    }

    #[test]
    fn rejects_truncated_and_oversized_pictures() {
        assert!(decode_amiga(&[0u8; 71]).is_err());
        assert!(decode_amiga(&amiga_file(8, 1, &[0xFF, 0, 0, 0])).is_err());
        assert!(decode_amiga(&amiga_file(8, 219, &[0; 8 * 219])).is_err());
    }

    #[test]
    fn recognises_known_dimensions() {
        let mut header = [0u8; AMIGA_HEADER_SIZE];
        header[66..68].copy_from_slice(&0x0140u16.to_be_bytes());
        header[70..72].copy_from_slice(&0x0087u16.to_be_bytes());
        assert!(is_amiga_header(&header));
        header[71] = 0x99;
        assert!(!is_amiga_header(&header));
    }
}
