//! Atari ST v1 pictures (Knight Orc, Gnome Ranger).
//!
//! Pixel rows are a dump of low-res video memory: each 16 pixel group is
//! stored as four 2-byte bitplanes, lowest bit first.

use anyhow::{Context, Result, ensure};
use byteorder::{BigEndian, ByteOrder};

use crate::bitmap::{Bitmap, ensure_dimensions};
use crate::colour::Colour;
use crate::reader;

const ST1_HEADER_SIZE: usize = 44;
const BLOCK_SIZE: usize = 8;
const BLOCK_PIXELS: usize = 16;
const FULL_BLOCK_MASK: u16 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct St1Header {
    /// Bitplane words per row; four times this is the padded row width.
    pub bitplanes_per_row: usize,
    pub width: usize,
    pub height: usize,
    pub palette: [Colour; 16],
}

impl St1Header {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = reader::header(data, ST1_HEADER_SIZE, "ST v1")?;
        let bitplanes_per_row = BigEndian::read_u16(&header[34..36]) as usize;
        let height = BigEndian::read_u16(&header[38..40]) as usize;
        let last_block = BigEndian::read_u16(&header[42..44]);

        let mut width = bitplanes_per_row * 4;
        if last_block != FULL_BLOCK_MASK {
            // Sub-images narrower than their last 16 pixel block carry noise
            // in the unmasked low bits.
            ensure!(last_block != 0, "ST v1 last-block mask is empty");
            width = width.saturating_sub(last_block.trailing_zeros() as usize);
        }
        ensure_dimensions(width, height)?;

        let mut palette = [Colour::default(); 16];
        for (index, colour) in palette.iter_mut().enumerate() {
            *colour = Colour::pc_st(header[index * 2], header[index * 2 + 1]);
        }
        Ok(Self {
            bitplanes_per_row,
            width,
            height,
            palette,
        })
    }

    fn blocks_per_row(&self) -> usize {
        self.bitplanes_per_row / 4
    }

    fn row_bytes(&self) -> usize {
        self.bitplanes_per_row * 2
    }
}

/// Unpack up to sixteen 4-bit pixels from one eight-byte block, high bit to
/// low. Returns the number of pixels written.
pub fn decode_pixels(out: &mut [u8], block: &[u8; BLOCK_SIZE]) -> usize {
    let count = out.len().min(BLOCK_PIXELS);
    for (index, pixel) in out[..count].iter_mut().enumerate() {
        let byte = index / 8;
        let shift = 7 - (index % 8);
        let mut value = 0;
        for plane in 0..4 {
            value |= ((block[plane * 2 + byte] >> shift) & 1) << plane;
        }
        *pixel = value;
    }
    count
}

pub fn decode_st1(data: &[u8]) -> Result<Bitmap> {
    let header = St1Header::parse(data)?;
    let mut bitmap = Bitmap::create(header.width, header.height)?;
    draw_st1(&mut bitmap, data, 0, 0)?;
    Ok(bitmap)
}

/// Draw an ST v1 picture onto `bitmap` at (x, y), replacing its palette.
pub fn draw_st1(bitmap: &mut Bitmap, data: &[u8], x: usize, y: usize) -> Result<()> {
    let header = St1Header::parse(data)?;
    let (width, height) = bitmap.clip(x, y, header.width, header.height);

    for row in 0..height {
        let row_start = ST1_HEADER_SIZE + row * header.row_bytes();
        let line = &mut bitmap.row_mut(y + row)[x..x + width];
        let mut filled = 0;
        for block_index in 0..header.blocks_per_row() {
            if filled >= width {
                break;
            }
            let start = row_start + block_index * BLOCK_SIZE;
            let block: &[u8; BLOCK_SIZE] = data
                .get(start..start + BLOCK_SIZE)
                .and_then(|bytes| bytes.try_into().ok())
                .with_context(|| format!("ST v1 row {row} truncated at block {block_index}"))?;
            let end = (filled + BLOCK_PIXELS).min(width);
            filled += decode_pixels(&mut line[filled..end], block);
        }
    }

    bitmap.set_palette(&header.palette);
    Ok(())
}

/// Bitplane-word and row counts of known ST v1 pictures.
pub fn is_st1_header(header: &[u8]) -> bool {
    if header.len() < 40 {
        return false;
    }
    let bitplanes_per_row = BigEndian::read_u16(&header[34..36]);
    let height = BigEndian::read_u16(&header[38..40]);
    matches!((bitplanes_per_row, height), (0x0050, 0x0087) | (0x0038, 0x0074))
}
