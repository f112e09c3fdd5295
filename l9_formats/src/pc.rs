//! PC picture formats.
//!
//! The early V4 games (Knight Orc, Gnome Ranger) shipped a simple packed
//! nybble format. The later V4 games share a compressed format between the
//! PC and the Atari ST (`.squ` files on the ST).

use anyhow::{Context, Result, bail, ensure};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::bitmap::{Bitmap, ensure_dimensions};
use crate::colour::Colour;
use crate::reader;

const PC1_HEADER_SIZE: usize = 22;
const PC1_PALETTE: usize = 6;
const PC1_PIXELS: usize = 23;

const PC2_PALETTE: usize = 4;
const PC2_SEED: usize = 40;
const PC2_PIXEL_TABLE: usize = 42;
const PC2_STRIP_TABLE: usize = 298;
const PC2_INDEX_TABLE: usize = 314;
const PC2_HEADER_SIZE: usize = 570;

/// Selector value flagging a literal 4-bit pixel index in the bit stream.
const LITERAL_SELECTOR: u8 = 0xFF;

/// Header of a PC v1 picture: LE width/height and sixteen EGA colour codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pc1Header {
    pub width: usize,
    pub height: usize,
    pub palette: [Colour; 16],
}

impl Pc1Header {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = reader::header(data, PC1_HEADER_SIZE, "PC v1")?;
        let width = LittleEndian::read_u16(&header[2..4]) as usize;
        let height = LittleEndian::read_u16(&header[4..6]) as usize;
        ensure_dimensions(width, height)?;
        let mut palette = [Colour::default(); 16];
        for (index, colour) in palette.iter_mut().enumerate() {
            *colour = Colour::ega(header[PC1_PALETTE + index]);
        }
        Ok(Self {
            width,
            height,
            palette,
        })
    }
}

pub fn decode_pc1(data: &[u8]) -> Result<Bitmap> {
    let header = Pc1Header::parse(data)?;
    let mut bitmap = Bitmap::create(header.width, header.height)?;
    draw_pc1(&mut bitmap, data, 0, 0)?;
    Ok(bitmap)
}

/// Draw a PC v1 picture onto `bitmap` at (x, y), replacing its palette.
pub fn draw_pc1(bitmap: &mut Bitmap, data: &[u8], x: usize, y: usize) -> Result<()> {
    let header = Pc1Header::parse(data)?;
    let (width, height) = bitmap.clip(x, y, header.width, header.height);
    if width > 0 && height > 0 {
        let last = PC1_PIXELS + ((height - 1) * width) / 2 + (width - 1) / 2;
        reader::require(data, last + 1, "PC v1")?;
    }

    for row in 0..height {
        let line = &mut bitmap.row_mut(y + row)[x..x + width];
        for (column, pixel) in line.iter_mut().enumerate() {
            let packed = data[PC1_PIXELS + (row * width) / 2 + column / 2];
            *pixel = (packed >> ((1 - (column & 1)) * 4)) & 0x0F;
        }
    }

    bitmap.set_palette(&header.palette);
    Ok(())
}

/// Header of a PC v2 / ST v2 picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pc2Header<'a> {
    pub width: usize,
    pub height: usize,
    pub palette: [Colour; 16],
    pub seed: u8,
    pub pixel_table: &'a [u8],
    pub strip_table: &'a [u8],
    pub index_table: &'a [u8],
}

impl<'a> Pc2Header<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let header = reader::header(data, PC2_HEADER_SIZE, "PC v2")?;
        let width = BigEndian::read_u16(&header[36..38]) as usize;
        let height = BigEndian::read_u16(&header[38..40]) as usize;
        ensure_dimensions(width, height)?;
        let mut palette = [Colour::default(); 16];
        for (index, colour) in palette.iter_mut().enumerate() {
            let entry = PC2_PALETTE + index * 2;
            *colour = Colour::pc_st(header[entry], header[entry + 1]);
        }
        Ok(Self {
            width,
            height,
            palette,
            seed: header[PC2_SEED],
            pixel_table: &header[PC2_PIXEL_TABLE..PC2_STRIP_TABLE],
            strip_table: &header[PC2_STRIP_TABLE..PC2_INDEX_TABLE],
            index_table: &header[PC2_INDEX_TABLE..PC2_HEADER_SIZE],
        })
    }
}

/// LSB-first reader over a two-byte window into the image data. The high
/// byte is refilled as soon as its eight bits have been shifted down; a refill
/// past the end of the file loads zeros that must never be read.
struct BitStream<'a> {
    data: &'a [u8],
    position: usize,
    buffer: u16,
    bits_left: u8,
    /// Low bits of `buffer` that came from the file.
    valid: u8,
}

impl<'a> BitStream<'a> {
    fn new(data: &'a [u8]) -> Result<Self> {
        ensure!(
            data.len() >= 2,
            "PC v2 image data too small to prime the bit stream"
        );
        Ok(Self {
            data,
            position: 2,
            buffer: u16::from_le_bytes([data[0], data[1]]),
            bits_left: 8,
            valid: 16,
        })
    }

    fn ensure_valid(&self, bits: u8) -> Result<()> {
        ensure!(
            self.valid >= bits,
            "PC v2 bit stream ran past the end of the file"
        );
        Ok(())
    }

    fn low_byte(&self) -> Result<u8> {
        self.ensure_valid(8)?;
        Ok((self.buffer & 0x00FF) as u8)
    }

    fn low_nybble(&self) -> Result<u8> {
        self.ensure_valid(4)?;
        Ok((self.buffer & 0x000F) as u8)
    }

    fn strip(&mut self, count: u8) {
        for _ in 0..count {
            self.buffer >>= 1;
            self.bits_left -= 1;
            self.valid = self.valid.saturating_sub(1);
            if self.bits_left == 0 {
                if let Some(&next) = self.data.get(self.position) {
                    self.buffer += u16::from(next) << 8;
                    self.valid += 8;
                }
                self.position += 1;
                self.bits_left = 8;
            }
        }
    }
}

/// Per-call decoder state: the bit stream and the previously decoded pixel.
struct Pc2Decoder<'a> {
    header: &'a Pc2Header<'a>,
    stream: BitStream<'a>,
    previous: u8,
}

impl Pc2Decoder<'_> {
    fn next_pixel(&mut self) -> Result<u8> {
        let selector = self.stream.low_byte()?;
        let index = if selector != LITERAL_SELECTOR {
            let index = self.header.index_table[selector as usize];
            let Some(&strip) = self.header.strip_table.get(index as usize) else {
                bail!("PC v2 pixel index {index} outside the strip table");
            };
            self.stream.strip(strip);
            index
        } else {
            self.stream.strip(8);
            let index = self.stream.low_nybble()?;
            self.stream.strip(4);
            index
        };

        let lookup = ((self.previous << 4) & 0xF0) as usize + index as usize;
        self.previous = self.header.pixel_table[lookup];
        Ok(self.previous)
    }
}

pub fn decode_pc2(data: &[u8]) -> Result<Bitmap> {
    let header = Pc2Header::parse(data)?;
    let mut bitmap = Bitmap::create(header.width, header.height)?;
    draw_pc2(&mut bitmap, data, 0, 0)?;
    Ok(bitmap)
}

/// Draw a PC v2 picture onto `bitmap` at (x, y), replacing its palette.
pub fn draw_pc2(bitmap: &mut Bitmap, data: &[u8], x: usize, y: usize) -> Result<()> {
    let header = Pc2Header::parse(data)?;
    let (width, height) = bitmap.clip(x, y, header.width, header.height);

    let mut decoder = Pc2Decoder {
        header: &header,
        stream: BitStream::new(&data[PC2_HEADER_SIZE..])?,
        previous: header.seed,
    };
    for row in 0..height {
        let line = &mut bitmap.row_mut(y + row)[x..x + width];
        for pixel in line.iter_mut() {
            *pixel = decoder
                .next_pixel()
                .with_context(|| format!("decoding PC v2 row {row}"))?;
        }
    }

    bitmap.set_palette(&header.palette);
    Ok(())
}

/// The PC v1 format is recognised by the dimensions of known pictures.
pub fn is_pc1_header(header: &[u8]) -> bool {
    if header.len() < 6 {
        return false;
    }
    let width = LittleEndian::read_u16(&header[2..4]);
    let height = LittleEndian::read_u16(&header[4..6]);
    matches!(
        (width, height),
        (0x0140, 0x0087) | (0x00E0, 0x0074) | (0x00E1, 0x0076)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pc1_file(width: u16, height: u16, pixels: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; PC1_PIXELS];
        data[2..4].copy_from_slice(&width.to_le_bytes());
        data[4..6].copy_from_slice(&height.to_le_bytes());
        for (index, code) in data[PC1_PALETTE..PC1_PALETTE + 16].iter_mut().enumerate() {
            *code = index as u8;
        }
        data.extend_from_slice(pixels);
        data
    }

    /// Pixel table computing `previous + index` so each pixel depends on the last.
    fn pc2_file(width: u16, height: u16, seed: u8, stream: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; PC2_HEADER_SIZE];
        data[PC2_PALETTE] = 0x07;
        data[36..38].copy_from_slice(&width.to_be_bytes());
        data[38..40].copy_from_slice(&height.to_be_bytes());
        data[PC2_SEED] = seed;
        for value in 0..256usize {
            data[PC2_PIXEL_TABLE + value] = (((value >> 4) + (value & 0x0F)) & 0x0F) as u8;
        }
        data[PC2_STRIP_TABLE] = 2;
        data.extend_from_slice(stream);
        data
    }

    #[test]
    fn decodes_packed_nybbles() {
        let data = pc1_file(4, 2, &[0x12, 0x34, 0x56, 0x78]);
        let bitmap = decode_pc1(&data).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (4, 2));
        assert_eq!(bitmap.pixels(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(bitmap.colour_count(), 16);
        assert_eq!(bitmap.palette().len(), 48);
        bitmap.check_palette_indices().unwrap();
    }

    #[test]
    fn pc1_rejects_truncated_and_oversized_files() {
        assert!(decode_pc1(&[0u8; 10]).is_err());
        let short = pc1_file(4, 2, &[0x12, 0x34]);
        assert!(decode_pc1(&short).is_err());
        let wide = pc1_file(600, 2, &[0; 600]);
        assert!(decode_pc1(&wide).is_err());
    }

    #[test]
    fn pc1_sub_image_is_clipped_to_canvas() {
        let mut canvas = Bitmap::create(6, 2).unwrap();
        let data = pc1_file(4, 2, &[0x11, 0x11, 0x22, 0x22]);
        draw_pc1(&mut canvas, &data, 4, 1).unwrap();
        assert_eq!(canvas.pixels(), &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn literal_and_table_pixels_accumulate_from_seed() {
        // 0xFF selector: literal index 7 from the next nybble, then selector 0x00
        // strips two bits and adds index 0 to the previous pixel.
        let data = pc2_file(2, 1, 3, &[0xFF, 0x07, 0x00, 0x00]);
        let bitmap = decode_pc2(&data).unwrap();
        assert_eq!(bitmap.pixels(), &[10, 10]);
        assert_eq!(bitmap.colour_count(), 16);
        assert_eq!(&bitmap.palette()[..3], &[0xFF, 0, 0]);
    }

    #[test]
    fn pc2_decoding_is_deterministic() {
        let stream: Vec<u8> = (0..64u8).map(|b| b.wrapping_mul(37)).collect();
        let data = pc2_file(8, 4, 0, &stream);
        let first = decode_pc2(&data).unwrap();
        let second = decode_pc2(&data).unwrap();
        assert_eq!(first.pixels(), second.pixels());
    }

    #[test]
    fn final_refill_past_the_end_is_harmless_when_unread() {
        let data = pc2_file(1, 1, 0, &[0xFF, 0x07]);
        let bitmap = decode_pc2(&data).unwrap();
        assert_eq!(bitmap.pixels(), &[7]);
    }

    #[test]
    fn pc2_rejects_truncated_input() {
        assert!(decode_pc2(&[0u8; PC2_HEADER_SIZE - 1]).is_err());
        assert!(decode_pc2(&pc2_file(2, 1, 0, &[0xFF])).is_err());
        // The second selector needs bits from a byte past the end.
        assert!(decode_pc2(&pc2_file(2, 1, 0, &[0xFF, 0x07])).is_err());
    }

    #[test]
    fn sniffs_pc1_dimensions() {
        let mut header = [0u8; 6];
        header[2..4].copy_from_slice(&0x0140u16.to_le_bytes());
        header[4..6].copy_from_slice(&0x0087u16.to_le_bytes());
        assert!(is_pc1_header(&header));
        header[4] = 0x88;
        assert!(!is_pc1_header(&header));
        assert!(!is_pc1_header(&header[..4]));
    }
}
