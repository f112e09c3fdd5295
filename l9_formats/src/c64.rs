//! Commodore 64 multicolour pictures and the BBC Micro / Amstrad CPC variants
//! that reuse the same layout.
//!
//! Pictures are 160 double-width pixels across, built from 4x8 cells. Each
//! 2-bit cell code picks the background colour, one of the two screen-memory
//! nybbles, or the colour-memory nybble for that cell.

use anyhow::{Context, Result, bail};
use log::warn;

use crate::bitmap::Bitmap;
use crate::colour::{BBC_COLOURS, C64_COLOURS};

/// Bytes per picture inside the CPC `allpics.pic` bundle.
pub const CPC_PICTURE_STRIDE: usize = 6462;

/// Trailing BBC table mapping C64 colours onto pix-patterns.
pub const BBC_PATTERN_TABLE_SIZE: usize = 32;

const CELLS_PER_ROW: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MulticolourKind {
    C64,
    Bbc,
    Cpc,
}

/// Where each memory area of a multicolour picture lives within its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: usize,
    pub height: usize,
    pub bitmap: usize,
    pub screen: usize,
    pub background: usize,
    pub colour: usize,
    /// In-game pictures pack two cells' colour memory into one byte.
    pub packed_colour: bool,
}

impl Geometry {
    const fn title(bitmap: usize, screen: usize, background: usize, colour: usize) -> Self {
        Self {
            width: 320,
            height: 200,
            bitmap,
            screen,
            background,
            colour,
            packed_colour: false,
        }
    }

    const fn picture(bitmap: usize, screen: usize, colour: usize, background: usize) -> Self {
        Self {
            width: 320,
            height: 136,
            bitmap,
            screen,
            background,
            colour,
            packed_colour: true,
        }
    }

    /// C64 and BBC pictures are told apart by file size; CPC pictures by number.
    pub fn lookup(kind: MulticolourKind, size: usize, picture: u32) -> Result<Self> {
        let geometry = match kind {
            MulticolourKind::C64 => match size {
                10018 => Self::title(2, 8002, 9003, 9018),
                6464 => Self::picture(2, 5442, 6122, 6463),
                other => bail!("unrecognised C64 picture size {other}"),
            },
            // Both the headered and header-less sizes turn up in the wild.
            MulticolourKind::Bbc => match size {
                10058 => Self::title(10, 8010, 9011, 9026),
                10048 => Self::title(0, 8000, 9001, 9016),
                6504 => Self::picture(10, 5450, 6130, 6471),
                6494 => Self::picture(0, 5440, 6120, 6461),
                other => bail!("unrecognised BBC picture size {other}"),
            },
            MulticolourKind::Cpc => match picture {
                0 => Self::title(128, 8128, 9128, 9144),
                1 => Self::picture(128, 5568, 6248, 6588),
                2..=29 => {
                    let base = (picture as usize - 2) * CPC_PICTURE_STRIDE;
                    Self::picture(base, base + 5440, base + 6120, base + 6460)
                }
                other => bail!("CPC picture {other} is out of range"),
            },
        };
        Ok(geometry)
    }
}

fn byte_at(data: &[u8], offset: usize) -> Result<u8> {
    data.get(offset)
        .copied()
        .with_context(|| format!("multicolour data truncated at offset {offset}"))
}

/// Decode the 16-colour multicolour picture shared by all three platforms.
pub fn decode_multicolour(data: &[u8], kind: MulticolourKind, picture: u32) -> Result<Bitmap> {
    let geometry = Geometry::lookup(kind, data.len(), picture)?;
    let mut bitmap = Bitmap::create(geometry.width, geometry.height)?;
    let background = byte_at(data, geometry.background)? & 0x0F;

    for row in 0..geometry.height {
        let cell_y = row / 8;
        let cell_row = row % 8;
        let line = bitmap.row_mut(row);
        for column in 0..geometry.width / 2 {
            let cell_x = column / 4;
            let cell = cell_y * CELLS_PER_ROW + cell_x;
            let bits = byte_at(data, geometry.bitmap + cell * 8 + cell_row)?;
            let code = (bits >> ((3 - column % 4) * 2)) & 3;

            let colour = match code {
                0 => background,
                1 => byte_at(data, geometry.screen + cell)? >> 4,
                2 => byte_at(data, geometry.screen + cell)? & 0x0F,
                _ if geometry.packed_colour => {
                    let packed = byte_at(data, geometry.colour + cell / 2)?;
                    (packed >> ((1 - cell_x % 2) * 4)) & 0x0F
                }
                _ => byte_at(data, geometry.colour + cell)? & 0x0F,
            };

            line[column * 2] = colour;
            line[column * 2 + 1] = colour;
        }
    }

    bitmap.set_palette(&C64_COLOURS);
    Ok(bitmap)
}

pub fn decode_c64(data: &[u8], picture: u32) -> Result<Bitmap> {
    decode_multicolour(data, MulticolourKind::C64, picture)
}

pub fn decode_cpc(data: &[u8], picture: u32) -> Result<Bitmap> {
    decode_multicolour(data, MulticolourKind::Cpc, picture)
}

/// 2x2 BBC mode 2 patterns standing in for each of the sixteen C64 colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixPatterns([[[u8; 2]; 2]; 16]);

impl PixPatterns {
    /// The first sixteen bytes serve even BBC columns and the second sixteen
    /// odd columns. Within a byte bits 7,5,3,1 give the even-row colour and
    /// bits 6,4,2,0 the odd-row colour.
    pub fn parse(table: &[u8; BBC_PATTERN_TABLE_SIZE]) -> Self {
        let mut patterns = [[[0u8; 2]; 2]; 16];
        for (index, &byte) in table.iter().enumerate() {
            let even = ((byte >> 4) & 0x8)
                | ((byte >> 3) & 0x4)
                | ((byte >> 2) & 0x2)
                | ((byte >> 1) & 0x1);
            let odd =
                ((byte >> 3) & 0x8) | ((byte >> 2) & 0x4) | ((byte >> 1) & 0x2) | (byte & 0x1);
            patterns[index % 16][index / 16] = [even, odd];
        }
        Self(patterns)
    }

    /// Steady BBC colour for a C64 colour at the given pixel parity. The
    /// flashing bit is dropped since only the eight steady colours exist.
    pub fn pixel(&self, colour: u8, odd_column: bool, odd_row: bool) -> u8 {
        self.0[(colour & 0x0F) as usize][odd_column as usize][odd_row as usize] & 0x07
    }

    fn uses_flashing_colours(&self) -> bool {
        self.0.iter().flatten().flatten().any(|&pixel| pixel & 0x08 != 0)
    }
}

/// Replace each double-width C64 pixel with its BBC pix-pattern colour.
pub fn apply_pix_patterns(bitmap: &mut Bitmap, patterns: &PixPatterns) {
    if patterns.uses_flashing_colours() {
        warn!("BBC pix-pattern table uses flashing colours; showing steady colours only");
    }
    for row in 0..bitmap.height() {
        let odd_row = row % 2 == 1;
        let line = bitmap.row_mut(row);
        for (column, pair) in line.chunks_exact_mut(2).enumerate() {
            let colour = patterns.pixel(pair[0], column % 2 == 1, odd_row);
            pair[0] = colour;
            pair[1] = colour;
        }
    }
    bitmap.set_palette(&BBC_COLOURS);
}

pub fn decode_bbc(data: &[u8], picture: u32) -> Result<Bitmap> {
    let mut bitmap = decode_multicolour(data, MulticolourKind::Bbc, picture)?;
    let table_start = data
        .len()
        .checked_sub(BBC_PATTERN_TABLE_SIZE)
        .context("BBC picture too small for its pix-pattern table")?;
    let table: &[u8; BBC_PATTERN_TABLE_SIZE] = (&data[table_start..])
        .try_into()
        .context("reading BBC pix-pattern table")?;
    apply_pix_patterns(&mut bitmap, &PixPatterns::parse(table));
    Ok(bitmap)
}

/// `picN` files of these sizes are BBC rather than C64 pictures.
pub fn is_bbc_size(size: u64) -> bool {
    matches!(size, 10048 | 6494)
}
