use anyhow::{Result, bail, ensure};

use crate::colour::Colour;

pub const MAX_BITMAP_WIDTH: usize = 512;
pub const MAX_BITMAP_HEIGHT: usize = 218;

/// Reject header dimensions larger than any canvas can hold.
pub(crate) fn ensure_dimensions(width: usize, height: usize) -> Result<()> {
    ensure!(
        width <= MAX_BITMAP_WIDTH && height <= MAX_BITMAP_HEIGHT,
        "picture {width}x{height} exceeds {MAX_BITMAP_WIDTH}x{MAX_BITMAP_HEIGHT}"
    );
    Ok(())
}

/// Indexed-colour picture: one palette index per pixel plus a flat RGB palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    palette: Vec<u8>,
}

impl Bitmap {
    /// Allocate a zero-filled canvas. Empty or oversized canvases are rejected.
    pub fn create(width: usize, height: usize) -> Result<Self> {
        ensure!(
            width > 0 && height > 0,
            "bitmap reports zero width or height ({width}x{height})"
        );
        ensure_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![0; width * height],
            palette: Vec::new(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.width;
        &mut self.pixels[start..start + self.width]
    }

    /// Flat palette, three bytes (R, G, B) per entry.
    pub fn palette(&self) -> &[u8] {
        &self.palette
    }

    pub fn colour_count(&self) -> usize {
        self.palette.len() / 3
    }

    pub fn set_palette(&mut self, colours: &[Colour]) {
        self.palette.clear();
        self.palette.reserve(colours.len() * 3);
        for colour in colours {
            self.palette
                .extend_from_slice(&[colour.red, colour.green, colour.blue]);
        }
    }

    /// Clip a `width`x`height` image placed at (x, y) to the canvas.
    pub(crate) fn clip(&self, x: usize, y: usize, width: usize, height: usize) -> (usize, usize) {
        let width = width.min(self.width.saturating_sub(x));
        let height = height.min(self.height.saturating_sub(y));
        if width == 0 || height == 0 {
            return (0, 0);
        }
        (width, height)
    }

    /// Number of distinct palette indices that appear in the picture.
    pub fn used_colour_count(&self) -> usize {
        let mut seen = [false; 256];
        let mut count = 0;
        for &pixel in &self.pixels {
            if !seen[pixel as usize] {
                seen[pixel as usize] = true;
                count += 1;
            }
        }
        count
    }

    pub fn check_palette_indices(&self) -> Result<()> {
        let colours = self.colour_count();
        if let Some(position) = self
            .pixels
            .iter()
            .position(|&pixel| pixel as usize >= colours)
        {
            bail!(
                "pixel {} at ({}, {}) is outside the {colours}-entry palette",
                self.pixels[position],
                position % self.width,
                position / self.width
            );
        }
        Ok(())
    }

    /// Expand the indexed pixels into RGBA8888 using the palette.
    pub fn to_rgba8(&self) -> Result<Vec<u8>> {
        self.check_palette_indices()?;
        let mut rgba = Vec::with_capacity(self.pixels.len() * 4);
        for &pixel in &self.pixels {
            let base = pixel as usize * 3;
            rgba.extend_from_slice(&self.palette[base..base + 3]);
            rgba.push(0xFF);
        }
        Ok(rgba)
    }
}
