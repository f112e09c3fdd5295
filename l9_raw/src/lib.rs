//! Shared `picNNN.raw` stream helpers.
//!
//! A raw picture is a little-endian header followed by the palette and the
//! indexed pixel rows. The virtual picture archive produces these streams and
//! picture consumers read them back, so the layout lives in one place.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::Serialize;
use thiserror::Error;

/// Length of the fixed header: width, height and palette entry count.
pub const HEADER_LEN: usize = 2 + 2 + 2;

/// Transparency marker meaning "no transparent colour".
pub const NO_TRANSPARENCY: u8 = 0xFF;

/// Largest palette an indexed picture can carry.
pub const MAX_PALETTE_ENTRIES: usize = 256;

/// Dimensions and palette size of a raw picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RawPictureHeader {
    pub width: u16,
    pub height: u16,
    pub palette_entries: u16,
}

impl RawPictureHeader {
    /// Header for an indexed picture with a flat RGB `palette_len`-byte palette.
    pub fn for_picture(width: usize, height: usize, palette_len: usize) -> Result<Self, RawError> {
        let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
            return Err(RawError::DimensionOverflow { width, height });
        };
        if palette_len % 3 != 0 || palette_len / 3 > MAX_PALETTE_ENTRIES {
            return Err(RawError::PaletteTooLarge(palette_len));
        }
        Ok(Self {
            width: w,
            height: h,
            palette_entries: (palette_len / 3) as u16,
        })
    }

    /// Encode the header as little-endian bytes.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..2].copy_from_slice(&self.width.to_le_bytes());
        out[2..4].copy_from_slice(&self.height.to_le_bytes());
        out[4..6].copy_from_slice(&self.palette_entries.to_le_bytes());
        out
    }

    /// Decode a header from raw bytes.
    pub fn decode(input: &[u8]) -> Result<Self, RawError> {
        if input.len() < HEADER_LEN {
            return Err(RawError::TruncatedHeader);
        }
        let mut cursor = &input[..HEADER_LEN];
        let width = cursor.get_u16_le();
        let height = cursor.get_u16_le();
        let palette_entries = cursor.get_u16_le();
        Ok(Self {
            width,
            height,
            palette_entries,
        })
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Total stream length implied by this header.
    pub fn stream_len(&self) -> usize {
        HEADER_LEN + self.palette_entries as usize * 3 + 1 + self.pixel_count()
    }
}

/// A decoded raw picture stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPicture {
    pub header: RawPictureHeader,
    /// Flat RGB triples, `3 * palette_entries` bytes.
    pub palette: Vec<u8>,
    /// Palette index treated as transparent, if any.
    pub transparent: Option<u8>,
    pub pixels: Vec<u8>,
}

impl RawPicture {
    pub fn decode(bytes: &[u8]) -> Result<Self, RawError> {
        let header = RawPictureHeader::decode(bytes)?;
        let mut rest = &bytes[HEADER_LEN..];

        let palette_len = header.palette_entries as usize * 3;
        if rest.len() < palette_len + 1 {
            return Err(RawError::TruncatedPalette {
                expected: palette_len + 1,
                actual: rest.len(),
            });
        }
        let palette = rest[..palette_len].to_vec();
        rest.advance(palette_len);

        let marker = rest.get_u8();
        let transparent = (marker != NO_TRANSPARENCY).then_some(marker);

        let pixel_count = header.pixel_count();
        if rest.len() < pixel_count {
            return Err(RawError::TruncatedPixels {
                expected: pixel_count,
                actual: rest.len(),
            });
        }
        let pixels = rest[..pixel_count].to_vec();

        Ok(Self {
            header,
            palette,
            transparent,
            pixels,
        })
    }
}

/// Error conditions returned by the raw stream helpers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RawError {
    #[error("header smaller than {HEADER_LEN} bytes")]
    TruncatedHeader,
    #[error("palette truncated: expected {expected} bytes but found {actual}")]
    TruncatedPalette { expected: usize, actual: usize },
    #[error("pixel data truncated: expected {expected} bytes but found {actual}")]
    TruncatedPixels { expected: usize, actual: usize },
    #[error("palette of {0} bytes is not a whole number of RGB entries up to {MAX_PALETTE_ENTRIES}")]
    PaletteTooLarge(usize),
    #[error("picture dimensions {width}x{height} do not fit the stream header")]
    DimensionOverflow { width: usize, height: usize },
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    PixelCountMismatch { expected: usize, actual: usize },
}

/// Serialise an indexed picture into a raw stream with no transparent colour.
pub fn encode_picture(
    width: usize,
    height: usize,
    palette: &[u8],
    pixels: &[u8],
) -> Result<Bytes, RawError> {
    let header = RawPictureHeader::for_picture(width, height, palette.len())?;
    if pixels.len() != header.pixel_count() {
        return Err(RawError::PixelCountMismatch {
            expected: header.pixel_count(),
            actual: pixels.len(),
        });
    }

    let mut out = BytesMut::with_capacity(header.stream_len());
    out.put_slice(&header.encode());
    out.put_slice(palette);
    out.put_u8(NO_TRANSPARENCY);
    out.put_slice(pixels);
    Ok(out.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_fields_are_little_endian() {
        let header = RawPictureHeader {
            width: 0x0140,
            height: 0x0088,
            palette_entries: 16,
        };
        assert_eq!(header.encode(), [0x40, 0x01, 0x88, 0x00, 0x10, 0x00]);
        assert_eq!(RawPictureHeader::decode(&header.encode()), Ok(header));
    }

    #[test]
    fn encoded_stream_decodes_with_no_transparency() {
        let palette = [0, 0, 0, 0xFF, 0xFF, 0xFF];
        let pixels = [0, 1, 1, 0, 1, 0];
        let stream = encode_picture(3, 2, &palette, &pixels).unwrap();
        assert_eq!(stream.len(), HEADER_LEN + 6 + 1 + 6);
        assert_eq!(stream[HEADER_LEN + 6], NO_TRANSPARENCY);

        let picture = RawPicture::decode(&stream).unwrap();
        assert_eq!(picture.header.width, 3);
        assert_eq!(picture.header.height, 2);
        assert_eq!(picture.header.palette_entries, 2);
        assert_eq!(picture.palette, palette);
        assert_eq!(picture.transparent, None);
        assert_eq!(picture.pixels, pixels);
    }

    #[test]
    fn rejects_truncated_streams() {
        assert_eq!(RawPicture::decode(&[1, 0]), Err(RawError::TruncatedHeader));

        let stream = encode_picture(2, 2, &[1, 2, 3], &[0; 4]).unwrap();
        let short = &stream[..stream.len() - 1];
        assert_eq!(
            RawPicture::decode(short),
            Err(RawError::TruncatedPixels {
                expected: 4,
                actual: 3
            })
        );
        assert!(matches!(
            RawPicture::decode(&stream[..HEADER_LEN + 2]),
            Err(RawError::TruncatedPalette { .. })
        ));
    }

    #[test]
    fn rejects_mismatched_inputs() {
        assert_eq!(
            encode_picture(2, 2, &[1, 2], &[0; 4]),
            Err(RawError::PaletteTooLarge(2))
        );
        assert_eq!(
            encode_picture(2, 2, &[1, 2, 3], &[0; 3]),
            Err(RawError::PixelCountMismatch {
                expected: 4,
                actual: 3
            })
        );
        assert!(matches!(
            encode_picture(70_000, 1, &[], &[]),
            Err(RawError::DimensionOverflow { .. })
        ));
    }

    #[test]
    fn header_for_picture_counts_palette_entries() {
        let header = RawPictureHeader::for_picture(320, 136, 48).unwrap();
        assert_eq!(header.palette_entries, 16);
        assert_eq!(header.stream_len(), HEADER_LEN + 48 + 1 + 320 * 136);
        assert_eq!(
            RawPictureHeader::for_picture(320, 136, 3 * (MAX_PALETTE_ENTRIES + 1)),
            Err(RawError::PaletteTooLarge(3 * (MAX_PALETTE_ENTRIES + 1)))
        );
    }

    #[test]
    fn header_serialises_field_by_field() {
        let header = RawPictureHeader::for_picture(2, 1, 6).unwrap();
        assert_eq!(
            serde_json::to_value(header).unwrap(),
            serde_json::json!({ "width": 2, "height": 1, "palette_entries": 2 })
        );
    }
}
