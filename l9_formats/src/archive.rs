//! Virtual archive exposing decoded pictures as `picN.raw` members.

use anyhow::{Context, Result, bail};
use bytes::Bytes;
use log::debug;
use serde::Serialize;

use crate::amiga::decode_amiga;
use crate::bitmap::Bitmap;
use crate::c64::{decode_bbc, decode_c64, decode_cpc};
use crate::mac::decode_mac;
use crate::pc::{decode_pc1, decode_pc2};
use crate::probe::{BitmapType, detect_bitmap_type, picture_file_name};
use crate::source::DataSource;
use crate::st::decode_st1;

/// Size and colour usage of one picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PictureInfo {
    pub picture: u32,
    pub width: usize,
    pub height: usize,
    pub palette_entries: usize,
    /// Distinct palette indices that actually appear in the pixels.
    pub colours_used: usize,
}

/// Decode picture `picture` from `source` using the layout of `kind`.
pub fn decode_bitmap<S: DataSource + ?Sized>(
    kind: BitmapType,
    source: &S,
    picture: u32,
) -> Result<Bitmap> {
    let file = picture_file_name(kind, source, picture)
        .context("no picture format has been detected")?;
    let data = source.read(&file)?;

    let bitmap = match kind {
        BitmapType::Pc1 => decode_pc1(&data),
        BitmapType::Pc2 | BitmapType::St2 => decode_pc2(&data),
        BitmapType::Amiga => decode_amiga(&data),
        BitmapType::Mac => decode_mac(&data),
        BitmapType::St1 => decode_st1(&data),
        BitmapType::C64 => decode_c64(&data, picture),
        BitmapType::Bbc => decode_bbc(&data, picture),
        BitmapType::Cpc => decode_cpc(&data, picture),
        BitmapType::None => bail!("no picture format has been detected"),
    }
    .with_context(|| format!("decoding {kind} picture {picture} from {file}"))?;

    bitmap.check_palette_indices()?;
    Ok(bitmap)
}

/// Picture number encoded in a `picN.raw` member name (case-insensitive).
pub fn picture_number(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    let digits = lower.strip_prefix("pic")?.strip_suffix(".raw")?;
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse().ok()
}

pub fn member_name(picture: u32) -> String {
    format!("pic{picture}.raw")
}

/// Serves pictures of one detected format as raw picture streams.
#[derive(Debug)]
pub struct BitmapArchive<S> {
    source: S,
    kind: BitmapType,
}

impl<S: DataSource> BitmapArchive<S> {
    /// Panics if `kind` is [`BitmapType::None`]; callers must only build an
    /// archive once pictures have been detected.
    pub fn new(source: S, kind: BitmapType) -> Self {
        assert!(
            kind.has_graphics(),
            "picture archive requires a detected picture format"
        );
        Self { source, kind }
    }

    /// Probe `source` and build an archive, or `None` when the game has no
    /// supported pictures.
    pub fn detect(source: S) -> Option<Self> {
        let kind = detect_bitmap_type(&source);
        kind.has_graphics().then(|| Self { source, kind })
    }

    pub fn bitmap_type(&self) -> BitmapType {
        self.kind
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Any well-formed member name is reported present; whether the picture
    /// decodes is only known on read.
    pub fn has_file(&self, name: &str) -> bool {
        picture_number(name).is_some()
    }

    /// Pictures cannot be enumerated without decoding every number, so the
    /// listing is always empty.
    pub fn list_members(&self) -> Vec<String> {
        Vec::new()
    }

    pub fn decode_picture(&self, picture: u32) -> Result<Bitmap> {
        decode_bitmap(self.kind, &self.source, picture)
    }

    pub fn picture_info(&self, picture: u32) -> Result<PictureInfo> {
        let bitmap = self.decode_picture(picture)?;
        Ok(PictureInfo {
            picture,
            width: bitmap.width(),
            height: bitmap.height(),
            palette_entries: bitmap.colour_count(),
            colours_used: bitmap.used_colour_count(),
        })
    }

    /// Decode the named picture into a raw stream, or `None` if the name is
    /// malformed or the picture does not decode.
    pub fn read_member(&self, name: &str) -> Option<Bytes> {
        let picture = picture_number(name)?;
        let bitmap = match self.decode_picture(picture) {
            Ok(bitmap) => bitmap,
            Err(err) => {
                debug!("{name} not available: {err:#}");
                return None;
            }
        };
        match l9_raw::encode_picture(
            bitmap.width(),
            bitmap.height(),
            bitmap.palette(),
            bitmap.pixels(),
        ) {
            Ok(stream) => Some(stream),
            Err(err) => {
                debug!("{name} could not be serialised: {err}");
                None
            }
        }
    }
}
