//! Picture format detection and per-format file naming.

use std::fmt;

use log::{debug, info};
use serde::Serialize;

use crate::amiga::is_amiga_header;
use crate::c64::is_bbc_size;
use crate::mac::is_mac_header;
use crate::pc::is_pc1_header;
use crate::source::DataSource;
use crate::st::is_st1_header;

/// Picture used to probe for each format; every game with graphics has one.
pub const PROBE_PICTURE: u32 = 2;

/// Number under which most formats store the title picture.
pub const TITLE_PICTURE: u32 = 30;

/// Leading bytes needed to tell the extension-less formats apart.
const NOEXT_SNIFF_LEN: usize = 72;
const PC_SNIFF_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BitmapType {
    None,
    Amiga,
    Pc1,
    Pc2,
    C64,
    Bbc,
    Cpc,
    Mac,
    St1,
    St2,
}

impl BitmapType {
    pub fn has_graphics(self) -> bool {
        self != BitmapType::None
    }

    pub fn label(self) -> &'static str {
        match self {
            BitmapType::None => "none",
            BitmapType::Amiga => "Amiga",
            BitmapType::Pc1 => "PC v1",
            BitmapType::Pc2 => "PC v2",
            BitmapType::C64 => "Commodore 64",
            BitmapType::Bbc => "BBC Micro",
            BitmapType::Cpc => "Amstrad CPC",
            BitmapType::Mac => "Macintosh",
            BitmapType::St1 => "Atari ST v1",
            BitmapType::St2 => "Atari ST v2",
        }
    }
}

impl fmt::Display for BitmapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Amiga, Mac and ST v1 pictures are bare numbers.
pub fn noext_name<S: DataSource + ?Sized>(source: &S, picture: u32) -> String {
    if picture == 0 {
        if source.exists("title") {
            return "title".to_string();
        }
        return TITLE_PICTURE.to_string();
    }
    picture.to_string()
}

pub fn pc_name(picture: u32) -> String {
    let picture = if picture == 0 { TITLE_PICTURE } else { picture };
    format!("{picture}.pic")
}

pub fn st2_name(picture: u32) -> String {
    let picture = if picture == 0 { TITLE_PICTURE } else { picture };
    format!("{picture}.squ")
}

pub fn c64_name(picture: u32) -> String {
    if picture == 0 {
        "stitle mpic".to_string()
    } else {
        format!("pic{picture}")
    }
}

pub fn bbc_name<S: DataSource + ?Sized>(source: &S, picture: u32) -> String {
    if picture == 0 {
        if source.exists("P.Title") {
            return "P.Title".to_string();
        }
        return "title".to_string();
    }
    let name = format!("P.Pic{picture}");
    if source.exists(&name) {
        return name;
    }
    format!("pic{picture}")
}

/// Only the title and first picture have their own files; the rest share a bundle.
pub fn cpc_name(picture: u32) -> String {
    match picture {
        0 => "title.pic".to_string(),
        1 => "1.pic".to_string(),
        _ => "allpics.pic".to_string(),
    }
}

/// File holding `picture` for the given format.
pub fn picture_file_name<S: DataSource + ?Sized>(
    kind: BitmapType,
    source: &S,
    picture: u32,
) -> Option<String> {
    let name = match kind {
        BitmapType::None => return None,
        BitmapType::Amiga | BitmapType::Mac | BitmapType::St1 => noext_name(source, picture),
        BitmapType::Pc1 | BitmapType::Pc2 => pc_name(picture),
        BitmapType::C64 => c64_name(picture),
        BitmapType::Bbc => bbc_name(source, picture),
        BitmapType::Cpc => cpc_name(picture),
        BitmapType::St2 => st2_name(picture),
    };
    Some(name)
}

fn noext_type<S: DataSource + ?Sized>(source: &S, file: &str) -> BitmapType {
    let header = match source.read_prefix(file, NOEXT_SNIFF_LEN) {
        Ok(header) => header,
        Err(err) => {
            debug!("could not sniff {file}: {err:#}");
            return BitmapType::None;
        }
    };

    if is_amiga_header(&header) {
        BitmapType::Amiga
    } else if is_mac_header(&header) {
        BitmapType::Mac
    } else if is_st1_header(&header) {
        BitmapType::St1
    } else {
        debug!("{file} does not carry known Amiga, Mac or ST dimensions");
        BitmapType::None
    }
}

fn pc_type<S: DataSource + ?Sized>(source: &S, file: &str) -> BitmapType {
    match source.read_prefix(file, PC_SNIFF_LEN) {
        Ok(header) if is_pc1_header(&header) => BitmapType::Pc1,
        Ok(_) => BitmapType::Pc2,
        Err(err) => {
            debug!("could not sniff {file}: {err:#}");
            BitmapType::Pc2
        }
    }
}

fn c64_type<S: DataSource + ?Sized>(source: &S, file: &str) -> BitmapType {
    match source.size(file) {
        Ok(size) if is_bbc_size(size) => BitmapType::Bbc,
        _ => BitmapType::C64,
    }
}

/// Work out which picture format the game data uses. The first format whose
/// probe file is present decides; a present but unrecognised file still
/// stops the search.
pub fn detect_bitmap_type<S: DataSource + ?Sized>(source: &S) -> BitmapType {
    let (file, kind) = probe(source);
    match kind {
        BitmapType::None => info!("no supported pictures found"),
        kind => info!("detected {kind} pictures via {}", file.unwrap_or_default()),
    }
    kind
}

fn probe<S: DataSource + ?Sized>(source: &S) -> (Option<String>, BitmapType) {
    let file = noext_name(source, PROBE_PICTURE);
    if source.exists(&file) {
        let kind = noext_type(source, &file);
        return (Some(file), kind);
    }

    let file = pc_name(PROBE_PICTURE);
    if source.exists(&file) {
        let kind = pc_type(source, &file);
        return (Some(file), kind);
    }

    let file = c64_name(PROBE_PICTURE);
    if source.exists(&file) {
        let kind = c64_type(source, &file);
        return (Some(file), kind);
    }

    let file = bbc_name(source, PROBE_PICTURE);
    if source.exists(&file) {
        return (Some(file), BitmapType::Bbc);
    }

    let file = cpc_name(PROBE_PICTURE);
    if source.exists(&file) {
        return (Some(file), BitmapType::Cpc);
    }

    let file = st2_name(PROBE_PICTURE);
    if source.exists(&file) {
        return (Some(file), BitmapType::St2);
    }

    (None, BitmapType::None)
}
