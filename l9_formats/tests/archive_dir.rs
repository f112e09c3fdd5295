use std::fs;
use std::path::Path;

use l9_formats::{BitmapArchive, BitmapType, DirSource, detect_bitmap_type};
use l9_raw::RawPicture;
use tempfile::tempdir;

fn write(dir: &Path, name: &str, data: &[u8]) {
    fs::write(dir.join(name), data).unwrap();
}

fn read_raw(archive: &BitmapArchive<DirSource>, name: &str) -> RawPicture {
    let stream = archive
        .read_member(name)
        .unwrap_or_else(|| panic!("{name} should be served"));
    RawPicture::decode(&stream).unwrap()
}

#[test]
fn serves_c64_pictures_from_a_game_directory() {
    let dir = tempdir().unwrap();
    let mut picture = vec![0u8; 6464];
    picture[0..2].copy_from_slice(&[0x00, 0x20]);
    picture[6463] = 0x06;
    write(dir.path(), "pic2", &picture);
    write(dir.path(), "STITLE MPIC", &vec![0u8; 10018]);

    let source = DirSource::open(dir.path()).unwrap();
    assert_eq!(detect_bitmap_type(&source), BitmapType::C64);
    let archive = BitmapArchive::detect(source).unwrap();

    let game = read_raw(&archive, "pic2.raw");
    assert_eq!((game.header.width, game.header.height), (320, 136));
    assert_eq!(game.header.palette_entries, 16);
    assert_eq!(game.palette.len(), 48);
    assert_eq!(game.transparent, None);
    assert!(game.pixels.iter().all(|&pixel| pixel == 6));

    let title = read_raw(&archive, "PIC0.RAW");
    assert_eq!((title.header.width, title.header.height), (320, 200));

    assert!(archive.read_member("pic7.raw").is_none());
    assert!(archive.read_member("pic2.bin").is_none());
}

#[test]
fn serves_bbc_pictures_through_their_pattern_table() {
    let dir = tempdir().unwrap();
    let mut picture = vec![0u8; 6494];
    picture[6461] = 0x01;
    // Colour 1 maps to BBC colour 3 on every cell.
    let table_start = picture.len() - 32;
    picture[table_start + 1] = 0b0000_1111;
    picture[table_start + 17] = 0b0000_1111;
    write(dir.path(), "P.Pic2", &picture);

    let archive = BitmapArchive::detect(DirSource::open(dir.path()).unwrap()).unwrap();
    assert_eq!(archive.bitmap_type(), BitmapType::Bbc);

    let raw = read_raw(&archive, "pic2.raw");
    assert_eq!(raw.header.palette_entries, 8);
    assert!(raw.pixels.iter().all(|&pixel| pixel == 3));
}

#[test]
fn serves_pc_pictures_and_reports_info() {
    let dir = tempdir().unwrap();
    let mut picture = vec![0u8; 23 + 320 * 135 / 2];
    picture[2..4].copy_from_slice(&320u16.to_le_bytes());
    picture[4..6].copy_from_slice(&135u16.to_le_bytes());
    picture[6 + 1] = 0x3F;
    picture[23] = 0x01;
    write(dir.path(), "2.PIC", &picture);

    let archive = BitmapArchive::detect(DirSource::open(dir.path()).unwrap()).unwrap();
    assert_eq!(archive.bitmap_type(), BitmapType::Pc1);

    let raw = read_raw(&archive, "pic2.raw");
    assert_eq!((raw.header.width, raw.header.height), (320, 135));
    assert_eq!(&raw.pixels[..2], &[0, 1]);
    assert_eq!(&raw.palette[3..6], &[0xFF, 0xFF, 0xFF]);

    let info = archive.picture_info(2).unwrap();
    assert_eq!(info.colours_used, 2);
    assert_eq!(info.palette_entries, 16);
}

#[test]
fn directories_without_pictures_are_not_archives() {
    let dir = tempdir().unwrap();
    write(dir.path(), "readme.txt", b"no pictures here");
    assert!(BitmapArchive::detect(DirSource::open(dir.path()).unwrap()).is_none());
}
