use std::env;

use anyhow::{Context, Result};
use l9_formats::probe::TITLE_PICTURE;
use l9_formats::{BitmapArchive, DirSource};

fn main() -> Result<()> {
    env_logger::init();

    let path = env::args().nth(1).context("usage: pic_dump <game directory>")?;
    let source = DirSource::open(&path)?;
    let Some(archive) = BitmapArchive::detect(source) else {
        println!("no supported pictures in {path}");
        return Ok(());
    };

    println!(
        "{} pictures in {}",
        archive.bitmap_type(),
        archive.source().root().display()
    );
    for picture in 0..=TITLE_PICTURE {
        match archive.picture_info(picture) {
            Ok(info) => println!(
                "pic{picture:<4} {width:>4}x{height:<4} {used:>3}/{entries:<3} colours",
                width = info.width,
                height = info.height,
                used = info.colours_used,
                entries = info.palette_entries
            ),
            Err(err) => log::debug!("pic{picture}: {err:#}"),
        }
    }
    Ok(())
}
