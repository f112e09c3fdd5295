use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use l9_formats::probe::TITLE_PICTURE;
use l9_formats::{Bitmap, BitmapArchive, BitmapType, DirSource, member_name};
use l9_raw::RawPictureHeader;
use log::{info, warn};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(about = "Extract pictures from a Level 9 game directory", version)]
struct Args {
    /// Directory holding the game's picture files
    #[arg(long, value_name = "DIR")]
    root: PathBuf,

    /// Destination directory for the extracted pictures
    #[arg(long, value_name = "DIR", default_value = "pictures")]
    dest: PathBuf,

    /// Picture numbers to extract (may repeat; defaults to 0 through the title)
    #[arg(long = "picture", value_name = "N")]
    pictures: Vec<u32>,

    /// Write PNG images instead of raw picture streams
    #[arg(long)]
    png: bool,

    /// Write a JSON manifest of the extracted pictures
    #[arg(long, value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Overwrite existing files instead of skipping them
    #[arg(long)]
    overwrite: bool,
}

#[derive(Debug, Serialize)]
struct Manifest {
    root: PathBuf,
    format: BitmapType,
    pictures: Vec<ManifestEntry>,
}

#[derive(Debug, Serialize)]
struct ManifestEntry {
    picture: u32,
    file: String,
    #[serde(flatten)]
    header: RawPictureHeader,
    colours_used: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let source = DirSource::open(&args.root)?;
    let Some(archive) = BitmapArchive::detect(source) else {
        bail!("no supported pictures found under {}", args.root.display());
    };
    info!(
        "extracting {} pictures from {}",
        archive.bitmap_type(),
        args.root.display()
    );

    let pictures = if args.pictures.is_empty() {
        (0..=TITLE_PICTURE).collect()
    } else {
        args.pictures.clone()
    };

    fs::create_dir_all(&args.dest)
        .with_context(|| format!("creating destination {}", args.dest.display()))?;

    let mut entries = Vec::new();
    for picture in pictures {
        let bitmap = match archive.decode_picture(picture) {
            Ok(bitmap) => bitmap,
            Err(err) => {
                if !args.pictures.is_empty() {
                    warn!("skipping picture {picture}: {err:#}");
                }
                continue;
            }
        };

        let file = if args.png {
            format!("pic{picture}.png")
        } else {
            member_name(picture)
        };
        let dest_path = args.dest.join(&file);
        if dest_path.exists() && !args.overwrite {
            println!(
                "skip {} (already exists, use --overwrite to replace)",
                dest_path.display()
            );
        } else {
            if args.png {
                write_png(&bitmap, &dest_path)?;
            } else {
                write_raw(&bitmap, &dest_path)?;
            }
            println!("extract picture {picture} -> {}", dest_path.display());
        }

        let header =
            RawPictureHeader::for_picture(bitmap.width(), bitmap.height(), bitmap.palette().len())?;
        entries.push(ManifestEntry {
            picture,
            file,
            header,
            colours_used: bitmap.used_colour_count(),
        });
    }

    if let Some(path) = &args.manifest {
        let manifest = Manifest {
            root: args.root.clone(),
            format: archive.bitmap_type(),
            pictures: entries,
        };
        let json = serde_json::to_string_pretty(&manifest)?;
        fs::write(path, json).with_context(|| format!("writing manifest {}", path.display()))?;
    }

    Ok(())
}

fn write_raw(bitmap: &Bitmap, path: &Path) -> Result<()> {
    let stream = l9_raw::encode_picture(
        bitmap.width(),
        bitmap.height(),
        bitmap.palette(),
        bitmap.pixels(),
    )?;
    fs::write(path, &stream).with_context(|| format!("writing {}", path.display()))
}

fn write_png(bitmap: &Bitmap, path: &Path) -> Result<()> {
    let rgba = bitmap.to_rgba8()?;
    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    PngEncoder::new(file)
        .write_image(
            &rgba,
            bitmap.width() as u32,
            bitmap.height() as u32,
            image::ColorType::Rgba8,
        )
        .with_context(|| format!("encoding {}", path.display()))
}
