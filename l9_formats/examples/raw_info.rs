use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use l9_raw::RawPicture;

#[derive(Parser)]
struct Args {
    /// Path to a `picN.raw` stream to inspect.
    input: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let bytes =
        fs::read(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    let picture = RawPicture::decode(&bytes)?;
    println!(
        "{}: {}x{}, {} palette entries, transparent={:?}",
        args.input.display(),
        picture.header.width,
        picture.header.height,
        picture.header.palette_entries,
        picture.transparent
    );

    let mut counts = [0usize; 256];
    for &pixel in &picture.pixels {
        counts[pixel as usize] += 1;
    }
    for (index, count) in counts.iter().enumerate().filter(|(_, count)| **count > 0) {
        match picture.palette.get(index * 3..index * 3 + 3) {
            Some(rgb) => println!(
                "{index:>3}  #{:02x}{:02x}{:02x}  {count:>6} pixels",
                rgb[0], rgb[1], rgb[2]
            ),
            None => println!("{index:>3}  outside palette  {count:>6} pixels"),
        }
    }
    Ok(())
}
