pub mod amiga;
pub mod archive;
pub mod bitmap;
pub mod c64;
pub mod colour;
pub mod mac;
pub mod pc;
pub mod probe;
mod reader;
pub mod source;
pub mod st;

pub use archive::{BitmapArchive, PictureInfo, decode_bitmap, member_name, picture_number};
pub use bitmap::{Bitmap, MAX_BITMAP_HEIGHT, MAX_BITMAP_WIDTH};
pub use colour::Colour;
pub use probe::{BitmapType, detect_bitmap_type};
pub use source::{DataSource, DirSource, MemorySource};
