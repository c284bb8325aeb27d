//! Minimal pure Rust FITS reader.
//!
//! Parses headers and image HDUs from an in-memory byte stream; enough to
//! pull one-dimensional spectra and their WCS keywords out of a file.

pub mod block;
pub mod error;
pub mod gzip;
pub mod hdu;
pub mod header;
pub mod image;
pub mod value;

pub use block::{BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE};
pub use error::{Error, Result};
pub use hdu::{parse_fits, FitsData, Hdu, HduInfo};
pub use header::Card;
pub use image::ImageData;
pub use value::Value;
