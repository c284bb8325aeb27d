//! Image data reading for FITS HDUs.
//!
//! Extracts pixel arrays from a FITS byte stream for every standard BITPIX
//! type and applies BSCALE/BZERO calibration. A small writer builds image
//! HDUs, which is enough to produce spectra on disk.

use bytemuck::pod_collect_to_vec;

use crate::block::{pad_to_blocks, DATA_PAD_BYTE};
use crate::error::{Error, Result};
use crate::hdu::{Hdu, HduInfo};
use crate::header::{serialize_header, Card};
use crate::value::Value;

const VALID_BITPIX: [i64; 6] = [8, 16, 32, 64, -32, -64];

/// Image pixel data extracted from a FITS HDU, typed by BITPIX.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    U8(Vec<u8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl ImageData {
    /// Number of pixels.
    pub fn len(&self) -> usize {
        match self {
            ImageData::U8(v) => v.len(),
            ImageData::I16(v) => v.len(),
            ImageData::I32(v) => v.len(),
            ImageData::I64(v) => v.len(),
            ImageData::F32(v) => v.len(),
            ImageData::F64(v) => v.len(),
        }
    }

    /// Returns `true` if there are no pixels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// BITPIX code matching the variant.
    pub fn bitpix(&self) -> i64 {
        match self {
            ImageData::U8(_) => 8,
            ImageData::I16(_) => 16,
            ImageData::I32(_) => 32,
            ImageData::I64(_) => 64,
            ImageData::F32(_) => -32,
            ImageData::F64(_) => -64,
        }
    }
}

/// Returns the number of bytes per pixel for a given BITPIX value.
pub fn bytes_per_pixel(bitpix: i64) -> Result<usize> {
    if VALID_BITPIX.contains(&bitpix) {
        Ok((bitpix.unsigned_abs() / 8) as usize)
    } else {
        Err(Error::InvalidBitpix(bitpix))
    }
}

fn hdu_bitpix_naxes(hdu: &Hdu) -> Result<(i64, &[usize])> {
    match &hdu.info {
        HduInfo::Primary { bitpix, naxes } | HduInfo::Image { bitpix, naxes } => {
            Ok((*bitpix, naxes))
        }
        _ => Err(Error::InvalidHeader("not an image HDU")),
    }
}

/// Returns the image dimensions (NAXISn values) from an HDU.
pub fn image_dimensions(hdu: &Hdu) -> Result<Vec<usize>> {
    hdu_bitpix_naxes(hdu).map(|(_, naxes)| naxes.to_vec())
}

/// Decode big-endian on-disk bytes into a native-endian typed array.
fn decode_pixels(raw: &[u8], bitpix: i64) -> Result<ImageData> {
    match bitpix {
        8 => Ok(ImageData::U8(raw.to_vec())),
        16 => {
            let mut pixels: Vec<i16> = pod_collect_to_vec(raw);
            for v in &mut pixels {
                *v = i16::from_be(*v);
            }
            Ok(ImageData::I16(pixels))
        }
        32 => {
            let mut pixels: Vec<i32> = pod_collect_to_vec(raw);
            for v in &mut pixels {
                *v = i32::from_be(*v);
            }
            Ok(ImageData::I32(pixels))
        }
        64 => {
            let mut pixels: Vec<i64> = pod_collect_to_vec(raw);
            for v in &mut pixels {
                *v = i64::from_be(*v);
            }
            Ok(ImageData::I64(pixels))
        }
        -32 => {
            let mut pixels: Vec<f32> = pod_collect_to_vec(raw);
            for v in &mut pixels {
                *v = f32::from_bits(u32::from_be(v.to_bits()));
            }
            Ok(ImageData::F32(pixels))
        }
        -64 => {
            let mut pixels: Vec<f64> = pod_collect_to_vec(raw);
            for v in &mut pixels {
                *v = f64::from_bits(u64::from_be(v.to_bits()));
            }
            Ok(ImageData::F64(pixels))
        }
        other => Err(Error::InvalidBitpix(other)),
    }
}

/// Read raw image pixel data from a FITS byte stream for the given HDU.
pub fn read_image_data(fits_data: &[u8], hdu: &Hdu) -> Result<ImageData> {
    let (bitpix, _) = hdu_bitpix_naxes(hdu)?;
    bytes_per_pixel(bitpix)?;

    let end = hdu
        .data_start
        .checked_add(hdu.data_len)
        .filter(|&end| end <= fits_data.len())
        .ok_or(Error::UnexpectedEof)?;
    decode_pixels(&fits_data[hdu.data_start..end], bitpix)
}

/// Computes `physical = bzero + bscale * pixel` for every pixel.
pub fn apply_bscale_bzero(data: &ImageData, bscale: f64, bzero: f64) -> Vec<f64> {
    match data {
        ImageData::U8(v) => v.iter().map(|&p| bzero + bscale * (p as f64)).collect(),
        ImageData::I16(v) => v.iter().map(|&p| bzero + bscale * (p as f64)).collect(),
        ImageData::I32(v) => v.iter().map(|&p| bzero + bscale * (p as f64)).collect(),
        ImageData::I64(v) => v.iter().map(|&p| bzero + bscale * (p as f64)).collect(),
        ImageData::F32(v) => v.iter().map(|&p| bzero + bscale * (p as f64)).collect(),
        ImageData::F64(v) => v.iter().map(|&p| bzero + bscale * p).collect(),
    }
}

/// Extract `(BSCALE, BZERO)` from header cards, defaulting to `(1.0, 0.0)`.
pub fn extract_bscale_bzero(cards: &[Card]) -> (f64, f64) {
    let find = |keyword: &str| {
        cards
            .iter()
            .find(|c| c.keyword_str() == keyword)
            .and_then(|c| c.value.as_ref())
            .and_then(Value::as_f64)
    };
    (find("BSCALE").unwrap_or(1.0), find("BZERO").unwrap_or(0.0))
}

/// Integer BLANK value marking undefined pixels, if present.
pub fn extract_blank(cards: &[Card]) -> Option<i64> {
    cards
        .iter()
        .find(|c| c.keyword_str() == "BLANK")
        .and_then(|c| c.value.as_ref())
        .and_then(Value::as_i64)
}

/// Per-pixel flags for pixels equal to BLANK. Only integer images carry
/// BLANK; float images mark undefined pixels with NaN on disk.
fn blank_flags(data: &ImageData, blank: i64) -> Vec<bool> {
    match data {
        ImageData::U8(v) => v.iter().map(|&p| p as i64 == blank).collect(),
        ImageData::I16(v) => v.iter().map(|&p| p as i64 == blank).collect(),
        ImageData::I32(v) => v.iter().map(|&p| p as i64 == blank).collect(),
        ImageData::I64(v) => v.iter().map(|&p| p == blank).collect(),
        ImageData::F32(_) | ImageData::F64(_) => vec![false; data.len()],
    }
}

/// Read image data with BSCALE/BZERO calibration applied.
///
/// Pixels matching the BLANK keyword value are set to NaN.
pub fn read_image_physical(fits_data: &[u8], hdu: &Hdu) -> Result<Vec<f64>> {
    let raw = read_image_data(fits_data, hdu)?;
    let (bscale, bzero) = extract_bscale_bzero(&hdu.cards);
    let mut physical = apply_bscale_bzero(&raw, bscale, bzero);
    if let Some(blank) = extract_blank(&hdu.cards) {
        for (val, is_blank) in physical.iter_mut().zip(blank_flags(&raw, blank)) {
            if is_blank {
                *val = f64::NAN;
            }
        }
    }
    Ok(physical)
}

// ---- Writing ----

/// Serialize pixels into a block-padded, big-endian FITS data segment.
pub fn serialize_image(data: &ImageData) -> Vec<u8> {
    let raw: Vec<u8> = match data {
        ImageData::U8(v) => v.clone(),
        ImageData::I16(v) => v.iter().flat_map(|p| p.to_be_bytes()).collect(),
        ImageData::I32(v) => v.iter().flat_map(|p| p.to_be_bytes()).collect(),
        ImageData::I64(v) => v.iter().flat_map(|p| p.to_be_bytes()).collect(),
        ImageData::F32(v) => v.iter().flat_map(|p| p.to_be_bytes()).collect(),
        ImageData::F64(v) => v.iter().flat_map(|p| p.to_be_bytes()).collect(),
    };
    pad_to_blocks(&raw, DATA_PAD_BYTE)
}

fn axis_cards(bitpix: i64, naxes: &[usize]) -> Vec<Card> {
    let mut cards = vec![
        Card::new("BITPIX", Value::Integer(bitpix)),
        Card::new("NAXIS", Value::Integer(naxes.len() as i64)),
    ];
    for (i, &dim) in naxes.iter().enumerate() {
        cards.push(Card::new(&format!("NAXIS{}", i + 1), Value::Integer(dim as i64)));
    }
    cards
}

fn check_shape(naxes: &[usize], data: &ImageData) -> Result<()> {
    let expected: usize = if naxes.is_empty() {
        0
    } else {
        naxes.iter().product()
    };
    if expected != data.len() {
        return Err(Error::InvalidHeader("pixel count does not match NAXISn"));
    }
    Ok(())
}

/// Build a primary HDU (header and data) holding `data` with shape `naxes`.
///
/// `extra` cards are appended after the structural keywords.
pub fn build_primary_hdu(naxes: &[usize], data: &ImageData, extra: &[Card]) -> Result<Vec<u8>> {
    check_shape(naxes, data)?;
    let mut cards = vec![Card::new("SIMPLE", Value::Logical(true))];
    cards.extend(axis_cards(data.bitpix(), naxes));
    cards.push(Card::new("EXTEND", Value::Logical(true)));
    cards.extend_from_slice(extra);

    let mut hdu = serialize_header(&cards);
    hdu.extend(serialize_image(data));
    Ok(hdu)
}

/// Build an IMAGE extension HDU (header and data).
pub fn build_image_extension(
    naxes: &[usize],
    data: &ImageData,
    extra: &[Card],
) -> Result<Vec<u8>> {
    check_shape(naxes, data)?;
    let mut cards = vec![Card::new("XTENSION", Value::String(String::from("IMAGE")))];
    cards.extend(axis_cards(data.bitpix(), naxes));
    cards.push(Card::new("PCOUNT", Value::Integer(0)));
    cards.push(Card::new("GCOUNT", Value::Integer(1)));
    cards.extend_from_slice(extra);

    let mut hdu = serialize_header(&cards);
    hdu.extend(serialize_image(data));
    Ok(hdu)
}
