//! Transparent handling of gzip-wrapped FITS files (`*.fits.gz`).

use crate::error::{Error, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

const FHCRC: u8 = 0x02;
const FEXTRA: u8 = 0x04;
const FNAME: u8 = 0x08;
const FCOMMENT: u8 = 0x10;

/// Returns `true` if `data` starts with the gzip magic bytes.
pub fn is_gzip(data: &[u8]) -> bool {
    data.starts_with(&GZIP_MAGIC)
}

fn skip_zero_terminated(data: &[u8], pos: usize) -> Result<usize> {
    data[pos.min(data.len())..]
        .iter()
        .position(|&b| b == 0)
        .map(|n| pos + n + 1)
        .ok_or(Error::Decompression)
}

/// Strip the gzip header and trailer, returning the raw deflate payload.
fn deflate_payload(data: &[u8]) -> Result<&[u8]> {
    if data.len() < 18 || !is_gzip(data) || data[2] != 0x08 {
        return Err(Error::Decompression);
    }
    let flg = data[3];
    let mut pos = 10usize;
    if flg & FEXTRA != 0 {
        let xlen = data
            .get(pos..pos + 2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]) as usize)
            .ok_or(Error::Decompression)?;
        pos += 2 + xlen;
    }
    if flg & FNAME != 0 {
        pos = skip_zero_terminated(data, pos)?;
    }
    if flg & FCOMMENT != 0 {
        pos = skip_zero_terminated(data, pos)?;
    }
    if flg & FHCRC != 0 {
        pos += 2;
    }
    // 8-byte trailer: CRC32 + ISIZE.
    if data.len() < pos + 8 {
        return Err(Error::Decompression);
    }
    Ok(&data[pos..data.len() - 8])
}

/// Inflate a single-member gzip stream.
pub fn gunzip(data: &[u8]) -> Result<Vec<u8>> {
    let payload = deflate_payload(data)?;
    let out =
        miniz_oxide::inflate::decompress_to_vec(payload).map_err(|_| Error::Decompression)?;
    tracing::trace!(compressed = data.len(), inflated = out.len(), "gunzip");
    Ok(out)
}

/// Return `data` unchanged unless it is gzip-wrapped, in which case the
/// inflated bytes are returned.
pub fn maybe_gunzip(data: Vec<u8>) -> Result<Vec<u8>> {
    if is_gzip(&data) {
        gunzip(&data)
    } else {
        Ok(data)
    }
}
