use crate::block::{checked_padded_byte_len, BLOCK_SIZE, CARD_SIZE};
use crate::error::{Error, Result};
use crate::header::{header_byte_len, parse_header_blocks, Card};
use crate::value::Value;

/// Describes the kind and shape of data in a single HDU.
#[derive(Debug, Clone, PartialEq)]
pub enum HduInfo {
    /// Primary HDU, possibly with image data.
    Primary {
        /// BITPIX value (8, 16, 32, 64, -32, -64).
        bitpix: i64,
        /// Axis dimensions (NAXIS1, NAXIS2, ...).
        naxes: Vec<usize>,
    },
    /// Image extension (XTENSION = 'IMAGE').
    Image { bitpix: i64, naxes: Vec<usize> },
    /// ASCII table extension (XTENSION = 'TABLE').
    AsciiTable { naxis1: usize, naxis2: usize },
    /// Binary table extension (XTENSION = 'BINTABLE').
    BinaryTable {
        naxis1: usize,
        naxis2: usize,
        /// Size of the variable-length array heap in bytes.
        pcount: usize,
    },
}

impl HduInfo {
    /// Returns `true` for HDUs whose data segment is an image array.
    pub fn is_image(&self) -> bool {
        matches!(self, HduInfo::Primary { .. } | HduInfo::Image { .. })
    }
}

/// A single Header Data Unit parsed from a FITS byte stream.
#[derive(Debug, Clone)]
pub struct Hdu {
    /// Parsed metadata describing the HDU type and shape.
    pub info: HduInfo,
    /// Byte offset where the header begins in the FITS stream.
    pub header_start: usize,
    /// Byte offset where the data segment begins.
    pub data_start: usize,
    /// Length of the data segment in bytes (unpadded).
    pub data_len: usize,
    /// All header cards parsed from this HDU.
    pub cards: Vec<Card>,
}

impl Hdu {
    /// First card carrying `keyword`, valued or not.
    pub fn card(&self, keyword: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.keyword_str() == keyword)
    }

    /// Value of the first card carrying `keyword`.
    ///
    /// A keyword present with an undefined value reads as `None`.
    pub fn value(&self, keyword: &str) -> Option<&Value> {
        self.card(keyword).and_then(|c| c.value.as_ref())
    }

    /// Returns `true` if any card carries `keyword`.
    pub fn contains_keyword(&self, keyword: &str) -> bool {
        self.card(keyword).is_some()
    }

    /// Trimmed EXTNAME, if present.
    pub fn extname(&self) -> Option<&str> {
        self.value("EXTNAME").and_then(Value::as_str).map(str::trim)
    }
}

/// A collection of HDUs parsed from a complete FITS file.
#[derive(Debug, Clone)]
pub struct FitsData {
    /// All HDUs in the file, with the primary HDU at index 0.
    pub hdus: Vec<Hdu>,
}

impl FitsData {
    /// Returns the primary (first) HDU.
    pub fn primary(&self) -> &Hdu {
        &self.hdus[0]
    }

    /// Returns the HDU at the given index, or `None` if out of bounds.
    pub fn get(&self, index: usize) -> Option<&Hdu> {
        self.hdus.get(index)
    }

    /// Finds the first HDU whose EXTNAME matches `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&Hdu> {
        self.hdus.iter().find(|hdu| hdu.extname() == Some(name))
    }

    /// Returns the number of HDUs.
    pub fn len(&self) -> usize {
        self.hdus.len()
    }

    /// Returns `true` if the file contains no HDUs.
    pub fn is_empty(&self) -> bool {
        self.hdus.is_empty()
    }

    /// Iterates over all HDUs in order.
    pub fn iter(&self) -> impl Iterator<Item = &Hdu> {
        self.hdus.iter()
    }
}

fn card_integer_value(cards: &[Card], keyword: &str) -> Option<i64> {
    cards
        .iter()
        .find(|c| c.keyword_str() == keyword)
        .and_then(|c| c.value.as_ref())
        .and_then(Value::as_i64)
}

fn card_string_value<'a>(cards: &'a [Card], keyword: &str) -> Option<&'a str> {
    cards
        .iter()
        .find(|c| c.keyword_str() == keyword)
        .and_then(|c| c.value.as_ref())
        .and_then(Value::as_str)
        .map(str::trim)
}

fn require_usize(cards: &[Card], keyword: &'static str) -> Result<usize> {
    let n = card_integer_value(cards, keyword).ok_or(Error::MissingKeyword(keyword))?;
    usize::try_from(n).map_err(|_| Error::InvalidHeader("negative axis length"))
}

fn read_naxes(cards: &[Card]) -> Result<Vec<usize>> {
    let naxis = require_usize(cards, "NAXIS")?;
    (1..=naxis)
        .map(|i| {
            let n = card_integer_value(cards, &format!("NAXIS{i}"))
                .ok_or(Error::MissingKeyword("NAXISn"))?;
            usize::try_from(n).map_err(|_| Error::InvalidHeader("negative NAXISn"))
        })
        .collect()
}

fn is_primary_hdu(cards: &[Card]) -> bool {
    cards
        .first()
        .map(|c| c.keyword_str() == "SIMPLE")
        .unwrap_or(false)
}

fn parse_hdu_info(cards: &[Card], is_primary: bool) -> Result<HduInfo> {
    if is_primary {
        let bitpix = card_integer_value(cards, "BITPIX").ok_or(Error::MissingKeyword("BITPIX"))?;
        return Ok(HduInfo::Primary {
            bitpix,
            naxes: read_naxes(cards)?,
        });
    }

    let xtension = card_string_value(cards, "XTENSION").ok_or(Error::MissingKeyword("XTENSION"))?;
    match xtension {
        "IMAGE" => {
            let bitpix =
                card_integer_value(cards, "BITPIX").ok_or(Error::MissingKeyword("BITPIX"))?;
            Ok(HduInfo::Image {
                bitpix,
                naxes: read_naxes(cards)?,
            })
        }
        "TABLE" => Ok(HduInfo::AsciiTable {
            naxis1: require_usize(cards, "NAXIS1")?,
            naxis2: require_usize(cards, "NAXIS2")?,
        }),
        "BINTABLE" => Ok(HduInfo::BinaryTable {
            naxis1: require_usize(cards, "NAXIS1")?,
            naxis2: require_usize(cards, "NAXIS2")?,
            pcount: require_usize(cards, "PCOUNT")?,
        }),
        _ => Err(Error::UnsupportedExtension("unknown XTENSION")),
    }
}

/// Data segment size: `|BITPIX|/8 * GCOUNT * (PCOUNT + NAXIS1 * ... * NAXISn)`.
fn compute_data_byte_len(cards: &[Card], is_primary: bool) -> Result<usize> {
    let bitpix = card_integer_value(cards, "BITPIX").ok_or(Error::MissingKeyword("BITPIX"))?;
    let naxes = read_naxes(cards)?;
    if naxes.is_empty() {
        return Ok(0);
    }

    let bytes_per_value = (bitpix.unsigned_abs() as usize) / 8;
    let total: usize = naxes
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or(Error::InvalidHeader("pixel count overflow"))?;

    let (pcount, gcount) = if is_primary {
        (0, 1)
    } else {
        let p = card_integer_value(cards, "PCOUNT").unwrap_or(0).max(0) as usize;
        let g = card_integer_value(cards, "GCOUNT").unwrap_or(1).max(1) as usize;
        (p, g)
    };

    total
        .checked_add(pcount)
        .and_then(|n| n.checked_mul(gcount))
        .and_then(|n| n.checked_mul(bytes_per_value))
        .ok_or(Error::InvalidHeader("data size overflow"))
}

/// Returns `true` if the first block of `data` holds an XTENSION card, i.e.
/// an extension header has started there.
fn has_xtension_card(data: &[u8]) -> bool {
    data[..BLOCK_SIZE.min(data.len())]
        .chunks_exact(CARD_SIZE)
        .any(|card| card.starts_with(b"XTENSION"))
}

/// Parse a complete FITS byte stream into a [`FitsData`] containing all HDUs.
///
/// Trailing bytes after the last HDU are ignored unless they hold an
/// XTENSION card; a malformed extension header is an error.
pub fn parse_fits(data: &[u8]) -> Result<FitsData> {
    if data.len() < BLOCK_SIZE {
        return Err(Error::UnexpectedEof);
    }

    let mut hdus = Vec::new();
    let mut offset: usize = 0;

    while data.len() - offset >= BLOCK_SIZE {
        let remaining = &data[offset..];
        let first = hdus.is_empty();

        let parsed = header_byte_len(remaining).and_then(|header_len| {
            let cards = parse_header_blocks(&remaining[..header_len])?;
            let is_primary = first && is_primary_hdu(&cards);
            if first && !is_primary {
                return Err(Error::InvalidHeader("first HDU must be primary"));
            }
            let info = parse_hdu_info(&cards, is_primary)?;
            let data_len = compute_data_byte_len(&cards, is_primary)?;
            Ok((header_len, cards, info, data_len))
        });

        let (header_len, cards, info, data_len) = match parsed {
            Ok(parts) => parts,
            Err(e) if first || has_xtension_card(remaining) => return Err(e),
            Err(e) => {
                tracing::debug!(offset, error = %e, "ignoring trailing bytes after last HDU");
                break;
            }
        };

        let data_start = offset + header_len;
        // Trailing block padding may be missing, the data itself may not.
        let data_end = data_start
            .checked_add(data_len)
            .ok_or(Error::UnexpectedEof)?;
        if data_end > data.len() {
            return Err(Error::UnexpectedEof);
        }

        hdus.push(Hdu {
            info,
            header_start: offset,
            data_start,
            data_len,
            cards,
        });

        offset = checked_padded_byte_len(data_len)
            .and_then(|padded| data_start.checked_add(padded))
            .ok_or(Error::UnexpectedEof)?;
        if offset >= data.len() {
            break;
        }
    }

    tracing::trace!(hdus = hdus.len(), bytes = data.len(), "parsed FITS stream");
    Ok(FitsData { hdus })
}
