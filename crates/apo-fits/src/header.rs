//! FITS header card parsing and writing.

use core::str;

use crate::block::{pad_to_blocks, BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE, HEADER_PAD_BYTE};
use crate::error::{Error, Result};
use crate::value::{format_value, parse_value, Value};

// ── Types ──

/// A parsed FITS header card (one 80-byte keyword record).
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// The 8-byte keyword name, ASCII, left-justified, space-padded.
    pub keyword: [u8; 8],
    /// The parsed value, if this card has a value indicator (`= ` in bytes 8..10).
    pub value: Option<Value>,
    /// An optional comment string.
    pub comment: Option<String>,
}

impl Card {
    /// Build a valued card. Keywords longer than 8 bytes are truncated.
    pub fn new(keyword: &str, value: Value) -> Self {
        Card {
            keyword: keyword_bytes(keyword),
            value: Some(value),
            comment: None,
        }
    }

    /// Attach a comment.
    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(String::from(comment));
        self
    }

    /// Return the keyword as a trimmed UTF-8 string.
    pub fn keyword_str(&self) -> &str {
        let end = self
            .keyword
            .iter()
            .rposition(|&b| b != b' ')
            .map(|i| i + 1)
            .unwrap_or(0);
        str::from_utf8(&self.keyword[..end]).unwrap_or("")
    }

    /// Returns `true` if this card is the END keyword.
    pub fn is_end(&self) -> bool {
        &self.keyword == b"END     "
    }
}

/// Pad a keyword name to 8 bytes with trailing ASCII spaces.
pub fn keyword_bytes(name: &str) -> [u8; 8] {
    let mut buf = [b' '; 8];
    let bytes = name.as_bytes();
    let len = bytes.len().min(8);
    buf[..len].copy_from_slice(&bytes[..len]);
    buf
}

// ── Parsing ──

/// Keywords that never carry a value indicator.
const COMMENTARY_KEYWORDS: [&[u8; 8]; 3] = [b"COMMENT ", b"HISTORY ", b"        "];

/// Commentary text; bytes outside ASCII are kept as U+FFFD.
fn free_text(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_end();
    (!text.is_empty()).then(|| String::from(text))
}

/// Parse a single 80-byte FITS header card.
pub fn parse_card(card_bytes: &[u8; CARD_SIZE]) -> Result<Card> {
    let mut keyword = [b' '; 8];
    keyword.copy_from_slice(&card_bytes[..8]);

    if !keyword
        .iter()
        .all(|b| matches!(b, b'A'..=b'Z' | b'0'..=b'9' | b' ' | b'-' | b'_'))
    {
        return Err(Error::InvalidKeyword);
    }

    if &keyword == b"END     " {
        return Ok(Card {
            keyword,
            value: None,
            comment: None,
        });
    }

    if COMMENTARY_KEYWORDS.contains(&&keyword) || &card_bytes[8..10] != b"= " {
        return Ok(Card {
            keyword,
            value: None,
            comment: free_text(&card_bytes[8..]),
        });
    }

    let value_field = &card_bytes[10..];
    match parse_value(value_field) {
        Some((val, comment)) => Ok(Card {
            keyword,
            value: Some(val),
            comment: comment.map(String::from),
        }),
        None => Ok(Card {
            keyword,
            value: None,
            comment: None,
        }),
    }
}

/// Parse consecutive 2880-byte header blocks until the END card is found.
///
/// Only complete blocks are scanned; trailing bytes shorter than a block
/// are ignored.
pub fn parse_header_blocks(data: &[u8]) -> Result<Vec<Card>> {
    let mut cards = Vec::new();

    for chunk in data.chunks_exact(CARD_SIZE).take(data.len() / BLOCK_SIZE * CARDS_PER_BLOCK) {
        let card_bytes: &[u8; CARD_SIZE] = chunk
            .try_into()
            .map_err(|_| Error::InvalidHeader("short card"))?;
        let card = parse_card(card_bytes)?;
        let is_end = card.is_end();
        cards.push(card);
        if is_end {
            return Ok(cards);
        }
    }

    Err(Error::UnexpectedEof)
}

/// Return the number of bytes consumed by the header (always a multiple of
/// [`BLOCK_SIZE`]).
pub fn header_byte_len(data: &[u8]) -> Result<usize> {
    let num_blocks = data.len() / BLOCK_SIZE;

    for block_idx in 0..num_blocks {
        let block = &data[block_idx * BLOCK_SIZE..(block_idx + 1) * BLOCK_SIZE];
        if block
            .chunks_exact(CARD_SIZE)
            .any(|card| &card[..8] == b"END     ")
        {
            return Ok((block_idx + 1) * BLOCK_SIZE);
        }
    }

    Err(Error::UnexpectedEof)
}

// ── Writing ──

/// Serialize a [`Card`] into an 80-byte FITS card image.
pub fn format_card(card: &Card) -> [u8; CARD_SIZE] {
    let mut buf = [b' '; CARD_SIZE];
    buf[..8].copy_from_slice(&card.keyword);

    match (&card.value, &card.comment) {
        (Some(value), comment) => {
            buf[8] = b'=';
            let mut field = format_value(value);
            if let Some(comment) = comment {
                insert_comment(&mut field, comment);
            }
            buf[10..].copy_from_slice(&field);
        }
        (None, Some(comment)) => {
            let bytes = comment.as_bytes();
            let len = bytes.len().min(72);
            buf[8..8 + len].copy_from_slice(&bytes[..len]);
        }
        (None, None) => {}
    }

    buf
}

/// Insert a ` / comment` after the value already written to `field`.
fn insert_comment(field: &mut [u8; 70], comment: &str) {
    let content_end = if field[0] == b'\'' {
        let mut i = 1;
        while i < 70 {
            if field[i] == b'\'' {
                if i + 1 < 70 && field[i + 1] == b'\'' {
                    i += 2;
                    continue;
                }
                i += 1;
                break;
            }
            i += 1;
        }
        i
    } else {
        20
    };

    let sep_start = content_end + 1;
    if sep_start + 3 >= 70 {
        return;
    }

    field[sep_start] = b'/';
    let comment_start = sep_start + 2;
    let bytes = comment.as_bytes();
    let len = bytes.len().min(70 - comment_start);
    field[comment_start..comment_start + len].copy_from_slice(&bytes[..len]);
}

/// Serialize header cards into complete FITS header blocks.
///
/// Appends the END card and pads the final block with blanks.
pub fn serialize_header(cards: &[Card]) -> Vec<u8> {
    let mut raw = Vec::with_capacity((cards.len() + 1) * CARD_SIZE);
    for card in cards {
        raw.extend_from_slice(&format_card(card));
    }
    raw.extend_from_slice(&format_card(&Card {
        keyword: *b"END     ",
        value: None,
        comment: None,
    }));
    pad_to_blocks(&raw, HEADER_PAD_BYTE)
}
