use thiserror::Error;

/// All errors that can occur while decoding or encoding FITS data.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed FITS header block.
    #[error("invalid FITS header: {0}")]
    InvalidHeader(&'static str),
    /// Premature end of data while reading.
    #[error("unexpected end of file")]
    UnexpectedEof,
    /// Unrecognized BITPIX value.
    #[error("invalid BITPIX value: {0}")]
    InvalidBitpix(i64),
    /// Malformed keyword name in a header card.
    #[error("invalid keyword name")]
    InvalidKeyword,
    /// Unknown or unsupported XTENSION type.
    #[error("unsupported XTENSION type: {0}")]
    UnsupportedExtension(&'static str),
    /// A structural keyword was not found in the header.
    #[error("missing required keyword: {0}")]
    MissingKeyword(&'static str),
    /// A gzip stream could not be inflated.
    #[error("gzip decompression failed")]
    Decompression,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
