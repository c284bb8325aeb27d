use thiserror::Error;

/// All errors returned by the spectral toolkit.
#[derive(Debug, Error)]
pub enum Error {
    /// The file or URL could not be read.
    #[error("cannot read {locator}: {reason}")]
    ResourceUnavailable { locator: String, reason: String },

    /// A required header keyword is absent.
    #[error("header keyword {0} not found")]
    HeaderFieldMissing(String),

    /// A header keyword is present but holds the wrong kind of value.
    #[error("header keyword {key} should be {expected}, found {found}")]
    HeaderFieldType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// CTYPE1 names an axis type with no wavelength formula.
    #[error("unsupported wavelength axis type {0:?}")]
    UnsupportedAxisType(String),

    /// The requested HDU index is past the end of the file.
    #[error("extension {index} not found, file has {available} HDUs")]
    ExtensionNotFound { index: usize, available: usize },

    /// The requested HDU holds a table rather than an image.
    #[error("extension {0} is not an image")]
    NotAnImage(usize),

    /// Parallel arrays disagree in length.
    #[error("{field} has {actual} elements, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Input outside the domain of a numeric routine.
    #[error("domain error: {0}")]
    DomainError(String),

    /// Malformed FITS structure.
    #[error(transparent)]
    Fits(#[from] apo_fits::Error),
}

/// Result type for toolkit operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn unavailable(locator: impl Into<String>, reason: impl ToString) -> Self {
        Error::ResourceUnavailable {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }
}
