//! Where spectra come from: a local path or an HTTP(S) URL.
//!
//! The whole resource is read into memory and every handle is closed before
//! [`load`] returns, whichever way it returns.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A resource holding a FITS file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Local filesystem path.
    Path(PathBuf),
    /// Remote `http://` or `https://` URL.
    Url(String),
}

impl Locator {
    /// Classify a string: URL schemes are matched case-insensitively,
    /// everything else is a path.
    pub fn parse(s: &str) -> Self {
        let lower = s.trim_start().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Locator::Url(s.trim().to_string())
        } else {
            Locator::Path(PathBuf::from(s))
        }
    }

    /// Returns `true` for remote resources.
    pub fn is_remote(&self) -> bool {
        matches!(self, Locator::Url(_))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Path(p) => write!(f, "{}", p.display()),
            Locator::Url(u) => f.write_str(u),
        }
    }
}

impl From<&str> for Locator {
    fn from(s: &str) -> Self {
        Locator::parse(s)
    }
}

impl From<String> for Locator {
    fn from(s: String) -> Self {
        Locator::parse(&s)
    }
}

impl From<&String> for Locator {
    fn from(s: &String) -> Self {
        Locator::parse(s)
    }
}

impl From<&Path> for Locator {
    fn from(p: &Path) -> Self {
        Locator::Path(p.to_path_buf())
    }
}

impl From<PathBuf> for Locator {
    fn from(p: PathBuf) -> Self {
        Locator::Path(p)
    }
}

impl From<&PathBuf> for Locator {
    fn from(p: &PathBuf) -> Self {
        Locator::Path(p.clone())
    }
}

/// Read the complete resource, inflating gzip-wrapped content.
pub fn load(locator: &Locator) -> Result<Vec<u8>> {
    let raw = match locator {
        Locator::Path(path) => {
            std::fs::read(path).map_err(|e| Error::unavailable(locator.to_string(), e))?
        }
        Locator::Url(url) => fetch(url)?,
    };

    let gzipped = apo_fits::gzip::is_gzip(&raw);
    tracing::debug!(%locator, bytes = raw.len(), gzipped, "loaded resource");

    apo_fits::gzip::maybe_gunzip(raw).map_err(|e| Error::unavailable(locator.to_string(), e))
}

#[cfg(feature = "remote")]
fn fetch(url: &str) -> Result<Vec<u8>> {
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::unavailable(url, e))?;
    let body = response.bytes().map_err(|e| Error::unavailable(url, e))?;
    Ok(body.to_vec())
}

#[cfg(not(feature = "remote"))]
fn fetch(url: &str) -> Result<Vec<u8>> {
    Err(Error::unavailable(
        url,
        "remote locators need the `remote` feature",
    ))
}
