//! Wavelength axis reconstruction from the CTYPE1/CRPIX1/CRVAL1/CDELT1
//! header keywords.

use std::fmt;
use std::str::FromStr;

use apo_fits::{Hdu, Value};

use crate::error::{Error, Result};

/// The wavelength axis conventions understood by [`WavelengthAxis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisType {
    /// `LINEAR`, `WAVELENGTH` or `AWAV`: evenly spaced in wavelength.
    Linear,
    /// `WAVE`: evenly spaced in log10, with the step given in Angstrom at
    /// the reference pixel.
    LogWave,
    /// `LOG-LINEAR`: CRVAL1 and the step are already log10 quantities.
    LogLinear,
}

impl FromStr for AxisType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim_end() {
            "LINEAR" | "WAVELENGTH" | "AWAV" => Ok(AxisType::Linear),
            "WAVE" => Ok(AxisType::LogWave),
            "LOG-LINEAR" => Ok(AxisType::LogLinear),
            other => Err(Error::UnsupportedAxisType(other.to_string())),
        }
    }
}

impl fmt::Display for AxisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AxisType::Linear => "LINEAR",
            AxisType::LogWave => "WAVE",
            AxisType::LogLinear => "LOG-LINEAR",
        })
    }
}

/// The header quantities that define a wavelength axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavelengthAxis {
    pub axis_type: AxisType,
    /// CRPIX1.
    pub crpix: f64,
    /// CRVAL1.
    pub crval: f64,
    /// CD1_1, or CDELT1 when CD1_1 is absent.
    pub step: f64,
    /// NAXIS1.
    pub len: usize,
}

fn header_value<'a>(hdu: &'a Hdu, key: &str) -> Result<&'a Value> {
    hdu.value(key)
        .ok_or_else(|| Error::HeaderFieldMissing(key.to_string()))
}

fn type_error(key: &str, expected: &'static str, found: &Value) -> Error {
    Error::HeaderFieldType {
        key: key.to_string(),
        expected,
        found: found.type_name(),
    }
}

fn header_f64(hdu: &Hdu, key: &str) -> Result<f64> {
    let value = header_value(hdu, key)?;
    value.as_f64().ok_or_else(|| type_error(key, "number", value))
}

fn header_str<'a>(hdu: &'a Hdu, key: &str) -> Result<&'a str> {
    let value = header_value(hdu, key)?;
    value.as_str().ok_or_else(|| type_error(key, "string", value))
}

fn header_len(hdu: &Hdu, key: &str) -> Result<usize> {
    let value = header_value(hdu, key)?;
    value
        .as_i64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| type_error(key, "non-negative integer", value))
}

impl WavelengthAxis {
    /// Read the axis description from an HDU header.
    ///
    /// Keywords are looked up in the order CTYPE1, CRPIX1, CRVAL1, NAXIS1;
    /// the axis type is then checked, and the step comes last: CD1_1 wins
    /// over CDELT1 when both are present. A CD1_1 card with an undefined
    /// value counts as absent, so CDELT1 is used.
    pub fn from_header(hdu: &Hdu) -> Result<Self> {
        let ctype = header_str(hdu, "CTYPE1")?;
        let crpix = header_f64(hdu, "CRPIX1")?;
        let crval = header_f64(hdu, "CRVAL1")?;
        let len = header_len(hdu, "NAXIS1")?;
        let axis_type: AxisType = ctype.parse()?;

        let step = if hdu.value("CD1_1").is_some() {
            header_f64(hdu, "CD1_1")?
        } else {
            header_f64(hdu, "CDELT1")?
        };

        Ok(WavelengthAxis {
            axis_type,
            crpix,
            crval,
            step,
            len,
        })
    }

    /// Wavelength of every pixel, `len` values.
    ///
    /// * linear: `(i + CRPIX1) * step + CRVAL1`
    /// * `WAVE`: `10^((i - CRPIX1) * d + log10(CRVAL1))` with
    ///   `d = log10(CRVAL1 + step) - log10(CRVAL1)`
    /// * `LOG-LINEAR`: `10^(i * step + CRVAL1)`; CRPIX1 is not used
    pub fn wavelengths(&self) -> Vec<f64> {
        let pixels = (0..self.len).map(|i| i as f64);
        match self.axis_type {
            AxisType::Linear => pixels
                .map(|i| (i + self.crpix) * self.step + self.crval)
                .collect(),
            AxisType::LogWave => {
                let c0 = self.crval.log10();
                let dstep = (self.crval + self.step).log10() - c0;
                pixels
                    .map(|i| 10f64.powf((i - self.crpix) * dstep + c0))
                    .collect()
            }
            AxisType::LogLinear => pixels
                .map(|i| 10f64.powf(i * self.step + self.crval))
                .collect(),
        }
    }
}
