//! Reading spectra out of FITS files.

use apo_fits::image::{image_dimensions, read_image_physical};

use crate::axis::WavelengthAxis;
use crate::convert::air_conversion;
use crate::error::{Error, Result};
use crate::masked::MaskedArray;
use crate::source::{self, Locator};
use crate::spectrum::Spectrum;

/// HDU read by [`vac_spec`] and [`air_spec`] when none is given.
pub const DEFAULT_EXTENSION: usize = 1;

/// Wavelength axis and flux read from one HDU.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumData {
    /// One value per pixel along NAXIS1.
    pub wavelength: Vec<f64>,
    /// Physical flux in FITS order (NAXIS1 varies fastest). For a 1-D image
    /// this has the same length as `wavelength`; stacked spectra hold one
    /// row of NAXIS1 pixels per spectrum.
    pub flux: Vec<f64>,
    /// Image shape, NAXIS1 first.
    pub naxes: Vec<usize>,
}

impl SpectrumData {
    /// Flux split into rows of NAXIS1 pixels.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.flux.chunks(self.wavelength.len().max(1))
    }

    /// Number of spectra stored in the image.
    pub fn num_rows(&self) -> usize {
        if self.wavelength.is_empty() {
            0
        } else {
            self.flux.len() / self.wavelength.len()
        }
    }

    /// Consume into `(wavelength, flux)`.
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.wavelength, self.flux)
    }

    /// Flux as an N-d array in C order, i.e. shape `(..., NAXIS2, NAXIS1)`.
    #[cfg(feature = "array")]
    pub fn flux_array(&self) -> Result<ndarray::ArrayD<f64>> {
        let shape: Vec<usize> = self.naxes.iter().rev().copied().collect();
        ndarray::ArrayD::from_shape_vec(ndarray::IxDyn(&shape), self.flux.clone()).map_err(|_| {
            Error::LengthMismatch {
                field: "flux",
                expected: self.naxes.iter().product(),
                actual: self.flux.len(),
            }
        })
    }
}

impl TryFrom<SpectrumData> for Spectrum {
    type Error = Error;

    /// Only single-row data converts; use [`SpectrumData::rows`] otherwise.
    fn try_from(data: SpectrumData) -> Result<Spectrum> {
        Spectrum::new(data.wavelength, data.flux, None)
    }
}

/// Read one HDU of a FITS file and rebuild its wavelength axis.
///
/// `locator` is a local path or an HTTP(S) URL; `extension` is the 0-based
/// HDU index. The flux comes back unmasked, with BSCALE/BZERO applied.
pub fn readspec(locator: impl Into<Locator>, extension: usize) -> Result<SpectrumData> {
    let locator = locator.into();
    let bytes = source::load(&locator)?;
    let fits =
        apo_fits::parse_fits(&bytes).map_err(|e| Error::unavailable(locator.to_string(), e))?;

    let hdu = fits.get(extension).ok_or(Error::ExtensionNotFound {
        index: extension,
        available: fits.len(),
    })?;
    if !hdu.info.is_image() {
        return Err(Error::NotAnImage(extension));
    }

    let flux = read_image_physical(&bytes, hdu)?;
    let naxes = image_dimensions(hdu)?;
    let axis = WavelengthAxis::from_header(hdu)?;
    let wavelength = axis.wavelengths();

    tracing::debug!(
        %locator,
        extension,
        axis = %axis.axis_type,
        pixels = wavelength.len(),
        "read spectrum"
    );

    Ok(SpectrumData {
        wavelength,
        flux,
        naxes,
    })
}

/// Read a vacuum-wavelength spectrum with zero-flux pixels masked.
///
/// `None` reads [`DEFAULT_EXTENSION`].
pub fn vac_spec(
    locator: impl Into<Locator>,
    extension: Option<usize>,
) -> Result<(Vec<f64>, MaskedArray)> {
    let (wave, flux) = readspec(locator, extension.unwrap_or(DEFAULT_EXTENSION))?.into_parts();
    Ok((wave, MaskedArray::masked_where_zero(flux)))
}

/// Read a vacuum-wavelength spectrum, convert its wavelengths to air
/// (Shetrone et al. 2015) and mask zero-flux pixels.
///
/// `None` reads [`DEFAULT_EXTENSION`].
pub fn air_spec(
    locator: impl Into<Locator>,
    extension: Option<usize>,
) -> Result<(Vec<f64>, MaskedArray)> {
    let (wave, flux) = readspec(locator, extension.unwrap_or(DEFAULT_EXTENSION))?.into_parts();
    Ok((air_conversion(&wave), MaskedArray::masked_where_zero(flux)))
}
