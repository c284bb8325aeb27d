//! Helpers for one-dimensional astronomical spectra.
//!
//! Read a spectrum from a FITS file (local or over HTTP), rebuild its
//! wavelength axis from the WCS keywords, convert vacuum wavelengths to air,
//! apply Doppler shifts and resample onto a new grid.
//!
//! ```no_run
//! use apo_tools::{air_spec, readspec, Spectrum};
//!
//! let data = readspec("apStar-r12-2M00000002+7417074.fits", 1)?;
//! let spectrum = Spectrum::try_from(data)?;
//! let rest = spectrum.vel_shift(-12.5);
//!
//! let (air_wave, flux) = air_spec("spec.fits.gz", None)?;
//! println!("{} of {} pixels usable", flux.count(), air_wave.len());
//! # let _ = rest;
//! # Ok::<(), apo_tools::Error>(())
//! ```

pub mod axis;
pub mod convert;
pub mod error;
pub mod masked;
pub mod reader;
pub mod source;
pub mod spectrum;
pub mod spline;

pub use axis::{AxisType, WavelengthAxis};
pub use convert::{air_conversion, vacuum_to_air, velocity_shift, SPEED_OF_LIGHT_KMS};
pub use error::{Error, Result};
pub use masked::MaskedArray;
pub use reader::{air_spec, readspec, vac_spec, SpectrumData, DEFAULT_EXTENSION};
pub use source::Locator;
pub use spectrum::Spectrum;
pub use spline::CubicSpline;
