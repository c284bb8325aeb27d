use crate::convert::{air_conversion, velocity_shift};
use crate::error::{Error, Result};
use crate::spline::CubicSpline;

/// A spectrum: wavelength, flux and optional variance of equal length.
///
/// Methods never modify the receiver; conversions return new values.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    wavelength: Vec<f64>,
    flux: Vec<f64>,
    variance: Option<Vec<f64>>,
    air_wavelength: Option<Vec<f64>>,
}

fn check_len(field: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::LengthMismatch {
            field,
            expected,
            actual,
        })
    }
}

impl Spectrum {
    pub fn new(wavelength: Vec<f64>, flux: Vec<f64>, variance: Option<Vec<f64>>) -> Result<Self> {
        check_len("flux", wavelength.len(), flux.len())?;
        if let Some(var) = &variance {
            check_len("variance", wavelength.len(), var.len())?;
        }
        Ok(Spectrum {
            wavelength,
            flux,
            variance,
            air_wavelength: None,
        })
    }

    pub fn wavelength(&self) -> &[f64] {
        &self.wavelength
    }

    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    pub fn variance(&self) -> Option<&[f64]> {
        self.variance.as_deref()
    }

    /// Air wavelengths, present after [`Spectrum::vac_to_air`].
    pub fn air_wavelength(&self) -> Option<&[f64]> {
        self.air_wavelength.as_deref()
    }

    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelength.is_empty()
    }

    /// A copy that also carries air wavelengths computed from the (vacuum)
    /// wavelength; the vacuum wavelength is kept as is.
    pub fn vac_to_air(&self) -> Spectrum {
        Spectrum {
            air_wavelength: Some(air_conversion(&self.wavelength)),
            ..self.clone()
        }
    }

    /// Doppler-shifted wavelengths for `velocity` in km/s.
    pub fn vel_shift(&self, velocity: f64) -> Vec<f64> {
        velocity_shift(&self.wavelength, velocity)
    }

    /// Resample onto `new_wavelength` with a cubic interpolating spline.
    ///
    /// Points outside the current wavelength range get zero flux. Variance
    /// is resampled the same way; air wavelengths are not carried over.
    pub fn interpolate_spectrum(&self, new_wavelength: &[f64]) -> Result<Spectrum> {
        let flux = CubicSpline::new(&self.wavelength, &self.flux)?.evaluate_many(new_wavelength);
        let variance = self
            .variance
            .as_ref()
            .map(|var| {
                CubicSpline::new(&self.wavelength, var).map(|s| s.evaluate_many(new_wavelength))
            })
            .transpose()?;

        tracing::debug!(
            from = self.len(),
            to = new_wavelength.len(),
            "resampled spectrum"
        );
        Ok(Spectrum {
            wavelength: new_wavelength.to_vec(),
            flux,
            variance,
            air_wavelength: None,
        })
    }

    /// Owned `ndarray` copies of wavelength and flux.
    #[cfg(feature = "array")]
    pub fn to_arrays(&self) -> (ndarray::Array1<f64>, ndarray::Array1<f64>) {
        (
            ndarray::Array1::from(self.wavelength.clone()),
            ndarray::Array1::from(self.flux.clone()),
        )
    }
}
