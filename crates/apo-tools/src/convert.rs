//! Vacuum to air wavelength conversion and Doppler shifts.

/// Speed of light in km/s.
pub const SPEED_OF_LIGHT_KMS: f64 = 2.99792458e5;

// Refractive index of standard air, Shetrone et al. (2015).
const B1: f64 = 5.792105e-2;
const B2: f64 = 1.67917e-3;
const C1: f64 = 238.0185;
const C2: f64 = 57.362;

/// Convert one vacuum wavelength in Angstrom to air.
///
/// Works in units of 10⁴ Å:
///
/// ```text
/// σ = λ / 10⁴
/// n = 1 + b1 / (c1 - σ⁻²) + b2 / (c2 - σ⁻²)
/// λ_air = σ / n · 10⁴
/// ```
///
/// No guard is applied: at λ = 0 the σ⁻² term is infinite and IEEE
/// arithmetic yields `0.0`; at the poles of `n` the result is non-finite.
pub fn vacuum_to_air(wavelength: f64) -> f64 {
    let sigma = wavelength / 10000.0;
    let inv_sq = 1.0 / (sigma * sigma);
    let n = 1.0 + B1 / (C1 - inv_sq) + B2 / (C2 - inv_sq);
    sigma / n * 10000.0
}

/// Convert vacuum wavelengths in Angstrom to air, elementwise.
pub fn air_conversion(wave: &[f64]) -> Vec<f64> {
    wave.iter().copied().map(vacuum_to_air).collect()
}

/// Classical Doppler shift: `λ · (1 + v / c)`, with `velocity` in km/s.
///
/// No relativistic correction and no bound on `velocity`.
pub fn velocity_shift(wavelength: &[f64], velocity: f64) -> Vec<f64> {
    let factor = 1.0 + velocity / SPEED_OF_LIGHT_KMS;
    wavelength.iter().map(|w| w * factor).collect()
}
