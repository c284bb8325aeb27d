//! End-to-end reading of spectra written to temporary FITS files.

use std::path::{Path, PathBuf};

use apo_fits::image::{build_image_extension, build_primary_hdu};
use apo_fits::{Card, ImageData, Value};
use apo_tools::{
    air_conversion, air_spec, readspec, vac_spec, Error, Spectrum, DEFAULT_EXTENSION,
};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn wcs(ctype: &str, crpix: f64, crval: f64, cdelt: f64) -> Vec<Card> {
    vec![
        Card::new("CTYPE1", Value::String(ctype.to_string())),
        Card::new("CRPIX1", Value::Float(crpix)),
        Card::new("CRVAL1", Value::Float(crval)),
        Card::new("CDELT1", Value::Float(cdelt)),
    ]
}

/// Empty primary HDU followed by one image extension holding `flux`.
fn spectrum_file(naxes: &[usize], flux: ImageData, cards: &[Card]) -> Vec<u8> {
    let mut bytes = build_primary_hdu(&[], &ImageData::U8(vec![]), &[]).unwrap();
    bytes.extend(build_image_extension(naxes, &flux, cards).unwrap());
    bytes
}

fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn gzip(payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0x1f, 0x8b, 0x08, 0, 0, 0, 0, 0, 0, 0xff];
    out.extend(miniz_oxide::deflate::compress_to_vec(payload, 6));
    out.extend_from_slice(&[0, 0, 0, 0]);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out
}

fn linear_file(dir: &TempDir) -> PathBuf {
    let flux = ImageData::F32(vec![1.0, 0.0, 3.0, 0.0, 5.0]);
    let bytes = spectrum_file(&[5], flux, &wcs("LINEAR", 0.0, 4000.0, 1.0));
    write(dir, "linear.fits", &bytes)
}

fn assert_close(got: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(got.len(), expected.len());
    for (i, (g, e)) in got.iter().zip(expected).enumerate() {
        assert!((g - e).abs() <= tol, "index {i}: {g} vs {e}");
    }
}

// ---------------------------------------------------------------------------
// readspec
// ---------------------------------------------------------------------------

#[test]
fn linear_axis_golden_values() {
    let dir = TempDir::new().unwrap();
    let path = linear_file(&dir);

    let data = readspec(&path, 1).unwrap();
    assert_eq!(data.wavelength, vec![4000.0, 4001.0, 4002.0, 4003.0, 4004.0]);
    assert_eq!(data.flux, vec![1.0, 0.0, 3.0, 0.0, 5.0]);
    assert_eq!(data.naxes, vec![5]);
}

#[test]
fn accepts_string_locators() {
    let dir = TempDir::new().unwrap();
    let path = linear_file(&dir);
    let as_string = path.to_str().unwrap().to_string();

    let data = readspec(as_string.as_str(), 1).unwrap();
    assert_eq!(data.wavelength.len(), 5);
}

#[test]
fn primary_hdu_spectrum() {
    let dir = TempDir::new().unwrap();
    let flux = ImageData::F64(vec![2.0; 4]);
    let bytes = build_primary_hdu(&[4], &flux, &wcs("AWAV", 1.0, 6000.0, 0.5)).unwrap();
    let path = write(&dir, "primary.fits", &bytes);

    let data = readspec(&path, 0).unwrap();
    assert_eq!(data.wavelength, vec![6000.5, 6001.0, 6001.5, 6002.0]);
}

#[test]
fn cd1_1_overrides_cdelt1_in_file() {
    let dir = TempDir::new().unwrap();
    let mut cards = wcs("WAVELENGTH", 0.0, 5000.0, 1.0);
    cards.push(Card::new("CD1_1", Value::Float(0.1)));
    let bytes = spectrum_file(&[3], ImageData::F32(vec![1.0; 3]), &cards);
    let path = write(&dir, "cd.fits", &bytes);

    let data = readspec(&path, 1).unwrap();
    assert_close(&data.wavelength, &[5000.0, 5000.1, 5000.2], 1e-9);
}

#[test]
fn log_wave_axis() {
    let dir = TempDir::new().unwrap();
    let bytes = spectrum_file(
        &[3],
        ImageData::F32(vec![1.0; 3]),
        &wcs("WAVE", 0.0, 15000.0, 0.2),
    );
    let path = write(&dir, "wave.fits", &bytes);

    let data = readspec(&path, 1).unwrap();
    let c0 = 15000f64.log10();
    let d = 15000.2f64.log10() - c0;
    let expected: Vec<f64> = (0..3).map(|i| 10f64.powf(i as f64 * d + c0)).collect();
    assert_close(&data.wavelength, &expected, 1e-9);
    assert!((data.wavelength[1] - 15000.2).abs() < 1e-8);
}

#[test]
fn log_linear_axis() {
    let dir = TempDir::new().unwrap();
    let bytes = spectrum_file(
        &[4],
        ImageData::F32(vec![1.0; 4]),
        &wcs("LOG-LINEAR", 50.0, 4.17, 6e-6),
    );
    let path = write(&dir, "loglin.fits", &bytes);

    let data = readspec(&path, 1).unwrap();
    let expected: Vec<f64> = (0..4).map(|i| 10f64.powf(i as f64 * 6e-6 + 4.17)).collect();
    assert_close(&data.wavelength, &expected, 1e-9);
}

#[test]
fn unsupported_ctype() {
    let dir = TempDir::new().unwrap();
    let bytes = spectrum_file(&[2], ImageData::F32(vec![1.0; 2]), &wcs("FOO", 0.0, 1.0, 1.0));
    let path = write(&dir, "foo.fits", &bytes);

    let err = readspec(&path, 1).unwrap_err();
    assert!(matches!(err, Error::UnsupportedAxisType(ref s) if s == "FOO"));
}

#[test]
fn missing_header_field() {
    let dir = TempDir::new().unwrap();
    let mut cards = wcs("LINEAR", 0.0, 1.0, 1.0);
    cards.retain(|c| c.keyword_str() != "CRVAL1");
    let bytes = spectrum_file(&[2], ImageData::F32(vec![1.0; 2]), &cards);
    let path = write(&dir, "nocrval.fits", &bytes);

    let err = readspec(&path, 1).unwrap_err();
    assert!(matches!(err, Error::HeaderFieldMissing(ref k) if k == "CRVAL1"));
}

#[test]
fn missing_file_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let err = readspec(dir.path().join("nope.fits"), 1).unwrap_err();
    assert!(matches!(err, Error::ResourceUnavailable { .. }));
}

#[test]
fn non_fits_file_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "notes.txt", &vec![b'a'; 4000]);
    let err = readspec(&path, 0).unwrap_err();
    assert!(matches!(err, Error::ResourceUnavailable { .. }));
}

#[test]
fn extension_out_of_range() {
    let dir = TempDir::new().unwrap();
    let path = linear_file(&dir);
    let err = readspec(&path, 5).unwrap_err();
    assert!(matches!(
        err,
        Error::ExtensionNotFound {
            index: 5,
            available: 2
        }
    ));
}

#[test]
fn table_extension_is_not_an_image() {
    let dir = TempDir::new().unwrap();
    let mut bytes = build_primary_hdu(&[], &ImageData::U8(vec![]), &[]).unwrap();
    let cards = vec![
        Card::new("XTENSION", Value::String("BINTABLE".into())),
        Card::new("BITPIX", Value::Integer(8)),
        Card::new("NAXIS", Value::Integer(2)),
        Card::new("NAXIS1", Value::Integer(4)),
        Card::new("NAXIS2", Value::Integer(1)),
        Card::new("PCOUNT", Value::Integer(0)),
        Card::new("GCOUNT", Value::Integer(1)),
        Card::new("TFIELDS", Value::Integer(1)),
        Card::new("TFORM1", Value::String("1E".into())),
    ];
    bytes.extend(apo_fits::header::serialize_header(&cards));
    bytes.extend(vec![0u8; apo_fits::BLOCK_SIZE]);
    let path = write(&dir, "table.fits", &bytes);

    assert!(matches!(readspec(&path, 1), Err(Error::NotAnImage(1))));
}

#[test]
fn gzip_file_reads_like_plain_file() {
    let dir = TempDir::new().unwrap();
    let plain = spectrum_file(
        &[5],
        ImageData::F32(vec![1.0, 0.0, 3.0, 0.0, 5.0]),
        &wcs("LINEAR", 0.0, 4000.0, 1.0),
    );
    let gz = write(&dir, "linear.fits.gz", &gzip(&plain));
    let raw = write(&dir, "linear.fits", &plain);

    assert_eq!(readspec(&gz, 1).unwrap(), readspec(&raw, 1).unwrap());
}

#[test]
fn integer_flux_is_scaled() {
    let dir = TempDir::new().unwrap();
    let mut cards = wcs("LINEAR", 0.0, 4000.0, 1.0);
    cards.push(Card::new("BSCALE", Value::Float(2.0)));
    cards.push(Card::new("BZERO", Value::Float(10.0)));
    let bytes = spectrum_file(&[3], ImageData::I16(vec![0, 1, -5]), &cards);
    let path = write(&dir, "scaled.fits", &bytes);

    let data = readspec(&path, 1).unwrap();
    assert_eq!(data.flux, vec![10.0, 12.0, 0.0]);
}

#[test]
fn stacked_spectra_share_one_axis() {
    let dir = TempDir::new().unwrap();
    let flux = ImageData::F32((0..6).map(|i| i as f32).collect());
    let bytes = spectrum_file(&[3, 2], flux, &wcs("LINEAR", 0.0, 100.0, 10.0));
    let path = write(&dir, "stack.fits", &bytes);

    let data = readspec(&path, 1).unwrap();
    assert_eq!(data.wavelength, vec![100.0, 110.0, 120.0]);
    assert_eq!(data.num_rows(), 2);
    assert_eq!(data.rows().nth(1).unwrap(), &[3.0, 4.0, 5.0]);
}

/// Put `card` in place of the END card of the header starting at `at`,
/// moving END one slot down. The header must have a free slot.
fn insert_raw_card(bytes: &mut [u8], at: usize, card: &[u8; 80]) {
    let end = (at..at + apo_fits::BLOCK_SIZE)
        .step_by(80)
        .find(|&i| bytes[i..].starts_with(b"END     "))
        .unwrap();
    bytes.copy_within(end..end + 80, end + 80);
    bytes[end..end + 80].copy_from_slice(card);
}

#[test]
fn latin1_history_card_is_readable() {
    let dir = TempDir::new().unwrap();
    let mut bytes = spectrum_file(
        &[3],
        ImageData::F32(vec![1.0, 2.0, 3.0]),
        &wcs("LINEAR", 0.0, 4000.0, 1.0),
    );
    let mut card = [b' '; 80];
    card[..26].copy_from_slice(b"HISTORY  Dome at 12 C (ok)");
    card[19] = 0xb0;
    insert_raw_card(&mut bytes, apo_fits::BLOCK_SIZE, &card);
    let path = write(&dir, "history.fits", &bytes);

    let data = readspec(&path, 1).unwrap();
    assert_eq!(data.wavelength, vec![4000.0, 4001.0, 4002.0]);
    assert_eq!(data.flux, vec![1.0, 2.0, 3.0]);
}

#[test]
fn broken_extension_header_is_reported() {
    let dir = TempDir::new().unwrap();
    let mut bytes = build_primary_hdu(&[], &ImageData::U8(vec![]), &[]).unwrap();
    let cards = vec![
        Card::new("XTENSION", Value::String("IMAGE".into())),
        Card::new("NAXIS", Value::Integer(1)),
        Card::new("NAXIS1", Value::Integer(3)),
        Card::new("PCOUNT", Value::Integer(0)),
        Card::new("GCOUNT", Value::Integer(1)),
    ];
    bytes.extend(apo_fits::header::serialize_header(&cards));
    bytes.extend(vec![0u8; apo_fits::BLOCK_SIZE]);
    let path = write(&dir, "broken.fits", &bytes);

    let err = readspec(&path, 1).unwrap_err();
    assert!(
        matches!(err, Error::ResourceUnavailable { ref reason, .. } if reason.contains("BITPIX")),
        "{err}"
    );
}

// ---------------------------------------------------------------------------
// vac_spec / air_spec
// ---------------------------------------------------------------------------

#[test]
fn vac_spec_masks_zero_flux_with_default_extension() {
    assert_eq!(DEFAULT_EXTENSION, 1);
    let dir = TempDir::new().unwrap();
    let path = linear_file(&dir);

    let (wave, flux) = vac_spec(&path, None).unwrap();
    assert_eq!(wave, vec![4000.0, 4001.0, 4002.0, 4003.0, 4004.0]);
    assert_eq!(flux.mask(), &[false, true, false, true, false]);
    assert_eq!(flux.compressed(), vec![1.0, 3.0, 5.0]);
}

#[test]
fn vac_spec_masks_integer_zeros() {
    let dir = TempDir::new().unwrap();
    let bytes = spectrum_file(
        &[4],
        ImageData::I32(vec![0, 7, 0, -3]),
        &wcs("LINEAR", 0.0, 1.0, 1.0),
    );
    let path = write(&dir, "int.fits", &bytes);

    let (_, flux) = vac_spec(&path, Some(1)).unwrap();
    assert_eq!(flux.mask(), &[true, false, true, false]);
}

#[test]
fn vac_spec_explicit_primary_extension() {
    let dir = TempDir::new().unwrap();
    let bytes = build_primary_hdu(
        &[3],
        &ImageData::F64(vec![0.0, 1.0, 2.0]),
        &wcs("LINEAR", 0.0, 10.0, 1.0),
    )
    .unwrap();
    let path = write(&dir, "prim.fits", &bytes);

    let (_, flux) = vac_spec(&path, Some(0)).unwrap();
    assert_eq!(flux.count(), 2);
    assert!(matches!(
        vac_spec(&path, None),
        Err(Error::ExtensionNotFound { index: 1, .. })
    ));
}

#[test]
fn air_spec_converts_wavelengths() {
    let dir = TempDir::new().unwrap();
    let path = linear_file(&dir);

    let (vac, vac_flux) = vac_spec(&path, None).unwrap();
    let (air, air_flux) = air_spec(&path, None).unwrap();
    assert_eq!(air, air_conversion(&vac));
    assert!(air.iter().zip(&vac).all(|(a, v)| a < v));
    assert_eq!(air_flux, vac_flux);
}

// ---------------------------------------------------------------------------
// Spectrum built from a file
// ---------------------------------------------------------------------------

#[test]
fn resample_spectrum_read_from_file() {
    let dir = TempDir::new().unwrap();
    let flux: Vec<f32> = (0..8).map(|i| 2.0 + 0.5 * i as f32).collect();
    let bytes = spectrum_file(&[8], ImageData::F32(flux), &wcs("LINEAR", 0.0, 5000.0, 1.0));
    let path: &Path = &write(&dir, "resample.fits", &bytes);

    let spectrum = Spectrum::try_from(readspec(path, 1).unwrap()).unwrap();
    let out = spectrum
        .interpolate_spectrum(&[4000.0, 5002.5, 5007.0, 6000.0])
        .unwrap();
    assert_close(out.flux(), &[0.0, 3.25, 5.5, 0.0], 1e-9);
}
