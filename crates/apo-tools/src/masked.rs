//! Flux values paired with an exclusion mask.

use crate::error::{Error, Result};

/// An array of values with a parallel mask; `true` in the mask means the
/// value is excluded from arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedArray {
    data: Vec<f64>,
    mask: Vec<bool>,
}

impl MaskedArray {
    /// Mask every value equal to zero. `-0.0` counts as zero, NaN does not.
    pub fn masked_where_zero(data: Vec<f64>) -> Self {
        let mask: Vec<bool> = data.iter().map(|&v| v == 0.0).collect();
        tracing::trace!(
            len = data.len(),
            masked = mask.iter().filter(|&&m| m).count(),
            "masked zero-valued pixels"
        );
        MaskedArray { data, mask }
    }

    /// Pair existing values and mask.
    pub fn from_parts(data: Vec<f64>, mask: Vec<bool>) -> Result<Self> {
        if data.len() != mask.len() {
            return Err(Error::LengthMismatch {
                field: "mask",
                expected: data.len(),
                actual: mask.len(),
            });
        }
        Ok(MaskedArray { data, mask })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if index `i` is masked. Out-of-range indices are not.
    pub fn is_masked(&self, i: usize) -> bool {
        self.mask.get(i).copied().unwrap_or(false)
    }

    /// The value at `i`, or `None` if masked or out of range.
    pub fn get(&self, i: usize) -> Option<f64> {
        match self.mask.get(i) {
            Some(false) => Some(self.data[i]),
            _ => None,
        }
    }

    /// Number of unmasked values.
    pub fn count(&self) -> usize {
        self.mask.iter().filter(|&&m| !m).count()
    }

    /// Unmasked values in order.
    pub fn compressed(&self) -> Vec<f64> {
        self.iter().flatten().collect()
    }

    /// All values, with masked positions replaced by `fill`.
    pub fn filled(&self, fill: f64) -> Vec<f64> {
        self.iter().map(|v| v.unwrap_or(fill)).collect()
    }

    /// Iterate over values, yielding `None` for masked positions.
    pub fn iter(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.data
            .iter()
            .zip(&self.mask)
            .map(|(&v, &m)| (!m).then_some(v))
    }

    /// Mean of the unmasked values; `None` when everything is masked.
    pub fn mean(&self) -> Option<f64> {
        let n = self.count();
        if n == 0 {
            return None;
        }
        Some(self.iter().flatten().sum::<f64>() / n as f64)
    }

    /// Underlying values, masked ones included.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Per-value flags, `true` where excluded.
    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    /// Consume into `(data, mask)`.
    pub fn into_parts(self) -> (Vec<f64>, Vec<bool>) {
        (self.data, self.mask)
    }

    /// Copy into an `ndarray` masked-value pair.
    #[cfg(feature = "array")]
    pub fn to_array(&self) -> (ndarray::Array1<f64>, ndarray::Array1<bool>) {
        (
            ndarray::Array1::from(self.data.clone()),
            ndarray::Array1::from(self.mask.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_exactly_the_zeros() {
        let m = MaskedArray::masked_where_zero(vec![1.0, 0.0, -0.0, 2.5, f64::NAN, 0.0]);
        assert_eq!(m.mask(), &[false, true, true, false, false, true]);
        assert_eq!(m.count(), 3);
        assert_eq!(m.len(), 6);
    }

    #[test]
    fn tiny_values_are_not_zero() {
        let m = MaskedArray::masked_where_zero(vec![1e-300, -f64::MIN_POSITIVE]);
        assert_eq!(m.count(), 2);
    }

    #[test]
    fn compressed_and_filled() {
        let m = MaskedArray::masked_where_zero(vec![3.0, 0.0, 5.0]);
        assert_eq!(m.compressed(), vec![3.0, 5.0]);
        assert_eq!(m.filled(-1.0), vec![3.0, -1.0, 5.0]);
        assert_eq!(m.get(1), None);
        assert_eq!(m.get(2), Some(5.0));
        assert_eq!(m.get(9), None);
        assert!(!m.is_masked(9));
    }

    #[test]
    fn mean_skips_masked() {
        let m = MaskedArray::masked_where_zero(vec![2.0, 0.0, 4.0]);
        assert_eq!(m.mean(), Some(3.0));

        let all = MaskedArray::masked_where_zero(vec![0.0, 0.0]);
        assert_eq!(all.mean(), None);
        assert!(all.compressed().is_empty());
    }

    #[test]
    fn from_parts_checks_length() {
        assert!(MaskedArray::from_parts(vec![1.0], vec![true]).is_ok());
        let err = MaskedArray::from_parts(vec![1.0, 2.0], vec![true]).unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn into_parts_keeps_masked_values() {
        let (data, mask) = MaskedArray::masked_where_zero(vec![0.0, 1.0]).into_parts();
        assert_eq!(data, vec![0.0, 1.0]);
        assert_eq!(mask, vec![true, false]);
    }
}
