//! Precision-tagged storage for tensor values and gradients

use half::{bf16, f16};
use ndarray::Array1;

use super::precision::Precision;

/// One-dimensional storage in a concrete floating-point format
///
/// Arithmetic is always carried out in f32; writing into a reduced buffer
/// rounds to its format, so fp16 overflow becomes ±inf exactly as it would
/// on hardware.
#[derive(Clone, Debug, PartialEq)]
pub enum Buffer {
    /// Single precision
    F32(Array1<f32>),
    /// IEEE half precision
    F16(Array1<f16>),
    /// Brain floating point
    Bf16(Array1<bf16>),
}

impl Buffer {
    /// Store f32 values in the given precision
    pub fn from_f32(values: Array1<f32>, precision: Precision) -> Self {
        match precision {
            Precision::Fp32 => Buffer::F32(values),
            Precision::Fp16 => Buffer::F16(values.mapv(f16::from_f32)),
            Precision::Bf16 => Buffer::Bf16(values.mapv(bf16::from_f32)),
        }
    }

    /// Zero-filled buffer
    pub fn zeros(len: usize, precision: Precision) -> Self {
        match precision {
            Precision::Fp32 => Buffer::F32(Array1::zeros(len)),
            Precision::Fp16 => Buffer::F16(Array1::from_elem(len, f16::ZERO)),
            Precision::Bf16 => Buffer::Bf16(Array1::from_elem(len, bf16::ZERO)),
        }
    }

    /// Storage precision
    pub fn precision(&self) -> Precision {
        match self {
            Buffer::F32(_) => Precision::Fp32,
            Buffer::F16(_) => Precision::Fp16,
            Buffer::Bf16(_) => Precision::Bf16,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            Buffer::F32(a) => a.len(),
            Buffer::F16(a) => a.len(),
            Buffer::Bf16(a) => a.len(),
        }
    }

    /// Whether the buffer holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widen to f32
    pub fn to_f32(&self) -> Array1<f32> {
        match self {
            Buffer::F32(a) => a.clone(),
            Buffer::F16(a) => a.mapv(f16::to_f32),
            Buffer::Bf16(a) => a.mapv(bf16::to_f32),
        }
    }

    /// Convert to another precision
    pub fn cast(&self, precision: Precision) -> Buffer {
        if self.precision() == precision {
            return self.clone();
        }
        Buffer::from_f32(self.to_f32(), precision)
    }

    /// True if any element is inf or NaN
    pub fn has_non_finite(&self) -> bool {
        match self {
            Buffer::F32(a) => a.iter().any(|v| !v.is_finite()),
            Buffer::F16(a) => a.iter().any(|v| !v.is_finite()),
            Buffer::Bf16(a) => a.iter().any(|v| !v.is_finite()),
        }
    }

    /// Bytes occupied by the elements
    pub fn size_bytes(&self) -> usize {
        self.len() * self.precision().size_bytes()
    }

    /// Apply an f32 update and round the result back into this buffer
    pub fn update_f32<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Array1<f32>),
    {
        match self {
            Buffer::F32(a) => f(a),
            other => {
                let precision = other.precision();
                let mut wide = other.to_f32();
                f(&mut wide);
                *other = Buffer::from_f32(wide, precision);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_from_f32_keeps_precision_tag() {
        let values = arr1(&[1.0, -2.5, 3.0]);
        assert_eq!(Buffer::from_f32(values.clone(), Precision::Fp32).precision(), Precision::Fp32);
        assert_eq!(Buffer::from_f32(values.clone(), Precision::Fp16).precision(), Precision::Fp16);
        assert_eq!(Buffer::from_f32(values, Precision::Bf16).precision(), Precision::Bf16);
    }

    #[test]
    fn test_fp16_overflow_becomes_infinite() {
        let buf = Buffer::from_f32(arr1(&[70000.0, 1.0]), Precision::Fp16);
        assert!(buf.has_non_finite());
        let wide = buf.to_f32();
        assert!(wide[0].is_infinite());
        assert_eq!(wide[1], 1.0);
    }

    #[test]
    fn test_bf16_keeps_large_values_finite() {
        let buf = Buffer::from_f32(arr1(&[70000.0, 1.0e30]), Precision::Bf16);
        assert!(!buf.has_non_finite());
    }

    #[test]
    fn test_cast_roundtrip_exact_for_representable_values() {
        let buf = Buffer::from_f32(arr1(&[0.5, 0.25, -8.0]), Precision::Fp32);
        let back = buf.cast(Precision::Fp16).cast(Precision::Fp32);
        assert_eq!(back, buf);
    }

    #[test]
    fn test_size_bytes() {
        assert_eq!(Buffer::zeros(10, Precision::Fp32).size_bytes(), 40);
        assert_eq!(Buffer::zeros(10, Precision::Fp16).size_bytes(), 20);
        assert_eq!(Buffer::zeros(10, Precision::Bf16).size_bytes(), 20);
    }

    #[test]
    fn test_update_f32_rounds_back() {
        let mut buf = Buffer::from_f32(arr1(&[1.0]), Precision::Fp16);
        buf.update_f32(|a| a[0] += 1.0e-4);
        // 1.0001 is not representable in fp16; nearest is 1.0
        assert_eq!(buf.to_f32()[0], 1.0);
        assert_eq!(buf.precision(), Precision::Fp16);
    }
}
