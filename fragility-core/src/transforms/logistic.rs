//! Logistic rescale of z-scores onto 0–100.
//!
//! z = 0 maps to 50, the neutral score. z is clipped to [-20, 20] before the
//! exponential so extreme inputs saturate instead of overflowing.

/// Clip bound applied to z before the exponential.
pub const Z_CLIP: f64 = 20.0;

/// `100 / (1 + e^{-clip(z)})` for one value. NaN stays NaN.
pub fn logistic(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    let clipped = z.clamp(-Z_CLIP, Z_CLIP);
    100.0 / (1.0 + (-clipped).exp())
}

/// Elementwise [`logistic`].
pub fn logistic_scale(z: &[f64]) -> Vec<f64> {
    z.iter().map(|&v| logistic(v)).collect()
}
