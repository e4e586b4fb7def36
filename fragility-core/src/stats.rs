//! NaN-skipping descriptive statistics and rolling-window helpers.
//!
//! Every function ignores NaN inputs and returns NaN when too few defined
//! values remain.

/// Defined (non-NaN) values of a slice.
pub fn defined(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).collect()
}

/// Arithmetic mean of the defined values.
pub fn mean(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for &v in values {
        if !v.is_nan() {
            sum += v;
            n += 1;
        }
    }
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// Standard deviation of the defined values with `ddof` delta degrees of freedom.
///
/// `ddof = 0` is the population std, `ddof = 1` the sample std.
pub fn std_dev(values: &[f64], ddof: usize) -> f64 {
    let vals = defined(values);
    if vals.len() <= ddof {
        return f64::NAN;
    }
    let m = vals.iter().sum::<f64>() / vals.len() as f64;
    let ss: f64 = vals.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (vals.len() - ddof) as f64).sqrt()
}

/// Median of the defined values.
pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

/// Quantile of the defined values with linear interpolation between order
/// statistics (`position = q * (n - 1)`).
pub fn quantile(values: &[f64], q: f64) -> f64 {
    let mut vals = defined(values);
    if vals.is_empty() {
        return f64::NAN;
    }
    vals.sort_by(|a, b| a.total_cmp(b));
    quantile_sorted(&vals, q)
}

/// [`quantile`] over values that are already sorted and NaN-free.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Apply `f` over trailing windows of `window` positions.
///
/// Near the start of the slice the window is truncated. Positions whose window
/// holds fewer than `min_periods` defined values are NaN. `f` receives the raw
/// window, NaN included.
pub fn rolling_apply(
    values: &[f64],
    window: usize,
    min_periods: usize,
    f: impl Fn(&[f64]) -> f64,
) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if window == 0 {
        return out;
    }
    for i in 0..values.len() {
        let start = (i + 1).saturating_sub(window);
        let slice = &values[start..=i];
        let valid = slice.iter().filter(|v| !v.is_nan()).count();
        if valid >= min_periods.max(1) {
            out[i] = f(slice);
        }
    }
    out
}

/// Rolling sample standard deviation over a full window of defined values.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, window, |w| std_dev(w, 1))
}

/// Rolling sum over a full window of defined values.
pub fn rolling_sum(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, window, |w| w.iter().sum())
}

/// Rolling maximum of the defined values.
pub fn rolling_max(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling_apply(values, window, min_periods, |w| {
        w.iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(f64::NEG_INFINITY, f64::max)
    })
}

/// Rolling mean of the defined values.
pub fn rolling_mean(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling_apply(values, window, min_periods, mean)
}

/// `x[i] - x[i - periods]`.
pub fn diff(values: &[f64], periods: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if i < periods {
                f64::NAN
            } else {
                values[i] - values[i - periods]
            }
        })
        .collect()
}

/// `x[i] / x[i - periods] - 1`, NaN wherever either side is NaN.
///
/// Division by zero yields ±inf (or NaN for 0/0); callers decide how to treat it.
pub fn pct_change(values: &[f64], periods: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if i < periods {
                f64::NAN
            } else {
                values[i] / values[i - periods] - 1.0
            }
        })
        .collect()
}

/// Pearson correlation over rows where both inputs are defined.
///
/// Returns NaN when fewer than `min_periods` paired rows exist or either side
/// has zero variance.
pub fn pearson(x: &[f64], y: &[f64], min_periods: usize) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(a, b)| (*a, *b))
        .collect();
    if pairs.len() < min_periods.max(2) {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (a, b) in &pairs {
        cov += (a - mx) * (b - my);
        vx += (a - mx) * (a - mx);
        vy += (b - my) * (b - my);
    }
    let den = (vx * vy).sqrt();
    if den == 0.0 {
        return f64::NAN;
    }
    cov / den
}

#[cfg(test)]
pub(crate) mod test_support {
    /// Assert two f64 values are approximately equal (within epsilon).
    pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
        assert!(
            (actual - expected).abs() < epsilon,
            "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
            (actual - expected).abs()
        );
    }

    /// Default epsilon for numeric tests.
    pub const DEFAULT_EPSILON: f64 = 1e-10;
}
