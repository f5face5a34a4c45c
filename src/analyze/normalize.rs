//! Bounded 0–100 normalizers.

/// Logistic curve mapping `midpoint` to 50. Slope is relative to the midpoint,
/// so the same `steepness` behaves alike for small and large rates.
pub fn sigmoid(value: f64, midpoint: f64, steepness: f64) -> f64 {
    if !value.is_finite() || midpoint <= 0.0 {
        return 0.0;
    }
    let out = 100.0 / (1.0 + (-steepness * (value - midpoint) / midpoint).exp());
    clamp100(out)
}

/// `(log10(value + 1) - k) * m`, clamped to [0,100]. For magnitudes spanning
/// several orders (view counts, views per minute).
pub fn log_scaled(value: f64, k: f64, m: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    clamp100(((value + 1.0).log10() - k) * m)
}

/// Clamp to [0,100]; NaN maps to 0.
pub fn clamp100(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 100.0)
    }
}

/// Round to one decimal place.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
