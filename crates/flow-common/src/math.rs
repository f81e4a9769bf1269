//! Small numeric helpers used by scales, grids and the field builder.

/// Remainder of floored division, always in `[0, n)`.
pub fn floor_mod(a: f64, n: f64) -> f64 {
    let f = a - n * (a / n).floor();
    // a can sit so close to a multiple of n that f rounds up to n
    if f == n {
        0.0
    } else {
        f
    }
}

/// `x` clamped to `[low, high]`.
pub fn clamp(x: f64, low: f64, high: f64) -> f64 {
    low.max(x.min(high))
}

/// Fraction of `[low, high]` covered by `x` after clamping, in `[0, 1]`.
pub fn proportion(x: f64, low: f64, high: f64) -> f64 {
    (clamp(x, low, high) - low) / (high - low)
}

/// `p` in `[0, 1]` scaled to `[low, high]`.
pub fn spread(p: f64, low: f64, high: f64) -> f64 {
    p * (high - low) + low
}
