//! Numeric rounding per XPath 1.0.

/// `round()`: NaN and the infinities pass through; an exact `0.5` rounds to
/// `+0`; values in `[-0.5, 0)` round to `-0`; everything else is
/// `floor(x + 0.5)`.
pub(crate) fn round_xpath(x: f64) -> f64 {
    if x.is_nan() || x.is_infinite() {
        x
    } else if x == 0.5 {
        0.0
    } else if x < 0.0 && x >= -0.5 {
        -0.0
    } else {
        (x + 0.5).floor()
    }
}

/// Rounding used for positional values (predicate positions, substring
/// indices). Saturates at the integer range bounds.
pub(crate) fn round_to_int(x: f64) -> i64 {
    round_xpath(x) as i64
}
