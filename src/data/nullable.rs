//! Null-propagating arithmetic for derived columns.
//!
//! Every derived value is an `Option<f64>`. The combination rules live here
//! and nowhere else:
//! - any `None` operand gives `None`
//! - a zero or non-finite divisor gives `None`
//! - a non-finite result gives `None`

/// Keep a value only if it is finite.
#[inline]
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[inline]
pub fn add(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    finite(a? + b?)
}

#[inline]
pub fn sub(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    finite(a? - b?)
}

#[inline]
pub fn mul(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    finite(a? * b?)
}

#[inline]
pub fn div(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    let divisor = b?;
    if divisor == 0.0 || !divisor.is_finite() {
        return None;
    }
    finite(a? / divisor)
}

/// Apply a scalar function, dropping non-finite results.
#[inline]
pub fn map(a: Option<f64>, f: impl FnOnce(f64) -> f64) -> Option<f64> {
    finite(f(a?))
}

/// Element-wise `a - b` over two aligned columns.
pub fn sub_columns(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<Option<f64>> {
    a.iter().zip(b).map(|(&x, &y)| sub(x, y)).collect()
}

/// Element-wise `a + b` over two aligned columns.
pub fn add_columns(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<Option<f64>> {
    a.iter().zip(b).map(|(&x, &y)| add(x, y)).collect()
}
