//! Cryptographically secure randomness for the candidate search.
//!
//! [`SecureRandomSource`] wraps the operating system CSPRNG and turns its raw
//! bytes into the integer and floating point draws the search needs.
//!
//! # Sign boundary
//!
//! Integer draws reinterpret random bytes as a signed value and take its
//! absolute value. The minimum signed value has no positive counterpart of the
//! same width, so it is mapped to zero. Every other magnitude is reached by
//! exactly two bit patterns (`v` and `-v`) and zero by `0` and `MIN`, which
//! keeps the non-negative output uniform.

mod source;

pub use source::SecureRandomSource;

/// Absolute value of `raw`, with `i32::MIN` mapped to `0`.
#[must_use]
pub const fn non_negative_i32(raw: i32) -> i32 {
    if raw == i32::MIN {
        0
    } else {
        raw.abs()
    }
}

/// Absolute value of `raw`, with `i64::MIN` mapped to `0`.
#[must_use]
pub const fn non_negative_i64(raw: i64) -> i64 {
    if raw == i64::MIN {
        0
    } else {
        raw.abs()
    }
}

/// Scales a raw signed 64-bit draw onto `[0, 1]`.
#[must_use]
pub fn unit_interval(raw: i64) -> f64 {
    non_negative_i64(raw) as f64 * (1.0 / i64::MAX as f64)
}
