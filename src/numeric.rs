//! Deterministic fixed-point numeric domain `Q`.
//!
//! `Q` is a non-negative rational represented as an integer `value` with an
//! implicit divisor `10^scale`. ATS instances use `scale = 18`; GMI instances
//! use `scale = 6` (see [`ATS_SCALE`] / [`GMI_SCALE`]). Every operation is
//! integer-only and bit-reproducible across platforms: no float ever enters
//! this type, and there is no conversion path from a float into it.
//!
//! Saturating add/mul cap at [`max_value`]; subtraction floors at zero;
//! division by zero is a fault ([`QError::DivideByZero`]), never a silent
//! saturation. Ordering is the integer representation's total order, which
//! is only meaningful between values of the same scale.

#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// ATS decimal scale: 18 fractional digits.
pub const ATS_SCALE: u32 = 18;
/// GMI decimal scale: 6 fractional digits.
pub const GMI_SCALE: u32 = 6;

/// Domain ceiling, in whole units, shared by both scales (spec: "ATS chose a
/// ceiling of 10 000").
pub const CEILING_UNITS: u128 = 10_000;

/// Faults raised by [`Q`] operations. These are never rejections: a fault
/// means the caller asked for something outside the algebra's domain.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QError {
    #[error("division by zero")]
    DivideByZero,
    #[error("negative value is forbidden in Q")]
    Invalid,
    #[error("scale mismatch: {a} vs {b}")]
    ScaleMismatch { a: u32, b: u32 },
}

/// A non-negative fixed-point scalar, `value / 10^scale`.
#[derive(Clone, Copy, Debug, Eq, Hash, Serialize, Deserialize)]
pub struct Q {
    value: u128,
    scale: u32,
}

impl Q {
    /// `10^scale` as an integer.
    #[inline]
    pub fn scale_factor(scale: u32) -> u128 {
        10u128.pow(scale)
    }

    /// The saturating maximum representable value at a given scale.
    #[inline]
    pub fn max_value(scale: u32) -> u128 {
        CEILING_UNITS * Self::scale_factor(scale)
    }

    /// The additive identity at `scale`.
    #[inline]
    pub fn zero(scale: u32) -> Self {
        Self { value: 0, scale }
    }

    /// The multiplicative identity at `scale` (i.e. `1.0`).
    #[inline]
    pub fn one(scale: u32) -> Self {
        Self { value: Self::scale_factor(scale), scale }
    }

    /// Construct from an already-scaled raw integer, capping at the domain
    /// ceiling.
    pub fn from_raw(value: u128, scale: u32) -> Self {
        let capped = value.min(Self::max_value(scale));
        Self { value: capped, scale }
    }

    /// Construct from a plain integer `n` (representing `n.0`).
    pub fn from_int(n: u64, scale: u32) -> Self {
        let value = (n as u128).saturating_mul(Self::scale_factor(scale));
        Self::from_raw(value, scale)
    }

    /// Construct from an integer part and a fractional part expressed with
    /// `fractional_digits` digits of precision.
    pub fn from_decimal(integer: u64, fractional: u64, fractional_digits: u32, scale: u32) -> Self {
        let scaled_fractional = if fractional_digits <= scale {
            (fractional as u128) * 10u128.pow(scale - fractional_digits)
        } else {
            (fractional as u128) / 10u128.pow(fractional_digits - scale)
        };
        let value = (integer as u128)
            .saturating_mul(Self::scale_factor(scale))
            .saturating_add(scaled_fractional);
        Self::from_raw(value, scale)
    }

    /// Parse a non-negative decimal string (`"1"`, `"0.5"`, `"12.0034"`).
    pub fn from_decimal_str(s: &str, scale: u32) -> Result<Self, QError> {
        let s = s.trim();
        if s.is_empty() || s.starts_with('-') {
            return Err(QError::Invalid);
        }
        match s.split_once('.') {
            Some((int_part, frac_part)) => {
                let integer: u64 = int_part.parse().map_err(|_| QError::Invalid)?;
                let digits = frac_part.len() as u32;
                let fractional: u64 = if frac_part.is_empty() {
                    0
                } else {
                    frac_part.parse().map_err(|_| QError::Invalid)?
                };
                Ok(Self::from_decimal(integer, fractional, digits.max(1), scale))
            }
            None => {
                let integer: u64 = s.parse().map_err(|_| QError::Invalid)?;
                Ok(Self::from_int(integer, scale))
            }
        }
    }

    /// Raw scaled integer representation.
    #[inline]
    pub fn value(&self) -> u128 {
        self.value
    }

    /// The scale (number of implied fractional decimal digits).
    #[inline]
    pub fn scale(&self) -> u32 {
        self.scale
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    fn require_same_scale(&self, other: &Q) -> Result<(), QError> {
        if self.scale != other.scale {
            return Err(QError::ScaleMismatch { a: self.scale, b: other.scale });
        }
        Ok(())
    }

    /// Saturating addition: caps at the domain ceiling.
    pub fn add(&self, other: &Q) -> Result<Q, QError> {
        self.require_same_scale(other)?;
        let sum = self.value.saturating_add(other.value);
        Ok(Q::from_raw(sum, self.scale))
    }

    /// Flooring subtraction: returns zero (and `floored = true`) if
    /// `self < other`, instead of faulting or going negative.
    pub fn sub_flagged(&self, other: &Q) -> Result<(Q, bool), QError> {
        self.require_same_scale(other)?;
        if self.value < other.value {
            Ok((Q::zero(self.scale), true))
        } else {
            Ok((Q::from_raw(self.value - other.value, self.scale), false))
        }
    }

    /// Flooring subtraction, discarding the floor flag.
    pub fn sub(&self, other: &Q) -> Result<Q, QError> {
        self.sub_flagged(other).map(|(q, _)| q)
    }

    /// Saturating multiplication: `(a * b) / 10^scale`, capped at the
    /// ceiling.
    pub fn mul(&self, other: &Q) -> Result<Q, QError> {
        self.require_same_scale(other)?;
        let scale_factor = Self::scale_factor(self.scale);
        let product = self.value.saturating_mul(other.value) / scale_factor;
        Ok(Q::from_raw(product, self.scale))
    }

    /// Saturating division: `(a * 10^scale) / b`. Faults on division by
    /// zero rather than saturating.
    pub fn div(&self, other: &Q) -> Result<Q, QError> {
        self.require_same_scale(other)?;
        if other.value == 0 {
            return Err(QError::DivideByZero);
        }
        let scale_factor = Self::scale_factor(self.scale);
        let numerator = self.value.saturating_mul(scale_factor);
        Ok(Q::from_raw(numerator / other.value, self.scale))
    }

    /// `max(0, self - other)`, the positive part of a signed delta,
    /// expressed without leaving the non-negative domain. `self` plays the
    /// role of the later value, `other` the earlier one.
    pub fn positive_delta(&self, other: &Q) -> Result<Q, QError> {
        self.sub(other)
    }

    /// Render as a decimal string with the full `scale` fractional digits.
    pub fn to_decimal_string(&self) -> String {
        let factor = Self::scale_factor(self.scale);
        let integer = self.value / factor;
        let fractional = self.value % factor;
        if self.scale == 0 {
            return integer.to_string();
        }
        format!("{integer}.{fractional:0width$}", width = self.scale as usize)
    }
}

impl PartialEq for Q {
    fn eq(&self, other: &Self) -> bool {
        self.scale == other.scale && self.value == other.value
    }
}

/// Total order on the integer representation. Comparing values of different
/// scales is a logic error in this crate (every call site fixes the scale up
/// front), so we order by `(scale, value)` to keep `Ord` total without
/// panicking.
impl PartialOrd for Q {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Q {
    fn cmp(&self, other: &Self) -> Ordering {
        self.scale.cmp(&other.scale).then(self.value.cmp(&other.value))
    }
}

impl fmt::Display for Q {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}
