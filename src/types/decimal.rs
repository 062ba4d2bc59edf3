use std::{cmp::Ordering, fmt, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::config::MAX_DECIMALS;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecimalError {
    #[error("invalid decimal format: '{0}'")]
    InvalidFormat(String),
    #[error("negative amount: '{0}'")]
    Negative(String),
    #[error("'{value}' has more than {scale} fractional digits")]
    Precision { value: String, scale: u8 },
    #[error("scale {0} is larger than 18")]
    InvalidScale(u8),
    #[error("scale mismatch: {0} and {1}")]
    ScaleMismatch(u8, u8),
    #[error("amount exceeds the 64 bit ceiling")]
    Overflow,
    #[error("amount below zero")]
    Underflow,
}

/// Fixed-point amount: `value / 10^scale`.
///
/// The integer part of any amount must fit in a u64, which puts the ceiling
/// at `(2^64 - 1) * 10^scale`. Every operation is checked against it, nothing
/// wraps. Amounts of different scales never compare or combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct Decimal {
    value: u128,
    scale: u8,
}

fn scale_factor(scale: u8) -> u128 {
    10u128.pow(u32::from(scale))
}

fn ceiling(scale: u8) -> u128 {
    u128::from(u64::MAX) * scale_factor(scale)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn accumulate_digits(digits: &str) -> Result<u128, DecimalError> {
    digits.bytes().try_fold(0u128, |acc, b| {
        acc.checked_mul(10)
            .and_then(|acc| acc.checked_add(u128::from(b - b'0')))
            .ok_or(DecimalError::Overflow)
    })
}

impl Decimal {
    pub fn zero(scale: u8) -> Self {
        Decimal {
            value: 0,
            scale: scale.min(MAX_DECIMALS),
        }
    }

    pub fn from_mantissa(value: u128, scale: u8) -> Result<Self, DecimalError> {
        if scale > MAX_DECIMALS {
            return Err(DecimalError::InvalidScale(scale));
        }
        if value > ceiling(scale) {
            return Err(DecimalError::Overflow);
        }
        Ok(Decimal { value, scale })
    }

    /// The largest representable amount at `scale`.
    pub fn max_value(scale: u8) -> Self {
        let scale = scale.min(MAX_DECIMALS);
        Decimal {
            value: ceiling(scale),
            scale,
        }
    }

    pub fn parse(s: &str, scale: u8) -> Result<Self, DecimalError> {
        if scale > MAX_DECIMALS {
            return Err(DecimalError::InvalidScale(scale));
        }

        let (negative, unsigned) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (integer_part, fraction_part) = match unsigned.split_once('.') {
            Some((integer, fraction)) => (integer, Some(fraction)),
            None => (unsigned, None),
        };

        if !is_digits(integer_part) || fraction_part.is_some_and(|f| !is_digits(f)) {
            return Err(DecimalError::InvalidFormat(s.to_string()));
        }
        if negative {
            return Err(DecimalError::Negative(s.to_string()));
        }

        let fraction_part = fraction_part.unwrap_or("");
        if fraction_part.len() > scale as usize {
            return Err(DecimalError::Precision {
                value: s.to_string(),
                scale,
            });
        }

        let integer = accumulate_digits(integer_part)?;
        let fraction = accumulate_digits(fraction_part)?
            * scale_factor(scale - fraction_part.len() as u8);

        let value = integer
            .checked_mul(scale_factor(scale))
            .and_then(|v| v.checked_add(fraction))
            .ok_or(DecimalError::Overflow)?;

        Decimal::from_mantissa(value, scale)
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    pub fn mantissa(&self) -> u128 {
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    fn check_scale(&self, other: &Decimal) -> Result<(), DecimalError> {
        if self.scale != other.scale {
            return Err(DecimalError::ScaleMismatch(self.scale, other.scale));
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &Decimal) -> Result<Decimal, DecimalError> {
        self.check_scale(other)?;
        let value = self
            .value
            .checked_add(other.value)
            .ok_or(DecimalError::Overflow)?;
        Decimal::from_mantissa(value, self.scale)
    }

    pub fn checked_sub(&self, other: &Decimal) -> Result<Decimal, DecimalError> {
        self.check_scale(other)?;
        let value = self
            .value
            .checked_sub(other.value)
            .ok_or(DecimalError::Underflow)?;
        Ok(Decimal {
            value,
            scale: self.scale,
        })
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        (self.scale == other.scale).then(|| self.value.cmp(&other.value))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let magnitude = scale_factor(self.scale);
        let integer = self.value / magnitude;
        let fraction = self.value % magnitude;

        write!(f, "{integer}")?;
        if self.scale > 0 {
            write!(f, ".{fraction:0>width$}", width = self.scale as usize)?;
        }
        Ok(())
    }
}

/// Infers the scale from the number of fractional digits, so the output of
/// `Display` parses back to an identical value.
impl FromStr for Decimal {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fraction_digits = s.split_once('.').map(|(_, f)| f.len()).unwrap_or(0);
        let scale =
            u8::try_from(fraction_digits).map_err(|_| DecimalError::InvalidFormat(s.to_string()))?;
        if scale > MAX_DECIMALS {
            return Err(DecimalError::Precision {
                value: s.to_string(),
                scale: MAX_DECIMALS,
            });
        }
        Decimal::parse(s, scale)
    }
}
