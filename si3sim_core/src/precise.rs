//! High-precision decimal numbers for frequency and drift-rate math.
//!
//! Values are parsed from and printed to decimal strings without passing
//! through binary floating point, so `"-2753484.340"` comes back out as
//! `"-2753484.340"`. Addition, subtraction and multiplication are exact.

use crate::{Error, Result};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

/// Arbitrary-precision decimal value
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Precise(BigDecimal);

impl Default for Precise {
    fn default() -> Self {
        Precise(BigDecimal::zero())
    }
}

impl Precise {
    /// `mantissa * 10^-scale`, e.g. `from_scaled(-2753484340, 3)` is `-2753484.340`
    pub fn from_scaled(mantissa: i64, scale: i64) -> Self {
        Precise(BigDecimal::new(BigInt::from(mantissa), scale))
    }

    /// Exact number of seconds represented by a nanosecond count
    pub fn from_nanos(nanos: i64) -> Self {
        Self::from_scaled(nanos, 9)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Fixed-point rendering with exactly `digits` fractional digits,
    /// rounding half away from zero.
    pub fn to_fixed(&self, digits: u32) -> String {
        let (mantissa, scale) = self.0.as_bigint_and_exponent();
        let target = i64::from(digits);

        let rescaled = if scale <= target {
            mantissa * power_of_ten(target - scale)
        } else {
            let divisor = power_of_ten(scale - target);
            let magnitude = mantissa.abs();
            let mut quotient = &magnitude / &divisor;
            let remainder = &magnitude % &divisor;
            if remainder * 2u32 >= divisor {
                quotient += 1u32;
            }
            if mantissa.is_negative() {
                -quotient
            } else {
                quotient
            }
        };

        plain_decimal(&rescaled, target)
    }
}

fn power_of_ten(exponent: i64) -> BigInt {
    num_traits::pow(BigInt::from(10u32), exponent.unsigned_abs() as usize)
}

/// Render `digits * 10^-scale` without exponent notation
fn plain_decimal(digits: &BigInt, scale: i64) -> String {
    let mut magnitude = digits.abs().to_string();

    let body = if scale <= 0 {
        if magnitude != "0" {
            magnitude.push_str(&"0".repeat(scale.unsigned_abs() as usize));
        }
        magnitude
    } else {
        let scale = scale as usize;
        if magnitude.len() <= scale {
            let padding = "0".repeat(scale + 1 - magnitude.len());
            magnitude.insert_str(0, &padding);
        }
        let point = magnitude.len() - scale;
        format!("{}.{}", &magnitude[..point], &magnitude[point..])
    };

    if digits.is_negative() {
        format!("-{}", body)
    } else {
        body
    }
}

impl FromStr for Precise {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(Error::parse("empty decimal string"));
        }
        BigDecimal::from_str(s)
            .map(Precise)
            .map_err(|e| Error::parse(format!("invalid decimal {:?}: {}", s, e)))
    }
}

impl fmt::Display for Precise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (digits, scale) = self.0.as_bigint_and_exponent();
        f.write_str(&plain_decimal(&digits, scale))
    }
}

impl From<i64> for Precise {
    fn from(value: i64) -> Self {
        Precise(BigDecimal::from(value))
    }
}

impl From<u32> for Precise {
    fn from(value: u32) -> Self {
        Precise(BigDecimal::from(value))
    }
}

impl Add for Precise {
    type Output = Precise;

    fn add(self, rhs: Precise) -> Precise {
        Precise(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a Precise> for &'a Precise {
    type Output = Precise;

    fn add(self, rhs: &'a Precise) -> Precise {
        Precise(&self.0 + &rhs.0)
    }
}

impl Sub for Precise {
    type Output = Precise;

    fn sub(self, rhs: Precise) -> Precise {
        Precise(self.0 - rhs.0)
    }
}

impl<'a> Sub<&'a Precise> for &'a Precise {
    type Output = Precise;

    fn sub(self, rhs: &'a Precise) -> Precise {
        Precise(&self.0 - &rhs.0)
    }
}

impl Mul for Precise {
    type Output = Precise;

    fn mul(self, rhs: Precise) -> Precise {
        Precise(self.0 * rhs.0)
    }
}

impl<'a> Mul<&'a Precise> for &'a Precise {
    type Output = Precise;

    fn mul(self, rhs: &'a Precise) -> Precise {
        Precise(&self.0 * &rhs.0)
    }
}

impl Serialize for Precise {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Precise {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
