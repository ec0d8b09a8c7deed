//! Fixed-point conversion between token units and natural units.
//!
//! The token contract only manipulates natural units: integers scaled by
//! `10^decimals`. People think in token units. [`DisplayAmount`] is an exact
//! decimal (no floating point anywhere) and [`UnitConverter`] moves between the two.
//!
//! Inputs with more fractional digits than `decimals` are rejected with
//! [`AmountError::PrecisionLoss`] rather than truncated.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest `decimals` for which `10^decimals` fits in a `U256`.
pub const MAX_DECIMALS: u8 = 77;

/// Errors from amount parsing and conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Conversion would discard significant fractional digits.
    #[error("precision loss: {amount} has {scale} fractional digits, only {decimals} supported")]
    PrecisionLoss {
        amount: String,
        scale: u8,
        decimals: u8,
    },

    /// The value does not fit in 256 bits.
    #[error("amount overflows 256 bits")]
    Overflow,

    /// Not a non-negative decimal number.
    #[error("invalid amount '{0}'")]
    Invalid(String),

    /// `10^decimals` is not representable.
    #[error("unsupported decimals {0} (max 77)")]
    UnsupportedDecimals(u8),
}

/// Exact non-negative decimal: `mantissa * 10^-scale`.
///
/// Always normalised (no trailing fractional zeros), so equal values compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayAmount {
    mantissa: U256,
    scale: u8,
}

impl DisplayAmount {
    /// Zero token units.
    pub const ZERO: Self = Self {
        mantissa: U256::ZERO,
        scale: 0,
    };

    /// Build `mantissa * 10^-scale`, normalising trailing zeros away.
    pub fn new(mantissa: U256, scale: u8) -> Self {
        let ten = U256::from(10u8);
        let mut mantissa = mantissa;
        let mut scale = scale;
        while scale > 0 && (mantissa % ten).is_zero() {
            mantissa /= ten;
            scale -= 1;
        }
        Self { mantissa, scale }
    }

    /// Unscaled digits.
    pub fn mantissa(&self) -> U256 {
        self.mantissa
    }

    /// Number of fractional digits.
    pub fn scale(&self) -> u8 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }
}

impl From<U256> for DisplayAmount {
    fn from(value: U256) -> Self {
        Self::new(value, 0)
    }
}

impl From<u64> for DisplayAmount {
    fn from(value: u64) -> Self {
        Self::new(U256::from(value), 0)
    }
}

impl FromStr for DisplayAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || AmountError::Invalid(s.to_string());

        let (int_part, frac_part) = match trimmed.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (trimmed, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(invalid());
        }

        let frac_part = frac_part.trim_end_matches('0');
        let scale = u8::try_from(frac_part.len()).map_err(|_| AmountError::Overflow)?;

        let digits = format!("{}{}", int_part, frac_part);
        let mantissa = if digits.is_empty() {
            U256::ZERO
        } else {
            U256::from_str_radix(&digits, 10).map_err(|_| AmountError::Overflow)?
        };

        Ok(Self::new(mantissa, scale))
    }
}

impl TryFrom<String> for DisplayAmount {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DisplayAmount> for String {
    fn from(value: DisplayAmount) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DisplayAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.to_string();
        let scale = usize::from(self.scale);
        if scale == 0 {
            return f.write_str(&digits);
        }

        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{}.{}", int_part, frac_part)
    }
}

/// Converts between token units and natural units for a fixed number of decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitConverter {
    decimals: u8,
    scaling: U256,
}

impl UnitConverter {
    /// Converter for `decimals` decimal places.
    pub fn new(decimals: u8) -> Result<Self, AmountError> {
        if decimals > MAX_DECIMALS {
            return Err(AmountError::UnsupportedDecimals(decimals));
        }
        Ok(Self {
            decimals,
            scaling: pow10(decimals),
        })
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// `10^decimals`.
    pub fn scaling(&self) -> U256 {
        self.scaling
    }

    /// Token units to natural units.
    pub fn to_natural_unit(&self, amount: &DisplayAmount) -> Result<U256, AmountError> {
        if amount.scale > self.decimals {
            return Err(AmountError::PrecisionLoss {
                amount: amount.to_string(),
                scale: amount.scale,
                decimals: self.decimals,
            });
        }

        amount
            .mantissa
            .checked_mul(pow10(self.decimals - amount.scale))
            .ok_or(AmountError::Overflow)
    }

    /// Natural units to token units. Exact for every input.
    pub fn to_token_unit(&self, natural: U256) -> DisplayAmount {
        DisplayAmount::new(natural, self.decimals)
    }
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self {
            decimals: 18,
            scaling: pow10(18),
        }
    }
}

fn pow10(exp: u8) -> U256 {
    U256::from(10u8).pow(U256::from(exp))
}
