use crate::error::TypesError;
use std::fmt;
use std::str::FromStr;

/// Non-negative fixed-point token quantity.
///
/// Stored as a `u128` count of base units with [`Amount::DECIMALS`]
/// fractional digits, so `Amount::from(1u64)` is `10^18` base units.
/// Arithmetic is checked; there is no wrapping or panicking operator.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u128);

impl Amount {
    /// Number of fractional digits
    pub const DECIMALS: u32 = 18;

    /// Base units per whole token (10^18)
    pub const SCALE: u128 = 10u128.pow(Self::DECIMALS);

    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(Self::SCALE);
    pub const MAX: Self = Self(u128::MAX);

    /// Wrap a raw base-unit count.
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// Raw base-unit count.
    pub const fn raw(&self) -> u128 {
        self.0
    }

    /// Whole tokens, with the fractional part truncated.
    pub const fn whole(&self) -> u128 {
        self.0 / Self::SCALE
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Whole tokens to amount.
    pub fn from_whole(units: u128) -> Result<Self, TypesError> {
        units
            .checked_mul(Self::SCALE)
            .map(Self)
            .ok_or(TypesError::AmountOverflow)
    }

    /// Convert a float such as a JSON number `0.5`.
    ///
    /// Goes through the shortest decimal rendering of the float, so `0.1`
    /// becomes exactly one tenth rather than its binary approximation.
    pub fn from_f64(value: f64) -> Result<Self, TypesError> {
        if !value.is_finite() || value < 0.0 {
            return Err(TypesError::InvalidAmount(value.to_string()));
        }
        value.to_string().parse()
    }

    pub fn checked_add(&self, rhs: &Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(&self, rhs: &Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Addition that reports overflow as an error.
    pub fn try_add(&self, rhs: &Self) -> Result<Self, TypesError> {
        self.checked_add(rhs).ok_or(TypesError::AmountOverflow)
    }

    /// Subtraction that reports underflow as an error.
    pub fn try_sub(&self, rhs: &Self) -> Result<Self, TypesError> {
        self.checked_sub(rhs).ok_or(TypesError::AmountUnderflow)
    }
}

impl From<u64> for Amount {
    fn from(units: u64) -> Self {
        // u64::MAX * 10^18 < u128::MAX
        Self(units as u128 * Self::SCALE)
    }
}

impl From<u32> for Amount {
    fn from(units: u32) -> Self {
        Self::from(units as u64)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::SCALE;
        let frac = self.0 % Self::SCALE;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:0width$}", frac, width = Self::DECIMALS as usize);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self)
    }
}

impl FromStr for Amount {
    type Err = TypesError;

    /// Accepts `200`, `0.5`, `.5`, `10_000` and `1_000.25`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s.trim().chars().filter(|c| *c != '_').collect();
        let invalid = || TypesError::InvalidAmount(s.to_string());

        let (int_part, frac_part) = match cleaned.split_once('.') {
            Some((i, f)) => (i, f),
            None => (cleaned.as_str(), ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        if frac_part.len() > Self::DECIMALS as usize {
            // Trailing zeros beyond the precision are harmless.
            let (kept, rest) = frac_part.split_at(Self::DECIMALS as usize);
            if rest.chars().any(|c| c != '0') {
                return Err(TypesError::AmountPrecision {
                    value: s.to_string(),
                    max: Self::DECIMALS,
                });
            }
            return parse_parts(int_part, kept);
        }
        parse_parts(int_part, frac_part)
    }
}

fn parse_parts(int_part: &str, frac_part: &str) -> Result<Amount, TypesError> {
    let whole: u128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| TypesError::AmountOverflow)?
    };
    let frac: u128 = if frac_part.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac_part, width = Amount::DECIMALS as usize);
        padded
            .parse()
            .map_err(|_| TypesError::InvalidAmount(frac_part.to_string()))?
    };
    whole
        .checked_mul(Amount::SCALE)
        .and_then(|v| v.checked_add(frac))
        .map(Amount)
        .ok_or(TypesError::AmountOverflow)
}
