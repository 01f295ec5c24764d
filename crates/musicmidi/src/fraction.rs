//! Exact non-negative rationals for beat offsets and note values.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul};

use serde::{Deserialize, Serialize};

/// Longest decimal fraction accepted by [`Fraction::parse_decimal`].
const MAX_DECIMAL_DIGITS: usize = 6;

/// A reduced fraction `numerator / denominator` with a nonzero denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fraction {
    numerator: u64,
    denominator: u64,
}

impl Fraction {
    pub const ZERO: Fraction = Fraction {
        numerator: 0,
        denominator: 1,
    };

    pub const ONE: Fraction = Fraction {
        numerator: 1,
        denominator: 1,
    };

    /// A zero denominator is treated as one.
    pub fn new(numerator: u64, denominator: u64) -> Self {
        Self::reduced(numerator as u128, denominator.max(1) as u128)
    }

    pub fn from_integer(value: u64) -> Self {
        Fraction {
            numerator: value,
            denominator: 1,
        }
    }

    fn reduced(numerator: u128, denominator: u128) -> Self {
        let divisor = gcd(numerator, denominator).max(1);
        Fraction {
            numerator: (numerator / divisor) as u64,
            denominator: (denominator / divisor) as u64,
        }
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    pub fn checked_sub(self, other: Fraction) -> Option<Fraction> {
        let left = self.numerator as u128 * other.denominator as u128;
        let right = other.numerator as u128 * self.denominator as u128;
        let denominator = self.denominator as u128 * other.denominator as u128;
        left.checked_sub(right)
            .map(|numerator| Self::reduced(numerator, denominator))
    }

    /// Integer part.
    pub fn floor(self) -> u64 {
        self.numerator / self.denominator
    }

    /// Fractional part, always below one.
    pub fn fract(self) -> Fraction {
        Fraction::new(self.numerator % self.denominator, self.denominator)
    }

    /// Nearest integer, halves rounded up.
    pub fn round(self) -> u64 {
        (2 * self.numerator as u128 + self.denominator as u128) as u64
            / (2 * self.denominator)
    }

    /// Parse `"2"`, `"2.5"` or `"2.125"` exactly.
    pub fn parse_decimal(text: &str) -> Option<Fraction> {
        let (whole, fraction) = match text.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (text, ""),
        };
        if whole.is_empty()
            || fraction.len() > MAX_DECIMAL_DIGITS
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        let whole: u64 = whole.parse().ok()?;
        if fraction.is_empty() {
            return Some(Fraction::from_integer(whole));
        }
        let scale = 10u64.pow(fraction.len() as u32);
        let digits: u64 = fraction.parse().ok()?;
        Some(Fraction::new(whole.checked_mul(scale)?.checked_add(digits)?, scale))
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Fraction::ZERO
    }
}

impl Add for Fraction {
    type Output = Fraction;

    fn add(self, other: Fraction) -> Fraction {
        Fraction::reduced(
            self.numerator as u128 * other.denominator as u128
                + other.numerator as u128 * self.denominator as u128,
            self.denominator as u128 * other.denominator as u128,
        )
    }
}

impl Mul for Fraction {
    type Output = Fraction;

    fn mul(self, other: Fraction) -> Fraction {
        Fraction::reduced(
            self.numerator as u128 * other.numerator as u128,
            self.denominator as u128 * other.denominator as u128,
        )
    }
}

impl Div for Fraction {
    type Output = Fraction;

    /// Division by zero yields zero.
    fn div(self, other: Fraction) -> Fraction {
        if other.is_zero() {
            return Fraction::ZERO;
        }
        Fraction::reduced(
            self.numerator as u128 * other.denominator as u128,
            self.denominator as u128 * other.numerator as u128,
        )
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        let left = self.numerator as u128 * other.denominator as u128;
        let right = other.numerator as u128 * self.denominator as u128;
        left.cmp(&right)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}
