//! Scaled numbers: `mantissa × 10^exponent`, with exponents kept on a grid of
//! multiples of 3 so every value lines up with a K/M/B/T… display group.
//!
//! All arithmetic is total. Values are immutable; every operation returns a
//! new `ScaledNumber`.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Operands whose exponents differ by more than this are not summed:
/// the smaller one is dropped entirely.
pub const ADD_PRECISION_LIMIT: i32 = 9;

/// Display suffix per exponent group (index = exponent / 3).
const SUFFIXES: [&str; 12] = [
    "", "K", "M", "B", "T", "Qa", "Qi", "Sx", "Sp", "Oc", "No", "Dc",
];

/// A non-negative magnitude that can span many orders of decimal scale.
///
/// After [`ScaledNumber::normalize`] the mantissa is typically in `[1, 1000)`
/// and the exponent is a multiple of 3. The one exception is the canonical
/// zero `{0, 0}`, which doubles as the "destroyed" sentinel for hit points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaledNumber {
    pub mantissa: f64,
    pub exponent: i32,
}

impl ScaledNumber {
    pub const ZERO: ScaledNumber = ScaledNumber {
        mantissa: 0.0,
        exponent: 0,
    };

    /// Build a raw (un-normalized) value.
    pub const fn new(mantissa: f64, exponent: i32) -> Self {
        Self { mantissa, exponent }
    }

    /// A bare scaled integer `{n, 0}`, left un-normalized.
    pub fn from_count(n: u32) -> Self {
        Self::new(n as f64, 0)
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa == 0.0
    }

    #[cfg(test)]
    pub(crate) fn to_f64(&self) -> f64 {
        self.mantissa * 10f64.powi(self.exponent)
    }

    /// Bring the value onto the 3-exponent grid.
    ///
    /// The mantissa is first scaled into `[1, 10)` (scaling up only while the
    /// exponent stays positive), then the exponent is snapped down to the
    /// nearest multiple of 3 and the mantissa multiplied to compensate.
    /// Negative mantissas always sink to exponent 0, which keeps
    /// `compare(x, ZERO)` sign-correct for subtraction results.
    pub fn normalize(self) -> Self {
        if self.mantissa == 0.0 {
            return Self::ZERO;
        }
        if !self.mantissa.is_finite() || self.is_canonical() {
            return self;
        }

        let mut mantissa = self.mantissa;
        let mut exponent = self.exponent;

        while mantissa >= 10.0 {
            mantissa /= 10.0;
            exponent += 1;
        }
        while mantissa < 1.0 && exponent > 0 {
            mantissa *= 10.0;
            exponent -= 1;
        }

        let remainder = exponent.rem_euclid(3);
        if remainder != 0 {
            mantissa *= 10f64.powi(remainder);
            exponent -= remainder;
        }

        Self { mantissa, exponent }
    }

    /// Already on the grid with a mantissa in `[1, 1000)`. Such values are
    /// fixed points of `normalize`, so re-normalizing never drifts them.
    fn is_canonical(&self) -> bool {
        self.exponent.rem_euclid(3) == 0 && (1.0..1000.0).contains(&self.mantissa)
    }

    /// Exponent first, mantissa as tiebreaker.
    ///
    /// A larger exponent always wins regardless of mantissa, which is only
    /// meaningful for normalized values.
    pub fn compare(&self, other: &Self) -> Ordering {
        if self.exponent != other.exponent {
            return self.exponent.cmp(&other.exponent);
        }
        self.mantissa
            .partial_cmp(&other.mantissa)
            .unwrap_or(Ordering::Equal)
    }

    /// Scale only the mantissa by a plain factor, keeping the exponent as is.
    pub fn scale_mantissa(self, factor: f64) -> Self {
        Self::new(self.mantissa * factor, self.exponent)
    }
}

impl Default for ScaledNumber {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PartialOrd for ScaledNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Add for ScaledNumber {
    type Output = ScaledNumber;

    fn add(self, rhs: ScaledNumber) -> ScaledNumber {
        if self.mantissa == 0.0 {
            return rhs;
        }
        if rhs.mantissa == 0.0 {
            return self;
        }

        let diff = self.exponent.saturating_sub(rhs.exponent);
        if diff.abs() > ADD_PRECISION_LIMIT {
            return if diff > 0 { self } else { rhs };
        }

        let (mantissa, exponent) = if diff >= 0 {
            (
                self.mantissa + rhs.mantissa / 10f64.powi(diff),
                self.exponent,
            )
        } else {
            (
                self.mantissa / 10f64.powi(-diff) + rhs.mantissa,
                rhs.exponent,
            )
        };

        ScaledNumber::new(mantissa, exponent).normalize()
    }
}

impl Neg for ScaledNumber {
    type Output = ScaledNumber;

    fn neg(self) -> ScaledNumber {
        ScaledNumber::new(-self.mantissa, self.exponent)
    }
}

impl Sub for ScaledNumber {
    type Output = ScaledNumber;

    /// May produce a negative mantissa; callers clamp where that is invalid.
    fn sub(self, rhs: ScaledNumber) -> ScaledNumber {
        (self + -rhs).normalize()
    }
}

impl Mul for ScaledNumber {
    type Output = ScaledNumber;

    fn mul(self, rhs: ScaledNumber) -> ScaledNumber {
        ScaledNumber::new(
            self.mantissa * rhs.mantissa,
            self.exponent.saturating_add(rhs.exponent),
        )
        .normalize()
    }
}

impl fmt::Display for ScaledNumber {
    /// `0`, `12.50`, `1.50K`, `3.00M`… or `4.20e40` past the suffix table.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mantissa == 0.0 {
            return write!(f, "0");
        }
        let suffix = if self.exponent >= 0 && self.exponent % 3 == 0 {
            SUFFIXES.get((self.exponent / 3) as usize)
        } else {
            None
        };
        match suffix {
            Some(s) => write!(f, "{:.2}{}", self.mantissa, s),
            None => write!(f, "{:.2}e{}", self.mantissa, self.exponent),
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_scaled() -> impl Strategy<Value = ScaledNumber> {
        (1u32..1_000_000, 0i32..40).prop_map(|(m, e)| ScaledNumber::new(m as f64, e))
    }

    /// Anything `Sub` or a hand-edited save can produce: fractions below 1,
    /// negatives and negative exponents alongside ordinary values.
    fn arb_raw() -> impl Strategy<Value = ScaledNumber> {
        let mantissa = prop_oneof![
            1e-6f64..1.0,
            -1e6f64..-1e-3,
            1.0f64..1e6,
            (1u32..1_000_000).prop_map(|m| m as f64),
        ];
        (mantissa, -30i32..40).prop_map(|(m, e)| ScaledNumber::new(m, e))
    }

    fn close(a: ScaledNumber, b: ScaledNumber) -> bool {
        a.exponent == b.exponent
            && (a.mantissa - b.mantissa).abs() <= 1e-9 * a.mantissa.abs().max(1.0)
    }

    proptest! {
        #[test]
        fn prop_normalize_idempotent(n in arb_raw()) {
            let once = n.normalize();
            prop_assert_eq!(once.normalize(), once);
        }

        #[test]
        fn prop_normalize_negative_sinks_to_exponent_zero(
            m in -1e6f64..-1e-3,
            e in 0i32..40,
        ) {
            let norm = ScaledNumber::new(m, e).normalize();
            prop_assert_eq!(norm.exponent, 0);
            prop_assert!(norm < ScaledNumber::ZERO);
        }

        #[test]
        fn prop_normalize_on_grid(n in arb_scaled()) {
            let norm = n.normalize();
            prop_assert_eq!(norm.exponent.rem_euclid(3), 0);
            prop_assert!(norm.mantissa >= 1.0 && norm.mantissa < 1000.0 + 1e-9,
                "mantissa out of range: {:?}", norm);
        }

        #[test]
        fn prop_zero_absorption(n in arb_scaled()) {
            prop_assert_eq!(n + ScaledNumber::ZERO, n);
            prop_assert_eq!(ScaledNumber::ZERO + n, n);
        }

        #[test]
        fn prop_larger_exponent_wins(
            m1 in 1.0f64..1000.0,
            m2 in 1.0f64..1000.0,
            e in 0i32..30,
            step in 1i32..10,
        ) {
            let small = ScaledNumber::new(m1, e * 3);
            let big = ScaledNumber::new(m2, (e + step) * 3);
            prop_assert_eq!(big.compare(&small), Ordering::Greater);
            prop_assert_eq!(small.compare(&big), Ordering::Less);
        }

        #[test]
        fn prop_add_is_commutative(a in arb_scaled(), b in arb_scaled()) {
            prop_assert!(close(a + b, b + a));
        }

        #[test]
        fn prop_add_never_shrinks(a in arb_scaled(), b in arb_scaled()) {
            let a = a.normalize();
            prop_assert_ne!((a + b).compare(&a), Ordering::Less);
        }
    }
}
