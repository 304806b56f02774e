//! Exact rational numbers.

use num_integer::Integer;
use num_traits::{One, Zero};
use std::{
    fmt::{self, Display, Formatter},
    ops::{Add, AddAssign, Div, Mul, MulAssign, Neg},
};

/// A rational number which is always kept in lowest terms.
///
/// The denominator is always positive and zero is always represented as
/// `0/1`, so two fractions are equal exactly when their fields are equal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Fraction {
    numerator: i64,
    denominator: i64,
}

impl Fraction {
    /// Create a new [`Fraction`], reducing it to lowest terms.
    ///
    /// # Panics
    ///
    /// The denominator must not be zero, and the reduced fraction must fit
    /// in an `i64` (only `i64::MIN / -1` doesn't).
    pub fn new(numerator: i64, denominator: i64) -> Self {
        Fraction::reduced(i128::from(numerator), i128::from(denominator))
            .expect("The reduced fraction doesn't fit in an i64")
    }

    pub const fn from_integer(value: i64) -> Self {
        Fraction {
            numerator: value,
            denominator: 1,
        }
    }

    pub const fn numerator(self) -> i64 { self.numerator }

    pub const fn denominator(self) -> i64 { self.denominator }

    pub fn is_integer(self) -> bool { self.denominator == 1 }

    /// Get `1/self`.
    ///
    /// # Panics
    ///
    /// Zero has no reciprocal. Row reduction only ever inverts pivots, so
    /// hitting this means the elimination logic is broken.
    pub fn recip(self) -> Self {
        self.checked_recip()
            .expect("The reciprocal doesn't fit in an i64")
    }

    /// `1/self`, or `None` if the result doesn't fit in an `i64`.
    ///
    /// # Panics
    ///
    /// Zero has no reciprocal.
    pub fn checked_recip(self) -> Option<Self> {
        assert!(!self.is_zero(), "Attempted to take the reciprocal of zero");
        Fraction::reduced(wide(self.denominator), wide(self.numerator))
    }

    pub fn checked_add(self, rhs: Fraction) -> Option<Self> {
        // |n| and d are both at most 2^63, so none of this overflows an i128
        let numerator = wide(self.numerator) * wide(rhs.denominator)
            + wide(rhs.numerator) * wide(self.denominator);
        let denominator = wide(self.denominator) * wide(rhs.denominator);

        Fraction::reduced(numerator, denominator)
    }

    pub fn checked_mul(self, rhs: Fraction) -> Option<Self> {
        Fraction::reduced(
            wide(self.numerator) * wide(rhs.numerator),
            wide(self.denominator) * wide(rhs.denominator),
        )
    }

    pub fn checked_mul_int(self, scalar: i64) -> Option<Self> {
        self.checked_mul(Fraction::from_integer(scalar))
    }

    /// # Panics
    ///
    /// Dividing by zero is a bug in the caller.
    pub fn checked_div(self, rhs: Fraction) -> Option<Self> {
        assert!(!rhs.is_zero(), "Attempted to divide by zero");
        Fraction::reduced(
            wide(self.numerator) * wide(rhs.denominator),
            wide(self.denominator) * wide(rhs.numerator),
        )
    }

    pub fn checked_neg(self) -> Option<Self> {
        Some(Fraction {
            numerator: self.numerator.checked_neg()?,
            denominator: self.denominator,
        })
    }

    /// Bring a fraction into lowest terms with a positive denominator,
    /// returning `None` when the result can't be stored in an `i64`.
    fn reduced(numerator: i128, denominator: i128) -> Option<Self> {
        assert!(denominator != 0, "A fraction can't have a zero denominator");

        if numerator == 0 {
            return Some(Fraction::zero());
        }

        let divisor = numerator.gcd(&denominator);
        let (mut numerator, mut denominator) =
            (numerator / divisor, denominator / divisor);

        if denominator < 0 {
            numerator = -numerator;
            denominator = -denominator;
        }

        Some(Fraction {
            numerator: i64::try_from(numerator).ok()?,
            denominator: i64::try_from(denominator).ok()?,
        })
    }
}

fn wide(value: i64) -> i128 { i128::from(value) }

impl Default for Fraction {
    fn default() -> Self { Fraction::zero() }
}

impl From<i64> for Fraction {
    fn from(value: i64) -> Self { Fraction::from_integer(value) }
}

impl Zero for Fraction {
    fn zero() -> Self { Fraction::from_integer(0) }

    fn is_zero(&self) -> bool { self.numerator == 0 }
}

impl One for Fraction {
    fn one() -> Self { Fraction::from_integer(1) }
}

// The operators panic on overflow, the same as the primitive integers do in
// debug builds. Anything working with user input uses the checked methods.

impl Add for Fraction {
    type Output = Fraction;

    fn add(self, rhs: Fraction) -> Fraction {
        self.checked_add(rhs).expect("Fraction addition overflowed")
    }
}

impl AddAssign for Fraction {
    fn add_assign(&mut self, rhs: Fraction) { *self = *self + rhs; }
}

impl Mul for Fraction {
    type Output = Fraction;

    fn mul(self, rhs: Fraction) -> Fraction {
        self.checked_mul(rhs)
            .expect("Fraction multiplication overflowed")
    }
}

impl Mul<i64> for Fraction {
    type Output = Fraction;

    fn mul(self, scalar: i64) -> Fraction {
        self.checked_mul_int(scalar)
            .expect("Fraction multiplication overflowed")
    }
}

impl MulAssign for Fraction {
    fn mul_assign(&mut self, rhs: Fraction) { *self = *self * rhs; }
}

impl MulAssign<i64> for Fraction {
    fn mul_assign(&mut self, scalar: i64) { *self = *self * scalar; }
}

impl Div for Fraction {
    type Output = Fraction;

    fn div(self, rhs: Fraction) -> Fraction {
        self.checked_div(rhs).expect("Fraction division overflowed")
    }
}

impl Neg for Fraction {
    type Output = Fraction;

    fn neg(self) -> Fraction {
        self.checked_neg().expect("Fraction negation overflowed")
    }
}

impl Display for Fraction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_integer() {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frac(numerator: i64, denominator: i64) -> Fraction {
        Fraction::new(numerator, denominator)
    }

    #[test]
    fn construction_normalizes() {
        let inputs = vec![
            ((2, 4), (1, 2)),
            ((-2, 4), (-1, 2)),
            ((2, -4), (-1, 2)),
            ((-2, -4), (1, 2)),
            ((0, -7), (0, 1)),
            ((0, 5), (0, 1)),
            ((9, 3), (3, 1)),
            ((7, 13), (7, 13)),
        ];

        for ((n, d), (numerator, denominator)) in inputs {
            let got = frac(n, d);

            assert_eq!(got.numerator(), numerator, "{}/{}", n, d);
            assert_eq!(got.denominator(), denominator, "{}/{}", n, d);
        }
    }

    #[test]
    fn normalized_fractions_uphold_their_invariants() {
        for n in -12..=12 {
            for d in (-12..=12).filter(|d| *d != 0) {
                let got = frac(n, d);

                assert!(got.denominator() > 0, "{}/{} -> {:?}", n, d, got);
                assert_eq!(
                    got.numerator().abs().gcd(&got.denominator()),
                    1,
                    "{}/{} -> {:?}",
                    n,
                    d,
                    got
                );
                if n == 0 {
                    assert_eq!(got.denominator(), 1);
                }
            }
        }
    }

    #[test]
    fn addition() {
        assert_eq!(frac(1, 2) + frac(1, 3), frac(5, 6));
        assert_eq!(frac(1, 2) + frac(-1, 2), Fraction::zero());
        assert_eq!(frac(-3, 4) + frac(1, 4), frac(-1, 2));
        assert_eq!(frac(5, 1) + frac(2, 3), frac(17, 3));
    }

    #[test]
    fn multiplication() {
        assert_eq!(frac(2, 3) * frac(3, 4), frac(1, 2));
        assert_eq!(frac(-2, 3) * frac(3, -4), frac(1, 2));
        assert_eq!(frac(2, 3) * 6, frac(4, 1));
        assert_eq!(frac(2, 3) * 0, Fraction::zero());
    }

    #[test]
    fn arithmetic_is_commutative_and_associative() {
        let values = [frac(1, 2), frac(-2, 3), frac(5, 7), frac(4, 1)];

        for &a in &values {
            for &b in &values {
                assert_eq!(a + b, b + a);
                assert_eq!(a * b, b * a);

                for &c in &values {
                    assert_eq!((a + b) + c, a + (b + c));
                    assert_eq!((a * b) * c, a * (b * c));
                }
            }
        }
    }

    #[test]
    fn a_fraction_times_its_reciprocal_is_one() {
        for &value in &[frac(1, 2), frac(-2, 3), frac(7, 1), frac(-1, 9)] {
            assert_eq!(value * value.recip(), Fraction::one());
        }
    }

    #[test]
    #[should_panic(expected = "reciprocal of zero")]
    fn zero_has_no_reciprocal() { let _ = Fraction::zero().recip(); }

    #[test]
    fn checked_arithmetic_reports_overflow() {
        let big = Fraction::from(i64::MAX);

        assert_eq!(big.checked_add(Fraction::from(1)), None);
        assert_eq!(big.checked_mul_int(2), None);
        assert_eq!(big.checked_div(frac(1, 2)), None);
        assert_eq!(Fraction::from(i64::MIN).checked_neg(), None);
        assert_eq!(frac(1, i64::MAX).checked_mul(frac(1, 2)), None);
    }

    #[test]
    fn intermediate_values_may_exceed_an_i64() {
        let big = Fraction::from(i64::MAX);

        assert_eq!(big.checked_mul(frac(2, 4)).unwrap(), frac(i64::MAX, 2));
        assert_eq!(
            frac(i64::MAX, 3).checked_add(frac(-i64::MAX, 3)).unwrap(),
            Fraction::zero()
        );
        assert_eq!(big.checked_div(big).unwrap(), Fraction::one());
        assert_eq!(frac(1, i64::MAX).checked_recip().unwrap(), big);
    }

    #[test]
    fn display() {
        let inputs = vec![
            (frac(3, 1), "3"),
            (frac(-3, 1), "-3"),
            (frac(1, 2), "1/2"),
            (frac(-4, 6), "-2/3"),
            (Fraction::zero(), "0"),
        ];

        for (value, should_be) in inputs {
            assert_eq!(value.to_string(), should_be);
        }
    }
}
