//! The numeric tower: scalar representations behind one arithmetic interface.
//!
//! Every bound stored by the library rounds toward +infinity, so each
//! representation here must round that way whenever an operation is inexact.
//! Three representations are provided:
//!
//! * [`Rat`] (arbitrary-precision rationals) — every operation is exact. This
//!   is the representation to use when soundness matters.
//! * `i64` — machine integers with saturating arithmetic and ceiling
//!   division. Values at the representation's extremes saturate, which may
//!   lose soundness near `i64::MIN`/`i64::MAX`.
//! * `f64` — machine floating point. Addition, subtraction, multiplication
//!   and division use IEEE round-to-nearest and are therefore _not_
//!   directionally rounded; like the rest of the float-backed pieces of this
//!   library they are not ready for safety-critical use. The square-root
//!   helpers are the exception: IEEE `sqrt` is correctly rounded, so bumping
//!   its result one ulp outward yields a sound enclosure.
//!
//! Conversions between representations report whether they were exact.

use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigInt;
use num_integer::Roots;
use num_traits::{FromPrimitive, One, Signed, ToPrimitive, Zero};

/// Arbitrary-precision rational numbers, the exact representation.
pub type Rat = num_rational::BigRational;

/// A scalar number usable as the payload of a bound.
///
/// Implementations must make `add`, `sub`, `mul` and `div` round toward
/// +infinity whenever the mathematical result is not representable, because
/// every stored bound (upper bounds directly, lower bounds negated) rounds in
/// that direction.
pub trait Num: Clone + PartialEq + fmt::Debug + fmt::Display {
    /// The additive identity.
    fn zero() -> Self;

    /// The multiplicative identity.
    fn one() -> Self;

    /// Convert a machine integer.
    fn of_int(n: i64) -> Self;

    /// Total-order comparison.
    fn cmp_num(&self, other: &Self) -> Ordering;

    /// Sign of the number: the ordering of `self` against zero.
    fn sgn(&self) -> Ordering {
        self.cmp_num(&Self::zero())
    }

    /// Whether this is exactly zero.
    fn is_zero(&self) -> bool {
        self.sgn() == Ordering::Equal
    }

    /// Addition, rounding toward +infinity if inexact.
    fn add(&self, other: &Self) -> Self;

    /// Subtraction, rounding toward +infinity if inexact.
    fn sub(&self, other: &Self) -> Self;

    /// Multiplication, rounding toward +infinity if inexact.
    fn mul(&self, other: &Self) -> Self;

    /// Division by a nonzero divisor, rounding toward +infinity if inexact.
    fn div(&self, other: &Self) -> Self;

    /// Negation. Exact for every representation except saturated extremes.
    fn neg(&self) -> Self;

    /// Absolute value.
    fn abs(&self) -> Self {
        if self.sgn() == Ordering::Less {
            self.neg()
        } else {
            self.clone()
        }
    }

    /// Largest integer less than or equal to `self`.
    fn floor(&self) -> Self;

    /// Smallest integer greater than or equal to `self`.
    fn ceil(&self) -> Self;

    /// A lower bound on the square root of `self` (requires `self >= 0`).
    fn sqrt_down(&self) -> Self;

    /// An upper bound on the square root of `self` (requires `self >= 0`).
    fn sqrt_up(&self) -> Self;

    /// Whether the value is finite. Only `f64` can answer `false`.
    fn is_finite(&self) -> bool {
        true
    }

    /// The smaller of two numbers.
    fn min_num(self, other: Self) -> Self {
        if self.cmp_num(&other) == Ordering::Greater {
            other
        } else {
            self
        }
    }

    /// The larger of two numbers.
    fn max_num(self, other: Self) -> Self {
        if self.cmp_num(&other) == Ordering::Less {
            other
        } else {
            self
        }
    }

    /// Convert from a double; the flag reports whether the conversion was
    /// exact. Inexact conversions round toward +infinity.
    fn of_f64(x: f64) -> (Self, bool);

    /// Convert to a double; the flag reports whether the conversion was exact.
    fn to_f64(&self) -> (f64, bool);

    /// Convert from an arbitrary-precision integer.
    fn of_bigint(n: &BigInt) -> (Self, bool);

    /// Convert to an arbitrary-precision integer, rounding toward +infinity
    /// if inexact.
    fn to_bigint(&self) -> (BigInt, bool);

    /// Convert from an arbitrary-precision rational.
    fn of_rat(r: &Rat) -> (Self, bool);

    /// Convert to an arbitrary-precision rational.
    fn to_rat(&self) -> (Rat, bool);
}

impl Num for Rat {
    fn zero() -> Rat {
        Zero::zero()
    }

    fn one() -> Rat {
        One::one()
    }

    fn of_int(n: i64) -> Rat {
        Rat::from_integer(BigInt::from(n))
    }

    fn cmp_num(&self, other: &Rat) -> Ordering {
        Ord::cmp(self, other)
    }

    fn add(&self, other: &Rat) -> Rat {
        self + other
    }

    fn sub(&self, other: &Rat) -> Rat {
        self - other
    }

    fn mul(&self, other: &Rat) -> Rat {
        self * other
    }

    fn div(&self, other: &Rat) -> Rat {
        self / other
    }

    fn neg(&self) -> Rat {
        -self
    }

    fn abs(&self) -> Rat {
        Signed::abs(self)
    }

    fn floor(&self) -> Rat {
        Rat::floor(self)
    }

    fn ceil(&self) -> Rat {
        Rat::ceil(self)
    }

    fn sqrt_down(&self) -> Rat {
        // sqrt(p/q) = sqrt(p*q)/q, and the integer square root floors
        // exactly, so this stays a lower bound at any magnitude.
        if Signed::is_negative(self) {
            return Zero::zero();
        }
        let s = (self.numer() * self.denom()).sqrt();
        Rat::new(s, self.denom().clone())
    }

    fn sqrt_up(&self) -> Rat {
        if Signed::is_negative(self) {
            return Zero::zero();
        }
        let s = (self.numer() * self.denom()).sqrt();
        let down = Rat::new(s.clone(), self.denom().clone());
        if &down * &down == *self {
            down
        } else {
            Rat::new(s + BigInt::from(1), self.denom().clone())
        }
    }

    fn of_f64(x: f64) -> (Rat, bool) {
        match Rat::from_float(x) {
            Some(r) => (r, true),
            None => (Zero::zero(), false),
        }
    }

    fn to_f64(&self) -> (f64, bool) {
        let f = ToPrimitive::to_f64(self).unwrap_or(f64::INFINITY);
        let exact = Rat::from_float(f).map_or(false, |r| &r == self);
        (f, exact)
    }

    fn of_bigint(n: &BigInt) -> (Rat, bool) {
        (Rat::from_integer(n.clone()), true)
    }

    fn to_bigint(&self) -> (BigInt, bool) {
        (Rat::ceil(self).to_integer(), self.is_integer())
    }

    fn of_rat(r: &Rat) -> (Rat, bool) {
        (r.clone(), true)
    }

    fn to_rat(&self) -> (Rat, bool) {
        (self.clone(), true)
    }
}

impl Num for i64 {
    fn zero() -> i64 {
        0
    }

    fn one() -> i64 {
        1
    }

    fn of_int(n: i64) -> i64 {
        n
    }

    fn cmp_num(&self, other: &i64) -> Ordering {
        Ord::cmp(self, other)
    }

    fn add(&self, other: &i64) -> i64 {
        self.saturating_add(*other)
    }

    fn sub(&self, other: &i64) -> i64 {
        self.saturating_sub(*other)
    }

    fn mul(&self, other: &i64) -> i64 {
        self.saturating_mul(*other)
    }

    fn div(&self, other: &i64) -> i64 {
        // Ceiling division: div_euclid floors for positive divisors and
        // already ceils for negative ones.
        let q = self.div_euclid(*other);
        let r = self.rem_euclid(*other);
        if r != 0 && *other > 0 {
            q + 1
        } else {
            q
        }
    }

    fn neg(&self) -> i64 {
        self.checked_neg().unwrap_or(i64::MAX)
    }

    fn floor(&self) -> i64 {
        *self
    }

    fn ceil(&self) -> i64 {
        *self
    }

    fn sqrt_down(&self) -> i64 {
        let mut s = f64::sqrt(*self as f64) as i64;
        while (s as i128) * (s as i128) > *self as i128 {
            s -= 1;
        }
        while ((s + 1) as i128) * ((s + 1) as i128) <= *self as i128 {
            s += 1;
        }
        s
    }

    fn sqrt_up(&self) -> i64 {
        let s = self.sqrt_down();
        if (s as i128) * (s as i128) == *self as i128 {
            s
        } else {
            s + 1
        }
    }

    fn of_f64(x: f64) -> (i64, bool) {
        if !x.is_finite() {
            return (if x > 0.0 { i64::MAX } else { i64::MIN }, false);
        }
        let c = f64::ceil(x);
        if c < i64::MIN as f64 {
            (i64::MIN, false)
        } else if c > i64::MAX as f64 {
            (i64::MAX, false)
        } else {
            (c as i64, c == x)
        }
    }

    fn to_f64(&self) -> (f64, bool) {
        let f = *self as f64;
        (f, f as i64 == *self)
    }

    fn of_bigint(n: &BigInt) -> (i64, bool) {
        match n.to_i64() {
            Some(v) => (v, true),
            None => (
                if n.sign() == num_bigint::Sign::Minus {
                    i64::MIN
                } else {
                    i64::MAX
                },
                false,
            ),
        }
    }

    fn to_bigint(&self) -> (BigInt, bool) {
        (BigInt::from(*self), true)
    }

    fn of_rat(r: &Rat) -> (i64, bool) {
        let (v, int_exact) = i64::of_bigint(&Rat::ceil(r).to_integer());
        (v, int_exact && r.is_integer())
    }

    fn to_rat(&self) -> (Rat, bool) {
        (Rat::from_integer(BigInt::from(*self)), true)
    }
}

impl Num for f64 {
    fn zero() -> f64 {
        0.0
    }

    fn one() -> f64 {
        1.0
    }

    fn of_int(n: i64) -> f64 {
        n as f64
    }

    fn cmp_num(&self, other: &f64) -> Ordering {
        self.total_cmp(other)
    }

    fn sgn(&self) -> Ordering {
        // -0.0 is zero, which total_cmp would order below +0.0.
        if *self == 0.0 {
            Ordering::Equal
        } else {
            self.total_cmp(&0.0)
        }
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }

    fn add(&self, other: &f64) -> f64 {
        self + other
    }

    fn sub(&self, other: &f64) -> f64 {
        self - other
    }

    fn mul(&self, other: &f64) -> f64 {
        self * other
    }

    fn div(&self, other: &f64) -> f64 {
        self / other
    }

    fn neg(&self) -> f64 {
        -self
    }

    fn abs(&self) -> f64 {
        f64::abs(*self)
    }

    fn floor(&self) -> f64 {
        f64::floor(*self)
    }

    fn ceil(&self) -> f64 {
        f64::ceil(*self)
    }

    fn sqrt_down(&self) -> f64 {
        // IEEE sqrt is correctly rounded, so one outward ulp is a sound
        // lower bound.
        f64::max(f64::sqrt(*self).next_down(), 0.0)
    }

    fn sqrt_up(&self) -> f64 {
        f64::sqrt(*self).next_up()
    }

    fn is_finite(&self) -> bool {
        f64::is_finite(*self)
    }

    fn of_f64(x: f64) -> (f64, bool) {
        (x, true)
    }

    fn to_f64(&self) -> (f64, bool) {
        (*self, true)
    }

    fn of_bigint(n: &BigInt) -> (f64, bool) {
        let f = n.to_f64().unwrap_or(f64::INFINITY);
        let exact = BigInt::from_f64(f).map_or(false, |b| &b == n);
        (f, exact)
    }

    fn to_bigint(&self) -> (BigInt, bool) {
        if !f64::is_finite(*self) {
            return (BigInt::from(0), false);
        }
        let c = f64::ceil(*self);
        (
            BigInt::from_f64(c).unwrap_or_else(|| BigInt::from(0)),
            c == *self,
        )
    }

    fn of_rat(r: &Rat) -> (f64, bool) {
        let f = ToPrimitive::to_f64(r).unwrap_or(f64::INFINITY);
        let exact = Rat::from_float(f).map_or(false, |back| &back == r);
        (f, exact)
    }

    fn to_rat(&self) -> (Rat, bool) {
        match Rat::from_float(*self) {
            Some(r) => (r, true),
            None => (Zero::zero(), false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rat_arithmetic_is_exact() {
        let a = Rat::new(BigInt::from(1), BigInt::from(3));
        let b = Rat::new(BigInt::from(1), BigInt::from(6));
        assert_eq!(a.add(&b), Rat::new(BigInt::from(1), BigInt::from(2)));
        assert_eq!(a.sub(&b), b);
        assert_eq!(a.mul(&b), Rat::new(BigInt::from(1), BigInt::from(18)));
        assert_eq!(a.div(&b), <Rat as Num>::of_int(2));
    }

    #[test]
    fn rat_floor_ceil() {
        let a = Rat::new(BigInt::from(7), BigInt::from(2));
        assert_eq!(Num::floor(&a), <Rat as Num>::of_int(3));
        assert_eq!(Num::ceil(&a), <Rat as Num>::of_int(4));
        let b = Rat::new(BigInt::from(-7), BigInt::from(2));
        assert_eq!(Num::floor(&b), <Rat as Num>::of_int(-4));
        assert_eq!(Num::ceil(&b), <Rat as Num>::of_int(-3));
    }

    #[test]
    fn int_division_rounds_up() {
        assert_eq!(Num::div(&7i64, &2), 4);
        assert_eq!(Num::div(&-7i64, &2), -3);
        assert_eq!(Num::div(&7i64, &-2), -3);
        assert_eq!(Num::div(&6i64, &2), 3);
    }

    #[test]
    fn int_sqrt_bounds() {
        assert_eq!(10i64.sqrt_down(), 3);
        assert_eq!(10i64.sqrt_up(), 4);
        assert_eq!(9i64.sqrt_down(), 3);
        assert_eq!(9i64.sqrt_up(), 3);
        assert_eq!(0i64.sqrt_down(), 0);
    }

    #[test]
    fn conversions_report_exactness() {
        let (r, exact) = <Rat as Num>::of_f64(0.5);
        assert!(exact);
        assert_eq!(r, Rat::new(BigInt::from(1), BigInt::from(2)));

        let third = Rat::new(BigInt::from(1), BigInt::from(3));
        let (_, exact) = Num::to_f64(&third);
        assert!(!exact);

        let (i, exact) = <i64 as Num>::of_f64(2.5);
        assert_eq!(i, 3);
        assert!(!exact);
    }

    #[test]
    fn rat_sqrt_bounds_are_exact_at_any_magnitude() {
        // 10^400 is far outside f64 range; its square root is still exact.
        let huge = num_traits::pow(<Rat as Num>::of_int(10), 400);
        let root = num_traits::pow(<Rat as Num>::of_int(10), 200);
        assert_eq!(huge.sqrt_down(), root);
        assert_eq!(huge.sqrt_up(), root);

        let above = huge.add(&<Rat as Num>::one());
        let lo = above.sqrt_down();
        let hi = above.sqrt_up();
        assert!(lo.mul(&lo).cmp_num(&above) != Ordering::Greater);
        assert!(hi.mul(&hi).cmp_num(&above) != Ordering::Less);
        assert_eq!(lo.cmp_num(&hi), Ordering::Less);

        let quarter = Rat::new(BigInt::from(1), BigInt::from(4));
        let half = Rat::new(BigInt::from(1), BigInt::from(2));
        assert_eq!(quarter.sqrt_down(), half);
        assert_eq!(quarter.sqrt_up(), half);
    }

    #[test]
    fn f64_sqrt_enclosure_is_sound() {
        let x = 2.0f64;
        let lo = x.sqrt_down();
        let hi = x.sqrt_up();
        assert!(lo * lo <= 2.0);
        assert!(hi * hi >= 2.0);
        assert!(lo < hi);
    }

    #[test]
    fn total_order_on_floats() {
        assert_eq!(1.0f64.cmp_num(&2.0), Ordering::Less);
        assert_eq!(Num::sgn(&-0.5f64), Ordering::Less);
    }
}
