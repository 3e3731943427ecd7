//! Bounds: a scalar number extended with a +infinity sentinel.
//!
//! Only positive infinity exists. A lower bound of -infinity is represented
//! by storing the *negation* of the lower bound, which is how the interval
//! type uses this module; that way every stored bound rounds in the same
//! direction (+infinity) and a single sentinel suffices.
//!
//! Arithmetic follows "infinity absorbs, except multiplication or division by
//! an exactly-zero finite operand, which yields zero".

use std::cmp::Ordering;
use std::fmt;

use crate::num::Num;

/// A scalar bound: either a finite number or +infinity.
///
/// # Examples
/// ```
/// # use warren::bound::Bound;
/// # use warren::num::Rat;
/// let b: Bound<Rat> = Bound::of_int(3);
/// assert!(!b.is_infty());
/// assert!(Bound::<Rat>::PosInf.is_infty());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Bound<N> {
    /// A finite bound.
    Finite(N),
    /// Positive infinity.
    PosInf,
}

impl<N: Num> Bound<N> {
    /// The zero bound.
    pub fn zero() -> Bound<N> {
        Bound::Finite(N::zero())
    }

    /// A finite bound from a machine integer.
    pub fn of_int(n: i64) -> Bound<N> {
        Bound::Finite(N::of_int(n))
    }

    /// Whether this bound is the infinity sentinel.
    pub fn is_infty(&self) -> bool {
        matches!(self, Bound::PosInf)
    }

    /// Whether this bound is exactly zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Bound::Finite(n) => n.is_zero(),
            Bound::PosInf => false,
        }
    }

    /// Sign of the bound; infinity is positive.
    pub fn sgn(&self) -> Ordering {
        match self {
            Bound::Finite(n) => n.sgn(),
            Bound::PosInf => Ordering::Greater,
        }
    }

    /// Total order with infinity greatest.
    ///
    /// # Examples
    /// ```
    /// # use std::cmp::Ordering;
    /// # use warren::bound::Bound;
    /// # use warren::num::Rat;
    /// let a: Bound<Rat> = Bound::of_int(1);
    /// assert_eq!(a.cmp_bound(&Bound::PosInf), Ordering::Less);
    /// ```
    pub fn cmp_bound(&self, other: &Bound<N>) -> Ordering {
        match (self, other) {
            (Bound::PosInf, Bound::PosInf) => Ordering::Equal,
            (Bound::PosInf, Bound::Finite(_)) => Ordering::Greater,
            (Bound::Finite(_), Bound::PosInf) => Ordering::Less,
            (Bound::Finite(a), Bound::Finite(b)) => a.cmp_num(b),
        }
    }

    /// Add two bounds. Infinity absorbs; a finite result that overflows the
    /// representation becomes infinity.
    pub fn add(&self, other: &Bound<N>) -> Bound<N> {
        match (self, other) {
            (Bound::PosInf, _) | (_, Bound::PosInf) => Bound::PosInf,
            (Bound::Finite(a), Bound::Finite(b)) => Bound::finite_or_infty(a.add(b)),
        }
    }

    /// Subtract a finite number from this bound.
    pub fn sub_num(&self, n: &N) -> Bound<N> {
        match self {
            Bound::PosInf => Bound::PosInf,
            Bound::Finite(a) => Bound::finite_or_infty(a.sub(n)),
        }
    }

    /// Multiply two bounds with `0 x oo = 0`.
    pub fn mul(&self, other: &Bound<N>) -> Bound<N> {
        if self.is_zero() || other.is_zero() {
            return Bound::zero();
        }
        match (self, other) {
            (Bound::PosInf, _) | (_, Bound::PosInf) => Bound::PosInf,
            (Bound::Finite(a), Bound::Finite(b)) => Bound::finite_or_infty(a.mul(b)),
        }
    }

    /// Multiply by a finite number, special-casing an exactly-zero
    /// multiplier so that `0 x oo` is `0` rather than infinity.
    pub fn mul_num(&self, n: &N) -> Bound<N> {
        if n.is_zero() {
            return Bound::zero();
        }
        match self {
            Bound::PosInf => Bound::PosInf,
            Bound::Finite(a) => Bound::finite_or_infty(a.mul(n)),
        }
    }

    /// Divide by a finite nonzero number.
    pub fn div_num(&self, n: &N) -> Bound<N> {
        match self {
            Bound::PosInf => Bound::PosInf,
            Bound::Finite(a) => {
                if a.is_zero() {
                    Bound::zero()
                } else {
                    Bound::finite_or_infty(a.div(n))
                }
            }
        }
    }

    /// Negate a finite bound.
    ///
    /// # Panics
    /// Panics on the infinity sentinel; callers must rule it out first.
    pub fn neg(&self) -> Bound<N> {
        match self {
            Bound::PosInf => panic!("Attempting to negate an infinite bound"),
            Bound::Finite(a) => Bound::Finite(a.neg()),
        }
    }

    /// The smaller of two bounds: `min(oo, x) = x`.
    pub fn min(self, other: Bound<N>) -> Bound<N> {
        if self.cmp_bound(&other) == Ordering::Greater {
            other
        } else {
            self
        }
    }

    /// The larger of two bounds: `max(oo, x) = oo`.
    pub fn max(self, other: Bound<N>) -> Bound<N> {
        if self.cmp_bound(&other) == Ordering::Less {
            other
        } else {
            self
        }
    }

    /// Round a finite bound down to an integer.
    pub fn floor(&self) -> Bound<N> {
        match self {
            Bound::PosInf => Bound::PosInf,
            Bound::Finite(a) => Bound::Finite(a.floor()),
        }
    }

    /// Round a finite bound up to an integer.
    pub fn ceil(&self) -> Bound<N> {
        match self {
            Bound::PosInf => Bound::PosInf,
            Bound::Finite(a) => Bound::Finite(a.ceil()),
        }
    }

    /// An upper bound on the square root (requires a nonnegative bound).
    pub fn sqrt_up(&self) -> Bound<N> {
        match self {
            Bound::PosInf => Bound::PosInf,
            Bound::Finite(a) => Bound::finite_or_infty(a.sqrt_up()),
        }
    }

    fn finite_or_infty(n: N) -> Bound<N> {
        if n.is_finite() {
            Bound::Finite(n)
        } else {
            Bound::PosInf
        }
    }
}

impl<N: Num> fmt::Display for Bound<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::PosInf => write!(f, "+oo"),
            Bound::Finite(n) => write!(f, "{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::num::Rat;

    fn fin(n: i64) -> Bound<Rat> {
        Bound::of_int(n)
    }

    #[test]
    fn infinity_absorbs_addition() {
        assert_eq!(fin(3).add(&Bound::PosInf), Bound::PosInf);
        assert_eq!(Bound::<Rat>::PosInf.add(&Bound::PosInf), Bound::PosInf);
        assert_eq!(fin(3).add(&fin(4)), fin(7));
    }

    #[test]
    fn zero_times_infinity_is_zero() {
        assert_eq!(Bound::<Rat>::PosInf.mul_num(&<Rat as Num>::zero()), fin(0));
        assert_eq!(fin(0).mul(&Bound::PosInf), fin(0));
        assert_eq!(Bound::<Rat>::PosInf.mul(&fin(0)), fin(0));
        assert_eq!(fin(2).mul(&Bound::PosInf), Bound::PosInf);
    }

    #[test]
    fn min_max_propagate_infinity() {
        assert_eq!(Bound::<Rat>::PosInf.min(fin(5)), fin(5));
        assert_eq!(Bound::<Rat>::PosInf.max(fin(5)), Bound::PosInf);
        assert_eq!(fin(2).min(fin(5)), fin(2));
    }

    #[test]
    fn division_keeps_sign() {
        assert_eq!(fin(6).div_num(&<Rat as Num>::of_int(2)), fin(3));
        assert_eq!(fin(-6).div_num(&<Rat as Num>::of_int(2)), fin(-3));
        assert_eq!(
            Bound::<Rat>::PosInf.div_num(&<Rat as Num>::of_int(2)),
            Bound::PosInf
        );
    }

    #[test]
    fn float_overflow_becomes_infinity() {
        let big: Bound<f64> = Bound::Finite(f64::MAX);
        assert_eq!(big.mul(&Bound::Finite(2.0)), Bound::PosInf);
    }

    #[test]
    #[should_panic]
    fn negating_infinity_panics() {
        let _ = Bound::<Rat>::PosInf.neg();
    }
}
