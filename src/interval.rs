//! The interval primitive: a pair of bounds over any numeric representation.
//!
//! Internally an interval `[lo, hi]` is stored as `(inf, sup)` where `inf`
//! is the *negation* of the lower bound, so that all bound arithmetic rounds
//! toward +infinity. The negated representation never appears in the public
//! interface: constructors and accessors speak ordinary `(lo, hi)` with
//! `lo <= hi` semantics, and an unbounded side is reported as `None`.
//!
//! An interval is empty (bottom) exactly when its true lower bound exceeds
//! its upper bound after canonicalization; [`Itv::canonicalize`] is the sole
//! emptiness test and must be rerun after every bound-tightening mutation.

use std::cmp::Ordering;
use std::fmt;

use crate::bound::Bound;
use crate::num::Num;

/// A one-dimensional interval over the numeric type `N`.
///
/// # Examples
/// ```
/// # use warren::interval::Itv;
/// # use warren::num::Rat;
/// let a: Itv<Rat> = Itv::of_ints(0, 5);
/// let b: Itv<Rat> = Itv::of_ints(3, 8);
/// assert_eq!(a.meet(&b), Itv::of_ints(3, 5));
/// assert_eq!(a.join(&b), Itv::of_ints(0, 8));
/// assert!(a.meet(&Itv::of_ints(10, 20)).is_bottom());
/// ```
#[derive(Clone, Debug)]
pub struct Itv<N> {
    /// The negated lower bound.
    inf: Bound<N>,
    /// The upper bound.
    sup: Bound<N>,
}

/// Coarse sign of an interval, used to case-split multiplication.
enum Sign {
    /// Every point is `>= 0`.
    NonNeg,
    /// Every point is `<= 0`.
    NonPos,
    /// The interval straddles zero.
    Mixed,
}

impl<N: Num> Itv<N> {
    /// The interval containing every number.
    ///
    /// # Examples
    /// ```
    /// # use warren::interval::Itv;
    /// # use warren::num::Rat;
    /// let t: Itv<Rat> = Itv::top();
    /// assert!(t.is_top());
    /// assert_eq!(t.lower(), None);
    /// assert_eq!(t.upper(), None);
    /// ```
    pub fn top() -> Itv<N> {
        Itv {
            inf: Bound::PosInf,
            sup: Bound::PosInf,
        }
    }

    /// The canonical empty interval.
    pub fn bottom() -> Itv<N> {
        Itv {
            inf: Bound::of_int(-1),
            sup: Bound::of_int(0),
        }
    }

    /// The interval `[l, u]` from machine integers.
    pub fn of_ints(l: i64, u: i64) -> Itv<N> {
        Itv {
            inf: Bound::Finite(N::of_int(l).neg()),
            sup: Bound::Finite(N::of_int(u)),
        }
    }

    /// The interval `[l, u]` from numbers.
    pub fn of_nums(l: N, u: N) -> Itv<N> {
        Itv {
            inf: Bound::Finite(l.neg()),
            sup: Bound::Finite(u),
        }
    }

    /// The singleton interval `[n, n]`.
    pub fn point(n: N) -> Itv<N> {
        Itv {
            inf: Bound::Finite(n.neg()),
            sup: Bound::Finite(n),
        }
    }

    /// The interval `[l, +oo[`.
    pub fn above(l: N) -> Itv<N> {
        Itv {
            inf: Bound::Finite(l.neg()),
            sup: Bound::PosInf,
        }
    }

    /// The interval `]-oo, u]`.
    pub fn below(u: N) -> Itv<N> {
        Itv {
            inf: Bound::PosInf,
            sup: Bound::Finite(u),
        }
    }

    /// The true lower bound, or `None` if unbounded below.
    pub fn lower(&self) -> Option<N> {
        match &self.inf {
            Bound::PosInf => None,
            Bound::Finite(n) => Some(n.neg()),
        }
    }

    /// The upper bound, or `None` if unbounded above.
    pub fn upper(&self) -> Option<N> {
        match &self.sup {
            Bound::PosInf => None,
            Bound::Finite(n) => Some(n.clone()),
        }
    }

    pub(crate) fn raw_inf(&self) -> &Bound<N> {
        &self.inf
    }

    pub(crate) fn raw_sup(&self) -> &Bound<N> {
        &self.sup
    }

    pub(crate) fn set_raw_inf(&mut self, inf: Bound<N>) {
        self.inf = inf;
    }

    pub(crate) fn set_raw_sup(&mut self, sup: Bound<N>) {
        self.sup = sup;
    }

    /// Whether the interval is empty: `sup + inf < 0` in the negated
    /// representation, i.e. the true lower bound strictly exceeds the upper.
    pub fn is_bottom(&self) -> bool {
        self.sup.add(&self.inf).sgn() == Ordering::Less
    }

    /// Whether the interval is `]-oo, +oo[`.
    pub fn is_top(&self) -> bool {
        self.inf.is_infty() && self.sup.is_infty()
    }

    /// Whether the interval is a singleton.
    pub fn is_point(&self) -> bool {
        !self.inf.is_infty() && !self.sup.is_infty() && self.sup.add(&self.inf).is_zero()
    }

    /// The single value of a singleton interval.
    pub fn as_point(&self) -> Option<N> {
        if self.is_point() {
            self.lower()
        } else {
            None
        }
    }

    /// Whether zero lies in the interval.
    pub fn contains_zero(&self) -> bool {
        self.inf.sgn() != Ordering::Less && self.sup.sgn() != Ordering::Less
    }

    /// Round the interval for an integer-typed dimension and test emptiness.
    /// Flooring the stored (negated) lower bound rounds the true lower bound
    /// up, as required. Returns true iff the interval is empty.
    ///
    /// # Examples
    /// ```
    /// # use warren::interval::Itv;
    /// # use warren::num::{Num, Rat};
    /// let mut a = Itv::of_nums(Rat::new(1.into(), 2.into()), Rat::new(5.into(), 2.into()));
    /// assert!(!a.canonicalize(true));
    /// assert_eq!(a, Itv::of_ints(1, 2));
    /// ```
    pub fn canonicalize(&mut self, integer: bool) -> bool {
        if integer {
            self.inf = self.inf.floor();
            self.sup = self.sup.floor();
        }
        self.is_bottom()
    }

    /// Intersection. The result is not canonicalized; callers test emptiness
    /// with [`Itv::is_bottom`] or [`Itv::canonicalize`].
    pub fn meet(&self, other: &Itv<N>) -> Itv<N> {
        Itv {
            inf: self.inf.clone().min(other.inf.clone()),
            sup: self.sup.clone().min(other.sup.clone()),
        }
    }

    /// Convex hull. Empty operands are absorbed.
    ///
    /// # Examples
    /// ```
    /// # use warren::interval::Itv;
    /// # use warren::num::Rat;
    /// let x: Itv<Rat> = Itv::of_ints(2, 4);
    /// assert_eq!(Itv::bottom().join(&x), x);
    /// ```
    pub fn join(&self, other: &Itv<N>) -> Itv<N> {
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() {
            return self.clone();
        }
        Itv {
            inf: self.inf.clone().max(other.inf.clone()),
            sup: self.sup.clone().max(other.sup.clone()),
        }
    }

    /// Classical interval widening with unbounded jump: per field, if the new
    /// iterate's bound strictly exceeds the old one, jump to infinity,
    /// otherwise keep the old bound. Each field jumps at most once, so any
    /// increasing chain stabilizes in finitely many steps.
    ///
    /// # Examples
    /// ```
    /// # use warren::interval::Itv;
    /// # use warren::num::{Num, Rat};
    /// let old: Itv<Rat> = Itv::of_ints(0, 5);
    /// let new: Itv<Rat> = Itv::of_ints(0, 10);
    /// assert_eq!(old.widening(&new), Itv::above(<Rat as Num>::zero()));
    /// ```
    pub fn widening(&self, other: &Itv<N>) -> Itv<N> {
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() {
            return self.clone();
        }
        let inf = if other.inf.cmp_bound(&self.inf) == Ordering::Greater {
            Bound::PosInf
        } else {
            self.inf.clone()
        };
        let sup = if other.sup.cmp_bound(&self.sup) == Ordering::Greater {
            Bound::PosInf
        } else {
            self.sup.clone()
        };
        Itv { inf, sup }
    }

    /// Whether `self` includes every point of `other`.
    pub fn contains(&self, other: &Itv<N>) -> bool {
        if other.is_bottom() {
            return true;
        }
        if self.is_bottom() {
            return false;
        }
        self.inf.cmp_bound(&other.inf) != Ordering::Less
            && self.sup.cmp_bound(&other.sup) != Ordering::Less
    }

    /// Interval addition. With the negated lower bound, both fields add
    /// directly and both round in the sound direction.
    pub fn add(&self, other: &Itv<N>) -> Itv<N> {
        if self.is_bottom() || other.is_bottom() {
            return Itv::bottom();
        }
        Itv {
            inf: self.inf.add(&other.inf),
            sup: self.sup.add(&other.sup),
        }
    }

    /// Interval negation: swap the stored fields. Exact.
    pub fn negate(&self) -> Itv<N> {
        Itv {
            inf: self.sup.clone(),
            sup: self.inf.clone(),
        }
    }

    /// Interval subtraction.
    pub fn sub(&self, other: &Itv<N>) -> Itv<N> {
        self.add(&other.negate())
    }

    /// Scale by a finite number.
    ///
    /// # Examples
    /// ```
    /// # use warren::interval::Itv;
    /// # use warren::num::{Num, Rat};
    /// let a: Itv<Rat> = Itv::of_ints(-1, 3);
    /// assert_eq!(a.mul_num(&<Rat as Num>::of_int(2)), Itv::of_ints(-2, 6));
    /// assert_eq!(a.mul_num(&<Rat as Num>::of_int(-2)), Itv::of_ints(-6, 2));
    /// assert_eq!(a.mul_num(&<Rat as Num>::zero()), Itv::point(<Rat as Num>::zero()));
    /// ```
    pub fn mul_num(&self, n: &N) -> Itv<N> {
        if self.is_bottom() {
            return Itv::bottom();
        }
        if n.is_zero() {
            return Itv::point(N::zero());
        }
        if n.sgn() == Ordering::Greater {
            Itv {
                inf: self.inf.mul_num(n),
                sup: self.sup.mul_num(n),
            }
        } else {
            let m = n.neg();
            Itv {
                inf: self.sup.mul_num(&m),
                sup: self.inf.mul_num(&m),
            }
        }
    }

    /// Divide by a finite nonzero number.
    pub fn div_num(&self, n: &N) -> Itv<N> {
        if self.is_bottom() {
            return Itv::bottom();
        }
        if n.sgn() == Ordering::Greater {
            Itv {
                inf: self.inf.div_num(n),
                sup: self.sup.div_num(n),
            }
        } else {
            let m = n.neg();
            Itv {
                inf: self.sup.div_num(&m),
                sup: self.inf.div_num(&m),
            }
        }
    }

    fn sign(&self) -> Sign {
        if self.inf.sgn() != Ordering::Greater {
            // Lower bound >= 0.
            Sign::NonNeg
        } else if self.sup.sgn() != Ordering::Greater {
            Sign::NonPos
        } else {
            Sign::Mixed
        }
    }

    /// Interval multiplication, case-split on the sign of each operand.
    /// Mixed-sign operands are split into sign-homogeneous halves and the
    /// sub-products joined; the result is a sound over-approximation.
    ///
    /// # Examples
    /// ```
    /// # use warren::interval::Itv;
    /// # use warren::num::Rat;
    /// let a: Itv<Rat> = Itv::of_ints(-2, 3);
    /// let b: Itv<Rat> = Itv::of_ints(1, 4);
    /// assert_eq!(a.mul(&b), Itv::of_ints(-8, 12));
    /// let c: Itv<Rat> = Itv::of_ints(-1, 2);
    /// assert_eq!(a.mul(&c), Itv::of_ints(-4, 6));
    /// ```
    pub fn mul(&self, other: &Itv<N>) -> Itv<N> {
        if self.is_bottom() || other.is_bottom() {
            return Itv::bottom();
        }
        match (self.sign(), other.sign()) {
            (Sign::NonNeg, Sign::NonNeg) => Itv::mul_nonneg(self, other),
            (Sign::NonPos, Sign::NonPos) => Itv::mul_nonneg(&self.negate(), &other.negate()),
            (Sign::NonPos, Sign::NonNeg) => Itv::mul_nonneg(&self.negate(), other).negate(),
            (Sign::NonNeg, Sign::NonPos) => Itv::mul_nonneg(self, &other.negate()).negate(),
            (Sign::Mixed, _) => {
                let neg_half = Itv {
                    inf: self.inf.clone(),
                    sup: Bound::zero(),
                };
                let pos_half = Itv {
                    inf: Bound::zero(),
                    sup: self.sup.clone(),
                };
                neg_half.mul(other).join(&pos_half.mul(other))
            }
            (_, Sign::Mixed) => other.mul(self),
        }
    }

    /// Multiply two nonnegative intervals. The stored fields are both
    /// finite-or-zero on the lower side, so the negation below is safe, and
    /// `0 x oo = 0` keeps infinite upper bounds sound.
    fn mul_nonneg(a: &Itv<N>, b: &Itv<N>) -> Itv<N> {
        // lower = a.lo * b.lo, stored negated as a.inf * b.lo.
        let b_lo = b.inf.neg();
        Itv {
            inf: a.inf.mul(&b_lo),
            sup: a.sup.mul(&b.sup),
        }
    }

    /// Interval division. A divisor whose closure contains zero yields top
    /// (the quotient is unbounded); this includes divisors with a zero
    /// endpoint.
    pub fn div(&self, other: &Itv<N>) -> Itv<N> {
        if self.is_bottom() || other.is_bottom() {
            return Itv::bottom();
        }
        match other.lower() {
            Some(lo) if lo.sgn() == Ordering::Greater => self.div_pos(&lo, &other.sup),
            _ => match other.upper() {
                Some(hi) if hi.sgn() == Ordering::Less => {
                    let neg = other.negate();
                    let lo = neg.lower().expect("negated upper bound is finite");
                    self.div_pos(&lo, &neg.sup).negate()
                }
                _ => Itv::top(),
            },
        }
    }

    /// Divide by `[lo, hi]` with `lo > 0` finite.
    fn div_pos(&self, lo: &N, hi: &Bound<N>) -> Itv<N> {
        let sup = if self.sup.sgn() != Ordering::Less {
            // Largest quotient uses the smallest divisor.
            self.sup.div_num(lo)
        } else {
            match hi {
                // A negative numerator over an arbitrarily large divisor
                // tends to zero from below.
                Bound::PosInf => Bound::zero(),
                Bound::Finite(h) => self.sup.div_num(h),
            }
        };
        let inf = if self.inf.sgn() != Ordering::Greater {
            // Lower bound of the numerator >= 0.
            match hi {
                Bound::PosInf => Bound::zero(),
                Bound::Finite(h) => self.inf.div_num(h),
            }
        } else {
            self.inf.div_num(lo)
        };
        Itv { inf, sup }
    }

    /// Sound enclosure of the square root. Returns `None` (bottom) when the
    /// interval contains no nonnegative point. The negative part of a
    /// straddling interval is clipped away. The lower bound of the result
    /// rounds down and the upper bound rounds up.
    pub fn sqrt(&self) -> Option<Itv<N>> {
        if self.is_bottom() || self.sup.sgn() == Ordering::Less {
            return None;
        }
        let lo = if self.inf.sgn() != Ordering::Greater {
            // Lower bound >= 0: take its real square root.
            match &self.inf {
                Bound::Finite(n) => n.neg().sqrt_down(),
                Bound::PosInf => unreachable!("nonpositive stored bound is finite"),
            }
        } else {
            N::zero()
        };
        Some(Itv {
            inf: Bound::Finite(lo.neg()),
            sup: self.sup.sqrt_up(),
        })
    }

    /// The magnitude: an upper bound on `|x|` over the interval. In the
    /// negated representation this is simply the larger stored field.
    pub fn magnitude(&self) -> Bound<N> {
        self.inf.clone().max(self.sup.clone())
    }

    /// Compare the ranges (magnitudes) of two intervals. Used to pick which
    /// operand of a nonlinear product to collapse into a constant.
    pub fn cmp_range(&self, other: &Itv<N>) -> Ordering {
        self.magnitude().cmp_bound(&other.magnitude())
    }
}

impl<N: Num> PartialEq for Itv<N> {
    fn eq(&self, other: &Itv<N>) -> bool {
        (self.is_bottom() && other.is_bottom())
            || (self.inf == other.inf && self.sup == other.sup)
    }
}

impl<N: Num> fmt::Display for Itv<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bottom() {
            return write!(f, "[empty]");
        }
        match self.lower() {
            None => write!(f, "[-oo,")?,
            Some(l) => write!(f, "[{},", l)?,
        }
        write!(f, "{}]", self.sup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::num::Rat;
    use proptest::prelude::*;

    fn itv(l: i64, u: i64) -> Itv<Rat> {
        Itv::of_ints(l, u)
    }

    #[test]
    fn top_and_bottom() {
        let t: Itv<Rat> = Itv::top();
        assert!(t.is_top());
        assert!(!t.is_bottom());
        let b: Itv<Rat> = Itv::bottom();
        assert!(b.is_bottom());
        assert_eq!(itv(3, 3).as_point(), Some(Num::of_int(3)));
        assert_eq!(itv(1, 2).as_point(), None);
        assert_eq!(b.as_point(), None);
        assert_eq!(t.as_point(), None);
        assert!(!b.is_top());
    }

    #[test]
    fn emptiness_is_strict_inversion() {
        assert!(!itv(3, 3).is_bottom());
        assert!(itv(3, 2).is_bottom());
        assert!(!itv(-5, -5).is_bottom());
    }

    #[test]
    fn disjoint_meet_is_bottom() {
        // [0,5] /\ [10,20] is empty.
        let mut m = itv(0, 5).meet(&itv(10, 20));
        assert!(m.canonicalize(false));
        assert!(m.is_bottom());
    }

    #[test]
    fn widening_jumps_on_growth() {
        // [0,5] widened against [0,10]: sup grew so it jumps, inf is kept.
        let w = itv(0, 5).widening(&itv(0, 10));
        assert_eq!(w, Itv::above(<Rat as Num>::zero()));
        // A stable iterate is left alone.
        assert_eq!(itv(0, 5).widening(&itv(0, 5)), itv(0, 5));
        // Growth below jumps the lower bound only.
        let w2 = itv(0, 5).widening(&itv(-3, 5));
        assert_eq!(w2, Itv::below(<Rat as Num>::of_int(5)));
    }

    #[test]
    fn widening_terminates_on_chains() {
        // Repeated widening against a growing chain stabilizes in at most
        // two jumps (one per field).
        let mut cur = itv(0, 1);
        let mut jumps = 0;
        for i in 2..50 {
            let next = itv(-i, i);
            let w = cur.widening(&next);
            if w != cur {
                jumps += 1;
            }
            cur = w;
        }
        assert!(jumps <= 2);
        assert!(cur.contains(&itv(-49, 49)));
    }

    #[test]
    fn integer_canonicalization_floors_inward() {
        let mut a = Itv::of_nums(Rat::new(1.into(), 2.into()), Rat::new(7.into(), 2.into()));
        assert!(!a.canonicalize(true));
        assert_eq!(a, itv(1, 3));
        // [0.2, 0.8] contains no integer.
        let mut b = Itv::of_nums(Rat::new(1.into(), 5.into()), Rat::new(4.into(), 5.into()));
        assert!(b.canonicalize(true));
    }

    #[test]
    fn addition_and_negation() {
        assert_eq!(itv(1, 2).add(&itv(10, 20)), itv(11, 22));
        assert_eq!(itv(-3, 5).negate(), itv(-5, 3));
        assert_eq!(itv(1, 2).sub(&itv(0, 1)), itv(0, 2));
        let half_open: Itv<Rat> = Itv::above(<Rat as Num>::zero());
        assert_eq!(itv(1, 2).add(&half_open), Itv::above(<Rat as Num>::of_int(1)));
    }

    #[test]
    fn multiplication_sign_cases() {
        assert_eq!(itv(1, 2).mul(&itv(3, 4)), itv(3, 8));
        assert_eq!(itv(-2, -1).mul(&itv(-4, -3)), itv(3, 8));
        assert_eq!(itv(-2, -1).mul(&itv(3, 4)), itv(-8, -3));
        assert_eq!(itv(1, 2).mul(&itv(-4, -3)), itv(-8, -3));
        // Mixed times positive.
        assert_eq!(itv(-2, 3).mul(&itv(1, 4)), itv(-8, 12));
        // Mixed times mixed.
        assert_eq!(itv(-2, 3).mul(&itv(-1, 2)), itv(-4, 6));
        // Zero absorbs even against an unbounded operand.
        let t: Itv<Rat> = Itv::top();
        assert_eq!(Itv::point(<Rat as Num>::zero()).mul(&t), Itv::point(<Rat as Num>::zero()));
    }

    #[test]
    fn division_cases() {
        assert_eq!(itv(4, 8).div(&itv(2, 4)), itv(1, 4));
        assert_eq!(itv(-8, -4).div(&itv(2, 4)), itv(-4, -1));
        assert_eq!(itv(4, 8).div(&itv(-4, -2)), itv(-4, -1));
        // Divisor straddling zero is unbounded.
        assert!(itv(1, 2).div(&itv(-1, 1)).is_top());
        assert!(itv(1, 2).div(&itv(0, 1)).is_top());
    }

    #[test]
    fn sqrt_enclosure() {
        let s = itv(4, 9).sqrt().unwrap();
        assert!(s.contains(&itv(2, 3)));
        // A straddling interval is clipped at zero.
        let s2 = itv(-4, 9).sqrt().unwrap();
        assert_eq!(s2.lower(), Some(<Rat as Num>::zero()));
        // A purely negative interval has no square root.
        assert!(itv(-4, -1).sqrt().is_none());
    }

    #[test]
    fn magnitude_picks_larger_endpoint() {
        assert_eq!(itv(-5, 3).magnitude(), Bound::of_int(5));
        assert_eq!(itv(-1, 7).magnitude(), Bound::of_int(7));
        let t: Itv<Rat> = Itv::top();
        assert!(t.magnitude().is_infty());
    }

    proptest! {
        #[test]
        fn meet_is_commutative(a in -20i64..20, b in -20i64..20, c in -20i64..20, d in -20i64..20) {
            let x = itv(a.min(b), a.max(b));
            let y = itv(c.min(d), c.max(d));
            prop_assert_eq!(x.meet(&y), y.meet(&x));
        }

        #[test]
        fn meet_is_idempotent(a in -20i64..20, b in -20i64..20) {
            let x = itv(a.min(b), a.max(b));
            prop_assert_eq!(x.meet(&x), x);
        }

        #[test]
        fn join_absorbs_bottom(a in -20i64..20, b in -20i64..20) {
            let x = itv(a.min(b), a.max(b));
            prop_assert_eq!(Itv::bottom().join(&x), x.clone());
            prop_assert_eq!(x.join(&Itv::bottom()), x);
        }

        #[test]
        fn join_contains_both(a in -20i64..20, b in -20i64..20, c in -20i64..20, d in -20i64..20) {
            let x = itv(a.min(b), a.max(b));
            let y = itv(c.min(d), c.max(d));
            let j = x.join(&y);
            prop_assert!(j.contains(&x));
            prop_assert!(j.contains(&y));
        }

        #[test]
        fn mul_is_sound_on_samples(a in -5i64..5, b in -5i64..5, c in -5i64..5, d in -5i64..5) {
            let x = itv(a.min(b), a.max(b));
            let y = itv(c.min(d), c.max(d));
            let p = x.mul(&y);
            for u in a.min(b)..=a.max(b) {
                for v in c.min(d)..=c.max(d) {
                    prop_assert!(p.contains(&Itv::of_ints(u * v, u * v)));
                }
            }
        }
    }
}
