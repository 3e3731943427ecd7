//! Linear expressions and constraints over abstract dimensions.
//!
//! A [`Linexpr0`] is a sum `c0*x0 + ... + cn*xn + cst` where each coefficient
//! is either a scalar or an interval; a [`Lincons0`] relates such an
//! expression to zero. The internal [`ItvLinexpr`] form widens every
//! coefficient to an interval so that evaluation and constraint propagation
//! share one code path.
//!
//! Constraint propagation ([`meet_lincons_array`]) is a bounded Gauss-Seidel
//! relaxation: each constraint is solved for each of its point-coefficient
//! variables against the current box, tightened bounds feed the next solve,
//! and the sweep repeats up to a fixed pass count or until nothing changes.

use std::cmp::Ordering;
use std::fmt;

use log::debug;

use crate::dimension::{Dim, DimChange, DimPerm};
use crate::interval::Itv;
use crate::num::Num;

/// A coefficient: a scalar or an interval.
#[derive(Clone, Debug)]
pub enum Coeff<N> {
    /// An exact scalar coefficient.
    Scalar(N),
    /// An interval coefficient.
    Interval(Itv<N>),
}

impl<N: Num> PartialEq for Coeff<N> {
    fn eq(&self, other: &Coeff<N>) -> bool {
        match (self, other) {
            (Coeff::Scalar(a), Coeff::Scalar(b)) => a == b,
            (Coeff::Interval(a), Coeff::Interval(b)) => a == b,
            _ => false,
        }
    }
}

impl<N: Num> Coeff<N> {
    /// The scalar zero coefficient.
    pub fn zero() -> Coeff<N> {
        Coeff::Scalar(N::zero())
    }

    /// A scalar coefficient from a machine integer.
    pub fn of_int(n: i64) -> Coeff<N> {
        Coeff::Scalar(N::of_int(n))
    }

    /// Whether the coefficient is exactly the scalar zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Coeff::Scalar(n) => n.is_zero(),
            Coeff::Interval(i) => match (i.lower(), i.upper()) {
                (Some(l), Some(u)) => l.is_zero() && u.is_zero(),
                _ => false,
            },
        }
    }

    /// The scalar value if the coefficient is a point.
    pub fn as_point(&self) -> Option<N> {
        match self {
            Coeff::Scalar(n) => Some(n.clone()),
            Coeff::Interval(i) => {
                if i.is_point() {
                    i.lower()
                } else {
                    None
                }
            }
        }
    }

    /// The coefficient as an interval.
    pub fn to_itv(&self) -> Itv<N> {
        match self {
            Coeff::Scalar(n) => Itv::point(n.clone()),
            Coeff::Interval(i) => i.clone(),
        }
    }

    /// Negate the coefficient.
    pub fn neg(&self) -> Coeff<N> {
        match self {
            Coeff::Scalar(n) => Coeff::Scalar(n.neg()),
            Coeff::Interval(i) => Coeff::Interval(i.negate()),
        }
    }
}

impl<N: Num> fmt::Display for Coeff<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coeff::Scalar(n) => write!(f, "{}", n),
            Coeff::Interval(i) => write!(f, "{}", i),
        }
    }
}

/// A linear expression with a sorted, duplicate-free term list.
///
/// # Examples
/// ```
/// # use warren::linexpr::{Coeff, Linexpr0};
/// # use warren::num::Rat;
/// let mut e: Linexpr0<Rat> = Linexpr0::new(Coeff::of_int(3));
/// e.set_coeff(0, Coeff::of_int(2));
/// e.set_coeff(1, Coeff::of_int(-1));
/// assert_eq!(e.to_string(), "2*x0 + -1*x1 + 3");
/// ```
#[derive(Clone, Debug)]
pub struct Linexpr0<N> {
    terms: Vec<(Dim, Coeff<N>)>,
    cst: Coeff<N>,
}

impl<N: Num> PartialEq for Linexpr0<N> {
    fn eq(&self, other: &Linexpr0<N>) -> bool {
        self.terms == other.terms && self.cst == other.cst
    }
}

impl<N: Num> Linexpr0<N> {
    /// The constant expression `cst`.
    pub fn new(cst: Coeff<N>) -> Linexpr0<N> {
        Linexpr0 {
            terms: Vec::new(),
            cst,
        }
    }

    /// Build an expression from a term list. Terms are sorted by dimension;
    /// zero coefficients are dropped.
    ///
    /// # Panics
    /// Panics if the same dimension appears twice.
    pub fn of_terms(mut terms: Vec<(Dim, Coeff<N>)>, cst: Coeff<N>) -> Linexpr0<N> {
        terms.retain(|(_, c)| !c.is_zero());
        terms.sort_by_key(|(d, _)| *d);
        assert!(
            terms.windows(2).all(|w| w[0].0 != w[1].0),
            "Duplicate dimension in linear expression"
        );
        Linexpr0 { terms, cst }
    }

    /// Set the coefficient of a dimension, replacing any existing one.
    pub fn set_coeff(&mut self, dim: Dim, coeff: Coeff<N>) {
        match self.terms.binary_search_by_key(&dim, |(d, _)| *d) {
            Ok(i) => {
                if coeff.is_zero() {
                    self.terms.remove(i);
                } else {
                    self.terms[i].1 = coeff;
                }
            }
            Err(i) => {
                if !coeff.is_zero() {
                    self.terms.insert(i, (dim, coeff));
                }
            }
        }
    }

    /// The coefficient of a dimension (zero if absent).
    pub fn coeff(&self, dim: Dim) -> Coeff<N> {
        match self.terms.binary_search_by_key(&dim, |(d, _)| *d) {
            Ok(i) => self.terms[i].1.clone(),
            Err(_) => Coeff::zero(),
        }
    }

    /// The constant term.
    pub fn cst(&self) -> &Coeff<N> {
        &self.cst
    }

    /// Replace the constant term.
    pub fn set_cst(&mut self, cst: Coeff<N>) {
        self.cst = cst;
    }

    /// The nonzero terms in dimension order.
    pub fn terms(&self) -> &[(Dim, Coeff<N>)] {
        &self.terms
    }

    /// The largest dimension mentioned, if any.
    pub fn max_dim(&self) -> Option<Dim> {
        self.terms.last().map(|(d, _)| *d)
    }

    /// Whether every coefficient (constant included) is a scalar.
    pub fn is_linear(&self) -> bool {
        self.cst.as_point().is_some() && self.terms.iter().all(|(_, c)| c.as_point().is_some())
    }

    /// Negate the expression.
    pub fn neg(&self) -> Linexpr0<N> {
        Linexpr0 {
            terms: self.terms.iter().map(|(d, c)| (*d, c.neg())).collect(),
            cst: self.cst.neg(),
        }
    }

    /// Shift dimensions for an insertion: each dimension grows by the number
    /// of insertion positions at or below it. The change must already be
    /// validated against the expression's space.
    pub fn add_dimensions(&mut self, change: &DimChange) {
        let positions: Vec<Dim> = change.positions().collect();
        for (d, _) in &mut self.terms {
            let shift = positions.iter().filter(|&&p| p <= *d).count();
            *d += shift;
        }
    }

    /// Renumber dimensions through a permutation.
    ///
    /// # Panics
    /// Panics if the expression mentions a dimension outside the permutation.
    pub fn permute_dimensions(&mut self, perm: &DimPerm) {
        for (d, _) in &mut self.terms {
            *d = perm.image(*d);
        }
        self.terms.sort_by_key(|(d, _)| *d);
    }
}

impl<N: Num> fmt::Display for Linexpr0<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (d, c) in &self.terms {
            write!(f, "{}*x{} + ", c, d)?;
        }
        write!(f, "{}", self.cst)
    }
}

/// The relation of a constraint's expression to zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsTyp {
    /// `expr = 0`
    Eq,
    /// `expr >= 0`
    SupEq,
    /// `expr > 0`
    Sup,
    /// `expr != 0`
    Diseq,
    /// `expr = 0 (mod m)`
    EqMod,
}

/// A linear constraint `expr <typ> 0`.
#[derive(Clone, Debug)]
pub struct Lincons0<N> {
    /// The left-hand expression.
    pub linexpr: Linexpr0<N>,
    /// The relation to zero.
    pub typ: ConsTyp,
    /// The modulus, present exactly for [`ConsTyp::EqMod`].
    pub modulo: Option<N>,
}

impl<N: Num> PartialEq for Lincons0<N> {
    fn eq(&self, other: &Lincons0<N>) -> bool {
        self.linexpr == other.linexpr && self.typ == other.typ && self.modulo == other.modulo
    }
}

impl<N: Num> Lincons0<N> {
    /// A constraint without a modulus.
    ///
    /// # Panics
    /// Panics if `typ` is [`ConsTyp::EqMod`]; use [`Lincons0::eqmod`].
    pub fn new(linexpr: Linexpr0<N>, typ: ConsTyp) -> Lincons0<N> {
        assert!(
            typ != ConsTyp::EqMod,
            "A modular constraint requires a modulus"
        );
        Lincons0 {
            linexpr,
            typ,
            modulo: None,
        }
    }

    /// The modular constraint `expr = 0 (mod m)`.
    pub fn eqmod(linexpr: Linexpr0<N>, m: N) -> Lincons0<N> {
        Lincons0 {
            linexpr,
            typ: ConsTyp::EqMod,
            modulo: Some(m),
        }
    }

    /// Whether the constraint trivially holds everywhere, e.g. `1 >= 0`.
    pub fn is_unconstraining(&self) -> bool {
        if !self.linexpr.terms().is_empty() {
            return false;
        }
        let cst = self.linexpr.cst().to_itv();
        sat_itv(&cst, self.typ, self.modulo.as_ref()) == crate::Trivalent::True
    }
}

impl<N: Num> fmt::Display for Lincons0<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.linexpr)?;
        match self.typ {
            ConsTyp::Eq => write!(f, " = 0"),
            ConsTyp::SupEq => write!(f, " >= 0"),
            ConsTyp::Sup => write!(f, " > 0"),
            ConsTyp::Diseq => write!(f, " != 0"),
            ConsTyp::EqMod => write!(
                f,
                " = 0 mod {}",
                self.modulo.as_ref().expect("modular constraint")
            ),
        }
    }
}

/// An expression with every coefficient widened to an interval.
#[derive(Clone, Debug)]
pub struct ItvLinexpr<N> {
    terms: Vec<(Dim, Itv<N>)>,
    cst: Itv<N>,
}

impl<N: Num> PartialEq for ItvLinexpr<N> {
    fn eq(&self, other: &ItvLinexpr<N>) -> bool {
        self.terms == other.terms && self.cst == other.cst
    }
}

impl<N: Num> ItvLinexpr<N> {
    /// Convert a public expression. The flag reports whether every
    /// coefficient was a point, i.e. whether the expression was linear.
    pub fn of_linexpr(e: &Linexpr0<N>) -> (ItvLinexpr<N>, bool) {
        let linear = e.is_linear();
        let terms = e
            .terms()
            .iter()
            .map(|(d, c)| (*d, c.to_itv()))
            .collect();
        (
            ItvLinexpr {
                terms,
                cst: e.cst().to_itv(),
            },
            linear,
        )
    }

    /// The terms in dimension order.
    pub fn terms(&self) -> &[(Dim, Itv<N>)] {
        &self.terms
    }

    /// The constant interval.
    pub fn cst(&self) -> &Itv<N> {
        &self.cst
    }

    /// Evaluate the expression over a box, one interval per dimension.
    ///
    /// # Panics
    /// Panics if the expression mentions a dimension outside the box.
    pub fn eval(&self, itvs: &[Itv<N>]) -> Itv<N> {
        let mut acc = self.cst.clone();
        for (d, c) in &self.terms {
            acc = acc.add(&c.mul(&itvs[*d]));
        }
        acc
    }

    /// Evaluate the expression with one term skipped.
    fn eval_without(&self, itvs: &[Itv<N>], skip: Dim) -> Itv<N> {
        let mut acc = self.cst.clone();
        for (d, c) in &self.terms {
            if *d != skip {
                acc = acc.add(&c.mul(&itvs[*d]));
            }
        }
        acc
    }
}

impl<N: Num> fmt::Display for ItvLinexpr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (d, c) in &self.terms {
            write!(f, "{}*x{} + ", c, d)?;
        }
        write!(f, "{}", self.cst)
    }
}

/// A constraint in widened-coefficient form.
#[derive(Clone, Debug)]
pub struct ItvLincons<N> {
    /// The left-hand expression.
    pub expr: ItvLinexpr<N>,
    /// The relation to zero.
    pub typ: ConsTyp,
    /// The modulus for [`ConsTyp::EqMod`].
    pub modulo: Option<N>,
}

impl<N: Num> PartialEq for ItvLincons<N> {
    fn eq(&self, other: &ItvLincons<N>) -> bool {
        self.expr == other.expr && self.typ == other.typ && self.modulo == other.modulo
    }
}

impl<N: Num> ItvLincons<N> {
    /// Convert a public constraint; the flag is as in
    /// [`ItvLinexpr::of_linexpr`].
    pub fn of_lincons(c: &Lincons0<N>) -> (ItvLincons<N>, bool) {
        let (expr, linear) = ItvLinexpr::of_linexpr(&c.linexpr);
        (
            ItvLincons {
                expr,
                typ: c.typ,
                modulo: c.modulo.clone(),
            },
            linear,
        )
    }
}

/// Whether every value of `itv` satisfies the relation to zero.
pub(crate) fn sat_itv<N: Num>(
    itv: &Itv<N>,
    typ: ConsTyp,
    modulo: Option<&N>,
) -> crate::Trivalent {
    use crate::Trivalent;
    if itv.is_bottom() {
        return Trivalent::True;
    }
    let lo_sgn = itv
        .lower()
        .map(|l| l.sgn())
        .unwrap_or(Ordering::Less);
    let hi_sgn = itv
        .upper()
        .map(|u| u.sgn())
        .unwrap_or(Ordering::Greater);
    match typ {
        ConsTyp::SupEq => {
            if lo_sgn != Ordering::Less {
                Trivalent::True
            } else if hi_sgn == Ordering::Less {
                Trivalent::False
            } else {
                Trivalent::Unknown
            }
        }
        ConsTyp::Sup => {
            if lo_sgn == Ordering::Greater {
                Trivalent::True
            } else if hi_sgn != Ordering::Greater {
                Trivalent::False
            } else {
                Trivalent::Unknown
            }
        }
        ConsTyp::Eq => {
            if itv.is_point() && lo_sgn == Ordering::Equal {
                Trivalent::True
            } else if !itv.contains_zero() {
                Trivalent::False
            } else {
                Trivalent::Unknown
            }
        }
        ConsTyp::Diseq => {
            if !itv.contains_zero() {
                Trivalent::True
            } else if itv.is_point() && lo_sgn == Ordering::Equal {
                Trivalent::False
            } else {
                Trivalent::Unknown
            }
        }
        ConsTyp::EqMod => {
            let m = modulo.expect("modular constraint");
            if itv.is_point() {
                if let Some(v) = itv.lower() {
                    // v = 0 (mod m) iff v/m is an integer.
                    if m.is_zero() {
                        return if v.is_zero() {
                            Trivalent::True
                        } else {
                            Trivalent::False
                        };
                    }
                    // Divisibility: the quotient must be integral and must
                    // multiply back exactly (the latter catches scalar types
                    // whose division rounds).
                    let q = v.div(m);
                    if q.floor() == q.ceil() && m.mul(&q).cmp_num(&v) == Ordering::Equal {
                        return Trivalent::True;
                    }
                }
            }
            Trivalent::Unknown
        }
    }
}

/// Outcome of propagating one constraint through a box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Propagate {
    /// No bound moved.
    Unchanged,
    /// At least one bound was tightened.
    Tightened,
    /// The box became empty.
    Empty,
}

/// Tighten a box against one constraint.
///
/// The constraint is solved for each variable that carries a point
/// coefficient: with `expr = c*x + rest`, a lower or upper bound on `x`
/// follows from the bounds of `rest` evaluated over the current box.
/// Interval coefficients are not solved for (they still contribute to
/// `rest`), which loses precision but never soundness. `Diseq` and modular
/// constraints only participate through the variable-free emptiness check,
/// since a box cannot carve a hole out of an interval. Strict inequalities
/// are tightened like their non-strict counterparts; integer dimensions
/// recover the strictness through canonicalization.
pub(crate) fn meet_lincons<N: Num>(
    itvs: &mut [Itv<N>],
    intdim: usize,
    cons: &ItvLincons<N>,
) -> Propagate {
    // Variable-free satisfiability: an always-false constraint empties the
    // box regardless of its terms' coefficients.
    let value = cons.expr.eval(itvs);
    if sat_itv(&value, cons.typ, cons.modulo.as_ref()) == crate::Trivalent::False {
        return Propagate::Empty;
    }
    if cons.typ == ConsTyp::Diseq || cons.typ == ConsTyp::EqMod {
        return Propagate::Unchanged;
    }
    let mut changed = false;
    for (dim, coeff) in cons.expr.terms() {
        let Some(c) = coeff.as_point() else {
            continue;
        };
        if c.is_zero() {
            continue;
        }
        let rest = cons.expr.eval_without(itvs, *dim);
        if rest.is_bottom() {
            return Propagate::Empty;
        }
        let itv = &mut itvs[*dim];
        // expr = c*x + rest <typ> 0. Bounds below are stored negated on the
        // lower side, so a "tightened lower bound" is a smaller stored inf.
        let (cand_inf, cand_sup) = if c.sgn() == Ordering::Greater {
            // x >= -sup(rest)/c always; x <= -inf(rest)/c when typ is Eq.
            let inf = Some(rest.raw_sup().div_num(&c));
            let sup = if cons.typ == ConsTyp::Eq {
                Some(rest.raw_inf().div_num(&c))
            } else {
                None
            };
            (inf, sup)
        } else {
            let b = c.neg();
            // b*x <= sup(rest): x <= sup(rest)/b; Eq also x >= inf(rest)/b.
            let sup = Some(rest.raw_sup().div_num(&b));
            let inf = if cons.typ == ConsTyp::Eq {
                Some(rest.raw_inf().div_num(&b))
            } else {
                None
            };
            (inf, sup)
        };
        let mut touched = false;
        if let Some(ci) = cand_inf {
            if ci.cmp_bound(itv.raw_inf()) == Ordering::Less {
                itv.set_raw_inf(ci);
                touched = true;
            }
        }
        if let Some(cs) = cand_sup {
            if cs.cmp_bound(itv.raw_sup()) == Ordering::Less {
                itv.set_raw_sup(cs);
                touched = true;
            }
        }
        if touched {
            changed = true;
            if itv.canonicalize(*dim < intdim) {
                return Propagate::Empty;
            }
        }
    }
    if changed {
        Propagate::Tightened
    } else {
        Propagate::Unchanged
    }
}

/// Tighten a box against a constraint set with up to `kmax` Gauss-Seidel
/// sweeps. Returns true iff the box became empty.
pub(crate) fn meet_lincons_array<N: Num>(
    itvs: &mut [Itv<N>],
    intdim: usize,
    cons: &[ItvLincons<N>],
    kmax: usize,
) -> bool {
    for pass in 0..kmax.max(1) {
        let mut changed = false;
        for c in cons {
            match meet_lincons(itvs, intdim, c) {
                Propagate::Empty => return true,
                Propagate::Tightened => changed = true,
                Propagate::Unchanged => {}
            }
        }
        debug!(
            "constraint propagation pass {}: {}",
            pass,
            if changed { "tightened" } else { "stable" }
        );
        if !changed {
            return false;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::num::Rat;
    use crate::Trivalent;

    fn expr(terms: Vec<(Dim, i64)>, cst: i64) -> Linexpr0<Rat> {
        Linexpr0::of_terms(
            terms
                .into_iter()
                .map(|(d, c)| (d, Coeff::of_int(c)))
                .collect(),
            Coeff::of_int(cst),
        )
    }

    fn itv(l: i64, u: i64) -> Itv<Rat> {
        Itv::of_ints(l, u)
    }

    #[test]
    fn terms_stay_sorted_and_nonzero() {
        let mut e = expr(vec![(2, 1), (0, 3)], 0);
        assert_eq!(e.terms().iter().map(|(d, _)| *d).collect::<Vec<_>>(), [0, 2]);
        e.set_coeff(1, Coeff::of_int(5));
        assert_eq!(e.max_dim(), Some(2));
        e.set_coeff(2, Coeff::zero());
        assert_eq!(e.max_dim(), Some(1));
        assert_eq!(e.coeff(3), Coeff::zero());
    }

    #[test]
    fn equality_is_structural() {
        let a = expr(vec![(0, 2), (1, -1)], 3);
        assert_eq!(a, expr(vec![(1, -1), (0, 2)], 3));
        assert_ne!(a, expr(vec![(0, 2)], 3));
        assert_ne!(Coeff::<Rat>::of_int(1), Coeff::Interval(itv(1, 1)));
        let c = Lincons0::new(a.clone(), ConsTyp::SupEq);
        assert_eq!(c, Lincons0::new(a.clone(), ConsTyp::SupEq));
        assert_ne!(c, Lincons0::new(a, ConsTyp::Eq));
    }

    #[test]
    fn dimension_shifts_and_permutations() {
        let mut e = expr(vec![(0, 1), (1, 2)], 0);
        // Insert one dimension before dim 1: x1 becomes x2.
        let chg = DimChange::new(vec![1], vec![]).unwrap();
        e.add_dimensions(&chg);
        assert_eq!(e.terms().iter().map(|(d, _)| *d).collect::<Vec<_>>(), [0, 2]);
        let perm = DimPerm::with_swaps(3, &[(0, 2)]);
        e.permute_dimensions(&perm);
        assert_eq!(e.terms().iter().map(|(d, _)| *d).collect::<Vec<_>>(), [0, 2]);
        assert_eq!(e.coeff(0), Coeff::of_int(2));
        assert_eq!(e.coeff(2), Coeff::of_int(1));
    }

    #[test]
    fn eval_over_box() {
        // 2*x0 - x1 + 1 over x0 in [0,1], x1 in [2,3] is [-2,1].
        let (ie, linear) = ItvLinexpr::of_linexpr(&expr(vec![(0, 2), (1, -1)], 1));
        assert!(linear);
        assert_eq!(ie.eval(&[itv(0, 1), itv(2, 3)]), itv(-2, 1));
    }

    #[test]
    fn interval_coefficients_flag_nonlinear() {
        let mut e = expr(vec![], 3);
        e.set_coeff(0, Coeff::Interval(itv(1, 2)));
        let (ie, linear) = ItvLinexpr::of_linexpr(&e);
        assert!(!linear);
        assert_eq!(ie.eval(&[itv(0, 10)]), itv(3, 23));
    }

    #[test]
    fn sat_cases() {
        assert_eq!(sat_itv(&itv(1, 5), ConsTyp::SupEq, None), Trivalent::True);
        assert_eq!(sat_itv(&itv(-5, -1), ConsTyp::SupEq, None), Trivalent::False);
        assert_eq!(sat_itv(&itv(-1, 1), ConsTyp::SupEq, None), Trivalent::Unknown);
        assert_eq!(sat_itv(&itv(0, 0), ConsTyp::Sup, None), Trivalent::False);
        assert_eq!(sat_itv(&itv(0, 0), ConsTyp::Eq, None), Trivalent::True);
        assert_eq!(sat_itv(&itv(0, 1), ConsTyp::Eq, None), Trivalent::Unknown);
        assert_eq!(sat_itv(&itv(1, 2), ConsTyp::Diseq, None), Trivalent::True);
        assert_eq!(sat_itv(&itv(0, 0), ConsTyp::Diseq, None), Trivalent::False);
        let six = <Rat as Num>::of_int(6);
        let three = <Rat as Num>::of_int(3);
        assert_eq!(
            sat_itv(&Itv::point(six), ConsTyp::EqMod, Some(&three)),
            Trivalent::True
        );
        let b: Itv<Rat> = Itv::bottom();
        assert_eq!(sat_itv(&b, ConsTyp::Sup, None), Trivalent::True);
    }

    #[test]
    fn equality_pins_a_variable() {
        // x0 - 3 = 0 and 3 - x0 >= 0 both lead to x0 in [3,3].
        let (c, _) = ItvLincons::of_lincons(&Lincons0::new(expr(vec![(0, 1)], -3), ConsTyp::Eq));
        let mut b = vec![itv(0, 10)];
        assert_eq!(meet_lincons(&mut b, 0, &c), Propagate::Tightened);
        assert_eq!(b[0], itv(3, 3));
    }

    #[test]
    fn inequality_pair_propagates_to_a_point() {
        // x0 - 3 >= 0 then 3 - x0 >= 0.
        let (c1, _) =
            ItvLincons::of_lincons(&Lincons0::new(expr(vec![(0, 1)], -3), ConsTyp::SupEq));
        let (c2, _) =
            ItvLincons::of_lincons(&Lincons0::new(expr(vec![(0, -1)], 3), ConsTyp::SupEq));
        let mut b = vec![itv(-100, 100)];
        assert!(!meet_lincons_array(&mut b, 0, &[c1, c2], 2));
        assert_eq!(b[0], itv(3, 3));
    }

    #[test]
    fn contradictory_constraints_empty_the_box() {
        // x0 >= 1 and -x0 >= 0 cannot both hold.
        let (c1, _) =
            ItvLincons::of_lincons(&Lincons0::new(expr(vec![(0, 1)], -1), ConsTyp::SupEq));
        let (c2, _) =
            ItvLincons::of_lincons(&Lincons0::new(expr(vec![(0, -1)], 0), ConsTyp::SupEq));
        let mut b = vec![itv(-100, 100)];
        assert!(meet_lincons_array(&mut b, 0, &[c1, c2], 2));
    }

    #[test]
    fn constant_false_constraint_empties() {
        let (c, _) = ItvLincons::of_lincons(&Lincons0::new(expr(vec![], -1), ConsTyp::SupEq));
        let mut b = vec![itv(0, 10)];
        assert_eq!(meet_lincons(&mut b, 0, &c), Propagate::Empty);
    }

    #[test]
    fn integer_dimension_rounds_after_tightening() {
        // 2*x0 - 5 >= 0 over an integer dimension gives x0 >= 3.
        let (c, _) =
            ItvLincons::of_lincons(&Lincons0::new(expr(vec![(0, 2)], -5), ConsTyp::SupEq));
        let mut b = vec![itv(0, 10)];
        assert_eq!(meet_lincons(&mut b, 1, &c), Propagate::Tightened);
        assert_eq!(b[0], itv(3, 10));
    }

    #[test]
    fn gauss_seidel_chains_constraints() {
        // x0 <= 5 and x1 - x0 = 0: the second pass sees the tightened x0.
        let (c1, _) =
            ItvLincons::of_lincons(&Lincons0::new(expr(vec![(0, -1)], 5), ConsTyp::SupEq));
        let (c2, _) =
            ItvLincons::of_lincons(&Lincons0::new(expr(vec![(0, -1), (1, 1)], 0), ConsTyp::Eq));
        let mut b = vec![itv(0, 100), itv(0, 100)];
        assert!(!meet_lincons_array(&mut b, 0, &[c1, c2], 2));
        assert_eq!(b[0], itv(0, 5));
        assert_eq!(b[1], itv(0, 5));
    }

    #[test]
    fn diseq_only_checks_satisfiability() {
        let (c, _) = ItvLincons::of_lincons(&Lincons0::new(expr(vec![(0, 1)], 0), ConsTyp::Diseq));
        let mut b = vec![itv(0, 10)];
        assert_eq!(meet_lincons(&mut b, 0, &c), Propagate::Unchanged);
        // A pinned zero violates it.
        let mut z = vec![itv(0, 0)];
        assert_eq!(meet_lincons(&mut z, 0, &c), Propagate::Empty);
    }

    #[test]
    fn trivial_constraint_detection() {
        assert!(Lincons0::<Rat>::new(expr(vec![], 1), ConsTyp::SupEq).is_unconstraining());
        assert!(!Lincons0::<Rat>::new(expr(vec![], -1), ConsTyp::SupEq).is_unconstraining());
        assert!(!Lincons0::<Rat>::new(expr(vec![(0, 1)], 1), ConsTyp::SupEq).is_unconstraining());
    }
}
