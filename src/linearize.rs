//! Expression linearization.
//!
//! Domain engines that only understand linear constraints still receive
//! interval-coefficient expressions and arbitrary expression trees. This
//! module reduces both:
//!
//! * *quasilinearization* folds every interval coefficient of a linear
//!   expression into the constant, using the value's bounding box, leaving a
//!   scalar-coefficient expression plus an interval constant;
//! * *linearization* of a [`Texpr0`] tree rewrites nonlinear nodes into
//!   interval-coefficient linear form against the box, after which
//!   quasilinearization applies.
//!
//! Both directions only ever widen, so the results are sound
//! over-approximations; exactness flags report when nothing was lost.

use std::cmp::Ordering;
use std::fmt;

use crate::dimension::Dim;
use crate::domain::Domain;
use crate::interval::Itv;
use crate::linexpr::{Coeff, ConsTyp, Lincons0, Linexpr0};
use crate::manager::{Exactness, Exception};
use crate::num::Num;
use crate::Trivalent;

/// A tree expression over abstract dimensions.
///
/// # Examples
/// ```
/// # use warren::interval::Itv;
/// # use warren::linearize::Texpr0;
/// # use warren::linexpr::Coeff;
/// # use warren::num::Rat;
/// // x0 * x0
/// let e: Texpr0<Rat> = Texpr0::Mul(
///     Box::new(Texpr0::Dim(0)),
///     Box::new(Texpr0::Dim(0)),
/// );
/// let sq = e.eval(&[Itv::of_ints(-2, 3)]);
/// assert!(sq.contains(&Itv::of_ints(0, 9)));
/// ```
#[derive(Clone, Debug)]
pub enum Texpr0<N> {
    /// A constant.
    Cst(Coeff<N>),
    /// A dimension.
    Dim(Dim),
    /// Negation.
    Neg(Box<Texpr0<N>>),
    /// Square root.
    Sqrt(Box<Texpr0<N>>),
    /// Sum.
    Add(Box<Texpr0<N>>, Box<Texpr0<N>>),
    /// Difference.
    Sub(Box<Texpr0<N>>, Box<Texpr0<N>>),
    /// Product.
    Mul(Box<Texpr0<N>>, Box<Texpr0<N>>),
    /// Quotient.
    Div(Box<Texpr0<N>>, Box<Texpr0<N>>),
}

impl<N: Num> PartialEq for Texpr0<N> {
    fn eq(&self, other: &Texpr0<N>) -> bool {
        match (self, other) {
            (Texpr0::Cst(a), Texpr0::Cst(b)) => a == b,
            (Texpr0::Dim(a), Texpr0::Dim(b)) => a == b,
            (Texpr0::Neg(a), Texpr0::Neg(b)) | (Texpr0::Sqrt(a), Texpr0::Sqrt(b)) => a == b,
            (Texpr0::Add(a1, a2), Texpr0::Add(b1, b2))
            | (Texpr0::Sub(a1, a2), Texpr0::Sub(b1, b2))
            | (Texpr0::Mul(a1, a2), Texpr0::Mul(b1, b2))
            | (Texpr0::Div(a1, a2), Texpr0::Div(b1, b2)) => a1 == b1 && a2 == b2,
            _ => false,
        }
    }
}

impl<N: Num> Texpr0<N> {
    /// The largest dimension mentioned, if any.
    pub fn max_dim(&self) -> Option<Dim> {
        match self {
            Texpr0::Cst(_) => None,
            Texpr0::Dim(d) => Some(*d),
            Texpr0::Neg(e) | Texpr0::Sqrt(e) => e.max_dim(),
            Texpr0::Add(a, b) | Texpr0::Sub(a, b) | Texpr0::Mul(a, b) | Texpr0::Div(a, b) => {
                match (a.max_dim(), b.max_dim()) {
                    (Some(x), Some(y)) => Some(x.max(y)),
                    (x, y) => x.or(y),
                }
            }
        }
    }

    /// Whether the tree is a linear combination with scalar coefficients.
    pub fn is_linear(&self) -> bool {
        match self {
            Texpr0::Cst(c) => c.as_point().is_some(),
            Texpr0::Dim(_) => true,
            Texpr0::Neg(e) => e.is_linear(),
            Texpr0::Sqrt(_) | Texpr0::Div(_, _) => false,
            Texpr0::Add(a, b) | Texpr0::Sub(a, b) => a.is_linear() && b.is_linear(),
            Texpr0::Mul(a, b) => {
                (a.is_constant() && b.is_linear()) || (b.is_constant() && a.is_linear())
            }
        }
    }

    fn is_constant(&self) -> bool {
        self.max_dim().is_none()
    }

    /// Interval evaluation over a box, one interval per dimension.
    ///
    /// # Panics
    /// Panics if the tree mentions a dimension outside the box.
    pub fn eval(&self, itvs: &[Itv<N>]) -> Itv<N> {
        match self {
            Texpr0::Cst(c) => c.to_itv(),
            Texpr0::Dim(d) => itvs[*d].clone(),
            Texpr0::Neg(e) => e.eval(itvs).negate(),
            Texpr0::Sqrt(e) => e.eval(itvs).sqrt().unwrap_or_else(Itv::bottom),
            Texpr0::Add(a, b) => a.eval(itvs).add(&b.eval(itvs)),
            Texpr0::Sub(a, b) => a.eval(itvs).sub(&b.eval(itvs)),
            Texpr0::Mul(a, b) => a.eval(itvs).mul(&b.eval(itvs)),
            Texpr0::Div(a, b) => a.eval(itvs).div(&b.eval(itvs)),
        }
    }

    /// Rewrite the tree into an interval-coefficient linear expression,
    /// sound over the given box.
    ///
    /// Sums and differences stay structural. A product keeps the side with
    /// the wider evaluation range linear and collapses the other side into
    /// an interval coefficient, so the coefficient interval is as narrow as
    /// possible. Quotients, square roots, and products of two unbounded
    /// sides collapse into their interval evaluation.
    pub fn linearize(&self, itvs: &[Itv<N>]) -> (Linexpr0<N>, Exactness) {
        match self {
            Texpr0::Cst(c) => (Linexpr0::new(c.clone()), Exactness::Exact),
            Texpr0::Dim(d) => {
                let mut e = Linexpr0::new(Coeff::zero());
                e.set_coeff(*d, Coeff::of_int(1));
                (e, Exactness::Exact)
            }
            Texpr0::Neg(e) => {
                let (le, x) = e.linearize(itvs);
                (le.neg(), x)
            }
            Texpr0::Add(a, b) => {
                let (la, xa) = a.linearize(itvs);
                let (lb, xb) = b.linearize(itvs);
                (add_exprs(&la, &lb), xa.meet(xb))
            }
            Texpr0::Sub(a, b) => {
                let (la, xa) = a.linearize(itvs);
                let (lb, xb) = b.linearize(itvs);
                (add_exprs(&la, &lb.neg()), xa.meet(xb))
            }
            Texpr0::Mul(a, b) => {
                let (la, xa) = a.linearize(itvs);
                let (lb, xb) = b.linearize(itvs);
                let x = xa.meet(xb);
                if la.terms().is_empty() {
                    let c = la.cst().to_itv();
                    let exact = if c.is_point() { x } else { Exactness::Approximate };
                    (scale_expr(&lb, &c), exact)
                } else if lb.terms().is_empty() {
                    let c = lb.cst().to_itv();
                    let exact = if c.is_point() { x } else { Exactness::Approximate };
                    (scale_expr(&la, &c), exact)
                } else {
                    // Both sides mention dimensions: collapse the side with
                    // the narrower range into a coefficient interval.
                    let ra = eval_linexpr(&la, itvs);
                    let rb = eval_linexpr(&lb, itvs);
                    let scaled = if ra.cmp_range(&rb) == Ordering::Greater {
                        scale_expr(&la, &rb)
                    } else {
                        scale_expr(&lb, &ra)
                    };
                    (scaled, Exactness::Approximate)
                }
            }
            Texpr0::Div(a, b) => {
                let (la, xa) = a.linearize(itvs);
                let denom = b.eval(itvs);
                if !denom.contains_zero() && !denom.is_bottom() {
                    let recip = Itv::point(N::one()).div(&denom);
                    let exact = if denom.is_point() { xa } else { Exactness::Approximate };
                    (scale_expr(&la, &recip), exact)
                } else {
                    (
                        Linexpr0::new(coeff_of_itv(self.eval(itvs))),
                        Exactness::Approximate,
                    )
                }
            }
            Texpr0::Sqrt(_) => (
                Linexpr0::new(coeff_of_itv(self.eval(itvs))),
                Exactness::Approximate,
            ),
        }
    }
}

impl<N: Num> fmt::Display for Texpr0<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Texpr0::Cst(c) => write!(f, "{}", c),
            Texpr0::Dim(d) => write!(f, "x{}", d),
            Texpr0::Neg(e) => write!(f, "(- {})", e),
            Texpr0::Sqrt(e) => write!(f, "sqrt({})", e),
            Texpr0::Add(a, b) => write!(f, "({} + {})", a, b),
            Texpr0::Sub(a, b) => write!(f, "({} - {})", a, b),
            Texpr0::Mul(a, b) => write!(f, "({} * {})", a, b),
            Texpr0::Div(a, b) => write!(f, "({} / {})", a, b),
        }
    }
}

/// A tree constraint `texpr <typ> 0`.
#[derive(Clone, Debug)]
pub struct Tcons0<N> {
    /// The left-hand tree.
    pub texpr: Texpr0<N>,
    /// The relation to zero.
    pub typ: ConsTyp,
    /// The modulus for [`ConsTyp::EqMod`].
    pub modulo: Option<N>,
}

impl<N: Num> PartialEq for Tcons0<N> {
    fn eq(&self, other: &Tcons0<N>) -> bool {
        self.texpr == other.texpr && self.typ == other.typ && self.modulo == other.modulo
    }
}

impl<N: Num> Tcons0<N> {
    /// A tree constraint without a modulus.
    ///
    /// # Panics
    /// Panics if `typ` is [`ConsTyp::EqMod`].
    pub fn new(texpr: Texpr0<N>, typ: ConsTyp) -> Tcons0<N> {
        assert!(
            typ != ConsTyp::EqMod,
            "A modular constraint requires a modulus"
        );
        Tcons0 {
            texpr,
            typ,
            modulo: None,
        }
    }
}

fn coeff_of_itv<N: Num>(i: Itv<N>) -> Coeff<N> {
    if i.is_point() {
        Coeff::Scalar(i.lower().expect("point interval has a finite bound"))
    } else {
        Coeff::Interval(i)
    }
}

fn coeff_add<N: Num>(a: &Coeff<N>, b: &Coeff<N>) -> Coeff<N> {
    match (a.as_point(), b.as_point()) {
        (Some(x), Some(y)) => Coeff::Scalar(x.add(&y)),
        _ => coeff_of_itv(a.to_itv().add(&b.to_itv())),
    }
}

fn add_exprs<N: Num>(a: &Linexpr0<N>, b: &Linexpr0<N>) -> Linexpr0<N> {
    let mut out = a.clone();
    for (d, c) in b.terms() {
        out.set_coeff(*d, coeff_add(&out.coeff(*d), c));
    }
    out.set_cst(coeff_add(a.cst(), b.cst()));
    out
}

fn scale_expr<N: Num>(e: &Linexpr0<N>, by: &Itv<N>) -> Linexpr0<N> {
    let terms = e
        .terms()
        .iter()
        .map(|(d, c)| (*d, coeff_of_itv(c.to_itv().mul(by))))
        .collect();
    Linexpr0::of_terms(terms, coeff_of_itv(e.cst().to_itv().mul(by)))
}

fn eval_linexpr<N: Num>(e: &Linexpr0<N>, itvs: &[Itv<N>]) -> Itv<N> {
    let mut acc = e.cst().to_itv();
    for (d, c) in e.terms() {
        acc = acc.add(&c.to_itv().mul(&itvs[*d]));
    }
    acc
}

/// Quasilinearize a linear expression against a value: every interval
/// coefficient is multiplied by its dimension's range and folded into the
/// constant, leaving scalar coefficients only.
///
/// On a bottom value the expression is returned unchanged and exact: any
/// expression is a sound linearization on the empty set.
pub fn quasilinearize_linexpr<D: Domain>(
    domain: &D,
    v: &D::Value,
    expr: &Linexpr0<D::Num>,
) -> Result<(Linexpr0<D::Num>, Exactness), Exception> {
    let nonpoint = expr
        .terms()
        .iter()
        .any(|(_, c)| c.as_point().is_none());
    if !nonpoint {
        return Ok((expr.clone(), Exactness::Exact));
    }
    if domain.is_bottom(v) == Trivalent::True {
        return Ok((expr.clone(), Exactness::Exact));
    }
    let itvs = domain.to_box(v)?.value;
    let mut out = Linexpr0::new(Coeff::zero());
    let mut cst = expr.cst().to_itv();
    for (d, c) in expr.terms() {
        match c.as_point() {
            Some(s) => out.set_coeff(*d, Coeff::Scalar(s)),
            None => {
                cst = cst.add(&c.to_itv().mul(&itvs[*d]));
            }
        }
    }
    out.set_cst(coeff_of_itv(cst));
    Ok((out, Exactness::Approximate))
}

/// Quasilinearize a constraint; the relation and modulus are unchanged.
pub fn quasilinearize_lincons<D: Domain>(
    domain: &D,
    v: &D::Value,
    cons: &Lincons0<D::Num>,
) -> Result<(Lincons0<D::Num>, Exactness), Exception> {
    let (linexpr, x) = quasilinearize_linexpr(domain, v, &cons.linexpr)?;
    Ok((
        Lincons0 {
            linexpr,
            typ: cons.typ,
            modulo: cons.modulo.clone(),
        },
        x,
    ))
}

/// Quasilinearize a constraint set.
pub fn quasilinearize_lincons_array<D: Domain>(
    domain: &D,
    v: &D::Value,
    cons: &[Lincons0<D::Num>],
) -> Result<(Vec<Lincons0<D::Num>>, Exactness), Exception> {
    let mut out = Vec::with_capacity(cons.len());
    let mut x = Exactness::Exact;
    for c in cons {
        let (qc, xc) = quasilinearize_lincons(domain, v, c)?;
        x = x.meet(xc);
        out.push(qc);
    }
    Ok((out, x))
}

/// Replace interval constants by scalar ones, splitting where needed:
/// `e + [a,b] >= 0` becomes `e + b >= 0`, and `e + [a,b] = 0` becomes the
/// pair `e + b >= 0`, `-e - a >= 0`. Disequalities and modular constraints
/// with a genuine interval constant are dropped (a sound weakening).
pub fn linearize_lincons_array<N: Num>(cons: &[Lincons0<N>]) -> Vec<Lincons0<N>> {
    let mut out = Vec::with_capacity(cons.len());
    for c in cons {
        match c.linexpr.cst().as_point() {
            Some(_) => out.push(c.clone()),
            None => {
                let itv = c.linexpr.cst().to_itv();
                match c.typ {
                    ConsTyp::SupEq | ConsTyp::Sup => {
                        if let Some(u) = itv.upper() {
                            let mut e = c.linexpr.clone();
                            e.set_cst(Coeff::Scalar(u));
                            out.push(Lincons0::new(e, c.typ));
                        }
                        // An unbounded constant constrains nothing.
                    }
                    ConsTyp::Eq => {
                        if let Some(u) = itv.upper() {
                            let mut e = c.linexpr.clone();
                            e.set_cst(Coeff::Scalar(u));
                            out.push(Lincons0::new(e, ConsTyp::SupEq));
                        }
                        if let Some(l) = itv.lower() {
                            let mut e = c.linexpr.neg();
                            e.set_cst(Coeff::Scalar(l.neg()));
                            out.push(Lincons0::new(e, ConsTyp::SupEq));
                        }
                    }
                    ConsTyp::Diseq | ConsTyp::EqMod => {}
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::BoxDomain;
    use crate::dimension::Dimensions;
    use crate::num::Rat;

    fn itv(l: i64, u: i64) -> Itv<Rat> {
        Itv::of_ints(l, u)
    }

    fn dim(d: Dim) -> Texpr0<Rat> {
        Texpr0::Dim(d)
    }

    fn cst(n: i64) -> Texpr0<Rat> {
        Texpr0::Cst(Coeff::of_int(n))
    }

    #[test]
    fn tree_equality_is_structural() {
        let a = Texpr0::Add(Box::new(dim(0)), Box::new(cst(1)));
        assert_eq!(a, a.clone());
        assert_ne!(a, Texpr0::Add(Box::new(cst(1)), Box::new(dim(0))));
        assert_ne!(a, dim(0));
        let t = Tcons0::new(a.clone(), ConsTyp::SupEq);
        assert_eq!(t, Tcons0::new(a, ConsTyp::SupEq));
    }

    #[test]
    fn eval_follows_the_tree() {
        // (x0 + 1) * x1 over x0 in [0,2], x1 in [-1,1].
        let e = Texpr0::Mul(
            Box::new(Texpr0::Add(Box::new(dim(0)), Box::new(cst(1)))),
            Box::new(dim(1)),
        );
        assert_eq!(e.eval(&[itv(0, 2), itv(-1, 1)]), itv(-3, 3));
    }

    #[test]
    fn linear_trees_linearize_exactly() {
        // 2*x0 - x1 + 5 stays exact.
        let e = Texpr0::Add(
            Box::new(Texpr0::Sub(
                Box::new(Texpr0::Mul(Box::new(cst(2)), Box::new(dim(0)))),
                Box::new(dim(1)),
            )),
            Box::new(cst(5)),
        );
        assert!(e.is_linear());
        let (le, x) = e.linearize(&[itv(0, 1), itv(0, 1)]);
        assert_eq!(x, Exactness::Exact);
        assert_eq!(le.coeff(0), Coeff::of_int(2));
        assert_eq!(le.coeff(1), Coeff::of_int(-1));
        assert_eq!(le.cst(), &Coeff::of_int(5));
    }

    #[test]
    fn products_collapse_the_narrower_side() {
        // x0 * x1 with x0 in [1,2] (narrow) and x1 in [0,100] (wide): x1
        // stays linear with coefficient [1,2].
        let e = Texpr0::Mul(Box::new(dim(0)), Box::new(dim(1)));
        let (le, x) = e.linearize(&[itv(1, 2), itv(0, 100)]);
        assert_eq!(x, Exactness::Approximate);
        assert_eq!(le.coeff(1), Coeff::Interval(itv(1, 2)));
        assert_eq!(le.coeff(0), Coeff::zero());
    }

    #[test]
    fn division_by_a_sign_definite_constant_scales() {
        // x0 / 2 is exact.
        let e = Texpr0::Div(Box::new(dim(0)), Box::new(cst(2)));
        let (le, x) = e.linearize(&[itv(0, 10)]);
        assert_eq!(x, Exactness::Exact);
        assert_eq!(
            le.coeff(0),
            Coeff::Scalar(Rat::new(1.into(), 2.into()))
        );
    }

    #[test]
    fn division_by_zero_straddler_collapses() {
        let e = Texpr0::Div(Box::new(dim(0)), Box::new(dim(1)));
        let (le, x) = e.linearize(&[itv(1, 2), itv(-1, 1)]);
        assert_eq!(x, Exactness::Approximate);
        assert!(le.terms().is_empty());
    }

    #[test]
    fn quasilinearization_folds_interval_coefficients() {
        // [1,2]*x0 + 3 over x0 in [0,10] becomes the constant [3,23].
        let man = BoxDomain::<Rat>::new();
        let v = man.top(Dimensions::new(0, 1)).value;
        let v = man
            .meet_lincons_array(&v, &boxed_cons())
            .unwrap()
            .value;
        let mut e = Linexpr0::new(Coeff::of_int(3));
        e.set_coeff(0, Coeff::Interval(itv(1, 2)));
        let (q, x) = quasilinearize_linexpr(&man, &v, &e).unwrap();
        assert_eq!(x, Exactness::Approximate);
        assert!(q.terms().is_empty());
        assert_eq!(q.cst(), &Coeff::Interval(itv(3, 23)));
    }

    // x0 in [0, 10] as constraints.
    fn boxed_cons() -> Vec<Lincons0<Rat>> {
        let mut lo = Linexpr0::new(Coeff::of_int(0));
        lo.set_coeff(0, Coeff::of_int(1));
        let mut hi = Linexpr0::new(Coeff::of_int(10));
        hi.set_coeff(0, Coeff::of_int(-1));
        vec![
            Lincons0::new(lo, ConsTyp::SupEq),
            Lincons0::new(hi, ConsTyp::SupEq),
        ]
    }

    #[test]
    fn scalar_expressions_pass_through_unchanged() {
        let man = BoxDomain::<Rat>::new();
        let v = man.top(Dimensions::new(0, 1)).value;
        let mut e = Linexpr0::<Rat>::new(Coeff::of_int(3));
        e.set_coeff(0, Coeff::of_int(2));
        let (q, x) = quasilinearize_linexpr(&man, &v, &e).unwrap();
        assert_eq!(x, Exactness::Exact);
        assert_eq!(q, e);
    }

    #[test]
    fn interval_constants_split_equalities() {
        // x0 + [1,2] = 0 becomes x0 + 2 >= 0 and -x0 - 1 >= 0.
        let mut e = Linexpr0::<Rat>::new(Coeff::Interval(itv(1, 2)));
        e.set_coeff(0, Coeff::of_int(1));
        let out = linearize_lincons_array(&[Lincons0 {
            linexpr: e,
            typ: ConsTyp::Eq,
            modulo: None,
        }]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].typ, ConsTyp::SupEq);
        assert_eq!(out[0].linexpr.cst(), &Coeff::Scalar(<Rat as Num>::of_int(2)));
        assert_eq!(out[1].linexpr.coeff(0), Coeff::of_int(-1));
        assert_eq!(out[1].linexpr.cst(), &Coeff::Scalar(<Rat as Num>::of_int(-1)));
    }
}
