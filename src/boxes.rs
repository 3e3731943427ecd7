//! The box (interval) domain engine: one interval per dimension.
//!
//! A non-bottom value is kept canonical at all times: integer dimensions
//! carry integral bounds and no component interval is empty. Emptiness is
//! represented explicitly, so equality and inclusion tests are cheap
//! structural comparisons.
//!
//! The engine implements the operation table natively wherever a box can do
//! better than the generic fallbacks; array meets/joins, substitution, tree
//! constraints, closure, and serialization are deliberately left to the
//! dispatch layer.

use std::fmt;
use std::marker::PhantomData;

use crate::dimension::{Dim, DimChange, DimPerm, Dimensions};
use crate::domain::{Domain, Flagged};
use crate::interval::Itv;
use crate::linearize::{Tcons0, Texpr0};
use crate::linexpr::{
    self, Coeff, ConsTyp, ItvLincons, ItvLinexpr, Lincons0, Linexpr0,
};
use crate::manager::{Exception, FunId};
use crate::num::Num;
use crate::Trivalent;

/// Default number of constraint-propagation sweeps.
const DEFAULT_PASSES: usize = 2;

/// The box domain engine, parameterized by the scalar representation.
///
/// # Examples
/// ```
/// # use warren::boxes::BoxDomain;
/// # use warren::dimension::Dimensions;
/// # use warren::domain::Domain;
/// # use warren::num::Rat;
/// let dom = BoxDomain::<Rat>::new();
/// let top = dom.top(Dimensions::new(1, 1)).value;
/// assert_eq!(dom.is_top(&top), warren::Trivalent::True);
/// ```
pub struct BoxDomain<N> {
    kmax: usize,
    _marker: PhantomData<N>,
}

impl<N: Num> BoxDomain<N> {
    /// An engine with the default propagation pass count.
    pub fn new() -> BoxDomain<N> {
        BoxDomain::with_passes(DEFAULT_PASSES)
    }

    /// An engine performing up to `kmax` propagation sweeps per constraint
    /// meet.
    pub fn with_passes(kmax: usize) -> BoxDomain<N> {
        BoxDomain {
            kmax: kmax.max(1),
            _marker: PhantomData,
        }
    }
}

impl<N: Num> Default for BoxDomain<N> {
    fn default() -> BoxDomain<N> {
        BoxDomain::new()
    }
}

/// A box value: `None` is the empty box, `Some` holds one canonical
/// interval per dimension.
#[derive(Clone, Debug)]
pub struct BoxValue<N> {
    dims: Dimensions,
    itvs: Option<Vec<Itv<N>>>,
}

impl<N: Num> BoxValue<N> {
    /// Build a value from raw intervals, canonicalizing and collapsing to
    /// bottom if any component is empty.
    fn of_itvs(dims: Dimensions, mut itvs: Vec<Itv<N>>) -> BoxValue<N> {
        for (d, itv) in itvs.iter_mut().enumerate() {
            if itv.canonicalize(dims.is_int(d)) {
                return BoxValue { dims, itvs: None };
            }
        }
        BoxValue {
            dims,
            itvs: Some(itvs),
        }
    }

    fn bottom(dims: Dimensions) -> BoxValue<N> {
        BoxValue { dims, itvs: None }
    }

    /// The per-dimension intervals, or `None` for the empty box.
    pub fn intervals(&self) -> Option<&[Itv<N>]> {
        self.itvs.as_deref()
    }
}

impl<N: Num> PartialEq for BoxValue<N> {
    fn eq(&self, other: &BoxValue<N>) -> bool {
        self.dims == other.dims && self.itvs == other.itvs
    }
}

impl<N: Num> fmt::Display for BoxValue<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.itvs {
            None => write!(f, "bottom{}", self.dims),
            Some(itvs) => {
                write!(f, "{{")?;
                for (d, itv) in itvs.iter().enumerate() {
                    if d > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "x{} in {}", d, itv)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl<N: Num> Domain for BoxDomain<N> {
    type Num = N;
    type Value = BoxValue<N>;

    fn library(&self) -> &str {
        "warren.boxes"
    }

    fn top(&self, dims: Dimensions) -> Flagged<BoxValue<N>> {
        Flagged::exact(BoxValue {
            dims,
            itvs: Some(vec![Itv::top(); dims.total()]),
        })
    }

    fn bottom(&self, dims: Dimensions) -> Flagged<BoxValue<N>> {
        Flagged::exact(BoxValue::bottom(dims))
    }

    fn dimension(&self, v: &BoxValue<N>) -> Dimensions {
        v.dims
    }

    fn asize(&self, v: &BoxValue<N>) -> Result<usize, Exception> {
        Ok(v.dims.total())
    }

    fn minimize(&self, _v: &mut BoxValue<N>) -> Result<(), Exception> {
        // Values are kept canonical and minimal by construction.
        Ok(())
    }

    fn canonicalize(&self, _v: &mut BoxValue<N>) -> Result<(), Exception> {
        Ok(())
    }

    fn is_minimal(&self, _v: &BoxValue<N>) -> Trivalent {
        Trivalent::True
    }

    fn is_canonical(&self, _v: &BoxValue<N>) -> Trivalent {
        Trivalent::True
    }

    fn of_box(
        &self,
        dims: Dimensions,
        itvs: &[Itv<N>],
    ) -> Result<Flagged<BoxValue<N>>, Exception> {
        if itvs.len() != dims.total() {
            return Err(Exception::invalid_argument(
                FunId::OfBox,
                format!(
                    "{} intervals for a space of {} dimensions",
                    itvs.len(),
                    dims.total()
                ),
            ));
        }
        Ok(Flagged::exact(BoxValue::of_itvs(dims, itvs.to_vec())))
    }

    fn is_bottom(&self, v: &BoxValue<N>) -> Trivalent {
        Trivalent::from(v.itvs.is_none())
    }

    fn is_top(&self, v: &BoxValue<N>) -> Trivalent {
        match &v.itvs {
            None => Trivalent::from(false),
            Some(itvs) => Trivalent::from(itvs.iter().all(|i| i.is_top())),
        }
    }

    fn is_leq(&self, a: &BoxValue<N>, b: &BoxValue<N>) -> Trivalent {
        match (&a.itvs, &b.itvs) {
            (None, _) => Trivalent::True,
            (Some(_), None) => Trivalent::False,
            (Some(x), Some(y)) => {
                Trivalent::from(x.iter().zip(y.iter()).all(|(i, j)| j.contains(i)))
            }
        }
    }

    fn is_eq(&self, a: &BoxValue<N>, b: &BoxValue<N>) -> Trivalent {
        Trivalent::from(a == b)
    }

    fn is_dimension_unconstrained(&self, v: &BoxValue<N>, dim: Dim) -> Trivalent {
        match &v.itvs {
            None => Trivalent::False,
            Some(itvs) => Trivalent::from(itvs[dim].is_top()),
        }
    }

    fn sat_interval(&self, v: &BoxValue<N>, dim: Dim, itv: &Itv<N>) -> Trivalent {
        match &v.itvs {
            None => Trivalent::True,
            Some(itvs) => Trivalent::from(itv.contains(&itvs[dim])),
        }
    }

    fn sat_lincons(&self, v: &BoxValue<N>, cons: &Lincons0<N>) -> Trivalent {
        match &v.itvs {
            None => Trivalent::True,
            Some(itvs) => {
                let (c, _) = ItvLincons::of_lincons(cons);
                linexpr::sat_itv(&c.expr.eval(itvs), c.typ, c.modulo.as_ref())
            }
        }
    }

    fn sat_tcons(&self, v: &BoxValue<N>, cons: &Tcons0<N>) -> Trivalent {
        match &v.itvs {
            None => Trivalent::True,
            Some(itvs) => {
                linexpr::sat_itv(&cons.texpr.eval(itvs), cons.typ, cons.modulo.as_ref())
            }
        }
    }

    fn bound_dimension(
        &self,
        v: &BoxValue<N>,
        dim: Dim,
    ) -> Result<Flagged<Itv<N>>, Exception> {
        match &v.itvs {
            None => Ok(Flagged::exact(Itv::bottom())),
            Some(itvs) => Ok(Flagged::exact(itvs[dim].clone())),
        }
    }

    fn bound_linexpr(
        &self,
        v: &BoxValue<N>,
        expr: &Linexpr0<N>,
    ) -> Result<Flagged<Itv<N>>, Exception> {
        match &v.itvs {
            None => Ok(Flagged::exact(Itv::bottom())),
            Some(itvs) => {
                let (ie, linear) = ItvLinexpr::of_linexpr(expr);
                let r = ie.eval(itvs);
                Ok(if linear {
                    Flagged::exact(r)
                } else {
                    Flagged::approximate(r)
                })
            }
        }
    }

    fn bound_texpr(
        &self,
        v: &BoxValue<N>,
        expr: &Texpr0<N>,
    ) -> Result<Flagged<Itv<N>>, Exception> {
        match &v.itvs {
            None => Ok(Flagged::exact(Itv::bottom())),
            Some(itvs) => {
                let r = expr.eval(itvs);
                Ok(if expr.is_linear() {
                    Flagged::exact(r)
                } else {
                    Flagged::approximate(r)
                })
            }
        }
    }

    fn to_box(&self, v: &BoxValue<N>) -> Result<Flagged<Vec<Itv<N>>>, Exception> {
        match &v.itvs {
            None => Ok(Flagged::exact(vec![Itv::bottom(); v.dims.total()])),
            Some(itvs) => Ok(Flagged::exact(itvs.clone())),
        }
    }

    fn to_lincons_array(
        &self,
        v: &BoxValue<N>,
    ) -> Result<Flagged<Vec<Lincons0<N>>>, Exception> {
        let itvs = match &v.itvs {
            None => {
                // The canonical unsatisfiable constraint.
                return Ok(Flagged::exact(vec![Lincons0::new(
                    Linexpr0::new(Coeff::of_int(-1)),
                    ConsTyp::SupEq,
                )]));
            }
            Some(itvs) => itvs,
        };
        let mut out = Vec::new();
        for (d, itv) in itvs.iter().enumerate() {
            if itv.is_point() {
                // x_d - c = 0.
                let c = itv.lower().expect("point interval has a finite bound");
                let mut e = Linexpr0::new(Coeff::Scalar(c.neg()));
                e.set_coeff(d, Coeff::of_int(1));
                out.push(Lincons0::new(e, ConsTyp::Eq));
                continue;
            }
            if let Some(l) = itv.lower() {
                // x_d - l >= 0.
                let mut e = Linexpr0::new(Coeff::Scalar(l.neg()));
                e.set_coeff(d, Coeff::of_int(1));
                out.push(Lincons0::new(e, ConsTyp::SupEq));
            }
            if let Some(u) = itv.upper() {
                // u - x_d >= 0.
                let mut e = Linexpr0::new(Coeff::Scalar(u));
                e.set_coeff(d, Coeff::of_int(-1));
                out.push(Lincons0::new(e, ConsTyp::SupEq));
            }
        }
        Ok(Flagged::exact(out))
    }

    fn meet(
        &self,
        a: &BoxValue<N>,
        b: &BoxValue<N>,
    ) -> Result<Flagged<BoxValue<N>>, Exception> {
        let out = match (&a.itvs, &b.itvs) {
            (None, _) | (_, None) => BoxValue::bottom(a.dims),
            (Some(x), Some(y)) => {
                let met = x.iter().zip(y.iter()).map(|(i, j)| i.meet(j)).collect();
                BoxValue::of_itvs(a.dims, met)
            }
        };
        Ok(Flagged::exact(out))
    }

    fn meet_lincons_array(
        &self,
        v: &BoxValue<N>,
        cons: &[Lincons0<N>],
    ) -> Result<Flagged<BoxValue<N>>, Exception> {
        let itvs = match &v.itvs {
            None => return Ok(Flagged::exact(v.clone())),
            Some(itvs) => itvs,
        };
        let ics: Vec<ItvLincons<N>> = cons
            .iter()
            .map(|c| ItvLincons::of_lincons(c).0)
            .collect();
        let mut work = itvs.clone();
        let empty = linexpr::meet_lincons_array(&mut work, v.dims.intdim, &ics, self.kmax);
        let out = if empty {
            BoxValue::bottom(v.dims)
        } else {
            BoxValue::of_itvs(v.dims, work)
        };
        // Bounded propagation is sound but not complete.
        Ok(Flagged::approximate(out))
    }

    fn join(
        &self,
        a: &BoxValue<N>,
        b: &BoxValue<N>,
    ) -> Result<Flagged<BoxValue<N>>, Exception> {
        let out = match (&a.itvs, &b.itvs) {
            (None, _) => b.clone(),
            (_, None) => a.clone(),
            (Some(x), Some(y)) => BoxValue {
                dims: a.dims,
                itvs: Some(x.iter().zip(y.iter()).map(|(i, j)| i.join(j)).collect()),
            },
        };
        // The box hull of a union is the best box but rarely the union.
        Ok(Flagged::approximate(out))
    }

    fn assign_linexpr_array(
        &self,
        v: &BoxValue<N>,
        dims: &[Dim],
        exprs: &[Linexpr0<N>],
        dest: Option<&BoxValue<N>>,
    ) -> Result<Flagged<BoxValue<N>>, Exception> {
        let itvs = match &v.itvs {
            None => return Ok(Flagged::exact(v.clone())),
            Some(itvs) => itvs,
        };
        // All right-hand sides read the pre-state.
        let mut out = itvs.clone();
        let mut linear = true;
        for (d, e) in dims.iter().zip(exprs.iter()) {
            let (ie, l) = ItvLinexpr::of_linexpr(e);
            linear &= l;
            out[*d] = ie.eval(itvs);
        }
        let mut val = BoxValue::of_itvs(v.dims, out);
        if let Some(dst) = dest {
            val = self.meet(&val, dst)?.value;
        }
        Ok(if linear && dest.is_none() {
            Flagged::exact(val)
        } else {
            Flagged::approximate(val)
        })
    }

    fn assign_texpr_array(
        &self,
        v: &BoxValue<N>,
        dims: &[Dim],
        exprs: &[Texpr0<N>],
        dest: Option<&BoxValue<N>>,
    ) -> Result<Flagged<BoxValue<N>>, Exception> {
        let itvs = match &v.itvs {
            None => return Ok(Flagged::exact(v.clone())),
            Some(itvs) => itvs,
        };
        let mut out = itvs.clone();
        for (d, e) in dims.iter().zip(exprs.iter()) {
            out[*d] = e.eval(itvs);
        }
        let mut val = BoxValue::of_itvs(v.dims, out);
        if let Some(dst) = dest {
            val = self.meet(&val, dst)?.value;
        }
        Ok(Flagged::approximate(val))
    }

    fn meet_tcons_array(
        &self,
        v: &BoxValue<N>,
        cons: &[Tcons0<N>],
    ) -> Result<Flagged<BoxValue<N>>, Exception> {
        let itvs = match &v.itvs {
            None => return Ok(Flagged::exact(v.clone())),
            Some(itvs) => itvs,
        };
        // Linearize each tree against the current box, then reuse the
        // linear-constraint propagation.
        let mut lin = Vec::with_capacity(cons.len());
        for c in cons {
            let (le, _) = c.texpr.linearize(itvs);
            lin.push(Lincons0 {
                linexpr: le,
                typ: c.typ,
                modulo: c.modulo.clone(),
            });
        }
        let lin = crate::linearize::linearize_lincons_array(&lin);
        self.meet_lincons_array(v, &lin)
    }

    fn add_dimensions(
        &self,
        v: &BoxValue<N>,
        change: &DimChange,
        project: bool,
    ) -> Result<Flagged<BoxValue<N>>, Exception> {
        let added = change.added();
        let ndims = Dimensions::new(v.dims.intdim + added.intdim, v.dims.realdim + added.realdim);
        let itvs = match &v.itvs {
            None => return Ok(Flagged::exact(BoxValue::bottom(ndims))),
            Some(itvs) => itvs,
        };
        let fresh = || {
            if project {
                Itv::point(N::zero())
            } else {
                Itv::top()
            }
        };
        let positions: Vec<Dim> = change.positions().collect();
        let mut out = Vec::with_capacity(ndims.total());
        let mut p = 0;
        for (d, itv) in itvs.iter().enumerate() {
            while p < positions.len() && positions[p] == d {
                out.push(fresh());
                p += 1;
            }
            out.push(itv.clone());
        }
        while p < positions.len() {
            out.push(fresh());
            p += 1;
        }
        Ok(Flagged::exact(BoxValue {
            dims: ndims,
            itvs: Some(out),
        }))
    }

    fn remove_dimensions(
        &self,
        v: &BoxValue<N>,
        change: &DimChange,
    ) -> Result<Flagged<BoxValue<N>>, Exception> {
        let removed = change.added();
        let ndims = Dimensions::new(
            v.dims.intdim - removed.intdim,
            v.dims.realdim - removed.realdim,
        );
        let itvs = match &v.itvs {
            None => return Ok(Flagged::exact(BoxValue::bottom(ndims))),
            Some(itvs) => itvs,
        };
        let out = itvs
            .iter()
            .enumerate()
            .filter(|(d, _)| !change.positions().any(|p| p == *d))
            .map(|(_, itv)| itv.clone())
            .collect();
        Ok(Flagged::exact(BoxValue {
            dims: ndims,
            itvs: Some(out),
        }))
    }

    fn permute_dimensions(
        &self,
        v: &BoxValue<N>,
        perm: &DimPerm,
    ) -> Result<Flagged<BoxValue<N>>, Exception> {
        let itvs = match &v.itvs {
            None => return Ok(Flagged::exact(v.clone())),
            Some(itvs) => itvs,
        };
        Ok(Flagged::exact(BoxValue {
            dims: v.dims,
            itvs: Some(perm.apply(itvs)),
        }))
    }

    fn forget_array(
        &self,
        v: &BoxValue<N>,
        dims: &[Dim],
        project: bool,
    ) -> Result<Flagged<BoxValue<N>>, Exception> {
        let itvs = match &v.itvs {
            None => return Ok(Flagged::exact(v.clone())),
            Some(itvs) => itvs,
        };
        let mut out = itvs.clone();
        for &d in dims {
            out[d] = if project {
                Itv::point(N::zero())
            } else {
                Itv::top()
            };
        }
        Ok(Flagged::exact(BoxValue {
            dims: v.dims,
            itvs: Some(out),
        }))
    }

    fn expand(
        &self,
        v: &BoxValue<N>,
        dim: Dim,
        n: usize,
    ) -> Result<Flagged<BoxValue<N>>, Exception> {
        let ndims = if v.dims.is_int(dim) {
            Dimensions::new(v.dims.intdim + n, v.dims.realdim)
        } else {
            Dimensions::new(v.dims.intdim, v.dims.realdim + n)
        };
        let itvs = match &v.itvs {
            None => return Ok(Flagged::exact(BoxValue::bottom(ndims))),
            Some(itvs) => itvs,
        };
        // Copies land at the end of the dimension's section.
        let at = if v.dims.is_int(dim) {
            v.dims.intdim
        } else {
            v.dims.total()
        };
        let mut out = itvs.clone();
        let copies = vec![itvs[dim].clone(); n];
        out.splice(at..at, copies);
        Ok(Flagged::exact(BoxValue {
            dims: ndims,
            itvs: Some(out),
        }))
    }

    fn fold(&self, v: &BoxValue<N>, dims: &[Dim]) -> Result<Flagged<BoxValue<N>>, Exception> {
        let keep = dims[0];
        let ndims = if v.dims.is_int(keep) {
            Dimensions::new(v.dims.intdim - (dims.len() - 1), v.dims.realdim)
        } else {
            Dimensions::new(v.dims.intdim, v.dims.realdim - (dims.len() - 1))
        };
        let itvs = match &v.itvs {
            None => return Ok(Flagged::exact(BoxValue::bottom(ndims))),
            Some(itvs) => itvs,
        };
        let mut joined = itvs[keep].clone();
        for &d in &dims[1..] {
            joined = joined.join(&itvs[d]);
        }
        let out = itvs
            .iter()
            .enumerate()
            .filter(|(d, _)| *d == keep || !dims[1..].contains(d))
            .map(|(d, itv)| {
                if d == keep {
                    joined.clone()
                } else {
                    itv.clone()
                }
            })
            .collect();
        Ok(Flagged::approximate(BoxValue {
            dims: ndims,
            itvs: Some(out),
        }))
    }

    fn widening(
        &self,
        a: &BoxValue<N>,
        b: &BoxValue<N>,
    ) -> Result<Flagged<BoxValue<N>>, Exception> {
        let out = match (&a.itvs, &b.itvs) {
            (None, _) => b.clone(),
            (_, None) => a.clone(),
            (Some(x), Some(y)) => BoxValue {
                dims: a.dims,
                itvs: Some(x.iter().zip(y.iter()).map(|(i, j)| i.widening(j)).collect()),
            },
        };
        Ok(Flagged::approximate(out))
    }
}
