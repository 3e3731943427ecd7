//! The user-facing abstract value: a domain value paired with its manager.
//!
//! Every operation goes through this layer, which enforces the runtime
//! contract (compatible managers, matching spaces, in-range dimensions)
//! before reaching the engine. Violations and engine exceptions are
//! recoverable by default: the operation logs a warning and returns a sound
//! top value with the exception attached to the [`OpOutcome`]. A manager
//! whose options request an abort for the exception's kind panics instead.
//!
//! Operations an engine leaves unimplemented are, where possible, replaced
//! by generic fallbacks built from the operations it does provide: array
//! meets and joins fold the binary ones, tree constraints linearize against
//! the value's box, and assignment and substitution reduce to an
//! extend-constrain-rename-project sequence in an enlarged space.

use std::fmt;

use log::warn;

use crate::dimension::{Dim, DimChange, DimPerm, Dimensions};
use crate::domain::{Domain, Flagged};
use crate::interval::Itv;
use crate::linearize::{self, Tcons0, Texpr0};
use crate::linexpr::{Coeff, ConsTyp, Lincons0, Linexpr0};
use crate::manager::{Exactness, ExcKind, Exception, FunId, Manager, OpOutcome};
use crate::num::Num;
use crate::Trivalent;

/// An abstract value bound to the manager that created it.
///
/// # Examples
/// ```
/// # use warren::boxes::BoxDomain;
/// # use warren::dimension::Dimensions;
/// # use warren::manager::Manager;
/// # use warren::num::Rat;
/// # use warren::value::AbstractValue;
/// let man = Manager::new(BoxDomain::<Rat>::new());
/// let top = AbstractValue::top(&man, Dimensions::new(1, 1));
/// assert_eq!(top.is_top(), warren::Trivalent::True);
/// ```
pub struct AbstractValue<D: Domain> {
    man: Manager<D>,
    value: D::Value,
}

impl<D: Domain> Clone for AbstractValue<D> {
    fn clone(&self) -> AbstractValue<D> {
        AbstractValue {
            man: self.man.clone(),
            value: self.value.clone(),
        }
    }
}

impl<D: Domain> PartialEq for AbstractValue<D> {
    fn eq(&self, other: &AbstractValue<D>) -> bool {
        self.value == other.value
    }
}

impl<D: Domain> fmt::Debug for AbstractValue<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbstractValue")
            .field("library", &self.man.library())
            .field("value", &self.value)
            .finish()
    }
}

impl<D: Domain> fmt::Display for AbstractValue<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<D: Domain> AbstractValue<D> {
    /// The full value on the given space.
    pub fn top(man: &Manager<D>, dims: Dimensions) -> AbstractValue<D> {
        AbstractValue {
            man: man.clone(),
            value: man.domain().top(dims).value,
        }
    }

    /// The empty value on the given space.
    pub fn bottom(man: &Manager<D>, dims: Dimensions) -> AbstractValue<D> {
        AbstractValue {
            man: man.clone(),
            value: man.domain().bottom(dims).value,
        }
    }

    /// The value abstracting a box.
    pub fn of_box(
        man: &Manager<D>,
        dims: Dimensions,
        itvs: &[Itv<D::Num>],
    ) -> OpOutcome<AbstractValue<D>> {
        let r = man.domain().of_box(dims, itvs);
        finish(man, dims, r)
    }

    /// The value abstracting the conjunction of the constraints.
    pub fn of_lincons_array(
        man: &Manager<D>,
        dims: Dimensions,
        cons: &[Lincons0<D::Num>],
    ) -> OpOutcome<AbstractValue<D>> {
        let top = AbstractValue::top(man, dims);
        let mut out = top.meet_lincons_array(cons);
        if let Some(e) = out.exception.as_mut() {
            e.funid = FunId::OfLinconsArray;
        }
        out
    }

    /// The manager this value was created with.
    pub fn manager(&self) -> &Manager<D> {
        &self.man
    }

    /// The underlying engine value.
    pub fn value(&self) -> &D::Value {
        &self.value
    }

    /// The space the value lives in.
    pub fn dimension(&self) -> Dimensions {
        self.man.domain().dimension(&self.value)
    }

    // ------------------------------------------------------------------
    // Checks and recovery.

    fn check_man(&self, other: &AbstractValue<D>, funid: FunId) -> Result<(), Exception> {
        if self.man.compatible(&other.man) {
            Ok(())
        } else {
            Err(Exception::invalid_argument(
                funid,
                format!(
                    "incompatible managers: {} vs {}",
                    self.man.library(),
                    other.man.library()
                ),
            ))
        }
    }

    fn check_dims(&self, other: &AbstractValue<D>, funid: FunId) -> Result<(), Exception> {
        let a = self.dimension();
        let b = other.dimension();
        if a == b {
            Ok(())
        } else {
            Err(Exception::invalid_argument(
                funid,
                format!("mismatched spaces: {} vs {}", a, b),
            ))
        }
    }

    fn check_dim(&self, dim: Dim, funid: FunId) -> Result<(), Exception> {
        let dims = self.dimension();
        if dim < dims.total() {
            Ok(())
        } else {
            Err(Exception::invalid_argument(
                funid,
                format!("dimension {} outside the space {}", dim, dims),
            ))
        }
    }

    fn check_linexpr(&self, expr: &Linexpr0<D::Num>, i: usize, funid: FunId) -> Result<(), Exception> {
        let dims = self.dimension();
        match expr.max_dim() {
            Some(d) if d >= dims.total() => Err(Exception::invalid_argument(
                funid,
                format!(
                    "expression {} mentions dimension {} outside the space {}",
                    i, d, dims
                ),
            )),
            _ => Ok(()),
        }
    }

    fn check_texpr(&self, expr: &Texpr0<D::Num>, i: usize, funid: FunId) -> Result<(), Exception> {
        let dims = self.dimension();
        match expr.max_dim() {
            Some(d) if d >= dims.total() => Err(Exception::invalid_argument(
                funid,
                format!(
                    "expression {} mentions dimension {} outside the space {}",
                    i, d, dims
                ),
            )),
            _ => Ok(()),
        }
    }

    fn outcome(
        &self,
        dims: Dimensions,
        r: Result<Flagged<D::Value>, Exception>,
    ) -> OpOutcome<AbstractValue<D>> {
        finish(&self.man, dims, r)
    }

    // ------------------------------------------------------------------
    // Predicates.

    /// Whether the value is empty.
    pub fn is_bottom(&self) -> Trivalent {
        self.man.domain().is_bottom(&self.value)
    }

    /// Whether the value is the full space.
    pub fn is_top(&self) -> Trivalent {
        self.man.domain().is_top(&self.value)
    }

    /// Whether `self` is included in `other`. Incomparable arguments (a
    /// manager or space mismatch) answer `Unknown`.
    pub fn is_leq(&self, other: &AbstractValue<D>) -> Trivalent {
        if self.check_man(other, FunId::IsLeq).is_err()
            || self.check_dims(other, FunId::IsLeq).is_err()
        {
            return Trivalent::Unknown;
        }
        self.man.domain().is_leq(&self.value, &other.value)
    }

    /// Whether `self` and `other` describe the same set.
    pub fn is_eq(&self, other: &AbstractValue<D>) -> Trivalent {
        if self.check_man(other, FunId::IsEq).is_err()
            || self.check_dims(other, FunId::IsEq).is_err()
        {
            return Trivalent::Unknown;
        }
        self.man.domain().is_eq(&self.value, &other.value)
    }

    /// Whether the value puts no constraint on `dim`.
    pub fn is_dimension_unconstrained(&self, dim: Dim) -> Trivalent {
        if self.check_dim(dim, FunId::IsDimensionUnconstrained).is_err() {
            return Trivalent::Unknown;
        }
        self.man.domain().is_dimension_unconstrained(&self.value, dim)
    }

    /// Whether every point keeps `dim` inside `itv`.
    pub fn sat_interval(&self, dim: Dim, itv: &Itv<D::Num>) -> Trivalent {
        if self.check_dim(dim, FunId::SatInterval).is_err() {
            return Trivalent::Unknown;
        }
        self.man.domain().sat_interval(&self.value, dim, itv)
    }

    /// Whether every point satisfies the constraint.
    pub fn sat_lincons(&self, cons: &Lincons0<D::Num>) -> Trivalent {
        if self.check_linexpr(&cons.linexpr, 0, FunId::SatLincons).is_err() {
            return Trivalent::Unknown;
        }
        self.man.domain().sat_lincons(&self.value, cons)
    }

    /// Whether every point satisfies the tree constraint.
    pub fn sat_tcons(&self, cons: &Tcons0<D::Num>) -> Trivalent {
        if self.check_texpr(&cons.texpr, 0, FunId::SatTcons).is_err() {
            return Trivalent::Unknown;
        }
        self.man.domain().sat_tcons(&self.value, cons)
    }

    // ------------------------------------------------------------------
    // Extraction.

    /// The range of one dimension. Degrades to the full interval.
    pub fn bound_dimension(&self, dim: Dim) -> OpOutcome<Itv<D::Num>> {
        let r = self
            .check_dim(dim, FunId::BoundDimension)
            .and_then(|_| self.man.domain().bound_dimension(&self.value, dim));
        finish_with(&self.man, r, Itv::top)
    }

    /// The range of a linear expression. Degrades to the full interval.
    pub fn bound_linexpr(&self, expr: &Linexpr0<D::Num>) -> OpOutcome<Itv<D::Num>> {
        let r = self
            .check_linexpr(expr, 0, FunId::BoundLinexpr)
            .and_then(|_| self.man.domain().bound_linexpr(&self.value, expr));
        finish_with(&self.man, r, Itv::top)
    }

    /// The range of a tree expression. Falls back on interval evaluation
    /// over the value's box; degrades to the full interval.
    pub fn bound_texpr(&self, expr: &Texpr0<D::Num>) -> OpOutcome<Itv<D::Num>> {
        let r = self
            .check_texpr(expr, 0, FunId::BoundTexpr)
            .and_then(|_| match self.man.domain().bound_texpr(&self.value, expr) {
                Err(e) if e.kind == ExcKind::NotImplemented => {
                    let itvs = self.man.domain().to_box(&self.value)?.value;
                    Ok(Flagged::approximate(expr.eval(&itvs)))
                }
                r => r,
            });
        finish_with(&self.man, r, Itv::top)
    }

    /// The smallest enclosing box. Degrades to all-top intervals.
    pub fn to_box(&self) -> OpOutcome<Vec<Itv<D::Num>>> {
        let n = self.dimension().total();
        let r = self.man.domain().to_box(&self.value);
        finish_with(&self.man, r, || vec![Itv::top(); n])
    }

    /// An over-approximating constraint set. Degrades to the empty set,
    /// which describes the full space.
    pub fn to_lincons_array(&self) -> OpOutcome<Vec<Lincons0<D::Num>>> {
        let r = self.man.domain().to_lincons_array(&self.value);
        finish_with(&self.man, r, Vec::new)
    }

    // ------------------------------------------------------------------
    // Lattice operations.

    /// Intersection with another value.
    pub fn meet(&self, other: &AbstractValue<D>) -> OpOutcome<AbstractValue<D>> {
        let r = self
            .check_man(other, FunId::Meet)
            .and_then(|_| self.check_dims(other, FunId::Meet))
            .and_then(|_| self.man.domain().meet(&self.value, &other.value));
        self.outcome(self.dimension(), r)
    }

    /// In-place intersection.
    pub fn meet_assign(&mut self, other: &AbstractValue<D>) -> OpOutcome<()> {
        let out = self.meet(other);
        self.value = out.value.value;
        OpOutcome {
            value: (),
            exactness: out.exactness,
            exception: out.exception,
        }
    }

    /// Join with another value.
    pub fn join(&self, other: &AbstractValue<D>) -> OpOutcome<AbstractValue<D>> {
        let r = self
            .check_man(other, FunId::Join)
            .and_then(|_| self.check_dims(other, FunId::Join))
            .and_then(|_| self.man.domain().join(&self.value, &other.value));
        self.outcome(self.dimension(), r)
    }

    /// In-place join.
    pub fn join_assign(&mut self, other: &AbstractValue<D>) -> OpOutcome<()> {
        let out = self.join(other);
        self.value = out.value.value;
        OpOutcome {
            value: (),
            exactness: out.exactness,
            exception: out.exception,
        }
    }

    /// Intersection of a nonempty family. An empty family has no defined
    /// space, so it is a hard error rather than a recoverable one.
    pub fn meet_array(
        vs: &[AbstractValue<D>],
    ) -> Result<OpOutcome<AbstractValue<D>>, Exception> {
        Self::fold_array(vs, FunId::MeetArray)
    }

    /// Join of a nonempty family.
    pub fn join_array(
        vs: &[AbstractValue<D>],
    ) -> Result<OpOutcome<AbstractValue<D>>, Exception> {
        Self::fold_array(vs, FunId::JoinArray)
    }

    fn fold_array(
        vs: &[AbstractValue<D>],
        funid: FunId,
    ) -> Result<OpOutcome<AbstractValue<D>>, Exception> {
        let first = vs
            .first()
            .ok_or_else(|| Exception::invalid_argument(funid, "empty value array"))?;
        let checks = vs.iter().skip(1).try_for_each(|v| {
            first
                .check_man(v, funid)
                .and_then(|_| first.check_dims(v, funid))
        });
        let man = &first.man;
        let dims = first.dimension();
        let r = checks.and_then(|_| {
            let raw: Vec<D::Value> = vs.iter().map(|v| v.value.clone()).collect();
            let native = match funid {
                FunId::MeetArray => man.domain().meet_array(&raw),
                _ => man.domain().join_array(&raw),
            };
            match native {
                Err(e) if e.kind == ExcKind::NotImplemented => {
                    // Fold the binary operation over the family.
                    let mut acc = Flagged::exact(raw[0].clone());
                    for v in &raw[1..] {
                        let step = match funid {
                            FunId::MeetArray => man.domain().meet(&acc.value, v)?,
                            _ => man.domain().join(&acc.value, v)?,
                        };
                        acc = Flagged {
                            value: step.value,
                            exactness: acc.exactness.meet(step.exactness),
                        };
                    }
                    Ok(acc)
                }
                r => r,
            }
        });
        Ok(finish(man, dims, r))
    }

    /// Intersect with the conjunction of linear constraints.
    pub fn meet_lincons_array(&self, cons: &[Lincons0<D::Num>]) -> OpOutcome<AbstractValue<D>> {
        let r = cons
            .iter()
            .enumerate()
            .try_for_each(|(i, c)| self.check_linexpr(&c.linexpr, i, FunId::MeetLinconsArray))
            .and_then(|_| self.man.domain().meet_lincons_array(&self.value, cons));
        self.outcome(self.dimension(), r)
    }

    /// Intersect with the conjunction of tree constraints. Falls back on
    /// linearizing each tree against the value's box and meeting with the
    /// resulting linear constraints.
    pub fn meet_tcons_array(&self, cons: &[Tcons0<D::Num>]) -> OpOutcome<AbstractValue<D>> {
        let r = cons
            .iter()
            .enumerate()
            .try_for_each(|(i, c)| self.check_texpr(&c.texpr, i, FunId::MeetTconsArray))
            .and_then(
                |_| match self.man.domain().meet_tcons_array(&self.value, cons) {
                    Err(e) if e.kind == ExcKind::NotImplemented => {
                        let itvs = self.man.domain().to_box(&self.value)?.value;
                        let lin: Vec<Lincons0<D::Num>> = cons
                            .iter()
                            .map(|c| {
                                let (le, _) = c.texpr.linearize(&itvs);
                                Lincons0 {
                                    linexpr: le,
                                    typ: c.typ,
                                    modulo: c.modulo.clone(),
                                }
                            })
                            .collect();
                        let lin = linearize::linearize_lincons_array(&lin);
                        let f = self.man.domain().meet_lincons_array(&self.value, &lin)?;
                        Ok(Flagged::approximate(f.value))
                    }
                    r => r,
                },
            );
        self.outcome(self.dimension(), r)
    }

    // ------------------------------------------------------------------
    // Assignment and substitution.

    /// Parallel assignment `dims[i] := exprs[i]`, optionally met with
    /// `dest`. Engines without a native assignment get the generic
    /// reduction in an enlarged space.
    pub fn assign_linexpr_array(
        &self,
        dims: &[Dim],
        exprs: &[Linexpr0<D::Num>],
        dest: Option<&AbstractValue<D>>,
    ) -> OpOutcome<AbstractValue<D>> {
        self.asssub_linexpr(dims, exprs, dest, true)
    }

    /// Parallel substitution, the inverse of assignment.
    pub fn substitute_linexpr_array(
        &self,
        dims: &[Dim],
        exprs: &[Linexpr0<D::Num>],
        dest: Option<&AbstractValue<D>>,
    ) -> OpOutcome<AbstractValue<D>> {
        self.asssub_linexpr(dims, exprs, dest, false)
    }

    fn asssub_linexpr(
        &self,
        tdims: &[Dim],
        exprs: &[Linexpr0<D::Num>],
        dest: Option<&AbstractValue<D>>,
        is_assign: bool,
    ) -> OpOutcome<AbstractValue<D>> {
        let funid = if is_assign {
            FunId::AssignLinexprArray
        } else {
            FunId::SubstituteLinexprArray
        };
        let r = self
            .check_asssub(tdims, exprs.len(), dest, funid)
            .and_then(|_| {
                exprs
                    .iter()
                    .enumerate()
                    .try_for_each(|(i, e)| self.check_linexpr(e, i, funid))
            })
            .and_then(|_| {
                let dom = self.man.domain();
                let dval = dest.map(|d| &d.value);
                let native = if is_assign {
                    dom.assign_linexpr_array(&self.value, tdims, exprs, dval)
                } else {
                    dom.substitute_linexpr_array(&self.value, tdims, exprs, dval)
                };
                match native {
                    Err(e) if e.kind == ExcKind::NotImplemented => {
                        self.generic_asssub(tdims, exprs, dest, is_assign)
                    }
                    r => r,
                }
            });
        self.outcome(self.dimension(), r)
    }

    fn check_asssub(
        &self,
        tdims: &[Dim],
        nexprs: usize,
        dest: Option<&AbstractValue<D>>,
        funid: FunId,
    ) -> Result<(), Exception> {
        if tdims.len() != nexprs {
            return Err(Exception::invalid_argument(
                funid,
                format!("{} target dimensions for {} expressions", tdims.len(), nexprs),
            ));
        }
        if tdims.is_empty() {
            return Err(Exception::invalid_argument(funid, "no target dimensions"));
        }
        for (i, &d) in tdims.iter().enumerate() {
            self.check_dim(d, funid)?;
            if tdims[..i].contains(&d) {
                return Err(Exception::invalid_argument(
                    funid,
                    format!("dimension {} assigned twice", d),
                ));
            }
        }
        if let Some(dst) = dest {
            self.check_man(dst, funid)?;
            self.check_dims(dst, funid)?;
        }
        Ok(())
    }

    /// The generic assignment/substitution reduction. A primed copy of each
    /// target dimension is appended at the end of its section; the value is
    /// met with the equalities `primed_i = expr_i` over the original
    /// dimensions; targets and their primed copies are swapped (before the
    /// meet for substitution, after it for assignment); the primed
    /// dimensions are projected away, and the result is met with `dest`.
    fn generic_asssub(
        &self,
        tdims: &[Dim],
        exprs: &[Linexpr0<D::Num>],
        dest: Option<&AbstractValue<D>>,
        is_assign: bool,
    ) -> Result<Flagged<D::Value>, Exception> {
        let dom = self.man.domain();
        let dims = self.dimension();
        let (intdim, total) = (dims.intdim, dims.total());

        let int_targets: Vec<Dim> = tdims.iter().copied().filter(|&d| d < intdim).collect();
        let real_targets: Vec<Dim> = tdims.iter().copied().filter(|&d| d >= intdim).collect();
        let kint = int_targets.len();

        // One primed dimension per target, appended at its section's end.
        let change = DimChange::new(vec![intdim; kint], vec![total; real_targets.len()])
            .expect("constant position lists are sorted");
        let primed = |d: Dim| -> Dim {
            if d < intdim {
                let i = int_targets.iter().position(|&t| t == d).expect("int target");
                intdim + i
            } else {
                let j = real_targets
                    .iter()
                    .position(|&t| t == d)
                    .expect("real target");
                total + kint + j
            }
        };
        // Original dimensions shift past the inserted integer block.
        let shifted = |d: Dim| -> Dim { if d < intdim { d } else { d + kint } };

        let mut flag = dom.add_dimensions(&self.value, &change, false)?;

        let ntotal = total + tdims.len();
        let perm = DimPerm::with_swaps(
            ntotal,
            &tdims
                .iter()
                .map(|&d| (shifted(d), primed(d)))
                .collect::<Vec<_>>(),
        );
        if !is_assign {
            let f = dom.permute_dimensions(&flag.value, &perm)?;
            flag = Flagged {
                exactness: flag.exactness.meet(f.exactness),
                value: f.value,
            };
        }

        // primed_i = expr_i, with the expression renumbered into the
        // enlarged space.
        let eqs: Vec<Lincons0<D::Num>> = tdims
            .iter()
            .zip(exprs.iter())
            .map(|(&d, e)| {
                let mut shifted_e = e.clone();
                shifted_e.add_dimensions(&change);
                shifted_e.set_coeff(primed(d), Coeff::Scalar(D::Num::of_int(-1)));
                Lincons0::new(shifted_e, ConsTyp::Eq)
            })
            .collect();
        let f = dom.meet_lincons_array(&flag.value, &eqs)?;
        flag = Flagged {
            exactness: flag.exactness.meet(f.exactness),
            value: f.value,
        };

        if is_assign {
            let f = dom.permute_dimensions(&flag.value, &perm)?;
            flag = Flagged {
                exactness: flag.exactness.meet(f.exactness),
                value: f.value,
            };
        }

        // Project the primed block away again.
        let removal = DimChange::new(
            (intdim..intdim + kint).collect(),
            (total + kint..ntotal).collect(),
        )
        .expect("ranges are sorted");
        let f = dom.remove_dimensions(&flag.value, &removal)?;
        flag = Flagged {
            exactness: flag.exactness.meet(f.exactness),
            value: f.value,
        };

        if let Some(dst) = dest {
            let f = dom.meet(&flag.value, &dst.value)?;
            flag = Flagged {
                exactness: flag.exactness.meet(f.exactness),
                value: f.value,
            };
        }
        // The reduction goes through bounded constraint propagation.
        Ok(Flagged {
            exactness: flag.exactness.meet(Exactness::Approximate),
            value: flag.value,
        })
    }

    /// Parallel assignment of tree expressions. Engines without native
    /// support get each tree linearized against the value's box, then the
    /// linear assignment path.
    pub fn assign_texpr_array(
        &self,
        dims: &[Dim],
        exprs: &[Texpr0<D::Num>],
        dest: Option<&AbstractValue<D>>,
    ) -> OpOutcome<AbstractValue<D>> {
        self.asssub_texpr(dims, exprs, dest, true)
    }

    /// Parallel substitution of tree expressions. Only linear trees can be
    /// substituted generically: a nonlinear tree would have to be
    /// linearized against the unknown pre-state.
    pub fn substitute_texpr_array(
        &self,
        dims: &[Dim],
        exprs: &[Texpr0<D::Num>],
        dest: Option<&AbstractValue<D>>,
    ) -> OpOutcome<AbstractValue<D>> {
        self.asssub_texpr(dims, exprs, dest, false)
    }

    fn asssub_texpr(
        &self,
        tdims: &[Dim],
        exprs: &[Texpr0<D::Num>],
        dest: Option<&AbstractValue<D>>,
        is_assign: bool,
    ) -> OpOutcome<AbstractValue<D>> {
        let funid = if is_assign {
            FunId::AssignTexprArray
        } else {
            FunId::SubstituteTexprArray
        };
        let r = self
            .check_asssub(tdims, exprs.len(), dest, funid)
            .and_then(|_| {
                exprs
                    .iter()
                    .enumerate()
                    .try_for_each(|(i, e)| self.check_texpr(e, i, funid))
            })
            .and_then(|_| {
                let dom = self.man.domain();
                let dval = dest.map(|d| &d.value);
                let native = if is_assign {
                    dom.assign_texpr_array(&self.value, tdims, exprs, dval)
                } else {
                    dom.substitute_texpr_array(&self.value, tdims, exprs, dval)
                };
                match native {
                    Err(e) if e.kind == ExcKind::NotImplemented => {
                        let itvs = if is_assign {
                            dom.to_box(&self.value)?.value
                        } else {
                            // The pre-state is unknown: linearization may
                            // only rely on the tree's own structure.
                            if let Some(e) = exprs.iter().find(|e| !e.is_linear()) {
                                return Err(Exception::invalid_argument(
                                    funid,
                                    format!("cannot substitute the nonlinear tree {}", e),
                                ));
                            }
                            vec![Itv::top(); self.dimension().total()]
                        };
                        let lin: Vec<Linexpr0<D::Num>> =
                            exprs.iter().map(|e| e.linearize(&itvs).0).collect();
                        let f = if is_assign {
                            match dom.assign_linexpr_array(&self.value, tdims, &lin, dval) {
                                Err(e) if e.kind == ExcKind::NotImplemented => {
                                    self.generic_asssub(tdims, &lin, dest, true)?
                                }
                                r => r?,
                            }
                        } else {
                            self.generic_asssub(tdims, &lin, dest, false)?
                        };
                        Ok(Flagged::approximate(f.value))
                    }
                    r => r,
                }
            });
        self.outcome(self.dimension(), r)
    }

    // ------------------------------------------------------------------
    // Dimension surgery.

    /// Insert dimensions, unconstrained or pinned to zero.
    pub fn add_dimensions(&self, change: &DimChange, project: bool) -> OpOutcome<AbstractValue<D>> {
        let dims = self.dimension();
        let added = change.added();
        let ndims = Dimensions::new(dims.intdim + added.intdim, dims.realdim + added.realdim);
        let r = change
            .validate_add(dims)
            .map_err(|e| Exception::invalid_argument(FunId::AddDimensions, e.to_string()))
            .and_then(|_| self.man.domain().add_dimensions(&self.value, change, project));
        self.outcome(ndims, r)
    }

    /// Remove the listed dimensions.
    pub fn remove_dimensions(&self, change: &DimChange) -> OpOutcome<AbstractValue<D>> {
        let dims = self.dimension();
        let removed = change.added();
        let ndims = Dimensions::new(
            dims.intdim.saturating_sub(removed.intdim),
            dims.realdim.saturating_sub(removed.realdim),
        );
        let r = change
            .validate_remove(dims)
            .map_err(|e| Exception::invalid_argument(FunId::RemoveDimensions, e.to_string()))
            .and_then(|_| self.man.domain().remove_dimensions(&self.value, change));
        self.outcome(ndims, r)
    }

    /// Renumber dimensions through a permutation.
    pub fn permute_dimensions(&self, perm: &DimPerm) -> OpOutcome<AbstractValue<D>> {
        let dims = self.dimension();
        let r = if perm.size() != dims.total() {
            Err(Exception::invalid_argument(
                FunId::PermuteDimensions,
                format!("permutation of size {} on the space {}", perm.size(), dims),
            ))
        } else {
            self.man.domain().permute_dimensions(&self.value, perm)
        };
        self.outcome(dims, r)
    }

    /// Forget the listed dimensions, keeping the space.
    pub fn forget_array(&self, fdims: &[Dim], project: bool) -> OpOutcome<AbstractValue<D>> {
        let dims = self.dimension();
        let r = fdims
            .iter()
            .try_for_each(|&d| self.check_dim(d, FunId::ForgetArray))
            .and_then(|_| self.man.domain().forget_array(&self.value, fdims, project));
        self.outcome(dims, r)
    }

    /// Duplicate `dim` into `n` extra copies at the end of its section.
    pub fn expand(&self, dim: Dim, n: usize) -> OpOutcome<AbstractValue<D>> {
        let dims = self.dimension();
        let ndims = if dim < dims.intdim {
            Dimensions::new(dims.intdim + n, dims.realdim)
        } else {
            Dimensions::new(dims.intdim, dims.realdim + n)
        };
        let r = self
            .check_dim(dim, FunId::Expand)
            .and_then(|_| self.man.domain().expand(&self.value, dim, n));
        self.outcome(ndims, r)
    }

    /// Fold the listed dimensions into the first one.
    pub fn fold(&self, fdims: &[Dim]) -> OpOutcome<AbstractValue<D>> {
        let dims = self.dimension();
        let r = self.check_fold(fdims).and_then(|_| self.man.domain().fold(&self.value, fdims));
        let ndims = match fdims.first() {
            Some(&d) if dims.is_int(d) => {
                Dimensions::new(dims.intdim.saturating_sub(fdims.len() - 1), dims.realdim)
            }
            Some(_) => Dimensions::new(dims.intdim, dims.realdim.saturating_sub(fdims.len() - 1)),
            None => dims,
        };
        self.outcome(ndims, r)
    }

    fn check_fold(&self, fdims: &[Dim]) -> Result<(), Exception> {
        let funid = FunId::Fold;
        if fdims.is_empty() {
            return Err(Exception::invalid_argument(funid, "empty dimension list"));
        }
        if !fdims.windows(2).all(|w| w[0] < w[1]) {
            return Err(Exception::invalid_argument(
                funid,
                "dimensions must be strictly sorted",
            ));
        }
        let dims = self.dimension();
        fdims.iter().try_for_each(|&d| self.check_dim(d, funid))?;
        let first_int = dims.is_int(fdims[0]);
        if fdims.iter().any(|&d| dims.is_int(d) != first_int) {
            return Err(Exception::invalid_argument(
                funid,
                "folded dimensions must share a section",
            ));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Widening.

    /// Widening of `self` by `other`; `self` must be included in `other`.
    pub fn widening(&self, other: &AbstractValue<D>) -> OpOutcome<AbstractValue<D>> {
        let r = self
            .check_man(other, FunId::Widening)
            .and_then(|_| self.check_dims(other, FunId::Widening))
            .and_then(|_| self.man.domain().widening(&self.value, &other.value));
        self.outcome(self.dimension(), r)
    }

    /// Widening with threshold constraints: the plain widening, re-tightened
    /// by those candidates the new iterate already satisfies. Satisfied
    /// candidates are swapped to the front of `cons`; the partition point is
    /// the number the result was met with.
    pub fn widening_threshold(
        &self,
        other: &AbstractValue<D>,
        cons: &mut [Lincons0<D::Num>],
    ) -> OpOutcome<AbstractValue<D>> {
        let r = self
            .check_man(other, FunId::Widening)
            .and_then(|_| self.check_dims(other, FunId::Widening))
            .and_then(|_| {
                cons.iter()
                    .enumerate()
                    .try_for_each(|(i, c)| self.check_linexpr(&c.linexpr, i, FunId::Widening))
            })
            .and_then(|_| {
                let dom = self.man.domain();
                // Keep only candidates the new iterate satisfies: meeting
                // with any other constraint could cut below the join.
                let mut k = 0;
                for i in 0..cons.len() {
                    if dom.sat_lincons(&other.value, &cons[i]) == Trivalent::True {
                        cons.swap(i, k);
                        k += 1;
                    }
                }
                let w = dom.widening(&self.value, &other.value)?;
                let f = dom.meet_lincons_array(&w.value, &cons[..k])?;
                Ok(Flagged {
                    exactness: w.exactness.meet(f.exactness),
                    value: f.value,
                })
            });
        self.outcome(self.dimension(), r)
    }

    // ------------------------------------------------------------------
    // Housekeeping.

    /// Domain-specific closure.
    pub fn closure(&self) -> OpOutcome<AbstractValue<D>> {
        let r = self.man.domain().closure(&self.value);
        self.outcome(self.dimension(), r)
    }

    /// Put the value in minimal form. An exception leaves the value as is.
    pub fn minimize(&mut self) -> Option<Exception> {
        self.housekeep(|dom, v| dom.minimize(v))
    }

    /// Put the value in canonical form. An exception leaves the value as is.
    pub fn canonicalize(&mut self) -> Option<Exception> {
        self.housekeep(|dom, v| dom.canonicalize(v))
    }

    /// Coarsen the value in place. An exception leaves the value as is.
    pub fn approximate(&mut self, algorithm: i32) -> Option<Exception> {
        self.housekeep(|dom, v| dom.approximate(v, algorithm))
    }

    /// Whether the value is in minimal form.
    pub fn is_minimal(&self) -> Trivalent {
        self.man.domain().is_minimal(&self.value)
    }

    /// Whether the value is in canonical form.
    pub fn is_canonical(&self) -> Trivalent {
        self.man.domain().is_canonical(&self.value)
    }

    fn housekeep(
        &mut self,
        f: impl FnOnce(&D, &mut D::Value) -> Result<(), Exception>,
    ) -> Option<Exception> {
        match f(self.man.domain(), &mut self.value) {
            Ok(()) => None,
            Err(e) => {
                if self.man.options().abort_on(e.kind) {
                    panic!("unrecoverable abstract operation failure: {}", e);
                }
                warn!("abstract operation failed, value left unchanged: {}", e);
                Some(e)
            }
        }
    }

    /// The value's abstract size, if the engine reports one.
    pub fn asize(&self) -> Result<usize, Exception> {
        self.man.domain().asize(&self.value)
    }

    /// A hash compatible with semantic equality, if the engine provides one.
    pub fn hash_value(&self) -> Result<u64, Exception> {
        self.man.domain().hash(&self.value)
    }

    /// Serialize to bytes, if the engine supports it.
    pub fn serialize(&self) -> Result<Vec<u8>, Exception> {
        self.man.domain().serialize(&self.value)
    }

    /// Rebuild a value from bytes, if the engine supports it.
    pub fn deserialize(man: &Manager<D>, bytes: &[u8]) -> Result<AbstractValue<D>, Exception> {
        Ok(AbstractValue {
            man: man.clone(),
            value: man.domain().deserialize(bytes)?,
        })
    }
}

/// Turn an engine result into an outcome, recovering from exceptions by
/// degrading to top on the given space.
fn finish<D: Domain>(
    man: &Manager<D>,
    dims: Dimensions,
    r: Result<Flagged<D::Value>, Exception>,
) -> OpOutcome<AbstractValue<D>> {
    match r {
        Ok(f) => OpOutcome {
            value: AbstractValue {
                man: man.clone(),
                value: f.value,
            },
            exactness: f.exactness,
            exception: None,
        },
        Err(e) => {
            if man.options().abort_on(e.kind) {
                panic!("unrecoverable abstract operation failure: {}", e);
            }
            warn!("abstract operation degraded to top: {}", e);
            OpOutcome {
                value: AbstractValue {
                    man: man.clone(),
                    value: man.domain().top(dims).value,
                },
                exactness: Exactness::Unknown,
                exception: Some(e),
            }
        }
    }
}

/// As [`finish`], for non-value results with a caller-provided sound
/// default.
fn finish_with<D: Domain, T>(
    man: &Manager<D>,
    r: Result<Flagged<T>, Exception>,
    default: impl FnOnce() -> T,
) -> OpOutcome<T> {
    match r {
        Ok(f) => OpOutcome {
            value: f.value,
            exactness: f.exactness,
            exception: None,
        },
        Err(e) => {
            if man.options().abort_on(e.kind) {
                panic!("unrecoverable abstract operation failure: {}", e);
            }
            warn!("abstract operation degraded: {}", e);
            OpOutcome {
                value: default(),
                exactness: Exactness::Unknown,
                exception: Some(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::{BoxDomain, BoxValue};
    use crate::num::Rat;
    use test_log::test;

    fn itv(l: i64, u: i64) -> Itv<Rat> {
        Itv::of_ints(l, u)
    }

    fn man() -> Manager<BoxDomain<Rat>> {
        Manager::new(BoxDomain::new())
    }

    fn expr(terms: Vec<(Dim, i64)>, cst: i64) -> Linexpr0<Rat> {
        Linexpr0::of_terms(
            terms
                .into_iter()
                .map(|(d, c)| (d, Coeff::of_int(c)))
                .collect(),
            Coeff::of_int(cst),
        )
    }

    fn of_box(man: &Manager<BoxDomain<Rat>>, dims: Dimensions, itvs: &[Itv<Rat>]) -> AbstractValue<BoxDomain<Rat>> {
        let out = AbstractValue::of_box(man, dims, itvs);
        assert!(out.exception.is_none());
        out.value
    }

    #[test]
    fn lattice_round_trip() {
        let m = man();
        let dims = Dimensions::new(0, 2);
        let a = of_box(&m, dims, &[itv(0, 4), itv(0, 4)]);
        let b = of_box(&m, dims, &[itv(2, 6), itv(1, 3)]);
        let meet = a.meet(&b).value;
        assert_eq!(meet.to_box().value, vec![itv(2, 4), itv(1, 3)]);
        let join = a.join(&b).value;
        assert_eq!(join.to_box().value, vec![itv(0, 6), itv(0, 4)]);
        assert_eq!(meet.is_leq(&join), Trivalent::True);
    }

    #[test]
    fn dimension_mismatch_degrades_to_top() {
        let m = man();
        let a = AbstractValue::top(&m, Dimensions::new(0, 1));
        let b = AbstractValue::top(&m, Dimensions::new(0, 2));
        let out = a.meet(&b);
        let exc = out.exception.expect("mismatched spaces raise");
        assert_eq!(exc.kind, ExcKind::InvalidArgument);
        assert_eq!(exc.funid, FunId::Meet);
        assert_eq!(out.value.is_top(), Trivalent::True);
        assert_eq!(out.value.dimension(), Dimensions::new(0, 1));
        assert_eq!(out.exactness, Exactness::Unknown);
    }

    /// An engine that claims a different library identity; its operations
    /// must never be reached through a compatibility failure.
    struct RenamedBoxes {
        boxes: BoxDomain<Rat>,
        name: &'static str,
    }

    impl Domain for RenamedBoxes {
        type Num = Rat;
        type Value = BoxValue<Rat>;

        fn library(&self) -> &str {
            self.name
        }

        fn top(&self, dims: Dimensions) -> Flagged<BoxValue<Rat>> {
            self.boxes.top(dims)
        }

        fn bottom(&self, dims: Dimensions) -> Flagged<BoxValue<Rat>> {
            self.boxes.bottom(dims)
        }

        fn dimension(&self, v: &BoxValue<Rat>) -> Dimensions {
            self.boxes.dimension(v)
        }

        fn meet(
            &self,
            _a: &BoxValue<Rat>,
            _b: &BoxValue<Rat>,
        ) -> Result<Flagged<BoxValue<Rat>>, Exception> {
            unreachable!("meet must be guarded by the manager check")
        }
    }

    #[test]
    fn incompatible_managers_are_rejected() {
        let m1 = Manager::new(RenamedBoxes {
            boxes: BoxDomain::new(),
            name: "warren.boxes.a",
        });
        let m2 = Manager::new(RenamedBoxes {
            boxes: BoxDomain::new(),
            name: "warren.boxes.b",
        });
        let a = AbstractValue::top(&m1, Dimensions::new(0, 1));
        let b = AbstractValue::top(&m2, Dimensions::new(0, 1));
        let out = a.meet(&b);
        let exc = out.exception.expect("incompatible managers raise");
        assert_eq!(exc.kind, ExcKind::InvalidArgument);
        assert!(exc.msg.contains("warren.boxes.a"));
        assert!(exc.msg.contains("warren.boxes.b"));
        // Same-library managers are compatible even as distinct instances.
        let m3 = Manager::new(RenamedBoxes {
            boxes: BoxDomain::new(),
            name: "warren.boxes.a",
        });
        let c = AbstractValue::top(&m3, Dimensions::new(0, 1));
        assert!(a.manager().compatible(c.manager()));
    }

    #[test]
    fn out_of_range_expression_degrades() {
        let m = man();
        let v = of_box(&m, Dimensions::new(0, 1), &[itv(0, 5)]);
        let cons = vec![Lincons0::new(expr(vec![(3, 1)], 0), ConsTyp::SupEq)];
        let out = v.meet_lincons_array(&cons);
        let exc = out.exception.expect("out-of-range dimension raises");
        assert!(exc.msg.contains("expression 0"));
        assert!(exc.msg.contains("dimension 3"));
        assert_eq!(out.value.is_top(), Trivalent::True);
    }

    #[test]
    fn array_fold_fallback() {
        // The box engine leaves meet_array unimplemented; the dispatch
        // layer folds the binary meet instead.
        let m = man();
        let dims = Dimensions::new(0, 1);
        let vs = vec![
            of_box(&m, dims, &[itv(0, 10)]),
            of_box(&m, dims, &[itv(2, 12)]),
            of_box(&m, dims, &[itv(-5, 7)]),
        ];
        let out = AbstractValue::meet_array(&vs).unwrap();
        assert!(out.exception.is_none());
        assert_eq!(out.value.to_box().value, vec![itv(2, 7)]);
        let out = AbstractValue::join_array(&vs).unwrap();
        assert_eq!(out.value.to_box().value, vec![itv(-5, 12)]);
        // The empty family is a hard error.
        let empty: Vec<AbstractValue<BoxDomain<Rat>>> = Vec::new();
        assert!(AbstractValue::meet_array(&empty).is_err());
    }

    #[test]
    fn generic_substitution_inverts_assignment() {
        // v = [1,2] after x0 := x0 + 1; substitution recovers x0 in [0,1].
        let m = man();
        let dims = Dimensions::new(0, 1);
        let v = of_box(&m, dims, &[itv(1, 2)]);
        let out = v.substitute_linexpr_array(&[0], &[expr(vec![(0, 1)], 1)], None);
        assert!(out.exception.is_none());
        assert_eq!(out.value.to_box().value, vec![itv(0, 1)]);
        assert_eq!(out.value.dimension(), dims);
    }

    #[test]
    fn generic_substitution_respects_integer_sections() {
        // The same inversion on an integer dimension, with a doubling:
        // v = x0 in [2,7] after x0 := 2*x0; pre-state x0 in [1,3].
        let m = man();
        let dims = Dimensions::new(1, 0);
        let v = of_box(&m, dims, &[itv(2, 7)]);
        let out = v.substitute_linexpr_array(&[0], &[expr(vec![(0, 2)], 0)], None);
        assert!(out.exception.is_none());
        assert_eq!(out.value.to_box().value, vec![itv(1, 3)]);
    }

    #[test]
    fn substitution_with_destination_meets() {
        let m = man();
        let dims = Dimensions::new(0, 1);
        let v = of_box(&m, dims, &[itv(1, 2)]);
        let dst = of_box(&m, dims, &[itv(0, 0)]);
        let out = v.substitute_linexpr_array(&[0], &[expr(vec![(0, 1)], 1)], Some(&dst));
        assert_eq!(out.value.to_box().value, vec![itv(0, 0)]);
    }

    #[test]
    fn parallel_substitution_uses_the_pre_state() {
        // x0 := x1, x1 := x0 is its own inverse.
        let m = man();
        let dims = Dimensions::new(0, 2);
        let v = of_box(&m, dims, &[itv(0, 1), itv(5, 6)]);
        let out = v.substitute_linexpr_array(
            &[0, 1],
            &[expr(vec![(1, 1)], 0), expr(vec![(0, 1)], 0)],
            None,
        );
        assert!(out.exception.is_none());
        assert_eq!(out.value.to_box().value, vec![itv(5, 6), itv(0, 1)]);
    }

    #[test]
    fn texpr_substitution_requires_linearity() {
        let m = man();
        let v = of_box(&m, Dimensions::new(0, 1), &[itv(1, 4)]);
        // Linear tree: x0 := x0 + 1 inverts exactly as the linear path.
        let t = Texpr0::Add(
            Box::new(Texpr0::Dim(0)),
            Box::new(Texpr0::Cst(Coeff::of_int(1))),
        );
        let out = v.substitute_texpr_array(&[0], &[t], None);
        assert!(out.exception.is_none());
        assert_eq!(out.value.to_box().value, vec![itv(0, 3)]);
        // Nonlinear tree: degrade with an invalid-argument exception.
        let sq = Texpr0::Mul(Box::new(Texpr0::Dim(0)), Box::new(Texpr0::Dim(0)));
        let out = v.substitute_texpr_array(&[0], &[sq], None);
        let exc = out.exception.expect("nonlinear substitution raises");
        assert_eq!(exc.kind, ExcKind::InvalidArgument);
        assert_eq!(out.value.is_top(), Trivalent::True);
    }

    #[test]
    fn duplicate_assignment_target_degrades() {
        let m = man();
        let v = of_box(&m, Dimensions::new(0, 2), &[itv(0, 1), itv(0, 1)]);
        let out = v.assign_linexpr_array(
            &[0, 0],
            &[expr(vec![], 1), expr(vec![], 2)],
            None,
        );
        let exc = out.exception.expect("duplicate target raises");
        assert!(exc.msg.contains("assigned twice"));
    }

    #[test]
    fn widening_with_thresholds_retains_satisfied_candidates() {
        let m = man();
        let dims = Dimensions::new(0, 1);
        let a = of_box(&m, dims, &[itv(0, 5)]);
        let b = of_box(&m, dims, &[itv(0, 10)]);
        // Candidates: x0 <= 64 (satisfied by b), x0 <= 8 (not satisfied).
        let mut cons = vec![
            Lincons0::new(expr(vec![(0, -1)], 8), ConsTyp::SupEq),
            Lincons0::new(expr(vec![(0, -1)], 64), ConsTyp::SupEq),
        ];
        let out = a.widening_threshold(&b, &mut cons);
        assert!(out.exception.is_none());
        assert_eq!(out.value.to_box().value, vec![itv(0, 64)]);
        // The satisfied candidate was swapped to the front.
        assert_eq!(cons[0].linexpr.cst(), &Coeff::of_int(64));
    }

    #[test]
    fn widening_without_thresholds_jumps() {
        let m = man();
        let dims = Dimensions::new(0, 1);
        let a = of_box(&m, dims, &[itv(0, 5)]);
        let b = of_box(&m, dims, &[itv(0, 10)]);
        let w = a.widening(&b).value;
        assert_eq!(w.to_box().value, vec![Itv::above(<Rat as Num>::zero())]);
    }

    #[test]
    fn in_place_variants_match_the_pure_ones() {
        let m = man();
        let dims = Dimensions::new(0, 1);
        let a = of_box(&m, dims, &[itv(0, 10)]);
        let b = of_box(&m, dims, &[itv(5, 20)]);
        let pure = a.meet(&b).value;
        let mut inplace = a.clone();
        let out = inplace.meet_assign(&b);
        assert!(out.exception.is_none());
        assert_eq!(inplace, pure);
        let pure = a.join(&b).value;
        let mut inplace = a;
        inplace.join_assign(&b);
        assert_eq!(inplace, pure);
    }

    #[test]
    fn bounds_and_sats() {
        let m = man();
        let v = of_box(&m, Dimensions::new(0, 2), &[itv(1, 3), itv(-2, 2)]);
        assert_eq!(v.bound_dimension(0).value, itv(1, 3));
        let e = expr(vec![(0, 2), (1, 1)], 0);
        assert_eq!(v.bound_linexpr(&e).value, itv(0, 8));
        assert_eq!(
            v.sat_lincons(&Lincons0::new(expr(vec![(0, 1)], -1), ConsTyp::SupEq)),
            Trivalent::True
        );
        assert_eq!(v.sat_interval(0, &itv(0, 5)), Trivalent::True);
        assert_eq!(v.sat_interval(1, &itv(0, 5)), Trivalent::False);
        // A tree bound through the fallback-or-native path.
        let t = Texpr0::Mul(Box::new(Texpr0::Dim(0)), Box::new(Texpr0::Dim(0)));
        assert!(v.bound_texpr(&t).value.contains(&itv(1, 9)));
    }

    #[test]
    fn unimplemented_closure_degrades_to_top() {
        let m = man();
        let v = of_box(&m, Dimensions::new(0, 1), &[itv(0, 1)]);
        let out = v.closure();
        let exc = out.exception.expect("closure is unimplemented for boxes");
        assert_eq!(exc.kind, ExcKind::NotImplemented);
        assert_eq!(out.value.is_top(), Trivalent::True);
        assert_eq!(out.exactness, Exactness::Unknown);
    }

    #[test]
    #[should_panic]
    fn abort_option_panics_instead_of_degrading() {
        let mut opts = crate::manager::Options::default();
        opts.set_abort_on(ExcKind::NotImplemented, true);
        let m = Manager::with_options(BoxDomain::<Rat>::new(), opts);
        let v = AbstractValue::top(&m, Dimensions::new(0, 1));
        let _ = v.closure();
    }

    #[test]
    fn of_lincons_array_builds_from_top() {
        let m = man();
        let cons = vec![
            Lincons0::new(expr(vec![(0, 1)], -3), ConsTyp::SupEq),
            Lincons0::new(expr(vec![(0, -1)], 3), ConsTyp::SupEq),
        ];
        let out = AbstractValue::of_lincons_array(&m, Dimensions::new(0, 1), &cons);
        assert_eq!(out.value.to_box().value, vec![itv(3, 3)]);
    }

    #[test]
    fn of_lincons_array_tags_its_own_exceptions() {
        let m = man();
        let cons = vec![Lincons0::new(expr(vec![(5, 1)], 0), ConsTyp::SupEq)];
        let out = AbstractValue::of_lincons_array(&m, Dimensions::new(0, 1), &cons);
        let exc = out.exception.expect("out-of-range dimension raises");
        assert_eq!(exc.funid, FunId::OfLinconsArray);
        assert_eq!(out.value.is_top(), Trivalent::True);
    }

    #[test]
    fn housekeeping_is_harmless_for_boxes() {
        let m = man();
        let mut v = of_box(&m, Dimensions::new(0, 1), &[itv(0, 1)]);
        assert!(v.canonicalize().is_none());
        assert!(v.minimize().is_none());
        assert_eq!(v.is_canonical(), Trivalent::True);
        assert_eq!(v.is_minimal(), Trivalent::True);
        // Approximation is unimplemented; the value is left unchanged.
        let exc = v.approximate(0).expect("approximate is unimplemented");
        assert_eq!(exc.kind, ExcKind::NotImplemented);
        assert_eq!(v.to_box().value, vec![itv(0, 1)]);
    }
}
