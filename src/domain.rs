//! The engine-side interface of an abstract domain.
//!
//! [`Domain`] has one method per dispatchable operation. An engine implements
//! the operations it supports natively; everything else keeps the default
//! body, which raises a NotImplemented exception that the dispatch layer
//! either recovers from (degrading to top) or replaces with a generic
//! fallback built from the operations the engine does provide.
//!
//! Engine methods are pure with respect to the engine: they take `&self` and
//! value arguments, and return fresh values. The dispatch layer owns
//! in-place variants.

use crate::dimension::{Dim, DimChange, DimPerm, Dimensions};
use crate::interval::Itv;
use crate::linearize::{Tcons0, Texpr0};
use crate::linexpr::{Lincons0, Linexpr0};
use crate::manager::{Exactness, Exception, FunId};
use crate::num::Num;
use crate::Trivalent;

/// A value paired with the engine's precision claim for it.
#[derive(Clone, Debug, PartialEq)]
pub struct Flagged<T> {
    /// The computed value.
    pub value: T,
    /// How precise the engine claims the value is.
    pub exactness: Exactness,
}

impl<T> Flagged<T> {
    /// An exact result.
    pub fn exact(value: T) -> Flagged<T> {
        Flagged {
            value,
            exactness: Exactness::Exact,
        }
    }

    /// A sound but possibly imprecise result.
    pub fn approximate(value: T) -> Flagged<T> {
        Flagged {
            value,
            exactness: Exactness::Approximate,
        }
    }

    /// Map the value, keeping the claim.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Flagged<U> {
        Flagged {
            value: f(self.value),
            exactness: self.exactness,
        }
    }
}

/// An abstract domain engine.
///
/// Required methods are the irreducible core: identification, top, bottom,
/// and the dimension query. Every other operation defaults to
/// NotImplemented; predicates default to a sound [`Trivalent::Unknown`].
#[allow(unused_variables)]
pub trait Domain: Sized {
    /// The scalar representation the engine computes with.
    type Num: Num;
    /// The engine's value representation.
    type Value: Clone + std::fmt::Debug + std::fmt::Display + PartialEq;

    /// A name identifying the library; values may only be combined across
    /// managers with equal library names.
    fn library(&self) -> &str;

    /// The library version.
    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    /// The full value on the given space.
    fn top(&self, dims: Dimensions) -> Flagged<Self::Value>;

    /// The empty value on the given space.
    fn bottom(&self, dims: Dimensions) -> Flagged<Self::Value>;

    /// The space a value lives in.
    fn dimension(&self, v: &Self::Value) -> Dimensions;

    /// A measure of the value's memory footprint, in abstract units.
    fn asize(&self, v: &Self::Value) -> Result<usize, Exception> {
        Err(Exception::not_implemented(FunId::ASize))
    }

    /// Put the value in minimal form, trading time for space.
    fn minimize(&self, v: &mut Self::Value) -> Result<(), Exception> {
        Err(Exception::not_implemented(FunId::Minimize))
    }

    /// Put the value in canonical form, so equal values compare equal.
    fn canonicalize(&self, v: &mut Self::Value) -> Result<(), Exception> {
        Err(Exception::not_implemented(FunId::Canonicalize))
    }

    /// Whether the value is already in minimal form.
    fn is_minimal(&self, v: &Self::Value) -> Trivalent {
        Trivalent::Unknown
    }

    /// Whether the value is already in canonical form.
    fn is_canonical(&self, v: &Self::Value) -> Trivalent {
        Trivalent::Unknown
    }

    /// A hash compatible with semantic equality of canonical forms.
    fn hash(&self, v: &Self::Value) -> Result<u64, Exception> {
        Err(Exception::not_implemented(FunId::Hash))
    }

    /// Coarsen the value in place; `algorithm` selects how aggressively.
    fn approximate(&self, v: &mut Self::Value, algorithm: i32) -> Result<(), Exception> {
        Err(Exception::not_implemented(FunId::Approximate))
    }

    /// Serialize to a byte stream.
    fn serialize(&self, v: &Self::Value) -> Result<Vec<u8>, Exception> {
        Err(Exception::not_implemented(FunId::Serialize))
    }

    /// Rebuild a value from a byte stream.
    fn deserialize(&self, bytes: &[u8]) -> Result<Self::Value, Exception> {
        Err(Exception::not_implemented(FunId::Deserialize))
    }

    /// The value abstracting a box: one interval per dimension.
    fn of_box(
        &self,
        dims: Dimensions,
        itvs: &[Itv<Self::Num>],
    ) -> Result<Flagged<Self::Value>, Exception> {
        Err(Exception::not_implemented(FunId::OfBox))
    }

    /// Whether the value is empty.
    fn is_bottom(&self, v: &Self::Value) -> Trivalent {
        Trivalent::Unknown
    }

    /// Whether the value is the full space.
    fn is_top(&self, v: &Self::Value) -> Trivalent {
        Trivalent::Unknown
    }

    /// Whether `a` is included in `b`.
    fn is_leq(&self, a: &Self::Value, b: &Self::Value) -> Trivalent {
        Trivalent::Unknown
    }

    /// Whether `a` and `b` describe the same set.
    fn is_eq(&self, a: &Self::Value, b: &Self::Value) -> Trivalent {
        Trivalent::Unknown
    }

    /// Whether the value puts no constraint on dimension `dim`.
    fn is_dimension_unconstrained(&self, v: &Self::Value, dim: Dim) -> Trivalent {
        Trivalent::Unknown
    }

    /// Whether every point of the value keeps `dim` inside `itv`.
    fn sat_interval(&self, v: &Self::Value, dim: Dim, itv: &Itv<Self::Num>) -> Trivalent {
        Trivalent::Unknown
    }

    /// Whether every point of the value satisfies the constraint.
    fn sat_lincons(&self, v: &Self::Value, cons: &Lincons0<Self::Num>) -> Trivalent {
        Trivalent::Unknown
    }

    /// The range of dimension `dim` over the value.
    fn bound_dimension(
        &self,
        v: &Self::Value,
        dim: Dim,
    ) -> Result<Flagged<Itv<Self::Num>>, Exception> {
        Err(Exception::not_implemented(FunId::BoundDimension))
    }

    /// The range of a linear expression over the value.
    fn bound_linexpr(
        &self,
        v: &Self::Value,
        expr: &Linexpr0<Self::Num>,
    ) -> Result<Flagged<Itv<Self::Num>>, Exception> {
        Err(Exception::not_implemented(FunId::BoundLinexpr))
    }

    /// Whether every point of the value satisfies the tree constraint.
    fn sat_tcons(&self, v: &Self::Value, cons: &Tcons0<Self::Num>) -> Trivalent {
        Trivalent::Unknown
    }

    /// The range of a tree expression over the value.
    fn bound_texpr(
        &self,
        v: &Self::Value,
        expr: &Texpr0<Self::Num>,
    ) -> Result<Flagged<Itv<Self::Num>>, Exception> {
        Err(Exception::not_implemented(FunId::BoundTexpr))
    }

    /// The smallest box enclosing the value, one interval per dimension.
    fn to_box(&self, v: &Self::Value) -> Result<Flagged<Vec<Itv<Self::Num>>>, Exception> {
        Err(Exception::not_implemented(FunId::ToBox))
    }

    /// A set of constraints whose conjunction over-approximates the value.
    fn to_lincons_array(
        &self,
        v: &Self::Value,
    ) -> Result<Flagged<Vec<Lincons0<Self::Num>>>, Exception> {
        Err(Exception::not_implemented(FunId::ToLinconsArray))
    }

    /// Intersection of two values on the same space.
    fn meet(&self, a: &Self::Value, b: &Self::Value) -> Result<Flagged<Self::Value>, Exception> {
        Err(Exception::not_implemented(FunId::Meet))
    }

    /// Intersection of a nonempty family. Engines may leave this to the
    /// dispatch layer's fold over [`Domain::meet`].
    fn meet_array(&self, vs: &[Self::Value]) -> Result<Flagged<Self::Value>, Exception> {
        Err(Exception::not_implemented(FunId::MeetArray))
    }

    /// Intersect with the conjunction of the constraints.
    fn meet_lincons_array(
        &self,
        v: &Self::Value,
        cons: &[Lincons0<Self::Num>],
    ) -> Result<Flagged<Self::Value>, Exception> {
        Err(Exception::not_implemented(FunId::MeetLinconsArray))
    }

    /// Intersect with the conjunction of tree constraints. Engines usually
    /// leave this to the dispatch layer, which linearizes against the
    /// value's box and falls back on [`Domain::meet_lincons_array`].
    fn meet_tcons_array(
        &self,
        v: &Self::Value,
        cons: &[Tcons0<Self::Num>],
    ) -> Result<Flagged<Self::Value>, Exception> {
        Err(Exception::not_implemented(FunId::MeetTconsArray))
    }

    /// Join (least upper bound) of two values on the same space.
    fn join(&self, a: &Self::Value, b: &Self::Value) -> Result<Flagged<Self::Value>, Exception> {
        Err(Exception::not_implemented(FunId::Join))
    }

    /// Join of a nonempty family.
    fn join_array(&self, vs: &[Self::Value]) -> Result<Flagged<Self::Value>, Exception> {
        Err(Exception::not_implemented(FunId::JoinArray))
    }

    /// Parallel assignment `dims[i] := exprs[i]`, optionally met with `dest`.
    fn assign_linexpr_array(
        &self,
        v: &Self::Value,
        dims: &[Dim],
        exprs: &[Linexpr0<Self::Num>],
        dest: Option<&Self::Value>,
    ) -> Result<Flagged<Self::Value>, Exception> {
        Err(Exception::not_implemented(FunId::AssignLinexprArray))
    }

    /// Parallel substitution, the inverse of assignment.
    fn substitute_linexpr_array(
        &self,
        v: &Self::Value,
        dims: &[Dim],
        exprs: &[Linexpr0<Self::Num>],
        dest: Option<&Self::Value>,
    ) -> Result<Flagged<Self::Value>, Exception> {
        Err(Exception::not_implemented(FunId::SubstituteLinexprArray))
    }

    /// Parallel assignment of tree expressions.
    fn assign_texpr_array(
        &self,
        v: &Self::Value,
        dims: &[Dim],
        exprs: &[Texpr0<Self::Num>],
        dest: Option<&Self::Value>,
    ) -> Result<Flagged<Self::Value>, Exception> {
        Err(Exception::not_implemented(FunId::AssignTexprArray))
    }

    /// Parallel substitution of tree expressions.
    fn substitute_texpr_array(
        &self,
        v: &Self::Value,
        dims: &[Dim],
        exprs: &[Texpr0<Self::Num>],
        dest: Option<&Self::Value>,
    ) -> Result<Flagged<Self::Value>, Exception> {
        Err(Exception::not_implemented(FunId::SubstituteTexprArray))
    }

    /// Insert dimensions; new dimensions are unconstrained, or pinned to
    /// zero when `project` is set. The change is already validated.
    fn add_dimensions(
        &self,
        v: &Self::Value,
        change: &DimChange,
        project: bool,
    ) -> Result<Flagged<Self::Value>, Exception> {
        Err(Exception::not_implemented(FunId::AddDimensions))
    }

    /// Remove the listed dimensions. The change is already validated.
    fn remove_dimensions(
        &self,
        v: &Self::Value,
        change: &DimChange,
    ) -> Result<Flagged<Self::Value>, Exception> {
        Err(Exception::not_implemented(FunId::RemoveDimensions))
    }

    /// Renumber dimensions through a permutation.
    fn permute_dimensions(
        &self,
        v: &Self::Value,
        perm: &DimPerm,
    ) -> Result<Flagged<Self::Value>, Exception> {
        Err(Exception::not_implemented(FunId::PermuteDimensions))
    }

    /// Forget the listed dimensions: unconstrained, or pinned to zero when
    /// `project` is set. The space is unchanged.
    fn forget_array(
        &self,
        v: &Self::Value,
        dims: &[Dim],
        project: bool,
    ) -> Result<Flagged<Self::Value>, Exception> {
        Err(Exception::not_implemented(FunId::ForgetArray))
    }

    /// Duplicate dimension `dim` into `n` extra copies with the same
    /// constraints, appended at the end of its section.
    fn expand(
        &self,
        v: &Self::Value,
        dim: Dim,
        n: usize,
    ) -> Result<Flagged<Self::Value>, Exception> {
        Err(Exception::not_implemented(FunId::Expand))
    }

    /// Fold the listed dimensions into the first one (their join), removing
    /// the others. `dims` is sorted and nonempty, all in one section.
    fn fold(&self, v: &Self::Value, dims: &[Dim]) -> Result<Flagged<Self::Value>, Exception> {
        Err(Exception::not_implemented(FunId::Fold))
    }

    /// Widening of `a` by `b`, with `a` included in `b`.
    fn widening(
        &self,
        a: &Self::Value,
        b: &Self::Value,
    ) -> Result<Flagged<Self::Value>, Exception> {
        Err(Exception::not_implemented(FunId::Widening))
    }

    /// Domain-specific closure (strongest normal form).
    fn closure(&self, v: &Self::Value) -> Result<Flagged<Self::Value>, Exception> {
        Err(Exception::not_implemented(FunId::Closure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::num::Rat;

    /// A deliberately minimal engine: only the required methods.
    struct Stub;

    #[derive(Clone, Debug, PartialEq)]
    struct Unit(Dimensions);

    impl std::fmt::Display for Unit {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "unit{}", self.0)
        }
    }

    impl Domain for Stub {
        type Num = Rat;
        type Value = Unit;

        fn library(&self) -> &str {
            "stub"
        }

        fn top(&self, dims: Dimensions) -> Flagged<Unit> {
            Flagged::exact(Unit(dims))
        }

        fn bottom(&self, dims: Dimensions) -> Flagged<Unit> {
            Flagged::exact(Unit(dims))
        }

        fn dimension(&self, v: &Unit) -> Dimensions {
            v.0
        }
    }

    #[test]
    fn defaults_raise_not_implemented() {
        let d = Stub;
        let v = d.top(Dimensions::new(1, 1)).value;
        let err = d.meet(&v, &v).unwrap_err();
        assert_eq!(err.funid, FunId::Meet);
        let err = d.closure(&v).unwrap_err();
        assert_eq!(err.funid, FunId::Closure);
    }

    #[test]
    fn default_predicates_are_unknown() {
        let d = Stub;
        let v = d.top(Dimensions::new(0, 1)).value;
        assert_eq!(d.is_bottom(&v), Trivalent::Unknown);
        assert_eq!(d.is_leq(&v, &v), Trivalent::Unknown);
    }
}
