#![crate_name = "warren"]
#![crate_type = "lib"]
#![warn(missing_docs)]

//! A library of numerical abstract domains for abstract interpretation.
//!
//! The high-level interface is an [`AbstractValue`] bound to a [`Manager`]:
//! the manager carries a domain engine and its options, and every operation
//! on a value is checked and dispatched through it. Engines implement the
//! [`Domain`] trait; operations an engine leaves out are either replaced by
//! generic fallbacks or recovered from by degrading to a sound top value.
//! The crate ships one engine, the interval (box) domain in [`boxes`],
//! parameterized by the scalar representation through the [`Num`] trait.
//!
//! ```
//! use warren::{AbstractValue, BoxDomain, Dimensions, Manager, Rat};
//! use warren::linexpr::{Coeff, ConsTyp, Lincons0, Linexpr0};
//!
//! let man = Manager::new(BoxDomain::<Rat>::new());
//! // x0 - 3 >= 0 and 3 - x0 >= 0 pin x0 to 3.
//! let mut lo = Linexpr0::new(Coeff::of_int(-3));
//! lo.set_coeff(0, Coeff::of_int(1));
//! let mut hi = Linexpr0::new(Coeff::of_int(3));
//! hi.set_coeff(0, Coeff::of_int(-1));
//! let cons = vec![
//!     Lincons0::new(lo, ConsTyp::SupEq),
//!     Lincons0::new(hi, ConsTyp::SupEq),
//! ];
//! let v = AbstractValue::of_lincons_array(&man, Dimensions::new(0, 1), &cons);
//! assert!(v.value.bound_dimension(0).value.is_point());
//! ```
//!
//! [`AbstractValue`]: ./value/struct.AbstractValue.html
//! [`Manager`]: ./manager/struct.Manager.html
//! [`Domain`]: ./domain/trait.Domain.html
//! [`Num`]: ./num/trait.Num.html

pub mod bound;
pub mod boxes;
pub mod dimension;
pub mod domain;
pub mod interval;
pub mod linearize;
pub mod linexpr;
pub mod manager;
pub mod num;
pub mod value;

pub use crate::bound::Bound;
pub use crate::boxes::{BoxDomain, BoxValue};
pub use crate::dimension::{Dim, DimChange, DimPerm, Dimensions};
pub use crate::domain::{Domain, Flagged};
pub use crate::interval::Itv;
pub use crate::linearize::{Tcons0, Texpr0};
pub use crate::linexpr::{Coeff, ConsTyp, Lincons0, Linexpr0};
pub use crate::manager::{
    Exactness, ExcKind, Exception, FunId, FunOpt, Manager, OpOutcome, Options,
};
pub use crate::num::{Num, Rat};
pub use crate::value::AbstractValue;

/// Three-valued logic for abstract predicates: a definite answer when the
/// abstraction can prove it, [`Trivalent::Unknown`] otherwise.
///
/// # Examples
/// ```
/// # use warren::Trivalent;
/// assert_eq!(Trivalent::from(true), Trivalent::True);
/// assert_eq!(Trivalent::True.and(Trivalent::Unknown), Trivalent::Unknown);
/// assert_eq!(Trivalent::False.and(Trivalent::Unknown), Trivalent::False);
/// assert_eq!(Trivalent::True.not(), Trivalent::False);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trivalent {
    /// The predicate definitely does not hold.
    False,
    /// The predicate definitely holds.
    True,
    /// The abstraction cannot decide.
    Unknown,
}

impl Trivalent {
    /// Logical negation; `Unknown` stays `Unknown`.
    pub fn not(self) -> Trivalent {
        match self {
            Trivalent::False => Trivalent::True,
            Trivalent::True => Trivalent::False,
            Trivalent::Unknown => Trivalent::Unknown,
        }
    }

    /// Kleene conjunction: `False` absorbs.
    pub fn and(self, other: Trivalent) -> Trivalent {
        match (self, other) {
            (Trivalent::False, _) | (_, Trivalent::False) => Trivalent::False,
            (Trivalent::True, Trivalent::True) => Trivalent::True,
            _ => Trivalent::Unknown,
        }
    }

    /// Kleene disjunction: `True` absorbs.
    pub fn or(self, other: Trivalent) -> Trivalent {
        match (self, other) {
            (Trivalent::True, _) | (_, Trivalent::True) => Trivalent::True,
            (Trivalent::False, Trivalent::False) => Trivalent::False,
            _ => Trivalent::Unknown,
        }
    }
}

impl From<bool> for Trivalent {
    fn from(b: bool) -> Trivalent {
        if b {
            Trivalent::True
        } else {
            Trivalent::False
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kleene_tables() {
        use Trivalent::*;
        assert_eq!(Unknown.and(False), False);
        assert_eq!(Unknown.and(True), Unknown);
        assert_eq!(Unknown.or(True), True);
        assert_eq!(Unknown.or(False), Unknown);
        assert_eq!(Unknown.not(), Unknown);
    }
}
