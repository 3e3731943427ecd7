//! Managers: shared per-domain configuration and the operation identifiers,
//! exception taxonomy, and result metadata used by the dispatch layer.
//!
//! A [`Manager`] pairs a domain engine with its options behind an `Arc`, so
//! cloning a manager is cheap and every value built from it shares one
//! configuration. Managers are immutable after construction; per-operation
//! results carry their own metadata in an [`OpOutcome`] instead of mutating
//! shared state.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::Domain;

/// Identifier of a dispatchable operation. Used to index per-operation
/// options and to tag exceptions with their origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum FunId {
    Copy,
    Free,
    ASize,
    Minimize,
    Canonicalize,
    Hash,
    Approximate,
    Print,
    Serialize,
    Deserialize,
    Bottom,
    Top,
    OfBox,
    OfLinconsArray,
    Dimension,
    IsBottom,
    IsTop,
    IsLeq,
    IsEq,
    IsDimensionUnconstrained,
    SatInterval,
    SatLincons,
    SatTcons,
    BoundDimension,
    BoundLinexpr,
    BoundTexpr,
    ToBox,
    ToLinconsArray,
    ToTconsArray,
    ToGeneratorArray,
    Meet,
    MeetArray,
    MeetLinconsArray,
    MeetTconsArray,
    Join,
    JoinArray,
    AddRayArray,
    AssignLinexprArray,
    SubstituteLinexprArray,
    AssignTexprArray,
    SubstituteTexprArray,
    AddDimensions,
    RemoveDimensions,
    PermuteDimensions,
    ForgetArray,
    Expand,
    Fold,
    Widening,
    Closure,
}

impl FunId {
    /// Number of operation identifiers.
    pub const COUNT: usize = 49;

    /// All identifiers, in index order.
    pub const ALL: [FunId; FunId::COUNT] = [
        FunId::Copy,
        FunId::Free,
        FunId::ASize,
        FunId::Minimize,
        FunId::Canonicalize,
        FunId::Hash,
        FunId::Approximate,
        FunId::Print,
        FunId::Serialize,
        FunId::Deserialize,
        FunId::Bottom,
        FunId::Top,
        FunId::OfBox,
        FunId::OfLinconsArray,
        FunId::Dimension,
        FunId::IsBottom,
        FunId::IsTop,
        FunId::IsLeq,
        FunId::IsEq,
        FunId::IsDimensionUnconstrained,
        FunId::SatInterval,
        FunId::SatLincons,
        FunId::SatTcons,
        FunId::BoundDimension,
        FunId::BoundLinexpr,
        FunId::BoundTexpr,
        FunId::ToBox,
        FunId::ToLinconsArray,
        FunId::ToTconsArray,
        FunId::ToGeneratorArray,
        FunId::Meet,
        FunId::MeetArray,
        FunId::MeetLinconsArray,
        FunId::MeetTconsArray,
        FunId::Join,
        FunId::JoinArray,
        FunId::AddRayArray,
        FunId::AssignLinexprArray,
        FunId::SubstituteLinexprArray,
        FunId::AssignTexprArray,
        FunId::SubstituteTexprArray,
        FunId::AddDimensions,
        FunId::RemoveDimensions,
        FunId::PermuteDimensions,
        FunId::ForgetArray,
        FunId::Expand,
        FunId::Fold,
        FunId::Widening,
        FunId::Closure,
    ];

    /// Index of this identifier into option tables.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The class of an exceptional outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExcKind {
    /// A time budget was exhausted.
    Timeout,
    /// A space budget was exhausted.
    OutOfSpace,
    /// A numeric computation overflowed its representation.
    Overflow,
    /// An argument was malformed or incompatible.
    InvalidArgument,
    /// The engine does not implement the operation.
    NotImplemented,
}

impl ExcKind {
    /// Number of exception kinds.
    pub const COUNT: usize = 5;

    /// Index of this kind into per-kind option tables.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ExcKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExcKind::Timeout => "timeout",
            ExcKind::OutOfSpace => "out of space",
            ExcKind::Overflow => "overflow",
            ExcKind::InvalidArgument => "invalid argument",
            ExcKind::NotImplemented => "not implemented",
        };
        write!(f, "{}", s)
    }
}

/// An exceptional outcome of an operation. Exceptions are recoverable: the
/// dispatch layer degrades the result to top and reports the exception
/// alongside it, unless the manager's options request an abort.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{kind} in {funid}: {msg}")]
pub struct Exception {
    /// The exception class.
    pub kind: ExcKind,
    /// The operation that raised it.
    pub funid: FunId,
    /// A human-readable detail string.
    pub msg: String,
}

impl Exception {
    /// An invalid-argument exception.
    pub fn invalid_argument(funid: FunId, msg: impl Into<String>) -> Exception {
        Exception {
            kind: ExcKind::InvalidArgument,
            funid,
            msg: msg.into(),
        }
    }

    /// A not-implemented exception.
    pub fn not_implemented(funid: FunId) -> Exception {
        Exception {
            kind: ExcKind::NotImplemented,
            funid,
            msg: "operation not implemented by this domain".to_string(),
        }
    }

}

/// How precise a computed result is relative to the concrete semantics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exactness {
    /// The result is exactly the concrete result.
    Exact,
    /// The result is a sound over-approximation.
    Approximate,
    /// The engine makes no precision claim.
    Unknown,
}

impl Exactness {
    /// Combine the exactness of two sub-results: the weaker claim wins.
    pub fn meet(self, other: Exactness) -> Exactness {
        use Exactness::*;
        match (self, other) {
            (Unknown, _) | (_, Unknown) => Unknown,
            (Approximate, _) | (_, Approximate) => Approximate,
            (Exact, Exact) => Exact,
        }
    }
}

/// The result of a dispatched operation: the value, a precision claim, and
/// the exception that was recovered from, if any.
#[derive(Clone, Debug)]
pub struct OpOutcome<T> {
    /// The computed value. Sound even when an exception was recovered from.
    pub value: T,
    /// Precision of the value.
    pub exactness: Exactness,
    /// The exception the operation recovered from, if any.
    pub exception: Option<Exception>,
}

impl<T> OpOutcome<T> {
    /// An exact, exception-free outcome.
    pub fn exact(value: T) -> OpOutcome<T> {
        OpOutcome {
            value,
            exactness: Exactness::Exact,
            exception: None,
        }
    }

    /// An approximate, exception-free outcome.
    pub fn approximate(value: T) -> OpOutcome<T> {
        OpOutcome {
            value,
            exactness: Exactness::Approximate,
            exception: None,
        }
    }

    /// Map the value while keeping the metadata.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OpOutcome<U> {
        OpOutcome {
            value: f(self.value),
            exactness: self.exactness,
            exception: self.exception,
        }
    }
}

/// Per-operation tuning knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FunOpt {
    /// Engine-specific algorithm selector; `0` is the default algorithm,
    /// negative values favor speed, positive values favor precision.
    pub algorithm: i32,
    /// The caller would like an exact result if feasible.
    pub flag_exact_wanted: bool,
    /// The caller would like the best abstraction if feasible.
    pub flag_best_wanted: bool,
}

impl Default for FunOpt {
    fn default() -> FunOpt {
        FunOpt {
            algorithm: 0,
            flag_exact_wanted: false,
            flag_best_wanted: false,
        }
    }
}

/// Manager-wide options: one [`FunOpt`] per operation plus exception policy.
#[derive(Clone, Debug)]
pub struct Options {
    funopt: [FunOpt; FunId::COUNT],
    abort: [bool; ExcKind::COUNT],
}

impl Options {
    /// The tuning knobs for one operation.
    pub fn funopt(&self, funid: FunId) -> &FunOpt {
        &self.funopt[funid.index()]
    }

    /// Replace the tuning knobs for one operation.
    pub fn set_funopt(&mut self, funid: FunId, opt: FunOpt) {
        self.funopt[funid.index()] = opt;
    }

    /// Whether exceptions of the given kind abort (panic) instead of
    /// degrading. Off by default: the library recovers with a sound top.
    pub fn abort_on(&self, kind: ExcKind) -> bool {
        self.abort[kind.index()]
    }

    /// Set the abort policy for one exception kind.
    pub fn set_abort_on(&mut self, kind: ExcKind, abort: bool) {
        self.abort[kind.index()] = abort;
    }
}

impl Default for Options {
    fn default() -> Options {
        Options {
            funopt: [FunOpt::default(); FunId::COUNT],
            abort: [false; ExcKind::COUNT],
        }
    }
}

struct Inner<D> {
    domain: D,
    library: String,
    version: String,
    options: Options,
}

/// A shared handle to a domain engine and its options.
///
/// # Examples
/// ```
/// # use warren::boxes::BoxDomain;
/// # use warren::manager::Manager;
/// # use warren::num::Rat;
/// let man: Manager<BoxDomain<Rat>> = Manager::new(BoxDomain::new());
/// let other = man.clone();
/// assert!(man.compatible(&other));
/// ```
pub struct Manager<D> {
    inner: Arc<Inner<D>>,
}

impl<D> Clone for Manager<D> {
    fn clone(&self) -> Manager<D> {
        Manager {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Domain> Manager<D> {
    /// A manager with default options.
    pub fn new(domain: D) -> Manager<D> {
        Manager::with_options(domain, Options::default())
    }

    /// A manager with explicit options.
    pub fn with_options(domain: D, options: Options) -> Manager<D> {
        let library = domain.library().to_string();
        let version = domain.version().to_string();
        Manager {
            inner: Arc::new(Inner {
                domain,
                library,
                version,
                options,
            }),
        }
    }

    /// The underlying domain engine.
    pub fn domain(&self) -> &D {
        &self.inner.domain
    }

    /// The engine's library name.
    pub fn library(&self) -> &str {
        &self.inner.library
    }

    /// The engine's version string.
    pub fn version(&self) -> &str {
        &self.inner.version
    }

    /// The manager's options.
    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    /// Whether two managers drive the same library. Values from compatible
    /// managers may be combined; the dispatch layer enforces this.
    pub fn compatible(&self, other: &Manager<D>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.library == other.inner.library
    }
}

impl<D: Domain> fmt::Debug for Manager<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("library", &self.inner.library)
            .field("version", &self.inner.version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn funid_table_is_consistent() {
        assert_eq!(FunId::ALL.len(), FunId::COUNT);
        for (i, f) in FunId::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
        }
    }

    #[test]
    fn options_index_by_funid() {
        let mut opts = Options::default();
        assert_eq!(opts.funopt(FunId::Meet).algorithm, 0);
        opts.set_funopt(
            FunId::Meet,
            FunOpt {
                algorithm: 1,
                ..FunOpt::default()
            },
        );
        assert_eq!(opts.funopt(FunId::Meet).algorithm, 1);
        assert_eq!(opts.funopt(FunId::Join).algorithm, 0);
    }

    #[test]
    fn exactness_meet_is_pessimistic() {
        assert_eq!(Exactness::Exact.meet(Exactness::Exact), Exactness::Exact);
        assert_eq!(
            Exactness::Exact.meet(Exactness::Approximate),
            Exactness::Approximate
        );
        assert_eq!(
            Exactness::Approximate.meet(Exactness::Unknown),
            Exactness::Unknown
        );
    }

    #[test]
    fn exception_display() {
        let e = Exception::not_implemented(FunId::Closure);
        assert!(e.to_string().contains("not implemented"));
        assert!(e.to_string().contains("Closure"));
    }
}
