//! Dimensions and dimension-space transformations.
//!
//! A value lives in a space of `intdim` integer-typed dimensions followed by
//! `realdim` real-typed dimensions; dimension indices `0..intdim` are integer
//! and `intdim..intdim+realdim` are real. [`DimChange`] and [`DimPerm`] are
//! validated at construction so that every instance reaching a domain engine
//! is well formed.

use std::fmt;

use thiserror::Error;

/// A dimension index.
pub type Dim = usize;

/// An error constructing or applying a dimension transformation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DimError {
    /// The insertion positions are not sorted or fall outside the section.
    #[error("dimension change is invalid for a space of ({intdim}, {realdim}): {msg}")]
    BadChange {
        /// Integer dimensions of the target space.
        intdim: usize,
        /// Real dimensions of the target space.
        realdim: usize,
        /// What went wrong.
        msg: String,
    },
    /// The permutation is not a bijection on `0..size`.
    #[error("dimension permutation of size {size} is not a bijection")]
    BadPerm {
        /// The expected size of the permutation.
        size: usize,
    },
}

/// The shape of a dimension space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    /// Number of integer-typed dimensions.
    pub intdim: usize,
    /// Number of real-typed dimensions.
    pub realdim: usize,
}

impl Dimensions {
    /// A space with `intdim` integer and `realdim` real dimensions.
    pub fn new(intdim: usize, realdim: usize) -> Dimensions {
        Dimensions { intdim, realdim }
    }

    /// Total number of dimensions.
    pub fn total(&self) -> usize {
        self.intdim + self.realdim
    }

    /// Whether dimension `d` is integer-typed in this space.
    pub fn is_int(&self, d: Dim) -> bool {
        d < self.intdim
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} int, {} real)", self.intdim, self.realdim)
    }
}

/// A set of dimensions to insert into (or remove from) a space.
///
/// Positions are interpreted against the *source* space: inserting at
/// position `p` places a new dimension immediately before the current
/// dimension `p`, and a position equal to the section size appends at the
/// section's end. Each list must be sorted; `ints` positions must fall in the
/// integer section and `reals` positions in the whole space.
///
/// # Examples
/// ```
/// # use warren::dimension::{DimChange, Dimensions};
/// let dims = Dimensions::new(1, 2);
/// // Append one integer dimension and one real dimension.
/// let chg = DimChange::new(vec![1], vec![3]).unwrap();
/// assert!(chg.validate_add(dims).is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DimChange {
    ints: Vec<Dim>,
    reals: Vec<Dim>,
}

impl DimChange {
    /// Build a change from sorted position lists.
    ///
    /// # Errors
    /// Fails if either list is not sorted in nondecreasing order.
    pub fn new(ints: Vec<Dim>, reals: Vec<Dim>) -> Result<DimChange, DimError> {
        if !ints.windows(2).all(|w| w[0] <= w[1]) || !reals.windows(2).all(|w| w[0] <= w[1]) {
            return Err(DimError::BadChange {
                intdim: 0,
                realdim: 0,
                msg: "positions must be sorted".to_string(),
            });
        }
        Ok(DimChange { ints, reals })
    }

    /// The integer-section insertion positions.
    pub fn ints(&self) -> &[Dim] {
        &self.ints
    }

    /// The real-section insertion positions.
    pub fn reals(&self) -> &[Dim] {
        &self.reals
    }

    /// Number of dimensions added (or removed).
    pub fn added(&self) -> Dimensions {
        Dimensions::new(self.ints.len(), self.reals.len())
    }

    /// Check the change against a source space for insertion.
    pub fn validate_add(&self, dims: Dimensions) -> Result<(), DimError> {
        let bad = |msg: &str| DimError::BadChange {
            intdim: dims.intdim,
            realdim: dims.realdim,
            msg: msg.to_string(),
        };
        if self.ints.iter().any(|&p| p > dims.intdim) {
            return Err(bad("integer insertion past the integer section"));
        }
        if self.reals.iter().any(|&p| p < dims.intdim || p > dims.total()) {
            return Err(bad("real insertion outside the real section"));
        }
        Ok(())
    }

    /// Check the change against a source space for removal. Every listed
    /// position must name an existing dimension of the right type, with no
    /// duplicates.
    pub fn validate_remove(&self, dims: Dimensions) -> Result<(), DimError> {
        let bad = |msg: &str| DimError::BadChange {
            intdim: dims.intdim,
            realdim: dims.realdim,
            msg: msg.to_string(),
        };
        if self.ints.windows(2).any(|w| w[0] == w[1]) || self.reals.windows(2).any(|w| w[0] == w[1])
        {
            return Err(bad("duplicate removal position"));
        }
        if self.ints.iter().any(|&p| p >= dims.intdim) {
            return Err(bad("integer removal names a non-integer dimension"));
        }
        if self.reals.iter().any(|&p| p < dims.intdim || p >= dims.total()) {
            return Err(bad("real removal names a non-real dimension"));
        }
        Ok(())
    }

    /// All positions of the change, integer section first.
    pub fn positions(&self) -> impl Iterator<Item = Dim> + '_ {
        self.ints.iter().chain(self.reals.iter()).copied()
    }
}

/// A permutation of the dimensions of a space, validated to be a bijection.
/// Permutations never move a dimension across the integer/real boundary;
/// engines rely on the caller-checked section split staying put.
///
/// # Examples
/// ```
/// # use warren::dimension::DimPerm;
/// let p = DimPerm::new(vec![1, 0, 2]).unwrap();
/// assert_eq!(p.image(0), 1);
/// assert_eq!(p.image(1), 0);
/// assert!(DimPerm::new(vec![0, 0, 2]).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DimPerm {
    map: Vec<Dim>,
}

impl DimPerm {
    /// Build a permutation from its image list: dimension `i` moves to
    /// `map[i]`.
    ///
    /// # Errors
    /// Fails unless `map` is a bijection on `0..map.len()`.
    pub fn new(map: Vec<Dim>) -> Result<DimPerm, DimError> {
        let mut seen = vec![false; map.len()];
        for &t in &map {
            if t >= map.len() || seen[t] {
                return Err(DimError::BadPerm { size: map.len() });
            }
            seen[t] = true;
        }
        Ok(DimPerm { map })
    }

    /// The identity permutation on `size` dimensions.
    pub fn identity(size: usize) -> DimPerm {
        DimPerm {
            map: (0..size).collect(),
        }
    }

    /// The identity with the listed pairs swapped.
    ///
    /// # Panics
    /// Panics if a pair index is out of range.
    pub fn with_swaps(size: usize, swaps: &[(Dim, Dim)]) -> DimPerm {
        let mut map: Vec<Dim> = (0..size).collect();
        for &(a, b) in swaps {
            map.swap(a, b);
        }
        DimPerm { map }
    }

    /// Number of dimensions permuted.
    pub fn size(&self) -> usize {
        self.map.len()
    }

    /// Where dimension `d` moves to.
    pub fn image(&self, d: Dim) -> Dim {
        self.map[d]
    }

    /// The full image list.
    pub fn images(&self) -> &[Dim] {
        &self.map
    }

    /// Apply the permutation to a vector of per-dimension data.
    ///
    /// # Panics
    /// Panics if `items.len()` differs from the permutation size.
    pub fn apply<T: Clone>(&self, items: &[T]) -> Vec<T> {
        assert_eq!(
            items.len(),
            self.map.len(),
            "Permutation size does not match the value's dimensions"
        );
        let mut out = items.to_vec();
        for (i, &t) in self.map.iter().enumerate() {
            out[t] = items[i].clone();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_requires_sorted_positions() {
        assert!(DimChange::new(vec![0, 1], vec![2, 2]).is_ok());
        assert!(DimChange::new(vec![1, 0], vec![]).is_err());
        assert!(DimChange::new(vec![], vec![3, 2]).is_err());
    }

    #[test]
    fn change_add_respects_sections() {
        let dims = Dimensions::new(2, 2);
        // Appending at each section's end is allowed.
        let chg = DimChange::new(vec![2], vec![4]).unwrap();
        assert!(chg.validate_add(dims).is_ok());
        // An integer insertion past the integer section is not.
        let chg = DimChange::new(vec![3], vec![]).unwrap();
        assert!(chg.validate_add(dims).is_err());
        // A real insertion inside the integer section is not.
        let chg = DimChange::new(vec![], vec![1]).unwrap();
        assert!(chg.validate_add(dims).is_err());
    }

    #[test]
    fn change_remove_requires_existing_dims() {
        let dims = Dimensions::new(2, 2);
        let chg = DimChange::new(vec![0, 1], vec![2, 3]).unwrap();
        assert!(chg.validate_remove(dims).is_ok());
        // Removal position equal to the section size names nothing.
        let chg = DimChange::new(vec![2], vec![]).unwrap();
        assert!(chg.validate_remove(dims).is_err());
        // Duplicates are rejected.
        let chg = DimChange::new(vec![0, 0], vec![]).unwrap();
        assert!(chg.validate_remove(dims).is_err());
    }

    #[test]
    fn perm_must_be_bijection() {
        assert!(DimPerm::new(vec![2, 0, 1]).is_ok());
        assert!(DimPerm::new(vec![0, 0, 1]).is_err());
        assert!(DimPerm::new(vec![0, 3, 1]).is_err());
    }

    #[test]
    fn perm_apply_moves_data() {
        let p = DimPerm::new(vec![2, 0, 1]).unwrap();
        assert_eq!(p.apply(&['a', 'b', 'c']), vec!['b', 'c', 'a']);
        let id = DimPerm::identity(3);
        assert_eq!(id.apply(&[1, 2, 3]), vec![1, 2, 3]);
    }

    #[test]
    fn perm_with_swaps() {
        let p = DimPerm::with_swaps(4, &[(0, 2)]);
        assert_eq!(p.images(), &[2, 1, 0, 3]);
        assert_eq!(p.apply(&[10, 20, 30, 40]), vec![30, 20, 10, 40]);
    }
}
