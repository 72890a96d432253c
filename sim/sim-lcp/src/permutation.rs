//! Symmetric row/column permutation of a system matrix.
//!
//! Pivoting solvers keep the variables they are currently solving for in a
//! contiguous leading block of the matrix. Rather than gathering that block
//! into fresh storage on every pivot, the matrix itself is permuted by
//! swapping rows and columns in pairs, and the permutation is recorded so
//! vectors can be moved between the two index spaces.
//!
//! Two index spaces exist:
//!
//! - **original** indexes refer to the matrix as it was handed in,
//! - **permuted** indexes refer to the matrix as it is now.

use nalgebra::{DMatrix, DVector};

/// A square matrix together with the symmetric permutation applied to it.
///
/// The matrix is owned: nothing outside the permutation can observe it in a
/// half-swapped state, and `perm`/`iperm` always describe its current layout.
///
/// # Example
///
/// ```
/// use nalgebra::{DMatrix, DVector};
/// use sim_lcp::MatrixPermutation;
///
/// let a = DMatrix::from_row_slice(3, 3, &[
///     1.0, 2.0, 3.0,
///     2.0, 4.0, 5.0,
///     3.0, 5.0, 6.0,
/// ]);
/// let mut perm = MatrixPermutation::new(a);
/// perm.swap_rows_and_columns(0, 2);
///
/// assert_eq!(perm.matrix()[(0, 0)], 6.0);
/// assert_eq!(perm.original_index_of(0), 2);
/// assert_eq!(perm.permuted_index_of(2), 0);
///
/// let v = DVector::from_vec(vec![10.0, 20.0, 30.0]);
/// assert_eq!(perm.unpermute(&perm.permute(&v)), v);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixPermutation {
    /// The matrix in its current (permuted) layout.
    a: DMatrix<f64>,
    /// `perm[p]` is the original index now living at permuted index `p`.
    perm: Vec<usize>,
    /// Inverse of `perm`: `iperm[i]` is the permuted index of original `i`.
    iperm: Vec<usize>,
}

impl MatrixPermutation {
    /// Take ownership of a square matrix with the identity permutation.
    ///
    /// # Panics
    ///
    /// Panics if `a` is not square.
    #[must_use]
    pub fn new(a: DMatrix<f64>) -> Self {
        assert!(
            a.is_square(),
            "MatrixPermutation needs a square matrix, got {}x{}",
            a.nrows(),
            a.ncols()
        );
        let n = a.nrows();
        Self {
            a,
            perm: (0..n).collect(),
            iperm: (0..n).collect(),
        }
    }

    /// Dimension of the matrix.
    #[must_use]
    pub fn len(&self) -> usize {
        self.perm.len()
    }

    /// Whether the matrix is 0×0.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.perm.is_empty()
    }

    /// The matrix in its current permuted layout.
    #[must_use]
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.a
    }

    /// Give back the permuted matrix.
    #[must_use]
    pub fn into_matrix(self) -> DMatrix<f64> {
        self.a
    }

    /// Swap rows `i` and `j` and columns `i` and `j` together.
    ///
    /// `i` and `j` are permuted indexes. Swapping both keeps a symmetric
    /// matrix symmetric.
    pub fn swap_rows_and_columns(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        self.a.swap_rows(i, j);
        self.a.swap_columns(i, j);
        self.perm.swap(i, j);
        self.iperm[self.perm[i]] = i;
        self.iperm[self.perm[j]] = j;
    }

    /// Map an original-order vector into permuted order.
    #[must_use]
    pub fn permute(&self, input: &DVector<f64>) -> DVector<f64> {
        debug_assert_eq!(input.len(), self.len());
        DVector::from_fn(self.len(), |p, _| input[self.perm[p]])
    }

    /// Map a permuted-order vector back into original order.
    #[must_use]
    pub fn unpermute(&self, input: &DVector<f64>) -> DVector<f64> {
        let mut out = DVector::zeros(self.len());
        self.unpermute_from(input, &mut out, 0);
        out
    }

    /// Scatter permuted entries `start_index..` of `input` into their
    /// original slots in `out`.
    ///
    /// Entries of `out` whose permuted index is below `start_index` are left
    /// untouched, so a caller that only computed a suffix of the vector does
    /// not pay for the rest.
    pub fn unpermute_from(&self, input: &DVector<f64>, out: &mut DVector<f64>, start_index: usize) {
        debug_assert_eq!(input.len(), self.len());
        debug_assert_eq!(out.len(), self.len());
        for p in start_index..self.len() {
            out[self.perm[p]] = input[p];
        }
    }

    /// Permuted index of original index `i`.
    #[must_use]
    pub fn permuted_index_of(&self, i: usize) -> usize {
        self.iperm[i]
    }

    /// Original index of permuted index `p`.
    #[must_use]
    pub fn original_index_of(&self, p: usize) -> usize {
        self.perm[p]
    }

    /// Check that `perm` and `iperm` are mutual inverses.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.perm.len() == self.iperm.len()
            && self
                .perm
                .iter()
                .enumerate()
                .all(|(p, &i)| i < self.iperm.len() && self.iperm[i] == p)
    }
}
