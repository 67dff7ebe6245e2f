//! Subspaces of matrix spaces.
//!
//! A [`Subspace`] is stored as an orthonormal basis for the Hilbert-Schmidt
//! inner product `<a, b> = tr(a^* b)`. Every operation returns a new value;
//! subspaces are never modified after construction.

use crate::linalg::*;
use ndarray::{Array2, s};
use rand::Rng;
use std::fmt;

/// Relative tolerance used for every rank decision.
pub const TOLERANCE: f64 = 1e-9;

/// A linear subspace of the `rows x cols` matrices over `N`.
#[derive(Clone, Debug)]
pub struct Subspace<N> {
    rows: usize,
    cols: usize,
    basis: Vec<Array2<N>>,
}

/// Gram-Schmidt step: make `v` orthogonal to the orthonormal family `basis`
/// and append it if what is left is larger than `TOLERANCE * scale`.
/// Returns `true` if the dimension increased.
///
/// `scale` is the size of the matrices the family is built from, so that the
/// rounding noise of a vanishing combination is never normalized into a new
/// direction.
fn push_orthonormal<N: Scalar>(
    basis: &mut Vec<Array2<N>>,
    mut v: Array2<N>,
    real_coeffs: bool,
    scale: f64,
) -> bool {
    if hs_norm(&v) <= TOLERANCE * scale {
        return false;
    }
    // Two passes for numerical stability
    for _ in 0..2 {
        for b in basis.iter() {
            let mut c = inner(b, &v);
            if real_coeffs {
                c = N::from_real(c.real())
            }
            v.scaled_add(N::zero() - c, b);
        }
    }
    let residual = hs_norm(&v);
    if residual > TOLERANCE * scale {
        basis.push(v / N::from_real(residual));
        true
    } else {
        false
    }
}

impl<N: Scalar> Subspace<N> {
    /// The zero subspace of the `rows x cols` matrices.
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            basis: Vec::new(),
        }
    }
    /// The whole space of `rows x cols` matrices.
    pub fn full(rows: usize, cols: usize) -> Self {
        let mut basis = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                basis.push(matrix_unit(rows, cols, i, j))
            }
        }
        Self { rows, cols, basis }
    }
    /// The span of a family of `rows x cols` matrices.
    pub fn span<I>(rows: usize, cols: usize, family: I) -> Self
    where
        I: IntoIterator<Item = Array2<N>>,
    {
        let family: Vec<Array2<N>> = family.into_iter().collect();
        let scale = family.iter().map(hs_norm).fold(0., f64::max);
        let mut basis = Vec::new();
        for m in family {
            assert_eq!(m.dim(), (rows, cols));
            let _ = push_orthonormal(&mut basis, m, false, scale);
        }
        Self { rows, cols, basis }
    }
    /// The one-dimensional space spanned by the identity.
    pub fn identity_span(n: usize) -> Self {
        Self::span(n, n, Some(identity(n)))
    }
    /// A subspace spanned by `dim` gaussian matrices.
    pub fn random<R: Rng + ?Sized>(rows: usize, cols: usize, dim: usize, rng: &mut R) -> Self {
        let family: Vec<_> = (0..dim)
            .map(|_| Array2::from_shape_simple_fn((rows, cols), || N::gaussian(rng)))
            .collect();
        Self::span(rows, cols, family)
    }
    /// A self-adjoint subspace spanned by `dim` random hermitian matrices.
    pub fn random_hermitian<R: Rng + ?Sized>(n: usize, dim: usize, rng: &mut R) -> Self {
        let family: Vec<_> = (0..dim)
            .map(|_| {
                let g = Array2::from_shape_simple_fn((n, n), || N::gaussian(rng));
                (&g + &dagger(&g)) * N::from_real(0.5)
            })
            .collect();
        Self::span(n, n, family)
    }

    pub fn dim(&self) -> usize {
        self.basis.len()
    }
    /// Shape `(rows, cols)` of the matrices of the space.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
    /// Orthonormal basis of the space.
    pub fn basis(&self) -> &[Array2<N>] {
        &self.basis
    }
    pub fn is_empty(&self) -> bool {
        self.basis.is_empty()
    }

    /// Orthogonal projection of `m` on the subspace.
    pub fn project(&self, m: &Array2<N>) -> Array2<N> {
        assert_eq!(m.dim(), self.shape());
        let mut res = Array2::zeros(m.dim());
        for b in &self.basis {
            res.scaled_add(inner(b, m), b)
        }
        res
    }
    /// Returns `true` if `m` belongs to the subspace (up to relative tolerance).
    pub fn contains(&self, m: &Array2<N>) -> bool {
        if m.dim() != self.shape() {
            return false;
        }
        let scale = hs_norm(m).max(1.);
        hs_norm(&(m - &self.project(m))) <= TOLERANCE * 10. * scale
    }
    pub fn is_subspace_of(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.basis.iter().all(|b| other.contains(b))
    }
    /// Span of the union.
    pub fn join(&self, other: &Self) -> Self {
        assert_eq!(self.shape(), other.shape());
        let mut basis = self.basis.clone();
        for b in &other.basis {
            let _ = push_orthonormal(&mut basis, b.clone(), false, 1.);
        }
        Self {
            rows: self.rows,
            cols: self.cols,
            basis,
        }
    }
    /// Orthogonal complement in the space of `rows x cols` matrices.
    pub fn perp(&self) -> Self {
        let mut basis = self.basis.clone();
        let mut complement = Vec::new();
        for i in 0..self.rows {
            for j in 0..self.cols {
                let unit = matrix_unit(self.rows, self.cols, i, j);
                if push_orthonormal(&mut basis, unit, false, 1.) {
                    complement.push(basis[basis.len() - 1].clone())
                }
            }
        }
        Self {
            rows: self.rows,
            cols: self.cols,
            basis: complement,
        }
    }
    /// The space of the adjoints of the elements.
    pub fn adjoint(&self) -> Self {
        Self {
            rows: self.cols,
            cols: self.rows,
            basis: self.basis.iter().map(dagger).collect(),
        }
    }
    /// Returns `true` if the space is closed under adjoint.
    pub fn is_self_adjoint(&self) -> bool {
        self.rows == self.cols && self.adjoint().is_subspace_of(self)
    }
    /// Span of the Kronecker products `a (x) b`.
    pub fn kron(&self, other: &Self) -> Self {
        let mut basis = Vec::with_capacity(self.dim() * other.dim());
        for a in &self.basis {
            for b in &other.basis {
                basis.push(kron(a, b))
            }
        }
        Self {
            rows: self.rows * other.rows,
            cols: self.cols * other.cols,
            basis,
        }
    }
    /// Span of the products `a * b` with `a` in `self` and `b` in `other`.
    pub fn product(&self, other: &Self) -> Self {
        assert_eq!(self.cols, other.rows);
        let family = self
            .basis
            .iter()
            .flat_map(|a| other.basis.iter().map(move |b| a.dot(b)));
        Self::span(self.rows, other.cols, family)
    }
    /// Block matrix space: the direct sum of `blocks[i][j]` placed at block
    /// position `(i, j)`, where row block `i` has size `row_dims[i]` and column
    /// block `j` has size `col_dims[j]`.
    pub fn from_blocks(row_dims: &[usize], col_dims: &[usize], blocks: &[Vec<Self>]) -> Self {
        assert_eq!(blocks.len(), row_dims.len());
        let rows = row_dims.iter().sum();
        let cols = col_dims.iter().sum();
        let mut basis = Vec::new();
        let mut r0 = 0;
        for (i, row) in blocks.iter().enumerate() {
            assert_eq!(row.len(), col_dims.len());
            let mut c0 = 0;
            for (j, block) in row.iter().enumerate() {
                assert_eq!(block.shape(), (row_dims[i], col_dims[j]));
                for b in &block.basis {
                    basis.push(embed(b, rows, cols, r0, c0))
                }
                c0 += col_dims[j];
            }
            r0 += row_dims[i];
        }
        Self { rows, cols, basis }
    }
    /// Restriction of every element to the rows `r0..r0+rows` and the columns
    /// `c0..c0+cols`.
    pub fn restrict(&self, r0: usize, c0: usize, rows: usize, cols: usize) -> Self {
        let family = self
            .basis
            .iter()
            .map(|b| b.slice(s![r0..r0 + rows, c0..c0 + cols]).to_owned());
        Self::span(rows, cols, family)
    }
    /// A gaussian combination of the basis.
    pub fn random_element<R: Rng + ?Sized>(&self, rng: &mut R) -> Array2<N> {
        let mut res = Array2::zeros(self.shape());
        for b in &self.basis {
            res.scaled_add(N::gaussian(rng), b)
        }
        res
    }
}

impl Subspace<C64> {
    /// A basis of hermitian matrices, orthonormal for the real inner product
    /// `Re tr(a^* b)`, whose complex span is the subspace.
    /// The subspace must be self-adjoint.
    pub fn hermitian_basis(&self) -> Vec<Array2<C64>> {
        debug_assert!(self.is_self_adjoint());
        let mut res = Vec::with_capacity(self.dim());
        let half = C64::new(0.5, 0.);
        let half_i = C64::new(0., -0.5);
        for b in &self.basis {
            let adj = dagger(b);
            let re_part = (b + &adj) * half;
            let im_part = (b - &adj) * half_i;
            for h in [re_part, im_part] {
                if res.len() < self.dim() {
                    let _ = push_orthonormal(&mut res, h, true, 1.);
                }
            }
        }
        // Remove the rounding noise on the diagonal
        for h in &mut res {
            for i in 0..self.rows {
                h[(i, i)].im = 0.
            }
        }
        res
    }
}

impl<N: Scalar> PartialEq for Subspace<N> {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape()
            && self.dim() == other.dim()
            && self.is_subspace_of(other)
    }
}

impl<N> fmt::Display for Subspace<N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Subspace(dim={}, {}x{})",
            self.basis.len(),
            self.rows,
            self.cols
        )
    }
}
