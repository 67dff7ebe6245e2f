//! Dense matrix helpers shared by the subspace code, the graph
//! constructions and the modelling layer.

use ndarray::{Array2, LinalgScalar, ScalarOperand, s};
use num::complex::Complex64;
use num::traits::NumAssign;
use rand::Rng;
use rand_distr::StandardNormal;
use std::fmt::Debug;

pub type C64 = Complex64;

/// A field of coefficients for matrix subspaces.
pub trait Scalar:
    LinalgScalar + ScalarOperand + NumAssign + PartialEq + Debug + Send + Sync
{
    fn conj(self) -> Self;
    /// Square of the modulus.
    fn norm_sqr(self) -> f64;
    fn from_real(x: f64) -> Self;
    fn real(self) -> f64;
    /// A standard gaussian sample of the field (unit variance).
    fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> Self;
}

impl Scalar for f64 {
    #[inline]
    fn conj(self) -> Self {
        self
    }
    #[inline]
    fn norm_sqr(self) -> f64 {
        self * self
    }
    #[inline]
    fn from_real(x: f64) -> Self {
        x
    }
    #[inline]
    fn real(self) -> f64 {
        self
    }
    fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> Self {
        rng.sample(StandardNormal)
    }
}

impl Scalar for C64 {
    #[inline]
    fn conj(self) -> Self {
        Complex64::conj(&self)
    }
    #[inline]
    fn norm_sqr(self) -> f64 {
        Complex64::norm_sqr(&self)
    }
    #[inline]
    fn from_real(x: f64) -> Self {
        C64::new(x, 0.)
    }
    #[inline]
    fn real(self) -> f64 {
        self.re
    }
    fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let re: f64 = rng.sample(StandardNormal);
        let im: f64 = rng.sample(StandardNormal);
        C64::new(re, im) * std::f64::consts::FRAC_1_SQRT_2
    }
}

pub fn identity<N: Scalar>(n: usize) -> Array2<N> {
    Array2::eye(n)
}

/// Conjugate transpose.
pub fn dagger<N: Scalar>(m: &Array2<N>) -> Array2<N> {
    m.t().mapv(Scalar::conj)
}

/// Hilbert-Schmidt inner product `tr(a^* b)`.
pub fn inner<N: Scalar>(a: &Array2<N>, b: &Array2<N>) -> N {
    debug_assert_eq!(a.dim(), b.dim());
    let mut res = N::zero();
    for (&x, &y) in a.iter().zip(b.iter()) {
        res += x.conj() * y
    }
    res
}

pub fn hs_norm<N: Scalar>(m: &Array2<N>) -> f64 {
    m.iter().map(|x| x.norm_sqr()).sum::<f64>().sqrt()
}

pub fn kron<N: Scalar>(a: &Array2<N>, b: &Array2<N>) -> Array2<N> {
    ndarray::linalg::kron(a, b)
}

/// Partial trace over the first factor of a `(d1*d2) x (d1*d2)` matrix.
pub fn partial_trace_first<N: Scalar>(m: &Array2<N>, d1: usize, d2: usize) -> Array2<N> {
    assert_eq!(m.dim(), (d1 * d2, d1 * d2));
    let mut res = Array2::zeros((d2, d2));
    for a in 0..d1 {
        res += &m.slice(s![a * d2..(a + 1) * d2, a * d2..(a + 1) * d2]);
    }
    res
}

/// The `rows x cols` matrix with a single one at `(i, j)`.
pub fn matrix_unit<N: Scalar>(rows: usize, cols: usize, i: usize, j: usize) -> Array2<N> {
    let mut res = Array2::zeros((rows, cols));
    res[(i, j)] = N::one();
    res
}

/// Copy `m` into a zero `rows x cols` matrix at offset `(r0, c0)`.
pub fn embed<N: Scalar>(
    m: &Array2<N>,
    rows: usize,
    cols: usize,
    r0: usize,
    c0: usize,
) -> Array2<N> {
    let mut res = Array2::zeros((rows, cols));
    let (r, c) = m.dim();
    res.slice_mut(s![r0..r0 + r, c0..c0 + c]).assign(m);
    res
}

/// Largest modulus of the entries of `m - m^*`.
pub fn hermitian_defect<N: Scalar>(m: &Array2<N>) -> f64 {
    let (r, c) = m.dim();
    assert_eq!(r, c);
    let mut res: f64 = 0.;
    for i in 0..r {
        for j in 0..=i {
            res = res.max((m[(i, j)] - m[(j, i)].conj()).norm_sqr().sqrt())
        }
    }
    res
}
