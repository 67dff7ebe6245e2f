//! Affine expressions in real decision variables.
//!
//! A variable is a real number identified by its index. Complex and hermitian
//! matrix variables are represented by affine matrix expressions whose
//! coefficients are constant complex matrices.

use crate::linalg::*;
use ndarray::{Array2, s};
use std::collections::BTreeMap;

/// A real decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var(pub(crate) usize);

impl Var {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Allocator of fresh variables.
#[derive(Debug, Default)]
pub struct VarPool {
    len: usize,
}

impl VarPool {
    pub fn new() -> Self {
        Self::default()
    }
    /// Number of variables allocated so far.
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    fn fresh(&mut self) -> Var {
        self.len += 1;
        Var(self.len - 1)
    }
    /// A new real scalar variable.
    pub fn scalar(&mut self) -> AffineScalar {
        AffineScalar {
            constant: 0.,
            terms: vec![(self.fresh(), 1.)],
        }
    }
    /// `Σ_k y_k m_k` with one real coefficient `y_k` per matrix of `family`,
    /// or two (real and imaginary part) if `complex` is set.
    pub fn combination(&mut self, family: &[Array2<C64>], complex: bool) -> AffineMatrix {
        assert!(!family.is_empty());
        let mut terms = Vec::with_capacity(family.len() * if complex { 2 } else { 1 });
        for m in family {
            terms.push((self.fresh(), m.clone()));
            if complex {
                terms.push((self.fresh(), m * C64::i()))
            }
        }
        AffineMatrix {
            constant: Array2::zeros(family[0].dim()),
            terms,
        }
    }
    /// A free `n x n` hermitian matrix, using `n^2` real variables.
    pub fn hermitian(&mut self, n: usize) -> AffineMatrix {
        let mut family = Vec::with_capacity(n * n);
        for i in 0..n {
            family.push(matrix_unit(n, n, i, i));
            for j in 0..i {
                let e: Array2<C64> = matrix_unit(n, n, i, j);
                let f = dagger(&e);
                family.push(&e + &f);
                family.push((&e - &f) * C64::i());
            }
        }
        self.combination(&family, false)
    }
}

/// `constant + Σ coeff * var`
#[derive(Debug, Clone, Default)]
pub struct AffineScalar {
    pub(crate) constant: f64,
    pub(crate) terms: Vec<(Var, f64)>,
}

impl AffineScalar {
    pub fn constant(c: f64) -> Self {
        Self {
            constant: c,
            terms: Vec::new(),
        }
    }
    pub fn add(&self, other: &Self) -> Self {
        let mut terms = self.terms.clone();
        terms.extend_from_slice(&other.terms);
        Self {
            constant: self.constant + other.constant,
            terms,
        }
    }
    pub fn scale(&self, c: f64) -> Self {
        Self {
            constant: self.constant * c,
            terms: self.terms.iter().map(|&(v, x)| (v, x * c)).collect(),
        }
    }
    /// `c - self`
    pub fn subtracted_from(&self, c: f64) -> Self {
        self.scale(-1.).add(&Self::constant(c))
    }
    /// Coefficients as a map, merging the terms on the same variable.
    pub fn coefficients(&self) -> BTreeMap<Var, f64> {
        let mut res = BTreeMap::new();
        for &(v, x) in &self.terms {
            *res.entry(v).or_insert(0.) += x
        }
        res
    }
    pub fn eval(&self, y: &[f64]) -> f64 {
        self.constant + self.terms.iter().map(|&(v, x)| x * y[v.0]).sum::<f64>()
    }
    /// The `1 x 1` matrix expression with the same value.
    pub fn to_matrix(&self) -> AffineMatrix {
        let one = |x: f64| Array2::from_elem((1, 1), C64::from_real(x));
        AffineMatrix {
            constant: one(self.constant),
            terms: self.terms.iter().map(|&(v, x)| (v, one(x))).collect(),
        }
    }
}

/// `constant + Σ var * coeff` with complex matrix coefficients.
#[derive(Debug, Clone)]
pub struct AffineMatrix {
    pub(crate) constant: Array2<C64>,
    pub(crate) terms: Vec<(Var, Array2<C64>)>,
}

impl AffineMatrix {
    pub fn constant(m: Array2<C64>) -> Self {
        Self {
            constant: m,
            terms: Vec::new(),
        }
    }
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::constant(Array2::zeros((rows, cols)))
    }
    pub fn dim(&self) -> (usize, usize) {
        self.constant.dim()
    }
    /// Sum of `rows x cols` expressions.
    pub fn sum<I>(rows: usize, cols: usize, iter: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut res = Self::zeros(rows, cols);
        for e in iter {
            assert_eq!(e.dim(), (rows, cols));
            res.constant += &e.constant;
            res.terms.extend(e.terms)
        }
        res
    }
    /// Image by a real-linear map `f`, applied to the constant and to each
    /// coefficient.
    pub fn map_linear<F>(&self, f: F) -> Self
    where
        F: Fn(&Array2<C64>) -> Array2<C64>,
    {
        Self {
            constant: f(&self.constant),
            terms: self.terms.iter().map(|(v, m)| (*v, f(m))).collect(),
        }
    }
    pub fn add(&self, other: &Self) -> Self {
        assert_eq!(self.dim(), other.dim());
        let mut terms = self.terms.clone();
        terms.extend(other.terms.iter().cloned());
        Self {
            constant: &self.constant + &other.constant,
            terms,
        }
    }
    pub fn sub_constant(&self, m: &Array2<C64>) -> Self {
        Self {
            constant: &self.constant - m,
            terms: self.terms.clone(),
        }
    }
    pub fn scale(&self, c: C64) -> Self {
        self.map_linear(|m| m * c)
    }
    pub fn adjoint(&self) -> Self {
        self.map_linear(dagger)
    }
    /// `a ⊗ self`
    pub fn kron_left(&self, a: &Array2<C64>) -> Self {
        self.map_linear(|m| kron(a, m))
    }
    /// Assemble a block matrix of expressions; `None` stands for a zero block.
    /// Block `(i, j)` must have size `rows[i] x cols[j]`.
    pub fn block_matrix(rows: &[usize], cols: &[usize], blocks: &[Vec<Option<&Self>>]) -> Self {
        assert_eq!(blocks.len(), rows.len());
        let total: (usize, usize) = (rows.iter().sum(), cols.iter().sum());
        let mut constant = Array2::zeros(total);
        let mut terms = Vec::new();
        let mut r0 = 0;
        for (i, line) in blocks.iter().enumerate() {
            assert_eq!(line.len(), cols.len());
            let mut c0 = 0;
            for (j, block) in line.iter().enumerate() {
                if let Some(e) = block {
                    assert_eq!(e.dim(), (rows[i], cols[j]));
                    constant
                        .slice_mut(s![r0..r0 + rows[i], c0..c0 + cols[j]])
                        .assign(&e.constant);
                    for (v, m) in &e.terms {
                        terms.push((*v, embed(m, total.0, total.1, r0, c0)))
                    }
                }
                c0 += cols[j]
            }
            r0 += rows[i]
        }
        Self { constant, terms }
    }
    /// `Re tr(w^* self)`
    pub fn trace_inner(&self, w: &Array2<C64>) -> AffineScalar {
        AffineScalar {
            constant: inner(w, &self.constant).re,
            terms: self.terms.iter().map(|(v, m)| (*v, inner(w, m).re)).collect(),
        }
    }
    /// Coefficients as a map, merging the terms on the same variable.
    pub fn coefficients(&self) -> BTreeMap<Var, Array2<C64>> {
        let mut res: BTreeMap<Var, Array2<C64>> = BTreeMap::new();
        for (v, m) in &self.terms {
            match res.get_mut(v) {
                Some(acc) => *acc += m,
                None => {
                    let _ = res.insert(*v, m.clone());
                }
            }
        }
        res
    }
    /// Value at the point `y`.
    pub fn eval(&self, y: &[f64]) -> Array2<C64> {
        let mut res = self.constant.clone();
        for (v, m) in &self.terms {
            res.scaled_add(C64::from_real(y[v.0]), m)
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hermitian_variables() {
        let mut pool = VarPool::new();
        let h = pool.hermitian(3);
        assert_eq!(pool.len(), 9);
        let y: Vec<f64> = (0..9).map(|i| i as f64 - 4.).collect();
        let m = h.eval(&y);
        assert!(hermitian_defect(&m) < 1e-15);
        assert!(m.iter().any(|x| x.im != 0.));
        assert_eq!(h.adjoint().eval(&y), m);
    }

    #[test]
    fn affine_operations() {
        let mut pool = VarPool::new();
        let x = pool.scalar();
        let z = pool.combination(&[identity(2)], true);
        let y = [2., 3., -1.];
        assert_eq!(x.scale(3.).subtracted_from(1.).eval(&y), -5.);
        let b = AffineMatrix::block_matrix(
            &[1, 2],
            &[1, 2],
            &[vec![Some(&x.to_matrix()), None], vec![None, Some(&z)]],
        );
        let v = b.eval(&y);
        assert_eq!(v[(0, 0)], C64::from_real(2.));
        assert_eq!(v[(1, 1)], C64::new(3., -1.));
        assert_eq!(v[(0, 1)], C64::from_real(0.));
        let w: Array2<C64> = identity(3);
        assert_eq!(b.trace_inner(&w).eval(&y), 2. + 6.);
        assert_eq!(b.kron_left(&identity(2)).eval(&y).dim(), (6, 6));
        assert_eq!(b.add(&b).coefficients()[&Var(1)][(2, 2)], C64::from_real(2.));
    }
}
