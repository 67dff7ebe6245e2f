//! Vertex algebras described by their block shape, and their commutants.

use crate::error::{Error, Result};
use crate::linalg::*;
use crate::subspace::Subspace;
use log::trace;
use ndarray::Array2;
use rand::Rng;
use std::fmt::{self, Display};
use std::ops::Range;

/// Largest commutator norm accepted by the construction check.
pub const COMMUTATOR_TOLERANCE: f64 = 1e-9;

/// Shape of a finite dimensional algebra `⊕_i M_{dA_i} ⊗ I_{dY_i}`.
///
/// The shape is a non-empty list of pairs `(dA_i, dY_i)` of positive integers.
/// The algebra acts on a space of dimension `n = Σ dA_i * dY_i`, split into
/// contiguous blocks. Inside block `i`, the index `(α, p)` with `α < dA_i` and
/// `p < dY_i` is `offset_i + α * dY_i + p`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlgebraShape {
    blocks: Vec<(usize, usize)>,
}

impl AlgebraShape {
    /// Build a shape from rows of the form `[dA, dY]`.
    ///
    /// ```
    /// # use nc_graph::AlgebraShape;
    /// let shape = AlgebraShape::new(&[[2, 1], [1, 3]]).unwrap();
    /// assert_eq!(shape.n(), 5);
    /// assert!(AlgebraShape::new(&[vec![1, 2, 3]]).is_err());
    /// ```
    pub fn new<R: AsRef<[usize]>>(rows: &[R]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::Shape("an algebra needs at least one block".into()));
        }
        let mut blocks = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            match row.as_ref() {
                [d_a, d_y] if *d_a > 0 && *d_y > 0 => blocks.push((*d_a, *d_y)),
                [_, _] => {
                    return Err(Error::Shape(format!(
                        "block {} has a non-positive dimension",
                        i
                    )));
                }
                other => {
                    return Err(Error::Shape(format!(
                        "block {} has {} entries instead of 2",
                        i,
                        other.len()
                    )));
                }
            }
        }
        Ok(Self { blocks })
    }
    /// The single block shape `[[1, n]]`: scalars acting on `C^n`.
    pub fn trivial(n: usize) -> Result<Self> {
        Self::new(&[[1, n]])
    }
    /// The shape `[[1, 1]; n]` of the diagonal matrices, whose graphs are the
    /// classical graphs on `n` vertices.
    pub fn classical(n: usize) -> Result<Self> {
        Self::new(&vec![[1, 1]; n])
    }
    /// The pairs `(dA_i, dY_i)`.
    pub fn blocks(&self) -> &[(usize, usize)] {
        &self.blocks
    }
    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
    /// Dimension `dA_i * dY_i` of each block.
    pub fn block_dims(&self) -> Vec<usize> {
        self.blocks.iter().map(|&(d_a, d_y)| d_a * d_y).collect()
    }
    /// Dimension of the space the algebra acts on.
    pub fn n(&self) -> usize {
        self.block_dims().iter().sum()
    }
    pub fn offsets(&self) -> Vec<usize> {
        let mut res = Vec::with_capacity(self.len());
        let mut offset = 0;
        for d in self.block_dims() {
            res.push(offset);
            offset += d
        }
        res
    }
    /// Indices covered by block `i`.
    pub fn range(&self, i: usize) -> Range<usize> {
        let start = self.offsets()[i];
        let (d_a, d_y) = self.blocks[i];
        start..start + d_a * d_y
    }
    /// `dY` of the block containing the index `j`.
    pub fn d_y_at(&self, j: usize) -> usize {
        let i = (0..self.len())
            .find(|&i| self.range(i).contains(&j))
            .expect("index out of range");
        self.blocks[i].1
    }
}

impl Display for AlgebraShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (d_a, d_y)) in self.blocks.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?
            }
            write!(f, "[{}, {}]", d_a, d_y)?
        }
        write!(f, "]")
    }
}

/// The vertex algebra `S0` of a shape and its commutant `S1`.
///
/// `S0 = ⊕_i Full(dA_i) ⊗ I_{dY_i}` and `S1 = ⊕_i I_{dA_i} ⊗ Full(dY_i)`.
/// The two algebras commute because their non-trivial factors act on
/// different tensor legs of each block.
#[derive(Debug, Clone)]
pub struct Algebras {
    pub s0: Subspace<C64>,
    pub s1: Subspace<C64>,
}

impl Algebras {
    pub fn new(shape: &AlgebraShape) -> Result<Self> {
        let dims = shape.block_dims();
        let diagonal = |f: &dyn Fn(usize, usize) -> Subspace<C64>| -> Subspace<C64> {
            let blocks: Vec<Vec<_>> = (0..shape.len())
                .map(|i| {
                    (0..shape.len())
                        .map(|j| {
                            if i == j {
                                let (d_a, d_y) = shape.blocks()[i];
                                f(d_a, d_y)
                            } else {
                                Subspace::empty(dims[i], dims[j])
                            }
                        })
                        .collect()
                })
                .collect();
            Subspace::from_blocks(&dims, &dims, &blocks)
        };
        let s0 = diagonal(&|d_a, d_y| Subspace::full(d_a, d_a).kron(&Subspace::identity_span(d_y)));
        let s1 = diagonal(&|d_a, d_y| Subspace::identity_span(d_a).kron(&Subspace::full(d_y, d_y)));
        trace!("Algebras of shape {}: dim S0 = {}, dim S1 = {}", shape, s0.dim(), s1.dim());
        let res = Self { s0, s1 };
        let id: Array2<C64> = identity(shape.n());
        if !res.s0.contains(&id) {
            return Err(Error::AlgebraicAssertion("S0 does not contain the identity".into()));
        }
        if !res.s1.contains(&id) {
            return Err(Error::AlgebraicAssertion("S1 does not contain the identity".into()));
        }
        let defect = res.commutator_defect(1, &mut rand::rng());
        if defect >= COMMUTATOR_TOLERANCE {
            return Err(Error::AlgebraicAssertion(format!(
                "S0 and S1 do not commute (commutator norm {:e})",
                defect
            )));
        }
        Ok(res)
    }
    /// Largest norm of `ab - ba` over `samples` random pairs `a ∈ S0`, `b ∈ S1`.
    pub fn commutator_defect<R: Rng + ?Sized>(&self, samples: usize, rng: &mut R) -> f64 {
        let mut res: f64 = 0.;
        for _ in 0..samples {
            let a = self.s0.random_element(rng);
            let b = self.s1.random_element(rng);
            res = res.max(hs_norm(&(a.dot(&b) - b.dot(&a))))
        }
        res
    }
    /// Dimension of the space the algebras act on.
    pub fn n(&self) -> usize {
        self.s0.shape().0
    }
}
