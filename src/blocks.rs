//! Compressed representation of an S0-graph by its block subspaces.
//!
//! Bimodule closure forces the `(i, j)` block of every element of an S0-graph
//! to lie in `Full(dA_i, dA_j) ⊗ B_ij` for a subspace `B_ij` of the
//! `dY_i x dY_j` matrices. The array of the `B_ij` determines the graph.

use crate::algebra::{AlgebraShape, Algebras};
use crate::error::{Error, Result};
use crate::graph::S0Graph;
use crate::linalg::C64;
use crate::subspace::Subspace;
use log::trace;
use ndarray::s;
use std::ops::Index;

/// The `k x k` array of block subspaces of a graph with `k` blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSubspaces {
    shape: AlgebraShape,
    blocks: Vec<Vec<Subspace<C64>>>,
}

impl BlockSubspaces {
    /// Check that `blocks[i][j]` is a space of `dY_i x dY_j` matrices.
    pub fn new(shape: AlgebraShape, blocks: Vec<Vec<Subspace<C64>>>) -> Result<Self> {
        let k = shape.len();
        if blocks.len() != k || blocks.iter().any(|row| row.len() != k) {
            return Err(Error::Shape(format!(
                "expected a {}x{} array of block subspaces",
                k, k
            )));
        }
        for (i, row) in blocks.iter().enumerate() {
            for (j, block) in row.iter().enumerate() {
                let expected = (shape.blocks()[i].1, shape.blocks()[j].1);
                if block.shape() != expected {
                    return Err(Error::Dimension {
                        expected,
                        found: block.shape(),
                    });
                }
            }
        }
        Ok(Self { shape, blocks })
    }
    pub fn shape(&self) -> &AlgebraShape {
        &self.shape
    }
    /// Number of blocks of the algebra.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl Index<(usize, usize)> for BlockSubspaces {
    type Output = Subspace<C64>;

    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        &self.blocks[i][j]
    }
}

/// Compute the block subspaces of `g`.
///
/// `B_ij` is spanned by all the `dY_i x dY_j` sub-blocks of the restrictions of
/// the elements of `g` to the rows of block `i` and the columns of block `j`.
pub fn decompose(g: &S0Graph) -> BlockSubspaces {
    let shape = g.shape();
    let offsets = shape.offsets();
    let mut blocks = Vec::with_capacity(shape.len());
    for (i, &(d_ai, d_yi)) in shape.blocks().iter().enumerate() {
        let mut row = Vec::with_capacity(shape.len());
        for (j, &(d_aj, d_yj)) in shape.blocks().iter().enumerate() {
            let mut family = Vec::new();
            for m in g.subspace().basis() {
                for alpha in 0..d_ai {
                    for beta in 0..d_aj {
                        let r0 = offsets[i] + alpha * d_yi;
                        let c0 = offsets[j] + beta * d_yj;
                        family.push(m.slice(s![r0..r0 + d_yi, c0..c0 + d_yj]).to_owned())
                    }
                }
            }
            row.push(Subspace::span(d_yi, d_yj, family))
        }
        blocks.push(row)
    }
    BlockSubspaces {
        shape: shape.clone(),
        blocks,
    }
}

/// Build the graph whose block subspaces are `blocks`.
///
/// The space `⊕_ij Full(dA_i, dA_j) ⊗ B_ij` is closed under adjoint and
/// joined with `S0` before being validated.
pub fn reconstruct(shape: &AlgebraShape, blocks: &BlockSubspaces) -> Result<S0Graph> {
    if blocks.shape() != shape {
        return Err(Error::Shape(format!(
            "block subspaces of shape {} used with shape {}",
            blocks.shape(),
            shape
        )));
    }
    assemble(shape, &blocks.blocks)
}

/// Tensor every block with the full `dA_i x dA_j` space, close under adjoint
/// and under `S0`, and validate.
pub(crate) fn assemble(shape: &AlgebraShape, blocks: &[Vec<Subspace<C64>>]) -> Result<S0Graph> {
    let dims = shape.block_dims();
    let full_blocks: Vec<Vec<_>> = blocks
        .iter()
        .zip(shape.blocks())
        .map(|(row, &(d_ai, _))| {
            row.iter()
                .zip(shape.blocks())
                .map(|(b, &(d_aj, _))| Subspace::full(d_ai, d_aj).kron(b))
                .collect()
        })
        .collect();
    let s = Subspace::from_blocks(&dims, &dims, &full_blocks);
    let algebras = Algebras::new(shape)?;
    let s = s.join(&s.adjoint()).join(&algebras.s0);
    trace!("Assembled a subspace of dimension {}", s.dim());
    S0Graph::new(shape.clone(), s)
}
