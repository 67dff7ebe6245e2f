//! Constructions deriving new S0-graphs.
//!
//! Every function goes through the validating constructor
//! [`S0Graph::new`], so the results are always valid graphs.

use crate::algebra::AlgebraShape;
use crate::blocks::assemble;
use crate::error::{Error, Result};
use crate::graph::S0Graph;
use crate::linalg::C64;
use crate::subspace::Subspace;
use rand::Rng;

/// The graph with the same vertex algebra and `S = S0` (no edges).
pub fn vertex_graph(g: &S0Graph) -> Result<S0Graph> {
    S0Graph::new(g.shape().clone(), g.s0().clone())
}

/// The same subspace seen over the trivial vertex algebra of shape `[[1, n]]`.
pub fn forget_algebra(g: &S0Graph) -> Result<S0Graph> {
    S0Graph::new(AlgebraShape::trivial(g.n())?, g.subspace().clone())
}

/// The complement graph, whose subspace is `S^⊥ ∨ S0`.
///
/// Since `S0 ⊆ S`, taking the complement twice gives back `g`.
pub fn complement(g: &S0Graph) -> Result<S0Graph> {
    let s = g.subspace().perp().join(g.s0());
    S0Graph::new(g.shape().clone(), s)
}

/// Number of random generators used for the block `(row, col)`.
///
/// Half the geometric mean of the two `dY`, rounded half away from zero.
fn random_block_dim(d_y_row: usize, d_y_col: usize) -> usize {
    (((d_y_row * d_y_col) as f64).sqrt() / 2.).round() as usize
}

/// A random S0-graph of the given shape.
///
/// The diagonal blocks are random hermitian subspaces, the blocks below the
/// diagonal are random subspaces, and the blocks above the diagonal are
/// filled in by closing under adjoint.
pub fn random_s0graph<R: Rng + ?Sized>(shape: &AlgebraShape, rng: &mut R) -> Result<S0Graph> {
    let mut blocks = Vec::with_capacity(shape.len());
    for (row, &(_, d_y_row)) in shape.blocks().iter().enumerate() {
        let mut line = Vec::with_capacity(shape.len());
        for (col, &(_, d_y_col)) in shape.blocks().iter().enumerate() {
            let ds = random_block_dim(d_y_row, d_y_col);
            line.push(if row == col {
                Subspace::random_hermitian(d_y_row, ds, rng)
            } else if row > col {
                Subspace::random(d_y_row, d_y_col, ds, rng)
            } else {
                Subspace::empty(d_y_row, d_y_col)
            })
        }
        blocks.push(line)
    }
    assemble(shape, &blocks)
}

/// The classical graph on `n` vertices with the given edges, as an S0-graph
/// over the diagonal matrices.
///
/// ```
/// # use nc_graph::operations::classical_graph;
/// let c4 = classical_graph(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
/// // The diagonal plus both orientations of every edge
/// assert_eq!(c4.subspace().dim(), 4 + 8);
/// ```
pub fn classical_graph(n: usize, edges: &[(usize, usize)]) -> Result<S0Graph> {
    let shape = AlgebraShape::classical(n)?;
    let mut adjacent = vec![vec![false; n]; n];
    for &(u, v) in edges {
        if u >= n || v >= n {
            return Err(Error::Shape(format!(
                "edge ({}, {}) on a graph with {} vertices",
                u, v, n
            )));
        }
        adjacent[u][v] = true;
        adjacent[v][u] = true;
    }
    let blocks: Vec<Vec<Subspace<C64>>> = (0..n)
        .map(|u| {
            (0..n)
                .map(|v| {
                    if u == v || adjacent[u][v] {
                        Subspace::full(1, 1)
                    } else {
                        Subspace::empty(1, 1)
                    }
                })
                .collect()
        })
        .collect();
    assemble(&shape, &blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_dimensions() {
        assert_eq!(random_block_dim(1, 1), 1);
        assert_eq!(random_block_dim(2, 2), 1);
        assert_eq!(random_block_dim(1, 2), 1);
        assert_eq!(random_block_dim(3, 3), 2);
        assert_eq!(random_block_dim(4, 4), 2);
        assert_eq!(random_block_dim(5, 5), 3);
    }

    #[test]
    fn classical() {
        let g = classical_graph(3, &[(0, 1)]).unwrap();
        assert_eq!(g.subspace().dim(), 5);
        let h = complement(&g).unwrap();
        assert_eq!(h, classical_graph(3, &[(0, 2), (1, 2)]).unwrap());
        assert_eq!(vertex_graph(&g).unwrap(), classical_graph(3, &[]).unwrap());
        assert!(classical_graph(2, &[(0, 2)]).is_err());
        assert!(matches!(classical_graph(0, &[]), Err(Error::Shape(_))));
    }
}
