//! Schur complement scaffolds for the DSW programs.
//!
//! A scaffold is a set of fresh variables together with the matrix
//! inequality `[[λ, <x|], [|x>, Z]] ⪰ 0`, which for `Z ≻ 0` says
//! `λ >= <x| Z^-1 |x>`. The caller adds an objective and its own constraints.

use crate::blocks::decompose;
use crate::graph::S0Graph;
use crate::linalg::*;
use crate::sdp::{AffineMatrix, AffineScalar, VarPool};
use log::debug;
use ndarray::Array2;

/// Unevaluated expressions of a Schur complement scaffold.
#[derive(Debug, Clone)]
pub struct SchurScaffold {
    /// The bound `λ`.
    pub lambda: AffineScalar,
    /// The `n x n` matrix `x`, a partial trace of `Z`.
    pub x: AffineMatrix,
    /// The hermitian matrix `Z`.
    pub z: AffineMatrix,
    /// `[[λ, <x|], [|x>, Z]]`, to be constrained positive semidefinite.
    pub lmi: AffineMatrix,
}

/// `Σ_j d_j |j> ⊗ m|j>` as a column vector: the entry `j * n + p` is
/// `d_j * m[p, j]`.
fn ket(m: &Array2<C64>, d: &[f64]) -> Array2<C64> {
    let n = m.nrows();
    let mut res = Array2::zeros((n * n, 1));
    for (j, &d_j) in d.iter().enumerate() {
        for p in 0..n {
            res[(j * n + p, 0)] = m[(p, j)] * d_j
        }
    }
    res
}

fn lmi(lambda: &AffineScalar, ket: &AffineMatrix, z: &AffineMatrix) -> AffineMatrix {
    let size = z.dim().0;
    let bra = ket.adjoint();
    let corner = lambda.to_matrix();
    AffineMatrix::block_matrix(
        &[1, size],
        &[1, size],
        &[vec![Some(&corner), Some(&bra)], vec![Some(ket), Some(z)]],
    )
}

/// The scaffold over the whole graph: `Z = Σ_k s_k ⊗ T_k` where `(s_k)` is a
/// hermitian basis of `S` and the `T_k` are free hermitian `n x n` matrices,
/// and `x = Tr_A Z`. The ket has weights `d_j = 1/√dY` of the block of `j`.
pub fn generic_scaffold(g: &S0Graph, pool: &mut VarPool) -> SchurScaffold {
    let n = g.n();
    let lambda = pool.scalar();
    let basis = g.subspace().hermitian_basis();
    let z = AffineMatrix::sum(
        n * n,
        n * n,
        basis.iter().map(|s_k| pool.hermitian(n).kron_left(s_k)),
    );
    let x = z.map_linear(|m| partial_trace_first(m, n, n));
    let d: Vec<f64> = (0..n)
        .map(|j| 1. / (g.shape().d_y_at(j) as f64).sqrt())
        .collect();
    let ket = x.map_linear(|m| ket(m, &d));
    debug!(
        "Generic scaffold: {} generators, {} variables",
        basis.len(),
        pool.len()
    );
    SchurScaffold {
        lmi: lmi(&lambda, &ket, &z),
        lambda,
        x,
        z,
    }
}

/// The scaffold reduced by the block structure of the graph.
///
/// `Z` has blocks `Z_ij` of size `dY_i^2 x dY_j^2` ranging over
/// `B_ij ⊗ L(C^dY_j, C^dY_i)`, where `B` is the block decomposition of the
/// graph. The blocks below the diagonal are free complex combinations of a
/// basis of that space, the blocks above are their adjoints, and the diagonal
/// blocks are `Σ h ⊗ T_h` over a hermitian basis of `B_ii`.
///
/// With `M_i = Tr_A Z_ii`, the ket is `⊕_i vec(M_i) / √(dA_i dY_i)` and
/// `x = ⊕_i I_{dA_i} ⊗ M_i / dA_i`, which lies in `S1`.
pub fn block_scaffold(g: &S0Graph, pool: &mut VarPool) -> SchurScaffold {
    let shape = g.shape();
    let b = decompose(g);
    let k = shape.len();
    let d_y: Vec<usize> = shape.blocks().iter().map(|&(_, d_y)| d_y).collect();
    let sizes: Vec<usize> = d_y.iter().map(|d| d * d).collect();
    let lambda = pool.scalar();

    let mut z_blocks: Vec<Vec<Option<AffineMatrix>>> = vec![vec![None; k]; k];
    for i in 0..k {
        let diagonal = b[(i, i)].hermitian_basis();
        z_blocks[i][i] = Some(AffineMatrix::sum(
            sizes[i],
            sizes[i],
            diagonal.iter().map(|h| pool.hermitian(d_y[i]).kron_left(h)),
        ));
        for j in 0..i {
            if b[(i, j)].is_empty() {
                continue;
            }
            let mut family = Vec::with_capacity(b[(i, j)].dim() * d_y[i] * d_y[j]);
            for m in b[(i, j)].basis() {
                for p in 0..d_y[i] {
                    for q in 0..d_y[j] {
                        family.push(kron(m, &matrix_unit(d_y[i], d_y[j], p, q)))
                    }
                }
            }
            let z_ij = pool.combination(&family, true);
            z_blocks[j][i] = Some(z_ij.adjoint());
            z_blocks[i][j] = Some(z_ij);
        }
    }
    let z_refs: Vec<Vec<Option<&AffineMatrix>>> = z_blocks
        .iter()
        .map(|line| line.iter().map(Option::as_ref).collect())
        .collect();
    let z = AffineMatrix::block_matrix(&sizes, &sizes, &z_refs);

    let mut kets = Vec::with_capacity(k);
    let mut x_blocks = Vec::with_capacity(k);
    for (i, &(d_a, d_yi)) in shape.blocks().iter().enumerate() {
        let z_ii = z_blocks[i][i]
            .as_ref()
            .map_or_else(|| AffineMatrix::zeros(sizes[i], sizes[i]), Clone::clone);
        let m_i = z_ii.map_linear(|m| partial_trace_first(m, d_yi, d_yi));
        let scale = 1. / ((d_a * d_yi) as f64).sqrt();
        kets.push(m_i.map_linear(|m| ket(m, &vec![scale; d_yi])));
        let id = identity(d_a);
        x_blocks.push(
            m_i.scale(C64::from_real(1. / d_a as f64))
                .kron_left(&id),
        );
    }
    let ket_refs: Vec<Vec<Option<&AffineMatrix>>> = kets.iter().map(|v| vec![Some(v)]).collect();
    let ket = AffineMatrix::block_matrix(&sizes, &[1], &ket_refs);
    let dims = shape.block_dims();
    let x_refs: Vec<Vec<Option<&AffineMatrix>>> = (0..k)
        .map(|i| (0..k).map(|j| if i == j { Some(&x_blocks[i]) } else { None }).collect())
        .collect();
    let x = AffineMatrix::block_matrix(&dims, &dims, &x_refs);
    debug!(
        "Block scaffold: Z of size {}, {} variables",
        z.dim().0,
        pool.len()
    );
    SchurScaffold {
        lmi: lmi(&lambda, &ket, &z),
        lambda,
        x,
        z,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::AlgebraShape;
    use crate::operations::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn ket_layout() {
        let m: Array2<C64> =
            Array2::from_shape_fn((2, 2), |(i, j)| C64::from_real((2 * i + j) as f64));
        let v = ket(&m, &[1., 2.]);
        let expected = [0., 2., 2., 6.];
        for (x, e) in v.iter().zip(expected) {
            assert_eq!(*x, C64::from_real(e))
        }
    }

    #[test]
    fn scaffolds_are_hermitian_and_in_s1() {
        let shape = AlgebraShape::new(&[[2, 1], [1, 2]]).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let g = random_s0graph(&shape, &mut rng).unwrap();
        for builder in [generic_scaffold, block_scaffold] {
            let mut pool = VarPool::new();
            let sc = builder(&g, &mut pool);
            let y: Vec<f64> = (0..pool.len()).map(|i| ((i * 7919) % 13) as f64 - 6.).collect();
            assert!(hermitian_defect(&sc.lmi.eval(&y)) < 1e-9);
            assert!(hermitian_defect(&sc.z.eval(&y)) < 1e-9);
            assert_eq!(sc.x.dim(), (4, 4));
        }
        let mut pool = VarPool::new();
        let sc = block_scaffold(&g, &mut pool);
        let y: Vec<f64> = (0..pool.len()).map(|i| (i % 5) as f64).collect();
        assert!(g.s1().contains(&sc.x.eval(&y)));
    }

    #[test]
    fn block_scaffold_is_smaller() {
        let shape = AlgebraShape::new(&[[3, 1], [2, 2]]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let g = vertex_graph(&random_s0graph(&shape, &mut rng).unwrap()).unwrap();
        let mut generic = VarPool::new();
        let _ = generic_scaffold(&g, &mut generic);
        let mut blocks = VarPool::new();
        let _ = block_scaffold(&g, &mut blocks);
        // 1 + dim S * n^2 against 1 + Σ dY_i^2
        assert_eq!(generic.len(), 1 + (9 + 4) * 49);
        assert_eq!(blocks.len(), 1 + 1 + 4);
    }
}
