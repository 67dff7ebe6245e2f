//! The averaging map `Ψ` onto the commutant `S1`.

use crate::algebra::AlgebraShape;
use crate::linalg::*;
use crate::sdp::AffineMatrix;
use ndarray::{Array2, s};

/// Matrices, or matrix expressions, that linear maps can be applied to.
pub trait MatrixMap: Sized {
    fn apply_linear<F>(&self, f: F) -> Self
    where
        F: Fn(&Array2<C64>) -> Array2<C64>;
}

impl MatrixMap for Array2<C64> {
    fn apply_linear<F>(&self, f: F) -> Self
    where
        F: Fn(&Array2<C64>) -> Array2<C64>,
    {
        f(self)
    }
}

impl MatrixMap for AffineMatrix {
    fn apply_linear<F>(&self, f: F) -> Self
    where
        F: Fn(&Array2<C64>) -> Array2<C64>,
    {
        self.map_linear(f)
    }
}

/// `Ψ(w) = ⊕_i I_{dA_i} ⊗ Tr_A(w_ii) / (dA_i^2 dY_i)`, where `w_ii` is the
/// `i`-th diagonal block of `w`.
///
/// Block `i` of `Ψ` is the trace preserving conditional expectation onto
/// `I_{dA_i} ⊗ M_{dY_i}` divided by the block dimension `dA_i dY_i`, which is
/// the normalization of the ket in the scaffolds. `Ψ` is linear, positive,
/// self-adjoint for the Hilbert-Schmidt product, and its image is `S1`.
pub fn psi<M: MatrixMap>(shape: &AlgebraShape, w: &M) -> M {
    w.apply_linear(|m| psi_dense(shape, m))
}

fn psi_dense(shape: &AlgebraShape, w: &Array2<C64>) -> Array2<C64> {
    let n = shape.n();
    assert_eq!(w.dim(), (n, n));
    let mut res = Array2::zeros((n, n));
    for (i, &(d_a, d_y)) in shape.blocks().iter().enumerate() {
        let r = shape.range(i);
        let block = w.slice(s![r.clone(), r.clone()]).to_owned();
        let scale = (d_a * d_a * d_y) as f64;
        let reduced = partial_trace_first(&block, d_a, d_y) / C64::from_real(scale);
        res.slice_mut(s![r.clone(), r])
            .assign(&kron(&identity(d_a), &reduced));
    }
    res
}
