//! The Duan-Severini-Winter bound of an S0-graph and its antiblocker.
//!
//! For a graph `g` and a hermitian weight `w`, [`dsw`] computes
//! `min { λ : λ >= <x|Z^-1|x>, x ⪰ w }` over the Schur complement scaffolds
//! of [`schur`], and [`dsw_antiblocker`] computes
//! `max { Re <w, Ψ(x)> : <x|Z^-1|x> <= 1 }`. The two are dual:
//! `dsw_antiblocker(complement(g), w) = dsw(g, w)`.
//!
//! ```
//! use nc_graph::*;
//! use nc_graph::dsw::*;
//! use nc_graph::operations::classical_graph;
//!
//! // The Lovász number of the pentagon
//! let c5 = classical_graph(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]).unwrap();
//! let w = linalg::identity(5);
//! let sol = dsw(&c5, &w, Method::Blocks, &sdp::InteriorPoint::default()).unwrap();
//! assert!((sol.value - 5f64.sqrt()).abs() < 1e-5);
//! ```

mod psi;
mod schur;

pub use psi::{MatrixMap, psi};
pub use schur::{SchurScaffold, block_scaffold, generic_scaffold};

use crate::error::{Error, Result};
use crate::graph::S0Graph;
use crate::linalg::*;
use crate::sdp::{Problem, Solver, SolverStatus, VarPool};
use log::*;
use ndarray::Array2;

/// Which scaffold encodes the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Method {
    /// Over the whole subspace of the graph.
    Generic,
    /// Reduced by the block structure. Requires a weight in `S1` for
    /// [`dsw`], and falls back to `Generic` otherwise.
    #[default]
    Blocks,
}

/// Optimum of a DSW program.
#[derive(Debug, Clone)]
pub struct DswSolution {
    /// Optimal value.
    pub value: f64,
    /// Optimal `x` for [`dsw`], optimal `Ψ(x)` for [`dsw_antiblocker`].
    pub x: Array2<C64>,
    /// Optimal `Z` of the scaffold.
    pub z: Array2<C64>,
    /// `Optimal` or `Inaccurate`; other outcomes are errors.
    pub status: SolverStatus,
    pub iterations: usize,
}

fn check_weight(g: &S0Graph, w: &Array2<C64>) -> Result<()> {
    let n = g.n();
    if w.dim() != (n, n) {
        return Err(Error::Dimension {
            expected: (n, n),
            found: w.dim(),
        });
    }
    if hermitian_defect(w) > 1e-9 * hs_norm(w).max(1.) {
        return Err(Error::NotHermitian);
    }
    Ok(())
}

fn scaffold(g: &S0Graph, method: Method, pool: &mut VarPool) -> SchurScaffold {
    match method {
        Method::Generic => generic_scaffold(g, pool),
        Method::Blocks => block_scaffold(g, pool),
    }
}

/// The DSW value of `g` with weight `w`.
///
/// Minimizes `λ` over the scaffold subject to `x ⪰ w`.
pub fn dsw<S: Solver + ?Sized>(
    g: &S0Graph,
    w: &Array2<C64>,
    method: Method,
    solver: &S,
) -> Result<DswSolution> {
    check_weight(g, w)?;
    let method = match method {
        Method::Blocks if !g.s1().contains(w) => {
            warn!("The weight is not in S1, using the generic encoding");
            Method::Generic
        }
        m => m,
    };
    let mut pool = VarPool::new();
    let sc = scaffold(g, method, &mut pool);
    let sol = Problem::minimize(pool, sc.lambda.clone())
        .psd(sc.lmi.clone())
        .psd(sc.x.sub_constant(w))
        .solve(solver)?;
    info!("dsw({}) = {} ({:?} encoding)", g, sol.value, method);
    Ok(DswSolution {
        value: sol.value,
        x: sol.eval(&sc.x),
        z: sol.eval(&sc.z),
        status: sol.status,
        iterations: sol.iterations,
    })
}

/// The antiblocker value of `g` at `w`.
///
/// Maximizes `Re <w, q>` over the points `q = Ψ(x)` of the scaffolds with
/// `λ <= 1`. The block encoding adds `q ⪰ 0` as an explicit auxiliary
/// constraint. Since `Re <w, Ψ(x)> = Re <Ψ(w), x>` with `Ψ(w) ∈ S1`, both
/// encodings apply to any hermitian `w`.
pub fn dsw_antiblocker<S: Solver + ?Sized>(
    g: &S0Graph,
    w: &Array2<C64>,
    method: Method,
    solver: &S,
) -> Result<DswSolution> {
    check_weight(g, w)?;
    let mut pool = VarPool::new();
    let sc = scaffold(g, method, &mut pool);
    let q = psi(g.shape(), &sc.x);
    let mut problem = Problem::maximize(pool, q.trace_inner(w))
        .psd(sc.lmi.clone())
        .nonnegative(sc.lambda.subtracted_from(1.));
    if method == Method::Blocks {
        problem = problem.psd(q.clone())
    }
    let sol = problem.solve(solver)?;
    info!(
        "dsw_antiblocker({}) = {} ({:?} encoding)",
        g, sol.value, method
    );
    Ok(DswSolution {
        value: sol.value,
        x: sol.eval(&q),
        z: sol.eval(&sc.z),
        status: sol.status,
        iterations: sol.iterations,
    })
}
