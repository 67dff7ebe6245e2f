use super::expr::{AffineMatrix, AffineScalar, VarPool};
use super::{RawSolution, Solver, SolverStatus};
use crate::error::{Error, Result};
use crate::linalg::C64;
use log::*;
use ndarray::Array2;
use sprs::{CsMat, TriMat};

/// Direction of the optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// An optimization problem with a real affine objective and hermitian
/// linear matrix inequalities `M(y) ⪰ 0`.
///
/// The problem is assembled by value and consumed by [`Problem::solve`].
///
/// ```
/// # use nc_graph::sdp::*;
/// let mut pool = VarPool::new();
/// let y = pool.scalar();
/// // minimize y subject to y >= 1
/// let pb = Problem::minimize(pool, y.clone()).nonnegative(y.subtracted_from(1.).scale(-1.));
/// let sol = pb.solve(&InteriorPoint::default()).unwrap();
/// assert!((sol.value - 1.).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct Problem {
    sense: Sense,
    objective: AffineScalar,
    constraints: Vec<AffineMatrix>,
    num_vars: usize,
}

impl Problem {
    fn new(sense: Sense, vars: VarPool, objective: AffineScalar) -> Self {
        Self {
            sense,
            objective,
            constraints: Vec::new(),
            num_vars: vars.len(),
        }
    }
    /// Minimize `objective` over the variables of `vars`.
    pub fn minimize(vars: VarPool, objective: AffineScalar) -> Self {
        Self::new(Sense::Minimize, vars, objective)
    }
    /// Maximize `objective` over the variables of `vars`.
    pub fn maximize(vars: VarPool, objective: AffineScalar) -> Self {
        Self::new(Sense::Maximize, vars, objective)
    }
    /// Add the constraint `m ⪰ 0`. The expression must be hermitian for every
    /// value of the variables.
    pub fn psd(self, m: AffineMatrix) -> Self {
        let (rows, cols) = m.dim();
        assert_eq!(rows, cols, "Non-square matrix inequality");
        let mut constraints = self.constraints;
        constraints.push(m);
        Self {
            constraints,
            ..self
        }
    }
    /// Add the constraint `s >= 0`.
    pub fn nonnegative(self, s: AffineScalar) -> Self {
        self.psd(s.to_matrix())
    }
    pub fn sense(&self) -> Sense {
        self.sense
    }
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }
    /// Lower the problem to the real block form of [`SdpProblem`].
    ///
    /// A hermitian constraint `M ⪰ 0` becomes `[[Re M, -Im M], [Im M, Re M]] ⪰ 0`,
    /// or `Re M ⪰ 0` when `M` is real.
    pub fn lower(&self) -> SdpProblem {
        let sign = match self.sense {
            Sense::Minimize => 1.,
            Sense::Maximize => -1.,
        };
        let mut b = vec![0.; self.num_vars];
        for (v, x) in self.objective.coefficients() {
            b[v.0] += sign * x
        }
        let mut block_sizes = Vec::with_capacity(self.constraints.len());
        let mut c = Vec::with_capacity(self.constraints.len());
        let mut a: Vec<Vec<CsMat<f64>>> =
            vec![Vec::with_capacity(self.constraints.len()); self.num_vars];
        for m in &self.constraints {
            let coefficients = m.coefficients();
            let complex = has_imaginary_part(&m.constant)
                || coefficients.values().any(has_imaginary_part);
            let size = m.dim().0 * if complex { 2 } else { 1 };
            block_sizes.push(size);
            c.push(real_form(&m.constant, complex, -1.));
            for (k, a_k) in a.iter_mut().enumerate() {
                let mat = match coefficients.get(&super::Var(k)) {
                    Some(coeff) => real_form(coeff, complex, 1.),
                    None => CsMat::zero((size, size)),
                };
                a_k.push(mat)
            }
        }
        SdpProblem {
            block_sizes,
            c,
            a,
            b,
        }
    }
    /// Solve the problem.
    ///
    /// Fails with [`Error::Solver`] unless the solver reports an optimal or an
    /// inaccurate solution (the latter is logged as a warning).
    pub fn solve<S: Solver + ?Sized>(self, solver: &S) -> Result<Solution> {
        let sdp = self.lower();
        debug!(
            "Solving a problem with {} variables and blocks of sizes {:?}",
            self.num_vars, sdp.block_sizes
        );
        let raw: RawSolution = solver.solve(&sdp)?;
        let value = match raw.y.len() {
            0 if self.num_vars > 0 => f64::NAN,
            _ => self.objective.eval(&raw.y),
        };
        match raw.status {
            SolverStatus::Optimal => {
                info!("Optimal value {} after {} iterations", value, raw.iterations)
            }
            SolverStatus::Inaccurate => warn!(
                "Solver stopped before reaching the requested accuracy, value {}",
                value
            ),
            status => {
                warn!("Solver failed with status {:?}", status);
                return Err(Error::Solver {
                    status,
                    objective: if value.is_finite() { Some(value) } else { None },
                });
            }
        }
        Ok(Solution {
            status: raw.status,
            value,
            y: raw.y,
            iterations: raw.iterations,
        })
    }
}

fn has_imaginary_part(m: &Array2<C64>) -> bool {
    m.iter().any(|x| x.im != 0.)
}

/// Symmetric real form of `scale * m`.
fn real_form(m: &Array2<C64>, complex: bool, scale: f64) -> CsMat<f64> {
    let n = m.nrows();
    let size = if complex { 2 * n } else { n };
    let mut tri = TriMat::new((size, size));
    let mut push = |i: usize, j: usize, x: f64| {
        if x != 0. {
            // Symmetrized, so that rounding errors cannot break symmetry
            tri.add_triplet(i, j, scale * x / 2.);
            tri.add_triplet(j, i, scale * x / 2.);
        }
    };
    for ((i, j), x) in m.indexed_iter() {
        push(i, j, x.re);
        if complex {
            push(i + n, j + n, x.re);
            push(i + n, j, x.im);
            push(i, j + n, -x.im);
        }
    }
    tri.to_csr()
}

/// A semidefinite program in the block form used by CSDP:
/// minimize `b^T y` subject to `Σ_k y_k A_k - C ⪰ 0`, the dual of
/// maximize `<C, X>` subject to `<A_k, X> = b_k` and `X ⪰ 0`.
///
/// All matrices are block diagonal; `c[block]` and `a[k][block]` are the
/// blocks of `C` and `A_k`.
#[derive(Debug, Clone, PartialEq)]
pub struct SdpProblem {
    pub block_sizes: Vec<usize>,
    pub c: Vec<CsMat<f64>>,
    pub a: Vec<Vec<CsMat<f64>>>,
    pub b: Vec<f64>,
}

impl SdpProblem {
    pub fn num_constraints(&self) -> usize {
        self.b.len()
    }
    /// Total size of the block diagonal matrices.
    pub fn total_size(&self) -> usize {
        self.block_sizes.iter().sum()
    }
}

/// The solution of a [`Problem`].
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolverStatus,
    /// Value of the objective.
    pub value: f64,
    /// Value of the variables.
    pub y: Vec<f64>,
    pub iterations: usize,
}

impl Solution {
    pub fn eval(&self, m: &AffineMatrix) -> Array2<C64> {
        m.eval(&self.y)
    }
    pub fn eval_scalar(&self, s: &AffineScalar) -> f64 {
        s.eval(&self.y)
    }
}
