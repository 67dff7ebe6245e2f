//! In-process primal-dual interior point method.
//!
//! Infeasible start, HKM search direction and Mehrotra predictor-corrector
//! steps, on dense matrices. The block structure of the problem is flattened
//! into one block diagonal matrix.

use super::problem::SdpProblem;
use super::{RawSolution, Solver, SolverSettings, SolverStatus};
use crate::error::Result;
use log::*;
use nalgebra::{Cholesky, DMatrix, DVector, Dyn, SymmetricEigen};
use std::time::Instant;

/// Ratio under which an iterate is taken as a certificate of infeasibility.
const CERTIFICATE_TOLERANCE: f64 = 1e-8;
/// Norm above which the iterates are considered divergent.
const DIVERGENCE: f64 = 1e12;

/// Primal-dual interior point solver.
#[derive(Debug, Clone, Default)]
pub struct InteriorPoint {
    settings: SolverSettings,
}

impl InteriorPoint {
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }
    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }
}

/// The problem with all blocks flattened into `n x n` matrices.
struct Dense {
    n: usize,
    /// Entries `(i, j, v)` of each `A_k`.
    a: Vec<Vec<(usize, usize, f64)>>,
    c: DMatrix<f64>,
    b: DVector<f64>,
}

impl Dense {
    fn new(pb: &SdpProblem) -> Self {
        let n = pb.total_size();
        let mut offsets = Vec::with_capacity(pb.block_sizes.len());
        let mut offset = 0;
        for size in &pb.block_sizes {
            offsets.push(offset);
            offset += size
        }
        let mut c = DMatrix::zeros(n, n);
        for (block, mat) in pb.c.iter().enumerate() {
            for (&v, (i, j)) in mat.iter() {
                c[(offsets[block] + i, offsets[block] + j)] += v
            }
        }
        let a = pb
            .a
            .iter()
            .map(|a_k| {
                let mut entries = Vec::new();
                for (block, mat) in a_k.iter().enumerate() {
                    for (&v, (i, j)) in mat.iter() {
                        entries.push((offsets[block] + i, offsets[block] + j, v))
                    }
                }
                entries
            })
            .collect();
        Self {
            n,
            a,
            c,
            b: DVector::from_column_slice(&pb.b),
        }
    }
    /// `(<A_k, x>)_k`
    fn apply(&self, x: &DMatrix<f64>) -> DVector<f64> {
        DVector::from_iterator(
            self.a.len(),
            self.a
                .iter()
                .map(|a_k| a_k.iter().map(|&(i, j, v)| v * x[(i, j)]).sum::<f64>()),
        )
    }
    /// `Σ_k y_k A_k`
    fn adjoint(&self, y: &DVector<f64>) -> DMatrix<f64> {
        let mut res = DMatrix::zeros(self.n, self.n);
        for (a_k, &y_k) in self.a.iter().zip(y.iter()) {
            for &(i, j, v) in a_k {
                res[(i, j)] += y_k * v
            }
        }
        res
    }
    /// Schur complement `M_ij = <A_i, X A_j S^-1>`.
    fn schur(&self, x: &DMatrix<f64>, s_inv: &DMatrix<f64>) -> DMatrix<f64> {
        let m = self.a.len();
        let mut res = DMatrix::zeros(m, m);
        let mut g = DMatrix::zeros(self.n, self.n);
        for (j, a_j) in self.a.iter().enumerate() {
            g.fill(0.);
            for &(r, c, v) in a_j {
                g.ger(v, &x.column(r), &s_inv.column(c), 1.)
            }
            for (i, a_i) in self.a.iter().enumerate() {
                res[(i, j)] = a_i.iter().map(|&(p, q, u)| u * g[(p, q)]).sum::<f64>()
            }
        }
        (&res + res.transpose()) * 0.5
    }
    fn max_norm(&self) -> f64 {
        self.a
            .iter()
            .map(|a_k| a_k.iter().map(|&(_, _, v)| v * v).sum::<f64>().sqrt())
            .fold(self.c.norm(), f64::max)
    }
}

fn symmetrize(m: DMatrix<f64>) -> DMatrix<f64> {
    (&m + m.transpose()) * 0.5
}

/// Largest `α` such that `L L^T + α d ⪰ 0` (infinite if there is none).
fn max_step(chol: &Cholesky<f64, Dyn>, d: &DMatrix<f64>) -> Option<f64> {
    let l = chol.l();
    let y = l.solve_lower_triangular(d)?;
    let w = l.solve_lower_triangular(&y.transpose())?;
    let min = SymmetricEigen::new(symmetrize(w))
        .eigenvalues
        .iter()
        .cloned()
        .fold(f64::INFINITY, f64::min);
    if !min.is_finite() {
        None
    } else if min >= 0. {
        Some(f64::INFINITY)
    } else {
        Some(-1. / min)
    }
}

/// Cholesky factorization, with an increasing diagonal shift if needed.
fn regularized_cholesky(m: DMatrix<f64>) -> Option<Cholesky<f64, Dyn>> {
    let scale = m.diagonal().amax().max(1.);
    let n = m.nrows();
    let mut shift = 0.;
    for _ in 0..6 {
        let shifted = &m + DMatrix::identity(n, n) * shift;
        if let Some(chol) = Cholesky::new(shifted) {
            if shift > 0. {
                trace!("Schur complement regularized by {:e}", shift)
            }
            return Some(chol);
        }
        shift = if shift == 0. { 1e-14 * scale } else { shift * 100. };
    }
    None
}

struct Measures {
    primal_objective: f64,
    dual_objective: f64,
    gap: f64,
    primal_infeasibility: f64,
    dual_infeasibility: f64,
}

impl Solver for InteriorPoint {
    fn solve(&self, pb: &SdpProblem) -> Result<RawSolution> {
        let settings = &self.settings;
        let start = Instant::now();
        let data = Dense::new(pb);
        let n = data.n;
        let m = data.a.len();
        let sqrt_n = (n as f64).sqrt();
        let xi = data
            .a
            .iter()
            .zip(data.b.iter())
            .map(|(a_k, b_k)| {
                let norm = a_k.iter().map(|&(_, _, v)| v * v).sum::<f64>().sqrt();
                n as f64 * (1. + b_k.abs()) / (1. + norm)
            })
            .fold(sqrt_n.max(10.), f64::max);
        let eta = (1. + data.max_norm()).max(sqrt_n).max(10.);
        let mut x = DMatrix::identity(n, n) * xi;
        let mut s = DMatrix::identity(n, n) * eta;
        let mut y = DVector::zeros(m);
        let norm_b = data.b.norm();
        let norm_c = data.c.norm();

        let measures = |x: &DMatrix<f64>, y: &DVector<f64>, s: &DMatrix<f64>| {
            let rd = data.adjoint(y) - s - &data.c;
            let rp = &data.b - data.apply(x);
            let primal_objective = data.c.dot(x);
            let dual_objective = data.b.dot(y);
            let meas = Measures {
                primal_objective,
                dual_objective,
                gap: (primal_objective - dual_objective).abs()
                    / (1. + primal_objective.abs() + dual_objective.abs()),
                primal_infeasibility: rp.norm() / (1. + norm_b),
                dual_infeasibility: rd.norm() / (1. + norm_c),
            };
            (meas, rd)
        };

        let loose = settings.tolerance.sqrt();
        let mut status = None;
        let mut iterations = 0;
        let mut last = measures(&x, &y, &s).0;
        loop {
            if settings.timeout.is_some_and(|t| start.elapsed() >= t) {
                status = Some(SolverStatus::TimedOut);
                break;
            }
            let (meas, rd) = measures(&x, &y, &s);
            debug!(
                "Iter: {} Pobj: {:.7e} Dobj: {:.7e} Gap: {:.2e} Pinf: {:.2e} Dinf: {:.2e}",
                iterations,
                meas.primal_objective,
                meas.dual_objective,
                meas.gap,
                meas.primal_infeasibility,
                meas.dual_infeasibility
            );
            if !(meas.primal_objective.is_finite() && meas.dual_objective.is_finite()) {
                status = Some(SolverStatus::NumericalFailure);
                break;
            }
            last = meas;
            let meas = &last;
            if meas.gap < settings.tolerance
                && meas.primal_infeasibility < settings.tolerance
                && meas.dual_infeasibility < settings.tolerance
            {
                status = Some(SolverStatus::Optimal);
                break;
            }
            // A direction improving the dual objective without bound
            if meas.dual_objective < 0.
                && meas.primal_infeasibility > settings.tolerance
                && (&rd + &data.c).norm() / -meas.dual_objective < CERTIFICATE_TOLERANCE
            {
                status = Some(SolverStatus::Unbounded);
                break;
            }
            // A direction improving the primal objective without bound
            if meas.primal_objective > 0.
                && meas.dual_infeasibility > settings.tolerance
                && data.apply(&x).norm() / meas.primal_objective < CERTIFICATE_TOLERANCE
            {
                status = Some(SolverStatus::Infeasible);
                break;
            }
            if x.norm() > DIVERGENCE || y.norm() > DIVERGENCE {
                break;
            }
            if iterations >= settings.max_iterations {
                break;
            }

            // Factorizations
            let Some(s_chol) = Cholesky::new(s.clone()) else {
                break;
            };
            let Some(x_chol) = Cholesky::new(x.clone()) else {
                break;
            };
            let s_inv = s_chol.inverse();
            let Some(schur) = regularized_cholesky(data.schur(&x, &s_inv)) else {
                break;
            };
            let mu = x.dot(&s) / n as f64;
            let x_rd_s_inv = &x * &rd * &s_inv;

            let direction = |sigma: f64, corrector: Option<&DMatrix<f64>>| {
                let mut target = &s_inv * (sigma * mu) - &x_rd_s_inv;
                if let Some(corr) = corrector {
                    target -= corr
                }
                let rhs = data.apply(&target) - &data.b;
                let dy = schur.solve(&rhs);
                let ds = data.adjoint(&dy) + &rd;
                let dx = symmetrize(target - &x - &x * &ds * &s_inv + &x_rd_s_inv);
                (dx, dy, ds)
            };

            // Predictor
            let (dx_aff, _, ds_aff) = direction(0., None);
            let (Some(ap), Some(ad)) = (max_step(&x_chol, &dx_aff), max_step(&s_chol, &ds_aff))
            else {
                break;
            };
            let (ap, ad) = (ap.min(1.), ad.min(1.));
            let mu_aff = (&x + &dx_aff * ap).dot(&(&s + &ds_aff * ad)) / n as f64;
            let sigma = (mu_aff / mu).powi(3).clamp(0., 1.);
            // Corrector
            let corr = &dx_aff * &ds_aff * &s_inv;
            let (dx, dy, ds) = direction(sigma, Some(&corr));
            let (Some(ap), Some(ad)) = (max_step(&x_chol, &dx), max_step(&s_chol, &ds)) else {
                break;
            };
            let ap = (settings.step_fraction * ap).min(1.);
            let ad = (settings.step_fraction * ad).min(1.);
            x += &dx * ap;
            x = symmetrize(x);
            y += &dy * ad;
            s += &ds * ad;
            s = symmetrize(s);
            iterations += 1;
        }

        let out_of_iterations = iterations >= settings.max_iterations;
        let status =
            status.unwrap_or_else(|| classify(&last, settings.tolerance, loose, out_of_iterations));
        info!(
            "Interior point finished after {} iterations in {:.2?}: {:?}",
            iterations,
            start.elapsed(),
            status
        );
        Ok(RawSolution {
            status,
            primal_objective: last.primal_objective,
            dual_objective: last.dual_objective,
            y: y.iter().cloned().collect(),
            iterations,
        })
    }
}

/// Status of a run that stopped without reaching a conclusion.
fn classify(
    meas: &Measures,
    tolerance: f64,
    loose: f64,
    out_of_iterations: bool,
) -> SolverStatus {
    let accurate = tolerance * 1e3;
    if meas.gap < accurate
        && meas.primal_infeasibility < accurate
        && meas.dual_infeasibility < accurate
    {
        SolverStatus::Inaccurate
    } else if meas.dual_infeasibility > loose && meas.primal_infeasibility < loose {
        SolverStatus::Infeasible
    } else if meas.primal_infeasibility > loose && meas.dual_infeasibility < loose {
        SolverStatus::Unbounded
    } else if out_of_iterations {
        SolverStatus::MaxIterations
    } else {
        SolverStatus::NumericalFailure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::linalg::*;
    use crate::sdp::{Problem, VarPool};
    use ndarray::array;
    use std::time::Duration;

    #[test]
    fn small_sdp() {
        // minimize t subject to [[t, 1], [1, t]] ⪰ 0, whose optimum is 1
        let mut pool = VarPool::new();
        let t = pool.scalar();
        let one = C64::from_real(1.);
        let zero = C64::from_real(0.);
        let m = t
            .to_matrix()
            .kron_left(&identity(2))
            .add(&crate::sdp::AffineMatrix::constant(array![[zero, one], [one, zero]]));
        let sol = Problem::minimize(pool, t.clone())
            .psd(m)
            .solve(&InteriorPoint::default())
            .unwrap();
        assert_eq!(sol.status, SolverStatus::Optimal);
        assert!((sol.value - 1.).abs() < 1e-6);
        assert!((sol.eval_scalar(&t) - 1.).abs() < 1e-6);
    }

    #[test]
    fn complex_sdp() {
        // maximize Re <w, h> subject to 0 ⪯ h ⪯ I, h hermitian; the optimum is
        // the sum of the positive eigenvalues of w
        let mut pool = VarPool::new();
        let h = pool.hermitian(2);
        let i = C64::i();
        let w = array![[C64::from_real(1.), i * 2.], [-i * 2., C64::from_real(1.)]];
        let objective = h.trace_inner(&w);
        let sol = Problem::maximize(pool, objective)
            .psd(h.clone())
            .psd(h.scale(C64::from_real(-1.)).add(&crate::sdp::AffineMatrix::constant(identity(2))))
            .solve(&InteriorPoint::default())
            .unwrap();
        // eigenvalues of w are 3 and -1
        assert!((sol.value - 3.).abs() < 1e-6);
    }

    #[test]
    fn unbounded() {
        let mut pool = VarPool::new();
        let y = pool.scalar();
        let res = Problem::minimize(pool, y.scale(-1.))
            .nonnegative(y)
            .solve(&InteriorPoint::default());
        assert!(matches!(
            res,
            Err(Error::Solver {
                status: SolverStatus::Unbounded,
                ..
            })
        ));
    }

    #[test]
    fn infeasible() {
        let mut pool = VarPool::new();
        let y = pool.scalar();
        let res = Problem::minimize(pool, y.clone())
            .nonnegative(y.clone())
            .nonnegative(y.subtracted_from(-1.))
            .solve(&InteriorPoint::default());
        assert!(matches!(
            res,
            Err(Error::Solver {
                status: SolverStatus::Infeasible,
                ..
            })
        ));
    }

    #[test]
    fn timeout() {
        let mut pool = VarPool::new();
        let y = pool.scalar();
        let solver = InteriorPoint::new(SolverSettings::default().timeout(Duration::ZERO));
        let res = Problem::minimize(pool, y.clone()).nonnegative(y).solve(&solver);
        assert!(matches!(
            res,
            Err(Error::Solver {
                status: SolverStatus::TimedOut,
                ..
            })
        ));
    }
}
