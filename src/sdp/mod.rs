//! Semidefinite programming: modelling layer and solvers.
//!
//! Problems are written with affine expressions in real variables
//! ([`expr`]), collected by the immutable builder [`Problem`], lowered to the
//! real block form used by CSDP ([`SdpProblem`]) and handed to a [`Solver`].
//!
//! Two solvers are provided: [`InteriorPoint`], an in-process primal-dual
//! interior point method, and [`Csdp`], which runs the `csdp` executable on
//! SDPA files.

pub mod expr;
mod ipm;
mod problem;
pub mod sdpa;

pub use expr::{AffineMatrix, AffineScalar, Var, VarPool};
pub use ipm::InteriorPoint;
pub use problem::{Problem, SdpProblem, Sense, Solution};
pub use sdpa::Csdp;

use crate::error::Result;
use std::time::Duration;

/// Outcome of a solver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolverStatus {
    /// Converged to the requested tolerance.
    Optimal,
    /// The constraints cannot be satisfied.
    Infeasible,
    /// The objective can be made arbitrarily good.
    Unbounded,
    /// Stopped close to, but not within, the requested tolerance.
    Inaccurate,
    MaxIterations,
    TimedOut,
    NumericalFailure,
}

impl SolverStatus {
    /// Statuses whose point can be used as a solution.
    pub fn is_usable(self) -> bool {
        matches!(self, SolverStatus::Optimal | SolverStatus::Inaccurate)
    }
}

/// Parameters shared by the solvers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Target for the relative duality gap and the relative infeasibilities.
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Fraction of the distance to the boundary of the cone taken at each step.
    pub step_fraction: f64,
    /// Wall clock limit for a solve.
    pub timeout: Option<Duration>,
    /// CSDP iterations are logged at `info` level once a solve takes longer
    /// than this (and at `debug` level before).
    pub stream_after: Duration,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 100,
            step_fraction: 0.95,
            timeout: None,
            stream_after: Duration::from_secs(2),
        }
    }
}

impl SolverSettings {
    pub fn tolerance(self, tolerance: f64) -> Self {
        Self { tolerance, ..self }
    }
    pub fn max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }
    pub fn step_fraction(self, step_fraction: f64) -> Self {
        Self {
            step_fraction,
            ..self
        }
    }
    pub fn timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }
    pub fn stream_after(self, stream_after: Duration) -> Self {
        Self {
            stream_after,
            ..self
        }
    }
}

/// What a solver returns for a problem in the form of [`SdpProblem`].
#[derive(Debug, Clone)]
pub struct RawSolution {
    pub status: SolverStatus,
    /// `<C, X>`
    pub primal_objective: f64,
    /// `b^T y`
    pub dual_objective: f64,
    /// Values of the variables.
    pub y: Vec<f64>,
    pub iterations: usize,
}

/// A semidefinite programming solver.
///
/// Structural failures (I/O, unreadable output) are errors; everything the
/// solver can say about the problem itself is reported in the status.
pub trait Solver {
    fn solve(&self, problem: &SdpProblem) -> Result<RawSolution>;
}
