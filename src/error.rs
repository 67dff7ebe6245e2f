//! Error type shared by the whole crate.

use crate::sdp::SolverStatus;
use std::io;

/// The invariant of an S0-graph that failed to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Invariant {
    /// The subspace is not equal to its adjoint.
    SelfAdjoint,
    /// The vertex algebra S0 is not contained in the subspace.
    ContainsS0,
    /// The subspace is not stable under `S0 * S * S0`.
    BimoduleClosure,
}

impl std::fmt::Display for Invariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Invariant::SelfAdjoint => "S must be self-adjoint",
            Invariant::ContainsS0 => "S must contain S0",
            Invariant::BimoduleClosure => "S must equal S0*S*S0",
        };
        write!(f, "{}", name)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Malformed algebra shape: {0}")]
    Shape(String),
    #[error("Cannot build S0-graph: {0}")]
    Construction(Invariant),
    #[error("Algebra construction defect: {0}")]
    AlgebraicAssertion(String),
    #[error("Expected a {expected:?} matrix, found {found:?}")]
    Dimension {
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("Expected a hermitian matrix")]
    NotHermitian,
    #[error("Solver finished with status {status:?} (objective {objective:?})")]
    Solver {
        status: SolverStatus,
        objective: Option<f64>,
    },
    #[error("Error while parsing solver output: {0}")]
    Parse(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<std::num::ParseIntError> for Error {
    fn from(e: std::num::ParseIntError) -> Self {
        Error::Parse(format!("{}", e))
    }
}

impl From<std::num::ParseFloatError> for Error {
    fn from(e: std::num::ParseFloatError) -> Self {
        Error::Parse(format!("{}", e))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
