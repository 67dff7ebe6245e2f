//! Noncommutative graphs over a vertex algebra.

use crate::algebra::{AlgebraShape, Algebras};
use crate::error::{Error, Invariant, Result};
use crate::linalg::C64;
use crate::subspace::Subspace;
use log::trace;
use std::fmt::{self, Display};

/// An S0-graph: a subspace `S` of the `n x n` complex matrices that is
/// self-adjoint, contains the vertex algebra `S0` and satisfies
/// `S0 * S * S0 = S`.
///
/// The only way to get a value of this type is through [`S0Graph::new`] (or an
/// operation that calls it), so these properties always hold.
#[derive(Debug, Clone)]
pub struct S0Graph {
    shape: AlgebraShape,
    s: Subspace<C64>,
    algebras: Algebras,
}

impl S0Graph {
    /// Check the three invariants, in order, and build the graph.
    pub fn new(shape: AlgebraShape, s: Subspace<C64>) -> Result<Self> {
        let algebras = Algebras::new(&shape)?;
        let n = algebras.n();
        if s.shape() != (n, n) {
            return Err(Error::Dimension {
                expected: (n, n),
                found: s.shape(),
            });
        }
        if !s.is_self_adjoint() {
            return Err(Error::Construction(Invariant::SelfAdjoint));
        }
        if !algebras.s0.is_subspace_of(&s) {
            return Err(Error::Construction(Invariant::ContainsS0));
        }
        // S0 contains the identity, so S ⊆ S0*S*S0 always holds
        if !is_bimodule(&algebras.s0, &s) {
            return Err(Error::Construction(Invariant::BimoduleClosure));
        }
        trace!("New S0-graph of shape {} with dim S = {}", shape, s.dim());
        Ok(Self { shape, s, algebras })
    }
    pub fn shape(&self) -> &AlgebraShape {
        &self.shape
    }
    /// The edge space `S`.
    pub fn subspace(&self) -> &Subspace<C64> {
        &self.s
    }
    /// The vertex algebra.
    pub fn s0(&self) -> &Subspace<C64> {
        &self.algebras.s0
    }
    /// The commutant of the vertex algebra.
    pub fn s1(&self) -> &Subspace<C64> {
        &self.algebras.s1
    }
    pub fn n(&self) -> usize {
        self.algebras.n()
    }
}

/// Returns `true` if `a * x * b ∈ s` for all `a, b ∈ s0` and `x ∈ s`.
fn is_bimodule(s0: &Subspace<C64>, s: &Subspace<C64>) -> bool {
    s0.basis().iter().all(|a| {
        s.basis().iter().all(|x| {
            let ax = a.dot(x);
            s0.basis().iter().all(|b| s.contains(&ax.dot(b)))
        })
    })
}

impl PartialEq for S0Graph {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.s == other.s
    }
}

impl Display for S0Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S0Graph(shape={}, dim S={})", self.shape, self.s.dim())
    }
}
