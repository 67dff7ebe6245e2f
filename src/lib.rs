//!Noncommutative graphs and the
//![Duan-Severini-Winter](https://arxiv.org/abs/1002.2514) semidefinite bound.
//!
//!A noncommutative graph (or S0-graph) is a self-adjoint subspace `S` of
//!matrices that contains a vertex algebra `S0` and satisfies `S0 S S0 = S`.
//!Classical graphs are the case where `S0` is the algebra of diagonal matrices.
//!
//!# Example
//!
//!```rust
//!use nc_graph::*;
//!use nc_graph::dsw::{Method, dsw, dsw_antiblocker};
//!use nc_graph::operations::*;
//!
//!pub fn main() {
//!    // Two isolated vertices of dimension 2
//!    let shape = AlgebraShape::new(&[[1, 2]]).unwrap();
//!    let g = vertex_graph(&random_s0graph(&shape, &mut rand::rng()).unwrap()).unwrap();
//!    let w = linalg::identity(2);
//!    let solver = sdp::InteriorPoint::default();
//!
//!    let value = dsw(&g, &w, Method::Blocks, &solver).unwrap().value;
//!    assert!((value - 2.).abs() < 1e-6);
//!
//!    // Antiblocker duality
//!    let h = complement(&g).unwrap();
//!    let dual = dsw_antiblocker(&h, &w, Method::Generic, &solver).unwrap().value;
//!    assert!((value - dual).abs() < 1e-5);
//!}
//!```
//!

#![warn(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    //unused_qualifications,
    unused_labels,
    //unused_results
)]

mod algebra;
pub use crate::algebra::*;

pub mod blocks;
pub mod dsw;
mod error;
pub use crate::error::*;
mod graph;
pub use crate::graph::*;
pub mod linalg;
pub mod operations;
pub mod sdp;
pub mod subspace;
pub use crate::subspace::Subspace;

#[macro_use]
extern crate serde_derive;

/// Log at `info` level, or the level given by `RUST_LOG`.
pub fn init_default_log() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init()
}

/// Log everything down to `trace` level.
pub fn init_debug_log() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Trace)
        .format_timestamp(None)
        .init()
}
