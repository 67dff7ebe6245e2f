extern crate nc_graph;

use approx::assert_abs_diff_eq;
use nc_graph::dsw::*;
use nc_graph::linalg::*;
use nc_graph::operations::*;
use nc_graph::sdp::InteriorPoint;
use nc_graph::*;
use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;

const EPS: f64 = 1e-4;

fn pentagon() -> S0Graph {
    classical_graph(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]).unwrap()
}

fn diagonal(w: &[f64]) -> Array2<C64> {
    Array2::from_shape_fn((w.len(), w.len()), |(i, j)| {
        C64::from_real(if i == j { w[i] } else { 0. })
    })
}

// A positive definite weight in the given subspace
fn positive_weight(space: &Subspace<C64>, rng: &mut StdRng) -> Array2<C64> {
    let r = space.random_element(rng);
    r.dot(&dagger(&r)) + identity::<C64>(space.shape().0)
}

#[test]
pub fn isolated_vertices() {
    let shape = AlgebraShape::new(&[[1, 2]]).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    let g = vertex_graph(&random_s0graph(&shape, &mut rng).unwrap()).unwrap();
    let solver = InteriorPoint::default();
    for method in [Method::Generic, Method::Blocks] {
        let sol = dsw(&g, &identity(2), method, &solver).unwrap();
        assert_abs_diff_eq!(sol.value, 2., epsilon = EPS);
        assert!(g.s1().contains(&sol.x));
    }
    // The full graph on the same algebra is the complement
    let full = complement(&g).unwrap();
    assert_eq!(full.subspace(), &Subspace::full(2, 2));
    for method in [Method::Generic, Method::Blocks] {
        let sol = dsw_antiblocker(&full, &identity(2), method, &solver).unwrap();
        assert_abs_diff_eq!(sol.value, 2., epsilon = EPS);
    }
}

#[test]
pub fn matrix_vertex() {
    // One vertex carrying the algebra M_2
    let shape = AlgebraShape::new(&[[2, 1]]).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let g = vertex_graph(&random_s0graph(&shape, &mut rng).unwrap()).unwrap();
    let solver = InteriorPoint::default();
    for method in [Method::Generic, Method::Blocks] {
        let sol = dsw(&g, &identity(2), method, &solver).unwrap();
        assert_abs_diff_eq!(sol.value, 1., epsilon = EPS);
    }
}

#[test]
pub fn lovasz_theta() {
    let solver = InteriorPoint::default();
    let c5 = pentagon();
    for method in [Method::Generic, Method::Blocks] {
        let sol = dsw(&c5, &identity(5), method, &solver).unwrap();
        assert_abs_diff_eq!(sol.value, 5f64.sqrt(), epsilon = EPS);
        let anti =
            dsw_antiblocker(&complement(&c5).unwrap(), &identity(5), method, &solver).unwrap();
        assert_abs_diff_eq!(anti.value, 5f64.sqrt(), epsilon = EPS);
    }
}

#[test]
pub fn weighted_classical_graphs() {
    let solver = InteriorPoint::default();
    let w = diagonal(&[1., 2., 3.]);
    let discrete = classical_graph(3, &[]).unwrap();
    let complete = classical_graph(3, &[(0, 1), (1, 2), (0, 2)]).unwrap();
    let path = classical_graph(3, &[(0, 1), (1, 2)]).unwrap();
    for method in [Method::Generic, Method::Blocks] {
        // The weight of the only maximal independent set
        let sol = dsw(&discrete, &w, method, &solver).unwrap();
        assert_abs_diff_eq!(sol.value, 6., epsilon = EPS);
        // The heaviest vertex
        let sol = dsw(&complete, &w, method, &solver).unwrap();
        assert_abs_diff_eq!(sol.value, 3., epsilon = EPS);
        // Perfect graph: {0, 2} against {1}
        let sol = dsw(&path, &w, method, &solver).unwrap();
        assert_abs_diff_eq!(sol.value, 4., epsilon = EPS);
    }
}

fn shapes() -> Vec<AlgebraShape> {
    let rows: [Vec<[usize; 2]>; 5] = [
        vec![[1, 2]],
        vec![[2, 1], [1, 2]],
        vec![[1, 3]],
        vec![[2, 2]],
        vec![[1, 1], [1, 2], [2, 1]],
    ];
    rows.iter()
        .map(|rows| AlgebraShape::new(rows).unwrap())
        .collect()
}

#[test]
pub fn methods_agree() {
    let solver = InteriorPoint::default();
    for shape in shapes() {
        for seed in 0..3 {
            let mut rng = StdRng::seed_from_u64(seed);
            let g = random_s0graph(&shape, &mut rng).unwrap();
            let w = positive_weight(g.s1(), &mut rng);
            let generic = dsw(&g, &w, Method::Generic, &solver).unwrap();
            let blocks = dsw(&g, &w, Method::Blocks, &solver).unwrap();
            let tolerance = EPS * generic.value.max(1.);
            assert_abs_diff_eq!(generic.value, blocks.value, epsilon = tolerance);
            // x dominates w
            let gap = &blocks.x - &w;
            assert!(gap.diag().iter().all(|d| d.re > -1e-5));

            // The antiblocker accepts weights outside S1
            if seed == 0 {
                let w = positive_weight(&Subspace::full(g.n(), g.n()), &mut rng);
                let generic = dsw_antiblocker(&g, &w, Method::Generic, &solver).unwrap();
                let blocks = dsw_antiblocker(&g, &w, Method::Blocks, &solver).unwrap();
                assert_abs_diff_eq!(
                    generic.value,
                    blocks.value,
                    epsilon = EPS * generic.value.max(1.)
                );
                assert!(g.s1().contains(&blocks.x));
            }
        }
    }
}

#[test]
pub fn single_block_graphs() {
    // [[1, 3]] graphs are the noncommutative graphs of Duan, Severini and Winter on C^3
    let shape = AlgebraShape::new(&[[1, 3]]).unwrap();
    let solver = InteriorPoint::default();
    let w = identity(3);
    for seed in 0..4 {
        let mut rng = StdRng::seed_from_u64(seed);
        let g = random_s0graph(&shape, &mut rng).unwrap();
        let generic = dsw(&g, &w, Method::Generic, &solver).unwrap();
        let blocks = dsw(&g, &w, Method::Blocks, &solver).unwrap();
        assert_abs_diff_eq!(generic.value, blocks.value, epsilon = EPS);
        // Between the full graph and the discrete graph
        assert!(generic.value <= 3. + EPS);
        assert!(generic.value >= 1. / 3. - EPS);
    }
}

#[test]
pub fn edges_decrease_the_value() {
    let solver = InteriorPoint::default();
    for shape in shapes() {
        let mut rng = StdRng::seed_from_u64(11);
        let g = random_s0graph(&shape, &mut rng).unwrap();
        let w = positive_weight(g.s1(), &mut rng);
        let value = dsw(&g, &w, Method::Blocks, &solver).unwrap().value;
        let discrete = dsw(&vertex_graph(&g).unwrap(), &w, Method::Blocks, &solver)
            .unwrap()
            .value;
        assert!(value <= discrete * (1. + EPS), "{}: {} > {}", shape, value, discrete);
    }
}

#[test]
pub fn antiblocker_duality() {
    let solver = InteriorPoint::default();
    let w = diagonal(&[1., 3., 0.5, 2., 1.5]);
    let graphs = [
        pentagon(),
        classical_graph(5, &[(0, 1), (1, 2), (2, 3)]).unwrap(),
        classical_graph(5, &[(0, 2), (0, 3), (1, 4)]).unwrap(),
    ];
    for g in &graphs {
        let value = dsw(g, &w, Method::Blocks, &solver).unwrap().value;
        let dual = dsw_antiblocker(&complement(g).unwrap(), &w, Method::Blocks, &solver)
            .unwrap()
            .value;
        assert_abs_diff_eq!(value, dual, epsilon = 1e-3 * value.max(1.));
    }
}

#[test]
pub fn antiblocker_duality_with_matrix_blocks() {
    let solver = InteriorPoint::default();
    let rows: [Vec<[usize; 2]>; 3] = [vec![[2, 1]], vec![[2, 2]], vec![[2, 1], [1, 2]]];
    for rows in &rows {
        let shape = AlgebraShape::new(rows).unwrap();
        for seed in 0..2 {
            let mut rng = StdRng::seed_from_u64(seed);
            let g = random_s0graph(&shape, &mut rng).unwrap();
            let h = complement(&g).unwrap();
            let weights = [identity(g.n()), positive_weight(g.s1(), &mut rng)];
            for w in &weights {
                let value = dsw(&g, w, Method::Blocks, &solver).unwrap().value;
                for method in [Method::Generic, Method::Blocks] {
                    let dual = dsw_antiblocker(&h, w, method, &solver).unwrap().value;
                    assert_abs_diff_eq!(value, dual, epsilon = 1e-3 * value.max(1.));
                }
            }
        }
    }
}

#[test]
pub fn vertex_and_full_graphs_are_dual() {
    // One block [[a, y]]: the discrete graph has value y and the full graph 1/y
    let solver = InteriorPoint::default();
    for (d_a, d_y) in [(2usize, 1usize), (2, 2), (1, 3)] {
        let shape = AlgebraShape::new(&[[d_a, d_y]]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let vertex = vertex_graph(&random_s0graph(&shape, &mut rng).unwrap()).unwrap();
        let full = complement(&vertex).unwrap();
        let w = identity(shape.n());
        let y = d_y as f64;
        let sol = dsw(&vertex, &w, Method::Blocks, &solver).unwrap();
        assert_abs_diff_eq!(sol.value, y, epsilon = EPS);
        let sol = dsw_antiblocker(&full, &w, Method::Blocks, &solver).unwrap();
        assert_abs_diff_eq!(sol.value, y, epsilon = EPS);
        let sol = dsw(&full, &w, Method::Generic, &solver).unwrap();
        assert_abs_diff_eq!(sol.value, 1. / y, epsilon = EPS);
        let sol = dsw_antiblocker(&vertex, &w, Method::Generic, &solver).unwrap();
        assert_abs_diff_eq!(sol.value, 1. / y, epsilon = EPS);
    }
}

#[test]
pub fn psi_is_self_adjoint() {
    let mut rng = StdRng::seed_from_u64(9);
    let shape = AlgebraShape::new(&[[2, 1], [1, 2]]).unwrap();
    let g = random_s0graph(&shape, &mut rng).unwrap();
    let full: Subspace<C64> = Subspace::full(g.n(), g.n());
    for _ in 0..5 {
        let a = full.random_element(&mut rng);
        let b = full.random_element(&mut rng);
        let lhs = inner(&psi(&shape, &a), &b);
        let rhs = inner(&a, &psi(&shape, &b));
        assert_abs_diff_eq!(lhs.re, rhs.re, epsilon = 1e-9);
        assert_abs_diff_eq!(lhs.im, rhs.im, epsilon = 1e-9);
        assert!(g.s1().contains(&psi(&shape, &a)));
    }
}
