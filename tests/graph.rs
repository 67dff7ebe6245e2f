extern crate nc_graph;

use nc_graph::blocks::*;
use nc_graph::linalg::*;
use nc_graph::operations::*;
use nc_graph::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

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

fn check_invariants(g: &S0Graph) {
    let s = g.subspace();
    assert!(s.is_self_adjoint());
    assert!(g.s0().is_subspace_of(s));
    assert_eq!(&g.s0().product(s).product(g.s0()), s);
}

#[test]
pub fn algebras_commute() {
    let mut rng = StdRng::seed_from_u64(42);
    for shape in shapes() {
        let alg = Algebras::new(&shape).unwrap();
        assert!(alg.commutator_defect(100, &mut rng) < 1e-9);
    }
}

#[test]
pub fn random_graphs_are_valid() {
    let mut rng = StdRng::seed_from_u64(1);
    for shape in shapes() {
        for _ in 0..3 {
            let g = random_s0graph(&shape, &mut rng).unwrap();
            check_invariants(&g);
            check_invariants(&complement(&g).unwrap());
        }
    }
}

#[test]
pub fn complement_is_an_involution() {
    let mut rng = StdRng::seed_from_u64(2);
    for shape in shapes() {
        let g = random_s0graph(&shape, &mut rng).unwrap();
        let h = complement(&g).unwrap();
        assert_eq!(complement(&h).unwrap(), g);
        // S ∩ S' = S0
        assert_eq!(
            g.subspace().dim() + h.subspace().dim(),
            g.n() * g.n() + g.s0().dim()
        );
    }
}

#[test]
pub fn vertex_graph_and_forget_algebra() {
    let mut rng = StdRng::seed_from_u64(3);
    for shape in shapes() {
        let g = random_s0graph(&shape, &mut rng).unwrap();
        let v = vertex_graph(&g).unwrap();
        assert_eq!(v.subspace(), g.s0());
        let f = forget_algebra(&g).unwrap();
        assert_eq!(f.subspace(), g.subspace());
        assert_eq!(f.shape(), &AlgebraShape::trivial(g.n()).unwrap());
    }
    let shape = AlgebraShape::new(&[[1, 2]]).unwrap();
    let g = random_s0graph(&shape, &mut rng).unwrap();
    let discrete = forget_algebra(&vertex_graph(&g).unwrap()).unwrap();
    assert_eq!(discrete.subspace(), &Subspace::identity_span(2));
    assert_eq!(discrete, vertex_graph(&discrete).unwrap());
}

#[test]
pub fn block_round_trip() {
    let mut rng = StdRng::seed_from_u64(4);
    for shape in shapes() {
        let g = random_s0graph(&shape, &mut rng).unwrap();
        let b = decompose(&g);
        let h = reconstruct(&shape, &b).unwrap();
        assert_eq!(h, g);
        assert_eq!(decompose(&h), b);
        // Blocks are closed under adjoint
        for i in 0..b.len() {
            for j in 0..b.len() {
                assert_eq!(b[(i, j)].adjoint(), b[(j, i)]);
            }
        }
    }
}

#[test]
pub fn reconstruct_rejects_other_shapes() {
    let mut rng = StdRng::seed_from_u64(5);
    let shape = AlgebraShape::new(&[[1, 2]]).unwrap();
    let g = random_s0graph(&shape, &mut rng).unwrap();
    let other = AlgebraShape::new(&[[2, 1]]).unwrap();
    assert!(matches!(
        reconstruct(&other, &decompose(&g)),
        Err(Error::Shape(_))
    ));
}

#[test]
pub fn classical_graphs() {
    let c5 = classical_graph(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]).unwrap();
    check_invariants(&c5);
    // The pentagon is self-complementary
    let relabeled = classical_graph(5, &[(0, 2), (2, 4), (4, 1), (1, 3), (3, 0)]).unwrap();
    assert_eq!(complement(&c5).unwrap(), relabeled);
    let b = decompose(&c5);
    assert!(!b[(0, 1)].is_empty());
    assert!(b[(0, 2)].is_empty());
    let id: ndarray::Array2<C64> = identity(5);
    assert!(c5.s0().contains(&id));
}

#[test]
pub fn empty_vertex_sets() {
    assert!(matches!(classical_graph(0, &[]), Err(Error::Shape(_))));
    assert!(matches!(AlgebraShape::trivial(0), Err(Error::Shape(_))));
}

#[test]
pub fn malformed_shapes() {
    assert!(matches!(AlgebraShape::new(&[[0, 2]]), Err(Error::Shape(_))));
    assert!(matches!(
        AlgebraShape::new(&[vec![1, 2], vec![3]]),
        Err(Error::Shape(_))
    ));
}
