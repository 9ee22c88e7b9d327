use spacetree::{
    marching::{
        MarchingPrimitives, PrimitiveGrid, StructuredGrid, Unstructured,
    },
    mesh::MeshBuilder,
    pool::ThreadPool,
    primitive::Cube,
    sampler::CartesianGridSampler,
    split::MidPoint,
    tree::SpaceTreeNode,
    types::Point,
};
use std::{collections::BTreeSet, sync::Mutex};

#[test]
fn test_small_sphere() {
    // Only the grid point at the origin is inside, so each of the eight
    // cubes around it emits a single triangle
    let grid = StructuredGrid::new([(-2.0, 2.0); 3], [5; 3]).unwrap();
    let sphere = |p: &Point<3>| p.norm() - 0.5;
    let seen = Mutex::new(vec![]);
    let m = MarchingPrimitives::marching_cubes(grid, &sphere, |f| {
        seen.lock().unwrap().push(f.primitive)
    });
    assert_eq!(m.primitive_count(), 64);
    assert_eq!(m.execute(None), 8);

    let seen = seen.into_inner().unwrap();
    let unique: BTreeSet<_> = seen.iter().collect();
    assert_eq!(unique.len(), 8);
    for p in seen {
        let corners: Vec<_> = (0..8).map(|v| grid.vertex(p, v)).collect();
        assert!(corners.contains(&Point::<3>::zeros()));
    }
}

#[test]
fn test_unit_sphere_touching_grid() {
    // Grid points at distance exactly 1 are not inside
    let grid = StructuredGrid::new([(-1.0, 1.0); 3], [3; 3]).unwrap();
    let sphere = |p: &Point<3>| p.norm() - 1.0;
    let builder = MeshBuilder::new();
    let n = MarchingPrimitives::marching_cubes(grid, &sphere, |f| {
        builder.push(f)
    })
    .execute(None);
    assert_eq!(n, 8);

    // Six axis-aligned half-edges around the origin, shared between cubes
    let mesh = builder.take();
    assert_eq!(mesh.faces.len(), 8);
    assert_eq!(mesh.vertices.len(), 6);
    for v in &mesh.vertices {
        approx::assert_relative_eq!(v.norm(), 0.5);
    }
}

#[test]
fn test_tree_leaves() {
    let sphere = |p: &Point<3>| p.norm() - 0.6;
    let root = SpaceTreeNode::new(
        Cube::new(Point::<3>::repeat(-1.0), 2.0).unwrap(),
        std::sync::Arc::new(CartesianGridSampler::new(3).unwrap()),
        std::sync::Arc::new(MidPoint),
    );
    assert!(root.divide(&sphere, 4));
    let leaves = root.boundary_leaves();
    assert!(!leaves.is_empty());

    let pool = ThreadPool::new(4).unwrap();
    let builder = MeshBuilder::new();
    let n = MarchingPrimitives::marching_cubes(
        Unstructured::new(&leaves),
        &sphere,
        |f| builder.push(f),
    )
    .execute(Some(&pool));
    let mesh = builder.take();
    assert!(n > 0);
    assert_eq!(mesh.faces.len(), n);

    // Every vertex is the midpoint of an edge of length 1/8 which crosses
    // the surface
    for v in &mesh.vertices {
        let d = sphere(v).abs();
        assert!(d <= 0.0625 + 1e-9, "vertex {v:?} too far from surface");
    }

    let mut stl = vec![];
    mesh.write_stl(&mut stl).unwrap();
    assert_eq!(stl.len(), 84 + 50 * n);
}

#[test]
fn test_marching_squares_circle() {
    let grid = StructuredGrid::new([(-1.0, 1.0); 2], [33; 2]).unwrap();
    let circle = |p: &Point<2>| p.norm() < 0.75;
    let builder = MeshBuilder::new();
    let pool = ThreadPool::new(2).unwrap();
    MarchingPrimitives::marching_squares(grid, &circle, |f| builder.push(f))
        .execute(Some(&pool));
    let mesh = builder.take();

    // A closed curve uses every vertex in exactly two segments
    let mut uses = vec![0; mesh.vertices.len()];
    for f in &mesh.faces {
        for &i in f.iter() {
            uses[i] += 1;
        }
    }
    assert!(!uses.is_empty());
    assert!(uses.iter().all(|u| *u == 2));
}
