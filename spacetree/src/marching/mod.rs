//! Table-driven surface extraction ("marching primitives")
//!
//! The engine scans a set of primitives (squares in 2D, cubes in 3D).  For
//! each primitive it classifies every corner as inside or outside the target,
//! packs the result into a configuration index, and looks the index up in a
//! connectivity table.  Each table entry becomes a [`Fragment`], which is
//! handed to a caller-supplied output function: a line segment in 2D or a
//! triangle in 3D, described by the primitive edges that it crosses.
//!
//! The engine never computes vertex positions on those edges; that is left to
//! the output function, which typically uses [`Fragment::midpoints`] (see
//! [`MeshBuilder`](crate::mesh::MeshBuilder)).
//!
//! Primitives are provided by a [`PrimitiveGrid`]: either a [`StructuredGrid`]
//! (a regular grid addressed purely by index arithmetic) or an
//! [`Unstructured`] slice of primitives.
use crate::{
    oracle::{Oracle, Value},
    pool::ThreadPool,
    types::Point,
};
use log::debug;
use std::sync::atomic::{AtomicUsize, Ordering};

mod structured;
pub mod tables;
mod unstructured;

pub use structured::StructuredGrid;
pub use tables::Tables;
pub use unstructured::Unstructured;

/// A set of primitives with `2^D` corners each
pub trait PrimitiveGrid<const D: usize>: Sync {
    /// Returns the number of primitives
    fn primitive_count(&self) -> usize;

    /// Returns the position of a corner of a primitive
    ///
    /// Bit `d` of `corner` selects the upper side of axis `d`.
    fn vertex(&self, primitive: usize, corner: usize) -> Point<D>;
}

/// A single surface fragment emitted by the marching engine
///
/// Each of the `D` edges names two corners of the primitive; the fragment's
/// vertices lie somewhere along those edges.
#[derive(Copy, Clone, Debug)]
pub struct Fragment<'g, const D: usize, G> {
    /// Index of the primitive which produced this fragment
    pub primitive: usize,

    /// Edges crossed by the fragment, as pairs of corner indices
    pub edges: [[usize; 2]; D],

    grid: &'g G,
}

impl<const D: usize, G: PrimitiveGrid<D>> Fragment<'_, D, G> {
    /// Returns the position of a corner of this fragment's primitive
    pub fn vertex(&self, corner: usize) -> Point<D> {
        self.grid.vertex(self.primitive, corner)
    }

    /// Returns the midpoint of each edge
    pub fn midpoints(&self) -> [Point<D>; D] {
        self.edges.map(|[a, b]| (self.vertex(a) + self.vertex(b)) / 2.0)
    }
}

/// Surface extraction engine
///
/// `G` provides the primitives, `O` is the target oracle, and `F` receives
/// each emitted [`Fragment`].  When run on a thread pool, `F` is called
/// concurrently from several workers; any synchronization is up to `F`.
pub struct MarchingPrimitives<'a, const D: usize, G, O, F> {
    grid: G,
    target: &'a O,
    tables: Tables<'a, D>,
    output: F,
}

/// Marching squares over any primitive grid
pub type MarchingSquares<'a, G, O, F> = MarchingPrimitives<'a, 2, G, O, F>;

/// Marching cubes over any primitive grid
pub type MarchingCubes<'a, G, O, F> = MarchingPrimitives<'a, 3, G, O, F>;

/// Marching cubes over a regular grid
pub type StructuredMarchingCubes<'a, O, F> =
    MarchingCubes<'a, StructuredGrid<3>, O, F>;

/// Marching cubes over an explicit set of primitives
pub type UnstructuredMarchingCubes<'a, P, O, F> =
    MarchingCubes<'a, Unstructured<'a, 3, P>, O, F>;

/// Marching squares over a regular grid
pub type StructuredMarchingSquares<'a, O, F> =
    MarchingSquares<'a, StructuredGrid<2>, O, F>;

/// Marching squares over an explicit set of primitives
pub type UnstructuredMarchingSquares<'a, P, O, F> =
    MarchingSquares<'a, Unstructured<'a, 2, P>, O, F>;

impl<'a, const D: usize, G, O, F> MarchingPrimitives<'a, D, G, O, F>
where
    G: PrimitiveGrid<D>,
    O: Oracle<D>,
    F: Fn(&Fragment<'_, D, G>) + Sync,
{
    /// Builds a new engine with custom tables
    pub fn new(
        grid: G,
        target: &'a O,
        tables: Tables<'a, D>,
        output: F,
    ) -> Self {
        Self {
            grid,
            target,
            tables,
            output,
        }
    }

    /// Returns the number of primitives to be scanned
    pub fn primitive_count(&self) -> usize {
        self.grid.primitive_count()
    }

    /// Returns the number of corners per primitive
    pub fn vertex_count(&self) -> usize {
        1 << D
    }

    /// Returns the position of a corner of a primitive
    pub fn vertex(&self, primitive: usize, corner: usize) -> Point<D> {
        self.grid.vertex(primitive, corner)
    }

    /// Classifies the corners of a primitive
    ///
    /// Bit `v` of the result is set if corner `v` is outside the target.
    pub fn configuration(&self, primitive: usize) -> usize {
        let mut config = 0;
        for v in 0..self.vertex_count() {
            let p = self.grid.vertex(primitive, v);
            if !self.target.eval(&p).is_inside() {
                config ^= 1 << v;
            }
        }
        config
    }

    /// Emits every fragment for a single primitive
    ///
    /// Returns the number of fragments emitted.
    fn march(&self, primitive: usize) -> usize {
        let fragments = self.tables.fragments(self.configuration(primitive));
        for f in fragments {
            let edges = f.map(|e| self.tables.edges()[e]);
            (self.output)(&Fragment {
                primitive,
                edges,
                grid: &self.grid,
            });
        }
        fragments.len()
    }

    /// Scans every primitive, emitting fragments to the output function
    ///
    /// If a pool is provided, primitives are partitioned across its workers
    /// and this call blocks until all of them are done.  Returns the number of
    /// fragments emitted.
    pub fn execute(&self, pool: Option<&ThreadPool>) -> usize {
        let n = self.primitive_count();
        let emitted = match pool {
            None => (0..n).map(|p| self.march(p)).sum(),
            Some(pool) => {
                let count = AtomicUsize::new(0);
                pool.parallel_for(n, |p| {
                    count.fetch_add(self.march(p), Ordering::Relaxed);
                });
                count.into_inner()
            }
        };
        debug!("marched {n} primitives, emitting {emitted} fragments");
        emitted
    }
}

impl<'a, G, O, F> MarchingPrimitives<'a, 2, G, O, F>
where
    G: PrimitiveGrid<2>,
    O: Oracle<2>,
    F: Fn(&Fragment<'_, 2, G>) + Sync,
{
    /// Builds a marching squares engine, emitting line segments
    pub fn marching_squares(grid: G, target: &'a O, output: F) -> Self {
        Self::new(grid, target, Tables::marching_squares(), output)
    }
}

impl<'a, G, O, F> MarchingPrimitives<'a, 3, G, O, F>
where
    G: PrimitiveGrid<3>,
    O: Oracle<3>,
    F: Fn(&Fragment<'_, 3, G>) + Sync,
{
    /// Builds a marching cubes engine, emitting triangles
    pub fn marching_cubes(grid: G, target: &'a O, output: F) -> Self {
        Self::new(grid, target, Tables::marching_cubes(), output)
    }
}

////////////////////////////////////////////////////////////////////////////////
