//! Regular grids, addressed purely by index arithmetic
use super::PrimitiveGrid;
use crate::{
    Error,
    types::{IndexConverter, Point},
};

/// A regular grid of primitives spanning an axis-aligned domain
///
/// The grid has `points[d]` evenly spaced vertices along axis `d` (including
/// both ends of the domain), and therefore `points[d] - 1` primitives along
/// that axis.  No primitives are stored: both primitives and vertices are
/// identified by their linear index.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StructuredGrid<const D: usize> {
    origin: Point<D>,
    lengths: Point<D>,
    points: [usize; D],
}

impl<const D: usize> StructuredGrid<D> {
    /// Builds a grid over `domain` (a `(min, max)` pair per axis)
    ///
    /// Every axis needs at least two points, and `min <= max`.
    pub fn new(
        domain: [(f64, f64); D],
        points: [usize; D],
    ) -> Result<Self, Error> {
        for (axis, (&(min, max), &n)) in
            domain.iter().zip(&points).enumerate()
        {
            if n < 2 {
                return Err(Error::BadGridSize { axis, points: n });
            }
            if max < min {
                return Err(Error::BadDomain { axis, min, max });
            }
        }
        Ok(Self {
            origin: Point::from_fn(|d, _| domain[d].0),
            lengths: Point::from_fn(|d, _| domain[d].1 - domain[d].0),
            points,
        })
    }

    /// Returns the number of vertices along each axis
    pub fn points(&self) -> [usize; D] {
        self.points
    }

    /// Returns the number of primitives along each axis
    pub fn cells(&self) -> [usize; D] {
        self.points.map(|n| n - 1)
    }

    /// Returns the total number of vertices
    pub fn point_count(&self) -> usize {
        self.points.iter().product()
    }

    /// Converts a primitive corner into a global vertex index
    ///
    /// The primitive's position in the grid of primitives is offset by the
    /// corner's bits, then packed into a vertex index.
    pub fn global_vertex_index(
        &self,
        primitive: usize,
        corner: usize,
    ) -> usize {
        let cell = IndexConverter::new(self.cells()).decode(primitive);
        let bits = IndexConverter::<D>::binary().decode(corner);
        let coords = std::array::from_fn(|d| cell[d] + bits[d]);
        IndexConverter::new(self.points).encode(coords)
    }

    /// Returns the position of a vertex, by global index
    ///
    /// # Panics
    /// If `index` is not a valid vertex index
    pub fn point(&self, index: usize) -> Point<D> {
        let converter = IndexConverter::new(self.points);
        let Some(coords) = converter.decode_checked(index) else {
            panic!("vertex {index} is out of range for {:?}", self.points);
        };
        Point::from_fn(|d, _| {
            let step = self.lengths[d] / (self.points[d] - 1) as f64;
            self.origin[d] + coords[d] as f64 * step
        })
    }
}

impl<const D: usize> PrimitiveGrid<D> for StructuredGrid<D> {
    fn primitive_count(&self) -> usize {
        self.cells().iter().product()
    }

    fn vertex(&self, primitive: usize, corner: usize) -> Point<D> {
        self.point(self.global_vertex_index(primitive, corner))
    }
}

////////////////////////////////////////////////////////////////////////////////
