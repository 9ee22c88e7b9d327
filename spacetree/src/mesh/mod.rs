//! Indexed meshes assembled from marching fragments
//!
//! A [`Mesh<D>`](Mesh) is a set of vertices and faces, where each face lists
//! `D` vertex indices: line segments in 2D and triangles in 3D.  Meshes are
//! usually built with a [`MeshBuilder`], which can be used directly as the
//! output function of a [`MarchingPrimitives`] engine.
//!
//! [`MarchingPrimitives`]: crate::marching::MarchingPrimitives
use crate::types::Point;
use serde::{Deserialize, Serialize};

mod builder;
mod output;

pub use builder::MeshBuilder;

/// An indexed mesh of `D - 1`-dimensional faces
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh<const D: usize> {
    /// Faces, as indexes into [`self.vertices`](Self::vertices)
    pub faces: Vec<nalgebra::SVector<usize, D>>,
    /// Vertex positions
    pub vertices: Vec<Point<D>>,
}

impl<const D: usize> Mesh<D> {
    /// Builds a new, empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the positions of a face's vertices
    ///
    /// # Panics
    /// If `face` is out of range
    pub fn face_vertices(&self, face: usize) -> [Point<D>; D] {
        let f = &self.faces[face];
        std::array::from_fn(|i| self.vertices[f[i]])
    }
}
