use super::Mesh;
use crate::{
    map::{PointKey, point_key},
    marching::{Fragment, PrimitiveGrid},
};
use std::{collections::HashMap, sync::Mutex};

/// Container used during construction of a [`Mesh`]
///
/// Each fragment is placed at the midpoints of its edges.  Vertices at the
/// same position are merged, so fragments from neighbouring primitives share
/// vertices.  The builder is safe to share between threads, so it may be
/// used from a parallel
/// [`execute`](crate::marching::MarchingPrimitives::execute).
#[derive(Debug, Default)]
pub struct MeshBuilder<const D: usize> {
    inner: Mutex<BuilderData<D>>,
}

#[derive(Debug, Default)]
struct BuilderData<const D: usize> {
    /// Map from vertex position to index in `out.vertices`
    map: HashMap<PointKey<D>, usize>,
    out: Mesh<D>,
}

impl<const D: usize> BuilderData<D> {
    fn get(&mut self, key: PointKey<D>) -> usize {
        *self.map.entry(key).or_insert_with(|| {
            let next_vert = self.out.vertices.len();
            self.out.vertices.push(key.map(|v| v.into_inner()).into());
            next_vert
        })
    }
}

impl<const D: usize> MeshBuilder<D> {
    /// Builds a new, empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fragment to the mesh
    pub fn push<G: PrimitiveGrid<D>>(&self, fragment: &Fragment<'_, D, G>) {
        let keys = fragment.midpoints().map(|p| point_key(&p));
        let mut data = self.inner.lock().unwrap();
        let face = keys.map(|k| data.get(k));
        data.out.faces.push(face.into());
    }

    /// Returns the number of faces pushed so far
    pub fn face_count(&self) -> usize {
        self.inner.lock().unwrap().out.faces.len()
    }

    /// Consumes the builder, returning the mesh
    pub fn take(self) -> Mesh<D> {
        self.inner.into_inner().unwrap().out
    }
}
