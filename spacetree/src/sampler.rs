//! Sample point placement within a primitive
//!
//! Samplers are pure functions of `(primitive, index)` and hold no per-cell
//! state, so a single instance is shared by every node of a tree.
use crate::{
    Error,
    primitive::Primitive,
    types::{IndexConverter, Point},
};

/// Chooses where a primitive is sampled
pub trait Sampler: Send + Sync {
    /// Returns the number of samples taken per primitive
    fn size<const D: usize>(&self) -> usize;

    /// Returns the position of sample `i`, for `i` in `0..size()`
    fn sample<const D: usize, P: Primitive<D>>(
        &self,
        prim: &P,
        i: usize,
    ) -> Point<D>;

    /// Returns every sample position, in index order
    fn samples<const D: usize, P: Primitive<D>>(
        &self,
        prim: &P,
    ) -> Vec<Point<D>> {
        (0..self.size::<D>()).map(|i| self.sample(prim, i)).collect()
    }
}

/// Samples a regular `n × n × ...` grid spanning the primitive
///
/// With `n == 1`, the single sample is the primitive's centroid.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CartesianGridSampler {
    n: usize,
}

impl CartesianGridSampler {
    /// Builds a sampler with `n` samples along each axis
    pub fn new(n: usize) -> Result<Self, Error> {
        if n == 0 {
            return Err(Error::BadSampleCount(n));
        }
        Ok(Self { n })
    }

    /// Returns the number of samples along each axis
    pub fn per_axis(&self) -> usize {
        self.n
    }
}

impl Sampler for CartesianGridSampler {
    fn size<const D: usize>(&self) -> usize {
        IndexConverter::<D>::uniform(self.n).len()
    }

    fn sample<const D: usize, P: Primitive<D>>(
        &self,
        prim: &P,
        i: usize,
    ) -> Point<D> {
        if self.n == 1 {
            return prim.centroid();
        }
        let coords = IndexConverter::<D>::uniform(self.n).decode(i);
        let step = prim.lengths() / (self.n - 1) as f64;
        let mut out = prim.base();
        for d in 0..D {
            out[d] += coords[d] as f64 * step[d];
        }
        out
    }
}

/// Samples the `2^D` corners of the primitive
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct CornerSampler;

impl Sampler for CornerSampler {
    fn size<const D: usize>(&self) -> usize {
        IndexConverter::<D>::binary().len()
    }

    fn sample<const D: usize, P: Primitive<D>>(
        &self,
        prim: &P,
        i: usize,
    ) -> Point<D> {
        prim.corner(i)
    }
}

////////////////////////////////////////////////////////////////////////////////
