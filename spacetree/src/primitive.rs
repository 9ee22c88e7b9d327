//! Axis-aligned primitives
//!
//! Both [`Cube`] and [`Cuboid`] are plain value types, described by a base
//! (minimum) corner plus lengths along each axis.
use crate::{
    Error,
    types::{IndexConverter, Point},
};
use serde::{Deserialize, Serialize};

/// Lengths below this value make a primitive degenerate
pub const DEGENERATE_TOLERANCE: f64 = f64::EPSILON;

/// An axis-aligned primitive in `D` dimensions
pub trait Primitive<const D: usize>: Copy + Send + Sync + 'static {
    /// Returns the minimum corner
    fn base(&self) -> Point<D>;

    /// Returns the extent along each axis
    fn lengths(&self) -> Point<D>;

    /// Checks whether any length is numerically zero
    ///
    /// Degenerate primitives have zero measure and must not be subdivided.
    fn is_degenerate(&self) -> bool {
        self.lengths().iter().any(|l| *l < DEGENERATE_TOLERANCE)
    }

    /// Returns the position of the given corner (`0..2^D`)
    ///
    /// Bit `d` of the corner index selects the upper side of axis `d`.
    fn corner(&self, i: usize) -> Point<D> {
        let bits = IndexConverter::<D>::binary().decode(i);
        let lengths = self.lengths();
        let mut out = self.base();
        for d in 0..D {
            if bits[d] == 1 {
                out[d] += lengths[d];
            }
        }
        out
    }

    /// Returns the geometric center
    fn centroid(&self) -> Point<D> {
        self.base() + self.lengths() / 2.0
    }

    /// Returns the product of all lengths (area in 2D, volume in 3D)
    fn volume(&self) -> f64 {
        self.lengths().iter().product()
    }

    /// Checks whether a point lies within the primitive (boundary included)
    fn contains(&self, p: &Point<D>) -> bool {
        let base = self.base();
        let upper = base + self.lengths();
        (0..D).all(|d| p[d] >= base[d] && p[d] <= upper[d])
    }
}

////////////////////////////////////////////////////////////////////////////////

/// An axis-aligned cube with the same length on every axis
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cube<const D: usize> {
    base: Point<D>,
    length: f64,
}

impl<const D: usize> Cube<D> {
    /// Builds a new cube from its minimum corner and edge length
    ///
    /// With the `geometry-check` feature enabled, a negative length returns
    /// [`Error::NegativeLength`].
    pub fn new(base: Point<D>, length: f64) -> Result<Self, Error> {
        if cfg!(feature = "geometry-check") && length < 0.0 {
            return Err(Error::NegativeLength(length));
        }
        Ok(Self { base, length })
    }

    /// Returns the edge length
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Bisects the cube into `2^D` children of half the edge length
    ///
    /// Child `i` is offset by half a length along axis `d` if bit `d` of `i`
    /// is set.
    pub fn split(&self) -> Vec<Self> {
        let half = self.length / 2.0;
        let bits = IndexConverter::<D>::binary();
        (0..bits.len())
            .map(|i| {
                let digits = bits.decode(i);
                let mut base = self.base;
                for d in 0..D {
                    base[d] += half * digits[d] as f64;
                }
                Self { base, length: half }
            })
            .collect()
    }
}

impl<const D: usize> Primitive<D> for Cube<D> {
    fn base(&self) -> Point<D> {
        self.base
    }
    fn lengths(&self) -> Point<D> {
        Point::repeat(self.length)
    }
}

////////////////////////////////////////////////////////////////////////////////

/// An axis-aligned box with an independent length on each axis
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cuboid<const D: usize> {
    base: Point<D>,
    lengths: Point<D>,
}

impl<const D: usize> Cuboid<D> {
    /// Builds a new box from its minimum corner and per-axis lengths
    ///
    /// With the `geometry-check` feature enabled, a negative length returns
    /// [`Error::NegativeLength`].
    pub fn new(base: Point<D>, lengths: Point<D>) -> Result<Self, Error> {
        if cfg!(feature = "geometry-check") {
            if let Some(l) = lengths.iter().find(|l| **l < 0.0) {
                return Err(Error::NegativeLength(*l));
            }
        }
        Ok(Self { base, lengths })
    }

    /// Builds a box from lengths that are known to be non-negative
    pub(crate) fn from_parts(base: Point<D>, lengths: Point<D>) -> Self {
        Self { base, lengths }
    }
}

impl<const D: usize> Primitive<D> for Cuboid<D> {
    fn base(&self) -> Point<D> {
        self.base
    }
    fn lengths(&self) -> Point<D> {
        self.lengths
    }
}

impl<const D: usize> From<Cube<D>> for Cuboid<D> {
    fn from(c: Cube<D>) -> Self {
        Self {
            base: c.base,
            lengths: Point::repeat(c.length),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
