//! Target oracles, i.e. the shapes being subdivided and meshed
//!
//! Any `Fn(&Point<D>) -> V` closure is an oracle, as long as `V` is a
//! [`Value`]:
//!
//! ```
//! use spacetree::{oracle::Oracle, types::Point};
//!
//! let disk = |p: &Point<2>| p.norm() <= 1.0;
//! assert!(disk.eval(&Point::<2>::new(0.5, 0.0)));
//! assert!(!disk.eval(&Point::<2>::new(1.5, 0.0)));
//! ```
use crate::types::Point;

/// A value returned by an oracle
///
/// Subdivision only compares signs (see [`Value::is_above_zero`]), while
/// surface extraction classifies points as inside or outside (see
/// [`Value::is_inside`]).  Split policies need a scalar view of the value as
/// well.
pub trait Value: Copy + Send + Sync + 'static {
    /// Checks whether the value is strictly positive
    fn is_above_zero(&self) -> bool;

    /// Checks whether the value marks a point inside the shape
    fn is_inside(&self) -> bool;

    /// Converts to a scalar, for use in split-point regression
    fn to_f64(&self) -> f64;
}

/// Membership values: `true` is inside (and positive)
impl Value for bool {
    fn is_above_zero(&self) -> bool {
        *self
    }
    fn is_inside(&self) -> bool {
        *self
    }
    fn to_f64(&self) -> f64 {
        if *self { 1.0 } else { 0.0 }
    }
}

/// Signed distance values: negative is inside
impl Value for f64 {
    fn is_above_zero(&self) -> bool {
        *self > 0.0
    }
    fn is_inside(&self) -> bool {
        *self < 0.0
    }
    fn to_f64(&self) -> f64 {
        *self
    }
}

/// Signed distance values: negative is inside
impl Value for f32 {
    fn is_above_zero(&self) -> bool {
        *self > 0.0
    }
    fn is_inside(&self) -> bool {
        *self < 0.0
    }
    fn to_f64(&self) -> f64 {
        *self as f64
    }
}

/// A function from position to [`Value`]
///
/// Oracles must be deterministic and free of side effects, because results
/// may be cached in a [`TargetMap`](crate::map::TargetMap) and reused for any
/// later query at the same position.
pub trait Oracle<const D: usize>: Sync {
    /// Type of value returned by the oracle
    type Output: Value;

    /// Evaluates the oracle at the given position
    fn eval(&self, p: &Point<D>) -> Self::Output;
}

impl<const D: usize, V: Value, F> Oracle<D> for F
where
    F: Fn(&Point<D>) -> V + Sync,
{
    type Output = V;
    fn eval(&self, p: &Point<D>) -> V {
        self(p)
    }
}
