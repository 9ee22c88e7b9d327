//! Split policies, which pick the point where a cell is partitioned
//!
//! Each policy receives the values and positions of one node's samples (as
//! parallel slices) and returns a single point.  Only [`Cuboid`] cells use the
//! result; cubes always bisect at their midpoint.
//!
//! [`Cuboid`]: crate::primitive::Cuboid
use crate::{oracle::Value, types::Point};

/// Chooses a split point from a set of samples
pub trait SplitPolicy: Send + Sync {
    /// Computes a split point
    ///
    /// `values[i]` is the oracle's value at `points[i]`; both slices have the
    /// same length.  If `points` is empty, the origin is returned.
    fn split_point<const D: usize, V: Value>(
        &self,
        values: &[V],
        points: &[Point<D>],
    ) -> Point<D>;
}

/// Returns the component-wise bounds of a set of points
fn bounds<const D: usize>(points: &[Point<D>]) -> (Point<D>, Point<D>) {
    let mut lo = Point::<D>::repeat(f64::INFINITY);
    let mut hi = Point::<D>::repeat(f64::NEG_INFINITY);
    for p in points {
        lo = lo.inf(p);
        hi = hi.sup(p);
    }
    (lo, hi)
}

/// Splits at the mean of the sample positions, ignoring values
#[derive(Copy, Clone, Debug, Default)]
pub struct MidPoint;

impl SplitPolicy for MidPoint {
    fn split_point<const D: usize, V: Value>(
        &self,
        _values: &[V],
        points: &[Point<D>],
    ) -> Point<D> {
        if points.is_empty() {
            return Point::zeros();
        }
        points.iter().sum::<Point<D>>() / points.len() as f64
    }
}

/// Splits where a per-axis linear fit of the values crosses zero
///
/// Each axis is fit independently: an ordinary least-squares line
/// `value = a * x + b` is computed from that axis's coordinates alone, and
/// the root `-b / a` is clamped to the observed coordinate range.  If the fit
/// is degenerate on an axis (all coordinates equal, zero slope, or a
/// non-finite root), the middle of the observed range is used instead.
#[derive(Copy, Clone, Debug, Default)]
pub struct Linear;

impl SplitPolicy for Linear {
    fn split_point<const D: usize, V: Value>(
        &self,
        values: &[V],
        points: &[Point<D>],
    ) -> Point<D> {
        if points.is_empty() {
            return Point::zeros();
        }
        let (lo, hi) = bounds(points);
        let n = points.len() as f64;
        let y_mean = values.iter().map(Value::to_f64).sum::<f64>() / n;

        let mut out = Point::<D>::zeros();
        for d in 0..D {
            let x_mean = points.iter().map(|p| p[d]).sum::<f64>() / n;
            let (sxy, sxx) = points.iter().zip(values).fold(
                (0.0, 0.0),
                |(sxy, sxx), (p, v)| {
                    let dx = p[d] - x_mean;
                    (sxy + dx * (v.to_f64() - y_mean), sxx + dx * dx)
                },
            );
            let slope = sxy / sxx;
            let root = x_mean - y_mean / slope;
            out[d] = if sxx > 0.0 && slope != 0.0 && root.is_finite() {
                root.clamp(lo[d], hi[d])
            } else {
                (lo[d] + hi[d]) / 2.0
            };
        }
        out
    }
}

/// Splits at a value-weighted average of the sample positions
///
/// With `m = max(|v|)`, each sample is weighted by `m - v`; if the weights
/// sum to zero, every sample gets weight 1.  The result is clamped to the
/// observed coordinate range on each axis.
#[derive(Copy, Clone, Debug, Default)]
pub struct Weighted;

impl SplitPolicy for Weighted {
    fn split_point<const D: usize, V: Value>(
        &self,
        values: &[V],
        points: &[Point<D>],
    ) -> Point<D> {
        if points.is_empty() {
            return Point::zeros();
        }
        let abs_max = values
            .iter()
            .map(|v| v.to_f64().abs())
            .fold(0.0, f64::max);
        let mut weights: Vec<f64> =
            values.iter().map(|v| abs_max - v.to_f64()).collect();
        let mut total: f64 = weights.iter().sum();
        if total == 0.0 {
            weights.fill(1.0);
            total = weights.len() as f64;
        }

        let sum = points
            .iter()
            .zip(&weights)
            .fold(Point::zeros(), |acc, (p, w)| acc + p * *w);
        let (lo, hi) = bounds(points);
        (sum / total).zip_zip_map(&lo, &hi, |v, lo, hi| v.clamp(lo, hi))
    }
}

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> [Point<2>; 4] {
        [
            Point::<2>::new(0.0, 0.0),
            Point::<2>::new(1.0, 0.0),
            Point::<2>::new(0.0, 1.0),
            Point::<2>::new(1.0, 1.0),
        ]
    }

    #[test]
    fn midpoint_ignores_values() {
        let pts = unit_square();
        let p = MidPoint.split_point(&[1.0, -2.0, 3.0, 0.0], &pts);
        assert_eq!(p, Point::<2>::new(0.5, 0.5));
        let p = MidPoint.split_point(&[true, true, false, true], &pts);
        assert_eq!(p, Point::<2>::new(0.5, 0.5));
    }

    #[test]
    fn linear_finds_root() {
        // value = x - 0.25 crosses zero at x = 0.25; y has no effect
        let pts = unit_square();
        let values: Vec<f64> = pts.iter().map(|p| p.x - 0.25).collect();
        let p = Linear.split_point(&values, &pts);
        assert_relative_eq!(p.x, 0.25, epsilon = 1e-12);
        assert_relative_eq!(p.y, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn linear_clamps_root() {
        let pts = unit_square();
        let values: Vec<f64> = pts.iter().map(|p| p.x + 3.0).collect();
        let p = Linear.split_point(&values, &pts);
        assert_eq!(p.x, 0.0);
    }

    #[test]
    fn linear_degenerate_axis() {
        let pts = [
            Point::<2>::new(0.0, 2.0),
            Point::<2>::new(1.0, 2.0),
            Point::<2>::new(2.0, 2.0),
        ];
        let p = Linear.split_point(&[-1.0, 0.0, 1.0], &pts);
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_eq!(p.y, 2.0);
        assert!(p.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn weighted_average() {
        let pts = [Point::<1>::new(0.0), Point::<1>::new(4.0)];
        // abs_max = 3; weights are 3 - (-1) = 4 and 3 - 3 = 0
        let p = Weighted.split_point(&[-1.0, 3.0], &pts);
        assert_eq!(p, Point::<1>::new(0.0));

        // weights are 2 and 1
        let p = Weighted.split_point(&[-1.0, 0.0], &pts);
        assert_relative_eq!(p.x, 4.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn weighted_uniform_fallback() {
        let pts = unit_square();
        let p = Weighted.split_point(&[0.0; 4], &pts);
        assert_eq!(p, Point::<2>::new(0.5, 0.5));
    }
}
