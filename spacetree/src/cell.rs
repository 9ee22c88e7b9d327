//! Cells: primitives that know how to partition themselves
use crate::{
    primitive::{Cube, Cuboid, Primitive},
    types::{IndexConverter, Point},
};

/// A primitive which can be split into `2^D` children of the same kind
pub trait Cell<const D: usize>: Primitive<D> {
    /// Splits the cell around the given point
    ///
    /// Child `i` lies on the upper side of the split along axis `d` if bit `d`
    /// of `i` is set.  Implementations may ignore `p`.
    fn split_at(&self, p: &Point<D>) -> Vec<Self>;
}

impl<const D: usize> Cell<D> for Cube<D> {
    /// Bisects the cube at its midpoint; `p` is ignored
    fn split_at(&self, _p: &Point<D>) -> Vec<Self> {
        self.split()
    }
}

impl<const D: usize> Cell<D> for Cuboid<D> {
    /// Cuts the box along every axis at the matching coordinate of `p`
    ///
    /// `p` is clamped into the box first.  If `p` lies on a face, some
    /// children are degenerate; the subdivision engine discards them.
    fn split_at(&self, p: &Point<D>) -> Vec<Self> {
        let base = self.base();
        let lengths = self.lengths();
        let upper = base + lengths;
        let p = p.zip_zip_map(&base, &upper, |v, lo, hi| v.clamp(lo, hi));

        let bits = IndexConverter::<D>::binary();
        (0..bits.len())
            .map(|i| {
                let digits = bits.decode(i);
                let mut child_base = base;
                let mut child_lengths = lengths;
                for d in 0..D {
                    if digits[d] == 0 {
                        child_lengths[d] = p[d] - base[d];
                    } else {
                        child_base[d] = p[d];
                        child_lengths[d] = upper[d] - p[d];
                    }
                }
                Cuboid::from_parts(child_base, child_lengths)
            })
            .collect()
    }
}

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn overlap<const D: usize, P: Primitive<D>>(a: &P, b: &P) -> f64 {
        (0..D)
            .map(|d| {
                let lo = a.base()[d].max(b.base()[d]);
                let hi = (a.base()[d] + a.lengths()[d])
                    .min(b.base()[d] + b.lengths()[d]);
                (hi - lo).max(0.0)
            })
            .product()
    }

    fn check_closure<const D: usize, C: Cell<D>>(parent: &C, children: &[C]) {
        assert_eq!(children.len(), 1 << D);
        let total: f64 = children.iter().map(|c| c.volume()).sum();
        assert_relative_eq!(total, parent.volume(), epsilon = 1e-12);
        for (i, a) in children.iter().enumerate() {
            for b in &children[i + 1..] {
                assert_relative_eq!(overlap(a, b), 0.0, epsilon = 1e-12);
            }
            for k in 0..(1 << D) {
                assert!(parent.contains(&a.corner(k)));
            }
        }
    }

    #[test]
    fn cube_ignores_split_point() {
        let c = Cube::new(Point::<2>::new(2.0, 2.0), 2.0).unwrap();
        let children = c.split_at(&Point::<2>::new(2.1, 3.9));
        assert_eq!(children, c.split());
        let bases = [(2.0, 2.0), (3.0, 2.0), (2.0, 3.0), (3.0, 3.0)];
        for (child, (x, y)) in children.iter().zip(bases) {
            assert_eq!(child.base(), Point::<2>::new(x, y));
            assert_eq!(child.length(), 1.0);
        }
    }

    #[test]
    fn cube_closure() {
        let c = Cube::new(Point::<3>::new(-1.0, 0.5, 3.0), 0.75).unwrap();
        check_closure(&c, &c.split());
    }

    #[test]
    fn box_split() {
        let b = Cuboid::new(
            Point::<2>::new(0.0, 1.0),
            Point::<2>::new(4.0, 2.0),
        )
        .unwrap();
        let children = b.split_at(&Point::<2>::new(1.0, 2.0));
        let expected = [
            ((0.0, 1.0), (1.0, 1.0)),
            ((1.0, 1.0), (3.0, 1.0)),
            ((0.0, 2.0), (1.0, 1.0)),
            ((1.0, 2.0), (3.0, 1.0)),
        ];
        assert_eq!(children.len(), 4);
        for (child, ((bx, by), (lx, ly))) in children.iter().zip(expected) {
            assert_eq!(child.base(), Point::<2>::new(bx, by));
            assert_eq!(child.lengths(), Point::<2>::new(lx, ly));
        }
        check_closure(&b, &children);
    }

    #[test]
    fn box_closure_3d() {
        let b = Cuboid::new(
            Point::<3>::new(-2.0, 0.0, 1.0),
            Point::<3>::new(3.0, 0.5, 7.0),
        )
        .unwrap();
        let children = b.split_at(&Point::<3>::new(-1.25, 0.125, 6.0));
        check_closure(&b, &children);
    }

    #[test]
    fn box_split_point_is_clamped() {
        let size = Point::<2>::new(1.0, 1.0);
        let b = Cuboid::new(Point::<2>::zeros(), size).unwrap();
        let children = b.split_at(&Point::<2>::new(2.0, 0.5));
        check_closure(&b, &children);
        assert!(children[1].is_degenerate());
        assert!(children[3].is_degenerate());
        assert!(!children[0].is_degenerate());
    }
}
