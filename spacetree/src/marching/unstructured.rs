//! Explicit primitive sets
use super::PrimitiveGrid;
use crate::{primitive::Primitive, types::Point};

/// A caller-owned slice of primitives
///
/// Corner positions come straight from [`Primitive::corner`].  This is the
/// natural way to mesh the leaves of a
/// [`SpaceTreeNode`](crate::tree::SpaceTreeNode).
#[derive(Copy, Clone, Debug)]
pub struct Unstructured<'a, const D: usize, P> {
    primitives: &'a [P],
}

impl<'a, const D: usize, P: Primitive<D>> Unstructured<'a, D, P> {
    /// Wraps a slice of primitives
    pub fn new(primitives: &'a [P]) -> Self {
        Self { primitives }
    }
}

impl<const D: usize, P: Primitive<D>> PrimitiveGrid<D>
    for Unstructured<'_, D, P>
{
    fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    fn vertex(&self, primitive: usize, corner: usize) -> Point<D> {
        self.primitives[primitive].corner(corner)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::primitive::Cuboid;

    #[test]
    fn corners() {
        let boxes = [
            Cuboid::new(Point::<2>::new(0.0, 0.0), Point::<2>::new(1.0, 2.0))
                .unwrap(),
            Cuboid::new(Point::<2>::new(5.0, 5.0), Point::<2>::new(3.0, 1.0))
                .unwrap(),
        ];
        let u = Unstructured::new(&boxes);
        assert_eq!(u.primitive_count(), 2);
        assert_eq!(u.vertex(0, 3), Point::<2>::new(1.0, 2.0));
        assert_eq!(u.vertex(1, 1), Point::<2>::new(8.0, 5.0));
        assert_eq!(u.vertex(1, 2), Point::<2>::new(5.0, 6.0));
    }
}
