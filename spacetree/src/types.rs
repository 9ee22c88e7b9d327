//! Shared point type and index arithmetic

/// A position (or extent) in `D`-dimensional space
pub type Point<const D: usize> = nalgebra::SVector<f64, D>;

/// Converts between linear indices and per-axis coordinates
///
/// Each axis `d` has its own radix `radices[d]`; axis 0 is the
/// least-significant digit.  With a uniform radix of 2, digit `d` of an index
/// is simply bit `d`, which is how cell corners and children are numbered:
///
/// ```text
///         6 -------- 7
///        /          /       Z
///       / |        / |      ^  _ Y
///      4----------5  |      | /
///      |  |       |  |      |/
///      |  2-------|--3      ---> X
///      | /        | /
///      |/         |/
///      0----------1
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct IndexConverter<const D: usize> {
    radices: [usize; D],
}

impl<const D: usize> IndexConverter<D> {
    /// Builds a converter with a separate radix on each axis
    pub const fn new(radices: [usize; D]) -> Self {
        Self { radices }
    }

    /// Builds a converter with the same radix on every axis
    pub const fn uniform(radix: usize) -> Self {
        Self { radices: [radix; D] }
    }

    /// Builds the base-2 converter used to number corners and children
    pub const fn binary() -> Self {
        Self::uniform(2)
    }

    /// Returns the number of distinct indices
    pub fn len(&self) -> usize {
        self.radices.iter().product()
    }

    /// Checks whether this converter addresses no indices at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Splits a linear index into per-axis coordinates
    ///
    /// Indices past [`len`](Self::len) wrap around on the last axis.
    pub fn decode(&self, mut index: usize) -> [usize; D] {
        let mut out = [0; D];
        for (o, r) in out.iter_mut().zip(&self.radices) {
            *o = index % r;
            index /= r;
        }
        out
    }

    /// Packs per-axis coordinates into a linear index
    pub fn encode(&self, coords: [usize; D]) -> usize {
        (0..D)
            .rev()
            .fold(0, |acc, d| acc * self.radices[d] + coords[d])
    }

    /// Splits a linear index into coordinates, starting from the last axis
    ///
    /// Returns `None` unless the decode consumes the index exactly, i.e. the
    /// index is in the `0..len()` range.
    pub fn decode_checked(&self, index: usize) -> Option<[usize; D]> {
        let mut strides = [1; D];
        for d in 1..D {
            strides[d] = strides[d - 1] * self.radices[d - 1];
        }
        let mut out = [0; D];
        let mut rem = index;
        for d in (0..D).rev() {
            out[d] = rem / strides[d];
            rem -= out[d] * strides[d];
        }
        let in_range = out.iter().zip(&self.radices).all(|(c, r)| c < r);
        (rem == 0 && in_range).then_some(out)
    }
}

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn binary_digits_are_bits() {
        let c = IndexConverter::<3>::binary();
        assert_eq!(c.len(), 8);
        for i in 0..8 {
            let d = c.decode(i);
            for (axis, bit) in d.iter().enumerate() {
                assert_eq!(*bit, (i >> axis) & 1);
            }
        }
    }

    #[test]
    fn mixed_radix() {
        let c = IndexConverter::new([3, 4, 5]);
        assert_eq!(c.len(), 60);
        assert_eq!(c.decode(0), [0, 0, 0]);
        assert_eq!(c.decode(1), [1, 0, 0]);
        assert_eq!(c.decode(3), [0, 1, 0]);
        assert_eq!(c.decode(12), [0, 0, 1]);
        assert_eq!(c.decode(59), [2, 3, 4]);
        for i in 0..c.len() {
            assert_eq!(c.encode(c.decode(i)), i);
            assert_eq!(c.decode_checked(i), Some(c.decode(i)));
        }
    }

    #[test]
    fn checked_decode_rejects_overflow() {
        let c = IndexConverter::new([3, 4]);
        assert_eq!(c.decode_checked(11), Some([2, 3]));
        assert_eq!(c.decode_checked(12), None);
        assert_eq!(c.decode_checked(100), None);
    }
}
