//! Edge and connectivity tables for marching squares and marching cubes
//!
//! The tables are generated by `build.rs`.  Corners are numbered with bit `d`
//! selecting the upper side of axis `d`, matching
//! [`Primitive::corner`](crate::primitive::Primitive::corner).
use crate::Error;

include!(concat!(env!("OUT_DIR"), "/marching_tables.rs"));

/// Lookup tables used by the marching engine
///
/// `edges` maps an edge index to the pair of corners it connects.
/// `connectivity` is indexed by a corner configuration (bit `v` set if corner
/// `v` is outside) and lists the output fragments for that configuration, each
/// given as `D` edge indices.
#[derive(Copy, Clone, Debug)]
pub struct Tables<'a, const D: usize> {
    edges: &'a [[usize; 2]],
    connectivity: &'a [&'a [[usize; D]]],
}

impl<'a, const D: usize> Tables<'a, D> {
    /// Builds a custom set of tables, checking them for consistency
    ///
    /// There must be one connectivity entry per corner configuration (i.e.
    /// `2^(2^D)` entries), every edge must join two distinct corners, and
    /// every fragment must refer to valid edges.
    pub fn new(
        edges: &'a [[usize; 2]],
        connectivity: &'a [&'a [[usize; D]]],
    ) -> Result<Self, Error> {
        let corners = 1usize
            .checked_shl(D as u32)
            .ok_or(Error::BadTable("too many dimensions"))?;
        let configs = 1usize
            .checked_shl(corners as u32)
            .ok_or(Error::BadTable("too many corners"))?;
        if connectivity.len() != configs {
            return Err(Error::BadTable("wrong number of configurations"));
        }
        if edges.iter().any(|&[a, b]| a == b || a >= corners || b >= corners) {
            return Err(Error::BadTable("invalid edge"));
        }
        if connectivity
            .iter()
            .flat_map(|c| c.iter().flatten())
            .any(|e| *e >= edges.len())
        {
            return Err(Error::BadTable("invalid edge index"));
        }
        Ok(Self {
            edges,
            connectivity,
        })
    }

    /// Returns the edge table
    pub fn edges(&self) -> &'a [[usize; 2]] {
        self.edges
    }

    /// Returns the fragments for a given corner configuration
    pub fn fragments(&self, config: usize) -> &'a [[usize; D]] {
        self.connectivity[config]
    }
}

impl Tables<'static, 2> {
    /// Standard marching squares tables (4 edges, 16 configurations)
    pub fn marching_squares() -> Self {
        Self {
            edges: &SQUARE_EDGES,
            connectivity: &MARCHING_SQUARES,
        }
    }
}

impl Tables<'static, 3> {
    /// Standard marching cubes tables (12 edges, 256 configurations)
    pub fn marching_cubes() -> Self {
        Self {
            edges: &CUBE_EDGES,
            connectivity: &MARCHING_CUBES,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn standard_tables_are_valid() {
        Tables::new(&SQUARE_EDGES, &MARCHING_SQUARES).unwrap();
        Tables::new(&CUBE_EDGES, &MARCHING_CUBES).unwrap();
    }

    #[test]
    fn edges_are_axis_aligned() {
        for [a, b] in SQUARE_EDGES.iter().chain(&CUBE_EDGES) {
            assert_eq!((a ^ b).count_ones(), 1);
        }
    }

    #[test]
    fn uniform_configurations_are_empty() {
        assert!(MARCHING_SQUARES[0].is_empty());
        assert!(MARCHING_SQUARES[15].is_empty());
        assert!(MARCHING_CUBES[0].is_empty());
        assert!(MARCHING_CUBES[255].is_empty());
    }

    #[test]
    fn fragments_cross_the_surface() {
        // Every edge used by a fragment joins an inside and an outside corner
        for (config, frags) in MARCHING_CUBES.iter().enumerate() {
            for e in frags.iter().flatten() {
                let [a, b] = CUBE_EDGES[*e];
                assert_ne!(config & (1 << a) == 0, config & (1 << b) == 0);
            }
        }
        for (config, frags) in MARCHING_SQUARES.iter().enumerate() {
            for e in frags.iter().flatten() {
                let [a, b] = SQUARE_EDGES[*e];
                assert_ne!(config & (1 << a) == 0, config & (1 << b) == 0);
            }
        }
    }

    #[test]
    fn single_corner_cases() {
        for corner in 0..8 {
            let frags = MARCHING_CUBES[1 << corner];
            assert_eq!(frags.len(), 1);
            let frags = MARCHING_CUBES[255 ^ (1 << corner)];
            assert_eq!(frags.len(), 1);
        }
    }

    #[test]
    fn bad_tables() {
        let edges = [[0, 1], [1, 1]];
        let conn: [&[[usize; 2]]; 16] = [&[]; 16];
        assert!(matches!(
            Tables::new(&edges, &conn),
            Err(Error::BadTable(_))
        ));
        let conn: [&[[usize; 2]]; 4] = [&[]; 4];
        assert!(matches!(
            Tables::new(&SQUARE_EDGES, &conn),
            Err(Error::BadTable(_))
        ));
    }
}
