//! Mesh output implementation
use super::Mesh;
use crate::Error;
use std::io::{BufWriter, Write};

impl Mesh<3> {
    /// Writes a binary STL to the given output
    pub fn write_stl<F: Write>(&self, out: &mut F) -> Result<(), Error> {
        // Many small writes, typically to a file
        let mut out = BufWriter::new(out);
        const HEADER: &[u8] = b"Binary STL file exported by Spacetree";
        static_assertions::const_assert!(HEADER.len() <= 80);
        out.write_all(HEADER)?;
        out.write_all(&[0u8; 80 - HEADER.len()])?;
        out.write_all(&(self.faces.len() as u32).to_le_bytes())?;
        for i in 0..self.faces.len() {
            let [a, b, c] = self.face_vertices(i);
            let normal = (b - a).cross(&(c - a));
            for p in &normal {
                out.write_all(&(*p as f32).to_le_bytes())?;
            }
            for v in [a, b, c] {
                for p in &v {
                    out.write_all(&(*p as f32).to_le_bytes())?;
                }
            }
            out.write_all(&[0u8; std::mem::size_of::<u16>()])?; // attributes
        }
        out.flush()?;
        Ok(())
    }
}
