use std::io::{self, Write};

/// Triangle mesh used for export.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeomMesh {
    pub positions: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
}

impl GeomMesh {
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Append another mesh, offsetting its indices.
    pub fn append(&mut self, other: &Self) {
        let base = u32::try_from(self.positions.len()).unwrap_or(u32::MAX);
        self.positions.extend_from_slice(&other.positions);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Check the buffers for a well-formed triangle list.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.indices.len() % 3 != 0 {
            return Err("mesh indices are not a triangle list (len % 3 != 0)".to_string());
        }
        if self.positions.iter().flatten().any(|c| !c.is_finite()) {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        let n = self.positions.len();
        if self.indices.iter().any(|&i| i as usize >= n) {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        Ok(())
    }

    /// Write the mesh as a Wavefront OBJ object named `name`.
    ///
    /// # Errors
    /// Propagates I/O errors from the writer.
    pub fn write_obj<W: Write>(&self, w: &mut W, name: &str) -> io::Result<()> {
        writeln!(w, "o {name}")?;
        for p in &self.positions {
            writeln!(w, "v {} {} {}", p[0], p[1], p[2])?;
        }
        for tri in self.indices.chunks_exact(3) {
            writeln!(w, "f {} {} {}", tri[0] + 1, tri[1] + 1, tri[2] + 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_offsets_indices() {
        let mut a = GeomMesh::new(vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], vec![0, 1, 2]);
        let b = a.clone();
        a.append(&b);
        assert_eq!(a.indices, vec![0, 1, 2, 3, 4, 5]);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_bounds() {
        let mesh = GeomMesh::new(vec![[0.0; 3]], vec![0, 0, 1]);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn obj_output_is_one_based() {
        let mesh = GeomMesh::new(vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]], vec![0, 2, 1]);
        let mut out = Vec::new();
        mesh.write_obj(&mut out, "plane").expect("write to vec");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with("o plane\n"));
        assert!(text.contains("f 1 3 2"));
    }
}
