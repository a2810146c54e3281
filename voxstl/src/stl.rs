//! ASCII STL serialization.

use std::io::{self, Write};

use crate::buffer::TriangleBuffer;

/// Write `mesh` to `w` as an ASCII STL solid named `name`, skipping
/// deleted triangles. Returns the number of facets written.
///
/// Normals are the six literal axis vectors and vertices are plain
/// unsigned decimals, so the output is exact, there is no float
/// formatting involved anywhere.
pub fn write_ascii(w: &mut impl Write, name: &str, mesh: &TriangleBuffer) -> io::Result<usize> {
    writeln!(w, "solid {name}")?;

    let mut count = 0;
    for tri in mesh.iter() {
        let [nx, ny, nz] = tri.normal.vector();
        writeln!(w, "facet normal {nx} {ny} {nz}")?;
        writeln!(w, "outer loop")?;
        for p in [tri.a, tri.b, tri.c] {
            let (x, y, z) = p.unpack();
            writeln!(w, "vertex {x} {y} {z}")?;
        }
        writeln!(w, "endloop")?;
        writeln!(w, "endfacet")?;
        count += 1;
    }

    writeln!(w, "endsolid {name}")?;
    Ok(count)
}
