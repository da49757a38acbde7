//! STL export of candidate meshes, for viewing checkpoint artifacts in
//! standard mesh tools. STL is a lossy f32 format and exists purely for
//! inspection; the lossless audit data is the `.bpc` clouds.

use crate::{Mesh, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Write a mesh as a binary STL file.
///
/// # Arguments
///
/// * `path`: the file to write
/// * `mesh`: the mesh to export
///
/// returns: Result<(), ReconError>
pub fn write_stl(path: &Path, mesh: &Mesh) -> Result<()> {
    let mut triangles = Vec::with_capacity(mesh.face_count());
    for i in 0..mesh.face_count() {
        let tri = mesh.triangle(i);
        let normal = tri
            .normal()
            .map(|n| [n.x as f32, n.y as f32, n.z as f32])
            .unwrap_or([0.0, 0.0, 0.0]);

        triangles.push(stl_io::Triangle {
            normal: stl_io::Normal::new(normal),
            vertices: [
                stl_io::Vertex::new([tri.a.x as f32, tri.a.y as f32, tri.a.z as f32]),
                stl_io::Vertex::new([tri.b.x as f32, tri.b.y as f32, tri.b.z as f32]),
                stl_io::Vertex::new([tri.c.x as f32, tri.c.y as f32, tri.c.z as f32]),
            ],
        });
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    stl_io::write_stl(&mut writer, triangles.iter())?;
    Ok(())
}
