//! A triangle mesh represented as shared vertices and indexed faces, with
//! optional per-vertex normals. Meshes in this crate are values derived from
//! a single object candidate; they are never mutated in place, only extended
//! into new meshes (see [`Mesh::with_added_faces`]).

pub mod boundary;
pub mod triangulate;

use crate::{Point3, UnitVec3};
use parry3d_f64::shape::Triangle;

#[derive(Clone, Debug)]
pub struct Mesh {
    vertices: Vec<Point3>,
    faces: Vec<[u32; 3]>,
    normals: Option<Vec<UnitVec3>>,
}

impl Mesh {
    /// Create a new mesh from vertices, faces, and optional per-vertex
    /// normals. Face indices must be valid for the vertex list and normals,
    /// when present, must match the vertex count; both invariants are
    /// enforced by the constructing code.
    ///
    /// # Arguments
    ///
    /// * `vertices`: the vertex positions
    /// * `faces`: triangles as triples of vertex indices
    /// * `normals`: optional per-vertex normals, same length as `vertices`
    ///
    /// returns: Mesh
    pub fn new(vertices: Vec<Point3>, faces: Vec<[u32; 3]>, normals: Option<Vec<UnitVec3>>) -> Self {
        debug_assert!(
            faces
                .iter()
                .all(|f| f.iter().all(|&i| (i as usize) < vertices.len())),
            "face index out of bounds"
        );
        debug_assert!(
            normals.as_ref().is_none_or(|n| n.len() == vertices.len()),
            "normal count must match vertex count"
        );

        Self {
            vertices,
            faces,
            normals,
        }
    }

    /// The explicitly empty mesh, produced for degenerate candidates.
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            normals: None,
        }
    }

    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    pub fn vertex_normals(&self) -> Option<&[UnitVec3]> {
        self.normals.as_deref()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// The i-th face as a parry triangle, for area/normal queries.
    pub fn triangle(&self, i: usize) -> Triangle {
        let [a, b, c] = self.faces[i];
        Triangle::new(
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        )
    }

    /// The unit normal of the i-th face, or `None` for a degenerate face.
    pub fn face_normal(&self, i: usize) -> Option<UnitVec3> {
        self.triangle(i).normal()
    }

    /// Create a new mesh sharing this mesh's vertices with additional faces
    /// appended. Used by occlusion repair, where fill triangles only ever
    /// reference existing boundary vertices.
    ///
    /// # Arguments
    ///
    /// * `faces`: the faces to append
    ///
    /// returns: Mesh
    pub fn with_added_faces(&self, faces: Vec<[u32; 3]>) -> Mesh {
        let mut all = self.faces.clone();
        all.extend(faces);
        Mesh::new(self.vertices.clone(), all, self.normals.clone())
    }

    /// Create an axis-aligned box mesh with one corner at the origin. The
    /// faces are wound consistently outward and every edge has exactly two
    /// incident faces, which makes this a convenient watertight fixture.
    ///
    /// # Examples
    ///
    /// ```
    /// use recon3d::Mesh;
    /// let mesh = Mesh::create_box(1.0, 1.0, 1.0);
    /// assert_eq!(mesh.vertex_count(), 8);
    /// assert_eq!(mesh.face_count(), 12);
    /// ```
    pub fn create_box(x: f64, y: f64, z: f64) -> Mesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(x, 0.0, 0.0),
            Point3::new(x, y, 0.0),
            Point3::new(0.0, y, 0.0),
            Point3::new(0.0, 0.0, z),
            Point3::new(x, 0.0, z),
            Point3::new(x, y, z),
            Point3::new(0.0, y, z),
        ];

        let faces = vec![
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [2, 3, 7],
            [2, 7, 6],
            [0, 4, 7],
            [0, 7, 3],
            [1, 2, 6],
            [1, 6, 5],
        ];

        Mesh::new(vertices, faces, None)
    }
}
