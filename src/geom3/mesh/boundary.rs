//! Boundary topology of a triangle mesh. A boundary edge is an edge with
//! exactly one incident face; chains of boundary edges are walked into loops,
//! which is how the occlusion stage finds candidate holes.

use super::Mesh;
use crate::common::points::dist;
use std::collections::HashMap;

/// A directed edge on the open boundary of a mesh. The direction is the one
/// the edge has in its single incident face, so a consistently wound mesh
/// produces boundary chains that walk head-to-tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryEdge {
    pub from: u32,
    pub to: u32,
    /// Index of the one face this edge belongs to.
    pub face: usize,
}

/// A chain of connected boundary edges. `closed` is true when the chain
/// returns to its starting vertex.
#[derive(Debug, Clone)]
pub struct BoundaryLoop {
    pub edges: Vec<BoundaryEdge>,
    pub closed: bool,
}

impl BoundaryLoop {
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The vertex indices along the chain, in walk order. For a closed loop
    /// the starting vertex is not repeated at the end.
    pub fn vertices(&self) -> Vec<u32> {
        let mut verts: Vec<u32> = self.edges.iter().map(|e| e.from).collect();
        if !self.closed {
            if let Some(last) = self.edges.last() {
                verts.push(last.to);
            }
        }
        verts
    }

    /// The total length of the chain's edges.
    pub fn perimeter(&self, mesh: &Mesh) -> f64 {
        self.edges
            .iter()
            .map(|e| {
                dist(
                    &mesh.vertices()[e.from as usize],
                    &mesh.vertices()[e.to as usize],
                )
            })
            .sum()
    }
}

/// Collect the directed boundary edges of a mesh: the edges with exactly one
/// incident face, directed as they appear in that face.
pub fn boundary_edges(mesh: &Mesh) -> Vec<BoundaryEdge> {
    let mut incidence: HashMap<(u32, u32), u32> = HashMap::new();
    for face in mesh.faces() {
        for (a, b) in face_edges(face) {
            *incidence.entry(undirected(a, b)).or_insert(0) += 1;
        }
    }

    let mut result = Vec::new();
    for (fi, face) in mesh.faces().iter().enumerate() {
        for (a, b) in face_edges(face) {
            if incidence[&undirected(a, b)] == 1 {
                result.push(BoundaryEdge {
                    from: a,
                    to: b,
                    face: fi,
                });
            }
        }
    }
    result
}

/// Walk the boundary edges of a mesh into connected chains. Chains that
/// return to their starting vertex are marked closed; a mesh with no
/// boundary edges (watertight) yields no loops.
pub fn boundary_loops(mesh: &Mesh) -> Vec<BoundaryLoop> {
    let edges = boundary_edges(mesh);

    let mut by_start: HashMap<u32, Vec<usize>> = HashMap::new();
    for (i, e) in edges.iter().enumerate() {
        by_start.entry(e.from).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut loops = Vec::new();

    for start in 0..edges.len() {
        if used[start] {
            continue;
        }

        let mut chain = vec![edges[start]];
        used[start] = true;
        let first = edges[start].from;
        let mut cursor = edges[start].to;

        while cursor != first {
            let next = by_start
                .get(&cursor)
                .and_then(|c| c.iter().find(|&&i| !used[i]).copied());

            match next {
                Some(i) => {
                    used[i] = true;
                    cursor = edges[i].to;
                    chain.push(edges[i]);
                }
                None => break,
            }
        }

        loops.push(BoundaryLoop {
            closed: cursor == first,
            edges: chain,
        });
    }

    loops
}

fn face_edges(face: &[u32; 3]) -> [(u32, u32); 3] {
    [
        (face[0], face[1]),
        (face[1], face[2]),
        (face[2], face[0]),
    ]
}

fn undirected(a: u32, b: u32) -> (u32, u32) {
    if a < b { (a, b) } else { (b, a) }
}
