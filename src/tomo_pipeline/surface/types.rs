//! Triangle mesh produced by surface extraction

use std::collections::HashMap;

use glam::Vec3;

/// Triangulated iso-surface in voxel-index space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    /// Vertex indices, counter-clockwise seen from outside
    pub faces: Vec<[u32; 3]>,
    /// One unit normal per face, pointing out of the solid
    pub normals: Vec<Vec3>,
}

impl Mesh {
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Corner positions of face `index`.
    pub fn triangle(&self, index: usize) -> [Vec3; 3] {
        let [a, b, c] = self.faces[index];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }

    /// Every face references existing vertices and has a normal.
    pub fn is_valid(&self) -> bool {
        let n = self.vertices.len();
        self.normals.len() == self.faces.len()
            && self.faces.iter().flatten().all(|&i| (i as usize) < n)
    }

    /// Watertight: every undirected edge is shared by exactly two faces.
    pub fn is_closed(&self) -> bool {
        if self.faces.is_empty() {
            return false;
        }
        let mut edges: HashMap<(u32, u32), u32> = HashMap::new();
        for &[a, b, c] in &self.faces {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                *edges.entry((u.min(v), u.max(v))).or_insert(0) += 1;
            }
        }
        edges.values().all(|&count| count == 2)
    }

    /// Axis-aligned bounds `(min, max)`, `None` for a mesh without vertices.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        )
    }

    /// Enclosed volume by the divergence theorem; positive for outward faces.
    pub fn signed_volume(&self) -> f32 {
        (0..self.faces.len())
            .map(|i| {
                let [a, b, c] = self.triangle(i);
                a.dot(b.cross(c))
            })
            .sum::<f32>()
            / 6.0
    }
}
