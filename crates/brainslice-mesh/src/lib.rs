#![warn(missing_docs)]

//! Region surface meshes for the brainslice heatmap engine.
//!
//! A [`RegionMesh`] is the triangulated surface of one named atlas region.
//! The slicing engine only reads these meshes; building them (mesh
//! generation, smoothing, registration) is the atlas provider's job.
//!
//! Synthetic shapes ([`RegionMesh::cuboid`], [`RegionMesh::uv_sphere`],
//! [`RegionMesh::quad`]) are provided for plane actors and test fixtures.

use std::collections::HashMap;
use std::f64::consts::PI;

use brainslice_math::{BoundingBox3, Point3, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while assembling a mesh from raw buffers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// Vertex buffer length is not a multiple of 3.
    #[error("vertex buffer length {0} is not a multiple of 3")]
    MalformedVertices(usize),

    /// Index buffer length is not a multiple of 3.
    #[error("index buffer length {0} is not a multiple of 3")]
    MalformedIndices(usize),

    /// A triangle references a vertex that does not exist.
    #[error("triangle index {index} out of range (mesh has {num_vertices} vertices)")]
    IndexOutOfRange {
        /// The offending index.
        index: u32,
        /// Number of vertices in the mesh.
        num_vertices: usize,
    },

    /// A vertex coordinate is NaN or infinite.
    #[error("vertex {0} has a non-finite coordinate")]
    NonFiniteVertex(usize),
}

/// Indexed triangle surface of one region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionMesh {
    /// Flat array of vertex positions: `[x0, y0, z0, x1, y1, z1, ...]`.
    pub vertices: Vec<f64>,
    /// Flat array of triangle indices: `[i0, i1, i2, ...]`.
    pub indices: Vec<u32>,
}

impl RegionMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Build a mesh from raw buffers, checking that they are consistent.
    pub fn from_buffers(vertices: Vec<f64>, indices: Vec<u32>) -> Result<Self, MeshError> {
        let mesh = Self { vertices, indices };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Check buffer lengths, index ranges and coordinate finiteness.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.vertices.len() % 3 != 0 {
            return Err(MeshError::MalformedVertices(self.vertices.len()));
        }
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::MalformedIndices(self.indices.len()));
        }
        let num_vertices = self.num_vertices();
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= num_vertices) {
            return Err(MeshError::IndexOutOfRange {
                index,
                num_vertices,
            });
        }
        if let Some(pos) = self.vertices.iter().position(|c| !c.is_finite()) {
            return Err(MeshError::NonFiniteVertex(pos / 3));
        }
        Ok(())
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Whether the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Position of vertex `i`.
    pub fn vertex(&self, i: usize) -> Point3 {
        Point3::new(
            self.vertices[i * 3],
            self.vertices[i * 3 + 1],
            self.vertices[i * 3 + 2],
        )
    }

    /// The three corners of triangle `t`.
    pub fn triangle(&self, t: usize) -> [Point3; 3] {
        [
            self.vertex(self.indices[t * 3] as usize),
            self.vertex(self.indices[t * 3 + 1] as usize),
            self.vertex(self.indices[t * 3 + 2] as usize),
        ]
    }

    /// Iterate over all triangles as corner triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3; 3]> + '_ {
        (0..self.num_triangles()).map(move |t| self.triangle(t))
    }

    /// Append a vertex, returning its index.
    pub fn push_vertex(&mut self, p: Point3) -> u32 {
        let index = self.num_vertices() as u32;
        self.vertices.extend_from_slice(&[p.x, p.y, p.z]);
        index
    }

    /// Append a triangle by vertex indices.
    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Merge another mesh into this one.
    pub fn merge(&mut self, other: &RegionMesh) {
        let offset = self.num_vertices() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices
            .extend(other.indices.iter().map(|&i| i + offset));
    }

    /// A copy of this mesh moved by `offset`.
    pub fn translated(&self, offset: Vec3) -> Self {
        let mut vertices = self.vertices.clone();
        for chunk in vertices.chunks_exact_mut(3) {
            chunk[0] += offset.x;
            chunk[1] += offset.y;
            chunk[2] += offset.z;
        }
        Self {
            vertices,
            indices: self.indices.clone(),
        }
    }

    /// Axis-aligned bounds of all vertices, or `None` for a mesh without vertices.
    pub fn bounds(&self) -> Option<BoundingBox3> {
        if self.vertices.is_empty() {
            return None;
        }
        let mut bb = BoundingBox3::empty();
        for i in 0..self.num_vertices() {
            bb.include_point(&self.vertex(i));
        }
        Some(bb)
    }

    /// Split the surface into connected pieces.
    ///
    /// Triangles are connected when they share a vertex index or a vertex
    /// position, so unwelded seams still join. Pieces come out in the order
    /// of their first triangle. Triangles with out-of-range indices are
    /// skipped.
    pub fn components(&self) -> Vec<RegionMesh> {
        let num_vertices = self.num_vertices();
        let mut parent: Vec<usize> = (0..num_vertices).collect();

        let mut by_position: HashMap<[u64; 3], usize> = HashMap::new();
        for i in 0..num_vertices {
            let p = self.vertex(i);
            // `+ 0.0` folds -0.0 into 0.0 before taking the bits.
            let key = [(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()];
            let first = *by_position.entry(key).or_insert(i);
            join(&mut parent, first, i);
        }

        let triangles: Vec<[usize; 3]> = self
            .indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
            .filter(|t| t.iter().all(|&i| i < num_vertices))
            .collect();
        for t in &triangles {
            join(&mut parent, t[0], t[1]);
            join(&mut parent, t[1], t[2]);
        }

        let mut piece_of_root: HashMap<usize, usize> = HashMap::new();
        let mut pieces: Vec<(RegionMesh, HashMap<usize, u32>)> = Vec::new();
        for t in &triangles {
            let root = find(&mut parent, t[0]);
            let piece = *piece_of_root.entry(root).or_insert_with(|| {
                pieces.push((RegionMesh::new(), HashMap::new()));
                pieces.len() - 1
            });
            let (mesh, remap) = &mut pieces[piece];
            let [a, b, c] = t.map(|i| {
                *remap
                    .entry(i)
                    .or_insert_with(|| mesh.push_vertex(self.vertex(i)))
            });
            mesh.push_triangle(a, b, c);
        }
        pieces.into_iter().map(|(mesh, _)| mesh).collect()
    }

    /// Axis-aligned box between two corners, 8 vertices and 12 outward-facing triangles.
    pub fn cuboid(min: Point3, max: Point3) -> Self {
        let vertices = vec![
            // Bottom face (z=min)
            min.x, min.y, min.z, max.x, min.y, min.z, max.x, max.y, min.z, min.x, max.y, min.z,
            // Top face (z=max)
            min.x, min.y, max.z, max.x, min.y, max.z, max.x, max.y, max.z, min.x, max.y, max.z,
        ];
        let indices = vec![
            0, 2, 1, 0, 3, 2, // bottom
            4, 5, 6, 4, 6, 7, // top
            0, 1, 5, 0, 5, 4, // front
            2, 3, 7, 2, 7, 6, // back
            0, 4, 7, 0, 7, 3, // left
            1, 2, 6, 1, 6, 5, // right
        ];
        Self { vertices, indices }
    }

    /// Closed UV sphere with shared seam and pole vertices.
    ///
    /// `segments` is the number of longitude divisions, `rings` the number of
    /// latitude bands. Both are clamped to sensible minimums.
    pub fn uv_sphere(center: Point3, radius: f64, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut mesh = Self::new();

        let north = mesh.push_vertex(center + Vec3::new(0.0, 0.0, radius));
        for ring in 1..rings {
            let theta = PI * ring as f64 / rings as f64;
            let (sin_t, cos_t) = theta.sin_cos();
            for seg in 0..segments {
                let phi = 2.0 * PI * seg as f64 / segments as f64;
                let (sin_p, cos_p) = phi.sin_cos();
                mesh.push_vertex(
                    center + Vec3::new(radius * sin_t * cos_p, radius * sin_t * sin_p, radius * cos_t),
                );
            }
        }
        let south = mesh.push_vertex(center - Vec3::new(0.0, 0.0, radius));

        let ring_start = |ring: u32| 1 + (ring - 1) * segments;

        // North cap
        for seg in 0..segments {
            let a = ring_start(1) + seg;
            let b = ring_start(1) + (seg + 1) % segments;
            mesh.push_triangle(north, a, b);
        }

        // Bands between consecutive rings
        for ring in 1..rings - 1 {
            let upper = ring_start(ring);
            let lower = ring_start(ring + 1);
            for seg in 0..segments {
                let next = (seg + 1) % segments;
                mesh.push_triangle(upper + seg, lower + seg, lower + next);
                mesh.push_triangle(upper + seg, lower + next, upper + next);
            }
        }

        // South cap
        let last = ring_start(rings - 1);
        for seg in 0..segments {
            let a = last + seg;
            let b = last + (seg + 1) % segments;
            mesh.push_triangle(south, b, a);
        }

        mesh
    }

    /// Square quad centered at `center`, spanned by unit directions `u` and `v`.
    ///
    /// `size` is the full edge length. The quad faces `u × v`.
    pub fn quad(center: Point3, u: Vec3, v: Vec3, size: f64) -> Self {
        let h = size / 2.0;
        let mut mesh = Self::new();
        let a = mesh.push_vertex(center - u * h - v * h);
        let b = mesh.push_vertex(center + u * h - v * h);
        let c = mesh.push_vertex(center + u * h + v * h);
        let d = mesh.push_vertex(center - u * h + v * h);
        mesh.push_triangle(a, b, c);
        mesh.push_triangle(a, c, d);
        mesh
    }
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn join(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[ra.max(rb)] = ra.min(rb);
    }
}
