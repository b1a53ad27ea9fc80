//! Textured triangle mesh.
//!
//! Each triangle corner references a world-space vertex and, independently,
//! a UV coordinate. Where a UV seam cuts through the surface, the vertices
//! along it are shared while their UVs are not, which is exactly the
//! information texel density measurement needs to tell interior edges from
//! seam edges.
//!
//! Edges are undirected and unique per vertex pair. They are derived from the
//! faces once, at construction, in order of first appearance.

use nalgebra::{Point2, Point3};

use super::index::{EdgeId, FaceId, UvId, VertexId};
use super::uv::UvSet;
use crate::host::MeshQuery;

/// A triangle with per-corner vertex and UV references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    /// World-space vertex at each corner.
    pub vertices: [VertexId; 3],
    /// UV coordinate at each corner.
    pub uvs: [UvId; 3],
}

/// An undirected mesh edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Endpoints, lower index first.
    pub vertices: [VertexId; 2],
    /// Faces containing this edge. More than two means non-manifold.
    pub faces: Vec<FaceId>,
}

/// A triangle mesh with texture coordinates.
#[derive(Debug, Clone, Default)]
pub struct TexturedMesh {
    pub(crate) positions: Vec<Point3<f64>>,
    pub(crate) uvs: UvSet,
    pub(crate) faces: Vec<Face>,
    pub(crate) edges: Vec<Edge>,
}

impl TexturedMesh {
    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of UV coordinates.
    #[inline]
    pub fn num_uvs(&self) -> usize {
        self.uvs.len()
    }

    /// Get the number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Get the number of undirected edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> Point3<f64> {
        self.positions[v.index()]
    }

    /// Get all vertex positions.
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Get the UV coordinate set.
    pub fn uvs(&self) -> &UvSet {
        &self.uvs
    }

    /// Get the coordinates of a UV.
    #[inline]
    pub fn uv(&self, uv: UvId) -> Point2<f64> {
        self.uvs.get(uv)
    }

    /// Overwrite the coordinates of a UV.
    #[inline]
    pub fn set_uv(&mut self, uv: UvId, coords: Point2<f64>) {
        self.uvs.set(uv, coords);
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, f: FaceId) -> &Face {
        &self.faces[f.index()]
    }

    /// Get an edge by ID.
    #[inline]
    pub fn edge(&self, e: EdgeId) -> &Edge {
        &self.edges[e.index()]
    }

    // ==================== Iterators ====================

    /// Iterate over all face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Iterate over all faces with their IDs.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &Face)> + '_ {
        self.faces
            .iter()
            .enumerate()
            .map(|(i, f)| (FaceId::new(i), f))
    }

    /// Iterate over all edge IDs.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edges.len()).map(EdgeId::new)
    }

    // ==================== Edge queries ====================

    /// World-space length of an edge.
    pub fn edge_length(&self, e: EdgeId) -> f64 {
        let [a, b] = self.edge(e).vertices;
        (self.position(b) - self.position(a)).norm()
    }

    /// Distinct UV ids used at the endpoints of an edge by its incident faces.
    ///
    /// The result lists UVs in face order. Two entries means both sides of
    /// the edge agree on the UVs of both endpoints.
    pub fn edge_uv_ids(&self, e: EdgeId) -> Vec<UvId> {
        let edge = self.edge(e);
        let mut ids: Vec<UvId> = Vec::with_capacity(4);
        for &f in &edge.faces {
            let face = self.face(f);
            for corner in 0..3 {
                if edge.vertices.contains(&face.vertices[corner]) && !ids.contains(&face.uvs[corner])
                {
                    ids.push(face.uvs[corner]);
                }
            }
        }
        ids
    }

    /// Check whether an edge lies inside a single UV shell.
    pub fn is_interior_edge(&self, e: EdgeId) -> bool {
        self.edge_uv_ids(e).len() == 2
    }

    /// Count the edges that lie inside a single UV shell.
    pub fn num_interior_edges(&self) -> usize {
        self.edge_ids().filter(|&e| self.is_interior_edge(e)).count()
    }

    /// Check whether an edge is shared by more than two faces.
    #[inline]
    pub fn is_non_manifold_edge(&self, e: EdgeId) -> bool {
        self.edge(e).faces.len() > 2
    }

    // ==================== Geometry ====================

    /// World-space area of a face.
    pub fn face_area(&self, f: FaceId) -> f64 {
        let [a, b, c] = self.face(f).vertices.map(|v| self.position(v));
        0.5 * (b - a).cross(&(c - a)).norm()
    }

    /// Total world-space surface area.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    /// Total UV-space area.
    pub fn uv_area(&self) -> f64 {
        self.faces.iter().map(|f| self.uvs.triangle_area(f.uvs)).sum()
    }

    /// Compute the world-space bounding box.
    ///
    /// Returns `None` if the mesh is empty.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.positions.first()?;
        let mut min = first;
        let mut max = first;

        for p in &self.positions {
            min = min.inf(p);
            max = max.sup(p);
        }

        Some((min, max))
    }
}

impl MeshQuery for TexturedMesh {
    fn num_edges(&self) -> usize {
        self.edges.len()
    }

    fn edge_vertices(&self, edge: EdgeId) -> [VertexId; 2] {
        self.edge(edge).vertices
    }

    fn vertex_position(&self, vertex: VertexId) -> Point3<f64> {
        self.position(vertex)
    }

    fn edge_uvs(&self, edge: EdgeId) -> Vec<Point2<f64>> {
        self.edge_uv_ids(edge)
            .into_iter()
            .map(|uv| self.uvs.get(uv))
            .collect()
    }
}
