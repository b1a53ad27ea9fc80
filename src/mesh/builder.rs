//! Mesh construction utilities.
//!
//! This module provides functions for building textured meshes from the
//! index lists found in mesh file formats. OBJ-style input indexes positions
//! and UVs separately; PLY and glTF carry one index per corner and split
//! vertices along UV seams, which [`build_welded`] undoes.

use std::collections::HashMap;

use nalgebra::{Point2, Point3};
use tracing::debug;

use super::index::{EdgeId, FaceId, UvId, VertexId};
use super::textured::{Edge, Face, TexturedMesh};
use super::uv::UvSet;
use crate::error::{DensityError, Result};

/// Build a textured mesh from separately indexed positions and UVs.
///
/// # Arguments
/// * `positions` - World-space vertex positions
/// * `uvs` - Texture coordinates
/// * `faces` - Triangles as `[v0, v1, v2]` position indices
/// * `face_uvs` - Triangles as `[t0, t1, t2]` UV indices, one entry per face
///
/// # Example
/// ```
/// use texel_density::mesh::build_textured;
/// use nalgebra::{Point2, Point3};
///
/// let positions = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let uvs = vec![
///     Point2::new(0.0, 0.0),
///     Point2::new(0.1, 0.0),
///     Point2::new(0.05, 0.1),
/// ];
///
/// let mesh = build_textured(&positions, &uvs, &[[0, 1, 2]], &[[0, 1, 2]]).unwrap();
/// assert_eq!(mesh.num_faces(), 1);
/// assert_eq!(mesh.num_edges(), 3);
/// ```
pub fn build_textured(
    positions: &[Point3<f64>],
    uvs: &[Point2<f64>],
    faces: &[[usize; 3]],
    face_uvs: &[[usize; 3]],
) -> Result<TexturedMesh> {
    if faces.is_empty() {
        return Err(DensityError::EmptyMesh);
    }
    if faces.len() != face_uvs.len() {
        return Err(DensityError::invalid_param(
            "face_uvs",
            face_uvs.len(),
            "must have one UV triple per face",
        ));
    }

    // Validate indices
    for (fi, (face, face_uv)) in faces.iter().zip(face_uvs).enumerate() {
        for &vi in face {
            if vi >= positions.len() {
                return Err(DensityError::InvalidVertexIndex { face: fi, vertex: vi });
            }
        }
        for &ti in face_uv {
            if ti >= uvs.len() {
                return Err(DensityError::InvalidUvIndex { face: fi, uv: ti });
            }
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(DensityError::DegenerateFace { face: fi });
        }
    }

    let mesh_faces: Vec<Face> = faces
        .iter()
        .zip(face_uvs)
        .map(|(f, t)| Face {
            vertices: f.map(VertexId::new),
            uvs: t.map(UvId::new),
        })
        .collect();

    // Map from sorted vertex pair to edge ID
    let mut edge_map: HashMap<(usize, usize), EdgeId> = HashMap::with_capacity(faces.len() * 2);
    let mut edges: Vec<Edge> = Vec::with_capacity(faces.len() * 2);

    for (fi, face) in faces.iter().enumerate() {
        for k in 0..3 {
            let a = face[k];
            let b = face[(k + 1) % 3];
            let key = (a.min(b), a.max(b));
            let id = *edge_map.entry(key).or_insert_with(|| {
                edges.push(Edge {
                    vertices: [VertexId::new(key.0), VertexId::new(key.1)],
                    faces: Vec::with_capacity(2),
                });
                EdgeId::new(edges.len() - 1)
            });
            edges[id.index()].faces.push(FaceId::new(fi));
        }
    }

    debug!(
        vertices = positions.len(),
        uvs = uvs.len(),
        faces = faces.len(),
        edges = edges.len(),
        "Built textured mesh"
    );

    Ok(TexturedMesh {
        positions: positions.to_vec(),
        uvs: UvSet::new(uvs.to_vec()),
        faces: mesh_faces,
        edges,
    })
}

/// Build a textured mesh where every vertex carries exactly one UV.
///
/// Positions and UVs share the same index list. Meshes built this way have
/// no seams unless positions are duplicated; see [`build_welded`].
pub fn build_from_triangles(
    positions: &[Point3<f64>],
    uvs: &[Point2<f64>],
    faces: &[[usize; 3]],
) -> Result<TexturedMesh> {
    if positions.len() != uvs.len() {
        return Err(DensityError::invalid_param(
            "uvs",
            uvs.len(),
            "must have one UV per vertex",
        ));
    }
    build_textured(positions, uvs, faces, faces)
}

/// Single-indexed triangle data after welding, ready for [`build_textured`].
#[derive(Debug, Clone, Default)]
pub(crate) struct Welded {
    pub positions: Vec<Point3<f64>>,
    pub uvs: Vec<Point2<f64>>,
    pub faces: Vec<[usize; 3]>,
    pub face_uvs: Vec<[usize; 3]>,
}

/// Exact-bits key; -0.0 and 0.0 must weld together.
fn bits<const N: usize>(coords: [f64; N]) -> [u64; N] {
    coords.map(|c| (c + 0.0).to_bits())
}

/// Merge corners of single-indexed data that share an exact position, and
/// UVs that share an exact coordinate at the same merged position.
///
/// Corners that differ in UV stay separate and become a seam. Corners split
/// for any other reason (normals, colors) collapse back into one UV.
/// Triangles that collapse after merging are dropped.
pub(crate) fn weld(
    positions: &[Point3<f64>],
    uvs: &[Point2<f64>],
    faces: &[[usize; 3]],
) -> Result<Welded> {
    if positions.len() != uvs.len() {
        return Err(DensityError::invalid_param(
            "uvs",
            uvs.len(),
            "must have one UV per vertex",
        ));
    }

    let mut out = Welded {
        faces: Vec::with_capacity(faces.len()),
        face_uvs: Vec::with_capacity(faces.len()),
        ..Welded::default()
    };

    let mut remap: Vec<usize> = Vec::with_capacity(positions.len());
    let mut seen: HashMap<[u64; 3], usize> = HashMap::with_capacity(positions.len());
    for p in positions {
        let idx = *seen.entry(bits([p.x, p.y, p.z])).or_insert_with(|| {
            out.positions.push(*p);
            out.positions.len() - 1
        });
        remap.push(idx);
    }

    let mut uv_index: HashMap<(usize, [u64; 2]), usize> = HashMap::with_capacity(uvs.len());
    for (fi, face) in faces.iter().enumerate() {
        if let Some(&vertex) = face.iter().find(|&&v| v >= positions.len()) {
            return Err(DensityError::InvalidVertexIndex { face: fi, vertex });
        }

        let mapped = face.map(|v| remap[v]);
        if mapped[0] == mapped[1] || mapped[1] == mapped[2] || mapped[0] == mapped[2] {
            continue;
        }

        let mut face_uv = [0usize; 3];
        for k in 0..3 {
            let uv = uvs[face[k]];
            face_uv[k] = *uv_index
                .entry((mapped[k], bits([uv.x, uv.y])))
                .or_insert_with(|| {
                    out.uvs.push(uv);
                    out.uvs.len() - 1
                });
        }

        out.faces.push(mapped);
        out.face_uvs.push(face_uv);
    }

    debug!(
        before = positions.len(),
        after = out.positions.len(),
        uvs = out.uvs.len(),
        dropped_faces = faces.len() - out.faces.len(),
        "Welded vertex positions"
    );

    Ok(out)
}

/// Build a textured mesh from single-indexed data, merging vertices that
/// share an exact position.
///
/// Exporters split a vertex wherever its UV differs between faces, and often
/// for hard normals too. Merging the positions back turns UV splits into
/// proper seams, while splits with identical UVs share one UV again and stay
/// continuous. Triangles that collapse after merging are dropped.
pub fn build_welded(
    positions: &[Point3<f64>],
    uvs: &[Point2<f64>],
    faces: &[[usize; 3]],
) -> Result<TexturedMesh> {
    let welded = weld(positions, uvs, faces)?;
    build_textured(&welded.positions, &welded.uvs, &welded.faces, &welded.face_uvs)
}
