//! glTF format support.
//!
//! This module loads meshes from glTF and GLB files, reading the first
//! texture coordinate set (`TEXCOORD_0`) of every triangle primitive.
//! Positions are placed in world space through the node hierarchy of the
//! default scene, since texel density is measured against world units.
//!
//! Note: Saving to glTF is not supported.

use std::path::Path;

use nalgebra::{Matrix4, Point2, Point3};
use tracing::{debug, warn};

use crate::error::{DensityError, Result};
use crate::mesh::{build_textured, weld, TexturedMesh, Welded};

/// Load a textured mesh from a glTF or GLB file.
///
/// Every mesh instance of the default scene (or the first scene) is combined
/// into a single mesh with its node's world transform applied. Files without
/// scenes load each mesh once, untransformed. Vertices that the exporter
/// split are merged back by position within each primitive; separate
/// primitives are never fused, even where they touch.
///
/// # Errors
///
/// Returns [`DensityError::LoadError`] if the file cannot be imported or
/// contains no textured triangles.
///
/// # Example
///
/// ```no_run
/// use texel_density::io::gltf;
///
/// let mesh = gltf::load("model.gltf").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<TexturedMesh> {
    let path = path.as_ref();

    let (document, buffers, _images) =
        ::gltf::import(path).map_err(|e| DensityError::LoadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut instances: Vec<(::gltf::Mesh<'_>, Matrix4<f64>)> = Vec::new();
    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                collect_instances(&node, &Matrix4::identity(), &mut instances);
            }
        }
        None => {
            instances.extend(document.meshes().map(|m| (m, Matrix4::identity())));
        }
    }

    let mut merged = Welded::default();

    for (mesh, transform) in &instances {
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let (Some(positions), Some(tex_coords)) =
                (reader.read_positions(), reader.read_tex_coords(0))
            else {
                warn!(
                    mesh = mesh.index(),
                    primitive = primitive.index(),
                    "Skipping primitive without positions or texture coordinates"
                );
                continue;
            };

            let positions: Vec<Point3<f64>> = positions
                .map(|p| {
                    let local = Point3::new(f64::from(p[0]), f64::from(p[1]), f64::from(p[2]));
                    transform.transform_point(&local)
                })
                .collect();
            let uvs: Vec<Point2<f64>> = tex_coords
                .into_f32()
                .map(|t| Point2::new(f64::from(t[0]), f64::from(t[1])))
                .collect();
            if uvs.len() != positions.len() {
                return Err(DensityError::LoadError {
                    path: path.to_path_buf(),
                    message: "texture coordinate count does not match vertex count".to_string(),
                });
            }

            let indices: Vec<usize> = match reader.read_indices() {
                Some(indices) => indices.into_u32().map(|i| i as usize).collect(),
                None => (0..positions.len()).collect(),
            };

            let mut faces = Vec::new();
            push_triangles(primitive.mode(), &indices, &mut faces);
            if faces.is_empty() {
                continue;
            }

            let welded = weld(&positions, &uvs, &faces)?;
            debug!(
                mesh = mesh.index(),
                primitive = primitive.index(),
                triangles = welded.faces.len(),
                "Read glTF primitive"
            );
            append(&mut merged, welded);
        }
    }

    if merged.faces.is_empty() {
        return Err(DensityError::LoadError {
            path: path.to_path_buf(),
            message: "glTF file contains no textured triangle meshes".to_string(),
        });
    }

    build_textured(&merged.positions, &merged.uvs, &merged.faces, &merged.face_uvs)
}

/// Walk a node subtree, recording each mesh with its world transform.
fn collect_instances<'a>(
    node: &::gltf::Node<'a>,
    parent: &Matrix4<f64>,
    out: &mut Vec<(::gltf::Mesh<'a>, Matrix4<f64>)>,
) {
    let local: Matrix4<f64> = Matrix4::from(node.transform().matrix()).cast();
    let world = parent * local;
    if let Some(mesh) = node.mesh() {
        out.push((mesh, world));
    }
    for child in node.children() {
        collect_instances(&child, &world, out);
    }
}

/// Append one welded primitive, offsetting its indices.
fn append(merged: &mut Welded, part: Welded) {
    let (vertex_offset, uv_offset) = (merged.positions.len(), merged.uvs.len());
    merged.positions.extend(part.positions);
    merged.uvs.extend(part.uvs);
    merged
        .faces
        .extend(part.faces.iter().map(|f| f.map(|v| v + vertex_offset)));
    merged
        .face_uvs
        .extend(part.face_uvs.iter().map(|f| f.map(|t| t + uv_offset)));
}

/// Convert a primitive's index list to triangles.
fn push_triangles(mode: ::gltf::mesh::Mode, indices: &[usize], faces: &mut Vec<[usize; 3]>) {
    match mode {
        ::gltf::mesh::Mode::Triangles => {
            for chunk in indices.chunks_exact(3) {
                faces.push([chunk[0], chunk[1], chunk[2]]);
            }
        }
        ::gltf::mesh::Mode::TriangleStrip => {
            for i in 0..indices.len().saturating_sub(2) {
                if i % 2 == 0 {
                    faces.push([indices[i], indices[i + 1], indices[i + 2]]);
                } else {
                    // Reverse winding for odd triangles
                    faces.push([indices[i], indices[i + 2], indices[i + 1]]);
                }
            }
        }
        ::gltf::mesh::Mode::TriangleFan => {
            for i in 1..indices.len().saturating_sub(1) {
                faces.push([indices[0], indices[i], indices[i + 1]]);
            }
        }
        _ => {
            // Skip non-triangle primitives (points, lines)
        }
    }
}
