//! Textured mesh file I/O.
//!
//! This module provides functions for loading and saving UV-mapped meshes in
//! various formats.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | Wavefront OBJ | `.obj` | ✓ | ✓ | Separate position and UV indices, seams kept |
//! | PLY | `.ply` | ✓ | ✓ | Per-vertex `u`/`v`, `s`/`t` or `texture_u`/`texture_v` |
//! | glTF | `.gltf`, `.glb` | ✓ | ✗ | First texture coordinate set |
//!
//! Single-indexed formats (PLY, glTF) split vertices along UV seams. Loading
//! merges vertices with identical positions back together so seams are seen
//! as seams; see [`build_welded`](crate::mesh::build_welded).
//!
//! # Usage
//!
//! ```no_run
//! use texel_density::io::{load, save};
//!
//! let mesh = load("model.obj").unwrap();
//! save(&mesh, "output.ply").unwrap();
//! ```

pub mod gltf;
pub mod obj;
pub mod ply;

use std::path::Path;

use tracing::info;

use crate::error::{DensityError, Result};
use crate::mesh::TexturedMesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ format.
    Obj,
    /// PLY (Stanford polygon) format.
    Ply,
    /// glTF format.
    Gltf,
    /// glTF binary format.
    Glb,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            "ply" => Some(Format::Ply),
            "gltf" => Some(Format::Gltf),
            "glb" => Some(Format::Glb),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

fn detect(path: &Path) -> Result<Format> {
    Format::from_path(path).ok_or_else(|| DensityError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load a textured mesh with automatic format detection.
///
/// The format is determined by the file extension.
///
/// # Errors
///
/// - [`DensityError::UnsupportedFormat`] for an unknown extension
/// - [`DensityError::LoadError`] if the file cannot be parsed or has no UVs
pub fn load<P: AsRef<Path>>(path: P) -> Result<TexturedMesh> {
    let path = path.as_ref();
    let mesh = match detect(path)? {
        Format::Obj => obj::load(path)?,
        Format::Ply => ply::load(path)?,
        Format::Gltf | Format::Glb => gltf::load(path)?,
    };

    info!(
        path = %path.display(),
        vertices = mesh.num_vertices(),
        uvs = mesh.num_uvs(),
        faces = mesh.num_faces(),
        "Loaded mesh"
    );
    Ok(mesh)
}

/// Save a textured mesh with automatic format detection.
///
/// # Errors
///
/// - [`DensityError::UnsupportedFormat`] for an unknown extension
/// - [`DensityError::SaveError`] for glTF, which is load-only
/// - [`DensityError::Io`] if writing fails
pub fn save<P: AsRef<Path>>(mesh: &TexturedMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Obj => obj::save(mesh, path)?,
        Format::Ply => ply::save(mesh, path)?,
        Format::Gltf | Format::Glb => {
            return Err(DensityError::SaveError {
                path: path.to_path_buf(),
                message: "glTF saving is not supported".to_string(),
            })
        }
    }

    info!(path = %path.display(), faces = mesh.num_faces(), "Saved mesh");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path("a/b/model.OBJ"), Some(Format::Obj));
        assert_eq!(Format::from_path("scan.ply"), Some(Format::Ply));
        assert_eq!(Format::from_path("scene.glb"), Some(Format::Glb));
        assert_eq!(Format::from_path("part.stl"), None);
        assert_eq!(Format::from_path("noext"), None);
    }

    #[test]
    fn test_unsupported_extension() {
        match load("mesh.stl") {
            Err(DensityError::UnsupportedFormat { extension }) => assert_eq!(extension, "stl"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_gltf_save_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mesh = crate::mesh::build_from_triangles(
            &[
                nalgebra::Point3::new(0.0, 0.0, 0.0),
                nalgebra::Point3::new(1.0, 0.0, 0.0),
                nalgebra::Point3::new(0.0, 1.0, 0.0),
            ],
            &[
                nalgebra::Point2::new(0.0, 0.0),
                nalgebra::Point2::new(1.0, 0.0),
                nalgebra::Point2::new(0.0, 1.0),
            ],
            &[[0, 1, 2]],
        )
        .unwrap();

        let result = save(&mesh, dir.path().join("out.gltf"));
        assert!(matches!(result, Err(DensityError::SaveError { .. })));
    }
}
