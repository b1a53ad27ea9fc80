//! Wavefront OBJ format support.
//!
//! OBJ faces index positions and texture coordinates separately
//! (`f v/vt v/vt v/vt`), so seams survive loading unchanged.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::{Point2, Point3};
use tracing::debug;

use crate::error::{DensityError, Result};
use crate::mesh::{build_textured, TexturedMesh};

/// Load a textured mesh from an OBJ file.
///
/// Polygons are triangulated and all objects in the file are merged into
/// one mesh.
///
/// # Errors
///
/// Returns [`DensityError::LoadError`] if the file cannot be parsed, has no
/// faces, or any object lacks texture coordinates.
///
/// # Example
///
/// ```no_run
/// use texel_density::io::obj;
///
/// let mesh = obj::load("model.obj").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<TexturedMesh> {
    let path = path.as_ref();
    let load_error = |message: String| DensityError::LoadError {
        path: path.to_path_buf(),
        message,
    };

    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: false,
            ..Default::default()
        },
    )
    .map_err(|e| load_error(e.to_string()))?;

    let mut positions: Vec<Point3<f64>> = Vec::new();
    let mut uvs: Vec<Point2<f64>> = Vec::new();
    let mut faces: Vec<[usize; 3]> = Vec::new();
    let mut face_uvs: Vec<[usize; 3]> = Vec::new();

    for model in &models {
        let obj_mesh = &model.mesh;
        if obj_mesh.indices.is_empty() {
            continue;
        }
        if obj_mesh.texcoords.is_empty()
            || obj_mesh.texcoord_indices.len() != obj_mesh.indices.len()
        {
            return Err(load_error(format!(
                "object '{}' has no texture coordinates",
                model.name
            )));
        }

        let vertex_offset = positions.len();
        let uv_offset = uvs.len();

        for chunk in obj_mesh.positions.chunks_exact(3) {
            positions.push(Point3::new(
                f64::from(chunk[0]),
                f64::from(chunk[1]),
                f64::from(chunk[2]),
            ));
        }
        for chunk in obj_mesh.texcoords.chunks_exact(2) {
            uvs.push(Point2::new(f64::from(chunk[0]), f64::from(chunk[1])));
        }

        for (tri, tex) in obj_mesh
            .indices
            .chunks_exact(3)
            .zip(obj_mesh.texcoord_indices.chunks_exact(3))
        {
            faces.push([
                tri[0] as usize + vertex_offset,
                tri[1] as usize + vertex_offset,
                tri[2] as usize + vertex_offset,
            ]);
            face_uvs.push([
                tex[0] as usize + uv_offset,
                tex[1] as usize + uv_offset,
                tex[2] as usize + uv_offset,
            ]);
        }

        debug!(
            name = %model.name,
            faces = obj_mesh.indices.len() / 3,
            "Read OBJ object"
        );
    }

    if faces.is_empty() {
        return Err(load_error("OBJ file contains no faces".to_string()));
    }

    build_textured(&positions, &uvs, &faces, &face_uvs)
}

/// Save a textured mesh to an OBJ file.
///
/// Positions and texture coordinates are written with their own indices, so
/// seams are preserved exactly.
///
/// # Example
///
/// ```no_run
/// # use texel_density::mesh::TexturedMesh;
/// # fn get_mesh() -> TexturedMesh { unimplemented!() }
/// use texel_density::io::obj;
///
/// let mesh = get_mesh();
/// obj::save(&mesh, "output.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>>(mesh: &TexturedMesh, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "# Generated by texel-density")?;
    for p in mesh.positions() {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for uv in mesh.uvs().as_slice() {
        writeln!(writer, "vt {} {}", uv.x, uv.y)?;
    }
    for (_, face) in mesh.faces() {
        // OBJ indices are 1-based
        write!(writer, "f")?;
        for (v, t) in face.vertices.iter().zip(&face.uvs) {
            write!(writer, " {}/{}", v.index() + 1, t.index() + 1)?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::TexelDensityTool;

    const SEAMED_SQUARE: &str = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 0.1 0
vt 0.1 0.1
vt 0.5 0.5
vt 0.6 0.6
vt 0.5 0.6
f 1/1 2/2 3/3
f 1/4 3/5 4/6
";

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_keeps_seams() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "square.obj", SEAMED_SQUARE);

        let mesh = load(&path).unwrap();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_uvs(), 6);
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_edges(), 5);
        // The shared diagonal carries four distinct UVs
        assert_eq!(mesh.num_interior_edges(), 4);
    }

    #[test]
    fn test_quads_are_triangulated() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "quad.obj",
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
             vt 0 0\nvt 0.1 0\nvt 0.1 0.1\nvt 0 0.1\n\
             f 1/1 2/2 3/3 4/4\n",
        );

        let mesh = load(&path).unwrap();
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(TexelDensityTool::default().measure(Some(&mesh)).unwrap(), 205);
    }

    #[test]
    fn test_missing_texcoords_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "plain.obj", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");

        assert!(matches!(load(&path), Err(DensityError::LoadError { .. })));
    }

    #[test]
    fn test_save_then_load_preserves_density() {
        let dir = tempfile::tempdir().unwrap();
        let src = write_file(&dir, "square.obj", SEAMED_SQUARE);
        let mut mesh = load(&src).unwrap();

        let tool = TexelDensityTool::default();
        tool.normalize_to(Some(&mut mesh), 512.0).unwrap();

        let out = dir.path().join("normalized.obj");
        save(&mesh, &out).unwrap();
        let reloaded = load(&out).unwrap();

        assert_eq!(reloaded.num_uvs(), mesh.num_uvs());
        assert_eq!(reloaded.num_interior_edges(), mesh.num_interior_edges());
        assert_eq!(tool.measure(Some(&reloaded)).unwrap(), 512);
    }
}
