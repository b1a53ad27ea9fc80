//! PLY (Stanford polygon) format support.
//!
//! PLY stores one texture coordinate per vertex. Files that carry seams do
//! so by duplicating vertices, which loading welds back together and saving
//! reproduces.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::{Point2, Point3};
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{DensityError, Result};
use crate::mesh::{build_welded, TexturedMesh, UvId, VertexId};

/// Property name pairs accepted for texture coordinates, in lookup order.
const UV_PROPERTIES: [(&str, &str); 3] = [("u", "v"), ("s", "t"), ("texture_u", "texture_v")];

/// Load a textured mesh from a PLY file.
///
/// # Errors
///
/// Returns [`DensityError::LoadError`] if the file cannot be parsed, has no
/// faces, or a vertex lacks coordinates or texture coordinates.
///
/// # Example
///
/// ```no_run
/// use texel_density::io::ply;
///
/// let mesh = ply::load("model.ply").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<TexturedMesh> {
    let path = path.as_ref();
    let load_error = |message: &str| DensityError::LoadError {
        path: path.to_path_buf(),
        message: message.to_string(),
    };

    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| DensityError::LoadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| load_error("PLY file has no vertex element"))?;

    let mut positions: Vec<Point3<f64>> = Vec::with_capacity(vertex_element.len());
    let mut uvs: Vec<Point2<f64>> = Vec::with_capacity(vertex_element.len());
    for vertex in vertex_element {
        let x = get_float_property(vertex, "x")
            .ok_or_else(|| load_error("vertex missing x coordinate"))?;
        let y = get_float_property(vertex, "y")
            .ok_or_else(|| load_error("vertex missing y coordinate"))?;
        let z = get_float_property(vertex, "z")
            .ok_or_else(|| load_error("vertex missing z coordinate"))?;
        positions.push(Point3::new(x, y, z));

        let uv = UV_PROPERTIES
            .iter()
            .find_map(|(u, v)| {
                Some(Point2::new(
                    get_float_property(vertex, u)?,
                    get_float_property(vertex, v)?,
                ))
            })
            .ok_or_else(|| load_error("vertex missing texture coordinates"))?;
        uvs.push(uv);
    }

    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| load_error("PLY file has no face element"))?;

    let mut faces: Vec<[usize; 3]> = Vec::with_capacity(face_element.len());
    for face in face_element {
        let indices = get_list_property(face, "vertex_indices")
            .or_else(|| get_list_property(face, "vertex_index"))
            .ok_or_else(|| load_error("face missing vertex_indices property"))?;

        // Fan triangulation for polygons
        for i in 1..indices.len().saturating_sub(1) {
            faces.push([indices[0], indices[i], indices[i + 1]]);
        }
    }

    if faces.is_empty() {
        return Err(load_error("PLY file contains no faces"));
    }

    build_welded(&positions, &uvs, &faces)
}

fn get_float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(f64::from(*v)),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(f64::from(*v)),
        Property::UInt(v) => Some(f64::from(*v)),
        Property::Short(v) => Some(f64::from(*v)),
        Property::UShort(v) => Some(f64::from(*v)),
        Property::Char(v) => Some(f64::from(*v)),
        Property::UChar(v) => Some(f64::from(*v)),
        _ => None,
    }
}

fn get_list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    match element.get(name)? {
        Property::ListInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        _ => None,
    }
}

/// Save a textured mesh to a PLY file (ASCII format).
///
/// Each distinct pair of vertex and UV becomes one PLY vertex, so a vertex on
/// a seam is written once per side of the seam.
///
/// # Example
///
/// ```no_run
/// # use texel_density::mesh::TexturedMesh;
/// # fn get_mesh() -> TexturedMesh { unimplemented!() }
/// use texel_density::io::ply;
///
/// let mesh = get_mesh();
/// ply::save(&mesh, "output.ply").unwrap();
/// ```
pub fn save<P: AsRef<Path>>(mesh: &TexturedMesh, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);

    let mut corners: Vec<(VertexId, UvId)> = Vec::with_capacity(mesh.num_vertices());
    let mut corner_index: HashMap<(VertexId, UvId), usize> = HashMap::new();
    let mut faces: Vec<[usize; 3]> = Vec::with_capacity(mesh.num_faces());
    for (_, face) in mesh.faces() {
        let mut tri = [0usize; 3];
        for (slot, (&v, &t)) in tri.iter_mut().zip(face.vertices.iter().zip(&face.uvs)) {
            *slot = *corner_index.entry((v, t)).or_insert_with(|| {
                corners.push((v, t));
                corners.len() - 1
            });
        }
        faces.push(tri);
    }

    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by texel-density")?;
    writeln!(writer, "element vertex {}", corners.len())?;
    writeln!(writer, "property double x")?;
    writeln!(writer, "property double y")?;
    writeln!(writer, "property double z")?;
    writeln!(writer, "property double u")?;
    writeln!(writer, "property double v")?;
    writeln!(writer, "element face {}", faces.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for &(v, t) in &corners {
        let p = mesh.position(v);
        let uv = mesh.uv(t);
        writeln!(writer, "{} {} {} {} {}", p.x, p.y, p.z, uv.x, uv.y)?;
    }

    for f in &faces {
        writeln!(writer, "3 {} {} {}", f[0], f[1], f[2])?;
    }

    writer.flush()?;
    Ok(())
}
