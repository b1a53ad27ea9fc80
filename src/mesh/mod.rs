//! Core mesh data structures.
//!
//! This module provides [`TexturedMesh`], a triangle mesh whose corners
//! reference world-space vertices and UV coordinates independently, and the
//! type-safe indices used to address it.
//!
//! # Index Types
//!
//! - [`VertexId`] - Identifies a world-space vertex
//! - [`UvId`] - Identifies a texture coordinate
//! - [`EdgeId`] - Identifies an undirected edge
//! - [`FaceId`] - Identifies a triangle
//!
//! # Construction
//!
//! ```
//! use texel_density::mesh::{build_from_triangles, TexturedMesh};
//! use nalgebra::{Point2, Point3};
//!
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let uvs = vec![
//!     Point2::new(0.0, 0.0),
//!     Point2::new(0.1, 0.0),
//!     Point2::new(0.05, 0.1),
//! ];
//!
//! let mesh: TexturedMesh = build_from_triangles(&positions, &uvs, &[[0, 1, 2]]).unwrap();
//! assert_eq!(mesh.num_interior_edges(), 3);
//! ```

mod builder;
mod index;
mod textured;
mod uv;

pub use builder::{build_from_triangles, build_textured, build_welded};
pub(crate) use builder::{weld, Welded};
pub use index::{EdgeId, FaceId, UvId, VertexId};
pub use textured::{Edge, Face, TexturedMesh};
pub use uv::UvSet;
