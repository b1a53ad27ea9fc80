//! # texel-density
//!
//! Measure and normalize the texel density of UV-mapped triangle meshes.
//!
//! Texel density is how many texture pixels cover one world-space unit of a
//! surface, given a reference texture resolution. Keeping it uniform across
//! assets keeps texture detail consistent across a scene.
//!
//! ## Features
//!
//! - **Measurement**: average per-edge density over the interior edges of a
//!   mesh, rounded for display
//! - **Normalization**: rescale UV shells so a mesh hits a target density
//! - **Host seam**: the engine only needs [`MeshQuery`](host::MeshQuery) and
//!   [`UvRescale`](host::UvRescale), so it runs against any mesh store
//! - **File formats**: OBJ, PLY, glTF
//!
//! ## Quick Start
//!
//! ```no_run
//! use texel_density::prelude::*;
//!
//! let mut mesh = texel_density::io::load("model.obj").unwrap();
//! let tool = TexelDensityTool::default();
//!
//! println!("Density: {}", tool.measure(Some(&mesh)).unwrap());
//!
//! tool.normalize_to(Some(&mut mesh), 1024.0).unwrap();
//! texel_density::io::save(&mesh, "normalized.obj").unwrap();
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use texel_density::prelude::*;
//! use nalgebra::{Point2, Point3};
//!
//! // Unit square with its UVs laid out at a tenth of world size
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let uvs: Vec<Point2<f64>> = positions
//!     .iter()
//!     .map(|p| Point2::new(p.x * 0.1, p.y * 0.1))
//!     .collect();
//!
//! let mesh = build_from_triangles(&positions, &uvs, &[[0, 1, 2], [0, 2, 3]]).unwrap();
//! assert_eq!(mesh.num_edges(), 5);
//!
//! let report = DensityMeasurer::default().measure_report(Some(&mesh)).unwrap();
//! assert_eq!(report.density, 205);
//! assert_eq!(report.interior_edges, 5);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod density;
pub mod error;
pub mod host;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use texel_density::prelude::*;
/// ```
pub mod prelude {
    pub use crate::density::{
        Aggregation, DensityMeasurer, DensityNormalizer, DensityReport, MeasureOptions,
        NormalizeOutcome, ReferenceResolution, TargetDensity, TexelDensityTool,
    };
    pub use crate::error::{Degeneracy, DensityError, Result};
    pub use crate::host::{MeshQuery, RescaleOptions, RescaleReport, UvRescale};
    pub use crate::mesh::{
        build_from_triangles, build_textured, build_welded, EdgeId, FaceId, TexturedMesh, UvId,
        VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
