//! Texel density measurement.
//!
//! Every edge whose UV set has exactly two coordinates contributes one
//! sample, `resolution * uv_length / world_length`. Seam edges are skipped
//! and do not count towards the average.
//!
//! The default aggregate is the plain mean of per-edge densities. It weights
//! a short edge the same as a long one, so dense tessellation in one region
//! pulls the result towards that region's density.

use tracing::{debug, trace};

use super::{round_density, ReferenceResolution};
use crate::error::{Degeneracy, DensityError, Result};
use crate::host::MeshQuery;
use crate::mesh::EdgeId;

/// How per-edge densities are combined into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregation {
    /// Mean of per-edge densities, every interior edge weighted equally.
    #[default]
    EdgeMean,
    /// Total texel length over total world length of interior edges.
    LengthWeighted,
}

/// Options for density measurement.
#[derive(Debug, Clone, Default)]
pub struct MeasureOptions {
    /// How per-edge densities are combined.
    pub aggregation: Aggregation,
}

impl MeasureOptions {
    /// Set the aggregation policy.
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }
}

/// World-space and UV-space length of one interior edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeSample {
    /// Length in world units.
    pub world_length: f64,
    /// Length in normalized UV units.
    pub uv_length: f64,
}

impl EdgeSample {
    /// Texels per world unit along this edge.
    #[inline]
    pub fn density(&self, resolution: ReferenceResolution) -> f64 {
        resolution.as_f64() * self.uv_length * (1.0 / self.world_length)
    }
}

/// Result of a density measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityReport {
    /// Density rounded for display, texels per world unit.
    pub density: u64,
    /// Unrounded aggregate density.
    pub mean: f64,
    /// Edges that contributed a sample.
    pub interior_edges: usize,
    /// Seam and shell-boundary edges that were skipped.
    pub skipped_edges: usize,
    /// Smallest per-edge density seen.
    pub min_edge_density: f64,
    /// Largest per-edge density seen.
    pub max_edge_density: f64,
}

/// Measures the texel density of a mesh.
#[derive(Debug, Clone, Default)]
pub struct DensityMeasurer {
    resolution: ReferenceResolution,
    options: MeasureOptions,
}

impl DensityMeasurer {
    /// Create a measurer for a reference resolution.
    pub fn new(resolution: ReferenceResolution) -> Self {
        Self {
            resolution,
            options: MeasureOptions::default(),
        }
    }

    /// Replace the measurement options.
    pub fn with_options(mut self, options: MeasureOptions) -> Self {
        self.options = options;
        self
    }

    /// The reference resolution this measurer converts against.
    #[inline]
    pub fn resolution(&self) -> ReferenceResolution {
        self.resolution
    }

    /// Measure a mesh and return its density rounded to a whole number.
    ///
    /// # Errors
    ///
    /// - [`DensityError::NoSelection`] if `mesh` is `None`
    /// - [`DensityError::DegenerateMesh`] if the mesh has no interior edges or
    ///   an interior edge of zero world length
    pub fn measure<M: MeshQuery + ?Sized>(&self, mesh: Option<&M>) -> Result<u64> {
        self.measure_report(mesh).map(|r| r.density)
    }

    /// Measure a mesh and return the full report.
    ///
    /// Errors as for [`measure`](Self::measure).
    pub fn measure_report<M: MeshQuery + ?Sized>(&self, mesh: Option<&M>) -> Result<DensityReport> {
        let mesh = mesh.ok_or(DensityError::NoSelection)?;
        let num_edges = mesh.num_edges();

        let mut sum = 0.0;
        let mut uv_total = 0.0;
        let mut world_total = 0.0;
        let mut interior = 0usize;
        let mut min_edge = f64::INFINITY;
        let mut max_edge = 0.0_f64;

        for i in 0..num_edges {
            let edge = EdgeId::new(i);
            let Some(sample) = sample_edge(mesh, edge) else {
                trace!(edge = i, "Skipping seam edge");
                continue;
            };
            if sample.world_length == 0.0 {
                return Err(Degeneracy::ZeroLengthEdge { edge: i }.into());
            }

            let d = sample.density(self.resolution);
            sum += d;
            uv_total += sample.uv_length;
            world_total += sample.world_length;
            min_edge = min_edge.min(d);
            max_edge = max_edge.max(d);
            interior += 1;
        }

        if interior == 0 {
            return Err(Degeneracy::NoInteriorEdges.into());
        }

        let mean = match self.options.aggregation {
            Aggregation::EdgeMean => sum / interior as f64,
            Aggregation::LengthWeighted => self.resolution.as_f64() * uv_total / world_total,
        };

        let report = DensityReport {
            density: round_density(mean),
            mean,
            interior_edges: interior,
            skipped_edges: num_edges - interior,
            min_edge_density: min_edge,
            max_edge_density: max_edge,
        };

        debug!(
            density = report.density,
            mean,
            interior_edges = interior,
            skipped_edges = report.skipped_edges,
            resolution = self.resolution.texels(),
            "Measured texel density"
        );

        Ok(report)
    }
}

/// Sample an edge, or `None` if it is a seam or shell-boundary edge.
pub fn sample_edge<M: MeshQuery + ?Sized>(mesh: &M, edge: EdgeId) -> Option<EdgeSample> {
    let [a, b] = mesh.edge_vertices(edge);
    let world_length = (mesh.vertex_position(b) - mesh.vertex_position(a)).norm();

    let uvs = mesh.edge_uvs(edge);
    if uvs.len() != 2 {
        return None;
    }
    let uv_length = (uvs[1] - uvs[0]).norm();

    Some(EdgeSample {
        world_length,
        uv_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_triangles, build_textured, VertexId};
    use nalgebra::{Point2, Point3};

    /// A host mesh given directly as per-edge data.
    struct EdgeList {
        positions: Vec<Point3<f64>>,
        edges: Vec<([usize; 2], Vec<Point2<f64>>)>,
    }

    impl EdgeList {
        /// Edges along the x axis from the origin with the given world and UV lengths.
        fn from_lengths(lengths: &[(f64, f64)]) -> Self {
            let mut positions = Vec::new();
            let mut edges = Vec::new();
            for &(world, uv) in lengths {
                let a = positions.len();
                positions.push(Point3::origin());
                positions.push(Point3::new(world, 0.0, 0.0));
                edges.push(([a, a + 1], vec![Point2::origin(), Point2::new(uv, 0.0)]));
            }
            Self { positions, edges }
        }

        fn with_seam(mut self) -> Self {
            let a = self.positions.len();
            self.positions.push(Point3::origin());
            self.positions.push(Point3::new(1.0, 0.0, 0.0));
            let uvs = vec![Point2::origin(), Point2::new(0.5, 0.0), Point2::new(0.9, 0.9)];
            self.edges.push(([a, a + 1], uvs));
            self
        }
    }

    impl MeshQuery for EdgeList {
        fn num_edges(&self) -> usize {
            self.edges.len()
        }

        fn edge_vertices(&self, edge: EdgeId) -> [VertexId; 2] {
            self.edges[edge.index()].0.map(VertexId::new)
        }

        fn vertex_position(&self, vertex: VertexId) -> Point3<f64> {
            self.positions[vertex.index()]
        }

        fn edge_uvs(&self, edge: EdgeId) -> Vec<Point2<f64>> {
            self.edges[edge.index()].1.clone()
        }
    }

    fn measurer() -> DensityMeasurer {
        DensityMeasurer::new(ReferenceResolution::DEFAULT)
    }

    #[test]
    fn test_single_edge() {
        let mesh = EdgeList::from_lengths(&[(1.0, 0.1)]);
        let report = measurer().measure_report(Some(&mesh)).unwrap();
        assert!((report.mean - 204.8).abs() < 1e-9);
        assert_eq!(report.density, 205);
        assert_eq!(report.interior_edges, 1);
    }

    #[test]
    fn test_mean_of_edge_densities() {
        // 100, 200 and 300 texels per unit at 2048
        let mesh = EdgeList::from_lengths(&[
            (2.048, 0.1),
            (1.0, 200.0 / 2048.0),
            (0.5, 150.0 / 2048.0),
        ]);
        let report = measurer().measure_report(Some(&mesh)).unwrap();
        assert_eq!(report.density, 200);
        assert!((report.min_edge_density - 100.0).abs() < 1e-9);
        assert!((report.max_edge_density - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_seam_edges_skipped() {
        let mesh = EdgeList::from_lengths(&[(1.0, 0.1)]).with_seam();
        let report = measurer().measure_report(Some(&mesh)).unwrap();
        assert_eq!(report.density, 205);
        assert_eq!(report.interior_edges, 1);
        assert_eq!(report.skipped_edges, 1);
    }

    #[test]
    fn test_length_weighted() {
        // 1 unit at density 100 and 3 units at density 300
        let mesh = EdgeList::from_lengths(&[(1.0, 100.0 / 2048.0), (3.0, 900.0 / 2048.0)]);

        let mean = measurer().measure(Some(&mesh)).unwrap();
        assert_eq!(mean, 200);

        let weighted = measurer()
            .with_options(MeasureOptions::default().with_aggregation(Aggregation::LengthWeighted))
            .measure(Some(&mesh))
            .unwrap();
        assert_eq!(weighted, 250);
    }

    #[test]
    fn test_no_selection() {
        let result = measurer().measure::<EdgeList>(None);
        assert!(matches!(result, Err(DensityError::NoSelection)));
    }

    #[test]
    fn test_no_interior_edges() {
        let mesh = EdgeList::from_lengths(&[]).with_seam();
        let result = measurer().measure(Some(&mesh));
        assert!(matches!(
            result,
            Err(DensityError::DegenerateMesh(Degeneracy::NoInteriorEdges))
        ));

        let empty = EdgeList::from_lengths(&[]);
        assert!(measurer().measure(Some(&empty)).is_err());
    }

    #[test]
    fn test_zero_length_interior_edge() {
        let mesh = EdgeList::from_lengths(&[(1.0, 0.1), (0.0, 0.1)]);
        let result = measurer().measure(Some(&mesh));
        assert!(matches!(
            result,
            Err(DensityError::DegenerateMesh(Degeneracy::ZeroLengthEdge { edge: 1 }))
        ));
    }

    #[test]
    fn test_zero_length_seam_edge_is_ignored() {
        let mut mesh = EdgeList::from_lengths(&[(1.0, 0.1)]).with_seam();
        let seam = mesh.edges.len() - 1;
        let [_, b] = mesh.edges[seam].0;
        mesh.positions[b] = Point3::origin();
        assert_eq!(measurer().measure(Some(&mesh)).unwrap(), 205);
    }

    #[test]
    fn test_resolution_scales_density() {
        let mesh = EdgeList::from_lengths(&[(1.0, 0.25)]);
        let at_1024 = DensityMeasurer::new(ReferenceResolution::new(1024).unwrap());
        assert_eq!(at_1024.measure(Some(&mesh)).unwrap(), 256);
        assert_eq!(measurer().measure(Some(&mesh)).unwrap(), 512);
    }

    #[test]
    fn test_textured_triangle() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let uvs = vec![Point2::new(0.0, 0.0), Point2::new(0.1, 0.0), Point2::new(0.0, 0.1)];
        let mesh = build_from_triangles(&positions, &uvs, &[[0, 1, 2]]).unwrap();

        let first = measurer().measure(Some(&mesh)).unwrap();
        let second = measurer().measure(Some(&mesh)).unwrap();
        assert_eq!(first, 205);
        assert_eq!(first, second);
    }

    #[test]
    fn test_seam_edge_has_no_sample() {
        // Each triangle has its own UVs, so the shared diagonal is a seam
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let uvs: Vec<Point2<f64>> = (0..6).map(|i| Point2::new(0.1 * i as f64, 0.0)).collect();
        let mesh =
            build_textured(&positions, &uvs, &[[0, 1, 2], [0, 2, 3]], &[[0, 1, 2], [3, 4, 5]])
                .unwrap();
        let seams: Vec<EdgeId> = mesh.edge_ids().filter(|&e| !mesh.is_interior_edge(e)).collect();
        assert_eq!(seams.len(), 1);
        assert!(sample_edge(&mesh, seams[0]).is_none());
    }
}
