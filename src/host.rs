//! Host geometry primitives.
//!
//! The density engine never owns geometry. It reads edges, vertex positions
//! and UV coordinates through [`MeshQuery`] and hands the final rescale to
//! [`UvRescale`]. [`TexturedMesh`](crate::mesh::TexturedMesh) implements both,
//! and a host application embedding this crate implements them over its own
//! mesh handles.

use nalgebra::{Point2, Point3};

use crate::algo::Progress;
use crate::error::{DensityError, Result};
use crate::mesh::{EdgeId, VertexId};

/// Read-only geometry queries the density measurement needs.
pub trait MeshQuery {
    /// Number of edges in the mesh. Edge ids are `0..num_edges()`.
    fn num_edges(&self) -> usize;

    /// The two vertices an edge connects.
    fn edge_vertices(&self, edge: EdgeId) -> [VertexId; 2];

    /// World-space position of a vertex.
    fn vertex_position(&self, vertex: VertexId) -> Point3<f64>;

    /// The distinct UV coordinates associated with an edge.
    ///
    /// An edge inside a single UV shell yields exactly two coordinates, one
    /// per endpoint. Seam edges yield three or four.
    fn edge_uvs(&self, edge: EdgeId) -> Vec<Point2<f64>>;
}

/// Shell-preserving uniform UV rescale.
pub trait UvRescale {
    /// Rescale the UV layout so UV edge lengths approach `scale` times their
    /// world-space length.
    ///
    /// # Errors
    ///
    /// Returns [`DensityError::RescaleFailed`] when the geometry cannot be
    /// rescaled (non-manifold edges, zero-area shells, a non-positive scale).
    fn rescale_uv(&mut self, scale: f64, options: &RescaleOptions) -> Result<RescaleReport>;

    /// Same as [`rescale_uv`](Self::rescale_uv), reporting progress as it goes.
    ///
    /// Implementations that cannot report progress ignore the callback.
    fn rescale_uv_with_progress(
        &mut self,
        scale: f64,
        options: &RescaleOptions,
        progress: &Progress,
    ) -> Result<RescaleReport> {
        let _ = progress;
        self.rescale_uv(scale, options)
    }
}

/// Parameters for the UV rescale primitive.
#[derive(Debug, Clone)]
pub struct RescaleOptions {
    /// Upper bound on relaxation iterations per shell.
    pub max_iterations: usize,

    /// Relaxation stops once no UV moves further than this fraction of its
    /// shell's extent in one iteration.
    pub stop_threshold: f64,

    /// Run the relaxation pass after the uniform per-shell scale.
    ///
    /// When disabled only the uniform scale is applied, which keeps each
    /// shell's shape exactly.
    pub relax: bool,
}

impl Default for RescaleOptions {
    fn default() -> Self {
        Self {
            max_iterations: 5000,
            stop_threshold: 0.001,
            relax: true,
        }
    }
}

impl RescaleOptions {
    /// Set the iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence threshold.
    pub fn with_stop_threshold(mut self, stop_threshold: f64) -> Self {
        self.stop_threshold = stop_threshold;
        self
    }

    /// Enable or disable the relaxation pass.
    pub fn with_relax(mut self, relax: bool) -> Self {
        self.relax = relax;
        self
    }

    /// Check that the options describe a runnable rescale.
    pub fn validate(&self) -> Result<()> {
        if self.relax && self.max_iterations == 0 {
            return Err(DensityError::invalid_param(
                "max_iterations",
                self.max_iterations,
                "must be at least 1 when relaxing",
            ));
        }
        if !self.stop_threshold.is_finite() || self.stop_threshold <= 0.0 {
            return Err(DensityError::invalid_param(
                "stop_threshold",
                self.stop_threshold,
                "must be a positive finite number",
            ));
        }
        Ok(())
    }
}

/// What a rescale did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RescaleReport {
    /// Number of UV shells rescaled.
    pub shells: usize,

    /// Most relaxation iterations spent on any one shell.
    pub iterations: usize,

    /// Whether every shell met the stop threshold within the budget.
    pub converged: bool,
}
