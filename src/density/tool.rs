//! The two operations a UI offers: measure and normalize.

use tracing::{info, warn};

use super::measure::{DensityMeasurer, DensityReport, MeasureOptions};
use super::normalize::DensityNormalizer;
use super::{round_density, ReferenceResolution};
use crate::algo::Progress;
use crate::error::{DensityError, Result};
use crate::host::{MeshQuery, RescaleOptions, RescaleReport, UvRescale};

/// Result of [`TexelDensityTool::normalize_to`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeOutcome {
    /// Scale factor handed to the rescale primitive.
    pub scale_factor: f64,
    /// Density before rescaling, if the mesh was measurable.
    pub previous_density: Option<u64>,
    /// Value to show as the current density once the rescale is done.
    pub displayed_density: u64,
    /// What the rescale primitive reported.
    pub rescale: RescaleReport,
}

/// Measurer and normalizer sharing one reference resolution.
///
/// Holds no per-request state: the mesh and the target are arguments of each
/// call and nothing from one call is reused by the next.
#[derive(Debug, Clone, Default)]
pub struct TexelDensityTool {
    measurer: DensityMeasurer,
    normalizer: DensityNormalizer,
}

impl TexelDensityTool {
    /// Create a tool for a reference resolution.
    pub fn new(resolution: ReferenceResolution) -> Self {
        Self {
            measurer: DensityMeasurer::new(resolution),
            normalizer: DensityNormalizer::new(resolution),
        }
    }

    /// Replace the measurement options.
    pub fn with_measure_options(mut self, options: MeasureOptions) -> Self {
        self.measurer = self.measurer.with_options(options);
        self
    }

    /// Replace the rescale options.
    pub fn with_rescale_options(mut self, options: RescaleOptions) -> Self {
        self.normalizer = self.normalizer.with_rescale_options(options);
        self
    }

    /// The shared reference resolution.
    #[inline]
    pub fn resolution(&self) -> ReferenceResolution {
        self.measurer.resolution()
    }

    /// The measurer.
    pub fn measurer(&self) -> &DensityMeasurer {
        &self.measurer
    }

    /// The normalizer.
    pub fn normalizer(&self) -> &DensityNormalizer {
        &self.normalizer
    }

    /// Measure the texel density of a mesh. See [`DensityMeasurer::measure`].
    pub fn measure<M: MeshQuery + ?Sized>(&self, mesh: Option<&M>) -> Result<u64> {
        self.measurer.measure(mesh)
    }

    /// Measure with full diagnostics. See [`DensityMeasurer::measure_report`].
    pub fn measure_report<M: MeshQuery + ?Sized>(&self, mesh: Option<&M>) -> Result<DensityReport> {
        self.measurer.measure_report(mesh)
    }

    /// Rescale a mesh's UVs to `target` texels per world unit.
    ///
    /// `target` is either a parsed [`TargetDensity`](super::TargetDensity) or any positive finite
    /// number. Fractional targets are applied exactly; only
    /// [`NormalizeOutcome::displayed_density`] is rounded, half to even, so a
    /// target below `0.5` displays as `0`.
    ///
    /// The target is validated before the selection, so an invalid target is
    /// reported even when no mesh is given.
    ///
    /// # Errors
    ///
    /// - [`DensityError::InvalidTarget`] if `target` is not positive
    /// - [`DensityError::NoSelection`] if `mesh` is `None`
    /// - [`DensityError::RescaleFailed`] if the rescale primitive fails
    pub fn normalize_to<M, T>(&self, mesh: Option<&mut M>, target: T) -> Result<NormalizeOutcome>
    where
        M: MeshQuery + UvRescale + ?Sized,
        T: Into<f64>,
    {
        self.normalize_to_with_progress(mesh, target, &Progress::none())
    }

    /// [`normalize_to`](Self::normalize_to) with progress reporting.
    pub fn normalize_to_with_progress<M, T>(
        &self,
        mesh: Option<&mut M>,
        target: T,
        progress: &Progress,
    ) -> Result<NormalizeOutcome>
    where
        M: MeshQuery + UvRescale + ?Sized,
        T: Into<f64>,
    {
        let target: f64 = target.into();
        let scale_factor = self.normalizer.compute_scale_factor(target)?;
        let mesh = mesh.ok_or(DensityError::NoSelection)?;

        let previous_density = match self.measurer.measure(Some(&*mesh)) {
            Ok(d) => Some(d),
            Err(e) => {
                warn!(error = %e, "Could not measure density before rescaling");
                None
            }
        };

        let rescale = self
            .normalizer
            .apply_scale_with_progress(Some(&mut *mesh), scale_factor, progress)?;

        info!(
            target_density = target,
            scale_factor,
            previous = ?previous_density,
            shells = rescale.shells,
            converged = rescale.converged,
            "Normalized texel density"
        );

        Ok(NormalizeOutcome {
            scale_factor,
            previous_density,
            displayed_density: round_density(target),
            rescale,
        })
    }
}
