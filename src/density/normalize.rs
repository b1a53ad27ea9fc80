//! Texel density normalization.
//!
//! The scale factor is a pure function of the target and the reference
//! resolution: `target / resolution`. It depends on nothing measured from the
//! mesh, because the rescale primitive scales UVs relative to world-space
//! edge lengths rather than relative to their current size.

use tracing::debug;

use super::ReferenceResolution;
use crate::algo::Progress;
use crate::error::{DensityError, Result};
use crate::host::{RescaleOptions, RescaleReport, UvRescale};

/// Computes and applies the UV scale factor for a target density.
#[derive(Debug, Clone, Default)]
pub struct DensityNormalizer {
    resolution: ReferenceResolution,
    rescale: RescaleOptions,
}

impl DensityNormalizer {
    /// Create a normalizer for a reference resolution.
    pub fn new(resolution: ReferenceResolution) -> Self {
        Self {
            resolution,
            rescale: RescaleOptions::default(),
        }
    }

    /// Replace the options passed to the rescale primitive.
    pub fn with_rescale_options(mut self, options: RescaleOptions) -> Self {
        self.rescale = options;
        self
    }

    /// The reference resolution this normalizer converts against.
    #[inline]
    pub fn resolution(&self) -> ReferenceResolution {
        self.resolution
    }

    /// The options passed to the rescale primitive.
    #[inline]
    pub fn rescale_options(&self) -> &RescaleOptions {
        &self.rescale
    }

    /// Scale factor that brings a mesh to `target` texels per unit.
    ///
    /// # Errors
    ///
    /// Returns [`DensityError::InvalidTarget`] unless `target` is a positive
    /// finite number.
    ///
    /// # Example
    ///
    /// ```
    /// use texel_density::density::{DensityNormalizer, ReferenceResolution};
    ///
    /// let normalizer = DensityNormalizer::new(ReferenceResolution::DEFAULT);
    /// assert_eq!(normalizer.compute_scale_factor(1024.0).unwrap(), 0.5);
    /// assert!(normalizer.compute_scale_factor(0.0).is_err());
    /// ```
    pub fn compute_scale_factor(&self, target: f64) -> Result<f64> {
        if !target.is_finite() || target <= 0.0 {
            return Err(DensityError::invalid_target(target));
        }
        Ok(target / self.resolution.as_f64())
    }

    /// Hand a scale factor to the mesh's rescale primitive.
    ///
    /// # Errors
    ///
    /// - [`DensityError::NoSelection`] if `mesh` is `None`
    /// - [`DensityError::RescaleFailed`] if the primitive fails; failures of
    ///   any other kind are reported as this variant too
    pub fn apply_scale<M: UvRescale + ?Sized>(
        &self,
        mesh: Option<&mut M>,
        scale: f64,
    ) -> Result<RescaleReport> {
        self.apply_scale_with_progress(mesh, scale, &Progress::none())
    }

    /// [`apply_scale`](Self::apply_scale) with progress reporting.
    pub fn apply_scale_with_progress<M: UvRescale + ?Sized>(
        &self,
        mesh: Option<&mut M>,
        scale: f64,
        progress: &Progress,
    ) -> Result<RescaleReport> {
        let mesh = mesh.ok_or(DensityError::NoSelection)?;
        debug!(
            scale,
            max_iterations = self.rescale.max_iterations,
            stop_threshold = self.rescale.stop_threshold,
            "Applying UV scale"
        );

        mesh.rescale_uv_with_progress(scale, &self.rescale, progress)
            .map_err(|e| match e {
                DensityError::RescaleFailed { .. } => e,
                other => DensityError::rescale_failed(other.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records the calls a host rescale primitive receives.
    #[derive(Default)]
    struct RecordingHost {
        calls: Vec<(f64, usize, f64)>,
        fail: bool,
    }

    impl UvRescale for RecordingHost {
        fn rescale_uv(&mut self, scale: f64, options: &RescaleOptions) -> Result<RescaleReport> {
            if self.fail {
                return Err(DensityError::invalid_param("shell", 3, "zero area"));
            }
            self.calls
                .push((scale, options.max_iterations, options.stop_threshold));
            Ok(RescaleReport {
                shells: 1,
                iterations: 1,
                converged: true,
            })
        }
    }

    fn normalizer() -> DensityNormalizer {
        DensityNormalizer::new(ReferenceResolution::DEFAULT)
    }

    #[test]
    fn test_scale_factor_examples() {
        let n = normalizer();
        assert_eq!(n.compute_scale_factor(1024.0).unwrap(), 0.5);
        assert_eq!(n.compute_scale_factor(2048.0).unwrap(), 1.0);
        assert_eq!(n.compute_scale_factor(512.0).unwrap(), 0.25);
    }

    #[test]
    fn test_scale_factor_is_linear() {
        let n = normalizer();
        for t in [1.0, 7.0, 333.0, 1024.0, 4096.0, 10_000.0] {
            let single = n.compute_scale_factor(t).unwrap();
            let double = n.compute_scale_factor(2.0 * t).unwrap();
            assert!((double - 2.0 * single).abs() < 1e-12);
        }
    }

    #[test]
    fn test_invalid_targets() {
        let n = normalizer();
        for t in [0.0, -5.0, f64::NAN, f64::INFINITY, -0.0] {
            let result = n.compute_scale_factor(t);
            assert!(matches!(result, Err(DensityError::InvalidTarget { .. })), "{t}");
        }
    }

    #[test]
    fn test_apply_scale_passes_options() {
        let n = normalizer().with_rescale_options(RescaleOptions::default().with_max_iterations(42));
        let mut host = RecordingHost::default();

        let report = n.apply_scale(Some(&mut host), 0.5).unwrap();
        assert!(report.converged);
        assert_eq!(host.calls, vec![(0.5, 42, 0.001)]);
    }

    #[test]
    fn test_apply_scale_without_selection() {
        let result = normalizer().apply_scale::<RecordingHost>(None, 0.5);
        assert!(matches!(result, Err(DensityError::NoSelection)));
    }

    #[test]
    fn test_host_failure_becomes_rescale_error() {
        let mut host = RecordingHost {
            fail: true,
            ..Default::default()
        };
        let result = normalizer().apply_scale(Some(&mut host), 0.5);
        match result {
            Err(DensityError::RescaleFailed { reason }) => assert!(reason.contains("zero area")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
