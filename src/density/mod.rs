//! Texel density measurement and normalization.
//!
//! Texel density is the number of texture pixels covering one world-space
//! unit, given a reference texture resolution. UV space is normalized to
//! `[0, 1]`, so a UV edge of length `l` spans `l * resolution` texels.
//!
//! - [`DensityMeasurer`] averages per-edge density over interior edges.
//! - [`DensityNormalizer`] turns a target density into a UV scale factor and
//!   hands it to the host's rescale primitive.
//! - [`TexelDensityTool`] builds both from one [`ReferenceResolution`] so the
//!   two can never disagree about it.
//!
//! # Example
//!
//! ```
//! use texel_density::prelude::*;
//! use nalgebra::{Point2, Point3};
//!
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let uvs = vec![Point2::new(0.0, 0.0), Point2::new(0.1, 0.0), Point2::new(0.0, 0.1)];
//! let mut mesh = build_from_triangles(&positions, &uvs, &[[0, 1, 2]]).unwrap();
//!
//! let tool = TexelDensityTool::default();
//! assert_eq!(tool.measure(Some(&mesh)).unwrap(), 205);
//!
//! tool.normalize_to(Some(&mut mesh), 1024.0).unwrap();
//! assert_eq!(tool.measure(Some(&mesh)).unwrap(), 1024);
//! ```

mod measure;
mod normalize;
mod tool;

use std::fmt;
use std::str::FromStr;

use crate::error::{DensityError, Result};

pub use measure::{
    sample_edge, Aggregation, DensityMeasurer, DensityReport, EdgeSample, MeasureOptions,
};
pub use normalize::DensityNormalizer;
pub use tool::{NormalizeOutcome, TexelDensityTool};

/// Texture resolution, in texels, that UV lengths are converted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceResolution(u32);

impl ReferenceResolution {
    /// 2048 texels.
    pub const DEFAULT: Self = Self(2048);

    /// Create a reference resolution.
    ///
    /// # Errors
    ///
    /// Returns [`DensityError::InvalidParameter`] for zero.
    pub fn new(texels: u32) -> Result<Self> {
        if texels == 0 {
            return Err(DensityError::invalid_param(
                "reference_resolution",
                texels,
                "must be positive",
            ));
        }
        Ok(Self(texels))
    }

    /// The resolution in texels.
    #[inline]
    pub fn texels(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn as_f64(self) -> f64 {
        f64::from(self.0)
    }
}

impl Default for ReferenceResolution {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for ReferenceResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A requested texel density, as typed by a user.
///
/// Parsing accepts whole numbers only and rejects zero and negatives, so a
/// successfully parsed target is always valid input for
/// [`TexelDensityTool::normalize_to`].
///
/// ```
/// use texel_density::density::TargetDensity;
///
/// let t: TargetDensity = " 512 ".parse().unwrap();
/// assert_eq!(t.get(), 512);
/// assert!("abc".parse::<TargetDensity>().is_err());
/// assert!("0".parse::<TargetDensity>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetDensity(u32);

impl TargetDensity {
    /// Create a target density.
    ///
    /// # Errors
    ///
    /// Returns [`DensityError::InvalidTarget`] for zero.
    pub fn new(texels_per_unit: u32) -> Result<Self> {
        if texels_per_unit == 0 {
            return Err(DensityError::invalid_target(texels_per_unit));
        }
        Ok(Self(texels_per_unit))
    }

    /// The target in texels per world unit.
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<TargetDensity> for f64 {
    fn from(t: TargetDensity) -> f64 {
        f64::from(t.0)
    }
}

impl FromStr for TargetDensity {
    type Err = DensityError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let value: i64 = trimmed
            .parse()
            .map_err(|_| DensityError::invalid_target(trimmed))?;
        let value = u32::try_from(value).map_err(|_| DensityError::invalid_target(trimmed))?;
        Self::new(value)
    }
}

impl fmt::Display for TargetDensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Round half to even, the rounding used for displayed densities.
#[inline]
pub(crate) fn round_density(value: f64) -> u64 {
    value.round_ties_even() as u64
}
