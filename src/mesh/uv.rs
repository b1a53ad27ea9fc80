//! UV coordinate storage.
//!
//! This module provides the [`UvSet`] type holding the texture coordinates
//! of a mesh, indexed by [`UvId`].

use nalgebra::Point2;

use super::index::UvId;

/// Texture coordinates of a mesh.
///
/// UV coordinates are typically in the range [0, 1] but may extend outside
/// it; nothing here clamps them.
#[derive(Debug, Clone, Default)]
pub struct UvSet {
    coords: Vec<Point2<f64>>,
}

impl UvSet {
    /// Create a UV set with the given coordinates.
    pub fn new(coords: Vec<Point2<f64>>) -> Self {
        Self { coords }
    }

    /// Get the coordinates of a UV.
    #[inline]
    pub fn get(&self, uv: UvId) -> Point2<f64> {
        self.coords[uv.index()]
    }

    /// Set the coordinates of a UV.
    #[inline]
    pub fn set(&mut self, uv: UvId, coords: Point2<f64>) {
        self.coords[uv.index()] = coords;
    }

    /// Get the number of UV coordinates.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Get the raw coordinates slice.
    pub fn as_slice(&self) -> &[Point2<f64>] {
        &self.coords
    }

    /// Compute the bounding box of a subset of UVs.
    ///
    /// Returns `None` if `ids` is empty.
    pub fn bounding_box_of(&self, ids: &[UvId]) -> Option<(Point2<f64>, Point2<f64>)> {
        let first = self.get(*ids.first()?);
        let mut min = first;
        let mut max = first;

        for &id in ids {
            let uv = self.get(id);
            min.x = min.x.min(uv.x);
            min.y = min.y.min(uv.y);
            max.x = max.x.max(uv.x);
            max.y = max.y.max(uv.y);
        }

        Some((min, max))
    }

    /// Compute the bounding box of all UVs.
    pub fn bounding_box(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let ids: Vec<UvId> = (0..self.coords.len()).map(UvId::new).collect();
        self.bounding_box_of(&ids)
    }

    /// Average position of a subset of UVs.
    pub fn centroid_of(&self, ids: &[UvId]) -> Option<Point2<f64>> {
        if ids.is_empty() {
            return None;
        }
        let sum = ids
            .iter()
            .fold(nalgebra::Vector2::zeros(), |acc, &id| acc + self.get(id).coords);
        Some(Point2::from(sum / ids.len() as f64))
    }

    /// Unsigned area of a UV triangle.
    pub fn triangle_area(&self, tri: [UvId; 3]) -> f64 {
        let p0 = self.get(tri[0]);
        let p1 = self.get(tri[1]);
        let p2 = self.get(tri[2]);

        // 2D cross product for signed area
        0.5 * ((p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y)).abs()
    }

    /// Scale a subset of UVs uniformly about a pivot.
    pub fn scale_about(&mut self, ids: &[UvId], pivot: Point2<f64>, factor: f64) {
        for &id in ids {
            let uv = &mut self.coords[id.index()];
            *uv = pivot + (*uv - pivot) * factor;
        }
    }
}
