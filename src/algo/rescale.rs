//! Shell-preserving UV rescale.
//!
//! Brings every UV shell of a [`TexturedMesh`] to a texel density expressed
//! as a scale factor: after the rescale, a UV edge is `scale` times as long
//! as the world-space edge it maps. Shells are handled independently and
//! never merged or split; faces, UV ids and seams are untouched.
//!
//! Each shell goes through two stages:
//!
//! 1. **Uniform scale** about the shell's UV centroid, chosen so that the
//!    shell's total UV edge length equals `scale` times its total world
//!    edge length. For a shell whose UVs are an undistorted flattening this
//!    alone is exact.
//! 2. **Relaxation** (optional): Jacobi iterations that pull every UV edge
//!    towards `scale * world_length`, re-centring the shell after each
//!    sweep. Iteration stops once no UV moves further than
//!    `stop_threshold * shell_extent`, or when the budget runs out.

use std::collections::{HashMap, HashSet};

use nalgebra::{Point2, Vector2};
use tracing::{debug, info, warn};

use super::progress::Progress;
use super::shells::{find_uv_shells, UvShells};
use crate::error::{DensityError, Result};
use crate::host::{RescaleOptions, RescaleReport, UvRescale};
use crate::mesh::{TexturedMesh, UvId};

/// Fraction of the averaged correction applied per sweep.
const RELAXATION: f64 = 0.5;

/// Lengths and areas below this are treated as zero.
const EPSILON: f64 = 1e-12;

/// A UV edge inside one shell, with the world length it should track.
#[derive(Debug, Clone, Copy)]
struct ShellEdge {
    a: usize,
    b: usize,
    world_length: f64,
}

/// Per-shell working data, in shell-local UV indexing.
#[derive(Debug)]
struct ShellLayout {
    uvs: Vec<UvId>,
    edges: Vec<ShellEdge>,
    world_total: f64,
}

/// Rescale the UV layout of a mesh.
///
/// # Errors
///
/// Returns [`DensityError::RescaleFailed`] if `scale` is not a positive
/// finite number, if any edge is shared by more than two faces, or if a shell
/// has zero UV area or zero world-space size. Nothing is modified when an
/// error is returned.
///
/// # Example
///
/// ```
/// use texel_density::algo::rescale_uv;
/// use texel_density::host::RescaleOptions;
/// use texel_density::mesh::build_from_triangles;
/// use nalgebra::{Point2, Point3};
///
/// let positions = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(2.0, 0.0, 0.0),
///     Point3::new(0.0, 2.0, 0.0),
/// ];
/// let uvs = vec![Point2::new(0.0, 0.0), Point2::new(0.1, 0.0), Point2::new(0.0, 0.1)];
/// let mut mesh = build_from_triangles(&positions, &uvs, &[[0, 1, 2]]).unwrap();
///
/// let report = rescale_uv(&mut mesh, 0.25, &RescaleOptions::default()).unwrap();
/// assert_eq!(report.shells, 1);
/// assert!(report.converged);
/// ```
pub fn rescale_uv(
    mesh: &mut TexturedMesh,
    scale: f64,
    options: &RescaleOptions,
) -> Result<RescaleReport> {
    rescale_uv_with_progress(mesh, scale, options, &Progress::none())
}

/// Rescale the UV layout of a mesh with progress reporting.
///
/// See [`rescale_uv`] for details.
pub fn rescale_uv_with_progress(
    mesh: &mut TexturedMesh,
    scale: f64,
    options: &RescaleOptions,
    progress: &Progress,
) -> Result<RescaleReport> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(DensityError::rescale_failed(format!(
            "scale factor {scale} is not a positive finite number"
        )));
    }
    options.validate()?;

    if let Some(e) = mesh.edge_ids().find(|&e| mesh.is_non_manifold_edge(e)) {
        let [a, b] = mesh.edge(e).vertices;
        return Err(DensityError::rescale_failed(format!(
            "non-manifold edge {:?}-{:?} is shared by {} faces",
            a,
            b,
            mesh.edge(e).faces.len()
        )));
    }

    let shells = find_uv_shells(mesh);
    let layouts = collect_layouts(mesh, &shells)?;
    let num_shells = layouts.len();

    info!(
        shells = num_shells,
        scale,
        max_iterations = options.max_iterations,
        "Rescaling UV layout"
    );

    let mut iterations = 0;
    let mut converged = true;

    for (i, layout) in layouts.iter().enumerate() {
        progress.report(i, num_shells, "Rescaling UV shells");

        let factor = scale_to_world(mesh, layout, scale);
        debug!(shell = i, factor, "Uniform shell scale");

        if options.relax {
            let (spent, done) = relax_shell(mesh, layout, scale, options, |iter| {
                progress.report_sub(iter, options.max_iterations, i, num_shells, "Relaxing UV shells");
            });
            iterations = iterations.max(spent);
            if !done {
                warn!(
                    shell = i,
                    iterations = spent,
                    "UV relaxation did not converge within the iteration budget"
                );
                converged = false;
            }
        }
    }

    progress.report(num_shells, num_shells, "Done");

    Ok(RescaleReport {
        shells: num_shells,
        iterations,
        converged,
    })
}

/// Gather each shell's UV edges and validate it before anything is mutated.
fn collect_layouts(mesh: &TexturedMesh, shells: &UvShells) -> Result<Vec<ShellLayout>> {
    let mut layouts = Vec::with_capacity(shells.count());

    for shell in 0..shells.count() {
        let uvs = shells.members(shell).to_vec();
        let local: HashMap<UvId, usize> = uvs.iter().enumerate().map(|(i, &uv)| (uv, i)).collect();

        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut edges: Vec<ShellEdge> = Vec::new();
        let mut uv_area = 0.0;

        for &f in shells.faces(shell) {
            let face = mesh.face(f);
            uv_area += mesh.uvs().triangle_area(face.uvs);

            for k in 0..3 {
                let (ta, tb) = (face.uvs[k], face.uvs[(k + 1) % 3]);
                // A collapsed UV edge has no length to scale
                if ta == tb {
                    continue;
                }
                let (Some(&a), Some(&b)) = (local.get(&ta), local.get(&tb)) else {
                    continue;
                };
                let key = (a.min(b), a.max(b));
                if !seen.insert(key) {
                    continue;
                }
                let (va, vb) = (face.vertices[k], face.vertices[(k + 1) % 3]);
                let world_length = (mesh.position(vb) - mesh.position(va)).norm();
                edges.push(ShellEdge {
                    a: key.0,
                    b: key.1,
                    world_length,
                });
            }
        }

        let world_total: f64 = edges.iter().map(|e| e.world_length).sum();
        if world_total < EPSILON {
            return Err(DensityError::rescale_failed(format!(
                "UV shell {shell} has zero world-space size"
            )));
        }
        if uv_area < EPSILON {
            return Err(DensityError::rescale_failed(format!(
                "UV shell {shell} has zero area"
            )));
        }

        layouts.push(ShellLayout {
            uvs,
            edges,
            world_total,
        });
    }

    Ok(layouts)
}

/// Scale a shell uniformly about its centroid so its total UV edge length is
/// `scale` times its total world edge length. Returns the factor applied.
fn scale_to_world(mesh: &mut TexturedMesh, layout: &ShellLayout, scale: f64) -> f64 {
    let uv_total: f64 = layout
        .edges
        .iter()
        .map(|e| (mesh.uv(layout.uvs[e.b]) - mesh.uv(layout.uvs[e.a])).norm())
        .sum();

    // Nonzero area guarantees a non-collapsed edge, hence nonzero length
    let factor = scale * layout.world_total / uv_total;
    let centroid = mesh.uvs().centroid_of(&layout.uvs);
    if let Some(centroid) = centroid {
        mesh.uvs.scale_about(&layout.uvs, centroid, factor);
    }
    factor
}

/// Relax a shell's UV edges towards their target lengths.
///
/// Returns the number of sweeps run and whether the stop threshold was met.
fn relax_shell(
    mesh: &mut TexturedMesh,
    layout: &ShellLayout,
    scale: f64,
    options: &RescaleOptions,
    on_iteration: impl Fn(usize),
) -> (usize, bool) {
    let n = layout.uvs.len();
    let mut coords: Vec<Point2<f64>> = layout.uvs.iter().map(|&uv| mesh.uv(uv)).collect();

    let Some(centroid) = mesh.uvs().centroid_of(&layout.uvs) else {
        return (0, true);
    };
    let extent = mesh
        .uvs()
        .bounding_box_of(&layout.uvs)
        .map(|(min, max)| (max - min).norm())
        .unwrap_or(0.0);
    let tolerance = options.stop_threshold * extent.max(EPSILON);

    let mut delta = vec![Vector2::<f64>::zeros(); n];
    let mut count = vec![0usize; n];

    for iter in 1..=options.max_iterations {
        delta.iter_mut().for_each(|d| *d = Vector2::zeros());
        count.iter_mut().for_each(|c| *c = 0);

        for edge in &layout.edges {
            let d = coords[edge.b] - coords[edge.a];
            let length = d.norm();
            if length < EPSILON {
                continue;
            }
            let target = scale * edge.world_length;
            let correction = d * ((length - target) / length) * 0.5;
            delta[edge.a] += correction;
            delta[edge.b] -= correction;
            count[edge.a] += 1;
            count[edge.b] += 1;
        }

        let mut max_step = 0.0_f64;
        for i in 0..n {
            if count[i] == 0 {
                continue;
            }
            let step = delta[i] * (RELAXATION / count[i] as f64);
            coords[i] += step;
            max_step = max_step.max(step.norm());
        }

        // Keep the shell where it was in UV space
        let sum = coords.iter().fold(Vector2::zeros(), |acc, p| acc + p.coords);
        let drift = centroid - Point2::from(sum / n as f64);
        for p in &mut coords {
            *p += drift;
        }

        on_iteration(iter);

        if max_step < tolerance {
            write_back(mesh, layout, &coords);
            return (iter, true);
        }
    }

    write_back(mesh, layout, &coords);
    (options.max_iterations, false)
}

fn write_back(mesh: &mut TexturedMesh, layout: &ShellLayout, coords: &[Point2<f64>]) {
    for (&uv, &p) in layout.uvs.iter().zip(coords) {
        mesh.set_uv(uv, p);
    }
}

impl UvRescale for TexturedMesh {
    fn rescale_uv(&mut self, scale: f64, options: &RescaleOptions) -> Result<RescaleReport> {
        rescale_uv(self, scale, options)
    }

    fn rescale_uv_with_progress(
        &mut self,
        scale: f64,
        options: &RescaleOptions,
        progress: &Progress,
    ) -> Result<RescaleReport> {
        rescale_uv_with_progress(self, scale, options, progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_triangles, build_textured, EdgeId};
    use nalgebra::Point3;

    /// `n x n` grid of unit squares in the XY plane, UVs = `uv_scale * (x, y)`.
    fn planar_grid(n: usize, uv_scale: f64) -> TexturedMesh {
        let mut positions = Vec::new();
        let mut uvs = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                positions.push(Point3::new(i as f64, j as f64, 0.0));
                uvs.push(Point2::new(i as f64 * uv_scale, j as f64 * uv_scale));
            }
        }
        let mut faces = Vec::new();
        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i;
                let v10 = v00 + 1;
                let v01 = v00 + (n + 1);
                let v11 = v01 + 1;
                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }
        build_from_triangles(&positions, &uvs, &faces).unwrap()
    }

    fn uv_to_world_ratio(mesh: &TexturedMesh, e: EdgeId) -> f64 {
        let ids = mesh.edge_uv_ids(e);
        (mesh.uv(ids[1]) - mesh.uv(ids[0])).norm() / mesh.edge_length(e)
    }

    #[test]
    fn test_planar_grid_rescales_exactly() {
        let mut mesh = planar_grid(4, 0.1);
        let report = rescale_uv(&mut mesh, 0.5, &RescaleOptions::default()).unwrap();

        assert_eq!(report.shells, 1);
        assert!(report.converged);
        assert_eq!(report.iterations, 1);

        for e in mesh.edge_ids() {
            assert!((uv_to_world_ratio(&mesh, e) - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rescale_keeps_centroid_and_topology() {
        let mut mesh = planar_grid(3, 0.1);
        let all: Vec<UvId> = (0..mesh.num_uvs()).map(UvId::new).collect();
        let before = mesh.uvs().centroid_of(&all).unwrap();
        let (faces, uvs, edges) = (mesh.num_faces(), mesh.num_uvs(), mesh.num_edges());

        rescale_uv(&mut mesh, 0.02, &RescaleOptions::default()).unwrap();

        let after = mesh.uvs().centroid_of(&all).unwrap();
        assert!((after - before).norm() < 1e-9);
        assert_eq!(mesh.num_faces(), faces);
        assert_eq!(mesh.num_uvs(), uvs);
        assert_eq!(mesh.num_edges(), edges);
    }

    #[test]
    fn test_scale_only_preserves_shape() {
        let mut mesh = planar_grid(2, 0.1);
        // Distort one interior UV so the layout is no longer a pure scale
        let center = UvId::new(4);
        mesh.set_uv(center, Point2::new(0.12, 0.1));
        let original: Vec<Point2<f64>> = mesh.uvs().as_slice().to_vec();

        let options = RescaleOptions::default().with_relax(false);
        let report = rescale_uv(&mut mesh, 0.2, &options).unwrap();
        assert_eq!(report.iterations, 0);

        // All pairwise distances scale by the same factor
        let d0 = (original[1] - original[0]).norm();
        let d1 = (mesh.uv(UvId::new(1)) - mesh.uv(UvId::new(0))).norm();
        let factor = d1 / d0;
        let e0 = (original[4] - original[8]).norm();
        let e1 = (mesh.uv(UvId::new(4)) - mesh.uv(UvId::new(8))).norm();
        assert!((e1 / e0 - factor).abs() < 1e-9);
    }

    #[test]
    fn test_collapsed_uv_edge_is_ignored() {
        // Two-quad strip; the last face pins two corners to the same UV
        let positions: Vec<Point3<f64>> = [(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]
            .iter()
            .map(|&(x, y)| Point3::new(x as f64, y as f64, 0.0))
            .collect();
        let uvs: Vec<Point2<f64>> = positions
            .iter()
            .map(|p| Point2::new(p.x * 0.1, p.y * 0.1))
            .collect();
        let faces = [[0, 1, 4], [0, 4, 3], [1, 2, 5], [1, 5, 4]];
        let face_uvs = [[0, 1, 4], [0, 4, 3], [1, 2, 5], [1, 5, 5]];
        let mut mesh = build_textured(&positions, &uvs, &faces, &face_uvs).unwrap();

        let options = RescaleOptions::default().with_relax(false);
        rescale_uv(&mut mesh, 0.5, &options).unwrap();

        // Every non-collapsed edge lands exactly on the requested scale
        let d = (mesh.uv(UvId::new(1)) - mesh.uv(UvId::new(0))).norm();
        assert!((d - 0.5).abs() < 1e-9, "{d}");
        let d = (mesh.uv(UvId::new(3)) - mesh.uv(UvId::new(0))).norm();
        assert!((d - 0.5).abs() < 1e-9, "{d}");
    }

    #[test]
    fn test_shells_rescale_independently() {
        // Two triangles on either side of a seam with different UV scales
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let uvs = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.1, 0.0),
            Point2::new(0.1, 0.1),
            Point2::new(0.5, 0.5),
            Point2::new(0.9, 0.9),
            Point2::new(0.5, 0.9),
        ];
        let mut mesh =
            build_textured(&positions, &uvs, &[[0, 1, 2], [0, 2, 3]], &[[0, 1, 2], [3, 4, 5]])
                .unwrap();

        let report = rescale_uv(&mut mesh, 0.25, &RescaleOptions::default()).unwrap();
        assert_eq!(report.shells, 2);
        assert!(report.converged);

        for e in mesh.edge_ids().filter(|&e| mesh.is_interior_edge(e)) {
            assert!((uv_to_world_ratio(&mesh, e) - 0.25).abs() < 1e-9);
        }
    }

    #[test]
    fn test_curved_surface_relaxes() {
        // Bend the grid into a paraboloid so planar UVs no longer match
        let mut mesh = planar_grid(4, 0.1);
        for p in mesh.positions.iter_mut() {
            p.z = 0.3 * ((p.x - 2.0).powi(2) + (p.y - 2.0).powi(2));
        }
        let options = RescaleOptions::default().with_max_iterations(200);
        let report = rescale_uv(&mut mesh, 0.1, &options).unwrap();
        assert_eq!(report.shells, 1);
        assert!(report.iterations >= 1 && report.iterations <= 200);
        assert!(mesh.uvs().as_slice().iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn test_rejects_bad_scale() {
        let mut mesh = planar_grid(1, 0.1);
        for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = rescale_uv(&mut mesh, scale, &RescaleOptions::default());
            assert!(matches!(result, Err(DensityError::RescaleFailed { .. })));
        }
    }

    #[test]
    fn test_rejects_non_manifold() {
        // Three triangles hinged on the edge 0-1
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
            Point3::new(0.5, 0.0, 1.0),
        ];
        let uvs: Vec<Point2<f64>> = positions.iter().map(|p| Point2::new(p.x, p.y + p.z)).collect();
        let mut mesh =
            build_from_triangles(&positions, &uvs, &[[0, 1, 2], [1, 0, 3], [0, 1, 4]]).unwrap();
        let before = mesh.uvs().as_slice().to_vec();

        let result = rescale_uv(&mut mesh, 0.5, &RescaleOptions::default());
        assert!(matches!(result, Err(DensityError::RescaleFailed { .. })));
        assert_eq!(mesh.uvs().as_slice(), before.as_slice());
    }

    #[test]
    fn test_rejects_zero_area_shell() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let uvs = vec![Point2::new(0.3, 0.3); 3];
        let mut mesh = build_from_triangles(&positions, &uvs, &[[0, 1, 2]]).unwrap();

        let result = rescale_uv(&mut mesh, 0.5, &RescaleOptions::default());
        assert!(matches!(result, Err(DensityError::RescaleFailed { .. })));
    }

    #[test]
    fn test_progress_reaches_end() {
        use std::sync::{Arc, Mutex};

        let last = Arc::new(Mutex::new((0, 0)));
        let sink = Arc::clone(&last);
        let progress = Progress::new(move |current, total, _| {
            *sink.lock().unwrap() = (current, total);
        });

        let mut mesh = planar_grid(2, 0.1);
        rescale_uv_with_progress(&mut mesh, 0.5, &RescaleOptions::default(), &progress).unwrap();
        assert_eq!(*last.lock().unwrap(), (1, 1));
    }
}
