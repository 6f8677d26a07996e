//! Panel meshes and per-panel quadrature.

use crate::quadrature::{reference_square_rule, QuadratureError, QuadratureRule};
use crate::types::RlstArray;
use itertools::izip;
use log::warn;
use rlst::{rlst_dynamic_array2, rlst_dynamic_array3, RandomAccessByRef, RandomAccessMut, Shape};

pub(crate) fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub(crate) fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

pub(crate) fn scale(a: [f64; 3], factor: f64) -> [f64; 3] {
    [factor * a[0], factor * a[1], factor * a[2]]
}

/// A surface discretized into flat quadrilateral and triangular panels.
///
/// Panels are stored as 4 indices into a shared vertex array; a triangle
/// repeats its last vertex. Construction derives the per-panel data the
/// kernels consume: area-weighted centers, unit normals, areas,
/// characteristic radii and a quadrature rule mapped onto each panel.
pub struct PanelMesh {
    vertices: RlstArray<f64, 2>,
    panels: Vec<[usize; 4]>,
    centers: RlstArray<f64, 2>,
    normals: RlstArray<f64, 2>,
    areas: Vec<f64>,
    radii: Vec<f64>,
    quadrature_points: RlstArray<f64, 3>,
    quadrature_weights: RlstArray<f64, 2>,
}

impl PanelMesh {
    /// Create a mesh with the default one-point quadrature (panel center,
    /// weight equal to the panel area).
    pub fn new(vertices: RlstArray<f64, 2>, panels: Vec<[usize; 4]>) -> Self {
        Self::build(vertices, panels, None)
    }

    /// Create a mesh carrying a tensor Gauss-Legendre rule with
    /// `points_per_direction^2` points per panel, mapped bilinearly.
    pub fn with_quadrature(
        vertices: RlstArray<f64, 2>,
        panels: Vec<[usize; 4]>,
        points_per_direction: usize,
    ) -> Result<Self, QuadratureError> {
        let rule = reference_square_rule(points_per_direction)?;
        Ok(Self::build(vertices, panels, Some(&rule)))
    }

    fn build(
        vertices: RlstArray<f64, 2>,
        panels: Vec<[usize; 4]>,
        rule: Option<&QuadratureRule>,
    ) -> Self {
        let npanels = panels.len();
        let nvertices = vertices.shape()[0];
        let mut centers = rlst_dynamic_array2!(f64, [npanels, 3]);
        let mut normals = rlst_dynamic_array2!(f64, [npanels, 3]);
        let mut areas = vec![0.0; npanels];
        let mut radii = vec![0.0; npanels];

        for (index, panel) in panels.iter().enumerate() {
            debug_assert!(panel.iter().all(|v| *v < nvertices));
            let corners = [
                vertex(&vertices, panel[0]),
                vertex(&vertices, panel[1]),
                vertex(&vertices, panel[2]),
                vertex(&vertices, panel[3]),
            ];

            // The diagonal cross product gives twice the area of a planar
            // quadrilateral and covers triangles with a repeated vertex.
            let diagonal_cross = cross(sub(corners[2], corners[0]), sub(corners[3], corners[1]));
            let area = 0.5 * norm(diagonal_cross);
            areas[index] = area;
            if area > 0.0 {
                let unit_normal = scale(diagonal_cross, 0.5 / area);
                for d in 0..3 {
                    *normals.get_mut([index, d]).unwrap() = unit_normal[d];
                }
            } else {
                warn!("panel {index} has zero area; its normal is left zero");
            }

            // Area-weighted centroid of the two triangles of the panel.
            let first_area =
                0.5 * norm(cross(sub(corners[1], corners[0]), sub(corners[2], corners[0])));
            let second_area =
                0.5 * norm(cross(sub(corners[2], corners[0]), sub(corners[3], corners[0])));
            let center = if first_area + second_area > 0.0 {
                let mut center = [0.0; 3];
                for d in 0..3 {
                    let first = (corners[0][d] + corners[1][d] + corners[2][d]) / 3.0;
                    let second = (corners[0][d] + corners[2][d] + corners[3][d]) / 3.0;
                    center[d] =
                        (first_area * first + second_area * second) / (first_area + second_area);
                }
                center
            } else {
                let mut center = [0.0; 3];
                for d in 0..3 {
                    center[d] = corners.iter().map(|c| c[d]).sum::<f64>() / 4.0;
                }
                center
            };
            for d in 0..3 {
                *centers.get_mut([index, d]).unwrap() = center[d];
            }

            radii[index] = corners
                .iter()
                .map(|corner| norm(sub(*corner, center)))
                .fold(0.0, f64::max);
        }

        let npoints = rule.map_or(1, |rule| rule.npoints);
        let mut quadrature_points = rlst_dynamic_array3!(f64, [npanels, npoints, 3]);
        let mut quadrature_weights = rlst_dynamic_array2!(f64, [npanels, npoints]);
        match rule {
            None => {
                for index in 0..npanels {
                    for d in 0..3 {
                        *quadrature_points.get_mut([index, 0, d]).unwrap() =
                            *centers.get([index, d]).unwrap();
                    }
                    *quadrature_weights.get_mut([index, 0]).unwrap() = areas[index];
                }
            }
            Some(rule) => {
                for (index, panel) in panels.iter().enumerate() {
                    let corners = [
                        vertex(&vertices, panel[0]),
                        vertex(&vertices, panel[1]),
                        vertex(&vertices, panel[2]),
                        vertex(&vertices, panel[3]),
                    ];
                    for q in 0..rule.npoints {
                        let xi = rule.points[2 * q];
                        let eta = rule.points[2 * q + 1];
                        let shape_functions = [
                            0.25 * (1.0 - xi) * (1.0 - eta),
                            0.25 * (1.0 + xi) * (1.0 - eta),
                            0.25 * (1.0 + xi) * (1.0 + eta),
                            0.25 * (1.0 - xi) * (1.0 + eta),
                        ];
                        let xi_derivatives = [
                            -0.25 * (1.0 - eta),
                            0.25 * (1.0 - eta),
                            0.25 * (1.0 + eta),
                            -0.25 * (1.0 + eta),
                        ];
                        let eta_derivatives = [
                            -0.25 * (1.0 - xi),
                            -0.25 * (1.0 + xi),
                            0.25 * (1.0 + xi),
                            0.25 * (1.0 - xi),
                        ];
                        let mut point = [0.0; 3];
                        let mut xi_tangent = [0.0; 3];
                        let mut eta_tangent = [0.0; 3];
                        for (corner, n, dxi, deta) in
                            izip!(&corners, &shape_functions, &xi_derivatives, &eta_derivatives)
                        {
                            for d in 0..3 {
                                point[d] += n * corner[d];
                                xi_tangent[d] += dxi * corner[d];
                                eta_tangent[d] += deta * corner[d];
                            }
                        }
                        for d in 0..3 {
                            *quadrature_points.get_mut([index, q, d]).unwrap() = point[d];
                        }
                        *quadrature_weights.get_mut([index, q]).unwrap() =
                            rule.weights[q] * norm(cross(xi_tangent, eta_tangent));
                    }
                }
            }
        }

        Self {
            vertices,
            panels,
            centers,
            normals,
            areas,
            radii,
            quadrature_points,
            quadrature_weights,
        }
    }

    /// The number of panels.
    pub fn npanels(&self) -> usize {
        self.panels.len()
    }

    /// The number of vertices.
    pub fn nvertices(&self) -> usize {
        self.vertices.shape()[0]
    }

    /// Center of a panel (area-weighted centroid).
    pub fn center(&self, index: usize) -> [f64; 3] {
        [
            *self.centers.get([index, 0]).unwrap(),
            *self.centers.get([index, 1]).unwrap(),
            *self.centers.get([index, 2]).unwrap(),
        ]
    }

    /// Unit normal of a panel.
    pub fn normal(&self, index: usize) -> [f64; 3] {
        [
            *self.normals.get([index, 0]).unwrap(),
            *self.normals.get([index, 1]).unwrap(),
            *self.normals.get([index, 2]).unwrap(),
        ]
    }

    /// Area of a panel.
    pub fn area(&self, index: usize) -> f64 {
        self.areas[index]
    }

    /// Characteristic radius of a panel: the largest center-to-vertex
    /// distance, used by the kernels for near/far switching.
    pub fn radius(&self, index: usize) -> f64 {
        self.radii[index]
    }

    /// The corner points of a panel; triangles repeat the last corner.
    pub fn corners(&self, index: usize) -> [[f64; 3]; 4] {
        let panel = self.panels[index];
        [
            vertex(&self.vertices, panel[0]),
            vertex(&self.vertices, panel[1]),
            vertex(&self.vertices, panel[2]),
            vertex(&self.vertices, panel[3]),
        ]
    }

    /// The number of quadrature points per panel.
    pub fn quadrature_npoints(&self) -> usize {
        self.quadrature_points.shape()[1]
    }

    /// A quadrature point of a panel.
    pub fn quadrature_point(&self, index: usize, point: usize) -> [f64; 3] {
        [
            *self.quadrature_points.get([index, point, 0]).unwrap(),
            *self.quadrature_points.get([index, point, 1]).unwrap(),
            *self.quadrature_points.get([index, point, 2]).unwrap(),
        ]
    }

    /// The quadrature weight matching [`PanelMesh::quadrature_point`].
    pub fn quadrature_weight(&self, index: usize, point: usize) -> f64 {
        *self.quadrature_weights.get([index, point]).unwrap()
    }
}

fn vertex(vertices: &RlstArray<f64, 2>, index: usize) -> [f64; 3] {
    [
        *vertices.get([index, 0]).unwrap(),
        *vertices.get([index, 1]).unwrap(),
        *vertices.get([index, 2]).unwrap(),
    ]
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square_at(depth: f64) -> PanelMesh {
        let mut vertices = rlst_dynamic_array2!(f64, [4, 3]);
        for (index, corner) in [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]
            .iter()
            .enumerate()
        {
            *vertices.get_mut([index, 0]).unwrap() = corner[0];
            *vertices.get_mut([index, 1]).unwrap() = corner[1];
            *vertices.get_mut([index, 2]).unwrap() = depth;
        }
        PanelMesh::new(vertices, vec![[0, 1, 2, 3]])
    }

    #[test]
    fn test_unit_square_properties() {
        let mesh = unit_square_at(-1.0);
        assert_eq!(mesh.npanels(), 1);
        assert_relative_eq!(mesh.area(0), 1.0, max_relative = 1e-14);
        let center = mesh.center(0);
        assert_relative_eq!(center[0], 0.5, max_relative = 1e-14);
        assert_relative_eq!(center[1], 0.5, max_relative = 1e-14);
        assert_relative_eq!(center[2], -1.0, max_relative = 1e-14);
        let normal = mesh.normal(0);
        assert_relative_eq!(normal[2], 1.0, max_relative = 1e-14);
        assert_relative_eq!(mesh.radius(0), 0.5 * f64::sqrt(2.0), max_relative = 1e-14);
    }

    #[test]
    fn test_triangle_with_repeated_vertex() {
        let mut vertices = rlst_dynamic_array2!(f64, [3, 3]);
        for (index, corner) in [[0.0, 0.0, -2.0], [1.0, 0.0, -2.0], [0.0, 1.0, -2.0]]
            .iter()
            .enumerate()
        {
            for d in 0..3 {
                *vertices.get_mut([index, d]).unwrap() = corner[d];
            }
        }
        let mesh = PanelMesh::new(vertices, vec![[0, 1, 2, 2]]);
        assert_relative_eq!(mesh.area(0), 0.5, max_relative = 1e-14);
        let center = mesh.center(0);
        assert_relative_eq!(center[0], 1.0 / 3.0, max_relative = 1e-14);
        assert_relative_eq!(center[1], 1.0 / 3.0, max_relative = 1e-14);
    }

    #[test]
    fn test_default_quadrature_is_centroid() {
        let mesh = unit_square_at(-3.0);
        assert_eq!(mesh.quadrature_npoints(), 1);
        let point = mesh.quadrature_point(0, 0);
        let center = mesh.center(0);
        for d in 0..3 {
            assert_relative_eq!(point[d], center[d], max_relative = 1e-14);
        }
        assert_relative_eq!(mesh.quadrature_weight(0, 0), mesh.area(0), max_relative = 1e-14);
    }

    #[test]
    fn test_gauss_weights_sum_to_area() {
        // A skewed planar trapezoid; the bilinear Jacobian is affine in the
        // reference coordinates, so every embedded rule integrates it exactly.
        for points_per_direction in 1..=4 {
            let mut vertices = rlst_dynamic_array2!(f64, [4, 3]);
            for (index, corner) in [
                [0.0, 0.0, -1.0],
                [2.0, 0.0, -1.0],
                [1.5, 1.0, -1.0],
                [0.5, 1.0, -1.0],
            ]
            .iter()
            .enumerate()
            {
                for d in 0..3 {
                    *vertices.get_mut([index, d]).unwrap() = corner[d];
                }
            }
            let mesh =
                PanelMesh::with_quadrature(vertices, vec![[0, 1, 2, 3]], points_per_direction)
                    .unwrap();
            let total: f64 = (0..mesh.quadrature_npoints())
                .map(|q| mesh.quadrature_weight(0, q))
                .sum();
            assert_relative_eq!(total, 1.5, max_relative = 1e-13);
        }
    }
}
