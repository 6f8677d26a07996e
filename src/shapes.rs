//! Definition of various test shapes.

use crate::mesh::PanelMesh;
use crate::types::RlstArray;
use rlst::{rlst_dynamic_array2, RandomAccessMut};

fn vertex_array(points: &[[f64; 3]]) -> RlstArray<f64, 2> {
    let mut vertices = rlst_dynamic_array2!(f64, [points.len(), 3]);
    for (index, point) in points.iter().enumerate() {
        for d in 0..3 {
            *vertices.get_mut([index, d]).unwrap() = point[d];
        }
    }
    vertices
}

/// Create a horizontal rectangular plate of `nx` by `ny` quadrilateral
/// panels.
///
/// The plate is centered on the `z` axis at height `depth` (negative for a
/// submerged plate), with side `length` along `x` and `width` along `y`.
/// Normals point up.
pub fn rectangular_plate(length: f64, width: f64, depth: f64, nx: usize, ny: usize) -> PanelMesh {
    let mut points = Vec::with_capacity((nx + 1) * (ny + 1));
    for i in 0..=nx {
        for j in 0..=ny {
            points.push([
                -0.5 * length + length * i as f64 / nx as f64,
                -0.5 * width + width * j as f64 / ny as f64,
                depth,
            ]);
        }
    }
    let index = |i: usize, j: usize| i * (ny + 1) + j;
    let mut panels = Vec::with_capacity(nx * ny);
    for i in 0..nx {
        for j in 0..ny {
            panels.push([
                index(i, j),
                index(i + 1, j),
                index(i + 1, j + 1),
                index(i, j + 1),
            ]);
        }
    }
    PanelMesh::new(vertex_array(&points), panels)
}

/// Create a latitude/longitude sphere of radius `radius` centered on the `z`
/// axis at height `center_depth`.
///
/// `ntheta` polar bands and `nphi` azimuthal divisions; the two polar caps
/// are rings of triangles (panels with a repeated last vertex), the rest are
/// quadrilaterals. Normals point out of the sphere. The mesh is fully
/// submerged when `center_depth + radius < 0`.
pub fn sphere(radius: f64, center_depth: f64, ntheta: usize, nphi: usize) -> PanelMesh {
    let mut points = Vec::with_capacity(2 + (ntheta - 1) * nphi);
    points.push([0.0, 0.0, center_depth + radius]);
    for i in 1..ntheta {
        let theta = std::f64::consts::PI * i as f64 / ntheta as f64;
        for j in 0..nphi {
            let phi = 2.0 * std::f64::consts::PI * j as f64 / nphi as f64;
            points.push([
                radius * theta.sin() * phi.cos(),
                radius * theta.sin() * phi.sin(),
                center_depth + radius * theta.cos(),
            ]);
        }
    }
    points.push([0.0, 0.0, center_depth - radius]);

    let north = 0;
    let south = 1 + (ntheta - 1) * nphi;
    let ring = |i: usize, j: usize| 1 + (i - 1) * nphi + j % nphi;

    let mut panels = Vec::with_capacity(ntheta * nphi);
    for j in 0..nphi {
        panels.push([north, ring(1, j), ring(1, j + 1), ring(1, j + 1)]);
    }
    for i in 1..ntheta - 1 {
        for j in 0..nphi {
            panels.push([ring(i, j), ring(i + 1, j), ring(i + 1, j + 1), ring(i, j + 1)]);
        }
    }
    for j in 0..nphi {
        panels.push([south, ring(ntheta - 1, j + 1), ring(ntheta - 1, j), ring(ntheta - 1, j)]);
    }
    PanelMesh::new(vertex_array(&points), panels)
}
