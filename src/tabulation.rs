//! Precomputed table of the free-surface wave integrals.
//!
//! The wave part of the Green function reduces to four smooth functions of
//! the scaled horizontal distance `r` and the scaled vertical coordinate `z`.
//! They are expensive to integrate, so they are precomputed on a 2-D grid at
//! construction time and interpolated during assembly.

use crate::special::{bessel_j0, bessel_j1, pv_wave_integrand};
use crate::types::RlstArray;
use rlst::{c64, rlst_dynamic_array3, RandomAccessByRef, RandomAccessMut};

/// Default number of Simpson points for the table construction.
pub const DEFAULT_NB_INTEGRATION_POINTS: usize = 251;

/// How the tabulation nodes are laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TabulationGridShape {
    /// The historical 328 x 46 layout with its piecewise log/linear spacing.
    Legacy,
    /// Geometrically spaced nodes with caller-chosen counts and extents.
    Scaled,
}

/// The four tabulated integrals at one `(r, z)` evaluation point.
///
/// With `L(zeta) = exp(zeta) (E1(zeta) + i pi)` and
/// `zeta(theta) = z + i r cos(theta)`:
#[derive(Clone, Copy, Debug)]
pub struct WaveIntegrals {
    /// `(1/pi) * integral of Re L(zeta(theta))` over `theta in (-pi/2, pi/2)`.
    pub d1: f64,
    /// `(1/pi) * integral of cos(theta) Im(L(zeta(theta)) - 1/zeta(theta))`
    /// over the same range.
    pub d2: f64,
    /// `exp(z) J0(r)`.
    pub z1: f64,
    /// `exp(z) J1(r)`.
    pub z2: f64,
}

/// Evaluate the four wave integrals directly by Simpson quadrature.
///
/// This is the integrand the table is built from; the assembly path never
/// calls it directly. `nb_integration_points` must be odd and at least 3.
pub fn wave_integrals(r: f64, z: f64, nb_integration_points: usize) -> WaveIntegrals {
    assert!(
        nb_integration_points >= 3 && nb_integration_points % 2 == 1,
        "Simpson integration needs an odd number of points"
    );
    debug_assert!(r >= 0.0 && z < 0.0);
    // The theta integrands are even, so integrate over [0, pi/2] and double.
    let step = std::f64::consts::FRAC_PI_2 / (nb_integration_points - 1) as f64;
    let mut d1 = 0.0;
    let mut d2 = 0.0;
    for index in 0..nb_integration_points {
        let simpson = if index == 0 || index == nb_integration_points - 1 {
            1.0
        } else if index % 2 == 1 {
            4.0
        } else {
            2.0
        };
        let weight = simpson * step / 3.0;
        let cos_theta = (index as f64 * step).cos();
        let zeta = c64::new(z, r * cos_theta);
        let lambda = pv_wave_integrand(zeta);
        d1 += weight * lambda.re;
        d2 += weight * cos_theta * (lambda - 1.0 / zeta).im;
    }
    WaveIntegrals {
        d1: std::f64::consts::FRAC_2_PI * d1,
        d2: std::f64::consts::FRAC_2_PI * d2,
        z1: z.exp() * bessel_j0(r),
        z2: z.exp() * bessel_j1(r),
    }
}

/// Precomputed wave integrals on a 2-D `(r, z)` grid.
pub struct Tabulation {
    shape: TabulationGridShape,
    r_range: Vec<f64>,
    z_range: Vec<f64>,
    values: RlstArray<f64, 3>,
}

impl Tabulation {
    /// Build the historical grid: 328 radial nodes up to `r = 100` and 46
    /// vertical nodes down to `z = -10^1.25`, about `-17.8`.
    pub fn legacy(nb_integration_points: usize) -> Self {
        let r_range = (1..=328)
            .map(|i| {
                let i = i as f64;
                f64::min(
                    10f64.powf((i - 1.0) / 5.0 - 6.0),
                    4.0 / 3.0 + (i - 32.0).abs() / 3.0,
                )
            })
            .collect();
        let z_range = (1..=46)
            .map(|j| {
                let j = j as f64;
                -f64::min(10f64.powf(j / 5.0 - 6.0), 10f64.powf(j / 8.0 - 4.5))
            })
            .collect();
        Self::build(TabulationGridShape::Legacy, r_range, z_range, nb_integration_points)
    }

    /// Build a geometrically spaced grid covering `r` in `[1e-6, r_max]` and
    /// `z` in `[z_min, -1e-6]` with the requested node counts.
    pub fn scaled(
        r_max: f64,
        z_min: f64,
        nr: usize,
        nz: usize,
        nb_integration_points: usize,
    ) -> Self {
        assert!(r_max > 1e-6 && z_min < -1e-6, "scaled grid extents are too small");
        assert!(nr >= 3 && nz >= 3, "interpolation needs at least 3 nodes per direction");
        let r_range = (0..nr)
            .map(|k| 1e-6 * (r_max / 1e-6).powf(k as f64 / (nr - 1) as f64))
            .collect();
        let z_range = (0..nz)
            .map(|k| -1e-6 * (z_min / -1e-6).powf(k as f64 / (nz - 1) as f64))
            .collect();
        Self::build(TabulationGridShape::Scaled, r_range, z_range, nb_integration_points)
    }

    fn build(
        shape: TabulationGridShape,
        r_range: Vec<f64>,
        z_range: Vec<f64>,
        nb_integration_points: usize,
    ) -> Self {
        let mut values = rlst_dynamic_array3!(f64, [r_range.len(), z_range.len(), 4]);
        for (i, r) in r_range.iter().enumerate() {
            for (j, z) in z_range.iter().enumerate() {
                let integrals = wave_integrals(*r, *z, nb_integration_points);
                *values.get_mut([i, j, 0]).unwrap() = integrals.d1;
                *values.get_mut([i, j, 1]).unwrap() = integrals.d2;
                *values.get_mut([i, j, 2]).unwrap() = integrals.z1;
                *values.get_mut([i, j, 3]).unwrap() = integrals.z2;
            }
        }
        Self {
            shape,
            r_range,
            z_range,
            values,
        }
    }

    /// The grid layout this table was built on.
    pub fn grid_shape(&self) -> TabulationGridShape {
        self.shape
    }

    /// Radial nodes, ascending.
    pub fn r_range(&self) -> &[f64] {
        &self.r_range
    }

    /// Vertical nodes, negative and descending towards `z_min`.
    pub fn z_range(&self) -> &[f64] {
        &self.z_range
    }

    /// True if `(r, z)` lies inside the tabulated domain. Points between the
    /// surface and the first node row are covered by extrapolation.
    pub fn covers(&self, r: f64, z: f64) -> bool {
        r <= *self.r_range.last().unwrap() && z >= *self.z_range.last().unwrap()
    }

    /// Interpolate the four integrals at `(r, z)`.
    ///
    /// Quadratic (3-point) Lagrange interpolation in both directions around
    /// the node the grid shape maps the evaluation point to; exact on table
    /// nodes.
    pub fn lookup(&self, r: f64, z: f64) -> WaveIntegrals {
        let i = self.radial_index(r);
        let j = self.vertical_index(z);
        let r_weights = lagrange_weights(
            [self.r_range[i - 1], self.r_range[i], self.r_range[i + 1]],
            r,
        );
        let z_weights = lagrange_weights(
            [self.z_range[j - 1], self.z_range[j], self.z_range[j + 1]],
            z,
        );
        let mut interpolated = [0.0; 4];
        for (a, r_weight) in r_weights.iter().enumerate() {
            for (b, z_weight) in z_weights.iter().enumerate() {
                let weight = r_weight * z_weight;
                for (m, value) in interpolated.iter_mut().enumerate() {
                    *value += weight * self.values.get([i + a - 1, j + b - 1, m]).unwrap();
                }
            }
        }
        WaveIntegrals {
            d1: interpolated[0],
            d2: interpolated[1],
            z1: interpolated[2],
            z2: interpolated[3],
        }
    }

    // Center node of the radial stencil. The legacy layout is inverted in
    // closed form, log10 steps of 1/5 below r = 1 and linear steps of 1/3
    // from 4/3 on; the scaled layout is searched for the nearest node.
    fn radial_index(&self, r: f64) -> usize {
        match self.shape {
            TabulationGridShape::Legacy => {
                let raw = if r < 1.0 {
                    5.0 * (r.log10() + 6.0)
                } else {
                    27.0 + 3.0 * r
                };
                clamp_to_stencil(raw, self.r_range.len())
            }
            TabulationGridShape::Scaled => nearest_ascending(&self.r_range, r),
        }
    }

    // Center node of the vertical stencil; the legacy magnitudes follow
    // log10 steps of 1/5 down to 1e-2 and of 1/8 below that level.
    fn vertical_index(&self, z: f64) -> usize {
        match self.shape {
            TabulationGridShape::Legacy => {
                let magnitude = -z;
                let raw = if magnitude <= 1e-2 {
                    5.0 * (magnitude.log10() + 6.0)
                } else {
                    8.0 * (magnitude.log10() + 4.5)
                } - 1.0;
                clamp_to_stencil(raw, self.z_range.len())
            }
            TabulationGridShape::Scaled => nearest_descending(&self.z_range, z),
        }
    }
}

fn clamp_to_stencil(raw: f64, len: usize) -> usize {
    (raw.round() as isize).clamp(1, len as isize - 2) as usize
}

// Index of the node nearest to `value`, clamped so that a centered 3-point
// stencil stays in range.
fn nearest_ascending(range: &[f64], value: f64) -> usize {
    let after = range.partition_point(|node| *node < value);
    let nearest = if after == 0 {
        0
    } else if after == range.len() {
        range.len() - 1
    } else if value - range[after - 1] <= range[after] - value {
        after - 1
    } else {
        after
    };
    nearest.clamp(1, range.len() - 2)
}

fn nearest_descending(range: &[f64], value: f64) -> usize {
    let after = range.partition_point(|node| *node > value);
    let nearest = if after == 0 {
        0
    } else if after == range.len() {
        range.len() - 1
    } else if range[after - 1] - value <= value - range[after] {
        after - 1
    } else {
        after
    };
    nearest.clamp(1, range.len() - 2)
}

fn lagrange_weights(nodes: [f64; 3], value: f64) -> [f64; 3] {
    [
        (value - nodes[1]) * (value - nodes[2]) / ((nodes[0] - nodes[1]) * (nodes[0] - nodes[2])),
        (value - nodes[0]) * (value - nodes[2]) / ((nodes[1] - nodes[0]) * (nodes[1] - nodes[2])),
        (value - nodes[0]) * (value - nodes[1]) / ((nodes[2] - nodes[0]) * (nodes[2] - nodes[1])),
    ]
}
