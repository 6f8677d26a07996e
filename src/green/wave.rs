//! The oscillatory wave part of the free-surface Green function.
//!
//! Point evaluations work in the wavenumber-scaled horizontal distance
//! `r = k R` and scaled vertical sum `z = k (z1 + z2)`: inside the tabulated
//! domain the four precomputed integrals are interpolated, beyond it closed
//! asymptotic forms take over. Panel values integrate the point kernel over
//! the source panel's quadrature rule.

use crate::green::finite_depth;
use crate::mesh::PanelMesh;
use crate::special::{bessel_j0, bessel_j1, bessel_y0, bessel_y1};
use crate::tabulation::{Tabulation, WaveIntegrals};
use crate::types::{FiniteDepthMethod, PronyTerm, SingularityTreatment, WaterDepth};
use num::Zero;
use rlst::c64;

// Horizontal distances below this are treated as vertically aligned.
pub(crate) const MIN_HORIZONTAL_DISTANCE: f64 = 1e-10;

/// The read-only inputs of one wave-term evaluation.
pub struct WaveTermContext<'a> {
    /// Wavenumber of the propagating mode.
    pub wavenumber: f64,
    /// Water depth.
    pub depth: WaterDepth,
    /// Precomputed wave integrals.
    pub tabulation: &'a Tabulation,
    /// Singularity-handling mode.
    pub treatment: SingularityTreatment,
    /// Evaluation method in finite depth; ignored in infinite depth.
    pub method: FiniteDepthMethod,
    /// Exponential-sum decomposition, read by the Prony-family methods.
    pub prony: &'a [PronyTerm],
    /// Roots of the dispersion relation, read by the eigenfunction expansion.
    pub dispersion_roots: &'a [f64],
}

/// A point evaluation of the wave term in the scaled coordinates: the value,
/// the radial derivative scalar and the full vertical derivative. Horizontal
/// gradient components are `radial` times the horizontal unit vector.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ScaledWaveTerm {
    pub(crate) value: c64,
    pub(crate) radial: c64,
    pub(crate) vertical: c64,
}

// Large-argument forms of the tabulated integrals, used beyond the table.
fn asymptotic_integrals(r: f64, z: f64) -> WaveIntegrals {
    let r = r.max(MIN_HORIZONTAL_DISTANCE);
    let d1 = f64::hypot(r, z);
    let decay = z.exp();
    WaveIntegrals {
        d1: -std::f64::consts::PI * decay * bessel_y0(r) - 1.0 / d1 + z / (d1 * d1 * d1),
        d2: -std::f64::consts::PI * decay * bessel_y1(r) - r / (d1 * d1 * d1)
            + 3.0 * r * z / (d1 * d1 * d1 * d1 * d1),
        z1: decay * bessel_j0(r),
        z2: decay * bessel_j1(r),
    }
}

/// Wave term and its derivatives at one scaled evaluation point `(r, z)`.
///
/// The `LowFrequencyWithRankinePart` mode leaves the `2 k^2 / d1` piece out of
/// the vertical derivative; the assembly engine restores it through the
/// exact polygon integral of the reflected panel. The `HighFrequency` mode
/// carries the free-surface mirror source pointwise.
pub(crate) fn scaled_wave_term(
    r: f64,
    z: f64,
    wavenumber: f64,
    tabulation: &Tabulation,
    treatment: SingularityTreatment,
) -> ScaledWaveTerm {
    let covered = tabulation.covers(r, z);
    let integrals = if covered {
        tabulation.lookup(r, z)
    } else {
        asymptotic_integrals(r, z)
    };
    let d1 = f64::hypot(r.max(MIN_HORIZONTAL_DISTANCE), z);
    let k2 = wavenumber * wavenumber;
    // dD1/dz = D1 + 1/d1 holds exactly for the tabulated integral; on the
    // asymptotic branch the substitute is differentiated directly instead.
    let rankine_free_vertical = if covered {
        integrals.d1
    } else {
        integrals.d1 + 1.0 / (d1 * d1 * d1) - 3.0 * z * z / (d1 * d1 * d1 * d1 * d1)
    };
    let base = c64::new(integrals.d1, std::f64::consts::PI * integrals.z1);
    let mut value = 2.0 * wavenumber * base;
    let mut radial = 2.0 * k2 * c64::new(-integrals.d2, -std::f64::consts::PI * integrals.z2);
    let mut vertical =
        2.0 * k2 * c64::new(rankine_free_vertical, std::f64::consts::PI * integrals.z1);
    match treatment {
        SingularityTreatment::LowFrequency => {
            vertical += 2.0 * k2 / d1;
        }
        SingularityTreatment::LowFrequencyWithRankinePart => {}
        SingularityTreatment::HighFrequency => {
            vertical += 2.0 * k2 / d1;
            value += 2.0 * wavenumber / d1;
            radial += -2.0 * k2 * r / (d1 * d1 * d1);
            vertical += -2.0 * k2 * z / (d1 * d1 * d1);
        }
    }
    ScaledWaveTerm {
        value,
        radial,
        vertical,
    }
}

/// Infinite-depth wave term between two points, with the gradient taken with
/// respect to the first point.
pub(crate) fn infinite_depth_point(
    first: [f64; 3],
    second: [f64; 3],
    wavenumber: f64,
    tabulation: &Tabulation,
    treatment: SingularityTreatment,
) -> (c64, [c64; 3]) {
    let dx = first[0] - second[0];
    let dy = first[1] - second[1];
    let horizontal = f64::hypot(dx, dy);
    let term = scaled_wave_term(
        wavenumber * horizontal,
        wavenumber * (first[2] + second[2]),
        wavenumber,
        tabulation,
        treatment,
    );
    let (ux, uy) = if horizontal > MIN_HORIZONTAL_DISTANCE {
        (dx / horizontal, dy / horizontal)
    } else {
        (0.0, 0.0)
    };
    (
        term.value,
        [term.radial * ux, term.radial * uy, term.vertical],
    )
}

// The wave part is symmetric in its two points for every depth regime, so
// differentiation with respect to the source point is realized by swapping
// the points; the finite-depth chain-rule signs then come out right on their
// own.
fn wave_point(first: [f64; 3], second: [f64; 3], context: &WaveTermContext<'_>) -> (c64, [c64; 3]) {
    if context.depth.is_infinite() {
        infinite_depth_point(
            first,
            second,
            context.wavenumber,
            context.tabulation,
            context.treatment,
        )
    } else {
        finite_depth::finite_depth_point(first, second, context)
    }
}

/// Integral of the wave term over one source panel, evaluated at the panel's
/// quadrature points.
pub fn wave_part_integral(
    field: [f64; 3],
    source_mesh: &PanelMesh,
    source_index: usize,
    context: &WaveTermContext<'_>,
    differentiate_wrt_field: bool,
) -> (c64, [c64; 3]) {
    let mut value = c64::zero();
    let mut gradient = [c64::zero(); 3];
    for q in 0..source_mesh.quadrature_npoints() {
        let point = source_mesh.quadrature_point(source_index, q);
        let weight = source_mesh.quadrature_weight(source_index, q);
        let (first, second) = if differentiate_wrt_field {
            (field, point)
        } else {
            (point, field)
        };
        let (point_value, point_gradient) = wave_point(first, second, context);
        value += weight * point_value;
        for d in 0..3 {
            gradient[d] += weight * point_gradient[d];
        }
    }
    (value, gradient)
}
