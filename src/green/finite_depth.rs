//! Finite-depth evaluation of the wave term.
//!
//! The Prony-family methods superpose four infinite-depth evaluations whose
//! vertical coordinates mirror the source and field points in the free
//! surface and the sea bottom, weighted by a depth-dependent amplitude, and
//! correct the remaining depth dependence with an exponential-sum remainder
//! expressed as image sources. John's eigenfunction expansion sums the
//! propagating and evanescent modes directly.

use crate::green::wave::{scaled_wave_term, WaveTermContext, MIN_HORIZONTAL_DISTANCE};
use crate::special::{bessel_j0, bessel_j1, bessel_k0, bessel_k1, bessel_y0, bessel_y1};
use crate::types::{FiniteDepthMethod, SingularityTreatment};
use num::Zero;
use rlst::c64;

/// Wave term between two points in finite depth, with the gradient taken
/// with respect to the first point.
pub(crate) fn finite_depth_point(
    first: [f64; 3],
    second: [f64; 3],
    context: &WaveTermContext<'_>,
) -> (c64, [c64; 3]) {
    match context.method {
        FiniteDepthMethod::Legacy | FiniteDepthMethod::ExponentialDecomposition => {
            let (mut value, mut gradient) = four_combination(first, second, context);
            let (remainder, remainder_gradient) = prony_remainder(first, second, context);
            value += remainder;
            for d in 0..3 {
                gradient[d] += remainder_gradient[d];
            }
            (value, gradient)
        }
        FiniteDepthMethod::MirroredInfiniteDepth => four_combination(first, second, context),
        FiniteDepthMethod::EigenfunctionExpansion => {
            eigenfunction_expansion(first, second, context)
        }
    }
}

// The four vertical coordinates at which the infinite-depth functions are
// evaluated, with the chain-rule sign of each with respect to the first
// point's z coordinate.
fn vertical_combinations(first_z: f64, second_z: f64, depth: f64) -> [(f64, f64); 4] {
    [
        (first_z + second_z, 1.0),
        (first_z - second_z - 2.0 * depth, 1.0),
        (second_z - first_z - 2.0 * depth, -1.0),
        (-first_z - second_z - 4.0 * depth, -1.0),
    ]
}

// Written in terms of decaying exponentials so that it stays finite for any
// positive depth; tends to one as k h grows.
fn combination_amplitude(wavenumber: f64, depth: f64) -> f64 {
    let kh = wavenumber * depth;
    let nu = wavenumber * kh.tanh();
    (wavenumber + nu) * (1.0 + (-2.0 * kh).exp())
        / (4.0 * wavenumber * (0.5 * (1.0 - (-4.0 * kh).exp()) + 2.0 * kh * (-2.0 * kh).exp()))
}

fn four_combination(
    first: [f64; 3],
    second: [f64; 3],
    context: &WaveTermContext<'_>,
) -> (c64, [c64; 3]) {
    let k = context.wavenumber;
    let depth = context.depth.value();
    let amplitude = combination_amplitude(k, depth);
    let dx = first[0] - second[0];
    let dy = first[1] - second[1];
    let horizontal = f64::hypot(dx, dy);
    let (ux, uy) = if horizontal > MIN_HORIZONTAL_DISTANCE {
        (dx / horizontal, dy / horizontal)
    } else {
        (0.0, 0.0)
    };
    let mut value = c64::zero();
    let mut gradient = [c64::zero(); 3];
    for (index, (vertical_sum, sign)) in vertical_combinations(first[2], second[2], depth)
        .into_iter()
        .enumerate()
    {
        // The special singularity treatments concern the free-surface
        // reflection only, so they apply to the first combination; the
        // bottom-related ones always use the plain low-frequency form.
        let combo_treatment = if index == 0 {
            context.treatment
        } else {
            match context.treatment {
                SingularityTreatment::LowFrequencyWithRankinePart => {
                    SingularityTreatment::LowFrequency
                }
                other => other,
            }
        };
        let term = scaled_wave_term(
            k * horizontal,
            k * vertical_sum,
            k,
            context.tabulation,
            combo_treatment,
        );
        value += term.value;
        gradient[0] += term.radial * ux;
        gradient[1] += term.radial * uy;
        gradient[2] += sign * term.vertical;
    }
    (
        amplitude * value,
        [
            amplitude * gradient[0],
            amplitude * gradient[1],
            amplitude * gradient[2],
        ],
    )
}

// Each term of the exponential decomposition integrates to a Rankine-like
// source below each of the four images, shifted deeper by the term's decay
// rate; negative exponents keep every shifted image away from the fluid.
fn prony_remainder(
    first: [f64; 3],
    second: [f64; 3],
    context: &WaveTermContext<'_>,
) -> (c64, [c64; 3]) {
    let depth = context.depth.value();
    let dx = first[0] - second[0];
    let dy = first[1] - second[1];
    let horizontal = f64::hypot(dx, dy);
    let mut value = 0.0;
    let mut gradient = [0.0; 3];
    for term in context.prony {
        for (vertical_sum, sign) in vertical_combinations(first[2], second[2], depth) {
            let shifted = vertical_sum + term.exponent * depth;
            let distance = f64::hypot(horizontal, shifted).max(MIN_HORIZONTAL_DISTANCE);
            let cube = distance * distance * distance;
            value += term.amplitude / distance;
            gradient[0] -= term.amplitude * dx / cube;
            gradient[1] -= term.amplitude * dy / cube;
            gradient[2] -= term.amplitude * shifted * sign / cube;
        }
    }
    (
        c64::new(value, 0.0),
        [
            c64::new(gradient[0], 0.0),
            c64::new(gradient[1], 0.0),
            c64::new(gradient[2], 0.0),
        ],
    )
}

// John's expansion of the full Green function, minus the pointwise direct
// and free-surface-image sources that the assembly engine integrates
// exactly. No extra bottom images are expected from the caller.
fn eigenfunction_expansion(
    first: [f64; 3],
    second: [f64; 3],
    context: &WaveTermContext<'_>,
) -> (c64, [c64; 3]) {
    let k = context.wavenumber;
    let depth = context.depth.value();
    let dx = first[0] - second[0];
    let dy = first[1] - second[1];
    let horizontal = f64::hypot(dx, dy).max(MIN_HORIZONTAL_DISTANCE);
    let (ux, uy) = (dx / horizontal, dy / horizontal);

    // Propagating mode.
    let kr = k * horizontal;
    let hankel = c64::new(
        -std::f64::consts::PI * bessel_y0(kr),
        std::f64::consts::PI * bessel_j0(kr),
    );
    let hankel_slope = c64::new(
        std::f64::consts::PI * bessel_y1(kr),
        -std::f64::consts::PI * bessel_j1(kr),
    );
    let normalization = (2.0 * k * depth + (2.0 * k * depth).sinh()) / (4.0 * k);
    let profile_first = (k * (first[2] + depth)).cosh();
    let profile_second = (k * (second[2] + depth)).cosh();
    let mut value = hankel * (profile_first * profile_second / normalization);
    let radial = hankel_slope * (k * profile_first * profile_second / normalization);
    let mut gradient = [
        radial * ux,
        radial * uy,
        hankel * (k * (k * (first[2] + depth)).sinh() * profile_second / normalization),
    ];

    // Evanescent modes.
    for &root in context.dispersion_roots {
        let normalization = (2.0 * root * depth + (2.0 * root * depth).sin()) / (4.0 * root);
        let profile_first = (root * (first[2] + depth)).cos();
        let profile_second = (root * (second[2] + depth)).cos();
        let shared = 2.0 * profile_second / normalization;
        value += bessel_k0(root * horizontal) * profile_first * shared;
        let radial = -root * bessel_k1(root * horizontal) * profile_first * shared;
        gradient[0] += radial * ux;
        gradient[1] += radial * uy;
        gradient[2] +=
            -root * (root * (first[2] + depth)).sin() * bessel_k0(root * horizontal) * shared;
    }

    // Subtract the direct and free-surface-image sources.
    let vertical_difference = first[2] - second[2];
    let vertical_sum = first[2] + second[2];
    let direct = f64::hypot(horizontal, vertical_difference).max(MIN_HORIZONTAL_DISTANCE);
    let image = f64::hypot(horizontal, vertical_sum).max(MIN_HORIZONTAL_DISTANCE);
    let direct_cube = direct * direct * direct;
    let image_cube = image * image * image;
    value -= 1.0 / direct + 1.0 / image;
    gradient[0] += dx / direct_cube + dx / image_cube;
    gradient[1] += dy / direct_cube + dy / image_cube;
    gradient[2] += vertical_difference / direct_cube + vertical_sum / image_cube;

    (value, gradient)
}

/// First `count` positive roots of `x tan(x h) = -nu`, with `nu` the
/// infinite-depth wavenumber matching `wavenumber` in depth `h`. The m-th
/// root is bracketed by `(m - 1/2) pi / h` and `m pi / h`.
pub fn dispersion_roots(count: usize, wavenumber: f64, depth: f64) -> Vec<f64> {
    let nu = wavenumber * (wavenumber * depth).tanh();
    (1..=count)
        .map(|m| {
            let mut lower = (m as f64 - 0.5) * std::f64::consts::PI / depth;
            let mut upper = m as f64 * std::f64::consts::PI / depth;
            for _ in 0..100 {
                let mid = 0.5 * (lower + upper);
                if mid * (mid * depth).tan() + nu < 0.0 {
                    lower = mid;
                } else {
                    upper = mid;
                }
            }
            0.5 * (lower + upper)
        })
        .collect()
}
