//! Exact and approximate integrals of the Rankine source `1/|x - x'|` over a
//! flat panel, for the source itself and for its image through a horizontal
//! mirror plane.

use crate::mesh::{cross, dot, norm, scale, sub};

/// A horizontal mirror plane, sending a source at height `z` to an image
/// source at `sign * z + offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MirrorPlane {
    /// Image coefficient, `+1` or `-1`.
    pub sign: f64,
    /// Vertical offset of the image.
    pub offset: f64,
}

impl MirrorPlane {
    /// Reflection through the free surface `z = 0`.
    pub const FREE_SURFACE: MirrorPlane = MirrorPlane {
        sign: -1.0,
        offset: 0.0,
    };

    // Reflecting the field point instead of the whole source panel leaves
    // all pairwise distances unchanged, so the direct kernels can be reused.
    fn reflect_field(&self, point: [f64; 3]) -> [f64; 3] {
        [point[0], point[1], self.sign * (point[2] - self.offset)]
    }
}

/// Integral of `1/|x - x'|` over a flat polygonal panel, and its gradient.
///
/// Uses the exact edge-wise formula in the near field and the one-point
/// approximation once the field point is further than seven panel radii from
/// the panel center. The gradient is with respect to the field point when
/// `differentiate_wrt_field` is set, else with respect to the source point
/// (its negation). On the panel plane the gradient is the principal value;
/// the jump across the panel is the caller's concern.
pub fn integral_of_rankine_source(
    field: [f64; 3],
    corners: &[[f64; 3]; 4],
    center: [f64; 3],
    normal: [f64; 3],
    area: f64,
    radius: f64,
    differentiate_wrt_field: bool,
) -> (f64, [f64; 3]) {
    let towards_field = sub(field, center);
    let distance = norm(towards_field);
    let (value, mut gradient) = if distance > 7.0 * radius {
        one_point_kernel(towards_field, distance, area)
    } else {
        exact_kernel(field, corners, center, normal, radius)
    };
    if !differentiate_wrt_field {
        gradient = scale(gradient, -1.0);
    }
    (value, gradient)
}

/// One-point (centroid) approximation of [`integral_of_rankine_source`].
pub fn one_point_rankine(
    field: [f64; 3],
    center: [f64; 3],
    area: f64,
    differentiate_wrt_field: bool,
) -> (f64, [f64; 3]) {
    let towards_field = sub(field, center);
    let (value, mut gradient) = one_point_kernel(towards_field, norm(towards_field), area);
    if !differentiate_wrt_field {
        gradient = scale(gradient, -1.0);
    }
    (value, gradient)
}

/// Integral of the Rankine source mirrored through `plane`, by reflecting the
/// field point and fixing the vertical chain-rule sign.
pub fn integral_of_reflected_rankine_source(
    field: [f64; 3],
    corners: &[[f64; 3]; 4],
    center: [f64; 3],
    normal: [f64; 3],
    area: f64,
    radius: f64,
    plane: MirrorPlane,
    differentiate_wrt_field: bool,
) -> (f64, [f64; 3]) {
    let (value, gradient) = integral_of_rankine_source(
        plane.reflect_field(field),
        corners,
        center,
        normal,
        area,
        radius,
        true,
    );
    (value, reflected_gradient(gradient, plane, differentiate_wrt_field))
}

/// One-point approximation of [`integral_of_reflected_rankine_source`].
pub fn one_point_reflected_rankine(
    field: [f64; 3],
    center: [f64; 3],
    area: f64,
    plane: MirrorPlane,
    differentiate_wrt_field: bool,
) -> (f64, [f64; 3]) {
    let (value, gradient) = one_point_rankine(plane.reflect_field(field), center, area, true);
    (value, reflected_gradient(gradient, plane, differentiate_wrt_field))
}

// The gradient with respect to the field point picks up the plane sign on
// its vertical component; the gradient with respect to the source point is
// the plain negation of the reflected-field gradient.
fn reflected_gradient(
    gradient: [f64; 3],
    plane: MirrorPlane,
    differentiate_wrt_field: bool,
) -> [f64; 3] {
    if differentiate_wrt_field {
        [gradient[0], gradient[1], plane.sign * gradient[2]]
    } else {
        scale(gradient, -1.0)
    }
}

fn one_point_kernel(towards_field: [f64; 3], distance: f64, area: f64) -> (f64, [f64; 3]) {
    (
        area / distance,
        scale(towards_field, -area / (distance * distance * distance)),
    )
}

// Edge-wise exact formula for the integral over a flat polygon (Hess &
// Smith). Degenerate edges from a repeated triangle vertex are skipped.
fn exact_kernel(
    field: [f64; 3],
    corners: &[[f64; 3]; 4],
    center: [f64; 3],
    normal: [f64; 3],
    radius: f64,
) -> (f64, [f64; 3]) {
    let height = dot(sub(field, center), normal);
    let mut value = 0.0;
    let mut gradient = [0.0; 3];

    for index in 0..4 {
        let first = corners[index];
        let second = corners[(index + 1) % 4];
        let edge = sub(second, first);
        let edge_length = norm(edge);
        if edge_length < 1e-3 * radius {
            continue;
        }
        let tangent = scale(edge, 1.0 / edge_length);
        let in_plane_normal = cross(normal, tangent);
        let offset = dot(sub(field, first), in_plane_normal);

        let first_distance = norm(sub(field, first));
        let second_distance = norm(sub(field, second));
        let summed = first_distance + second_distance;
        let log_numerator = summed + edge_length;
        let log_denominator = summed - edge_length;
        let log_term = (log_numerator / log_denominator).ln();

        let angle_numerator = 2.0 * offset * edge_length;
        let angle_denominator = summed * summed - edge_length * edge_length
            + 2.0 * height.abs() * summed;
        let angle = if height.abs() >= 1e-4 * radius {
            f64::atan2(angle_numerator, angle_denominator)
        } else {
            0.0
        };

        value += offset * log_term - 2.0 * height.abs() * angle;

        let distance_gradient = [
            sub(field, first)[0] / first_distance + sub(field, second)[0] / second_distance,
            sub(field, first)[1] / first_distance + sub(field, second)[1] / second_distance,
            sub(field, first)[2] / first_distance + sub(field, second)[2] / second_distance,
        ];
        let angle_numerator_gradient = scale(in_plane_normal, 2.0 * edge_length);
        let mut angle_denominator_gradient =
            scale(distance_gradient, 2.0 * (summed + height.abs()));
        let vertical = scale(normal, 2.0 * height.signum() * summed);
        for d in 0..3 {
            angle_denominator_gradient[d] += vertical[d];
        }

        let log_gradient_factor =
            offset * (log_denominator - log_numerator) / (log_numerator * log_denominator);
        let angle_gradient_factor = angle_denominator * angle_denominator
            + angle_numerator * angle_numerator;
        for d in 0..3 {
            gradient[d] += log_term * in_plane_normal[d]
                + log_gradient_factor * distance_gradient[d]
                - 2.0 * height.signum() * angle * normal[d]
                - 2.0 * height.abs()
                    * (angle_numerator_gradient[d] * angle_denominator
                        - angle_denominator_gradient[d] * angle_numerator)
                    / angle_gradient_factor;
        }
    }
    (value, gradient)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    // A unit square panel in the plane z = `height`, corners in positive
    // orientation for an upward normal.
    fn unit_square(height: f64) -> ([[f64; 3]; 4], [f64; 3], [f64; 3], f64, f64) {
        let corners = [
            [-0.5, -0.5, height],
            [0.5, -0.5, height],
            [0.5, 0.5, height],
            [-0.5, 0.5, height],
        ];
        let center = [0.0, 0.0, height];
        let normal = [0.0, 0.0, 1.0];
        (corners, center, normal, 1.0, 0.5 * f64::sqrt(2.0))
    }

    #[test]
    fn test_exact_value_above_unit_square() {
        // Value of the integral of dx dy / sqrt(x^2 + y^2 + 1) over the
        // square [-1/2, 1/2]^2.
        let (corners, center, normal, area, radius) = unit_square(0.0);
        let (value, _) = integral_of_rankine_source(
            [0.0, 0.0, 1.0],
            &corners,
            center,
            normal,
            area,
            radius,
            true,
        );
        assert_relative_eq!(value, 0.9285980, max_relative = 1e-4);
    }

    #[test]
    fn test_far_field_matches_one_point() {
        let (corners, center, normal, area, radius) = unit_square(-2.0);
        for field in [[4.7, 0.4, -1.0], [0.0, 0.0, 2.8], [-3.3, 3.3, -2.0]] {
            let (exact, _) = integral_of_rankine_source(
                field, &corners, center, normal, area, radius, true,
            );
            let (approximate, _) = one_point_rankine(field, center, area, true);
            assert_relative_eq!(exact, approximate, max_relative = 1e-2);
        }
    }

    #[test]
    fn test_gradient_by_finite_differences() {
        let (corners, center, normal, area, radius) = unit_square(-1.0);
        let field = [0.3, -0.2, 0.4];
        let (_, gradient) = integral_of_rankine_source(
            field, &corners, center, normal, area, radius, true,
        );
        let step = 1e-6;
        for d in 0..3 {
            let mut forward = field;
            forward[d] += step;
            let mut backward = field;
            backward[d] -= step;
            let (high, _) = integral_of_rankine_source(
                forward, &corners, center, normal, area, radius, true,
            );
            let (low, _) = integral_of_rankine_source(
                backward, &corners, center, normal, area, radius, true,
            );
            assert_relative_eq!(gradient[d], (high - low) / (2.0 * step), max_relative = 1e-5);
        }
    }

    #[test]
    fn test_source_gradient_is_negated_field_gradient() {
        let (corners, center, normal, area, radius) = unit_square(-1.0);
        let field = [1.1, 0.7, -0.3];
        let (value_field, wrt_field) = integral_of_rankine_source(
            field, &corners, center, normal, area, radius, true,
        );
        let (value_source, wrt_source) = integral_of_rankine_source(
            field, &corners, center, normal, area, radius, false,
        );
        assert_eq!(value_field, value_source);
        for d in 0..3 {
            assert_eq!(wrt_source[d], -wrt_field[d]);
        }
    }

    #[test]
    fn test_degenerate_triangle_edge_is_skipped() {
        // A triangle stored with a repeated last vertex must give a finite
        // value.
        let corners = [
            [0.0, 0.0, -1.0],
            [1.0, 0.0, -1.0],
            [0.0, 1.0, -1.0],
            [0.0, 1.0, -1.0],
        ];
        let center = [1.0 / 3.0, 1.0 / 3.0, -1.0];
        let normal = [0.0, 0.0, 1.0];
        let radius = norm(sub([1.0, 0.0, -1.0], center));
        let (value, gradient) = integral_of_rankine_source(
            [0.2, 0.1, 0.5],
            &corners,
            center,
            normal,
            0.5,
            radius,
            true,
        );
        assert!(value.is_finite() && value > 0.0);
        assert!(gradient.iter().all(|g| g.is_finite()));
    }

    #[test]
    fn test_reflection_equals_explicitly_mirrored_panel() {
        // Mirror the panel through the free surface by hand (z negated,
        // winding reversed to keep the edge loop consistent with the normal)
        // and compare against the reflected kernel.
        let (corners, center, normal, area, radius) = unit_square(-1.5);
        let mirrored_corners = [
            [-0.5, 0.5, 1.5],
            [0.5, 0.5, 1.5],
            [0.5, -0.5, 1.5],
            [-0.5, -0.5, 1.5],
        ];
        let mirrored_center = [0.0, 0.0, 1.5];
        let mirrored_normal = [0.0, 0.0, -1.0];
        let field = [0.4, 0.9, -0.7];

        let (value, gradient) = integral_of_reflected_rankine_source(
            field,
            &corners,
            center,
            normal,
            area,
            radius,
            MirrorPlane::FREE_SURFACE,
            true,
        );
        let (expected_value, expected_gradient) = integral_of_rankine_source(
            field,
            &mirrored_corners,
            mirrored_center,
            mirrored_normal,
            area,
            radius,
            true,
        );
        assert_relative_eq!(value, expected_value, max_relative = 1e-12);
        for d in 0..3 {
            assert_relative_eq!(
                gradient[d],
                expected_gradient[d],
                max_relative = 1e-12,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_source_gradient_of_reflection_flips_only_horizontal_components() {
        // Shifting the source panel upward moves its free-surface image
        // downward, so the vertical source derivative keeps the sign of the
        // field derivative while the horizontal ones are negated.
        let (corners, center, normal, area, radius) = unit_square(-1.5);
        let field = [0.4, 0.9, -0.7];
        let (_, wrt_field) = integral_of_reflected_rankine_source(
            field,
            &corners,
            center,
            normal,
            area,
            radius,
            MirrorPlane::FREE_SURFACE,
            true,
        );
        let (_, wrt_source) = integral_of_reflected_rankine_source(
            field,
            &corners,
            center,
            normal,
            area,
            radius,
            MirrorPlane::FREE_SURFACE,
            false,
        );
        assert_eq!(wrt_source[0], -wrt_field[0]);
        assert_eq!(wrt_source[1], -wrt_field[1]);
        assert_eq!(wrt_source[2], wrt_field[2]);
    }

    #[test]
    fn test_one_point_reflection_through_sea_bottom() {
        // The [-1, -2h] image of a source at depth d sits at -2h + d; the
        // one-point kernel must see exactly that distance.
        let depth = 3.0;
        let plane = MirrorPlane {
            sign: -1.0,
            offset: -2.0 * depth,
        };
        let center = [0.0, 0.0, -1.0];
        let field = [0.0, 0.0, -2.0];
        let (value, _) = one_point_reflected_rankine(field, center, 1.0, plane, true);
        // Image at z = -2*3 + 1 = -5, distance to field 3.
        assert_relative_eq!(value, 1.0 / 3.0, max_relative = 1e-12);
    }
}
