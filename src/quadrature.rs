//! Embedded Gauss-Legendre rules on the reference square.

use itertools::izip;
use std::collections::HashMap;

/// Requested rule is not in the embedded registry.
#[derive(thiserror::Error, Debug)]
pub enum QuadratureError {
    /// No rule with this number of points per direction.
    #[error("no embedded Gauss-Legendre rule with {0} points per direction")]
    RuleNotFound(usize),
}

/// A quadrature rule on the reference square `[-1, 1]^2`.
pub struct QuadratureRule {
    /// Degree of polynomial exactness.
    pub order: usize,
    /// The number of points of the rule.
    pub npoints: usize,
    /// Point coordinates, stored as consecutive `(xi, eta)` pairs.
    pub points: Vec<f64>,
    /// Weights of the rule, summing to the reference area 4.
    pub weights: Vec<f64>,
}

lazy_static! {
    static ref GAUSS_LEGENDRE_1D: HashMap<usize, (Vec<f64>, Vec<f64>)> = {
        let mut rules = HashMap::new();
        rules.insert(1, (vec![0.0], vec![2.0]));
        rules.insert(
            2,
            (
                vec![-0.5773502691896257, 0.5773502691896257],
                vec![1.0, 1.0],
            ),
        );
        rules.insert(
            3,
            (
                vec![-0.7745966692414834, 0.0, 0.7745966692414834],
                vec![5.0 / 9.0, 8.0 / 9.0, 5.0 / 9.0],
            ),
        );
        rules.insert(
            4,
            (
                vec![
                    -0.8611363115940526,
                    -0.3399810435848563,
                    0.3399810435848563,
                    0.8611363115940526,
                ],
                vec![
                    0.3478548451374538,
                    0.6521451548625462,
                    0.6521451548625462,
                    0.3478548451374538,
                ],
            ),
        );
        rules
    };
}

/// Return the tensor Gauss-Legendre rule with `points_per_direction^2` points.
///
/// If no 1-D rule with this number of points is embedded an error is returned.
pub fn reference_square_rule(
    points_per_direction: usize,
) -> Result<QuadratureRule, QuadratureError> {
    let (nodes, weights_1d) = GAUSS_LEGENDRE_1D
        .get(&points_per_direction)
        .ok_or(QuadratureError::RuleNotFound(points_per_direction))?;
    let npoints = points_per_direction * points_per_direction;
    let mut points = Vec::with_capacity(2 * npoints);
    let mut weights = Vec::with_capacity(npoints);
    for (xi, weight_xi) in izip!(nodes, weights_1d) {
        for (eta, weight_eta) in izip!(nodes, weights_1d) {
            points.push(*xi);
            points.push(*eta);
            weights.push(weight_xi * weight_eta);
        }
    }
    Ok(QuadratureRule {
        order: 2 * points_per_direction - 1,
        npoints,
        points,
        weights,
    })
}

/// The numbers of points per direction for which rules are embedded.
pub fn available_rules() -> Vec<usize> {
    let mut rules: Vec<usize> = GAUSS_LEGENDRE_1D.keys().copied().collect();
    rules.sort_unstable();
    rules
}
