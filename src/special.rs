//! Special functions used by the wave-part kernels.
//!
//! All routines are double precision, split into a power-series branch for
//! moderate arguments and an asymptotic branch beyond, with the switch points
//! chosen so that the series still sums without destructive cancellation.

use rlst::c64;

/// Euler's constant.
pub const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Principal value of the integral of `exp(u zeta) / (u - 1)` over `u` from 0
/// to infinity, for `Re zeta <= 0` and `Im zeta >= 0`, equal to
/// `exp(zeta) (E1(zeta) + i pi)` with the principal branch of the exponential
/// integral.
///
/// This is the Cauchy kernel of the free-surface wave integrand. On the
/// negative real axis (approached from above) the `i pi` contribution cancels
/// the jump of `E1` across its branch cut, so the value is real there:
/// `-exp(zeta) Ei(-zeta)`.
pub fn pv_wave_integrand(zeta: c64) -> c64 {
    debug_assert!(zeta.re <= 0.0 && zeta.im >= 0.0);
    if zeta.norm() <= 14.0 {
        // E1(zeta) = -gamma - ln(zeta) + sum_{n>=1} (-1)^(n+1) zeta^n / (n n!)
        let mut term = c64::new(1.0, 0.0);
        let mut sum = c64::new(0.0, 0.0);
        for n in 1..100 {
            term *= -zeta / n as f64;
            let contribution = -term / n as f64;
            sum += contribution;
            if contribution.norm() < 1e-18 * (1.0 + sum.norm()) {
                break;
            }
        }
        let e1 = -EULER_GAMMA - zeta.ln() + sum;
        zeta.exp() * (e1 + c64::new(0.0, std::f64::consts::PI))
    } else {
        // exp(zeta) E1(zeta) ~ sum_{n>=0} (-1)^n n! / zeta^(n+1), truncated
        // near its optimal order; the i pi exp(zeta) part is kept explicitly
        // and is below the truncation error wherever the series branch is
        // taken on the negative real axis.
        let mut term = 1.0 / zeta;
        let mut sum = term;
        for n in 1..20 {
            term *= -(n as f64) / zeta;
            sum += term;
        }
        sum + c64::new(0.0, std::f64::consts::PI) * zeta.exp()
    }
}

/// Bessel function of the first kind, order zero.
pub fn bessel_j0(x: f64) -> f64 {
    debug_assert!(x >= 0.0);
    if x <= 16.0 {
        // J0 = sum_m (-1)^m (x^2/4)^m / (m!)^2
        let q = 0.25 * x * x;
        let mut term = 1.0;
        let mut sum = 1.0;
        for m in 1..60 {
            term *= -q / ((m * m) as f64);
            sum += term;
            if term.abs() < 1e-18 {
                break;
            }
        }
        sum
    } else {
        let (p, q) = amplitude_coefficients_j0(x);
        let chi = x - std::f64::consts::FRAC_PI_4;
        (2.0 / (std::f64::consts::PI * x)).sqrt() * (p * chi.cos() - q * chi.sin())
    }
}

/// Bessel function of the first kind, order one.
pub fn bessel_j1(x: f64) -> f64 {
    debug_assert!(x >= 0.0);
    if x <= 16.0 {
        // J1 = (x/2) sum_m (-1)^m (x^2/4)^m / (m! (m+1)!)
        let q = 0.25 * x * x;
        let mut term = 1.0;
        let mut sum = 1.0;
        for m in 1..60 {
            term *= -q / ((m * (m + 1)) as f64);
            sum += term;
            if term.abs() < 1e-18 {
                break;
            }
        }
        0.5 * x * sum
    } else {
        let (p, q) = amplitude_coefficients_j1(x);
        let chi = x - 3.0 * std::f64::consts::FRAC_PI_4;
        (2.0 / (std::f64::consts::PI * x)).sqrt() * (p * chi.cos() - q * chi.sin())
    }
}

/// Bessel function of the second kind, order zero.
pub fn bessel_y0(x: f64) -> f64 {
    debug_assert!(x > 0.0);
    if x <= 16.0 {
        // Y0 = (2/pi) [(ln(x/2) + gamma) J0
        //              + sum_{m>=1} (-1)^(m+1) H_m (x^2/4)^m / (m!)^2]
        let q = 0.25 * x * x;
        let mut term = 1.0;
        let mut harmonic = 0.0;
        let mut sum = 0.0;
        for m in 1..60 {
            term *= -q / ((m * m) as f64);
            harmonic += 1.0 / m as f64;
            sum -= term * harmonic;
            if term.abs() < 1e-18 {
                break;
            }
        }
        std::f64::consts::FRAC_2_PI * (((0.5 * x).ln() + EULER_GAMMA) * bessel_j0(x) + sum)
    } else {
        let (p, q) = amplitude_coefficients_j0(x);
        let chi = x - std::f64::consts::FRAC_PI_4;
        (2.0 / (std::f64::consts::PI * x)).sqrt() * (p * chi.sin() + q * chi.cos())
    }
}

/// Bessel function of the second kind, order one.
pub fn bessel_y1(x: f64) -> f64 {
    debug_assert!(x > 0.0);
    if x <= 16.0 {
        // Y1 = (2/pi) [(ln(x/2) + gamma) J1 - 1/x
        //              - (x/4) sum_{m>=0} (-1)^m (H_m + H_{m+1})
        //                                 (x^2/4)^m / (m! (m+1)!)]
        let q = 0.25 * x * x;
        let mut term = 1.0;
        let mut harmonic = 0.0;
        let mut sum = 1.0; // m = 0: (H_0 + H_1) / (0! 1!) = 1
        for m in 1..60 {
            term *= -q / ((m * (m + 1)) as f64);
            harmonic += 1.0 / m as f64;
            sum += term * (2.0 * harmonic + 1.0 / (m + 1) as f64);
            if term.abs() < 1e-18 {
                break;
            }
        }
        std::f64::consts::FRAC_2_PI
            * (((0.5 * x).ln() + EULER_GAMMA) * bessel_j1(x) - 1.0 / x - 0.25 * x * sum)
    } else {
        let (p, q) = amplitude_coefficients_j1(x);
        let chi = x - 3.0 * std::f64::consts::FRAC_PI_4;
        (2.0 / (std::f64::consts::PI * x)).sqrt() * (p * chi.sin() + q * chi.cos())
    }
}

/// Modified Bessel function of the second kind, order zero.
pub fn bessel_k0(x: f64) -> f64 {
    debug_assert!(x > 0.0);
    if x <= 10.0 {
        // K0 = -(ln(x/2) + gamma) I0 + sum_{m>=1} H_m (x^2/4)^m / (m!)^2
        let q = 0.25 * x * x;
        let mut term = 1.0;
        let mut i0 = 1.0;
        let mut harmonic = 0.0;
        let mut sum = 0.0;
        for m in 1..60 {
            term *= q / ((m * m) as f64);
            harmonic += 1.0 / m as f64;
            i0 += term;
            sum += term * harmonic;
            if term.abs() < 1e-18 * i0 {
                break;
            }
        }
        -((0.5 * x).ln() + EULER_GAMMA) * i0 + sum
    } else {
        let z = 1.0 / (8.0 * x);
        let series = 1.0 + z * (-1.0 + z * (4.5 + z * (-37.5 + z * 459.375)));
        (std::f64::consts::FRAC_PI_2 / x).sqrt() * (-x).exp() * series
    }
}

/// Modified Bessel function of the second kind, order one.
pub fn bessel_k1(x: f64) -> f64 {
    debug_assert!(x > 0.0);
    if x <= 10.0 {
        // K1 = 1/x + ln(x/2) I1
        //      - (x/4) sum_{m>=0} (H_m + H_{m+1} - 2 gamma)
        //                         (x^2/4)^m / (m! (m+1)!)
        let q = 0.25 * x * x;
        let mut term = 1.0;
        let mut harmonic = 0.0;
        let mut i1 = 1.0;
        let mut sum = 1.0 - 2.0 * EULER_GAMMA; // m = 0 term
        for m in 1..60 {
            term *= q / ((m * (m + 1)) as f64);
            harmonic += 1.0 / m as f64;
            i1 += term;
            sum += term * (2.0 * harmonic + 1.0 / (m + 1) as f64 - 2.0 * EULER_GAMMA);
            if term.abs() < 1e-18 * i1 {
                break;
            }
        }
        1.0 / x + (0.5 * x).ln() * 0.5 * x * i1 - 0.25 * x * sum
    } else {
        let z = 1.0 / (8.0 * x);
        let series = 1.0 + z * (3.0 + z * (-7.5 + z * (52.5 - 590.625 * z)));
        (std::f64::consts::FRAC_PI_2 / x).sqrt() * (-x).exp() * series
    }
}

// Large-argument amplitude polynomials P, Q of the Hankel asymptotic forms,
// through (8x)^-4 and (8x)^-3 respectively.
fn amplitude_coefficients_j0(x: f64) -> (f64, f64) {
    let x2 = x * x;
    let p = 1.0 - 9.0 / (128.0 * x2) + 3675.0 / (32768.0 * x2 * x2);
    let q = -1.0 / (8.0 * x) + 75.0 / (1024.0 * x2 * x);
    (p, q)
}

fn amplitude_coefficients_j1(x: f64) -> (f64, f64) {
    let x2 = x * x;
    let p = 1.0 + 15.0 / (128.0 * x2) - 4725.0 / (32768.0 * x2 * x2);
    let q = 3.0 / (8.0 * x) - 105.0 / (1024.0 * x2 * x);
    (p, q)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use paste::paste;

    macro_rules! test_reference_value {
        ($function:ident, $name:ident, $x:expr, $value:expr, $tol:expr) => {
            paste! {
                #[test]
                fn [<test_ $function _ $name>]() {
                    assert_relative_eq!($function($x), $value, max_relative = $tol);
                }
            }
        };
    }

    test_reference_value!(bessel_j0, at_1, 1.0, 0.7651976865579666, 1e-13);
    test_reference_value!(bessel_j0, at_5, 5.0, -0.17759677131433830, 1e-12);
    test_reference_value!(bessel_j1, at_1, 1.0, 0.4400505857449335, 1e-13);
    test_reference_value!(bessel_j1, at_5, 5.0, -0.3275791375914652, 1e-12);
    test_reference_value!(bessel_y0, at_1, 1.0, 0.08825696421567696, 1e-12);
    test_reference_value!(bessel_y0, at_5, 5.0, -0.30851762524903376, 1e-12);
    test_reference_value!(bessel_y1, at_1, 1.0, -0.7812128213002887, 1e-12);
    test_reference_value!(bessel_k0, at_1, 1.0, 0.42102443824070834, 1e-12);
    test_reference_value!(bessel_k1, at_1, 1.0, 0.6019072301972346, 1e-12);

    #[test]
    fn test_cylinder_wronskian() {
        // J1(x) Y0(x) - J0(x) Y1(x) = 2/(pi x) at any x, which exercises
        // both the series and the asymptotic branches of all four functions.
        for x in [0.3, 1.0, 5.0, 15.9, 16.1, 40.0] {
            let wronskian = bessel_j1(x) * bessel_y0(x) - bessel_j0(x) * bessel_y1(x);
            assert_relative_eq!(wronskian, std::f64::consts::FRAC_2_PI / x, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_derivative_identities() {
        // J0' = -J1, Y0' = -Y1 and K0' = -K1, by central differences. The
        // sample points keep the ascending series far enough from their
        // switch points that cancellation noise stays below the tolerance.
        let h = 1e-6;
        for x in [2.0, 5.0, 20.0] {
            let dj = (bessel_j0(x + h) - bessel_j0(x - h)) / (2.0 * h);
            assert_relative_eq!(dj, -bessel_j1(x), max_relative = 1e-6, epsilon = 1e-8);
            let dy = (bessel_y0(x + h) - bessel_y0(x - h)) / (2.0 * h);
            assert_relative_eq!(dy, -bessel_y1(x), max_relative = 1e-6, epsilon = 1e-8);
            let dk = (bessel_k0(x + h) - bessel_k0(x - h)) / (2.0 * h);
            assert_relative_eq!(dk, -bessel_k1(x), max_relative = 1e-5, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_pv_integrand_real_on_negative_axis() {
        // On the negative real axis the value is -exp(zeta) Ei(-zeta); with
        // Ei(1) = 1.8951178163559368 this gives a closed reference value.
        let v = pv_wave_integrand(c64::new(-1.0, 0.0));
        assert_relative_eq!(v.re, -1.8951178163559368 * (-1.0f64).exp(), max_relative = 1e-12);
        assert!(v.im.abs() < 1e-12);
    }

    #[test]
    fn test_pv_integrand_derivative_identity() {
        // The integrand L satisfies L'(zeta) = L(zeta) - 1/zeta, checked by
        // central differences in both branches.
        for zeta in [
            c64::new(-0.8, 1.3),
            c64::new(-3.0, 2.0),
            c64::new(-2.0, 30.0),
            c64::new(-16.0, 4.0),
        ] {
            let h = 1e-5;
            let dre = (pv_wave_integrand(zeta + c64::new(h, 0.0))
                - pv_wave_integrand(zeta - c64::new(h, 0.0)))
                / (2.0 * h);
            let expected = pv_wave_integrand(zeta) - 1.0 / zeta;
            assert_relative_eq!(dre.re, expected.re, max_relative = 1e-5);
            assert_relative_eq!(dre.im, expected.im, max_relative = 1e-5);
        }
    }
}
