//! Vocabulary types shared across the crate

use rlst::{Array, BaseArray, VectorContainer};

/// Alias for an owned dense rlst array.
pub type RlstArray<T, const NDIM: usize> = Array<T, BaseArray<T, VectorContainer<T>, NDIM>, NDIM>;

/// Water depth of the fluid domain.
///
/// Finite depths are measured from the free surface (`z = 0`) down to the flat
/// sea bottom (`z = -depth`). Infinite depth is a sentinel and must only be
/// tested through [`WaterDepth::is_infinite`], never by comparing the raw
/// value against a magic number.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaterDepth(f64);

impl WaterDepth {
    /// Infinitely deep water.
    pub const INFINITE: WaterDepth = WaterDepth(f64::INFINITY);

    /// Finite water depth.
    pub fn finite(depth: f64) -> Self {
        Self(depth)
    }

    /// True if this is the infinite-depth sentinel.
    pub fn is_infinite(&self) -> bool {
        self.0.is_infinite()
    }

    /// The depth value. Infinite for [`WaterDepth::INFINITE`].
    pub fn value(&self) -> f64 {
        self.0
    }
}

/// How the singular behaviour of the wave term is split between the Rankine
/// terms and the tabulated wave evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SingularityTreatment {
    /// The wave term carries the free-surface mirror source pointwise; the
    /// reflected-Rankine coefficient is expected to be negative.
    HighFrequency,
    /// The mirror source is left to the reflected-Rankine term; the wave term
    /// is the plain tabulated part.
    LowFrequency,
    /// As [`SingularityTreatment::LowFrequency`], but the vertical-derivative
    /// mirror contribution is also removed from the wave term and re-added by
    /// the assembly engine through the exact polygon integral of the
    /// reflected panel. More accurate for panels close to the free surface.
    LowFrequencyWithRankinePart,
}

/// Evaluation method for the wave term in finite depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FiniteDepthMethod {
    /// Historical method: mirror-superposition of the infinite-depth wave
    /// term plus an exponential-sum remainder, with the free-surface
    /// reflection of the Rankine part approximated at the panel centroid.
    Legacy,
    /// Same wave-term evaluation as [`FiniteDepthMethod::Legacy`], but the
    /// free-surface reflection uses the exact polygon integral.
    ExponentialDecomposition,
    /// John's eigenfunction expansion. Requires the real roots of the
    /// finite-depth dispersion relation and adds no sea-bottom image sources
    /// (the expansion already satisfies the bottom condition).
    EigenfunctionExpansion,
    /// Mirror-superposition of the infinite-depth wave term without any
    /// remainder correction. Requires neither decomposition nor roots;
    /// accurate for moderate to large `wavenumber * depth`.
    MirroredInfiniteDepth,
}

impl FiniteDepthMethod {
    /// True if the free-surface reflection of the Rankine part is evaluated
    /// at the panel centroid instead of by the exact polygon integral.
    pub fn one_point_base_reflection(&self) -> bool {
        matches!(self, FiniteDepthMethod::Legacy)
    }

    /// True if the engine adds the four one-point sea-bottom image sources.
    pub fn uses_bottom_images(&self) -> bool {
        !matches!(self, FiniteDepthMethod::EigenfunctionExpansion)
    }

    /// True if this method reads the exponential-sum decomposition.
    pub fn needs_decomposition(&self) -> bool {
        matches!(
            self,
            FiniteDepthMethod::Legacy | FiniteDepthMethod::ExponentialDecomposition
        )
    }

    /// True if this method reads the dispersion roots.
    pub fn needs_dispersion_roots(&self) -> bool {
        matches!(self, FiniteDepthMethod::EigenfunctionExpansion)
    }
}

/// One term of the exponential-sum (Prony) decomposition of the finite-depth
/// wave-kernel remainder.
///
/// The decomposition approximates the remainder kernel by
/// `sum_j amplitude_j * exp(exponent_j * kappa * depth)` over the integration
/// variable `kappa`; exponents must be negative so that every resulting image
/// source lies strictly below the free surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PronyTerm {
    /// Amplitude of the exponential term.
    pub amplitude: f64,
    /// Depth-scaled exponent of the term, negative.
    pub exponent: f64,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_infinite_depth_predicate() {
        assert!(WaterDepth::INFINITE.is_infinite());
        assert!(!WaterDepth::finite(12.5).is_infinite());
        assert_eq!(WaterDepth::finite(12.5).value(), 12.5);
    }

    #[test]
    fn test_method_branch_matrix() {
        use FiniteDepthMethod::{
            EigenfunctionExpansion, ExponentialDecomposition, Legacy, MirroredInfiniteDepth,
        };
        assert!(Legacy.one_point_base_reflection());
        for m in [
            ExponentialDecomposition,
            EigenfunctionExpansion,
            MirroredInfiniteDepth,
        ] {
            assert!(!m.one_point_base_reflection());
        }
        for m in [Legacy, ExponentialDecomposition, MirroredInfiniteDepth] {
            assert!(m.uses_bottom_images());
        }
        assert!(!EigenfunctionExpansion.uses_bottom_images());
        assert!(Legacy.needs_decomposition());
        assert!(ExponentialDecomposition.needs_decomposition());
        assert!(EigenfunctionExpansion.needs_dispersion_roots());
        assert!(!MirroredInfiniteDepth.needs_decomposition());
        assert!(!MirroredInfiniteDepth.needs_dispersion_roots());
    }
}
