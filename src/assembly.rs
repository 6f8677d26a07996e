//! Dense assembly of the influence matrices.
//!
//! For every pair of a field panel and a source panel the assembler sums the
//! weighted Rankine, reflected and wave terms of the Green function into the
//! potential matrix and its gradient, parallelizing over the columns of the
//! output so that each task owns a contiguous block of the column-major
//! storage.

use crate::green::rankine::{
    integral_of_rankine_source, integral_of_reflected_rankine_source, one_point_reflected_rankine,
    MirrorPlane,
};
use crate::green::wave::{wave_part_integral, WaveTermContext};
use crate::mesh::PanelMesh;
use crate::tabulation::Tabulation;
use crate::types::{FiniteDepthMethod, PronyTerm, RlstArray, SingularityTreatment, WaterDepth};
use log::warn;
use num::Zero;
use rayon::prelude::*;
use rlst::{c64, RandomAccessByRef, RawAccessMut, Shape};

// Panels whose center is this close to z = 0 are lying in the free surface.
const FREE_SURFACE_TOLERANCE: f64 = 1e-8;

/// Errors detected while validating assembly inputs.
#[derive(thiserror::Error, Debug)]
pub enum AssemblyError {
    /// An array does not match the shape the mesh pair requires.
    #[error("{0} has shape {1:?} but {2:?} is required")]
    ArrayShape(&'static str, Vec<usize>, Vec<usize>),
    /// The wavenumber is not usable.
    #[error("wavenumber must be finite and non-negative, got {0}")]
    InvalidWavenumber(f64),
    /// The water depth is not usable.
    #[error("water depth must be positive and finite, got {0}")]
    InvalidDepth(f64),
    /// A finite-depth method is missing its precomputed data.
    #[error("the {0:?} method requires {1}")]
    MissingMethodData(FiniteDepthMethod, &'static str),
}

// Raw 2D data
struct RawData2D {
    data: *mut c64,
    shape: [usize; 2],
}

unsafe impl Sync for RawData2D {}

// Raw 3D data
struct RawData3D {
    data: *mut c64,
    shape: [usize; 3],
}

unsafe impl Sync for RawData3D {}

// The diagonal jump term and the coincidence shortcuts only apply when both
// arguments are physically the same mesh, not merely equal-valued ones.
fn equal_meshes(first: &PanelMesh, second: &PanelMesh) -> bool {
    std::ptr::addr_of!(*first) as usize == std::ptr::addr_of!(*second) as usize
}

/// Assembler for the influence matrices of a pair of panel meshes.
///
/// The three coefficients weight the direct Rankine term, the reflected term
/// and the wave term of the Green function; the overall `-1/(4 pi)` factor is
/// applied by the assembler itself.
pub struct InfluenceAssembler<'a> {
    wavenumber: f64,
    depth: WaterDepth,
    tabulation: &'a Tabulation,
    coefficients: [f64; 3],
    treatment: SingularityTreatment,
    method: FiniteDepthMethod,
    prony: Vec<PronyTerm>,
    dispersion_roots: Vec<f64>,
    adjoint: bool,
}

impl<'a> InfluenceAssembler<'a> {
    /// Create a new assembler with unit coefficients, low-frequency
    /// singularity treatment and the legacy finite-depth method.
    pub fn new(tabulation: &'a Tabulation, wavenumber: f64, depth: WaterDepth) -> Self {
        Self {
            wavenumber,
            depth,
            tabulation,
            coefficients: [1.0, 1.0, 1.0],
            treatment: SingularityTreatment::LowFrequency,
            method: FiniteDepthMethod::Legacy,
            prony: Vec::new(),
            dispersion_roots: Vec::new(),
            adjoint: false,
        }
    }

    /// Set the weights of the Rankine, reflected and wave terms.
    pub fn coefficients(&mut self, coefficients: [f64; 3]) {
        self.coefficients = coefficients;
    }

    /// Set the singularity-handling mode of the wave term.
    pub fn singularity_treatment(&mut self, treatment: SingularityTreatment) {
        self.treatment = treatment;
    }

    /// Set the evaluation method used in finite depth.
    pub fn finite_depth_method(&mut self, method: FiniteDepthMethod) {
        self.method = method;
    }

    /// Set the exponential decomposition read by the Prony-family methods.
    pub fn prony_decomposition(&mut self, terms: Vec<PronyTerm>) {
        self.prony = terms;
    }

    /// Set the dispersion roots read by the eigenfunction expansion.
    pub fn dispersion_roots(&mut self, roots: Vec<f64>) {
        self.dispersion_roots = roots;
    }

    /// Differentiate with respect to the field point instead of the source
    /// point; the collapsed gradient then uses the field mesh normals.
    pub fn adjoint(&mut self, adjoint: bool) {
        self.adjoint = adjoint;
    }

    fn validate(
        &self,
        influence_shape: [usize; 2],
        gradient_shape: [usize; 3],
        normals_shape: [usize; 2],
        field_panels: usize,
        source_panels: usize,
    ) -> Result<(), AssemblyError> {
        if influence_shape != [field_panels, source_panels] {
            return Err(AssemblyError::ArrayShape(
                "the influence matrix",
                influence_shape.to_vec(),
                vec![field_panels, source_panels],
            ));
        }
        if gradient_shape[0] != field_panels
            || gradient_shape[1] != source_panels
            || !(gradient_shape[2] == 1 || gradient_shape[2] == 3)
        {
            return Err(AssemblyError::ArrayShape(
                "the gradient matrix",
                gradient_shape.to_vec(),
                vec![field_panels, source_panels, 3],
            ));
        }
        let normal_rows = if self.adjoint {
            field_panels
        } else {
            source_panels
        };
        if normals_shape != [normal_rows, 3] {
            return Err(AssemblyError::ArrayShape(
                "the dot-product normals",
                normals_shape.to_vec(),
                vec![normal_rows, 3],
            ));
        }
        if !self.wavenumber.is_finite() || self.wavenumber < 0.0 {
            return Err(AssemblyError::InvalidWavenumber(self.wavenumber));
        }
        if !self.depth.is_infinite() {
            let depth = self.depth.value();
            if !depth.is_finite() || depth <= 0.0 {
                return Err(AssemblyError::InvalidDepth(depth));
            }
            if self.method.needs_decomposition() && self.prony.is_empty() {
                return Err(AssemblyError::MissingMethodData(
                    self.method,
                    "an exponential decomposition",
                ));
            }
            if self.method.needs_dispersion_roots() && self.dispersion_roots.is_empty() {
                return Err(AssemblyError::MissingMethodData(
                    self.method,
                    "roots of the dispersion relation",
                ));
            }
        } else if self.method.needs_dispersion_roots() {
            return Err(AssemblyError::MissingMethodData(
                self.method,
                "a finite water depth",
            ));
        }
        Ok(())
    }

    // Green function of one field-source panel pair: the value and its
    // gradient with respect to the source point, or to the field point when
    // assembling the adjoint operator. `coefficients` are the term weights
    // with the `-1/(4 pi)` factor already folded in.
    #[allow(clippy::too_many_arguments)]
    fn influence_for_pair(
        &self,
        field_mesh: &PanelMesh,
        field_index: usize,
        source_mesh: &PanelMesh,
        source_index: usize,
        coefficients: [f64; 3],
        same_body: bool,
        dot_product_normals: &RlstArray<f64, 2>,
        context: &WaveTermContext<'_>,
    ) -> (c64, [c64; 3]) {
        let field = field_mesh.center(field_index);
        let wrt_field = self.adjoint;
        let mut value = c64::zero();
        let mut gradient = [c64::zero(); 3];

        // Jump term of the double-layer operator, carried unscaled on the
        // diagonal; panels lying in the free surface take the full jump.
        if same_body && field_index == source_index {
            let jump = if field[2].abs() < FREE_SURFACE_TOLERANCE {
                1.0
            } else {
                0.5
            };
            for d in 0..3 {
                gradient[d] += jump * *dot_product_normals.get([field_index, d]).unwrap();
            }
        }

        if coefficients[0] != 0.0 {
            let (direct, direct_gradient) = integral_of_rankine_source(
                field,
                &source_mesh.corners(source_index),
                source_mesh.center(source_index),
                source_mesh.normal(source_index),
                source_mesh.area(source_index),
                source_mesh.radius(source_index),
                wrt_field,
            );
            value += coefficients[0] * direct;
            for d in 0..3 {
                gradient[d] += coefficients[0] * direct_gradient[d];
            }
        }

        let rankine_coupling = matches!(
            self.treatment,
            SingularityTreatment::LowFrequencyWithRankinePart
        );
        if coefficients[1] != 0.0 || (coefficients[2] != 0.0 && rankine_coupling) {
            let (reflected, reflected_gradient) = if self.method.one_point_base_reflection()
                && !self.depth.is_infinite()
            {
                one_point_reflected_rankine(
                    field,
                    source_mesh.center(source_index),
                    source_mesh.area(source_index),
                    MirrorPlane::FREE_SURFACE,
                    wrt_field,
                )
            } else {
                integral_of_reflected_rankine_source(
                    field,
                    &source_mesh.corners(source_index),
                    source_mesh.center(source_index),
                    source_mesh.normal(source_index),
                    source_mesh.area(source_index),
                    source_mesh.radius(source_index),
                    MirrorPlane::FREE_SURFACE,
                    wrt_field,
                )
            };
            value += coefficients[1] * reflected;
            for d in 0..3 {
                gradient[d] += coefficients[1] * reflected_gradient[d];
            }
            // The mode that keeps the vertical Rankine part out of the wave
            // term recovers it here from the exactly integrated reflection.
            if coefficients[2] != 0.0 && rankine_coupling {
                gradient[2] += coefficients[2] * 2.0 * self.wavenumber * reflected;
            }
            if !self.depth.is_infinite()
                && self.method.uses_bottom_images()
                && coefficients[1] != 0.0
            {
                let depth = self.depth.value();
                for plane in bottom_image_planes(depth) {
                    let (image, image_gradient) = one_point_reflected_rankine(
                        field,
                        source_mesh.center(source_index),
                        source_mesh.area(source_index),
                        plane,
                        wrt_field,
                    );
                    value += coefficients[1] * image;
                    for d in 0..3 {
                        gradient[d] += coefficients[1] * image_gradient[d];
                    }
                }
            }
        }

        if coefficients[2] != 0.0 {
            let (wave, wave_gradient) =
                wave_part_integral(field, source_mesh, source_index, context, wrt_field);
            value += coefficients[2] * wave;
            for d in 0..3 {
                gradient[d] += coefficients[2] * wave_gradient[d];
            }
        }

        (value, gradient)
    }

    /// Assemble the potential and gradient influence matrices of a mesh pair.
    ///
    /// `influence` must have shape `[field panels, source panels]`. The last
    /// dimension of `gradient_influence` is either 3 for the full gradient or
    /// 1 for the gradient collapsed against `dot_product_normals`, whose rows
    /// follow the source mesh, or the field mesh for an adjoint assembler.
    pub fn assemble_into_dense(
        &self,
        influence: &mut RlstArray<c64, 2>,
        gradient_influence: &mut RlstArray<c64, 3>,
        field_mesh: &PanelMesh,
        source_mesh: &PanelMesh,
        dot_product_normals: &RlstArray<f64, 2>,
    ) -> Result<(), AssemblyError> {
        let field_panels = field_mesh.npanels();
        let source_panels = source_mesh.npanels();
        self.validate(
            influence.shape(),
            gradient_influence.shape(),
            dot_product_normals.shape(),
            field_panels,
            source_panels,
        )?;
        if self.coefficients[2] != 0.0 && self.wavenumber == 0.0 {
            warn!("the wave term is weighted but the wavenumber is zero");
        }

        // The overall -1/(4 pi) factor is folded into the term weights once
        // here, before the assembly loops.
        let scale = -0.25 * std::f64::consts::FRAC_1_PI;
        let coefficients = [
            scale * self.coefficients[0],
            scale * self.coefficients[1],
            scale * self.coefficients[2],
        ];

        let same_body = equal_meshes(field_mesh, source_mesh);
        let deriv_size = gradient_influence.shape()[2];
        let influence_raw = RawData2D {
            data: influence.data_mut().as_mut_ptr(),
            shape: influence.shape(),
        };
        let gradient_raw = RawData3D {
            data: gradient_influence.data_mut().as_mut_ptr(),
            shape: gradient_influence.shape(),
        };
        let context = WaveTermContext {
            wavenumber: self.wavenumber,
            depth: self.depth,
            tabulation: self.tabulation,
            treatment: self.treatment,
            method: self.method,
            prony: &self.prony,
            dispersion_roots: &self.dispersion_roots,
        };

        let columns: usize = (0..source_panels)
            .into_par_iter()
            .map(|source_index| {
                // Capture the Sync wrappers whole; a disjoint capture of the
                // raw-pointer fields would fall outside their `unsafe impl`.
                let influence_raw = &influence_raw;
                let gradient_raw = &gradient_raw;
                for field_index in 0..field_panels {
                    let (value, gradient) = self.influence_for_pair(
                        field_mesh,
                        field_index,
                        source_mesh,
                        source_index,
                        coefficients,
                        same_body,
                        dot_product_normals,
                        &context,
                    );
                    unsafe {
                        *influence_raw
                            .data
                            .add(field_index + influence_raw.shape[0] * source_index) = value;
                    }
                    if deriv_size == 1 {
                        let row = if self.adjoint { field_index } else { source_index };
                        let mut entry = c64::zero();
                        for d in 0..3 {
                            entry += gradient[d] * *dot_product_normals.get([row, d]).unwrap();
                        }
                        unsafe {
                            *gradient_raw
                                .data
                                .add(field_index + gradient_raw.shape[0] * source_index) = entry;
                        }
                    } else {
                        for d in 0..3 {
                            unsafe {
                                *gradient_raw.data.add(
                                    field_index
                                        + gradient_raw.shape[0]
                                            * (source_index + gradient_raw.shape[1] * d),
                                ) = gradient[d];
                            }
                        }
                    }
                }
                1
            })
            .sum();
        assert_eq!(columns, source_panels);
        Ok(())
    }
}

fn bottom_image_planes(depth: f64) -> [MirrorPlane; 4] {
    [
        MirrorPlane {
            sign: -1.0,
            offset: -2.0 * depth,
        },
        MirrorPlane {
            sign: 1.0,
            offset: -2.0 * depth,
        },
        MirrorPlane {
            sign: 1.0,
            offset: 2.0 * depth,
        },
        MirrorPlane {
            sign: -1.0,
            offset: -4.0 * depth,
        },
    ]
}
