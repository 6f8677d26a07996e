//! End-to-end assembly of the influence matrices through the public API.

use approx::assert_relative_eq;
use rlst::{rlst_dynamic_array2, rlst_dynamic_array3, RandomAccessByRef, RandomAccessMut};
use wavebem::assembly::InfluenceAssembler;
use wavebem::green::finite_depth::dispersion_roots;
use wavebem::mesh::PanelMesh;
use wavebem::shapes::{rectangular_plate, sphere};
use wavebem::tabulation::{Tabulation, DEFAULT_NB_INTEGRATION_POINTS};
use wavebem::types::{FiniteDepthMethod, PronyTerm, RlstArray, SingularityTreatment, WaterDepth};

fn normals_of(mesh: &PanelMesh) -> RlstArray<f64, 2> {
    let mut normals = rlst_dynamic_array2!(f64, [mesh.npanels(), 3]);
    for i in 0..mesh.npanels() {
        let normal = mesh.normal(i);
        for d in 0..3 {
            *normals.get_mut([i, d]).unwrap() = normal[d];
        }
    }
    normals
}

#[test]
fn test_submerged_sphere_in_infinite_depth() {
    let tabulation = Tabulation::legacy(DEFAULT_NB_INTEGRATION_POINTS);
    let mesh = sphere(1.0, -2.0, 6, 12);
    let npanels = mesh.npanels();
    let normals = normals_of(&mesh);
    let mut influence = rlst_dynamic_array2!(rlst::c64, [npanels, npanels]);
    let mut gradient = rlst_dynamic_array3!(rlst::c64, [npanels, npanels, 1]);

    let assembler = InfluenceAssembler::new(&tabulation, 1.0, WaterDepth::INFINITE);
    assembler
        .assemble_into_dense(&mut influence, &mut gradient, &mesh, &mesh, &normals)
        .unwrap();

    for i in 0..npanels {
        for j in 0..npanels {
            assert!(influence.get([i, j]).unwrap().re.is_finite());
            assert!(gradient.get([i, j, 0]).unwrap().re.is_finite());
        }
    }

    // The radiated part of the Green function is symmetric in its two
    // points, so with the centroid quadrature the imaginary parts of the
    // potential matrix are area-reciprocal.
    for i in 0..npanels {
        for j in 0..npanels {
            assert_relative_eq!(
                influence.get([i, j]).unwrap().im * mesh.area(i),
                influence.get([j, i]).unwrap().im * mesh.area(j),
                max_relative = 1e-10,
                epsilon = 1e-12
            );
        }
    }
}

#[test]
fn test_panel_in_the_free_surface_takes_the_full_jump() {
    let tabulation = Tabulation::legacy(DEFAULT_NB_INTEGRATION_POINTS);
    let mesh = rectangular_plate(1.0, 1.0, 0.0, 1, 1);
    let normals = normals_of(&mesh);
    let mut influence = rlst_dynamic_array2!(rlst::c64, [1, 1]);
    let mut gradient = rlst_dynamic_array3!(rlst::c64, [1, 1, 1]);

    let mut assembler = InfluenceAssembler::new(&tabulation, 1.0, WaterDepth::INFINITE);
    assembler.coefficients([0.0, 0.0, 0.0]);
    assembler
        .assemble_into_dense(&mut influence, &mut gradient, &mesh, &mesh, &normals)
        .unwrap();
    assert_relative_eq!(gradient.get([0, 0, 0]).unwrap().re, 1.0);
}

#[test]
fn test_finite_depth_assembly_with_all_terms() {
    let tabulation = Tabulation::legacy(DEFAULT_NB_INTEGRATION_POINTS);
    let mesh = sphere(0.8, -1.5, 4, 8);
    let npanels = mesh.npanels();
    let normals = normals_of(&mesh);
    let wavenumber = 0.9;
    let depth = 4.0;

    for (method, treatment) in [
        (
            FiniteDepthMethod::Legacy,
            SingularityTreatment::LowFrequency,
        ),
        (
            FiniteDepthMethod::ExponentialDecomposition,
            SingularityTreatment::LowFrequencyWithRankinePart,
        ),
        (
            FiniteDepthMethod::EigenfunctionExpansion,
            SingularityTreatment::LowFrequency,
        ),
    ] {
        let mut assembler =
            InfluenceAssembler::new(&tabulation, wavenumber, WaterDepth::finite(depth));
        assembler.finite_depth_method(method);
        assembler.singularity_treatment(treatment);
        assembler.prony_decomposition(vec![
            PronyTerm {
                amplitude: 0.22,
                exponent: -0.5,
            },
            PronyTerm {
                amplitude: 0.07,
                exponent: -1.8,
            },
        ]);
        assembler.dispersion_roots(dispersion_roots(30, wavenumber, depth));

        let mut influence = rlst_dynamic_array2!(rlst::c64, [npanels, npanels]);
        let mut gradient = rlst_dynamic_array3!(rlst::c64, [npanels, npanels, 3]);
        assembler
            .assemble_into_dense(&mut influence, &mut gradient, &mesh, &mesh, &normals)
            .unwrap();
        for i in 0..npanels {
            for j in 0..npanels {
                assert!(influence.get([i, j]).unwrap().norm().is_finite());
                for d in 0..3 {
                    assert!(gradient.get([i, j, d]).unwrap().norm().is_finite());
                }
            }
        }
    }
}
