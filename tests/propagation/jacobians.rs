use crate::{leo, test_epoch};
use dsst::cosmic::{
    ElementKind, Ephemeris, EquinoctialState, KeplerianEphemeris, UniformRotation, EARTH_J2000,
};
use dsst::dynamics::{
    AtmosphereModel, AtmosphericDrag, AuxiliaryElements, Contribution, GaussianQuadratureOptions,
    HarmonicsMem, MeanElementDynamics, SolarRadiationPressure, SpacecraftShape,
    TesseralHarmonics, ThirdBody, ZonalHarmonics, CENTRAL_ATTRACTION_COEFFICIENT,
    DRAG_COEFFICIENT, REFLECTION_COEFFICIENT,
};
use dsst::linalg::{DMatrix, Vector6};
use dsst::propagators::*;
use dsst::time::{Epoch, Unit};
use dsst::ErrorKind;
use rstest::*;
use std::sync::Arc;

/// Weights of the 8-point central difference, for the offsets 1h to 4h
const CENTRAL_WEIGHTS: [f64; 4] = [4.0 / 5.0, -1.0 / 5.0, 4.0 / 105.0, -1.0 / 280.0];

const MOON_COEFFICIENT: &str = "Moon attraction coefficient";

/// 4x4 gravity field with drag, about the Earth
fn gravity_and_drag() -> MeanElementDynamics {
    let field = Arc::new(HarmonicsMem::jgm3(4, 4));
    let opts = GaussianQuadratureOptions::default();
    let models: Vec<Arc<dyn Contribution>> = vec![
        ZonalHarmonics::new(field.clone(), &EARTH_J2000, 4, opts).unwrap(),
        TesseralHarmonics::new(
            field,
            Arc::new(UniformRotation::earth()),
            &EARTH_J2000,
            4,
            4,
            opts,
        )
        .unwrap(),
        AtmosphericDrag::new(
            AtmosphereModel::exponential_700km(),
            SpacecraftShape::Sphere { area_m2: 10.0 },
            2.2,
            &EARTH_J2000,
            opts,
        )
        .unwrap(),
    ];
    MeanElementDynamics::new(&EARTH_J2000, models).unwrap()
}

fn srp() -> Arc<SolarRadiationPressure> {
    SolarRadiationPressure::new(
        Arc::new(KeplerianEphemeris::sun(&EARTH_J2000)),
        SpacecraftShape::Sphere { area_m2: 20.0 },
        1.5,
        &EARTH_J2000,
        GaussianQuadratureOptions::default(),
    )
    .unwrap()
}

/// J2 with the Moon and the solar radiation pressure, eclipses included
fn luni_solar() -> MeanElementDynamics {
    let opts = GaussianQuadratureOptions::default();
    let models: Vec<Arc<dyn Contribution>> = vec![
        ZonalHarmonics::new(Arc::new(HarmonicsMem::jgm3(2, 0)), &EARTH_J2000, 2, opts).unwrap(),
        ThirdBody::new(Arc::new(KeplerianEphemeris::moon(&EARTH_J2000)), opts).unwrap(),
        srp(),
    ];
    MeanElementDynamics::new(&EARTH_J2000, models).unwrap()
}

fn propagator(
    dynamics: MeanElementDynamics,
    kind: PropagationKind,
    params: &[&str],
) -> SemiAnalyticalPropagator {
    // A fixed step keeps the finite differences free of step size changes
    let mut prop =
        SemiAnalyticalPropagator::new(dynamics, RungeKutta::rk4(60 * Unit::Second), kind, 1e-3);
    prop.select_parameters(params);
    prop
}

fn final_elements(
    prop: &mut SemiAnalyticalPropagator,
    init: &EquinoctialState,
    target: Epoch,
) -> Vector6<f64> {
    prop.set_initial_state(init.clone(), ElementKind::Mean)
        .unwrap();
    *prop.propagate(target).unwrap().elements()
}

fn relative_error(computed: Vector6<f64>, reference: Vector6<f64>) -> f64 {
    (computed - reference).norm() / reference.norm()
}

#[rstest]
#[case::gravity_mean(gravity_and_drag(), PropagationKind::Mean, [DRAG_COEFFICIENT, CENTRAL_ATTRACTION_COEFFICIENT], [0.05, 1.0], 1e-4, 1e-3)]
#[case::gravity_osculating(gravity_and_drag(), PropagationKind::Osculating, [DRAG_COEFFICIENT, CENTRAL_ATTRACTION_COEFFICIENT], [0.05, 1.0], 1e-3, 1e-2)]
#[case::luni_solar_mean(luni_solar(), PropagationKind::Mean, [REFLECTION_COEFFICIENT, MOON_COEFFICIENT], [0.05, 10.0], 1e-4, 1e-3)]
#[case::luni_solar_osculating(luni_solar(), PropagationKind::Osculating, [REFLECTION_COEFFICIENT, MOON_COEFFICIENT], [0.05, 10.0], 1e-3, 1e-2)]
fn jacobians_vs_finite_differences(
    #[case] dynamics: MeanElementDynamics,
    #[case] kind: PropagationKind,
    #[case] params: [&str; 2],
    #[case] param_steps: [f64; 2],
    #[case] state_tol: f64,
    #[case] param_tol: f64,
) {
    let _ = pretty_env_logger::try_init();

    let init = leo(ElementKind::Mean).with_mass(500.0);
    let target = test_epoch() + 900 * Unit::Second;

    let mut prop = propagator(dynamics, kind, &params);
    prop.set_initial_state(init.clone().with_stm(), ElementKind::Mean)
        .unwrap();
    assert_eq!(prop.parameter_names(), params);
    let final_state = prop.propagate(target).unwrap();
    let stm = final_state.stm().unwrap();
    let sens = final_state.param_jacobian().unwrap().clone();
    assert_eq!(sens.shape(), (6, 2));

    // Step sizes follow the magnitude of each element
    let steps = [1e-2, 1e-5, 1e-5, 1e-5, 1e-5, 1e-5];
    for (j, h) in steps.iter().enumerate() {
        let mut fd = Vector6::zeros();
        for (k, weight) in CENTRAL_WEIGHTS.iter().enumerate() {
            let offset = (k + 1) as f64 * h;
            let mut plus = *init.elements();
            plus[j] += offset;
            let mut minus = *init.elements();
            minus[j] -= offset;
            let y_plus = final_elements(&mut prop, &init.with_elements(plus).unwrap(), target);
            let y_minus = final_elements(&mut prop, &init.with_elements(minus).unwrap(), target);
            fd += *weight * (y_plus - y_minus) / *h;
        }
        let err = relative_error(stm.column(j).clone_owned(), fd);
        println!("dY/dY0[{j}]: relative error of {err:.3e}");
        assert!(err < state_tol, "column {j} of the STM: {err:.3e}");
    }

    for (j, (name, h)) in params.iter().zip(param_steps).enumerate() {
        let nominal = prop.parameters().get(name).unwrap().value;
        let mut fd = Vector6::zeros();
        for (k, weight) in CENTRAL_WEIGHTS.iter().enumerate() {
            let offset = (k + 1) as f64 * h;
            prop.parameters_mut()
                .set_value(name, nominal + offset)
                .unwrap();
            let y_plus = final_elements(&mut prop, &init, target);
            prop.parameters_mut()
                .set_value(name, nominal - offset)
                .unwrap();
            let y_minus = final_elements(&mut prop, &init, target);
            fd += *weight * (y_plus - y_minus) / h;
        }
        prop.parameters_mut().set_value(name, nominal).unwrap();
        let ad = Vector6::from_iterator(sens.column(j).iter().copied());
        let err = relative_error(ad, fd);
        println!("dY/d({name}): relative error of {err:.3e}");
        assert!(err < param_tol, "{name}: {err:.3e}");
    }
}

#[test]
fn jacobian_dimensions() {
    let _ = pretty_env_logger::try_init();

    let init = leo(ElementKind::Mean).with_mass(500.0);
    let err = init
        .clone()
        .with_jacobians(&DMatrix::identity(6, 5), &DMatrix::zeros(6, 2))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    let err = init
        .clone()
        .with_jacobians(&DMatrix::identity(6, 6), &DMatrix::zeros(5, 2))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    // Three columns for two selected parameters
    let mut prop = propagator(
        gravity_and_drag(),
        PropagationKind::Mean,
        &[DRAG_COEFFICIENT, CENTRAL_ATTRACTION_COEFFICIENT],
    );
    let three = init
        .clone()
        .with_jacobians(&DMatrix::identity(6, 6), &DMatrix::zeros(6, 3))
        .unwrap();
    let err = prop
        .set_initial_state(three, ElementKind::Mean)
        .unwrap_err();
    assert_eq!(
        err,
        PropagationError::ParameterColumns {
            expected: 2,
            found: 3
        }
    );
    assert_eq!(err.kind(), ErrorKind::Configuration);

    // Without a parameter Jacobian, it starts from zero
    prop.set_initial_state(init.clone().with_stm(), ElementKind::Mean)
        .unwrap();
    let initial = prop.initial_state().unwrap();
    assert_eq!(initial.param_jacobian().unwrap(), &DMatrix::zeros(6, 2));

    // Propagating without any Jacobian does not create them
    prop.set_initial_state(init, ElementKind::Mean).unwrap();
    let state = prop.propagate(test_epoch() + Unit::Hour).unwrap();
    assert_eq!(state.stm().unwrap_err().kind(), ErrorKind::NotInitialized);
}

#[test]
fn luni_solar_orbit_is_eclipsed() {
    // The finite differences above only exercise the shadow boundaries if the orbit crosses the shadow
    let init = leo(ElementKind::Mean);
    let sun_km = KeplerianEphemeris::sun(&EARTH_J2000)
        .position_km(test_epoch())
        .unwrap();
    let elements: [f64; 6] = std::array::from_fn(|i| init.elements()[i]);
    let aux = AuxiliaryElements::new(&elements, EARTH_J2000.mu_km3_s2, test_epoch());
    let (exit, entry) = srp().sunlit_limits(&aux, &sun_km);
    assert!(entry - exit > 0.0);
    assert!(entry - exit < std::f64::consts::TAU);
}
