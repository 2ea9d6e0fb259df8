use crate::{leo, test_epoch};
use dsst::cosmic::{ElementKind, EARTH_J2000};
use dsst::dynamics::{
    AtmosphereModel, AtmosphericDrag, GaussianQuadratureOptions, HarmonicsMem,
    MeanElementDynamics, SpacecraftShape, ZonalHarmonics,
};
use dsst::propagators::*;
use dsst::time::Unit;
use rstest::*;
use std::sync::Arc;

fn integrator(name: &str) -> RungeKutta {
    let opts = PropOpts::default();
    match name {
        "dormand45" => RungeKutta::dormand45(opts),
        "rkf45" => RungeKutta::rkf45(opts),
        "verner56" => RungeKutta::verner56(opts),
        _ => RungeKutta::rk4(600 * Unit::Second),
    }
}

#[rstest]
#[case::dormand45("dormand45")]
#[case::rkf45("rkf45")]
#[case::verner56("verner56")]
#[case::rk4("rk4")]
fn two_body_forward_backward(#[case] name: &str) {
    let _ = pretty_env_logger::try_init();

    let dynamics = MeanElementDynamics::two_body(&EARTH_J2000).unwrap();
    let mut prop = SemiAnalyticalPropagator::new(
        dynamics,
        integrator(name),
        PropagationKind::Mean,
        1e-3,
    );
    let init = leo(ElementKind::Mean);
    prop.set_initial_state(init.clone(), ElementKind::Mean)
        .unwrap();

    let dt = Unit::Day * 1;
    let forward = prop.propagate(test_epoch() + dt).unwrap();
    println!("{prop}\n{forward}");
    assert_eq!(forward.epoch, test_epoch() + dt);
    // Only the mean longitude moves, at the Keplerian mean motion
    for i in 0..5 {
        assert_eq!(forward.elements()[i], init.elements()[i]);
    }
    let expected = init.mean_longitude_rad() + init.mean_motion_rad_s() * dt.to_seconds();
    assert!(
        (forward.mean_longitude_rad() - expected).abs() < 1e-10,
        "λ error of {:.3e} rad",
        forward.mean_longitude_rad() - expected
    );

    prop.reset_initial_state(forward, ElementKind::Mean)
        .unwrap();
    let back = prop.propagate(test_epoch()).unwrap();
    assert_eq!(back.epoch, test_epoch());
    assert!(back.eq_within(&init, 1e-12, 1e-10), "{back}\n{init}");
}

#[test]
fn two_body_osculating_is_mean() {
    let _ = pretty_env_logger::try_init();

    let dynamics = MeanElementDynamics::two_body(&EARTH_J2000).unwrap();
    let mut prop = SemiAnalyticalPropagator::osculating(dynamics);
    let init = leo(ElementKind::Osculating);
    prop.set_initial_state(init.clone(), ElementKind::Osculating)
        .unwrap();
    let mean = prop.initial_state().unwrap();
    assert_eq!(mean.kind, ElementKind::Mean);
    assert_eq!(mean.elements(), init.elements());

    let osc = prop.propagate(test_epoch() + Unit::Hour * 6).unwrap();
    assert_eq!(osc.kind, ElementKind::Osculating);
    assert!(osc.short_period_coefficients().is_empty());
    for i in 0..5 {
        assert_eq!(osc.elements()[i], init.elements()[i]);
    }
}

/// Propagating further then coming back to an intermediate epoch matches the direct propagation.
#[test]
fn accumulator_consistency() {
    let _ = pretty_env_logger::try_init();

    let opts = GaussianQuadratureOptions::default();
    let field = Arc::new(HarmonicsMem::jgm3(4, 0));
    let mut dynamics = MeanElementDynamics::two_body(&EARTH_J2000).unwrap();
    dynamics
        .add_model(ZonalHarmonics::new(field, &EARTH_J2000, 4, opts).unwrap())
        .unwrap();
    dynamics
        .add_model(
            AtmosphericDrag::new(
                AtmosphereModel::exponential_700km(),
                SpacecraftShape::Sphere { area_m2: 10.0 },
                2.2,
                &EARTH_J2000,
                opts,
            )
            .unwrap(),
        )
        .unwrap();

    let init = leo(ElementKind::Mean).with_mass(500.0);
    let dt = Unit::Hour * 12;
    let mut prop =
        SemiAnalyticalPropagator::dormand45(dynamics, PropOpts::default(), PropagationKind::Mean);
    prop.set_initial_state(init.clone(), ElementKind::Mean)
        .unwrap();

    let direct = prop.propagate(test_epoch() + dt).unwrap();
    let (far, steps) = prop.propagate_with_steps(test_epoch() + dt * 2).unwrap();
    assert_eq!(far.epoch, test_epoch() + dt * 2);
    // Drag decays the orbit
    assert!(far.sma_km() < direct.sma_km());
    assert!(direct.sma_km() < init.sma_km());

    // Re-propagating starts again from the initial state
    let again = prop.propagate(test_epoch() + dt).unwrap();
    assert_eq!(again, direct);

    // Every recorded step matches a direct propagation within the integration tolerance
    for step in steps.iter().step_by(4) {
        let direct = prop.propagate(step.epoch).unwrap();
        assert!(
            direct.eq_within(step, 1e-3, 1e-6),
            "recorded {step}\ndirect {direct}"
        );
    }
}
