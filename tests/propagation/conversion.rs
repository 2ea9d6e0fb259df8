use crate::test_epoch;
use dsst::cosmic::{
    assert_orbit_eq_or_abs, ElementKind, EquinoctialState, KeplerianEphemeris, EARTH_J2000,
};
use dsst::dynamics::{
    Contribution, GaussianQuadratureOptions, HarmonicsMem, MeanElementDynamics, ThirdBody,
    ZonalHarmonics,
};
use dsst::propagators::*;
use dsst::ErrorKind;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::sync::Arc;

fn contributions() -> Vec<Arc<dyn Contribution>> {
    let opts = GaussianQuadratureOptions::default();
    let field = Arc::new(HarmonicsMem::jgm3(4, 0));
    vec![
        ZonalHarmonics::new(field, &EARTH_J2000, 4, opts).unwrap(),
        ThirdBody::new(Arc::new(KeplerianEphemeris::moon(&EARTH_J2000)), opts).unwrap(),
    ]
}

/// Samples valid LEO to MEO mean states, away from the singularities.
fn sample_states(seed: u64, count: usize, kind: ElementKind) -> Vec<EquinoctialState> {
    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            EquinoctialState::keplerian(
                rng.gen_range(6_800.0..12_000.0),
                rng.gen_range(0.0..0.1),
                rng.gen_range(1.0..120.0),
                rng.gen_range(0.0..360.0),
                rng.gen_range(0.0..360.0),
                rng.gen_range(0.0..360.0),
                test_epoch(),
                EARTH_J2000,
                kind,
            )
            .unwrap()
        })
        .collect()
}

#[test]
fn mean_osculating_round_trip() {
    let _ = pretty_env_logger::try_init();

    let opts = MeanConversionOptions::default();
    for mean in sample_states(7, 10, ElementKind::Mean) {
        let osc = compute_osculating_state(&mean, None, contributions()).unwrap();
        assert_eq!(osc.kind, ElementKind::Osculating);
        // The zonal harmonics move the semi-major axis by a few km at most
        assert!((osc.sma_km() - mean.sma_km()).abs() > 1e-6);
        assert!((osc.sma_km() - mean.sma_km()).abs() < 20.0);

        let back = compute_mean_state(&osc, None, contributions(), opts).unwrap();
        assert_eq!(back.kind, ElementKind::Mean);
        assert!(back.eq_within(&mean, 1e-6, 1e-9), "{back}\n{mean}");
    }
}

#[test]
fn osculating_mean_round_trip() {
    let _ = pretty_env_logger::try_init();

    let opts = MeanConversionOptions::builder()
        .tolerance(1e-12)
        .max_iterations(100)
        .build();
    for osc in sample_states(42, 10, ElementKind::Osculating) {
        let mean = compute_mean_state(&osc, None, contributions(), opts).unwrap();
        let back = compute_osculating_state(&mean, None, contributions()).unwrap();
        assert!(back.eq_within(&osc, 1e-6, 1e-9), "{back}\n{osc}");
    }
}

#[test]
fn osculating_initial_state() {
    let _ = pretty_env_logger::try_init();

    let dynamics = MeanElementDynamics::new(&EARTH_J2000, contributions()).unwrap();
    let mut prop = SemiAnalyticalPropagator::osculating(dynamics);
    let osc = sample_states(3, 1, ElementKind::Osculating).remove(0);
    prop.set_initial_state(osc.clone(), ElementKind::Osculating)
        .unwrap();

    let mean = prop.initial_state().unwrap().clone();
    assert_eq!(mean.kind, ElementKind::Mean);
    assert!(!mean.eq_within(&osc, 1e-6, 1e-9));

    // Propagating to the initial epoch gives back the osculating state
    let same = prop.propagate(osc.epoch).unwrap();
    assert!(same.eq_within(&osc, 1e-6, 1e-9), "{same}\n{osc}");
    assert_orbit_eq_or_abs(
        &same.to_orbit().unwrap(),
        &osc.to_orbit().unwrap(),
        1e-6,
        "osculating state at the initial epoch",
    );
    assert!(!same.short_period_coefficients().is_empty());

    // Restricting the retained coefficients does not change the synthesis
    prop.set_selected_coefficients(Some(["zonal-C1".to_string()].into_iter().collect()));
    let restricted = prop.propagate(osc.epoch).unwrap();
    assert_eq!(restricted.elements(), same.elements());
    assert!(restricted.short_period_coefficients().len() <= 1);

    // And the mean propagation of the same initial state is the mean state
    prop.set_kind(PropagationKind::Mean);
    assert_eq!(prop.propagate(osc.epoch).unwrap(), mean);
}

#[test]
fn conversion_limit() {
    let _ = pretty_env_logger::try_init();

    let osc = sample_states(11, 1, ElementKind::Osculating).remove(0);
    let opts = MeanConversionOptions::builder()
        .tolerance(1e-15)
        .max_iterations(2)
        .build();
    let err = compute_mean_state(&osc, None, contributions(), opts).unwrap_err();
    match err {
        PropagationError::MeanConversion {
            iterations,
            correction,
        } => {
            assert_eq!(iterations, 2);
            assert!(correction > 1e-15);
        }
        _ => panic!("unexpected error {err}"),
    }
    assert_eq!(err.kind(), ErrorKind::NumericalDomain);
}
