use crate::{leo, test_epoch};
use dsst::cosmic::{ElementKind, EquinoctialState, EARTH_J2000};
use dsst::dynamics::{
    Contribution, GaussianQuadratureOptions, HarmonicsMem, MeanElementDynamics, ZonalHarmonics,
};
use dsst::linalg::{Vector3, Vector6};
use dsst::propagators::*;
use dsst::time::Unit;
use std::sync::Arc;

/// Normalized C20 of JGM-3
const C20: f64 = -4.841_653_748_864_70e-4;

fn j2_model(c20: f64) -> Arc<dyn Contribution> {
    let field = Arc::new(HarmonicsMem::from_coefficients(&[(2, 0, c20, 0.0)]));
    ZonalHarmonics::new(field, &EARTH_J2000, 2, GaussianQuadratureOptions::default()).unwrap()
}

/// Point mass and J2 acceleration in Cartesian coordinates
fn j2_eom(state: &Vector6<f64>, j2: f64) -> Vector6<f64> {
    let mu = EARTH_J2000.mu_km3_s2;
    let re = EARTH_J2000.equatorial_radius_km;
    let r = Vector3::new(state[0], state[1], state[2]);
    let rmag = r.norm();
    let z2 = (r.z / rmag).powi(2);
    let fact = -1.5 * j2 * mu * re.powi(2) / rmag.powi(5);
    let accel = -mu / rmag.powi(3) * r
        + fact
            * Vector3::new(
                r.x * (1.0 - 5.0 * z2),
                r.y * (1.0 - 5.0 * z2),
                r.z * (3.0 - 5.0 * z2),
            );
    Vector6::new(state[3], state[4], state[5], accel.x, accel.y, accel.z)
}

/// Classical RK4 on the Cartesian state, with a 5 second step
fn cartesian_truth(init: &EquinoctialState, seconds: f64, j2: f64) -> Vector3<f64> {
    let step = 5.0;
    let mut y = init.to_orbit().unwrap().to_cartesian_vec();
    for _ in 0..(seconds / step).round() as usize {
        let k1 = j2_eom(&y, j2);
        let k2 = j2_eom(&(y + 0.5 * step * k1), j2);
        let k3 = j2_eom(&(y + 0.5 * step * k2), j2);
        let k4 = j2_eom(&(y + step * k3), j2);
        y += step / 6.0 * (k1 + 2.0 * k2 + 2.0 * k3 + k4);
    }
    Vector3::new(y[0], y[1], y[2])
}

/// Position errors after `seconds`, of the osculating and of the mean-only propagations
fn position_errors(c20: f64, seconds: f64) -> (f64, f64) {
    let mean0 = leo(ElementKind::Mean);
    let osc0 = compute_osculating_state(&mean0, None, vec![j2_model(c20)]).unwrap();
    let truth = cartesian_truth(&osc0, seconds, -(5.0_f64).sqrt() * c20);
    let target = test_epoch() + seconds * Unit::Second;

    let mut errors = [0.0; 2];
    for (i, kind) in [PropagationKind::Osculating, PropagationKind::Mean]
        .into_iter()
        .enumerate()
    {
        let dynamics = MeanElementDynamics::new(&EARTH_J2000, vec![j2_model(c20)]).unwrap();
        let mut prop =
            SemiAnalyticalPropagator::new(dynamics, RungeKutta::rk4(60 * Unit::Second), kind, 1e-3);
        prop.set_initial_state(mean0.clone(), ElementKind::Mean)
            .unwrap();
        let state = prop.propagate(target).unwrap();
        errors[i] = (state.to_orbit().unwrap().radius() - truth).norm();
    }
    (errors[0], errors[1])
}

#[test]
fn osculating_matches_cartesian_j2() {
    let _ = pretty_env_logger::try_init();

    let (osc_err, mean_err) = position_errors(C20, 5400.0);
    println!("after 1.5 h: osculating error {osc_err:.3} km, mean-only error {mean_err:.3} km");
    assert!(osc_err < 1.0, "osculating error of {osc_err:.3} km");
    assert!(osc_err < 0.2 * mean_err);
}

#[test]
fn osculating_error_is_second_order_in_j2() {
    let _ = pretty_env_logger::try_init();

    let (full, _) = position_errors(C20, 5400.0);
    let (half, _) = position_errors(0.5 * C20, 5400.0);
    let (quarter, _) = position_errors(0.25 * C20, 5400.0);
    println!("osculating errors: {full:.4} km, {half:.4} km, {quarter:.4} km");
    // Halving J2 divides the residual by four
    for ratio in [full / half, half / quarter] {
        assert!((3.0..5.0).contains(&ratio), "error ratio of {ratio:.2}");
    }
}
