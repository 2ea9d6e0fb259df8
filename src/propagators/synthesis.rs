/*
    DSST, semi-analytical satellite theory
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use super::{AstroSnafu, DynamicsSnafu, PropagationError};
use crate::cosmic::{to_array, AttitudeProvider, ElementKind, EquinoctialState};
use crate::dual::{partial, seeded, Dual, Real, ELEMENT_SLOT, PARAMETER_SLOT};
use crate::dynamics::{Contribution, DynamicsError, MeanElementDynamics, ShortPeriodTerms};
use crate::linalg::{DMatrix, Matrix6, Vector6};
use crate::time::Epoch;
use serde_derive::{Deserialize, Serialize};
use snafu::ResultExt;
use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::PI;
use std::sync::Arc;
use typed_builder::TypedBuilder;

/// Settings of the osculating to mean fixed point iteration.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct MeanConversionOptions {
    /// Relative convergence threshold on the correction of the elements
    #[builder(default = 1e-13)]
    #[serde(default = "default_conversion_tolerance")]
    pub tolerance: f64,
    #[builder(default = 200)]
    #[serde(default = "default_conversion_iterations")]
    pub max_iterations: usize,
}

fn default_conversion_tolerance() -> f64 {
    1e-13
}

fn default_conversion_iterations() -> usize {
    200
}

impl Default for MeanConversionOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Combines the short-period terms of every contribution into the osculating correction.
///
/// The synthesis owns one [`ShortPeriodTerms`] per contribution, in the order of the contributions
/// of the dynamics it was built from, and the selection of the coefficients which are attached to
/// the states it outputs.
#[derive(Clone, Debug, Default)]
pub struct ShortPeriodSynthesis {
    terms: Vec<ShortPeriodTerms>,
    selection: Option<BTreeSet<String>>,
}

impl ShortPeriodSynthesis {
    pub fn new(dynamics: &MeanElementDynamics) -> Self {
        Self {
            terms: dynamics
                .contributions()
                .iter()
                .map(|model| model.short_period_terms())
                .collect(),
            selection: None,
        }
    }

    /// Forgets all of the cached coefficients, and follows the contributions of `dynamics`.
    pub fn reset(&mut self, dynamics: &MeanElementDynamics) {
        let selection = self.selection.take();
        *self = Self::new(dynamics);
        self.selection = selection;
    }

    /// Sets which short-period coefficients are attached to the output states: `None` retains
    /// none, an empty set retains all of them, otherwise only the named ones.
    pub fn select_coefficients(&mut self, selection: Option<BTreeSet<String>>) {
        self.selection = selection;
    }

    pub fn selection(&self) -> &Option<BTreeSet<String>> {
        &self.selection
    }

    pub fn terms(&self) -> &[ShortPeriodTerms] {
        &self.terms
    }

    /// Refreshes the coefficients of every contribution at the provided mean state, when needed.
    pub fn update(
        &mut self,
        dynamics: &MeanElementDynamics,
        mean: &EquinoctialState,
    ) -> Result<(), DynamicsError> {
        if self.terms.len() != dynamics.contributions().len() {
            self.reset(dynamics);
        }
        let values = dynamics.registry().values::<f64>();
        let ctx = dynamics.context(
            mean.epoch,
            &to_array(mean.elements()),
            &values,
            mean.mass_kg,
        )?;
        for (model, terms) in dynamics.contributions().iter().zip(self.terms.iter_mut()) {
            if terms.update(model.as_ref(), &ctx)? {
                debug!("refreshed the short-period coefficients of {}", terms.name());
            }
        }
        Ok(())
    }

    /// Sum of the short-period variations of all the contributions at the mean longitude `lm`.
    pub fn correction(&self, lm: f64, epoch: Epoch) -> Result<[f64; 6], DynamicsError> {
        let mut eta = [0.0; 6];
        for terms in &self.terms {
            let value = terms.value(lm, epoch)?;
            for i in 0..6 {
                eta[i] += value[i];
            }
        }
        Ok(eta)
    }

    /// Coefficients retained by the current selection, from the last update.
    pub fn retained(&self) -> BTreeMap<String, Vector6<f64>> {
        let mut retained = BTreeMap::new();
        for terms in &self.terms {
            retained.extend(terms.retained(&self.selection));
        }
        retained
    }

    /// Adds the short-period variations to a mean state.
    ///
    /// If the mean state carries Jacobians, they are mapped through the short-period variations,
    /// which requires as many parameter Jacobian columns as selected parameters.
    pub fn to_osculating(
        &mut self,
        dynamics: &MeanElementDynamics,
        mean: &EquinoctialState,
    ) -> Result<EquinoctialState, PropagationError> {
        self.update(dynamics, mean).context(DynamicsSnafu)?;
        let eta = self
            .correction(mean.mean_longitude_rad(), mean.epoch)
            .context(DynamicsSnafu)?;
        let mut osc = mean
            .with_elements(mean.elements() + Vector6::from_row_slice(&eta))
            .context(AstroSnafu)?;
        osc.kind = ElementKind::Osculating;
        osc.set_short_period_coefficients(self.retained());

        if mean.has_jacobians() {
            let (d_eta_dy, d_eta_dp) = short_period_jacobians(dynamics, mean)?;
            let map = Matrix6::identity() + d_eta_dy;
            let stm = map * mean.stm()?;
            let params = match mean.param_jacobian() {
                Ok(sens) => {
                    if sens.ncols() != d_eta_dp.ncols() {
                        return Err(PropagationError::ParameterColumns {
                            expected: d_eta_dp.ncols(),
                            found: sens.ncols(),
                        });
                    }
                    let map = DMatrix::from_fn(6, 6, |i, j| map[(i, j)]);
                    Some(map * sens + d_eta_dp)
                }
                Err(_) => None,
            };
            osc.set_jacobians(stm, params);
        }
        Ok(osc)
    }

    /// Removes the short-period variations from an osculating state by fixed point iteration.
    ///
    /// Starting from mean = osculating, the mean elements are updated as `osculating - η(mean)` until
    /// the correction is below `tolerance` relative to the magnitude of each element:
    /// `(1 + a)` for the semi-major axis, `(1 + e)` for the eccentricity vector, `(1 + |h|)` for the
    /// inclination vector and `π` for the mean longitude.
    pub fn to_mean(
        &mut self,
        dynamics: &MeanElementDynamics,
        osc: &EquinoctialState,
        opts: MeanConversionOptions,
    ) -> Result<EquinoctialState, PropagationError> {
        let osc_el = *osc.elements();
        let eps = opts.tolerance;
        let scales = [
            1.0 + osc.sma_km().abs(),
            1.0 + osc.ecc(),
            1.0 + osc.ecc(),
            1.0 + osc.hx().hypot(osc.hy()),
            1.0 + osc.hx().hypot(osc.hy()),
            PI,
        ];

        let mut mean = osc.clone().without_jacobians();
        mean.kind = ElementKind::Mean;
        mean.set_short_period_coefficients(BTreeMap::new());
        let mut correction = f64::INFINITY;
        for iteration in 1..=opts.max_iterations {
            self.update(dynamics, &mean).context(DynamicsSnafu)?;
            let eta = self
                .correction(mean.mean_longitude_rad(), mean.epoch)
                .context(DynamicsSnafu)?;
            let next = osc_el - Vector6::from_row_slice(&eta);
            let delta = next - mean.elements();
            correction = (0..6)
                .map(|i| delta[i].abs() / scales[i])
                .fold(0.0, f64::max);
            mean = match mean.with_elements(next) {
                Ok(state) => state,
                Err(e) => {
                    debug!("osculating to mean conversion left the elliptic domain: {e}");
                    return Err(PropagationError::MeanConversion {
                        iterations: iteration,
                        correction,
                    });
                }
            };
            debug!("osculating to mean iteration #{iteration}: correction of {correction:.3e}");
            if correction <= eps {
                return Ok(mean);
            }
        }
        Err(PropagationError::MeanConversion {
            iterations: opts.max_iterations,
            correction,
        })
    }
}

/// Partials of the short-period variations with respect to the mean elements (6x6) and to the
/// selected parameters (6 x number of selected parameters), at the provided mean state.
pub fn short_period_jacobians(
    dynamics: &MeanElementDynamics,
    mean: &EquinoctialState,
) -> Result<(Matrix6<f64>, DMatrix<f64>), PropagationError> {
    let values = dynamics.registry().dual_values().context(DynamicsSnafu)?;
    let el = mean.elements();
    let seeded_el: [Dual; 6] = std::array::from_fn(|i| seeded(el[i], ELEMENT_SLOT + i));
    let ctx = dynamics
        .context(mean.epoch, &seeded_el, &values, mean.mass_kg)
        .context(DynamicsSnafu)?;
    let mut eta = [Dual::cst(0.0); 6];
    for model in dynamics.contributions() {
        let series = model
            .dual_short_period_series(&ctx)
            .context(DynamicsSnafu)?;
        let value = series.value(seeded_el[5], mean.epoch);
        for i in 0..6 {
            eta[i] += value[i];
        }
    }
    let num_params = dynamics.num_selected();
    Ok((
        Matrix6::from_fn(|i, j| partial(&eta[i], ELEMENT_SLOT + j)),
        DMatrix::from_fn(6, num_params, |i, j| partial(&eta[i], PARAMETER_SLOT + j)),
    ))
}

fn standalone_dynamics(
    state: &EquinoctialState,
    attitude: Option<Arc<dyn AttitudeProvider>>,
    contributions: Vec<Arc<dyn Contribution>>,
) -> Result<MeanElementDynamics, PropagationError> {
    let mut dynamics =
        MeanElementDynamics::new(&state.frame, contributions).context(DynamicsSnafu)?;
    if let Some(attitude) = attitude {
        dynamics = dynamics.with_attitude(attitude);
    }
    dynamics.init(state).context(DynamicsSnafu)?;
    Ok(dynamics)
}

/// Computes the mean state of an osculating state, outside of any propagation.
///
/// The Keplerian attraction of the central body of the state's frame is added unless provided.
pub fn compute_mean_state(
    osc: &EquinoctialState,
    attitude: Option<Arc<dyn AttitudeProvider>>,
    contributions: Vec<Arc<dyn Contribution>>,
    opts: MeanConversionOptions,
) -> Result<EquinoctialState, PropagationError> {
    let dynamics = standalone_dynamics(osc, attitude, contributions)?;
    ShortPeriodSynthesis::new(&dynamics).to_mean(&dynamics, osc, opts)
}

/// Computes the osculating state of a mean state, outside of any propagation.
pub fn compute_osculating_state(
    mean: &EquinoctialState,
    attitude: Option<Arc<dyn AttitudeProvider>>,
    contributions: Vec<Arc<dyn Contribution>>,
) -> Result<EquinoctialState, PropagationError> {
    let dynamics = standalone_dynamics(mean, attitude, contributions)?;
    ShortPeriodSynthesis::new(&dynamics).to_osculating(&dynamics, mean)
}

#[cfg(test)]
mod ut_synthesis {
    use super::*;
    use crate::cosmic::EARTH_J2000;
    use crate::dynamics::{GaussianQuadratureOptions, HarmonicsMem, ZonalHarmonics};
    use approx::assert_abs_diff_eq;

    fn j2() -> Vec<Arc<dyn Contribution>> {
        vec![ZonalHarmonics::new(
            Arc::new(HarmonicsMem::j2_jgm3()),
            &EARTH_J2000,
            2,
            GaussianQuadratureOptions::default(),
        )
        .unwrap()]
    }

    fn mean_state() -> EquinoctialState {
        EquinoctialState::keplerian(
            7000.0,
            0.01,
            50.0,
            30.0,
            60.0,
            90.0,
            Epoch::from_gregorian_tai_at_midnight(2024, 1, 1),
            EARTH_J2000,
            ElementKind::Mean,
        )
        .unwrap()
    }

    #[test]
    fn round_trip() {
        let mean = mean_state();
        let osc = compute_osculating_state(&mean, None, j2()).unwrap();
        assert_eq!(osc.kind, ElementKind::Osculating);
        // J2 short-period oscillations of the semi-major axis are of a few km in LEO
        let da = osc.sma_km() - mean.sma_km();
        assert!(da.abs() > 0.1 && da.abs() < 20.0, "{da}");
        assert!(osc.short_period_coefficients().is_empty());

        let back = compute_mean_state(&osc, None, j2(), MeanConversionOptions::default()).unwrap();
        assert_eq!(back.kind, ElementKind::Mean);
        assert_abs_diff_eq!(back.sma_km(), mean.sma_km(), epsilon = 1e-8);
        for i in 1..6 {
            assert_abs_diff_eq!(back.elements()[i], mean.elements()[i], epsilon = 1e-11);
        }
    }

    #[test]
    fn conversion_failure_is_reported() {
        let mean = mean_state();
        let osc = compute_osculating_state(&mean, None, j2()).unwrap();
        let opts = MeanConversionOptions::builder().max_iterations(2).build();
        let err = compute_mean_state(&osc, None, j2(), opts).unwrap_err();
        match err {
            PropagationError::MeanConversion {
                iterations,
                correction,
            } => {
                assert_eq!(iterations, 2);
                assert!(correction > 1e-13);
            }
            _ => panic!("unexpected error {err}"),
        }
        assert_eq!(err.kind(), crate::ErrorKind::NumericalDomain);
    }

    #[test]
    fn coefficient_selection() {
        let mean = mean_state();
        let dynamics = MeanElementDynamics::new(&EARTH_J2000, j2()).unwrap();
        let mut synthesis = ShortPeriodSynthesis::new(&dynamics);
        synthesis.select_coefficients(Some(BTreeSet::new()));
        let osc = synthesis.to_osculating(&dynamics, &mean).unwrap();
        let all = osc.short_period_coefficients().len();
        assert!(all > 0);
        assert!(osc.short_period_coefficients().contains_key("zonal-C1"));

        synthesis.select_coefficients(Some(BTreeSet::from(["zonal-S2".to_string()])));
        let osc = synthesis.to_osculating(&dynamics, &mean).unwrap();
        assert_eq!(osc.short_period_coefficients().len(), 1);
        assert!(osc.short_period_coefficients().contains_key("zonal-S2"));
    }

    #[test]
    fn short_period_partials() {
        let mean = mean_state();
        let dynamics = MeanElementDynamics::new(&EARTH_J2000, j2()).unwrap();
        let mut synthesis = ShortPeriodSynthesis::new(&dynamics);
        let (d_eta_dy, d_eta_dp) = short_period_jacobians(&dynamics, &mean).unwrap();
        assert_eq!(d_eta_dp.ncols(), 0);
        // Central differences on the mean longitude
        let h = 1e-6;
        let mut plus = *mean.elements();
        plus[5] += h;
        let mut minus = *mean.elements();
        minus[5] -= h;
        synthesis.update(&dynamics, &mean).unwrap();
        let eta_p = synthesis.correction(plus[5], mean.epoch).unwrap();
        let eta_m = synthesis.correction(minus[5], mean.epoch).unwrap();
        for i in 0..6 {
            let fd = (eta_p[i] - eta_m[i]) / (2.0 * h);
            assert_abs_diff_eq!(d_eta_dy[(i, 5)], fd, epsilon = 1e-6 * (1.0 + fd.abs()));
        }
    }
}
