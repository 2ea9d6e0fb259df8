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

use crate::cosmic::{cartesian_to_equinoctial, AstroError, EquinoctialState};
use crate::dual::{partial, seeded, Dual, Real, ELEMENT_SLOT};
use crate::linalg::{DVector, Vector6};

/// Converts a position accuracy (in km) into absolute and relative tolerances of the six equinoctial elements.
///
/// The position error `dP` is mapped to a velocity error `dV = μ dP / (v r²)`, and both are
/// propagated to the elements through the Jacobian of the Cartesian to equinoctial conversion,
/// taking the absolute value of each term: `abs_i = Σ_j |∂y_i/∂r_j| dP + Σ_j |∂y_i/∂v_j| dV`.
/// The relative tolerance is `dP / r` for all elements.
pub fn tolerances(
    position_accuracy_km: f64,
    state: &EquinoctialState,
) -> Result<(Vector6<f64>, Vector6<f64>), AstroError> {
    let orbit = state.to_orbit()?;
    let mu = state.frame.mu_km3_s2;
    let rmag = orbit.rmag_km();
    let vmag = orbit.vmag_km_s();
    let d_pos = position_accuracy_km;
    let d_vel = mu * d_pos / (vmag * rmag * rmag);

    let cart = orbit.to_cartesian_vec();
    let r: [Dual; 3] = std::array::from_fn(|i| seeded(cart[i], ELEMENT_SLOT + i));
    let v: [Dual; 3] = std::array::from_fn(|i| seeded(cart[i + 3], ELEMENT_SLOT + 3 + i));
    let el = cartesian_to_equinoctial(&r, &v, Dual::cst(mu))?;

    let absolute = Vector6::from_fn(|i, _| {
        (0..6)
            .map(|j| {
                let scale = if j < 3 { d_pos } else { d_vel };
                partial(&el[i], ELEMENT_SLOT + j).abs() * scale
            })
            .sum()
    });
    let relative = Vector6::repeat(d_pos / rmag);
    Ok((absolute, relative))
}

/// Weighted RMS of the estimated step error over the first six components of the state vector.
///
/// Each component of the error is normalized by `abs_i + rel_i max(|y_i|, |y'_i|)` where `y` and
/// `y'` are the states before and after the step. The step is acceptable if this is at most one.
/// The other components (the variational equations) do not take part in the error control.
pub fn weighted_rms(
    prop_err: &DVector<f64>,
    candidate: &DVector<f64>,
    cur_state: &DVector<f64>,
    absolute: &Vector6<f64>,
    relative: &Vector6<f64>,
) -> f64 {
    let sum: f64 = (0..6)
        .map(|i| {
            let scale = absolute[i] + relative[i] * cur_state[i].abs().max(candidate[i].abs());
            (prop_err[i] / scale).powi(2)
        })
        .sum();
    (sum / 6.0).sqrt()
}
