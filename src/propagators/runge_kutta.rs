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

use super::error_ctrl::weighted_rms;
use super::{
    Dormand45, EomFn, Fehlberg45, IntegrationDetails, Integrator, PropOpts, PropagationError,
    StepFn, Verner56, RK, RK4Fixed,
};
use crate::linalg::{DVector, Vector6};
use crate::time::{Duration, Epoch, Unit};
use std::fmt;

/// An explicit Runge Kutta integrator with an optional embedded error estimate.
///
/// The integrator is monomorphic: the Butcher table of the method is copied at construction, so
/// that the semi-analytical propagator may hold any method behind the same type.
#[derive(Clone, Debug)]
pub struct RungeKutta {
    pub opts: PropOpts,
    name: &'static str,
    order: u8,
    stages: usize,
    a_coeffs: &'static [f64],
    b_coeffs: &'static [f64],
    absolute: Vector6<f64>,
    relative: Vector6<f64>,
    details: IntegrationDetails,
    // Adapted step for the next call, always positive
    step_size: Duration,
}

impl RungeKutta {
    /// Each integrator must be initialized with its Butcher table and the integration options.
    pub fn new<R: RK>(opts: PropOpts) -> Self {
        let name = std::any::type_name::<R>()
            .rsplit("::")
            .next()
            .unwrap_or("RK");
        Self {
            opts,
            name,
            order: R::ORDER,
            stages: R::STAGES,
            a_coeffs: R::A_COEFFS,
            b_coeffs: R::B_COEFFS,
            absolute: Vector6::repeat(opts.tolerance),
            relative: Vector6::zeros(),
            details: IntegrationDetails {
                step: opts.init_step,
                error: 0.0,
                attempts: 1,
            },
            step_size: opts.init_step.abs(),
        }
    }

    /// A Dormand Prince 45, the default integrator of the semi-analytical propagator.
    pub fn dormand45(opts: PropOpts) -> Self {
        Self::new::<Dormand45>(opts)
    }

    pub fn rkf45(opts: PropOpts) -> Self {
        Self::new::<Fehlberg45>(opts)
    }

    pub fn verner56(opts: PropOpts) -> Self {
        Self::new::<Verner56>(opts)
    }

    /// The classical RK4 with a fixed step.
    pub fn rk4(step: Duration) -> Self {
        Self::new::<RK4Fixed>(PropOpts::with_fixed_step(step))
    }

    /// Performs one step of at most `step` seconds (negative to go backward in time).
    ///
    /// Returns the step actually taken, in seconds, and the new state vector.
    fn derive(
        &mut self,
        eom: &mut EomFn,
        epoch: Epoch,
        state_vec: &DVector<f64>,
        step: f64,
        fixed_step: bool,
    ) -> Result<(f64, DVector<f64>), PropagationError> {
        // Reset the number of attempts used (we don't reset the error because it's set before it's read)
        self.details.attempts = 1;
        let mut step_size = step;
        let k0 = eom(epoch, state_vec)?;
        let min_step = self.opts.min_step.to_seconds().abs();
        let max_step = self.opts.max_step.to_seconds().abs();
        loop {
            let mut k = Vec::with_capacity(self.stages);
            k.push(k0.clone());
            let mut a_idx: usize = 0;
            for i in 0..(self.stages - 1) {
                // c_i is the sum of the a_ij of this row
                let mut ci: f64 = 0.0;
                let mut wi = DVector::<f64>::zeros(state_vec.len());
                for kj in &k[0..i + 1] {
                    let a_ij = self.a_coeffs[a_idx];
                    ci += a_ij;
                    wi += a_ij * kj;
                    a_idx += 1;
                }
                let ki = eom(
                    epoch + (ci * step_size) * Unit::Second,
                    &(state_vec + step_size * wi),
                )?;
                k.push(ki);
            }
            let mut next_state = state_vec.clone();
            let mut error_est = DVector::<f64>::zeros(state_vec.len());
            for (i, ki) in k.iter().enumerate() {
                let b_i = self.b_coeffs[i];
                if !fixed_step {
                    let b_i_star = self.b_coeffs[i + self.stages];
                    error_est += step_size * (b_i - b_i_star) * ki;
                }
                next_state += step_size * b_i * ki;
            }

            if fixed_step {
                self.details.step = step_size * Unit::Second;
                self.details.error = 0.0;
                return Ok((step_size, next_state));
            }

            self.details.error = weighted_rms(
                &error_est,
                &next_state,
                state_vec,
                &self.absolute,
                &self.relative,
            );
            if self.details.error <= 1.0
                || step_size.abs() <= min_step
                || self.details.attempts >= self.opts.attempts
            {
                if self.details.attempts >= self.opts.attempts {
                    warn!(
                        "Could not further decrease step size: maximum number of attempts reached ({})",
                        self.details.attempts
                    );
                } else if self.details.error > 1.0 {
                    warn!(
                        "Minimum step size of {} reached with a normalized error of {:.3e}",
                        self.opts.min_step, self.details.error
                    );
                }
                self.details.step = step_size * Unit::Second;
                let mut next_step = step_size.abs();
                if self.details.error < 1.0 {
                    // Error is less than tolerance, let's attempt to increase the step for the next iteration.
                    let proposed_step =
                        0.9 * next_step * (1.0 / self.details.error).powf(1.0 / f64::from(self.order));
                    next_step = proposed_step.min(max_step);
                }
                self.step_size = next_step * Unit::Second;
                return Ok((step_size, next_state));
            } else {
                // Error is too high and we aren't using the smallest step, and we haven't hit the max number of attempts.
                self.details.attempts += 1;
                let proposed_step = 0.9
                    * step_size.abs()
                    * (1.0 / self.details.error).powf(1.0 / f64::from(self.order - 1));
                step_size = proposed_step.max(min_step).copysign(step_size);
            }
        }
    }
}

impl fmt::Display for RungeKutta {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.opts)
    }
}

impl Integrator for RungeKutta {
    fn set_tolerances(&mut self, absolute: Vector6<f64>, relative: Vector6<f64>) {
        self.absolute = absolute;
        self.relative = relative;
    }

    fn integrate(
        &mut self,
        eom: &mut EomFn,
        start: Epoch,
        state: &DVector<f64>,
        target: Epoch,
        on_step: &mut StepFn,
    ) -> Result<DVector<f64>, PropagationError> {
        let mut epoch = start;
        let mut state_vec = state.clone();
        if target == start {
            return Ok(state_vec);
        }
        let backprop = (target - start).is_negative();
        // Each integration starts from the same step so that it only depends on its inputs
        self.step_size = self.opts.init_step.abs();
        loop {
            let remaining = (target - epoch).to_seconds();
            let step_mag = self.step_size.to_seconds();
            let last_step = remaining.abs() <= step_mag;
            let (step, next_state) = if last_step {
                // Take one final step of exactly the needed duration until the stop time
                self.derive(eom, epoch, &state_vec, remaining, true)?
            } else {
                let step = if backprop { -step_mag } else { step_mag };
                self.derive(eom, epoch, &state_vec, step, self.opts.fixed_step)?
            };
            epoch = if last_step {
                target
            } else {
                epoch + step * Unit::Second
            };
            if next_state.iter().any(|x| !x.is_finite()) {
                return Err(PropagationError::NonFiniteState { epoch });
            }
            state_vec = next_state;
            on_step(epoch, &state_vec)?;
            if last_step {
                return Ok(state_vec);
            }
        }
    }

    fn latest_details(&self) -> IntegrationDetails {
        self.details
    }
}
