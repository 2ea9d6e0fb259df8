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

use super::error_ctrl::tolerances;
use super::{
    AstroSnafu, DynamicsSnafu, Integrator, JacobianMapper, MeanConversionOptions, PropOpts,
    PropagationError, PropagationKind, RungeKutta, ShortPeriodSynthesis,
};
use crate::cosmic::{ElementKind, EquinoctialState};
use crate::dynamics::{MeanElementDynamics, ParameterRegistry};
use crate::linalg::{DMatrix, DVector, Vector6};
use crate::time::{Epoch, Unit};
use snafu::ResultExt;
use std::collections::BTreeSet;
use std::fmt;
use std::time::Instant;

/// Callback invoked with the output state (mean or osculating) of each accepted integration step.
pub type StepHandler = Box<dyn FnMut(&EquinoctialState) + Send>;

/// The semi-analytical propagator integrates the mean equinoctial elements with large steps, and
/// adds the short-period variations to output osculating states when requested.
///
/// Each call to [`Self::propagate`] starts from the initial mean state, so that the same propagator
/// may be used to propagate forward and backward to any epoch.
pub struct SemiAnalyticalPropagator<I: Integrator = RungeKutta> {
    dynamics: MeanElementDynamics,
    integrator: I,
    kind: PropagationKind,
    conversion: MeanConversionOptions,
    synthesis: ShortPeriodSynthesis,
    mapper: JacobianMapper,
    /// Initial mean state
    initial: Option<EquinoctialState>,
    selected: Vec<String>,
    position_accuracy_km: f64,
    step_handler: Option<StepHandler>,
}

impl SemiAnalyticalPropagator<RungeKutta> {
    /// Builds a propagator with a Dormand Prince 45, whose tolerances follow the position accuracy of the options.
    pub fn dormand45(dynamics: MeanElementDynamics, opts: PropOpts, kind: PropagationKind) -> Self {
        Self::new(dynamics, RungeKutta::dormand45(opts), kind, opts.tolerance)
    }

    /// Builds an osculating propagator with the default options.
    pub fn osculating(dynamics: MeanElementDynamics) -> Self {
        Self::dormand45(dynamics, PropOpts::default(), PropagationKind::Osculating)
    }
}

impl<I: Integrator> SemiAnalyticalPropagator<I> {
    pub fn new(
        dynamics: MeanElementDynamics,
        integrator: I,
        kind: PropagationKind,
        position_accuracy_km: f64,
    ) -> Self {
        let synthesis = ShortPeriodSynthesis::new(&dynamics);
        let mapper = JacobianMapper::new(&dynamics);
        Self {
            dynamics,
            integrator,
            kind,
            conversion: MeanConversionOptions::default(),
            synthesis,
            mapper,
            initial: None,
            selected: Vec::new(),
            position_accuracy_km,
            step_handler: None,
        }
    }

    /// Sets the options of the osculating to mean conversion.
    pub fn with_conversion(mut self, conversion: MeanConversionOptions) -> Self {
        self.conversion = conversion;
        self
    }

    pub fn kind(&self) -> PropagationKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: PropagationKind) {
        self.kind = kind;
    }

    pub fn dynamics(&self) -> &MeanElementDynamics {
        &self.dynamics
    }

    pub fn integrator(&self) -> &I {
        &self.integrator
    }

    /// Initial mean state, if set
    pub fn initial_state(&self) -> Option<&EquinoctialState> {
        self.initial.as_ref()
    }

    /// All of the parameters of the force models.
    pub fn parameters(&self) -> &ParameterRegistry {
        self.dynamics.registry()
    }

    /// Mutable access to the parameters, e.g. to update their values between propagations.
    ///
    /// Changes to the selection are overwritten by the next call to [`Self::set_initial_state`].
    pub fn parameters_mut(&mut self) -> &mut ParameterRegistry {
        self.dynamics.registry_mut()
    }

    /// Names of the parameters whose Jacobian columns are computed, in order, once the initial state is set.
    pub fn select_parameters(&mut self, names: &[&str]) {
        self.selected = names.iter().map(|name| name.to_string()).collect();
    }

    /// Names of the columns of the parameter Jacobians
    pub fn parameter_names(&self) -> &[String] {
        self.mapper.names()
    }

    /// Sets which short-period coefficients are attached to the osculating states.
    pub fn set_selected_coefficients(&mut self, selection: Option<BTreeSet<String>>) {
        self.synthesis.select_coefficients(selection);
    }

    /// Sets the callback invoked at each accepted step with the output state.
    pub fn set_step_handler(&mut self, handler: StepHandler) {
        self.step_handler = Some(handler);
    }

    pub fn clear_step_handler(&mut self) {
        self.step_handler = None;
    }

    /// Sets the initial state, converting it to a mean state if it is osculating.
    ///
    /// The selected parameters are resolved here. If the state carries a state transition matrix
    /// but no parameter Jacobian, the latter is initialized to zero; if it carries a parameter
    /// Jacobian, it must have one column per selected parameter. The Jacobians of an osculating
    /// state are used as the initial Jacobians of the mean state.
    pub fn set_initial_state(
        &mut self,
        state: EquinoctialState,
        kind: ElementKind,
    ) -> Result<(), PropagationError> {
        self.initial = None;
        let registry = self.dynamics.registry_mut();
        registry.clear_selection();
        registry.select(&self.selected).context(DynamicsSnafu)?;
        self.mapper = JacobianMapper::new(&self.dynamics);
        self.dynamics.init(&state).context(DynamicsSnafu)?;
        self.synthesis.reset(&self.dynamics);

        let jacobians = if state.has_jacobians() {
            let stm = self.mapper.state_jacobian(&state)?;
            let sens = match state.param_jacobian() {
                Ok(_) => self.mapper.parameters_jacobian(&state)?,
                Err(_) => DMatrix::zeros(6, self.mapper.num_params()),
            };
            Some((stm, sens))
        } else {
            None
        };

        let mut mean = match kind {
            ElementKind::Mean => {
                let mut mean = state;
                mean.kind = ElementKind::Mean;
                mean
            }
            ElementKind::Osculating => {
                self.synthesis
                    .to_mean(&self.dynamics, &state, self.conversion)?
            }
        };
        if let Some((stm, sens)) = jacobians {
            mean.set_jacobians(stm, Some(sens));
        }
        debug!("initial mean state {mean}");
        self.initial = Some(mean);
        Ok(())
    }

    /// Replaces the initial state, forgetting all of the short-period coefficients of the previous one.
    pub fn reset_initial_state(
        &mut self,
        state: EquinoctialState,
        kind: ElementKind,
    ) -> Result<(), PropagationError> {
        self.set_initial_state(state, kind)
    }

    /// Propagates the initial state until the target epoch, returning a mean or osculating state.
    pub fn propagate(&mut self, target: Epoch) -> Result<EquinoctialState, PropagationError> {
        let (state, _) = self.propagate_impl(target, false)?;
        Ok(state)
    }

    /// Propagates the initial state until the target epoch, also returning the state at each accepted step.
    pub fn propagate_with_steps(
        &mut self,
        target: Epoch,
    ) -> Result<(EquinoctialState, Vec<EquinoctialState>), PropagationError> {
        self.propagate_impl(target, true)
    }

    fn propagate_impl(
        &mut self,
        target: Epoch,
        record: bool,
    ) -> Result<(EquinoctialState, Vec<EquinoctialState>), PropagationError> {
        let initial = self
            .initial
            .clone()
            .ok_or(PropagationError::NotInitialized {
                what: "initial state",
            })?;
        let duration = target - initial.epoch;
        let tick = Instant::now();
        let log_progress = duration.abs() >= 2 * Unit::Minute;
        if log_progress {
            info!("Propagating for {} until {}", duration, target);
        }

        let (absolute, relative) =
            tolerances(self.position_accuracy_km, &initial).context(AstroSnafu)?;
        self.integrator.set_tolerances(absolute, relative);

        let with_jacobians = initial.has_jacobians();
        let start_vec = if with_jacobians {
            self.mapper.pack(&initial)?
        } else {
            DVector::from_row_slice(initial.elements().as_slice())
        };
        let mass_kg = initial.mass_kg;
        let kind = self.kind;

        let dynamics = &self.dynamics;
        let mapper = &self.mapper;
        let synthesis = &mut self.synthesis;
        let step_handler = &mut self.step_handler;
        let mut steps = Vec::new();

        let mut eom = |epoch: Epoch, y: &DVector<f64>| -> Result<DVector<f64>, PropagationError> {
            let elements: [f64; 6] = std::array::from_fn(|i| y[i]);
            if with_jacobians {
                let (fx, a_mat, b_mat) = dynamics
                    .dual_eom(epoch, &elements, mass_kg)
                    .context(DynamicsSnafu)?;
                mapper.rates(&fx, &a_mat, &b_mat, y)
            } else {
                let fx = dynamics
                    .eom(epoch, &elements, mass_kg)
                    .context(DynamicsSnafu)?;
                Ok(DVector::from_row_slice(&fx))
            }
        };

        let mut on_step = |epoch: Epoch, y: &DVector<f64>| -> Result<(), PropagationError> {
            if step_handler.is_none() && !record {
                return Ok(());
            }
            let mean = make_state(&initial, epoch, y, mapper, with_jacobians)?;
            let state = output_state(synthesis, dynamics, kind, mean)?;
            if let Some(handler) = step_handler.as_mut() {
                handler(&state);
            }
            if record {
                steps.push(state);
            }
            Ok(())
        };

        let final_vec = self.integrator.integrate(
            &mut eom,
            initial.epoch,
            &start_vec,
            target,
            &mut on_step,
        )?;

        let mean = make_state(&initial, target, &final_vec, mapper, with_jacobians)?;
        let state = output_state(synthesis, dynamics, kind, mean)?;
        if log_progress {
            let tock: crate::time::Duration = tick.elapsed().into();
            info!("Done in {}", tock);
        }
        Ok((state, steps))
    }
}

/// Rebuilds the mean state from the integrated vector.
fn make_state(
    template: &EquinoctialState,
    epoch: Epoch,
    y: &DVector<f64>,
    mapper: &JacobianMapper,
    with_jacobians: bool,
) -> Result<EquinoctialState, PropagationError> {
    let mut state = template
        .with_elements(Vector6::from_fn(|i, _| y[i]))
        .context(AstroSnafu)?;
    state.epoch = epoch;
    if with_jacobians {
        let (_, stm, sens) = mapper.unpack(y);
        state.set_jacobians(stm, Some(sens));
    }
    Ok(state)
}

fn output_state(
    synthesis: &mut ShortPeriodSynthesis,
    dynamics: &MeanElementDynamics,
    kind: PropagationKind,
    mean: EquinoctialState,
) -> Result<EquinoctialState, PropagationError> {
    match kind {
        PropagationKind::Mean => Ok(mean),
        PropagationKind::Osculating => synthesis.to_osculating(dynamics, &mean),
    }
}

impl<I: Integrator> fmt::Display for SemiAnalyticalPropagator<I> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} semi-analytical propagator with {} and {}",
            self.kind, self.integrator, self.dynamics
        )
    }
}
