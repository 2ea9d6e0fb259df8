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

use super::{
    AuxiliaryElements, Context, Contribution, DynamicsError, NewtonianAttraction,
    ParameterRegistry, ParameterValues, CENTRAL_ATTRACTION_COEFFICIENT,
};
use crate::cosmic::{AttitudeProvider, EquinoctialState, Frame};
use crate::dual::{partial, seeded, Dual, Real, ELEMENT_SLOT, PARAMETER_SLOT};
use crate::linalg::{DMatrix, Matrix6};
use crate::time::Epoch;
use std::fmt;
use std::sync::Arc;

/// `MeanElementDynamics` provides the equations of motion of the mean equinoctial elements, as the
/// sum of the averaged rates of all of its contributions.
///
/// **Note:** the Newtonian attraction is _always_ included, it cannot be turned off.
#[derive(Clone)]
pub struct MeanElementDynamics {
    contributions: Vec<Arc<dyn Contribution>>,
    registry: ParameterRegistry,
    attitude: Option<Arc<dyn AttitudeProvider>>,
}

impl MeanElementDynamics {
    /// Initializes mean element dynamics with only the Keplerian motion about the central body of `frame`.
    pub fn two_body(frame: &Frame) -> Result<Self, DynamicsError> {
        Self::new(frame, vec![])
    }

    /// Initializes mean element dynamics with a list of contributions. The Newtonian attraction
    /// of the central body is added first unless one of the contributions already provides it.
    pub fn new(
        frame: &Frame,
        models: Vec<Arc<dyn Contribution>>,
    ) -> Result<Self, DynamicsError> {
        let has_central = models.iter().any(|model| {
            model
                .parameters()
                .iter()
                .any(|d| d.name == CENTRAL_ATTRACTION_COEFFICIENT)
        });
        let mut contributions: Vec<Arc<dyn Contribution>> = Vec::with_capacity(models.len() + 1);
        if !has_central {
            contributions.push(Arc::new(NewtonianAttraction::new(frame.mu_km3_s2)));
        }
        contributions.extend(models);
        let registry = ParameterRegistry::from_contributions(&contributions)?;
        Ok(Self {
            contributions,
            registry,
            attitude: None,
        })
    }

    /// Sets the attitude provider used by the surface forces of non spherical spacecraft.
    pub fn with_attitude(mut self, attitude: Arc<dyn AttitudeProvider>) -> Self {
        self.attitude = Some(attitude);
        self
    }

    /// Adds a contribution, registering its parameters.
    pub fn add_model(&mut self, model: Arc<dyn Contribution>) -> Result<(), DynamicsError> {
        for driver in model.parameters() {
            self.registry.register(driver)?;
        }
        self.contributions.push(model);
        Ok(())
    }

    pub fn contributions(&self) -> &[Arc<dyn Contribution>] {
        &self.contributions
    }

    pub fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ParameterRegistry {
        &mut self.registry
    }

    pub fn attitude(&self) -> Option<&dyn AttitudeProvider> {
        self.attitude.as_deref()
    }

    /// Number of selected parameters, i.e. of columns of the parameter Jacobians
    pub fn num_selected(&self) -> usize {
        self.registry.selected().count()
    }

    /// Checks that every contribution may be used from this initial state.
    pub fn init(&self, state: &EquinoctialState) -> Result<(), DynamicsError> {
        for model in &self.contributions {
            debug!("initializing {model}");
            model.init(state, self.attitude())?;
        }
        Ok(())
    }

    /// Builds the evaluation context of the contributions at the provided mean elements.
    pub fn context<'a, T: Real>(
        &'a self,
        epoch: Epoch,
        elements: &[T; 6],
        values: &'a ParameterValues<T>,
        mass_kg: Option<f64>,
    ) -> Result<Context<'a, T>, DynamicsError> {
        let mu = values.get(CENTRAL_ATTRACTION_COEFFICIENT)?;
        Ok(Context {
            aux: AuxiliaryElements::new(elements, mu, epoch),
            params: values,
            attitude: self.attitude(),
            mass_kg,
        })
    }

    /// Time derivative of the mean elements `[a, ex, ey, hx, hy, λ]`.
    pub fn eom(
        &self,
        epoch: Epoch,
        elements: &[f64; 6],
        mass_kg: Option<f64>,
    ) -> Result<[f64; 6], DynamicsError> {
        let values = self.registry.values::<f64>();
        let ctx = self.context(epoch, elements, &values, mass_kg)?;
        let mut rates = [0.0; 6];
        for model in &self.contributions {
            let rate = model.mean_rate(&ctx)?;
            for i in 0..6 {
                rates[i] += rate[i];
            }
        }
        super::ensure_finite(&rates, "mean element dynamics", "mean element rate")?;
        Ok(rates)
    }

    /// Time derivative of the mean elements with its Jacobians with respect to the mean elements
    /// (6x6) and to the selected parameters (6 x number of selected parameters).
    pub fn dual_eom(
        &self,
        epoch: Epoch,
        elements: &[f64; 6],
        mass_kg: Option<f64>,
    ) -> Result<([f64; 6], Matrix6<f64>, DMatrix<f64>), DynamicsError> {
        let values = self.registry.dual_values()?;
        let seeded_el: [Dual; 6] = std::array::from_fn(|i| seeded(elements[i], ELEMENT_SLOT + i));
        let ctx = self.context(epoch, &seeded_el, &values, mass_kg)?;
        let mut rates = [Dual::cst(0.0); 6];
        for model in &self.contributions {
            let rate = model.dual_mean_rate(&ctx)?;
            for i in 0..6 {
                rates[i] += rate[i];
            }
        }
        super::ensure_finite(&rates, "mean element dynamics", "mean element rate")?;

        let num_params = self.num_selected();
        let fx = std::array::from_fn(|i| rates[i].re());
        let a_mat = Matrix6::from_fn(|i, j| partial(&rates[i], ELEMENT_SLOT + j));
        let b_mat = DMatrix::from_fn(6, num_params, |i, j| partial(&rates[i], PARAMETER_SLOT + j));
        Ok((fx, a_mat, b_mat))
    }
}

impl fmt::Display for MeanElementDynamics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let models: Vec<String> = self.contributions.iter().map(|m| format!("{m}")).collect();
        write!(f, "mean element dynamics: {}", models.join("; "))
    }
}
