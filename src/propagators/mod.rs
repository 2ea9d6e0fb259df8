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

use crate::cosmic::AstroError;
use crate::dynamics::DynamicsError;
use crate::errors::{ErrorKind, StateError};
use crate::io::ConfigError;
use crate::linalg::{DVector, Vector6};
use crate::time::{Duration, Epoch};
use serde_derive::{Deserialize, Serialize};
use snafu::prelude::*;
use std::fmt;

/// Provides the tolerances of the integrator and its step error control.
pub mod error_ctrl;
pub use self::error_ctrl::*;

mod rk_methods;
pub use rk_methods::*;
mod options;
pub use options::*;
mod runge_kutta;
pub use runge_kutta::*;
mod synthesis;
pub use synthesis::*;
mod jacobians;
pub use jacobians::*;
mod semianalytical;
pub use semianalytical::*;

/// Stores the details of the previous integration step of a given integrator.
#[derive(Copy, Clone, Debug)]
pub struct IntegrationDetails {
    /// step size used
    pub step: Duration,
    /// error in the previous integration step, normalized by the tolerances
    pub error: f64,
    /// number of attempts needed by an adaptive step size to be within the tolerance
    pub attempts: u8,
}

impl fmt::Display for IntegrationDetails {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "IntegrationDetails {{step: {}, error: {:.3e}, attempts: {}}}",
            self.step, self.error, self.attempts
        )
    }
}

/// Whether the propagator outputs mean states or osculating states.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropagationKind {
    #[default]
    Mean,
    Osculating,
}

impl fmt::Display for PropagationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Mean => write!(f, "mean"),
            Self::Osculating => write!(f, "osculating"),
        }
    }
}

/// The derivative function consumed by the integrators.
pub type EomFn<'a> =
    dyn FnMut(Epoch, &DVector<f64>) -> Result<DVector<f64>, PropagationError> + 'a;

/// The callback invoked after each accepted integration step.
pub type StepFn<'a> = dyn FnMut(Epoch, &DVector<f64>) -> Result<(), PropagationError> + 'a;

/// A numerical integrator, treated as a black box by the semi-analytical propagator.
///
/// Only the first six components of the state vector (the mean elements) take part in the step
/// error control, the other components (the variational equations) are integrated along.
pub trait Integrator: fmt::Display + Send + Sync {
    /// Sets the absolute and relative tolerances of the six mean elements.
    fn set_tolerances(&mut self, absolute: Vector6<f64>, relative: Vector6<f64>);

    /// Integrates `eom` from `start` to `target` (which may be in the past), calling `on_step`
    /// after every accepted step, and returns the state vector at `target`.
    fn integrate(
        &mut self,
        eom: &mut EomFn,
        start: Epoch,
        state: &DVector<f64>,
        target: Epoch,
        on_step: &mut StepFn,
    ) -> Result<DVector<f64>, PropagationError>;

    /// Copy the details of the latest integration step.
    fn latest_details(&self) -> IntegrationDetails;
}

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PropagationError {
    #[snafu(display("encountered a dynamics error {source}"))]
    Dynamics { source: DynamicsError },
    #[snafu(display("encountered an astro error {source}"))]
    Astro { source: AstroError },
    #[snafu(display("invalid Jacobian: {source}"))]
    Jacobian { source: StateError },
    #[snafu(display("{what} must be set before propagating"))]
    NotInitialized { what: &'static str },
    #[snafu(display(
        "osculating to mean conversion did not converge after {iterations} iterations (last correction {correction:.3e})"
    ))]
    MeanConversion { iterations: usize, correction: f64 },
    #[snafu(display(
        "parameter Jacobian has {found} columns but {expected} parameters are selected"
    ))]
    ParameterColumns { expected: usize, found: usize },
    #[snafu(display("integration produced a non finite state at {epoch}"))]
    NonFiniteState { epoch: Epoch },
    #[snafu(display("propagation failed because {source}"))]
    PropConfigError { source: ConfigError },
}

impl PropagationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Dynamics { source } => source.kind(),
            Self::Astro { source } => source.kind(),
            Self::Jacobian { source } => source.kind(),
            Self::NotInitialized { .. } => ErrorKind::NotInitialized,
            Self::MeanConversion { .. } | Self::NonFiniteState { .. } => {
                ErrorKind::NumericalDomain
            }
            Self::ParameterColumns { .. } | Self::PropConfigError { .. } => {
                ErrorKind::Configuration
            }
        }
    }
}

impl From<DynamicsError> for PropagationError {
    fn from(source: DynamicsError) -> Self {
        Self::Dynamics { source }
    }
}

impl From<AstroError> for PropagationError {
    fn from(source: AstroError) -> Self {
        Self::Astro { source }
    }
}

impl From<StateError> for PropagationError {
    fn from(source: StateError) -> Self {
        Self::Jacobian { source }
    }
}
