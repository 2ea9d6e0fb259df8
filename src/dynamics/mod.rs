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

use crate::cosmic::{AstroError, AttitudeProvider, EquinoctialState};
use crate::dual::{Dual, Real};
use crate::errors::ErrorKind;
use crate::time::Epoch;
use snafu::Snafu;
use std::fmt;

/// Equinoctial auxiliary elements, recomputed at each evaluation from the mean elements.
pub mod auxiliary;
pub use self::auxiliary::AuxiliaryElements;

/// Gauss variational equations and their averaging by Gauss-Legendre quadrature.
pub mod gaussian;
pub use self::gaussian::{GaussLegendre, GaussianQuadratureOptions};

/// Tunable force model parameters.
pub mod parameters;
pub use self::parameters::*;

/// Short-period series, their coefficients and their evaluation.
pub mod series;
pub use self::series::*;

/// Sum of all the contributions, with and without the variational equations.
pub mod orbital;
pub use self::orbital::*;

/// Spherical harmonics of the central body.
pub mod sph_harmonics;
pub use self::sph_harmonics::*;

mod newtonian;
pub use self::newtonian::{NewtonianAttraction, CENTRAL_ATTRACTION_COEFFICIENT};

mod zonal;
pub use self::zonal::ZonalHarmonics;

mod tesseral;
pub use self::tesseral::TesseralHarmonics;

mod third_body;
pub use self::third_body::ThirdBody;

/// Atmospheric drag models.
pub mod drag;
pub use self::drag::*;

/// Solar radiation pressure models.
pub mod solarpressure;
pub use self::solarpressure::*;

/// Everything a contribution needs to compute its mean element rates or its short-period series.
///
/// The auxiliary elements and the parameter values are of the same scalar type: plain numbers for
/// the nominal propagation, dual numbers seeded with the mean elements and the selected parameters
/// for the variational equations.
pub struct Context<'a, T: Real> {
    pub aux: AuxiliaryElements<T>,
    pub params: &'a ParameterValues<T>,
    pub attitude: Option<&'a dyn AttitudeProvider>,
    pub mass_kg: Option<f64>,
}

impl<'a, T: Real> Context<'a, T> {
    pub fn epoch(&self) -> Epoch {
        self.aux.epoch
    }

    /// Returns the value of a parameter declared by a contribution.
    pub fn parameter(&self, name: &str) -> Result<T, DynamicsError> {
        self.params.get(name)
    }

    /// Returns the spacecraft mass, required by the surface forces.
    pub fn mass_kg(&self, model: &str) -> Result<f64, DynamicsError> {
        match self.mass_kg {
            Some(mass) if mass > 0.0 => Ok(mass),
            _ => Err(DynamicsError::MassUnset {
                model: model.to_string(),
            }),
        }
    }
}

/// A perturbation of the Keplerian motion, expressed as an averaged rate of the mean elements and a short-period series.
///
/// Every operation has a twin working on [`Dual`] numbers, used to build the variational equations.
/// Implementors write their physics once, generically over [`Real`], and forward both to it.
pub trait Contribution: fmt::Display + Send + Sync {
    /// Name of this contribution, which prefixes the names of its short-period coefficients.
    fn name(&self) -> &str;

    /// Parameters declared by this contribution, with their initial values.
    fn parameters(&self) -> Vec<ParameterDriver> {
        Vec::new()
    }

    /// Checks that this contribution can be used with the provided initial state.
    fn init(
        &self,
        _state: &EquinoctialState,
        _attitude: Option<&dyn AttitudeProvider>,
    ) -> Result<(), DynamicsError> {
        Ok(())
    }

    /// Averaged time derivative of the mean elements `[a, ex, ey, hx, hy, λ]`.
    fn mean_rate(&self, ctx: &Context<f64>) -> Result<[f64; 6], DynamicsError>;

    /// Averaged time derivative of the mean elements, with partials.
    fn dual_mean_rate(&self, ctx: &Context<Dual>) -> Result<[Dual; 6], DynamicsError>;

    /// Computes the short-period series coefficients at the provided mean state.
    fn short_period_series(
        &self,
        ctx: &Context<f64>,
    ) -> Result<ShortPeriodSeries<f64>, DynamicsError>;

    /// Computes the short-period series coefficients at the provided mean state, with partials.
    fn dual_short_period_series(
        &self,
        ctx: &Context<Dual>,
    ) -> Result<ShortPeriodSeries<Dual>, DynamicsError>;

    /// Returns an empty set of short-period terms for this contribution, to be updated before use.
    fn short_period_terms(&self) -> ShortPeriodTerms {
        ShortPeriodTerms::new(self.name())
    }
}

/// Dynamical model errors.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DynamicsError {
    /// Truncation, order or degree inconsistent with the model.
    #[snafu(display("invalid configuration of {model}: {msg}"))]
    InvalidTruncation { model: String, msg: String },
    #[snafu(display("unknown parameter `{name}`"))]
    UnknownParameter { name: String },
    #[snafu(display("parameter `{name}` is declared more than once"))]
    DuplicateParameter { name: String },
    #[snafu(display("{selected} parameters selected but at most {max} are supported"))]
    TooManySelectedParameters { selected: usize, max: usize },
    #[snafu(display("{model} requires an attitude provider"))]
    AttitudeUnset { model: String },
    #[snafu(display("{model} requires the spacecraft mass"))]
    MassUnset { model: String },
    #[snafu(display("short-period terms of {model} used before their coefficients were computed"))]
    ShortPeriodUninitialized { model: String },
    #[snafu(display("{model} computed a non finite {what}"))]
    NonFinite { model: String, what: &'static str },
    /// Astrodynamics error.
    #[snafu(display("dynamical model encountered an astro error: {source}"))]
    DynamicsAstro { source: AstroError },
}

impl DynamicsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTruncation { .. }
            | Self::UnknownParameter { .. }
            | Self::DuplicateParameter { .. }
            | Self::TooManySelectedParameters { .. }
            | Self::AttitudeUnset { .. }
            | Self::MassUnset { .. } => ErrorKind::Configuration,
            Self::ShortPeriodUninitialized { .. } => ErrorKind::NotInitialized,
            Self::NonFinite { .. } | Self::DynamicsAstro { .. } => ErrorKind::NumericalDomain,
        }
    }
}

/// Checks that all the components are finite.
pub(crate) fn ensure_finite<T: Real>(
    values: &[T],
    model: &str,
    what: &'static str,
) -> Result<(), DynamicsError> {
    if values.iter().all(|x| x.re().is_finite()) {
        Ok(())
    } else {
        Err(DynamicsError::NonFinite {
            model: model.to_string(),
            what,
        })
    }
}
