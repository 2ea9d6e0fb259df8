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

/*! # dsst

Semi-analytical satellite theory: propagate slowly varying *mean* equinoctial elements with
large integration steps, then rebuild the instantaneous *osculating* orbit by adding the
short-period series of every perturbation.

The variational equations of the mean element rates are computed with hyperdual numbers,
so the state transition matrix and the parameter sensitivity matrix come out of the same
code path as the nominal propagation.
*/

/// Provides the integrator interface, the embedded Runge Kutta integrators, the short-period
/// synthesis engine and the semi-analytical propagator itself.
pub mod propagators;

/// Provides the perturbation contributions (mean element rates and short-period series), which can be freely combined.
pub mod dynamics;

/// Provides frames, orbital states (Cartesian and equinoctial), and the attitude and ephemeris provider interfaces.
pub mod cosmic;

/// Real and hyperdual scalars, on which all of the physics is written generically.
pub mod dual;

/// Utility functions shared by different modules, and which may be useful to engineers.
pub mod utils;

mod errors;
/// Classification of every error of this crate into configuration, numerical domain or initialization errors.
pub use self::errors::{ErrorKind, StateError};

/// YAML configuration of force models and propagators.
pub mod io;

#[macro_use]
extern crate log;
extern crate hifitime;
extern crate nalgebra as na;

/// Re-export of hifitime
pub mod time {
    pub use hifitime::*;
}

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
    pub use na::{Rotation3, UnitQuaternion};
}

/// Re-export some useful things
pub use self::cosmic::{ElementKind, EquinoctialState, Frame, Orbit, PositionAngle, TimeTagged};
pub use self::propagators::{PropagationKind, SemiAnalyticalPropagator};
