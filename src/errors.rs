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

use snafu::prelude::*;
use std::fmt;

/// The three families of failures of the semi-analytical theory.
///
/// Configuration and initialization errors are detected at setup and are never retried.
/// Numerical domain errors are detected where the violation happens, and the osculating to
/// mean conversion is the only place where they are retried (up to its iteration limit).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid truncation, unknown parameter, mismatched Jacobian dimensions, bad input file...
    Configuration,
    /// Singular elements, non convergent iteration, non finite derivatives.
    NumericalDomain,
    /// Something was queried before it was set up.
    NotInitialized,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration error"),
            Self::NumericalDomain => write!(f, "numerical domain error"),
            Self::NotInitialized => write!(f, "not initialized"),
        }
    }
}

/// Errors related to the Jacobian blocks carried by a state.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StateError {
    #[snafu(display(
        "{block} Jacobian must be {expected_rows}x{expected_cols} but is {rows}x{cols}"
    ))]
    JacobianDimension {
        block: &'static str,
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },
    #[snafu(display("no {block} Jacobian is attached to this state"))]
    JacobianUnset { block: &'static str },
}

impl StateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::JacobianDimension { .. } => ErrorKind::Configuration,
            Self::JacobianUnset { .. } => ErrorKind::NotInitialized,
        }
    }
}
