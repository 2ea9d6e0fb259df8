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

mod rk;
pub use self::rk::*;
mod dormand;
pub use self::dormand::*;
mod fehlberg;
pub use self::fehlberg::*;
mod verner;
pub use self::verner::*;

/// The `RK` trait defines an explicit Runge Kutta method by its Butcher table.
#[allow(clippy::upper_case_acronyms)]
pub trait RK
where
    Self: Sized,
{
    /// Order of the solution which is propagated, used to adapt the step size.
    const ORDER: u8;

    /// Number of stages, i.e. of evaluations of the equations of motion per attempted step.
    const STAGES: usize;

    /// Lower triangle of the A matrix of the Butcher table, row by row, of size STAGES*(STAGES-1)/2.
    /// *Warning:* the nodes are deduced from these coefficients, i.e. c_i = \sum_j a_{ij}.
    const A_COEFFS: &'static [f64];

    /// The b_i coefficients of the propagated solution, followed by the b^*_i of the embedded
    /// solution used to estimate the error, i.e. 2*STAGES coefficients.
    const B_COEFFS: &'static [f64];
}
