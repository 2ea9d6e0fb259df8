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

use super::{AuxiliaryElements, Context, Contribution, DynamicsError, ParameterDriver};
use super::ShortPeriodSeries;
use crate::dual::{Dual, Real};
use std::fmt;

/// Name of the gravitational parameter of the central body
pub const CENTRAL_ATTRACTION_COEFFICIENT: &str = "central attraction coefficient";

/// Scale of the gravitational parameter: 2^32 m^3/s^2, in km^3/s^2
const MU_SCALE: f64 = 4.294_967_296;

/// Keplerian motion about the central body.
///
/// Its only effect on the mean elements is the mean motion on λ, and it has no short-period terms.
/// The central body's gravitational parameter is the `central attraction coefficient` parameter, so
/// its partials are available like those of any force model coefficient.
#[derive(Clone, Debug, PartialEq)]
pub struct NewtonianAttraction {
    mu_km3_s2: f64,
}

impl NewtonianAttraction {
    pub fn new(mu_km3_s2: f64) -> Self {
        Self { mu_km3_s2 }
    }

    fn rate<T: Real>(aux: &AuxiliaryElements<T>) -> [T; 6] {
        let mut rate = [T::zero(); 6];
        rate[5] = aux.n;
        rate
    }
}

impl fmt::Display for NewtonianAttraction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Newtonian attraction (μ = {} km^3/s^2)", self.mu_km3_s2)
    }
}

impl Contribution for NewtonianAttraction {
    fn name(&self) -> &str {
        "Newtonian"
    }

    fn parameters(&self) -> Vec<ParameterDriver> {
        vec![ParameterDriver::new(
            CENTRAL_ATTRACTION_COEFFICIENT,
            self.mu_km3_s2,
            MU_SCALE,
        )]
    }

    fn mean_rate(&self, ctx: &Context<f64>) -> Result<[f64; 6], DynamicsError> {
        Ok(Self::rate(&ctx.aux))
    }

    fn dual_mean_rate(&self, ctx: &Context<Dual>) -> Result<[Dual; 6], DynamicsError> {
        Ok(Self::rate(&ctx.aux))
    }

    fn short_period_series(
        &self,
        ctx: &Context<f64>,
    ) -> Result<ShortPeriodSeries<f64>, DynamicsError> {
        Ok(ShortPeriodSeries::empty(self.name(), &ctx.aux))
    }

    fn dual_short_period_series(
        &self,
        ctx: &Context<Dual>,
    ) -> Result<ShortPeriodSeries<Dual>, DynamicsError> {
        Ok(ShortPeriodSeries::empty(self.name(), &ctx.aux))
    }
}
