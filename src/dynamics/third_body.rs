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

use super::gaussian::{average, FourierCoefficients};
use super::{
    Context, Contribution, DynamicsError, GaussLegendre, GaussianQuadratureOptions,
    ParameterDriver, ShortPeriodSeries,
};
use crate::cosmic::Ephemeris;
use crate::dual::{constant_vector, vec3, Dual, Real};
use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;

/// Scale of the gravitational parameters: 2^32 m^3/s^2, in km^3/s^2
const MU_SCALE: f64 = 4.294_967_296;

/// Point mass attraction of a perturbing body, relative to the central body.
///
/// The body is frozen at its position at the epoch of the mean state for the whole averaging.
#[derive(Clone, Debug)]
pub struct ThirdBody {
    body: Arc<dyn Ephemeris>,
    param_name: String,
    quadrature: GaussLegendre,
    max_frequency: usize,
}

impl ThirdBody {
    pub fn new(
        body: Arc<dyn Ephemeris>,
        opts: GaussianQuadratureOptions,
    ) -> Result<Arc<Self>, DynamicsError> {
        let min_nodes = GaussianQuadratureOptions::min_nodes(opts.max_frequency);
        if opts.nodes < min_nodes {
            return Err(DynamicsError::InvalidTruncation {
                model: body.name().to_string(),
                msg: format!(
                    "{} quadrature nodes cannot resolve frequency {} (at least {min_nodes} needed)",
                    opts.nodes, opts.max_frequency
                ),
            });
        }
        Ok(Arc::new(Self {
            param_name: format!("{} attraction coefficient", body.name()),
            body,
            quadrature: GaussLegendre::new(opts.nodes),
            max_frequency: opts.max_frequency,
        }))
    }

    /// Name of the gravitational parameter of the perturbing body
    pub fn parameter_name(&self) -> &str {
        &self.param_name
    }

    fn fourier<T: Real>(&self, ctx: &Context<T>) -> Result<FourierCoefficients<T>, DynamicsError> {
        let gm = ctx.parameter(&self.param_name)?;
        let r_body: [T; 3] = constant_vector(
            &self
                .body
                .position_km(ctx.epoch())
                .map_err(|source| DynamicsError::DynamicsAstro { source })?,
        );
        let d_body = vec3::norm(&r_body);
        let indirect = vec3::scale(gm / (d_body * d_body * d_body), &r_body);
        average(
            &ctx.aux,
            (T::zero(), T::cst(TAU)),
            &self.quadrature,
            self.max_frequency,
            |point| {
                let rel = vec3::sub(&r_body, &point.position);
                let d = vec3::norm(&rel);
                let direct = vec3::scale(gm / (d * d * d), &rel);
                Ok(vec3::sub(&direct, &indirect))
            },
        )
    }
}

impl fmt::Display for ThirdBody {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "third body {} ({} nodes, {} harmonics)",
            self.body.name(),
            self.quadrature.len(),
            self.max_frequency
        )
    }
}

impl Contribution for ThirdBody {
    fn name(&self) -> &str {
        self.body.name()
    }

    fn parameters(&self) -> Vec<ParameterDriver> {
        vec![ParameterDriver::new(
            &self.param_name,
            self.body.gm(),
            MU_SCALE,
        )]
    }

    fn mean_rate(&self, ctx: &Context<f64>) -> Result<[f64; 6], DynamicsError> {
        Ok(self.fourier(ctx)?.mean_rate)
    }

    fn dual_mean_rate(&self, ctx: &Context<Dual>) -> Result<[Dual; 6], DynamicsError> {
        Ok(self.fourier(ctx)?.mean_rate)
    }

    fn short_period_series(
        &self,
        ctx: &Context<f64>,
    ) -> Result<ShortPeriodSeries<f64>, DynamicsError> {
        let coeffs = self.fourier(ctx)?;
        Ok(ShortPeriodSeries::from_fourier(self.name(), &ctx.aux, &coeffs))
    }

    fn dual_short_period_series(
        &self,
        ctx: &Context<Dual>,
    ) -> Result<ShortPeriodSeries<Dual>, DynamicsError> {
        let coeffs = self.fourier(ctx)?;
        Ok(ShortPeriodSeries::from_fourier(self.name(), &ctx.aux, &coeffs))
    }
}

#[cfg(test)]
mod ut_third_body {
    use super::*;
    use crate::cosmic::{FixedBody, EARTH_J2000};
    use crate::dynamics::{AuxiliaryElements, ParameterRegistry};
    use crate::linalg::Vector3;
    use crate::time::Epoch;
    use approx::assert_abs_diff_eq;

    #[test]
    fn body_along_pole_precesses_node() {
        // A body on the pole exerts an axisymmetric pull: no secular change of sma nor inclination
        let moon = Arc::new(FixedBody {
            name: "Moon".to_string(),
            gm: crate::cosmic::MOON_GM,
            position_km: Vector3::new(0.0, 0.0, 384_400.0),
        });
        let third = ThirdBody::new(moon, GaussianQuadratureOptions::default()).unwrap();
        assert_eq!(third.parameter_name(), "Moon attraction coefficient");
        let registry = ParameterRegistry::from_contributions(&[third.clone() as Arc<dyn Contribution>])
            .unwrap();
        let values = registry.values();
        let ctx = Context {
            aux: AuxiliaryElements::new(
                &[42_164.0, 0.0, 0.0, 0.1, 0.0, 0.0],
                EARTH_J2000.mu_km3_s2,
                Epoch::from_gregorian_tai_at_midnight(2024, 1, 1),
            ),
            params: &values,
            attitude: None,
            mass_kg: None,
        };
        let rate = third.mean_rate(&ctx).unwrap();
        assert_abs_diff_eq!(rate[0], 0.0, epsilon = 1e-12);
        // The node regresses, moving the inclination vector along hy
        assert!(rate[4].abs() > 1e-12);
        assert_abs_diff_eq!(rate[3], 0.0, epsilon = 1e-15);
    }
}
