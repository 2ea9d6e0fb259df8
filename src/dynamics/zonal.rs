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
    HarmonicsProvider, HarmonicsTables, ShortPeriodSeries,
};
use crate::cosmic::Frame;
use crate::dual::{Dual, Real};
use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;

/// Zonal harmonics (order zero) of the central body gravity field.
///
/// The zonal potential is symmetric about the pole, so its acceleration is computed directly in the
/// inertial frame and only depends on the mean longitude through the position on the orbit.
#[derive(Clone, Debug)]
pub struct ZonalHarmonics {
    field: Arc<dyn HarmonicsProvider>,
    tables: HarmonicsTables,
    degree: usize,
    radius_km: f64,
    quadrature: GaussLegendre,
    max_frequency: usize,
}

impl ZonalHarmonics {
    /// Builds the zonal harmonics up to `degree`, checking the truncation against the field and the quadrature.
    pub fn new(
        field: Arc<dyn HarmonicsProvider>,
        frame: &Frame,
        degree: usize,
        opts: GaussianQuadratureOptions,
    ) -> Result<Arc<Self>, DynamicsError> {
        let invalid = |msg: String| DynamicsError::InvalidTruncation {
            model: "zonal harmonics".to_string(),
            msg,
        };
        if degree < 2 {
            return Err(invalid(format!(
                "degree {degree} is below the lowest zonal degree 2"
            )));
        }
        if degree > field.max_degree() {
            return Err(invalid(format!(
                "degree {degree} exceeds the {} degree of the gravity field",
                field.max_degree()
            )));
        }
        if opts.max_frequency < degree {
            return Err(invalid(format!(
                "short-period truncation {} is below the degree {degree}",
                opts.max_frequency
            )));
        }
        let min_nodes = GaussianQuadratureOptions::min_nodes(opts.max_frequency);
        if opts.nodes < min_nodes {
            return Err(invalid(format!(
                "{} quadrature nodes cannot resolve frequency {} (at least {min_nodes} needed)",
                opts.nodes, opts.max_frequency
            )));
        }
        Ok(Arc::new(Self {
            field,
            tables: HarmonicsTables::new(degree),
            degree,
            radius_km: frame.equatorial_radius_km,
            quadrature: GaussLegendre::new(opts.nodes),
            max_frequency: opts.max_frequency,
        }))
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    fn fourier<T: Real>(&self, ctx: &Context<T>) -> Result<FourierCoefficients<T>, DynamicsError> {
        let aux = &ctx.aux;
        average(
            aux,
            (T::zero(), T::cst(TAU)),
            &self.quadrature,
            self.max_frequency,
            |point| {
                Ok(self.tables.acceleration(
                    self.field.as_ref(),
                    &point.position,
                    aux.mu,
                    self.radius_km,
                    self.degree,
                    0..=0,
                ))
            },
        )
    }
}

impl fmt::Display for ZonalHarmonics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "zonal harmonics up to J{} ({} nodes, {} harmonics)",
            self.degree,
            self.quadrature.len(),
            self.max_frequency
        )
    }
}

impl Contribution for ZonalHarmonics {
    fn name(&self) -> &str {
        "zonal"
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
mod ut_zonal {
    use super::*;
    use crate::cosmic::EARTH_J2000;
    use crate::dynamics::{AuxiliaryElements, HarmonicsMem, ParameterValues};
    use crate::time::Epoch;
    use approx::assert_relative_eq;

    fn ctx_values() -> ParameterValues<f64> {
        crate::dynamics::ParameterRegistry::default().values()
    }

    #[test]
    fn j2_secular_rates() {
        let zonal = ZonalHarmonics::new(
            Arc::new(HarmonicsMem::j2_jgm3()),
            &EARTH_J2000,
            2,
            GaussianQuadratureOptions::default(),
        )
        .unwrap();
        // Near circular orbit at 50 degrees of inclination
        let (sma, inc) = (7000.0_f64, 50.0_f64.to_radians());
        let hx = (inc / 2.0).tan();
        let el = [sma, 1e-4, 0.0, hx, 0.0, 0.3];
        let mu = EARTH_J2000.mu_km3_s2;
        let values = ctx_values();
        let ctx = Context {
            aux: AuxiliaryElements::new(&el, mu, Epoch::from_gregorian_tai_at_midnight(2024, 1, 1)),
            params: &values,
            attitude: None,
            mass_kg: None,
        };
        let rate = zonal.mean_rate(&ctx).unwrap();

        let j2 = -5.0_f64.sqrt() * HarmonicsMem::j2_jgm3().cs_nm(2, 0).0;
        let n = (mu / sma.powi(3)).sqrt();
        let re_a2 = (EARTH_J2000.equatorial_radius_km / sma).powi(2);
        let raan_dot = -1.5 * n * j2 * re_a2 * inc.cos();
        // With hy = 0, the node rate rotates the inclination vector along hy
        assert_relative_eq!(rate[4], hx * raan_dot, max_relative = 1e-3);
        assert!(rate[0].abs() < 1e-12);
        assert!(rate[3].abs() < 1e-3 * (hx * raan_dot).abs());
    }

    #[test]
    fn truncation_checks() {
        let field: Arc<dyn HarmonicsProvider> = Arc::new(HarmonicsMem::jgm3(4, 0));
        let opts = GaussianQuadratureOptions::default();
        let err = ZonalHarmonics::new(field.clone(), &EARTH_J2000, 1, opts).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
        assert!(ZonalHarmonics::new(field.clone(), &EARTH_J2000, 5, opts).is_err());
        let low = GaussianQuadratureOptions::builder().max_frequency(3).build();
        assert!(ZonalHarmonics::new(field.clone(), &EARTH_J2000, 4, low).is_err());
        let few = GaussianQuadratureOptions::builder().nodes(8).build();
        assert!(ZonalHarmonics::new(field.clone(), &EARTH_J2000, 4, few).is_err());
        assert!(ZonalHarmonics::new(field, &EARTH_J2000, 4, opts).is_ok());
    }
}
