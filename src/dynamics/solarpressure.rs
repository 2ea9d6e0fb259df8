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

use super::auxiliary::{AuxiliaryElements, OrbitPoint};
use super::drag::{SpacecraftShape, COEFFICIENT_SCALE};
use super::gaussian::{average, FourierCoefficients};
use super::{
    Context, Contribution, DynamicsError, GaussLegendre, GaussianQuadratureOptions,
    ParameterDriver, ShortPeriodSeries,
};
use crate::cosmic::{AttitudeProvider, Ephemeris, EquinoctialState, Frame, AU};
use crate::dual::{constant_vector, vec3, Dual, Real};
use crate::linalg::Vector3;
use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;

/// Name of the reflection coefficient parameter
pub const REFLECTION_COEFFICIENT: &str = "reflection coefficient";

/// Solar radiation pressure at 1 AU, in N/m^2
pub const SOLAR_PRESSURE_1AU: f64 = 4.56e-6;

/// Number of samples of the orbit used to bracket the shadow boundaries
const SHADOW_SAMPLES: usize = 360;

/// Solar radiation pressure, with a cylindrical shadow of the central body.
///
/// The acceleration is `P0 Cr A/m (AU/d)²` along the Sun to spacecraft direction, and is averaged
/// over the sunlit arc of the orbit only. The arc boundaries are found numerically and carry their
/// partials with respect to the elements into the variational equations.
#[derive(Clone, Debug)]
pub struct SolarRadiationPressure {
    sun: Arc<dyn Ephemeris>,
    pub shape: SpacecraftShape,
    cr: f64,
    body_radius_km: f64,
    /// Set to false to ignore the eclipses
    pub shadow: bool,
    quadrature: GaussLegendre,
    max_frequency: usize,
}

impl SolarRadiationPressure {
    pub fn new(
        sun: Arc<dyn Ephemeris>,
        shape: SpacecraftShape,
        cr: f64,
        frame: &Frame,
        opts: GaussianQuadratureOptions,
    ) -> Result<Arc<Self>, DynamicsError> {
        Ok(Arc::new(Self::new_raw(sun, shape, cr, frame, opts)?))
    }

    /// Builds the model _without_ encapsulating it in an Arc, e.g. to disable the shadow.
    pub fn new_raw(
        sun: Arc<dyn Ephemeris>,
        shape: SpacecraftShape,
        cr: f64,
        frame: &Frame,
        opts: GaussianQuadratureOptions,
    ) -> Result<Self, DynamicsError> {
        let min_nodes = GaussianQuadratureOptions::min_nodes(opts.max_frequency);
        if opts.nodes < min_nodes {
            return Err(DynamicsError::InvalidTruncation {
                model: "SRP".to_string(),
                msg: format!(
                    "{} quadrature nodes cannot resolve frequency {} (at least {min_nodes} needed)",
                    opts.nodes, opts.max_frequency
                ),
            });
        }
        Ok(Self {
            sun,
            shape,
            cr,
            body_radius_km: frame.equatorial_radius_km,
            shadow: true,
            quadrature: GaussLegendre::new(opts.nodes),
            max_frequency: opts.max_frequency,
        })
    }

    /// Whether this position is outside of the shadow cylinder of the central body.
    fn is_lit(&self, r: &[f64; 3], sun_dir: &Vector3<f64>) -> bool {
        let r = Vector3::new(r[0], r[1], r[2]);
        let proj = r.dot(sun_dir);
        proj > 0.0 || (r - proj * sun_dir).norm() > self.body_radius_km
    }

    /// True longitude arc where the spacecraft is sunlit, as (exit of the shadow, entry in the shadow).
    ///
    /// The boundaries are bracketed and bisected on the real part of the elements, then refined with
    /// one Newton step on the shadow function so that their partials follow the elements.
    pub fn sunlit_limits<T: Real>(
        &self,
        aux: &AuxiliaryElements<T>,
        sun_km: &Vector3<f64>,
    ) -> (T, T) {
        if !self.shadow {
            return (T::zero(), T::cst(TAU));
        }
        let real_aux = AuxiliaryElements::new(
            &[
                aux.sma.re(),
                aux.k.re(),
                aux.h.re(),
                aux.q.re(),
                aux.p.re(),
                aux.lm.re(),
            ],
            aux.mu.re(),
            aux.epoch,
        );
        let sun_dir = sun_km.normalize();
        let lit_at =
            |lon: f64| self.is_lit(&real_aux.point_at_true_longitude(lon).position, &sun_dir);
        let step = TAU / SHADOW_SAMPLES as f64;
        let lit: Vec<bool> = (0..SHADOW_SAMPLES).map(|i| lit_at(i as f64 * step)).collect();
        if lit.iter().all(|l| *l) {
            return (T::zero(), T::cst(TAU));
        } else if lit.iter().all(|l| !*l) {
            return (T::zero(), T::zero());
        }

        // Bisection of the sample interval where the lighting changes
        let boundary = |start: f64, lit_at_start: bool| {
            let (mut lo, mut hi) = (start, start + step);
            for _ in 0..60 {
                let mid = 0.5 * (lo + hi);
                if lit_at(mid) == lit_at_start {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            0.5 * (lo + hi)
        };
        let mut exit = 0.0;
        let mut entry = TAU;
        for i in 0..SHADOW_SAMPLES {
            let next = lit[(i + 1) % SHADOW_SAMPLES];
            if lit[i] && !next {
                entry = boundary(i as f64 * step, true);
            } else if !lit[i] && next {
                exit = boundary(i as f64 * step, false);
            }
        }
        if entry < exit {
            entry += TAU;
        }
        (
            self.refine_boundary(aux, &real_aux, exit, &sun_dir),
            self.refine_boundary(aux, &real_aux, entry, &sun_dir),
        )
    }

    /// Newton step on `g(L) = |r|² - (r·s)² - R²`, the squared distance to the shadow cylinder axis
    /// minus its squared radius, with the slope evaluated on the real part.
    fn refine_boundary<T: Real>(
        &self,
        aux: &AuxiliaryElements<T>,
        real_aux: &AuxiliaryElements<f64>,
        lon: f64,
        sun_dir: &Vector3<f64>,
    ) -> T {
        let s: [T; 3] = constant_vector(sun_dir);
        let point = aux.point_at_true_longitude(T::cst(lon));
        let proj = vec3::dot(&point.position, &s);
        let g = vec3::dot(&point.position, &point.position)
            - proj * proj
            - T::cst(self.body_radius_km * self.body_radius_km);

        let real_point = real_aux.point_at_true_longitude(lon);
        let r = Vector3::<f64>::from(real_point.position);
        let v = Vector3::<f64>::from(real_point.velocity);
        // dr/dL = v r² / h
        let dr = v * (r.norm_squared() / r.cross(&v).norm());
        let slope = 2.0 * (r.dot(&dr) - r.dot(sun_dir) * dr.dot(sun_dir));
        if slope.abs() < f64::EPSILON {
            return T::cst(lon);
        }
        T::cst(lon) - g / T::cst(slope)
    }

    fn acceleration<T: Real>(
        &self,
        ctx: &Context<T>,
        point: &OrbitPoint<T>,
        sun: &[T; 3],
        cr: T,
        mass_kg: f64,
    ) -> Result<[T; 3], DynamicsError> {
        let from_sun = vec3::sub(&point.position, sun);
        let dist = vec3::norm(&from_sun);
        let dir = vec3::scale(T::one() / dist, &from_sun);
        let area = self
            .shape
            .cross_section(self.name(), &dir, point, ctx.epoch(), ctx.attitude)?;
        let au_dist = T::cst(AU) / dist;
        // N/kg are m/s^2, hence the conversion to km/s^2
        let fact = T::cst(SOLAR_PRESSURE_1AU / mass_kg * 1e-3) * cr * area * au_dist * au_dist;
        Ok(vec3::scale(fact, &dir))
    }

    fn fourier<T: Real>(&self, ctx: &Context<T>) -> Result<FourierCoefficients<T>, DynamicsError> {
        let cr = ctx.parameter(REFLECTION_COEFFICIENT)?;
        let mass = ctx.mass_kg(self.name())?;
        let sun_km = self
            .sun
            .position_km(ctx.epoch())
            .map_err(|source| DynamicsError::DynamicsAstro { source })?;
        let sun: [T; 3] = constant_vector(&sun_km);

        let limits = self.sunlit_limits(&ctx.aux, &sun_km);
        average(
            &ctx.aux,
            limits,
            &self.quadrature,
            self.max_frequency,
            |point| self.acceleration(ctx, point, &sun, cr, mass),
        )
    }
}

impl fmt::Display for SolarRadiationPressure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "SRP of a {} (Cr = {}){}",
            self.shape,
            self.cr,
            if self.shadow { "" } else { " without eclipses" }
        )
    }
}

impl Contribution for SolarRadiationPressure {
    fn name(&self) -> &str {
        "SRP"
    }

    fn parameters(&self) -> Vec<ParameterDriver> {
        vec![ParameterDriver::new(
            REFLECTION_COEFFICIENT,
            self.cr,
            COEFFICIENT_SCALE,
        )]
    }

    fn init(
        &self,
        state: &EquinoctialState,
        attitude: Option<&dyn AttitudeProvider>,
    ) -> Result<(), DynamicsError> {
        if state.mass_kg.map_or(true, |m| m <= 0.0) {
            return Err(DynamicsError::MassUnset {
                model: self.name().to_string(),
            });
        }
        if self.shape.needs_attitude() && attitude.is_none() {
            return Err(DynamicsError::AttitudeUnset {
                model: self.name().to_string(),
            });
        }
        Ok(())
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
mod ut_srp {
    use super::*;
    use crate::cosmic::{FixedBody, EARTH_J2000, SUN_GM};
    use crate::dual::{partial, seeded, ELEMENT_SLOT};
    use crate::dynamics::ParameterRegistry;
    use crate::linalg::Vector6;
    use crate::time::Epoch;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn sun_on_x() -> Arc<dyn Ephemeris> {
        Arc::new(FixedBody {
            name: "Sun".to_string(),
            gm: SUN_GM,
            position_km: Vector3::new(AU, 0.0, 0.0),
        })
    }

    #[test]
    fn cylindrical_shadow_limits() {
        let srp = SolarRadiationPressure::new(
            sun_on_x(),
            SpacecraftShape::Sphere { area_m2: 1.0 },
            1.5,
            &EARTH_J2000,
            GaussianQuadratureOptions::default(),
        )
        .unwrap();
        let aux = AuxiliaryElements::new(
            &[7000.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            EARTH_J2000.mu_km3_s2,
            Epoch::from_gregorian_tai_at_midnight(2024, 1, 1),
        );
        let (exit, entry) = srp.sunlit_limits(&aux, &Vector3::new(AU, 0.0, 0.0));
        let beta = (EARTH_J2000.equatorial_radius_km / 7000.0).asin();
        assert_relative_eq!(exit, PI + beta, epsilon = 1e-9);
        assert_relative_eq!(entry, 3.0 * PI - beta, epsilon = 1e-9);
    }

    #[test]
    fn constant_force_pumps_eccentricity() {
        let mut srp = SolarRadiationPressure::new_raw(
            sun_on_x(),
            SpacecraftShape::Sphere { area_m2: 10.0 },
            1.5,
            &EARTH_J2000,
            GaussianQuadratureOptions::default(),
        )
        .unwrap();
        srp.shadow = false;
        let srp = Arc::new(srp);
        let registry =
            ParameterRegistry::from_contributions(&[srp.clone() as Arc<dyn Contribution>])
                .unwrap();
        let values = registry.values();
        let sma = 7000.0;
        let ctx = Context {
            aux: AuxiliaryElements::new(
                &[sma, 0.0, 0.0, 0.0, 0.0, 0.0],
                EARTH_J2000.mu_km3_s2,
                Epoch::from_gregorian_tai_at_midnight(2024, 1, 1),
            ),
            params: &values,
            attitude: None,
            mass_kg: Some(100.0),
        };
        let rate = srp.mean_rate(&ctx).unwrap();
        let force = SOLAR_PRESSURE_1AU * 1.5 * 10.0 / 100.0 * 1e-3;
        let n = (EARTH_J2000.mu_km3_s2 / sma.powi(3)).sqrt();
        assert!(rate[0].abs() < 1e-14);
        let de = (rate[1].powi(2) + rate[2].powi(2)).sqrt();
        assert_relative_eq!(de, 1.5 * force / (n * sma), max_relative = 1e-3);
        // The eccentricity vector grows perpendicular to the Sun line
        assert!(rate[1].abs() < 1e-3 * de);
    }

    #[test]
    fn eclipse_boundaries_in_partials() {
        let srp = SolarRadiationPressure::new(
            sun_on_x(),
            SpacecraftShape::Sphere { area_m2: 10.0 },
            1.5,
            &EARTH_J2000,
            GaussianQuadratureOptions::default(),
        )
        .unwrap();
        let registry =
            ParameterRegistry::from_contributions(&[srp.clone() as Arc<dyn Contribution>])
                .unwrap();
        let values = registry.values::<f64>();
        let dual_values = registry.dual_values().unwrap();
        let epoch = Epoch::from_gregorian_tai_at_midnight(2024, 1, 1);
        let mu = EARTH_J2000.mu_km3_s2;
        let el = [7000.0, 0.01, 0.005, 0.05, 0.02, 0.3];

        let rate_at = |el: &[f64; 6]| {
            let ctx = Context {
                aux: AuxiliaryElements::new(el, mu, epoch),
                params: &values,
                attitude: None,
                mass_kg: Some(100.0),
            };
            Vector6::from(srp.mean_rate(&ctx).unwrap())
        };

        let seeded_el: [Dual; 6] = std::array::from_fn(|i| seeded(el[i], ELEMENT_SLOT + i));
        let ctx = Context {
            aux: AuxiliaryElements::new(&seeded_el, Dual::cst(mu), epoch),
            params: &dual_values,
            attitude: None,
            mass_kg: Some(100.0),
        };

        // The orbit crosses the shadow and its boundaries move with the elements
        let (exit, entry) = srp.sunlit_limits(&ctx.aux, &Vector3::new(AU, 0.0, 0.0));
        assert!(exit.re() > 0.0 && entry.re() - exit.re() < TAU);
        assert!(partial(&exit, ELEMENT_SLOT + 1).abs() > 1e-3);

        let rate = srp.dual_mean_rate(&ctx).unwrap();
        // The mean rates do not depend on the mean longitude, hence only the first five columns
        let steps = [1e-2, 1e-6, 1e-6, 1e-6, 1e-6];
        for (j, h) in steps.iter().enumerate() {
            let mut plus = el;
            plus[j] += h;
            let mut minus = el;
            minus[j] -= h;
            let fd = (rate_at(&plus) - rate_at(&minus)) / (2.0 * h);
            let ad = Vector6::from_fn(|i, _| partial(&rate[i], ELEMENT_SLOT + j));
            let err = (ad - fd).norm() / fd.norm();
            assert!(err < 1e-5, "column {j}: relative error of {err:.3e}");
        }
    }
}
