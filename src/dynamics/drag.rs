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
use super::gaussian::{average, FourierCoefficients};
use super::{
    Context, Contribution, DynamicsError, GaussLegendre, GaussianQuadratureOptions,
    ParameterDriver, ShortPeriodSeries,
};
use crate::cosmic::{AttitudeProvider, EquinoctialState, Frame};
use crate::dual::{vec3, Dual, Real};
use crate::linalg::Vector3;
use crate::time::Epoch;
use serde_derive::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;

/// Name of the drag coefficient parameter
pub const DRAG_COEFFICIENT: &str = "drag coefficient";

/// Scale of the dimensionless surface force coefficients
pub(crate) const COEFFICIENT_SCALE: f64 = 1.0 / 1_048_576.0;

/// Atmosphere ceiling in km, above which the drag is neglected
pub const DEFAULT_MAX_ALTITUDE_KM: f64 = 1000.0;

/// Density models of the atmosphere, as a function of the altitude above a spherical body.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AtmosphereModel {
    /// Constant density in kg/m^3
    Constant { rho_kg_m3: f64 },
    /// Exponentially decaying density from a reference altitude
    Exponential {
        rho_ref_kg_m3: f64,
        ref_altitude_km: f64,
        scale_height_km: f64,
    },
}

impl AtmosphereModel {
    /// Exponential model anchored at 700 km, from Vallado, 4th ed., table 8-4.
    pub fn exponential_700km() -> Self {
        Self::Exponential {
            rho_ref_kg_m3: 3.614e-14,
            ref_altitude_km: 700.0,
            scale_height_km: 88.667,
        }
    }

    /// Density in kg/m^3 at the provided altitude.
    pub fn density<T: Real>(&self, altitude_km: T) -> T {
        match *self {
            Self::Constant { rho_kg_m3 } => T::cst(rho_kg_m3),
            Self::Exponential {
                rho_ref_kg_m3,
                ref_altitude_km,
                scale_height_km,
            } => {
                T::cst(rho_ref_kg_m3)
                    * (-(altitude_km - T::cst(ref_altitude_km)) / T::cst(scale_height_km)).exp()
            }
        }
    }
}

/// Shape of the spacecraft, as seen by the surface forces.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SpacecraftShape {
    /// Same cross section from any direction
    Sphere { area_m2: f64 },
    /// One flat surface, whose normal is fixed in the body frame: requires an attitude provider
    Plate {
        area_m2: f64,
        normal_body: [f64; 3],
    },
}

impl SpacecraftShape {
    pub fn needs_attitude(&self) -> bool {
        matches!(self, Self::Plate { .. })
    }

    /// Cross section in m^2 seen from the unit direction `dir`, at the provided point of the orbit.
    pub(crate) fn cross_section<T: Real>(
        &self,
        model: &str,
        dir: &[T; 3],
        point: &OrbitPoint<T>,
        epoch: Epoch,
        attitude: Option<&dyn AttitudeProvider>,
    ) -> Result<T, DynamicsError> {
        match *self {
            Self::Sphere { area_m2 } => Ok(T::cst(area_m2)),
            Self::Plate {
                area_m2,
                normal_body,
            } => {
                let provider = attitude.ok_or_else(|| DynamicsError::AttitudeUnset {
                    model: model.to_string(),
                })?;
                let [rx, ry, rz] = vec3::real(&point.position);
                let [vx, vy, vz] = vec3::real(&point.velocity);
                let q = provider.attitude(
                    &Vector3::new(rx, ry, rz),
                    &Vector3::new(vx, vy, vz),
                    epoch,
                );
                let normal: Vector3<f64> =
                    q.inverse() * Vector3::<f64>::from(normal_body).normalize();
                let cos_angle = vec3::dot(
                    &[T::cst(normal.x), T::cst(normal.y), T::cst(normal.z)],
                    dir,
                );
                Ok(T::cst(area_m2) * cos_angle.abs())
            }
        }
    }
}

impl fmt::Display for SpacecraftShape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Sphere { area_m2 } => write!(f, "sphere of {area_m2} m^2"),
            Self::Plate {
                area_m2,
                normal_body,
            } => write!(
                f,
                "plate of {area_m2} m^2 with normal [{}, {}, {}]",
                normal_body[0], normal_body[1], normal_body[2]
            ),
        }
    }
}

/// Atmospheric drag, with an atmosphere corotating with the central body.
///
/// The acceleration is `-1/2 ρ Cd A/m |v_rel| v_rel`, where `v_rel = v - ω × r` is the velocity with respect to the atmosphere.
/// It is only averaged over the part of the orbit below the atmosphere ceiling.
#[derive(Clone, Debug)]
pub struct AtmosphericDrag {
    pub atmosphere: AtmosphereModel,
    pub shape: SpacecraftShape,
    cd: f64,
    pub max_altitude_km: f64,
    radius_km: f64,
    rotation_rate_rad_s: f64,
    quadrature: GaussLegendre,
    max_frequency: usize,
}

impl AtmosphericDrag {
    pub fn new(
        atmosphere: AtmosphereModel,
        shape: SpacecraftShape,
        cd: f64,
        frame: &Frame,
        opts: GaussianQuadratureOptions,
    ) -> Result<Arc<Self>, DynamicsError> {
        Ok(Arc::new(Self::new_raw(atmosphere, shape, cd, frame, opts)?))
    }

    /// Builds the drag model _without_ encapsulating it in an Arc, e.g. to change its ceiling.
    pub fn new_raw(
        atmosphere: AtmosphereModel,
        shape: SpacecraftShape,
        cd: f64,
        frame: &Frame,
        opts: GaussianQuadratureOptions,
    ) -> Result<Self, DynamicsError> {
        let min_nodes = GaussianQuadratureOptions::min_nodes(opts.max_frequency);
        if opts.nodes < min_nodes {
            return Err(DynamicsError::InvalidTruncation {
                model: "drag".to_string(),
                msg: format!(
                    "{} quadrature nodes cannot resolve frequency {} (at least {min_nodes} needed)",
                    opts.nodes, opts.max_frequency
                ),
            });
        }
        Ok(Self {
            atmosphere,
            shape,
            cd,
            max_altitude_km: DEFAULT_MAX_ALTITUDE_KM,
            radius_km: frame.equatorial_radius_km,
            rotation_rate_rad_s: frame.rotation_rate_rad_s,
            quadrature: GaussLegendre::new(opts.nodes),
            max_frequency: opts.max_frequency,
        })
    }

    /// True longitude arc below the atmosphere ceiling.
    pub fn limits<T: Real>(&self, aux: &AuxiliaryElements<T>) -> (T, T) {
        let r_max = T::cst(self.radius_km + self.max_altitude_km);
        let perigee = aux.sma * (T::one() - aux.ecc);
        let apogee = aux.sma * (T::one() + aux.ecc);
        if perigee.re() >= r_max.re() {
            (T::zero(), T::zero())
        } else if apogee.re() <= r_max.re() {
            (T::zero(), T::cst(TAU))
        } else {
            let half_arc = ((aux.slr() / r_max - T::one()) / aux.ecc).acos();
            let lon_peri = aux.longitude_of_periapsis();
            (lon_peri - half_arc, lon_peri + half_arc)
        }
    }

    fn acceleration<T: Real>(
        &self,
        ctx: &Context<T>,
        point: &OrbitPoint<T>,
        cd: T,
        mass_kg: f64,
    ) -> Result<[T; 3], DynamicsError> {
        let altitude = point.rmag - T::cst(self.radius_km);
        if altitude.re() > self.max_altitude_km {
            return Ok([T::zero(); 3]);
        }
        let rho = self.atmosphere.density(altitude);
        let omega = T::cst(self.rotation_rate_rad_s);
        let (r, v) = (&point.position, &point.velocity);
        let v_rel = [v[0] + omega * r[1], v[1] - omega * r[0], v[2]];
        let speed = vec3::norm(&v_rel);
        let dir = vec3::scale(T::one() / speed, &v_rel);
        let area = self
            .shape
            .cross_section(self.name(), &dir, point, ctx.epoch(), ctx.attitude)?;
        // ρ A/m is in 1/m, and the velocity in km/s
        let fact = T::cst(-0.5e3 / mass_kg) * rho * cd * area * speed;
        Ok(vec3::scale(fact, &v_rel))
    }

    fn fourier<T: Real>(&self, ctx: &Context<T>) -> Result<FourierCoefficients<T>, DynamicsError> {
        let cd = ctx.parameter(DRAG_COEFFICIENT)?;
        let mass = ctx.mass_kg(self.name())?;
        average(
            &ctx.aux,
            self.limits(&ctx.aux),
            &self.quadrature,
            self.max_frequency,
            |point| self.acceleration(ctx, point, cd, mass),
        )
    }
}

impl fmt::Display for AtmosphericDrag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "drag of a {} (Cd = {}) below {} km",
            self.shape, self.cd, self.max_altitude_km
        )
    }
}

impl Contribution for AtmosphericDrag {
    fn name(&self) -> &str {
        "drag"
    }

    fn parameters(&self) -> Vec<ParameterDriver> {
        vec![ParameterDriver::new(
            DRAG_COEFFICIENT,
            self.cd,
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
