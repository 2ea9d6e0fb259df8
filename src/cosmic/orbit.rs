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

use super::{AstroError, Frame, TimeTagged};
use crate::linalg::{Vector3, Vector6};
use crate::time::Epoch;
use std::f64::EPSILON;
use std::fmt;

/// Orbit defines a Cartesian orbital state, always non singular.
///
/// This is the input and output representation of the semi-analytical propagator, which itself
/// works on equinoctial elements (cf. [`super::EquinoctialState`]).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Orbit {
    /// in km
    pub x_km: f64,
    /// in km
    pub y_km: f64,
    /// in km
    pub z_km: f64,
    /// in km/s
    pub vx_km_s: f64,
    /// in km/s
    pub vy_km_s: f64,
    /// in km/s
    pub vz_km_s: f64,
    pub epoch: Epoch,
    pub frame: Frame,
}

impl Orbit {
    /// Creates a new Orbit in the provided frame at the provided Epoch.
    ///
    /// **Units:** km, km, km, km/s, km/s, km/s
    #[allow(clippy::too_many_arguments)]
    pub fn cartesian(
        x_km: f64,
        y_km: f64,
        z_km: f64,
        vx_km_s: f64,
        vy_km_s: f64,
        vz_km_s: f64,
        epoch: Epoch,
        frame: Frame,
    ) -> Self {
        Self {
            x_km,
            y_km,
            z_km,
            vx_km_s,
            vy_km_s,
            vz_km_s,
            epoch,
            frame,
        }
    }

    /// Creates a new elliptical Orbit from the Keplerian orbital elements.
    ///
    /// **Units:** km, none, degrees, degrees, degrees, degrees
    ///
    /// The conversion is the one of GMAT's StateConversionUtil::ComputeKeplToCart.
    #[allow(clippy::too_many_arguments)]
    pub fn keplerian(
        sma_km: f64,
        ecc: f64,
        inc_deg: f64,
        raan_deg: f64,
        aop_deg: f64,
        ta_deg: f64,
        epoch: Epoch,
        frame: Frame,
    ) -> Result<Self, AstroError> {
        if frame.mu_km3_s2.abs() < EPSILON {
            warn!(
                "GM is near zero ({}): expect math errors in Keplerian to Cartesian conversion",
                frame.mu_km3_s2
            );
        }
        if !(0.0..1.0).contains(&ecc) || sma_km <= 0.0 {
            return Err(AstroError::NotElliptic {
                ecc,
                limit: 1.0,
            });
        }
        let inc = inc_deg.to_radians();
        let raan = raan_deg.to_radians();
        let aop = aop_deg.to_radians();
        let ta = ta_deg.to_radians();
        let p = sma_km * (1.0 - ecc.powi(2));
        let radius = p / (1.0 + ecc * ta.cos());
        let (sin_aop_ta, cos_aop_ta) = (aop + ta).sin_cos();
        let (sin_inc, cos_inc) = inc.sin_cos();
        let (sin_raan, cos_raan) = raan.sin_cos();
        let (sin_aop, cos_aop) = aop.sin_cos();
        let x = radius * (cos_aop_ta * cos_raan - cos_inc * sin_aop_ta * sin_raan);
        let y = radius * (cos_aop_ta * sin_raan + cos_inc * sin_aop_ta * cos_raan);
        let z = radius * sin_aop_ta * sin_inc;
        let sqrt_gm_p = (frame.mu_km3_s2 / p).sqrt();
        let cos_ta_ecc = ta.cos() + ecc;
        let sin_ta = ta.sin();

        let vx = sqrt_gm_p * cos_ta_ecc * (-sin_aop * cos_raan - cos_inc * sin_raan * cos_aop)
            - sqrt_gm_p * sin_ta * (cos_aop * cos_raan - cos_inc * sin_raan * sin_aop);
        let vy = sqrt_gm_p * cos_ta_ecc * (-sin_aop * sin_raan + cos_inc * cos_raan * cos_aop)
            - sqrt_gm_p * sin_ta * (cos_aop * sin_raan + cos_inc * cos_raan * sin_aop);
        let vz = sqrt_gm_p * (cos_ta_ecc * sin_inc * cos_aop - sin_ta * sin_inc * sin_aop);
        Ok(Self::cartesian(x, y, z, vx, vy, vz, epoch, frame))
    }

    /// Returns the radius vector of this Orbit in [km, km, km]
    pub fn radius(&self) -> Vector3<f64> {
        Vector3::new(self.x_km, self.y_km, self.z_km)
    }

    /// Returns the velocity vector of this Orbit in [km/s, km/s, km/s]
    pub fn velocity(&self) -> Vector3<f64> {
        Vector3::new(self.vx_km_s, self.vy_km_s, self.vz_km_s)
    }

    /// Returns this state as a Cartesian Vector6 in [km, km, km, km/s, km/s, km/s]
    pub fn to_cartesian_vec(self) -> Vector6<f64> {
        Vector6::new(
            self.x_km,
            self.y_km,
            self.z_km,
            self.vx_km_s,
            self.vy_km_s,
            self.vz_km_s,
        )
    }

    pub fn rmag_km(&self) -> f64 {
        self.radius().norm()
    }

    pub fn vmag_km_s(&self) -> f64 {
        self.velocity().norm()
    }

    /// Returns whether this orbit and another are equal within the specified radial and velocity absolute tolerances
    pub fn eq_within(&self, other: &Self, radial_tol: f64, velocity_tol: f64) -> bool {
        self.epoch == other.epoch
            && (self.x_km - other.x_km).abs() < radial_tol
            && (self.y_km - other.y_km).abs() < radial_tol
            && (self.z_km - other.z_km).abs() < radial_tol
            && (self.vx_km_s - other.vx_km_s).abs() < velocity_tol
            && (self.vy_km_s - other.vy_km_s).abs() < velocity_tol
            && (self.vz_km_s - other.vz_km_s).abs() < velocity_tol
            && self.frame == other.frame
    }
}

impl TimeTagged for Orbit {
    fn epoch(&self) -> Epoch {
        self.epoch
    }

    fn set_epoch(&mut self, epoch: Epoch) {
        self.epoch = epoch
    }
}

impl fmt::Display for Orbit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{}] {}\tposition = [{:.6}, {:.6}, {:.6}] km\tvelocity = [{:.6}, {:.6}, {:.6}] km/s",
            self.frame.name,
            self.epoch,
            self.x_km,
            self.y_km,
            self.z_km,
            self.vx_km_s,
            self.vy_km_s,
            self.vz_km_s
        )
    }
}

#[cfg(test)]
mod ut_orbit {
    use super::*;
    use crate::cosmic::EARTH_J2000;

    #[test]
    fn keplerian_radius_and_speed() {
        let epoch = Epoch::from_gregorian_tai_at_midnight(2024, 1, 1);
        let (sma, ecc, ta_deg) = (8000.0, 0.1, 60.0_f64);
        let orbit = Orbit::keplerian(sma, ecc, 30.0, 40.0, 50.0, ta_deg, epoch, EARTH_J2000)
            .unwrap();
        let p = sma * (1.0 - ecc * ecc);
        let rmag = p / (1.0 + ecc * ta_deg.to_radians().cos());
        assert!((orbit.rmag_km() - rmag).abs() < 1e-9);
        // Vis-viva
        let vmag = (EARTH_J2000.mu_km3_s2 * (2.0 / rmag - 1.0 / sma)).sqrt();
        assert!((orbit.vmag_km_s() - vmag).abs() < 1e-12);
        // Orbital momentum along z is h cos i
        let h = orbit.radius().cross(&orbit.velocity());
        assert!((h.z / h.norm() - 30.0_f64.to_radians().cos()).abs() < 1e-12);
    }

    #[test]
    fn hyperbolic_rejected() {
        let epoch = Epoch::from_gregorian_tai_at_midnight(2024, 1, 1);
        let err = Orbit::keplerian(8000.0, 1.5, 30.0, 40.0, 50.0, 60.0, epoch, EARTH_J2000)
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NumericalDomain);
    }
}
