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

use super::{AstroError, Frame, Orbit, AU, MOON_GM, SUN_GM};
use crate::linalg::{Rotation3, Vector3};
use crate::time::{Epoch, Unit};
use std::f64::consts::TAU;
use std::fmt;

/// Obliquity of the ecliptic at J2000, in degrees
pub const OBLIQUITY_J2000_DEG: f64 = 23.439_291_1;

/// Provides the position of a perturbing body relative to the central body, in the propagation frame.
pub trait Ephemeris: fmt::Debug + Send + Sync {
    /// Name of the body, used to name its parameters and series
    fn name(&self) -> &str;
    /// Gravitational parameter of the body, in km^3/s^2
    fn gm(&self) -> f64;
    /// Position of the body in km, relative to the central body
    fn position_km(&self, epoch: Epoch) -> Result<Vector3<f64>, AstroError>;
}

/// A body which does not move with respect to the central body.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedBody {
    pub name: String,
    pub gm: f64,
    pub position_km: Vector3<f64>,
}

impl Ephemeris for FixedBody {
    fn name(&self) -> &str {
        &self.name
    }

    fn gm(&self) -> f64 {
        self.gm
    }

    fn position_km(&self, _: Epoch) -> Result<Vector3<f64>, AstroError> {
        Ok(self.position_km)
    }
}

/// An analytical ephemeris: the body follows a fixed Keplerian ellipse about the central body.
///
/// The elements are defined in a reference plane (e.g. the ecliptic), which is rotated into the
/// propagation frame by a rotation about the X axis.
#[derive(Clone, Debug, PartialEq)]
pub struct KeplerianEphemeris {
    pub name: String,
    pub gm: f64,
    pub reference_epoch: Epoch,
    pub sma_km: f64,
    pub ecc: f64,
    pub inc_deg: f64,
    pub raan_deg: f64,
    pub aop_deg: f64,
    /// Mean anomaly at the reference epoch
    pub ma_deg: f64,
    /// Mean motion in rad/s
    pub mean_motion_rad_s: f64,
    /// Tilt of the reference plane about the X axis of the propagation frame, in degrees
    pub plane_tilt_deg: f64,
}

impl KeplerianEphemeris {
    /// Low precision geocentric Sun: mean elements of the Earth at J2000, in the ecliptic.
    pub fn sun(central: &Frame) -> Self {
        let sma_km = 1.000_001_018 * AU;
        Self {
            name: "Sun".to_string(),
            gm: SUN_GM,
            reference_epoch: Epoch::from_gregorian_tai_hms(2000, 1, 1, 12, 0, 0),
            sma_km,
            ecc: 0.016_708_6,
            inc_deg: 0.0,
            raan_deg: 0.0,
            aop_deg: 282.937_3,
            ma_deg: 357.529_1,
            mean_motion_rad_s: ((SUN_GM + central.mu_km3_s2) / sma_km.powi(3)).sqrt(),
            plane_tilt_deg: OBLIQUITY_J2000_DEG,
        }
    }

    /// Low precision geocentric Moon: mean elements at J2000 in the ecliptic, without any of the
    /// secular drifts (nodal regression and apsidal precession).
    pub fn moon(central: &Frame) -> Self {
        let sma_km = 384_400.0;
        Self {
            name: "Moon".to_string(),
            gm: MOON_GM,
            reference_epoch: Epoch::from_gregorian_tai_hms(2000, 1, 1, 12, 0, 0),
            sma_km,
            ecc: 0.054_9,
            inc_deg: 5.145,
            raan_deg: 125.08,
            aop_deg: 318.15,
            ma_deg: 134.963,
            mean_motion_rad_s: ((MOON_GM + central.mu_km3_s2) / sma_km.powi(3)).sqrt(),
            plane_tilt_deg: OBLIQUITY_J2000_DEG,
        }
    }
}

impl Ephemeris for KeplerianEphemeris {
    fn name(&self) -> &str {
        &self.name
    }

    fn gm(&self) -> f64 {
        self.gm
    }

    fn position_km(&self, epoch: Epoch) -> Result<Vector3<f64>, AstroError> {
        let dt_s = (epoch - self.reference_epoch).to_unit(Unit::Second);
        let ma = (self.ma_deg.to_radians() + self.mean_motion_rad_s * dt_s).rem_euclid(TAU);
        // Solve Kepler's equation in its classical form
        let mut ea = if self.ecc > 0.8 { std::f64::consts::PI } else { ma };
        for _ in 0..50 {
            let delta = (ea - self.ecc * ea.sin() - ma) / (1.0 - self.ecc * ea.cos());
            ea -= delta;
            if delta.abs() < 1e-14 {
                break;
            }
        }
        let ta_deg = (2.0
            * (((1.0 + self.ecc) / (1.0 - self.ecc)).sqrt() * (ea / 2.0).tan()).atan())
        .to_degrees();
        let frame = Frame {
            name: "ephemeris",
            mu_km3_s2: self.gm,
            equatorial_radius_km: 0.0,
            flattening: 0.0,
            rotation_rate_rad_s: 0.0,
        };
        let orbit = Orbit::keplerian(
            self.sma_km,
            self.ecc,
            self.inc_deg,
            self.raan_deg,
            self.aop_deg,
            ta_deg,
            epoch,
            frame,
        )?;
        let tilt = Rotation3::from_axis_angle(&Vector3::x_axis(), self.plane_tilt_deg.to_radians());
        Ok(tilt * orbit.radius())
    }
}

#[cfg(test)]
mod ut_ephemeris {
    use super::*;
    use crate::cosmic::EARTH_J2000;

    #[test]
    fn sun_distance_and_declination() {
        let sun = KeplerianEphemeris::sun(&EARTH_J2000);
        // Around the June solstice, the Sun is at its highest declination
        let epoch = Epoch::from_gregorian_tai_at_midnight(2024, 6, 21);
        let r = sun.position_km(epoch).unwrap();
        let dist_au = r.norm() / AU;
        assert!((dist_au - 1.016).abs() < 0.002, "{dist_au}");
        let decl_deg = (r.z / r.norm()).asin().to_degrees();
        assert!((decl_deg - OBLIQUITY_J2000_DEG).abs() < 0.5, "{decl_deg}");
    }

    #[test]
    fn moon_distance() {
        let moon = KeplerianEphemeris::moon(&EARTH_J2000);
        let r = moon
            .position_km(Epoch::from_gregorian_tai_at_midnight(2024, 3, 1))
            .unwrap();
        assert!(r.norm() > 384_400.0 * (1.0 - 0.055) && r.norm() < 384_400.0 * 1.055);
    }
}
