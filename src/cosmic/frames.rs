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

use std::fmt;

/// An inertial frame centered on an attracting body.
///
/// Only the physical constants of the central body are stored: the propagation is always
/// performed in this frame, and all providers (ephemerides, attitudes, rotations) are expressed in it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Frame {
    pub name: &'static str,
    /// Gravitational parameter, in km^3/s^2
    pub mu_km3_s2: f64,
    /// Equatorial radius, in km
    pub equatorial_radius_km: f64,
    pub flattening: f64,
    /// Rotation rate of the body about the Z axis of this frame, in rad/s
    pub rotation_rate_rad_s: f64,
}

/// Earth mean equator and equinox of J2000, with the JGM-3 constants.
pub const EARTH_J2000: Frame = Frame {
    name: "Earth J2000",
    mu_km3_s2: 398_600.441_5,
    equatorial_radius_km: 6_378.136_3,
    flattening: 1.0 / 298.257_223_563,
    rotation_rate_rad_s: 7.292_115_146_706_4e-5,
};

impl Frame {
    pub fn gm(&self) -> f64 {
        self.mu_km3_s2
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (μ = {} km^3/s^2)", self.name, self.mu_km3_s2)
    }
}
