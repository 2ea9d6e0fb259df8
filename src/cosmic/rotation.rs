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

use crate::time::{Epoch, Unit};
use std::fmt;

/// Provides the rotation angle of the central body about the Z axis of the propagation frame.
///
/// The tesseral harmonics are expressed in the body fixed frame, which is assumed to only rotate
/// about the pole of the inertial frame (no precession, nutation nor polar motion).
pub trait BodyRotation: fmt::Debug + Send + Sync {
    /// Rotation angle θ in radians from the inertial X axis to the body fixed X axis.
    fn angle_rad(&self, epoch: Epoch) -> f64;
    /// Rotation rate dθ/dt in rad/s.
    fn rate_rad_s(&self, epoch: Epoch) -> f64;
}

/// A body rotating at a constant rate.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UniformRotation {
    pub reference_epoch: Epoch,
    /// Rotation angle at the reference epoch
    pub angle_at_reference_rad: f64,
    pub rate_rad_s: f64,
}

impl UniformRotation {
    /// Earth rotation with the Greenwich mean sidereal angle at J2000 (280.46061837 deg).
    pub fn earth() -> Self {
        Self {
            reference_epoch: Epoch::from_gregorian_tai_hms(2000, 1, 1, 12, 0, 0),
            angle_at_reference_rad: 280.460_618_37_f64.to_radians(),
            rate_rad_s: super::EARTH_J2000.rotation_rate_rad_s,
        }
    }
}

impl BodyRotation for UniformRotation {
    fn angle_rad(&self, epoch: Epoch) -> f64 {
        let dt_s = (epoch - self.reference_epoch).to_unit(Unit::Second);
        self.angle_at_reference_rad + self.rate_rad_s * dt_s
    }

    fn rate_rad_s(&self, _: Epoch) -> f64 {
        self.rate_rad_s
    }
}
