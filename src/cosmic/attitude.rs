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

use crate::linalg::{Matrix3, Rotation3, UnitQuaternion, Vector3};
use crate::time::Epoch;
use std::fmt;

/// Provides the orientation of the spacecraft, needed by the surface forces of non spherical shapes.
pub trait AttitudeProvider: fmt::Debug + Send + Sync {
    /// Returns the rotation from the inertial frame to the spacecraft body frame.
    fn attitude(
        &self,
        position_km: &Vector3<f64>,
        velocity_km_s: &Vector3<f64>,
        epoch: Epoch,
    ) -> UnitQuaternion<f64>;
}

/// A spacecraft which keeps the same orientation in the inertial frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InertialAttitude {
    pub rotation: UnitQuaternion<f64>,
}

impl AttitudeProvider for InertialAttitude {
    fn attitude(&self, _: &Vector3<f64>, _: &Vector3<f64>, _: Epoch) -> UnitQuaternion<f64> {
        self.rotation
    }
}

/// Body X axis along the velocity, body Z axis toward the nadir (orthogonalized).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct VelocityPointing;

impl AttitudeProvider for VelocityPointing {
    fn attitude(
        &self,
        position_km: &Vector3<f64>,
        velocity_km_s: &Vector3<f64>,
        _: Epoch,
    ) -> UnitQuaternion<f64> {
        let x = velocity_km_s.normalize();
        let nadir = -position_km.normalize();
        let z = (nadir - nadir.dot(&x) * x).normalize();
        let y = z.cross(&x);
        // Columns are the body axes in the inertial frame, i.e. this is the body to inertial rotation
        let body_to_inertial =
            Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x, y, z]));
        UnitQuaternion::from_rotation_matrix(&body_to_inertial).inverse()
    }
}

impl fmt::Display for VelocityPointing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "velocity pointing")
    }
}
