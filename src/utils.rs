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

use std::f64::consts::{PI, TAU};

/// Returns the provided angle bounded between 0.0 and 360.0
pub fn between_0_360(angle: f64) -> f64 {
    let mut bounded = angle % 360.0;
    if bounded < 0.0 {
        bounded += 360.0;
    }
    bounded
}

/// Returns the provided angle in radians bounded between -π and +π
pub fn between_pm_pi(angle: f64) -> f64 {
    let bounded = angle - TAU * (angle / TAU).round();
    if bounded <= -PI {
        bounded + TAU
    } else {
        bounded
    }
}

#[cfg(test)]
mod ut_utils {
    use super::*;

    #[test]
    fn angle_bounds() {
        assert_eq!(between_0_360(-90.0), 270.0);
        assert_eq!(between_0_360(725.0), 5.0);
        assert!((between_pm_pi(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-15);
        assert!((between_pm_pi(-5.0 * TAU + 0.25) - 0.25).abs() < 1e-12);
        assert!((between_pm_pi(PI) - PI).abs() < 1e-15);
    }
}
