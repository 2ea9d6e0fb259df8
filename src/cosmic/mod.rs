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

use crate::errors::ErrorKind;
use crate::time::{Duration, Epoch};
use snafu::Snafu;

/// A trait allowing for something to have an epoch
pub trait TimeTagged {
    /// Retrieve the Epoch
    fn epoch(&self) -> Epoch;
    /// Set the Epoch
    fn set_epoch(&mut self, epoch: Epoch);

    /// Shift this epoch by a duration (can be negative)
    fn shift_by(&mut self, duration: Duration) {
        self.set_epoch(self.epoch() + duration);
    }
}

pub fn assert_orbit_eq_or_abs(left: &Orbit, right: &Orbit, epsilon: f64, msg: &str) {
    if !left.eq_within(right, epsilon, epsilon) {
        panic!(
            r#"assertion failed: `(left == right)`
  left: `{:?}`,
 right: `{:?}`: {}"#,
            left, right, msg
        )
    }
}

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AstroError {
    #[snafu(display("eccentricity {ecc} is outside of the elliptic domain (must be below {limit})"))]
    NotElliptic { ecc: f64, limit: f64 },
    #[snafu(display(
        "inclination vector norm {norm} is too large: equinoctial elements are singular for retrograde equatorial orbits"
    ))]
    RetrogradeEquatorial { norm: f64 },
    #[snafu(display("orbit is degenerate: {msg}"))]
    DegenerateOrbit { msg: String },
    #[snafu(display("Kepler equation did not converge after {iterations} iterations (mean longitude = {lambda} rad)"))]
    KeplerConvergence { lambda: f64, iterations: usize },
    #[snafu(display("ephemeris of {body} unavailable at {epoch}"))]
    EphemerisUnavailable { body: String, epoch: Epoch },
}

impl AstroError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::NumericalDomain
    }
}

mod frames;
pub use self::frames::*;

mod orbit;
pub use self::orbit::*;

mod equinoctial;
pub use self::equinoctial::*;

mod attitude;
pub use self::attitude::*;

mod ephemeris;
pub use self::ephemeris::*;

mod rotation;
pub use self::rotation::*;

/// Astronomical unit, in kilometers, according to the [IAU](https://www.iau.org/public/themes/measuring/).
pub const AU: f64 = 149_597_870.700;

/// Gravitational parameter of the Sun, in km^3/s^2 (DE440)
pub const SUN_GM: f64 = 132_712_440_041.279_42;
/// Gravitational parameter of the Moon, in km^3/s^2 (DE440)
pub const MOON_GM: f64 = 4_902.800_118;
