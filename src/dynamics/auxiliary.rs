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

use crate::cosmic::{
    eccentric_longitude, eccentric_longitude_from_true, equinoctial_frame,
    mean_longitude_from_eccentric, AstroError,
};
use crate::dual::{vec3, Real};
use crate::time::Epoch;

/// Quantities derived from a set of mean equinoctial elements, shared by all the contributions.
///
/// Uses the notations of Danielson et al.: k = ex, h = ey, q = hx, p = hy.
#[derive(Clone, Debug)]
pub struct AuxiliaryElements<T: Real> {
    pub epoch: Epoch,
    /// Gravitational parameter of the central body in km^3/s^2
    pub mu: T,
    pub sma: T,
    pub k: T,
    pub h: T,
    pub q: T,
    pub p: T,
    /// Mean longitude
    pub lm: T,
    pub ecc: T,
    /// Keplerian mean motion
    pub n: T,
    /// A = sqrt(μ a)
    pub a_fact: T,
    /// B = sqrt(1 - h² - k²)
    pub b_fact: T,
    /// C = 1 + p² + q²
    pub c_fact: T,
    /// Equinoctial frame: f and g in the orbital plane, w along the orbital momentum
    pub f: [T; 3],
    pub g: [T; 3],
    pub w: [T; 3],
}

impl<T: Real> AuxiliaryElements<T> {
    /// Builds the auxiliary elements from `[a, ex, ey, hx, hy, λ]`.
    pub fn new(elements: &[T; 6], mu: T, epoch: Epoch) -> Self {
        let [sma, k, h, q, p, lm] = *elements;
        let (f, g, w) = equinoctial_frame(q, p);
        let ecc = (k * k + h * h).sqrt();
        Self {
            epoch,
            mu,
            sma,
            k,
            h,
            q,
            p,
            lm,
            ecc,
            n: (mu / (sma * sma * sma)).sqrt(),
            a_fact: (mu * sma).sqrt(),
            b_fact: (T::one() - k * k - h * h).sqrt(),
            c_fact: T::one() + p * p + q * q,
            f,
            g,
            w,
        }
    }

    /// Longitude of periapsis ϖ = ω + Ω
    pub fn longitude_of_periapsis(&self) -> T {
        self.h.atan2(self.k)
    }

    /// Semi-latus rectum
    pub fn slr(&self) -> T {
        self.sma * self.b_fact * self.b_fact
    }

    /// Osculating point of the mean orbit at the provided true longitude.
    pub fn point_at_true_longitude(&self, true_lon: T) -> OrbitPoint<T> {
        let (sl, cl) = (true_lon.sin(), true_lon.cos());
        let b2 = self.b_fact * self.b_fact;
        let rmag = self.sma * b2 / (T::one() + self.k * cl + self.h * sl);
        let x = rmag * cl;
        let y = rmag * sl;
        let v_fact = (self.mu / (self.sma * b2)).sqrt();
        let xd = -v_fact * (self.h + sl);
        let yd = v_fact * (self.k + cl);
        let lm = mean_longitude_from_eccentric(
            eccentric_longitude_from_true(true_lon, self.k, self.h),
            self.k,
            self.h,
        );
        // dλ/dL = r² / (a² B)
        let dlm_dl = rmag * rmag / (self.sma * self.sma * self.b_fact);
        OrbitPoint {
            true_lon,
            lm,
            rmag,
            x,
            y,
            xd,
            yd,
            position: vec3::lin2(x, &self.f, y, &self.g),
            velocity: vec3::lin2(xd, &self.f, yd, &self.g),
            dlm_dl,
        }
    }

    /// Osculating point of the mean orbit at its own mean longitude.
    pub fn current_point(&self) -> Result<OrbitPoint<T>, AstroError> {
        let le = eccentric_longitude(self.lm, self.k, self.h)?;
        let lv = crate::cosmic::true_longitude_from_eccentric(le, self.k, self.h);
        // Keep the mean longitude as provided, since the true longitude round trip may change its revolution
        let mut point = self.point_at_true_longitude(lv);
        point.lm = self.lm;
        Ok(point)
    }
}

/// Position and velocity on the mean orbit at a given fast angle, with the in-plane coordinates.
#[derive(Clone, Debug)]
pub struct OrbitPoint<T: Real> {
    pub true_lon: T,
    /// Mean longitude
    pub lm: T,
    pub rmag: T,
    /// In plane coordinates along f and g
    pub x: T,
    pub y: T,
    pub xd: T,
    pub yd: T,
    pub position: [T; 3],
    pub velocity: [T; 3],
    pub dlm_dl: T,
}
