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

use super::{AstroError, Frame, Orbit, TimeTagged};
use crate::dual::{vec3, Real};
use crate::errors::StateError;
use crate::linalg::{DMatrix, Matrix6, UnitQuaternion, Vector6};
use crate::time::Epoch;
use crate::utils::{between_0_360, between_pm_pi};
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::{PI, TAU};
use std::fmt;

/// Eccentricities within this distance of one are rejected.
pub const ECC_TOLERANCE: f64 = 1e-8;
/// Norm of the inclination vector, tan(i/2), beyond which the orbit is considered retrograde equatorial (i > 179.88 deg).
pub const MAX_INCLINATION_VECTOR: f64 = 1e3;

const KEPLER_MAX_ITER: usize = 50;
const KEPLER_TOLERANCE: f64 = 1e-15;

/// Whether a set of elements contains the short-period oscillations or not.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Mean,
    Osculating,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Mean => write!(f, "mean"),
            Self::Osculating => write!(f, "osculating"),
        }
    }
}

/// Type of the fast angle of the equinoctial elements.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionAngle {
    /// Mean longitude, the angle which is integrated
    Mean,
    /// Eccentric longitude
    Eccentric,
    /// True longitude
    True,
}

/// An orbital state in direct equinoctial elements.
///
/// The elements are `[a (km), ex, ey, hx, hy, λ (rad)]` where
/// ex = e cos(ω+Ω), ey = e sin(ω+Ω), hx = tan(i/2) cos Ω, hy = tan(i/2) sin Ω and λ is the mean longitude.
/// These are non singular for circular and equatorial orbits, but not for retrograde equatorial ones.
///
/// The mean longitude is *not* wrapped when the state is propagated, so that its evolution is continuous.
#[derive(Clone, Debug, PartialEq)]
pub struct EquinoctialState {
    pub epoch: Epoch,
    pub frame: Frame,
    elements: Vector6<f64>,
    /// Whether these elements are mean or osculating
    pub kind: ElementKind,
    /// Spacecraft mass, needed by the surface forces
    pub mass_kg: Option<f64>,
    /// Attitude reference of the spacecraft (rotation from the inertial frame to the body frame)
    pub attitude: Option<UnitQuaternion<f64>>,
    stm: Option<Matrix6<f64>>,
    param_jacobian: Option<DMatrix<f64>>,
    short_period_coefficients: BTreeMap<String, Vector6<f64>>,
}

impl EquinoctialState {
    /// Creates a new state from the equinoctial elements `[a (km), ex, ey, hx, hy, λ (rad)]`.
    pub fn new(
        epoch: Epoch,
        elements: Vector6<f64>,
        frame: Frame,
        kind: ElementKind,
    ) -> Result<Self, AstroError> {
        check_elements(&elements)?;
        Ok(Self {
            epoch,
            frame,
            elements,
            kind,
            mass_kg: None,
            attitude: None,
            stm: None,
            param_jacobian: None,
            short_period_coefficients: BTreeMap::new(),
        })
    }

    /// Creates a new state from the Keplerian elements.
    ///
    /// **Units:** km, none, degrees, degrees, degrees, degrees (mean anomaly)
    #[allow(clippy::too_many_arguments)]
    pub fn keplerian(
        sma_km: f64,
        ecc: f64,
        inc_deg: f64,
        raan_deg: f64,
        aop_deg: f64,
        ma_deg: f64,
        epoch: Epoch,
        frame: Frame,
        kind: ElementKind,
    ) -> Result<Self, AstroError> {
        let raan = raan_deg.to_radians();
        let lon_peri = raan + aop_deg.to_radians();
        let tan_half_inc = (inc_deg.to_radians() / 2.0).tan();
        let elements = Vector6::new(
            sma_km,
            ecc * lon_peri.cos(),
            ecc * lon_peri.sin(),
            tan_half_inc * raan.cos(),
            tan_half_inc * raan.sin(),
            lon_peri + ma_deg.to_radians(),
        );
        Self::new(epoch, elements, frame, kind)
    }

    /// Converts a Cartesian orbit into equinoctial elements of the requested kind.
    ///
    /// Note that this does *not* remove the short-period terms: the kind only tags the result.
    pub fn from_orbit(orbit: &Orbit, kind: ElementKind) -> Result<Self, AstroError> {
        let r = [orbit.x_km, orbit.y_km, orbit.z_km];
        let v = [orbit.vx_km_s, orbit.vy_km_s, orbit.vz_km_s];
        let el = cartesian_to_equinoctial(&r, &v, orbit.frame.mu_km3_s2)?;
        Self::new(orbit.epoch, Vector6::from_row_slice(&el), orbit.frame, kind)
    }

    /// Returns the Cartesian orbit of these elements.
    pub fn to_orbit(&self) -> Result<Orbit, AstroError> {
        let (r, v) = equinoctial_to_cartesian(&to_array(&self.elements), self.frame.mu_km3_s2)?;
        Ok(Orbit::cartesian(
            r[0], r[1], r[2], v[0], v[1], v[2], self.epoch, self.frame,
        ))
    }

    /// Returns the elements `[a (km), ex, ey, hx, hy, λ (rad)]`
    pub fn elements(&self) -> &Vector6<f64> {
        &self.elements
    }

    /// Returns a copy of this state with other elements (of the same kind), keeping everything else.
    pub fn with_elements(&self, elements: Vector6<f64>) -> Result<Self, AstroError> {
        check_elements(&elements)?;
        let mut me = self.clone();
        me.elements = elements;
        Ok(me)
    }

    pub fn with_mass(mut self, mass_kg: f64) -> Self {
        self.mass_kg = Some(mass_kg);
        self
    }

    pub fn with_attitude(mut self, attitude: UnitQuaternion<f64>) -> Self {
        self.attitude = Some(attitude);
        self
    }

    pub fn sma_km(&self) -> f64 {
        self.elements[0]
    }

    pub fn ex(&self) -> f64 {
        self.elements[1]
    }

    pub fn ey(&self) -> f64 {
        self.elements[2]
    }

    pub fn hx(&self) -> f64 {
        self.elements[3]
    }

    pub fn hy(&self) -> f64 {
        self.elements[4]
    }

    /// Mean longitude in radians, as integrated (not wrapped)
    pub fn mean_longitude_rad(&self) -> f64 {
        self.elements[5]
    }

    pub fn ecc(&self) -> f64 {
        self.ex().hypot(self.ey())
    }

    pub fn inc_deg(&self) -> f64 {
        (2.0 * self.hx().hypot(self.hy()).atan()).to_degrees()
    }

    pub fn raan_deg(&self) -> f64 {
        between_0_360(self.hy().atan2(self.hx()).to_degrees())
    }

    /// Keplerian mean motion in rad/s
    pub fn mean_motion_rad_s(&self) -> f64 {
        (self.frame.mu_km3_s2 / self.sma_km().powi(3)).sqrt()
    }

    pub fn period_s(&self) -> f64 {
        TAU / self.mean_motion_rad_s()
    }

    /// Returns the fast angle of the requested type, in radians.
    pub fn fast_angle(&self, angle: PositionAngle) -> Result<f64, AstroError> {
        let (lm, ex, ey) = (self.elements[5], self.ex(), self.ey());
        match angle {
            PositionAngle::Mean => Ok(lm),
            PositionAngle::Eccentric => eccentric_longitude(lm, ex, ey),
            PositionAngle::True => Ok(true_longitude_from_eccentric(
                eccentric_longitude(lm, ex, ey)?,
                ex,
                ey,
            )),
        }
    }

    /// Returns a copy of this state where the fast angle is set from an angle of the provided type.
    pub fn with_fast_angle(&self, value_rad: f64, angle: PositionAngle) -> Result<Self, AstroError> {
        let (ex, ey) = (self.ex(), self.ey());
        let lm = match angle {
            PositionAngle::Mean => value_rad,
            PositionAngle::Eccentric => mean_longitude_from_eccentric(value_rad, ex, ey),
            PositionAngle::True => mean_longitude_from_eccentric(
                eccentric_longitude_from_true(value_rad, ex, ey),
                ex,
                ey,
            ),
        };
        let mut elements = self.elements;
        elements[5] = lm;
        self.with_elements(elements)
    }

    /// Attaches an identity state transition matrix to this state.
    pub fn with_stm(mut self) -> Self {
        self.stm = Some(Matrix6::identity());
        self
    }

    /// Attaches initial Jacobian blocks: a 6x6 `dY/dY0` and a 6xk `dY/dP`.
    pub fn with_jacobians(
        mut self,
        dy_dy0: &DMatrix<f64>,
        dy_dp: &DMatrix<f64>,
    ) -> Result<Self, StateError> {
        if dy_dy0.shape() != (6, 6) {
            return Err(StateError::JacobianDimension {
                block: "state",
                expected_rows: 6,
                expected_cols: 6,
                rows: dy_dy0.nrows(),
                cols: dy_dy0.ncols(),
            });
        }
        if dy_dp.nrows() != 6 {
            return Err(StateError::JacobianDimension {
                block: "parameter",
                expected_rows: 6,
                expected_cols: dy_dp.ncols(),
                rows: dy_dp.nrows(),
                cols: dy_dp.ncols(),
            });
        }
        self.stm = Some(Matrix6::from_fn(|i, j| dy_dy0[(i, j)]));
        self.param_jacobian = Some(dy_dp.clone());
        Ok(self)
    }

    /// Removes the Jacobians from this state.
    pub fn without_jacobians(mut self) -> Self {
        self.stm = None;
        self.param_jacobian = None;
        self
    }

    /// Returns the state transition matrix `dY/dY0`
    pub fn stm(&self) -> Result<Matrix6<f64>, StateError> {
        self.stm
            .ok_or(StateError::JacobianUnset { block: "state" })
    }

    /// Returns the parameter Jacobian `dY/dP`
    pub fn param_jacobian(&self) -> Result<&DMatrix<f64>, StateError> {
        self.param_jacobian
            .as_ref()
            .ok_or(StateError::JacobianUnset { block: "parameter" })
    }

    pub fn has_jacobians(&self) -> bool {
        self.stm.is_some()
    }

    pub(crate) fn set_jacobians(&mut self, stm: Matrix6<f64>, params: Option<DMatrix<f64>>) {
        self.stm = Some(stm);
        self.param_jacobian = params;
    }

    /// Short-period coefficients retained during the last synthesis, keyed by name.
    pub fn short_period_coefficients(&self) -> &BTreeMap<String, Vector6<f64>> {
        &self.short_period_coefficients
    }

    pub(crate) fn set_short_period_coefficients(
        &mut self,
        coefficients: BTreeMap<String, Vector6<f64>>,
    ) {
        self.short_period_coefficients = coefficients;
    }

    /// Returns whether both states have the same epoch and elements within the provided tolerances
    /// (absolute on the semi-major axis in km, absolute on the other elements).
    pub fn eq_within(&self, other: &Self, sma_tol_km: f64, tol: f64) -> bool {
        self.epoch == other.epoch
            && (self.sma_km() - other.sma_km()).abs() < sma_tol_km
            && (1..5).all(|i| (self.elements[i] - other.elements[i]).abs() < tol)
            && between_pm_pi(self.elements[5] - other.elements[5]).abs() < tol
    }
}

impl TimeTagged for EquinoctialState {
    fn epoch(&self) -> Epoch {
        self.epoch
    }

    fn set_epoch(&mut self, epoch: Epoch) {
        self.epoch = epoch
    }
}

impl fmt::Display for EquinoctialState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}\tsma = {:.6} km\tex = {:.9}\tey = {:.9}\thx = {:.9}\thy = {:.9}\tλ = {:.6} deg",
            self.frame.name,
            self.epoch,
            self.kind,
            self.sma_km(),
            self.ex(),
            self.ey(),
            self.hx(),
            self.hy(),
            (self.mean_longitude_rad().rem_euclid(TAU)).to_degrees()
        )
    }
}

/// Ensures that the elements are in the domain of the direct equinoctial elements.
pub(crate) fn check_elements(elements: &Vector6<f64>) -> Result<(), AstroError> {
    if elements.iter().any(|x| !x.is_finite()) || elements[0] <= 0.0 {
        return Err(AstroError::DegenerateOrbit {
            msg: format!("invalid equinoctial elements {}", elements.transpose()),
        });
    }
    let ecc = elements[1].hypot(elements[2]);
    if ecc >= 1.0 - ECC_TOLERANCE {
        return Err(AstroError::NotElliptic {
            ecc,
            limit: 1.0 - ECC_TOLERANCE,
        });
    }
    let norm = elements[3].hypot(elements[4]);
    if norm >= MAX_INCLINATION_VECTOR {
        return Err(AstroError::RetrogradeEquatorial { norm });
    }
    Ok(())
}

/// Solves the equinoctial Kepler equation λ = F - ex sin F + ey cos F for the eccentric longitude F.
///
/// The iteration is done on the real part, then one Newton step is taken with the full numbers
/// to carry the partials of the solution.
pub fn eccentric_longitude<T: Real>(lm: T, ex: T, ey: T) -> Result<T, AstroError> {
    let (lm_re, ex_re, ey_re) = (lm.re(), ex.re(), ey.re());
    // Start from the mean longitude of the same revolution
    let base = lm_re - between_pm_pi(lm_re);
    let lm0 = lm_re - base;
    let (s, c) = lm0.sin_cos();
    let mut f_lon = lm0 + ex_re * s - ey_re * c;
    let mut converged = false;
    for _ in 0..KEPLER_MAX_ITER {
        let (s, c) = f_lon.sin_cos();
        let residual = f_lon - ex_re * s + ey_re * c - lm0;
        let slope = 1.0 - ex_re * c - ey_re * s;
        let delta = (residual / slope).clamp(-1.0, 1.0);
        f_lon -= delta;
        if delta.abs() <= KEPLER_TOLERANCE * (1.0 + f_lon.abs()) {
            converged = true;
            break;
        }
    }
    if !converged || !f_lon.is_finite() {
        return Err(AstroError::KeplerConvergence {
            lambda: lm_re,
            iterations: KEPLER_MAX_ITER,
        });
    }
    let f_t = T::cst(f_lon + base);
    let (s, c) = (f_t.sin(), f_t.cos());
    let residual = f_t - ex * s + ey * c - lm;
    let slope = T::one() - ex * c - ey * s;
    Ok(f_t - residual / slope)
}

/// Mean longitude from the eccentric longitude
pub fn mean_longitude_from_eccentric<T: Real>(le: T, ex: T, ey: T) -> T {
    le - ex * le.sin() + ey * le.cos()
}

/// True longitude from the eccentric longitude
pub fn true_longitude_from_eccentric<T: Real>(le: T, ex: T, ey: T) -> T {
    let epsilon = (T::one() - ex * ex - ey * ey).sqrt();
    let (s, c) = (le.sin(), le.cos());
    let num = ex * s - ey * c;
    let den = epsilon + T::one() - ex * c - ey * s;
    le + T::cst(2.0) * (num / den).atan()
}

/// Eccentric longitude from the true longitude
pub fn eccentric_longitude_from_true<T: Real>(lv: T, ex: T, ey: T) -> T {
    let epsilon = (T::one() - ex * ex - ey * ey).sqrt();
    let (s, c) = (lv.sin(), lv.cos());
    let num = ey * c - ex * s;
    let den = epsilon + T::one() + ex * c + ey * s;
    lv + T::cst(2.0) * (num / den).atan()
}

/// Unit vectors (f, g, w) of the equinoctial frame, w being along the orbital momentum.
pub fn equinoctial_frame<T: Real>(hx: T, hy: T) -> ([T; 3], [T; 3], [T; 3]) {
    let two = T::cst(2.0);
    let (hx2, hy2) = (hx * hx, hy * hy);
    let fact = T::one() / (T::one() + hx2 + hy2);
    let f = [
        (T::one() + hx2 - hy2) * fact,
        two * hx * hy * fact,
        -two * hy * fact,
    ];
    let g = [
        two * hx * hy * fact,
        (T::one() - hx2 + hy2) * fact,
        two * hx * fact,
    ];
    let w = [
        two * hy * fact,
        -two * hx * fact,
        (T::one() - hx2 - hy2) * fact,
    ];
    (f, g, w)
}

/// Position (km) and velocity (km/s) from the equinoctial elements `[a, ex, ey, hx, hy, λ]`.
pub fn equinoctial_to_cartesian<T: Real>(
    el: &[T; 6],
    mu: T,
) -> Result<([T; 3], [T; 3]), AstroError> {
    let [a, ex, ey, hx, hy, lm] = *el;
    let le = eccentric_longitude(lm, ex, ey)?;
    let (f, g, _) = equinoctial_frame(hx, hy);
    let (x, y, xdot, ydot) = in_plane(a, ex, ey, le, mu);
    Ok((vec3::lin2(x, &f, y, &g), vec3::lin2(xdot, &f, ydot, &g)))
}

/// Coordinates and velocity in the (f, g) plane, from the eccentric longitude.
pub(crate) fn in_plane<T: Real>(a: T, ex: T, ey: T, le: T, mu: T) -> (T, T, T, T) {
    let exey = ex * ey;
    let (ex2, ey2) = (ex * ex, ey * ey);
    let beta = T::one() / (T::one() + (T::one() - ex2 - ey2).sqrt());
    let (s, c) = (le.sin(), le.cos());
    let ex_c_ey_s = ex * c + ey * s;
    let x = a * ((T::one() - beta * ey2) * c + beta * exey * s - ex);
    let y = a * ((T::one() - beta * ex2) * s + beta * exey * c - ey);
    let factor = (mu / a).sqrt() / (T::one() - ex_c_ey_s);
    let xdot = factor * (-s + beta * ey * ex_c_ey_s);
    let ydot = factor * (c - beta * ex * ex_c_ey_s);
    (x, y, xdot, ydot)
}

/// Equinoctial elements `[a, ex, ey, hx, hy, λ]` from the position (km) and velocity (km/s).
pub fn cartesian_to_equinoctial<T: Real>(
    r: &[T; 3],
    v: &[T; 3],
    mu: T,
) -> Result<[T; 6], AstroError> {
    let rmag = vec3::norm(r);
    let v2 = vec3::dot(v, v);
    let r_v2_on_mu = rmag * v2 / mu;
    if rmag.re() <= 0.0 || r_v2_on_mu.re() >= 2.0 {
        return Err(AstroError::NotElliptic {
            ecc: f64::NAN,
            limit: 1.0 - ECC_TOLERANCE,
        });
    }
    let a = rmag / (T::cst(2.0) - r_v2_on_mu);
    let h = vec3::cross(r, v);
    let hmag = vec3::norm(&h);
    if hmag.re() <= 0.0 {
        return Err(AstroError::DegenerateOrbit {
            msg: "position and velocity are colinear".to_string(),
        });
    }
    let w = vec3::scale(T::one() / hmag, &h);
    if 1.0 + w[2].re() < 1.0 / (1.0 + MAX_INCLINATION_VECTOR.powi(2)) {
        return Err(AstroError::RetrogradeEquatorial {
            norm: ((1.0 - w[2].re()) / (1.0 + w[2].re())).sqrt(),
        });
    }
    let d = T::one() / (T::one() + w[2]);
    let hx = -d * w[1];
    let hy = d * w[0];

    let c_lv = (r[0] - d * r[2] * w[0]) / rmag;
    let s_lv = (r[1] - d * r[2] * w[1]) / rmag;
    let lv = s_lv.atan2(c_lv);

    let e_se = vec3::dot(r, v) / (mu * a).sqrt();
    let e_ce = r_v2_on_mu - T::one();
    let e2 = e_ce * e_ce + e_se * e_se;
    if e2.re() >= (1.0 - ECC_TOLERANCE).powi(2) {
        return Err(AstroError::NotElliptic {
            ecc: e2.re().sqrt(),
            limit: 1.0 - ECC_TOLERANCE,
        });
    }
    let f = e_ce - e2;
    let g = (T::one() - e2).sqrt() * e_se;
    let ex = a * (f * c_lv + g * s_lv) / rmag;
    let ey = a * (f * s_lv - g * c_lv) / rmag;

    let le = eccentric_longitude_from_true(lv, ex, ey);
    let lm = mean_longitude_from_eccentric(le, ex, ey);
    Ok([a, ex, ey, hx, hy, lm])
}

pub(crate) fn to_array(v: &Vector6<f64>) -> [f64; 6] {
    [v[0], v[1], v[2], v[3], v[4], v[5]]
}

/// Unwraps `angle` to be within π of `reference`.
pub(crate) fn unwrap_near(angle: f64, reference: f64) -> f64 {
    angle - TAU * ((angle - reference + PI) / TAU).floor()
}

#[cfg(test)]
mod ut_equinoctial {
    use super::*;
    use crate::cosmic::EARTH_J2000;
    use crate::dual::{partial, seeded, Dual, ELEMENT_SLOT};
    use approx::assert_abs_diff_eq;

    fn epoch() -> Epoch {
        Epoch::from_gregorian_tai_at_midnight(2024, 1, 1)
    }

    #[test]
    fn cartesian_round_trip() {
        let orbit =
            Orbit::keplerian(7200.0, 0.05, 51.6, 123.0, 45.0, 210.0, epoch(), EARTH_J2000).unwrap();
        let eq = EquinoctialState::from_orbit(&orbit, ElementKind::Osculating).unwrap();
        assert_abs_diff_eq!(eq.sma_km(), 7200.0, epsilon = 1e-8);
        assert_abs_diff_eq!(eq.ecc(), 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(eq.inc_deg(), 51.6, epsilon = 1e-10);
        assert_abs_diff_eq!(eq.raan_deg(), 123.0, epsilon = 1e-10);
        let back = eq.to_orbit().unwrap();
        assert!(back.eq_within(&orbit, 1e-8, 1e-11), "{back} != {orbit}");
    }

    #[test]
    fn keplerian_constructor_matches_cartesian() {
        // Mean anomaly of 0 is also a true anomaly of 0
        let eq = EquinoctialState::keplerian(
            7000.0,
            0.01,
            20.0,
            30.0,
            40.0,
            0.0,
            epoch(),
            EARTH_J2000,
            ElementKind::Mean,
        )
        .unwrap();
        let orbit =
            Orbit::keplerian(7000.0, 0.01, 20.0, 30.0, 40.0, 0.0, epoch(), EARTH_J2000).unwrap();
        assert!(eq.to_orbit().unwrap().eq_within(&orbit, 1e-8, 1e-11));
    }

    #[test]
    fn fast_angles() {
        let eq = EquinoctialState::keplerian(
            9000.0,
            0.3,
            10.0,
            20.0,
            30.0,
            75.0,
            epoch(),
            EARTH_J2000,
            ElementKind::Mean,
        )
        .unwrap();
        let lv = eq.fast_angle(PositionAngle::True).unwrap();
        let le = eq.fast_angle(PositionAngle::Eccentric).unwrap();
        // True anomaly is ahead of the mean anomaly in the first half of the orbit
        assert!(lv > le && le > eq.mean_longitude_rad());
        let back = eq.with_fast_angle(lv, PositionAngle::True).unwrap();
        assert_abs_diff_eq!(
            back.mean_longitude_rad(),
            eq.mean_longitude_rad(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn kepler_partials() {
        // dF/dλ = 1 / (1 - ex cos F - ey sin F)
        let (ex, ey) = (0.1, -0.2);
        let lm: Dual = seeded(1.3, ELEMENT_SLOT);
        let le = eccentric_longitude(lm, Dual::cst(ex), Dual::cst(ey)).unwrap();
        let f = le.re();
        assert_abs_diff_eq!(mean_longitude_from_eccentric(f, ex, ey), 1.3, epsilon = 1e-14);
        assert_abs_diff_eq!(
            partial(&le, ELEMENT_SLOT),
            1.0 / (1.0 - ex * f.cos() - ey * f.sin()),
            epsilon = 1e-12
        );
    }

    #[test]
    fn kepler_keeps_revolution() {
        let lm = 7.0 * TAU + 0.5;
        let le = eccentric_longitude(lm, 0.2, 0.1).unwrap();
        assert!((le - lm).abs() < 1.0);
    }

    #[test]
    fn domain() {
        let mut el = Vector6::new(7000.0, 0.9999999999, 0.0, 0.0, 0.0, 0.0);
        assert!(matches!(
            check_elements(&el),
            Err(AstroError::NotElliptic { .. })
        ));
        el[1] = 0.0;
        el[3] = 2e3;
        assert!(matches!(
            check_elements(&el),
            Err(AstroError::RetrogradeEquatorial { .. })
        ));
        el[3] = 0.0;
        el[0] = -1.0;
        assert!(check_elements(&el).is_err());
    }

    #[test]
    fn jacobians_dimensions() {
        let eq = EquinoctialState::keplerian(
            7000.0,
            0.01,
            20.0,
            30.0,
            40.0,
            0.0,
            epoch(),
            EARTH_J2000,
            ElementKind::Mean,
        )
        .unwrap();
        assert!(eq.stm().is_err());
        let bad = eq
            .clone()
            .with_jacobians(&DMatrix::identity(5, 6), &DMatrix::zeros(6, 1));
        assert!(matches!(bad, Err(StateError::JacobianDimension { .. })));
        let bad = eq
            .clone()
            .with_jacobians(&DMatrix::identity(6, 6), &DMatrix::zeros(5, 1));
        assert!(matches!(bad, Err(StateError::JacobianDimension { .. })));
        let good = eq
            .with_jacobians(&DMatrix::identity(6, 6), &DMatrix::zeros(6, 2))
            .unwrap();
        assert_eq!(good.stm().unwrap(), Matrix6::identity());
        assert_eq!(good.param_jacobian().unwrap().ncols(), 2);
    }

    #[test]
    fn unwrapping() {
        assert_abs_diff_eq!(unwrap_near(0.1, 4.0 * PI), 4.0 * PI + 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(unwrap_near(-0.1, 0.0), -0.1, epsilon = 1e-12);
    }
}
