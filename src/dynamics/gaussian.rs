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
use super::DynamicsError;
use crate::dual::{vec3, Real};
use serde_derive::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use typed_builder::TypedBuilder;

/// Settings of the numerical averaging of the force models.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct GaussianQuadratureOptions {
    /// Number of Gauss-Legendre nodes over the integration interval
    #[builder(default = 48)]
    pub nodes: usize,
    /// Highest frequency of the short-period series, in multiples of the mean longitude
    #[builder(default = 4)]
    pub max_frequency: usize,
}

impl Default for GaussianQuadratureOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GaussianQuadratureOptions {
    /// Quadrature is only accurate if it resolves the highest frequency of the series.
    pub fn min_nodes(max_frequency: usize) -> usize {
        2 * max_frequency + 2
    }
}

/// Gauss-Legendre nodes and weights on [-1, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct GaussLegendre {
    pub nodes: Vec<f64>,
    pub weights: Vec<f64>,
}

impl GaussLegendre {
    /// Computes the nodes as the roots of the Legendre polynomial of degree `n` by Newton iterations.
    pub fn new(n: usize) -> Self {
        let mut nodes = vec![0.0; n];
        let mut weights = vec![0.0; n];
        let nf = n as f64;
        for i in 0..(n + 1) / 2 {
            let mut x = (PI * (i as f64 + 0.75) / (nf + 0.5)).cos();
            let mut dp = 1.0;
            for _ in 0..100 {
                let (p_n, p_nm1) = legendre(n, x);
                dp = nf * (x * p_n - p_nm1) / (x * x - 1.0);
                let dx = p_n / dp;
                x -= dx;
                if dx.abs() < 1e-15 {
                    break;
                }
            }
            nodes[i] = -x;
            nodes[n - 1 - i] = x;
            let w = 2.0 / ((1.0 - x * x) * dp * dp);
            weights[i] = w;
            weights[n - 1 - i] = w;
        }
        Self { nodes, weights }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Returns (P_n(x), P_{n-1}(x))
fn legendre(n: usize, x: f64) -> (f64, f64) {
    let mut p0 = 1.0;
    let mut p1 = x;
    if n == 0 {
        return (1.0, 0.0);
    }
    for k in 2..=n {
        let kf = k as f64;
        let p2 = ((2.0 * kf - 1.0) * x * p1 - (kf - 1.0) * p0) / kf;
        p0 = p1;
        p1 = p2;
    }
    (p1, p0)
}

/// Time derivative of `[a, ex, ey, hx, hy, λ]` due to the perturbing acceleration `accel` at the provided point.
///
/// These are the Gauss equations in equinoctial elements (Danielson et al., 2.1.7), without the Keplerian mean motion.
pub fn gauss_rates<T: Real>(
    aux: &AuxiliaryElements<T>,
    point: &OrbitPoint<T>,
    accel: &[T; 3],
) -> [T; 6] {
    let two = T::cst(2.0);
    let (x, y, xd, yd) = (point.x, point.y, point.xd, point.yd);
    let ab = aux.a_fact * aux.b_fact;
    let qy_px = aux.q * y - aux.p * x;

    let da = vec3::scale(two / (aux.n * aux.n * aux.sma), &point.velocity);
    let dh = vec3::add(
        &vec3::lin2(
            (two * xd * y - x * yd) / aux.mu,
            &aux.f,
            -x * xd / aux.mu,
            &aux.g,
        ),
        &vec3::scale(aux.k * qy_px / ab, &aux.w),
    );
    let dk = vec3::sub(
        &vec3::lin2(
            (two * x * yd - xd * y) / aux.mu,
            &aux.g,
            -y * yd / aux.mu,
            &aux.f,
        ),
        &vec3::scale(aux.h * qy_px / ab, &aux.w),
    );
    let dp = vec3::scale(aux.c_fact * y / (two * ab), &aux.w);
    let dq = vec3::scale(aux.c_fact * x / (two * ab), &aux.w);
    let dl = vec3::add(
        &vec3::lin2(
            -two / aux.a_fact,
            &point.position,
            T::one() / (T::one() + aux.b_fact),
            &vec3::lin2(aux.k, &dh, -aux.h, &dk),
        ),
        &vec3::scale(qy_px / aux.a_fact, &aux.w),
    );
    [
        vec3::dot(&da, accel),
        vec3::dot(&dk, accel),
        vec3::dot(&dh, accel),
        vec3::dot(&dq, accel),
        vec3::dot(&dp, accel),
        vec3::dot(&dl, accel),
    ]
}

/// Average and Fourier coefficients in the mean longitude of the Gauss equations.
///
/// With G(λ) the rates of the Gauss equations:
/// `mean_rate = 1/(2π) ∫ G dλ`, `cos[j-1] = 1/π ∫ G cos(jλ) dλ` and `sin[j-1] = 1/π ∫ G sin(jλ) dλ`.
#[derive(Clone, Debug)]
pub struct FourierCoefficients<T: Real> {
    pub mean_rate: [T; 6],
    pub cos: Vec<[T; 6]>,
    pub sin: Vec<[T; 6]>,
}

/// Averages the Gauss equations over the arc of true longitude `limits`, outside of which the
/// perturbing acceleration is zero.
///
/// The integral is computed in the true longitude with dλ = r²/(a²B) dL.
pub fn average<T, F>(
    aux: &AuxiliaryElements<T>,
    limits: (T, T),
    quadrature: &GaussLegendre,
    max_frequency: usize,
    mut accel: F,
) -> Result<FourierCoefficients<T>, DynamicsError>
where
    T: Real,
    F: FnMut(&OrbitPoint<T>) -> Result<[T; 3], DynamicsError>,
{
    let zero = [T::zero(); 6];
    let mut coeffs = FourierCoefficients {
        mean_rate: zero,
        cos: vec![zero; max_frequency],
        sin: vec![zero; max_frequency],
    };
    let (l1, l2) = limits;
    if (l2 - l1).re() <= 0.0 {
        return Ok(coeffs);
    }
    let half = (l2 - l1) / T::cst(2.0);
    let mid = (l2 + l1) / T::cst(2.0);
    let inv_tau = T::cst(1.0 / TAU);
    let inv_pi = T::cst(1.0 / PI);

    for (xi, wi) in quadrature.nodes.iter().zip(&quadrature.weights) {
        let point = aux.point_at_true_longitude(mid + half * T::cst(*xi));
        let acc = accel(&point)?;
        let rates = gauss_rates(aux, &point, &acc);
        let weight = T::cst(*wi) * half * point.dlm_dl;
        for i in 0..6 {
            coeffs.mean_rate[i] += rates[i] * weight * inv_tau;
        }
        for j in 1..=max_frequency {
            let arg = T::cst(j as f64) * point.lm;
            let (s, c) = (arg.sin(), arg.cos());
            for i in 0..6 {
                coeffs.cos[j - 1][i] += rates[i] * weight * c * inv_pi;
                coeffs.sin[j - 1][i] += rates[i] * weight * s * inv_pi;
            }
        }
    }
    Ok(coeffs)
}
