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

use super::gaussian::gauss_rates;
use super::{
    Context, Contribution, DynamicsError, GaussLegendre, GaussianQuadratureOptions, HarmonicTerm,
    HarmonicsProvider, HarmonicsTables, ShortPeriodSeries,
};
use crate::cosmic::{BodyRotation, Frame};
use crate::dual::{Dual, Real};
use std::f64::consts::{PI, TAU};
use std::fmt;
use std::sync::Arc;

/// Terms whose period exceeds both this many orbital periods and `RESONANCE_MIN_DAYS` are resonant
const RESONANCE_PERIODS: f64 = 10.0;
const RESONANCE_MIN_DAYS: f64 = 10.0;

/// Tesseral and sectorial harmonics (orders one and above) of the central body gravity field.
///
/// The acceleration depends on both the mean longitude λ and the body rotation angle θ, so it is
/// expanded in the harmonics of ψ = jλ - mθ by a double quadrature: Gauss-Legendre in the true
/// longitude and a uniform grid in θ. Resonant terms, i.e. those whose frequency jn - mθ' is so slow
/// that they cannot be considered periodic over a propagation, are kept in the mean element rates
/// instead of the short-period series.
#[derive(Clone, Debug)]
pub struct TesseralHarmonics {
    field: Arc<dyn HarmonicsProvider>,
    rotation: Arc<dyn BodyRotation>,
    tables: HarmonicsTables,
    degree: usize,
    order: usize,
    radius_km: f64,
    quadrature: GaussLegendre,
    max_frequency: usize,
    theta_points: usize,
}

impl TesseralHarmonics {
    pub fn new(
        field: Arc<dyn HarmonicsProvider>,
        rotation: Arc<dyn BodyRotation>,
        frame: &Frame,
        degree: usize,
        order: usize,
        opts: GaussianQuadratureOptions,
    ) -> Result<Arc<Self>, DynamicsError> {
        let invalid = |msg: String| DynamicsError::InvalidTruncation {
            model: "tesseral harmonics".to_string(),
            msg,
        };
        if order < 1 || order > degree {
            return Err(invalid(format!(
                "order {order} must be between 1 and the degree {degree}"
            )));
        }
        if degree > field.max_degree() || order > field.max_order() {
            return Err(invalid(format!(
                "{degree}x{order} exceeds the {}x{} gravity field",
                field.max_degree(),
                field.max_order()
            )));
        }
        if opts.max_frequency < degree {
            return Err(invalid(format!(
                "short-period truncation {} is below the degree {degree}",
                opts.max_frequency
            )));
        }
        let min_nodes = GaussianQuadratureOptions::min_nodes(opts.max_frequency);
        if opts.nodes < min_nodes {
            return Err(invalid(format!(
                "{} quadrature nodes cannot resolve frequency {} (at least {min_nodes} needed)",
                opts.nodes, opts.max_frequency
            )));
        }
        Ok(Arc::new(Self {
            field,
            rotation,
            tables: HarmonicsTables::new(degree),
            degree,
            order,
            radius_km: frame.equatorial_radius_km,
            quadrature: GaussLegendre::new(opts.nodes),
            max_frequency: opts.max_frequency,
            theta_points: 2 * order + 2,
        }))
    }

    /// Whether the term of argument jλ - mθ varies too slowly to be averaged out.
    pub fn is_resonant(&self, j: i32, m: u32, mean_motion: f64, theta_rate: f64) -> bool {
        let nu = j as f64 * mean_motion - m as f64 * theta_rate;
        let limit_s = (RESONANCE_PERIODS * TAU / mean_motion)
            .max(RESONANCE_MIN_DAYS * 86_400.0);
        nu.abs() * limit_s < TAU
    }

    /// Harmonics of the Gauss equations, keeping either the resonant or the non resonant terms.
    fn harmonics<T: Real>(
        &self,
        ctx: &Context<T>,
        resonant: bool,
    ) -> Result<Vec<HarmonicTerm<T>>, DynamicsError> {
        let aux = &ctx.aux;
        let theta_rate = self.rotation.rate_rad_s(aux.epoch);
        let n_re = aux.n.re();
        let jmax = self.max_frequency as i32;
        let mut terms = Vec::new();
        for m in 1..=self.order as u32 {
            for j in -jmax..=jmax {
                if self.is_resonant(j, m, n_re, theta_rate) == resonant {
                    terms.push(HarmonicTerm {
                        j,
                        m,
                        cos: [T::zero(); 6],
                        sin: [T::zero(); 6],
                        frequency: T::cst(j as f64) * aux.n - T::cst(m as f64 * theta_rate),
                    });
                }
            }
        }
        if terms.is_empty() {
            return Ok(terms);
        }

        // (1/(2π²)) ∬ G(λ, θ) cos|sin(jλ - mθ) dλ dθ, with the θ integral on a uniform grid
        let k_pts = self.theta_points;
        let theta_weight = TAU / (k_pts as f64) / (2.0 * PI * PI);
        let half = T::cst(PI);
        for (xi, wi) in self.quadrature.nodes.iter().zip(&self.quadrature.weights) {
            let point = aux.point_at_true_longitude(half + half * T::cst(*xi));
            let weight = T::cst(*wi * theta_weight) * half * point.dlm_dl;
            for k in 0..k_pts {
                let theta = TAU * k as f64 / k_pts as f64;
                let (st, ct) = theta.sin_cos();
                let (st, ct) = (T::cst(st), T::cst(ct));
                let r = &point.position;
                let r_body = [ct * r[0] + st * r[1], ct * r[1] - st * r[0], r[2]];
                let acc_body = self.tables.acceleration(
                    self.field.as_ref(),
                    &r_body,
                    aux.mu,
                    self.radius_km,
                    self.degree,
                    1..=self.order,
                );
                let acc = [
                    ct * acc_body[0] - st * acc_body[1],
                    st * acc_body[0] + ct * acc_body[1],
                    acc_body[2],
                ];
                let rates = gauss_rates(aux, &point, &acc);
                for term in terms.iter_mut() {
                    let psi = T::cst(term.j as f64) * point.lm - T::cst(term.m as f64 * theta);
                    let (s, c) = (psi.sin(), psi.cos());
                    for i in 0..6 {
                        term.cos[i] += rates[i] * weight * c;
                        term.sin[i] += rates[i] * weight * s;
                    }
                }
            }
        }
        super::ensure_finite(
            &terms.iter().flat_map(|t| t.cos).collect::<Vec<T>>(),
            self.name(),
            "tesseral harmonic",
        )?;
        Ok(terms)
    }

    fn rate<T: Real>(&self, ctx: &Context<T>) -> Result<[T; 6], DynamicsError> {
        let mut rate = [T::zero(); 6];
        let theta = self.rotation.angle_rad(ctx.epoch());
        for term in self.harmonics(ctx, true)? {
            let psi = T::cst(term.j as f64) * ctx.aux.lm - T::cst(term.m as f64 * theta);
            let (s, c) = (psi.sin(), psi.cos());
            for i in 0..6 {
                rate[i] += term.cos[i] * c + term.sin[i] * s;
            }
        }
        Ok(rate)
    }

    fn series<T: Real>(&self, ctx: &Context<T>) -> Result<ShortPeriodSeries<T>, DynamicsError> {
        let mut series = ShortPeriodSeries::empty(self.name(), &ctx.aux);
        series.theta_rad = self.rotation.angle_rad(ctx.epoch());
        series.theta_rate_rad_s = self.rotation.rate_rad_s(ctx.epoch());
        series.terms = self.harmonics(ctx, false)?;
        Ok(series)
    }
}

impl fmt::Display for TesseralHarmonics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "tesseral harmonics {}x{} ({} nodes, {} harmonics)",
            self.degree,
            self.order,
            self.quadrature.len(),
            self.max_frequency
        )
    }
}

impl Contribution for TesseralHarmonics {
    fn name(&self) -> &str {
        "tesseral"
    }

    fn mean_rate(&self, ctx: &Context<f64>) -> Result<[f64; 6], DynamicsError> {
        self.rate(ctx)
    }

    fn dual_mean_rate(&self, ctx: &Context<Dual>) -> Result<[Dual; 6], DynamicsError> {
        self.rate(ctx)
    }

    fn short_period_series(
        &self,
        ctx: &Context<f64>,
    ) -> Result<ShortPeriodSeries<f64>, DynamicsError> {
        self.series(ctx)
    }

    fn dual_short_period_series(
        &self,
        ctx: &Context<Dual>,
    ) -> Result<ShortPeriodSeries<Dual>, DynamicsError> {
        self.series(ctx)
    }
}
