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

use super::gaussian::FourierCoefficients;
use super::{AuxiliaryElements, Context, Contribution, DynamicsError};
use crate::dual::Real;
use crate::linalg::Vector6;
use crate::time::{Epoch, Unit};
use std::collections::{BTreeMap, BTreeSet};

/// One harmonic of a short-period series, of argument ψ = jλ - mθ.
///
/// `cos` and `sin` are the Fourier coefficients of the osculating rates, ν = jn - mθ' is the frequency of ψ.
#[derive(Clone, Debug)]
pub struct HarmonicTerm<T: Real> {
    pub j: i32,
    pub m: u32,
    pub cos: [T; 6],
    pub sin: [T; 6],
    pub frequency: T,
}

/// Short-period variations of the elements due to one contribution.
///
/// For a rate harmonic `C cos ψ + S sin ψ`, the variation is `(C sin ψ - S cos ψ)/ν`, and the
/// mean longitude also receives `3n/(2a) (Cₐ cos ψ + Sₐ sin ψ)/ν²` from the variation of the
/// mean motion with the semi-major axis.
#[derive(Clone, Debug)]
pub struct ShortPeriodSeries<T: Real> {
    pub name: String,
    pub sma: T,
    pub n: T,
    /// Epoch of the coefficients
    pub epoch: Epoch,
    /// Rotation angle of the central body at `epoch`, only used when some terms have m ≠ 0
    pub theta_rad: f64,
    pub theta_rate_rad_s: f64,
    pub terms: Vec<HarmonicTerm<T>>,
}

impl<T: Real> ShortPeriodSeries<T> {
    /// A series without any term.
    pub fn empty(name: &str, aux: &AuxiliaryElements<T>) -> Self {
        Self {
            name: name.to_string(),
            sma: aux.sma,
            n: aux.n,
            epoch: aux.epoch,
            theta_rad: 0.0,
            theta_rate_rad_s: 0.0,
            terms: Vec::new(),
        }
    }

    /// Builds the series of a contribution averaged in the mean longitude only.
    pub fn from_fourier(
        name: &str,
        aux: &AuxiliaryElements<T>,
        coeffs: &FourierCoefficients<T>,
    ) -> Self {
        let mut me = Self::empty(name, aux);
        for (idx, (cos, sin)) in coeffs.cos.iter().zip(&coeffs.sin).enumerate() {
            let j = idx + 1;
            me.terms.push(HarmonicTerm {
                j: j as i32,
                m: 0,
                cos: *cos,
                sin: *sin,
                frequency: T::cst(j as f64) * aux.n,
            });
        }
        me
    }

    /// Amplitudes of the cos ψ and sin ψ parts of the element variations of this term.
    pub fn amplitudes(&self, term: &HarmonicTerm<T>) -> ([T; 6], [T; 6]) {
        let nu = term.frequency;
        let mut cos_amp = [T::zero(); 6];
        let mut sin_amp = [T::zero(); 6];
        for i in 0..6 {
            cos_amp[i] = -term.sin[i] / nu;
            sin_amp[i] = term.cos[i] / nu;
        }
        let coupling = T::cst(1.5) * self.n / (self.sma * nu * nu);
        cos_amp[5] += coupling * term.cos[0];
        sin_amp[5] += coupling * term.sin[0];
        (cos_amp, sin_amp)
    }

    /// Rotation angle of the central body at the provided epoch
    pub fn theta_at(&self, epoch: Epoch) -> f64 {
        self.theta_rad + self.theta_rate_rad_s * (epoch - self.epoch).to_unit(Unit::Second)
    }

    /// Variations of `[a, ex, ey, hx, hy, λ]` at the mean longitude `lm` and the provided epoch.
    pub fn value(&self, lm: T, epoch: Epoch) -> [T; 6] {
        let theta = self.theta_at(epoch);
        let mut eta = [T::zero(); 6];
        for term in &self.terms {
            let psi = T::cst(term.j as f64) * lm - T::cst(term.m as f64 * theta);
            let (s, c) = (psi.sin(), psi.cos());
            let (cos_amp, sin_amp) = self.amplitudes(term);
            for i in 0..6 {
                eta[i] += cos_amp[i] * c + sin_amp[i] * s;
            }
        }
        eta
    }

    /// Names and values of the coefficients of the element variations: `<name>-C<j>` multiplies
    /// cos ψ and `<name>-S<j>` multiplies sin ψ (`<name>-C<j>,<m>` for the tesseral terms).
    pub fn named_coefficients(&self) -> Vec<(String, Vector6<f64>)> {
        let mut named = Vec::with_capacity(2 * self.terms.len());
        for term in &self.terms {
            let suffix = if term.m == 0 {
                format!("{}", term.j)
            } else {
                format!("{},{}", term.j, term.m)
            };
            let (cos_amp, sin_amp) = self.amplitudes(term);
            named.push((
                format!("{}-C{suffix}", self.name),
                Vector6::from_fn(|i, _| cos_amp[i].re()),
            ));
            named.push((
                format!("{}-S{suffix}", self.name),
                Vector6::from_fn(|i, _| sin_amp[i].re()),
            ));
        }
        named
    }
}

/// Short-period terms of one contribution, with their coefficients cached for the last mean state.
///
/// The coefficients are recomputed only when the epoch, the slow elements, the parameters or the mass
/// differ from those of the cached coefficients, so that evaluating the terms at other fast angles is cheap.
#[derive(Clone, Debug)]
pub struct ShortPeriodTerms {
    name: String,
    series: Option<ShortPeriodSeries<f64>>,
    key: Option<CacheKey>,
}

#[derive(Clone, Debug, PartialEq)]
struct CacheKey {
    epoch: Epoch,
    slow: [f64; 5],
    params: Vec<f64>,
    mass_kg: Option<f64>,
}

impl ShortPeriodTerms {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            series: None,
            key: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Refreshes the coefficients from the provided mean state, if needed. Returns whether they were recomputed.
    pub fn update(
        &mut self,
        contribution: &dyn Contribution,
        ctx: &Context<f64>,
    ) -> Result<bool, DynamicsError> {
        let aux = &ctx.aux;
        let key = CacheKey {
            epoch: aux.epoch,
            slow: [aux.sma, aux.k, aux.h, aux.q, aux.p],
            params: ctx.params.reals(),
            mass_kg: ctx.mass_kg,
        };
        if self.key.as_ref() == Some(&key) && self.series.is_some() {
            return Ok(false);
        }
        self.series = Some(contribution.short_period_series(ctx)?);
        self.key = Some(key);
        Ok(true)
    }

    /// Element variations at the provided mean longitude and epoch.
    pub fn value(&self, lm: f64, epoch: Epoch) -> Result<[f64; 6], DynamicsError> {
        self.series
            .as_ref()
            .map(|series| series.value(lm, epoch))
            .ok_or_else(|| DynamicsError::ShortPeriodUninitialized {
                model: self.name.clone(),
            })
    }

    pub fn series(&self) -> Option<&ShortPeriodSeries<f64>> {
        self.series.as_ref()
    }

    /// Forgets the cached coefficients.
    pub fn reset(&mut self) {
        self.series = None;
        self.key = None;
    }

    /// Coefficients retained by the selection: `None` retains none, an empty set retains all of them.
    pub fn retained(&self, selection: &Option<BTreeSet<String>>) -> BTreeMap<String, Vector6<f64>> {
        let mut retained = BTreeMap::new();
        if let (Some(selection), Some(series)) = (selection, &self.series) {
            for (name, value) in series.named_coefficients() {
                if selection.is_empty() || selection.contains(&name) {
                    retained.insert(name, value);
                }
            }
        }
        retained
    }
}
