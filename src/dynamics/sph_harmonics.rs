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

use crate::dual::Real;
use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;

/// Provides the normalized spherical harmonics coefficients of the central body.
pub trait HarmonicsProvider: fmt::Debug + Send + Sync {
    /// Returns the maximum degree of this gravity potential storage (Jn=Jnm=Jn0)
    fn max_degree(&self) -> usize;
    /// Returns the maximum order of this gravity potential storage (Jnm=Jn2,Jn3...)
    fn max_order(&self) -> usize;
    /// Returns the normalized (C_nm, S_nm). Coefficients outside of the storage are zero.
    fn cs_nm(&self, degree: usize, order: usize) -> (f64, f64);
}

/// `HarmonicsMem` stores the gravity potential coefficients in memory (in a HashMap).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HarmonicsMem {
    degree: usize,
    order: usize,
    // data is (degree, order) -> (C_nm, S_nm)
    data: HashMap<(usize, usize), (f64, f64)>,
}

// Normalized JGM-3 coefficients up to degree and order 5, as (n, m, C_nm, S_nm)
const JGM3: [(usize, usize, f64, f64); 18] = [
    (2, 0, -4.841_653_748_864_70e-4, 0.0),
    (2, 1, -1.869_876e-10, 1.195_280e-9),
    (2, 2, 2.439_261_440e-6, -1.400_266_840e-6),
    (3, 0, 9.571_612_709_271e-7, 0.0),
    (3, 1, 2.030_462_010_478_64e-6, 2.482_004_158_568_72e-7),
    (3, 2, 9.047_878_948_095_28e-7, -6.190_054_751_776_18e-7),
    (3, 3, 7.213_217_571_215_68e-7, 1.414_349_261_929_41e-6),
    (4, 0, 5.399_658_666_389_91e-7, 0.0),
    (4, 1, -5.361_573_893_888_67e-7, -4.735_673_465_180_86e-7),
    (4, 2, 3.505_016_239_626_49e-7, 6.624_800_262_758_29e-7),
    (4, 3, 9.908_567_666_723_21e-7, -2.009_567_235_705_24e-7),
    (4, 4, -1.885_196_330_230_33e-7, 3.088_038_821_491_94e-7),
    (5, 0, 6.867_029_137_366_81e-8, 0.0),
    (5, 1, -6.292_119_230_425_29e-8, -9.436_980_733_957_69e-8),
    (5, 2, 6.520_780_431_761_64e-7, -3.233_531_925_405_22e-7),
    (5, 3, -4.518_471_523_288_43e-7, -2.149_554_083_060_46e-7),
    (5, 4, -2.953_287_611_756_29e-7, 4.980_705_501_023_51e-8),
    (5, 5, 1.748_117_954_960_02e-7, -6.693_799_351_801_65e-7),
];

impl HarmonicsMem {
    /// Builds a storage from (degree, order, C_nm, S_nm) tuples.
    pub fn from_coefficients(coefficients: &[(usize, usize, f64, f64)]) -> Self {
        let mut me = Self::default();
        for (n, m, c, s) in coefficients {
            me.degree = me.degree.max(*n);
            me.order = me.order.max(*m);
            me.data.insert((*n, *m), (*c, *s));
        }
        me
    }

    /// Initialize `HarmonicsMem` as an EARTH J<sub>2</sub> only using the JGM3 model (available in GMAT)
    ///
    /// *WARNING:* This is an EARTH gravity model, and _should not_ be used around any other body.
    pub fn j2_jgm3() -> Self {
        Self::from_coefficients(&JGM3[..1])
    }

    /// Initialize `HarmonicsMem` with the JGM3 model truncated to the provided degree and order (at most 5x5).
    ///
    /// *WARNING:* This is an EARTH gravity model, and _should not_ be used around any other body.
    pub fn jgm3(degree: usize, order: usize) -> Self {
        let kept: Vec<_> = JGM3
            .iter()
            .copied()
            .filter(|(n, m, _, _)| *n <= degree && *m <= order)
            .collect();
        Self::from_coefficients(&kept)
    }
}

impl HarmonicsProvider for HarmonicsMem {
    fn max_degree(&self) -> usize {
        self.degree
    }

    fn max_order(&self) -> usize {
        self.order
    }

    fn cs_nm(&self, degree: usize, order: usize) -> (f64, f64) {
        self.data
            .get(&(degree, order))
            .copied()
            .unwrap_or((0.0, 0.0))
    }
}

/// Constant factors of the normalized Legendre recursions of the Pines formulation, as in GMAT.
#[derive(Clone, Debug)]
pub struct HarmonicsTables {
    size: usize,
    a_diag: Vec<f64>,
    a_off: Vec<f64>,
    b_nm: Vec<f64>,
    c_nm: Vec<f64>,
    vr01: Vec<f64>,
    vr11: Vec<f64>,
}

impl HarmonicsTables {
    /// Precomputes the factors for accelerations up to the provided degree.
    pub fn new(max_degree: usize) -> Self {
        let size = max_degree + 2;
        let mut a_diag = vec![0.0; size];
        let mut a_off = vec![0.0; size];
        let mut b_nm = vec![0.0; size * size];
        let mut c_nm = vec![0.0; size * size];
        let mut vr01 = vec![0.0; size * size];
        let mut vr11 = vec![0.0; size * size];

        // Initialize the diagonal elements (not a function of the input)
        a_diag[0] = 1.0;
        if size > 1 {
            a_diag[1] = 3.0f64.sqrt();
        }
        for n in 2..size {
            let nf64 = n as f64;
            a_diag[n] = (1.0 + 1.0 / (2.0 * nf64)).sqrt() * a_diag[n - 1];
        }
        for (n, off) in a_off.iter_mut().enumerate() {
            *off = (2.0 * n as f64 + 3.0).sqrt();
        }

        for n in 0..size {
            for m in 0..size {
                let nf64 = n as f64;
                let mf64 = m as f64;
                let idx = n * size + m;
                if n >= m + 2 {
                    // Compute c_nm, which is B_nm/B_(n-1,m) in Jones' dissertation
                    c_nm[idx] = (((2.0 * nf64 + 1.0) * (nf64 + mf64 - 1.0) * (nf64 - mf64 - 1.0))
                        / ((nf64 - mf64) * (nf64 + mf64) * (2.0 * nf64 - 3.0)))
                        .sqrt();
                    b_nm[idx] = (((2.0 * nf64 + 1.0) * (2.0 * nf64 - 1.0))
                        / ((nf64 + mf64) * (nf64 - mf64)))
                        .sqrt();
                }
                if n >= m {
                    vr01[idx] = ((nf64 - mf64) * (nf64 + mf64 + 1.0)).sqrt();
                    vr11[idx] = (((2.0 * nf64 + 1.0) * (nf64 + mf64 + 2.0) * (nf64 + mf64 + 1.0))
                        / (2.0 * nf64 + 3.0))
                        .sqrt();
                    if m == 0 {
                        vr01[idx] /= 2.0_f64.sqrt();
                        vr11[idx] /= 2.0_f64.sqrt();
                    }
                }
            }
        }

        Self {
            size,
            a_diag,
            a_off,
            b_nm,
            c_nm,
            vr01,
            vr11,
        }
    }

    /// Highest degree supported by these tables
    pub fn max_degree(&self) -> usize {
        self.size - 2
    }

    /// Acceleration in km/s^2 due to the harmonics of degrees 2 to `max_degree` and of orders in `orders`,
    /// at the position `r` (km) expressed in the body fixed frame.
    pub fn acceleration<T: Real>(
        &self,
        field: &dyn HarmonicsProvider,
        r: &[T; 3],
        mu: T,
        radius_km: f64,
        max_degree: usize,
        orders: RangeInclusive<usize>,
    ) -> [T; 3] {
        let size = self.size;
        let max_degree = max_degree.min(self.max_degree());
        // Using the GMAT notation, with extra character for ease of highlight
        let r_ = (r[0] * r[0] + r[1] * r[1] + r[2] * r[2]).sqrt();
        let s_ = r[0] / r_;
        let t_ = r[1] / r_;
        let u_ = r[2] / r_;

        // Associated Legendre functions, flattened
        let mut a_nm = vec![T::zero(); size * size];
        for n in 0..size {
            a_nm[n * size + n] = T::cst(self.a_diag[n]);
        }
        if size > 1 {
            a_nm[size] = u_ * T::cst(3.0f64.sqrt());
        }
        for n in 1..size - 1 {
            // Off diagonal
            a_nm[(n + 1) * size + n] = T::cst(self.a_off[n]) * u_ * a_nm[n * size + n];
        }
        for m in 0..size {
            for n in (m + 2)..size {
                let idx = n * size + m;
                a_nm[idx] = u_ * T::cst(self.b_nm[idx]) * a_nm[(n - 1) * size + m]
                    - T::cst(self.c_nm[idx]) * a_nm[(n - 2) * size + m];
            }
        }

        let max_order = (*orders.end()).min(max_degree).min(field.max_order());

        // Generate r_m and i_m
        let mut r_m = Vec::with_capacity(max_order + 1);
        let mut i_m = Vec::with_capacity(max_order + 1);
        r_m.push(T::one());
        i_m.push(T::zero());
        for m in 1..=max_order {
            r_m.push(s_ * r_m[m - 1] - t_ * i_m[m - 1]);
            i_m.push(s_ * i_m[m - 1] + t_ * r_m[m - 1]);
        }

        let rho = T::cst(radius_km) / r_;
        let mut a0 = T::zero();
        let mut a1 = T::zero();
        let mut a2 = T::zero();
        let mut a3 = T::zero();

        for n in 2..=max_degree {
            let mut sum0 = T::zero();
            let mut sum1 = T::zero();
            let mut sum2 = T::zero();
            let mut sum3 = T::zero();

            for m in *orders.start()..=max_order.min(n) {
                let (c_val, s_val) = field.cs_nm(n, m);
                if c_val == 0.0 && s_val == 0.0 {
                    continue;
                }
                let (c_val, s_val) = (T::cst(c_val), T::cst(s_val));
                let idx = n * size + m;
                let d_ = c_val * r_m[m] + s_val * i_m[m];
                if m > 0 {
                    let e_ = c_val * r_m[m - 1] + s_val * i_m[m - 1];
                    let f_ = s_val * r_m[m - 1] - c_val * i_m[m - 1];
                    let mf = T::cst(m as f64);
                    sum0 += mf * a_nm[idx] * e_;
                    sum1 += mf * a_nm[idx] * f_;
                }
                sum2 += T::cst(self.vr01[idx]) * a_nm[idx + 1] * d_;
                sum3 += T::cst(self.vr11[idx]) * a_nm[(n + 1) * size + m + 1] * d_;
            }
            let rr = rho.powi(n as i32 + 1);
            a0 += rr * sum0;
            a1 += rr * sum1;
            a2 += rr * sum2;
            a3 += rr * sum3;
        }
        let mu_fact = mu / (T::cst(radius_km) * r_);
        a0 *= mu_fact;
        a1 *= mu_fact;
        a2 *= mu_fact;
        a3 *= -mu_fact;
        [a0 + a3 * s_, a1 + a3 * t_, a2 + a3 * u_]
    }
}

#[cfg(test)]
mod ut_harmonics {
    use super::*;
    use crate::cosmic::EARTH_J2000;
    use crate::dual::{partial, seeded, Dual, ELEMENT_SLOT};
    use approx::assert_relative_eq;
    use hyperdual::Float;

    #[test]
    fn j2_matches_closed_form() {
        let field = HarmonicsMem::j2_jgm3();
        let tables = HarmonicsTables::new(2);
        let (mu, re) = (EARTH_J2000.mu_km3_s2, EARTH_J2000.equatorial_radius_km);
        let r = [5000.0, -3000.0, 4000.0];
        let acc = tables.acceleration(&field, &r, mu, re, 2, 0..=0);

        let j2 = -5.0_f64.sqrt() * field.cs_nm(2, 0).0;
        let rmag = (r[0] * r[0] + r[1] * r[1] + r[2] * r[2]).sqrt();
        let z2 = (r[2] / rmag).powi(2);
        let fact = -1.5 * j2 * mu * re * re / rmag.powi(5);
        let expected = [
            fact * r[0] * (1.0 - 5.0 * z2),
            fact * r[1] * (1.0 - 5.0 * z2),
            fact * r[2] * (3.0 - 5.0 * z2),
        ];
        for i in 0..3 {
            assert_relative_eq!(acc[i], expected[i], max_relative = 1e-12);
        }
    }

    #[test]
    fn sectorial_matches_potential_gradient() {
        // U22 = 3 sqrt(5/12) μ R² (C22 (x² - y²) + 2 S22 x y) / r⁵
        let field = HarmonicsMem::jgm3(2, 2);
        let tables = HarmonicsTables::new(2);
        let (mu, re) = (EARTH_J2000.mu_km3_s2, EARTH_J2000.equatorial_radius_km);
        let (c22, s22) = field.cs_nm(2, 2);
        let r = [5000.0, -3000.0, 4000.0];
        let rd: [Dual; 3] = [
            seeded(r[0], ELEMENT_SLOT),
            seeded(r[1], ELEMENT_SLOT + 1),
            seeded(r[2], ELEMENT_SLOT + 2),
        ];
        let r2 = rd[0] * rd[0] + rd[1] * rd[1] + rd[2] * rd[2];
        let potential = Dual::cst(3.0 * (5.0_f64 / 12.0).sqrt() * mu * re * re)
            * (Dual::cst(c22) * (rd[0] * rd[0] - rd[1] * rd[1])
                + Dual::cst(2.0 * s22) * rd[0] * rd[1])
            / r2.powf(Dual::cst(2.5));

        let acc = tables.acceleration(&field, &r, mu, re, 2, 2..=2);
        for i in 0..3 {
            assert_relative_eq!(
                acc[i],
                partial(&potential, ELEMENT_SLOT + i),
                max_relative = 1e-10
            );
        }
    }

    #[test]
    fn jgm3_truncation() {
        let field = HarmonicsMem::jgm3(4, 4);
        assert_eq!(field.max_degree(), 4);
        assert_eq!(field.max_order(), 4);
        assert_eq!(field.cs_nm(5, 0), (0.0, 0.0));
        assert!(field.cs_nm(4, 4).0 < 0.0);
    }
}
