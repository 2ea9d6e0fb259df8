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

use crate::linalg::{Vector3, U16};
use hyperdual::{Float, OHyperdual};
use std::fmt;
use std::ops::{AddAssign, MulAssign};

/// Number of hyperdual slots: the real part, the six mean elements, and up to nine force model parameters.
pub type DualSize = U16;

/// The hyperdual number used for all the variational equations.
pub type Dual = OHyperdual<f64, DualSize>;

/// Index of the first element partial in a [`Dual`].
pub const ELEMENT_SLOT: usize = 1;
/// Index of the first parameter partial in a [`Dual`].
pub const PARAMETER_SLOT: usize = 7;
/// Maximum number of parameters which may be selected for a single propagation.
pub const MAX_SELECTED_PARAMETERS: usize = 16 - PARAMETER_SLOT;

/// A real number which may or may not carry partial derivatives.
///
/// All of the physics of this crate is written once, generically over `Real`, and called with
/// `f64` for the nominal propagation and with [`Dual`] for the variational equations.
pub trait Real:
    Float + AddAssign + MulAssign + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Builds a constant, i.e. a number with no partials.
    fn cst(value: f64) -> Self;
    /// Returns the real part of this number.
    fn re(&self) -> f64;
}

impl Real for f64 {
    fn cst(value: f64) -> Self {
        value
    }

    fn re(&self) -> f64 {
        *self
    }
}

impl Real for Dual {
    fn cst(value: f64) -> Self {
        Dual::from_real(value)
    }

    fn re(&self) -> f64 {
        self.real()
    }
}

/// Builds a dual number whose partial with respect to the `slot`-th variable is one.
pub fn seeded(value: f64, slot: usize) -> Dual {
    Dual::from_fn(|k| {
        if k == 0 {
            value
        } else if k == slot {
            1.0
        } else {
            0.0
        }
    })
}

/// Returns the partial of this dual number with respect to the `slot`-th variable.
pub fn partial(value: &Dual, slot: usize) -> f64 {
    value[slot]
}

/// Three component vector operations written on plain arrays, usable with any [`Real`].
pub(crate) mod vec3 {
    use super::Real;

    pub fn dot<T: Real>(a: &[T; 3], b: &[T; 3]) -> T {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    pub fn cross<T: Real>(a: &[T; 3], b: &[T; 3]) -> [T; 3] {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    pub fn norm<T: Real>(a: &[T; 3]) -> T {
        dot(a, a).sqrt()
    }

    pub fn scale<T: Real>(k: T, a: &[T; 3]) -> [T; 3] {
        [k * a[0], k * a[1], k * a[2]]
    }

    pub fn add<T: Real>(a: &[T; 3], b: &[T; 3]) -> [T; 3] {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
    }

    pub fn sub<T: Real>(a: &[T; 3], b: &[T; 3]) -> [T; 3] {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    /// `ka * a + kb * b`
    pub fn lin2<T: Real>(ka: T, a: &[T; 3], kb: T, b: &[T; 3]) -> [T; 3] {
        [
            ka * a[0] + kb * b[0],
            ka * a[1] + kb * b[1],
            ka * a[2] + kb * b[2],
        ]
    }

    pub fn constant<T: Real>(a: &[f64; 3]) -> [T; 3] {
        [T::cst(a[0]), T::cst(a[1]), T::cst(a[2])]
    }

    pub fn real<T: Real>(a: &[T; 3]) -> [f64; 3] {
        [a[0].re(), a[1].re(), a[2].re()]
    }
}

/// Converts a nalgebra vector into an array of constants.
pub(crate) fn constant_vector<T: Real>(v: &Vector3<f64>) -> [T; 3] {
    [T::cst(v.x), T::cst(v.y), T::cst(v.z)]
}
