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

use super::PropagationError;
use crate::cosmic::EquinoctialState;
use crate::dynamics::MeanElementDynamics;
use crate::linalg::{DMatrix, DVector, Matrix6, Vector6};

/// Maps the Jacobian blocks of a state into the integrated state vector, and back.
///
/// The state vector is laid out as `[y (6) | Φ (36, row major) | S (6k, row major)]` where Φ is the
/// state transition matrix of the mean elements and S the Jacobian with respect to the `k`
/// selected parameters, in their selection order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JacobianMapper {
    names: Vec<String>,
}

impl JacobianMapper {
    /// Builds the mapper of the parameters currently selected in the registry of the dynamics.
    pub fn new(dynamics: &MeanElementDynamics) -> Self {
        Self {
            names: dynamics
                .registry()
                .selected()
                .map(|d| d.name.clone())
                .collect(),
        }
    }

    /// Names of the selected parameters, i.e. of the columns of the parameter Jacobian
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn num_params(&self) -> usize {
        self.names.len()
    }

    /// Length of the integrated state vector with the variational equations
    pub fn dimension(&self) -> usize {
        6 + 36 + 6 * self.num_params()
    }

    /// Returns the Jacobian of the state with respect to the initial mean elements.
    pub fn state_jacobian(&self, state: &EquinoctialState) -> Result<Matrix6<f64>, PropagationError> {
        Ok(state.stm()?)
    }

    /// Returns the Jacobian of the state with respect to the selected parameters.
    ///
    /// A state without parameter Jacobian has a zero one if no parameter is selected.
    pub fn parameters_jacobian(
        &self,
        state: &EquinoctialState,
    ) -> Result<DMatrix<f64>, PropagationError> {
        // Fails with a not initialized error if there is no state Jacobian at all
        state.stm()?;
        match state.param_jacobian() {
            Ok(sens) if sens.ncols() == self.num_params() => Ok(sens.clone()),
            Ok(sens) => Err(PropagationError::ParameterColumns {
                expected: self.num_params(),
                found: sens.ncols(),
            }),
            Err(_) if self.num_params() == 0 => Ok(DMatrix::zeros(6, 0)),
            Err(e) => Err(e.into()),
        }
    }

    /// Packs the elements and the Jacobians of a state into the integrated vector.
    pub fn pack(&self, state: &EquinoctialState) -> Result<DVector<f64>, PropagationError> {
        let stm = self.state_jacobian(state)?;
        let sens = self.parameters_jacobian(state)?;
        let k = self.num_params();
        let mut vec = DVector::zeros(self.dimension());
        for i in 0..6 {
            vec[i] = state.elements()[i];
            for j in 0..6 {
                vec[6 + 6 * i + j] = stm[(i, j)];
            }
            for j in 0..k {
                vec[42 + k * i + j] = sens[(i, j)];
            }
        }
        Ok(vec)
    }

    /// Unpacks the elements, the state transition matrix and the parameter Jacobian.
    pub fn unpack(&self, vec: &DVector<f64>) -> (Vector6<f64>, Matrix6<f64>, DMatrix<f64>) {
        let k = self.num_params();
        let elements = Vector6::from_fn(|i, _| vec[i]);
        let stm = Matrix6::from_fn(|i, j| vec[6 + 6 * i + j]);
        let sens = DMatrix::from_fn(6, k, |i, j| vec[42 + k * i + j]);
        (elements, stm, sens)
    }

    /// Time derivative of the packed vector, from the mean element rates `fx`, their Jacobian
    /// `a_mat` with respect to the elements and `b_mat` with respect to the selected parameters:
    /// `Φ' = A Φ` and `S' = A S + B`.
    pub fn rates(
        &self,
        fx: &[f64; 6],
        a_mat: &Matrix6<f64>,
        b_mat: &DMatrix<f64>,
        vec: &DVector<f64>,
    ) -> Result<DVector<f64>, PropagationError> {
        if b_mat.ncols() != self.num_params() {
            return Err(PropagationError::ParameterColumns {
                expected: self.num_params(),
                found: b_mat.ncols(),
            });
        }
        let k = self.num_params();
        let (_, stm, sens) = self.unpack(vec);
        let stm_dot = a_mat * stm;
        let a_dyn = DMatrix::from_fn(6, 6, |i, j| a_mat[(i, j)]);
        let sens_dot = a_dyn * sens + b_mat;
        let mut rates = DVector::zeros(self.dimension());
        for i in 0..6 {
            rates[i] = fx[i];
            for j in 0..6 {
                rates[6 + 6 * i + j] = stm_dot[(i, j)];
            }
            for j in 0..k {
                rates[42 + k * i + j] = sens_dot[(i, j)];
            }
        }
        Ok(rates)
    }
}
