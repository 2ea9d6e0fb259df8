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

use super::{Contribution, DynamicsError};
use crate::dual::{seeded, Dual, Real, MAX_SELECTED_PARAMETERS, PARAMETER_SLOT};
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A named force model coefficient which may be estimated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterDriver {
    pub name: String,
    /// Value at the time the model was built
    pub reference_value: f64,
    pub value: f64,
    /// Typical magnitude of the variations of this parameter, used to scale finite differences
    pub scale: f64,
    /// Whether the partials with respect to this parameter are computed
    pub selected: bool,
}

impl ParameterDriver {
    pub fn new(name: &str, value: f64, scale: f64) -> Self {
        Self {
            name: name.to_string(),
            reference_value: value,
            value,
            scale,
            selected: false,
        }
    }
}

impl fmt::Display for ParameterDriver {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} = {} (reference {}, scale {}){}",
            self.name,
            self.value,
            self.reference_value,
            self.scale,
            if self.selected { " [selected]" } else { "" }
        )
    }
}

/// All of the parameters of the force models of one propagator.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterRegistry {
    drivers: Vec<ParameterDriver>,
}

impl ParameterRegistry {
    /// Collects the parameters of all of the contributions, rejecting duplicated names.
    pub fn from_contributions(
        contributions: &[Arc<dyn Contribution>],
    ) -> Result<Self, DynamicsError> {
        let mut me = Self::default();
        for contribution in contributions {
            for driver in contribution.parameters() {
                me.register(driver)?;
            }
        }
        Ok(me)
    }

    pub fn register(&mut self, driver: ParameterDriver) -> Result<(), DynamicsError> {
        if self.get(&driver.name).is_some() {
            return Err(DynamicsError::DuplicateParameter { name: driver.name });
        }
        self.drivers.push(driver);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ParameterDriver> {
        self.drivers.iter().find(|d| d.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ParameterDriver> {
        self.drivers.iter_mut().find(|d| d.name == name)
    }

    /// Sets the current value of a parameter.
    pub fn set_value(&mut self, name: &str, value: f64) -> Result<(), DynamicsError> {
        self.get_mut(name)
            .map(|d| d.value = value)
            .ok_or_else(|| DynamicsError::UnknownParameter {
                name: name.to_string(),
            })
    }

    /// Marks the parameters with the provided names as selected, leaving the others untouched.
    pub fn select(&mut self, names: &[String]) -> Result<(), DynamicsError> {
        for name in names {
            match self.get_mut(name) {
                Some(driver) => driver.selected = true,
                None => return Err(DynamicsError::UnknownParameter { name: name.clone() }),
            }
        }
        let selected = self.selected().count();
        if selected > MAX_SELECTED_PARAMETERS {
            return Err(DynamicsError::TooManySelectedParameters {
                selected,
                max: MAX_SELECTED_PARAMETERS,
            });
        }
        Ok(())
    }

    /// Deselects all of the parameters.
    pub fn clear_selection(&mut self) {
        for driver in &mut self.drivers {
            driver.selected = false;
        }
    }

    /// Selected parameters, in registration order, which is also the column order of the parameter Jacobians.
    pub fn selected(&self) -> impl Iterator<Item = &ParameterDriver> {
        self.drivers.iter().filter(|d| d.selected)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterDriver> {
        self.drivers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ParameterDriver> {
        self.drivers.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// Current values, without partials.
    pub fn values<T: Real>(&self) -> ParameterValues<T> {
        ParameterValues {
            entries: self
                .drivers
                .iter()
                .map(|d| (d.name.clone(), T::cst(d.value)))
                .collect(),
        }
    }

    /// Current values where the i-th selected parameter is seeded in its own dual slot.
    pub fn dual_values(&self) -> Result<ParameterValues<Dual>, DynamicsError> {
        let selected = self.selected().count();
        if selected > MAX_SELECTED_PARAMETERS {
            return Err(DynamicsError::TooManySelectedParameters {
                selected,
                max: MAX_SELECTED_PARAMETERS,
            });
        }
        let mut slot = PARAMETER_SLOT;
        let entries = self
            .drivers
            .iter()
            .map(|d| {
                let value = if d.selected {
                    slot += 1;
                    seeded(d.value, slot - 1)
                } else {
                    Dual::cst(d.value)
                };
                (d.name.clone(), value)
            })
            .collect();
        Ok(ParameterValues { entries })
    }
}

/// Snapshot of the parameter values used for one evaluation of the dynamics.
#[derive(Clone, Debug)]
pub struct ParameterValues<T: Real> {
    entries: Vec<(String, T)>,
}

impl<T: Real> ParameterValues<T> {
    pub fn get(&self, name: &str) -> Result<T, DynamicsError> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .ok_or_else(|| DynamicsError::UnknownParameter {
                name: name.to_string(),
            })
    }

    /// Real parts of all of the values, in registration order
    pub(crate) fn reals(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, v)| v.re()).collect()
    }
}

#[cfg(test)]
mod ut_parameters {
    use super::*;
    use crate::dual::partial;

    fn registry() -> ParameterRegistry {
        let mut reg = ParameterRegistry::default();
        reg.register(ParameterDriver::new("drag coefficient", 2.2, 1.0))
            .unwrap();
        reg.register(ParameterDriver::new("central attraction coefficient", 398600.4415, 1.0))
            .unwrap();
        reg.register(ParameterDriver::new("reflection coefficient", 1.5, 1.0))
            .unwrap();
        reg
    }

    #[test]
    fn duplicates_and_unknowns() {
        let mut reg = registry();
        let err = reg
            .register(ParameterDriver::new("drag coefficient", 2.0, 1.0))
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
        let err = reg.select(&["solar flux".to_string()]).unwrap_err();
        assert_eq!(
            err,
            DynamicsError::UnknownParameter {
                name: "solar flux".to_string()
            }
        );
        assert!(reg.set_value("solar flux", 1.0).is_err());
    }

    #[test]
    fn dual_seeding_follows_registration_order() {
        let mut reg = registry();
        reg.select(&[
            "reflection coefficient".to_string(),
            "drag coefficient".to_string(),
        ])
        .unwrap();
        let values = reg.dual_values().unwrap();
        let cd = values.get("drag coefficient").unwrap();
        let cr = values.get("reflection coefficient").unwrap();
        let mu = values.get("central attraction coefficient").unwrap();
        assert_eq!(partial(&cd, PARAMETER_SLOT), 1.0);
        assert_eq!(partial(&cr, PARAMETER_SLOT + 1), 1.0);
        assert_eq!(partial(&cr, PARAMETER_SLOT), 0.0);
        assert_eq!(mu.re(), 398600.4415);
        assert!((1..16).all(|k| partial(&mu, k) == 0.0));
    }
}
