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

use super::{ConfigError, ConfigRepr, InvalidConfigSnafu, InvalidModelSnafu};
use crate::cosmic::{Frame, KeplerianEphemeris, UniformRotation};
use crate::dynamics::{
    AtmosphereModel, AtmosphericDrag, Contribution, GaussianQuadratureOptions, HarmonicsMem,
    MeanElementDynamics, SolarRadiationPressure, SpacecraftShape, TesseralHarmonics, ThirdBody,
    ZonalHarmonics, DEFAULT_MAX_ALTITUDE_KM,
};
use crate::propagators::{
    MeanConversionOptions, PropOpts, PropagationKind, RungeKutta, SemiAnalyticalPropagator,
};
use crate::time::Unit;
use serde_derive::{Deserialize, Serialize};
use snafu::prelude::*;
use std::sync::Arc;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZonalConfig {
    pub degree: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TesseralConfig {
    pub degree: usize,
    pub order: usize,
}

/// Perturbing bodies with a built-in analytical ephemeris.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerturbingBody {
    Sun,
    Moon,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DragConfig {
    #[serde(default = "default_cd")]
    pub cd: f64,
    pub shape: SpacecraftShape,
    #[serde(default = "AtmosphereModel::exponential_700km")]
    pub atmosphere: AtmosphereModel,
    #[serde(default = "default_ceiling")]
    pub max_altitude_km: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SrpConfig {
    #[serde(default = "default_cr")]
    pub cr: f64,
    pub shape: SpacecraftShape,
    #[serde(default = "default_shadow")]
    pub shadow: bool,
}

fn default_cd() -> f64 {
    2.2
}

fn default_cr() -> f64 {
    1.5
}

fn default_ceiling() -> f64 {
    DEFAULT_MAX_ALTITUDE_KM
}

fn default_shadow() -> bool {
    true
}

/// Force models about the Earth, with the JGM-3 gravity field (up to degree and order 5).
///
/// ```yaml
/// zonal:
///   degree: 4
/// tesseral:
///   degree: 4
///   order: 4
/// third_bodies: [Moon, Sun]
/// drag:
///   cd: 2.2
///   shape: !Sphere
///     area_m2: 10.0
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ForceModelConfig {
    #[serde(default)]
    pub quadrature: GaussianQuadratureOptions,
    #[serde(default)]
    pub zonal: Option<ZonalConfig>,
    #[serde(default)]
    pub tesseral: Option<TesseralConfig>,
    #[serde(default)]
    pub third_bodies: Vec<PerturbingBody>,
    #[serde(default)]
    pub drag: Option<DragConfig>,
    #[serde(default)]
    pub srp: Option<SrpConfig>,
}

impl ConfigRepr for ForceModelConfig {}

impl ForceModelConfig {
    /// Builds all of the configured contributions, validating their truncations.
    pub fn build(&self, frame: &Frame) -> Result<Vec<Arc<dyn Contribution>>, ConfigError> {
        let opts = self.quadrature;
        let mut models: Vec<Arc<dyn Contribution>> = Vec::new();

        let degree = self
            .zonal
            .map(|z| z.degree)
            .max(self.tesseral.map(|t| t.degree))
            .unwrap_or(0);
        let order = self.tesseral.map_or(0, |t| t.order);
        let field = Arc::new(HarmonicsMem::jgm3(degree, order));

        if let Some(zonal) = self.zonal {
            models.push(
                ZonalHarmonics::new(field.clone(), frame, zonal.degree, opts)
                    .context(InvalidModelSnafu)?,
            );
        }
        if let Some(tesseral) = self.tesseral {
            models.push(
                TesseralHarmonics::new(
                    field,
                    Arc::new(UniformRotation::earth()),
                    frame,
                    tesseral.degree,
                    tesseral.order,
                    opts,
                )
                .context(InvalidModelSnafu)?,
            );
        }
        for body in &self.third_bodies {
            let ephem = match body {
                PerturbingBody::Sun => KeplerianEphemeris::sun(frame),
                PerturbingBody::Moon => KeplerianEphemeris::moon(frame),
            };
            models.push(ThirdBody::new(Arc::new(ephem), opts).context(InvalidModelSnafu)?);
        }
        if let Some(drag) = self.drag {
            ensure!(
                drag.max_altitude_km > 0.0,
                InvalidConfigSnafu {
                    msg: format!("atmosphere ceiling must be positive: {}", drag.max_altitude_km)
                }
            );
            let mut model =
                AtmosphericDrag::new_raw(drag.atmosphere, drag.shape, drag.cd, frame, opts)
                    .context(InvalidModelSnafu)?;
            model.max_altitude_km = drag.max_altitude_km;
            models.push(Arc::new(model));
        }
        if let Some(srp) = self.srp {
            let sun = Arc::new(KeplerianEphemeris::sun(frame));
            let mut model = SolarRadiationPressure::new_raw(sun, srp.shape, srp.cr, frame, opts)
                .context(InvalidModelSnafu)?;
            model.shadow = srp.shadow;
            models.push(Arc::new(model));
        }
        Ok(models)
    }

    /// Builds the mean element dynamics of these force models.
    pub fn build_dynamics(&self, frame: &Frame) -> Result<MeanElementDynamics, ConfigError> {
        MeanElementDynamics::new(frame, self.build(frame)?).context(InvalidModelSnafu)
    }
}

/// Integrators available from a configuration file.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegratorKind {
    #[default]
    Dormand45,
    Fehlberg45,
    Verner56,
    /// Classical RK4 with a fixed step of `max_step_s`
    RK4,
}

/// Settings of a semi-analytical propagator and of its force models.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropagatorConfig {
    #[serde(default)]
    pub kind: PropagationKind,
    #[serde(default)]
    pub integrator: IntegratorKind,
    /// Position accuracy in km, converted into the element tolerances
    #[serde(default = "default_accuracy")]
    pub position_accuracy_km: f64,
    #[serde(default = "default_min_step")]
    pub min_step_s: f64,
    #[serde(default = "default_max_step")]
    pub max_step_s: f64,
    #[serde(default)]
    pub conversion: MeanConversionOptions,
    #[serde(default)]
    pub force_models: ForceModelConfig,
    /// Parameters whose Jacobian columns are computed
    #[serde(default)]
    pub selected_parameters: Vec<String>,
}

fn default_accuracy() -> f64 {
    1e-3
}

fn default_min_step() -> f64 {
    0.001
}

fn default_max_step() -> f64 {
    2700.0
}

impl Default for PropagatorConfig {
    fn default() -> Self {
        Self {
            kind: PropagationKind::default(),
            integrator: IntegratorKind::default(),
            position_accuracy_km: default_accuracy(),
            min_step_s: default_min_step(),
            max_step_s: default_max_step(),
            conversion: MeanConversionOptions::default(),
            force_models: ForceModelConfig::default(),
            selected_parameters: Vec::new(),
        }
    }
}

impl ConfigRepr for PropagatorConfig {}

impl PropagatorConfig {
    /// Builds the propagator, ready for its initial state.
    pub fn build(&self, frame: &Frame) -> Result<SemiAnalyticalPropagator, ConfigError> {
        ensure!(
            self.position_accuracy_km > 0.0,
            InvalidConfigSnafu {
                msg: format!(
                    "position accuracy must be positive: {} km",
                    self.position_accuracy_km
                )
            }
        );
        ensure!(
            self.min_step_s > 0.0 && self.max_step_s >= self.min_step_s,
            InvalidConfigSnafu {
                msg: format!(
                    "invalid step bounds: min {} s, max {} s",
                    self.min_step_s, self.max_step_s
                )
            }
        );
        ensure!(
            self.conversion.tolerance > 0.0 && self.conversion.max_iterations > 0,
            InvalidConfigSnafu {
                msg: format!("invalid mean conversion settings: {:?}", self.conversion)
            }
        );

        let dynamics = self.force_models.build_dynamics(frame)?;
        let opts = PropOpts::with_adaptive_step_s(
            self.min_step_s,
            self.max_step_s,
            self.position_accuracy_km,
        );
        let integrator = match self.integrator {
            IntegratorKind::Dormand45 => RungeKutta::dormand45(opts),
            IntegratorKind::Fehlberg45 => RungeKutta::rkf45(opts),
            IntegratorKind::Verner56 => RungeKutta::verner56(opts),
            IntegratorKind::RK4 => RungeKutta::rk4(self.max_step_s * Unit::Second),
        };
        let mut prop =
            SemiAnalyticalPropagator::new(dynamics, integrator, self.kind, self.position_accuracy_km)
                .with_conversion(self.conversion);
        let names: Vec<&str> = self.selected_parameters.iter().map(|s| s.as_str()).collect();
        prop.select_parameters(&names);
        Ok(prop)
    }
}

#[cfg(test)]
mod ut_force_models {
    use super::*;
    use crate::cosmic::EARTH_J2000;
    use crate::ErrorKind;

    #[test]
    fn full_config() {
        let yaml = r#"
kind: Osculating
integrator: Verner56
position_accuracy_km: 0.01
force_models:
  zonal:
    degree: 4
  tesseral:
    degree: 4
    order: 4
  third_bodies: [Moon, Sun]
  drag:
    cd: 2.0
    shape: !Sphere
      area_m2: 10.0
  srp:
    shape: !Sphere
      area_m2: 12.0
    shadow: false
selected_parameters: [drag coefficient]
"#;
        let cfg = PropagatorConfig::loads(yaml).unwrap();
        assert_eq!(cfg.kind, PropagationKind::Osculating);
        assert_eq!(cfg.max_step_s, 2700.0);
        assert_eq!(cfg.force_models.third_bodies.len(), 2);
        let drag = cfg.force_models.drag.unwrap();
        assert_eq!(drag.atmosphere, AtmosphereModel::exponential_700km());
        assert_eq!(cfg.force_models.srp.unwrap().cr, 1.5);

        let models = cfg.force_models.build(&EARTH_J2000).unwrap();
        let names: Vec<&str> = models.iter().map(|m| m.name()).collect();
        assert_eq!(names, ["zonal", "tesseral", "Moon", "Sun", "drag", "SRP"]);

        let prop = cfg.build(&EARTH_J2000).unwrap();
        // The Newtonian attraction is always present
        assert_eq!(prop.dynamics().contributions().len(), 7);
        assert!(prop.parameters().get("Moon attraction coefficient").is_some());
    }

    #[test]
    fn rejected_configs() {
        let cfg = ForceModelConfig::loads("zonal:\n  degree: 1\n").unwrap();
        let err = cfg.build(&EARTH_J2000).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let cfg = ForceModelConfig::loads("tesseral:\n  degree: 3\n  order: 4\n").unwrap();
        assert!(cfg.build(&EARTH_J2000).is_err());

        let cfg = PropagatorConfig {
            min_step_s: 10.0,
            max_step_s: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.build(&EARTH_J2000),
            Err(ConfigError::InvalidConfig { .. })
        ));

        assert!(matches!(
            PropagatorConfig::loads("kind: Sideways\n"),
            Err(ConfigError::ParseError { .. })
        ));
    }
}
