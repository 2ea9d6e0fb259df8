use crate::{leo, test_epoch};
use dsst::cosmic::{ElementKind, EARTH_J2000};
use dsst::dynamics::{GaussianQuadratureOptions, HarmonicsMem, ZonalHarmonics, DRAG_COEFFICIENT};
use dsst::io::{ConfigError, ConfigRepr, ForceModelConfig, PropagatorConfig};
use dsst::propagators::PropagationKind;
use dsst::time::Unit;
use dsst::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

fn data_path() -> PathBuf {
    PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap_or(".".to_string()))
        .join("data/propagators.yaml")
}

#[test]
fn named_propagators() {
    let _ = pretty_env_logger::try_init();

    let configs = PropagatorConfig::load_named(data_path()).unwrap();
    assert_eq!(configs.len(), 3);

    let two_body = &configs["two_body"];
    assert_eq!(two_body, &PropagatorConfig::default());
    let prop = two_body.build(&EARTH_J2000).unwrap();
    assert_eq!(prop.kind(), PropagationKind::Mean);
    assert_eq!(prop.dynamics().contributions().len(), 1);

    let full = &configs["leo_full"];
    assert_eq!(full.conversion.max_iterations, 100);
    let mut prop = full.build(&EARTH_J2000).unwrap();
    assert_eq!(prop.dynamics().contributions().len(), 7);
    println!("{prop}");

    prop.set_initial_state(
        leo(ElementKind::Osculating).with_mass(500.0).with_stm(),
        ElementKind::Osculating,
    )
    .unwrap();
    assert_eq!(
        prop.parameter_names(),
        [DRAG_COEFFICIENT, "reflection coefficient"]
    );
    let state = prop.propagate(test_epoch() + Unit::Hour * 3).unwrap();
    assert_eq!(state.kind, ElementKind::Osculating);
    assert_eq!(state.param_jacobian().unwrap().shape(), (6, 2));
    assert!((state.sma_km() - 7000.0).abs() < 20.0);

    let err = configs["bad_steps"].build(&EARTH_J2000).err().unwrap();
    assert!(matches!(err, ConfigError::InvalidConfig { .. }));
}

/// A zonal truncation below the degree 2 is a configuration error, never a silent zero contribution.
#[test]
fn zonal_truncation_rejected() {
    let _ = pretty_env_logger::try_init();

    for degree in [0, 1] {
        let err = ZonalHarmonics::new(
            Arc::new(HarmonicsMem::jgm3(4, 0)),
            &EARTH_J2000,
            degree,
            GaussianQuadratureOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    // Nor a degree which the short-period truncation cannot represent
    let opts = GaussianQuadratureOptions::builder()
        .nodes(48)
        .max_frequency(3)
        .build();
    let field = Arc::new(HarmonicsMem::jgm3(5, 0));
    assert!(ZonalHarmonics::new(field, &EARTH_J2000, 5, opts).is_err());

    let cfg = ForceModelConfig::loads("zonal:\n  degree: 1\n").unwrap();
    let err = cfg.build_dynamics(&EARTH_J2000).err().unwrap();
    assert!(matches!(err, ConfigError::InvalidModel { .. }));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn missing_file() {
    let err = PropagatorConfig::load("data/does_not_exist.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::ReadError { .. }));
}
