//! Configuration loading from YAML documents.

use grid_common::{ConversionConfig, GridError, RoffFormat};

#[test]
fn test_partial_yaml_uses_defaults() {
    let yaml = r#"
grdecl_keyword_max_len: null
roff_output_format: ascii
"#;
    let config: ConversionConfig = serde_yaml::from_str(yaml).unwrap();

    assert_eq!(config.grdecl_keyword_max_len, None);
    assert_eq!(config.roff_output_format, RoffFormat::Ascii);
    assert_eq!(config.split_tolerance, ConversionConfig::default().split_tolerance);
    assert!(config.validate().is_ok());
}

#[test]
fn test_yaml_tolerances() {
    let yaml = r#"
split_tolerance:
  absolute: 0.001
  relative: 0.0
geometry_tolerance:
  coordinates: 0.5
  depths: 1.0
"#;
    let config: ConversionConfig = serde_yaml::from_str(yaml).unwrap();

    assert_eq!(config.split_tolerance.absolute, 0.001);
    assert_eq!(config.geometry_tolerance.depths, 1.0);
    assert_eq!(config.grdecl_keyword_max_len, Some(8));
}

#[test]
fn test_yaml_roundtrip() {
    let config = ConversionConfig {
        grdecl_strict_keywords: true,
        ..Default::default()
    };
    let yaml = serde_yaml::to_string(&config).unwrap();
    let parsed: ConversionConfig = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_invalid_yaml_values_fail_validation() {
    let yaml = r#"
split_tolerance:
  absolute: -1.0
  relative: 0.0
"#;
    let config: ConversionConfig = serde_yaml::from_str(yaml).unwrap();

    match config.validate() {
        Err(GridError::InvalidConfig(message)) => {
            assert!(message.contains("split_tolerance.absolute"));
        }
        other => panic!("expected invalid configuration, got {:?}", other),
    }
}
