//! Settings and error types as seen by hosts that store or forward them.

use chapterkeep_core::{
    ErrorKind, MonitorSettings, OfflineError, OfflineSettings, SettingsError, validate_settings,
};

#[test]
fn test_partial_document_fills_defaults() {
    let settings: OfflineSettings = serde_json::from_str(
        r#"{ "estimator": { "per_unit_cost": 512 }, "monitor": { "warn_percent": 70 } }"#,
    )
    .unwrap();

    assert_eq!(settings.estimator.per_unit_cost, 512);
    assert_eq!(settings.estimator.fixed_overhead, 2048);
    assert_eq!(settings.monitor.warn_percent, 70);
    assert_eq!(settings.monitor.critical_percent, 95);
    assert!(!settings.orchestrator.request_persistence_automatically);
    assert!(validate_settings(&settings).is_ok());
}

#[test]
fn test_empty_document_equals_defaults() {
    let settings: OfflineSettings = serde_json::from_str("{}").unwrap();
    assert_eq!(settings, OfflineSettings::with_defaults());
}

#[test]
fn test_inverted_thresholds_are_rejected() {
    let settings = OfflineSettings {
        monitor: MonitorSettings {
            warn_percent: 96,
            critical_percent: 95,
            ..MonitorSettings::default()
        },
        ..OfflineSettings::with_defaults()
    };
    assert_eq!(
        validate_settings(&settings),
        Err(SettingsError::InvalidThresholds { warn: 96, critical: 95 })
    );
}

#[test]
fn test_errors_cross_boundaries_as_tagged_json() {
    let err = OfflineError::insufficient_space(5 * 1024 * 1024);
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["type"], "insufficient_space");
    assert_eq!(json["shortage_bytes"], 5 * 1024 * 1024);

    let back: OfflineError = serde_json::from_value(json).unwrap();
    assert_eq!(back.kind(), ErrorKind::Capacity);
    assert!(back.user_message().contains("5.0 MB"));
}
