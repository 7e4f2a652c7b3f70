use super::*;

#[test]
fn defaults_describe_a_valid_export() {
    let s = ExportSettings::default();
    s.validate().unwrap();
    assert_eq!(s.alpha_cutoff, 230);
    assert_eq!(s.key_color, KeyColor::new(0, 255, 0));
    let schedule = s.schedule().unwrap();
    assert_eq!(schedule.frame_count(), 60);
    assert_eq!(schedule.delay_ms(), 33);
}

#[test]
fn partial_json_fills_in_defaults() {
    let s = ExportSettings::from_json_str(
        r#"{ "fps": 12, "rotation": { "mode": "bounce", "amplitude": 0.5 }, "base_name": "ghost" }"#,
    )
    .unwrap();
    assert_eq!(s.fps, 12.0);
    assert_eq!(s.rotation, RotationMode::Bounce { amplitude: 0.5 });
    assert_eq!(s.base_name.as_deref(), Some("ghost"));
    assert_eq!(s.padding_px, 10);
}

#[test]
fn invalid_values_are_rejected() {
    assert!(ExportSettings::from_json_str(r#"{ "fps": 0 }"#).is_err());
    assert!(ExportSettings::from_json_str(r#"{ "gif_quality": 31 }"#).is_err());
    assert!(ExportSettings::from_json_str(r#"{ "gif_workers": 0 }"#).is_err());
    assert!(ExportSettings::from_json_str("not json").is_err());
}

#[test]
fn derived_options_follow_settings() {
    let s = ExportSettings {
        settle_ms: 5,
        gif_quality: 3,
        gif_workers: 4,
        key_color: KeyColor::new(255, 0, 255),
        ..ExportSettings::default()
    };
    assert_eq!(s.capture_opts().settle, Duration::from_millis(5));
    let g = s.gif_opts();
    assert_eq!((g.quality, g.workers, g.key), (3, 4, KeyColor::new(255, 0, 255)));
}

#[test]
fn reading_a_missing_file_fails() {
    let err = ExportSettings::from_json_path(Path::new("/definitely/not/here.json")).unwrap_err();
    assert!(err.to_string().contains("read export settings"));
}

#[test]
fn parsing_defers_validation_to_the_caller() {
    let mut s = ExportSettings::parse_json_str(r#"{ "fps": 0, "padding_px": 3 }"#).unwrap();
    assert!(s.validate().is_err());
    s.fps = 12.0;
    s.validate().unwrap();
    assert_eq!(s.padding_px, 3);
    assert!(ExportSettings::parse_json_str("not json").is_err());
}

#[test]
fn parsed_file_can_be_repaired_before_validation() {
    let path = std::env::temp_dir().join(format!("turntable_settings_{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "fps": -5 }"#).unwrap();

    assert!(ExportSettings::from_json_path(&path).is_err());
    let mut s = ExportSettings::parse_json_path(&path).unwrap();
    s.fps = 24.0;
    s.validate().unwrap();

    std::fs::remove_file(&path).unwrap();
}
