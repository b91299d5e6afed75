use std::sync::Mutex;

use tempfile::NamedTempFile;

use roadscan::config::DetectorConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "ROADSCAN_CONFIG",
        "ROADSCAN_MODEL_PATH",
        "ROADSCAN_INPUT_SIZE",
        "ROADSCAN_CONFIDENCE_THRESHOLD",
        "ROADSCAN_NMS",
        "ROADSCAN_NMS_IOU",
        "ROADSCAN_NMS_CLASS_AGNOSTIC",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_defaults_without_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = DetectorConfig::load().expect("load defaults");
    assert!(cfg.model_path.is_none());
    assert_eq!(cfg.input_size, 640);
    assert_eq!(cfg.confidence_threshold, 0.4);
    assert!(!cfg.suppression.enabled);
    assert_eq!(cfg.suppression.iou_threshold, 0.45);
    assert!(!cfg.suppression.class_agnostic);
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "model_path": "models/rdd.onnx",
        "input_size": 416,
        "confidence_threshold": 0.25,
        "suppression": {
            "enabled": true,
            "iou_threshold": 0.6
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("ROADSCAN_CONFIG", file.path());
    std::env::set_var("ROADSCAN_CONFIDENCE_THRESHOLD", "0.5");
    std::env::set_var("ROADSCAN_NMS_CLASS_AGNOSTIC", "yes");

    let cfg = DetectorConfig::load().expect("load config");

    assert_eq!(
        cfg.model_path.as_deref(),
        Some(std::path::Path::new("models/rdd.onnx"))
    );
    assert_eq!(cfg.input_size, 416);
    assert_eq!(cfg.confidence_threshold, 0.5);
    assert!(cfg.suppression.enabled);
    assert_eq!(cfg.suppression.iou_threshold, 0.6);
    assert!(cfg.suppression.class_agnostic);

    let settings = cfg.engine_settings().expect("settings");
    assert_eq!(settings.confidence_threshold.value(), 0.5);
    assert!(settings.suppression.enabled);

    clear_env();
}

#[test]
fn rejects_invalid_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("ROADSCAN_CONFIDENCE_THRESHOLD", "1.5");
    assert!(DetectorConfig::load().is_err());
    clear_env();

    std::env::set_var("ROADSCAN_INPUT_SIZE", "zero");
    assert!(DetectorConfig::load().is_err());
    clear_env();

    std::env::set_var("ROADSCAN_NMS", "sometimes");
    assert!(DetectorConfig::load().is_err());
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, b"{ not json").expect("write config");
    std::env::set_var("ROADSCAN_CONFIG", file.path());
    assert!(DetectorConfig::load().is_err());
    clear_env();
}
