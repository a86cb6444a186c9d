use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use uniform_check::config::UniformConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "UNIFORM_CONFIG",
        "UNIFORM_STREAM_URL",
        "UNIFORM_ASSET_DIR",
        "UNIFORM_OUTPUT_DIR",
        "UNIFORM_TICK_MS",
    ] {
        std::env::remove_var(key);
    }
}

fn config_file(suffix: &str, body: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp config");
    std::io::Write::write_all(&mut file, body.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_without_config() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = UniformConfig::load().expect("load config");
    assert_eq!(cfg.stream.url, "http://127.0.0.1:8080/video");
    assert_eq!((cfg.stream.width, cfg.stream.height), (800, 600));
    assert_eq!(cfg.tick, Duration::from_millis(10));
    assert_eq!(cfg.assets.boy_reference, PathBuf::from("uniform/boy.jpg"));
    assert!(!cfg.legacy_placeholders);
    assert_eq!(cfg.match_threshold, 0.6);
    assert_eq!(cfg.ssd_confidence, 0.2);
}

#[test]
fn loads_json_config_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = config_file(
        ".json",
        r#"{
            "stream": { "url": "http://camera-1:8080/video", "width": 640, "height": 480 },
            "assets": { "dir": "/srv/uniform", "shoes_template": "/srv/alt/boots.png" },
            "output_dir": "/tmp/uniform-out",
            "tick_ms": 40,
            "snapshot_every": 5,
            "legacy_placeholders": true,
            "match_threshold": 0.75,
            "ssd_confidence": 0.5
        }"#,
    );
    std::env::set_var("UNIFORM_CONFIG", file.path());
    std::env::set_var("UNIFORM_OUTPUT_DIR", "/var/lib/uniform");
    std::env::set_var("UNIFORM_TICK_MS", "25");

    let cfg = UniformConfig::load().expect("load config");

    assert_eq!(cfg.stream.url, "http://camera-1:8080/video");
    assert_eq!((cfg.stream.width, cfg.stream.height), (640, 480));
    assert_eq!(cfg.asset_dir, PathBuf::from("/srv/uniform"));
    assert_eq!(cfg.assets.pants_template, PathBuf::from("/srv/uniform/pants.jpg"));
    assert_eq!(cfg.assets.shoes_template, PathBuf::from("/srv/alt/boots.png"));
    assert_eq!(cfg.output_dir, PathBuf::from("/var/lib/uniform"));
    assert_eq!(cfg.tick, Duration::from_millis(25));
    assert_eq!(cfg.snapshot_every, 5);
    assert!(cfg.legacy_placeholders);
    assert_eq!(cfg.match_threshold, 0.75);
    assert_eq!(cfg.ssd_confidence, 0.5);

    clear_env();
}

#[test]
fn loads_toml_config() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = config_file(
        ".toml",
        r#"
            tick_ms = 100

            [stream]
            url = "stub://gate"

            [assets]
            dir = "assets"
        "#,
    );
    std::env::set_var("UNIFORM_CONFIG", file.path());
    std::env::set_var("UNIFORM_ASSET_DIR", "override");

    let cfg = UniformConfig::load().expect("load config");

    assert_eq!(cfg.stream.url, "stub://gate");
    assert_eq!(cfg.stream.width, 800);
    assert_eq!(cfg.tick, Duration::from_millis(100));
    assert_eq!(cfg.asset_dir, PathBuf::from("override"));
    assert_eq!(cfg.assets.girl_reference, PathBuf::from("override/girl.jpg"));

    clear_env();
}

#[test]
fn rejects_invalid_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("UNIFORM_TICK_MS", "soon");
    assert!(UniformConfig::load().is_err());
    std::env::set_var("UNIFORM_TICK_MS", "0");
    assert!(UniformConfig::load().is_err());
    clear_env();

    let file = config_file(".json", r#"{ "stream": { "width": 0 } }"#);
    std::env::set_var("UNIFORM_CONFIG", file.path());
    assert!(UniformConfig::load().is_err());
    clear_env();

    let file = config_file(".json", r#"{ "match_threshold": 1.5 }"#);
    std::env::set_var("UNIFORM_CONFIG", file.path());
    assert!(UniformConfig::load().is_err());
    clear_env();

    let file = config_file(".json", r#"{ "ssd_confidence": -0.1 }"#);
    std::env::set_var("UNIFORM_CONFIG", file.path());
    assert!(UniformConfig::load().is_err());
    clear_env();

    let file = config_file(".json", "{ not json");
    std::env::set_var("UNIFORM_CONFIG", file.path());
    assert!(UniformConfig::load().is_err());

    clear_env();
}
