use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn defaults_match_console_conventions() {
    let settings = ConsoleSettings::default();
    assert_eq!(settings.page_size, 10);
    assert_eq!(settings.audio_prefix_len, 6);
    assert!((settings.volume - 0.8).abs() < f32::EPSILON);
}

#[test]
fn app_prefixed_env_wins_over_plain_backend_host() {
    let mut settings = ConsoleSettings::default();
    apply_env_overrides(
        &mut settings,
        env_from(&[
            ("BACKEND_HOST", "http://plain:1"),
            ("APP__BACKEND_URL", "http://prefixed:2"),
            ("APP__PAGE_SIZE", "25"),
        ]),
    );
    assert_eq!(settings.backend_url, "http://prefixed:2");
    assert_eq!(settings.page_size, 25);
}

#[test]
fn unparsable_env_values_keep_previous_setting() {
    let mut settings = ConsoleSettings::default();
    apply_env_overrides(
        &mut settings,
        env_from(&[("APP__PAGE_SIZE", "many"), ("APP__VOLUME", "loud"), ("BACKEND_HOST", "  ")]),
    );
    assert_eq!(settings, ConsoleSettings::default());
}

#[test]
fn strips_trailing_slash_from_backend_url() {
    assert_eq!(
        normalize_backend_url(" https://api.example.org/v1/ ").expect("url"),
        "https://api.example.org/v1"
    );
}

#[test]
fn rejects_non_http_backend_url() {
    let err = normalize_backend_url("ftp://files.example.org").expect_err("must fail");
    assert!(err.to_string().contains("unsupported scheme"));
    assert!(normalize_backend_url("").is_err());
    assert!(normalize_backend_url("http://host/?page=1").is_err());
}

#[test]
fn validation_rejects_zero_page_size_and_clamps_volume() {
    let zero = ConsoleSettings {
        page_size: 0,
        ..ConsoleSettings::default()
    };
    assert!(zero.validated().is_err());

    let loud = ConsoleSettings {
        volume: 3.0,
        ..ConsoleSettings::default()
    }
    .validated()
    .expect("valid");
    assert_eq!(loud.volume, 1.0);
}

#[test]
fn reads_settings_file_fields() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("review_client_config_test_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("review.toml");
    fs::write(
        &path,
        "backend_url = \"http://10.0.0.5:9000\"\npage_size = 20\naudio_prefix_len = 4\n",
    )
    .expect("write settings");

    let mut settings = ConsoleSettings::default();
    apply_file(&mut settings, &path).expect("apply");
    assert_eq!(settings.backend_url, "http://10.0.0.5:9000");
    assert_eq!(settings.page_size, 20);
    assert_eq!(settings.audio_prefix_len, 4);

    fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn missing_explicit_settings_file_is_an_error() {
    let err = load_settings_from(Path::new("/definitely/not/here/review.toml"))
        .expect_err("must fail");
    assert!(matches!(err, ClientError::InvalidConfig(_)));
}
