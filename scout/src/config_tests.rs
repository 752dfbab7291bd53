use super::*;

#[test]
fn test_get_config_path_default_location() {
    // Only meaningful when the override is not set in the test environment
    if env::var("SCOUT_CONFIG").is_ok() {
        return;
    }

    let path = get_config_path();
    assert!(path.ends_with("config.yaml"));
    if dirs::config_dir().is_some() {
        assert!(path.to_string_lossy().contains("scout"));
    }
}

#[test]
fn test_get_config_path_is_yaml() {
    let path = get_config_path();
    if env::var("SCOUT_CONFIG").is_err() {
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("yaml"));
    }
}
