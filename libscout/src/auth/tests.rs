use super::*;

#[test]
fn test_credentials_anonymous() {
    let creds = Credentials::anonymous();
    assert_eq!(creds, Credentials::Anonymous);
    assert_eq!(creds.to_header_value(), None);
    assert_eq!(creds.username(), None);
}

#[test]
fn test_credentials_basic() {
    let creds = Credentials::basic("testuser", "testpass");
    match &creds {
        Credentials::Basic { username, password } => {
            assert_eq!(username, "testuser");
            assert_eq!(password, "testpass");
        }
        _ => panic!("Expected Basic credentials"),
    }

    // base64("testuser:testpass")
    assert_eq!(
        creds.to_header_value().unwrap(),
        "Basic dGVzdHVzZXI6dGVzdHBhc3M="
    );
}

#[test]
fn test_credentials_from_pair_empty_username_is_anonymous() {
    assert_eq!(Credentials::from_pair("", "ignored"), Credentials::Anonymous);
}

#[test]
fn test_credentials_from_pair_with_username() {
    let creds = Credentials::from_pair("admin", "");
    assert_eq!(creds.username(), Some("admin"));
    assert!(creds.to_header_value().unwrap().starts_with("Basic "));
}

#[test]
fn test_credentials_debug_redacts_password() {
    let creds = Credentials::basic("admin", "hunter2");
    let debug = format!("{:?}", creds);
    assert!(debug.contains("admin"));
    assert!(!debug.contains("hunter2"));
}

#[test]
fn test_credentials_default_is_anonymous() {
    assert_eq!(Credentials::default(), Credentials::Anonymous);
}
