use backend_lib::auth::{hash_password, password_problems, validate_password_strength, verify_password, PasswordRequirements};

#[test]
fn test_password_hashing_and_verification() {
    let password = "SecureP@ssw0rd";
    let hash = hash_password(password, 4).unwrap();

    assert_ne!(password, hash);
    assert!(hash.starts_with("$scrypt$"));
    assert!(verify_password(&hash, password));
    assert!(!verify_password(&hash, "SecureP@ssw0rD"));
}

#[test]
fn test_password_strength_validation() {
    let requirements = PasswordRequirements::default();

    // Valid password
    assert!(validate_password_strength("SecureP@ssw0rd", &requirements));

    // Too short
    assert!(!validate_password_strength("Short1!", &requirements));

    // Missing uppercase
    assert!(!validate_password_strength("securep@ssw0rd", &requirements));

    // Missing lowercase
    assert!(!validate_password_strength("SECUREP@SSW0RD", &requirements));

    // Missing digit
    assert!(!validate_password_strength("SecureP@ssword", &requirements));

    // Missing special character
    assert!(!validate_password_strength("SecurePassw0rd", &requirements));

    // Custom requirements
    let custom_requirements = PasswordRequirements {
        require_uppercase: false,
        require_special: false,
        ..PasswordRequirements::default()
    };
    assert!(validate_password_strength("securepassw0rd", &custom_requirements));
}

#[test]
fn test_every_broken_rule_is_reported() {
    let problems = password_problems("abc", &PasswordRequirements::default());
    assert_eq!(problems.len(), 4);
    assert!(problems[0].contains("at least 8 characters"));
}
