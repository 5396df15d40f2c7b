// ==== tests/unit/password_tests.rs ====
//! Password hashing through the public hasher API.

use authd_backend_lib::auth::PasswordHasher;
use authd_backend_lib::config::PasswordSettings;

fn hasher() -> PasswordHasher {
    PasswordHasher::new(4).expect("Failed to create hasher")
}

#[test]
fn test_hash_and_verify() {
    let hasher = hasher();
    let hash = hasher.hash("wonderland").expect("Failed to hash");

    assert!(hash.starts_with("$scrypt$"));
    assert!(!hash.contains("wonderland"));
    assert!(hasher.verify("wonderland", &hash));
    assert!(!hasher.verify("Wonderland", &hash));
    assert!(!hasher.verify("", &hash));
}

#[test]
fn test_salts_differ() {
    let hasher = hasher();
    let a = hasher.hash("same-password").expect("Failed to hash");
    let b = hasher.hash("same-password").expect("Failed to hash");
    assert_ne!(a, b);
    assert!(hasher.verify("same-password", &a));
    assert!(hasher.verify("same-password", &b));
}

#[test]
fn test_garbage_hash_never_verifies() {
    let hasher = hasher();
    assert!(!hasher.verify("anything", "not-a-phc-string"));
    assert!(!hasher.verify("anything", ""));
}

#[test]
fn test_hash_secure_clears_input() {
    let hasher = hasher();
    let mut plain = String::from("zeroize-me");
    let hash = hasher.hash_secure(&mut plain).expect("Failed to hash");
    assert!(plain.is_empty());
    assert!(hasher.verify("zeroize-me", &hash));
}

#[test]
fn test_hash_verifies_across_instances() {
    let settings = PasswordSettings {
        hash_cost: 4,
        ..PasswordSettings::default()
    };
    let a = PasswordHasher::from_settings(&settings).expect("Failed to create hasher");
    let hash = a.hash("portable").expect("Failed to hash");

    // Parameters travel inside the PHC string, so a hasher with a different
    // cost still verifies it.
    let b = PasswordHasher::new(5).expect("Failed to create hasher");
    assert!(b.verify("portable", &hash));
}
