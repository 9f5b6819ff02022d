#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Regression tests for warden-security: Basic headers, password hashing,
//! path exclusion and log redaction working together.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use warden_security::{
    filter_datum, hash_password, require_auth, verify_password, BasicCredentials, Redactor,
    PII_FIELDS,
};

// --- Basic credentials ---

#[test]
fn test_basic_header_checks_against_stored_hash() {
    let stored = hash_password("H0lberton School 98!").unwrap();
    let header = format!("Basic {}", STANDARD.encode("bob@hbtn.io:H0lberton School 98!"));

    let creds = BasicCredentials::from_header(&header).unwrap();
    assert_eq!(creds.email, "bob@hbtn.io");
    assert!(verify_password(&creds.password, &stored));
}

#[test]
fn test_basic_header_rejects_other_schemes_and_garbage() {
    for header in ["Bearer abc", "Basic", "Basic !!!", "basic Ym9iOnB3"] {
        assert!(BasicCredentials::from_header(header).is_none(), "{header}");
    }
}

// --- require_auth ---

#[test]
fn test_require_auth_table() {
    let excluded = ["/api/v1/status/", "/api/v1/auth_session/login/", "/api/v1/users*"];
    let cases = [
        ("/api/v1/status", false),
        ("/api/v1/status/", false),
        ("/api/v1/auth_session/login", false),
        ("/api/v1/users/me", false),
        ("/api/v1/usersXYZ", false),
        ("/api/v1/auth_session/logout", true),
        ("/api/v1/reset_password", true),
    ];
    for (path, expected) in cases {
        assert_eq!(require_auth(path, &excluded), expected, "{path}");
    }
}

// --- Redaction ---

#[test]
fn test_redaction_with_custom_separator() {
    let out = filter_datum(&["email", "ssn"], "XXX", "email=a@b.c|ssn=123|ip=1.2.3.4|", "|").unwrap();
    assert_eq!(out, "email=XXX|ssn=XXX|ip=1.2.3.4|");
}

#[test]
fn test_default_fields_cover_pii() {
    let redactor = Redactor::new(&PII_FIELDS, "***", ";").unwrap();
    let row = "name=Marlene Wood;email=hwestiii@att.net;phone=(473) 401-4253;ssn=261-72-6780;password=K5?BMNv;ip=60ed:c396:2ff:244:bbd0:9208:26f2:93ea;";
    let out = redactor.redact(row);
    assert_eq!(
        out,
        "name=***;email=***;phone=***;ssn=***;password=***;ip=60ed:c396:2ff:244:bbd0:9208:26f2:93ea;"
    );
}
