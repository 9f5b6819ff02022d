use base64::{engine::general_purpose::STANDARD, Engine as _};

const BASIC_PREFIX: &str = "Basic ";

/// Email and password decoded from an `Authorization: Basic ...` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    /// Everything before the first `:`.
    pub email: String,
    /// Everything after the first `:`, which may itself contain colons.
    pub password: String,
}

impl BasicCredentials {
    /// Parse a full header value. `None` if any step fails.
    pub fn from_header(header: &str) -> Option<Self> {
        let encoded = extract_base64_authorization_header(header)?;
        let decoded = decode_base64_authorization_header(encoded)?;
        extract_user_credentials(&decoded)
    }
}

/// The base64 part of a `Basic` header, or `None` for any other scheme.
pub fn extract_base64_authorization_header(header: &str) -> Option<&str> {
    header.strip_prefix(BASIC_PREFIX)
}

/// Decode base64 into a UTF-8 string. Invalid base64 or UTF-8 yields `None`.
pub fn decode_base64_authorization_header(encoded: &str) -> Option<String> {
    let bytes = STANDARD.decode(encoded.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

/// Split `email:password` at the first colon.
pub fn extract_user_credentials(decoded: &str) -> Option<BasicCredentials> {
    let (email, password) = decoded.split_once(':')?;
    Some(BasicCredentials {
        email: email.to_string(),
        password: password.to_string(),
    })
}
