//! Shared-secret check for schedule requests.

use axum::http::HeaderMap;
use std::collections::HashMap;

/// Verify the configured shared secret against the `x-webhook-secret`
/// header or the `secret` query parameter.
///
/// No configured secret disables the check entirely. The error string is
/// the reason reported in the 401 body.
pub fn verify_secret(
    configured: Option<&str>,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> Result<(), String> {
    let Some(expected) = configured else {
        return Ok(());
    };

    let supplied = headers
        .get("x-webhook-secret")
        .and_then(|v| v.to_str().ok())
        .or_else(|| query.get("secret").map(String::as_str));

    match supplied {
        Some(s) if s == expected => Ok(()),
        Some(_) => Err("secret mismatch".to_string()),
        None => Err("missing secret".to_string()),
    }
}
