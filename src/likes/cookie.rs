use super::LikedSet;
use crate::gallery::ImageId;
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Decode the browser-held liked set.
///
/// The cookie is a URL-encoded JSON array of ids. Numeric strings are accepted;
/// anything malformed yields an empty set.
pub fn parse_client_set(raw: &str) -> LikedSet {
    let decoded = match urlencoding::decode(raw) {
        Ok(decoded) => decoded,
        Err(e) => {
            debug!("Liked images cookie is not valid UTF-8: {}", e);
            return LikedSet::new();
        }
    };

    let values: Vec<serde_json::Value> = match serde_json::from_str(&decoded) {
        Ok(values) => values,
        Err(e) => {
            debug!("Ignoring malformed liked images cookie: {}", e);
            return LikedSet::new();
        }
    };

    values
        .iter()
        .filter_map(|value| match value {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .map(ImageId)
        .filter(ImageId::is_valid)
        .collect()
}

pub fn encode_client_set(liked: &LikedSet) -> String {
    let ids: Vec<i64> = liked.iter().map(|id| id.0).collect();
    let json = serde_json::to_string(&ids).unwrap_or_else(|_| "[]".to_string());
    urlencoding::encode(&json).into_owned()
}

/// Browsers cap cookie lifetimes at 400 days; longer configured ages are clamped.
pub const MAX_COOKIE_AGE_DAYS: u64 = 400;

/// `Set-Cookie` value mirroring `liked` in the browser. Not `HttpOnly`: page scripts keep it current.
pub fn client_cookie(name: &str, liked: &LikedSet, max_age_days: u64) -> String {
    let max_age = Duration::from_secs(max_age_days.min(MAX_COOKIE_AGE_DAYS) * 24 * 60 * 60);
    let expires = httpdate::fmt_http_date(SystemTime::now() + max_age);

    format!(
        "{}={}; Path=/; Max-Age={}; Expires={}; SameSite=Lax",
        name,
        encode_client_set(liked),
        max_age.as_secs(),
        expires
    )
}
