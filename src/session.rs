use axum::http::HeaderMap;
use base64::{Engine, engine::general_purpose};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const AUTH_COOKIE: &str = "auth";

/// Who a request acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    User(String),
    Anonymous,
}

impl Principal {
    /// Resolve the principal from the signed `auth` cookie.
    pub fn from_headers(headers: &HeaderMap, secret: &str) -> Self {
        get_authenticated_user(headers, secret)
            .map(Principal::User)
            .unwrap_or(Principal::Anonymous)
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Principal::User(username) => Some(username),
            Principal::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::User(_))
    }
}

pub fn create_signed_cookie(secret: &str, value: &str) -> Result<String, String> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "Invalid secret key")?;
    mac.update(value.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);
    Ok(format!("{}:{}", value, signature_b64))
}

/// Returns the signed value when the signature checks out.
pub fn verify_signed_cookie<'a>(secret: &str, signed_value: &'a str) -> Option<&'a str> {
    let (value, signature_b64) = signed_value.rsplit_once(':')?;
    let signature = general_purpose::URL_SAFE_NO_PAD.decode(signature_b64).ok()?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(value.as_bytes());
    mac.verify_slice(&signature).ok()?;
    Some(value)
}

pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all("cookie")
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|header| header.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key.trim() == name).then(|| value.trim().to_string())
        })
}

/// Check if the user is authenticated and return their username
pub fn get_authenticated_user(headers: &HeaderMap, secret: &str) -> Option<String> {
    let signed_value = get_cookie_value(headers, AUTH_COOKIE)?;
    verify_signed_cookie(secret, &signed_value)
        .filter(|username| !username.is_empty())
        .map(str::to_string)
}

/// `auth=...` cookie pair for a user, as a client would send it.
pub fn auth_cookie_pair(secret: &str, username: &str) -> Result<String, String> {
    create_signed_cookie(secret, username).map(|signed| format!("{}={}", AUTH_COOKIE, signed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_signed_cookie_round_trip() {
        let signed = create_signed_cookie("secret", "alice").unwrap();
        assert_eq!(verify_signed_cookie("secret", &signed), Some("alice"));
        assert_eq!(verify_signed_cookie("other-secret", &signed), None);
        assert_eq!(verify_signed_cookie("secret", "alice:forged"), None);
        assert_eq!(verify_signed_cookie("secret", "no-signature"), None);
    }

    #[test]
    fn test_get_cookie_value() {
        let headers = headers_with_cookie("theme=dark; liked_images=%5B1%5D ;auth=x");
        assert_eq!(
            get_cookie_value(&headers, "liked_images").as_deref(),
            Some("%5B1%5D")
        );
        assert_eq!(get_cookie_value(&headers, "auth").as_deref(), Some("x"));
        assert_eq!(get_cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_principal_from_headers() {
        let pair = auth_cookie_pair("secret", "bob").unwrap();
        let headers = headers_with_cookie(&format!("other=1; {}", pair));
        assert_eq!(
            Principal::from_headers(&headers, "secret"),
            Principal::User("bob".to_string())
        );
        assert_eq!(
            Principal::from_headers(&headers, "wrong"),
            Principal::Anonymous
        );
        assert_eq!(
            Principal::from_headers(&HeaderMap::new(), "secret"),
            Principal::Anonymous
        );
    }
}
