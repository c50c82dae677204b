/// Session cookie helpers
///
/// The access token travels in an `HttpOnly` cookie named `accessToken`.
/// Outside production it is `SameSite=Lax` so a local frontend on another port
/// works over plain HTTP; in production it is `SameSite=None; Secure`.

use axum::http::{header, HeaderMap};

use super::jwt::ACCESS_TOKEN_TTL_SECONDS;

/// Name of the cookie carrying the access token
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

fn attributes(max_age: i64, production: bool) -> String {
    let same_site = if production {
        "SameSite=None; Secure"
    } else {
        "SameSite=Lax"
    };
    format!("HttpOnly; Path=/; Max-Age={}; {}", max_age, same_site)
}

/// `Set-Cookie` value that stores `token` for the token's lifetime
pub fn session_cookie(token: &str, production: bool) -> String {
    format!(
        "{}={}; {}",
        ACCESS_TOKEN_COOKIE,
        token,
        attributes(ACCESS_TOKEN_TTL_SECONDS, production)
    )
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie(production: bool) -> String {
    format!("{}=; {}", ACCESS_TOKEN_COOKIE, attributes(0, production))
}

/// Reads the access token from the request's `Cookie` headers
///
/// Empty values count as absent.
pub fn access_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == ACCESS_TOKEN_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(cookies: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for cookie in cookies {
            headers.append(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        headers
    }

    #[test]
    fn test_session_cookie_development() {
        assert_eq!(
            session_cookie("abc", false),
            "accessToken=abc; HttpOnly; Path=/; Max-Age=900; SameSite=Lax"
        );
    }

    #[test]
    fn test_session_cookie_production() {
        assert_eq!(
            session_cookie("abc", true),
            "accessToken=abc; HttpOnly; Path=/; Max-Age=900; SameSite=None; Secure"
        );
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        assert_eq!(
            clear_session_cookie(false),
            "accessToken=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax"
        );
    }

    #[test]
    fn test_reads_token_among_other_cookies() {
        let headers = headers_with(&["theme=dark; accessToken=tok.en.value; lang=en"]);
        assert_eq!(access_token(&headers).as_deref(), Some("tok.en.value"));
    }

    #[test]
    fn test_reads_token_from_second_header() {
        let headers = headers_with(&["theme=dark", "accessToken=xyz"]);
        assert_eq!(access_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_missing_or_empty_token() {
        assert_eq!(access_token(&HeaderMap::new()), None);
        assert_eq!(access_token(&headers_with(&["accessToken="])), None);
        assert_eq!(access_token(&headers_with(&["otherToken=abc"])), None);
    }
}
