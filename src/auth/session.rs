use std::collections::BTreeMap;

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use time::OffsetDateTime;
use tracing::debug;

use super::SESSION_COOKIE;

/// Cookie-backed session
/// All values live in one signed cookie, nothing is kept server side
pub struct Session {
    jar: SignedCookieJar,
    values: BTreeMap<String, String>,
    expires_at: Option<OffsetDateTime>,
}

impl Session {
    /// Read the session from the request cookies
    /// A missing, tampered or undecodable cookie gives an empty session
    pub fn load(jar: SignedCookieJar) -> Self {
        let values = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| decode_values(cookie.value()))
            .unwrap_or_default();

        Self {
            jar,
            values,
            expires_at: None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_owned(), value.into());
    }

    /// Make the cookie expire at a given instant instead of with the browser session
    pub fn expire_at(&mut self, expires_at: OffsetDateTime) {
        self.expires_at = Some(expires_at);
    }

    /// Write the session back into the jar
    /// The returned jar emits the `Set-Cookie` header when used in a response
    pub fn commit(self, secure: bool) -> SignedCookieJar {
        let mut cookie = Cookie::build((SESSION_COOKIE, encode_values(&self.values)))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(secure);

        if let Some(expires_at) = self.expires_at {
            cookie = cookie.expires(expires_at);
        }

        self.jar.add(cookie)
    }
}

fn encode_values(values: &BTreeMap<String, String>) -> String {
    // Serializing a map of strings cannot fail
    let json = serde_json::to_vec(values).unwrap_or_default();

    URL_SAFE_NO_PAD.encode(json)
}

fn decode_values(raw: &str) -> Option<BTreeMap<String, String>> {
    let json = URL_SAFE_NO_PAD
        .decode(raw)
        .map_err(|error| debug!("Session cookie is not base64 -> {}", error))
        .ok()?;

    serde_json::from_slice(&json)
        .map_err(|error| debug!("Session cookie is not a map -> {}", error))
        .ok()
}

#[cfg(test)]
mod tests {
    use axum_extra::extract::cookie::Key;

    use super::*;

    #[test]
    fn fresh_jar_gives_empty_session() {
        let session = Session::load(SignedCookieJar::new(Key::generate()));

        assert_eq!(session.get("customerAccessToken"), None);
    }

    #[test]
    fn committed_values_are_read_back() {
        let key = Key::generate();
        let mut session = Session::load(SignedCookieJar::new(key));
        session.set("customerAccessToken", "abc123");

        let jar = session.commit(true);
        let cookie = jar.get(SESSION_COOKIE).unwrap();
        assert_eq!(cookie.http_only(), Some(true));

        let reloaded = Session::load(jar);
        assert_eq!(reloaded.get("customerAccessToken"), Some("abc123"));
    }

    #[test]
    fn garbage_cookie_value_is_ignored() {
        let jar = SignedCookieJar::new(Key::generate()).add(Cookie::new(SESSION_COOKIE, "%%%"));

        let session = Session::load(jar);

        assert_eq!(session.get("customerAccessToken"), None);
    }

    #[test]
    fn expiry_is_applied_on_commit() {
        let mut session = Session::load(SignedCookieJar::new(Key::generate()));
        let expires_at = OffsetDateTime::from_unix_timestamp(1_900_000_000).unwrap();
        session.set("customerAccessToken", "abc123");
        session.expire_at(expires_at);

        let cookie = session.commit(false).get(SESSION_COOKIE).unwrap();

        assert_eq!(cookie.expires_datetime(), Some(expires_at));
        assert_eq!(cookie.secure(), Some(false));
    }
}
