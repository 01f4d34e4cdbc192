// Cookie-backed credential store
//
// Reads come from the inbound Cookie header; writes are queued as Set-Cookie
// headers and applied to the response. Expiry is left to the browser via Max-Age.

use std::collections::HashMap;
use std::convert::Infallible;
use std::time::Duration;

use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use axum::response::{IntoResponseParts, ResponseParts};

use super::{CredentialName, CredentialStore};

/// SameSite attribute for credential cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Attributes written with every credential cookie
#[derive(Debug, Clone, PartialEq)]
pub struct CookiePolicy {
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            secure: false,
            http_only: true,
            same_site: SameSite::Lax,
        }
    }
}

/// Request-scoped credential store over HTTP cookies
#[derive(Debug, Clone)]
pub struct CookieJar {
    policy: CookiePolicy,
    /// Values sent by the browser with this request
    inbound: HashMap<String, String>,
    /// Writes made while handling this request; `None` marks a delete
    overrides: HashMap<CredentialName, Option<String>>,
    /// Queued Set-Cookie header values, in write order
    outbound: Vec<HeaderValue>,
}

impl CookieJar {
    /// Build a jar from the request's Cookie headers
    pub fn from_headers(headers: &HeaderMap, policy: CookiePolicy) -> Self {
        let mut inbound = HashMap::new();
        for raw in headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
        {
            for (name, value) in parse_cookie_pairs(raw) {
                inbound.entry(name).or_insert(value);
            }
        }

        Self {
            policy,
            inbound,
            overrides: HashMap::new(),
            outbound: Vec::new(),
        }
    }

    /// An empty jar, as seen by a client without cookies
    pub fn empty(policy: CookiePolicy) -> Self {
        Self::from_headers(&HeaderMap::new(), policy)
    }

    /// Set-Cookie values queued so far
    pub fn pending(&self) -> &[HeaderValue] {
        &self.outbound
    }

    fn render(&self, name: CredentialName, value: &str, max_age: u64) -> String {
        let mut cookie = format!(
            "{}={}; Path={}; Max-Age={}; SameSite={}",
            name.cookie_name(),
            value,
            self.policy.path,
            max_age,
            self.policy.same_site.as_str()
        );
        if self.policy.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.policy.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    fn queue(&mut self, cookie: String) -> bool {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                self.outbound.push(value);
                true
            }
            Err(e) => {
                tracing::warn!("Dropping unencodable Set-Cookie header: {}", e);
                false
            }
        }
    }
}

impl CredentialStore for CookieJar {
    fn get(&self, name: CredentialName) -> Option<String> {
        if let Some(written) = self.overrides.get(&name) {
            return written.clone();
        }
        self.inbound.get(name.cookie_name()).cloned()
    }

    fn set(&mut self, name: CredentialName, value: &str, ttl: Duration) {
        if !is_cookie_value(value) {
            tracing::warn!("Refusing to store {} with characters not allowed in a cookie", name);
            return;
        }
        let cookie = self.render(name, value, ttl.as_secs());
        if self.queue(cookie) {
            self.overrides.insert(name, Some(value.to_string()));
        }
    }

    fn delete(&mut self, name: CredentialName) {
        let cookie = self.render(name, "", 0);
        self.queue(cookie);
        self.overrides.insert(name, None);
    }
}

impl IntoResponseParts for CookieJar {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        for value in self.outbound {
            res.headers_mut().append(SET_COOKIE, value);
        }
        Ok(res)
    }
}

/// Split a Cookie header into name/value pairs. Empty values are skipped.
fn parse_cookie_pairs(raw: &str) -> impl Iterator<Item = (String, String)> + '_ {
    raw.split(';').filter_map(|entry| {
        let mut parts = entry.splitn(2, '=');
        let name = parts.next().map(str::trim)?;
        let value = parts.next().map(str::trim)?.trim_matches('"');
        if name.is_empty() || value.is_empty() {
            return None;
        }
        Some((name.to_string(), value.to_string()))
    })
}

/// RFC 6265 cookie-octet check
fn is_cookie_value(value: &str) -> bool {
    !value.is_empty()
        && value.bytes().all(|b| {
            matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
        })
}
