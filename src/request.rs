//! Pre-parsed inbound request and source-address resolution.
//!
//! The transport layer owns HTTP parsing; it hands the dispatcher an
//! [`AdminRequest`] that stays immutable for the whole dispatch.

use http::Method;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header/cookie storage.
///
/// Names are `Arc<str>` since the same few names repeat across requests.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Header carrying the client address as asserted through a reverse proxy
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Strongly typed request identifier backed by ULID.
///
/// Used only for log correlation; never written into a response.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(pub ulid::Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RequestId(ulid::Ulid::from_string(s)?))
    }
}

/// A query/body parameter: one value, or several for `key[]`/repeated keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    Multi(Vec<String>),
}

impl ParamValue {
    /// The single value, or the last one of a multi-valued parameter
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Single(s) => Some(s.as_str()),
            ParamValue::Multi(values) => values.last().map(String::as_str),
        }
    }

    /// All values in order
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match self {
            ParamValue::Single(s) => vec![s.as_str()],
            ParamValue::Multi(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// Inbound request as handed over by the transport layer.
#[derive(Debug, Clone)]
pub struct AdminRequest {
    /// Correlation id for logs
    pub request_id: RequestId,
    /// HTTP method
    pub method: Method,
    /// Path relative to the controller mount point, without query string
    pub path: String,
    /// Query and form parameters
    pub params: HashMap<String, ParamValue>,
    /// Transport-layer peer address
    pub remote_addr: IpAddr,
    /// Raw request headers (names as received)
    pub headers: HeaderVec,
    /// Cookies parsed from the `Cookie` header
    pub cookies: HeaderVec,
}

impl AdminRequest {
    /// A request for `path` from `remote_addr`, with no headers.
    ///
    /// A query string on `path` is split off into `params`.
    #[must_use]
    pub fn new(method: Method, path: &str, remote_addr: IpAddr) -> Self {
        let (path, params) = match path.split_once('?') {
            Some((p, query)) => (p.to_string(), parse_query_params(query)),
            None => (path.to_string(), HashMap::new()),
        };
        Self {
            request_id: RequestId::new(),
            method,
            path,
            params,
            remote_addr,
            headers: HeaderVec::new(),
            cookies: HeaderVec::new(),
        }
    }

    /// Add a header. A `Cookie` header is also parsed into `cookies`.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if name.eq_ignore_ascii_case("cookie") {
            self.cookies.extend(parse_cookies(value));
        }
        self.headers.push((Arc::from(name), value.to_string()));
        self
    }

    /// Add or replace a parameter.
    #[must_use]
    pub fn with_param(mut self, name: &str, value: ParamValue) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a cookie by name
    #[inline]
    #[must_use]
    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a parameter's (last) value by name
    #[inline]
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(ParamValue::as_str)
    }
}

/// Choose the address the origin gate judges.
///
/// With `trust_reverse_proxy` the client-asserted `X-Forwarded-For` value is
/// used verbatim (empty when the header is absent); otherwise the transport
/// address. No validation either way: trusting the proxy is the deployer's call.
#[must_use]
pub fn resolve_client_ip(request: &AdminRequest, trust_reverse_proxy: bool) -> String {
    if trust_reverse_proxy {
        request
            .get_header(FORWARDED_FOR_HEADER)
            .unwrap_or_default()
            .to_string()
    } else {
        request.remote_addr.to_string()
    }
}

/// Parse a `Cookie` header value into name/value pairs.
#[must_use]
pub fn parse_cookies(header: &str) -> HeaderVec {
    header
        .split(';')
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let value = parts.next().unwrap_or("").trim().to_string();
            Some((Arc::from(name), value))
        })
        .collect()
}

/// Parse a URL-encoded query string.
///
/// Repeated keys and `key[]` keys collect into [`ParamValue::Multi`]; the
/// `[]` suffix is stripped from the stored name.
#[must_use]
pub fn parse_query_params(query: &str) -> HashMap<String, ParamValue> {
    let mut params: HashMap<String, ParamValue> = HashMap::new();
    for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
        let (name, is_array) = match k.strip_suffix("[]") {
            Some(stripped) => (stripped.to_string(), true),
            None => (k.to_string(), false),
        };
        let value = v.to_string();
        match params.remove(&name) {
            None if is_array => {
                params.insert(name, ParamValue::Multi(vec![value]));
            }
            None => {
                params.insert(name, ParamValue::Single(value));
            }
            Some(ParamValue::Single(prev)) => {
                params.insert(name, ParamValue::Multi(vec![prev, value]));
            }
            Some(ParamValue::Multi(mut values)) => {
                values.push(value);
                params.insert(name, ParamValue::Multi(values));
            }
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn localhost() -> IpAddr {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    }

    #[test]
    fn test_query_split_from_path() {
        let req = AdminRequest::new(Method::GET, "/hooks?id=7&tags[]=a&tags[]=b", localhost());
        assert_eq!(req.path, "/hooks");
        assert_eq!(req.get_param("id"), Some("7"));
        assert_eq!(
            req.params.get("tags"),
            Some(&ParamValue::Multi(vec!["a".to_string(), "b".to_string()]))
        );
    }

    #[test]
    fn test_repeated_key_becomes_multi() {
        let params = parse_query_params("limit=10&limit=20");
        assert_eq!(params["limit"].values(), vec!["10", "20"]);
        assert_eq!(params["limit"].as_str(), Some("20"));
    }

    #[test]
    fn test_cookie_header_parsed() {
        let req = AdminRequest::new(Method::GET, "/", localhost())
            .with_header("Cookie", "GATEHOUSE_SESSION=abc; theme=dark");
        assert_eq!(req.get_cookie("GATEHOUSE_SESSION"), Some("abc"));
        assert_eq!(req.get_cookie("theme"), Some("dark"));
        assert_eq!(req.get_header("cookie"), Some("GATEHOUSE_SESSION=abc; theme=dark"));
    }

    #[test]
    fn test_resolve_client_ip_transport() {
        let req = AdminRequest::new(Method::GET, "/", localhost())
            .with_header("X-Forwarded-For", "203.0.113.50");
        assert_eq!(resolve_client_ip(&req, false), "127.0.0.1");
    }

    #[test]
    fn test_resolve_client_ip_forwarded_is_verbatim() {
        let req = AdminRequest::new(Method::GET, "/", localhost())
            .with_header("X-Forwarded-For", "203.0.113.50, 10.0.0.1");
        assert_eq!(resolve_client_ip(&req, true), "203.0.113.50, 10.0.0.1");
        let bare = AdminRequest::new(Method::GET, "/", localhost());
        assert_eq!(resolve_client_ip(&bare, true), "");
    }

    #[test]
    fn test_request_id_roundtrips_through_display() {
        let id = RequestId::new();
        let parsed: RequestId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
