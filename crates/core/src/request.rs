//! Request and response snapshots exchanged between the controller,
//! the network and the partition storage.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::cache::hash::compute_entry_key;

/// Fetch-standard request mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RequestMode {
    /// Top-level document load.
    Navigate,
    SameOrigin,
    NoCors,
    #[default]
    Cors,
}

impl RequestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMode::Navigate => "navigate",
            RequestMode::SameOrigin => "same-origin",
            RequestMode::NoCors => "no-cors",
            RequestMode::Cors => "cors",
        }
    }
}

impl fmt::Display for RequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "navigate" => Ok(RequestMode::Navigate),
            "same-origin" => Ok(RequestMode::SameOrigin),
            "no-cors" => Ok(RequestMode::NoCors),
            "cors" => Ok(RequestMode::Cors),
            other => Err(crate::Error::InvalidInput(format!("unknown request mode: {other}"))),
        }
    }
}

/// Fetch-standard request destination, reduced to the values the
/// classifier distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Destination {
    Document,
    Style,
    Script,
    Image,
    Font,
    Manifest,
    /// The empty string destination (`fetch()` / XHR).
    #[default]
    Empty,
    Other,
}

impl Destination {
    /// Parse a destination string; anything unrecognised is `Other`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" => Destination::Document,
            "style" => Destination::Style,
            "script" => Destination::Script,
            "image" => Destination::Image,
            "font" => Destination::Font,
            "manifest" => Destination::Manifest,
            "" => Destination::Empty,
            _ => Destination::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Document => "document",
            Destination::Style => "style",
            Destination::Script => "script",
            Destination::Image => "image",
            Destination::Font => "font",
            Destination::Manifest => "manifest",
            Destination::Empty => "",
            Destination::Other => "other",
        }
    }

    /// Destinations served cache-first.
    pub fn is_static_asset(&self) -> bool {
        matches!(self, Destination::Style | Destination::Script | Destination::Image | Destination::Font)
    }
}

/// An intercepted request. The URL is already resolved against the origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
    pub destination: Destination,
}

impl Request {
    /// A plain `GET` as issued by `fetch()`.
    pub fn get(url: Url) -> Self {
        Self { method: "GET".into(), url, mode: RequestMode::Cors, destination: Destination::Empty }
    }

    /// A top-level document navigation.
    pub fn navigate(url: Url) -> Self {
        Self { method: "GET".into(), url, mode: RequestMode::Navigate, destination: Destination::Document }
    }

    /// A subresource load such as a script or stylesheet.
    pub fn asset(url: Url, destination: Destination) -> Self {
        Self { method: "GET".into(), url, mode: RequestMode::NoCors, destination }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into().to_ascii_uppercase();
        self
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    /// Exact-match cache key: method + URL.
    pub fn key(&self) -> String {
        compute_entry_key(&self.method, self.url.as_str())
    }
}

/// A captured response, headers included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Final URL the response was served from.
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { url: url.into(), status, headers: Vec::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// 2xx status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Complete 2xx responses are written back; partial content never is.
    pub fn is_cacheable(&self) -> bool {
        self.is_ok() && self.status != 206
    }

    /// Case-insensitive header lookup; first value wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse("https://safetrack.app").unwrap().join(path).unwrap()
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("navigate".parse::<RequestMode>().unwrap(), RequestMode::Navigate);
        assert_eq!("No-Cors".parse::<RequestMode>().unwrap(), RequestMode::NoCors);
        assert!("websocket".parse::<RequestMode>().is_err());
    }

    #[test]
    fn test_destination_parse() {
        assert_eq!(Destination::parse("script"), Destination::Script);
        assert_eq!(Destination::parse(""), Destination::Empty);
        assert_eq!(Destination::parse("audioworklet"), Destination::Other);
        assert!(Destination::Font.is_static_asset());
        assert!(!Destination::Manifest.is_static_asset());
    }

    #[test]
    fn test_key_depends_on_method_and_url() {
        let get = Request::get(url("/app.js"));
        let head = Request::get(url("/app.js")).with_method("head");
        let other = Request::get(url("/app.css"));
        assert_eq!(head.method, "HEAD");
        assert_ne!(get.key(), head.key());
        assert_ne!(get.key(), other.key());
    }

    #[test]
    fn test_key_ignores_mode_and_destination() {
        let nav = Request::navigate(url("/"));
        let plain = Request::get(url("/"));
        assert_eq!(nav.key(), plain.key());
    }

    #[test]
    fn test_response_header_lookup() {
        let response =
            Response::new("https://safetrack.app/app.js", 200, "x").with_header("Content-Type", "text/javascript");
        assert_eq!(response.content_type(), Some("text/javascript"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn test_response_status_classes() {
        assert!(Response::new("/", 204, "").is_ok());
        assert!(!Response::new("/", 404, "").is_ok());
        assert!(Response::new("/", 200, "").is_cacheable());
        assert!(!Response::new("/", 404, "").is_cacheable());
        assert!(!Response::new("/", 206, "").is_cacheable());
    }
}
