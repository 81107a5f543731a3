//! Gemini request handling.
//!
//! A gemini request is a single absolute URL terminated by CRLF. [`Request`]
//! keeps the line exactly as received next to its parsed [`Url`], so the url
//! can always be derived again from the raw text.

use std::str::FromStr;

use url::Url;

use crate::protocol::ParseError;

pub(crate) const TERMINATOR: &str = "\r\n";

/// An immutable gemini request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    raw: String,
    url: Url,
}

impl Request {
    /// Parses a request line. The trailing CRLF is optional, and kept in
    /// [`raw`](Self::raw) when present.
    pub fn parse<S: Into<String>>(raw: S) -> Result<Self, ParseError> {
        let raw = raw.into();
        let line = raw.strip_suffix(TERMINATOR).unwrap_or(&raw);
        let url = Url::parse(line).map_err(ParseError::invalid_url)?;
        Ok(Self { raw, url })
    }

    /// The request line as received, terminator included.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    /// The url path, `/` when the url has none.
    pub fn path(&self) -> &str {
        match self.url.path() {
            "" => "/",
            path => path,
        }
    }

    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }
}

impl FromStr for Request {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Request::parse(s)
    }
}
