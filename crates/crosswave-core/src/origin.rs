//! Origins as security/isolation boundaries.
//!
//! An origin is the scheme + host + port triple of a browsing context.
//! Two documents share an origin only if all three components are equal.

use std::fmt;

use thiserror::Error;
use url::Url;

/// Errors raised when deriving an origin from a URL or string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OriginError {
    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("URL has no port and scheme '{0}' has no default")]
    MissingPort(String),

    #[error("not a valid origin: {0}")]
    Malformed(String),
}

/// A scheme + host + port triple identifying an isolation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    scheme: String,
    host: String,
    port: u16,
}

impl Origin {
    /// Derive the origin of a URL.
    ///
    /// The port is taken from the URL, falling back to the scheme default
    /// (80 for http, 443 for https).
    pub fn from_url(url: &Url) -> Result<Self, OriginError> {
        let host = url
            .host_str()
            .ok_or_else(|| OriginError::MissingHost(url.to_string()))?
            .to_ascii_lowercase();

        let port = url
            .port_or_known_default()
            .ok_or_else(|| OriginError::MissingPort(url.scheme().to_string()))?;

        Ok(Self {
            scheme: url.scheme().to_ascii_lowercase(),
            host,
            port,
        })
    }

    /// Parse an origin in `scheme://host:port` form.
    ///
    /// Used to reconstruct origins that crossed a serialization boundary.
    pub fn parse(s: &str) -> Result<Self, OriginError> {
        let url = Url::parse(s).map_err(|_| OriginError::Malformed(s.to_string()))?;
        if !url.path().is_empty() && url.path() != "/" {
            return Err(OriginError::Malformed(s.to_string()));
        }
        Self::from_url(&url)
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}
