//! Backend endpoint representation.
//!
//! # Responsibilities
//! - Parse configured base URLs into ready-to-use rewrite targets
//! - Hold the per-endpoint liveness flag and probe timestamp

use std::fmt;

use axum::http::uri::{Authority, Scheme};
use axum::http::Uri;
use thiserror::Error;
use tokio::time::Instant;
use url::Url;

/// Error constructing an endpoint from a configured URL.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The string is not an absolute URL.
    #[error("invalid endpoint URL {url:?}: {source}")]
    Parse {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Only plain HTTP upstreams are supported.
    #[error("endpoint URL {url:?}: only the http scheme is supported")]
    UnsupportedScheme { url: String },

    /// The URL has no host to dial.
    #[error("endpoint URL {url:?} has no host")]
    MissingHost { url: String },

    /// The URL parsed but its pieces do not form a request URI.
    #[error("endpoint URL {url:?} does not form a valid request URI: {source}")]
    Uri {
        url: String,
        #[source]
        source: axum::http::Error,
    },
}

/// Rewrite target derived from a configured base URL.
///
/// This is the immutable half of an endpoint: everything needed to point a
/// request at the backend (scheme, authority, base path, base query),
/// computed once at construction so the hot path only clones.
#[derive(Debug, Clone)]
pub struct Target {
    scheme: Scheme,
    authority: Authority,
    base_path: String,
    base_query: Option<String>,
    probe_uri: Uri,
}

impl Target {
    /// Parse a configured base URL into a target.
    pub fn parse(raw: &str) -> Result<Self, EndpointError> {
        let url = Url::parse(raw).map_err(|source| EndpointError::Parse {
            url: raw.to_string(),
            source,
        })?;

        if url.scheme() != "http" {
            return Err(EndpointError::UnsupportedScheme {
                url: raw.to_string(),
            });
        }

        let host = url.host_str().ok_or_else(|| EndpointError::MissingHost {
            url: raw.to_string(),
        })?;
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let authority =
            Authority::try_from(authority.as_str()).map_err(|source| EndpointError::Uri {
                url: raw.to_string(),
                source: source.into(),
            })?;

        let probe_path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        let probe_uri = Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(authority.clone())
            .path_and_query(probe_path)
            .build()
            .map_err(|source| EndpointError::Uri {
                url: raw.to_string(),
                source,
            })?;

        Ok(Self {
            scheme: Scheme::HTTP,
            authority,
            base_path: url.path().to_string(),
            base_query: url.query().map(str::to_string),
            probe_uri,
        })
    }

    /// Rewrite a request URI to point at this target.
    ///
    /// Single-host upstream semantics: scheme and authority are replaced,
    /// the base path joins the request path on exactly one slash, and the
    /// request query is appended after any base query.
    pub fn rewrite(&self, uri: &Uri) -> Result<Uri, axum::http::Error> {
        let path = single_joining_slash(&self.base_path, uri.path());
        let query = match (self.base_query.as_deref(), uri.query()) {
            (None, None) => None,
            (None, Some(q)) => Some(q.to_string()),
            (Some(bq), None) => Some(bq.to_string()),
            (Some(bq), Some(q)) => Some(format!("{bq}&{q}")),
        };
        let path_and_query = match query {
            Some(q) => format!("{path}?{q}"),
            None => path,
        };

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }

    /// URI probed by the health monitor: the bare base URL.
    pub fn probe_uri(&self) -> Uri {
        self.probe_uri.clone()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)?;
        if self.base_path != "/" {
            f.write_str(&self.base_path)?;
        }
        Ok(())
    }
}

fn single_joining_slash(a: &str, b: &str) -> String {
    match (a.ends_with('/'), b.starts_with('/')) {
        (true, true) => format!("{}{}", a, &b[1..]),
        (false, false) => format!("{}/{}", a, b),
        _ => format!("{}{}", a, b),
    }
}

/// One backend endpoint: immutable target plus mutable liveness state.
///
/// Endpoints start alive. The flag is owned by the registry lock; only the
/// health monitor and the all-dead reset write it.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub(crate) target: Target,
    pub(crate) alive: bool,
    pub(crate) last_checked: Instant,
}

impl Endpoint {
    pub(crate) fn new(target: Target) -> Self {
        Self {
            target,
            alive: true,
            last_checked: Instant::now(),
        }
    }
}
