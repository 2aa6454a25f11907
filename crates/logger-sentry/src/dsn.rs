//! DSN parsing

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Client identifier sent in the auth header
pub(crate) const CLIENT_NAME: &str = concat!("hooklog-sentry/", env!("CARGO_PKG_VERSION"));

/// Connection descriptor of an error-tracking project:
/// `https://<public_key>[:<secret>]@<host>[:<port>][/<prefix>]/<project_id>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    scheme: String,
    public_key: String,
    secret_key: Option<String>,
    host: String,
    port: Option<u16>,
    path_prefix: String,
    project_id: String,
}

impl Dsn {
    /// Public key
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Secret key, for DSNs that still carry one
    pub fn secret_key(&self) -> Option<&str> {
        self.secret_key.as_deref()
    }

    /// Host name
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Project identifier
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn origin(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{port}", self.scheme, self.host),
            None => format!("{}://{}", self.scheme, self.host),
        }
    }

    /// Endpoint events are posted to
    pub fn store_url(&self) -> Result<Url> {
        let raw = format!(
            "{}{}/api/{}/store/",
            self.origin(),
            self.path_prefix,
            self.project_id
        );
        Ok(Url::parse(&raw)?)
    }

    /// Value of the `X-Sentry-Auth` header at `timestamp` (Unix seconds)
    pub fn auth_header(&self, timestamp: i64) -> String {
        let mut header = format!(
            "Sentry sentry_version=7, sentry_client={CLIENT_NAME}, sentry_timestamp={timestamp}, sentry_key={}",
            self.public_key
        );
        if let Some(secret) = &self.secret_key {
            header.push_str(", sentry_secret=");
            header.push_str(secret);
        }
        header
    }
}

impl FromStr for Dsn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let url = Url::parse(s)?;

        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(Error::InvalidDsn(format!("unsupported scheme {scheme:?}")));
        }

        let public_key = url.username();
        if public_key.is_empty() {
            return Err(Error::InvalidDsn("missing public key".into()));
        }

        let host = url
            .host_str()
            .ok_or_else(|| Error::InvalidDsn("missing host".into()))?;

        let path = url.path().trim_end_matches('/');
        let (prefix, project_id) = path.rsplit_once('/').unwrap_or(("", path));
        if project_id.is_empty() {
            return Err(Error::InvalidDsn("missing project id".into()));
        }

        Ok(Self {
            scheme: scheme.to_string(),
            public_key: public_key.to_string(),
            secret_key: url.password().map(str::to_string),
            host: host.to_string(),
            port: url.port(),
            path_prefix: prefix.to_string(),
            project_id: project_id.to_string(),
        })
    }
}

impl fmt::Display for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.public_key)?;
        if let Some(secret) = &self.secret_key {
            write!(f, ":{secret}")?;
        }
        write!(f, "@{}", self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        write!(f, "{}/{}", self.path_prefix, self.project_id)
    }
}
