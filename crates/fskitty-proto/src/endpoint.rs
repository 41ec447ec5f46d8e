//! Backend addresses.
//!
//! Accepted forms:
//!
//! - `host:port`
//! - `vfs://host[:port]` and `tcp://host[:port]` (port defaults to [`DEFAULT_PORT`])
//! - `unix:///absolute/path/to/socket`

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::DEFAULT_PORT;

/// A parsed backend address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// TCP host and port. `host` may be a DNS name or an IP literal
    /// (IPv6 literals are kept without brackets).
    Tcp {
        /// Host name or IP address.
        host: String,
        /// TCP port.
        port: u16,
    },
    /// Unix domain socket path.
    Unix(PathBuf),
}

/// Why an address string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    /// Nothing to parse.
    #[error("address is empty")]
    Empty,
    /// The `scheme://` prefix is not one we speak.
    #[error("unsupported address scheme '{0}'")]
    UnsupportedScheme(String),
    /// No host between the scheme and the port.
    #[error("address '{0}' has no host")]
    MissingHost(String),
    /// A bare `host:port` address without the port.
    #[error("address '{0}' has no port")]
    MissingPort(String),
    /// The port is not a number in 1..=65535.
    #[error("invalid port in address '{0}'")]
    InvalidPort(String),
    /// A `unix://` address without an absolute path.
    #[error("unix socket address '{0}' must name an absolute path")]
    InvalidSocketPath(String),
}

impl Endpoint {
    /// Parses an address string.
    pub fn parse(address: &str) -> Result<Self, EndpointError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(EndpointError::Empty);
        }

        match address.split_once("://") {
            Some(("unix", path)) => {
                if !path.starts_with('/') {
                    return Err(EndpointError::InvalidSocketPath(address.to_string()));
                }
                Ok(Self::Unix(PathBuf::from(path)))
            }
            Some(("vfs" | "tcp", rest)) => {
                let rest = rest.trim_end_matches('/');
                parse_host_port(address, rest, Some(DEFAULT_PORT))
            }
            Some((scheme, _)) => Err(EndpointError::UnsupportedScheme(scheme.to_string())),
            None => parse_host_port(address, address, None),
        }
    }

    /// Returns the `host:port` string suitable for `TcpStream::connect`, if this is TCP.
    pub fn socket_addr_string(&self) -> Option<String> {
        match self {
            Self::Tcp { host, port } if host.contains(':') => Some(format!("[{host}]:{port}")),
            Self::Tcp { host, port } => Some(format!("{host}:{port}")),
            Self::Unix(_) => None,
        }
    }
}

fn parse_host_port(
    original: &str,
    authority: &str,
    default_port: Option<u16>,
) -> Result<Endpoint, EndpointError> {
    // Bracketed IPv6 literal: [::1]:port
    let (host, port) = if let Some(rest) = authority.strip_prefix('[') {
        let (host, after) = rest
            .split_once(']')
            .ok_or_else(|| EndpointError::MissingHost(original.to_string()))?;
        let port = match after.strip_prefix(':') {
            Some(port) => Some(port),
            None if after.is_empty() => None,
            None => return Err(EndpointError::InvalidPort(original.to_string())),
        };
        (host, port)
    } else {
        match authority.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (authority, None),
        }
    };

    if host.is_empty() {
        return Err(EndpointError::MissingHost(original.to_string()));
    }

    let port = match (port, default_port) {
        (Some(port), _) => port
            .parse::<u16>()
            .ok()
            .filter(|port| *port != 0)
            .ok_or_else(|| EndpointError::InvalidPort(original.to_string()))?,
        (None, Some(default)) => default,
        (None, None) => return Err(EndpointError::MissingPort(original.to_string())),
    };

    Ok(Endpoint::Tcp {
        host: host.to_string(),
        port,
    })
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp { .. } => {
                let addr = self.socket_addr_string().unwrap_or_default();
                write!(f, "tcp://{addr}")
            }
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}
