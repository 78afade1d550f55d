// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

/// Errors raised by a single `WebDAV` interaction.
///
/// None of these escape [`crate::Discovery::discover`]; they are logged and turned into negative
/// results at the step that observed them.
#[non_exhaustive]
#[derive(Debug)]
pub enum DavError {
    /// Transport layer error (connection refused, timeout, TLS).
    Http(String),

    /// The server rejected the credentials (HTTP 401).
    Unauthorized,

    /// The server answered with an unexpected status.
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// XML parsing/writing error.
    Xml(String),

    /// A URL could not be built or resolved.
    InvalidUrl(String),

    /// Invalid response from server.
    InvalidResponse(String),

    /// Configuration error.
    Config(String),
}

impl DavError {
    /// Whether this error means the credentials were rejected.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

impl fmt::Display for DavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "HTTP error: {e}"),
            Self::Unauthorized => write!(f, "Authentication failed: 401 Unauthorized"),
            Self::Status { status, body } if body.is_empty() => {
                write!(f, "Unexpected status {status}")
            }
            Self::Status { status, body } => write!(f, "Unexpected status {status}: {body}"),
            Self::Xml(e) => write!(f, "XML error: {e}"),
            Self::InvalidUrl(e) => write!(f, "Invalid URL: {e}"),
            Self::InvalidResponse(e) => write!(f, "Invalid server response: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for DavError {}

impl From<reqwest::Error> for DavError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

impl From<quick_xml::Error> for DavError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e.to_string())
    }
}

impl From<std::io::Error> for DavError {
    fn from(e: std::io::Error) -> Self {
        Self::Xml(format!("IO error: {e}"))
    }
}

impl From<url::ParseError> for DavError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e.to_string())
    }
}

/// A DNS lookup failed for a reason other than the record being absent.
#[derive(Debug, thiserror::Error)]
#[error("DNS lookup for {name} failed: {reason}")]
pub struct DnsError {
    /// The record name that was queried.
    pub name: String,
    /// Resolver error message.
    pub reason: String,
}

/// The discovery run was cancelled before it completed.
///
/// This is the only error [`crate::Discovery::discover`] returns; no partial result survives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("discovery was cancelled")]
pub struct Cancelled;

/// The starting hint could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HintError {
    /// Nothing was given.
    #[error("the hint is empty")]
    Empty,

    /// The URL uses a scheme other than `http` or `https`.
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// The URL has no host to talk to.
    #[error("the URL has no host")]
    MissingHost,

    /// The email address has no usable domain part.
    #[error("the email address has no domain: {0}")]
    InvalidEmail(String),

    /// The input is not a valid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
