// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Starting points for discovery.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::HintError;

/// What the user told us about their server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hint {
    /// An `http` or `https` URL.
    Url(Url),
    /// An email address, used for its domain.
    Email(String),
}

impl Hint {
    /// Interprets user input as a URL, a bare host name or an email address.
    ///
    /// Host names without a scheme are taken as `https://host/`, `mailto:` is stripped from
    /// email addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, uses a scheme other than `http(s)`, or is an email
    /// address without a domain.
    pub fn parse(input: &str) -> Result<Self, HintError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(HintError::Empty);
        }

        if let Some(email) = strip_prefix_ignore_case(input, "mailto:") {
            return Self::email(email);
        }

        if input.contains("://") {
            let url = Url::parse(input)?;
            return Self::from_url(url);
        }

        if input.contains('@') && !input.contains('/') {
            return Self::email(input);
        }

        Self::from_url(Url::parse(&format!("https://{input}"))?)
    }

    /// Wraps an already parsed URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheme is not `http(s)` or the URL has no host.
    pub fn from_url(url: Url) -> Result<Self, HintError> {
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(HintError::UnsupportedScheme(other.to_string())),
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(HintError::MissingHost);
        }
        Ok(Self::Url(url))
    }

    fn email(email: &str) -> Result<Self, HintError> {
        match email.rsplit_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self::Email(email.to_string()))
            }
            _ => Err(HintError::InvalidEmail(email.to_string())),
        }
    }

    /// The hint as a URL, if it is one.
    #[must_use]
    pub const fn url(&self) -> Option<&Url> {
        match self {
            Self::Url(url) => Some(url),
            Self::Email(_) => None,
        }
    }

    /// The hint as an `https` URL, if it is one.
    #[must_use]
    pub fn https_url(&self) -> Option<&Url> {
        self.url().filter(|url| url.scheme() == "https")
    }

    /// Domain for DNS-based discovery: the host of an `https` hint or the domain of an email.
    #[must_use]
    pub fn dns_domain(&self) -> Option<String> {
        match self {
            Self::Url(_) => self
                .https_url()
                .and_then(Url::host_str)
                .map(|host| host.to_lowercase()),
            Self::Email(email) => email
                .rsplit_once('@')
                .map(|(_, domain)| domain.to_lowercase()),
        }
    }

    /// Initial account name suggestion.
    ///
    /// The email address itself, or `user@host` / `host` for URLs.
    #[must_use]
    pub fn account_name(&self) -> String {
        match self {
            Self::Email(email) => email.clone(),
            Self::Url(url) => {
                let host = url.host_str().unwrap_or_default();
                if url.username().is_empty() {
                    host.to_string()
                } else {
                    format!("{}@{host}", url.username())
                }
            }
        }
    }
}

impl FromStr for Hint {
    type Err = HintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => url.fmt(f),
            Self::Email(email) => email.fmt(f),
        }
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| s.get(prefix.len()..))
        .flatten()
}
