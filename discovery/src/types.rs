// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Deref;

use url::Url;

use crate::request::Prop;

/// Resource href as sent by the server.
///
/// An `Href` is usually a path such as `/dav/calendars/user/`, but servers may also send
/// absolute URLs or `mailto:` URIs. Resolve it against the request URL before use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Href(String);

impl Href {
    /// Creates a new `Href` from a string.
    #[must_use]
    pub const fn new(href: String) -> Self {
        Self(href)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Href {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Href {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Href {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Href {
    fn from(href: String) -> Self {
        Self(href)
    }
}

impl From<&str> for Href {
    fn from(href: &str) -> Self {
        Self(href.to_string())
    }
}

/// The two services discovery looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    /// Contacts, RFC 6352.
    CardDav,
    /// Calendars, RFC 4791.
    CalDav,
}

impl ServiceType {
    /// Service name used in well-known paths and DNS labels.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CardDav => "carddav",
            Self::CalDav => "caldav",
        }
    }

    /// Token that must appear in the `DAV` header of a server offering this service.
    ///
    /// See RFC 4791 §5.1 and RFC 6352 §6.1.
    #[must_use]
    pub const fn capability(self) -> &'static str {
        match self {
            Self::CardDav => "addressbook",
            Self::CalDav => "calendar-access",
        }
    }

    /// `/.well-known/{service}` path, RFC 6764 §5.
    #[must_use]
    pub fn well_known_path(self) -> String {
        format!("/.well-known/{}", self.name())
    }

    /// Name of the SRV/TXT records of the TLS-secured service for `domain`.
    #[must_use]
    pub fn srv_name(self, domain: &str) -> String {
        format!("_{}s._tcp.{}", self.name(), domain.trim_end_matches('.'))
    }

    /// Kind of collection this service syncs.
    #[must_use]
    pub const fn collection_type(self) -> CollectionType {
        match self {
            Self::CardDav => CollectionType::AddressBook,
            Self::CalDav => CollectionType::Calendar,
        }
    }

    /// Home-set property of this service.
    #[must_use]
    pub const fn home_set_prop(self) -> Prop {
        match self {
            Self::CardDav => Prop::AddressbookHomeSet,
            Self::CalDav => Prop::CalendarHomeSet,
        }
    }

    /// Properties requested when scanning resources for this service.
    #[must_use]
    pub fn scan_props(self) -> Vec<Prop> {
        let mut props = vec![
            Prop::ResourceType,
            Prop::DisplayName,
            Prop::CurrentUserPrincipal,
            Prop::CurrentUserPrivilegeSet,
        ];
        match self {
            Self::CardDav => {
                props.extend([Prop::AddressbookHomeSet, Prop::AddressbookDescription]);
            }
            Self::CalDav => props.extend([
                Prop::CalendarHomeSet,
                Prop::CalendarDescription,
                Prop::CalendarColor,
                Prop::CalendarTimezone,
                Prop::SupportedCalendarComponents,
            ]),
        }
        props
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CardDav => "CardDAV",
            Self::CalDav => "CalDAV",
        })
    }
}

/// Kind of a syncable collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionType {
    /// A `CardDAV` address book.
    AddressBook,
    /// A `CalDAV` calendar.
    Calendar,
}

/// A discovered collection.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CollectionInfo {
    /// Absolute URL, always ending with a slash.
    pub url: Url,
    /// Kind of the collection.
    pub kind: CollectionType,
    /// The display name of the collection.
    pub display_name: Option<String>,
    /// The description of the collection.
    pub description: Option<String>,
    /// The current user may read the collection.
    pub read: bool,
    /// The current user may write to the collection.
    pub write: bool,
    /// Supported component types (VEVENT, VTODO, ...), calendars only.
    ///
    /// Empty when the server did not restrict them, which means every component is allowed.
    pub supported_components: Vec<String>,
    /// Calendar color, e.g. `#FF0000FF`.
    pub color: Option<String>,
    /// Calendar time zone, a `VTIMEZONE` component.
    pub timezone: Option<String>,
}

impl CollectionInfo {
    /// Whether the collection may contain events.
    #[must_use]
    pub fn supports_events(&self) -> bool {
        self.supports_component("VEVENT")
    }

    /// Whether the collection may contain tasks.
    #[must_use]
    pub fn supports_tasks(&self) -> bool {
        self.supports_component("VTODO")
    }

    fn supports_component(&self, component: &str) -> bool {
        self.kind == CollectionType::Calendar
            && (self.supported_components.is_empty()
                || self
                    .supported_components
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(component)))
    }
}

/// Everything discovered about one service.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ServiceInfo {
    /// Principal of the authenticated user.
    pub principal: Option<Url>,
    /// Home-set collections, each ending with a slash.
    pub home_sets: BTreeSet<Url>,
    /// Collections keyed by their URL, each ending with a slash.
    pub collections: BTreeMap<Url, CollectionInfo>,
    /// Email addresses of the principal, `CalDAV` only.
    pub emails: Vec<String>,
}

impl ServiceInfo {
    /// Whether anything worth reporting was found.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.principal.is_some() || !self.home_sets.is_empty() || !self.collections.is_empty()
    }

    /// Returns `Some(self)` only if [`Self::is_present`].
    #[must_use]
    pub fn into_present(self) -> Option<Self> {
        self.is_present().then_some(self)
    }
}

/// Outcome of one discovery run.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct DiscoveryResult {
    /// `CardDAV` service, if anything was found.
    pub carddav: Option<ServiceInfo>,
    /// `CalDAV` service, if anything was found.
    pub caldav: Option<ServiceInfo>,
    /// Some request was answered with 401 during the run.
    pub auth_failure_observed: bool,
    /// Diagnostic log, in the order the lines were written.
    pub log: Vec<String>,
}

impl DiscoveryResult {
    /// The service info for `service`.
    #[must_use]
    pub const fn service(&self, service: ServiceType) -> Option<&ServiceInfo> {
        match service {
            ServiceType::CardDav => self.carddav.as_ref(),
            ServiceType::CalDav => self.caldav.as_ref(),
        }
    }

    /// Whether neither service was found.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.carddav.is_none() && self.caldav.is_none()
    }
}

/// Returns `url` with a trailing slash on its path.
#[must_use]
pub fn with_trailing_slash(url: &Url) -> Url {
    if url.path().ends_with('/') {
        return url.clone();
    }
    let mut url = url.clone();
    let path = format!("{}/", url.path());
    url.set_path(&path);
    url
}
