// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Request builders for discovery queries.

use std::fmt;
use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::error::DavError;
use crate::xml::ns;

/// PROPFIND request builder.
#[derive(Debug)]
pub struct PropFindRequest {
    props: Vec<Prop>,
}

/// Properties to request in PROPFIND.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prop {
    /// Display name.
    DisplayName,
    /// Resource type.
    ResourceType,
    /// Principal of the authenticated user.
    CurrentUserPrincipal,
    /// Privileges the authenticated user holds on the resource.
    CurrentUserPrivilegeSet,
    /// Calendar home set.
    CalendarHomeSet,
    /// Calendar user addresses (e.g. `mailto:` URIs) of a principal.
    CalendarUserAddressSet,
    /// Supported calendar components.
    SupportedCalendarComponents,
    /// Calendar description.
    CalendarDescription,
    /// Calendar timezone.
    CalendarTimezone,
    /// Calendar color (Apple extension).
    CalendarColor,
    /// Address book home set.
    AddressbookHomeSet,
    /// Address book description.
    AddressbookDescription,
}

/// XML namespace of a [`Prop`], with the prefix used when writing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Namespace {
    Dav,
    CalDav,
    CardDav,
    AppleIcal,
}

impl Namespace {
    const ALL: [Self; 4] = [Self::Dav, Self::CalDav, Self::CardDav, Self::AppleIcal];

    const fn prefix(self) -> &'static str {
        match self {
            Self::Dav => "D",
            Self::CalDav => "C",
            Self::CardDav => "CR",
            Self::AppleIcal => "A",
        }
    }

    const fn uri(self) -> &'static str {
        match self {
            Self::Dav => ns::DAV,
            Self::CalDav => ns::CALDAV,
            Self::CardDav => ns::CARDDAV,
            Self::AppleIcal => ns::APPLE_ICAL,
        }
    }
}

impl Prop {
    const fn name(self) -> &'static str {
        match self {
            Self::DisplayName => "displayname",
            Self::ResourceType => "resourcetype",
            Self::CurrentUserPrincipal => "current-user-principal",
            Self::CurrentUserPrivilegeSet => "current-user-privilege-set",
            Self::CalendarHomeSet => "calendar-home-set",
            Self::CalendarUserAddressSet => "calendar-user-address-set",
            Self::SupportedCalendarComponents => "supported-calendar-component-set",
            Self::CalendarDescription => "calendar-description",
            Self::CalendarTimezone => "calendar-timezone",
            Self::CalendarColor => "calendar-color",
            Self::AddressbookHomeSet => "addressbook-home-set",
            Self::AddressbookDescription => "addressbook-description",
        }
    }

    const fn namespace(self) -> Namespace {
        match self {
            Self::DisplayName
            | Self::ResourceType
            | Self::CurrentUserPrincipal
            | Self::CurrentUserPrivilegeSet => Namespace::Dav,
            Self::CalendarHomeSet
            | Self::CalendarUserAddressSet
            | Self::SupportedCalendarComponents
            | Self::CalendarDescription
            | Self::CalendarTimezone => Namespace::CalDav,
            Self::AddressbookHomeSet | Self::AddressbookDescription => Namespace::CardDav,
            Self::CalendarColor => Namespace::AppleIcal,
        }
    }
}

/// How far a PROPFIND reaches below the requested resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    /// The resource itself.
    Zero,
    /// The resource and its immediate children.
    One,
}

impl Depth {
    /// Value of the `Depth` request header.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zero => "0",
            Self::One => "1",
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PropFindRequest {
    /// Creates a new PROPFIND request.
    #[must_use]
    pub fn new() -> Self {
        Self { props: Vec::new() }
    }

    /// Creates a PROPFIND request for the given properties.
    #[must_use]
    pub fn with_props(props: &[Prop]) -> Self {
        let mut request = Self::new();
        for prop in props {
            request.add_property(*prop);
        }
        request
    }

    /// Adds a property to the request. Duplicates are ignored.
    pub fn add_property(&mut self, prop: Prop) -> &mut Self {
        if !self.props.contains(&prop) {
            self.props.push(prop);
        }
        self
    }

    /// The requested properties, in insertion order.
    #[must_use]
    pub fn props(&self) -> &[Prop] {
        &self.props
    }

    /// Builds the XML body for the PROPFIND request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, DavError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        // <D:propfind xmlns:D="DAV:" ...>
        let mut propfind = BytesStart::new("D:propfind");
        for namespace in Namespace::ALL {
            if namespace == Namespace::Dav || self.props.iter().any(|p| p.namespace() == namespace)
            {
                propfind.push_attribute((
                    format!("xmlns:{}", namespace.prefix()).as_str(),
                    namespace.uri(),
                ));
            }
        }
        writer.write_event(Event::Start(propfind))?;

        // <D:prop>
        writer.write_event(Event::Start(BytesStart::new("D:prop")))?;

        for prop in &self.props {
            let qualified = format!("{}:{}", prop.namespace().prefix(), prop.name());
            writer.write_event(Event::Start(BytesStart::new(qualified.as_str())))?;
            writer.write_event(Event::End(BytesEnd::new(qualified.as_str())))?;
        }

        // </D:prop>
        writer.write_event(Event::End(BytesEnd::new("D:prop")))?;

        // </D:propfind>
        writer.write_event(Event::End(BytesEnd::new("D:propfind")))?;

        let bytes = writer.into_inner().into_inner();
        String::from_utf8(bytes).map_err(|e| DavError::Xml(format!("UTF-8 error: {e}")))
    }
}

impl Default for PropFindRequest {
    fn default() -> Self {
        Self::new()
    }
}
