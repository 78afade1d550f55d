// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Response parsers for WebDAV/CalDAV/CardDAV PROPFIND queries.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::DavError;
use crate::types::Href;
use crate::xml::{read_element_text, read_hrefs, read_names_at_level};

/// `WebDAV` multistatus response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiStatusResponse {
    /// The response items.
    pub responses: Vec<ResponseItem>,
}

/// Individual response in multistatus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseItem {
    /// The href the item describes, as sent by the server.
    pub href: Href,
    /// Property groups with their status.
    pub prop_stats: Vec<PropStat>,
    /// Status of the whole response, when the server sent one instead of propstats.
    pub status: Option<String>,
}

/// Property stat with status and value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropStat {
    /// Properties in this group.
    pub props: Properties,
    /// Status line, e.g. `HTTP/1.1 200 OK`.
    pub status: String,
}

impl PropStat {
    /// Whether the status line carries a 2xx code.
    #[must_use]
    pub fn is_success(&self) -> bool {
        status_code(&self.status).is_some_and(|code| (200..300).contains(&code))
    }
}

/// Resource types reported in `resourcetype`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceType {
    /// `DAV:collection`.
    pub collection: bool,
    /// `DAV:principal`.
    pub principal: bool,
    /// `CALDAV:calendar`.
    pub calendar: bool,
    /// `CARDDAV:addressbook`.
    pub address_book: bool,
}

/// Privileges reported in `current-user-privilege-set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Privileges {
    /// Reading is allowed.
    pub read: bool,
    /// Writing content is allowed.
    pub write: bool,
}

impl Default for Privileges {
    /// Without a privilege set nothing is known to be forbidden.
    fn default() -> Self {
        Self {
            read: true,
            write: true,
        }
    }
}

impl Privileges {
    fn from_names(names: &[String]) -> Self {
        let has = |wanted: &[&str]| names.iter().any(|n| wanted.contains(&n.as_str()));
        Self {
            read: has(&["read", "all"]),
            write: has(&["write", "write-content", "all"]),
        }
    }
}

/// WebDAV/CalDAV/CardDAV properties known to discovery.
///
/// Each property is `None` (or empty) when the server did not return it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    /// `DAV:resourcetype`.
    pub resource_type: Option<ResourceType>,
    /// `DAV:displayname`.
    pub display_name: Option<String>,
    /// `DAV:current-user-principal`.
    pub current_user_principal: Option<Href>,
    /// `DAV:current-user-privilege-set`.
    pub privileges: Option<Privileges>,
    /// `CALDAV:calendar-home-set`.
    pub calendar_home_set: Vec<Href>,
    /// `CALDAV:calendar-user-address-set`.
    pub calendar_user_address_set: Vec<Href>,
    /// `CALDAV:supported-calendar-component-set`.
    pub supported_calendar_components: Option<Vec<String>>,
    /// `CALDAV:calendar-description`.
    pub calendar_description: Option<String>,
    /// `CALDAV:calendar-timezone`.
    pub calendar_timezone: Option<String>,
    /// Apple `calendar-color`.
    pub calendar_color: Option<String>,
    /// `CARDDAV:addressbook-home-set`.
    pub addressbook_home_set: Vec<Href>,
    /// `CARDDAV:addressbook-description`.
    pub addressbook_description: Option<String>,
}

impl Properties {
    /// Copies every property present in `other` into `self`.
    fn merge(&mut self, other: Self) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        take!(
            resource_type,
            display_name,
            current_user_principal,
            privileges,
            supported_calendar_components,
            calendar_description,
            calendar_timezone,
            calendar_color,
            addressbook_description
        );
        self.calendar_home_set.extend(other.calendar_home_set);
        self.calendar_user_address_set
            .extend(other.calendar_user_address_set);
        self.addressbook_home_set.extend(other.addressbook_home_set);
    }
}

impl ResponseItem {
    /// Merges the properties of every successful propstat.
    #[must_use]
    pub fn properties(&self) -> Properties {
        let mut merged = Properties::default();
        for prop_stat in self.prop_stats.iter().filter(|p| p.is_success()) {
            merged.merge(prop_stat.props.clone());
        }
        merged
    }
}

impl MultiStatusResponse {
    /// Parses multistatus response from XML.
    ///
    /// Unknown properties are skipped; properties the server lists as empty elements are
    /// treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if XML parsing fails.
    pub fn from_xml(xml: &str) -> Result<Self, DavError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().check_end_names = true;

        let mut responses = Vec::new();
        let mut current_response: Option<ResponseItem> = None;
        let mut current_props: Option<Properties> = None;
        let mut current_status: Option<String> = None;
        let mut in_prop = false;

        loop {
            match reader.read_event()? {
                Event::Eof => break,

                Event::Start(ref e) => {
                    let name = e.local_name();
                    match name.as_ref() {
                        b"response" => current_response = Some(ResponseItem::default()),
                        b"propstat" if current_response.is_some() => {
                            current_props = Some(Properties::default());
                            current_status = None;
                        }
                        b"prop" if current_props.is_some() => in_prop = true,
                        _ if in_prop => {
                            if let Some(props) = current_props.as_mut() {
                                read_property(&mut reader, e, props)?;
                            }
                        }
                        b"href" => {
                            let href = read_element_text(&mut reader)?;
                            if let (Some(resp), Some(href)) = (current_response.as_mut(), href) {
                                resp.href = Href::new(href.trim().to_string());
                            }
                        }
                        b"status" => {
                            let status = read_element_text(&mut reader)?;
                            if current_props.is_some() {
                                current_status = status;
                            } else if let Some(resp) = current_response.as_mut() {
                                resp.status = status;
                            }
                        }
                        _ => {}
                    }
                }

                Event::End(ref e) => match e.local_name().as_ref() {
                    b"prop" => in_prop = false,
                    b"propstat" => {
                        if let (Some(resp), Some(props)) =
                            (current_response.as_mut(), current_props.take())
                        {
                            resp.prop_stats.push(PropStat {
                                props,
                                status: current_status.take().unwrap_or_default(),
                            });
                        }
                    }
                    b"response" => {
                        if let Some(resp) = current_response.take() {
                            responses.push(resp);
                        }
                    }
                    _ => {}
                },

                _ => {}
            }
        }

        Ok(Self { responses })
    }
}

/// Reads one property element inside `<prop>` into the property bag.
fn read_property(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    props: &mut Properties,
) -> Result<(), DavError> {
    match start.local_name().as_ref() {
        b"resourcetype" => {
            let mut resource_type = ResourceType::default();
            for name in read_names_at_level(reader, 1)? {
                match name.as_str() {
                    "collection" => resource_type.collection = true,
                    "principal" => resource_type.principal = true,
                    "calendar" => resource_type.calendar = true,
                    "addressbook" => resource_type.address_book = true,
                    _ => {}
                }
            }
            props.resource_type = Some(resource_type);
        }
        b"displayname" => props.display_name = read_element_text(reader)?,
        b"current-user-principal" => {
            props.current_user_principal = read_hrefs(reader)?.into_iter().next().map(Href::new);
        }
        b"current-user-privilege-set" => {
            let names = read_names_at_level(reader, 2)?;
            props.privileges = Some(Privileges::from_names(&names));
        }
        b"calendar-home-set" => {
            props.calendar_home_set = read_hrefs(reader)?.into_iter().map(Href::new).collect();
        }
        b"addressbook-home-set" => {
            props.addressbook_home_set = read_hrefs(reader)?.into_iter().map(Href::new).collect();
        }
        b"calendar-user-address-set" => {
            props.calendar_user_address_set =
                read_hrefs(reader)?.into_iter().map(Href::new).collect();
        }
        b"supported-calendar-component-set" => {
            props.supported_calendar_components = Some(read_components(reader)?);
        }
        b"calendar-description" => props.calendar_description = read_element_text(reader)?,
        b"calendar-timezone" => props.calendar_timezone = read_element_text(reader)?,
        b"calendar-color" => props.calendar_color = read_element_text(reader)?,
        b"addressbook-description" => props.addressbook_description = read_element_text(reader)?,
        _ => {
            // Unknown property, skip it with everything inside.
            read_element_text(reader)?;
        }
    }
    Ok(())
}

/// Reads the `name` attributes of the `comp` elements of a supported component set.
fn read_components(reader: &mut Reader<&[u8]>) -> Result<Vec<String>, DavError> {
    let mut components = Vec::new();
    let mut depth = 1;
    loop {
        let event = reader.read_event()?;
        let event_is_start = matches!(event, Event::Start(_));
        match event {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"comp" => {
                if let Ok(Some(name_attr)) = e.try_get_attribute("name") {
                    let name = std::str::from_utf8(&name_attr.value)
                        .map_err(|e| DavError::Xml(format!("UTF-8 error: {e}")))?
                        .to_string();
                    components.push(name);
                }
                // A non-empty <comp> closes with an End event of its own.
                if event_is_start {
                    depth += 1;
                }
            }
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Eof => return Err(DavError::Xml("Unexpected EOF".to_string())),
            _ => {}
        }
    }
    Ok(components)
}

/// Extracts the numeric code of an HTTP status line such as `HTTP/1.1 200 OK`.
fn status_code(line: &str) -> Option<u16> {
    line.split_whitespace().nth(1)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_parses_status_lines() {
        assert_eq!(status_code("HTTP/1.1 200 OK"), Some(200));
        assert_eq!(status_code("HTTP/1.1 404 Not Found"), Some(404));
        assert_eq!(status_code("garbage"), None);
    }

    #[test]
    fn privileges_from_names() {
        let all = Privileges::from_names(&["all".to_string()]);
        assert!(all.read && all.write);

        let read_only = Privileges::from_names(&["read".to_string()]);
        assert!(read_only.read);
        assert!(!read_only.write);

        let write_content = Privileges::from_names(&["write-content".to_string()]);
        assert!(write_content.write);
    }
}
