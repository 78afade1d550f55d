// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! XML utilities for WebDAV/CalDAV/CardDAV processing.

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::Event;

/// XML namespaces used during discovery.
pub mod ns {
    /// `WebDAV` namespace.
    pub const DAV: &str = "DAV:";

    /// `CalDAV` namespace.
    pub const CALDAV: &str = "urn:ietf:params:xml:ns:caldav";

    /// `CardDAV` namespace.
    pub const CARDDAV: &str = "urn:ietf:params:xml:ns:carddav";

    /// Apple iCal namespace, home of `calendar-color`.
    pub const APPLE_ICAL: &str = "http://apple.com/ns/ical/";
}

/// Reads the text content of the element whose start tag was just consumed.
///
/// Nested elements are skipped but their text is kept, CDATA sections are included verbatim.
/// Entity and character references are resolved in place; surrounding whitespace is trimmed
/// once over the whole value. Returns `None` when the element holds no text at all.
///
/// # Errors
///
/// Returns an error if XML parsing fails or the document ends early.
pub fn read_element_text(reader: &mut Reader<&[u8]>) -> Result<Option<String>, quick_xml::Error> {
    let mut text = String::new();
    let mut depth = 1;

    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Text(e) => text.push_str(&e.decode()?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::GeneralRef(e) => {
                let reference = format!("&{};", String::from_utf8_lossy(&e));
                text.push_str(&unescape(&reference)?);
            }
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }

    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}

/// Reads every `href` directly or indirectly inside the element whose start tag was just
/// consumed, in document order.
///
/// # Errors
///
/// Returns an error if XML parsing fails or the document ends early.
pub fn read_hrefs(reader: &mut Reader<&[u8]>) -> Result<Vec<String>, quick_xml::Error> {
    let mut hrefs = Vec::new();
    let mut depth = 1;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) if e.local_name().as_ref() == b"href" => {
                if let Some(href) = read_element_text(reader)? {
                    hrefs.push(href.trim().to_string());
                }
            }
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }

    Ok(hrefs)
}

/// Collects the local names of the elements nested `level` deep inside the element whose start
/// tag was just consumed.
///
/// `level == 1` yields the children (e.g. `collection` and `calendar` for a `resourcetype`),
/// `level == 2` the grandchildren (e.g. `read` and `write` for a `current-user-privilege-set`).
///
/// # Errors
///
/// Returns an error if XML parsing fails or the document ends early.
pub fn read_names_at_level(
    reader: &mut Reader<&[u8]>,
    level: usize,
) -> Result<Vec<String>, quick_xml::Error> {
    let mut names = Vec::new();
    let mut depth = 1;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                if depth == level {
                    names.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                }
                depth += 1;
            }
            Event::Empty(ref e) if depth == level => {
                names.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }

    Ok(names)
}

fn unexpected_eof() -> quick_xml::Error {
    quick_xml::Error::Io(std::sync::Arc::new(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        "unexpected end of XML document",
    )))
}
