// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Extracts discovery facts from PROPFIND responses.

use url::Url;

use crate::response::{Properties, ResponseItem};
use crate::types::{CollectionInfo, Href, ServiceInfo, ServiceType, with_trailing_slash};

/// Records what a single response says about `service` into `info`.
///
/// Collections of the service's kind are keyed by their URL with a trailing slash, and home
/// sets are stored the same way. Returns the principal candidates the response names, in the
/// order found; the caller decides whether to trust them. Hrefs resolve against `base`, the URL
/// that answered the request.
pub fn scan_response(
    base: &Url,
    item: &ResponseItem,
    service: ServiceType,
    info: &mut ServiceInfo,
) -> Vec<Url> {
    let Some(url) = resolve(base, &item.href) else {
        return Vec::new();
    };
    let props = item.properties();
    let mut candidates = Vec::new();

    if let Some(principal) = props
        .current_user_principal
        .as_ref()
        .and_then(|href| resolve(base, href))
    {
        candidates.push(principal);
    }

    if let Some(resource_type) = props.resource_type {
        if resource_type.principal && !candidates.contains(&url) {
            candidates.push(url.clone());
        }

        let is_service_collection = match service {
            ServiceType::CardDav => resource_type.address_book,
            ServiceType::CalDav => resource_type.calendar,
        };
        if is_service_collection {
            let collection = collection_info(with_trailing_slash(&url), service, &props);
            info.collections.insert(collection.url.clone(), collection);
        }
    }

    let home_sets = match service {
        ServiceType::CardDav => &props.addressbook_home_set,
        ServiceType::CalDav => &props.calendar_home_set,
    };
    info.home_sets.extend(
        home_sets
            .iter()
            .filter_map(|href| resolve(base, href))
            .map(|home_set| with_trailing_slash(&home_set)),
    );

    candidates
}

/// Builds the collection record for a resource known to be of `service`'s kind.
fn collection_info(url: Url, service: ServiceType, props: &Properties) -> CollectionInfo {
    let privileges = props.privileges.unwrap_or_default();
    let mut collection = CollectionInfo {
        url,
        kind: service.collection_type(),
        display_name: props.display_name.clone(),
        description: None,
        read: privileges.read,
        write: privileges.write,
        supported_components: Vec::new(),
        color: None,
        timezone: None,
    };

    match service {
        ServiceType::CardDav => {
            collection.description = props.addressbook_description.clone();
        }
        ServiceType::CalDav => {
            collection.description = props.calendar_description.clone();
            collection.color = props.calendar_color.clone();
            collection.timezone = props.calendar_timezone.clone();
            collection.supported_components = props
                .supported_calendar_components
                .clone()
                .unwrap_or_default();
        }
    }
    collection
}

/// Resolves `href` against `base`; an empty href names `base` itself.
fn resolve(base: &Url, href: &Href) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return Some(base.clone());
    }
    base.join(href).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::MultiStatusResponse;
    use crate::types::CollectionType;

    const BASE: &str = "https://dav.example.com/dav/";

    fn scan(xml: &str, service: ServiceType) -> (ServiceInfo, Vec<Url>) {
        let base = Url::parse(BASE).unwrap();
        let multistatus = MultiStatusResponse::from_xml(xml).unwrap();
        let mut info = ServiceInfo::default();
        let mut candidates = Vec::new();
        for item in &multistatus.responses {
            candidates.extend(scan_response(&base, item, service, &mut info));
        }
        (info, candidates)
    }

    #[test]
    fn scan_calendar_collection() {
        let xml = r##"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav" xmlns:a="http://apple.com/ns/ical/">
  <d:response>
    <d:href>/dav/calendars/alice/work</d:href>
    <d:propstat>
      <d:prop>
        <d:resourcetype><d:collection/><c:calendar/></d:resourcetype>
        <d:displayname>Work</d:displayname>
        <c:calendar-description>Office hours</c:calendar-description>
        <a:calendar-color>#FF0000FF</a:calendar-color>
        <c:supported-calendar-component-set>
          <c:comp name="VEVENT"/>
          <c:comp name="VTODO"/>
        </c:supported-calendar-component-set>
        <d:current-user-privilege-set>
          <d:privilege><d:read/></d:privilege>
        </d:current-user-privilege-set>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"##;

        let (info, candidates) = scan(xml, ServiceType::CalDav);
        assert!(candidates.is_empty());
        assert_eq!(info.collections.len(), 1);

        let key = Url::parse("https://dav.example.com/dav/calendars/alice/work/").unwrap();
        let calendar = &info.collections[&key];
        assert_eq!(calendar.url, key);
        assert_eq!(calendar.kind, CollectionType::Calendar);
        assert_eq!(calendar.display_name.as_deref(), Some("Work"));
        assert_eq!(calendar.description.as_deref(), Some("Office hours"));
        assert_eq!(calendar.color.as_deref(), Some("#FF0000FF"));
        assert_eq!(calendar.supported_components, vec!["VEVENT", "VTODO"]);
        assert!(calendar.read);
        assert!(!calendar.write);
    }

    #[test]
    fn scan_keeps_text_around_references() {
        let xml = r##"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:response>
    <d:href>/dav/calendars/alice/home/</d:href>
    <d:propstat>
      <d:prop>
        <d:resourcetype><d:collection/><c:calendar/></d:resourcetype>
        <d:displayname>Work &amp; Home</d:displayname>
        <c:calendar-description>  a &lt; b  </c:calendar-description>
        <c:calendar-timezone>BEGIN:VCALENDAR&#13;
VERSION:2.0&#13;
END:VCALENDAR</c:calendar-timezone>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"##;

        let (info, _) = scan(xml, ServiceType::CalDav);
        let key = Url::parse("https://dav.example.com/dav/calendars/alice/home/").unwrap();
        let calendar = &info.collections[&key];
        assert_eq!(calendar.display_name.as_deref(), Some("Work & Home"));
        assert_eq!(calendar.description.as_deref(), Some("a < b"));
        assert_eq!(
            calendar.timezone.as_deref(),
            Some("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VCALENDAR")
        );
    }

    #[test]
    fn scan_ignores_collections_of_other_service() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:response>
    <d:href>/dav/calendars/alice/work/</d:href>
    <d:propstat>
      <d:prop>
        <d:resourcetype><d:collection/><c:calendar/></d:resourcetype>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

        let (info, candidates) = scan(xml, ServiceType::CardDav);
        assert!(info.collections.is_empty());
        assert!(candidates.is_empty());
    }

    #[test]
    fn scan_address_book_has_no_calendar_fields() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:cr="urn:ietf:params:xml:ns:carddav">
  <d:response>
    <d:href>https://dav.example.com/dav/contacts/alice/</d:href>
    <d:propstat>
      <d:prop>
        <d:resourcetype><d:collection/><cr:addressbook/></d:resourcetype>
        <d:displayname>Contacts</d:displayname>
        <cr:addressbook-description>Friends</cr:addressbook-description>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

        let (info, _) = scan(xml, ServiceType::CardDav);
        let book = info.collections.values().next().unwrap();
        assert_eq!(book.kind, CollectionType::AddressBook);
        assert_eq!(book.description.as_deref(), Some("Friends"));
        assert!(book.read && book.write);
        assert!(book.color.is_none());
        assert!(book.timezone.is_none());
        assert!(book.supported_components.is_empty());
    }

    #[test]
    fn scan_collects_principal_candidates_and_home_sets() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:response>
    <d:href>/dav/principals/alice/</d:href>
    <d:propstat>
      <d:prop>
        <d:resourcetype><d:principal/></d:resourcetype>
        <d:current-user-principal><d:href>/dav/principals/alice/</d:href></d:current-user-principal>
        <c:calendar-home-set><d:href>/dav/calendars/alice</d:href></c:calendar-home-set>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

        let (info, candidates) = scan(xml, ServiceType::CalDav);
        assert_eq!(
            candidates,
            vec![Url::parse("https://dav.example.com/dav/principals/alice/").unwrap()]
        );
        assert!(
            info.home_sets
                .contains(&Url::parse("https://dav.example.com/dav/calendars/alice/").unwrap())
        );
        assert!(info.principal.is_none());
    }

    #[test]
    fn scan_skips_failed_propstats() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:response>
    <d:href>/dav/</d:href>
    <d:propstat>
      <d:prop>
        <c:calendar-home-set><d:href>/dav/calendars/alice/</d:href></c:calendar-home-set>
      </d:prop>
      <d:status>HTTP/1.1 404 Not Found</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

        let (info, candidates) = scan(xml, ServiceType::CalDav);
        assert!(info.home_sets.is_empty());
        assert!(candidates.is_empty());
    }

    #[test]
    fn resolve_empty_href_is_base() {
        let base = Url::parse(BASE).unwrap();
        assert_eq!(resolve(&base, &Href::from("")), Some(base.clone()));
        assert_eq!(
            resolve(&base, &Href::from("https://other.example.com/x/")).unwrap().as_str(),
            "https://other.example.com/x/"
        );
    }
}
