//! 207 Multi-Status response building.
//!
//! Output-only templates: the property-negotiation layer above the
//! backend owns full PROPFIND semantics, these builders emit the fixed
//! property set calendar and contact clients ask for.

use chrono::{DateTime, Utc};

/// Escapes text for XML element content.
#[must_use]
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wraps response elements into a complete multistatus document.
#[must_use]
pub fn multistatus(responses: &[String]) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <D:multistatus xmlns:D=\"DAV:\" xmlns:C=\"urn:ietf:params:xml:ns:caldav\" \
         xmlns:CARD=\"urn:ietf:params:xml:ns:carddav\">\n",
    );
    for response in responses {
        out.push_str(response);
    }
    out.push_str("</D:multistatus>\n");
    out
}

/// Response element for a plain collection (a home set).
#[must_use]
pub fn plain_collection_response(href: &str, displayname: &str) -> String {
    format!(
        "  <D:response>\n\
         \x20   <D:href>{}</D:href>\n\
         \x20   <D:propstat>\n\
         \x20     <D:prop>\n\
         \x20       <D:resourcetype><D:collection/></D:resourcetype>\n\
         \x20       <D:displayname>{}</D:displayname>\n\
         \x20     </D:prop>\n\
         \x20     <D:status>HTTP/1.1 200 OK</D:status>\n\
         \x20   </D:propstat>\n\
         \x20 </D:response>\n",
        xml_escape(href),
        xml_escape(displayname),
    )
}

/// Response element for a calendar or addressbook collection.
#[must_use]
pub fn collection_response(
    href: &str,
    displayname: &str,
    description: Option<&str>,
    is_calendar: bool,
) -> String {
    let resource_type = if is_calendar {
        "<D:collection/><C:calendar/>"
    } else {
        "<D:collection/><CARD:addressbook/>"
    };
    let description = description.map_or_else(String::new, |d| {
        if is_calendar {
            format!(
                "        <C:calendar-description>{}</C:calendar-description>\n",
                xml_escape(d)
            )
        } else {
            format!(
                "        <CARD:addressbook-description>{}</CARD:addressbook-description>\n",
                xml_escape(d)
            )
        }
    });

    format!(
        "  <D:response>\n\
         \x20   <D:href>{}</D:href>\n\
         \x20   <D:propstat>\n\
         \x20     <D:prop>\n\
         \x20       <D:resourcetype>{resource_type}</D:resourcetype>\n\
         \x20       <D:displayname>{}</D:displayname>\n\
         {description}\
         \x20     </D:prop>\n\
         \x20     <D:status>HTTP/1.1 200 OK</D:status>\n\
         \x20   </D:propstat>\n\
         \x20 </D:response>\n",
        xml_escape(href),
        xml_escape(displayname),
    )
}

/// Response element for a stored object (no body inline).
#[must_use]
pub fn object_response(
    href: &str,
    etag: &str,
    content_type: &str,
    content_length: i64,
    last_modified: DateTime<Utc>,
) -> String {
    format!(
        "  <D:response>\n\
         \x20   <D:href>{}</D:href>\n\
         \x20   <D:propstat>\n\
         \x20     <D:prop>\n\
         \x20       <D:resourcetype/>\n\
         \x20       <D:getetag>&quot;{}&quot;</D:getetag>\n\
         \x20       <D:getcontenttype>{content_type}</D:getcontenttype>\n\
         \x20       <D:getcontentlength>{content_length}</D:getcontentlength>\n\
         \x20       <D:getlastmodified>{}</D:getlastmodified>\n\
         \x20     </D:prop>\n\
         \x20     <D:status>HTTP/1.1 200 OK</D:status>\n\
         \x20   </D:propstat>\n\
         \x20 </D:response>\n",
        xml_escape(href),
        xml_escape(etag),
        last_modified.format("%a, %d %b %Y %H:%M:%S GMT"),
    )
}

/// Response element for a calendar object carrying its iCalendar body,
/// as calendar-query and calendar-multiget return it.
#[must_use]
pub fn calendar_data_response(href: &str, etag: &str, body: &str) -> String {
    format!(
        "  <D:response>\n\
         \x20   <D:href>{}</D:href>\n\
         \x20   <D:propstat>\n\
         \x20     <D:prop>\n\
         \x20       <D:getetag>&quot;{}&quot;</D:getetag>\n\
         \x20       <C:calendar-data>{}</C:calendar-data>\n\
         \x20     </D:prop>\n\
         \x20     <D:status>HTTP/1.1 200 OK</D:status>\n\
         \x20   </D:propstat>\n\
         \x20 </D:response>\n",
        xml_escape(href),
        xml_escape(etag),
        xml_escape(body),
    )
}

/// Response element for an address object carrying its vCard body, as
/// addressbook-multiget returns it.
#[must_use]
pub fn address_data_response(href: &str, etag: &str, body: &str) -> String {
    format!(
        "  <D:response>\n\
         \x20   <D:href>{}</D:href>\n\
         \x20   <D:propstat>\n\
         \x20     <D:prop>\n\
         \x20       <D:getetag>&quot;{}&quot;</D:getetag>\n\
         \x20       <CARD:address-data>{}</CARD:address-data>\n\
         \x20     </D:prop>\n\
         \x20     <D:status>HTTP/1.1 200 OK</D:status>\n\
         \x20   </D:propstat>\n\
         \x20 </D:response>\n",
        xml_escape(href),
        xml_escape(etag),
        xml_escape(body),
    )
}

/// Response element for a multiget href that resolved to nothing.
#[must_use]
pub fn not_found_response(href: &str) -> String {
    format!(
        "  <D:response>\n\
         \x20   <D:href>{}</D:href>\n\
         \x20   <D:status>HTTP/1.1 404 Not Found</D:status>\n\
         \x20 </D:response>\n",
        xml_escape(href),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn escape_covers_reserved() {
        assert_eq!(xml_escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn multistatus_wraps_responses() {
        let doc = multistatus(&[not_found_response("/a/b")]);
        assert!(doc.starts_with("<?xml"));
        assert!(doc.contains("<D:href>/a/b</D:href>"));
        assert!(doc.trim_end().ends_with("</D:multistatus>"));
    }

    #[test]
    fn collection_response_marks_calendar() {
        let response = collection_response("/alice/calendars/1/", "Work", None, true);
        assert!(response.contains("<C:calendar/>"));
        assert!(response.contains("<D:displayname>Work</D:displayname>"));
    }

    #[test]
    fn object_response_quotes_etag() {
        let modified = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let response = object_response("/a/b.ics", "tag", "text/calendar", 10, modified);
        assert!(response.contains("&quot;tag&quot;"));
        assert!(response.contains("Mon, 15 Jan 2024 09:00:00 GMT"));
    }
}
