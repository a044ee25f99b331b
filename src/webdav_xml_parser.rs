use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::reader::Reader;
use std::str;

use crate::errors::WebDavError;

/// One `<response>` element of a multistatus document, before any path handling.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PropFindResponse {
    pub href: String,
    pub displayname: String,
    pub content_length: Option<u64>,
    pub last_modified: Option<String>,
    pub content_type: Option<String>,
    pub is_collection: bool,
}

/// Request body asking for the properties a directory listing needs.
pub const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:propfind xmlns:D="DAV:">
    <D:prop>
        <D:displayname/>
        <D:getcontenttype/>
        <D:getcontentlength/>
        <D:getlastmodified/>
        <D:resourcetype/>
    </D:prop>
</D:propfind>"#;

/// Parses a multistatus document into its `<response>` elements, in document order.
///
/// Element names are matched on their local part, so any namespace prefix works.
pub fn parse_propfind_response(xml_text: &str) -> Result<Vec<PropFindResponse>, WebDavError> {
    let mut reader = Reader::from_str(xml_text);
    reader.config_mut().trim_text(true);

    let mut responses = Vec::new();
    let mut current_response: Option<PropFindResponse> = None;
    let mut current_element = String::new();
    let mut in_resourcetype = false;
    // Element nesting depth, and the depth of the open <response>
    let mut depth = 0usize;
    let mut response_depth = 0usize;
    let mut in_response_href = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = get_local_name(&e)?;
                depth += 1;

                match name.as_str() {
                    "response" => {
                        current_response = Some(PropFindResponse::default());
                        response_depth = depth;
                    }
                    // Nested hrefs (lockroot, owner) do not name the resource
                    "href" if current_response.is_some() && depth == response_depth + 1 => {
                        in_response_href = true;
                    }
                    "resourcetype" => {
                        in_resourcetype = true;
                    }
                    "collection" if in_resourcetype => {
                        if let Some(ref mut resp) = current_response {
                            resp.is_collection = true;
                        }
                    }
                    _ => {}
                }
                current_element = name;
            }
            Ok(Event::Empty(e)) => {
                // <collection/> is the only self-closing element that carries meaning
                let name = get_local_name(&e)?;
                if name == "collection" && in_resourcetype {
                    if let Some(ref mut resp) = current_response {
                        resp.is_collection = true;
                    }
                }
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| parse_error(&reader, e))?
                    .trim()
                    .to_string();

                if let Some(ref mut resp) = current_response {
                    apply_text(resp, &current_element, text, in_response_href);
                }
            }
            Ok(Event::CData(e)) => {
                let text = str::from_utf8(&e)
                    .map_err(|e| parse_error(&reader, e))?
                    .trim()
                    .to_string();

                if let Some(ref mut resp) = current_response {
                    apply_text(resp, &current_element, text, in_response_href);
                }
            }
            Ok(Event::End(e)) => {
                let name = get_local_name_from_end(&e)?;
                depth = depth.saturating_sub(1);

                match name.as_str() {
                    "response" => {
                        if let Some(resp) = current_response.take() {
                            if !resp.href.is_empty() {
                                responses.push(resp);
                            }
                        }
                    }
                    "resourcetype" => {
                        in_resourcetype = false;
                    }
                    "href" => {
                        in_response_href = false;
                    }
                    _ => {}
                }

                current_element.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(parse_error(&reader, e)),
            _ => {}
        }
    }

    if current_response.is_some() {
        return Err(WebDavError::Parse {
            message: "document ended inside a <response> element".to_string(),
        });
    }

    Ok(responses)
}

fn apply_text(resp: &mut PropFindResponse, element: &str, text: String, in_response_href: bool) {
    if text.is_empty() {
        return;
    }

    match element {
        "href" if in_response_href => resp.href.push_str(&text),
        "displayname" => resp.displayname = text,
        "getcontentlength" => resp.content_length = text.parse().ok(),
        "getlastmodified" => resp.last_modified = Some(text),
        "getcontenttype" => resp.content_type = Some(text),
        _ => {}
    }
}

fn parse_error(reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> WebDavError {
    WebDavError::Parse {
        message: format!("at byte {}: {}", reader.buffer_position(), err),
    }
}

fn get_local_name(e: &BytesStart) -> Result<String, WebDavError> {
    local_name_to_string(e.name().local_name().as_ref())
}

fn get_local_name_from_end(e: &BytesEnd) -> Result<String, WebDavError> {
    local_name_to_string(e.name().local_name().as_ref())
}

fn local_name_to_string(local: &[u8]) -> Result<String, WebDavError> {
    str::from_utf8(local)
        .map(str::to_string)
        .map_err(|e| WebDavError::Parse {
            message: format!("invalid UTF-8 in element name: {}", e),
        })
}
