use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::models::{WebDavEntry, DIRECTORY_CONTENT_TYPE};
use crate::webdav_xml_parser::{parse_propfind_response, PropFindResponse};

use super::path::DavPath;

/// Turns a PROPFIND multistatus body into the children of `base_path`.
///
/// Malformed XML yields an empty list: a broken upstream shows up as an empty
/// directory instead of an error. The entry describing `base_path` itself is
/// dropped, collections come first, and each group is sorted by display name.
pub fn parse_directory_listing(xml_text: &str, base_url: &str, base_path: &DavPath) -> Vec<WebDavEntry> {
    let responses = match parse_propfind_response(xml_text) {
        Ok(responses) => responses,
        Err(e) => {
            warn!("Ignoring malformed PROPFIND response for {}: {}", base_path, e);
            return Vec::new();
        }
    };

    let mut entries: Vec<WebDavEntry> = responses
        .into_iter()
        .filter_map(|resp| {
            let path = DavPath::from_href(&resp.href, base_url);

            if is_self_entry(&resp, &path, base_path) {
                debug!("Skipping self entry {} for {}", resp.href, base_path);
                return None;
            }
            if path.is_root() {
                debug!("Skipping mount root entry {}", resp.href);
                return None;
            }

            Some(into_entry(resp, path))
        })
        .collect();

    sort_entries(&mut entries);
    entries
}

/// Finds the entry describing `target` itself, e.g. from a Depth 0 PROPFIND.
pub fn find_entry(xml_text: &str, base_url: &str, target: &DavPath) -> Option<WebDavEntry> {
    let responses = match parse_propfind_response(xml_text) {
        Ok(responses) => responses,
        Err(e) => {
            warn!("Ignoring malformed PROPFIND response for {}: {}", target, e);
            return None;
        }
    };

    responses.into_iter().find_map(|resp| {
        let path = DavPath::from_href(&resp.href, base_url);
        path.same_resource(target).then(|| into_entry(resp, path))
    })
}

/// Two independent checks. Servers differ in how they spell the self href,
/// and dropping either check lets some of them show the directory inside itself.
fn is_self_entry(resp: &PropFindResponse, path: &DavPath, base_path: &DavPath) -> bool {
    if path.same_resource(base_path) {
        return true;
    }

    let decoded_base = base_path.decoded();
    match decoded_base.last_segment() {
        Some(segment) if !resp.displayname.is_empty() && resp.displayname == segment => {
            path.decoded().same_resource(&decoded_base)
        }
        _ => false,
    }
}

fn into_entry(resp: PropFindResponse, path: DavPath) -> WebDavEntry {
    let path = if resp.is_collection {
        path.into_directory()
    } else {
        path
    };

    let display_name = if resp.displayname.is_empty() {
        path.decoded().last_segment().unwrap_or_default().to_string()
    } else {
        resp.displayname
    };

    let (content_type, content_length) = if resp.is_collection {
        (DIRECTORY_CONTENT_TYPE.to_string(), None)
    } else {
        (resp.content_type.unwrap_or_default(), resp.content_length)
    };

    WebDavEntry {
        href: resp.href,
        display_name,
        content_type,
        content_length,
        last_modified: resp.last_modified,
        is_collection: resp.is_collection,
        path: path.into_string(),
    }
}

pub fn sort_entries(entries: &mut [WebDavEntry]) {
    entries.sort_by(|a, b| match (a.is_collection, b.is_collection) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.display_name.cmp(&b.display_name),
    });
}
