// ABOUTME: Parses one tokenized XML fragment into a structured ParsedRecord
// ABOUTME: Attribute extraction via quick-xml; malformed fragments yield None, never an error
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitals

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::models::ParsedRecord;

/// Parse a single wrapped `<Record>` fragment.
///
/// Returns `None` when the fragment contains no `Record` element or is not
/// well-formed XML; per-record corruption is recovered by skipping, never by
/// aborting the pass.
#[must_use]
pub fn parse_record(fragment: &str) -> Option<ParsedRecord> {
    let mut reader = Reader::from_str(fragment);
    reader.config_mut().trim_text(true);
    loop {
        match reader.read_event() {
            Ok(Event::Start(element) | Event::Empty(element))
                if element.name().as_ref() == b"Record" =>
            {
                return Some(ParsedRecord {
                    record_type: attr_val(&element, b"type"),
                    value: attr_val(&element, b"value"),
                    start_date: attr_val(&element, b"startDate"),
                    creation_date: attr_val(&element, b"creationDate"),
                    end_date: attr_val(&element, b"endDate"),
                });
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

fn attr_val(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .filter_map(Result::ok)
        .find(|attr| attr.key.as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(|value| value.into_owned()))
}
