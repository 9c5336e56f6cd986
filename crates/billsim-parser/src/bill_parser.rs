use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ParseError;

/// Which schema family a bill XML document belongs to, decided once from
/// the root element's default namespace. Downstream code branches on this
/// enum only at element-name selection (`enum` vs `num`, `header` vs
/// `heading`), never in the section-selection or aggregation logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFamily {
    /// Namespaced USLM2 schema (`xmlns="http://xml.house.gov/schemas/uslm/1.0"`).
    Uslm2,
    /// Legacy non-namespaced bill DTD schema.
    Legacy,
}

const USLM2_NAMESPACE: &str = "http://xml.house.gov/schemas/uslm/1.0";

/// A top-level section of a parsed bill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// The XML `id` attribute; may be empty for malformed inputs.
    pub section_id: String,
    pub label: String,
    pub header: String,
    pub text: String,
    pub length: usize,
}

/// A parsed bill: metadata, overall length, and an ordered section list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bill {
    pub billnumber_version: String,
    pub schema: SchemaFamily,
    pub congress: String,
    pub session: String,
    pub legisnum: String,
    pub title: String,
    pub date: Option<String>,
    pub length: usize,
    pub sections: Vec<Section>,
}

struct OpenSection {
    open_depth: usize,
    section_id: String,
    label: Option<String>,
    header: Option<String>,
    text: String,
}

/// Parses an XML bill file into a [`Bill`].
///
/// # Errors
///
/// Returns [`ParseError::NotFound`] if the file does not exist,
/// [`ParseError::Io`] on a read failure, or [`ParseError::Xml`] on malformed
/// XML.
pub fn parse_bill_file(path: &Path, billnumber_version: &str) -> Result<Bill, ParseError> {
    if !path.is_file() {
        return Err(ParseError::NotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let length = contents.chars().count();

    let mut bill = parse_bill_str(&contents, billnumber_version, path)?;
    bill.length = length;

    if bill.date.is_none() && bill.schema == SchemaFamily::Legacy {
        bill.date = read_sibling_data_json_issued_on(path);
        if bill.date.is_some() {
            tracing::debug!(path = %path.display(), "recovered date from sibling data.json");
        }
    }

    Ok(bill)
}

fn read_sibling_data_json_issued_on(xml_path: &Path) -> Option<String> {
    let data_json = xml_path.parent()?.join("data.json");
    let raw = std::fs::read_to_string(data_json).ok()?;
    let value: serde_json::Value = serde_json::from_str(&raw).ok()?;
    value
        .get("issued_on")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

/// Shared closing logic for `Event::End` and self-closing `Event::Empty`
/// tags: clears a finished `pending_field`, and if `name` is `"section"`
/// and the innermost open section was opened at `closing_depth`, pops it
/// and (for a genuine top-level section) finalizes it into `sections`.
fn close_element(
    name: &str,
    closing_depth: usize,
    pending_field: &mut Option<(&'static str, usize)>,
    metadata_field: &mut Option<&'static str>,
    section_stack: &mut Vec<OpenSection>,
    sections: &mut Vec<Section>,
) {
    if let Some((_, depth)) = *pending_field {
        if depth == closing_depth {
            *pending_field = None;
        }
    }

    if name == "section" {
        if let Some(top) = section_stack.last() {
            if top.open_depth == closing_depth {
                let finished = section_stack.pop().unwrap();
                if section_stack.is_empty() {
                    let text = finished.text.trim().to_string();
                    let length = text.chars().count();
                    sections.push(Section {
                        section_id: finished.section_id,
                        label: finished.label.unwrap_or_default(),
                        header: finished.header.unwrap_or_default(),
                        text,
                        length,
                    });
                }
            }
        }
    }

    if section_stack.is_empty() {
        *metadata_field = None;
    }
}

fn parse_bill_str(
    xml: &str,
    billnumber_version: &str,
    path: &Path,
) -> Result<Bill, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut schema = SchemaFamily::Legacy;
    let mut congress = String::new();
    let mut session = String::new();
    let mut legisnum = String::new();
    let mut title = String::new();
    let mut date: Option<String> = None;

    let mut sections: Vec<Section> = Vec::new();
    let mut section_stack: Vec<OpenSection> = Vec::new();
    let mut element_depth: usize = 0;
    let mut root_seen = false;

    // Tracks the element currently accumulating text for label/header
    // purposes: (element name, depth at which it was opened).
    let mut pending_field: Option<(&'static str, usize)> = None;
    let mut metadata_field: Option<&'static str> = None;

    loop {
        let event = reader.read_event().map_err(|source| ParseError::Xml {
            path: path.to_path_buf(),
            source,
        })?;
        let is_empty_element = matches!(event, Event::Empty(_));

        match event {
            Event::Start(tag) | Event::Empty(tag) => {
                let name = String::from_utf8_lossy(tag.local_name().as_ref()).to_string();

                if !root_seen {
                    root_seen = true;
                    let has_uslm2_ns = tag.attributes().flatten().any(|attr| {
                        attr.key.as_ref() == b"xmlns"
                            && attr.unescape_value().ok().as_deref() == Some(USLM2_NAMESPACE)
                    });
                    schema = if has_uslm2_ns {
                        SchemaFamily::Uslm2
                    } else {
                        SchemaFamily::Legacy
                    };
                }

                element_depth += 1;

                if name == "section" {
                    let status_withdrawn = tag.attributes().flatten().any(|attr| {
                        attr.key.as_ref() == b"status"
                            && attr.unescape_value().ok().as_deref() == Some("withdrawn")
                    });
                    let is_top_level = section_stack.is_empty();
                    let section_id = tag
                        .attributes()
                        .flatten()
                        .find(|attr| attr.key.as_ref() == b"id")
                        .and_then(|attr| attr.unescape_value().ok())
                        .map(|v| v.to_string())
                        .unwrap_or_default();

                    if is_top_level && !status_withdrawn {
                        section_stack.push(OpenSection {
                            open_depth: element_depth,
                            section_id,
                            label: None,
                            header: None,
                            text: String::new(),
                        });
                    } else if !section_stack.is_empty() {
                        // Nested (or withdrawn) section: its text still
                        // belongs to whichever top-level section is open,
                        // but it is never itself selected.
                        section_stack.push(OpenSection {
                            open_depth: element_depth,
                            section_id: String::new(),
                            label: None,
                            header: None,
                            text: String::new(),
                        });
                    }
                } else if let Some(top) = section_stack.last() {
                    let direct_child = element_depth == top.open_depth + 1;
                    if direct_child {
                        let field = match (schema, name.as_str()) {
                            (SchemaFamily::Legacy, "enum") | (SchemaFamily::Uslm2, "num") => {
                                Some("label")
                            }
                            (SchemaFamily::Legacy, "header") | (SchemaFamily::Uslm2, "heading") => {
                                Some("header")
                            }
                            _ => None,
                        };
                        if let Some(field) = field {
                            pending_field = Some((field, element_depth));
                        }
                    }
                } else if metadata_field.is_none() {
                    metadata_field = match name.as_str() {
                        "congress" => Some("congress"),
                        "session" => Some("session"),
                        "legis-num" | "legisnum" => Some("legisnum"),
                        "dc:title" | "title" => Some("title"),
                        "date" | "action-date" => Some("date"),
                        _ => None,
                    };
                }

                // A self-closing tag never gets a matching `Event::End`, so
                // close out whatever bookkeeping the `End` arm below would
                // otherwise have done, using the same depth we just opened.
                if is_empty_element {
                    close_element(
                        &name,
                        element_depth,
                        &mut pending_field,
                        &mut metadata_field,
                        &mut section_stack,
                        &mut sections,
                    );
                    element_depth = element_depth.saturating_sub(1);
                }
            }
            Event::Text(text) => {
                let decoded = text.unescape().unwrap_or_default().to_string();
                if let Some(top) = section_stack.last_mut() {
                    top.text.push_str(&decoded);
                    if let Some((field, _)) = pending_field {
                        match field {
                            "label" => top.label = Some(decoded.trim().to_string()),
                            "header" => top.header = Some(decoded.trim().to_string()),
                            _ => {}
                        }
                    }
                } else if let Some(field) = metadata_field {
                    let trimmed = decoded.trim().to_string();
                    match field {
                        "congress" => congress = trimmed,
                        "session" => session = trimmed,
                        "legisnum" => legisnum = trimmed,
                        "title" => title = trimmed,
                        "date" => date = Some(trimmed),
                        _ => {}
                    }
                }
            }
            Event::CData(text) => {
                let decoded = String::from_utf8_lossy(&text.into_inner()).to_string();
                if let Some(top) = section_stack.last_mut() {
                    top.text.push_str(&decoded);
                    if let Some((field, _)) = pending_field {
                        match field {
                            "label" => top.label = Some(decoded.trim().to_string()),
                            "header" => top.header = Some(decoded.trim().to_string()),
                            _ => {}
                        }
                    }
                } else if let Some(field) = metadata_field {
                    let trimmed = decoded.trim().to_string();
                    match field {
                        "congress" => congress = trimmed,
                        "session" => session = trimmed,
                        "legisnum" => legisnum = trimmed,
                        "title" => title = trimmed,
                        "date" => date = Some(trimmed),
                        _ => {}
                    }
                }
            }
            Event::End(tag) => {
                let name = String::from_utf8_lossy(tag.local_name().as_ref()).to_string();
                close_element(
                    &name,
                    element_depth,
                    &mut pending_field,
                    &mut metadata_field,
                    &mut section_stack,
                    &mut sections,
                );
                element_depth = element_depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    // Strip trailing alpha characters from the session, per the legacy
    // metadata convention (e.g. "1st Session" -> "1st").
    let session = session
        .trim_end_matches(|c: char| c.is_alphabetic())
        .trim()
        .to_string();

    Ok(Bill {
        billnumber_version: billnumber_version.to_string(),
        schema,
        congress,
        session,
        legisnum,
        title,
        date,
        length: 0,
        sections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_bill(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn legacy_schema_extracts_top_level_sections() {
        let tmp = tempfile::tempdir().unwrap();
        let xml = r#"<bill>
            <section id="s1"><enum>1.</enum><header>Short title</header>Text one.</section>
            <section id="s2"><enum>2.</enum><header>Findings</header>Text two.
                <section id="s2a"><enum>(a)</enum><header>Sub</header>Nested text.</section>
            </section>
        </bill>"#;
        let path = write_bill(tmp.path(), "bill.xml", xml);

        let bill = parse_bill_file(&path, "117hr200ih").unwrap();
        assert_eq!(bill.schema, SchemaFamily::Legacy);
        assert_eq!(bill.sections.len(), 2);
        assert_eq!(bill.sections[0].section_id, "s1");
        assert_eq!(bill.sections[0].label, "1.");
        assert_eq!(bill.sections[0].header, "Short title");
        assert_eq!(bill.sections[0].text, "Text one.");
        assert_eq!(bill.sections[1].section_id, "s2");
        assert!(bill.sections[1].text.contains("Nested text."));
    }

    #[test]
    fn withdrawn_sections_are_excluded() {
        let tmp = tempfile::tempdir().unwrap();
        let xml = r#"<bill>
            <section id="s1" status="withdrawn"><enum>1.</enum><header>Gone</header>Withdrawn text.</section>
            <section id="s2"><enum>2.</enum><header>Kept</header>Kept text.</section>
        </bill>"#;
        let path = write_bill(tmp.path(), "bill.xml", xml);

        let bill = parse_bill_file(&path, "117hr200ih").unwrap();
        assert_eq!(bill.sections.len(), 1);
        assert_eq!(bill.sections[0].section_id, "s2");
    }

    #[test]
    fn uslm2_schema_uses_num_and_heading() {
        let tmp = tempfile::tempdir().unwrap();
        let xml = r#"<bill xmlns="http://xml.house.gov/schemas/uslm/1.0">
            <section id="s1"><num>1.</num><heading>Short title</heading>Text one.</section>
        </bill>"#;
        let path = write_bill(tmp.path(), "bill.xml", xml);

        let bill = parse_bill_file(&path, "117hr200ih").unwrap();
        assert_eq!(bill.schema, SchemaFamily::Uslm2);
        assert_eq!(bill.sections[0].label, "1.");
        assert_eq!(bill.sections[0].header, "Short title");
    }

    #[test]
    fn missing_file_is_not_found() {
        let result = parse_bill_file(Path::new("/nonexistent/bill.xml"), "117hr200ih");
        assert!(matches!(result, Err(ParseError::NotFound(_))));
    }

    #[test]
    fn malformed_id_attribute_is_empty_not_error() {
        let tmp = tempfile::tempdir().unwrap();
        let xml = r#"<bill><section><enum>1.</enum><header>No id</header>Body.</section></bill>"#;
        let path = write_bill(tmp.path(), "bill.xml", xml);

        let bill = parse_bill_file(&path, "117hr200ih").unwrap();
        assert_eq!(bill.sections[0].section_id, "");
    }
}
