//! Scalar token extraction from the FMI WFS `multipointcoverage` payload.
//!
//! The upstream document is deeply nested GML, but every value the record
//! builder needs lives in a handful of uniquely named elements. Extraction
//! is therefore a first-occurrence scan per tag over the raw text, the same
//! contract a DOM `getElementsByTagName(..)[0]` lookup gives, without
//! modeling the whole schema.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// The scalar tokens of one upstream response, ready for record assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastTokens {
    /// Upstream generation time (`timeStamp` attribute).
    pub timestamp: DateTime<Utc>,
    /// Instant of the first forecast sample.
    pub start_time: DateTime<Utc>,
    pub location: String,
    pub country: Option<String>,
    /// Raw `"lat lon"` pair as sent upstream.
    pub position_field: String,
    /// IANA timezone name of the location.
    pub timezone: String,
    /// Forecast variable names, in sample order.
    pub headers: Vec<String>,
    /// Flat sample-major value tokens.
    pub values: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WfsError {
    #[error("element <{0}> missing from the WFS payload")]
    MissingElement(&'static str),

    #[error("attribute {0:?} missing from <wfs:FeatureCollection>")]
    MissingAttribute(&'static str),

    #[error("unparseable timestamp {value:?} in {element}")]
    TimestampFormat {
        element: &'static str,
        value: String,
    },
}

/// Pulls the builder inputs out of a WFS response body.
pub fn extract_tokens(xml: &str) -> Result<ForecastTokens, WfsError> {
    let location = required_text(xml, "gml:name")?;
    let position_field = required_text(xml, "gml:pos")?;
    let begin_position = required_text(xml, "gml:beginPosition")?;
    let timezone = required_text(xml, "target:timezone")?;
    let tuple_list = required_text(xml, "gml:doubleOrNilReasonTupleList")?;
    let country = tag_text(xml, "target:country").map(str::to_string);

    let stamp = attribute_text(xml, "wfs:FeatureCollection", "timeStamp")
        .ok_or(WfsError::MissingAttribute("timeStamp"))?;
    let timestamp = parse_instant(stamp, "the timeStamp attribute")?;
    let start_time = parse_instant(begin_position, "<gml:beginPosition>")?;

    let headers = field_names(xml)?;
    let values = tuple_list
        .chars()
        .map(|c| if (' '..='~').contains(&c) { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    Ok(ForecastTokens {
        timestamp,
        start_time,
        location: location.to_string(),
        country,
        position_field: position_field.to_string(),
        timezone: timezone.to_string(),
        headers,
        values,
    })
}

fn parse_instant(value: &str, element: &'static str) -> Result<DateTime<Utc>, WfsError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| WfsError::TimestampFormat {
            element,
            value: value.to_string(),
        })
}

fn required_text<'a>(xml: &'a str, tag: &'static str) -> Result<&'a str, WfsError> {
    tag_text(xml, tag).ok_or(WfsError::MissingElement(tag))
}

/// Text content of the first occurrence of `tag`, trimmed.
fn tag_text<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let rest = &xml[find_open_tag(xml, tag)?..];
    let content_start = rest.find('>')? + 1;
    let content_end = rest.find(&format!("</{tag}>"))?;
    if content_end < content_start {
        return None;
    }
    Some(rest[content_start..content_end].trim())
}

/// Byte offset of `<tag` followed by a tag-name boundary.
fn find_open_tag(xml: &str, tag: &str) -> Option<usize> {
    let open = format!("<{tag}");
    let mut search_from = 0;
    while let Some(found) = xml[search_from..].find(&open) {
        let start = search_from + found;
        match xml.as_bytes().get(start + open.len()) {
            Some(b' ' | b'\t' | b'\r' | b'\n' | b'>' | b'/') => return Some(start),
            _ => search_from = start + open.len(),
        }
    }
    None
}

/// Value of `attribute` on the first occurrence of `tag`.
fn attribute_text<'a>(xml: &'a str, tag: &str, attribute: &str) -> Option<&'a str> {
    let rest = &xml[find_open_tag(xml, tag)?..];
    let open_tag = &rest[..rest.find('>')? + 1];
    let marker = format!("{attribute}=\"");
    let value_start = open_tag.find(&marker)? + marker.len();
    let value_end = value_start + open_tag[value_start..].find('"')?;
    Some(&open_tag[value_start..value_end])
}

/// The `name` attributes of the `swe:field` children of the first
/// `swe:DataRecord`, in document order.
fn field_names(xml: &str) -> Result<Vec<String>, WfsError> {
    let record =
        tag_text(xml, "swe:DataRecord").ok_or(WfsError::MissingElement("swe:DataRecord"))?;

    let mut names = Vec::new();
    let mut rest = record;
    while let Some(start) = find_open_tag(rest, "swe:field") {
        rest = &rest[start..];
        let end = rest.find('>').unwrap_or(rest.len());
        if let Some(name) = attribute_text(&rest[..=end.min(rest.len() - 1)], "swe:field", "name") {
            names.push(name.to_string());
        }
        rest = &rest[end.min(rest.len() - 1)..];
    }
    Ok(names)
}
