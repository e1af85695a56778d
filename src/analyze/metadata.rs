// src/analyze/metadata.rs
//! Embedded image metadata: extraction (PNG text chunks, SVG metadata/comments,
//! EXIF tags) and the metadata signal category.

use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::io::Cursor;

use super::{bool_score, zeroed};
use crate::candidate::SubScores;

pub const METADATA_KEYS: [&str; 4] = [
    "copyright_score",
    "software_score",
    "date_score",
    "guidelines_score",
];

const DESIGN_SOFTWARE: [&str; 5] = ["adobe", "sketch", "figma", "illustrator", "inkscape"];

/// Key/value pairs found in the image container.
pub type MetadataEntries = Vec<(String, String)>;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// EXIF tags worth reading, under the names they are reported as.
const EXIF_TAGS: [(exif::Tag, &str); 6] = [
    (exif::Tag::Copyright, "Copyright"),
    (exif::Tag::Software, "Software"),
    (exif::Tag::Artist, "Artist"),
    (exif::Tag::ImageDescription, "ImageDescription"),
    (exif::Tag::DateTimeOriginal, "DateTimeOriginal"),
    (exif::Tag::DateTime, "DateTime"),
];

static RE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b((?:19|20)\d{2})\b").expect("year regex"));

/// Collect metadata from raw image bytes. Never fails; unknown containers yield nothing.
pub fn extract_metadata(bytes: &[u8], is_svg: bool) -> MetadataEntries {
    if is_svg {
        return std::str::from_utf8(bytes)
            .map(svg_metadata)
            .unwrap_or_default();
    }
    let mut entries = if bytes.starts_with(PNG_SIGNATURE) {
        png_text_chunks(bytes)
    } else {
        Vec::new()
    };
    entries.extend(exif_fields(bytes));
    entries
}

/// `tEXt` and uncompressed `iTXt` chunks of a PNG stream.
pub fn png_text_chunks(bytes: &[u8]) -> MetadataEntries {
    let mut out = Vec::new();
    let mut pos = PNG_SIGNATURE.len();
    while pos + 8 <= bytes.len() {
        let len = u32::from_be_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
            as usize;
        let kind = &bytes[pos + 4..pos + 8];
        let data_start = pos + 8;
        let Some(data_end) = data_start.checked_add(len).filter(|e| *e <= bytes.len()) else {
            break;
        };
        let data = &bytes[data_start..data_end];
        match kind {
            b"tEXt" => {
                if let Some(nul) = data.iter().position(|b| *b == 0) {
                    out.push((latin1(&data[..nul]), latin1(&data[nul + 1..])));
                }
            }
            b"iTXt" => {
                if let Some(entry) = itxt_entry(data) {
                    out.push(entry);
                }
            }
            b"IEND" => break,
            _ => {}
        }
        // chunk data + 4-byte CRC
        pos = data_end + 4;
    }
    out
}

fn itxt_entry(data: &[u8]) -> Option<(String, String)> {
    let nul = data.iter().position(|b| *b == 0)?;
    let keyword = latin1(&data[..nul]);
    let compressed = *data.get(nul + 1)?;
    if compressed != 0 {
        return None;
    }
    // skip compression method, then language tag and translated keyword (both NUL-terminated)
    let mut rest = data.get(nul + 3..)?;
    for _ in 0..2 {
        let end = rest.iter().position(|b| *b == 0)?;
        rest = &rest[end + 1..];
    }
    Some((keyword, String::from_utf8_lossy(rest).into_owned()))
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|b| *b as char).collect()
}

/// Text of `<title>`, `<desc>`, `<metadata>` descendants and XML comments.
pub fn svg_metadata(text: &str) -> MetadataEntries {
    let mut reader = Reader::from_str(text);
    let mut out = Vec::new();
    let mut stack: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                stack.push(name);
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Text(t)) => {
                let in_meta = stack
                    .iter()
                    .any(|n| matches!(n.as_str(), "metadata" | "title" | "desc"));
                if !in_meta {
                    continue;
                }
                let value = t
                    .unescape()
                    .map(|c| c.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                let value = value.trim();
                if !value.is_empty() {
                    let key = stack.last().cloned().unwrap_or_default();
                    out.push((key, value.to_string()));
                }
            }
            Ok(Event::Comment(c)) => {
                let value = String::from_utf8_lossy(&c).trim().to_string();
                if !value.is_empty() {
                    out.push(("comment".to_string(), value));
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    out
}

/// Known EXIF tags of a JPEG/PNG/WebP/TIFF container, keyed by tag name.
pub fn exif_fields(bytes: &[u8]) -> MetadataEntries {
    let Ok(exif) = exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) else {
        return Vec::new();
    };
    EXIF_TAGS
        .iter()
        .filter_map(|(tag, name)| {
            let field = exif.get_field(*tag, exif::In::PRIMARY)?;
            let value = match &field.value {
                exif::Value::Ascii(parts) => parts
                    .iter()
                    .map(|p| String::from_utf8_lossy(p).trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect::<Vec<_>>()
                    .join(" "),
                _ => field.display_value().to_string(),
            };
            (!value.is_empty()).then(|| (name.to_string(), value))
        })
        .collect()
}

fn creation_year(entries: &MetadataEntries) -> Option<u32> {
    for (key, value) in entries {
        let k = key.to_lowercase();
        let caps = if k.contains("creation") || k.contains("date") {
            RE_YEAR.captures(value)
        } else {
            None
        };
        if let Some(year) = caps.and_then(|c| c.get(1)).and_then(|m| m.as_str().parse().ok()) {
            return Some(year);
        }
    }
    None
}

pub fn metadata(entries: &MetadataEntries) -> SubScores {
    let mut s = zeroed(&METADATA_KEYS);
    if entries.is_empty() {
        return s;
    }
    let blob = entries
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase();

    s.insert("copyright_score".into(), bool_score(blob.contains("copyright")));
    s.insert(
        "software_score".into(),
        bool_score(DESIGN_SOFTWARE.iter().any(|sw| blob.contains(sw))),
    );
    if let Some(year) = creation_year(entries) {
        s.insert("date_score".into(), if year >= 2020 { 1.0 } else { 0.5 });
    }
    s.insert(
        "guidelines_score".into(),
        bool_score(blob.contains("brand") || blob.contains("guidelines")),
    );
    s
}
