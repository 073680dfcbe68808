//! Edit-decision serializers.
//!
//! Three stable interchange formats are produced from the same keep-segment
//! list: FCPXML 1.10 for Final Cut Pro, XMEML v5 for Premiere / After
//! Effects, and CMX 3600 EDL plaintext for DaVinci Resolve and friends.
//! Writers return strings; file I/O belongs to the command layer.

pub mod edl;
pub mod fcpxml;
pub mod timecode;
pub mod xmeml;

pub use edl::EdlWriter;
pub use fcpxml::FcpXmlWriter;
pub use xmeml::XmemlWriter;

use std::path::Path;

/// Strip characters FCP chokes on and truncate to 50 characters.
pub(crate) fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '<' | '>' | '&' | '"' | '\''))
        .take(50)
        .collect()
}

/// Percent-encode an absolute path into a `file://` URL.
///
/// Everything outside `[A-Za-z0-9/:@._-]` is percent-encoded byte-wise.
pub(crate) fn encode_file_url(path: &Path) -> String {
    let mut url = String::from("file://");
    url.push_str(&percent_encode_path(path));
    url
}

pub(crate) fn percent_encode_path(path: &Path) -> String {
    let mut out = String::new();
    for byte in path.to_string_lossy().bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'/' | b':' | b'@' | b'.' | b'_' | b'-' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Escape the five XML-reserved characters for text and attribute content.
pub(crate) fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
