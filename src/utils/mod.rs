use std::sync::OnceLock;

use regex::Regex;

static SLUG_STRIP: OnceLock<Regex> = OnceLock::new();

fn slug_strip() -> &'static Regex {
    SLUG_STRIP.get_or_init(|| {
        Regex::new(r"[^A-Za-z0-9_\x{4e00}-\x{9fa5}]").expect("static slug pattern")
    })
}

/// Strips everything but ASCII word characters and CJK unified ideographs.
pub fn section_slug(label: &str) -> String {
    slug_strip().replace_all(label, "").into_owned()
}

/// Percent-encodes the way `encodeURI` does: reserved URI characters and
/// unreserved marks pass through, everything else (including `%`) is
/// encoded as uppercase UTF-8 escapes.
pub fn encode_uri(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for b in input.as_bytes() {
        match *b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' => out.push(*b as char),
            b';' | b',' | b'/' | b'?' | b':' | b'@' | b'&' | b'=' | b'+' | b'$' | b'#' => {
                out.push(*b as char)
            }
            b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')' => out.push(*b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn escape_attr(value: &str) -> String {
    escape_html(value)
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
