//! Session info text cleanup.
//!
//! The simulator writes session info as Windows-1252 text that is almost,
//! but not quite, YAML:
//! - a handful of byte values are undefined in the codepage
//! - the region is null padded
//! - free-text driver fields are emitted unquoted and may hold `"` or `\`
//! - some values begin with a comma
//!
//! This module turns the raw bytes of one section into text a YAML parser
//! accepts, and locates sections inside the region.

use regex::Regex;
use std::sync::LazyLock;

/// Bytes with no Windows-1252 mapping; replaced with spaces before decoding.
const UNDEFINED_CP1252: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// Windows-1252 code points for 0x80..=0x9F. Undefined slots map to space.
const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', ' ', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', ' ', '\u{017D}', ' ',
    ' ', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', ' ', '\u{017E}', '\u{0178}',
];

/// Free-text fields in `DriverInfo` that must be quoted.
static DRIVER_TEXT_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"((?:DriverSetupName|UserName|TeamName|AbbrevName|Initials): )(.*)").unwrap()
});

/// Values that start with a comma, e.g. `CarDesignStr: ,ffffff`.
static LEADING_COMMA_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+: )(,.*)").unwrap());

/// Section key whose free-text fields get quoted.
pub const DRIVER_INFO_KEY: &str = "DriverInfo";

/// Decode Windows-1252 bytes after replacing undefined bytes with spaces.
pub fn decode_cp1252(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            b if UNDEFINED_CP1252.contains(&b) => ' ',
            0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize],
            _ => char::from(b),
        })
        .collect()
}

/// Characters a YAML 1.1 reader accepts in a stream.
fn is_yaml_printable(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{7E}' | '\u{85}' | '\u{A0}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// Turn the raw bytes of section `key` into parseable YAML text.
///
/// Steps, in order: strip trailing null padding, decode Windows-1252 (with
/// undefined bytes as spaces), drop non-printable characters, quote and
/// escape free-text driver fields when `key` is `DriverInfo`, and quote
/// values that begin with a comma.
pub fn sanitize_section(key: &str, raw: &[u8]) -> String {
    let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    let mut text: String = decode_cp1252(&raw[..end]).chars().filter(|&c| is_yaml_printable(c)).collect();

    if key == DRIVER_INFO_KEY {
        text = DRIVER_TEXT_FIELD
            .replace_all(&text, |caps: &regex::Captures<'_>| {
                let escaped = caps[2].replace('\\', "\\\\").replace('"', "\\\"");
                format!("{}\"{}\"", &caps[1], escaped)
            })
            .into_owned();
    }

    LEADING_COMMA_VALUE.replace_all(&text, "${1}\"${2}\"").into_owned()
}

/// Locate the raw bytes of section `key` inside the session info region.
///
/// A section is introduced by `\n<key>:\n` and runs up to, not including,
/// the next blank line. Returns `None` when either marker is missing.
pub fn find_section<'a>(region: &'a [u8], key: &str) -> Option<&'a [u8]> {
    let marker = format!("\n{key}:\n");
    let start = find(region, marker.as_bytes(), 0)? + 1;
    let end = find(region, b"\n\n", start)?;
    Some(&region[start..end])
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

/// Whole session info region as text, for dumps and diagnostics.
pub fn region_text(region: &[u8]) -> String {
    let end = region.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    decode_cp1252(&region[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cp1252_high_bytes_decode_to_unicode() {
        assert_eq!(decode_cp1252(b"\x80 \x93x\x94 \xE9"), "\u{20AC} \u{201C}x\u{201D} \u{E9}");
    }

    #[test]
    fn undefined_bytes_become_spaces() {
        assert_eq!(decode_cp1252(b"a\x81b\x8Dc\x8Fd\x90e\x9Df"), "a b c d e f");
    }

    #[test]
    fn trailing_nulls_and_control_characters_are_removed() {
        let raw = b"WeekendInfo:\n TrackName: spa\x01\x07\n\0\0\0";
        let text = sanitize_section("WeekendInfo", raw);
        assert_eq!(text, "WeekendInfo:\n TrackName: spa\n");
    }

    #[test]
    fn driver_text_fields_are_quoted_and_escaped() {
        let raw = b"DriverInfo:\n Drivers:\n - UserName: Mike \"Wheels\" O\\Neil\n   TeamName: Fast & Co\n   CarIdx: 1";
        let text = sanitize_section("DriverInfo", raw);
        assert!(text.contains(r#"UserName: "Mike \"Wheels\" O\\Neil""#), "{text}");
        assert!(text.contains(r#"TeamName: "Fast & Co""#), "{text}");
        assert!(text.contains("CarIdx: 1"));

        let parsed: serde_yaml_ng::Value = serde_yaml_ng::from_str(&text).unwrap();
        let name = &parsed["DriverInfo"]["Drivers"][0]["UserName"];
        assert_eq!(name.as_str(), Some("Mike \"Wheels\" O\\Neil"));
    }

    #[test]
    fn driver_fields_outside_driver_info_are_untouched() {
        let text = sanitize_section("WeekendInfo", b"WeekendInfo:\n UserName: x");
        assert_eq!(text, "WeekendInfo:\n UserName: x");
    }

    #[test]
    fn leading_comma_values_are_quoted() {
        let text = sanitize_section("DriverInfo", b"DriverInfo:\n CarDesignStr: ,ff0000,000000");
        assert_eq!(text, "DriverInfo:\n CarDesignStr: \",ff0000,000000\"");
    }

    #[test]
    fn sections_are_found_between_markers() {
        let region = b"---\nWeekendInfo:\n TrackName: spa\n\nSessionInfo:\n Sessions: []\n\n\0\0";
        assert_eq!(find_section(region, "WeekendInfo").unwrap(), b"WeekendInfo:\n TrackName: spa");
        assert_eq!(find_section(region, "SessionInfo").unwrap(), b"SessionInfo:\n Sessions: []");
        assert!(find_section(region, "DriverInfo").is_none());
    }

    #[test]
    fn unterminated_section_is_not_found() {
        let region = b"---\nWeekendInfo:\n TrackName: spa\n\0\0";
        assert!(find_section(region, "WeekendInfo").is_none());
    }

    #[test]
    fn region_text_stops_at_padding() {
        assert_eq!(region_text(b"---\nA:\n\0\0"), "---\nA:\n");
    }
}
