//! Logging helpers for radio payloads. Text-format telemetry is multi-line and
//! peers may send arbitrary bytes, so everything is escaped onto one line and capped.

use std::fmt::Write;

/// Escape a string for single-line logging:
/// - `\n` => `\\n`
/// - `\r` => `\\r`
/// - `\t` => `\\t`
/// - backslash => `\\\\`
/// - other control characters => `\\xNN`
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Render an inbound payload for a log line. Invalid UTF-8 is replaced, the
/// text is escaped, and anything past `max_bytes` is cut on a char boundary
/// with `...` appended.
pub fn escape_payload(payload: &[u8], max_bytes: usize) -> String {
    let text = String::from_utf8_lossy(payload);
    if text.len() <= max_bytes {
        return escape_log(&text);
    }
    let mut cut = max_bytes.saturating_sub(3);
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut out = escape_log(&text[..cut]);
    out.push_str("...");
    out
}

/// Transport node numbers are shown as 8 uppercase hex digits.
pub fn format_node_id(node: u32) -> String {
    format!("{:08X}", node)
}
