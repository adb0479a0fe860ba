//! Sanitization of radio-supplied text for logging.
//! A noisy serial link can hand us anything; log lines must stay single-line
//! and printable.

use std::fmt::Write;

const MAX_PREVIEW: usize = 160;

/// Flatten a string to one printable log line: common control characters
/// become their escape sequences, the rest of them become `\u{..}`, and
/// anything past the preview cap is cut with an ellipsis.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 4);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push_str("...");
            break;
        }
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\u{{{:02x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_log;

    #[test]
    fn escapes_line_breaks_and_controls() {
        assert_eq!(escape_log("a\nb\r\tc\x07"), "a\\nb\\r\\tc\\u{07}");
    }

    #[test]
    fn long_input_is_capped() {
        let long = "x".repeat(500);
        let out = escape_log(&long);
        assert!(out.ends_with("..."));
        assert!(out.len() < 200);
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(escape_log("N2:hello"), "N2:hello");
    }
}
