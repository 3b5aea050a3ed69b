//! Text helpers shared by callers comparing bundle output

/// Convert CRLF and lone CR line endings to LF
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
