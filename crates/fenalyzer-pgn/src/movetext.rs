//! Movetext tokenization.
//!
//! Only the mainline matters for position extraction: comments, NAGs,
//! move numbers, annotation suffixes and recursive variations are dropped.

use std::borrow::Cow;

/// Game termination markers.
pub const TERMINATION_MARKERS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

pub fn is_termination(token: &str) -> bool {
    TERMINATION_MARKERS.contains(&token)
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'{' | b'}' | b'(' | b')' | b';')
}

/// Mainline SAN tokens of a movetext section, in order, up to the first
/// termination marker.
pub fn mainline_sans(movetext: &str) -> Vec<Cow<'_, str>> {
    let bytes = movetext.as_bytes();
    let mut sans = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                i = find_from(bytes, i + 1, b'}').map_or(bytes.len(), |end| end + 1);
            }
            b';' => {
                i = find_from(bytes, i + 1, b'\n').map_or(bytes.len(), |end| end + 1);
            }
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            b if is_delimiter(b) => i += 1,
            _ => {
                let start = i;
                while i < bytes.len() && !is_delimiter(bytes[i]) {
                    i += 1;
                }
                if depth > 0 {
                    continue;
                }
                let token = &movetext[start..i];
                if is_termination(token) {
                    break;
                }
                if let Some(san) = clean_token(token) {
                    sans.push(san);
                }
            }
        }
    }

    sans
}

fn find_from(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes[from.min(bytes.len())..]
        .iter()
        .position(|&b| b == needle)
        .map(|offset| from + offset)
}

/// Reduce a raw movetext token to a SAN string, or `None` for tokens that
/// carry no move (NAGs, bare move numbers, bare annotation glyphs).
fn clean_token(token: &str) -> Option<Cow<'_, str>> {
    if token.starts_with('$') {
        return None;
    }

    // Move number prefix: "12." / "12..." / "12.e4"
    let mut tok = token;
    let digits = tok.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits > 0 && tok[digits..].starts_with('.') {
        tok = tok[digits..].trim_start_matches('.');
    }

    let tok = tok.trim_end_matches(['!', '?']);
    if tok.is_empty() {
        return None;
    }

    // Zero-digit castling appears in hand-written files.
    if tok.starts_with("0-0") {
        return Some(Cow::Owned(tok.replace('0', "O")));
    }

    Some(Cow::Borrowed(tok))
}

/// Incremental scanner over movetext lines, used by the reader to find
/// where one game record ends.
#[derive(Debug, Default)]
pub(crate) struct MovetextScanner {
    in_comment: bool,
    depth: usize,
}

impl MovetextScanner {
    /// Whether the scanner is inside a `{...}` comment spanning lines.
    pub(crate) fn in_comment(&self) -> bool {
        self.in_comment
    }

    /// Whether the scanner is inside an unfinished variation.
    pub(crate) fn in_variation(&self) -> bool {
        self.depth > 0
    }

    /// Feed one line. Returns `true` once a mainline termination marker has
    /// been seen.
    pub(crate) fn feed(&mut self, line: &str) -> bool {
        let bytes = line.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if self.in_comment {
                match find_from(bytes, i, b'}') {
                    Some(end) => {
                        self.in_comment = false;
                        i = end + 1;
                    }
                    None => return false,
                }
                continue;
            }
            match bytes[i] {
                b'{' => {
                    self.in_comment = true;
                    i += 1;
                }
                b';' => return false,
                b'(' => {
                    self.depth += 1;
                    i += 1;
                }
                b')' => {
                    self.depth = self.depth.saturating_sub(1);
                    i += 1;
                }
                b if is_delimiter(b) => i += 1,
                _ => {
                    let start = i;
                    while i < bytes.len() && !is_delimiter(bytes[i]) {
                        i += 1;
                    }
                    if self.depth == 0 && is_termination(&line[start..i]) {
                        return true;
                    }
                }
            }
        }
        false
    }
}
