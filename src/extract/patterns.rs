//! Whole-buffer pattern search for references the record heuristics miss.
//!
//! The buffer is re-decoded under several text encodings and an
//! extension-anchored path regex is run over each view.

use super::extensions::{is_valid_file_path, ExtensionSet, PathLimit};
use super::strings::{decode_utf16_lossy, Endian};
use regex::Regex;
use tracing::trace;

/// Text views the pattern search decodes the buffer into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Ascii,
    Latin1,
}

impl TextEncoding {
    pub const ALL: [TextEncoding; 5] = [
        TextEncoding::Utf8,
        TextEncoding::Utf16Le,
        TextEncoding::Utf16Be,
        TextEncoding::Ascii,
        TextEncoding::Latin1,
    ];

    /// Decode ignoring whatever does not fit the encoding.
    pub fn decode(&self, buffer: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(buffer)
                .chars()
                .filter(|&c| c != char::REPLACEMENT_CHARACTER)
                .collect(),
            TextEncoding::Utf16Le => decode_utf16_lossy(buffer, Endian::Little),
            TextEncoding::Utf16Be => decode_utf16_lossy(buffer, Endian::Big),
            TextEncoding::Ascii => buffer
                .iter()
                .filter(|b| b.is_ascii())
                .map(|&b| b as char)
                .collect(),
            TextEncoding::Latin1 => buffer.iter().map(|&b| b as char).collect(),
        }
    }
}

/// Regex search for extension-anchored path tokens in decoded text
#[derive(Debug, Clone)]
pub struct PatternSearch {
    pattern: Regex,
    extensions: ExtensionSet,
}

impl PatternSearch {
    pub fn new(extensions: &ExtensionSet) -> Result<Self, regex::Error> {
        let alternation = extensions
            .longest_first()
            .into_iter()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("|");
        // An empty alternation would match any dotted word; `[^\s\S]` never matches
        let alternation = if alternation.is_empty() {
            r"[^\s\S]".to_string()
        } else {
            alternation
        };
        let source = format!(r"(?i)[a-z0-9_\-.\\/]+\.(?:{})", alternation);

        Ok(Self {
            pattern: Regex::new(&source)?,
            extensions: extensions.clone(),
        })
    }

    /// Matches in a single piece of text that pass the validity filter.
    pub fn find_in_text(&self, text: &str) -> Vec<String> {
        self.pattern
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|token| is_valid_file_path(token, &self.extensions, PathLimit::Reference))
            .filter(|token| has_stem(token))
            .map(str::to_string)
            .collect()
    }

    /// Decode `buffer` under every encoding and collect distinct matches.
    pub fn search(&self, buffer: &[u8]) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for encoding in TextEncoding::ALL {
            let text = encoding.decode(buffer);
            let found = self.find_in_text(&text);
            trace!("{:?} view: {} pattern matches", encoding, found.len());
            for token in found {
                if !out.contains(&token) {
                    out.push(token);
                }
            }
        }
        out
    }

    /// Raw-byte backward scan: for each `.ext` occurrence, walk back over
    /// printable ASCII until a path separator.
    pub fn search_raw(&self, buffer: &[u8]) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for ext in self.extensions.longest_first() {
            let needle = format!(".{}", ext);
            let needle = needle.as_bytes();
            let mut pos = 0;
            while let Some(hit) = find_bytes(&buffer[pos..], needle) {
                let dot = pos + hit;
                let mut start = dot;
                while start > 0 {
                    let byte = buffer[start - 1];
                    if byte == b'\\' || byte == b'/' || !(0x20..=0x7e).contains(&byte) {
                        break;
                    }
                    start -= 1;
                }
                if start < dot {
                    let token = String::from_utf8_lossy(&buffer[start..dot + needle.len()]);
                    let token = token.trim();
                    if is_valid_file_path(token, &self.extensions, PathLimit::Filesystem)
                        && has_stem(token)
                        && !out.iter().any(|t| t == token)
                    {
                        out.push(token.to_string());
                    }
                }
                pos = dot + 1;
            }
        }
        out
    }
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn has_stem(token: &str) -> bool {
    let name = token.rsplit(['/', '\\']).next().unwrap_or(token);
    match name.rfind('.') {
        Some(dot) => name[..dot].chars().any(char::is_alphanumeric),
        None => false,
    }
}
