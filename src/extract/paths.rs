//! Splitting recovered strings into individual file-name tokens.
//!
//! Over-reading record heuristics routinely glue several names together
//! (`a.pngb.jpg`) or leave UTF-16 NUL remnants behind. Tokens are anchored
//! on extension occurrences: each `.ext` is grown leftwards over name
//! characters and ends where the longest recognized extension ends.

use super::extensions::ExtensionSet;

/// Minimum token length, extension included.
const MIN_TOKEN_LEN: usize = 4;

/// Splits concatenated or garbled strings into path candidates
#[derive(Debug, Clone)]
pub struct PathExtractor {
    /// Lowercase extensions, longest first
    extensions: Vec<Vec<char>>,
}

impl PathExtractor {
    pub fn new(extensions: &ExtensionSet) -> Self {
        Self {
            extensions: extensions
                .longest_first()
                .into_iter()
                .map(|e| e.chars().collect())
                .collect(),
        }
    }

    /// Every distinct path token found in `text`, in order of appearance.
    pub fn extract_paths(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        self.extract_into(text, &mut out);

        // UTF-16 text read as bytes leaves a NUL between every character
        if text.contains('\0') {
            let stripped: String = text.chars().filter(|&c| c != '\0').collect();
            self.extract_into(&stripped, &mut out);
        }

        out
    }

    fn extract_into(&self, text: &str, out: &mut Vec<String>) {
        let chars: Vec<char> = text.chars().collect();
        let lower: Vec<char> = chars.iter().map(|c| c.to_ascii_lowercase()).collect();

        // Left expansion never crosses the end of the previous token
        let mut floor = 0;
        let mut i = 0;

        while i < chars.len() {
            if chars[i] != '.' {
                i += 1;
                continue;
            }
            let Some(ext_len) = self.extension_at(&lower, i + 1) else {
                i += 1;
                continue;
            };

            let end = i + 1 + ext_len;
            let mut start = i;
            while start > floor && is_name_char(chars[start - 1]) {
                start -= 1;
            }

            let token: String = chars[start..end].iter().filter(|&&c| c != '\0').collect();
            let token = token.trim();
            if is_plausible(token, end - i) && !out.iter().any(|t| t == token) {
                out.push(token.to_string());
            }

            floor = end;
            i = end;
        }
    }

    /// Length of the longest extension starting at `pos`, if any.
    fn extension_at(&self, lower: &[char], pos: usize) -> Option<usize> {
        self.extensions
            .iter()
            .find(|ext| lower.get(pos..pos + ext.len()) == Some(ext.as_slice()))
            .map(|ext| ext.len())
    }
}

impl Default for PathExtractor {
    fn default() -> Self {
        Self::new(&ExtensionSet::effect())
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// A token needs a real stem in front of its extension.
fn is_plausible(token: &str, ext_with_dot: usize) -> bool {
    if token.chars().count() < MIN_TOKEN_LEN {
        return false;
    }
    let stem_len = token.chars().count().saturating_sub(ext_with_dot);
    token.chars().take(stem_len).any(char::is_alphanumeric)
}
