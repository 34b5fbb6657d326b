//! Extension tables and the token validity filter shared by every
//! extraction pass.

use std::path::Path;

/// Image formats that count as target assets by default.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "tga", "dds", "bmp", "tiff", "tif", "webp", "ktx", "pvr",
];

/// Effect container formats.
pub const CONTAINER_EXTENSIONS: &[&str] = &["efk", "efkmat", "efkmodel"];

/// Mesh formats an effect model may point at in addition to images.
pub const MODEL_EXTENSIONS: &[&str] = &["obj", "fbx", "3ds", "dae"];

/// Default universe: images plus the effect containers that can themselves
/// be referenced (`.efk` files are roots and never reported).
pub const DEFAULT_TARGET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "tga", "dds", "bmp", "tiff", "tif", "webp", "ktx", "pvr", "efkmat",
    "efkmodel",
];

/// Characters that can never appear in a reference token.
const INVALID_PATH_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Upper bound on token length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathLimit {
    /// Classic filesystem limit, used for tokens split out of string records
    Filesystem,
    /// Looser bound for whole-buffer pattern matches that may carry long
    /// directory chains
    Reference,
}

impl PathLimit {
    pub fn max_len(&self) -> usize {
        match self {
            PathLimit::Filesystem => 260,
            PathLimit::Reference => 500,
        }
    }
}

/// A lowercase, dot-less extension allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSet {
    extensions: Vec<String>,
}

impl ExtensionSet {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list: Vec<String> = Vec::new();
        for ext in extensions {
            let ext = ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase();
            if !ext.is_empty() && !list.contains(&ext) {
                list.push(ext);
            }
        }
        Self { extensions: list }
    }

    /// Images plus effect containers
    pub fn effect() -> Self {
        Self::new(IMAGE_EXTENSIONS.iter().chain(CONTAINER_EXTENSIONS))
    }

    /// Images, effect containers and mesh formats
    pub fn effect_model() -> Self {
        Self::new(
            IMAGE_EXTENSIONS
                .iter()
                .chain(CONTAINER_EXTENSIONS)
                .chain(MODEL_EXTENSIONS),
        )
    }

    pub fn images() -> Self {
        Self::new(IMAGE_EXTENSIONS)
    }

    pub fn default_targets() -> Self {
        Self::new(DEFAULT_TARGET_EXTENSIONS)
    }

    pub fn contains(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// Whether `path` ends in one of the extensions (case-insensitive).
    pub fn matches_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.contains(e))
            .unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    /// Extensions sorted longest first, so `efkmat` is tried before `efk`.
    pub fn longest_first(&self) -> Vec<&str> {
        let mut sorted: Vec<&str> = self.iter().collect();
        sorted.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        sorted
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// True when the lowercase `text` contains `.ext` for any member.
    pub fn mentioned_in(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.extensions
            .iter()
            .any(|ext| lower.contains(&format!(".{}", ext)))
    }
}

/// Extension of a reference token, lowercased, without the dot.
pub fn token_extension(token: &str) -> Option<String> {
    let name = token.rsplit(['/', '\\']).next()?;
    let dot = name.rfind('.')?;
    if dot == 0 || dot + 1 == name.len() {
        return None;
    }
    Some(name[dot + 1..].to_ascii_lowercase())
}

/// Noise filter applied to every extracted token.
pub fn is_valid_file_path(token: &str, allowed: &ExtensionSet, limit: PathLimit) -> bool {
    if token.is_empty() || token.chars().count() > limit.max_len() {
        return false;
    }
    if token.contains(INVALID_PATH_CHARS) {
        return false;
    }
    match token_extension(token) {
        Some(ext) => allowed.contains(&ext),
        None => false,
    }
}
