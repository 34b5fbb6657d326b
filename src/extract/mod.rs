//! Recovering reference strings from container bytes.
//!
//! `strings` pulls readable text out of arbitrary binary content,
//! `paths` splits that text into file-name tokens, and `patterns` searches
//! whole re-decoded buffers for anything the record heuristics missed.

pub mod extensions;
pub mod paths;
pub mod patterns;
pub mod strings;

pub use extensions::{is_valid_file_path, token_extension, ExtensionSet, PathLimit};
pub use paths::PathExtractor;
pub use patterns::{PatternSearch, TextEncoding};
pub use strings::{scan, ExtractionMethod, StringCandidate};
