//! Directory-scope rules and lexical path helpers.

use std::path::{Component, Path, PathBuf};

/// Fold `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` above the root stays at the root; a leading `..` on a
                // relative path is kept
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True iff `path` lives in `dir` or one of its subdirectories.
pub fn dir_contains(dir: &Path, path: &Path) -> bool {
    let dir = normalize_path(dir);
    let parent = normalize_path(path.parent().unwrap_or_else(|| Path::new("")));
    parent.starts_with(&dir)
}

/// The resolved file's directory equals the container's directory or
/// descends from it.
pub fn in_scope(container_path: &Path, resolved_path: &Path) -> bool {
    match container_path.parent() {
        Some(dir) => dir_contains(dir, resolved_path),
        None => false,
    }
}

/// `path` relative to `base` with `/` separators, if it is under `base`.
pub fn relative_unix(path: &Path, base: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// Reference text with `\` turned into `/` and outer slashes trimmed.
pub fn clean_reference(reference: &str) -> String {
    reference.replace('\\', "/").trim_matches('/').to_string()
}

/// True when the reference names a directory as well as a file.
pub fn has_separator(reference: &str) -> bool {
    reference.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("/a/b/../c/./d.png")), PathBuf::from("/a/c/d.png"));
        assert_eq!(normalize_path(Path::new("/a/../../b")), PathBuf::from("/b"));
        assert_eq!(normalize_path(Path::new("../x/y")), PathBuf::from("../x/y"));
        assert_eq!(normalize_path(Path::new("a/../../x")), PathBuf::from("../x"));
    }

    #[test]
    fn test_in_scope_same_and_descendant() {
        let container = Path::new("/p/fx/boom.efk");
        assert!(in_scope(container, Path::new("/p/fx/boom.png")));
        assert!(in_scope(container, Path::new("/p/fx/tex/deep/boom.png")));
    }

    #[test]
    fn test_out_of_scope_sibling_and_parent() {
        let container = Path::new("/p/fx/boom.efk");
        assert!(!in_scope(container, Path::new("/p/other/boom.png")));
        assert!(!in_scope(container, Path::new("/p/boom.png")));
        // Prefix of the directory name is not containment
        assert!(!in_scope(container, Path::new("/p/fxtra/boom.png")));
    }

    #[test]
    fn test_in_scope_normalizes() {
        let container = Path::new("/p/fx/boom.efk");
        assert!(in_scope(container, Path::new("/p/fx/tex/../boom.png")));
        assert!(!in_scope(container, Path::new("/p/fx/../other/boom.png")));
    }

    #[test]
    fn test_relative_unix() {
        assert_eq!(
            relative_unix(Path::new("/p/fx/tex/a.png"), Path::new("/p/fx")),
            Some("tex/a.png".to_string())
        );
        assert_eq!(relative_unix(Path::new("/q/a.png"), Path::new("/p")), None);
    }

    #[test]
    fn test_clean_reference() {
        assert_eq!(clean_reference("\\Texture\\fx\\a.png"), "Texture/fx/a.png");
        assert!(has_separator("tex\\a.png"));
        assert!(!has_separator("a.png"));
    }
}
