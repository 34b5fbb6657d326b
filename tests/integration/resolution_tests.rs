//! Reference resolution and directory-scope behavior against real trees.

use assetsweep::analysis::{
    compute_unused, in_scope, ReferenceCandidate, ReferenceResolver, ResolutionStatus,
    ResolutionTier,
};
use assetsweep::discovery::{AssetFile, ProjectIndex};
use assetsweep::extract::ExtensionSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Tree {
    _dir: TempDir,
    root: PathBuf,
    index: ProjectIndex,
}

impl Tree {
    fn new(files: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        for file in files {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, b"data").unwrap();
        }
        let index = ProjectIndex::from_paths(&root, files.iter().map(|f| root.join(f)));
        Self {
            _dir: dir,
            root,
            index,
        }
    }

    fn resolver(&self) -> ReferenceResolver<'_> {
        ReferenceResolver::new(&self.index, ExtensionSet::default_targets())
    }

    fn candidate(&self, container: &str, text: &str) -> ReferenceCandidate {
        ReferenceCandidate::new(text, &self.root.join(container))
    }

    fn asset(&self, relative: &str) -> AssetFile {
        let path = self.root.join(relative);
        AssetFile {
            extension: path.extension().unwrap().to_string_lossy().to_lowercase(),
            size: 4,
            path,
        }
    }
}

#[test]
fn test_anchor_relative_beats_same_named_file() {
    // Both copies are in scope; the directory written in the reference wins
    let tree = Tree::new(&["fx/glow.png", "fx/tex/glow.png"]);
    let resolved = tree
        .resolver()
        .resolve_candidate(&tree.candidate("fx/boom.efk", "tex/glow.png"));

    assert_eq!(resolved.tier, Some(ResolutionTier::AnchorRelative));
    assert_eq!(resolved.resolved(), Some(tree.root.join("fx/tex/glow.png").as_path()));
}

#[test]
fn test_backslash_references() {
    let tree = Tree::new(&["fx/Texture/Fire/flame.png"]);
    let resolved = tree
        .resolver()
        .resolve_candidate(&tree.candidate("fx/boom.efk", "Texture\\Fire\\flame.png"));
    assert_eq!(resolved.resolved(), Some(tree.root.join("fx/Texture/Fire/flame.png").as_path()));
}

#[test]
fn test_case_insensitive_suffix_match() {
    let tree = Tree::new(&["fx/Texture/Fire/flame.png"]);
    let resolved = tree
        .resolver()
        .resolve_candidate(&tree.candidate("fx/boom.efk", "texture/FIRE/Flame.PNG"));
    assert!(resolved.resolved().is_some());
    assert!(matches!(
        resolved.tier,
        Some(ResolutionTier::AnchorRelative) | Some(ResolutionTier::PathSuffix)
    ));
}

#[test]
fn test_sibling_resolution_is_cross_directory() {
    let tree = Tree::new(&["a/x.efk", "b/glow.png"]);
    let resolved = tree
        .resolver()
        .resolve_candidate(&tree.candidate("a/x.efk", "glow.png"));

    assert!(resolved.is_cross_directory());
    assert_eq!(resolved.resolved(), None);
    assert_eq!(
        resolved.status,
        ResolutionStatus::CrossDirectory(tree.root.join("b/glow.png"))
    );
}

#[test]
fn test_parent_escape_is_cross_directory() {
    let tree = Tree::new(&["fx/boom/boom.efk", "fx/mat/water.efkmat"]);
    let resolved = tree
        .resolver()
        .resolve_candidate(&tree.candidate("fx/boom/boom.efk", "../mat/water.efkmat"));

    assert_eq!(
        resolved.status,
        ResolutionStatus::CrossDirectory(tree.root.join("fx/mat/water.efkmat"))
    );
}

#[test]
fn test_local_copy_preferred_over_project_copy() {
    let tree = Tree::new(&["fx/glow.png", "other/glow.png"]);
    let resolved = tree
        .resolver()
        .resolve_candidate(&tree.candidate("other/o.efk", "glow.png"));
    assert_eq!(resolved.resolved(), Some(tree.root.join("other/glow.png").as_path()));
}

#[test]
fn test_fuzzy_name_in_scope() {
    let tree = Tree::new(&["fx/Fire-Ball.png"]);
    let resolved = tree
        .resolver()
        .resolve_candidate(&tree.candidate("fx/boom.efk", "fire_ball.png"));
    assert_eq!(resolved.tier, Some(ResolutionTier::Fuzzy));
    assert!(resolved.resolved().is_some());
}

#[test]
fn test_dangling_reference_is_unresolved() {
    let tree = Tree::new(&["fx/glow.png"]);
    let resolved = tree
        .resolver()
        .resolve_candidate(&tree.candidate("fx/boom.efk", "missing.png"));
    assert!(resolved.is_unresolved());
    assert_eq!(resolved.tier, None);
}

#[test]
fn test_in_scope_predicate() {
    assert!(in_scope(Path::new("/p/fx/a.efk"), Path::new("/p/fx/a.png")));
    assert!(in_scope(Path::new("/p/fx/a.efk"), Path::new("/p/fx/sub/deep/a.png")));
    assert!(!in_scope(Path::new("/p/fx/a.efk"), Path::new("/p/a.png")));
    assert!(!in_scope(Path::new("/p/fx/a.efk"), Path::new("/p/fxx/a.png")));
    assert!(!in_scope(Path::new("/p/fx/a.efk"), Path::new("/p/fx/../other/a.png")));
}

#[test]
fn test_unused_excludes_every_in_scope_resolution() {
    let tree = Tree::new(&[
        "fx/boom.efk",
        "fx/boom_particle.png",
        "fx/sub/smoke.tga",
        "other/orphan.png",
        "other/glow.png",
    ]);
    let resolver = tree.resolver();
    let resolved: Vec<_> = [
        tree.candidate("fx/boom.efk", "boom_particle.png"),
        tree.candidate("fx/boom.efk", "smoke.tga"),
        tree.candidate("fx/boom.efk", "glow.png"),
        tree.candidate("fx/boom.efk", "missing.png"),
    ]
    .iter()
    .map(|c| resolver.resolve_candidate(c))
    .collect();

    let universe = vec![
        tree.asset("fx/boom_particle.png"),
        tree.asset("fx/sub/smoke.tga"),
        tree.asset("other/glow.png"),
        tree.asset("other/orphan.png"),
    ];
    let set = compute_unused(&universe, &resolved, &tree.root);

    let unused: Vec<_> = set.unused.iter().map(|a| a.path.clone()).collect();
    assert_eq!(
        unused,
        vec![tree.root.join("other/glow.png"), tree.root.join("other/orphan.png")]
    );
    assert_eq!(set.referenced.len(), 2);
    assert_eq!(set.total_bytes(), 8);
}
