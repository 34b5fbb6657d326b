//! End-to-end scans over temporary project trees.

use assetsweep::analysis::ResolutionStatus;
use assetsweep::config::Config;
use assetsweep::scan::{ScanOrchestrator, ScanPhase, ScanSession};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A project tree rooted at a canonical temp directory
struct Project {
    _dir: TempDir,
    root: PathBuf,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        Self { _dir: dir, root }
    }

    fn write(&self, relative: &str, contents: &[u8]) -> &Self {
        let path = self.root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
        self
    }

    fn scan(&self, config: Config) -> ScanSession {
        ScanOrchestrator::new(config).scan(&self.root).unwrap()
    }

    fn unused(&self, session: &ScanSession) -> Vec<String> {
        session
            .compute_unused()
            .iter()
            .map(|a| {
                a.path
                    .strip_prefix(&self.root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }
}

fn utf16_record(text: &str) -> Vec<u8> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let mut out = (units.len() as u32).to_le_bytes().to_vec();
    for unit in units {
        out.extend(unit.to_le_bytes());
    }
    out
}

/// An effect container holding the given string records, separated by
/// numeric noise
fn effect(refs: &[&str]) -> Vec<u8> {
    let mut buf = b"SKFE".to_vec();
    buf.extend(1610u32.to_le_bytes());
    for r in refs {
        buf.extend(utf16_record(r));
        buf.extend([0x00, 0x00, 0x80, 0x3f]);
    }
    buf
}

fn c3b(refs: &[&str]) -> Vec<u8> {
    let mut buf = b"C3B\0".to_vec();
    buf.extend(3u32.to_le_bytes());
    for r in refs {
        buf.extend((r.len() as u32 + 1).to_le_bytes());
        buf.extend(r.as_bytes());
        buf.push(0);
    }
    buf
}

#[test]
fn test_orphan_is_the_only_unused_asset() {
    let project = Project::new();
    project
        .write("fx/boom.efk", &effect(&["boom_particle.png"]))
        .write("fx/boom_particle.png", b"png")
        .write("other/orphan.png", b"png");

    let session = project.scan(Config::default());
    assert_eq!(project.unused(&session), vec!["other/orphan.png"]);

    let stats = session.statistics();
    assert_eq!(stats.containers.effect, 1);
    assert_eq!(stats.analyzed, 1);
    assert_eq!(stats.universe, 2);
    assert_eq!(stats.unused, 1);
    assert_eq!(stats.unused_bytes, 3);
}

#[test]
fn test_dangling_reference_never_reported() {
    let project = Project::new();
    project
        .write("fx/boom.efk", &effect(&["missing.png", "spark.png"]))
        .write("fx/spark.png", b"png");

    let session = project.scan(Config::default());
    assert!(project.unused(&session).is_empty());

    let unresolved: Vec<_> = session.unresolved().map(|r| r.candidate.text.clone()).collect();
    assert_eq!(unresolved, vec!["missing.png"]);
    assert!(!project.unused(&session).iter().any(|p| p.contains("missing")));
}

#[test]
fn test_oversized_container_is_skipped_not_failed() {
    let project = Project::new();
    project
        .write("fx/big.efk", &effect(&["glow.png"]))
        .write("fx/glow.png", b"png");

    let mut config = Config::default();
    config.limits.effect_max_bytes = 8;
    let session = project.scan(config);

    let stats = session.statistics();
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.analyzed, 0);
    // Nothing read from the skipped container, so its texture is unused
    assert_eq!(project.unused(&session), vec!["fx/glow.png"]);
}

#[test]
fn test_bad_c3b_header_counts_as_failure() {
    let project = Project::new();
    project.write("models/broken.c3b", b"NOTC3B\x00\x00\x00\x00");

    let stats = project.scan(Config::default()).statistics();
    assert_eq!(stats.containers.c3b_model, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.skipped, 0);
}

#[test]
fn test_sibling_directory_copy_is_not_saved() {
    let project = Project::new();
    project
        .write("a/x.efk", &effect(&["glow.png"]))
        .write("b/glow.png", b"png");

    let session = project.scan(Config::default());
    assert_eq!(project.unused(&session), vec!["b/glow.png"]);

    let cross: Vec<_> = session.cross_directory().collect();
    assert_eq!(cross.len(), 1);
    assert_eq!(
        cross[0].status,
        ResolutionStatus::CrossDirectory(project.root.join("b/glow.png"))
    );
}

#[test]
fn test_subdirectory_reference_is_in_scope() {
    let project = Project::new();
    project
        .write("fx/boom.efk", &effect(&["flare.png"]))
        .write("fx/textures/flare.png", b"png");

    let session = project.scan(Config::default());
    assert!(project.unused(&session).is_empty());
    assert_eq!(session.statistics().resolved_in_scope, 1);
}

#[test]
fn test_effect_material_reference_saves_material() {
    let project = Project::new();
    project
        .write("fx/boom.efk", &effect(&["water.efkmat"]))
        .write("fx/water.efkmat", b"EFKM")
        .write("fx/unused.efkmat", b"EFKM");

    let session = project.scan(Config::default());
    assert_eq!(project.unused(&session), vec!["fx/unused.efkmat"]);
    assert_eq!(session.statistics().containers.effect_material, 2);
}

#[test]
fn test_c3b_texture_reference() {
    let project = Project::new();
    project
        .write("models/hero.c3b", &c3b(&["textures/hero.png", "hero_mesh"]))
        .write("models/textures/hero.png", b"png")
        .write("models/textures/villain.png", b"png");

    let session = project.scan(Config::default());
    assert_eq!(project.unused(&session), vec!["models/textures/villain.png"]);
}

#[test]
fn test_retained_and_excluded_assets() {
    let project = Project::new();
    project
        .write("fx/boom.efk", &effect(&["a1.png"]))
        .write("fx/a1.png", b"png")
        .write("fx/keep_logo.png", b"png")
        .write("vendor/thirdparty.png", b"png")
        .write("fx/stray.png", b"png");

    let mut config = Config::default();
    config.retain_patterns.push("keep_*.png".to_string());
    config.exclude.push("vendor/**".to_string());
    let session = project.scan(config);

    assert_eq!(project.unused(&session), vec!["fx/stray.png"]);
    let stats = session.statistics();
    assert_eq!(stats.retained, 1);
    assert_eq!(stats.universe, 3);
}

#[test]
fn test_target_extension_override() {
    let project = Project::new();
    project
        .write("fx/boom.efk", &effect(&[]))
        .write("fx/a.png", b"png")
        .write("fx/b.dds", b"dds");

    let mut config = Config::default();
    config.assets.target_extensions = vec!["dds".to_string()];
    let session = project.scan(config);
    assert_eq!(project.unused(&session), vec!["fx/b.dds"]);
}

#[test]
fn test_scans_are_idempotent() {
    let project = Project::new();
    project
        .write("fx/boom.efk", &effect(&["boom_particle.png", "Smoke.TGA"]))
        .write("fx/boom_particle.png", b"png")
        .write("fx/smoke.tga", b"tga")
        .write("fx/sub/extra.png", b"png")
        .write("other/orphan.png", b"png");

    let first = project.scan(Config::default());
    let second = project.scan(Config::default());

    assert_eq!(first.result(), second.result());
    assert_eq!(project.unused(&first), project.unused(&second));
    assert_eq!(first.statistics(), second.statistics());
}

#[test]
fn test_parallel_matches_sequential() {
    let project = Project::new();
    for i in 0..12 {
        project.write(
            &format!("fx/e{:02}.efk", i),
            &effect(&[&format!("tex{:02}.png", i)]),
        );
        project.write(&format!("fx/tex{:02}.png", i), b"png");
    }
    project.write("fx/never.png", b"png");

    let sequential = project.scan(Config::default());
    let mut config = Config::default();
    config.scan.parallel = true;
    config.scan.threads = 4;
    let parallel = project.scan(config);

    assert_eq!(sequential.result(), parallel.result());
    assert_eq!(project.unused(&parallel), vec!["fx/never.png"]);
    assert_eq!(project.unused(&sequential), project.unused(&parallel));
}

#[test]
fn test_cancelled_scan_reports_no_unused() {
    let project = Project::new();
    for i in 0..4 {
        project.write(&format!("fx/e{}.efk", i), &effect(&["used.png"]));
    }
    project.write("fx/used.png", b"png").write("fx/orphan.png", b"png");

    let orchestrator = ScanOrchestrator::new(Config::default());
    let flag = orchestrator.cancel_flag();
    let session = orchestrator
        .scan_with_progress(&project.root, |progress| {
            if progress.phase == ScanPhase::Analyzing && progress.completed == 2 {
                flag.cancel();
            }
        })
        .unwrap();

    assert!(session.is_cancelled());
    assert_eq!(session.phase(), ScanPhase::Done);
    assert_eq!(session.result().len(), 2);
    assert!(session.compute_unused().is_empty());
}

#[test]
fn test_orchestrator_rescans_after_cancel() {
    let project = Project::new();
    for i in 0..4 {
        project.write(&format!("fx/e{}.efk", i), &effect(&["used.png"]));
    }
    project.write("fx/used.png", b"png").write("fx/orphan.png", b"png");

    let orchestrator = ScanOrchestrator::new(Config::default());
    let flag = orchestrator.cancel_flag();
    let cancelled = orchestrator
        .scan_with_progress(&project.root, |progress| {
            if progress.phase == ScanPhase::Analyzing && progress.completed == 1 {
                flag.cancel();
            }
        })
        .unwrap();
    assert!(cancelled.is_cancelled());

    let fresh = orchestrator.scan(&project.root).unwrap();
    assert!(!fresh.is_cancelled());
    assert_eq!(fresh.result().len(), 4);
    assert_eq!(project.unused(&fresh), vec!["fx/orphan.png"]);
}

#[test]
fn test_empty_project() {
    let project = Project::new();
    let session = project.scan(Config::default());
    assert!(session.result().is_empty());
    assert!(session.compute_unused().is_empty());
    assert_eq!(session.statistics().containers.total(), 0);
}

#[test]
fn test_root_must_be_a_directory() {
    let project = Project::new();
    project.write("file.png", b"png");
    let err = ScanOrchestrator::new(Config::default())
        .scan(&project.root.join("file.png"))
        .unwrap_err();
    assert!(err.to_string().contains("not a directory"));

    assert!(ScanOrchestrator::new(Config::default())
        .scan(Path::new("/no/such/project/root"))
        .is_err());
}
