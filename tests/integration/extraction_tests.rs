//! String recovery and per-container analysis on synthetic binaries.

use assetsweep::analysis::{ContainerAnalyzer, ContainerOutcome, SkipReason};
use assetsweep::config::LimitsConfig;
use assetsweep::discovery::{ContainerFile, ContainerKind};
use assetsweep::extract::{scan, ExtensionSet, ExtractionMethod, PathExtractor, PatternSearch};
use std::fs;
use std::path::PathBuf;

fn utf16_record(text: &str) -> Vec<u8> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let mut out = (units.len() as u32).to_le_bytes().to_vec();
    for unit in units {
        out.extend(unit.to_le_bytes());
    }
    out
}

fn analyzer() -> ContainerAnalyzer {
    ContainerAnalyzer::new(LimitsConfig::default()).unwrap()
}

fn texts(outcome: &ContainerOutcome) -> Vec<String> {
    outcome.references()
}

#[test]
fn test_records_survive_interleaved_noise() {
    let mut buf = b"SKFE".to_vec();
    buf.extend(utf16_record("flare.png"));
    // A float and an odd byte push the next record off alignment
    buf.extend([0x00, 0x00, 0x80, 0x3f, 0x07]);
    buf.extend(utf16_record("smoke.tga"));
    buf.extend(b"\x01\x02plain_ascii_name.dds\x00");

    let found = scan(&buf);
    let names: Vec<&str> = found.iter().map(|c| c.text.as_str()).collect();
    assert!(names.contains(&"flare.png"));
    assert!(names.contains(&"smoke.tga"));
    assert!(names.contains(&"plain_ascii_name.dds"));

    let first = found.iter().find(|c| c.text == "flare.png").unwrap();
    assert_eq!(first.method, ExtractionMethod::LengthPrefixed);
    assert_eq!(first.offset, 4);
}

#[test]
fn test_path_extractor_splits_concatenated_names() {
    let extractor = PathExtractor::new(&ExtensionSet::effect());
    assert_eq!(
        extractor.extract_paths("Texture\\a1.pngb2.jpg"),
        vec!["a1.png", "b2.jpg"]
    );
    assert_eq!(extractor.extract_paths("fx/water.efkmat"), vec!["water.efkmat"]);
}

#[test]
fn test_pattern_search_prefers_longest_extension() {
    let search = PatternSearch::new(&ExtensionSet::effect()).unwrap();
    let found = search.search(b"\x00\x00mat/water.efkmat\x00\x00");
    assert!(found.iter().any(|t| t == "mat/water.efkmat"));
    assert!(!found.iter().any(|t| t.ends_with(".efk")));
}

#[test]
fn test_effect_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("boom.efk");
    let mut buf = b"SKFE".to_vec();
    buf.extend(utf16_record("boom_particle.png"));
    buf.extend(utf16_record("sub/boom_ring.efk"));
    buf.extend(utf16_record("hull.fbx"));
    fs::write(&path, &buf).unwrap();

    let container = ContainerFile::new(path, ContainerKind::Effect, buf.len() as u64);
    let outcome = analyzer().analyze(&container);
    assert_eq!(texts(&outcome), vec!["boom_particle.png", "boom_ring.efk"]);
}

#[test]
fn test_model_file_reports_meshes_and_textures() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ship.efkmodel");
    let mut buf = vec![0u8; 4];
    for text in ["ship_hull.fbx", "ship_diffuse.png"] {
        buf.extend((text.len() as u32).to_le_bytes());
        buf.extend(text.as_bytes());
    }
    fs::write(&path, &buf).unwrap();

    let container = ContainerFile::new(path, ContainerKind::EffectModel, buf.len() as u64);
    let found = texts(&analyzer().analyze(&container));
    assert!(found.contains(&"ship_hull.fbx".to_string()));
    assert!(found.contains(&"ship_diffuse.png".to_string()));
}

#[test]
fn test_c3b_file_keeps_texture_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hero.c3b");
    let mut buf = b"C3B\0".to_vec();
    buf.extend(3u32.to_le_bytes());
    for text in ["textures/hero_d.png", "Bip01"] {
        buf.extend((text.len() as u32 + 1).to_le_bytes());
        buf.extend(text.as_bytes());
        buf.push(0);
    }
    fs::write(&path, &buf).unwrap();

    let container = ContainerFile::new(path, ContainerKind::C3bModel, buf.len() as u64);
    assert_eq!(texts(&analyzer().analyze(&container)), vec!["textures/hero_d.png"]);
}

#[test]
fn test_size_ceiling_per_kind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.efkmat");
    fs::write(&path, vec![0u8; 128]).unwrap();

    let limits = LimitsConfig {
        material_max_bytes: 64,
        ..LimitsConfig::default()
    };
    let analyzer = ContainerAnalyzer::new(limits).unwrap();
    let outcome = analyzer.analyze(&ContainerFile::new(path, ContainerKind::EffectMaterial, 128));
    assert_eq!(
        outcome,
        ContainerOutcome::Skipped(SkipReason::TooLarge {
            size: 128,
            limit: 64
        })
    );
}

#[test]
fn test_vanished_container_is_skipped() {
    let outcome = analyzer().analyze(&ContainerFile::new(
        PathBuf::from("/no/such/dir/gone.efk"),
        ContainerKind::Effect,
        10,
    ));
    assert_eq!(outcome, ContainerOutcome::Skipped(SkipReason::Missing));
}

#[test]
fn test_random_bytes_are_harmless() {
    // Deterministic pseudo-random buffer
    let mut state: u32 = 0x1234_5678;
    let buf: Vec<u8> = (0..16 * 1024)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xff) as u8
        })
        .collect();

    let analyzer = analyzer();
    for kind in ContainerKind::ALL {
        let container = ContainerFile::new(PathBuf::from("/p/x"), kind, buf.len() as u64);
        // Must return, never panic; a c3b without magic is an error value
        let _ = analyzer.analyze_bytes(&container, &buf);
    }
}
