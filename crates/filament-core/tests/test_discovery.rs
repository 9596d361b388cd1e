#[allow(dead_code)]
mod common;

use tempfile::TempDir;

use filament_core::discovery::{discover_pairs, parse_fps, DiscoveryConfig};
use filament_core::error::ErrorKind;

#[test]
fn test_pairs_match_on_name_without_vtype() {
    let root = TempDir::new().unwrap();
    common::write_pair(root.path(), "PEO", 1, &[10, 9]);
    common::write_pair(root.path(), "PEO", 2, &[10, 9]);

    let pairs = discover_pairs(root.path(), &DiscoveryConfig::default()).unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].name, "20240101_PEO_fps-25k_1");
    assert_eq!(pairs[1].name, "20240101_PEO_fps-25k_2");
    for pair in &pairs {
        let bg = pair.background.as_ref().unwrap();
        assert!(bg.file_name().unwrap().to_str().unwrap().ends_with("_bg"));
        assert_eq!(pair.fps, Some(25_000.0));
        assert!(!pair.tags.contains_key("vtype"));
        assert_eq!(pair.tags.get("date").map(String::as_str), Some("20240101"));
    }
}

#[test]
fn test_unpaired_experiment_has_no_background() {
    let root = TempDir::new().unwrap();
    common::write_video(&root.path().join(common::video_name("PEO", 1, "exp")), &[5]);
    let pairs = discover_pairs(root.path(), &DiscoveryConfig::default()).unwrap();
    assert_eq!(pairs.len(), 1);
    assert!(pairs[0].background.is_none());
}

#[test]
fn test_one_background_is_shared() {
    let root = TempDir::new().unwrap();
    common::write_video(&root.path().join(common::video_name("PEO", 1, "exp")), &[5]);
    common::write_video(&root.path().join(common::video_name("PEO", 2, "exp")), &[5]);
    common::write_background(&root.path().join(common::video_name("PEO", 9, "bg")), 1);

    let config = DiscoveryConfig {
        one_background: true,
        ..DiscoveryConfig::default()
    };
    let pairs = discover_pairs(root.path(), &config).unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].background, pairs[1].background);
    assert!(pairs[0].background.is_some());
}

#[test]
fn test_unparseable_folders_are_skipped() {
    let root = TempDir::new().unwrap();
    common::write_pair(root.path(), "PEO", 1, &[5]);
    std::fs::create_dir(root.path().join("notes")).unwrap();
    std::fs::write(root.path().join("readme.txt"), "x").unwrap();

    let pairs = discover_pairs(root.path(), &DiscoveryConfig::default()).unwrap();
    assert_eq!(pairs.len(), 1);
}

#[test]
fn test_format_without_vtype_is_invalid() {
    let root = TempDir::new().unwrap();
    let config = DiscoveryConfig {
        fname_format: "date_sampleinfo_fps_run".into(),
        ..DiscoveryConfig::default()
    };
    let err = discover_pairs(root.path(), &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
}

#[test]
fn test_fps_suffixes() {
    assert_eq!(parse_fps("25k"), Some(25_000.0));
    assert_eq!(parse_fps("fps-5000"), Some(5_000.0));
    assert_eq!(parse_fps("fast"), None);
}
