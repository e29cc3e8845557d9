mod common;

use common::{make_file, sample_taxonomy, MockRemote};
use drive_curator_core::config::DedupConfig;
use drive_curator_core::dedup::{self, DedupTier};
use drive_curator_core::storage::Database;
use drive_curator_core::AutoApprove;

fn db_with(files: &[drive_curator_core::storage::models::FileRecord]) -> Database {
    let db = Database::open_in_memory().unwrap();
    db.upsert_files(files).unwrap();
    db
}

#[test]
fn test_cross_top_level_groups_are_safe() {
    let db = db_with(&[
        make_file(1, "/A/x.bin", 100, "h1", 10),
        make_file(2, "/B/x.bin", 100, "h1", 20),
    ]);
    let report = dedup::build_report(&db, &sample_taxonomy(), &DedupConfig::default()).unwrap();

    assert_eq!(report.safe.len(), 1);
    assert_eq!(report.review.len(), 0);
    assert_eq!(report.manual.len(), 0);
    assert_eq!(report.safe[0].tier, DedupTier::Safe);
    assert_eq!(report.safe[0].delete.len(), 1);
}

#[test]
fn test_deep_common_prefix_is_manual() {
    let db = db_with(&[
        make_file(1, "/A/B/C/x.bin", 100, "h1", 0),
        make_file(2, "/A/B/C/d/x.bin", 100, "h1", 0),
    ]);
    let report = dedup::build_report(&db, &sample_taxonomy(), &DedupConfig::default()).unwrap();

    assert_eq!(report.manual.len(), 1);
    let group = &report.manual[0];
    assert_eq!(group.tier, DedupTier::Manual);
    // Manual groups never get an automatic keep/delete decision.
    assert!(group.keep.is_none());
    assert!(group.delete.is_empty());
}

#[test]
fn test_manual_prefix_depth_is_configurable() {
    let db = db_with(&[
        make_file(1, "/A/B/x.bin", 100, "h1", 0),
        make_file(2, "/A/B/c/x.bin", 100, "h1", 0),
    ]);
    // Shared prefix is two segments deep: review at the default threshold,
    // manual when the threshold drops to two.
    let report = dedup::build_report(&db, &sample_taxonomy(), &DedupConfig::default()).unwrap();
    assert_eq!(report.review.len(), 1);

    let config = DedupConfig {
        manual_prefix_depth: 2,
        ..Default::default()
    };
    let report = dedup::build_report(&db, &sample_taxonomy(), &config).unwrap();
    assert_eq!(report.manual.len(), 1);
}

#[test]
fn test_same_top_level_shallow_prefix_is_review() {
    let db = db_with(&[
        make_file(1, "/A/x.bin", 100, "h1", 0),
        make_file(2, "/A/sub/x.bin", 100, "h1", 0),
    ]);
    let report = dedup::build_report(&db, &sample_taxonomy(), &DedupConfig::default()).unwrap();

    assert_eq!(report.review.len(), 1);
    assert!(report.review[0].keep.is_some());
}

#[test]
fn test_tiering_is_exhaustive_and_disjoint() {
    let db = db_with(&[
        // safe: spans /A and /B
        make_file(1, "/A/one.bin", 10, "h1", 0),
        make_file(2, "/B/one.bin", 10, "h1", 0),
        // manual: deep shared prefix
        make_file(3, "/C/d/e/two.bin", 20, "h2", 0),
        make_file(4, "/C/d/e/f/two.bin", 20, "h2", 0),
        // review: same top, shallow prefix
        make_file(5, "/D/three.bin", 30, "h3", 0),
        make_file(6, "/D/g/three.bin", 30, "h3", 0),
    ]);
    let report = dedup::build_report(&db, &sample_taxonomy(), &DedupConfig::default()).unwrap();

    assert_eq!(report.total_groups(), 3);
    assert_eq!(report.safe.len(), 1);
    assert_eq!(report.review.len(), 1);
    assert_eq!(report.manual.len(), 1);
    // A group spanning top-level directories is never manual.
    assert!(report.manual.iter().all(|g| g.content_hash != "h1"));
}

#[test]
fn test_keep_prefers_files_under_taxonomy_paths() {
    // /Media/Photography is a taxonomy path; the copy there wins even
    // though its path is longer.
    let db = db_with(&[
        make_file(1, "/Media/Photography/shot.cr3", 100, "h1", 0),
        make_file(2, "/Dump/shot.cr3", 100, "h1", 999),
    ]);
    let report = dedup::build_report(&db, &sample_taxonomy(), &DedupConfig::default()).unwrap();

    let group = &report.safe[0];
    assert_eq!(
        group.keep.as_ref().unwrap().path,
        "/Media/Photography/shot.cr3"
    );
    assert_eq!(group.delete[0].path, "/Dump/shot.cr3");
}

#[test]
fn test_keep_prefers_shorter_path_then_newer_mtime() {
    let db = db_with(&[
        make_file(1, "/A/deeply/nested/copy.bin", 100, "h1", 50),
        make_file(2, "/B/copy.bin", 100, "h1", 10),
    ]);
    let report = dedup::build_report(&db, &sample_taxonomy(), &DedupConfig::default()).unwrap();
    assert_eq!(report.safe[0].keep.as_ref().unwrap().path, "/B/copy.bin");

    // Same path length: the newer file wins.
    let db = db_with(&[
        make_file(1, "/A/copy.bin", 100, "h1", 10),
        make_file(2, "/B/copy.bin", 100, "h1", 999),
    ]);
    let report = dedup::build_report(&db, &sample_taxonomy(), &DedupConfig::default()).unwrap();
    assert_eq!(report.safe[0].keep.as_ref().unwrap().path, "/B/copy.bin");
}

#[test]
fn test_keep_selection_is_deterministic() {
    let db = db_with(&[
        make_file(1, "/A/copy.bin", 100, "h1", 10),
        make_file(2, "/B/copy.bin", 100, "h1", 10),
    ]);
    let taxonomy = sample_taxonomy();
    let config = DedupConfig::default();

    let first = dedup::build_report(&db, &taxonomy, &config).unwrap();
    let chosen = first.safe[0].keep.as_ref().unwrap().path.clone();
    for _ in 0..5 {
        let report = dedup::build_report(&db, &taxonomy, &config).unwrap();
        assert_eq!(report.safe[0].keep.as_ref().unwrap().path, chosen);
    }
}

#[test]
fn test_excluded_prefixes_can_dissolve_a_group() {
    let db = db_with(&[
        make_file(1, "/A/x.bin", 100, "h1", 0),
        make_file(2, "/Excluded/x.bin", 100, "h1", 0),
    ]);
    let config = DedupConfig {
        exclude_dirs: vec!["/Excluded".to_string()],
        ..Default::default()
    };
    let report = dedup::build_report(&db, &sample_taxonomy(), &config).unwrap();
    assert_eq!(report.total_groups(), 0);
}

#[test]
fn test_execute_safe_deletes_copies_and_updates_index() {
    let db = db_with(&[
        make_file(1, "/A/x.bin", 100, "h1", 10),
        make_file(2, "/B/x.bin", 100, "h1", 20),
        make_file(3, "/A/unique.bin", 50, "h2", 0),
    ]);
    let taxonomy = sample_taxonomy();
    let config = DedupConfig::default();
    let report = dedup::build_report(&db, &taxonomy, &config).unwrap();

    let keep_path = report.safe[0].keep.as_ref().unwrap().path.clone();
    let delete_path = report.safe[0].delete[0].path.clone();

    let remote = MockRemote::new(&["/A/x.bin", "/B/x.bin", "/A/unique.bin"]);
    let (deleted, failed) =
        dedup::execute_safe(&db, &remote, &report, 100, &AutoApprove).unwrap();

    assert_eq!(deleted, 1);
    assert_eq!(failed, 0);
    assert!(remote.contains(&keep_path));
    assert!(!remote.contains(&delete_path));

    let files = db.all_files(false).unwrap();
    assert!(files.iter().any(|f| f.path == keep_path));
    assert!(files.iter().all(|f| f.path != delete_path));
}

#[test]
fn test_execute_safe_falls_back_per_item_on_batch_failure() {
    let db = db_with(&[
        make_file(1, "/A/x.bin", 100, "h1", 0),
        make_file(2, "/B/x.bin", 100, "h1", 30),
        make_file(3, "/A/y.bin", 200, "h2", 0),
        make_file(4, "/B/y.bin", 200, "h2", 30),
    ]);
    let taxonomy = sample_taxonomy();
    let config = DedupConfig::default();
    let report = dedup::build_report(&db, &taxonomy, &config).unwrap();
    assert_eq!(report.safe.len(), 2);

    let remote = MockRemote::new(&["/A/x.bin", "/B/x.bin", "/A/y.bin", "/B/y.bin"]);
    remote.fail_multi_item_deletes.set(true);

    let (deleted, failed) =
        dedup::execute_safe(&db, &remote, &report, 100, &AutoApprove).unwrap();

    assert_eq!(deleted, 2);
    assert_eq!(failed, 0);
    let calls = remote.calls.borrow();
    assert_eq!(calls[0], "delete 2");
    assert_eq!(calls.iter().filter(|c| *c == "delete 1").count(), 2);
}

#[test]
fn test_reclaimable_bytes() {
    let db = db_with(&[
        make_file(1, "/A/x.bin", 100, "h1", 0),
        make_file(2, "/B/x.bin", 100, "h1", 0),
        make_file(3, "/C/x.bin", 100, "h1", 0),
    ]);
    let report = dedup::build_report(&db, &sample_taxonomy(), &DedupConfig::default()).unwrap();
    // Three copies, one kept.
    assert_eq!(report.safe_reclaimable(), 200);
}
