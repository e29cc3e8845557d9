mod common;

use common::make_file;
use drive_curator_core::clean;
use drive_curator_core::config::CleanConfig;
use drive_curator_core::storage::Database;

const MB: i64 = 1024 * 1024;
const DAY: i64 = 86_400;

fn config() -> CleanConfig {
    CleanConfig {
        large_file_threshold_mb: 100,
        stale_after_days: 30,
        exclude_dirs: Vec::new(),
    }
}

#[test]
fn test_report_partitions_large_and_stale() {
    let now = 1_700_000_000;
    let db = Database::open_in_memory().unwrap();
    db.upsert_files(&[
        make_file(1, "/big.iso", 200 * MB, "", now - DAY),
        make_file(2, "/old.zip", 5 * MB, "", now - 90 * DAY),
        make_file(3, "/recent.txt", MB, "", now - DAY),
    ])
    .unwrap();

    let report = clean::build_report_at(&db, &config(), now).unwrap();

    assert_eq!(report.large_files.len(), 1);
    assert_eq!(report.large_files[0].path, "/big.iso");
    assert_eq!(report.stale_files.len(), 1);
    assert_eq!(report.stale_files[0].path, "/old.zip");
    assert_eq!(report.large_total(), 200 * MB);
    assert_eq!(report.stale_total(), 5 * MB);
}

#[test]
fn test_report_can_flag_one_file_both_ways() {
    let now = 1_700_000_000;
    let db = Database::open_in_memory().unwrap();
    db.upsert_files(&[make_file(1, "/big-and-old.iso", 300 * MB, "", now - 90 * DAY)])
        .unwrap();

    let report = clean::build_report_at(&db, &config(), now).unwrap();
    assert_eq!(report.large_files.len(), 1);
    assert_eq!(report.stale_files.len(), 1);
}

#[test]
fn test_excluded_prefixes_drop_out() {
    let now = 1_700_000_000;
    let db = Database::open_in_memory().unwrap();
    db.upsert_files(&[
        make_file(1, "/Vault/big.iso", 200 * MB, "", now - 90 * DAY),
        make_file(2, "/Dump/big.iso", 200 * MB, "", now - 90 * DAY),
    ])
    .unwrap();

    let config = CleanConfig {
        exclude_dirs: vec!["/Vault".to_string()],
        ..config()
    };
    let report = clean::build_report_at(&db, &config, now).unwrap();

    assert_eq!(report.large_files.len(), 1);
    assert_eq!(report.large_files[0].path, "/Dump/big.iso");
    assert_eq!(report.stale_files.len(), 1);
    assert_eq!(report.stale_files[0].path, "/Dump/big.iso");
}
