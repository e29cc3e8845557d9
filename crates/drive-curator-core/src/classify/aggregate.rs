use std::collections::{BTreeMap, HashMap, HashSet};

use crate::paths;
use crate::storage::models::FileRecord;

/// Per-directory rollup used as the unit of classification. Rebuilt from
/// scratch on every run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryAggregate {
    pub source_path: String,
    pub file_count: i64,
    pub total_size: i64,
    /// Extension (with dot, lower-case) to file count.
    pub extensions: HashMap<String, i64>,
}

impl DirectoryAggregate {
    fn new(source_path: &str) -> Self {
        Self {
            source_path: source_path.to_string(),
            file_count: 0,
            total_size: 0,
            extensions: HashMap::new(),
        }
    }

    fn add(&mut self, record: &FileRecord) {
        self.file_count += 1;
        self.total_size += record.size;
        if !record.extension.is_empty() {
            *self.extensions.entry(record.extension.clone()).or_insert(0) += 1;
        }
    }
}

/// Top-level directories that carry a configured mapping. Content beneath
/// them is aggregated one level deeper, so each course/topic unit is
/// classified and moved independently.
pub fn mapped_top_level_dirs<'a>(
    mapping_sources: impl Iterator<Item = &'a String>,
) -> HashSet<String> {
    mapping_sources.filter_map(|s| paths::top_level(s)).collect()
}

/// One pass over the file records: source path to aggregate.
///
/// Mapped top-level directories aggregate at the second path level; every
/// other top-level directory aggregates at the first. A top-level aggregate
/// survives the merge only when nothing aggregated beneath it.
pub fn aggregate_directories(
    files: &[FileRecord],
    mapped_top_dirs: &HashSet<String>,
) -> BTreeMap<String, DirectoryAggregate> {
    let mut second_level: BTreeMap<String, DirectoryAggregate> = BTreeMap::new();
    let mut top_level: BTreeMap<String, DirectoryAggregate> = BTreeMap::new();

    for record in files {
        let segments = paths::segments(&record.path);
        if segments.is_empty() {
            continue;
        }
        let top_key = format!("/{}", segments[0]);
        top_level
            .entry(top_key.clone())
            .or_insert_with(|| DirectoryAggregate::new(&top_key))
            .add(record);

        if segments.len() >= 3 && mapped_top_dirs.contains(&top_key) {
            let key = format!("/{}/{}", segments[0], segments[1]);
            second_level
                .entry(key.clone())
                .or_insert_with(|| DirectoryAggregate::new(&key))
                .add(record);
        }
    }

    let mut merged = second_level;
    for (key, aggregate) in top_level {
        let prefix = format!("{}/", key);
        let has_sub = merged
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(&prefix));
        if !has_sub {
            merged.insert(key, aggregate);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, size: i64) -> FileRecord {
        FileRecord::new(path.len() as i64, path, size, false, "", 0)
    }

    #[test]
    fn test_unmapped_top_level_aggregates_at_first_level() {
        let files = vec![
            file("/Downloads/a.zip", 10),
            file("/Downloads/sub/b.zip", 20),
        ];
        let aggregates = aggregate_directories(&files, &HashSet::new());
        assert_eq!(aggregates.len(), 1);
        let agg = &aggregates["/Downloads"];
        assert_eq!(agg.file_count, 2);
        assert_eq!(agg.total_size, 30);
        assert_eq!(agg.extensions[".zip"], 2);
    }

    #[test]
    fn test_mapped_top_level_aggregates_at_second_level() {
        let mapped: HashSet<String> = ["/Courses".to_string()].into_iter().collect();
        let files = vec![
            file("/Courses/Rust/week1/a.mp4", 100),
            file("/Courses/Rust/week2/b.mp4", 100),
            file("/Courses/Go/c.mp4", 50),
        ];
        let aggregates = aggregate_directories(&files, &mapped);
        // Each second-level unit aggregates on its own; /Courses itself is
        // dropped because units exist beneath it.
        assert!(aggregates.contains_key("/Courses/Rust"));
        assert!(aggregates.contains_key("/Courses/Go"));
        assert!(!aggregates.contains_key("/Courses"));
        assert_eq!(aggregates["/Courses/Rust"].file_count, 2);
        assert_eq!(aggregates["/Courses/Go"].file_count, 1);
    }

    #[test]
    fn test_mapped_top_level_without_subdirs_keeps_top_aggregate() {
        let mapped: HashSet<String> = ["/Inbox".to_string()].into_iter().collect();
        let files = vec![file("/Inbox/a.pdf", 5), file("/Inbox/b.pdf", 5)];
        let aggregates = aggregate_directories(&files, &mapped);
        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates["/Inbox"].file_count, 2);
    }

    #[test]
    fn test_extension_histogram_skips_extensionless() {
        let files = vec![file("/X/a.mp3", 1), file("/X/README", 1)];
        let aggregates = aggregate_directories(&files, &HashSet::new());
        let agg = &aggregates["/X"];
        assert_eq!(agg.file_count, 2);
        assert_eq!(agg.extensions.len(), 1);
        assert_eq!(agg.extensions[".mp3"], 1);
    }
}
