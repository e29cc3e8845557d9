use std::collections::{BTreeMap, HashMap};

use tracing::info;

use crate::classify::aggregate::{self, DirectoryAggregate};
use crate::config::ClassifierConfig;
use crate::error::Error;
use crate::paths;
use crate::storage::models::{Candidate, ClassificationRecord, ClassificationStatus};
use crate::storage::Database;
use crate::taxonomy::Taxonomy;

/// Cascade stage names as persisted in `rule_name`.
pub mod rule {
    pub const DIRECTORY_MAPPING: &str = "directory_mapping";
    pub const DIRECTORY_MAPPING_PREFIX: &str = "directory_mapping_prefix";
    pub const KEYWORD_MATCH: &str = "keyword_match";
    pub const CONTENT_ANALYSIS: &str = "content_analysis";
    pub const UNMATCHED: &str = "unmatched";
}

const RAW_PHOTO_EXTENSIONS: &[&str] = &[".cr3", ".cr2", ".dng", ".nef", ".arw", ".raw", ".raf"];
const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".avi", ".mkv"];
const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".flac", ".wav", ".aac", ".ape", ".m4a", ".ogg", ".wma"];
const PHONE_PHOTO_EXTENSIONS: &[&str] = &[".heic", ".heif"];

/// Only the most frequent extensions participate in content analysis.
const CONTENT_TOP_EXTENSIONS: usize = 5;
const KEYWORD_SCORE_CAP: f64 = 0.85;
const KEYWORD_SCORE_FLOOR: f64 = 0.3;
const MAX_ALTERNATIVES: usize = 3;

/// Classify every eligible aggregate from the current file index.
///
/// Aggregates that are already taxonomy nodes, or sit under a frozen
/// directory, are considered correctly placed and skipped outright. The
/// returned snapshot is not yet persisted; see [`save_snapshot`].
pub fn classify_all(
    db: &Database,
    taxonomy: &Taxonomy,
    config: &ClassifierConfig,
    frozen_dirs: &[String],
) -> Result<Vec<ClassificationRecord>, Error> {
    let files = db.all_files(false)?;
    if files.is_empty() {
        info!("File index is empty; nothing to classify");
        return Ok(Vec::new());
    }

    let mapped_tops = aggregate::mapped_top_level_dirs(config.directory_mappings.keys());
    let aggregates = aggregate::aggregate_directories(&files, &mapped_tops);
    info!(
        "Aggregated {} candidate directories from {} files",
        aggregates.len(),
        files.len()
    );

    let mut results = Vec::new();
    for (source_path, aggregate) in &aggregates {
        if frozen_dirs.iter().any(|f| paths::is_under(source_path, f)) {
            continue;
        }
        if taxonomy.find_node(source_path).is_some() {
            continue;
        }
        results.push(classify_directory(aggregate, taxonomy, config));
    }
    Ok(results)
}

/// Persist a snapshot, fully replacing any previous run's rows. Running
/// classification twice against an unchanged index is a no-op.
pub fn save_snapshot(db: &Database, results: &[ClassificationRecord]) -> Result<usize, Error> {
    let count = db.replace_classifications(results)?;
    info!("Saved {} classification results", count);
    Ok(count)
}

/// Apply the rule cascade to one aggregate. The first stage that produces a
/// result wins; the unmatched fallthrough guarantees exactly one result.
pub fn classify_directory(
    aggregate: &DirectoryAggregate,
    taxonomy: &Taxonomy,
    config: &ClassifierConfig,
) -> ClassificationRecord {
    rule_directory_mapping(aggregate, &config.directory_mappings)
        .or_else(|| rule_keyword_match(aggregate, taxonomy))
        .or_else(|| rule_content_analysis(aggregate, config))
        .unwrap_or_else(|| {
            result(
                aggregate,
                &config.holding_target,
                0.1,
                rule::UNMATCHED,
                "no rule matched".to_string(),
                Vec::new(),
            )
        })
}

fn result(
    aggregate: &DirectoryAggregate,
    target_path: &str,
    confidence: f64,
    rule_name: &str,
    reason: String,
    alternatives: Vec<Candidate>,
) -> ClassificationRecord {
    ClassificationRecord {
        source_path: aggregate.source_path.clone(),
        target_path: target_path.to_string(),
        confidence,
        rule_name: rule_name.to_string(),
        reason,
        alternatives,
        file_count: aggregate.file_count,
        total_size: aggregate.total_size,
        status: ClassificationStatus::Pending,
    }
}

/// Stage 1/2: exact mapping first, then the nearest configured ancestor
/// with the remaining sub-path appended.
fn rule_directory_mapping(
    aggregate: &DirectoryAggregate,
    mappings: &BTreeMap<String, String>,
) -> Option<ClassificationRecord> {
    let source = &aggregate.source_path;
    if let Some(target) = mappings.get(source) {
        return Some(result(
            aggregate,
            target,
            0.95,
            rule::DIRECTORY_MAPPING,
            format!("exact mapping {} -> {}", source, target),
            Vec::new(),
        ));
    }

    for (mapped_source, mapped_target) in mappings {
        let boundary = format!("{}/", mapped_source.trim_end_matches('/'));
        if let Some(sub_path) = source.strip_prefix(&boundary) {
            let target = format!("{}/{}", mapped_target.trim_end_matches('/'), sub_path);
            return Some(result(
                aggregate,
                &target,
                0.90,
                rule::DIRECTORY_MAPPING_PREFIX,
                format!("prefix mapping {} -> {}", mapped_source, mapped_target),
                Vec::new(),
            ));
        }
    }

    None
}

/// Stage 3: keyword scoring against every non-frozen taxonomy node.
fn rule_keyword_match(
    aggregate: &DirectoryAggregate,
    taxonomy: &Taxonomy,
) -> Option<ClassificationRecord> {
    let dir_name = paths::leaf_name(&aggregate.source_path).to_lowercase();
    let path_text = aggregate.source_path.to_lowercase();

    let mut best: Option<Candidate> = None;
    let mut alternatives: Vec<Candidate> = Vec::new();

    for node in taxonomy.walk() {
        let mut score = 0.0;
        let mut matched: Vec<String> = Vec::new();

        for keyword in &node.keywords {
            let kw = keyword.to_lowercase();
            if kw == dir_name {
                score += 0.4;
                matched.push(format!("{}(exact)", keyword));
            } else if dir_name.contains(&kw) {
                score += 0.25;
                matched.push(format!("{}(name)", keyword));
            } else if path_text.contains(&kw) {
                score += 0.15;
                matched.push(format!("{}(path)", keyword));
            }
        }

        if matched.len() > 1 {
            score += 0.1 * (matched.len() - 1) as f64;
        }
        score = score.min(KEYWORD_SCORE_CAP);

        if score > KEYWORD_SCORE_FLOOR {
            let candidate = Candidate {
                target_path: node.path.clone(),
                confidence: score,
                reason: format!("keywords: {}", matched.join(", ")),
            };
            match &best {
                Some(current) if candidate.confidence <= current.confidence => {
                    alternatives.push(candidate);
                }
                _ => {
                    if let Some(previous) = best.take() {
                        alternatives.push(previous);
                    }
                    best = Some(candidate);
                }
            }
        }
    }

    let best = best?;
    alternatives.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    alternatives.truncate(MAX_ALTERNATIVES);
    let reason = best.reason.clone();
    Some(result(
        aggregate,
        &best.target_path,
        best.confidence,
        rule::KEYWORD_MATCH,
        reason,
        alternatives,
    ))
}

/// Stage 4: pure thresholding over the extension histogram.
fn rule_content_analysis(
    aggregate: &DirectoryAggregate,
    config: &ClassifierConfig,
) -> Option<ClassificationRecord> {
    let total: i64 = aggregate.extensions.values().sum();
    if total == 0 {
        return None;
    }

    let mut ranked: Vec<(&String, &i64)> = aggregate.extensions.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(CONTENT_TOP_EXTENSIONS);
    let ratios: HashMap<&str, f64> = ranked
        .iter()
        .map(|(ext, count)| (ext.as_str(), **count as f64 / total as f64))
        .collect();
    let ratio_of = |extensions: &[&str]| -> f64 {
        extensions.iter().filter_map(|e| ratios.get(e)).sum()
    };

    let raw_ratio = ratio_of(RAW_PHOTO_EXTENSIONS);
    if raw_ratio > 0.5 {
        return Some(result(
            aggregate,
            &config.content_targets.photography,
            0.6,
            rule::CONTENT_ANALYSIS,
            format!("raw image ratio {:.0}%", raw_ratio * 100.0),
            Vec::new(),
        ));
    }

    let video_ratio = ratio_of(VIDEO_EXTENSIONS);
    let pdf_ratio = ratios.get(".pdf").copied().unwrap_or(0.0);
    if video_ratio > 0.5 && pdf_ratio > 0.05 {
        return Some(result(
            aggregate,
            &config.holding_target,
            0.4,
            rule::CONTENT_ANALYSIS,
            format!(
                "video course mix (video {:.0}%, pdf {:.0}%)",
                video_ratio * 100.0,
                pdf_ratio * 100.0
            ),
            Vec::new(),
        ));
    }

    let audio_ratio = ratio_of(AUDIO_EXTENSIONS);
    if audio_ratio > 0.6 {
        return Some(result(
            aggregate,
            &config.content_targets.music,
            0.5,
            rule::CONTENT_ANALYSIS,
            format!("audio ratio {:.0}%", audio_ratio * 100.0),
            Vec::new(),
        ));
    }

    let phone_ratio = ratio_of(PHONE_PHOTO_EXTENSIONS);
    if phone_ratio > 0.3 {
        return Some(result(
            aggregate,
            &config.content_targets.phone_photos,
            0.45,
            rule::CONTENT_ANALYSIS,
            format!("phone photo ratio {:.0}%", phone_ratio * 100.0),
            Vec::new(),
        ));
    }

    None
}
