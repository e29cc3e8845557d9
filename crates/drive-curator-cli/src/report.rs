use colored::*;
use drive_curator_core::clean::SpaceReport;
use drive_curator_core::config::CleanConfig;
use drive_curator_core::dedup::DedupReport;
use drive_curator_core::migrate::MigrationPlan;
use drive_curator_core::storage::models::{
    ClassificationRecord, ConfidenceBand, IndexStats,
};
use drive_curator_core::taxonomy::{Taxonomy, TaxonomyNode};
use std::collections::BTreeMap;

pub fn format_size(bytes: i64) -> String {
    let mut value = bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if value < 1024.0 {
            return format!("{:.1} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1} PB", value)
}

/// Keeps the tail of long paths, which carries the interesting part.
pub fn truncate(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        return s.to_string();
    }
    let tail: String = chars[chars.len() - (max_len.saturating_sub(3))..]
        .iter()
        .collect();
    format!("...{}", tail)
}

pub fn print_classification_report(results: &[ClassificationRecord], detail: bool) {
    if results.is_empty() {
        println!("{}", "No classification results".yellow());
        return;
    }

    let band_of = |band: ConfidenceBand| -> Vec<&ClassificationRecord> {
        results.iter().filter(|r| r.band() == band).collect()
    };
    let high = band_of(ConfidenceBand::High);
    let medium = band_of(ConfidenceBand::Medium);
    let low = band_of(ConfidenceBand::Low);
    let size_of = |group: &[&ClassificationRecord]| -> i64 {
        group.iter().map(|r| r.total_size).sum()
    };

    println!();
    println!("{}", "Classification report".bold());
    println!(
        "  high   (>=0.9):   {} directories, {}",
        high.len(),
        format_size(size_of(&high))
    );
    println!(
        "  medium (0.5-0.9): {} directories, {}",
        medium.len(),
        format_size(size_of(&medium))
    );
    println!(
        "  low    (<0.5):    {} directories, {}",
        low.len(),
        format_size(size_of(&low))
    );

    if detail {
        for (label, group, colorize) in [
            ("high", high, "green"),
            ("medium", medium, "yellow"),
            ("low", low, "red"),
        ] {
            if group.is_empty() {
                continue;
            }
            println!();
            println!("{}", format!("{} confidence", label).bold());
            let mut sorted = group;
            sorted.sort_by(|a, b| b.total_size.cmp(&a.total_size));
            for record in sorted {
                let target = match colorize {
                    "green" => record.target_path.green(),
                    "yellow" => record.target_path.yellow(),
                    _ => record.target_path.red(),
                };
                println!(
                    "  {} -> {} ({:.2}, {}, {} files, {}) {}",
                    truncate(&record.source_path, 40).dimmed(),
                    target,
                    record.confidence,
                    record.rule_name,
                    record.file_count,
                    format_size(record.total_size),
                    truncate(&record.reason, 40).dimmed(),
                );
            }
        }
    } else {
        // Roll up by top-level target category.
        let mut by_target: BTreeMap<String, (usize, i64, i64)> = BTreeMap::new();
        for record in results {
            let top = drive_curator_core::paths::top_level(&record.target_path)
                .unwrap_or_else(|| record.target_path.clone());
            let entry = by_target.entry(top).or_default();
            entry.0 += 1;
            entry.1 += record.file_count;
            entry.2 += record.total_size;
        }
        println!();
        println!("{}", "By target category".bold());
        let mut rows: Vec<_> = by_target.into_iter().collect();
        rows.sort_by(|a, b| b.1 .2.cmp(&a.1 .2));
        for (target, (dirs, files, bytes)) in rows {
            println!(
                "  {:<30} {:>5} dirs {:>8} files {:>10}",
                target,
                dirs,
                files,
                format_size(bytes)
            );
        }
    }
}

pub fn print_plan(plan: &MigrationPlan) {
    println!();
    println!("{}", "Migration plan".bold());
    println!();
    println!("{} - create directory structure", "Phase 1".green().bold());
    println!("  {} target directories", plan.target_directories);
    println!();
    println!("{} - high-confidence auto-move", "Phase 2".green().bold());
    println!(
        "  {} directories, {} files, {}",
        plan.high.directories,
        plan.high.files,
        format_size(plan.high.bytes)
    );
    println!();
    println!("{} - interactive review", "Phase 3".yellow().bold());
    println!(
        "  medium: {} directories, {}",
        plan.medium.directories,
        format_size(plan.medium.bytes)
    );
    println!(
        "  low:    {} directories, {}",
        plan.low.directories,
        format_size(plan.low.bytes)
    );
    println!();
    println!("{} - clean up emptied directories", "Phase 4".dimmed().bold());
}

pub fn print_dedup_report(report: &DedupReport) {
    if report.total_groups() == 0 {
        println!("{}", "No duplicate files found".green());
        return;
    }

    let manual_files: usize = report.manual.iter().map(|g| g.files.len()).sum();

    println!();
    println!("{}", "Dedup report".bold());
    println!("  duplicate groups: {}", report.total_groups());
    println!();
    println!(
        "  {}: {} groups, {} reclaimable",
        "safe (auto-delete)".green(),
        report.safe.len(),
        format_size(report.safe_reclaimable())
    );
    println!(
        "  {}: {} groups, {} reclaimable",
        "review (confirm first)".yellow(),
        report.review.len(),
        format_size(report.review_reclaimable())
    );
    println!(
        "  {}: {} groups, {} files",
        "manual (not auto-handled)".dimmed(),
        report.manual.len(),
        manual_files
    );

    if !report.safe.is_empty() {
        println!();
        println!(
            "{}",
            format!("Top safe groups (of {})", report.safe.len()).bold()
        );
        let mut sorted: Vec<_> = report.safe.iter().collect();
        sorted.sort_by(|a, b| b.reclaimable_bytes().cmp(&a.reclaimable_bytes()));
        for group in sorted.iter().take(20) {
            let keep = group
                .keep
                .as_ref()
                .map(|f| f.path.as_str())
                .unwrap_or_default();
            println!(
                "  keep {} | delete {} copies | {} each | {} reclaimed",
                truncate(keep, 50).green(),
                group.delete.len(),
                format_size(group.size),
                format_size(group.reclaimable_bytes()),
            );
        }
    }
}

fn format_day(server_mtime: i64) -> String {
    chrono::DateTime::from_timestamp(server_mtime, 0)
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn print_space_report(report: &SpaceReport, config: &CleanConfig, detail: bool) {
    println!();
    println!("{}", "Space report".bold());
    println!(
        "  large files (>= {} MB): {}, {}",
        config.large_file_threshold_mb,
        report.large_files.len(),
        format_size(report.large_total())
    );
    println!(
        "  stale files (> {} days): {}, {}",
        config.stale_after_days,
        report.stale_files.len(),
        format_size(report.stale_total())
    );

    if !detail {
        return;
    }

    if !report.large_files.is_empty() {
        println!();
        println!(
            "{}",
            format!("Largest files (of {})", report.large_files.len()).bold()
        );
        for file in report.large_files.iter().take(20) {
            println!(
                "  {:>10}  {}  {}",
                format_size(file.size).red(),
                format_day(file.server_mtime).dimmed(),
                truncate(&file.path, 70)
            );
        }
    }

    if !report.stale_files.is_empty() {
        println!();
        println!(
            "{}",
            format!("Oldest files (of {})", report.stale_files.len()).bold()
        );
        for file in report.stale_files.iter().take(20) {
            println!(
                "  {:>10}  {}  {}",
                format_size(file.size),
                format_day(file.server_mtime).dimmed(),
                truncate(&file.path, 70)
            );
        }
    }
}

pub fn print_taxonomy_tree(taxonomy: &Taxonomy) {
    println!("{}", "Category tree".bold());
    for root in taxonomy.roots() {
        print_node(taxonomy, root, 1);
    }
}

fn print_node(taxonomy: &Taxonomy, node: &TaxonomyNode, depth: usize) {
    let mut label = node.name.normal();
    if node.frozen {
        label = format!("{} (frozen)", node.name).dimmed();
    }
    let mut line = format!("{}{}", "  ".repeat(depth), label);
    if !node.keywords.is_empty() {
        let mut preview = node.keywords.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
        if node.keywords.len() > 5 {
            preview.push_str(&format!(" +{}", node.keywords.len() - 5));
        }
        line.push_str(&format!(" {}", format!("({})", preview).cyan().dimmed()));
    }
    println!("{}", line);
    for child in taxonomy.children(node) {
        print_node(taxonomy, child, depth + 1);
    }
}

pub fn print_index_stats(stats: &IndexStats) {
    println!("{}", "File index".bold());
    println!("  files:       {}", stats.total_files);
    println!("  directories: {}", stats.total_dirs);
    println!("  total size:  {}", format_size(stats.total_size));
    if !stats.last_scanned_at.is_empty() {
        println!("  last scan:   {}", stats.last_scanned_at);
    }
}
