mod commands;
mod logging;
mod netdisk;
mod report;
mod review;

use std::process;

use clap::{CommandFactory, Parser};
use commands::{Cli, Commands};
use dotenv::dotenv;
use drive_curator_core::classify;
use drive_curator_core::clean;
use drive_curator_core::config::{load_configuration, AppConfig};
use drive_curator_core::dedup;
use drive_curator_core::migrate::{self, MigrationExecutor};
use drive_curator_core::storage::Database;
use drive_curator_core::{Error, PhaseSummary, Taxonomy};
use netdisk::NetdiskClient;
use review::StdinOperator;
use tracing::error;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Classify { detail }) => {
            if let Err(err) = run_classify(&config, detail) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Plan) => {
            if let Err(err) = run_plan(&config) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Migrate { phase, dry_run }) => {
            if let Err(err) = run_migrate(&config, phase, dry_run) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Rollback {
            batch,
            all,
            dry_run,
        }) => {
            if let Err(err) = run_rollback(&config, batch.as_deref(), all, dry_run) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Dedup {
            report,
            execute_safe,
        }) => {
            if let Err(err) = run_dedup(&config, report, execute_safe) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Clean { detail }) => {
            if let Err(err) = run_clean(&config, detail) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Taxonomy) => {
            let taxonomy = validated_taxonomy(&config);
            report::print_taxonomy_tree(&taxonomy);
        }
        Some(Commands::Info) => {
            if let Err(err) = run_info(&config) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

/// Configuration errors are fatal before anything touches the remote.
fn validated_taxonomy(config: &AppConfig) -> Taxonomy {
    let taxonomy = Taxonomy::from_config(&config.taxonomy);
    let errors = taxonomy.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("Invalid taxonomy: {}", e);
        }
        process::exit(1);
    }
    taxonomy
}

fn run_classify(config: &AppConfig, detail: bool) -> Result<(), Error> {
    let taxonomy = validated_taxonomy(config);
    let db = Database::open(&config.database_path)?;

    let results = classify::classify_all(
        &db,
        &taxonomy,
        &config.classifier,
        &config.migration.frozen_dirs,
    )?;
    if results.is_empty() {
        println!("Nothing to classify; build the file index first");
        return Ok(());
    }

    report::print_classification_report(&results, detail);
    classify::save_snapshot(&db, &results)?;
    Ok(())
}

fn run_plan(config: &AppConfig) -> Result<(), Error> {
    let db = Database::open(&config.database_path)?;
    let plan = migrate::migration_plan(&db)?;
    report::print_plan(&plan);
    Ok(())
}

fn run_migrate(config: &AppConfig, phase: u8, dry_run: bool) -> Result<(), Error> {
    let taxonomy = validated_taxonomy(config);
    let db = Database::open(&config.database_path)?;
    let threshold = config.classifier.high_confidence_threshold;

    if dry_run {
        match phase {
            1 => {
                let mut paths = taxonomy.all_paths();
                paths.sort();
                for path in paths {
                    println!("  mkdir {}", path);
                }
            }
            2 => {
                for record in migrate::high_confidence_pending(&db, threshold)? {
                    println!(
                        "  {} -> {} ({:.2})",
                        record.source_path, record.target_path, record.confidence
                    );
                }
            }
            3 => {
                for record in migrate::review_pending(&db, threshold)? {
                    println!(
                        "  {} -> {} ({:.2}, {})",
                        record.source_path, record.target_path, record.confidence, record.reason
                    );
                }
            }
            4 => {
                for path in migrate::cleanup_candidates(&db, &config.migration)? {
                    println!("  rm {}", path);
                }
            }
            other => error!("Invalid phase: {} (expected 1-4)", other),
        }
        println!("Dry run; nothing executed");
        return Ok(());
    }

    let remote = NetdiskClient::from_env()?;
    let executor = MigrationExecutor::new(&db, &remote, &config.migration, threshold);
    let operator = StdinOperator;

    let summary = match phase {
        1 => executor.phase1_create_structure(&taxonomy)?,
        2 => executor.phase2_auto_move(&operator)?,
        3 => executor.phase3_review(&operator)?,
        4 => executor.phase4_cleanup(&operator)?,
        other => {
            error!("Invalid phase: {} (expected 1-4)", other);
            return Ok(());
        }
    };
    print_summary(&summary);
    Ok(())
}

fn run_rollback(
    config: &AppConfig,
    batch: Option<&str>,
    all: bool,
    dry_run: bool,
) -> Result<(), Error> {
    if !all && batch.is_none() {
        error!("Specify --batch <id> or --all");
        return Ok(());
    }

    let db = Database::open(&config.database_path)?;

    if dry_run {
        let entries = db.successful_moves(batch)?;
        if entries.is_empty() {
            println!("Nothing to roll back");
            return Ok(());
        }
        for entry in &entries {
            println!("  {} -> {}", entry.target_path, entry.source_path);
        }
        println!("Dry run; nothing executed");
        return Ok(());
    }

    let remote = NetdiskClient::from_env()?;
    let executor = MigrationExecutor::new(
        &db,
        &remote,
        &config.migration,
        config.classifier.high_confidence_threshold,
    );
    let operator = StdinOperator;

    let summary = if all {
        executor.rollback_all(&operator)?
    } else if let Some(batch_id) = batch {
        executor.rollback_batch(batch_id, &operator)?
    } else {
        return Ok(());
    };
    print_summary(&summary);
    Ok(())
}

fn run_dedup(config: &AppConfig, show_report: bool, execute_safe: bool) -> Result<(), Error> {
    if !show_report && !execute_safe {
        error!("Specify --report or --execute-safe");
        return Ok(());
    }

    let taxonomy = validated_taxonomy(config);
    let db = Database::open(&config.database_path)?;
    let dedup_report = dedup::build_report(&db, &taxonomy, &config.dedup)?;

    if show_report {
        report::print_dedup_report(&dedup_report);
    }

    if execute_safe {
        let remote = NetdiskClient::from_env()?;
        let operator = StdinOperator;
        let (deleted, failed) = dedup::execute_safe(
            &db,
            &remote,
            &dedup_report,
            config.migration.delete_batch_size,
            &operator,
        )?;
        println!("Dedup: {} deleted, {} failed", deleted, failed);
    }
    Ok(())
}

fn run_clean(config: &AppConfig, detail: bool) -> Result<(), Error> {
    let db = Database::open(&config.database_path)?;
    let space_report = clean::build_report(&db, &config.clean)?;
    report::print_space_report(&space_report, &config.clean, detail);
    Ok(())
}

fn run_info(config: &AppConfig) -> Result<(), Error> {
    let db = Database::open(&config.database_path)?;
    let stats = db.index_stats()?;
    report::print_index_stats(&stats);
    Ok(())
}

fn print_summary(summary: &PhaseSummary) {
    if summary.was_cancelled() {
        println!("Nothing executed");
        return;
    }
    println!(
        "Batch {}: {} succeeded, {} failed, {} skipped, {} rejected",
        summary.batch_id, summary.succeeded, summary.failed, summary.skipped, summary.rejected
    );
}
