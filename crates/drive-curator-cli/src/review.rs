use std::io::{self, Write};

use colored::*;
use drive_curator_core::storage::models::ClassificationRecord;
use drive_curator_core::{Operator, ReviewDecision};

use crate::report;

/// Blocking stdin prompts; phase 3 pauses on each item until the operator
/// answers.
pub struct StdinOperator;

impl Operator for StdinOperator {
    fn confirm(&self, prompt: &str) -> bool {
        prompt_confirm(prompt, Some(false)).unwrap_or(false)
    }

    fn review(&self, item: &ClassificationRecord, position: usize, total: usize) -> ReviewDecision {
        println!();
        println!("{}", format!("({}/{})", position, total).bold());
        println!("  source:     {}", item.source_path.cyan());
        println!("  suggested:  {}", item.target_path.green());
        println!(
            "  confidence: {:.2} ({})",
            item.confidence,
            item.band().as_str()
        );
        println!("  rule:       {}", item.rule_name);
        println!("  reason:     {}", item.reason);
        println!(
            "  files:      {}, size: {}",
            item.file_count,
            report::format_size(item.total_size)
        );
        for alternative in &item.alternatives {
            println!(
                "  alternative: {} ({:.2})",
                alternative.target_path, alternative.confidence
            );
        }

        loop {
            print!("approve / reject / skip / quit (y/n/s/q) [s]: ");
            let _ = io::stdout().flush();

            let mut input = String::new();
            if io::stdin().read_line(&mut input).is_err() {
                return ReviewDecision::Quit;
            }
            match input.trim().to_lowercase().as_str() {
                "y" => return ReviewDecision::Approve,
                "n" => return ReviewDecision::Reject,
                "s" | "" => return ReviewDecision::Skip,
                "q" => return ReviewDecision::Quit,
                _ => continue,
            }
        }
    }
}

pub fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
