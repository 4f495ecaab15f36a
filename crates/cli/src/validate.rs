//! `opaef validate` and `opaef check-config`.

use std::path::PathBuf;

use opaef_ledger::ValidationReport;

use crate::output::{load_documented, load_grouping, load_ledger, to_json, Meta};
use crate::CliError;

pub(crate) fn cmd_validate(
    ledger: PathBuf,
    documented: Option<PathBuf>,
    json_output: bool,
) -> Result<(), CliError> {
    let mut document = load_ledger(&ledger)?;
    if let Some(ref path) = documented {
        document = document.with_documented(load_documented(path)?);
    }

    let report = ValidationReport::run(&document);

    if json_output {
        let json = to_json(&Meta::new(&ledger, &document), "validation", &report)?;
        println!("{json}");
    } else {
        for d in &report.discrepancies {
            println!("total {d}");
        }
        for result in report.exercises.values() {
            let status = if result.is_valid { "ok" } else { "MISMATCH" };
            println!("{} {status}", result.fiscal_year);
            for error in &result.errors {
                println!("  {error}");
            }
        }
    }

    let failing = report.failing_years();
    eprintln!(
        "{}: {} records, {} document discrepancies, {}/{} exercises reconciled",
        document.entity,
        document.total_records(),
        report.discrepancies.len(),
        report.exercises.len() - failing.len(),
        report.exercises.len(),
    );

    if report.is_reconciled() {
        return Ok(());
    }

    let mut err = CliError::mismatch("documented totals do not reconcile");
    if !failing.is_empty() {
        let years: Vec<String> = failing.iter().map(i32::to_string).collect();
        err = err.with_hint(format!("exercises out of tolerance: {}", years.join(", ")));
    }
    Err(err)
}

pub(crate) fn cmd_check_config(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_grouping(Some(&config_path))?;

    let warnings = config.lint();
    for warning in &warnings {
        println!("warning: {warning}");
    }
    println!(
        "{}: year={} concept={} custom={} ({} groups, {} named concepts)",
        config_path.display(),
        config.group_by_year,
        config.group_by_concept,
        config.custom_grouping_active(),
        config.custom_groups.len(),
        config.concept_names.len(),
    );
    Ok(())
}
