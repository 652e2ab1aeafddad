//! File-to-file stage runners.
//!
//! Each `run_*` function reads its input from disk, runs one stage and
//! writes the stage output, logging progress through [`crate::logs`].
//! [`run_all`] chains the four stages over the paths of a
//! [`PipelineConfig`].
//!
//! # Example
//!
//! ```rust,ignore
//! use retail_etl::{run_all, PipelineConfig};
//!
//! let summary = run_all(&PipelineConfig::from_env())?;
//! println!("{}", summary.clean.summary());
//! ```

use std::path::{Path, PathBuf};

use crate::clean::{clean_table, CleanReport};
use crate::config::PipelineConfig;
use crate::curate::curate;
use crate::error::PipelineResult;
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::models::CuratedTables;
use crate::parser::{read_raw_file, read_table_file, write_table_file};
use crate::report::{build_report, read_curated, write_curated, write_report, Report};
use crate::transform::{transform_table, TransformReport};

/// Outcome of a full run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub clean: CleanReport,
    pub transform: TransformReport,
    pub curated: CuratedTables,
    pub report: Report,
    pub report_files: Vec<PathBuf>,
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}

/// Raw extract → cleaned table.
pub fn run_clean(input: &Path, output: &Path) -> PipelineResult<CleanReport> {
    log_info(format!("📖 Reading raw extract: {}", input.display()));
    let parsed = read_raw_file(input)?;
    log_info_indent(format!("Encoding: {}", parsed.encoding), 1);
    log_info_indent(format!("Delimiter: '{}'", format_delimiter(parsed.delimiter)), 1);
    log_info_indent(format!("Columns: {}", parsed.table.columns().len()), 1);

    let cleaned = clean_table(&parsed.table);
    for (column, count) in &cleaned.report.filled {
        log_info_indent(format!("Filled {} missing {}", count, column), 1);
    }
    if cleaned.report.invalid_dates_dropped > 0 {
        log_warning(format!(
            "Dropped {} rows with an unparseable ORDERDATE",
            cleaned.report.invalid_dates_dropped
        ));
    }

    write_table_file(&cleaned.table, output)?;
    log_success(format!("{} → {}", cleaned.report.summary(), output.display()));
    Ok(cleaned.report)
}

/// Cleaned table → transformed table.
pub fn run_transform(input: &Path, output: &Path) -> PipelineResult<TransformReport> {
    log_info(format!("⚙️  Transforming: {}", input.display()));
    let table = read_table_file(input)?;

    let transformed = transform_table(&table);
    if transformed.report.invalid_dates_dropped > 0 {
        log_warning(format!(
            "Dropped {} rows with an unparseable ORDERDATE",
            transformed.report.invalid_dates_dropped
        ));
    }

    write_table_file(&transformed.table, output)?;
    log_success(format!("{} → {}", transformed.report.summary(), output.display()));
    Ok(transformed.report)
}

/// Transformed table → curated summaries in `dir`.
pub fn run_curate(input: &Path, dir: &Path) -> PipelineResult<CuratedTables> {
    log_info(format!("📦 Curating: {}", input.display()));
    let table = read_table_file(input)?;

    let curated = curate(&table)?;
    for path in write_curated(&curated, dir)? {
        log_info_indent(format!("Wrote {}", path.display()), 1);
    }
    log_success(format!(
        "Curated {} customers, {} products, {} months, {} countries",
        curated.customers.len(),
        curated.products.len(),
        curated.monthly.len(),
        curated.countries.len()
    ));
    Ok(curated)
}

/// Curated summaries in `dir` → report files in `output`.
pub fn run_report(dir: &Path, output: &Path, top_n: usize) -> PipelineResult<(Report, Vec<PathBuf>)> {
    log_info(format!("📊 Reporting from: {}", dir.display()));
    let curated = read_curated(dir)?;

    let report = build_report(&curated, top_n);
    let files = write_report(&report, output)?;
    log_success(format!(
        "Report {}: revenue {:.2}, {} orders, AOV {:.2}",
        report.run_id,
        report.kpis.total_revenue,
        report.kpis.total_orders,
        report.kpis.average_order_value
    ));
    Ok((report, files))
}

/// Run every stage in order over the configured paths.
pub fn run_all(config: &PipelineConfig) -> PipelineResult<RunSummary> {
    log_info(format!("🚀 Running pipeline in {}", config.base_dir.display()));

    let clean = run_clean(&config.raw_file(), &config.clean_file())?;
    let transform = run_transform(&config.clean_file(), &config.processed_file())?;
    let curated = run_curate(&config.processed_file(), &config.curated_dir())?;
    let (report, report_files) = run_report(&config.curated_dir(), &config.report_dir(), config.top_n)?;

    log_success("✨ Pipeline complete");
    Ok(RunSummary {
        clean,
        transform,
        curated,
        report,
        report_files,
    })
}
