//! Retail ETL CLI - run the sales pipeline stage by stage or end to end
//!
//! # Main Commands
//!
//! ```bash
//! retail-etl run                      # All four stages over the default layout
//! retail-etl clean                    # data/raw → data/clean
//! retail-etl transform                # data/clean → data/processed
//! retail-etl curate                   # data/processed → data/curated
//! retail-etl report --top 5           # data/curated → reports
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! retail-etl parse input.csv          # Parse a raw extract to JSON rows
//! retail-etl validate                 # Check a table against the sales-record schema
//! ```

use clap::{Parser, Subcommand};
use retail_etl::logs::{log_error, log_info, log_success};
use retail_etl::parser::read_raw_file;
use retail_etl::validation::row_to_json;
use retail_etl::{
    read_table_file, run_all, run_clean, run_curate, run_report, run_transform, validate_table,
    LogFormat, PipelineConfig, LOG_SINK,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "retail-etl")]
#[command(about = "Batch ETL for retail sales extracts", long_about = None)]
struct Cli {
    /// Base directory of the data layout [env: SALES_ETL_BASE_DIR]
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Log output format [env: SALES_ETL_LOG_FORMAT]
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every stage in order
    Run {
        /// Report leaderboard length [env: SALES_ETL_TOP_N]
        #[arg(long)]
        top: Option<usize>,
    },

    /// Clean the raw extract
    Clean {
        /// Raw CSV (default: data/raw/sales_data.csv)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Cleaned CSV (default: data/clean/cleaned_sales_data.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Derive revenue, calendar and customer columns
    Transform {
        /// Cleaned CSV
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Transformed CSV (default: data/processed/transformed_sales_data.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the curated summary tables
    Curate {
        /// Transformed CSV
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Curated directory (default: data/curated)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the KPI report from the curated tables
    Report {
        /// Curated directory
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Report directory (default: reports)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Leaderboard length [env: SALES_ETL_TOP_N]
        #[arg(long)]
        top: Option<usize>,
    },

    /// Parse a raw CSV file and output JSON rows
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a cleaned or transformed table against the sales-record schema
    Validate {
        /// Table to check (default: the transformed table)
        input: Option<PathBuf>,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = PipelineConfig::from_env();
    if let Some(base_dir) = cli.base_dir {
        config = config.with_base_dir(base_dir);
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    LOG_SINK.set_format(config.log_format);

    let result: Result<(), Box<dyn std::error::Error>> = match cli.command {
        Commands::Run { top } => {
            if let Some(top) = top {
                config.top_n = top;
            }
            run_all(&config).map(|_| ()).map_err(Into::into)
        }

        Commands::Clean { input, output } => run_clean(
            &input.unwrap_or_else(|| config.raw_file()),
            &output.unwrap_or_else(|| config.clean_file()),
        )
        .map(|_| ())
        .map_err(Into::into),

        Commands::Transform { input, output } => run_transform(
            &input.unwrap_or_else(|| config.clean_file()),
            &output.unwrap_or_else(|| config.processed_file()),
        )
        .map(|_| ())
        .map_err(Into::into),

        Commands::Curate { input, output } => run_curate(
            &input.unwrap_or_else(|| config.processed_file()),
            &output.unwrap_or_else(|| config.curated_dir()),
        )
        .map(|_| ())
        .map_err(Into::into),

        Commands::Report { input, output, top } => run_report(
            &input.unwrap_or_else(|| config.curated_dir()),
            &output.unwrap_or_else(|| config.report_dir()),
            top.unwrap_or(config.top_n),
        )
        .map(|_| ())
        .map_err(Into::into),

        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Validate { input } => {
            cmd_validate(&input.unwrap_or_else(|| config.processed_file()))
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    log_info(format!("📄 Parsing CSV: {}", input.display()));

    let result = read_raw_file(input)?;
    let table = &result.table;
    log_info(format!("   Encoding: {}", result.encoding));
    log_info(format!("   Delimiter: '{}'", format_delimiter(result.delimiter)));
    log_info(format!("   Columns: {}", table.columns().join(", ")));
    log_success(format!("Parsed {} records", table.len()));

    let records: Vec<_> = table
        .rows()
        .iter()
        .map(|row| row_to_json(table.columns(), row))
        .collect();
    let json = serde_json::to_string_pretty(&records)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_validate(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    log_info(format!("✔️  Validating: {}", input.display()));

    let table = read_table_file(input)?;
    let report = validate_table(&table)?;

    for failure in report.invalid.iter().take(5) {
        log_error(format!("Record {} invalid:", failure.row));
        for err in failure.errors.iter().take(3) {
            log_error(format!("   - {}", err));
        }
    }
    log_info(format!(
        "📊 Results: {} valid, {} invalid",
        report.total - report.invalid.len(),
        report.invalid.len()
    ));

    report.into_result()?;
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            log_success(format!("💾 Output written to: {}", p.display()));
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
